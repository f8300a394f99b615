//! Conjunctive row filter over the derived dataset

use crate::context::ExplorerContext;
use crate::features::Customer;
use crate::schema::Response;
use serde::Serialize;
use tracing::debug;

/// Inclusive range `[lo, hi]`; an inverted range matches nothing
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Bounds<T> {
    pub lo: T,
    pub hi: T,
}

impl<T: PartialOrd + Copy> Bounds<T> {
    pub fn new(lo: T, hi: T) -> Self {
        Self { lo, hi }
    }

    pub fn contains(&self, value: T) -> bool {
        self.lo <= value && value <= self.hi
    }
}

/// Response category selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
pub enum ResponseFilter {
    #[default]
    Any,
    Only(Response),
}

impl ResponseFilter {
    pub fn matches(self, response: Response) -> bool {
        match self {
            ResponseFilter::Any => true,
            ResponseFilter::Only(wanted) => wanted == response,
        }
    }
}

/// The global filter predicates
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FilterState {
    pub recency: Bounds<u32>,
    /// Unknown incomes pass regardless of this range
    pub income: Bounds<f64>,
    pub total_spend: Bounds<f64>,
    pub response: ResponseFilter,
}

impl FilterState {
    /// Startup defaults: full recency and spend ranges, income up to the
    /// truncated p99.5, any response
    pub fn defaults(ctx: &ExplorerContext) -> Self {
        let limits = ctx.limits();
        Self {
            recency: Bounds::new(0, limits.recency_max),
            income: Bounds::new(0.0, limits.income_max),
            total_spend: Bounds::new(0.0, limits.spend_max),
            response: ResponseFilter::Any,
        }
    }

    pub fn matches(&self, customer: &Customer) -> bool {
        self.recency.contains(customer.recency)
            && customer.income.map_or(true, |income| self.income.contains(income))
            && self.total_spend.contains(customer.total_spend)
            && self.response.matches(customer.response)
    }
}

/// Select the customers satisfying every predicate of `state`
///
/// Returns references into `customers` in their original order.
pub fn apply_filter<'a>(customers: &'a [Customer], state: &FilterState) -> Vec<&'a Customer> {
    let subset: Vec<&Customer> = customers.iter().filter(|c| state.matches(c)).collect();
    debug!(
        total = customers.len(),
        selected = subset.len(),
        "filter applied"
    );
    subset
}
