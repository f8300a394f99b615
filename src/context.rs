//! Immutable dataset context shared by every session

use crate::data::load_dataset;
use crate::error::{ExplorerError, Result};
use crate::features::{derive_features, Customer};
use crate::thresholds::{robust_thresholds, RobustThresholds};
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Upper ends of the filter controls, fixed at startup
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SliderLimits {
    pub recency_max: u32,
    /// Truncated income p99.5, 0 when no income is known
    pub income_max: f64,
    pub spend_max: f64,
}

/// The derived dataset plus everything computed from it once
#[derive(Debug, Clone)]
pub struct ExplorerContext {
    customers: Arc<[Customer]>,
    thresholds: RobustThresholds,
    limits: SliderLimits,
}

impl ExplorerContext {
    pub fn new(customers: Vec<Customer>) -> Result<Self> {
        if customers.is_empty() {
            return Err(ExplorerError::EmptyDataset);
        }

        let thresholds = robust_thresholds(&customers);
        let limits = SliderLimits {
            recency_max: customers.iter().map(|c| c.recency).max().unwrap_or(0),
            income_max: thresholds.income_p995.map(f64::trunc).unwrap_or(0.0),
            spend_max: customers
                .iter()
                .map(|c| c.total_spend)
                .fold(0.0, f64::max),
        };

        info!(
            records = customers.len(),
            income_p995 = ?thresholds.income_p995,
            age_p995 = ?thresholds.age_p995,
            "explorer context ready"
        );

        Ok(Self {
            customers: customers.into(),
            thresholds,
            limits,
        })
    }

    /// Load, derive and index a dataset file
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let raw = load_dataset(path)?;
        Self::new(derive_features(&raw))
    }

    pub fn customers(&self) -> &[Customer] {
        &self.customers
    }

    pub fn thresholds(&self) -> RobustThresholds {
        self.thresholds
    }

    pub fn limits(&self) -> SliderLimits {
        self.limits
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::{derive_customer, tests::raw_customer};

    #[test]
    fn test_limits() {
        let customers: Vec<Customer> = (0..4)
            .map(|i| {
                let mut raw = raw_customer(i);
                raw.recency = (i as u32) * 20;
                raw.spend.wines = i as f64 * 100.0;
                raw.income = Some(1000.5 + i as f64);
                derive_customer(&raw)
            })
            .collect();
        let max_spend = customers.iter().map(|c| c.total_spend).fold(0.0, f64::max);

        let ctx = ExplorerContext::new(customers).unwrap();
        let limits = ctx.limits();
        assert_eq!(limits.recency_max, 60);
        assert_eq!(limits.spend_max, max_spend);
        assert_eq!(limits.income_max, ctx.thresholds().income_p995.unwrap().trunc());
    }

    #[test]
    fn test_empty_dataset_rejected() {
        assert!(matches!(
            ExplorerContext::new(Vec::new()),
            Err(ExplorerError::EmptyDataset)
        ));
    }
}
