//! Per-user filter state and the view report computed from it

use crate::aggregate::{
    category_means, channel_intensity, channel_means, channel_mix, spend_mix, Aggregate,
    Segmentation, SummaryTable,
};
use crate::context::ExplorerContext;
use crate::error::Result;
use crate::features::Customer;
use crate::filter::{apply_filter, Bounds, FilterState, ResponseFilter};
use crate::summary::{
    filter_kpis, income_histogram, income_summary, recency_spend_points, spend_box_stats,
    spend_comparison, BoxStats, FilterKpis, HistogramBin, IncomeSummary, ScatterPoint,
    SpendComparison, DEFAULT_HISTOGRAM_BINS,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::error;

/// Result of computing one view
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ViewOutcome<T> {
    Ready(T),
    NoData(String),
    Failed(String),
}

impl<T> ViewOutcome<T> {
    pub fn ready(&self) -> Option<&T> {
        match self {
            ViewOutcome::Ready(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_no_data(&self) -> bool {
        matches!(self, ViewOutcome::NoData(_))
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, ViewOutcome::Failed(_))
    }
}

impl ViewOutcome<SummaryTable> {
    /// Isolate an aggregation result so a failure stays in its own view
    pub fn from_aggregate(view: &str, result: Result<Aggregate>) -> Self {
        match result {
            Ok(Aggregate::Summary(table)) => ViewOutcome::Ready(table),
            Ok(Aggregate::NoData(reason)) => ViewOutcome::NoData(reason.message().to_string()),
            Err(e) => {
                error!(view, error = %e, "view computation failed");
                ViewOutcome::Failed(format!("Error in {}: {}", view, e))
            }
        }
    }
}

impl<T> From<Option<T>> for ViewOutcome<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(value) => ViewOutcome::Ready(value),
            None => ViewOutcome::NoData("No data for the current filters".to_string()),
        }
    }
}

/// Every view of the explorer for one filter state
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub filter: FilterState,
    pub segmentation: Segmentation,
    pub kpis: ViewOutcome<FilterKpis>,
    pub spend_comparison: ViewOutcome<SpendComparison>,
    pub income_summary: ViewOutcome<IncomeSummary>,
    pub income_histogram: ViewOutcome<Vec<HistogramBin>>,
    pub spend_box: ViewOutcome<Vec<BoxStats>>,
    pub recency_spend: ViewOutcome<Vec<ScatterPoint>>,
    pub channel_means: ViewOutcome<SummaryTable>,
    pub category_means: ViewOutcome<SummaryTable>,
    pub channel_mix: ViewOutcome<SummaryTable>,
    pub spend_mix: ViewOutcome<SummaryTable>,
    pub channel_intensity: ViewOutcome<SummaryTable>,
}

/// Filter state owned by one user of a shared context
#[derive(Debug, Clone)]
pub struct Session {
    ctx: Arc<ExplorerContext>,
    defaults: FilterState,
    state: FilterState,
    segmentation: Segmentation,
}

impl Session {
    pub fn new(ctx: Arc<ExplorerContext>) -> Self {
        let defaults = FilterState::defaults(&ctx);
        Self {
            ctx,
            defaults,
            state: defaults,
            segmentation: Segmentation::None,
        }
    }

    pub fn context(&self) -> &ExplorerContext {
        &self.ctx
    }

    pub fn state(&self) -> &FilterState {
        &self.state
    }

    pub fn defaults(&self) -> &FilterState {
        &self.defaults
    }

    pub fn segmentation(&self) -> Segmentation {
        self.segmentation
    }

    pub fn set_recency(&mut self, lo: u32, hi: u32) {
        self.state.recency = Bounds::new(lo, hi);
    }

    pub fn set_income(&mut self, lo: f64, hi: f64) {
        self.state.income = Bounds::new(lo, hi);
    }

    pub fn set_total_spend(&mut self, lo: f64, hi: f64) {
        self.state.total_spend = Bounds::new(lo, hi);
    }

    pub fn set_response(&mut self, response: ResponseFilter) {
        self.state.response = response;
    }

    pub fn set_segmentation(&mut self, segmentation: Segmentation) {
        self.segmentation = segmentation;
    }

    /// Restore every filter predicate to its startup default
    pub fn reset(&mut self) {
        self.state = self.defaults;
    }

    pub fn filtered(&self) -> Vec<&Customer> {
        apply_filter(self.ctx.customers(), &self.state)
    }

    pub fn report(&self) -> Report {
        let subset = self.filtered();
        let seg = self.segmentation;

        Report {
            filter: self.state,
            segmentation: seg,
            kpis: filter_kpis(&subset).into(),
            spend_comparison: spend_comparison(&subset).into(),
            income_summary: income_summary(&subset).into(),
            income_histogram: income_histogram(&subset, DEFAULT_HISTOGRAM_BINS).into(),
            spend_box: spend_box_stats(&subset).into(),
            recency_spend: recency_spend_points(&subset).into(),
            channel_means: ViewOutcome::from_aggregate("channel_means", channel_means(&subset)),
            category_means: ViewOutcome::from_aggregate("category_means", category_means(&subset)),
            channel_mix: ViewOutcome::from_aggregate("channel_mix", channel_mix(&subset, seg)),
            spend_mix: ViewOutcome::from_aggregate("spend_mix", spend_mix(&subset, seg)),
            channel_intensity: ViewOutcome::from_aggregate(
                "channel_intensity",
                channel_intensity(&subset, seg),
            ),
        }
    }
}
