//! Campaign Explorer: filtering and aggregation core for a marketing campaign dataset
//!
//! Loads the campaign file once, derives summary columns, and answers
//! filter and group-by queries for the views of an exploration dashboard.

pub mod aggregate;
pub mod cli;
pub mod context;
pub mod data;
pub mod error;
pub mod features;
pub mod filter;
pub mod schema;
pub mod session;
pub mod summary;
pub mod thresholds;
pub mod viz;

// Re-export public items for easier access
pub use aggregate::{
    aggregate, category_means, channel_intensity, channel_means, channel_mix, spend_mix, Aggregate,
    AggregationSpec, ItemSet, NoDataReason, Segmentation, SummaryTable,
};
pub use cli::Args;
pub use context::ExplorerContext;
pub use data::{load_dataset, RawCustomer};
pub use error::{ExplorerError, Result};
pub use features::{derive_features, Customer};
pub use filter::{apply_filter, Bounds, FilterState, ResponseFilter};
pub use schema::Response;
pub use session::{Report, Session, ViewOutcome};
pub use thresholds::{robust_thresholds, RobustThresholds};
pub use viz::render_report;
