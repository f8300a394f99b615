use polars::prelude::PolarsError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExplorerError {
    #[error("Dataset not found: {path}")]
    DatasetNotFound { path: String },

    #[error("Polars error: {0}")]
    Polars(#[from] PolarsError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Required column '{name}' is missing from the dataset")]
    MissingColumn { name: String },

    #[error("Column '{column}' has a missing value at row {row}")]
    MissingValue { column: String, row: usize },

    #[error("Column '{column}' has invalid value {value} at row {row}")]
    InvalidValue {
        column: String,
        row: usize,
        value: String,
    },

    #[error("Dataset contains no records")]
    EmptyDataset,

    #[error("Share for '{item}' in group '{group}' is not finite")]
    NonFiniteShare { item: String, group: String },

    #[error("Render error: {0}")]
    Render(String),
}

pub type Result<T> = std::result::Result<T, ExplorerError>;
