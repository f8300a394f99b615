//! Dataset loading from the tab-separated campaign file using Polars

use crate::error::{ExplorerError, Result};
use crate::schema::{self, Channel, SpendCategory};
use chrono::NaiveDate;
use polars::io::csv::read::{CsvParseOptions, CsvReadOptions};
use polars::prelude::*;
use std::path::Path;
use tracing::{debug, info, warn};

/// Spend amounts by product category
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SpendAmounts {
    pub wines: f64,
    pub fruits: f64,
    pub meat: f64,
    pub fish: f64,
    pub sweets: f64,
    pub gold: f64,
}

impl SpendAmounts {
    pub fn get(&self, category: SpendCategory) -> f64 {
        match category {
            SpendCategory::Wines => self.wines,
            SpendCategory::Fruits => self.fruits,
            SpendCategory::Meat => self.meat,
            SpendCategory::Fish => self.fish,
            SpendCategory::Sweets => self.sweets,
            SpendCategory::Gold => self.gold,
        }
    }

    pub fn total(&self) -> f64 {
        SpendCategory::ALL.iter().map(|&c| self.get(c)).sum()
    }
}

/// Purchase counts by channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ChannelPurchases {
    pub web: u32,
    pub catalog: u32,
    pub store: u32,
}

impl ChannelPurchases {
    pub fn get(&self, channel: Channel) -> u32 {
        match channel {
            Channel::Web => self.web,
            Channel::Catalog => self.catalog,
            Channel::Store => self.store,
        }
    }

    pub fn total(&self) -> u32 {
        self.web + self.catalog + self.store
    }
}

/// One customer row exactly as read from the source file
#[derive(Debug, Clone, PartialEq)]
pub struct RawCustomer {
    pub id: i64,
    pub year_birth: i32,
    pub education: String,
    pub marital_status: String,
    /// `None` when the source cell is empty
    pub income: Option<f64>,
    pub kidhome: u32,
    pub teenhome: u32,
    /// `None` when `Dt_Customer` could not be parsed
    pub enrolled_on: Option<NaiveDate>,
    pub recency: u32,
    pub spend: SpendAmounts,
    pub deals_purchases: u32,
    pub purchases: ChannelPurchases,
    pub web_visits_month: u32,
    /// AcceptedCmp1..AcceptedCmp5
    pub accepted_campaigns: [bool; 5],
    pub complain: bool,
    pub response: bool,
    pub z_cost_contact: Option<f64>,
    pub z_revenue: Option<f64>,
}

/// Load the campaign dataset from a tab-separated file
///
/// # Arguments
/// * `path` - Path to the TSV file with a header row
///
/// # Returns
/// * One `RawCustomer` per data row, in file order
pub fn load_dataset<P: AsRef<Path>>(path: P) -> Result<Vec<RawCustomer>> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(ExplorerError::DatasetNotFound {
            path: path.display().to_string(),
        });
    }

    let df = read_tsv(path)?;
    debug!(rows = df.height(), columns = df.width(), "read dataset frame");

    let customers = records_from_frame(&df)?;
    info!(records = customers.len(), path = %path.display(), "dataset loaded");
    Ok(customers)
}

/// Read a tab-separated file into a DataFrame
pub fn read_tsv(path: &Path) -> Result<DataFrame> {
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(10_000))
        .with_parse_options(CsvParseOptions::default().with_separator(b'\t'))
        .try_into_reader_with_file_path(Some(path.to_path_buf()))?
        .finish()?;
    Ok(df)
}

/// Convert a DataFrame with the campaign schema into typed records
pub fn records_from_frame(df: &DataFrame) -> Result<Vec<RawCustomer>> {
    let height = df.height();
    if height == 0 {
        return Err(ExplorerError::EmptyDataset);
    }

    let ids = int_column(df, schema::ID)?;
    let years = int_column(df, schema::YEAR_BIRTH)?;
    let education = text_column(df, schema::EDUCATION)?;
    let marital = text_column(df, schema::MARITAL_STATUS)?;
    let income = optional_float_column(df, schema::INCOME)?;
    let kidhome = count_column(df, schema::KIDHOME)?;
    let teenhome = count_column(df, schema::TEENHOME)?;
    let dates = date_column(df, schema::DT_CUSTOMER)?;
    let recency = count_column(df, schema::RECENCY)?;
    let deals = count_column(df, schema::NUM_DEALS_PURCHASES)?;
    let visits = count_column(df, schema::NUM_WEB_VISITS_MONTH)?;
    let complain = flag_column(df, schema::COMPLAIN)?;
    let response = flag_column(df, schema::RESPONSE)?;

    let spend = SpendCategory::ALL
        .iter()
        .map(|c| amount_column(df, c.column()))
        .collect::<Result<Vec<_>>>()?;
    let purchases = Channel::ALL
        .iter()
        .map(|c| count_column(df, c.column()))
        .collect::<Result<Vec<_>>>()?;
    let campaigns = schema::CAMPAIGN_COLUMNS
        .iter()
        .map(|name| flag_column(df, name))
        .collect::<Result<Vec<_>>>()?;

    let [z_cost_contact, z_revenue] = schema::CONSTANT_COLUMNS.map(|name| {
        if df.column(name).is_ok() {
            optional_float_column(df, name)
        } else {
            Ok(vec![None; height])
        }
    });
    let z_cost_contact = z_cost_contact?;
    let z_revenue = z_revenue?;

    let unknown_dates = dates.iter().filter(|d| d.is_none()).count();
    if unknown_dates > 0 {
        warn!(
            count = unknown_dates,
            column = schema::DT_CUSTOMER,
            "unparseable enrollment dates treated as unknown"
        );
    }

    let mut customers = Vec::with_capacity(height);
    for row in 0..height {
        let year_birth = i32::try_from(years[row]).map_err(|_| ExplorerError::InvalidValue {
            column: schema::YEAR_BIRTH.to_string(),
            row,
            value: years[row].to_string(),
        })?;

        customers.push(RawCustomer {
            id: ids[row],
            year_birth,
            education: education[row].clone(),
            marital_status: marital[row].clone(),
            income: income[row],
            kidhome: kidhome[row],
            teenhome: teenhome[row],
            enrolled_on: dates[row],
            recency: recency[row],
            spend: SpendAmounts {
                wines: spend[0][row],
                fruits: spend[1][row],
                meat: spend[2][row],
                fish: spend[3][row],
                sweets: spend[4][row],
                gold: spend[5][row],
            },
            deals_purchases: deals[row],
            purchases: ChannelPurchases {
                web: purchases[0][row],
                catalog: purchases[1][row],
                store: purchases[2][row],
            },
            web_visits_month: visits[row],
            accepted_campaigns: [
                campaigns[0][row],
                campaigns[1][row],
                campaigns[2][row],
                campaigns[3][row],
                campaigns[4][row],
            ],
            complain: complain[row],
            response: response[row],
            z_cost_contact: z_cost_contact[row],
            z_revenue: z_revenue[row],
        });
    }

    Ok(customers)
}

fn series<'a>(df: &'a DataFrame, name: &str) -> Result<&'a Series> {
    df.column(name).map_err(|_| ExplorerError::MissingColumn {
        name: name.to_string(),
    })
}

fn int_column(df: &DataFrame, name: &str) -> Result<Vec<i64>> {
    let values = series(df, name)?.cast(&DataType::Int64)?;
    let values = values
        .i64()?
        .into_iter()
        .enumerate()
        .map(|(row, v)| {
            v.ok_or_else(|| ExplorerError::MissingValue {
                column: name.to_string(),
                row,
            })
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(values)
}

fn count_column(df: &DataFrame, name: &str) -> Result<Vec<u32>> {
    int_column(df, name)?
        .into_iter()
        .enumerate()
        .map(|(row, v)| {
            u32::try_from(v).map_err(|_| ExplorerError::InvalidValue {
                column: name.to_string(),
                row,
                value: v.to_string(),
            })
        })
        .collect()
}

fn flag_column(df: &DataFrame, name: &str) -> Result<Vec<bool>> {
    int_column(df, name)?
        .into_iter()
        .enumerate()
        .map(|(row, v)| match v {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(ExplorerError::InvalidValue {
                column: name.to_string(),
                row,
                value: other.to_string(),
            }),
        })
        .collect()
}

fn amount_column(df: &DataFrame, name: &str) -> Result<Vec<f64>> {
    optional_float_column(df, name)?
        .into_iter()
        .enumerate()
        .map(|(row, v)| match v {
            None => Err(ExplorerError::MissingValue {
                column: name.to_string(),
                row,
            }),
            Some(amount) if amount < 0.0 || !amount.is_finite() => {
                Err(ExplorerError::InvalidValue {
                    column: name.to_string(),
                    row,
                    value: amount.to_string(),
                })
            }
            Some(amount) => Ok(amount),
        })
        .collect()
}

fn optional_float_column(df: &DataFrame, name: &str) -> Result<Vec<Option<f64>>> {
    let values = series(df, name)?.cast(&DataType::Float64)?;
    let values = values.f64()?.into_iter().collect();
    Ok(values)
}

fn text_column(df: &DataFrame, name: &str) -> Result<Vec<String>> {
    let values = series(df, name)?.cast(&DataType::String)?;
    let values = values
        .str()?
        .into_iter()
        .enumerate()
        .map(|(row, v)| {
            v.map(str::to_string).ok_or_else(|| ExplorerError::MissingValue {
                column: name.to_string(),
                row,
            })
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(values)
}

fn date_column(df: &DataFrame, name: &str) -> Result<Vec<Option<NaiveDate>>> {
    let values = series(df, name)?.cast(&DataType::String)?;
    let values = values
        .str()?
        .into_iter()
        .map(|v| v.and_then(parse_enrollment_date))
        .collect();
    Ok(values)
}

/// Parse a `day-month-year` date, returning `None` for anything else
pub fn parse_enrollment_date(text: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(text.trim(), schema::DATE_FORMAT).ok()
}
