//! Command-line interface definitions and argument parsing

use crate::aggregate::Segmentation;
use crate::filter::ResponseFilter;
use crate::schema::Response;
use crate::session::Session;
use clap::{Parser, ValueEnum};

/// Explore campaign response against recency, income and spend filters
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the tab-separated input file
    #[arg(short, long, env = "CAMPAIGN_EXPLORER_INPUT", default_value = "marketing_campaign.csv")]
    pub input: String,

    /// Recency window in days as "lo,hi"
    #[arg(long)]
    pub recency: Option<String>,

    /// Income window as "lo,hi"; unknown incomes always pass
    #[arg(long)]
    pub income: Option<String>,

    /// Total spend window as "lo,hi"
    #[arg(long)]
    pub spend: Option<String>,

    /// Response category to keep
    #[arg(short, long, value_enum, default_value = "any")]
    pub response: ResponseArg,

    /// Optional segmentation for the mix views
    #[arg(short, long, value_enum, default_value = "none")]
    pub segment: SegmentArg,

    /// Directory for the chart images
    #[arg(short, long, default_value = "charts")]
    pub output_dir: String,

    /// Skip chart rendering
    #[arg(long)]
    pub no_charts: bool,

    /// Print the report as JSON instead of text
    #[arg(long)]
    pub json: bool,

    /// Log level used when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    pub log_level: String,

    /// Only log warnings and errors
    #[arg(short, long)]
    pub quiet: bool,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ResponseArg {
    Any,
    #[value(name = "0")]
    Declined,
    #[value(name = "1")]
    Accepted,
}

impl From<ResponseArg> for ResponseFilter {
    fn from(arg: ResponseArg) -> Self {
        match arg {
            ResponseArg::Any => ResponseFilter::Any,
            ResponseArg::Declined => ResponseFilter::Only(Response::Declined),
            ResponseArg::Accepted => ResponseFilter::Only(Response::Accepted),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SegmentArg {
    None,
    Education,
    MaritalStatus,
    Children,
}

impl From<SegmentArg> for Segmentation {
    fn from(arg: SegmentArg) -> Self {
        match arg {
            SegmentArg::None => Segmentation::None,
            SegmentArg::Education => Segmentation::Education,
            SegmentArg::MaritalStatus => Segmentation::MaritalStatus,
            SegmentArg::Children => Segmentation::ChildrenHome,
        }
    }
}

/// Parse a "lo,hi" range
/// Both ends are inclusive and `lo` must not exceed `hi`. `NaN` is rejected,
/// and only the upper end may be `inf`.
pub fn parse_range(value: &str, name: &str) -> anyhow::Result<(f64, f64)> {
    let parts: Vec<&str> = value.split(',').collect();
    if parts.len() != 2 {
        anyhow::bail!("{} must be in format 'lo,hi'", name);
    }

    let lo: f64 = parts[0]
        .trim()
        .parse()
        .map_err(|_| anyhow::anyhow!("Invalid {} lower bound: {}", name, parts[0]))?;
    let hi: f64 = parts[1]
        .trim()
        .parse()
        .map_err(|_| anyhow::anyhow!("Invalid {} upper bound: {}", name, parts[1]))?;

    if !lo.is_finite() {
        anyhow::bail!("Invalid {} lower bound: {}", name, parts[0]);
    }
    if hi.is_nan() || hi == f64::NEG_INFINITY {
        anyhow::bail!("Invalid {} upper bound: {}", name, parts[1]);
    }
    if lo > hi {
        anyhow::bail!("{} lower bound {} exceeds upper bound {}", name, lo, hi);
    }
    Ok((lo, hi))
}

impl Args {
    /// Apply the filter flags that were given on top of the session defaults
    pub fn apply_to(&self, session: &mut Session) -> anyhow::Result<()> {
        if let Some(ref recency) = self.recency {
            let (lo, hi) = parse_range(recency, "recency")?;
            if lo < 0.0 || lo.fract() != 0.0 || hi.fract() != 0.0 {
                anyhow::bail!("recency bounds must be non-negative whole days");
            }
            session.set_recency(lo as u32, hi.min(u32::MAX as f64) as u32);
        }
        if let Some(ref income) = self.income {
            let (lo, hi) = parse_range(income, "income")?;
            session.set_income(lo, hi);
        }
        if let Some(ref spend) = self.spend {
            let (lo, hi) = parse_range(spend, "spend")?;
            session.set_total_spend(lo, hi);
        }
        session.set_response(self.response.into());
        session.set_segmentation(self.segment.into());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_range() {
        assert_eq!(parse_range("0,99", "recency").unwrap(), (0.0, 99.0));
        assert_eq!(parse_range(" 10.5 , 20 ", "income").unwrap(), (10.5, 20.0));
        assert!(parse_range("invalid", "income").is_err());
        assert!(parse_range("1,x", "income").is_err());
        assert!(parse_range("5,1", "spend").is_err());
    }

    #[test]
    fn test_parse_range_rejects_non_finite() {
        assert!(parse_range("NaN,5", "income").is_err());
        assert!(parse_range("0,NaN", "income").is_err());
        assert!(parse_range("-inf,5", "income").is_err());
        assert!(parse_range("inf,inf", "spend").is_err());
        assert!(parse_range("0,-inf", "spend").is_err());
        assert_eq!(parse_range("0,inf", "spend").unwrap(), (0.0, f64::INFINITY));
    }

    #[test]
    fn test_parse_args() {
        let args = Args::try_parse_from([
            "campaign-explorer",
            "--input",
            "data.tsv",
            "--recency",
            "0,50",
            "--response",
            "1",
            "--segment",
            "marital-status",
        ])
        .unwrap();

        assert_eq!(args.input, "data.tsv");
        assert_eq!(args.recency.as_deref(), Some("0,50"));
        assert_eq!(args.response, ResponseArg::Accepted);
        assert_eq!(Segmentation::from(args.segment), Segmentation::MaritalStatus);
        assert!(!args.json);
    }
}
