//! Descriptive summaries: dataset facts, filter KPIs and distribution stats
//!
//! Every function taking a filtered subset returns `None` when there is
//! nothing to summarize.

use crate::context::ExplorerContext;
use crate::features::Customer;
use crate::schema::Response;
use crate::thresholds::{mean, quantile_sorted, ROBUST_QUANTILE};
use chrono::NaiveDate;
use serde::Serialize;

pub const DEFAULT_HISTOGRAM_BINS: usize = 45;

/// Facts about the full, unfiltered dataset
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatasetFacts {
    pub records: usize,
    pub income_missing_pct: f64,
    pub response_rate_pct: f64,
    pub first_enrollment: Option<NaiveDate>,
    pub last_enrollment: Option<NaiveDate>,
}

pub fn dataset_facts(ctx: &ExplorerContext) -> DatasetFacts {
    let customers = ctx.customers();
    let n = customers.len() as f64;
    let missing = customers.iter().filter(|c| c.income.is_none()).count() as f64;
    let accepted = customers
        .iter()
        .filter(|c| c.response == Response::Accepted)
        .count() as f64;

    DatasetFacts {
        records: customers.len(),
        income_missing_pct: 100.0 * missing / n,
        response_rate_pct: 100.0 * accepted / n,
        first_enrollment: customers.iter().filter_map(|c| c.enrolled_on).min(),
        last_enrollment: customers.iter().filter_map(|c| c.enrolled_on).max(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FilterKpis {
    pub records: usize,
    pub response_rate_pct: f64,
}

pub fn filter_kpis(subset: &[&Customer]) -> Option<FilterKpis> {
    if subset.is_empty() {
        return None;
    }
    Some(FilterKpis {
        records: subset.len(),
        response_rate_pct: response_rate_pct(subset),
    })
}

/// Median total spend of responders against non-responders
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum SpendComparison {
    Complete {
        kpis: FilterKpis,
        median_declined: f64,
        median_accepted: f64,
        /// accepted minus declined
        difference: f64,
    },
    /// One response group is absent from the subset
    MissingGroup { kpis: FilterKpis, missing: Response },
}

pub fn spend_comparison(subset: &[&Customer]) -> Option<SpendComparison> {
    let kpis = filter_kpis(subset)?;
    let declined = sorted_spend(subset, Response::Declined);
    let accepted = sorted_spend(subset, Response::Accepted);

    let comparison = match (quantile_sorted(&declined, 0.5), quantile_sorted(&accepted, 0.5)) {
        (Some(median_declined), Some(median_accepted)) => SpendComparison::Complete {
            kpis,
            median_declined,
            median_accepted,
            difference: median_accepted - median_declined,
        },
        (None, _) => SpendComparison::MissingGroup {
            kpis,
            missing: Response::Declined,
        },
        (_, None) => SpendComparison::MissingGroup {
            kpis,
            missing: Response::Accepted,
        },
    };
    Some(comparison)
}

/// Reference lines for the income distribution
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct IncomeSummary {
    pub known: usize,
    pub mean: f64,
    pub median: f64,
    pub p995: f64,
}

pub fn income_summary(subset: &[&Customer]) -> Option<IncomeSummary> {
    let incomes = sorted_incomes(subset);
    Some(IncomeSummary {
        known: incomes.len(),
        mean: mean(&incomes)?,
        median: quantile_sorted(&incomes, 0.5)?,
        p995: quantile_sorted(&incomes, ROBUST_QUANTILE)?,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HistogramBin {
    pub lo: f64,
    pub hi: f64,
    pub count: usize,
}

/// Equal-width histogram of known incomes
///
/// The last bin is closed on both ends so the maximum is counted.
pub fn income_histogram(subset: &[&Customer], bins: usize) -> Option<Vec<HistogramBin>> {
    let incomes = sorted_incomes(subset);
    let (&min, &max) = (incomes.first()?, incomes.last()?);
    let bins = bins.max(1);

    if max == min {
        return Some(vec![HistogramBin {
            lo: min,
            hi: max,
            count: incomes.len(),
        }]);
    }

    let width = (max - min) / bins as f64;
    let mut histogram: Vec<HistogramBin> = (0..bins)
        .map(|i| HistogramBin {
            lo: min + width * i as f64,
            hi: if i + 1 == bins { max } else { min + width * (i + 1) as f64 },
            count: 0,
        })
        .collect();

    for income in incomes {
        let index = (((income - min) / width) as usize).min(bins - 1);
        histogram[index].count += 1;
    }
    Some(histogram)
}

/// Five-number summary of total spend for one response group
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BoxStats {
    pub response: Response,
    pub count: usize,
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
}

pub fn spend_box_stats(subset: &[&Customer]) -> Option<Vec<BoxStats>> {
    if subset.is_empty() {
        return None;
    }

    let stats = [Response::Declined, Response::Accepted]
        .into_iter()
        .filter_map(|response| {
            let spend = sorted_spend(subset, response);
            Some(BoxStats {
                response,
                count: spend.len(),
                min: *spend.first()?,
                q1: quantile_sorted(&spend, 0.25)?,
                median: quantile_sorted(&spend, 0.5)?,
                q3: quantile_sorted(&spend, 0.75)?,
                max: *spend.last()?,
            })
        })
        .collect();
    Some(stats)
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScatterPoint {
    pub recency: u32,
    pub total_spend: f64,
    pub response: Response,
}

pub fn recency_spend_points(subset: &[&Customer]) -> Option<Vec<ScatterPoint>> {
    if subset.is_empty() {
        return None;
    }
    Some(
        subset
            .iter()
            .map(|c| ScatterPoint {
                recency: c.recency,
                total_spend: c.total_spend,
                response: c.response,
            })
            .collect(),
    )
}

fn response_rate_pct(subset: &[&Customer]) -> f64 {
    let accepted = subset
        .iter()
        .filter(|c| c.response == Response::Accepted)
        .count();
    100.0 * accepted as f64 / subset.len() as f64
}

fn sorted_spend(subset: &[&Customer], response: Response) -> Vec<f64> {
    let mut spend: Vec<f64> = subset
        .iter()
        .filter(|c| c.response == response)
        .map(|c| c.total_spend)
        .collect();
    spend.sort_by(|a, b| a.total_cmp(b));
    spend
}

fn sorted_incomes(subset: &[&Customer]) -> Vec<f64> {
    let mut incomes: Vec<f64> = subset.iter().filter_map(|c| c.income).collect();
    incomes.sort_by(|a, b| a.total_cmp(b));
    incomes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::{derive_customer, tests::raw_customer};

    fn customer(id: i64, response: bool, wines: f64, income: Option<f64>) -> Customer {
        let mut raw = raw_customer(id);
        raw.response = response;
        raw.spend = Default::default();
        raw.spend.wines = wines;
        raw.income = income;
        derive_customer(&raw)
    }

    fn sample() -> Vec<Customer> {
        vec![
            customer(1, false, 10.0, Some(100.0)),
            customer(2, false, 30.0, None),
            customer(3, false, 20.0, Some(300.0)),
            customer(4, true, 100.0, Some(200.0)),
            customer(5, true, 200.0, Some(400.0)),
        ]
    }

    #[test]
    fn test_dataset_facts() {
        let ctx = ExplorerContext::new(sample()).unwrap();
        let facts = dataset_facts(&ctx);

        assert_eq!(facts.records, 5);
        assert!((facts.income_missing_pct - 20.0).abs() < 1e-9);
        assert!((facts.response_rate_pct - 40.0).abs() < 1e-9);
        assert_eq!(facts.first_enrollment, NaiveDate::from_ymd_opt(2013, 5, 1));
    }

    #[test]
    fn test_spend_comparison() {
        let customers = sample();
        let subset: Vec<&Customer> = customers.iter().collect();

        match spend_comparison(&subset).unwrap() {
            SpendComparison::Complete {
                kpis,
                median_declined,
                median_accepted,
                difference,
            } => {
                assert_eq!(kpis.records, 5);
                assert_eq!(median_declined, 20.0);
                assert_eq!(median_accepted, 150.0);
                assert_eq!(difference, 130.0);
            }
            other => panic!("unexpected comparison {:?}", other),
        }
    }

    #[test]
    fn test_spend_comparison_missing_group() {
        let customers = sample();
        let subset: Vec<&Customer> = customers.iter().filter(|c| c.id <= 3).collect();

        assert!(matches!(
            spend_comparison(&subset),
            Some(SpendComparison::MissingGroup {
                missing: Response::Accepted,
                ..
            })
        ));
        assert_eq!(spend_comparison(&[]), None);
    }

    #[test]
    fn test_income_summary_skips_unknown() {
        let customers = sample();
        let subset: Vec<&Customer> = customers.iter().collect();
        let summary = income_summary(&subset).unwrap();

        assert_eq!(summary.known, 4);
        assert_eq!(summary.mean, 250.0);
        assert_eq!(summary.median, 250.0);

        let unknown_only: Vec<&Customer> =
            customers.iter().filter(|c| c.income.is_none()).collect();
        assert_eq!(income_summary(&unknown_only), None);
    }

    #[test]
    fn test_income_histogram() {
        let customers = sample();
        let subset: Vec<&Customer> = customers.iter().collect();
        let histogram = income_histogram(&subset, 3).unwrap();

        assert_eq!(histogram.len(), 3);
        assert_eq!(histogram.iter().map(|b| b.count).sum::<usize>(), 4);
        assert_eq!(histogram[2].hi, 400.0);
        assert_eq!(histogram[2].count, 2);
    }

    #[test]
    fn test_spend_box_stats() {
        let customers = sample();
        let subset: Vec<&Customer> = customers.iter().collect();
        let stats = spend_box_stats(&subset).unwrap();

        assert_eq!(stats.len(), 2);
        assert_eq!(stats[0].response, Response::Declined);
        assert_eq!(stats[0].min, 10.0);
        assert_eq!(stats[0].q1, 15.0);
        assert_eq!(stats[0].max, 30.0);
        assert_eq!(stats[1].median, 150.0);
    }

    #[test]
    fn test_empty_subset_summaries() {
        let empty: Vec<&Customer> = Vec::new();
        assert_eq!(filter_kpis(&empty), None);
        assert_eq!(income_histogram(&empty, DEFAULT_HISTOGRAM_BINS), None);
        assert_eq!(spend_box_stats(&empty), None);
        assert_eq!(recency_spend_points(&empty), None);
    }
}
