//! Robust p99.5 thresholds and the order statistics they rely on

use crate::features::Customer;
use serde::Serialize;

/// Quantile used for the robust thresholds
pub const ROBUST_QUANTILE: f64 = 0.995;

/// Display-only reference values computed from the full dataset
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RobustThresholds {
    /// p99.5 of known incomes, `None` when no income is known
    pub income_p995: Option<f64>,
    /// p99.5 of known ages at enrollment
    pub age_p995: Option<f64>,
}

/// Compute the income and age p99.5 values
///
/// Unknown incomes and unknown ages are skipped; nothing is removed from
/// the dataset.
pub fn robust_thresholds(customers: &[Customer]) -> RobustThresholds {
    let incomes: Vec<f64> = customers.iter().filter_map(|c| c.income).collect();
    let ages: Vec<f64> = customers
        .iter()
        .filter_map(|c| c.age_at_enroll)
        .map(f64::from)
        .collect();

    RobustThresholds {
        income_p995: quantile(&incomes, ROBUST_QUANTILE),
        age_p995: quantile(&ages, ROBUST_QUANTILE),
    }
}

/// Quantile by linear interpolation between order statistics
///
/// With the values sorted ascending as `x[0..n]`, the position is
/// `h = (n - 1) * q` and the result is
/// `x[floor(h)] + (h - floor(h)) * (x[floor(h) + 1] - x[floor(h)])`.
/// Returns `None` for an empty input. `q` is clamped to [0, 1].
pub fn quantile(values: &[f64], q: f64) -> Option<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    quantile_sorted(&sorted, q)
}

/// Same as [`quantile`] for input that is already sorted ascending
pub fn quantile_sorted(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }

    let q = q.clamp(0.0, 1.0);
    let h = (sorted.len() - 1) as f64 * q;
    let lower = h.floor() as usize;
    let upper = (lower + 1).min(sorted.len() - 1);
    let fraction = h - lower as f64;

    Some(sorted[lower] + fraction * (sorted[upper] - sorted[lower]))
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::{derive_customer, tests::raw_customer};

    #[test]
    fn test_quantile_linear_interpolation() {
        let values = [4.0, 1.0, 3.0, 2.0];
        assert_eq!(quantile(&values, 0.0), Some(1.0));
        assert_eq!(quantile(&values, 1.0), Some(4.0));
        // h = 3 * 0.5 = 1.5 -> 2 + 0.5 * (3 - 2)
        assert_eq!(quantile(&values, 0.5), Some(2.5));
        // h = 3 * 0.25 = 0.75 -> 1 + 0.75 * (2 - 1)
        assert_eq!(quantile(&values, 0.25), Some(1.75));
    }

    #[test]
    fn test_quantile_edge_cases() {
        assert_eq!(quantile(&[], 0.5), None);
        assert_eq!(quantile(&[7.0], 0.995), Some(7.0));
        assert_eq!(quantile(&[1.0, 2.0, 10.0], 0.5), Some(2.0));
        assert_eq!(mean(&[1.0, 2.0, 3.0]), Some(2.0));
        assert_eq!(mean(&[]), None);
    }

    #[test]
    fn test_uniform_income_p995() {
        let customers: Vec<Customer> = (0..1000)
            .map(|i| {
                let mut raw = raw_customer(i);
                raw.income = Some(i as f64 * 1000.0 / 999.0);
                derive_customer(&raw)
            })
            .collect();

        let thresholds = robust_thresholds(&customers);
        let p995 = thresholds.income_p995.unwrap();
        assert!((p995 - 995.0).abs() < 1.0, "p99.5 was {}", p995);
    }

    #[test]
    fn test_income_threshold_skips_unknown() {
        let customers: Vec<Customer> = (0..10)
            .map(|i| {
                let mut raw = raw_customer(i);
                raw.income = if i % 2 == 0 { None } else { Some(100.0) };
                derive_customer(&raw)
            })
            .collect();

        assert_eq!(robust_thresholds(&customers).income_p995, Some(100.0));
    }

    #[test]
    fn test_thresholds_without_known_values() {
        let mut raw = raw_customer(1);
        raw.income = None;
        raw.enrolled_on = None;
        let thresholds = robust_thresholds(&[derive_customer(&raw)]);

        assert_eq!(thresholds.income_p995, None);
        assert_eq!(thresholds.age_p995, None);
    }
}
