//! Group-by aggregation of a filtered subset into long-form summary tables
//!
//! Every composition or magnitude view runs the same staged pipeline:
//! select the item columns into a matrix, optionally drop zero-sum rows and
//! divide each row by its sum, group rows by response (and segment), take
//! the per-group column means, and reshape into `(group, item, value)` rows.

use crate::error::{ExplorerError, Result};
use crate::features::Customer;
use crate::schema::{self, Channel, Response, SpendCategory};
use ndarray::{Array1, Array2, ArrayView1, Axis};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::debug;

/// Optional secondary grouping attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
pub enum Segmentation {
    #[default]
    None,
    Education,
    MaritalStatus,
    ChildrenHome,
}

impl Segmentation {
    pub const ALL: [Segmentation; 4] = [
        Segmentation::None,
        Segmentation::Education,
        Segmentation::MaritalStatus,
        Segmentation::ChildrenHome,
    ];

    /// Column the selector resolves to, `None` for response-only grouping
    pub fn column(self) -> Option<&'static str> {
        match self {
            Segmentation::None => None,
            Segmentation::Education => Some(schema::EDUCATION),
            Segmentation::MaritalStatus => Some(schema::MARITAL_STATUS),
            Segmentation::ChildrenHome => Some("ChildrenHome"),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Segmentation::None => "No segmentation",
            Segmentation::Education => "Education level",
            Segmentation::MaritalStatus => "Marital status",
            Segmentation::ChildrenHome => "Children at home",
        }
    }

    /// Segment value of a customer as a display string
    pub fn key(self, customer: &Customer) -> Option<String> {
        match self {
            Segmentation::None => None,
            Segmentation::Education => Some(customer.education.clone()),
            Segmentation::MaritalStatus => Some(customer.marital_status.clone()),
            Segmentation::ChildrenHome => Some(customer.children_home.to_string()),
        }
    }
}

/// Fixed set of numeric columns a view aggregates over
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ItemSet {
    /// Purchase counts by channel
    Channels,
    /// Spend amounts by product category
    Categories,
}

impl ItemSet {
    pub fn count(self) -> usize {
        match self {
            ItemSet::Channels => Channel::ALL.len(),
            ItemSet::Categories => SpendCategory::ALL.len(),
        }
    }

    pub fn labels(self) -> Vec<&'static str> {
        match self {
            ItemSet::Channels => Channel::ALL.iter().map(|c| c.label()).collect(),
            ItemSet::Categories => SpendCategory::ALL.iter().map(|c| c.label()).collect(),
        }
    }

    fn value(self, customer: &Customer, index: usize) -> f64 {
        match self {
            ItemSet::Channels => f64::from(customer.purchases.get(Channel::ALL[index])),
            ItemSet::Categories => customer.spend.get(SpendCategory::ALL[index]),
        }
    }
}

/// What the `value` column of a summary table holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Measure {
    /// Mean per-row share, rows normalized to sum to 1
    MeanShare,
    /// Mean raw value
    MeanValue,
}

/// Parameters of one aggregation view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AggregationSpec {
    pub items: ItemSet,
    pub normalize: bool,
    pub segmentation: Segmentation,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct GroupKey {
    pub response: Response,
    pub segment: Option<String>,
}

/// Number of rows that contributed to a group
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupSize {
    pub key: GroupKey,
    pub rows: usize,
}

/// One `(group, item, value)` triple
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryRow {
    pub response: Response,
    pub segment: Option<String>,
    pub item: &'static str,
    pub value: f64,
}

/// Long-form result of an aggregation
///
/// Rows are ordered by response (0 then 1), then segment value, then item
/// in column-set order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryTable {
    pub items: ItemSet,
    pub measure: Measure,
    pub segmentation: Segmentation,
    pub groups: Vec<GroupSize>,
    pub rows: Vec<SummaryRow>,
}

impl SummaryTable {
    pub fn value(&self, response: Response, segment: Option<&str>, item: &str) -> Option<f64> {
        self.rows
            .iter()
            .find(|r| r.response == response && r.segment.as_deref() == segment && r.item == item)
            .map(|r| r.value)
    }

    /// Rows of a single group, in item order
    pub fn group_rows<'a>(
        &'a self,
        key: &'a GroupKey,
    ) -> impl Iterator<Item = &'a SummaryRow> + 'a {
        self.rows
            .iter()
            .filter(move |r| r.response == key.response && r.segment == key.segment)
    }

    /// Distinct segment values present, in order
    pub fn segments(&self) -> Vec<Option<String>> {
        let mut segments: Vec<Option<String>> = Vec::new();
        for group in &self.groups {
            if !segments.contains(&group.key.segment) {
                segments.push(group.key.segment.clone());
            }
        }
        segments.sort();
        segments
    }
}

/// Why an aggregation produced no table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum NoDataReason {
    /// The filtered subset was empty
    EmptyInput,
    /// Every row had a zero item sum and was excluded before normalizing
    NoQualifyingRows,
}

impl NoDataReason {
    pub fn message(self) -> &'static str {
        match self {
            NoDataReason::EmptyInput => "No data for the current filters",
            NoDataReason::NoQualifyingRows => "No qualifying rows for the current filters",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Aggregate {
    Summary(SummaryTable),
    NoData(NoDataReason),
}

impl Aggregate {
    pub fn summary(&self) -> Option<&SummaryTable> {
        match self {
            Aggregate::Summary(table) => Some(table),
            Aggregate::NoData(_) => None,
        }
    }

    pub fn is_no_data(&self) -> bool {
        matches!(self, Aggregate::NoData(_))
    }
}

/// Run the aggregation pipeline over a filtered subset
pub fn aggregate(subset: &[&Customer], spec: &AggregationSpec) -> Result<Aggregate> {
    if subset.is_empty() {
        return Ok(Aggregate::NoData(NoDataReason::EmptyInput));
    }

    let matrix = select_items(subset, spec.items);
    let (rows, matrix) = if spec.normalize {
        let (kept, matrix) = exclude_zero_rows(subset, matrix);
        if kept.is_empty() {
            return Ok(Aggregate::NoData(NoDataReason::NoQualifyingRows));
        }
        (kept, normalize_rows(matrix))
    } else {
        (subset.to_vec(), matrix)
    };

    let groups = group_means(&rows, &matrix, spec.segmentation);
    let table = reshape_long(groups, spec)?;
    debug!(
        items = ?spec.items,
        normalize = spec.normalize,
        segmentation = ?spec.segmentation,
        groups = table.groups.len(),
        "aggregation computed"
    );
    Ok(Aggregate::Summary(table))
}

/// Mean channel shares by response and segment
pub fn channel_mix(subset: &[&Customer], segmentation: Segmentation) -> Result<Aggregate> {
    aggregate(
        subset,
        &AggregationSpec {
            items: ItemSet::Channels,
            normalize: true,
            segmentation,
        },
    )
}

/// Mean category spend shares by response and segment
pub fn spend_mix(subset: &[&Customer], segmentation: Segmentation) -> Result<Aggregate> {
    aggregate(
        subset,
        &AggregationSpec {
            items: ItemSet::Categories,
            normalize: true,
            segmentation,
        },
    )
}

/// Mean purchase counts per channel by response and segment
pub fn channel_intensity(subset: &[&Customer], segmentation: Segmentation) -> Result<Aggregate> {
    aggregate(
        subset,
        &AggregationSpec {
            items: ItemSet::Channels,
            normalize: false,
            segmentation,
        },
    )
}

/// Mean purchase counts per channel by response
pub fn channel_means(subset: &[&Customer]) -> Result<Aggregate> {
    channel_intensity(subset, Segmentation::None)
}

/// Mean spend per category by response
pub fn category_means(subset: &[&Customer]) -> Result<Aggregate> {
    aggregate(
        subset,
        &AggregationSpec {
            items: ItemSet::Categories,
            normalize: false,
            segmentation: Segmentation::None,
        },
    )
}

fn select_items(subset: &[&Customer], items: ItemSet) -> Array2<f64> {
    Array2::from_shape_fn((subset.len(), items.count()), |(row, col)| {
        items.value(subset[row], col)
    })
}

fn exclude_zero_rows<'a>(
    subset: &[&'a Customer],
    matrix: Array2<f64>,
) -> (Vec<&'a Customer>, Array2<f64>) {
    let sums = matrix.sum_axis(Axis(1));
    let keep: Vec<usize> = sums
        .iter()
        .enumerate()
        .filter(|&(_, &sum)| sum > 0.0)
        .map(|(i, _)| i)
        .collect();

    let kept = keep.iter().map(|&i| subset[i]).collect();
    (kept, matrix.select(Axis(0), &keep))
}

fn normalize_rows(mut matrix: Array2<f64>) -> Array2<f64> {
    for mut row in matrix.rows_mut() {
        let total = row.sum();
        row.mapv_inplace(|v| v / total);
    }
    matrix
}

fn group_means(
    rows: &[&Customer],
    matrix: &Array2<f64>,
    segmentation: Segmentation,
) -> BTreeMap<GroupKey, (Array1<f64>, usize)> {
    let mut groups: BTreeMap<GroupKey, (Array1<f64>, usize)> = BTreeMap::new();

    for (customer, values) in rows.iter().zip(matrix.rows()) {
        let key = GroupKey {
            response: customer.response,
            segment: segmentation.key(customer),
        };
        let entry = groups
            .entry(key)
            .or_insert_with(|| (Array1::zeros(matrix.ncols()), 0));
        accumulate(&mut entry.0, values);
        entry.1 += 1;
    }

    for (sum, count) in groups.values_mut() {
        let n = *count as f64;
        sum.mapv_inplace(|v| v / n);
    }
    groups
}

fn accumulate(sum: &mut Array1<f64>, values: ArrayView1<f64>) {
    *sum += &values;
}

fn reshape_long(
    groups: BTreeMap<GroupKey, (Array1<f64>, usize)>,
    spec: &AggregationSpec,
) -> Result<SummaryTable> {
    let labels = spec.items.labels();
    let mut sizes = Vec::with_capacity(groups.len());
    let mut rows = Vec::with_capacity(groups.len() * labels.len());

    for (key, (means, count)) in groups {
        for (item, &value) in labels.iter().zip(means.iter()) {
            if !value.is_finite() {
                return Err(ExplorerError::NonFiniteShare {
                    item: item.to_string(),
                    group: format!("{} / {}", key.response, key.segment.as_deref().unwrap_or("-")),
                });
            }
            rows.push(SummaryRow {
                response: key.response,
                segment: key.segment.clone(),
                item: *item,
                value,
            });
        }
        sizes.push(GroupSize { key, rows: count });
    }

    Ok(SummaryTable {
        items: spec.items,
        measure: if spec.normalize {
            Measure::MeanShare
        } else {
            Measure::MeanValue
        },
        segmentation: spec.segmentation,
        groups: sizes,
        rows,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::{derive_customer, tests::raw_customer};

    const TOLERANCE: f64 = 1e-9;

    fn customer(id: i64, response: bool, web: u32, catalog: u32, store: u32) -> Customer {
        let mut raw = raw_customer(id);
        raw.response = response;
        raw.purchases.web = web;
        raw.purchases.catalog = catalog;
        raw.purchases.store = store;
        raw.education = if id % 2 == 0 { "PhD" } else { "Basic" }.to_string();
        derive_customer(&raw)
    }

    fn sample() -> Vec<Customer> {
        vec![
            customer(1, false, 2, 2, 0),
            customer(2, false, 1, 0, 3),
            customer(3, true, 5, 5, 10),
            customer(4, true, 0, 0, 0),
            customer(5, false, 0, 0, 0),
            customer(6, true, 3, 0, 1),
        ]
    }

    #[test]
    fn test_channel_means_by_response() {
        let customers = sample();
        let subset: Vec<&Customer> = customers.iter().collect();
        let table = channel_means(&subset).unwrap();
        let table = table.summary().unwrap();

        assert_eq!(table.measure, Measure::MeanValue);
        assert_eq!(table.groups.len(), 2);
        // Declined: web (2 + 1 + 0) / 3
        assert!((table.value(Response::Declined, None, "Web").unwrap() - 1.0).abs() < TOLERANCE);
        // Accepted: store (10 + 0 + 1) / 3
        let store = table.value(Response::Accepted, None, "Store").unwrap();
        assert!((store - 11.0 / 3.0).abs() < TOLERANCE);
    }

    #[test]
    fn test_channel_mix_excludes_zero_rows() {
        let customers = sample();
        let subset: Vec<&Customer> = customers.iter().collect();
        let mix = channel_mix(&subset, Segmentation::None).unwrap();
        let table = mix.summary().unwrap();

        let sizes: Vec<usize> = table.groups.iter().map(|g| g.rows).collect();
        assert_eq!(sizes, vec![2, 2]);
        // Declined shares: web (0.5 + 0.25) / 2
        let web = table.value(Response::Declined, None, "Web").unwrap();
        assert!((web - 0.375).abs() < TOLERANCE);
        // the input subset is untouched
        assert_eq!(subset.len(), 6);
    }

    #[test]
    fn test_group_shares_sum_to_one() {
        let customers = sample();
        let subset: Vec<&Customer> = customers.iter().collect();

        for segmentation in Segmentation::ALL {
            for mix in [
                channel_mix(&subset, segmentation).unwrap(),
                spend_mix(&subset, segmentation).unwrap(),
            ] {
                let table = mix.summary().unwrap();
                for group in &table.groups {
                    let total: f64 = table.group_rows(&group.key).map(|r| r.value).sum();
                    assert!((total - 1.0).abs() < 1e-9, "group {:?} sums to {}", group.key, total);
                }
            }
        }
    }

    #[test]
    fn test_all_zero_rows_is_no_qualifying_rows() {
        let customers = vec![customer(1, false, 0, 0, 0), customer(2, true, 0, 0, 0)];
        let subset: Vec<&Customer> = customers.iter().collect();

        assert_eq!(
            channel_mix(&subset, Segmentation::Education).unwrap(),
            Aggregate::NoData(NoDataReason::NoQualifyingRows)
        );
        // magnitude views keep zero rows
        assert!(!channel_intensity(&subset, Segmentation::None).unwrap().is_no_data());
    }

    #[test]
    fn test_empty_input_is_no_data() {
        let subset: Vec<&Customer> = Vec::new();
        let expected = Aggregate::NoData(NoDataReason::EmptyInput);

        assert_eq!(channel_mix(&subset, Segmentation::None).unwrap(), expected);
        assert_eq!(spend_mix(&subset, Segmentation::MaritalStatus).unwrap(), expected);
        assert_eq!(channel_intensity(&subset, Segmentation::ChildrenHome).unwrap(), expected);
        assert_eq!(channel_means(&subset).unwrap(), expected);
        assert_eq!(category_means(&subset).unwrap(), expected);
    }

    #[test]
    fn test_segmented_groups_ordered() {
        let customers = sample();
        let subset: Vec<&Customer> = customers.iter().collect();
        let mix = channel_intensity(&subset, Segmentation::Education).unwrap();
        let table = mix.summary().unwrap();

        let keys: Vec<(Response, Option<String>)> = table
            .groups
            .iter()
            .map(|g| (g.key.response, g.key.segment.clone()))
            .collect();
        assert_eq!(
            keys,
            vec![
                (Response::Declined, Some("Basic".to_string())),
                (Response::Declined, Some("PhD".to_string())),
                (Response::Accepted, Some("Basic".to_string())),
                (Response::Accepted, Some("PhD".to_string())),
            ]
        );
        assert_eq!(table.rows.len(), 4 * 3);
        assert_eq!(table.rows[0].item, "Web");
    }

    #[test]
    fn test_segmentation_is_additive() {
        let mut customers = sample();
        for c in &mut customers {
            c.education = "Graduation".to_string();
        }
        let subset: Vec<&Customer> = customers.iter().collect();

        let plain = spend_mix(&subset, Segmentation::None).unwrap();
        let segmented = spend_mix(&subset, Segmentation::Education).unwrap();
        let plain = plain.summary().unwrap();
        let segmented = segmented.summary().unwrap();

        assert_eq!(plain.rows.len(), segmented.rows.len());
        for (a, b) in plain.rows.iter().zip(segmented.rows.iter()) {
            assert_eq!(a.response, b.response);
            assert_eq!(a.item, b.item);
            assert_eq!(b.segment.as_deref(), Some("Graduation"));
            assert!((a.value - b.value).abs() < TOLERANCE);
        }
    }

    #[test]
    fn test_children_segment_is_string() {
        let customers = sample();
        let subset: Vec<&Customer> = customers.iter().collect();
        let mix = channel_mix(&subset, Segmentation::ChildrenHome).unwrap();
        assert_eq!(mix.summary().unwrap().segments(), vec![Some("3".to_string())]);
    }

    #[test]
    fn test_segmentation_names() {
        assert_eq!(Segmentation::None.column(), None);
        assert_eq!(Segmentation::None.label(), "No segmentation");
        assert_eq!(Segmentation::ChildrenHome.column(), Some("ChildrenHome"));
        assert_eq!(Segmentation::MaritalStatus.label(), "Marital status");
    }

    #[test]
    fn test_category_means_values() {
        let customers = sample();
        let subset: Vec<&Customer> = customers.iter().collect();
        let means = category_means(&subset).unwrap();
        let table = means.summary().unwrap();

        assert_eq!(table.rows.len(), 2 * 6);
        assert_eq!(table.value(Response::Accepted, None, "Wines"), Some(100.0));
        assert_eq!(table.value(Response::Declined, None, "Meat"), Some(50.5));
    }
}
