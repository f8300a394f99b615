//! Derived customer attributes computed once after loading

use crate::data::{ChannelPurchases, RawCustomer, SpendAmounts};
use crate::schema::Response;
use chrono::{Datelike, NaiveDate};

/// A customer record with the derived summary columns attached
///
/// The constant `Z_CostContact` / `Z_Revenue` columns are not carried over.
#[derive(Debug, Clone, PartialEq)]
pub struct Customer {
    pub id: i64,
    pub year_birth: i32,
    pub education: String,
    pub marital_status: String,
    pub income: Option<f64>,
    pub kidhome: u32,
    pub teenhome: u32,
    pub enrolled_on: Option<NaiveDate>,
    pub recency: u32,
    pub spend: SpendAmounts,
    pub deals_purchases: u32,
    pub purchases: ChannelPurchases,
    pub web_visits_month: u32,
    pub accepted_campaigns: [bool; 5],
    pub complain: bool,
    pub response: Response,
    /// Sum of the six category spend amounts
    pub total_spend: f64,
    /// Sum of web, catalog and store purchases
    pub total_purchases: u32,
    /// Number of the five earlier campaigns accepted, in [0, 5]
    pub accepted_cmp_total: u8,
    /// Kids plus teens at home
    pub children_home: u32,
    /// Enrollment year minus birth year; not validated
    pub age_at_enroll: Option<i32>,
}

/// Derive the summary columns for every raw record
///
/// Pure and order-preserving: output row `i` corresponds to input row `i`.
pub fn derive_features(raw: &[RawCustomer]) -> Vec<Customer> {
    raw.iter().map(derive_customer).collect()
}

pub fn derive_customer(raw: &RawCustomer) -> Customer {
    Customer {
        id: raw.id,
        year_birth: raw.year_birth,
        education: raw.education.clone(),
        marital_status: raw.marital_status.clone(),
        income: raw.income,
        kidhome: raw.kidhome,
        teenhome: raw.teenhome,
        enrolled_on: raw.enrolled_on,
        recency: raw.recency,
        spend: raw.spend,
        deals_purchases: raw.deals_purchases,
        purchases: raw.purchases,
        web_visits_month: raw.web_visits_month,
        accepted_campaigns: raw.accepted_campaigns,
        complain: raw.complain,
        response: Response::from_flag(raw.response),
        total_spend: raw.spend.total(),
        total_purchases: raw.purchases.total(),
        accepted_cmp_total: raw.accepted_campaigns.iter().filter(|&&a| a).count() as u8,
        children_home: raw.kidhome + raw.teenhome,
        age_at_enroll: raw.enrolled_on.map(|d| d.year() - raw.year_birth),
    }
}
