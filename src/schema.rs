//! Column names of the campaign dataset and the small enumerations built on them

use serde::Serialize;
use std::fmt;

pub const ID: &str = "ID";
pub const YEAR_BIRTH: &str = "Year_Birth";
pub const EDUCATION: &str = "Education";
pub const MARITAL_STATUS: &str = "Marital_Status";
pub const INCOME: &str = "Income";
pub const KIDHOME: &str = "Kidhome";
pub const TEENHOME: &str = "Teenhome";
pub const DT_CUSTOMER: &str = "Dt_Customer";
pub const RECENCY: &str = "Recency";
pub const NUM_DEALS_PURCHASES: &str = "NumDealsPurchases";
pub const NUM_WEB_VISITS_MONTH: &str = "NumWebVisitsMonth";
pub const COMPLAIN: &str = "Complain";
pub const RESPONSE: &str = "Response";

/// Enrollment date format used by `Dt_Customer`
pub const DATE_FORMAT: &str = "%d-%m-%Y";

/// Columns that hold a single value across the whole dataset
pub const CONSTANT_COLUMNS: [&str; 2] = ["Z_CostContact", "Z_Revenue"];

/// Campaign acceptance flags, in campaign order
pub const CAMPAIGN_COLUMNS: [&str; 5] = [
    "AcceptedCmp1",
    "AcceptedCmp2",
    "AcceptedCmp3",
    "AcceptedCmp4",
    "AcceptedCmp5",
];

/// Response to the most recent campaign
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Response {
    Declined,
    Accepted,
}

impl Response {
    pub fn from_flag(flag: bool) -> Self {
        if flag {
            Response::Accepted
        } else {
            Response::Declined
        }
    }

    pub fn code(self) -> u8 {
        match self {
            Response::Declined => 0,
            Response::Accepted => 1,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Response::Declined => "Declined",
            Response::Accepted => "Accepted",
        }
    }
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Response = {}", self.code())
    }
}

/// Purchase channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Channel {
    Web,
    Catalog,
    Store,
}

impl Channel {
    pub const ALL: [Channel; 3] = [Channel::Web, Channel::Catalog, Channel::Store];

    pub fn column(self) -> &'static str {
        match self {
            Channel::Web => "NumWebPurchases",
            Channel::Catalog => "NumCatalogPurchases",
            Channel::Store => "NumStorePurchases",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Channel::Web => "Web",
            Channel::Catalog => "Catalog",
            Channel::Store => "Store",
        }
    }
}

/// Product category of a spend amount
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum SpendCategory {
    Wines,
    Fruits,
    Meat,
    Fish,
    Sweets,
    Gold,
}

impl SpendCategory {
    pub const ALL: [SpendCategory; 6] = [
        SpendCategory::Wines,
        SpendCategory::Fruits,
        SpendCategory::Meat,
        SpendCategory::Fish,
        SpendCategory::Sweets,
        SpendCategory::Gold,
    ];

    pub fn column(self) -> &'static str {
        match self {
            SpendCategory::Wines => "MntWines",
            SpendCategory::Fruits => "MntFruits",
            SpendCategory::Meat => "MntMeatProducts",
            SpendCategory::Fish => "MntFishProducts",
            SpendCategory::Sweets => "MntSweetProducts",
            SpendCategory::Gold => "MntGoldProds",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SpendCategory::Wines => "Wines",
            SpendCategory::Fruits => "Fruits",
            SpendCategory::Meat => "Meat",
            SpendCategory::Fish => "Fish",
            SpendCategory::Sweets => "Sweets",
            SpendCategory::Gold => "Gold",
        }
    }
}
