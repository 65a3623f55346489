//! Fund reference data and price history records

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A management company as listed by the data source, before its logo is resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompanyListing {
    pub code: String,
    pub title: String,
    pub logo_url: Option<String>,
}

/// A management company as persisted. `logo` is a file name under the logo directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManagementCompany {
    pub code: String,
    pub title: String,
    pub logo: Option<String>,
}

/// Trailing-period yields in percent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct YieldSet {
    pub m1: Option<Decimal>,
    pub m3: Option<Decimal>,
    pub m6: Option<Decimal>,
    pub ytd: Option<Decimal>,
    pub y1: Option<Decimal>,
    pub y3: Option<Decimal>,
    pub y5: Option<Decimal>,
}

/// Yield snapshot of a single fund. `code` is the stable identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fund {
    pub code: String,
    pub management_company_id: Option<String>,
    pub title: String,
    pub category: Option<String>,
    /// Whether the fund trades on TEFAS.
    pub tefas: bool,
    pub yields: YieldSet,
}

/// One daily price of a fund.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoricalValuePoint {
    pub date: NaiveDate,
    pub value: Decimal,
}

impl HistoricalValuePoint {
    pub fn new(date: NaiveDate, value: Decimal) -> Self {
        Self { date, value }
    }
}
