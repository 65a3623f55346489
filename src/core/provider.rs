//! Data source abstractions

use crate::core::error::FetchError;
use crate::core::fund::{CompanyListing, Fund, HistoricalValuePoint};
use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;

/// Snapshot data: the company roster and the fund yield roster.
#[async_trait]
pub trait FundDataProvider: Send + Sync {
    async fn fetch_companies(&self) -> Result<Vec<CompanyListing>>;

    /// Funds in the order the source lists them.
    async fn fetch_yields(&self) -> Result<Vec<Fund>>;
}

#[async_trait]
pub trait SeriesFetcher: Send + Sync {
    /// Daily values for `code` from `start` up to today, ascending by date.
    async fn fetch_history(
        &self,
        code: &str,
        start: NaiveDate,
    ) -> Result<Vec<HistoricalValuePoint>, FetchError>;
}
