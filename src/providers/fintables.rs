use super::util::with_retry;
use crate::core::{
    CompanyListing, FetchError, Fund, FundDataProvider, HistoricalValuePoint, SeriesFetcher,
    YieldSet,
};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, error, instrument};

/// Client for the Fintables fund endpoints.
pub struct FintablesProvider {
    base_url: String,
    client: reqwest::Client,
}

impl FintablesProvider {
    pub fn new(base_url: &str, client: reqwest::Client) -> Self {
        FintablesProvider {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        }
    }

    async fn get_text(&self, url: &str) -> Result<String> {
        let response = with_retry(
            || async move { self.client.get(url).send().await?.error_for_status() },
            3,
            500,
        )
        .await
        .with_context(|| format!("Request to {url} failed"))?;

        response
            .text()
            .await
            .with_context(|| format!("Failed to get response text from {url}"))
    }
}

#[derive(Debug, Deserialize)]
struct CompanyRecord {
    code: String,
    title: String,
    logo: Option<String>,
}

#[derive(Debug, Deserialize)]
struct YieldsResponse {
    results: Vec<YieldRecord>,
}

#[derive(Debug, Deserialize)]
struct YieldRecord {
    code: String,
    management_company_id: Option<String>,
    title: String,
    #[serde(rename = "type")]
    category: Option<String>,
    tefas: Option<bool>,
    yield_1m: Option<Decimal>,
    yield_3m: Option<Decimal>,
    yield_6m: Option<Decimal>,
    yield_ytd: Option<Decimal>,
    yield_1y: Option<Decimal>,
    yield_3y: Option<Decimal>,
    yield_5y: Option<Decimal>,
}

impl From<YieldRecord> for Fund {
    fn from(record: YieldRecord) -> Self {
        Fund {
            code: record.code,
            management_company_id: record.management_company_id,
            title: record.title,
            category: record.category,
            tefas: record.tefas.unwrap_or(false),
            yields: YieldSet {
                m1: record.yield_1m,
                m3: record.yield_3m,
                m6: record.yield_6m,
                ytd: record.yield_ytd,
                y1: record.yield_1y,
                y3: record.yield_3y,
                y5: record.yield_5y,
            },
        }
    }
}

#[async_trait]
impl FundDataProvider for FintablesProvider {
    async fn fetch_companies(&self) -> Result<Vec<CompanyListing>> {
        let url = format!("{}/fund-management-companies/", self.base_url);
        let body = self.get_text(&url).await?;

        let records: Vec<CompanyRecord> = match serde_json::from_str(&body) {
            Ok(data) => data,
            Err(e) => {
                error!(error = ?e, response = %body, "Failed to parse company list");
                return Err(e).context("Company list is not in the expected format (a list)");
            }
        };

        debug!(count = records.len(), "Fetched management companies");
        Ok(records
            .into_iter()
            .map(|r| CompanyListing {
                code: r.code,
                title: r.title,
                logo_url: r.logo.filter(|url| !url.trim().is_empty()),
            })
            .collect())
    }

    async fn fetch_yields(&self) -> Result<Vec<Fund>> {
        let url = format!("{}/funds/yield/", self.base_url);
        let body = self.get_text(&url).await?;

        let response: YieldsResponse = match serde_json::from_str(&body) {
            Ok(data) => data,
            Err(e) => {
                error!(error = ?e, response = %body, "Failed to parse fund yields");
                return Err(e).context("Fund yields are not in the expected format");
            }
        };

        debug!(count = response.results.len(), "Fetched fund yields");
        Ok(response.results.into_iter().map(Fund::from).collect())
    }
}

#[async_trait]
impl SeriesFetcher for FintablesProvider {
    #[instrument(skip(self))]
    async fn fetch_history(
        &self,
        code: &str,
        start: NaiveDate,
    ) -> Result<Vec<HistoricalValuePoint>, FetchError> {
        let url = format!(
            "{}/funds/{}/chart/?start_date={}",
            self.base_url,
            code,
            start.format("%Y-%m-%d")
        );
        debug!("Requesting history from {}", url);

        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                url,
            });
        }

        let body = response.text().await?;
        let points = parse_history(code, &body)?;
        debug!(count = points.len(), "Fetched history");
        Ok(points)
    }
}

/// Extracts `results.data` rows into typed points.
///
/// Each row carries its value under the fund code itself, e.g.
/// `{"date": "2024-05-31", "AAA": 1.2345}`. Rows with a `null` value are dropped.
fn parse_history(code: &str, body: &str) -> Result<Vec<HistoricalValuePoint>, FetchError> {
    let payload: Value = serde_json::from_str(body)
        .map_err(|e| FetchError::Malformed(format!("invalid JSON: {e}")))?;

    let rows = payload
        .get("results")
        .and_then(|results| results.get("data"))
        .and_then(Value::as_array)
        .ok_or_else(|| {
            FetchError::Malformed("expected a mapping with a results.data sequence".to_string())
        })?;

    let mut points = Vec::with_capacity(rows.len());
    for row in rows {
        if let Some(point) = point_from_row(code, row)? {
            points.push(point);
        }
    }
    Ok(points)
}

fn point_from_row(code: &str, row: &Value) -> Result<Option<HistoricalValuePoint>, FetchError> {
    let raw_date = row
        .get("date")
        .and_then(Value::as_str)
        .ok_or_else(|| FetchError::Malformed(format!("row without a date: {row}")))?;
    // Some rows carry a time part, the day is all that matters.
    let day = raw_date.get(..10).unwrap_or(raw_date);
    let date = NaiveDate::parse_from_str(day, "%Y-%m-%d")
        .map_err(|e| FetchError::Malformed(format!("invalid date '{raw_date}': {e}")))?;

    match row.get(code) {
        None => Err(FetchError::Malformed(format!(
            "row for {date} has no '{code}' value"
        ))),
        Some(Value::Null) => {
            debug!(%date, "Dropping row without a value");
            Ok(None)
        }
        Some(value) => {
            let value: Decimal = serde_json::from_value(value.clone()).map_err(|e| {
                FetchError::Malformed(format!("invalid value for {date}: {value} ({e})"))
            })?;
            Ok(Some(HistoricalValuePoint::new(date, value)))
        }
    }
}
