use crate::core::{Fund, HistoricalValuePoint, ManagementCompany, StoreError};
use crate::store::HistoryStore;
use chrono::NaiveDate;
use fjall::{Keyspace, PartitionCreateOptions, PartitionHandle, PersistMode};
use rust_decimal::Decimal;
use std::path::Path;
use tracing::debug;

const COMPANIES: &str = "fund_management_companies";
const FUNDS: &str = "fund_yields";
const HISTORY: &str = "fund_historical_values";

const KEY_SEPARATOR: u8 = 0;
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Persistent fund store backed by a fjall keyspace.
///
/// Each table is a partition. History keys are `code \0 YYYY-MM-DD`, so the keys of
/// one fund are contiguous and ordered by date.
pub struct FundStore {
    keyspace: Keyspace,
    companies: PartitionHandle,
    funds: PartitionHandle,
    history: PartitionHandle,
}

impl FundStore {
    /// Opens the store at `path`, creating the directory and partitions if missing.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let keyspace = fjall::Config::new(path).open()?;
        let companies = keyspace.open_partition(COMPANIES, PartitionCreateOptions::default())?;
        let funds = keyspace.open_partition(FUNDS, PartitionCreateOptions::default())?;
        let history = keyspace.open_partition(HISTORY, PartitionCreateOptions::default())?;
        debug!(path = %path.display(), "Opened fund store");

        Ok(Self {
            keyspace,
            companies,
            funds,
            history,
        })
    }

    pub fn upsert_companies(&self, companies: &[ManagementCompany]) -> Result<usize, StoreError> {
        let mut batch = self.keyspace.batch();
        for company in companies {
            batch.insert(
                &self.companies,
                company.code.as_bytes(),
                serde_json::to_vec(company)?,
            );
        }
        batch.commit()?;
        debug!(count = companies.len(), "Stored companies");
        Ok(companies.len())
    }

    pub fn upsert_funds(&self, funds: &[Fund]) -> Result<usize, StoreError> {
        let mut batch = self.keyspace.batch();
        for fund in funds {
            batch.insert(&self.funds, fund.code.as_bytes(), serde_json::to_vec(fund)?);
        }
        batch.commit()?;
        debug!(count = funds.len(), "Stored fund yields");
        Ok(funds.len())
    }

    pub fn companies(&self) -> Result<Vec<ManagementCompany>, StoreError> {
        self.companies
            .iter()
            .map(|kv| {
                let (_, value) = kv?;
                Ok(serde_json::from_slice(&value)?)
            })
            .collect()
    }

    /// All stored funds, ordered by code.
    pub fn funds(&self) -> Result<Vec<Fund>, StoreError> {
        self.funds
            .iter()
            .map(|kv| {
                let (_, value) = kv?;
                Ok(serde_json::from_slice(&value)?)
            })
            .collect()
    }

    pub fn fund(&self, code: &str) -> Result<Option<Fund>, StoreError> {
        match self.funds.get(code.as_bytes())? {
            Some(value) => Ok(Some(serde_json::from_slice(&value)?)),
            None => Ok(None),
        }
    }

    pub fn point_count(&self, code: &str) -> Result<usize, StoreError> {
        let mut count = 0;
        for kv in self.history.prefix(history_prefix(code)) {
            kv?;
            count += 1;
        }
        Ok(count)
    }

    /// Flushes the journal to disk.
    pub fn persist(&self) -> Result<(), StoreError> {
        self.keyspace.persist(PersistMode::SyncAll)?;
        Ok(())
    }
}

impl HistoryStore for FundStore {
    fn latest_date(&self, code: &str) -> Result<Option<NaiveDate>, StoreError> {
        let prefix = history_prefix(code);
        match self.history.prefix(&prefix).next_back() {
            Some(kv) => {
                let (key, _) = kv?;
                Ok(Some(decode_date(&key[prefix.len()..])?))
            }
            None => Ok(None),
        }
    }

    fn upsert_points(
        &self,
        code: &str,
        points: &[HistoricalValuePoint],
    ) -> Result<usize, StoreError> {
        let mut batch = self.keyspace.batch();
        for point in points {
            batch.insert(
                &self.history,
                history_key(code, point.date),
                serde_json::to_vec(&point.value)?,
            );
        }
        batch.commit()?;
        Ok(points.len())
    }

    fn points(&self, code: &str) -> Result<Vec<HistoricalValuePoint>, StoreError> {
        let prefix = history_prefix(code);
        self.history
            .prefix(&prefix)
            .map(|kv| {
                let (key, value) = kv?;
                let date = decode_date(&key[prefix.len()..])?;
                let value: Decimal = serde_json::from_slice(&value)?;
                Ok(HistoricalValuePoint::new(date, value))
            })
            .collect()
    }
}

fn history_prefix(code: &str) -> Vec<u8> {
    let mut prefix = Vec::with_capacity(code.len() + 1);
    prefix.extend_from_slice(code.as_bytes());
    prefix.push(KEY_SEPARATOR);
    prefix
}

fn history_key(code: &str, date: NaiveDate) -> Vec<u8> {
    let mut key = history_prefix(code);
    key.extend_from_slice(date.format(DATE_FORMAT).to_string().as_bytes());
    key
}

fn decode_date(raw: &[u8]) -> Result<NaiveDate, StoreError> {
    let text = std::str::from_utf8(raw).map_err(|e| StoreError::Key(e.to_string()))?;
    NaiveDate::parse_from_str(text, DATE_FORMAT)
        .map_err(|e| StoreError::Key(format!("{text}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::YieldSet;
    use rust_decimal_macros::dec;
    use tempfile::tempdir;

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn fund(code: &str, title: &str) -> Fund {
        Fund {
            code: code.to_string(),
            management_company_id: Some("AKP".to_string()),
            title: title.to_string(),
            category: Some("Hisse Senedi".to_string()),
            tefas: true,
            yields: YieldSet {
                m1: Some(dec!(1.25)),
                y1: Some(dec!(48.9)),
                ..Default::default()
            },
        }
    }

    #[test]
    fn test_latest_date_ignores_funds_sharing_a_prefix() {
        let dir = tempdir().unwrap();
        let store = FundStore::open(dir.path()).unwrap();

        store
            .upsert_points(
                "AA",
                &[
                    HistoricalValuePoint::new(day("2024-05-30"), dec!(9.0)),
                    HistoricalValuePoint::new(day("2024-05-28"), dec!(8.9)),
                ],
            )
            .unwrap();
        store
            .upsert_points(
                "AAB",
                &[HistoricalValuePoint::new(day("2024-06-10"), dec!(3.0))],
            )
            .unwrap();

        assert_eq!(store.latest_date("AA").unwrap(), Some(day("2024-05-30")));
        assert_eq!(store.latest_date("AAB").unwrap(), Some(day("2024-06-10")));
        assert_eq!(store.latest_date("A").unwrap(), None);
        assert_eq!(store.point_count("AA").unwrap(), 2);
    }

    #[test]
    fn test_upsert_points_overwrites_same_day() {
        let dir = tempdir().unwrap();
        let store = FundStore::open(dir.path()).unwrap();
        let date = day("2024-06-01");

        store
            .upsert_points("AAA", &[HistoricalValuePoint::new(date, dec!(12.0))])
            .unwrap();
        store
            .upsert_points("AAA", &[HistoricalValuePoint::new(date, dec!(12.5))])
            .unwrap();

        assert_eq!(
            store.points("AAA").unwrap(),
            vec![HistoricalValuePoint::new(date, dec!(12.5))]
        );
    }

    #[test]
    fn test_points_are_ordered_by_date() {
        let dir = tempdir().unwrap();
        let store = FundStore::open(dir.path()).unwrap();

        store
            .upsert_points(
                "BBB",
                &[
                    HistoricalValuePoint::new(day("2024-06-01"), dec!(3)),
                    HistoricalValuePoint::new(day("2023-12-31"), dec!(1)),
                    HistoricalValuePoint::new(day("2024-01-02"), dec!(2)),
                ],
            )
            .unwrap();

        let dates: Vec<_> = store
            .points("BBB")
            .unwrap()
            .into_iter()
            .map(|p| p.date)
            .collect();
        assert_eq!(
            dates,
            vec![day("2023-12-31"), day("2024-01-02"), day("2024-06-01")]
        );
    }

    #[test]
    fn test_fund_snapshot_is_overwritten_by_code() {
        let dir = tempdir().unwrap();
        let store = FundStore::open(dir.path()).unwrap();

        store.upsert_funds(&[fund("AAA", "Old title")]).unwrap();
        store
            .upsert_funds(&[fund("AAA", "New title"), fund("BBB", "Other")])
            .unwrap();

        let funds = store.funds().unwrap();
        assert_eq!(funds.len(), 2);
        assert_eq!(store.fund("AAA").unwrap().unwrap().title, "New title");
        assert_eq!(
            store.fund("AAA").unwrap().unwrap().yields.y1,
            Some(dec!(48.9))
        );
        assert!(store.fund("CCC").unwrap().is_none());
    }

    #[test]
    fn test_companies_round_trip() {
        let dir = tempdir().unwrap();
        let store = FundStore::open(dir.path()).unwrap();
        let company = ManagementCompany {
            code: "AKP".to_string(),
            title: "Ak Portföy".to_string(),
            logo: Some("akp.png".to_string()),
        };

        store.upsert_companies(&[company.clone()]).unwrap();
        store.persist().unwrap();

        assert_eq!(store.companies().unwrap(), vec![company]);
    }
}
