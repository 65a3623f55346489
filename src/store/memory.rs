use crate::core::{HistoricalValuePoint, StoreError};
use crate::store::HistoryStore;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::sync::{Mutex, PoisonError};
use tracing::debug;

type HistoryKey = (String, NaiveDate);

/// In-memory history store. Nothing survives the process.
#[derive(Default)]
pub struct MemoryStore {
    history: Mutex<BTreeMap<HistoryKey, Decimal>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of points across all funds.
    pub fn len(&self) -> usize {
        self.history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn fund_range(code: &str) -> std::ops::RangeInclusive<HistoryKey> {
        (code.to_string(), NaiveDate::MIN)..=(code.to_string(), NaiveDate::MAX)
    }
}

impl HistoryStore for MemoryStore {
    fn latest_date(&self, code: &str) -> Result<Option<NaiveDate>, StoreError> {
        let history = self.history.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(history
            .range(Self::fund_range(code))
            .next_back()
            .map(|((_, date), _)| *date))
    }

    fn upsert_points(
        &self,
        code: &str,
        points: &[HistoricalValuePoint],
    ) -> Result<usize, StoreError> {
        let mut history = self.history.lock().unwrap_or_else(PoisonError::into_inner);
        for point in points {
            history.insert((code.to_string(), point.date), point.value);
        }
        debug!(fund = %code, count = points.len(), "Memory store PUT");
        Ok(points.len())
    }

    fn points(&self, code: &str) -> Result<Vec<HistoricalValuePoint>, StoreError> {
        let history = self.history.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(history
            .range(Self::fund_range(code))
            .map(|((_, date), value)| HistoricalValuePoint::new(*date, *value))
            .collect())
    }
}
