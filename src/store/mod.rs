pub mod disk;
pub mod memory;

use crate::core::{HistoricalValuePoint, StoreError};
use chrono::NaiveDate;

pub use disk::FundStore;
pub use memory::MemoryStore;

/// Daily price history keyed by `(fund code, date)`.
pub trait HistoryStore: Send + Sync {
    /// Most recent stored date for a fund, `None` if it has no history.
    fn latest_date(&self, code: &str) -> Result<Option<NaiveDate>, StoreError>;

    /// Inserts or overwrites every point as one atomic unit. Returns the number written.
    fn upsert_points(
        &self,
        code: &str,
        points: &[HistoricalValuePoint],
    ) -> Result<usize, StoreError>;

    /// All stored points of a fund, ascending by date.
    fn points(&self, code: &str) -> Result<Vec<HistoricalValuePoint>, StoreError>;
}
