//! Core domain types and abstractions

pub mod config;
pub mod error;
pub mod fund;
pub mod log;
pub mod provider;

// Re-export main types for cleaner imports
pub use error::{FetchError, StoreError, SyncError};
pub use fund::{CompanyListing, Fund, HistoricalValuePoint, ManagementCompany, YieldSet};
pub use provider::{FundDataProvider, SeriesFetcher};
