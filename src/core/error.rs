use thiserror::Error;

/// Failures of the local fund store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage engine error: {0}")]
    Engine(#[from] fjall::Error),

    #[error("corrupt record: {0}")]
    Codec(#[from] serde_json::Error),

    #[error("corrupt history key: {0}")]
    Key(String),
}

/// Failures while retrieving a fund's price history.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected status {status} from {url}")]
    Status { status: u16, url: String },

    #[error("malformed payload: {0}")]
    Malformed(String),
}

/// Why a single fund failed to sync. Never aborts the rest of the run.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("fetch failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("merge failed: {0}")]
    Merge(#[source] StoreError),
}
