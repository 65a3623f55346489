//! Per-fund incremental history synchronization.

use crate::checkpoint::{Checkpoint, CheckpointResolver, Resolution, SkipReason};
use crate::core::{Fund, SeriesFetcher, SyncError};
use crate::merge;
use crate::store::HistoryStore;
use chrono::{Local, NaiveDate};
use tracing::{error, info};

#[derive(Debug)]
pub enum FundStatus {
    Skipped(SkipReason),
    Merged { from: NaiveDate, applied: usize },
    Failed(SyncError),
}

/// Terminal state of one fund in a run.
#[derive(Debug)]
pub struct FundOutcome {
    pub code: String,
    pub status: FundStatus,
    /// The checkpoint could not be read and a full backfill was attempted instead.
    pub degraded_checkpoint: bool,
}

/// Outcomes of a run, in roster order.
#[derive(Debug, Default)]
pub struct SyncReport {
    pub date: Option<NaiveDate>,
    pub outcomes: Vec<FundOutcome>,
}

impl SyncReport {
    pub fn merged(&self) -> usize {
        self.count(|s| matches!(s, FundStatus::Merged { .. }))
    }

    pub fn skipped(&self) -> usize {
        self.count(|s| matches!(s, FundStatus::Skipped(_)))
    }

    pub fn failed(&self) -> usize {
        self.count(|s| matches!(s, FundStatus::Failed(_)))
    }

    pub fn points_applied(&self) -> usize {
        self.outcomes
            .iter()
            .map(|o| match o.status {
                FundStatus::Merged { applied, .. } => applied,
                _ => 0,
            })
            .sum()
    }

    pub fn outcome(&self, code: &str) -> Option<&FundOutcome> {
        self.outcomes.iter().find(|o| o.code == code)
    }

    fn count(&self, predicate: impl Fn(&FundStatus) -> bool) -> usize {
        self.outcomes.iter().filter(|o| predicate(&o.status)).count()
    }
}

/// Runs resolve, fetch and merge for each fund, one fund at a time.
pub struct SyncDriver<'a> {
    store: &'a dyn HistoryStore,
    fetcher: &'a dyn SeriesFetcher,
    resolver: CheckpointResolver,
}

impl<'a> SyncDriver<'a> {
    pub fn new(
        store: &'a dyn HistoryStore,
        fetcher: &'a dyn SeriesFetcher,
        resolver: CheckpointResolver,
    ) -> Self {
        Self {
            store,
            fetcher,
            resolver,
        }
    }

    pub async fn run(&self, roster: &[Fund]) -> SyncReport {
        self.run_on(roster, Local::now().date_naive(), &|_| {}).await
    }

    /// Syncs every fund of the roster as of `today`. A failing fund never stops the run.
    /// `on_fund` is called after each fund reaches its terminal state.
    pub async fn run_on(
        &self,
        roster: &[Fund],
        today: NaiveDate,
        on_fund: &dyn Fn(&FundOutcome),
    ) -> SyncReport {
        info!(funds = roster.len(), %today, "Starting history sync");
        let mut report = SyncReport {
            date: Some(today),
            outcomes: Vec::with_capacity(roster.len()),
        };

        for fund in roster {
            let outcome = self.sync_fund(&fund.code, today).await;
            on_fund(&outcome);
            report.outcomes.push(outcome);
        }

        info!(
            merged = report.merged(),
            skipped = report.skipped(),
            failed = report.failed(),
            points = report.points_applied(),
            "History sync finished"
        );
        report
    }

    pub async fn sync_fund(&self, code: &str, today: NaiveDate) -> FundOutcome {
        let Resolution {
            checkpoint,
            degraded,
        } = self.resolver.resolve(self.store, code, today);

        let status = match checkpoint {
            Checkpoint::Skip(reason) => {
                info!(fund = %code, %reason, "Skipping fund");
                FundStatus::Skipped(reason)
            }
            Checkpoint::FetchFrom(from) => match self.fetch_and_merge(code, from).await {
                Ok(applied) => {
                    info!(fund = %code, %from, applied, "Fund history updated");
                    FundStatus::Merged { from, applied }
                }
                Err(e) => {
                    error!(fund = %code, %from, error = %e, "Fund history sync failed");
                    FundStatus::Failed(e)
                }
            },
        };

        FundOutcome {
            code: code.to_string(),
            status,
            degraded_checkpoint: degraded.is_some(),
        }
    }

    /// Checkpoints for every fund without fetching anything.
    pub fn plan(&self, roster: &[Fund], today: NaiveDate) -> Vec<(String, Resolution)> {
        roster
            .iter()
            .map(|fund| {
                (
                    fund.code.clone(),
                    self.resolver.resolve(self.store, &fund.code, today),
                )
            })
            .collect()
    }

    async fn fetch_and_merge(&self, code: &str, from: NaiveDate) -> Result<usize, SyncError> {
        let points = self.fetcher.fetch_history(code, from).await?;
        merge::merge(self.store, code, points).map_err(SyncError::Merge)
    }
}
