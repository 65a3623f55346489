//! Decides where each fund's history download resumes.

use crate::core::StoreError;
use crate::store::HistoryStore;
use chrono::{Days, Months, NaiveDate};
use std::fmt::Display;
use tracing::{debug, warn};

/// What to do with a fund whose last stored value lies in the past.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StalenessPolicy {
    /// Always resume from the day after the last stored value.
    #[default]
    Resume,
    /// Skip funds whose last stored value is more than `days` old.
    SkipAfter { days: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    AlreadyCurrent,
    Stale { last: NaiveDate },
}

impl Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::AlreadyCurrent => write!(f, "already current"),
            SkipReason::Stale { last } => write!(f, "stale since {last}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Checkpoint {
    FetchFrom(NaiveDate),
    Skip(SkipReason),
}

impl Display for Checkpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Checkpoint::FetchFrom(date) => write!(f, "fetch from {date}"),
            Checkpoint::Skip(reason) => write!(f, "skip ({reason})"),
        }
    }
}

/// A checkpoint plus the store error it was degraded from, if any.
#[derive(Debug)]
pub struct Resolution {
    pub checkpoint: Checkpoint,
    pub degraded: Option<StoreError>,
}

#[derive(Debug, Clone, Copy)]
pub struct CheckpointResolver {
    backfill_years: u32,
    staleness: StalenessPolicy,
}

impl Default for CheckpointResolver {
    fn default() -> Self {
        Self::new(5, StalenessPolicy::Resume)
    }
}

impl CheckpointResolver {
    pub fn new(backfill_years: u32, staleness: StalenessPolicy) -> Self {
        Self {
            backfill_years,
            staleness,
        }
    }

    /// First day of a full download for a fund without history.
    pub fn backfill_start(&self, today: NaiveDate) -> NaiveDate {
        today
            .checked_sub_months(Months::new(self.backfill_years.saturating_mul(12)))
            .unwrap_or(NaiveDate::MIN)
    }

    /// Pure decision from the latest stored date.
    pub fn decide(&self, latest: Option<NaiveDate>, today: NaiveDate) -> Checkpoint {
        let Some(last) = latest else {
            return Checkpoint::FetchFrom(self.backfill_start(today));
        };

        if let StalenessPolicy::SkipAfter { days } = self.staleness
            && let Some(cutoff) = today.checked_sub_days(Days::new(days.into()))
            && last < cutoff
        {
            return Checkpoint::Skip(SkipReason::Stale { last });
        }

        if last >= today {
            return Checkpoint::Skip(SkipReason::AlreadyCurrent);
        }

        last.succ_opt()
            .map_or(Checkpoint::Skip(SkipReason::AlreadyCurrent), Checkpoint::FetchFrom)
    }

    /// Reads the fund's latest date from the store and decides.
    ///
    /// A failed read falls back to a full backfill so the fund is still attempted;
    /// the merge is idempotent, so the only cost is a redundant download.
    pub fn resolve(&self, store: &dyn HistoryStore, code: &str, today: NaiveDate) -> Resolution {
        match store.latest_date(code) {
            Ok(latest) => {
                let checkpoint = self.decide(latest, today);
                debug!(fund = %code, ?latest, %checkpoint, "Resolved checkpoint");
                Resolution {
                    checkpoint,
                    degraded: None,
                }
            }
            Err(e) => {
                let start = self.backfill_start(today);
                warn!(
                    fund = %code,
                    error = %e,
                    %start,
                    "Could not read latest stored date, falling back to full backfill"
                );
                Resolution {
                    checkpoint: Checkpoint::FetchFrom(start),
                    degraded: Some(e),
                }
            }
        }
    }
}
