//! Applies fetched history to the store.

use crate::core::{HistoricalValuePoint, StoreError};
use crate::store::HistoryStore;
use std::collections::BTreeMap;
use tracing::debug;

/// Orders points by date. A date seen twice keeps the value seen last.
pub fn normalize(points: Vec<HistoricalValuePoint>) -> Vec<HistoricalValuePoint> {
    points
        .into_iter()
        .map(|point| (point.date, point.value))
        .collect::<BTreeMap<_, _>>()
        .into_iter()
        .map(|(date, value)| HistoricalValuePoint::new(date, value))
        .collect()
}

/// Upserts one fund's batch as a single unit and returns how many points were applied.
///
/// Re-applying the same batch leaves the store unchanged.
pub fn merge(
    store: &dyn HistoryStore,
    code: &str,
    points: Vec<HistoricalValuePoint>,
) -> Result<usize, StoreError> {
    let points = normalize(points);
    if points.is_empty() {
        debug!(fund = %code, "Nothing to merge");
        return Ok(0);
    }

    let applied = store.upsert_points(code, &points)?;
    debug!(
        fund = %code,
        applied,
        first = %points[0].date,
        last = %points[points.len() - 1].date,
        "Merged history"
    );
    Ok(applied)
}
