use super::ui;
use crate::checkpoint::CheckpointResolver;
use crate::core::config::AppConfig;
use crate::core::{FundDataProvider, SeriesFetcher};
use crate::ingest;
use crate::providers::LogoStore;
use crate::store::{FundStore, HistoryStore};
use crate::sync::{FundOutcome, FundStatus, SyncDriver, SyncReport};
use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use comfy_table::{Cell, Color};

impl SyncReport {
    pub fn display_as_table(&self) -> String {
        let mut table = ui::new_styled_table();
        table.set_header(vec![
            ui::header_cell("Fund"),
            ui::header_cell("Status"),
            ui::header_cell("From"),
            ui::header_cell("Points"),
            ui::header_cell("Note"),
        ]);

        for outcome in &self.outcomes {
            table.add_row(outcome_row(outcome));
        }

        let date = self
            .date
            .map_or("N/A".to_string(), |d| d.format("%Y-%m-%d").to_string());
        let mut output = format!(
            "History sync: {}\n\n",
            ui::style_text(&date, ui::StyleType::Title)
        );
        output.push_str(&table.to_string());

        let failed = self.failed().to_string();
        output.push_str(&format!(
            "\n\n{} {}  {} {}  {} {}  {} {}",
            ui::style_text("Merged:", ui::StyleType::TotalLabel),
            ui::style_text(&self.merged().to_string(), ui::StyleType::Success),
            ui::style_text("Skipped:", ui::StyleType::TotalLabel),
            self.skipped(),
            ui::style_text("Failed:", ui::StyleType::TotalLabel),
            if self.failed() > 0 {
                ui::style_text(&failed, ui::StyleType::Error)
            } else {
                failed
            },
            ui::style_text("Points:", ui::StyleType::TotalLabel),
            self.points_applied(),
        ));
        output
    }
}

fn outcome_row(outcome: &FundOutcome) -> Vec<Cell> {
    let degraded_note = outcome
        .degraded_checkpoint
        .then_some("checkpoint unreadable, full backfill");

    let (status, from, points, note) = match &outcome.status {
        FundStatus::Merged { from, applied } => (
            ui::status_cell("merged", Color::Green),
            Some(*from),
            Some(*applied),
            degraded_note.map(str::to_string),
        ),
        FundStatus::Skipped(reason) => (
            ui::status_cell("skipped", Color::DarkGrey),
            None,
            None,
            Some(reason.to_string()),
        ),
        FundStatus::Failed(e) => (
            ui::status_cell("failed", Color::Red),
            None,
            None,
            Some(e.to_string()),
        ),
    };

    vec![
        Cell::new(&outcome.code),
        status,
        ui::format_optional_cell(from, |d: NaiveDate| d.format("%Y-%m-%d").to_string()),
        ui::format_optional_cell(points, |p| p.to_string()),
        Cell::new(note.unwrap_or_default()),
    ]
}

/// Refreshes companies and yields, then brings every fund's history up to date.
pub async fn run<P>(
    config: &AppConfig,
    store: &FundStore,
    provider: &P,
    logos: &LogoStore,
) -> Result<SyncReport>
where
    P: FundDataProvider + SeriesFetcher,
{
    ingest::ingest_companies(provider, logos, store).await?;
    let roster = ingest::ingest_yields(provider, store).await?;

    let resolver = CheckpointResolver::new(config.sync.backfill_years, config.sync.staleness());
    let driver = SyncDriver::new(store, provider, resolver);
    let today = Local::now().date_naive();

    let pb = ui::new_progress_bar(roster.len() as u64, true);
    pb.set_message("Syncing history...");
    let report = driver
        .run_on(&roster, today, &|outcome| {
            pb.set_message(outcome.code.clone());
            pb.inc(1);
        })
        .await;
    pb.finish_and_clear();

    store.persist().context("Failed to persist fund store")?;
    println!("{}", report.display_as_table());
    Ok(report)
}

/// Prints the checkpoint of every listed fund without downloading or writing anything.
pub async fn plan<P>(config: &AppConfig, store: &FundStore, provider: &P) -> Result<()>
where
    P: FundDataProvider + SeriesFetcher,
{
    let roster = provider
        .fetch_yields()
        .await
        .context("Failed to fetch fund yields")?;

    let resolver = CheckpointResolver::new(config.sync.backfill_years, config.sync.staleness());
    let driver = SyncDriver::new(store, provider, resolver);
    let today = Local::now().date_naive();

    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Fund"),
        ui::header_cell("Latest"),
        ui::header_cell("Plan"),
    ]);
    for (code, resolution) in driver.plan(&roster, today) {
        let latest = store.latest_date(&code).ok().flatten();
        let mut plan = resolution.checkpoint.to_string();
        if let Some(e) = resolution.degraded {
            plan.push_str(&format!(" (store error: {e})"));
        }
        table.add_row(vec![
            Cell::new(&code),
            ui::format_optional_cell(latest, |d| d.format("%Y-%m-%d").to_string()),
            Cell::new(plan),
        ]);
    }

    println!(
        "Sync plan for {}\n\n{}",
        ui::style_text(&today.format("%Y-%m-%d").to_string(), ui::StyleType::Title),
        table
    );
    Ok(())
}
