use super::ui;
use crate::store::{FundStore, HistoryStore};
use anyhow::{Context, Result};
use comfy_table::Cell;
use rust_decimal::Decimal;

/// Builds the table of stored funds with their yields and history coverage.
pub fn render(store: &FundStore) -> Result<String> {
    let funds = store.funds().context("Failed to read stored funds")?;
    let companies = store
        .companies()
        .context("Failed to read stored companies")?;

    if funds.is_empty() {
        return Ok("No funds stored yet. Run `fonsync sync` first.".to_string());
    }

    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Fund"),
        ui::header_cell("Title"),
        ui::header_cell("Company"),
        ui::header_cell("TEFAS"),
        ui::header_cell("1M (%)"),
        ui::header_cell("1Y (%)"),
        ui::header_cell("Latest"),
        ui::header_cell("Points"),
    ]);

    let yield_cell = |value: Option<Decimal>| ui::format_optional_cell(value, |v| format!("{v:.2}"));
    for fund in &funds {
        let latest = store
            .latest_date(&fund.code)
            .with_context(|| format!("Failed to read history of {}", fund.code))?;
        let points = store.point_count(&fund.code)?;
        let company = fund
            .management_company_id
            .as_deref()
            .map(|id| {
                companies
                    .iter()
                    .find(|c| c.code == id)
                    .map_or(id.to_string(), |c| c.title.clone())
            })
            .unwrap_or_default();

        table.add_row(vec![
            Cell::new(&fund.code),
            Cell::new(&fund.title),
            Cell::new(company),
            Cell::new(if fund.tefas { "yes" } else { "no" }),
            yield_cell(fund.yields.m1),
            yield_cell(fund.yields.y1),
            ui::format_optional_cell(latest, |d| d.format("%Y-%m-%d").to_string()),
            Cell::new(points),
        ]);
    }

    Ok(format!(
        "{}\n\n{}\n\n{} {}  {} {}",
        ui::style_text("Stored funds", ui::StyleType::Title),
        table,
        ui::style_text("Funds:", ui::StyleType::TotalLabel),
        funds.len(),
        ui::style_text("Companies:", ui::StyleType::TotalLabel),
        companies.len()
    ))
}

pub fn run(store: &FundStore) -> Result<()> {
    println!("{}", render(store)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Fund, HistoricalValuePoint, ManagementCompany, YieldSet};
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;
    use tempfile::TempDir;

    #[test]
    fn test_render_empty_store() {
        let dir = TempDir::new().unwrap();
        let store = FundStore::open(dir.path()).unwrap();

        assert!(render(&store).unwrap().contains("No funds stored yet"));
    }

    #[test]
    fn test_render_lists_latest_date_and_company() {
        let dir = TempDir::new().unwrap();
        let store = FundStore::open(dir.path()).unwrap();
        store
            .upsert_companies(&[ManagementCompany {
                code: "AKP".to_string(),
                title: "Ak Portfoy".to_string(),
                logo: None,
            }])
            .unwrap();
        store
            .upsert_funds(&[Fund {
                code: "AAA".to_string(),
                management_company_id: Some("AKP".to_string()),
                title: "A Fund".to_string(),
                category: None,
                tefas: true,
                yields: YieldSet {
                    m1: Some(dec!(2.5)),
                    ..Default::default()
                },
            }])
            .unwrap();
        store
            .upsert_points(
                "AAA",
                &[HistoricalValuePoint::new(
                    NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
                    dec!(12.0),
                )],
            )
            .unwrap();

        let output = render(&store).unwrap();

        assert!(output.contains("AAA"));
        assert!(output.contains("Ak Portfoy"));
        assert!(output.contains("2024-06-01"));
        assert!(output.contains("2.50"));
    }
}
