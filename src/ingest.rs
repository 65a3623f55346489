//! Company and yield snapshot ingestion.

use crate::core::{Fund, FundDataProvider, ManagementCompany};
use crate::providers::LogoStore;
use crate::store::FundStore;
use anyhow::{Context, Result};
use tracing::info;

/// Fetches the company roster, saves logos and upserts every company.
pub async fn ingest_companies(
    provider: &dyn FundDataProvider,
    logos: &LogoStore,
    store: &FundStore,
) -> Result<usize> {
    let listings = provider
        .fetch_companies()
        .await
        .context("Failed to fetch management companies")?;

    let mut companies = Vec::with_capacity(listings.len());
    for listing in listings {
        let logo = logos.download_and_save(listing.logo_url.as_deref()).await;
        companies.push(ManagementCompany {
            code: listing.code,
            title: listing.title,
            logo,
        });
    }

    let count = store
        .upsert_companies(&companies)
        .context("Failed to store management companies")?;
    info!(count, "Stored management companies");
    Ok(count)
}

/// Fetches and upserts the yield snapshot. Returns the funds in source order.
pub async fn ingest_yields(provider: &dyn FundDataProvider, store: &FundStore) -> Result<Vec<Fund>> {
    let funds = provider
        .fetch_yields()
        .await
        .context("Failed to fetch fund yields")?;

    let count = store
        .upsert_funds(&funds)
        .context("Failed to store fund yields")?;
    info!(count, "Stored fund yields");
    Ok(funds)
}
