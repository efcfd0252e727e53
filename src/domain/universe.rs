//! Asset universe: ticker list parsing and price retrieval.
//!
//! Retrieval is all-or-nothing: the first provider error stops the run.

use crate::domain::error::PortfolioError;
use crate::domain::price_series::PriceSeries;
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AssetListError {
    #[error("no tickers given")]
    Empty,

    #[error("duplicate ticker: {0}")]
    DuplicateAsset(String),
}

/// Splits on commas and whitespace, upper-cases, rejects duplicates.
pub fn parse_assets(input: &str) -> Result<Vec<String>, AssetListError> {
    let mut assets = Vec::new();
    let mut seen = HashSet::new();

    for token in input.split(|c: char| c == ',' || c.is_whitespace()) {
        let trimmed = token.trim();
        if trimmed.is_empty() {
            continue;
        }
        let asset = trimmed.to_uppercase();
        if !seen.insert(asset.clone()) {
            return Err(AssetListError::DuplicateAsset(asset));
        }
        assets.push(asset);
    }

    if assets.is_empty() {
        return Err(AssetListError::Empty);
    }
    Ok(assets)
}

pub fn fetch_universe(
    data_port: &dyn DataPort,
    assets: &[String],
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
) -> Result<Vec<PriceSeries>, PortfolioError> {
    let mut series = Vec::with_capacity(assets.len());
    for asset in assets {
        let prices = data_port.fetch_prices(asset, start_date, end_date)?;
        if prices.is_empty() {
            return Err(PortfolioError::data_source(asset, "no prices in range"));
        }
        tracing::info!(asset = %asset, observations = prices.len(), "loaded prices");
        series.push(prices);
    }
    Ok(series)
}
