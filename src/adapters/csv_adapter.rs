//! CSV file price provider.
//!
//! One file per ticker, `<base>/<TICKER>.csv`, with a header row containing
//! `Date` and either `Adj Close` or `Close`. Adjusted close is preferred.
//! Rows whose price cell is empty are skipped.

use crate::domain::error::PortfolioError;
use crate::domain::price_series::{PricePoint, PriceSeries};
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use std::fs;
use std::path::PathBuf;

const DATE_COLUMN: &str = "date";
const PRICE_COLUMNS: [&str; 2] = ["adj close", "close"];

pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, asset: &str) -> PathBuf {
        self.base_path.join(format!("{asset}.csv"))
    }
}

fn column_index(headers: &csv::StringRecord, name: &str) -> Option<usize> {
    headers
        .iter()
        .position(|h| h.trim().eq_ignore_ascii_case(name))
}

impl DataPort for CsvAdapter {
    fn fetch_prices(
        &self,
        asset: &str,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<PriceSeries, PortfolioError> {
        let path = self.csv_path(asset);
        let content = fs::read_to_string(&path).map_err(|e| {
            PortfolioError::data_source(asset, format!("failed to read {}: {}", path.display(), e))
        })?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let headers = rdr
            .headers()
            .map_err(|e| PortfolioError::data_source(asset, format!("CSV header error: {e}")))?
            .clone();

        let date_idx = column_index(&headers, DATE_COLUMN)
            .ok_or_else(|| PortfolioError::data_source(asset, "missing Date column"))?;
        let price_idx = PRICE_COLUMNS
            .iter()
            .find_map(|name| column_index(&headers, name))
            .ok_or_else(|| {
                PortfolioError::data_source(asset, "could not find 'Adj Close' or 'Close' column")
            })?;

        let mut points = Vec::new();
        for result in rdr.records() {
            let record = result
                .map_err(|e| PortfolioError::data_source(asset, format!("CSV parse error: {e}")))?;

            let date_str = record
                .get(date_idx)
                .ok_or_else(|| PortfolioError::data_source(asset, "missing date value"))?;
            let date = NaiveDate::parse_from_str(date_str.trim(), "%Y-%m-%d").map_err(|e| {
                PortfolioError::data_source(asset, format!("invalid date '{date_str}': {e}"))
            })?;

            if start_date.is_some_and(|s| date < s) || end_date.is_some_and(|e| date > e) {
                continue;
            }

            let price_str = record.get(price_idx).unwrap_or("").trim();
            if price_str.is_empty() {
                continue;
            }
            let price: f64 = price_str.parse().map_err(|e| {
                PortfolioError::data_source(asset, format!("invalid price '{price_str}' on {date}: {e}"))
            })?;

            points.push(PricePoint { date, price });
        }

        if points.is_empty() {
            return Err(PortfolioError::data_source(asset, "no prices in requested range"));
        }

        points.sort_by_key(|p| p.date);
        Ok(PriceSeries::new(asset, points))
    }

    fn list_assets(&self) -> Result<Vec<String>, PortfolioError> {
        let entries = fs::read_dir(&self.base_path).map_err(|e| {
            PortfolioError::data_source(
                "*",
                format!("failed to read directory {}: {}", self.base_path.display(), e),
            )
        })?;

        let mut assets = Vec::new();
        for entry in entries {
            let entry = entry
                .map_err(|e| PortfolioError::data_source("*", format!("directory entry error: {e}")))?;
            let name = entry.file_name();
            let name_str = name.to_string_lossy();
            if let Some(asset) = name_str.strip_suffix(".csv") {
                assets.push(asset.to_string());
            }
        }

        assets.sort();
        Ok(assets)
    }
}
