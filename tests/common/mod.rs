#![allow(dead_code)]

use chrono::NaiveDate;
use sharpeopt::domain::error::PortfolioError;
pub use sharpeopt::domain::price_series::{PricePoint, PriceSeries};
use sharpeopt::ports::data_port::DataPort;
use std::cell::RefCell;
use std::collections::HashMap;

pub struct MockDataPort {
    pub data: HashMap<String, PriceSeries>,
    pub errors: HashMap<String, String>,
    pub requested: RefCell<Vec<String>>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
            requested: RefCell::new(Vec::new()),
        }
    }

    pub fn with_series(mut self, series: PriceSeries) -> Self {
        self.data.insert(series.asset.clone(), series);
        self
    }

    pub fn with_error(mut self, asset: &str, reason: &str) -> Self {
        self.errors.insert(asset.to_string(), reason.to_string());
        self
    }
}

impl DataPort for MockDataPort {
    fn fetch_prices(
        &self,
        asset: &str,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<PriceSeries, PortfolioError> {
        self.requested.borrow_mut().push(asset.to_string());
        if let Some(reason) = self.errors.get(asset) {
            return Err(PortfolioError::DataSource {
                asset: asset.to_string(),
                reason: reason.clone(),
            });
        }
        let series = self.data.get(asset).ok_or_else(|| PortfolioError::DataSource {
            asset: asset.to_string(),
            reason: "unknown ticker".to_string(),
        })?;
        let points = series
            .points
            .iter()
            .filter(|p| start_date.map_or(true, |s| p.date >= s))
            .filter(|p| end_date.map_or(true, |e| p.date <= e))
            .copied()
            .collect();
        Ok(PriceSeries::new(asset, points))
    }

    fn list_assets(&self) -> Result<Vec<String>, PortfolioError> {
        let mut assets: Vec<String> = self.data.keys().cloned().collect();
        assets.sort();
        Ok(assets)
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Consecutive daily prices starting 2024-01-01.
pub fn series_from_prices(asset: &str, prices: &[f64]) -> PriceSeries {
    let start = date(2024, 1, 1);
    let points = prices
        .iter()
        .enumerate()
        .map(|(i, &price)| PricePoint {
            date: start + chrono::Duration::days(i as i64),
            price,
        })
        .collect();
    PriceSeries::new(asset, points)
}

/// Prices compounded from `100.0` through `drift + amplitude * sin(phase + 0.7 t)`.
pub fn wavy_series(asset: &str, len: usize, drift: f64, amplitude: f64, phase: f64) -> PriceSeries {
    let mut prices = Vec::with_capacity(len);
    let mut price = 100.0;
    for t in 0..len {
        prices.push(price);
        price *= 1.0 + drift + amplitude * (phase + 0.7 * t as f64).sin();
    }
    series_from_prices(asset, &prices)
}

pub fn sample_universe() -> Vec<PriceSeries> {
    vec![
        wavy_series("META", 120, 0.0012, 0.020, 0.0),
        wavy_series("NVDA", 120, 0.0020, 0.030, 1.3),
        wavy_series("SPY", 120, 0.0006, 0.008, 2.1),
    ]
}

pub fn sample_port() -> MockDataPort {
    sample_universe()
        .into_iter()
        .fold(MockDataPort::new(), |port, s| port.with_series(s))
}

pub fn write_price_csv(dir: &std::path::Path, series: &PriceSeries) {
    let mut content = String::from("Date,Open,Close,Adj Close\n");
    for p in &series.points {
        content.push_str(&format!(
            "{},{},{},{}\n",
            p.date,
            p.price,
            p.price * 1.01,
            p.price
        ));
    }
    std::fs::write(dir.join(format!("{}.csv", series.asset)), content).unwrap();
}
