//! Price history per asset and date alignment across assets.

use crate::domain::error::PortfolioError;
use chrono::NaiveDate;
use std::collections::{BTreeSet, HashSet};

/// Minimum number of aligned price observations needed for estimation.
pub const MIN_PRICE_OBSERVATIONS: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub price: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PriceSeries {
    pub asset: String,
    pub points: Vec<PricePoint>,
}

impl PriceSeries {
    pub fn new(asset: impl Into<String>, points: Vec<PricePoint>) -> Self {
        Self {
            asset: asset.into(),
            points,
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.points.iter().map(|p| p.date)
    }

    pub fn prices(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.price).collect()
    }

    /// Checks that dates are strictly increasing and every price is finite and positive.
    pub fn validate(&self) -> Result<(), PortfolioError> {
        for pair in self.points.windows(2) {
            if pair[1].date <= pair[0].date {
                return Err(PortfolioError::data_source(
                    &self.asset,
                    format!(
                        "dates not strictly increasing at {} -> {}",
                        pair[0].date, pair[1].date
                    ),
                ));
            }
        }
        if let Some(bad) = self
            .points
            .iter()
            .find(|p| !p.price.is_finite() || p.price <= 0.0)
        {
            return Err(PortfolioError::data_source(
                &self.asset,
                format!("invalid price {} on {}", bad.price, bad.date),
            ));
        }
        Ok(())
    }
}

/// Inner-joins the series on the dates every asset has in common.
///
/// Asset order is preserved. Each input series is validated first, and a
/// duplicated asset id or an empty input list is reported as a data error.
pub fn align(series: &[PriceSeries]) -> Result<Vec<PriceSeries>, PortfolioError> {
    if series.is_empty() {
        return Err(PortfolioError::data_source("*", "no price series supplied"));
    }

    let mut seen = HashSet::new();
    for s in series {
        if !seen.insert(s.asset.as_str()) {
            return Err(PortfolioError::data_source(&s.asset, "duplicate asset"));
        }
        if s.is_empty() {
            return Err(PortfolioError::data_source(&s.asset, "empty price series"));
        }
        s.validate()?;
    }

    let mut common: BTreeSet<NaiveDate> = series[0].dates().collect();
    for s in &series[1..] {
        let dates: BTreeSet<NaiveDate> = s.dates().collect();
        common = common.intersection(&dates).copied().collect();
    }

    Ok(series
        .iter()
        .map(|s| PriceSeries {
            asset: s.asset.clone(),
            points: s
                .points
                .iter()
                .filter(|p| common.contains(&p.date))
                .copied()
                .collect(),
        })
        .collect())
}
