//! Period-over-period returns derived from aligned price series.

use crate::domain::price_series::PriceSeries;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReturnKind {
    /// `P_t / P_{t-1} - 1`
    #[default]
    Simple,
    /// `ln(P_t / P_{t-1})`
    Log,
}

impl fmt::Display for ReturnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReturnKind::Simple => write!(f, "simple"),
            ReturnKind::Log => write!(f, "log"),
        }
    }
}

impl FromStr for ReturnKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "simple" | "pct" => Ok(ReturnKind::Simple),
            "log" => Ok(ReturnKind::Log),
            other => Err(format!("unknown return kind '{other}' (expected simple or log)")),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReturnSeries {
    pub asset: String,
    pub kind: ReturnKind,
    pub values: Vec<f64>,
}

impl ReturnSeries {
    pub fn from_prices(series: &PriceSeries, kind: ReturnKind) -> Self {
        let values = series
            .points
            .windows(2)
            .map(|w| {
                let ratio = w[1].price / w[0].price;
                match kind {
                    ReturnKind::Simple => ratio - 1.0,
                    ReturnKind::Log => ratio.ln(),
                }
            })
            .collect();
        Self {
            asset: series.asset.clone(),
            kind,
            values,
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn mean(&self) -> f64 {
        if self.values.is_empty() {
            return 0.0;
        }
        self.values.iter().sum::<f64>() / self.values.len() as f64
    }
}

pub fn compute_returns(series: &[PriceSeries], kind: ReturnKind) -> Vec<ReturnSeries> {
    series
        .iter()
        .map(|s| ReturnSeries::from_prices(s, kind))
        .collect()
}
