//! Price-history provider port.

use crate::domain::error::PortfolioError;
use crate::domain::price_series::PriceSeries;
use chrono::NaiveDate;

pub trait DataPort {
    /// Price history for one asset, optionally restricted to `[start, end]`.
    ///
    /// Unknown assets, unreadable sources and empty ranges are reported as
    /// [`PortfolioError::DataSource`].
    fn fetch_prices(
        &self,
        asset: &str,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<PriceSeries, PortfolioError>;

    fn list_assets(&self) -> Result<Vec<String>, PortfolioError>;
}
