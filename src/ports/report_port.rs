//! Presentation port for optimization results.

use crate::domain::error::PortfolioError;
use crate::domain::result::OptimizationResult;
use std::fs;
use std::path::Path;

pub trait ReportPort {
    fn render(&self, result: &OptimizationResult) -> String;

    /// Default implementation: writes the rendered report to `output_path`.
    fn write(&self, result: &OptimizationResult, output_path: &Path) -> Result<(), PortfolioError> {
        fs::write(output_path, self.render(result)).map_err(|e| PortfolioError::Report {
            reason: format!("failed to write {}: {}", output_path.display(), e),
        })
    }
}
