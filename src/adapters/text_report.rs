//! Plain-text console report.

use crate::domain::result::OptimizationResult;
use crate::ports::report_port::ReportPort;

#[derive(Debug, Clone)]
pub struct TextReport {
    pub show_covariance: bool,
}

impl Default for TextReport {
    fn default() -> Self {
        Self {
            show_covariance: true,
        }
    }
}

fn pct(value: f64) -> String {
    format!("{:.2}%", value * 100.0)
}

impl TextReport {
    fn covariance_table(&self, result: &OptimizationResult) -> String {
        let assets = result.assets();
        let cov = result.estimates().covariance();
        let width = assets.iter().map(|a| a.len()).max().unwrap_or(0).max(10);

        let header: String = assets.iter().map(|a| format!(" {a:>width$}")).collect();
        let mut out = format!("{:width$}{header}\n", "");
        for (i, asset) in assets.iter().enumerate() {
            let row: String = (0..assets.len())
                .map(|j| format!(" {:>width$.6}", cov[(i, j)]))
                .collect();
            out.push_str(&format!("{asset:width$}{row}\n"));
        }
        out
    }
}

impl ReportPort for TextReport {
    fn render(&self, result: &OptimizationResult) -> String {
        let label_width = result.assets().iter().map(|a| a.len()).max().unwrap_or(0);
        let rows = result.asset_weights();

        let mut out = String::from("--- Estimated Annualized Expected Returns ---\n");
        for row in &rows {
            out.push_str(&format!(
                "{:label_width$}: {}\n",
                row.asset,
                pct(row.expected_return)
            ));
        }

        if self.show_covariance {
            out.push_str("\n--- Annualized Covariance Matrix ---\n");
            out.push_str(&self.covariance_table(result));
        }

        out.push_str("\n=== Optimal Long-Only Max Sharpe Portfolio ===\n");
        for row in &rows {
            out.push_str(&format!("{:label_width$}: {}\n", row.asset, pct(row.weight)));
        }

        let stats = result.stats();
        out.push_str(&format!(
            "\n--- Portfolio Stats (Annualized) ---\n\
             Expected Return: {}\n\
             Volatility     : {}\n\
             Sharpe Ratio   : {:.3} (rf = {})\n\
             Solver         : {} after {} iterations\n",
            pct(stats.expected_return),
            pct(stats.volatility),
            stats.sharpe_ratio,
            pct(result.risk_free_rate()),
            result.status(),
            result.iterations()
        ));

        out
    }
}
