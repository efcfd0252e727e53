//! SVG bar chart of portfolio weights.

use crate::domain::result::OptimizationResult;
use crate::ports::report_port::ReportPort;

pub const CHART_TITLE: &str = "Optimal Portfolio Weights (Max Sharpe, Long-Only)";

const WIDTH: f64 = 640.0;
const HEIGHT: f64 = 400.0;
const PADDING: f64 = 50.0;

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Renders one bar per `(label, weight)` pair on a 0..max(weight) axis.
pub fn weights_bar_chart(bars: &[(String, f64)]) -> String {
    let plot_width = WIDTH - 2.0 * PADDING;
    let plot_height = HEIGHT - 2.0 * PADDING;
    let baseline = HEIGHT - PADDING;
    let right = WIDTH - PADDING;
    let title_x = WIDTH / 2.0;
    let title_y = PADDING / 2.0;
    let axis_label_x = PADDING / 3.0;
    let axis_label_y = HEIGHT / 2.0;

    let mut svg = format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{WIDTH:.0}" height="{HEIGHT:.0}" viewBox="0 0 {WIDTH:.0} {HEIGHT:.0}">
  <rect width="100%" height="100%" fill="white"/>
  <text x="{title_x:.1}" y="{title_y:.1}" text-anchor="middle" font-size="16">{title}</text>
  <line x1="{PADDING:.1}" y1="{PADDING:.1}" x2="{PADDING:.1}" y2="{baseline:.1}" stroke="black"/>
  <line x1="{PADDING:.1}" y1="{baseline:.1}" x2="{right:.1}" y2="{baseline:.1}" stroke="black"/>
  <text x="{axis_label_x:.1}" y="{axis_label_y:.1}" transform="rotate(-90 {axis_label_x:.1} {axis_label_y:.1})" text-anchor="middle" font-size="12">Weight</text>
"#,
        title = escape(CHART_TITLE)
    );

    if bars.is_empty() {
        svg.push_str("</svg>\n");
        return svg;
    }

    let max_weight = bars.iter().map(|(_, w)| *w).fold(0.0_f64, f64::max);
    let scale_y = if max_weight > 0.0 {
        plot_height / max_weight
    } else {
        0.0
    };
    let slot = plot_width / bars.len() as f64;
    let bar_width = slot * 0.6;

    for (i, (label, weight)) in bars.iter().enumerate() {
        let height = weight.max(0.0) * scale_y;
        let x = PADDING + i as f64 * slot + (slot - bar_width) / 2.0;
        let y = baseline - height;
        let centre = x + bar_width / 2.0;
        svg.push_str(&format!(
            r#"  <rect x="{x:.1}" y="{y:.1}" width="{bar_width:.1}" height="{height:.1}" fill="steelblue"/>
  <text x="{centre:.1}" y="{:.1}" text-anchor="middle" font-size="12">{}</text>
  <text x="{centre:.1}" y="{:.1}" text-anchor="middle" font-size="10">{:.1}%</text>
"#,
            baseline + 16.0,
            escape(label),
            y - 4.0,
            weight * 100.0
        ));
    }

    svg.push_str("</svg>\n");
    svg
}

#[derive(Debug, Clone, Default)]
pub struct SvgChartReport;

impl ReportPort for SvgChartReport {
    fn render(&self, result: &OptimizationResult) -> String {
        let bars: Vec<(String, f64)> = result
            .asset_weights()
            .into_iter()
            .map(|row| (row.asset, row.weight))
            .collect();
        weights_bar_chart(&bars)
    }
}
