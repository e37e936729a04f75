//! Chart artifacts as standalone SVG files.
//!
//! Deliberately thin: a horizontal keyword bar chart and a theme breakdown,
//! assembled as SVG text. Anything fancier belongs in an external renderer
//! behind the same trait.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::PathBuf;

use anyhow::{Context, Result};
use async_trait::async_trait;

use super::ChartRenderer;
use crate::analyze::TrendReport;

const BRAND_BG: &str = "#1A1A2E";
const BAR_FILL: &str = "#E94560";
const TEXT_FILL: &str = "#FFFFFF";

pub struct SvgChartRenderer {
    out_dir: PathBuf,
}

impl SvgChartRenderer {
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        Self {
            out_dir: out_dir.into(),
        }
    }
}

fn escape(s: &str) -> String {
    s.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

fn keyword_bar_svg(report: &TrendReport) -> String {
    let top: Vec<_> = report.top_keywords.iter().take(10).collect();
    let max = top.iter().map(|k| k.count).max().unwrap_or(1).max(1);
    let row_h = 28;
    let height = 60 + top.len() * row_h;

    let mut svg = String::new();
    let _ = writeln!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="640" height="{height}">"#
    );
    let _ = writeln!(svg, r#"<rect width="100%" height="100%" fill="{BRAND_BG}"/>"#);
    let _ = writeln!(
        svg,
        r#"<text x="20" y="30" fill="{TEXT_FILL}" font-size="16" font-weight="bold">Top Keywords</text>"#
    );
    for (i, kc) in top.iter().enumerate() {
        let y = 50 + i * row_h;
        let w = (kc.count as f64 / max as f64 * 380.0).round() as u64;
        let _ = writeln!(
            svg,
            r#"<text x="20" y="{}" fill="{TEXT_FILL}" font-size="12">{}</text>"#,
            y + 14,
            escape(&kc.keyword)
        );
        let _ = writeln!(
            svg,
            r#"<rect x="200" y="{y}" width="{w}" height="18" fill="{BAR_FILL}"/>"#
        );
        let _ = writeln!(
            svg,
            r#"<text x="{}" y="{}" fill="{TEXT_FILL}" font-size="12">{}</text>"#,
            205 + w,
            y + 14,
            kc.count
        );
    }
    svg.push_str("</svg>\n");
    svg
}

fn theme_breakdown_svg(report: &TrendReport) -> String {
    let row_h = 26;
    let height = 60 + report.trending_themes.len().max(1) * row_h;

    let mut svg = String::new();
    let _ = writeln!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="480" height="{height}">"#
    );
    let _ = writeln!(svg, r#"<rect width="100%" height="100%" fill="{BRAND_BG}"/>"#);
    let _ = writeln!(
        svg,
        r#"<text x="20" y="30" fill="{TEXT_FILL}" font-size="16" font-weight="bold">Trending Themes</text>"#
    );
    if report.trending_themes.is_empty() {
        let _ = writeln!(
            svg,
            r#"<text x="20" y="60" fill="{TEXT_FILL}" font-size="12">No themes detected</text>"#
        );
    }
    for (i, theme) in report.trending_themes.iter().enumerate() {
        let y = 56 + i * row_h;
        let _ = writeln!(
            svg,
            r#"<text x="20" y="{y}" fill="{BAR_FILL}" font-size="13">{}. {}</text>"#,
            i + 1,
            escape(theme)
        );
    }
    svg.push_str("</svg>\n");
    svg
}

#[async_trait]
impl ChartRenderer for SvgChartRenderer {
    async fn render_charts(&self, report: &TrendReport) -> Result<BTreeMap<String, PathBuf>> {
        std::fs::create_dir_all(&self.out_dir).context("creating charts dir")?;

        let mut charts = BTreeMap::new();
        for (name, content) in [
            ("keyword_bar", keyword_bar_svg(report)),
            ("theme_breakdown", theme_breakdown_svg(report)),
        ] {
            let path = self.out_dir.join(format!("{name}.svg"));
            std::fs::write(&path, content).with_context(|| format!("writing {name} chart"))?;
            charts.insert(name.to_string(), path);
        }

        tracing::info!(count = charts.len(), "charts rendered");
        Ok(charts)
    }
}
