//! Report artifact as a minimal single-page PDF.
//!
//! Text-only summary page, hand-assembled objects. Layout internals are out
//! of scope for the pipeline; anything richer belongs behind the same trait.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::PathBuf;

use anyhow::{Context, Result};
use async_trait::async_trait;

use super::PdfRenderer;
use crate::analyze::TrendReport;

pub struct SummaryPdfRenderer {
    out_dir: PathBuf,
}

impl SummaryPdfRenderer {
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        Self {
            out_dir: out_dir.into(),
        }
    }
}

fn escape_pdf_text(s: &str) -> String {
    s.replace('\\', r"\\").replace('(', r"\(").replace(')', r"\)")
}

fn content_stream(lines: &[(f32, String)]) -> String {
    let mut out = String::new();
    let mut y = 790.0f32;
    for (size, text) in lines {
        y -= size + 8.0;
        let _ = writeln!(
            out,
            "BT /F1 {size} Tf 50 {y:.0} Td ({}) Tj ET",
            escape_pdf_text(text)
        );
    }
    out
}

fn summary_lines(report: &TrendReport, run_date: &str, chart_names: &[&str]) -> Vec<(f32, String)> {
    let mut lines = vec![
        (18.0, "AI Trend Report".to_string()),
        (11.0, format!("Run date: {run_date}")),
        (11.0, format!("Coverage: {}", report.summary.date_range)),
        (
            11.0,
            format!(
                "Articles: {}   Papers: {}   Most active source: {}",
                report.article_count, report.paper_count, report.summary.most_active_source
            ),
        ),
        (13.0, "Top keywords".to_string()),
    ];
    for kc in report.top_keywords.iter().take(10) {
        lines.push((10.0, format!("  {} ({})", kc.keyword, kc.count)));
    }
    lines.push((13.0, "Trending themes".to_string()));
    if report.trending_themes.is_empty() {
        lines.push((10.0, "  none detected".to_string()));
    }
    for theme in &report.trending_themes {
        lines.push((10.0, format!("  {theme}")));
    }
    if !chart_names.is_empty() {
        lines.push((9.0, format!("Charts: {}", chart_names.join(", "))));
    }
    lines
}

/// Assemble a one-page PDF document around the given content stream.
fn build_pdf(stream: &str) -> Vec<u8> {
    let objects = [
        "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
        "<< /Type /Pages /Kids [3 0 R] /Count 1 >>".to_string(),
        "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 595 842] \
         /Resources << /Font << /F1 4 0 R >> >> /Contents 5 0 R >>"
            .to_string(),
        "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica >>".to_string(),
        format!(
            "<< /Length {} >>\nstream\n{}endstream",
            stream.len(),
            stream
        ),
    ];

    let mut pdf = String::from("%PDF-1.4\n");
    let mut offsets = Vec::with_capacity(objects.len());
    for (i, body) in objects.iter().enumerate() {
        offsets.push(pdf.len());
        let _ = write!(pdf, "{} 0 obj\n{}\nendobj\n", i + 1, body);
    }

    let xref_at = pdf.len();
    let _ = write!(pdf, "xref\n0 {}\n", objects.len() + 1);
    pdf.push_str("0000000000 65535 f \n");
    for off in &offsets {
        let _ = write!(pdf, "{off:010} 00000 n \n");
    }
    let _ = write!(
        pdf,
        "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
        objects.len() + 1,
        xref_at
    );
    pdf.into_bytes()
}

#[async_trait]
impl PdfRenderer for SummaryPdfRenderer {
    async fn render_pdf(
        &self,
        report: &TrendReport,
        charts: &BTreeMap<String, PathBuf>,
        run_date: &str,
    ) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.out_dir).context("creating reports dir")?;

        let chart_names: Vec<&str> = charts.keys().map(String::as_str).collect();
        let lines = summary_lines(report, run_date, &chart_names);
        let bytes = build_pdf(&content_stream(&lines));

        let date_only = run_date.get(..10).unwrap_or(run_date);
        let path = self.out_dir.join(format!("ai_trend_report_{date_only}.pdf"));
        std::fs::write(&path, bytes).context("writing pdf report")?;

        tracing::info!(path = %path.display(), "pdf report written");
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyze::{KeywordCount, SummaryStats};

    fn report() -> TrendReport {
        TrendReport {
            top_keywords: vec![KeywordCount {
                keyword: "agents (autonomous)".into(),
                count: 4,
            }],
            trending_themes: vec![],
            article_count: 2,
            paper_count: 1,
            summary: SummaryStats {
                total_items: 3,
                date_range: "2024-04-24 to 2024-05-01".into(),
                most_active_source: "Wire".into(),
            },
        }
    }

    #[test]
    fn parens_are_escaped_in_text() {
        let stream = content_stream(&summary_lines(&report(), "2024-05-01", &[]));
        assert!(stream.contains(r"agents \(autonomous\)"));
    }

    #[test]
    fn document_has_header_and_trailer() {
        let bytes = build_pdf("BT ET\n");
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.starts_with("%PDF-1.4"));
        assert!(text.ends_with("%%EOF\n"));
        assert!(text.contains("/Root 1 0 R"));
    }

    #[tokio::test]
    async fn renderer_writes_dated_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = SummaryPdfRenderer::new(tmp.path())
            .render_pdf(&report(), &BTreeMap::new(), "2024-05-01T08:00:00Z")
            .await
            .unwrap();
        assert!(path.exists());
        assert!(path.to_string_lossy().ends_with("ai_trend_report_2024-05-01.pdf"));
    }
}
