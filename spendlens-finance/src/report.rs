//! Plain-text spending report and bar chart.

use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use spendlens_core::{AnalysisResult, CategoryTotals, RecurringGroup};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Categories drawn in the chart
pub const CHART_CATEGORY_LIMIT: usize = 8;
const CHART_WIDTH: usize = 40;
const NO_INSIGHTS: &str = "No insights generated.";

#[derive(Debug, Clone, PartialEq)]
pub struct ReportPaths {
    pub report: PathBuf,
    /// Only written when there is at least one category
    pub chart: Option<PathBuf>,
}

pub fn render_report(result: &AnalysisResult, recurring: &[RecurringGroup]) -> String {
    let mut s = String::new();
    s.push_str("Personal Finance Analysis Report\n");
    s.push_str(&"=".repeat(40));
    s.push_str("\n\n");

    s.push_str("Top Spending Categories:\n");
    for (cat, amount) in &result.top_categories {
        s.push_str(&format!("  - {}: ${:.2}\n", cat, amount));
    }
    s.push_str(&format!(
        "\nTotal Monthly Spending: ${:.2}\n",
        result.total_spending
    ));

    if !recurring.is_empty() {
        s.push_str("\nRecurring Payments:\n");
        for g in recurring {
            s.push_str(&format!(
                "  - {}: ${:.2} x {}\n",
                g.merchant, g.amount, g.frequency
            ));
        }
    }

    s.push_str("\nAI-Generated Insights:\n");
    s.push_str(result.insights.as_deref().unwrap_or(NO_INSIGHTS));
    s.push('\n');
    s
}

/// Horizontal bars for the largest categories, scaled to the biggest one.
pub fn render_chart(totals: &CategoryTotals) -> String {
    let rows = totals.top(CHART_CATEGORY_LIMIT);
    let label_width = rows.iter().map(|(c, _)| c.label().len()).max().unwrap_or(0);
    let max = rows.iter().map(|(_, a)| *a).fold(0.0, f64::max);

    let mut s = String::from("Spending by Category\n");
    s.push_str(&"=".repeat(20));
    s.push_str("\n\n");
    for (cat, amount) in rows {
        let len = if max > 0.0 {
            ((amount / max) * CHART_WIDTH as f64).round() as usize
        } else {
            0
        };
        // Tiny but non-zero amounts still get a visible bar.
        let len = if *amount > 0.0 { len.max(1) } else { len };
        s.push_str(&format!(
            "{:<label_width$} | {:<bar_width$} ${:.2}\n",
            cat.label(),
            "#".repeat(len),
            amount,
            bar_width = CHART_WIDTH,
        ));
    }
    s
}

/// Write `finance_report_<ts>.txt` (and `spending_chart_<ts>.txt` when there is
/// spending) into `output_dir`, creating it if needed.
pub fn generate_report(
    result: &AnalysisResult,
    recurring: &[RecurringGroup],
    output_dir: impl AsRef<Path>,
    timestamp: NaiveDateTime,
) -> Result<ReportPaths> {
    let dir = output_dir.as_ref();
    fs::create_dir_all(dir).with_context(|| format!("create {}", dir.display()))?;
    let stamp = timestamp.format("%Y%m%d_%H%M%S");

    let report = dir.join(format!("finance_report_{stamp}.txt"));
    fs::write(&report, render_report(result, recurring))
        .with_context(|| format!("write {}", report.display()))?;

    let chart = if result.category_totals.is_empty() {
        None
    } else {
        let path = dir.join(format!("spending_chart_{stamp}.txt"));
        fs::write(&path, render_chart(&result.category_totals))
            .with_context(|| format!("write {}", path.display()))?;
        Some(path)
    };

    info!(report = %report.display(), "report generated");
    Ok(ReportPaths { report, chart })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use spendlens_core::{find_recurring_transactions, Category, Transaction};

    fn result(insights: Option<&str>) -> AnalysisResult {
        let txns = vec![
            Transaction::new("d", "RENT CO", -1200.0, "").with_category(Category::RentMortgage),
            Transaction::new("d", "SAFEWAY", -300.0, "").with_category(Category::Groceries),
            Transaction::new("d", "NETFLIX", -15.0, "").with_category(Category::Entertainment),
            Transaction::new("d", "NETFLIX", -15.5, "").with_category(Category::Entertainment),
        ];
        AnalysisResult::new(
            CategoryTotals::from_transactions(&txns),
            insights.map(String::from),
        )
    }

    fn ts() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 2, 19)
            .unwrap()
            .and_hms_opt(12, 30, 5)
            .unwrap()
    }

    #[test]
    fn test_report_sections() {
        let r = result(Some("1. Cook at home."));
        let recurring = find_recurring_transactions(&[
            Transaction::new("d", "NETFLIX", -15.0, ""),
            Transaction::new("d", "NETFLIX", -15.5, ""),
        ]);
        let text = render_report(&r, &recurring);
        assert!(text.starts_with("Personal Finance Analysis Report\n========================================\n\n"));
        assert!(text.contains("  - Rent/Mortgage: $1200.00\n"));
        assert!(text.contains("  - Entertainment: $30.50\n"));
        assert!(text.contains("Total Monthly Spending: $1530.50\n"));
        assert!(text.contains("Recurring Payments:\n  - NETFLIX: $15.25 x 2\n"));
        assert!(text.ends_with("AI-Generated Insights:\n1. Cook at home.\n"));
    }

    #[test]
    fn test_report_placeholder_without_insights() {
        let text = render_report(&result(None), &[]);
        assert!(text.contains("No insights generated."));
        assert!(!text.contains("Recurring Payments"));
    }

    #[test]
    fn test_chart_scaling() {
        let chart = render_chart(&result(None).category_totals);
        let lines: Vec<&str> = chart.lines().skip(3).collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("Rent/Mortgage | "));
        assert_eq!(lines[0].matches('#').count(), 40);
        assert_eq!(lines[1].matches('#').count(), 10);
        assert_eq!(lines[2].matches('#').count(), 1);
        assert!(lines[2].ends_with("$30.50"));
    }

    #[test]
    fn test_generate_report_writes_files() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("reports");
        let paths = generate_report(&result(Some("x")), &[], &out, ts()).unwrap();

        assert_eq!(paths.report, out.join("finance_report_20260219_123005.txt"));
        assert_eq!(paths.chart, Some(out.join("spending_chart_20260219_123005.txt")));
        let body = fs::read_to_string(&paths.report).unwrap();
        assert!(body.contains("Top Spending Categories:"));
    }

    #[test]
    fn test_no_chart_without_spending() {
        let dir = tempfile::tempdir().unwrap();
        let empty = AnalysisResult::new(CategoryTotals::default(), None);
        let paths = generate_report(&empty, &[], dir.path(), ts()).unwrap();
        assert!(paths.report.exists());
        assert_eq!(paths.chart, None);
    }
}
