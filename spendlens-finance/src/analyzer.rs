//! Spending analysis with model-written insights.

use spendlens_core::{AnalysisResult, CategoryTotals, Transaction};
use tracing::{info, warn};

use crate::model_client::{ModelBackend, ModelClient};

/// Categories included in the insight prompt
pub const INSIGHT_CATEGORY_COUNT: usize = 5;

pub fn insight_prompt(totals: &CategoryTotals) -> String {
    let mut p = String::from("Analyze these spending patterns and provide 3 key insights:\n\n");
    p.push_str("Monthly Spending by Category:\n");
    for (cat, amount) in totals.top(INSIGHT_CATEGORY_COUNT) {
        p.push_str(&format!("- {}: ${:.2}\n", cat, amount));
    }
    p.push_str("\nProvide actionable insights about spending habits. Be specific and practical.");
    p
}

/// Aggregate expenses by category and ask the model for a short narrative.
///
/// The insight text is stored as returned; `None` when the model was
/// unreachable.
pub fn analyze_spending<B: ModelBackend>(
    txns: &[Transaction],
    client: &ModelClient<B>,
) -> AnalysisResult {
    let totals = CategoryTotals::from_transactions(txns);
    let insights = client.query(&insight_prompt(&totals));
    if insights.is_none() {
        warn!("no insights from model; report will omit them");
    }

    let result = AnalysisResult::new(totals, insights);
    info!(
        categories = result.category_totals.len(),
        total_spending = result.total_spending,
        "spending analyzed"
    );
    result
}
