//! Spending aggregation: category totals and recurring-payment detection.
//!
//! Everything here is pure and recomputed per run; the model-backed insight
//! text is attached by the finance crate.

use crate::finance::{Category, Transaction};
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::collections::HashMap;

/// Number of categories reported as "top"
pub const TOP_CATEGORY_COUNT: usize = 3;

/// Relative spread below which a merchant's charges count as recurring
pub const RECURRING_SPREAD_RATIO: f64 = 0.1;

/// Summed absolute expense per category, ordered by descending amount.
/// Ties keep first-encounter order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CategoryTotals {
    entries: Vec<(Category, f64)>,
}

impl CategoryTotals {
    /// Aggregate expense transactions (amount < 0) by category
    pub fn from_transactions(txns: &[Transaction]) -> Self {
        let mut entries: Vec<(Category, f64)> = Vec::new();
        let mut index: HashMap<Category, usize> = HashMap::new();

        for txn in txns.iter().filter(|t| t.is_expense()) {
            let cat = txn.effective_category();
            match index.get(&cat) {
                Some(&i) => entries[i].1 += txn.abs_amount(),
                None => {
                    index.insert(cat, entries.len());
                    entries.push((cat, txn.abs_amount()));
                }
            }
        }

        // sort_by is stable, so equal totals stay in encounter order
        entries.sort_by(|a, b| b.1.total_cmp(&a.1));
        Self { entries }
    }

    pub fn get(&self, category: Category) -> Option<f64> {
        self.entries
            .iter()
            .find(|(c, _)| *c == category)
            .map(|(_, amount)| *amount)
    }

    pub fn iter(&self) -> impl Iterator<Item = &(Category, f64)> {
        self.entries.iter()
    }

    pub fn as_slice(&self) -> &[(Category, f64)] {
        &self.entries
    }

    /// First `n` categories by amount
    pub fn top(&self, n: usize) -> &[(Category, f64)] {
        &self.entries[..n.min(self.entries.len())]
    }

    pub fn total(&self) -> f64 {
        self.entries.iter().map(|(_, amount)| amount).sum()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for CategoryTotals {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (cat, amount) in &self.entries {
            map.serialize_entry(cat.label(), amount)?;
        }
        map.end()
    }
}

/// Charges from one merchant with near-identical amounts
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RecurringGroup {
    pub merchant: String,
    /// Mean absolute amount across occurrences
    pub amount: f64,
    /// Number of occurrences
    pub frequency: usize,
    pub transactions: Vec<Transaction>,
}

impl RecurringGroup {
    /// Total exposure, used for ranking
    pub fn score(&self) -> f64 {
        self.amount * self.frequency as f64
    }
}

/// Output of one analysis run, consumed by the reporter
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct AnalysisResult {
    pub category_totals: CategoryTotals,
    pub top_categories: Vec<(Category, f64)>,
    pub insights: Option<String>,
    pub total_spending: f64,
}

impl AnalysisResult {
    /// Assemble a result from totals and optional model insights
    pub fn new(category_totals: CategoryTotals, insights: Option<String>) -> Self {
        let top_categories = category_totals.top(TOP_CATEGORY_COUNT).to_vec();
        let total_spending = category_totals.total();
        Self {
            category_totals,
            top_categories,
            insights,
            total_spending,
        }
    }
}

/// Find merchants charged at least twice with amounts within 10% of the
/// largest charge. Income and expenses are grouped alike.
///
/// Sorted by `amount * frequency` descending; ties keep the order in which
/// merchants were first seen.
pub fn find_recurring_transactions(txns: &[Transaction]) -> Vec<RecurringGroup> {
    let mut groups: Vec<(&str, Vec<&Transaction>)> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for txn in txns {
        match index.get(txn.merchant.as_str()) {
            Some(&i) => groups[i].1.push(txn),
            None => {
                index.insert(txn.merchant.as_str(), groups.len());
                groups.push((txn.merchant.as_str(), vec![txn]));
            }
        }
    }

    let mut recurring: Vec<RecurringGroup> = groups
        .into_iter()
        .filter(|(_, items)| items.len() >= 2)
        .filter_map(|(merchant, items)| {
            let amounts: Vec<f64> = items.iter().map(|t| t.abs_amount()).collect();
            let max = amounts.iter().copied().fold(f64::MIN, f64::max);
            let min = amounts.iter().copied().fold(f64::MAX, f64::min);

            // An all-zero group can never satisfy the strict spread check
            if max <= 0.0 || max - min >= RECURRING_SPREAD_RATIO * max {
                return None;
            }

            Some(RecurringGroup {
                merchant: merchant.to_string(),
                amount: amounts.iter().sum::<f64>() / amounts.len() as f64,
                frequency: items.len(),
                transactions: items.into_iter().cloned().collect(),
            })
        })
        .collect();

    recurring.sort_by(|a, b| b.score().total_cmp(&a.score()));
    recurring
}
