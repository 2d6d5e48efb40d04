//! Transaction and category types shared by every pipeline stage

use serde::{Deserialize, Serialize};
use std::fmt;

/// A single cleaned bank transaction
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Transaction {
    /// ISO date (YYYY-MM-DD), or the raw CSV value when it could not be parsed
    pub date: String,
    /// Normalized merchant name
    pub merchant: String,
    /// Positive = income, negative = expense
    pub amount: f64,
    /// Description exactly as it appeared in the export
    pub original_description: String,
    /// Assigned once by the categorizer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
}

impl Transaction {
    /// Create an uncategorized transaction
    pub fn new(
        date: impl Into<String>,
        merchant: impl Into<String>,
        amount: f64,
        original_description: impl Into<String>,
    ) -> Self {
        Self {
            date: date.into(),
            merchant: merchant.into(),
            amount,
            original_description: original_description.into(),
            category: None,
        }
    }

    pub fn with_category(mut self, category: Category) -> Self {
        self.category = Some(category);
        self
    }

    /// Returns true if this is an expense (negative amount)
    pub fn is_expense(&self) -> bool {
        self.amount < 0.0
    }

    /// Returns true if this is income (positive amount)
    pub fn is_income(&self) -> bool {
        self.amount > 0.0
    }

    /// Get the absolute amount
    pub fn abs_amount(&self) -> f64 {
        self.amount.abs()
    }

    /// Category used for aggregation; uncategorized rows count as Miscellaneous
    pub fn effective_category(&self) -> Category {
        self.category.unwrap_or_default()
    }
}

/// The closed set of spending categories the model may assign.
///
/// Unknown labels deserialize to `Miscellaneous`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(from = "String")]
pub enum Category {
    #[serde(rename = "Food & Dining")]
    FoodAndDining,
    #[serde(rename = "Transportation")]
    Transportation,
    #[serde(rename = "Entertainment")]
    Entertainment,
    #[serde(rename = "Utilities")]
    Utilities,
    #[serde(rename = "Groceries")]
    Groceries,
    #[serde(rename = "Shopping")]
    Shopping,
    #[serde(rename = "Healthcare")]
    Healthcare,
    #[serde(rename = "Income")]
    Income,
    #[serde(rename = "Rent/Mortgage")]
    RentMortgage,
    #[serde(rename = "Insurance")]
    Insurance,
    #[serde(rename = "Education")]
    Education,
    #[serde(rename = "Personal Care")]
    PersonalCare,
    #[default]
    #[serde(rename = "Miscellaneous")]
    Miscellaneous,
}

impl Category {
    /// Every category in canonical order. Label matching walks this order.
    pub const ALL: [Category; 13] = [
        Category::FoodAndDining,
        Category::Transportation,
        Category::Entertainment,
        Category::Utilities,
        Category::Groceries,
        Category::Shopping,
        Category::Healthcare,
        Category::Income,
        Category::RentMortgage,
        Category::Insurance,
        Category::Education,
        Category::PersonalCare,
        Category::Miscellaneous,
    ];

    /// Human-readable label, as shown to the model and in reports
    pub fn label(&self) -> &'static str {
        match self {
            Category::FoodAndDining => "Food & Dining",
            Category::Transportation => "Transportation",
            Category::Entertainment => "Entertainment",
            Category::Utilities => "Utilities",
            Category::Groceries => "Groceries",
            Category::Shopping => "Shopping",
            Category::Healthcare => "Healthcare",
            Category::Income => "Income",
            Category::RentMortgage => "Rent/Mortgage",
            Category::Insurance => "Insurance",
            Category::Education => "Education",
            Category::PersonalCare => "Personal Care",
            Category::Miscellaneous => "Miscellaneous",
        }
    }

    /// Exact (case-insensitive, trimmed) label lookup
    pub fn from_label(label: &str) -> Option<Category> {
        let label = label.trim();
        Category::ALL
            .into_iter()
            .find(|c| c.label().eq_ignore_ascii_case(label))
    }

    /// Comma-separated list of all labels in canonical order
    pub fn label_list() -> String {
        Category::ALL
            .iter()
            .map(|c| c.label())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl From<String> for Category {
    fn from(label: String) -> Self {
        Category::from_label(&label).unwrap_or_default()
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
