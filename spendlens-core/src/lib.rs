//! spendlens-core: transaction model and spending aggregation

pub mod analysis;
pub mod finance;

pub use analysis::{
    find_recurring_transactions, AnalysisResult, CategoryTotals, RecurringGroup,
    TOP_CATEGORY_COUNT,
};
pub use finance::{Category, Transaction};
