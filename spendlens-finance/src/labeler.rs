//! Mapping free-form model text onto a [`Category`].

use spendlens_core::Category;

/// Strategy for reading a category out of model output.
///
/// Returns `None` when the text names no known category; callers decide the
/// fallback.
pub trait LabelStrategy {
    fn label(&self, text: &str) -> Option<Category>;
}

/// First category (in canonical order) whose label appears anywhere in the
/// text, case-insensitively. Not a relevance ranking: "Groceries, not Food &
/// Dining" yields Food & Dining because it comes first in the list.
#[derive(Debug, Clone, Copy, Default)]
pub struct SubstringLabeler;

impl LabelStrategy for SubstringLabeler {
    fn label(&self, text: &str) -> Option<Category> {
        let haystack = text.to_lowercase();
        Category::ALL
            .into_iter()
            .find(|c| haystack.contains(&c.label().to_lowercase()))
    }
}
