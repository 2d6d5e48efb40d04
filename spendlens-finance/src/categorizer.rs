//! Model-backed transaction categorization.
//!
//! Transactions are sent in chunks; each chunk gets one prompt asking for a
//! JSON array of `{index, category}`. If that answer is missing, malformed,
//! or points outside the chunk, the whole chunk is redone one transaction
//! at a time.

use serde::Deserialize;
use spendlens_core::{Category, Transaction};
use tracing::{debug, warn};

use crate::error::BatchParseError;
use crate::labeler::{LabelStrategy, SubstringLabeler};
use crate::model_client::{ModelBackend, ModelClient};

pub const DEFAULT_BATCH_SIZE: usize = 10;

/// (merchant, category) pairs shown to the model as worked examples
const EXAMPLES: [(&str, Category); 4] = [
    ("UBER TECHNOLOGIES", Category::Transportation),
    ("WALMART GROCERY", Category::Groceries),
    ("NETFLIX.COM", Category::Entertainment),
    ("PACIFIC GAS & ELECTRIC", Category::Utilities),
];

pub fn single_prompt(txn: &Transaction) -> String {
    let mut p = String::from("Categorize this transaction into exactly one category.\n\n");
    p.push_str(&format!("Categories: {}\n\n", Category::label_list()));
    p.push_str("Examples:\n");
    for (merchant, cat) in EXAMPLES {
        p.push_str(&format!("- \"{}\" → {}\n", merchant, cat));
    }
    p.push_str(&format!(
        "\nTransaction: {} for ${:.2}\n\nCategory:\n",
        txn.merchant,
        txn.abs_amount()
    ));
    p
}

pub fn batch_prompt(chunk: &[Transaction]) -> String {
    let mut p = String::from("Categorize these transactions.\n");
    p.push_str(&format!("Categories: {}\n\n", Category::label_list()));
    p.push_str("Respond with a JSON array where each item has 'index' and 'category'.\n\n");
    p.push_str("Transactions:\n");
    for (idx, txn) in chunk.iter().enumerate() {
        p.push_str(&format!("{}: {} - ${:.2}\n", idx, txn.merchant, txn.abs_amount()));
    }
    p.push_str("\nJSON Response:");
    p
}

#[derive(Debug, Deserialize)]
struct BatchItem {
    index: usize,
    category: String,
}

/// Strip markdown fences or surrounding prose, keeping the outermost `[...]`.
pub fn extract_json_array(text: &str) -> &str {
    let trimmed = text.trim();
    let inner = if trimmed.starts_with("```") {
        let body = trimmed.split_once('\n').map(|(_, rest)| rest).unwrap_or("");
        body.rfind("```").map(|end| &body[..end]).unwrap_or(body).trim()
    } else {
        trimmed
    };

    match (inner.find('['), inner.rfind(']')) {
        (Some(start), Some(end)) if end > start => &inner[start..=end],
        _ => inner,
    }
}

/// Parse a batch answer into one optional category per chunk slot.
///
/// Nothing is applied unless the whole answer is valid. Slots the model
/// skipped stay `None`; a repeated index keeps the last answer.
pub fn parse_batch_response(
    response: Option<&str>,
    chunk_len: usize,
    labeler: &impl LabelStrategy,
) -> Result<Vec<Option<Category>>, BatchParseError> {
    let text = response.ok_or(BatchParseError::NoResponse)?;
    let items: Vec<BatchItem> = serde_json::from_str(extract_json_array(text))?;

    let mut assigned = vec![None; chunk_len];
    for item in items {
        let slot = assigned
            .get_mut(item.index)
            .ok_or(BatchParseError::IndexOutOfRange {
                index: item.index,
                len: chunk_len,
            })?;
        *slot = Some(labeler.label(&item.category).unwrap_or_default());
    }
    Ok(assigned)
}

pub struct Categorizer<'a, B, L = SubstringLabeler> {
    client: &'a ModelClient<B>,
    labeler: L,
}

impl<'a, B: ModelBackend> Categorizer<'a, B> {
    pub fn new(client: &'a ModelClient<B>) -> Self {
        Self {
            client,
            labeler: SubstringLabeler,
        }
    }
}

impl<'a, B: ModelBackend, L: LabelStrategy> Categorizer<'a, B, L> {
    pub fn with_labeler<L2: LabelStrategy>(self, labeler: L2) -> Categorizer<'a, B, L2> {
        Categorizer {
            client: self.client,
            labeler,
        }
    }

    /// Ask the model about one transaction. Falls back to Miscellaneous.
    pub fn categorize_one(&self, txn: &Transaction) -> Category {
        self.client
            .query(&single_prompt(txn))
            .and_then(|resp| self.labeler.label(&resp))
            .unwrap_or_default()
    }

    pub fn categorize_batch(&self, txns: Vec<Transaction>, batch_size: usize) -> Vec<Transaction> {
        self.categorize_batch_with_progress(txns, batch_size, |_, _| {})
    }

    /// Categorize every transaction, chunk by chunk, in order.
    ///
    /// `on_progress(processed, total)` fires after each chunk.
    pub fn categorize_batch_with_progress(
        &self,
        mut txns: Vec<Transaction>,
        batch_size: usize,
        mut on_progress: impl FnMut(usize, usize),
    ) -> Vec<Transaction> {
        let total = txns.len();
        let mut processed = 0;

        for chunk in txns.chunks_mut(batch_size.max(1)) {
            let response = self.client.query(&batch_prompt(chunk));

            match parse_batch_response(response.as_deref(), chunk.len(), &self.labeler) {
                Ok(assigned) => {
                    for (txn, cat) in chunk.iter_mut().zip(assigned) {
                        let cat = match cat {
                            Some(c) => c,
                            None => {
                                debug!(merchant = %txn.merchant, "missing from batch answer");
                                self.categorize_one(txn)
                            }
                        };
                        txn.category = Some(cat);
                    }
                }
                Err(e) => {
                    warn!(error = %e, chunk_len = chunk.len(), "batch answer unusable, categorizing one by one");
                    for txn in chunk.iter_mut() {
                        let cat = self.categorize_one(txn);
                        txn.category = Some(cat);
                    }
                }
            }

            processed += chunk.len();
            debug!(processed, total, "categorized transactions");
            on_progress(processed, total);
        }

        txns
    }
}
