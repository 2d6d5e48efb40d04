//! spendlens-finance: local-model categorization, spending analysis and reports

pub mod analyzer;
pub mod categorizer;
pub mod error;
pub mod labeler;
pub mod model_client;
pub mod ollama;
pub mod report;

pub use analyzer::analyze_spending;
pub use categorizer::{Categorizer, DEFAULT_BATCH_SIZE};
pub use error::{BatchParseError, ModelError};
pub use labeler::{LabelStrategy, SubstringLabeler};
pub use model_client::{ModelBackend, ModelClient, RetryPolicy};
pub use ollama::OllamaBackend;
pub use report::{generate_report, ReportPaths};
