//! spendlens-ingest: bank CSV cleanup and transaction JSON I/O.

pub mod clean;
pub mod parsers;
pub mod store;

pub use clean::{clean_amount, parse_date, MerchantCleaner};
pub use parsers::{parse_bank_csv, parse_bank_csv_reader};
pub use store::{read_transactions_json, write_transactions_json};
