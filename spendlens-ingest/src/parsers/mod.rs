pub mod bank_csv;

pub use bank_csv::{parse_bank_csv, parse_bank_csv_reader};
