//! Generic bank CSV export parser.
//!
//! Expects a header row containing (any case, any order) some of:
//! Date,Description,Amount
//! Missing columns fall back to empty strings / 0.0.

use anyhow::{Context, Result};
use spendlens_core::Transaction;
use std::io::Read;
use std::path::Path;
use tracing::debug;

use crate::clean::{clean_amount, parse_date, MerchantCleaner, UNKNOWN_MERCHANT};

#[derive(Debug, Default)]
struct Columns {
    date: Option<usize>,
    description: Option<usize>,
    amount: Option<usize>,
}

impl Columns {
    fn from_headers(headers: &csv::StringRecord) -> Self {
        let mut cols = Columns::default();
        for (i, h) in headers.iter().enumerate() {
            match h.trim().to_lowercase().as_str() {
                "date" => cols.date = Some(i),
                "description" => cols.description = Some(i),
                "amount" => cols.amount = Some(i),
                _ => {}
            }
        }
        cols
    }
}

/// Parse a bank CSV export into cleaned transactions.
pub fn parse_bank_csv(path: impl AsRef<Path>) -> Result<Vec<Transaction>> {
    let path = path.as_ref();
    let rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("opening {}", path.display()))?;
    read_transactions(rdr).with_context(|| format!("parsing {}", path.display()))
}

/// Same as [`parse_bank_csv`] but over any reader.
pub fn parse_bank_csv_reader(reader: impl Read) -> Result<Vec<Transaction>> {
    let rdr = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
    read_transactions(rdr)
}

fn read_transactions<R: Read>(mut rdr: csv::Reader<R>) -> Result<Vec<Transaction>> {
    let cleaner = MerchantCleaner::new()?;
    let cols = Columns::from_headers(rdr.headers().context("reading CSV header")?);
    debug!(?cols, "resolved CSV columns");

    let field = |record: &csv::StringRecord, idx: Option<usize>| -> String {
        idx.and_then(|i| record.get(i)).unwrap_or("").to_string()
    };

    let mut txns = Vec::new();
    for result in rdr.records() {
        let record = result?;
        let description = field(&record, cols.description);
        let merchant = if cols.description.is_some() {
            cleaner.clean(&description)
        } else {
            UNKNOWN_MERCHANT.to_string()
        };

        txns.push(Transaction::new(
            parse_date(&field(&record, cols.date)),
            merchant,
            clean_amount(&field(&record, cols.amount)),
            description,
        ));
    }

    Ok(txns)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_basic_rows() {
        let data = "\
Date,Description,Amount
01/15/2026,NETFLIX.COM,-15.49
2026-01-16,\"AMZN Mktp US*2K3\",\"-$1,020.00\"
01/17/2026,PAYROLL ACME INC,2500.00
";
        let txns = parse_bank_csv_reader(data.as_bytes()).unwrap();
        assert_eq!(txns.len(), 3);
        assert_eq!(txns[0].date, "2026-01-15");
        assert_eq!(txns[0].merchant, "NETFLIX.COM");
        assert_eq!(txns[0].amount, -15.49);
        assert_eq!(txns[1].merchant, "AMAZON");
        assert_eq!(txns[1].amount, -1020.0);
        assert_eq!(txns[1].original_description, "AMZN Mktp US*2K3");
        assert_eq!(txns[2].amount, 2500.0);
        assert!(txns.iter().all(|t| t.category.is_none()));
    }

    #[test]
    fn test_headers_are_case_and_space_insensitive() {
        let data = " AMOUNT , date ,Description\n-4.50,03/02/2026,Starbucks #12\n";
        let txns = parse_bank_csv_reader(data.as_bytes()).unwrap();
        assert_eq!(txns[0].amount, -4.5);
        assert_eq!(txns[0].date, "2026-03-02");
        assert_eq!(txns[0].merchant, "STARBUCKS");
    }

    #[test]
    fn test_missing_columns_use_defaults() {
        let data = "Date,Amount\n2026-01-01,-3.00\n";
        let txns = parse_bank_csv_reader(data.as_bytes()).unwrap();
        assert_eq!(txns[0].merchant, UNKNOWN_MERCHANT);
        assert_eq!(txns[0].original_description, "");

        let data = "Description\nCOFFEE\n";
        let txns = parse_bank_csv_reader(data.as_bytes()).unwrap();
        assert_eq!(txns[0].amount, 0.0);
        assert_eq!(txns[0].date, "");
    }

    #[test]
    fn test_unparseable_date_kept_verbatim() {
        let data = "Date,Description,Amount\nPending,UBER TRIP,-12.00\n";
        let txns = parse_bank_csv_reader(data.as_bytes()).unwrap();
        assert_eq!(txns[0].date, "Pending");
    }

    #[test]
    fn test_missing_file_is_error() {
        assert!(parse_bank_csv("/definitely/not/here.csv").is_err());
    }
}
