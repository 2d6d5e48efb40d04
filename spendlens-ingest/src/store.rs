//! JSON persistence for transaction lists passed between pipeline stages.

use anyhow::{Context, Result};
use spendlens_core::Transaction;
use std::fs;
use std::path::Path;

pub fn read_transactions_json(path: impl AsRef<Path>) -> Result<Vec<Transaction>> {
    let path = path.as_ref();
    let s = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    serde_json::from_str(&s).with_context(|| format!("parse {}", path.display()))
}

/// Write pretty-printed JSON (2-space indent).
pub fn write_transactions_json(path: impl AsRef<Path>, txns: &[Transaction]) -> Result<()> {
    let path = path.as_ref();
    let json = serde_json::to_string_pretty(txns).context("serialize transactions")?;
    fs::write(path, json).with_context(|| format!("write {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use spendlens_core::Category;

    #[test]
    fn test_write_then_read_preserves_categories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cleaned.json");
        let txns = vec![
            Transaction::new("2026-01-01", "NETFLIX", -15.49, "NETFLIX.COM"),
            Transaction::new("2026-01-02", "UBER", -9.0, "UBER TRIP")
                .with_category(Category::Transportation),
        ];

        write_transactions_json(&path, &txns).unwrap();
        let raw = fs::read_to_string(&path).unwrap();
        assert!(raw.contains("\n  {"), "expected 2-space indent");

        assert_eq!(read_transactions_json(&path).unwrap(), txns);
    }

    #[test]
    fn test_malformed_json_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        fs::write(&path, "{not json").unwrap();
        let err = read_transactions_json(&path).unwrap_err();
        assert!(format!("{err:#}").contains("parse"));
    }
}
