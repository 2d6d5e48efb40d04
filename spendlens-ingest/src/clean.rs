//! Field cleanup for raw bank exports: merchant names, dates and amounts.

use anyhow::Result;
use chrono::NaiveDate;
use regex::Regex;

/// Date layouts tried in order
const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%m/%d/%Y", "%d/%m/%Y"];

/// Substring → canonical merchant. First match wins.
const MERCHANT_ALIASES: [(&str, &str); 7] = [
    ("AMZN", "AMAZON"),
    ("AMAZONCOM", "AMAZON"),
    ("AMAZON.COM", "AMAZON"),
    ("STARBUCKS", "STARBUCKS"),
    ("SBUX", "STARBUCKS"),
    ("WHOLEFDS", "WHOLE FOODS"),
    ("WHOLE FOODS MARKET", "WHOLE FOODS"),
];

pub const UNKNOWN_MERCHANT: &str = "Unknown";

/// Normalizes merchant strings so repeat charges group together
#[derive(Debug, Clone)]
pub struct MerchantCleaner {
    store_number: Regex,
    transaction_id: Regex,
}

impl MerchantCleaner {
    pub fn new() -> Result<Self> {
        Ok(Self {
            store_number: Regex::new(r"#\d+")?,
            transaction_id: Regex::new(r"\*\d+")?,
        })
    }

    /// Strip store numbers and transaction ids, upper-case, then map known aliases.
    pub fn clean(&self, raw: &str) -> String {
        if raw.trim().is_empty() {
            return UNKNOWN_MERCHANT.to_string();
        }

        let s = self.store_number.replace_all(raw, "");
        let s = self.transaction_id.replace_all(&s, "");
        let merchant = s.trim().to_uppercase();

        MERCHANT_ALIASES
            .iter()
            .find(|(pattern, _)| merchant.contains(pattern))
            .map(|(_, canonical)| canonical.to_string())
            .unwrap_or(merchant)
    }
}

/// Parse a date into ISO form, or hand back the input unchanged.
pub fn parse_date(raw: &str) -> String {
    let trimmed = raw.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(trimmed, fmt).ok())
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| raw.to_string())
}

/// "$1,234.50" → 1234.5; anything unparseable → 0.0
pub fn clean_amount(raw: &str) -> f64 {
    raw.replace(['$', ','], "").trim().parse().unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_store_numbers_and_ids() {
        let c = MerchantCleaner::new().unwrap();
        assert_eq!(c.clean("target #1234 "), "TARGET");
        assert_eq!(c.clean("SQ *98765 Blue Bottle"), "SQ  BLUE BOTTLE");
    }

    #[test]
    fn test_known_aliases() {
        let c = MerchantCleaner::new().unwrap();
        assert_eq!(c.clean("AMZN Mktp US*2K3"), "AMAZON");
        assert_eq!(c.clean("Amazon.com*123"), "AMAZON");
        assert_eq!(c.clean("SBUX #555"), "STARBUCKS");
        assert_eq!(c.clean("WHOLEFDS MKT 10233"), "WHOLE FOODS");
        assert_eq!(c.clean("Whole Foods Market"), "WHOLE FOODS");
    }

    #[test]
    fn test_empty_merchant_is_unknown() {
        let c = MerchantCleaner::new().unwrap();
        assert_eq!(c.clean(""), UNKNOWN_MERCHANT);
        assert_eq!(c.clean("   "), UNKNOWN_MERCHANT);
    }

    #[test]
    fn test_parse_date_formats() {
        assert_eq!(parse_date("2026-02-16"), "2026-02-16");
        assert_eq!(parse_date("02/16/2026"), "2026-02-16");
        assert_eq!(parse_date("16/02/2026"), "2026-02-16");
        assert_eq!(parse_date("last tuesday"), "last tuesday");
    }

    #[test]
    fn test_ambiguous_date_prefers_month_first() {
        assert_eq!(parse_date("03/04/2026"), "2026-03-04");
    }

    #[test]
    fn test_clean_amount() {
        assert_eq!(clean_amount("$1,234.50"), 1234.5);
        assert_eq!(clean_amount(" -15.49 "), -15.49);
        assert_eq!(clean_amount("-$9.99"), -9.99);
        assert_eq!(clean_amount("n/a"), 0.0);
        assert_eq!(clean_amount(""), 0.0);
    }
}
