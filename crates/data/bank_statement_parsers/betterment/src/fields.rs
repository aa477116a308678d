//! Parsing of the statement's field formats: `$1,234.56` money, 3-decimal
//! share counts, and `Mar 3, 2025` / `Mar 3 2025` dates. All numeric values
//! come back as fixed-point decimals at the precision the statement reports.

use chrono::NaiveDate;
use regex::Regex;
use rust_decimal::Decimal;
use std::str::FromStr;
use std::sync::OnceLock;

/// Regex fragment for a statement money value, e.g. `-$1,234.56`.
pub const MONEY: &str = r"(-?\$[0-9,.]+)";
/// Regex fragment for a share quantity, e.g. `10.000` or `-0.000`.
pub const SHARES: &str = r"(-?[0-9.,]+)";
/// Regex fragment for a statement date, e.g. `Mar 3, 2025`.
pub const DATE: &str = r"([A-Za-z]{3} [0-9]+,? [0-9]{4})";
/// Regex fragment for a ticker symbol.
pub const SYMBOL: &str = r"([A-Z]+)";

pub fn money_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(&format!("^{}$", MONEY)).unwrap())
}

/// Parses a money cell into a decimal. Dollar sign and thousands separators
/// are statement decoration; the sign is kept.
pub fn parse_money(raw: &str) -> Option<Decimal> {
    let s = raw.trim();
    if s.is_empty() || !money_re().is_match(s) {
        return None;
    }
    let cleaned: String = s.chars().filter(|c| *c != '$' && *c != ',').collect();
    Decimal::from_str(&cleaned).ok()
}

/// Parses a share-quantity cell. The sign is returned separately because the
/// statement reports `-0.000` for sub-increment sales, which a decimal zero
/// cannot carry.
pub fn parse_shares(raw: &str) -> Option<(Decimal, bool)> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    let negative = s.starts_with('-');
    let cleaned: String = s.chars().filter(|c| *c != ',').collect();
    Decimal::from_str(&cleaned).ok().map(|d| (d, negative))
}

/// Statement dates come in two forms, with and without the comma.
pub fn parse_statement_date(raw: &str) -> Option<NaiveDate> {
    let s = raw.trim();
    NaiveDate::parse_from_str(s, "%b %d, %Y")
        .or_else(|_| NaiveDate::parse_from_str(s, "%b %d %Y"))
        .ok()
}

pub fn is_money(raw: &str) -> bool {
    money_re().is_match(raw.trim())
}

/// Parses a money value at the start of a cell, tolerating trailing text.
/// The extractor sometimes tacks the next event's title onto the end of a
/// value cell.
pub fn leading_money(raw: &str) -> Option<Decimal> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| Regex::new(&format!("^{}", MONEY)).unwrap());
    let caps = re.captures(raw.trim())?;
    let cleaned: String = caps[1].chars().filter(|c| *c != '$' && *c != ',').collect();
    Decimal::from_str(&cleaned).ok()
}
