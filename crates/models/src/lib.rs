use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fmt;

/// Decimal places carried for currency amounts.
pub const CASH_SCALE: u32 = 2;
/// Decimal places carried for share quantities and per-share prices.
pub const SHARE_SCALE: u32 = 3;

/// Smallest share quantity the statement reports (one unit at [`SHARE_SCALE`]).
pub fn min_share_increment() -> Decimal {
    Decimal::new(1, SHARE_SCALE)
}

// Account models

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccountKind {
    Taxable,
    Ira,
    CashReserve,
}

impl AccountKind {
    pub fn is_investment(&self) -> bool {
        matches!(self, AccountKind::Taxable | AccountKind::Ira)
    }
}

/// Shared settlement pool. Not a reportable account: everything recorded
/// against a pool is re-attributed to the owning account(s) before output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SweepPoolKind {
    Taxable,
    Ira,
}

impl SweepPoolKind {
    /// Pseudo account id carried by pool transactions until they are folded.
    pub fn pseudo_account_id(&self) -> &'static str {
        match self {
            SweepPoolKind::Taxable => "SWEEP-TAXABLE",
            SweepPoolKind::Ira => "SWEEP-IRA",
        }
    }

    pub fn for_account(kind: AccountKind) -> Option<SweepPoolKind> {
        match kind {
            AccountKind::Taxable => Some(SweepPoolKind::Taxable),
            AccountKind::Ira => Some(SweepPoolKind::Ira),
            AccountKind::CashReserve => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepPool {
    pub kind: SweepPoolKind,
    /// Running balance after the last pool row, shared by every account
    /// referencing the pool.
    pub balance: Option<Decimal>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub account_id: String,
    pub name: String,
    pub kind: AccountKind,
    /// Held at another institution; excluded from output.
    pub external: bool,
    /// Redundant roll-up section; excluded from output.
    pub summary_only: bool,
    pub sweep_pool: Option<SweepPoolKind>,
    pub period_start: Option<NaiveDate>,
    pub period_end: Option<NaiveDate>,
    pub beginning_balance: Option<Decimal>,
    pub ending_balance: Option<Decimal>,
}

impl Account {
    pub fn reportable(&self) -> bool {
        !self.external && !self.summary_only
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AssetClass {
    Fund,
    Stock,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Security {
    pub symbol: String,
    pub name: String,
    pub asset_class: AssetClass,
}

/// Period-end position for one security in one account, with the share
/// counts the statement reports at both ends of the period.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Holding {
    pub account_id: String,
    pub symbol: String,
    pub begin_shares: Decimal,
    pub end_shares: Decimal,
    pub end_value: Decimal,
}

// Transaction models

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TxnKind {
    Buy,
    Sell,
    DividendCash,
    DividendSecurity,
    Interest,
    Fee,
    Transfer,
    ShareAdjustment,
}

impl TxnKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TxnKind::Buy => "buy",
            TxnKind::Sell => "sell",
            TxnKind::DividendCash => "dividend_cash",
            TxnKind::DividendSecurity => "dividend_security",
            TxnKind::Interest => "interest",
            TxnKind::Fee => "fee",
            TxnKind::Transfer => "transfer",
            TxnKind::ShareAdjustment => "share_adjustment",
        }
    }
}

/// Where in the source document a record or problem came from.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Provenance {
    pub page: u32,
    pub row: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionRecord {
    /// Stable identifier, assigned after reconciliation. Empty until then.
    #[serde(default)]
    pub id: String,
    pub account_id: String,
    pub date: NaiveDate,
    pub kind: TxnKind,
    pub security: Option<String>,
    /// Signed cash amount: negative for cash leaving the account.
    pub amount: Decimal,
    /// Signed share quantity: negative for shares leaving the account.
    pub shares: Option<Decimal>,
    pub price: Option<Decimal>,
    pub description: String,
    /// Owning-account label from the sweep tables, when the record came off
    /// a pool. Consumed by the sweep-folding pass.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sweep_goal: Option<String>,
    pub source: Provenance,
}

// Diagnostics

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiagnosticKind {
    MalformedRow,
    UnclassifiedTransaction,
    SerializationConstraint,
    SweepAmbiguity,
    UnresolvedDividend,
    DividendCrossPeriod,
}

impl DiagnosticKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiagnosticKind::MalformedRow => "malformed row",
            DiagnosticKind::UnclassifiedTransaction => "unclassified transaction",
            DiagnosticKind::SerializationConstraint => "serialization constraint",
            DiagnosticKind::SweepAmbiguity => "sweep ambiguity",
            DiagnosticKind::UnresolvedDividend => "unresolved dividend",
            DiagnosticKind::DividendCrossPeriod => "dividend cross-period duplicate",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub message: String,
    pub page: Option<u32>,
    pub row: Option<u32>,
    pub account: Option<String>,
    pub date: Option<NaiveDate>,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            page: None,
            row: None,
            account: None,
            date: None,
        }
    }

    pub fn at(mut self, source: Provenance) -> Self {
        self.page = Some(source.page);
        self.row = Some(source.row);
        self
    }

    pub fn for_account(mut self, account_id: impl Into<String>) -> Self {
        self.account = Some(account_id.into());
        self
    }

    pub fn on_date(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind.as_str(), self.message)?;
        if let (Some(page), Some(row)) = (self.page, self.row) {
            write!(f, " (page {}, row {})", page, row)?;
        }
        if let Some(account) = &self.account {
            write!(f, " [account {}]", account)?;
        }
        if let Some(date) = self.date {
            write!(f, " [{}]", date.format("%Y-%m-%d"))?;
        }
        Ok(())
    }
}

// Statement model

/// The full in-memory model of one converted statement. Built by the parser,
/// rewritten in place by the reconciliation passes, consumed by the
/// serializer. Lives for exactly one run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Statement {
    pub accounts: Vec<Account>,
    pub sweeps: Vec<SweepPool>,
    pub securities: Vec<Security>,
    pub holdings: Vec<Holding>,
    pub transactions: Vec<TransactionRecord>,
    pub diagnostics: Vec<Diagnostic>,
}

impl Statement {
    pub fn account(&self, account_id: &str) -> Option<&Account> {
        self.accounts.iter().find(|a| a.account_id == account_id)
    }

    pub fn security(&self, symbol: &str) -> Option<&Security> {
        self.securities.iter().find(|s| s.symbol == symbol)
    }

    /// Registers a security if the symbol is new; an existing entry keeps its
    /// (usually richer) name.
    pub fn upsert_security(&mut self, symbol: &str, name: &str) {
        if self.security(symbol).is_none() {
            self.securities.push(Security {
                symbol: symbol.to_string(),
                name: name.to_string(),
                asset_class: AssetClass::Fund,
            });
        }
    }

    /// Accounts that appear in the output, in statement order.
    pub fn reportable_accounts(&self) -> impl Iterator<Item = &Account> {
        self.accounts.iter().filter(|a| a.reportable())
    }

    pub fn sweep_balance(&self, kind: SweepPoolKind) -> Option<Decimal> {
        self.sweeps
            .iter()
            .find(|p| p.kind == kind)
            .and_then(|p| p.balance)
    }
}

// Statement periods

/// Calendar quarter containing `date`, as `(year, quarter)`.
pub fn period_of(date: NaiveDate) -> (i32, u32) {
    (date.year(), date.month0() / 3 + 1)
}

/// Last day of the calendar quarter containing `date`.
pub fn period_end(date: NaiveDate) -> NaiveDate {
    let (year, quarter) = period_of(date);
    match quarter {
        1 => NaiveDate::from_ymd_opt(year, 3, 31),
        2 => NaiveDate::from_ymd_opt(year, 6, 30),
        3 => NaiveDate::from_ymd_opt(year, 9, 30),
        _ => NaiveDate::from_ymd_opt(year, 12, 31),
    }
    .expect("quarter end is always a valid date")
}

// Deterministic identifiers

pub fn sha256_hex(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    hex::encode(hasher.finalize())
}

/// Six-hex-digit tag derived from an account name, appended to statement
/// account numbers so same-numbered sections stay distinct.
pub fn short_name_hash(name: &str) -> String {
    sha256_hex(name)[..6].to_string()
}

/// Stable transaction identifier: deterministic over account, date, variant
/// and the record's sequence number among its peers, so re-running the
/// conversion on the same input yields identical ids.
pub fn txn_id(account_id: &str, date: NaiveDate, kind: TxnKind, seq: u32) -> String {
    let key = format!(
        "{}|{}|{}|{}",
        account_id,
        date.format("%Y-%m-%d"),
        kind.as_str(),
        seq
    );
    format!("BTMT-{}", &sha256_hex(&key)[..24])
}

/// Assigns identifiers in stream order. Must run after the reconciliation
/// passes have fixed account attribution and per-account ordering.
pub fn assign_transaction_ids(transactions: &mut [TransactionRecord]) {
    let mut seq: HashMap<(String, NaiveDate, TxnKind), u32> = HashMap::new();
    for txn in transactions.iter_mut() {
        let counter = seq
            .entry((txn.account_id.clone(), txn.date, txn.kind))
            .or_insert(0);
        txn.id = txn_id(&txn.account_id, txn.date, txn.kind, *counter);
        *counter += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn record(account: &str, d: NaiveDate, kind: TxnKind) -> TransactionRecord {
        TransactionRecord {
            id: String::new(),
            account_id: account.to_string(),
            date: d,
            kind,
            security: None,
            amount: dec!(1.00),
            shares: None,
            price: None,
            description: "test".to_string(),
            sweep_goal: None,
            source: Provenance::default(),
        }
    }

    #[test]
    fn test_period_of_quarters() {
        assert_eq!(period_of(date(2025, 1, 15)), (2025, 1));
        assert_eq!(period_of(date(2025, 3, 31)), (2025, 1));
        assert_eq!(period_of(date(2025, 4, 1)), (2025, 2));
        assert_eq!(period_of(date(2025, 12, 31)), (2025, 4));
    }

    #[test]
    fn test_period_end() {
        assert_eq!(period_end(date(2025, 2, 10)), date(2025, 3, 31));
        assert_eq!(period_end(date(2025, 6, 30)), date(2025, 6, 30));
        assert_eq!(period_end(date(2025, 10, 1)), date(2025, 12, 31));
    }

    #[test]
    fn test_txn_ids_are_deterministic() {
        let d = date(2025, 3, 3);
        let first = txn_id("123-abc", d, TxnKind::Buy, 0);
        let second = txn_id("123-abc", d, TxnKind::Buy, 0);
        assert_eq!(first, second);
        assert!(first.starts_with("BTMT-"));
        assert_eq!(first.len(), "BTMT-".len() + 24);
    }

    #[test]
    fn test_txn_ids_distinguish_sequence_and_kind() {
        let d = date(2025, 3, 3);
        let a = txn_id("123-abc", d, TxnKind::Buy, 0);
        let b = txn_id("123-abc", d, TxnKind::Buy, 1);
        let c = txn_id("123-abc", d, TxnKind::Sell, 0);
        assert_ne!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_assign_transaction_ids_idempotent() {
        let d = date(2025, 3, 3);
        let mut txns = vec![
            record("A", d, TxnKind::Buy),
            record("A", d, TxnKind::Buy),
            record("B", d, TxnKind::Buy),
        ];
        assign_transaction_ids(&mut txns);
        let ids: Vec<String> = txns.iter().map(|t| t.id.clone()).collect();
        assert_ne!(ids[0], ids[1]);
        assert_ne!(ids[0], ids[2]);

        // Re-running on the same stream yields the same ids.
        let mut again = txns.clone();
        for t in again.iter_mut() {
            t.id.clear();
        }
        assign_transaction_ids(&mut again);
        let ids_again: Vec<String> = again.iter().map(|t| t.id.clone()).collect();
        assert_eq!(ids, ids_again);
    }

    #[test]
    fn test_short_name_hash_stable() {
        assert_eq!(short_name_hash("Safety Net"), short_name_hash("Safety Net"));
        assert_eq!(short_name_hash("Safety Net").len(), 6);
        assert_ne!(short_name_hash("Safety Net"), short_name_hash("Build Wealth"));
    }

    #[test]
    fn test_upsert_security_keeps_first_name() {
        let mut stmt = Statement::default();
        stmt.upsert_security("VTI", "Vanguard Total Stock Market ETF");
        stmt.upsert_security("VTI", "VTI");
        assert_eq!(stmt.securities.len(), 1);
        assert_eq!(stmt.securities[0].name, "Vanguard Total Stock Market ETF");
    }

    #[test]
    fn test_min_share_increment() {
        assert_eq!(min_share_increment(), dec!(0.001));
    }
}
