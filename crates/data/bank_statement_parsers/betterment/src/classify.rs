//! Row classification: maps assigned table rows to typed transaction
//! records.
//!
//! Description-driven tables are classified through explicit, ordered rule
//! lists (first match wins). A rule with no variant recognizes a row and
//! deliberately drops it — balance markers and mirror legs of transfers that
//! are already recorded on the opposite table. Rows no rule recognizes are
//! surfaced to the caller, never guessed at.

use crate::fields::{leading_money, parse_money, parse_shares, parse_statement_date};
use crate::segment::{ActivityRow, TableKind};
use chrono::NaiveDate;
use models::{Provenance, SweepPoolKind, TransactionRecord, TxnKind};
use regex::Regex;
use rust_decimal::Decimal;

/// One ordered classification rule: a pattern over the row's description
/// and the variant it produces. `kind: None` means the row is recognized
/// and intentionally dropped.
#[derive(Debug)]
pub struct MatcherRule {
    pub name: &'static str,
    pub pattern: &'static str,
    pub kind: Option<TxnKind>,
}

impl MatcherRule {
    pub fn matches(&self, description: &str) -> bool {
        Regex::new(self.pattern)
            .map(|re| re.is_match(description))
            .unwrap_or(false)
    }
}

pub const CASH_ACTIVITY_RULES: &[MatcherRule] = &[
    MatcherRule {
        name: "beginning-balance",
        pattern: r"^Beginning Balance$",
        kind: None,
    },
    MatcherRule {
        name: "ending-balance",
        pattern: r"^Ending Balance$",
        kind: None,
    },
    MatcherRule {
        name: "interest-payment",
        pattern: r"^Interest Payment$",
        kind: Some(TxnKind::Interest),
    },
    // Everything else on the cash reserve ledger is a signed cash movement.
    MatcherRule {
        name: "cash-movement",
        pattern: r"^.+$",
        kind: Some(TxnKind::Transfer),
    },
];

pub const SWEEP_ACTIVITY_RULES: &[MatcherRule] = &[
    // Mirror leg of a securities-account row; recorded there.
    MatcherRule {
        name: "securities-leg",
        pattern: r"^[A-Za-z]+ (?:of|to|from) Securities Account$",
        kind: None,
    },
    MatcherRule {
        name: "fees",
        pattern: r"^Fees$",
        kind: Some(TxnKind::Fee),
    },
    MatcherRule {
        name: "deposit",
        pattern: r"^Deposit (?:of|to|from) .+$",
        kind: Some(TxnKind::Transfer),
    },
    MatcherRule {
        name: "withdrawal",
        pattern: r"^Withdrawal (?:of|to|from) .+$",
        kind: Some(TxnKind::Transfer),
    },
    MatcherRule {
        name: "transfer",
        pattern: r"^Transfer (?:of|to|from) .+$",
        kind: Some(TxnKind::Transfer),
    },
];

pub const SECURITIES_ACTIVITY_RULES: &[MatcherRule] = &[
    // Mirror leg of a sweep-account row; recorded there.
    MatcherRule {
        name: "sweep-leg",
        pattern: r"^[A-Za-z]+ (?:of|to|from) Sweep Account$",
        kind: None,
    },
    MatcherRule {
        name: "settlement",
        pattern: r"^Settlement (?:of|to|from) .+$",
        kind: None,
    },
    MatcherRule {
        name: "fees",
        pattern: r"^Fees$",
        kind: Some(TxnKind::Fee),
    },
    MatcherRule {
        name: "dividend-payment",
        pattern: r"^Payment of Dividends\b.*$",
        kind: Some(TxnKind::DividendCash),
    },
    MatcherRule {
        name: "transfer",
        pattern: r"^Transfer (?:of|to|from) .+$",
        kind: Some(TxnKind::Transfer),
    },
];

/// Result of classifying one row. `Skip` is a recognized non-record row;
/// `Unrecognized` must surface as a diagnostic at the call site.
#[derive(Debug)]
pub enum Outcome {
    Record(TransactionRecord),
    Skip,
    Unrecognized,
}

fn base_record(
    account_id: &str,
    date: NaiveDate,
    kind: TxnKind,
    amount: Decimal,
    description: &str,
    source: Provenance,
) -> TransactionRecord {
    TransactionRecord {
        id: String::new(),
        account_id: account_id.to_string(),
        date,
        kind,
        security: None,
        amount,
        shares: None,
        price: None,
        description: description.to_string(),
        sweep_goal: None,
        source,
    }
}

fn first_match<'r>(rules: &'r [MatcherRule], description: &str) -> Option<&'r MatcherRule> {
    rules.iter().find(|rule| rule.matches(description))
}

/// Cash reserve activity: `Date | Description | Amount`.
pub fn classify_cash_row(account_id: &str, row: &ActivityRow) -> Outcome {
    let description = row.get("Description").trim();
    let Some(rule) = first_match(CASH_ACTIVITY_RULES, description) else {
        return Outcome::Unrecognized;
    };
    let Some(kind) = rule.kind else {
        return Outcome::Skip;
    };
    let (Some(date), Some(amount)) = (
        parse_statement_date(row.get("Date")),
        parse_money(row.get("Amount")),
    ) else {
        return Outcome::Unrecognized;
    };
    Outcome::Record(base_record(
        account_id,
        date,
        kind,
        amount,
        description,
        row.source,
    ))
}

/// Dividends table: `Payment Date | Ticker | Description | Amount`. Every
/// row is an authoritative dividend posting against the security.
pub fn classify_dividend_row(account_id: &str, row: &ActivityRow) -> Outcome {
    let (Some(date), Some(amount)) = (
        parse_statement_date(row.get("Payment Date")),
        parse_money(row.get("Amount")),
    ) else {
        return Outcome::Unrecognized;
    };
    let ticker = row.get("Ticker").trim();
    if ticker.is_empty() {
        return Outcome::Unrecognized;
    }
    let mut record = base_record(
        account_id,
        date,
        TxnKind::DividendSecurity,
        amount,
        row.get("Description").trim(),
        row.source,
    );
    record.security = Some(ticker.to_string());
    Outcome::Record(record)
}

/// Sweep-pool tables: `Date | Goal | Description | Transaction | Balance`.
/// Records land on the pool's pseudo account and keep the goal label for
/// the folding pass.
pub fn classify_pool_row(pool: SweepPoolKind, row: &ActivityRow) -> Outcome {
    let rules = match row.table {
        TableKind::SecuritiesActivity => SECURITIES_ACTIVITY_RULES,
        _ => SWEEP_ACTIVITY_RULES,
    };
    let description = row.get("Description").trim();
    let Some(rule) = first_match(rules, description) else {
        return Outcome::Unrecognized;
    };
    let Some(kind) = rule.kind else {
        return Outcome::Skip;
    };
    let (Some(date), Some(amount)) = (
        parse_statement_date(row.get("Date")),
        parse_money(row.get("Transaction")),
    ) else {
        return Outcome::Unrecognized;
    };
    let mut record = base_record(
        pool.pseudo_account_id(),
        date,
        kind,
        amount,
        description,
        row.source,
    );
    let goal = row.get("Goal").trim();
    if !goal.is_empty() {
        record.sweep_goal = Some(goal.to_string());
    }
    Outcome::Record(record)
}

/// Stateful classifier for the activity detail table. Event titles ride in
/// the `Transaction` column — on their own header row or prefixed to the
/// first trade row of the event — and apply to every following trade row
/// until the next title.
#[derive(Debug, Default)]
pub struct DetailClassifier {
    event: Option<String>,
    last_date: Option<NaiveDate>,
}

impl DetailClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn classify(&mut self, account_id: &str, row: &ActivityRow) -> Outcome {
        let event_text = row.get("Transaction").trim().to_string();
        let date = parse_statement_date(row.get("Date"));

        let Some(date) = date else {
            // No date: an event header row, holding only a title and an
            // event total.
            if event_text.is_empty() {
                return Outcome::Unrecognized;
            }
            let amount = leading_money(row.get("Value"));
            if event_text.contains("Advisory Fee") {
                // The fee has no ticker row of its own; it posts on the
                // date of the surrounding activity.
                let (Some(amount), Some(fee_date)) = (amount, self.last_date) else {
                    return Outcome::Unrecognized;
                };
                self.event = Some(event_text.clone());
                return Outcome::Record(base_record(
                    account_id,
                    fee_date,
                    TxnKind::Fee,
                    amount,
                    &event_text,
                    row.source,
                ));
            }
            self.event = Some(event_text);
            return Outcome::Skip;
        };

        if !event_text.is_empty() {
            self.event = Some(event_text);
        }
        self.last_date = Some(date);

        let ticker = row.get("Ticker").trim();
        if ticker.is_empty() {
            return Outcome::Unrecognized;
        }
        let (Some(price), Some((shares, negative)), Some(value)) = (
            leading_money(row.get("Price")),
            parse_shares(row.get("Shares")),
            leading_money(row.get("Value")),
        ) else {
            return Outcome::Unrecognized;
        };

        let description = self.event.clone().unwrap_or_default();
        // The sign comes from the raw cell: a reported "-0.000" still means
        // shares left the account.
        let mut record = if negative {
            let mut r = base_record(
                account_id,
                date,
                TxnKind::Sell,
                value.abs(),
                &description,
                row.source,
            );
            r.shares = Some(-shares.abs());
            r
        } else {
            let mut r = base_record(
                account_id,
                date,
                TxnKind::Buy,
                -value.abs(),
                &description,
                row.source,
            );
            r.shares = Some(shares.abs());
            r
        };
        record.security = Some(ticker.to_string());
        record.price = Some(price.abs());
        Outcome::Record(record)
    }
}
