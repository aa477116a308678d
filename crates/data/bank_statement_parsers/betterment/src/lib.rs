//! Parser for Betterment quarterly PDF statements.
//!
//! The pipeline is extract → segment → classify: raw document bytes go
//! through the PDF text collaborator, the line stream is segmented into
//! per-account sections and column-assigned table rows, and each row is
//! classified into a typed transaction record. The output is the shared
//! [`models::Statement`] model, still un-reconciled: sweep-pool records
//! carry pseudo account ids and no identifiers are assigned yet.

pub mod classify;
pub mod extract;
pub mod fields;
pub mod segment;

use classify::{DetailClassifier, Outcome};
use extract::TextLine;
use models::{
    Account, AccountKind, Diagnostic, DiagnosticKind, Statement, SweepPool, SweepPoolKind,
    short_name_hash,
};
use segment::{Section, SectionKind, TableKind};
use std::path::Path;
use thiserror::Error;

pub const PARSER_NAME: &str = "betterment";

#[derive(Debug, Error)]
pub enum ParseError {
    #[error(transparent)]
    Extraction(#[from] extract::ExtractError),
    #[error("cannot read statement: {0}")]
    Io(#[from] std::io::Error),
    #[error("statement header not recognized: no account sections found")]
    HeaderNotRecognized,
}

#[derive(Debug, Default)]
pub struct BettermentParser;

impl BettermentParser {
    pub fn new() -> Self {
        Self
    }

    pub fn parse_file<P: AsRef<Path>>(&self, path: P) -> Result<Statement, ParseError> {
        let bytes = std::fs::read(path.as_ref())?;
        self.parse_bytes(&bytes)
    }

    pub fn parse_bytes(&self, bytes: &[u8]) -> Result<Statement, ParseError> {
        let lines = extract::extract_lines(bytes)?;
        self.build(&lines)
    }

    /// Parses statement text that has already been extracted from the PDF.
    pub fn parse_text(&self, text: &str) -> Result<Statement, ParseError> {
        self.build(&extract::lines_from_text(text))
    }

    fn build(&self, lines: &[TextLine]) -> Result<Statement, ParseError> {
        let segmented = segment::segment(lines);
        let mut stmt = Statement {
            diagnostics: segmented.diagnostics,
            ..Statement::default()
        };

        // The redundant roll-up section is the only place the statement
        // prints the General Investing account number.
        let summary_no = segmented
            .sections
            .iter()
            .find(|s| s.kind == SectionKind::Investment && s.summary_only)
            .and_then(|s| s.account_no.clone());

        for section in &segmented.sections {
            match section.kind {
                SectionKind::CashReserve => add_cash_reserve(section, &mut stmt),
                SectionKind::Investment => {
                    add_investment(section, summary_no.as_deref(), &mut stmt)
                }
                SectionKind::SweepPool => add_pool(section, &mut stmt),
            }
        }

        if stmt.accounts.is_empty() {
            return Err(ParseError::HeaderNotRecognized);
        }
        Ok(stmt)
    }
}

/// Account identifier: statement account number suffixed with a short hash
/// of the account name, or the hash alone when no number is printed.
fn account_identifier(account_no: Option<&str>, name: &str) -> String {
    match account_no {
        Some(no) if !no.is_empty() => format!("{}-{}", no, short_name_hash(name)),
        _ => short_name_hash(name),
    }
}

fn account_from_section(section: &Section, kind: AccountKind, name: &str, account_no: Option<&str>) -> Account {
    Account {
        account_id: account_identifier(account_no, name),
        name: name.to_string(),
        kind,
        external: section.external,
        summary_only: section.summary_only,
        sweep_pool: SweepPoolKind::for_account(kind),
        period_start: section.beginning.map(|(d, _)| d),
        period_end: section.ending.map(|(d, _)| d),
        beginning_balance: section.beginning.map(|(_, b)| b),
        ending_balance: section.ending.map(|(_, b)| b),
    }
}

fn unclassified(row: &segment::ActivityRow, account: &str) -> Diagnostic {
    Diagnostic::new(
        DiagnosticKind::UnclassifiedTransaction,
        format!(
            "unrecognized {:?} row, excluded from output: {}",
            row.table,
            row.get("Description")
        ),
    )
    .at(row.source)
    .for_account(account)
}

fn add_cash_reserve(section: &Section, stmt: &mut Statement) {
    let name = section.name.as_deref().unwrap_or("Cash Reserve");
    let account = account_from_section(section, AccountKind::CashReserve, name, section.account_no.as_deref());
    let account_id = account.account_id.clone();

    for row in section.rows.iter().filter(|r| r.table == TableKind::CashActivity) {
        match classify::classify_cash_row(&account_id, row) {
            Outcome::Record(record) => stmt.transactions.push(record),
            Outcome::Skip => {}
            Outcome::Unrecognized => stmt.diagnostics.push(unclassified(row, &account_id)),
        }
    }
    stmt.accounts.push(account);
}

fn add_investment(section: &Section, summary_no: Option<&str>, stmt: &mut Statement) {
    let name = section.name.clone().unwrap_or_else(|| "Investment".to_string());
    let mut account_no = section.account_no.clone();
    // The statement omits this account's number in its own heading; the
    // roll-up section carries it.
    if name == "General Investing" && account_no.is_none() {
        account_no = summary_no.map(|s| s.to_string());
    }
    let kind = if name.contains("IRA") {
        AccountKind::Ira
    } else {
        AccountKind::Taxable
    };
    let account = account_from_section(section, kind, &name, account_no.as_deref());
    let account_id = account.account_id.clone();
    let reportable = account.reportable();

    for row in &section.rows {
        match row.table {
            TableKind::Holdings => {
                let ticker = row.get("Ticker").trim().to_string();
                if ticker.is_empty() {
                    continue;
                }
                let description = row.get("Description").trim();
                stmt.upsert_security(&ticker, description);
                let begin = fields::parse_shares(row.get("Begin Shares")).map(|(s, _)| s);
                let end = fields::parse_shares(row.get("Shares")).map(|(s, _)| s);
                let value = fields::parse_money(row.get("Value"));
                if let (Some(begin_shares), Some(end_shares), Some(end_value)) = (begin, end, value)
                {
                    if reportable {
                        stmt.holdings.push(models::Holding {
                            account_id: account_id.clone(),
                            symbol: ticker,
                            begin_shares,
                            end_shares,
                            end_value,
                        });
                    }
                } else {
                    stmt.diagnostics.push(
                        Diagnostic::new(
                            DiagnosticKind::MalformedRow,
                            format!("holdings row with unparseable numbers for {}", ticker),
                        )
                        .at(row.source)
                        .for_account(&account_id),
                    );
                }
            }
            TableKind::Dividends => match classify::classify_dividend_row(&account_id, row) {
                Outcome::Record(record) => {
                    if let Some(symbol) = &record.security {
                        stmt.upsert_security(symbol, row.get("Description").trim());
                    }
                    if reportable {
                        stmt.transactions.push(record);
                    }
                }
                Outcome::Skip => {}
                Outcome::Unrecognized => {
                    stmt.diagnostics.push(unclassified(row, &account_id))
                }
            },
            _ => {}
        }
    }

    // Activity detail is stateful: event titles apply to following rows.
    let mut detail = DetailClassifier::new();
    for row in section.rows.iter().filter(|r| r.table == TableKind::ActivityDetail) {
        match detail.classify(&account_id, row) {
            Outcome::Record(record) => {
                if let Some(symbol) = &record.security {
                    stmt.upsert_security(symbol, symbol);
                }
                if reportable {
                    stmt.transactions.push(record);
                }
            }
            Outcome::Skip => {}
            Outcome::Unrecognized => stmt.diagnostics.push(unclassified(row, &account_id)),
        }
    }

    stmt.accounts.push(account);
}

fn add_pool(section: &Section, stmt: &mut Statement) {
    let Some(pool) = section.pool else {
        stmt.diagnostics.push(Diagnostic::new(
            DiagnosticKind::SweepAmbiguity,
            "sweep cash activity section without a (TAXABLE)/(IRA) marker; its rows are dropped",
        ));
        return;
    };
    stmt.sweeps.push(SweepPool {
        kind: pool,
        balance: section.pool_balance,
    });

    for row in &section.rows {
        if !matches!(
            row.table,
            TableKind::SweepActivity | TableKind::SecuritiesActivity
        ) {
            continue;
        }
        match classify::classify_pool_row(pool, row) {
            Outcome::Record(record) => stmt.transactions.push(record),
            Outcome::Skip => {}
            Outcome::Unrecognized => {
                stmt.diagnostics.push(unclassified(row, pool.pseudo_account_id()))
            }
        }
    }
}
