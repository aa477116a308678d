//! Pipeline orchestration: one statement document in, one OFX document out.
//!
//! Stages run strictly in order — extract/segment/classify in the parser,
//! the reconciliation passes, then serialization — each a pure transform on
//! the previous stage's output. Diagnostics ride along and go to the side
//! channel; they are never embedded in the financial document.

use anyhow::{Context, Result, bail};
use betterment_parser::BettermentParser;
use models::Diagnostic;
use std::fs;
use std::io::Write;
use std::path::PathBuf;

pub struct Config {
    pub input: PathBuf,
    /// OFX destination; standard output when absent.
    pub output: Option<PathBuf>,
    /// Treat the input as pre-extracted statement text instead of a PDF.
    pub from_text: bool,
}

#[derive(Debug)]
pub struct RunSummary {
    pub accounts: usize,
    pub securities: usize,
    pub transactions: usize,
    pub diagnostics: Vec<Diagnostic>,
}

impl RunSummary {
    /// True when the run completed but some rows were excluded or
    /// approximated.
    pub fn degraded(&self) -> bool {
        !self.diagnostics.is_empty()
    }
}

pub fn run(cfg: &Config) -> Result<RunSummary> {
    let parser = BettermentParser::new();
    let stmt = if cfg.from_text {
        let text = fs::read_to_string(&cfg.input)
            .with_context(|| format!("Reading {}", cfg.input.display()))?;
        parser.parse_text(&text)
    } else {
        parser.parse_file(&cfg.input)
    }
    .with_context(|| format!("Parsing statement {}", cfg.input.display()))?;

    if stmt.transactions.is_empty() {
        bail!(
            "no classified transactions in {}; refusing to emit an empty report",
            cfg.input.display()
        );
    }

    let stmt = reconciler::reconcile(stmt);
    let rendered = ofx::render(&stmt).context("Serializing OFX document")?;

    let mut diagnostics = stmt.diagnostics.clone();
    diagnostics.extend(rendered.diagnostics);

    match &cfg.output {
        Some(path) => fs::write(path, &rendered.document)
            .with_context(|| format!("Writing output file {}", path.display()))?,
        None => std::io::stdout()
            .write_all(rendered.document.as_bytes())
            .context("Writing OFX document to stdout")?,
    }

    for diagnostic in &diagnostics {
        tracing::warn!(kind = diagnostic.kind.as_str(), "{}", diagnostic);
    }

    Ok(RunSummary {
        accounts: stmt.reportable_accounts().count(),
        securities: stmt.securities.len(),
        transactions: stmt.transactions.len(),
        diagnostics,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use models::{AccountKind, TxnKind};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn line_at(parts: &[(usize, &str)]) -> String {
        let mut s = String::new();
        for (col, text) in parts {
            while s.len() < *col {
                s.push(' ');
            }
            s.push_str(text);
        }
        s.push('\n');
        s
    }

    fn fixture(extra_sweep_row: Option<&str>) -> String {
        let mut doc = String::new();

        doc.push_str("Cash Reserve\n");
        doc.push_str("Account #1001\n");
        doc.push_str("ACTIVITY\n");
        doc.push_str(&line_at(&[(0, "Date"), (16, "Description"), (52, "Amount")]));
        doc.push_str(&line_at(&[
            (0, "Mar 3, 2025"),
            (16, "Deposit from Checking"),
            (52, "$100.00"),
        ]));
        doc.push_str(&line_at(&[
            (0, "Mar 15, 2025"),
            (16, "Interest Payment"),
            (52, "$1.23"),
        ]));
        doc.push_str("TOTAL HOLDINGS\n");
        doc.push_str("Beginning Balance (Mar 1, 2025)  $1,000.00\n");
        doc.push_str("Ending Balance (Mar 31, 2025)  $1,101.23\n");
        doc.push_str("Page 1 of 3\n");

        doc.push_str("General Investing\n");
        doc.push_str("Account #2001\n");
        doc.push_str("HOLDINGS\n");
        doc.push_str(&line_at(&[
            (0, "Type"),
            (6, "Description"),
            (40, "Ticker"),
            (48, "Shares"),
            (60, "Value"),
            (72, "Shares"),
            (84, "Value"),
            (96, "Shares"),
            (108, "Value"),
        ]));
        doc.push_str(&line_at(&[
            (0, "ETF"),
            (6, "Vanguard Total Stock Market"),
            (40, "VTI"),
            (48, "10.000"),
            (60, "$2,000.00"),
            (72, "1.500"),
            (84, "$300.00"),
            (96, "11.500"),
            (108, "$2,300.00"),
        ]));
        doc.push_str("Total General Investing  $2,300.00\n");
        doc.push_str(&line_at(&[
            (0, "Transaction3"),
            (24, "Date4"),
            (40, "Ticker"),
            (50, "Price"),
            (62, "Shares"),
            (74, "Value"),
        ]));
        doc.push_str(&line_at(&[(0, "Automatic Deposit"), (74, "$300.00")]));
        doc.push_str(&line_at(&[
            (24, "Mar 5, 2025"),
            (40, "VTI"),
            (50, "$200.00"),
            (62, "1.500"),
            (74, "$300.00"),
        ]));
        doc.push_str("Total Activity  $300.00\n");
        doc.push_str("Beginning Balance (Mar 1, 2025)  $2,000.00\n");
        doc.push_str("Ending Balance (Mar 31, 2025)  $2,300.00\n");
        doc.push_str("Page 2 of 3\n");

        doc.push_str("SWEEP TAXABLE CASH ACTIVITY\n");
        doc.push_str("Cash Activity (TAXABLE)\n");
        doc.push_str("SWEEP ACCOUNT\n");
        doc.push_str(&line_at(&[
            (0, "Date"),
            (16, "Goal"),
            (36, "Description"),
            (72, "Transaction"),
            (88, "Balance"),
        ]));
        doc.push_str(&line_at(&[
            (0, "Mar 4, 2025"),
            (16, "General Investing"),
            (36, "Deposit from Checking"),
            (72, "$300.00"),
            (88, "$300.00"),
        ]));
        if let Some(row) = extra_sweep_row {
            doc.push_str(&line_at(&[
                (0, "Mar 6, 2025"),
                (16, "General Investing"),
                (36, row),
                (72, "$9.99"),
                (88, "$309.99"),
            ]));
        }
        doc.push_str("Balance  $300.00\n");
        doc.push_str("Page 3 of 3\n");

        doc
    }

    fn run_fixture(text: &str) -> (Result<RunSummary>, String) {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("statement.txt");
        let output = dir.path().join("statement.ofx");
        std::fs::write(&input, text).unwrap();
        let result = run(&Config {
            input,
            output: Some(output.clone()),
            from_text: true,
        });
        let document = std::fs::read_to_string(&output).unwrap_or_default();
        (result, document)
    }

    #[test]
    fn test_run_produces_ofx_document() {
        let (result, document) = run_fixture(&fixture(None));
        let summary = result.unwrap();
        assert_eq!(summary.accounts, 2);
        assert!(!summary.degraded(), "{:?}", summary.diagnostics);
        assert!(document.starts_with("<?xml version"));
        assert!(document.contains("<BANKMSGSRSV1>"));
        assert!(document.contains("<INVSTMTMSGSRSV1>"));
        assert!(document.contains("<SECLIST>"));
    }

    #[test]
    fn test_run_is_idempotent() {
        let (first, doc_a) = run_fixture(&fixture(None));
        let (second, doc_b) = run_fixture(&fixture(None));
        first.unwrap();
        second.unwrap();
        assert_eq!(doc_a, doc_b);
        assert!(!doc_a.is_empty());
    }

    #[test]
    fn test_cash_conservation() {
        let stmt = BettermentParser::new().parse_text(&fixture(None)).unwrap();
        let stmt = reconciler::reconcile(stmt);
        let cash = stmt
            .accounts
            .iter()
            .find(|a| a.kind == AccountKind::CashReserve)
            .unwrap();
        let total: Decimal = stmt
            .transactions
            .iter()
            .filter(|t| t.account_id == cash.account_id)
            .map(|t| t.amount)
            .sum();
        let beginning = cash.beginning_balance.unwrap();
        let ending = cash.ending_balance.unwrap();
        assert!((beginning + total - ending).abs() <= dec!(0.01));
    }

    #[test]
    fn test_unclassified_row_degrades_but_converts() {
        let (result, document) = run_fixture(&fixture(Some("Quarterly Promo Credit")));
        let summary = result.unwrap();
        assert!(summary.degraded());
        assert!(summary.diagnostics.iter().any(|d| {
            d.kind == models::DiagnosticKind::UnclassifiedTransaction
        }));
        // The rest of the document still converts.
        assert!(document.contains("<INVSTMTMSGSRSV1>"));
    }

    #[test]
    fn test_sweep_deposit_folds_into_investment_account() {
        let stmt = BettermentParser::new().parse_text(&fixture(None)).unwrap();
        let stmt = reconciler::reconcile(stmt);
        let general = stmt
            .accounts
            .iter()
            .find(|a| a.name == "General Investing")
            .unwrap();
        let folded: Vec<_> = stmt
            .transactions
            .iter()
            .filter(|t| t.account_id == general.account_id && t.kind == TxnKind::Transfer)
            .collect();
        assert_eq!(folded.len(), 1);
        assert!(stmt.transactions.iter().all(|t| !t.account_id.starts_with("SWEEP-")));
    }

    #[test]
    fn test_empty_statement_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("statement.txt");
        std::fs::write(&input, "nothing here\n").unwrap();
        let err = run(&Config {
            input,
            output: None,
            from_text: true,
        })
        .unwrap_err();
        assert!(err.to_string().contains("Parsing statement"));
    }
}
