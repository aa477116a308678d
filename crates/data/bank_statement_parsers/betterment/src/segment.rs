//! Statement segmentation: breaks the extracted line stream into per-account
//! sections, locates the tables inside each section by their literal header
//! rows, and assigns data-row tokens to columns by nearest-offset matching.
//!
//! Sections are assembled the way the statement itself is laid out: content
//! accumulates per page and is attributed to the most recently opened
//! section when the `Page N of M` marker closes the page, so an account's
//! title block lands in the section its page belongs to even when it
//! precedes the section marker.

use crate::extract::{is_page_marker, TextLine, Token};
use crate::fields::{parse_money, parse_statement_date, DATE, MONEY, SHARES, SYMBOL};
use chrono::NaiveDate;
use models::{Diagnostic, DiagnosticKind, Provenance, SweepPoolKind};
use regex::Regex;
use rust_decimal::Decimal;
use std::sync::OnceLock;

pub const CASH_ACTIVITY_HEADER: &str = "Date Description Amount";
pub const HOLDINGS_HEADER: &str =
    "Type Description Ticker Shares Value Shares Value Shares Value";
pub const HOLDINGS_CONT_HEADER: &str =
    "Description Fund Shares Value Shares Value Shares Value";
pub const DIVIDENDS_HEADER: &str = "Payment Date Ticker Description Amount";
pub const ACTIVITY_DETAIL_HEADER: &str = "Transaction Date Ticker Price Shares Value";
pub const SWEEP_TABLE_HEADER: &str = "Date Goal Description Transaction Balance";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionKind {
    CashReserve,
    Investment,
    SweepPool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableKind {
    CashActivity,
    Holdings,
    Dividends,
    ActivityDetail,
    SweepActivity,
    SecuritiesActivity,
}

/// One data row assigned to a table's columns: ordered column-name → raw
/// cell pairs plus source provenance. Consumed by the classifier and then
/// discarded.
#[derive(Debug, Clone)]
pub struct ActivityRow {
    pub table: TableKind,
    columns: Vec<(String, String)>,
    pub source: Provenance,
}

impl ActivityRow {
    pub fn get(&self, name: &str) -> &str {
        self.columns
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
            .unwrap_or("")
    }

    #[cfg(test)]
    pub fn from_cells(table: TableKind, cells: &[(&str, &str)]) -> Self {
        Self {
            table,
            columns: cells
                .iter()
                .map(|(n, v)| (n.to_string(), v.to_string()))
                .collect(),
            source: Provenance::default(),
        }
    }
}

/// One statement section: a single account's pages, with header metadata
/// pulled out and every table row assigned to columns.
#[derive(Debug, Clone)]
pub struct Section {
    pub kind: SectionKind,
    pub name: Option<String>,
    pub account_no: Option<String>,
    pub external: bool,
    pub summary_only: bool,
    pub pool: Option<SweepPoolKind>,
    pub beginning: Option<(NaiveDate, Decimal)>,
    pub ending: Option<(NaiveDate, Decimal)>,
    pub rows: Vec<ActivityRow>,
    /// Running balance on the last sweep-table row; the pool-level cash
    /// balance shared by every account referencing the pool.
    pub pool_balance: Option<Decimal>,
}

#[derive(Debug)]
pub struct Segmented {
    pub sections: Vec<Section>,
    pub diagnostics: Vec<Diagnostic>,
}

pub fn segment(lines: &[TextLine]) -> Segmented {
    let mut diagnostics = Vec::new();
    let raw_sections = coalesce(split_sections(lines));
    let mut sections = Vec::new();
    for (kind, section_lines) in raw_sections {
        sections.push(build_section(kind, &section_lines, &mut diagnostics));
    }
    Segmented {
        sections,
        diagnostics,
    }
}

// Section splitting

fn sweep_section_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^SWEEP[A-Z ]*CASH ACTIVITY$").unwrap())
}

fn split_sections(lines: &[TextLine]) -> Vec<(SectionKind, Vec<TextLine>)> {
    let mut sections: Vec<(SectionKind, Vec<TextLine>)> = Vec::new();
    let mut currpage: Vec<TextLine> = Vec::new();

    for line in lines {
        if line.raw == "ACTIVITY" && sections.last().map(|(k, _)| *k) != Some(SectionKind::CashReserve)
        {
            sections.push((SectionKind::CashReserve, Vec::new()));
            currpage.push(line.clone());
        } else if line.raw == "HOLDINGS" {
            sections.push((SectionKind::Investment, Vec::new()));
            currpage.push(line.clone());
        } else if sweep_section_re().is_match(&line.raw) {
            sections.push((SectionKind::SweepPool, Vec::new()));
            currpage.push(line.clone());
        } else if is_page_marker(&line.raw) {
            // Close of a page: everything gathered belongs to the newest
            // section. Content before the first section marker is preamble.
            if let Some((_, section_lines)) = sections.last_mut() {
                section_lines.append(&mut currpage);
            } else {
                currpage.clear();
            }
        } else {
            currpage.push(line.clone());
        }
    }
    if let Some((_, section_lines)) = sections.last_mut() {
        section_lines.append(&mut currpage);
    }
    sections
}

/// Continuation pages repeat section titles; a section with no identity of
/// its own (no balances, no account number, no pool marker) is a
/// continuation of its same-kind predecessor.
fn coalesce(sections: Vec<(SectionKind, Vec<TextLine>)>) -> Vec<(SectionKind, Vec<TextLine>)> {
    let mut out: Vec<(SectionKind, Vec<TextLine>)> = Vec::new();
    for (kind, lines) in sections {
        let continuation = matches!(
            out.last(),
            Some((prev_kind, _)) if *prev_kind == kind && !has_own_identity(kind, &lines)
        );
        if continuation {
            out.last_mut().unwrap().1.extend(lines);
        } else {
            out.push((kind, lines));
        }
    }
    out
}

fn has_own_identity(kind: SectionKind, lines: &[TextLine]) -> bool {
    match kind {
        SectionKind::CashReserve => lines.iter().any(|l| balance_re().is_match(&l.raw)),
        SectionKind::Investment => lines
            .iter()
            .any(|l| account_no_re().is_match(&l.raw) || balance_re().is_match(&l.raw)),
        SectionKind::SweepPool => lines
            .iter()
            .any(|l| l.raw.ends_with("(TAXABLE)") || l.raw.ends_with("(IRA)")),
    }
}

// Section metadata

fn account_no_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"Account #([0-9]+)").unwrap())
}

fn balance_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(&format!(
            r"^(Beginning|Ending) Balance \(([^)]+)\) {}$",
            MONEY
        ))
        .unwrap()
    })
}

fn name_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^([A-Za-z ]+)(?: \(.*\))?$").unwrap())
}

fn is_reserved_line(raw: &str) -> bool {
    matches!(
        raw,
        "ACTIVITY" | "HOLDINGS" | "TOTAL HOLDINGS" | "TOTAL PROGRAM BANK DETAILS"
    ) || raw == CASH_ACTIVITY_HEADER
        || raw == HOLDINGS_HEADER
        || raw == HOLDINGS_CONT_HEADER
        || raw == DIVIDENDS_HEADER
        || raw == SWEEP_TABLE_HEADER
        || is_activity_detail_header(raw)
        || raw.starts_with("Total ")
        || raw.starts_with("Balance ")
        || sweep_section_re().is_match(raw)
}

fn build_section(
    kind: SectionKind,
    lines: &[TextLine],
    diagnostics: &mut Vec<Diagnostic>,
) -> Section {
    let mut section = Section {
        kind,
        name: None,
        account_no: None,
        external: false,
        summary_only: false,
        pool: None,
        beginning: None,
        ending: None,
        rows: Vec::new(),
        pool_balance: None,
    };

    if kind == SectionKind::CashReserve {
        section.name = Some("Cash Reserve".to_string());
    }

    for (idx, line) in lines.iter().enumerate() {
        if let Some(caps) = account_no_re().captures(&line.raw) {
            if section.account_no.is_none() {
                section.account_no = Some(caps[1].to_string());
            }
        }
        if let Some(caps) = balance_re().captures(&line.raw) {
            let date = parse_statement_date(&caps[2]);
            let amount = parse_money(&caps[3]);
            if let (Some(date), Some(amount)) = (date, amount) {
                match &caps[1] {
                    "Beginning" => section.beginning = Some((date, amount)),
                    _ => section.ending = Some((date, amount)),
                }
            }
        }
        if idx < 20 {
            if line.raw.ends_with("(External)") {
                section.external = true;
            }
            if kind == SectionKind::SweepPool {
                if line.raw.ends_with("(TAXABLE)") {
                    section.pool = Some(SweepPoolKind::Taxable);
                } else if line.raw.ends_with("(IRA)") {
                    section.pool = Some(SweepPoolKind::Ira);
                }
            }
        }
        if line.raw == "Taxable Investing Account" {
            section.summary_only = true;
        }
        if kind == SectionKind::Investment && section.name.is_none() && !is_reserved_line(&line.raw)
        {
            if let Some(caps) = name_re().captures(&line.raw) {
                section.name = Some(caps[1].trim().to_string());
            }
        }
    }

    scan_tables(&mut section, lines, diagnostics);
    section
}

// Table location and column assignment

#[derive(Debug, Clone)]
pub struct TableSchema {
    pub kind: TableKind,
    columns: Vec<(String, usize)>,
}

impl TableSchema {
    fn new(kind: TableKind, names: &[&str], header: &TextLine) -> Option<Self> {
        if header.tokens.len() != names.len() {
            return None;
        }
        Some(Self {
            kind,
            columns: names
                .iter()
                .zip(&header.tokens)
                .map(|(name, token)| (name.to_string(), token.col))
                .collect(),
        })
    }

    fn nearest(&self, col: usize) -> usize {
        self.columns
            .iter()
            .enumerate()
            .min_by_key(|(_, (_, c))| c.abs_diff(col))
            .map(|(i, _)| i)
            .unwrap_or(0)
    }

    fn assign(&self, line: &TextLine) -> ActivityRow {
        let mut values: Vec<String> = vec![String::new(); self.columns.len()];
        for token in &line.tokens {
            let idx = self.nearest(token.col);
            if !values[idx].is_empty() {
                values[idx].push(' ');
            }
            values[idx].push_str(&token.text);
        }
        ActivityRow {
            table: self.kind,
            columns: self
                .columns
                .iter()
                .map(|(name, _)| name.clone())
                .zip(values)
                .collect(),
            source: Provenance {
                page: line.page,
                row: line.row,
            },
        }
    }
}

fn is_activity_detail_header(raw: &str) -> bool {
    // The statement suffixes these column titles with footnote digits
    // ("Transaction3 Date4 ..."); strip digits before comparing.
    let stripped: String = raw.chars().filter(|c| !c.is_ascii_digit()).collect();
    stripped == ACTIVITY_DETAIL_HEADER
}

fn match_header(kind: SectionKind, line: &TextLine, prev: &[TextLine]) -> Option<TableSchema> {
    match kind {
        SectionKind::CashReserve if line.raw == CASH_ACTIVITY_HEADER => TableSchema::new(
            TableKind::CashActivity,
            &["Date", "Description", "Amount"],
            line,
        ),
        SectionKind::Investment if line.raw == HOLDINGS_HEADER => TableSchema::new(
            TableKind::Holdings,
            &[
                "Type",
                "Description",
                "Ticker",
                "Begin Shares",
                "Begin Value",
                "Change Shares",
                "Change Value",
                "Shares",
                "Value",
            ],
            line,
        ),
        SectionKind::Investment if line.raw == DIVIDENDS_HEADER => TableSchema::new(
            TableKind::Dividends,
            &["Payment Date", "Ticker", "Description", "Amount"],
            line,
        ),
        SectionKind::Investment if is_activity_detail_header(&line.raw) => TableSchema::new(
            TableKind::ActivityDetail,
            &["Transaction", "Date", "Ticker", "Price", "Shares", "Value"],
            line,
        ),
        SectionKind::SweepPool if line.raw == SWEEP_TABLE_HEADER => {
            // The same header opens both pool tables; the nearest preceding
            // title line says which one this is.
            let table = prev
                .iter()
                .rev()
                .take(8)
                .find_map(|l| {
                    if l.raw.starts_with("SECURITIES ACCOUNT") {
                        Some(TableKind::SecuritiesActivity)
                    } else if l.raw.starts_with("SWEEP") {
                        Some(TableKind::SweepActivity)
                    } else {
                        None
                    }
                })
                .unwrap_or(TableKind::SweepActivity);
            TableSchema::new(
                table,
                &["Date", "Goal", "Description", "Transaction", "Balance"],
                line,
            )
        }
        _ => None,
    }
}

fn is_table_header_line(kind: SectionKind, raw: &str) -> bool {
    match kind {
        SectionKind::CashReserve => raw == CASH_ACTIVITY_HEADER,
        SectionKind::Investment => {
            raw == HOLDINGS_HEADER || raw == DIVIDENDS_HEADER || is_activity_detail_header(raw)
        }
        SectionKind::SweepPool => raw == SWEEP_TABLE_HEADER,
    }
}

fn table_ends(table: TableKind, raw: &str) -> bool {
    match table {
        TableKind::CashActivity => raw == "TOTAL HOLDINGS",
        TableKind::Holdings | TableKind::Dividends | TableKind::ActivityDetail => {
            raw.starts_with("Total ")
        }
        TableKind::SweepActivity | TableKind::SecuritiesActivity => raw.starts_with("Balance "),
    }
}

/// Titles repeated when a table continues onto a new page.
fn is_repeated_header(table: TableKind, raw: &str) -> bool {
    match table {
        TableKind::CashActivity => raw == "ACTIVITY" || raw == CASH_ACTIVITY_HEADER,
        TableKind::Holdings => raw == HOLDINGS_HEADER || raw == HOLDINGS_CONT_HEADER,
        TableKind::Dividends => raw == DIVIDENDS_HEADER,
        TableKind::ActivityDetail => is_activity_detail_header(raw),
        TableKind::SweepActivity | TableKind::SecuritiesActivity => raw == SWEEP_TABLE_HEADER,
    }
}

/// Tables whose description cells wrap onto a short line of their own,
/// rejoined with the following line before assignment.
fn allows_wrap(table: TableKind) -> bool {
    !matches!(table, TableKind::CashActivity)
}

fn row_plausible_re(table: TableKind) -> &'static Regex {
    static CASH: OnceLock<Regex> = OnceLock::new();
    static HOLDINGS: OnceLock<Regex> = OnceLock::new();
    static DIVIDENDS: OnceLock<Regex> = OnceLock::new();
    static DETAIL: OnceLock<Regex> = OnceLock::new();
    static SWEEP: OnceLock<Regex> = OnceLock::new();
    match table {
        TableKind::CashActivity => CASH.get_or_init(|| {
            Regex::new(&format!(r"^{} .+ {}$", DATE, MONEY)).unwrap()
        }),
        TableKind::Holdings => HOLDINGS.get_or_init(|| {
            Regex::new(&format!(
                r"^.+ {sym} {s} {m} {s} {m} {s} {m}$",
                sym = SYMBOL,
                s = SHARES,
                m = MONEY
            ))
            .unwrap()
        }),
        TableKind::Dividends => DIVIDENDS.get_or_init(|| {
            Regex::new(&format!(r"^{} {} .+ {}$", DATE, SYMBOL, MONEY)).unwrap()
        }),
        TableKind::ActivityDetail => DETAIL.get_or_init(|| {
            // A trailing event title sometimes rides on the end of a row.
            Regex::new(&format!(r"{}[A-Za-z ]*$", MONEY)).unwrap()
        }),
        TableKind::SweepActivity | TableKind::SecuritiesActivity => SWEEP.get_or_init(|| {
            Regex::new(&format!(r"^{} .+ {m} {m}$", DATE, m = MONEY)).unwrap()
        }),
    }
}

fn merge_lines(first: &TextLine, second: &TextLine) -> TextLine {
    let mut tokens: Vec<Token> = first.tokens.clone();
    tokens.extend(second.tokens.iter().cloned());
    TextLine {
        page: first.page,
        row: first.row,
        raw: format!("{} {}", first.raw, second.raw),
        tokens,
    }
}

fn malformed(line: &TextLine, table: TableKind) -> Diagnostic {
    Diagnostic::new(
        DiagnosticKind::MalformedRow,
        format!("cannot assign row to {:?} columns: {}", table, line.raw),
    )
    .at(Provenance {
        page: line.page,
        row: line.row,
    })
}

fn scan_tables(section: &mut Section, lines: &[TextLine], diagnostics: &mut Vec<Diagnostic>) {
    let mut current: Option<TableSchema> = None;
    let mut saved: Option<TextLine> = None;

    for (idx, line) in lines.iter().enumerate() {
        if let Some(table) = current.as_ref().map(|s| s.kind) {
            if table_ends(table, &line.raw) {
                if let Some(held) = saved.take() {
                    diagnostics.push(malformed(&held, table));
                }
                current = None;
                continue;
            }
            if is_repeated_header(table, &line.raw) {
                saved = None;
                continue;
            }
            if is_table_header_line(section.kind, &line.raw) {
                // A different table starts without the previous one's footer.
                if let Some(held) = saved.take() {
                    diagnostics.push(malformed(&held, table));
                }
                current = open_table(section, line, &lines[..idx], diagnostics);
                continue;
            }

            let candidate = match saved.take() {
                Some(held) => merge_lines(&held, line),
                None => line.clone(),
            };
            if row_plausible_re(table).is_match(&candidate.raw) {
                if let Some(schema) = &current {
                    section.rows.push(schema.assign(&candidate));
                }
            } else if allows_wrap(table) {
                saved = Some(candidate);
            } else {
                diagnostics.push(malformed(&candidate, table));
            }
            continue;
        }

        if is_table_header_line(section.kind, &line.raw) {
            current = open_table(section, line, &lines[..idx], diagnostics);
        }
    }
    if let Some(table) = current.as_ref().map(|s| s.kind) {
        if let Some(held) = saved.take() {
            diagnostics.push(malformed(&held, table));
        }
    }

    section.pool_balance = section
        .rows
        .iter()
        .filter(|r| r.table == TableKind::SweepActivity)
        .last()
        .and_then(|r| parse_money(r.get("Balance")));
}

fn open_table(
    section: &Section,
    line: &TextLine,
    prev: &[TextLine],
    diagnostics: &mut Vec<Diagnostic>,
) -> Option<TableSchema> {
    let schema = match_header(section.kind, line, prev);
    if schema.is_none() {
        diagnostics.push(
            Diagnostic::new(
                DiagnosticKind::MalformedRow,
                format!("table header does not split into columns: {}", line.raw),
            )
            .at(Provenance {
                page: line.page,
                row: line.row,
            }),
        );
    }
    schema
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::lines_from_text;
    use rust_decimal_macros::dec;

    /// Builds a line with text placed at explicit column offsets, so the
    /// nearest-offset assignment is exercised the way aligned statement
    /// text drives it.
    fn line_at(parts: &[(usize, &str)]) -> String {
        let mut s = String::new();
        for (col, text) in parts {
            while s.len() < *col {
                s.push(' ');
            }
            s.push_str(text);
        }
        s
    }

    fn investment_fixture() -> String {
        let mut doc = String::new();
        doc.push_str("Build Wealth\n");
        doc.push_str("Account #2002\n");
        doc.push_str("HOLDINGS\n");
        doc.push_str(&line_at(&[
            (0, "Type"),
            (6, "Description"),
            (40, "Ticker"),
            (48, "Shares"),
            (58, "Value"),
            (70, "Shares"),
            (80, "Value"),
            (92, "Shares"),
            (102, "Value"),
        ]));
        doc.push('\n');
        doc.push_str(&line_at(&[
            (0, "ETF"),
            (6, "Vanguard Total Stock Market"),
            (40, "VTI"),
            (48, "10.000"),
            (58, "$2,000.00"),
            (70, "1.500"),
            (80, "$300.00"),
            (92, "11.500"),
            (102, "$2,300.00"),
        ]));
        doc.push('\n');
        doc.push_str("Total Build Wealth  $2,300.00\n");
        doc.push_str("Beginning Balance (Jan 1, 2025)  $2,000.00\n");
        doc.push_str("Ending Balance (Mar 31, 2025)  $2,300.00\n");
        doc.push_str("Page 2 of 9\n");
        doc
    }

    #[test]
    fn test_investment_section_metadata() {
        let lines = lines_from_text(&investment_fixture());
        let segmented = segment(&lines);
        assert_eq!(segmented.sections.len(), 1);
        let section = &segmented.sections[0];
        assert_eq!(section.kind, SectionKind::Investment);
        assert_eq!(section.name.as_deref(), Some("Build Wealth"));
        assert_eq!(section.account_no.as_deref(), Some("2002"));
        assert!(!section.external);
        let (end_date, end_amount) = section.ending.unwrap();
        assert_eq!(end_date.to_string(), "2025-03-31");
        assert_eq!(end_amount, dec!(2300.00));
        assert!(segmented.diagnostics.is_empty());
    }

    #[test]
    fn test_holdings_row_columns() {
        let lines = lines_from_text(&investment_fixture());
        let segmented = segment(&lines);
        let rows = &segmented.sections[0].rows;
        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(row.table, TableKind::Holdings);
        assert_eq!(row.get("Description"), "Vanguard Total Stock Market");
        assert_eq!(row.get("Ticker"), "VTI");
        assert_eq!(row.get("Begin Shares"), "10.000");
        assert_eq!(row.get("Shares"), "11.500");
        assert_eq!(row.get("Value"), "$2,300.00");
    }

    #[test]
    fn test_wrapped_description_rejoined() {
        let mut doc = String::new();
        doc.push_str("Build Wealth\n");
        doc.push_str("Account #2002\n");
        doc.push_str("HOLDINGS\n");
        doc.push_str(&line_at(&[
            (0, "Type"),
            (6, "Description"),
            (40, "Ticker"),
            (48, "Shares"),
            (58, "Value"),
            (70, "Shares"),
            (80, "Value"),
            (92, "Shares"),
            (102, "Value"),
        ]));
        doc.push('\n');
        // Long fund names wrap onto their own short line first.
        doc.push_str(&line_at(&[(6, "Vanguard FTSE Developed Markets")]));
        doc.push('\n');
        doc.push_str(&line_at(&[
            (0, "ETF"),
            (6, "Index Fund"),
            (40, "VEA"),
            (48, "5.000"),
            (58, "$250.00"),
            (70, "0.000"),
            (80, "$0.00"),
            (92, "5.000"),
            (102, "$255.00"),
        ]));
        doc.push('\n');
        doc.push_str("Total Build Wealth  $255.00\n");
        doc.push_str("Ending Balance (Mar 31, 2025)  $255.00\n");

        let segmented = segment(&lines_from_text(&doc));
        let rows = &segmented.sections[0].rows;
        assert_eq!(rows.len(), 1);
        assert_eq!(
            rows[0].get("Description"),
            "Vanguard FTSE Developed Markets Index Fund"
        );
        assert_eq!(rows[0].get("Ticker"), "VEA");
        assert!(segmented.diagnostics.is_empty());
    }

    #[test]
    fn test_repeated_header_skipped_on_page_break() {
        let mut doc = String::new();
        doc.push_str("Cash Reserve\n");
        doc.push_str("ACTIVITY\n");
        doc.push_str(&line_at(&[(0, "Date"), (16, "Description"), (48, "Amount")]));
        doc.push('\n');
        doc.push_str(&line_at(&[
            (0, "Mar 3, 2025"),
            (16, "Deposit from Checking"),
            (48, "$100.00"),
        ]));
        doc.push('\n');
        doc.push_str("ACTIVITY\n");
        doc.push_str(&line_at(&[(0, "Date"), (16, "Description"), (48, "Amount")]));
        doc.push('\n');
        doc.push_str(&line_at(&[
            (0, "Mar 15, 2025"),
            (16, "Interest Payment"),
            (48, "$1.23"),
        ]));
        doc.push('\n');
        doc.push_str("TOTAL HOLDINGS\n");
        doc.push_str("Beginning Balance (Mar 1, 2025)  $0.00\n");
        doc.push_str("Ending Balance (Mar 31, 2025)  $101.23\n");

        let segmented = segment(&lines_from_text(&doc));
        assert_eq!(segmented.sections.len(), 1);
        assert_eq!(segmented.sections[0].rows.len(), 2);
        assert!(segmented.diagnostics.is_empty());
    }

    #[test]
    fn test_malformed_cash_row_produces_diagnostic() {
        let mut doc = String::new();
        doc.push_str("Cash Reserve\n");
        doc.push_str("ACTIVITY\n");
        doc.push_str(&line_at(&[(0, "Date"), (16, "Description"), (48, "Amount")]));
        doc.push('\n');
        doc.push_str("this line is not a transaction row\n");
        doc.push_str(&line_at(&[
            (0, "Mar 3, 2025"),
            (16, "Deposit from Checking"),
            (48, "$100.00"),
        ]));
        doc.push('\n');
        doc.push_str("TOTAL HOLDINGS\n");
        doc.push_str("Ending Balance (Mar 31, 2025)  $100.00\n");

        let segmented = segment(&lines_from_text(&doc));
        assert_eq!(segmented.sections[0].rows.len(), 1);
        assert_eq!(segmented.diagnostics.len(), 1);
        assert_eq!(
            segmented.diagnostics[0].kind,
            DiagnosticKind::MalformedRow
        );
    }

    #[test]
    fn test_sweep_tables_distinguished_by_title() {
        let mut doc = String::new();
        doc.push_str("SWEEP TAXABLE CASH ACTIVITY\n");
        doc.push_str("Cash Activity (TAXABLE)\n");
        doc.push_str("SWEEP ACCOUNT\n");
        doc.push_str(&line_at(&[
            (0, "Date"),
            (16, "Goal"),
            (34, "Description"),
            (70, "Transaction"),
            (86, "Balance"),
        ]));
        doc.push('\n');
        doc.push_str(&line_at(&[
            (0, "Mar 3, 2025"),
            (16, "Build Wealth"),
            (34, "Deposit from Checking"),
            (70, "$500.00"),
            (86, "$500.00"),
        ]));
        doc.push('\n');
        doc.push_str("Balance  $500.00\n");
        doc.push_str("SECURITIES ACCOUNT\n");
        doc.push_str(&line_at(&[
            (0, "Date"),
            (16, "Goal"),
            (34, "Description"),
            (70, "Transaction"),
            (86, "Balance"),
        ]));
        doc.push('\n');
        doc.push_str(&line_at(&[
            (0, "Mar 4, 2025"),
            (16, "Build Wealth"),
            (34, "Transfer from Sweep Account"),
            (70, "$500.00"),
            (86, "$500.00"),
        ]));
        doc.push('\n');
        doc.push_str("Balance  $500.00\n");

        let segmented = segment(&lines_from_text(&doc));
        let section = &segmented.sections[0];
        assert_eq!(section.kind, SectionKind::SweepPool);
        assert_eq!(section.pool, Some(SweepPoolKind::Taxable));
        assert_eq!(section.rows.len(), 2);
        assert_eq!(section.rows[0].table, TableKind::SweepActivity);
        assert_eq!(section.rows[1].table, TableKind::SecuritiesActivity);
        assert_eq!(section.rows[1].get("Goal"), "Build Wealth");
        assert_eq!(section.pool_balance, Some(dec!(500.00)));
    }

    #[test]
    fn test_external_account_flagged() {
        let mut doc = String::new();
        doc.push_str("Brokerage Transfer (External)\n");
        doc.push_str("HOLDINGS\n");
        doc.push_str("Ending Balance (Mar 31, 2025)  $10.00\n");
        let segmented = segment(&lines_from_text(&doc));
        assert!(segmented.sections[0].external);
    }

    #[test]
    fn test_continuation_section_coalesced() {
        let mut doc = String::new();
        doc.push_str("Build Wealth\n");
        doc.push_str("Account #2002\n");
        doc.push_str("HOLDINGS\n");
        doc.push_str("Page 2 of 9\n");
        // The next page repeats the section title with no identity of its own.
        doc.push_str("HOLDINGS\n");
        doc.push_str("Page 3 of 9\n");
        let segmented = segment(&lines_from_text(&doc));
        assert_eq!(segmented.sections.len(), 1);
    }
}
