//! OFX 2.2 serializer: renders the reconciled statement model as the XML
//! document personal-finance importers consume.
//!
//! One forward pass: signon, a bank statement section for the cash reserve
//! account, one investment statement per brokerage account, then the
//! security list covering every referenced ticker. A record missing a field
//! its variant requires is excluded with a diagnostic — that is an upstream
//! classification defect, and fabricating the field would be worse.

use chrono::NaiveDate;
use models::{
    Account, AccountKind, Diagnostic, DiagnosticKind, Statement, TransactionRecord, TxnKind,
    sha256_hex,
};
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use rust_decimal::Decimal;
use std::collections::BTreeSet;
use thiserror::Error;

pub const OFX_HEADER: &str =
    "<?OFX OFXHEADER=\"200\" VERSION=\"220\" SECURITY=\"NONE\" OLDFILEUID=\"NONE\" NEWFILEUID=\"NONE\"?>";
pub const FI_ORG: &str = "Betterment";
pub const FI_ID: &str = "9999";
pub const BANK_ID: &str = "BTRMNT";
pub const BROKER_ID: &str = "Betterment";
pub const CURRENCY: &str = "USD";

#[derive(Debug, Error)]
pub enum OfxError {
    #[error("failed to write OFX document: {0}")]
    Xml(#[from] quick_xml::Error),
    #[error("OFX output is not valid UTF-8")]
    Encoding(#[from] std::string::FromUtf8Error),
    #[error("statement carries no ending date to stamp the document with")]
    MissingAsOf,
}

#[derive(Debug)]
pub struct Rendered {
    pub document: String,
    pub diagnostics: Vec<Diagnostic>,
}

type Xml = Writer<Vec<u8>>;

fn open(w: &mut Xml, tag: &str) -> Result<(), OfxError> {
    w.write_event(Event::Start(BytesStart::new(tag)))?;
    Ok(())
}

fn close(w: &mut Xml, tag: &str) -> Result<(), OfxError> {
    w.write_event(Event::End(BytesEnd::new(tag)))?;
    Ok(())
}

fn leaf(w: &mut Xml, tag: &str, value: &str) -> Result<(), OfxError> {
    open(w, tag)?;
    w.write_event(Event::Text(BytesText::new(value)))?;
    close(w, tag)
}

fn fmt_cash(value: Decimal) -> String {
    format!("{:.2}", value)
}

fn fmt_shares(value: Decimal) -> String {
    format!("{:.3}", value)
}

fn fmt_date(date: NaiveDate) -> String {
    date.format("%Y%m%d").to_string()
}

fn trnuid(seed: &str) -> String {
    sha256_hex(seed)[..32].to_string()
}

fn name32(description: &str) -> String {
    description.chars().take(32).collect()
}

fn status(w: &mut Xml) -> Result<(), OfxError> {
    open(w, "STATUS")?;
    leaf(w, "CODE", "0")?;
    leaf(w, "SEVERITY", "INFO")?;
    close(w, "STATUS")
}

fn secid(w: &mut Xml, symbol: &str) -> Result<(), OfxError> {
    open(w, "SECID")?;
    leaf(w, "UNIQUEID", symbol)?;
    leaf(w, "UNIQUEIDTYPE", "TICKER")?;
    close(w, "SECID")
}

fn invtran(w: &mut Xml, txn: &TransactionRecord) -> Result<(), OfxError> {
    open(w, "INVTRAN")?;
    leaf(w, "FITID", &txn.id)?;
    leaf(w, "DTTRADE", &fmt_date(txn.date))?;
    leaf(w, "MEMO", &txn.description)?;
    close(w, "INVTRAN")
}

/// A required field missing for the record's variant, if any.
fn constraint_violation(txn: &TransactionRecord) -> Option<&'static str> {
    match txn.kind {
        TxnKind::Buy | TxnKind::Sell => {
            if txn.security.is_none() {
                Some("no security reference")
            } else if txn.shares.is_none() {
                Some("no share quantity")
            } else if txn.price.is_none() {
                Some("no per-share price")
            } else {
                None
            }
        }
        TxnKind::DividendSecurity => txn.security.is_none().then_some("no security reference"),
        TxnKind::ShareAdjustment => {
            if txn.security.is_none() {
                Some("no security reference")
            } else if txn.shares.is_none() {
                Some("no share quantity")
            } else {
                None
            }
        }
        _ => None,
    }
}

/// Renders the full OFX document. Per-record constraint violations exclude
/// the record and surface as diagnostics; only a writer failure or a
/// dateless statement is fatal.
pub fn render(stmt: &Statement) -> Result<Rendered, OfxError> {
    let mut diagnostics = Vec::new();
    let as_of = stmt
        .reportable_accounts()
        .find_map(|a| a.period_end)
        .ok_or(OfxError::MissingAsOf)?;

    let mut w = Writer::new_with_indent(Vec::new(), b' ', 2);
    open(&mut w, "OFX")?;

    signon(&mut w, as_of)?;

    if let Some(account) = stmt
        .reportable_accounts()
        .find(|a| a.kind == AccountKind::CashReserve)
    {
        bank_section(&mut w, stmt, account)?;
    }

    let investment_accounts: Vec<&Account> = stmt
        .reportable_accounts()
        .filter(|a| a.kind.is_investment())
        .collect();
    if !investment_accounts.is_empty() {
        open(&mut w, "INVSTMTMSGSRSV1")?;
        for account in investment_accounts {
            investment_section(&mut w, stmt, account, &mut diagnostics)?;
        }
        close(&mut w, "INVSTMTMSGSRSV1")?;
    }

    security_list(&mut w, stmt)?;

    close(&mut w, "OFX")?;

    let body = String::from_utf8(w.into_inner())?;
    let document = format!(
        "<?xml version=\"1.0\" encoding=\"utf-8\"?>\n{}\n{}\n",
        OFX_HEADER, body
    );
    Ok(Rendered {
        document,
        diagnostics,
    })
}

fn signon(w: &mut Xml, as_of: NaiveDate) -> Result<(), OfxError> {
    open(w, "SIGNONMSGSRSV1")?;
    open(w, "SONRS")?;
    status(w)?;
    leaf(w, "DTSERVER", &fmt_date(as_of))?;
    leaf(w, "LANGUAGE", "ENG")?;
    open(w, "FI")?;
    leaf(w, "ORG", FI_ORG)?;
    leaf(w, "FID", FI_ID)?;
    close(w, "FI")?;
    close(w, "SONRS")?;
    close(w, "SIGNONMSGSRSV1")
}

fn bank_trntype(txn: &TransactionRecord) -> &'static str {
    if txn.kind == TxnKind::Interest {
        "INT"
    } else if txn.amount.is_sign_negative() {
        "DEBIT"
    } else {
        "CREDIT"
    }
}

fn bank_section(w: &mut Xml, stmt: &Statement, account: &Account) -> Result<(), OfxError> {
    let start = account.period_start;
    let end = account.period_end;
    open(w, "BANKMSGSRSV1")?;
    open(w, "STMTTRNRS")?;
    let seed = format!(
        "{}{}{}",
        start.map(fmt_date).unwrap_or_default(),
        end.map(fmt_date).unwrap_or_default(),
        account.account_id
    );
    leaf(w, "TRNUID", &trnuid(&seed))?;
    status(w)?;
    open(w, "STMTRS")?;
    leaf(w, "CURDEF", CURRENCY)?;
    open(w, "BANKACCTFROM")?;
    leaf(w, "BANKID", BANK_ID)?;
    leaf(w, "ACCTID", &account.account_id)?;
    leaf(w, "ACCTTYPE", "SAVINGS")?;
    close(w, "BANKACCTFROM")?;

    open(w, "BANKTRANLIST")?;
    if let Some(start) = start {
        leaf(w, "DTSTART", &fmt_date(start))?;
    }
    if let Some(end) = end {
        leaf(w, "DTEND", &fmt_date(end))?;
    }
    for txn in stmt
        .transactions
        .iter()
        .filter(|t| t.account_id == account.account_id)
    {
        open(w, "STMTTRN")?;
        leaf(w, "TRNTYPE", bank_trntype(txn))?;
        leaf(w, "DTPOSTED", &fmt_date(txn.date))?;
        leaf(w, "TRNAMT", &fmt_cash(txn.amount))?;
        leaf(w, "FITID", &txn.id)?;
        leaf(w, "NAME", &name32(&txn.description))?;
        leaf(w, "MEMO", &txn.description)?;
        close(w, "STMTTRN")?;
    }
    close(w, "BANKTRANLIST")?;

    open(w, "LEDGERBAL")?;
    leaf(
        w,
        "BALAMT",
        &fmt_cash(account.ending_balance.unwrap_or_default()),
    )?;
    if let Some(end) = end {
        leaf(w, "DTASOF", &fmt_date(end))?;
    }
    close(w, "LEDGERBAL")?;
    close(w, "STMTRS")?;
    close(w, "STMTTRNRS")?;
    close(w, "BANKMSGSRSV1")
}

/// Transaction-type code for cash postings inside an investment account,
/// keyed on how the statement words the movement.
fn invbank_trntype(txn: &TransactionRecord) -> &'static str {
    match txn.kind {
        TxnKind::Interest => "INT",
        TxnKind::Fee => "FEE",
        TxnKind::DividendCash => "DIV",
        _ => match txn.description.split(' ').next().unwrap_or("") {
            "Deposit" => "DEP",
            "Withdrawal" => "CASH",
            "Transfer" => "XFER",
            _ => "OTHER",
        },
    }
}

fn investment_section(
    w: &mut Xml,
    stmt: &Statement,
    account: &Account,
    diagnostics: &mut Vec<Diagnostic>,
) -> Result<(), OfxError> {
    let end = account.period_end;
    let as_of = end.unwrap_or_else(|| NaiveDate::from_ymd_opt(1970, 1, 1).unwrap());

    open(w, "INVSTMTTRNRS")?;
    leaf(w, "TRNUID", &trnuid(&format!("{}{}", as_of, account.account_id)))?;
    status(w)?;
    open(w, "INVSTMTRS")?;
    leaf(w, "DTASOF", &fmt_date(as_of))?;
    leaf(w, "CURDEF", CURRENCY)?;
    open(w, "INVACCTFROM")?;
    leaf(w, "BROKERID", BROKER_ID)?;
    leaf(w, "ACCTID", &account.account_id)?;
    close(w, "INVACCTFROM")?;

    open(w, "INVTRANLIST")?;
    if let Some(start) = account.period_start {
        leaf(w, "DTSTART", &fmt_date(start))?;
    }
    if let Some(end) = end {
        leaf(w, "DTEND", &fmt_date(end))?;
    }
    for txn in stmt
        .transactions
        .iter()
        .filter(|t| t.account_id == account.account_id)
    {
        if let Some(reason) = constraint_violation(txn) {
            diagnostics.push(
                Diagnostic::new(
                    DiagnosticKind::SerializationConstraint,
                    format!(
                        "{} record cannot be serialized ({}); excluded",
                        txn.kind.as_str(),
                        reason
                    ),
                )
                .at(txn.source)
                .for_account(&txn.account_id)
                .on_date(txn.date),
            );
            continue;
        }
        write_investment_txn(w, txn)?;
    }
    close(w, "INVTRANLIST")?;

    position_list(w, stmt, account, as_of)?;

    // The cash balance is the shared pool's; it cannot be split between
    // accounts referencing the same pool.
    let available = account
        .sweep_pool
        .and_then(|pool| stmt.sweep_balance(pool))
        .unwrap_or_default();
    open(w, "INVBAL")?;
    leaf(w, "AVAILCASH", &fmt_cash(available))?;
    leaf(w, "MARGINBALANCE", "0")?;
    leaf(w, "SHORTBALANCE", "0")?;
    close(w, "INVBAL")?;

    close(w, "INVSTMTRS")?;
    close(w, "INVSTMTTRNRS")
}

fn write_investment_txn(w: &mut Xml, txn: &TransactionRecord) -> Result<(), OfxError> {
    match txn.kind {
        TxnKind::Buy => {
            let symbol = txn.security.as_deref().unwrap_or_default();
            open(w, "BUYMF")?;
            open(w, "INVBUY")?;
            invtran(w, txn)?;
            secid(w, symbol)?;
            leaf(w, "UNITS", &fmt_shares(txn.shares.unwrap_or_default()))?;
            leaf(w, "UNITPRICE", &fmt_shares(txn.price.unwrap_or_default()))?;
            leaf(w, "TOTAL", &fmt_cash(txn.amount))?;
            leaf(w, "SUBACCTSEC", "OTHER")?;
            leaf(w, "SUBACCTFUND", "OTHER")?;
            close(w, "INVBUY")?;
            leaf(w, "BUYTYPE", "BUY")?;
            close(w, "BUYMF")
        }
        TxnKind::Sell => {
            let symbol = txn.security.as_deref().unwrap_or_default();
            open(w, "SELLMF")?;
            open(w, "INVSELL")?;
            invtran(w, txn)?;
            secid(w, symbol)?;
            leaf(w, "UNITS", &fmt_shares(txn.shares.unwrap_or_default().abs()))?;
            leaf(w, "UNITPRICE", &fmt_shares(txn.price.unwrap_or_default()))?;
            leaf(w, "TOTAL", &fmt_cash(txn.amount.abs()))?;
            leaf(w, "SUBACCTSEC", "OTHER")?;
            leaf(w, "SUBACCTFUND", "OTHER")?;
            close(w, "INVSELL")?;
            leaf(w, "SELLTYPE", "SELL")?;
            close(w, "SELLMF")
        }
        TxnKind::DividendSecurity => {
            let symbol = txn.security.as_deref().unwrap_or_default();
            open(w, "INCOME")?;
            invtran(w, txn)?;
            secid(w, symbol)?;
            leaf(w, "INCOMETYPE", "DIV")?;
            leaf(w, "TOTAL", &fmt_cash(txn.amount))?;
            leaf(w, "SUBACCTSEC", "OTHER")?;
            leaf(w, "SUBACCTFUND", "OTHER")?;
            close(w, "INCOME")
        }
        TxnKind::ShareAdjustment => {
            let symbol = txn.security.as_deref().unwrap_or_default();
            let shares = txn.shares.unwrap_or_default();
            open(w, "TRANSFER")?;
            invtran(w, txn)?;
            secid(w, symbol)?;
            leaf(w, "SUBACCTSEC", "OTHER")?;
            leaf(w, "UNITS", &fmt_shares(shares))?;
            leaf(
                w,
                "TFERACTION",
                if shares.is_sign_negative() { "OUT" } else { "IN" },
            )?;
            leaf(w, "POSTYPE", "LONG")?;
            close(w, "TRANSFER")
        }
        // Cash-side postings inside the investment account.
        TxnKind::DividendCash | TxnKind::Interest | TxnKind::Fee | TxnKind::Transfer => {
            open(w, "INVBANKTRAN")?;
            open(w, "STMTTRN")?;
            leaf(w, "TRNTYPE", invbank_trntype(txn))?;
            leaf(w, "DTPOSTED", &fmt_date(txn.date))?;
            leaf(w, "TRNAMT", &fmt_cash(txn.amount))?;
            leaf(w, "FITID", &txn.id)?;
            leaf(w, "NAME", &name32(&txn.description))?;
            leaf(w, "MEMO", &txn.description)?;
            close(w, "STMTTRN")?;
            leaf(
                w,
                "SUBACCTFUND",
                if txn.kind == TxnKind::Fee { "CASH" } else { "OTHER" },
            )?;
            close(w, "INVBANKTRAN")
        }
    }
}

fn position_list(
    w: &mut Xml,
    stmt: &Statement,
    account: &Account,
    as_of: NaiveDate,
) -> Result<(), OfxError> {
    open(w, "INVPOSLIST")?;
    for holding in stmt
        .holdings
        .iter()
        .filter(|h| h.account_id == account.account_id && !h.end_shares.is_zero())
    {
        let unit_price = holding.end_value / holding.end_shares;
        let memo = stmt
            .security(&holding.symbol)
            .map(|s| s.name.clone())
            .unwrap_or_else(|| holding.symbol.clone());
        open(w, "POSSTOCK")?;
        open(w, "INVPOS")?;
        secid(w, &holding.symbol)?;
        leaf(w, "HELDINACCT", "OTHER")?;
        leaf(w, "POSTYPE", "LONG")?;
        leaf(w, "UNITS", &fmt_shares(holding.end_shares))?;
        leaf(w, "UNITPRICE", &fmt_shares(unit_price))?;
        leaf(w, "MKTVAL", &fmt_cash(holding.end_value))?;
        leaf(w, "DTPRICEASOF", &fmt_date(as_of))?;
        leaf(w, "MEMO", &memo)?;
        close(w, "INVPOS")?;
        close(w, "POSSTOCK")?;
    }
    close(w, "INVPOSLIST")
}

fn security_list(w: &mut Xml, stmt: &Statement) -> Result<(), OfxError> {
    // Every symbol referenced by a transaction or position must appear,
    // even when the statement never printed a holdings row for it.
    let mut referenced: BTreeSet<&str> = BTreeSet::new();
    for txn in &stmt.transactions {
        if let Some(symbol) = txn.security.as_deref() {
            referenced.insert(symbol);
        }
    }
    for holding in &stmt.holdings {
        referenced.insert(holding.symbol.as_str());
    }

    open(w, "SECLISTMSGSRSV1")?;
    open(w, "SECLIST")?;
    for security in &stmt.securities {
        referenced.remove(security.symbol.as_str());
        stock_info(w, &security.symbol, &security.name)?;
    }
    for symbol in referenced {
        stock_info(w, symbol, symbol)?;
    }
    close(w, "SECLIST")?;
    close(w, "SECLISTMSGSRSV1")
}

fn stock_info(w: &mut Xml, symbol: &str, name: &str) -> Result<(), OfxError> {
    open(w, "STOCKINFO")?;
    open(w, "SECINFO")?;
    secid(w, symbol)?;
    leaf(w, "SECNAME", name)?;
    leaf(w, "TICKER", symbol)?;
    close(w, "SECINFO")?;
    close(w, "STOCKINFO")
}

#[cfg(test)]
mod tests {
    use super::*;
    use models::{Provenance, SweepPool, SweepPoolKind};
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn account(id: &str, name: &str, kind: AccountKind) -> Account {
        Account {
            account_id: id.to_string(),
            name: name.to_string(),
            kind,
            external: false,
            summary_only: false,
            sweep_pool: models::SweepPoolKind::for_account(kind),
            period_start: Some(date(2025, 1, 1)),
            period_end: Some(date(2025, 3, 31)),
            beginning_balance: Some(dec!(1000.00)),
            ending_balance: Some(dec!(1101.23)),
        }
    }

    fn txn(account_id: &str, kind: TxnKind, amount: rust_decimal::Decimal) -> TransactionRecord {
        TransactionRecord {
            id: "BTMT-0123456789abcdef01234567".to_string(),
            account_id: account_id.to_string(),
            date: date(2025, 3, 5),
            kind,
            security: None,
            amount,
            shares: None,
            price: None,
            description: "test row".to_string(),
            sweep_goal: None,
            source: Provenance::default(),
        }
    }

    fn investment_statement() -> Statement {
        let mut stmt = Statement::default();
        stmt.accounts.push(account("2001-aaaaaa", "General Investing", AccountKind::Taxable));
        stmt.sweeps.push(SweepPool {
            kind: SweepPoolKind::Taxable,
            balance: Some(dec!(305.67)),
        });
        stmt.upsert_security("VTI", "Vanguard Total Stock Market");
        let mut buy = txn("2001-aaaaaa", TxnKind::Buy, dec!(-300.00));
        buy.security = Some("VTI".to_string());
        buy.shares = Some(dec!(1.500));
        buy.price = Some(dec!(200.00));
        stmt.transactions.push(buy);
        stmt.holdings.push(models::Holding {
            account_id: "2001-aaaaaa".to_string(),
            symbol: "VTI".to_string(),
            begin_shares: dec!(10.000),
            end_shares: dec!(11.500),
            end_value: dec!(2300.00),
        });
        stmt
    }

    #[test]
    fn test_render_header_and_signon() {
        let rendered = render(&investment_statement()).unwrap();
        assert!(rendered.document.starts_with("<?xml version=\"1.0\""));
        assert!(rendered.document.contains(OFX_HEADER));
        assert!(rendered.document.contains("<ORG>Betterment</ORG>"));
        assert!(rendered.document.contains("<DTSERVER>20250331</DTSERVER>"));
    }

    #[test]
    fn test_render_buy_fixed_point_formatting() {
        let rendered = render(&investment_statement()).unwrap();
        assert!(rendered.document.contains("<BUYMF>"));
        assert!(rendered.document.contains("<UNITS>1.500</UNITS>"));
        assert!(rendered.document.contains("<UNITPRICE>200.000</UNITPRICE>"));
        assert!(rendered.document.contains("<TOTAL>-300.00</TOTAL>"));
        assert!(rendered.diagnostics.is_empty());
    }

    #[test]
    fn test_render_positions_and_balance() {
        let rendered = render(&investment_statement()).unwrap();
        assert!(rendered.document.contains("<POSSTOCK>"));
        assert!(rendered.document.contains("<UNITS>11.500</UNITS>"));
        assert!(rendered.document.contains("<MKTVAL>2300.00</MKTVAL>"));
        assert!(rendered.document.contains("<AVAILCASH>305.67</AVAILCASH>"));
    }

    #[test]
    fn test_render_security_list_covers_references() {
        let mut stmt = investment_statement();
        // A sell of a ticker with no holdings row and no registered name.
        let mut sell = txn("2001-aaaaaa", TxnKind::Sell, dec!(150.00));
        sell.security = Some("VEA".to_string());
        sell.shares = Some(dec!(-2.000));
        sell.price = Some(dec!(75.00));
        stmt.transactions.push(sell);

        let rendered = render(&stmt).unwrap();
        assert!(rendered.document.contains("<SECNAME>Vanguard Total Stock Market</SECNAME>"));
        assert!(rendered.document.contains("<SECNAME>VEA</SECNAME>"));
        assert!(rendered.document.contains("<TICKER>VEA</TICKER>"));
    }

    #[test]
    fn test_buy_without_security_excluded_with_diagnostic() {
        let mut stmt = investment_statement();
        let mut bad = txn("2001-aaaaaa", TxnKind::Buy, dec!(-10.00));
        bad.shares = Some(dec!(0.100));
        bad.price = Some(dec!(100.00));
        bad.security = None;
        stmt.transactions.push(bad);

        let rendered = render(&stmt).unwrap();
        assert_eq!(rendered.diagnostics.len(), 1);
        assert_eq!(
            rendered.diagnostics[0].kind,
            DiagnosticKind::SerializationConstraint
        );
        // Exactly one BUYMF: the well-formed one.
        assert_eq!(rendered.document.matches("<BUYMF>").count(), 1);
    }

    #[test]
    fn test_bank_section_for_cash_reserve() {
        let mut stmt = Statement::default();
        stmt.accounts.push(account("1001-bbbbbb", "Cash Reserve", AccountKind::CashReserve));
        let mut interest = txn("1001-bbbbbb", TxnKind::Interest, dec!(1.23));
        interest.description = "Interest Payment".to_string();
        stmt.transactions.push(interest);
        stmt.transactions.push(txn("1001-bbbbbb", TxnKind::Transfer, dec!(-50.00)));

        let rendered = render(&stmt).unwrap();
        assert!(rendered.document.contains("<BANKID>BTRMNT</BANKID>"));
        assert!(rendered.document.contains("<ACCTTYPE>SAVINGS</ACCTTYPE>"));
        assert!(rendered.document.contains("<TRNTYPE>INT</TRNTYPE>"));
        assert!(rendered.document.contains("<TRNTYPE>DEBIT</TRNTYPE>"));
        assert!(rendered.document.contains("<BALAMT>1101.23</BALAMT>"));
    }

    #[test]
    fn test_share_adjustment_rendered_as_transfer() {
        let mut stmt = investment_statement();
        let mut adj = txn("2001-aaaaaa", TxnKind::ShareAdjustment, dec!(0.00));
        adj.security = Some("VTI".to_string());
        adj.shares = Some(dec!(-0.0004));
        stmt.transactions.push(adj);

        let rendered = render(&stmt).unwrap();
        assert!(rendered.document.contains("<TRANSFER>"));
        assert!(rendered.document.contains("<TFERACTION>OUT</TFERACTION>"));
    }

    #[test]
    fn test_render_is_deterministic() {
        let stmt = investment_statement();
        let first = render(&stmt).unwrap();
        let second = render(&stmt).unwrap();
        assert_eq!(first.document, second.document);
    }

    #[test]
    fn test_dividend_cash_is_invbanktran_div() {
        let mut stmt = investment_statement();
        let mut div = txn("2001-aaaaaa", TxnKind::DividendCash, dec!(5.67));
        div.description = "Payment of Dividends".to_string();
        stmt.transactions.push(div);

        let rendered = render(&stmt).unwrap();
        assert!(rendered.document.contains("<INVBANKTRAN>"));
        assert!(rendered.document.contains("<TRNTYPE>DIV</TRNTYPE>"));
    }
}
