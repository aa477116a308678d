//! Dividend boundary pass.
//!
//! The statement posts dividend cash near period end, while the matching
//! security-side activity can land in the next quarter's report. Per cash
//! posting the rule is:
//!
//! - matched by security activity within the same period: the cash record
//!   is dropped, the security record is authoritative;
//! - unmatched at period end: the cash record is emitted as-is and the
//!   match is carried forward as an explicit pending state;
//! - a carried pending matched in a later period of the same calendar
//!   year closes with both records emitted, an accepted user-visible
//!   duplicate across periods;
//! - a pending never matched by calendar year end (or document end) is
//!   dropped: the cash/security correspondence is permanently lost.

use models::{
    Diagnostic, DiagnosticKind, Statement, TransactionRecord, TxnKind, period_of,
};
use std::collections::HashSet;

/// Days the security-side posting may precede its cash posting and still
/// be the same economic event.
const MATCH_WINDOW_DAYS: i64 = 5;

/// Explicit lifecycle of one unmatched dividend cash posting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingState {
    Unmatched,
    CarriedForward,
    ResolvedInPeriod,
    ResolvedNextPeriod,
    DroppedAtYearEnd,
}

#[derive(Debug)]
struct Pending {
    /// Index of the cash record in the transaction stream.
    cash: usize,
    /// Period the cash record was reported in.
    period: (i32, u32),
    state: PendingState,
}

fn same_event(cash: &TransactionRecord, sec: &TransactionRecord, windowed: bool) -> bool {
    if sec.account_id != cash.account_id {
        return false;
    }
    let identity = match &cash.security {
        // The cash posting names no ticker more often than not; amount
        // equality is the only usable key then.
        Some(symbol) => sec.security.as_deref() == Some(symbol.as_str()),
        None => sec.amount == cash.amount,
    };
    if !identity {
        return false;
    }
    if windowed {
        let delta = (cash.date - sec.date).num_days();
        (0..=MATCH_WINDOW_DAYS).contains(&delta)
    } else {
        true
    }
}

pub fn resolve(stmt: &mut Statement) {
    let mut diagnostics = Vec::new();
    let mut drop_cash: HashSet<usize> = HashSet::new();

    let account_ids: Vec<String> = stmt
        .accounts
        .iter()
        .filter(|a| a.reportable())
        .map(|a| a.account_id.clone())
        .collect();

    for account_id in &account_ids {
        resolve_account(stmt, account_id, &mut drop_cash, &mut diagnostics);
    }

    let mut index = 0usize;
    stmt.transactions.retain(|_| {
        let keep = !drop_cash.contains(&index);
        index += 1;
        keep
    });
    stmt.diagnostics.append(&mut diagnostics);
}

fn resolve_account(
    stmt: &Statement,
    account_id: &str,
    drop_cash: &mut HashSet<usize>,
    diagnostics: &mut Vec<Diagnostic>,
) {
    let cash_records: Vec<usize> = stmt
        .transactions
        .iter()
        .enumerate()
        .filter(|(_, t)| t.account_id == account_id && t.kind == TxnKind::DividendCash)
        .map(|(i, _)| i)
        .collect();
    let security_records: Vec<usize> = stmt
        .transactions
        .iter()
        .enumerate()
        .filter(|(_, t)| t.account_id == account_id && t.kind == TxnKind::DividendSecurity)
        .map(|(i, _)| i)
        .collect();
    if cash_records.is_empty() {
        return;
    }

    let mut periods: Vec<(i32, u32)> = cash_records
        .iter()
        .chain(security_records.iter())
        .map(|&i| period_of(stmt.transactions[i].date))
        .collect();
    periods.sort();
    periods.dedup();

    let mut used_securities: HashSet<usize> = HashSet::new();
    let mut carried: Vec<Pending> = Vec::new();

    for period in periods {
        // Pendings from an earlier calendar year never cross the boundary.
        for pending in &mut carried {
            if pending.period.0 != period.0 {
                pending.state = PendingState::DroppedAtYearEnd;
                diagnostics.push(dropped_diagnostic(&stmt.transactions[pending.cash]));
            }
        }
        carried.retain(|p| p.state == PendingState::CarriedForward);

        // A carried pending can close against this period's security
        // activity; the cash record already went out in its own period.
        for pending in &mut carried {
            let cash = &stmt.transactions[pending.cash];
            let matched = security_records.iter().find(|&&s| {
                !used_securities.contains(&s)
                    && period_of(stmt.transactions[s].date) == period
                    && same_event(cash, &stmt.transactions[s], false)
            });
            if let Some(&sec) = matched {
                used_securities.insert(sec);
                pending.state = PendingState::ResolvedNextPeriod;
                diagnostics.push(
                    Diagnostic::new(
                        DiagnosticKind::DividendCrossPeriod,
                        format!(
                            "dividend cash posted {} matched by security activity dated {}; both \
                             records are emitted in their own periods",
                            cash.date.format("%Y-%m-%d"),
                            stmt.transactions[sec].date.format("%Y-%m-%d"),
                        ),
                    )
                    .for_account(account_id)
                    .on_date(stmt.transactions[sec].date),
                );
            }
        }
        carried.retain(|p| p.state == PendingState::CarriedForward);

        // In-period rule for this period's cash postings.
        for &cash_idx in cash_records
            .iter()
            .filter(|&&i| period_of(stmt.transactions[i].date) == period)
        {
            let mut pending = Pending {
                cash: cash_idx,
                period,
                state: PendingState::Unmatched,
            };
            let cash = &stmt.transactions[cash_idx];
            let matched = security_records.iter().find(|&&s| {
                !used_securities.contains(&s)
                    && period_of(stmt.transactions[s].date) == period
                    && same_event(cash, &stmt.transactions[s], true)
            });
            match matched {
                Some(&sec) => {
                    // The security record is authoritative and sufficient.
                    used_securities.insert(sec);
                    drop_cash.insert(cash_idx);
                    pending.state = PendingState::ResolvedInPeriod;
                }
                None => pending.state = PendingState::CarriedForward,
            }
            if pending.state == PendingState::CarriedForward {
                carried.push(pending);
            }
        }
    }

    // Document end: whatever is still pending is lost for good.
    for pending in carried {
        diagnostics.push(dropped_diagnostic(&stmt.transactions[pending.cash]));
    }
}

fn dropped_diagnostic(cash: &TransactionRecord) -> Diagnostic {
    Diagnostic::new(
        DiagnosticKind::UnresolvedDividend,
        format!(
            "dividend cash posting of {} on {} was never matched by security activity; the \
             pending match is dropped",
            cash.amount,
            cash.date.format("%Y-%m-%d"),
        ),
    )
    .at(cash.source)
    .for_account(&cash.account_id)
    .on_date(cash.date)
}
