//! Sweep-folding pass: no transaction stays on a settlement pool.
//!
//! The pool tables label each row with the owning goal; a label naming
//! exactly one known account attributes the row there. Anything else fans
//! out to every account referencing the pool — a documented approximation
//! of the statement's own reporting gap, surfaced as a diagnostic, never
//! silently resolved.

use models::{Account, Diagnostic, DiagnosticKind, Statement, SweepPoolKind, TransactionRecord};

const POOLS: [SweepPoolKind; 2] = [SweepPoolKind::Taxable, SweepPoolKind::Ira];

fn pool_of(record: &TransactionRecord) -> Option<SweepPoolKind> {
    POOLS
        .into_iter()
        .find(|p| p.pseudo_account_id() == record.account_id)
}

/// Reportable accounts referencing a pool, as (id, name) fold targets.
fn owners_of(accounts: &[Account], pool: SweepPoolKind) -> Vec<(String, String)> {
    accounts
        .iter()
        .filter(|a| a.reportable() && a.sweep_pool == Some(pool))
        .map(|a| (a.account_id.clone(), a.name.clone()))
        .collect()
}

pub fn fold(stmt: &mut Statement) {
    let mut diagnostics = Vec::new();
    let mut folded: Vec<TransactionRecord> = Vec::new();

    let owners_by_pool: Vec<(SweepPoolKind, Vec<(String, String)>)> = POOLS
        .into_iter()
        .map(|p| (p, owners_of(&stmt.accounts, p)))
        .collect();

    let transactions = std::mem::take(&mut stmt.transactions);
    for txn in transactions {
        let Some(pool) = pool_of(&txn) else {
            folded.push(txn);
            continue;
        };
        let owners = owners_by_pool
            .iter()
            .find(|(p, _)| *p == pool)
            .map(|(_, o)| o.clone())
            .unwrap_or_default();
        if owners.is_empty() {
            diagnostics.push(
                Diagnostic::new(
                    DiagnosticKind::SweepAmbiguity,
                    format!(
                        "pool transaction '{}' has no referencing account; dropped",
                        txn.description
                    ),
                )
                .at(txn.source)
                .on_date(txn.date),
            );
            continue;
        }

        if let Some(goal) = &txn.sweep_goal {
            let named: Vec<&(String, String)> = owners
                .iter()
                .filter(|(_, name)| name.eq_ignore_ascii_case(goal))
                .collect();
            if named.len() == 1 {
                let mut attributed = txn.clone();
                attributed.account_id = named[0].0.clone();
                attributed.sweep_goal = None;
                folded.push(attributed);
                continue;
            }
        }

        // No usable goal label: fold into every referencing account.
        if owners.len() > 1 {
            diagnostics.push(
                Diagnostic::new(
                    DiagnosticKind::SweepAmbiguity,
                    format!(
                        "cannot attribute pool transaction '{}'; folded into {} accounts sharing the pool",
                        txn.description,
                        owners.len()
                    ),
                )
                .at(txn.source)
                .on_date(txn.date),
            );
        }
        for (account_id, _) in &owners {
            let mut attributed = txn.clone();
            attributed.account_id = account_id.clone();
            attributed.sweep_goal = None;
            folded.push(attributed);
        }
    }

    stmt.transactions = folded;
    stmt.diagnostics.append(&mut diagnostics);
}
