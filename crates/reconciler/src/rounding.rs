//! Rounding pass: fractional-share drift between the trade records and the
//! reported period-end holding.
//!
//! Per account and security, the share count implied by the reported
//! price × amount of every trade is compared against the holdings table's
//! period-end count. A nonzero residual smaller than the smallest
//! reportable share increment is rounding drift, covered by one synthetic
//! adjustment record. The reported trade records themselves are never
//! rewritten, so the statement's own numbers stay auditable.

use models::{
    Holding, Provenance, Statement, TransactionRecord, TxnKind, min_share_increment, period_end,
};
use rust_decimal::Decimal;

/// Share count a single record contributes, recomputed from the reported
/// price and cash amount where both are present. Dividend postings carry
/// no shares.
fn implied_shares(txn: &TransactionRecord) -> Decimal {
    match txn.kind {
        TxnKind::Buy | TxnKind::Sell => {
            let magnitude = match txn.price {
                Some(price) if !price.is_zero() => txn.amount.abs() / price,
                _ => txn.shares.map(|s| s.abs()).unwrap_or_default(),
            };
            if txn.kind == TxnKind::Sell {
                -magnitude
            } else {
                magnitude
            }
        }
        _ => Decimal::ZERO,
    }
}

fn residual_for(stmt: &Statement, holding: &Holding) -> Decimal {
    let implied: Decimal = stmt
        .transactions
        .iter()
        .filter(|t| {
            t.account_id == holding.account_id
                && t.security.as_deref() == Some(holding.symbol.as_str())
                && matches!(
                    t.kind,
                    TxnKind::Buy | TxnKind::Sell | TxnKind::DividendSecurity
                )
        })
        .map(implied_shares)
        .sum();
    holding.end_shares - (holding.begin_shares + implied)
}

pub fn adjust(stmt: &mut Statement) {
    let mut adjustments = Vec::new();

    for holding in &stmt.holdings {
        let residual = residual_for(stmt, holding);
        if residual.is_zero() || residual.abs() >= min_share_increment() {
            // Zero is clean; anything at or above the increment is a real
            // discrepancy, not rounding, and is left visible as-is.
            continue;
        }
        // Adjustments date at period end, never inside the trade stream.
        let date = stmt
            .account(&holding.account_id)
            .and_then(|a| a.period_end)
            .or_else(|| {
                stmt.transactions
                    .iter()
                    .filter(|t| t.account_id == holding.account_id)
                    .map(|t| t.date)
                    .max()
                    .map(period_end)
            });
        let Some(date) = date else {
            continue;
        };
        adjustments.push(TransactionRecord {
            id: String::new(),
            account_id: holding.account_id.clone(),
            date,
            kind: TxnKind::ShareAdjustment,
            security: Some(holding.symbol.clone()),
            amount: Decimal::ZERO,
            shares: Some(residual),
            price: None,
            description: format!("Fractional share rounding adjustment for {}", holding.symbol),
            sweep_goal: None,
            source: Provenance::default(),
        });
    }

    stmt.transactions.append(&mut adjustments);
}
