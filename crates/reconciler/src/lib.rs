//! Reconciliation of the parsed statement model: the three documented
//! cross-record passes, then per-account ordering and identifier assignment.
//!
//! Each pass is a pure transform over the shared model that appends
//! diagnostics instead of failing; nothing here rewrites a number the
//! statement reported.

pub mod dividends;
pub mod rounding;
pub mod sweep;

use models::{Statement, assign_transaction_ids};

/// Runs all passes in order. Sweep folding goes first so the dividend pass
/// sees pool postings under their final account attribution; rounding runs
/// on the settled stream; ordering and identifiers come last.
pub fn reconcile(mut stmt: Statement) -> Statement {
    sweep::fold(&mut stmt);
    dividends::resolve(&mut stmt);
    rounding::adjust(&mut stmt);

    // Stable by-date sort keeps the parse order of same-day records, which
    // makes the assigned sequence numbers deterministic.
    stmt.transactions.sort_by_key(|t| t.date);
    assign_transaction_ids(&mut stmt.transactions);
    stmt
}
