//! Top-level evaluation: one connection, one transaction, one expression.

use std::path::Path;

use rusqlite::Connection;

use crate::expr::Expr;
use crate::log::{fail, log_error};

/// Evaluate `expr` in a fresh transaction on the database at `path`.
///
/// Opens a connection, begins a transaction and applies `expr` exactly
/// once. A `true` outcome is committed; `false` rolls the whole transaction
/// back, so partial durability is impossible. The connection is closed on
/// every path, and errors on any leg (open, begin, commit, rollback, close)
/// go to the error sink instead of propagating; a failed begin skips
/// evaluation entirely.
///
/// Returns `true` iff the expression succeeded and the commit stuck.
pub fn eval<P: AsRef<Path>>(path: P, expr: &Expr) -> bool {
    let mut conn = match Connection::open(path) {
        Ok(conn) => conn,
        Err(err) => return fail(err),
    };
    let ok = eval_tx(&mut conn, expr);
    if let Err((_, err)) = conn.close() {
        fail(err);
    }
    ok
}

/// Evaluate `expr` in a fresh transaction on a caller-owned connection.
///
/// The connection survives the call, which is what makes in-memory
/// databases, pragma-tuned handles and pooled connections usable; `eval`
/// delegates here. Commit/rollback behave as in [`eval`].
pub fn eval_tx(conn: &mut Connection, expr: &Expr) -> bool {
    let tx = match conn.transaction() {
        Ok(tx) => tx,
        Err(err) => return fail(err),
    };
    if expr.apply(&tx) {
        log_error(tx.commit())
    } else {
        log_error(tx.rollback());
        false
    }
}
