//! The expression algebra: constants, negation, sequential conjunction,
//! speculative disjunction and iteration.
//!
//! `or` and `star` are where the algebra meets the transaction: each
//! speculative branch or iteration step runs inside a fresh savepoint, and a
//! branch that reports failure is rolled back to that savepoint before the
//! evaluator moves on. The database state seen by the *next* expression is
//! exactly the state left by the last successful branch.

use std::fmt;
use std::rc::Rc;

use rusqlite::Connection;
use uuid::Uuid;

use crate::log::{log_error, log_message};

/// A Kleene-algebra-with-tests expression: a first-class value that, applied
/// to an open transaction, reports success or failure and may mutate the
/// database along the way.
///
/// Expressions capture SQL text and parameters, never a transaction handle,
/// so they are cheap to clone and can be re-applied any number of times
/// against any compatible connection. Apply one inside an open transaction
/// whenever it (or anything it composes) uses savepoints; in practice,
/// through [`eval`](crate::eval) or [`eval_tx`](crate::eval_tx).
#[derive(Clone)]
pub struct Expr(Rc<dyn Fn(&Connection) -> bool>);

impl Expr {
    /// Lift a custom transaction→bool closure into the algebra.
    ///
    /// The closure is responsible for its own side effects; wrap it in
    /// [`or`] if a failed run must leave no trace.
    pub fn new<F>(f: F) -> Expr
    where
        F: Fn(&Connection) -> bool + 'static,
    {
        Expr(Rc::new(f))
    }

    /// Evaluate against `tx`.
    pub fn apply(&self, tx: &Connection) -> bool {
        (self.0)(tx)
    }
}

impl fmt::Debug for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Expr")
    }
}

/// The constant failure: ignores the transaction, returns `false`.
pub fn zero() -> Expr {
    Expr::new(|_| false)
}

/// The constant success, defined as `not(zero())`.
pub fn one() -> Expr {
    not(zero())
}

/// Logical negation of `op`.
///
/// Purely logical: no savepoint is opened, so whatever side effects `op`
/// performed are kept regardless of the outcome. Negate pure predicates, or
/// accept the effects.
pub fn not(op: Expr) -> Expr {
    Expr::new(move |tx| !op.apply(tx))
}

/// Sequential conjunction.
///
/// Evaluates the operands left to right against the same transaction and
/// short-circuits on the first `false`. The empty conjunction is `true`.
/// No savepoints: effects of operands that ran before a failing one stay in
/// the transaction until some enclosing `or`/`star`/top-level rollback
/// undoes them.
pub fn and<I>(ops: I) -> Expr
where
    I: IntoIterator<Item = Expr>,
{
    let ops: Vec<Expr> = ops.into_iter().collect();
    Expr::new(move |tx| ops.iter().all(|op| op.apply(tx)))
}

/// Alternative disjunction with speculative evaluation.
///
/// Opens one savepoint, then tries the operands left to right. An operand
/// that fails is rolled back to the savepoint before the next one runs; the
/// first success releases the savepoint and wins, keeping its effects. The
/// empty disjunction is `true` (and opens no savepoint).
pub fn or<I>(ops: I) -> Expr
where
    I: IntoIterator<Item = Expr>,
{
    let ops: Vec<Expr> = ops.into_iter().collect();
    Expr::new(move |tx| {
        if ops.is_empty() {
            return true;
        }
        let name = savepoint_name();
        if !savepoint(tx, &name) {
            return false;
        }
        for op in &ops {
            if op.apply(tx) {
                return release(tx, &name);
            }
            if !rollback_to(tx, &name) {
                return false;
            }
        }
        release(tx, &name);
        false
    })
}

/// Iteration: evaluates `op` until it fails, always succeeding.
///
/// Each attempt runs inside a fresh savepoint. A successful attempt is
/// released and iteration continues; the first failing attempt is rolled
/// back, so its partial effects vanish, and `star` returns `true`.
/// Termination is the caller's responsibility: `star(one())` diverges by
/// design.
pub fn star(op: Expr) -> Expr {
    Expr::new(move |tx| loop {
        let name = savepoint_name();
        if !savepoint(tx, &name) {
            return false;
        }
        if op.apply(tx) {
            if !release(tx, &name) {
                return false;
            }
        } else {
            return rollback_to(tx, &name) && release(tx, &name);
        }
    })
}

/// A fresh savepoint identifier: process-unique, no whitespace or SQL
/// metacharacters, safe under concurrent evaluations.
fn savepoint_name() -> String {
    format!("kat_sp_{}", Uuid::new_v4().simple())
}

fn savepoint(tx: &Connection, name: &str) -> bool {
    log_message(&format!("savepoint {name}"));
    log_error(tx.execute_batch(&format!("SAVEPOINT {name}")))
}

fn rollback_to(tx: &Connection, name: &str) -> bool {
    log_message(&format!("rollback to savepoint {name}"));
    log_error(tx.execute_batch(&format!("ROLLBACK TO SAVEPOINT {name}")))
}

fn release(tx: &Connection, name: &str) -> bool {
    log_message(&format!("release savepoint {name}"));
    log_error(tx.execute_batch(&format!("RELEASE SAVEPOINT {name}")))
}
