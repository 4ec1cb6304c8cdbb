//! Sqlkat is a small embedded interpreter for Kleene Algebra with Tests
//! (KAT) expressions over a SQLite transaction.
//!
//! An [`Expr`] is a composable, first-class value that, applied to a live
//! transaction, returns a boolean *success* and, as a side effect, mutates
//! the database. The combinators ([`and`], [`or`], [`star`], [`not`], the
//! constants [`zero`] and [`one`], plus the primitive actions [`exec`] and
//! [`query`]) give transactional business logic a calculus whose control
//! flow is interleaved with automatic savepoint-based rollback: `or` and
//! `star` run speculative branches inside nested savepoints and roll back
//! any branch that reports failure, so the state seen by the next
//! expression is exactly the state left by the last successful branch.
//!
//! ```rust
//! use sqlkat::{and, eval_tx, exec, or, query, values, Expr, Slot};
//!
//! fn balance_positive(id: i64) -> Expr {
//!     let positive = Slot::new(false);
//!     let check = query(
//!         "SELECT balance > 0 FROM account WHERE id = ?1",
//!         values![id],
//!     )
//!     .scan([positive.out()]);
//!     Expr::new(move |tx| check.apply(tx) && positive.get())
//! }
//!
//! fn main() -> sqlkat::Result<()> {
//!     let mut conn = sqlkat::rusqlite::Connection::open_in_memory()?;
//!
//!     // Move 250 from account 1 to account 2. If that overdraws the
//!     // sender, the attempt is rolled back to the disjunction's savepoint
//!     // and recorded as rejected instead.
//!     let ops = and([
//!         exec(
//!             "CREATE TABLE account (id INTEGER PRIMARY KEY, balance INTEGER)",
//!             values![],
//!         ),
//!         exec("CREATE TABLE rejected (id INTEGER)", values![]),
//!         exec("INSERT INTO account VALUES (1, 100), (2, 0)", values![]),
//!         or([
//!             and([
//!                 exec(
//!                     "UPDATE account SET balance = balance - 250 WHERE id = 1",
//!                     values![],
//!                 ),
//!                 exec(
//!                     "UPDATE account SET balance = balance + 250 WHERE id = 2",
//!                     values![],
//!                 ),
//!                 balance_positive(1),
//!             ]),
//!             exec("INSERT INTO rejected VALUES (1)", values![]),
//!         ]),
//!     ]);
//!     assert!(eval_tx(&mut conn, &ops));
//!
//!     let rejected: i64 =
//!         conn.query_row("SELECT count(*) FROM rejected", [], |row| row.get(0))?;
//!     assert_eq!(rejected, 1);
//!     let balance: i64 =
//!         conn.query_row("SELECT balance FROM account WHERE id = 1", [], |row| row.get(0))?;
//!     assert_eq!(balance, 100);
//!     Ok(())
//! }
//! ```
//!
//! Failure comes in two flavors and the algebra deliberately conflates
//! them: a combinator returning `false` (normal control flow) and a driver
//! error (reported to the [error sink](error_log), then converted to
//! `false` at the point of origin). On any top-level failure the entire
//! transaction is rolled back.
#![warn(missing_docs)]

pub use rusqlite;
pub use rusqlite::types::Value;
pub use rusqlite::{params_from_iter, Error, Result};

pub use crate::action::{exec, handle, query, Handle, Query};
pub use crate::eval::{eval, eval_tx};
pub use crate::expr::{and, not, one, or, star, zero, Expr};
pub use crate::log::{error_log, log_error, log_message, message_log};
pub use crate::slot::{ScanSlot, Slot};

/// Build the owned positional parameter list for [`exec`], [`query`] and
/// [`handle`], mirroring rusqlite's `params!`.
///
/// Each argument is converted with `Value::from`, so anything with a
/// `From` impl on [`Value`] works: integers, floats, `String`, `Vec<u8>`,
/// `bool`.
///
/// ```rust
/// use sqlkat::{exec, values};
///
/// let insert = exec(
///     "INSERT INTO batch (FromId, ToId, TransferAmount) VALUES (?1, ?2, ?3)",
///     values![1, 2, 10],
/// );
/// ```
#[macro_export]
macro_rules! values {
    () => {
        ::std::vec::Vec::<$crate::Value>::new()
    };
    ($($value:expr),+ $(,)?) => {
        vec![$($crate::Value::from($value)),+]
    };
}

mod action;
mod eval;
mod expr;
mod log;
mod slot;
