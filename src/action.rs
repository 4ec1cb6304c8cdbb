//! Primitive actions: single SQL statements lifted into the algebra.

use rusqlite::{params_from_iter, Connection};

use crate::expr::Expr;
use crate::log::{fail, log_error, log_message};
use crate::slot::ScanSlot;
use crate::Value;

/// Expression submitting one parameterised statement.
///
/// `true` iff the driver reports success; a driver error goes to the error
/// sink and yields `false`. No savepoint is opened; wrap in
/// [`or`](crate::or) for speculative execution.
///
/// ```rust
/// use sqlkat::{exec, values};
///
/// let credit = exec(
///     "UPDATE account SET balance = balance + ?1 WHERE id = ?2",
///     values![10, 1],
/// );
/// ```
pub fn exec(sql: impl Into<String>, params: Vec<Value>) -> Expr {
    let sql = sql.into();
    Expr::new(move |tx| {
        log_message(&format!("exec: {sql} {params:?}"));
        log_error(tx.execute(&sql, params_from_iter(params.iter())))
    })
}

/// First stage of a query expression: captures SQL text and input
/// parameters. Finish with [`Query::scan`].
pub fn query(sql: impl Into<String>, params: Vec<Value>) -> Query {
    Query {
        sql: sql.into(),
        params,
    }
}

/// A captured query awaiting its scan destinations.
pub struct Query {
    sql: String,
    params: Vec<Value>,
}

impl Query {
    /// Expression that runs the query and scans the first row into `outs`.
    ///
    /// Returns `false` when the cursor is empty (no slot is written), when
    /// a scan conversion fails, or on a driver error; `true` otherwise.
    /// Only the first row is consumed; iterate with [`handle`] instead.
    pub fn scan<I>(self, outs: I) -> Expr
    where
        I: IntoIterator<Item = Box<dyn ScanSlot>>,
    {
        let Query { sql, params } = self;
        let outs: Vec<Box<dyn ScanSlot>> = outs.into_iter().collect();
        Expr::new(move |tx| {
            log_message(&format!("query: {sql} {params:?}"));
            let mut stmt = match tx.prepare(&sql) {
                Ok(stmt) => stmt,
                Err(err) => return fail(err),
            };
            let mut rows = match stmt.query(params_from_iter(params.iter())) {
                Ok(rows) => rows,
                Err(err) => return fail(err),
            };
            match rows.next() {
                Ok(Some(row)) => {
                    for (idx, out) in outs.iter().enumerate() {
                        if let Err(err) = out.read(row, idx) {
                            return fail(err);
                        }
                    }
                    true
                }
                Ok(None) => false,
                Err(err) => fail(err),
            }
        })
    }
}

/// First stage of the row-iteration helper: captures SQL text and input
/// parameters. Finish with [`Handle::for_each`].
///
/// Unlike [`exec`] and [`query`], this does not build an expression; it is
/// called with a transaction from inside a custom [`Expr`] closure.
pub fn handle(sql: impl Into<String>, params: Vec<Value>) -> Handle {
    Handle {
        sql: sql.into(),
        params,
    }
}

/// A captured row-iterating query.
pub struct Handle {
    sql: String,
    params: Vec<Value>,
}

impl Handle {
    /// Run the query; for each row, scan into `outs`, then invoke `f`.
    ///
    /// `f` reads the slots it cares about; it must not touch the cursor it
    /// is being driven from. Returns `true` iff every row scanned cleanly;
    /// iteration stops at the first driver or scan error, which goes to the
    /// error sink.
    pub fn for_each<F>(&self, tx: &Connection, outs: &[Box<dyn ScanSlot>], mut f: F) -> bool
    where
        F: FnMut(),
    {
        log_message(&format!("handle: {} {:?}", self.sql, self.params));
        let mut stmt = match tx.prepare(&self.sql) {
            Ok(stmt) => stmt,
            Err(err) => return fail(err),
        };
        let mut rows = match stmt.query(params_from_iter(self.params.iter())) {
            Ok(rows) => rows,
            Err(err) => return fail(err),
        };
        loop {
            match rows.next() {
                Ok(Some(row)) => {
                    for (idx, out) in outs.iter().enumerate() {
                        if let Err(err) = out.read(row, idx) {
                            return fail(err);
                        }
                    }
                    f();
                }
                Ok(None) => return true,
                Err(err) => return fail(err),
            }
        }
    }
}

#[cfg(test)]
mod test {
    use std::cell::Cell;

    use super::{exec, handle, query};
    use crate::{values, Slot};
    use rusqlite::{Connection, Result};

    fn memory_db() -> Result<Connection> {
        let db = Connection::open_in_memory()?;
        db.execute_batch("CREATE TABLE a (a INTEGER, label TEXT)")?;
        Ok(db)
    }

    #[test]
    fn test_exec() -> Result<()> {
        let db = memory_db()?;
        assert!(exec("INSERT INTO a (a, label) VALUES (?1, ?2)", values![1, "one".to_owned()]).apply(&db));
        let count: i64 = db.query_row("SELECT count(*) FROM a", [], |row| row.get(0))?;
        assert_eq!(count, 1);
        Ok(())
    }

    #[test]
    fn test_exec_reports_driver_error_as_false() -> Result<()> {
        let db = memory_db()?;
        assert!(!exec("INSERT INTO missing (a) VALUES (1)", values![]).apply(&db));
        Ok(())
    }

    #[test]
    fn test_query_scans_first_row_only() -> Result<()> {
        let db = memory_db()?;
        db.execute_batch(
            "INSERT INTO a VALUES (1, 'first');
             INSERT INTO a VALUES (2, 'second');",
        )?;
        let n = Slot::new(-1i64);
        let label = Slot::new(String::new());
        let first = query("SELECT a, label FROM a ORDER BY a", values![])
            .scan([n.out(), label.out()]);
        assert!(first.apply(&db));
        assert_eq!(n.get(), 1);
        assert_eq!(label.get(), "first");
        Ok(())
    }

    #[test]
    fn test_query_no_rows_is_false_and_leaves_slots() -> Result<()> {
        let db = memory_db()?;
        let n = Slot::new(-1i64);
        let miss = query("SELECT a FROM a WHERE 0 = 1", values![]).scan([n.out()]);
        assert!(!miss.apply(&db));
        assert_eq!(n.get(), -1);
        Ok(())
    }

    #[test]
    fn test_query_with_params() -> Result<()> {
        let db = memory_db()?;
        db.execute_batch("INSERT INTO a VALUES (5, 'five')")?;
        let found = Slot::new(false);
        let exists = query("SELECT count(*) > 0 FROM a WHERE a = ?1", values![5])
            .scan([found.out()]);
        assert!(exists.apply(&db));
        assert!(found.get());
        Ok(())
    }

    #[test]
    fn test_query_scan_error_is_false() -> Result<()> {
        let db = memory_db()?;
        db.execute_batch("INSERT INTO a VALUES (1, 'first')")?;
        let n = Slot::new(-1i64);
        let bad = query("SELECT label FROM a", values![]).scan([n.out()]);
        assert!(!bad.apply(&db));
        assert_eq!(n.get(), -1);
        Ok(())
    }

    #[test]
    fn test_handle_visits_every_row() -> Result<()> {
        let db = memory_db()?;
        db.execute_batch(
            "INSERT INTO a VALUES (1, 'x');
             INSERT INTO a VALUES (2, 'y');
             INSERT INTO a VALUES (3, 'z');",
        )?;
        let n = Slot::new(0i64);
        let total = Cell::new(0i64);
        let ok = handle("SELECT a FROM a", values![]).for_each(&db, &[n.out()], || {
            total.set(total.get() + n.get());
        });
        assert!(ok);
        assert_eq!(total.get(), 6);
        Ok(())
    }

    #[test]
    fn test_handle_empty_table_is_true() -> Result<()> {
        let db = memory_db()?;
        let n = Slot::new(0i64);
        let mut visits = 0;
        let ok = handle("SELECT a FROM a", values![]).for_each(&db, &[n.out()], || visits += 1);
        assert!(ok);
        assert_eq!(visits, 0);
        Ok(())
    }

    #[test]
    fn test_handle_bad_sql_is_false() -> Result<()> {
        let db = memory_db()?;
        let ok = handle("SELECT a FROM missing", values![]).for_each(&db, &[], || {});
        assert!(!ok);
        Ok(())
    }

    #[test]
    fn test_values_macro() {
        use crate::Value;
        assert!(values![].is_empty());
        let params = values![1, 2.5, "text".to_owned()];
        assert_eq!(params[0], Value::Integer(1));
        assert_eq!(params[1], Value::Real(2.5));
        assert_eq!(params[2], Value::Text("text".to_owned()));
    }
}
