//! End-to-end scenarios driven through `eval` on on-disk databases.

use std::cell::Cell;
use std::path::Path;

use rusqlite::{Connection, Result};
use sqlkat::{and, eval, exec, handle, not, or, query, star, values, zero, Expr, Slot};
use tempfile::NamedTempFile;

fn with_test_db(test: impl FnOnce(&Path)) {
    let file = NamedTempFile::new().expect("temp database");
    test(file.path());
}

fn create_table_b() -> Expr {
    and([
        exec("DROP TABLE IF EXISTS b", values![]),
        exec("CREATE TABLE b (b INTEGER)", values![]),
    ])
}

/// Sum of column `b`, compared against `expected`.
fn check_sum(expected: i64) -> Expr {
    let value = Slot::new(0i64);
    Expr::new(move |tx| {
        let total = Cell::new(0i64);
        handle("SELECT b FROM b", values![]).for_each(tx, &[value.out()], || {
            total.set(total.get() + value.get());
        }) && total.get() == expected
    })
}

fn table_exists(conn: &Connection, name: &str) -> Result<bool> {
    conn.query_row(
        "SELECT count(*) > 0 FROM sqlite_master WHERE type = 'table' AND name = ?1",
        [name],
        |row| row.get(0),
    )
}

#[test]
fn exec_smoke() {
    with_test_db(|path| {
        assert!(eval(path, &exec("CREATE TABLE t (a INTEGER)", values![])));
        let db = Connection::open(path).unwrap();
        assert!(table_exists(&db, "t").unwrap());
    });
}

#[test]
fn top_level_false_rolls_back_everything() {
    with_test_db(|path| {
        let ops = and([
            exec("CREATE TABLE t (a INTEGER)", values![]),
            exec("INSERT INTO t VALUES (1)", values![]),
            zero(),
        ]);
        assert!(!eval(path, &ops));
        let db = Connection::open(path).unwrap();
        assert!(!table_exists(&db, "t").unwrap());
    });
}

#[test]
fn or_stops_at_first_success() {
    with_test_db(|path| {
        let ops = and([
            create_table_b(),
            or([
                exec("INSERT INTO b (b) VALUES (1)", values![]),
                exec("INSERT INTO b (b) VALUES (2)", values![]),
            ]),
            check_sum(1),
        ]);
        assert!(eval(path, &ops));
    });
}

#[test]
fn or_tries_next_operand_on_failure() {
    with_test_db(|path| {
        let ops = and([
            create_table_b(),
            or([
                exec("INSERT INTO nonexistent VALUES (1)", values![]),
                exec("INSERT INTO b (b) VALUES (2)", values![]),
            ]),
            check_sum(2),
        ]);
        assert!(eval(path, &ops));
    });
}

#[test]
fn or_truth_table_under_eval() {
    with_test_db(|path| {
        assert!(eval(path, &or([])));
        assert!(eval(path, &or([and([])])));
        assert!(!eval(path, &or([zero()])));
        assert!(eval(path, &or([zero(), not(zero())])));
        assert!(!eval(path, &or([zero(), zero()])));
    });
}

#[test]
fn star_keeps_five_iterations() {
    with_test_db(|path| {
        let count = Cell::new(0);
        let insert_five = Expr::new(move |tx| {
            count.set(count.get() + 1);
            count.get() <= 5 && exec("INSERT INTO s (s) VALUES (1)", values![]).apply(tx)
        });
        let ops = and([
            exec("CREATE TABLE s (s INTEGER)", values![]),
            star(insert_five),
            Expr::new(|tx| {
                let value = Slot::new(0i64);
                let total = Cell::new(0i64);
                handle("SELECT s FROM s", values![]).for_each(tx, &[value.out()], || {
                    total.set(total.get() + value.get());
                }) && total.get() == 5
            }),
        ]);
        assert!(eval(path, &ops));
    });
}

#[test]
fn query_finds_nothing() {
    with_test_db(|path| {
        let out = Slot::new(-1i64);
        let miss = query("SELECT 1 WHERE 0 = 1", values![]).scan([out.out()]);
        assert!(!eval(path, &miss));
        assert_eq!(out.get(), -1);
    });
}
