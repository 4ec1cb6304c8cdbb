//! The ledger expression vocabulary.
//!
//! Accounts are seeded with a balance of 100 on first use. Applying an
//! entry is an `or` between the happy path (ensure both accounts, verify,
//! move the funds, check both balances stayed positive) and quarantine;
//! when the happy path fails at any step, even after it has created
//! accounts speculatively, the savepoint discipline erases the attempt
//! before the entry is quarantined.

use sqlkat::rusqlite::Connection;
use sqlkat::{and, exec, handle, not, or, query, values, Expr, Slot};

use crate::Entry;

fn create_ledger() -> Expr {
    exec(
        "CREATE TABLE IF NOT EXISTS ledger (
            UserId INTEGER,
            UserBalance INTEGER
        )",
        values![],
    )
}

fn drop_ledger() -> Expr {
    exec("DROP TABLE IF EXISTS ledger", values![])
}

fn create_batch() -> Expr {
    exec(
        "CREATE TABLE IF NOT EXISTS batch (
            Id INTEGER PRIMARY KEY AUTOINCREMENT,
            FromId INTEGER,
            ToId INTEGER,
            TransferAmount INTEGER
        )",
        values![],
    )
}

fn drop_batch() -> Expr {
    exec("DROP TABLE IF EXISTS batch", values![])
}

fn create_quarantine() -> Expr {
    exec(
        "CREATE TABLE IF NOT EXISTS quarantine (
            FromId INTEGER,
            ToId INTEGER,
            TransferAmount INTEGER
        )",
        values![],
    )
}

fn drop_quarantine() -> Expr {
    exec("DROP TABLE IF EXISTS quarantine", values![])
}

/// Drop and recreate the ledger, batch and quarantine tables.
pub fn create_schema() -> Expr {
    and([
        drop_ledger(),
        create_ledger(),
        drop_batch(),
        create_batch(),
        drop_quarantine(),
        create_quarantine(),
    ])
}

/// Stage the parsed input in the batch table.
pub fn save_batch(entries: Vec<Entry>) -> Expr {
    and(entries.into_iter().map(|entry| {
        exec(
            "INSERT INTO batch (FromId, ToId, TransferAmount) VALUES (?1, ?2, ?3)",
            values![entry.from_id, entry.to_id, entry.transfer_amount],
        )
    }))
}

fn user_exists(id: i64) -> Expr {
    let exists = Slot::new(false);
    let check = query(
        "SELECT count(*) > 0 FROM ledger WHERE UserId = ?1",
        values![id],
    )
    .scan([exists.out()]);
    Expr::new(move |tx| check.apply(tx) && exists.get())
}

fn user_balance_positive(id: i64) -> Expr {
    let positive = Slot::new(false);
    let check = query(
        "SELECT UserBalance > 0 FROM ledger WHERE UserId = ?1",
        values![id],
    )
    .scan([positive.out()]);
    Expr::new(move |tx| check.apply(tx) && positive.get())
}

fn create_user(id: i64) -> Expr {
    exec(
        "INSERT INTO ledger (UserId, UserBalance) VALUES (?1, 100)",
        values![id],
    )
}

/// Sender account present, creating it if need be.
pub fn ensure_sender(entry: Entry) -> Expr {
    or([user_exists(entry.from_id), create_user(entry.from_id)])
}

/// Receiver account present, creating it if need be.
pub fn ensure_receiver(entry: Entry) -> Expr {
    or([user_exists(entry.to_id), create_user(entry.to_id)])
}

fn positive_transfer(entry: Entry) -> Expr {
    Expr::new(move |_| entry.transfer_amount > 0)
}

/// Pre-conditions: positive amount, both parties on the ledger.
pub fn verify_entry(entry: Entry) -> Expr {
    and([
        positive_transfer(entry),
        user_exists(entry.from_id),
        user_exists(entry.to_id),
    ])
}

fn update_balance(id: i64, delta: i64) -> Expr {
    exec(
        "UPDATE ledger SET UserBalance = UserBalance + ?1 WHERE UserId = ?2",
        values![delta, id],
    )
}

/// Move the funds: debit the sender, credit the receiver.
pub fn save_entry(entry: Entry) -> Expr {
    and([
        update_balance(entry.from_id, -entry.transfer_amount),
        update_balance(entry.to_id, entry.transfer_amount),
    ])
}

/// Record a rejected entry.
pub fn quarantine_entry(entry: Entry) -> Expr {
    exec(
        "INSERT INTO quarantine (FromId, ToId, TransferAmount) VALUES (?1, ?2, ?3)",
        values![entry.from_id, entry.to_id, entry.transfer_amount],
    )
}

fn batch_exists(id: i64) -> Expr {
    let exists = Slot::new(false);
    let check = query("SELECT count(*) > 0 FROM batch WHERE Id = ?1", values![id])
        .scan([exists.out()]);
    Expr::new(move |tx| check.apply(tx) && exists.get())
}

fn delete_batch(id: i64) -> Expr {
    exec("DELETE FROM batch WHERE Id = ?1", values![id])
}

fn remove_batch(id: i64) -> Expr {
    and([batch_exists(id), delete_batch(id), not(batch_exists(id))])
}

/// Apply one staged entry: take it off the batch, then either land it on
/// the ledger or quarantine it.
pub fn process_entry(id: i64, entry: Entry) -> Expr {
    and([
        remove_batch(id),
        or([
            and([
                ensure_sender(entry),
                ensure_receiver(entry),
                verify_entry(entry),
                save_entry(entry),
                user_balance_positive(entry.from_id),
                user_balance_positive(entry.to_id),
            ]),
            quarantine_entry(entry),
        ]),
    ])
}

/// Pull the oldest staged entry and feed it to `op`; `false` once the
/// batch is empty, which is what terminates `star(process_batch(…))`.
pub fn process_batch<F>(op: F) -> Expr
where
    F: Fn(i64, Entry) -> Expr + 'static,
{
    let id = Slot::new(-1i64);
    let from = Slot::new(-1i64);
    let to = Slot::new(-1i64);
    let amount = Slot::new(-1i64);
    let next_row = query(
        "SELECT Id, FromId, ToId, TransferAmount FROM batch ORDER BY Id LIMIT 1",
        values![],
    )
    .scan([id.out(), from.out(), to.out(), amount.out()]);
    Expr::new(move |tx| {
        next_row.apply(tx)
            && op(
                id.get(),
                Entry {
                    from_id: from.get(),
                    to_id: to.get(),
                    transfer_amount: amount.get(),
                },
            )
            .apply(tx)
    })
}

fn dump_rows(tx: &Connection, title: &str, sql: &str, columns: &[&str]) -> bool {
    println!("{title}");
    let slots: Vec<Slot<i64>> = columns.iter().map(|_| Slot::new(-1i64)).collect();
    let outs: Vec<_> = slots.iter().map(Slot::out).collect();
    let names: Vec<String> = columns.iter().map(|c| c.to_string()).collect();
    handle(sql, values![]).for_each(tx, &outs, || {
        let fields: Vec<String> = names
            .iter()
            .zip(&slots)
            .map(|(name, slot)| format!("{name}: {}", slot.get()))
            .collect();
        println!("{{ {} }}", fields.join(" , "));
    })
}

/// Print the batch table.
pub fn dump_batch() -> Expr {
    Expr::new(|tx| {
        dump_rows(
            tx,
            "Batch",
            "SELECT Id, FromId, ToId, TransferAmount FROM batch",
            &["Id", "FromId", "ToId", "TransferAmount"],
        )
    })
}

/// Print the ledger table.
pub fn dump_ledger() -> Expr {
    Expr::new(|tx| {
        dump_rows(
            tx,
            "Ledger",
            "SELECT UserId, UserBalance FROM ledger",
            &["UserId", "UserBalance"],
        )
    })
}

/// Print the quarantine table.
pub fn dump_quarantine() -> Expr {
    Expr::new(|tx| {
        dump_rows(
            tx,
            "Quarantine",
            "SELECT FromId, ToId, TransferAmount FROM quarantine",
            &["FromId", "ToId", "TransferAmount"],
        )
    })
}

/// Print all three tables.
pub fn dump_state() -> Expr {
    and([dump_batch(), dump_ledger(), dump_quarantine()])
}
