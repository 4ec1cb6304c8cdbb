//! A toy double-entry ledger processed batch-by-batch with sqlkat
//! expressions.
//!
//! Transfer orders arrive as newline-delimited JSON, are staged in a
//! `batch` table, and are then drained one row per `star` iteration. Each
//! entry either lands on the ledger (both accounts created on demand) or,
//! if any post-condition fails, is rolled back to the disjunction's
//! savepoint and quarantined instead.

pub mod ledger;

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use anyhow::Context;
use serde::Deserialize;

/// One transfer order, as it appears in the input file.
#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Entry {
    /// Sender account id.
    pub from_id: i64,
    /// Receiver account id.
    pub to_id: i64,
    /// Amount moved from sender to receiver.
    pub transfer_amount: i64,
}

/// Read newline-delimited JSON entries from `path`, echoing each parsed
/// entry to stdout. Blank lines are skipped; a malformed line is an error.
pub fn read_entries(path: &Path) -> anyhow::Result<Vec<Entry>> {
    let file = File::open(path).with_context(|| format!("open {}", path.display()))?;
    let mut entries = Vec::new();
    for line in BufReader::new(file).lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let entry: Entry =
            serde_json::from_str(&line).with_context(|| format!("parse entry {line:?}"))?;
        println!("{entry:?}");
        entries.push(entry);
    }
    Ok(entries)
}
