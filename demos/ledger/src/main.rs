use std::path::PathBuf;

use clap::Parser;
use kat_ledger::ledger::{create_schema, dump_state, process_batch, process_entry, save_batch};
use kat_ledger::read_entries;
use sqlkat::{and, eval, message_log, star};

#[derive(Parser)]
#[command(name = "kat-ledger")]
#[command(about = "Apply a batch of JSON transfer orders to a toy ledger")]
struct Cli {
    /// Newline-delimited JSON transfer entries
    #[arg(long)]
    infile: PathBuf,

    /// SQLite database file
    #[arg(long)]
    dbfile: PathBuf,

    /// Narrate SQL and savepoint control on stderr
    #[arg(long, default_value_t = false)]
    verbose: bool,
}

fn main() {
    let cli = Cli::parse();
    println!("infile: {}", cli.infile.display());
    println!("dbfile: {}", cli.dbfile.display());
    println!("verbose: {}", cli.verbose);

    if !cli.verbose {
        message_log(None::<fn(&str)>);
    }

    // Failures are reported, never returned: the exit code stays zero and
    // the database is either fully updated or untouched.
    let entries = match read_entries(&cli.infile) {
        Ok(entries) => entries,
        Err(err) => {
            eprintln!("{err:#}");
            return;
        }
    };

    let ops = and([
        create_schema(),
        save_batch(entries),
        star(process_batch(process_entry)),
        dump_state(),
    ]);
    eval(&cli.dbfile, &ops);
}
