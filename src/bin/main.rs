// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2025 Daniel Negri
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

use clap::{ArgAction, Parser, Subcommand};
use csv::{ReaderBuilder, Trim, Writer};
use points_ledger_rs::{CompanyId, LedgerEvent, LedgerStore, TransactionDate, UserId, api};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, Read, Write};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Points Ledger - Track loyalty points per user and company
///
/// Replays ledger events from a CSV file, or serves the ledger over HTTP.
#[derive(Parser, Debug)]
#[command(name = "points-ledger")]
#[command(about = "A loyalty points ledger with FIFO deductions", long_about = None)]
struct Args {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    ///
    /// `RUST_LOG` takes precedence when set.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Apply a CSV file of events and print the resulting balances
    ///
    /// Expected format: type,user,company,points,date
    /// Example: cargo run -- replay events.csv > balances.csv
    Replay {
        #[arg(value_name = "FILE")]
        input: PathBuf,
    },
    /// Serve the ledger REST API
    Serve {
        /// Address to listen on
        #[arg(long, default_value = "127.0.0.1:5001")]
        addr: SocketAddr,
    },
}

fn main() {
    let args = Args::parse();
    set_up_logging(args.verbose);

    match args.command {
        Command::Replay { input } => replay(&input),
        Command::Serve { addr } => serve(addr),
    }
}

fn replay(input: &Path) {
    let file = match File::open(input) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Error opening file '{}': {}", input.display(), e);
            process::exit(1);
        }
    };

    let store = match process_events(BufReader::new(file)) {
        Ok(store) => store,
        Err(e) => {
            eprintln!("Error processing events: {}", e);
            process::exit(1);
        }
    };

    if let Err(e) = write_balances(&store, std::io::stdout()) {
        eprintln!("Error writing output: {}", e);
        process::exit(1);
    }
}

fn serve(addr: SocketAddr) {
    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("Error starting runtime: {}", e);
            process::exit(1);
        }
    };

    let store = Arc::new(LedgerStore::new());
    if let Err(e) = runtime.block_on(api::serve(store, addr)) {
        eprintln!("Error serving on {}: {}", addr, e);
        process::exit(1);
    }
}

/// Routes this crate's events at the requested verbosity, everything else at `warn`.
fn set_up_logging(verbosity: u8) {
    let level = max_level(verbosity);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "warn,points_ledger={level},points_ledger_rs={level}"
        ))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .init();
}

fn max_level(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// Raw CSV record matching the input format.
///
/// Fields: `type, user, company, points, date`
#[derive(Debug, Deserialize)]
struct CsvRecord {
    #[serde(rename = "type")]
    event_type: String,
    user: String,
    company: Option<String>,
    points: i64,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    date: Option<TransactionDate>,
}

impl CsvRecord {
    /// Converts CSV record to a LedgerEvent.
    ///
    /// Returns `None` for unknown event types or missing required fields.
    fn into_event(self) -> Option<LedgerEvent> {
        let user = UserId(self.user);

        match self.event_type.to_lowercase().as_str() {
            "accrue" => Some(LedgerEvent::Accrue {
                user,
                company: CompanyId(self.company?),
                points: self.points,
                transaction_date: self.date?,
            }),
            "deduct" => Some(LedgerEvent::Deduct {
                user,
                amount: u64::try_from(self.points).ok()?,
            }),
            _ => None,
        }
    }
}

/// Process ledger events from a CSV reader.
///
/// Rows are streamed one at a time. Malformed rows and rejected events are
/// logged and skipped. Deductions are dated with the local clock.
///
/// # CSV Format
///
/// Expected columns: `type, user, company, points, date`
/// - `type`: `accrue` or `deduct`
/// - `user`: User key
/// - `company`: Issuing company (empty for deduct)
/// - `points`: Points to accrue (signed), or amount to deduct
/// - `date`: `MM/DD/YY HH:MMAM` (empty for deduct)
///
/// # Example
///
/// ```csv
/// type,user,company,points,date
/// accrue,alice,DANNON,300,10/31/20 10:00AM
/// accrue,alice,DANNON,-200,10/31/20 03:00PM
/// deduct,alice,,50,
/// ```
///
/// # Errors
///
/// Returns a CSV error if the reader fails or the CSV structure is invalid.
pub fn process_events<R: Read>(reader: R) -> Result<LedgerStore, csv::Error> {
    let store = LedgerStore::new();

    let mut rdr = ReaderBuilder::new()
        .trim(Trim::All)
        .flexible(true) // Trailing empty fields may be omitted on deduct rows
        .has_headers(true)
        .from_reader(reader);

    for result in rdr.deserialize::<CsvRecord>() {
        match result {
            Ok(record) => {
                let Some(event) = record.into_event() else {
                    debug!("Skipping invalid event record");
                    continue;
                };

                let user = event.user().clone();
                if let Err(e) = store.apply(event) {
                    debug!(%user, error = %e, "Skipping rejected event");
                }
            }
            Err(e) => {
                debug!(error = %e, "Skipping malformed row");
                continue;
            }
        }
    }

    Ok(store)
}

/// Output row: one per user and company.
#[derive(Debug, Serialize)]
struct BalanceRow<'a> {
    user: &'a UserId,
    company: &'a CompanyId,
    points: i64,
}

/// Write balances to a CSV writer
///
/// Users are sorted by key; companies keep the order of their first accrual.
///
/// # CSV Format
///
/// Columns: `user, company, points`
///
/// # Example
///
/// ```csv
/// user,company,points
/// alice,DANNON,1000
/// alice,UNILEVER,0
/// ```
///
/// # Errors
///
/// Returns a CSV error if writing fails.
pub fn write_balances<W: Write>(store: &LedgerStore, writer: W) -> Result<(), csv::Error> {
    let mut wtr = Writer::from_writer(writer);

    let mut users: Vec<_> = store
        .users()
        .map(|entry| (entry.key().clone(), entry.value().balances()))
        .collect();
    users.sort_by(|a, b| a.0.cmp(&b.0));

    for (user, balances) in &users {
        for (company, points) in balances {
            wtr.serialize(BalanceRow {
                user,
                company,
                points: *points,
            })?;
        }
    }

    wtr.flush()?;
    Ok(())
}
