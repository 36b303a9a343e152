// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2026 Vallés Puig, Ramon

//! HDO schedule CLI
//!
//! Reads tariff bars already extracted from the distributor's page (JSON)
//! and prints one line per tariff interval:
//!
//! ```sh
//! # Bars from a file, 14 days ahead for command 568
//! hdo-schedule --command 568 --bars bars.json
//!
//! # Bars on stdin, fixed reference instant, custom offset table
//! hdo-schedule -c 568 -d 7 --now 2024-04-01T08:00:00Z --transitions cz.json < bars.json
//! ```

use std::error::Error;
use std::fs::File;
use std::io::{self, BufReader, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use chrono::{DateTime, SubsecRound, Utc};
use clap::Parser;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

use hdo_schedule::{
    extract, Bar, OffsetResolver, Place, RequestWindow, Tariff, TransitionTable,
};

/// Ripple-control (HDO) tariff schedule in UTC.
#[derive(Parser, Debug)]
#[command(
    name = "hdo-schedule",
    version,
    about = "Prints HDO tariff intervals as '<start> <end> <N|V>' lines"
)]
struct Cli {
    /// HDO command code of the receiver.
    #[arg(short, long, env = "HDO_COMMAND")]
    command: u32,

    /// How many days ahead to request, today included.
    #[arg(short, long, env = "HDO_DAYS", default_value_t = 14)]
    days: u32,

    /// Location whose offset periods apply.
    #[arg(long, default_value = "CZ")]
    place: String,

    /// JSON file with the extracted bars; stdin when omitted.
    #[arg(long)]
    bars: Option<PathBuf>,

    /// JSON transition table replacing the built-in one.
    #[arg(long, env = "HDO_TRANSITIONS")]
    transitions: Option<PathBuf>,

    /// Reference instant (RFC 3339) instead of the current time.
    #[arg(long)]
    now: Option<DateTime<Utc>>,

    /// Log level (trace, debug, info, warn, error); RUST_LOG takes precedence.
    #[arg(short, long, default_value = "info")]
    log_level: String,
}

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn load_table(path: Option<&Path>) -> Result<TransitionTable, Box<dyn Error>> {
    match path {
        Some(path) => {
            let table = serde_json::from_reader(BufReader::new(File::open(path)?))?;
            info!("Transition table loaded from {}", path.display());
            Ok(table)
        }
        None => Ok(TransitionTable::builtin()),
    }
}

fn load_bars(path: Option<&Path>) -> Result<Vec<Bar>, Box<dyn Error>> {
    let bars: Vec<Bar> = match path {
        Some(path) => serde_json::from_reader(BufReader::new(File::open(path)?))?,
        None => serde_json::from_reader(io::stdin().lock())?,
    };
    Ok(bars)
}

fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    let resolver = OffsetResolver::new(load_table(cli.transitions.as_deref())?);
    let place = Place::new(cli.place);

    // Curated periods are separated by sub-second gaps; whole seconds never fall in them.
    let reference = cli.now.unwrap_or_else(Utc::now).trunc_subsecs(0);
    let window = RequestWindow::compute(reference, cli.days, &resolver, &place)?;
    info!(
        "Request window {} .. {} ({} days, offset {}s)",
        window.start,
        window.end,
        window.len(),
        window.period.offset_seconds()
    );
    info!(
        "Offset period {} ({:.1} days)",
        window.period.span(),
        window.period.span().duration_days().value()
    );
    if window.is_empty() {
        warn!("Reference is on the last day of its offset period; nothing to request");
        return Ok(());
    }
    info!("url = {}", window.url(cli.command));

    let bars = load_bars(cli.bars.as_deref())?;
    let stdout = io::stdout();
    let mut out = stdout.lock();
    for bar in &bars {
        debug!(
            "Bar {} - {} with {} markers",
            bar.start_day_month,
            bar.end_day_month,
            bar.markers.len()
        );
        let mut high_days = 0.0;
        for interval in extract(&resolver, bar, reference, &place, window.year()) {
            let interval = interval?;
            if interval.tariff == Tariff::High {
                high_days += interval.span().duration_days().value();
            }
            writeln!(out, "{}", interval)?;
        }
        debug!("Bar {} high tariff total {:.4} days", bar.start_day_month, high_days);
    }
    out.flush()?;
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
