/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::{path::PathBuf, time::Duration};

use clap::{ArgAction, Args, Parser};
use log::LevelFilter;
use tadpole::{SearchOptions, Side};

/// Search time used when no search limits are supplied, so that the engine doesn't think forever.
const DEFAULT_MOVETIME: u64 = 1000;

/// Ask a UCI chess engine for its best move.
#[derive(Debug, Clone, Parser)]
#[command(version, about)]
pub struct Cli {
    /// Path to the engine executable.
    pub engine: PathBuf,

    /// Moves to play from the starting position (or from `--fen`), in UCI notation.
    pub moves: Vec<String>,

    /// Argument to launch the engine with. May be repeated.
    #[arg(long = "arg", value_name = "ARG", allow_hyphen_values = true)]
    pub engine_args: Vec<String>,

    /// Engine option to set before searching. May be repeated.
    #[arg(short, long = "option", value_name = "NAME=VALUE", value_parser = parse_option)]
    pub options: Vec<(String, String)>,

    /// Search this position instead of the standard starting position.
    #[arg(short, long, conflicts_with = "moves")]
    pub fen: Option<String>,

    /// Maximum time (in milliseconds) to wait for each line of engine output.
    #[arg(short, long, value_name = "MS")]
    pub timeout: Option<u64>,

    /// Print the engine's identity and options, then exit.
    #[arg(short, long, default_value = "false")]
    pub info: bool,

    /// Increase logging verbosity. May be repeated (up to `-vvv`).
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(flatten)]
    pub limits: Limits,
}

impl Cli {
    /// Log level selected by the number of `-v` flags.
    pub fn log_level(&self) -> LevelFilter {
        match self.verbose {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            2 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    }

    /// Per-line read timeout, if one was requested.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout.map(Duration::from_millis)
    }

    /// Side to move in `--fen`, defaulting to White if it can't be determined.
    pub fn side_to_move(&self) -> Side {
        match self.fen.as_deref().and_then(|fen| fen.split_whitespace().nth(1)) {
            Some("b") => Side::Black,
            _ => Side::White,
        }
    }
}

/// Limits placed on the search. Times are in milliseconds.
#[derive(Debug, Clone, Copy, Args)]
pub struct Limits {
    /// Time White has left on the clock.
    #[arg(long)]
    pub wtime: Option<u64>,

    /// Time Black has left on the clock.
    #[arg(long)]
    pub btime: Option<u64>,

    /// White's increment per move.
    #[arg(long)]
    pub winc: Option<u64>,

    /// Black's increment per move.
    #[arg(long)]
    pub binc: Option<u64>,

    /// Moves until the next time control.
    #[arg(long)]
    pub movestogo: Option<u64>,

    /// Maximum search depth.
    #[arg(short, long)]
    pub depth: Option<u64>,

    /// Maximum number of nodes to search.
    #[arg(short, long)]
    pub nodes: Option<u64>,

    /// Search for a mate in this many moves.
    #[arg(short, long)]
    pub mate: Option<u64>,

    /// Search for exactly this long.
    #[arg(long)]
    pub movetime: Option<u64>,
}

impl From<Limits> for SearchOptions {
    fn from(limits: Limits) -> Self {
        let mut options = SearchOptions {
            wtime: limits.wtime,
            btime: limits.btime,
            winc: limits.winc,
            binc: limits.binc,
            movestogo: limits.movestogo,
            depth: limits.depth,
            nodes: limits.nodes,
            mate: limits.mate,
            movetime: limits.movetime,
            ..Default::default()
        };

        // A bare `go` searches forever on most engines
        if options == SearchOptions::default() {
            options.movetime = Some(DEFAULT_MOVETIME);
        }

        options
    }
}

/// Splits `NAME=VALUE` at the first `=`.
fn parse_option(s: &str) -> Result<(String, String), String> {
    let (name, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, found {s:?}"))?;

    Ok((name.trim().to_string(), value.trim().to_string()))
}
