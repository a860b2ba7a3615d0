/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::fmt;

use crate::{Result, UciError};

/// Keyword that starts the engine's answer to `go`.
pub(crate) const BESTMOVE: &str = "bestmove";

/// Keyword preceding the move the engine expects in reply to its best move.
const PONDER: &str = "ponder";

/// Parameters of a `go` command.
///
/// Numeric limits that are `None` or zero are left out of the command entirely, since a bound of
/// zero is meaningless to a search. Times are in milliseconds.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchOptions {
    /// Start searching in pondering mode.
    pub ponder: bool,

    /// Time White has left on the clock.
    pub wtime: Option<u64>,

    /// Time Black has left on the clock.
    pub btime: Option<u64>,

    /// White's increment per move.
    pub winc: Option<u64>,

    /// Black's increment per move.
    pub binc: Option<u64>,

    /// Moves remaining until the next time control.
    pub movestogo: Option<u64>,

    /// Maximum search depth, in plies.
    pub depth: Option<u64>,

    /// Maximum number of nodes to search.
    pub nodes: Option<u64>,

    /// Search for a mate in this many moves.
    pub mate: Option<u64>,

    /// Search for exactly this long.
    pub movetime: Option<u64>,

    /// Restrict the search to these moves.
    pub search_moves: Vec<String>,
}

macro_rules! setter {
    ($($field:ident),*) => {
        $(
            #[doc = concat!("Sets `", stringify!($field), "`.")]
            pub fn $field(mut self, $field: u64) -> Self {
                self.$field = Some($field);
                self
            }
        )*
    };
}

impl SearchOptions {
    /// Creates an empty set of options, which renders as a bare `go`.
    pub fn new() -> Self {
        Self::default()
    }

    setter!(wtime, btime, winc, binc, movestogo, depth, nodes, mate, movetime);

    /// Sets whether to search in pondering mode.
    pub fn ponder(mut self, ponder: bool) -> Self {
        self.ponder = ponder;
        self
    }

    /// Restricts the search to `moves`.
    pub fn search_moves<I: IntoIterator<Item = S>, S: Into<String>>(mut self, moves: I) -> Self {
        self.search_moves = moves.into_iter().map(Into::into).collect();
        self
    }

    /// All numeric limits in the order they are sent to the engine.
    fn limits(&self) -> [(&'static str, Option<u64>); 9] {
        [
            ("wtime", self.wtime),
            ("btime", self.btime),
            ("winc", self.winc),
            ("binc", self.binc),
            ("movestogo", self.movestogo),
            ("depth", self.depth),
            ("nodes", self.nodes),
            ("mate", self.mate),
            ("movetime", self.movetime),
        ]
    }
}

impl fmt::Display for SearchOptions {
    /// Renders the full `go` command.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("go")?;

        if self.ponder {
            f.write_str(" ponder")?;
        }

        for (keyword, value) in self.limits() {
            match value {
                Some(0) | None => {}
                Some(n) => write!(f, " {keyword} {n}")?,
            }
        }

        // Variable-length, so it goes last
        if !self.search_moves.is_empty() {
            write!(f, " searchmoves {}", self.search_moves.join(" "))?;
        }

        Ok(())
    }
}

/// The result of a search: the engine's chosen move, and optionally the reply it expects.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BestMove {
    /// The move the engine wants to play.
    pub best: String,

    /// The move the engine expects in response, or an empty string if it didn't name one.
    pub ponder: String,
}

impl BestMove {
    /// Parses a `bestmove <move> [ponder <move>]` line.
    ///
    /// Fails with [`UciError::ProtocolViolation`] if the line is not a `bestmove` line,
    /// lacks the best move, or names `ponder` without a move after it.
    pub fn from_line(line: &str) -> Result<Self> {
        let violation = || UciError::ProtocolViolation {
            line: line.to_string(),
        };

        let words = line.split_whitespace().collect::<Vec<_>>();
        if words.first() != Some(&BESTMOVE) {
            return Err(violation());
        }

        let best = words.get(1).ok_or_else(violation)?;

        let ponder = match words.iter().position(|&word| word == PONDER) {
            Some(idx) => *words.get(idx + 1).ok_or_else(violation)?,
            None => "",
        };

        Ok(Self {
            best: best.to_string(),
            ponder: ponder.to_string(),
        })
    }

    /// Returns the ponder move, if the engine supplied one.
    pub fn ponder(&self) -> Option<&str> {
        (!self.ponder.is_empty()).then_some(self.ponder.as_str())
    }
}

impl fmt::Display for BestMove {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{BESTMOVE} {}", self.best)?;
        if let Some(ponder) = self.ponder() {
            write!(f, " {PONDER} {ponder}")?;
        }
        Ok(())
    }
}
