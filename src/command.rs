/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::fmt;

use crate::SearchOptions;

/// A message sent from the client to the engine.
///
/// The [`fmt::Display`] implementation renders the exact line written to the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Ask the engine to identify itself and list its options.
    Uci,

    /// Synchronize with the engine.
    IsReady,

    /// Configure one of the engine's options.
    ///
    /// A `value` of `None` is used to press `button` options.
    SetOption { name: String, value: Option<String> },

    /// Inform the engine that the next search belongs to a different game.
    UciNewGame,

    /// Set up a position, starting from `fen` (or the standard position if `None`) and playing `moves`.
    Position {
        fen: Option<String>,
        moves: Vec<String>,
    },

    /// Start searching.
    Go(SearchOptions),

    /// Shut the engine down.
    Quit,
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Uci => f.write_str("uci"),

            Self::IsReady => f.write_str("isready"),

            Self::SetOption { name, value } => {
                write!(f, "setoption name {name}")?;
                if let Some(value) = value {
                    write!(f, " value {value}")?;
                }
                Ok(())
            }

            Self::UciNewGame => f.write_str("ucinewgame"),

            Self::Position { fen, moves } => {
                match fen {
                    Some(fen) => write!(f, "position fen {fen}")?,
                    None => f.write_str("position startpos")?,
                }

                if !moves.is_empty() {
                    write!(f, " moves {}", moves.join(" "))?;
                }
                Ok(())
            }

            Self::Go(options) => options.fmt(f),

            Self::Quit => f.write_str("quit"),
        }
    }
}
