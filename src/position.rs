/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::fmt;

use crate::{Command, Result, UciError};

/// FEN of the standard starting position, White to move.
pub const FEN_STARTPOS_WHITE: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// FEN of the standard starting position, Black to move.
pub const FEN_STARTPOS_BLACK: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR b KQkq - 0 1";

/// How positions are communicated to the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PositionMode {
    /// Replay every move from the standard starting position: `position startpos moves ...`.
    #[default]
    AlgebraicMoves,

    /// Send a complete FEN every time: `position fen ...`.
    AbsoluteFen,
}

/// One of the two players.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Side {
    #[default]
    White,
    Black,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::White => "white",
            Self::Black => "black",
        })
    }
}

/// Options for starting a new game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct NewGame {
    /// How positions will be sent for the rest of the game.
    pub mode: PositionMode,

    /// Which side is to move at the start. Only affects [`PositionMode::AbsoluteFen`].
    pub side: Side,
}

impl NewGame {
    /// A game positioned by replaying moves from the standard starting position.
    pub fn moves() -> Self {
        Self::default()
    }

    /// A game positioned by FEN, starting from the standard position with `side` to move.
    pub fn fen(side: Side) -> Self {
        Self {
            mode: PositionMode::AbsoluteFen,
            side,
        }
    }
}

/// The client's record of the current game, and therefore what the engine is told about it.
///
/// Exactly one of the move history or the FEN describes the position, depending on the game's [`PositionMode`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PositionState {
    /// No game has been started.
    #[default]
    Uninitialized,

    /// Positioned by the moves played since the standard starting position.
    Moves { side: Side, moves: Vec<String> },

    /// Positioned by a complete FEN.
    Fen { side: Side, fen: String },
}

impl PositionState {
    /// Starts a fresh game described by `game`.
    pub fn new_game(game: NewGame) -> Self {
        match game.mode {
            PositionMode::AlgebraicMoves => Self::Moves {
                side: game.side,
                moves: Vec::new(),
            },

            PositionMode::AbsoluteFen => {
                let fen = match game.side {
                    Side::White => FEN_STARTPOS_WHITE,
                    Side::Black => FEN_STARTPOS_BLACK,
                };

                Self::Fen {
                    side: game.side,
                    fen: fen.to_string(),
                }
            }
        }
    }

    /// Advances the game by `token`.
    ///
    /// When positioning by moves, `token` is the next move and is appended to the history.
    /// When positioning by FEN, `token` is the new position and replaces the old one.
    pub fn advance(&mut self, token: &str) -> Result<()> {
        match self {
            Self::Uninitialized => return Err(UciError::NoGame),
            Self::Moves { moves, .. } => moves.push(token.to_string()),
            Self::Fen { fen, .. } => *fen = token.to_string(),
        }

        Ok(())
    }

    /// The `position` command describing the whole of the current game, if one has been started.
    ///
    /// The engine keeps no memory between `position` commands, so this always carries the entire
    /// move history, not just the latest move. Over a long game that adds up to quadratic traffic.
    pub fn command(&self) -> Option<Command> {
        match self {
            Self::Uninitialized => None,

            Self::Moves { moves, .. } => Some(Command::Position {
                fen: None,
                moves: moves.clone(),
            }),

            Self::Fen { fen, .. } => Some(Command::Position {
                fen: Some(fen.clone()),
                moves: Vec::new(),
            }),
        }
    }

    /// Returns `true` if a game has been started.
    pub fn is_started(&self) -> bool {
        !matches!(self, Self::Uninitialized)
    }

    /// The positioning mode of the current game, if any.
    pub fn mode(&self) -> Option<PositionMode> {
        match self {
            Self::Uninitialized => None,
            Self::Moves { .. } => Some(PositionMode::AlgebraicMoves),
            Self::Fen { .. } => Some(PositionMode::AbsoluteFen),
        }
    }

    /// The side that was to move when the current game started, if any.
    pub fn side(&self) -> Option<Side> {
        match self {
            Self::Uninitialized => None,
            Self::Moves { side, .. } | Self::Fen { side, .. } => Some(*side),
        }
    }

    /// Moves played so far. Empty unless positioning by moves.
    pub fn moves(&self) -> &[String] {
        match self {
            Self::Moves { moves, .. } => moves,
            _ => &[],
        }
    }

    /// The current FEN, if positioning by FEN.
    pub fn fen(&self) -> Option<&str> {
        match self {
            Self::Fen { fen, .. } => Some(fen),
            _ => None,
        }
    }
}
