/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

/// Line-oriented streams to engine processes.
mod channel;

/// Commands sent from the client to the engine.
mod command;

/// The engine session, tying every other module together.
mod engine;

/// Errors produced while talking to an engine.
mod error;

/// Engine identity and the `uci` handshake.
mod metadata;

/// Engine option declarations and values.
mod option;

/// The game state sent to the engine with `position`.
mod position;

/// Reading the engine's responses.
mod reader;

/// Building `go` commands and parsing `bestmove` responses.
mod search;

pub use channel::*;
pub use command::*;
pub use engine::*;
pub use error::*;
pub use metadata::*;
pub use option::*;
pub use position::*;
pub use reader::*;
pub use search::*;
