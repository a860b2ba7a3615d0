/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::{io, path::PathBuf, time::Duration};

use thiserror::Error;

/// Convenience alias for results produced while talking to an engine.
pub type Result<T, E = UciError> = std::result::Result<T, E>;

/// Everything that can go wrong while driving a UCI engine.
#[derive(Debug, Error)]
pub enum UciError {
    /// The engine process (or its standard streams) could not be set up.
    #[error("failed to launch engine at {path:?}: {source}")]
    Launch {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Writing to the engine failed.
    #[error(transparent)]
    Io(#[from] io::Error),

    /// The engine answered with a line that does not have the expected shape.
    #[error("engine violated the UCI protocol with {line:?}")]
    ProtocolViolation { line: String },

    /// An `option` declaration could not be fully parsed.
    #[error("malformed option declaration {declaration:?}")]
    MalformedOption { declaration: String },

    /// No line starting with `marker` arrived within the configured timeout.
    #[error("timed out after {after:?} waiting for {marker:?}")]
    Timeout { marker: String, after: Duration },

    /// A position was advanced before any game was started.
    #[error("no game in progress; start one with `new_game` first")]
    NoGame,

    /// The session has already been terminated with `quit`.
    #[error("engine session has been terminated")]
    InvalidSession,
}
