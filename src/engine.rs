/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::{ffi::OsStr, time::Duration};

use log::{debug, info, warn};

use crate::{
    channel, read_until, search::BESTMOVE, BestMove, Command, LineChannel, Metadata, NewGame,
    OptionValue, PositionState, ProcessChannel, Result, SearchOptions, UciError,
};

/// Sent by the engine in response to `isready`.
const READYOK: &str = "readyok";

/// A session with a UCI chess engine.
///
/// Every operation writes its command(s) and then, if the protocol calls for an answer, blocks until
/// the engine gives one. Nothing is ever left in flight between calls.
///
/// By default reads wait forever. If the engine may hang, set a timeout with [`Engine::set_timeout`]
/// or construct the session with [`Engine::connect`]. After a read times out, the next command is
/// preceded by an `isready` round-trip that discards whatever the engine printed late.
///
/// Once [`Engine::quit`] has been called, every operation fails with [`UciError::InvalidSession`].
#[derive(Debug)]
pub struct Engine<C: LineChannel = ProcessChannel> {
    /// The stream to the engine. `None` once the session has been terminated.
    channel: Option<C>,

    /// Identity and options reported by the engine during the handshake.
    metadata: Metadata,

    /// The game being played, as last sent to the engine.
    position: PositionState,

    /// Maximum time to wait for each line of a response.
    timeout: Option<Duration>,

    /// Set when a read timed out, so the engine may still print a stale response.
    desynced: bool,

    /// Number of `readyok`s the engine still owes for `isready`s that timed out.
    owed_readyoks: usize,
}

impl Engine<ProcessChannel> {
    /// Launches the engine executable at `path` and performs the `uci` handshake.
    ///
    /// Fails if the process cannot be started.
    pub fn new(path: impl AsRef<OsStr>) -> Result<Self> {
        Self::spawn(path, [""; 0], None)
    }

    /// Launches the engine executable at `path` with `args`, and performs the `uci` handshake.
    ///
    /// `timeout` bounds every read for the lifetime of the session, including the handshake.
    pub fn spawn<I, S>(path: impl AsRef<OsStr>, args: I, timeout: Option<Duration>) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let channel = ProcessChannel::spawn(path, args)?;
        Self::connect(channel, timeout)
    }
}

impl<C: LineChannel> Engine<C> {
    /// Starts a session over an existing `channel`, performing the `uci` handshake.
    pub fn with_channel(channel: C) -> Result<Self> {
        Self::connect(channel, None)
    }

    /// Starts a session over an existing `channel`, performing the `uci` handshake with reads bounded by `timeout`.
    pub fn connect(mut channel: C, timeout: Option<Duration>) -> Result<Self> {
        let metadata = Metadata::discover(&mut channel, timeout)?;

        info!(
            "Connected to {:?} by {:?} ({} options)",
            metadata.name,
            metadata.author,
            metadata.options.len()
        );
        if metadata.unparsed > 0 {
            debug!("{} handshake line(s) were not understood", metadata.unparsed);
        }

        Ok(Self {
            channel: Some(channel),
            metadata,
            position: PositionState::default(),
            timeout,
            desynced: false,
            owed_readyoks: 0,
        })
    }

    /// Identity and options of the engine. Empty once the session has been terminated.
    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    /// The current game, as last sent to the engine.
    pub fn position(&self) -> &PositionState {
        &self.position
    }

    /// Returns `true` if [`Engine::quit`] has been called.
    pub fn is_terminated(&self) -> bool {
        self.channel.is_none()
    }

    /// Maximum time to wait for each line of a response, if bounded.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Bounds (or, with `None`, unbounds) how long to wait for each line of a response.
    ///
    /// When a read times out the engine may still answer later. Such late output is discarded
    /// before the next command is sent, so it is never mistaken for that command's response.
    pub fn set_timeout(&mut self, timeout: Option<Duration>) {
        self.timeout = timeout;
    }

    /// Sets the option `name` to `value`.
    ///
    /// Returns `Ok(false)` without sending anything if the engine has no option called exactly `name`.
    /// Otherwise returns `Ok(true)` once the command is sent; engines do not acknowledge it.
    pub fn set_option(&mut self, name: &str, value: impl Into<OptionValue>) -> Result<bool> {
        let value = value.into();
        self.configure(name, Some(value.to_string()))
    }

    /// Presses the `button` option `name`, such as `Clear Hash`.
    ///
    /// Returns `Ok(false)` without sending anything if the engine has no option called exactly `name`.
    pub fn press_button(&mut self, name: &str) -> Result<bool> {
        self.configure(name, None)
    }

    /// Checks whether the engine is ready to receive commands.
    ///
    /// Returns `Ok(true)` only if the engine answered with exactly `readyok`.
    pub fn is_ready(&mut self) -> Result<bool> {
        self.send(Command::IsReady)?;
        let lines = self.receive(READYOK)?;
        Ok(lines.last().is_some_and(|line| line == READYOK))
    }

    /// Starts a new game, discarding the previous one (if any).
    pub fn new_game(&mut self, game: NewGame) -> Result<()> {
        self.ensure_alive()?;

        let position = PositionState::new_game(game);
        debug!("New game in {:?} mode, {} to move", game.mode, game.side);

        self.send(Command::UciNewGame)?;
        self.position = position;
        self.send_position()
    }

    /// Advances the current game and sends the resulting position to the engine.
    ///
    /// In [`PositionMode::AlgebraicMoves`](crate::PositionMode::AlgebraicMoves), `token` is the next move, like `e2e4`.
    /// In [`PositionMode::AbsoluteFen`](crate::PositionMode::AbsoluteFen), `token` is the FEN of the new position.
    pub fn advance_position(&mut self, token: &str) -> Result<()> {
        self.ensure_alive()?;
        self.position.advance(token)?;
        self.send_position()
    }

    /// Searches the current position, blocking until the engine announces its best move.
    pub fn search(&mut self, options: &SearchOptions) -> Result<BestMove> {
        self.send(Command::Go(options.clone()))?;
        let lines = self.receive(BESTMOVE)?;

        // If the engine stopped talking before `bestmove`, the last line can't be parsed as one
        let last = lines.last().map(String::as_str).unwrap_or_default();
        let bestmove = BestMove::from_line(last)?;

        debug!("Engine chose {bestmove}");
        Ok(bestmove)
    }

    /// Tells the engine to quit and tears down the session.
    ///
    /// The channel is closed, metadata is cleared and the game is forgotten.
    pub fn quit(&mut self) -> Result<()> {
        // Late output no longer matters, so there is no need to resynchronize first
        let sent = self.write(&Command::Quit);

        // Tear down the session even if the engine can no longer be written to
        let mut channel = self.channel.take().ok_or(UciError::InvalidSession)?;
        self.metadata = Metadata::default();
        self.position = PositionState::default();
        self.desynced = false;
        self.owed_readyoks = 0;
        let closed = channel.close();

        info!("Engine session terminated");
        sent?;
        Ok(closed?)
    }

    /// Sends a `setoption` command if the engine declared an option called `name`.
    fn configure(&mut self, name: &str, value: Option<String>) -> Result<bool> {
        self.ensure_alive()?;

        if self.metadata.option(name).is_none() {
            debug!("Engine has no option named {name:?}");
            return Ok(false);
        }

        self.send(Command::SetOption {
            name: name.to_string(),
            value,
        })?;
        Ok(true)
    }

    /// Sends the `position` command for the current game.
    fn send_position(&mut self) -> Result<()> {
        match self.position.command() {
            Some(cmd) => self.send(cmd),
            None => Err(UciError::NoGame),
        }
    }

    /// Fails with [`UciError::InvalidSession`] if the session has been terminated.
    fn ensure_alive(&self) -> Result<()> {
        if self.is_terminated() {
            Err(UciError::InvalidSession)
        } else {
            Ok(())
        }
    }

    /// Writes `command` to the engine, first discarding any output left over from a timed-out read.
    fn send(&mut self, command: Command) -> Result<()> {
        if self.desynced {
            self.resync()?;
        }

        self.write(&command)
    }

    /// Writes `command` to the engine as-is.
    fn write(&mut self, command: &Command) -> Result<()> {
        let channel = self.channel.as_mut().ok_or(UciError::InvalidSession)?;
        channel::send(channel, command)
    }

    /// Reads the engine's output up to and including the first line starting with `marker`.
    ///
    /// A timeout leaves the session desynchronized until [`Engine::resync`] succeeds.
    fn receive(&mut self, marker: &str) -> Result<Vec<String>> {
        let channel = self.channel.as_mut().ok_or(UciError::InvalidSession)?;
        let res = read_until(channel, marker, self.timeout);

        if let Err(UciError::Timeout { .. }) = res {
            self.desynced = true;
            if marker == READYOK {
                self.owed_readyoks += 1;
            }
        }

        res
    }

    /// Sends `isready` and discards everything up to its `readyok`, including the `readyok`s
    /// still owed for earlier `isready`s that timed out.
    fn resync(&mut self) -> Result<()> {
        let channel = self.channel.as_mut().ok_or(UciError::InvalidSession)?;
        channel::send(channel, &Command::IsReady)?;
        self.owed_readyoks += 1;

        while self.owed_readyoks > 0 {
            let lines = read_until(channel, READYOK, self.timeout)?;
            if lines.len() > 1 {
                warn!("Discarded {} line(s) of stale engine output", lines.len() - 1);
            }

            if lines.last().is_some_and(|line| line == READYOK) {
                self.owed_readyoks -= 1;
            } else {
                // The stream ended, so nothing else can arrive
                self.owed_readyoks = 0;
            }
        }

        debug!("Resynchronized with engine");
        self.desynced = false;
        Ok(())
    }
}
