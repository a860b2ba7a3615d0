/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::{
    ffi::OsStr,
    io::{self, BufRead, BufReader, Write},
    path::PathBuf,
    process::{Child, ChildStdin, Command as Process, Stdio},
    sync::mpsc::{channel, Receiver, RecvTimeoutError, Sender},
    thread::{self, JoinHandle},
    time::{Duration, Instant},
};

use log::{debug, warn};

use crate::{Command, Result, UciError};

/// How long a quitting engine is given to exit on its own before it is killed.
const EXIT_GRACE: Duration = Duration::from_millis(500);

/// A line-oriented, bidirectional text stream to a UCI engine.
///
/// The [`Engine`](crate::Engine) owns exactly one channel and is the only thing that ever writes to it.
pub trait LineChannel {
    /// Writes `line` followed by a newline, flushing immediately.
    fn write_line(&mut self, line: &str) -> io::Result<()>;

    /// Reads the next line, without its line terminator.
    ///
    /// Returns `Ok(None)` once the stream has ended.
    /// If `timeout` is supplied and no line arrives in time, this fails with [`io::ErrorKind::TimedOut`].
    fn read_line(&mut self, timeout: Option<Duration>) -> io::Result<Option<String>>;

    /// Releases the underlying stream. Called once, when the session quits.
    fn close(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<C: LineChannel + ?Sized> LineChannel for Box<C> {
    fn write_line(&mut self, line: &str) -> io::Result<()> {
        (**self).write_line(line)
    }

    fn read_line(&mut self, timeout: Option<Duration>) -> io::Result<Option<String>> {
        (**self).read_line(timeout)
    }

    fn close(&mut self) -> io::Result<()> {
        (**self).close()
    }
}

/// Sends a single [`Command`] through `channel`.
pub(crate) fn send<C: LineChannel + ?Sized>(channel: &mut C, command: &Command) -> Result<()> {
    let line = command.to_string();
    debug!("> {line}");
    channel.write_line(&line)?;
    Ok(())
}

/// A [`LineChannel`] over the standard input/output of a child process.
///
/// Output from the engine is pumped line-by-line through a channel by a background thread,
/// so that reads can be bounded by a timeout.
#[derive(Debug)]
pub struct ProcessChannel {
    /// The engine process itself.
    child: Child,

    /// The engine's `stdin`. Taken (and thereby closed) when the channel is closed.
    stdin: Option<ChildStdin>,

    /// Lines read from the engine's `stdout` by `pump`.
    lines: Receiver<io::Result<String>>,

    /// Handle to the thread reading the engine's `stdout`.
    pump: Option<JoinHandle<()>>,
}

impl ProcessChannel {
    /// Launches the executable at `path` with `args`, capturing its `stdin` and `stdout`.
    ///
    /// The engine's `stderr` is inherited from this process.
    pub fn spawn<I, S>(path: impl AsRef<OsStr>, args: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let path = path.as_ref();
        let launch_error = |source: io::Error| UciError::Launch {
            path: PathBuf::from(path),
            source,
        };

        let mut child = Process::new(path)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(launch_error)?;

        let missing = |name: &str| {
            launch_error(io::Error::new(
                io::ErrorKind::BrokenPipe,
                format!("engine {name} was not captured"),
            ))
        };
        let stdin = child.stdin.take().ok_or_else(|| missing("stdin"))?;
        let stdout = child.stdout.take().ok_or_else(|| missing("stdout"))?;

        let (sender, lines) = channel();
        let reader = thread::Builder::new()
            .name(String::from("engine-stdout"))
            .spawn(move || pump(stdout, sender))
            .map_err(launch_error)?;

        debug!("Launched engine {path:?} (pid {})", child.id());

        Ok(Self {
            child,
            stdin: Some(stdin),
            lines,
            pump: Some(reader),
        })
    }

    /// Returns the OS-assigned identifier of the engine process.
    pub fn id(&self) -> u32 {
        self.child.id()
    }

    /// Gives the process [`EXIT_GRACE`] to exit, killing it if it is still running afterwards.
    fn reap(&mut self) -> io::Result<()> {
        let start = Instant::now();
        while start.elapsed() < EXIT_GRACE {
            if let Some(status) = self.child.try_wait()? {
                debug!("Engine exited with {status}");
                return Ok(());
            }
            thread::sleep(Duration::from_millis(10));
        }

        warn!("Engine did not exit within {EXIT_GRACE:?}; killing it");
        self.child.kill()?;
        self.child.wait()?;
        Ok(())
    }
}

impl LineChannel for ProcessChannel {
    fn write_line(&mut self, line: &str) -> io::Result<()> {
        let stdin = self
            .stdin
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::BrokenPipe, "engine stdin is closed"))?;

        writeln!(stdin, "{line}")?;
        stdin.flush()
    }

    fn read_line(&mut self, timeout: Option<Duration>) -> io::Result<Option<String>> {
        let next = match timeout {
            // A disconnected receiver means the pump saw end-of-file.
            None => self.lines.recv().ok(),

            Some(timeout) => match self.lines.recv_timeout(timeout) {
                Ok(line) => Some(line),
                Err(RecvTimeoutError::Disconnected) => None,
                Err(RecvTimeoutError::Timeout) => {
                    return Err(io::Error::new(
                        io::ErrorKind::TimedOut,
                        format!("no output from engine within {timeout:?}"),
                    ))
                }
            },
        };

        next.transpose()
    }

    fn close(&mut self) -> io::Result<()> {
        // Dropping stdin sends EOF, which well-behaved engines also treat as `quit`
        self.stdin.take();
        self.reap()?;

        if let Some(pump) = self.pump.take() {
            if pump.join().is_err() {
                warn!("Engine output thread panicked");
            }
        }

        Ok(())
    }
}

impl Drop for ProcessChannel {
    fn drop(&mut self) {
        if let Ok(None) = self.child.try_wait() {
            warn!("Engine process {} dropped while running; killing it", self.child.id());
            _ = self.child.kill();
            _ = self.child.wait();
        }
    }
}

/// Forwards every line of `stdout` through `sender` until either side hangs up.
///
/// Lines are decoded lossily, so stray non-UTF-8 bytes from the engine never end the stream.
fn pump(stdout: impl io::Read, sender: Sender<io::Result<String>>) {
    let mut stdout = BufReader::new(stdout);
    let mut buf = Vec::new();

    loop {
        buf.clear();
        match stdout.read_until(b'\n', &mut buf) {
            Ok(0) => break,

            Ok(_) => {
                let line = buf.strip_suffix(b"\n").unwrap_or(&buf[..]);
                let line = line.strip_suffix(b"\r").unwrap_or(line);
                let line = String::from_utf8_lossy(line).into_owned();
                if sender.send(Ok(line)).is_err() {
                    break;
                }
            }

            Err(err) => {
                _ = sender.send(Err(err));
                break;
            }
        }
    }
}
