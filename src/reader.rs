/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::{io, time::Duration};

use log::{trace, warn};

use crate::{LineChannel, Result, UciError};

/// Reads lines from `channel` until one starts with `marker`, returning every line read (including the marker line).
///
/// Lines that precede the marker, such as `info` output, are returned as-is.
///
/// If the stream ends or fails before the marker is seen, whatever was read so far is returned.
/// Without a `timeout` this blocks until the marker arrives, which may be never.
/// With one, each line must arrive within `timeout` or this fails with [`UciError::Timeout`].
pub fn read_until<C: LineChannel + ?Sized>(
    channel: &mut C,
    marker: &str,
    timeout: Option<Duration>,
) -> Result<Vec<String>> {
    let mut lines = Vec::new();

    loop {
        match channel.read_line(timeout) {
            Ok(Some(line)) => {
                trace!("< {line}");
                let done = line.starts_with(marker);
                lines.push(line);
                if done {
                    break;
                }
            }

            Ok(None) => {
                warn!("Engine output ended before {marker:?} was received");
                break;
            }

            Err(err) if err.kind() == io::ErrorKind::TimedOut => {
                return Err(UciError::Timeout {
                    marker: marker.to_string(),
                    after: timeout.unwrap_or_default(),
                });
            }

            Err(err) => {
                warn!("Failed to read engine output while awaiting {marker:?}: {err}");
                break;
            }
        }
    }

    Ok(lines)
}
