/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::time::Duration;

use log::debug;

use crate::{channel, read_until, Command, LineChannel, Result, UciOption};

/// Marker preceding the engine's name.
const ID_NAME: &str = "id name ";

/// Marker preceding the engine's author(s).
const ID_AUTHOR: &str = "id author ";

/// Marker preceding an option declaration.
const OPTION: &str = "option ";

/// Sent by the engine once it has finished identifying itself.
pub(crate) const UCIOK: &str = "uciok";

/// Identity and capabilities of an engine, as reported during the `uci` handshake.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Metadata {
    /// Name of the engine, from `id name`. Empty if the engine never said.
    pub name: String,

    /// Author(s) of the engine, from `id author`. Empty if the engine never said.
    pub author: String,

    /// Every option the engine declared, in the order they were declared.
    pub options: Vec<UciOption>,

    /// Number of handshake lines that were ignored or only partially understood.
    pub unparsed: usize,
}

impl Metadata {
    /// Performs the `uci` handshake over `channel`, collecting the engine's identity and options.
    pub fn discover<C: LineChannel + ?Sized>(
        channel: &mut C,
        timeout: Option<Duration>,
    ) -> Result<Self> {
        channel::send(channel, &Command::Uci)?;
        let lines = read_until(channel, UCIOK, timeout)?;
        Ok(Self::from_lines(lines))
    }

    /// Builds [`Metadata`] from the engine's response to `uci`.
    ///
    /// Only the first `id name` and `id author` lines are used. Lines that are not understood are
    /// skipped and counted in [`Metadata::unparsed`].
    pub fn from_lines<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut meta = Self::default();
        let mut name = None;
        let mut author = None;

        for line in lines {
            let line = line.as_ref();

            if let Some(rest) = line.strip_prefix(ID_NAME) {
                name.get_or_insert_with(|| rest.to_string());
            } else if let Some(rest) = line.strip_prefix(ID_AUTHOR) {
                author.get_or_insert_with(|| rest.to_string());
            } else if let Some(decl) = line.strip_prefix(OPTION) {
                let (option, clean) = UciOption::parse_checked(decl);
                if !clean {
                    debug!("Malformed option declaration: {line:?}");
                    meta.unparsed += 1;
                }
                meta.options.push(option);
            } else if !line.starts_with(UCIOK) && !line.trim().is_empty() {
                debug!("Ignoring handshake line: {line:?}");
                meta.unparsed += 1;
            }
        }

        meta.name = name.unwrap_or_default();
        meta.author = author.unwrap_or_default();
        meta
    }

    /// Fetches the option called exactly `name`, if the engine declared one.
    pub fn option(&self, name: &str) -> Option<&UciOption> {
        self.options.iter().find(|opt| opt.name == name)
    }
}
