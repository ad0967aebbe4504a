// Copyright 2024 FastLabs Developers
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::num::NonZeroUsize;
use std::path::Path;
use std::path::PathBuf;

use crossbeam_channel::Receiver;
use jiff::tz::TimeZone;

use crate::DEFAULT_RETENTION_COUNT;
use crate::DefaultTrap;
use crate::Error;
use crate::ErrorKind;
use crate::Trap;
use crate::clock::Clock;
use crate::layout::Colorize;
use crate::layout::JsonLayout;
use crate::layout::Layout;
use crate::layout::TextLayout;
use crate::layout::TimestampFormat;
use crate::naming::FileNaming;
use crate::permission::ModeBits;
use crate::permission::WriteAccess;
use crate::record::Record;
use crate::retention::RetentionPolicy;
use crate::rotator::FileRotator;
use crate::rotator::RotationEvent;
use crate::rotator::RotatorOptions;

const DEFAULT_FILENAME: &str = "dayroll.log";
const DEFAULT_THREAD_NAME: &str = "dayroll-opener";

/// A builder to configure and create a [`Sink`].
#[derive(Debug)]
pub struct SinkBuilder {
    filename: Option<PathBuf>,
    directory: Option<PathBuf>,
    json: bool,
    layout: Option<Box<dyn Layout>>,
    colorize: Option<Colorize>,
    timestamp: TimestampFormat,
    retention_count: NonZeroUsize,
    write_access: Option<Box<dyn WriteAccess>>,
    silent: bool,
    time_zone: TimeZone,
    pending_lines_limit: Option<NonZeroUsize>,
    thread_name: String,
    trap: Box<dyn Trap>,
    clock: Clock,
}

impl Default for SinkBuilder {
    fn default() -> Self {
        Self {
            filename: None,
            directory: None,
            json: true,
            layout: None,
            colorize: None,
            timestamp: TimestampFormat::Off,
            retention_count: DEFAULT_RETENTION_COUNT,
            write_access: Some(Box::new(ModeBits::default())),
            silent: false,
            time_zone: TimeZone::UTC,
            pending_lines_limit: None,
            thread_name: DEFAULT_THREAD_NAME.to_string(),
            trap: Box::new(DefaultTrap::default()),
            clock: Clock::DefaultClock,
        }
    }
}

impl SinkBuilder {
    /// Create a new sink builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the log file name, such as `app.log`.
    ///
    /// Dated files are named `app.<YYYY-MM-DD>.log` and `app.log` becomes the alias of the
    /// newest one. The name may carry its own directory, in which case [`directory`] must be
    /// unset or the same directory.
    ///
    /// [`directory`]: SinkBuilder::directory
    pub fn filename(mut self, filename: impl Into<PathBuf>) -> Self {
        self.filename = Some(filename.into());
        self
    }

    /// Set the directory that holds the log files.
    ///
    /// When no filename is set, files are named after `dayroll.log`.
    pub fn directory(mut self, directory: impl Into<PathBuf>) -> Self {
        self.directory = Some(directory.into());
        self
    }

    /// Write each record as a JSON object (the default), or as a plain text line.
    pub fn json(mut self, json: bool) -> Self {
        self.json = json;
        self
    }

    /// Use a custom layout instead of the bundled JSON and text layouts.
    ///
    /// The `json`, `colorize` and `timestamp` options do not apply to a custom layout.
    pub fn layout(mut self, layout: impl Into<Box<dyn Layout>>) -> Self {
        self.layout = Some(layout.into());
        self
    }

    /// Decorate level names in text mode.
    ///
    /// # Examples
    ///
    /// ```
    /// use dayroll::SinkBuilder;
    /// use dayroll::layout::Colorize;
    ///
    /// let builder = SinkBuilder::new()
    ///     .directory("logs")
    ///     .json(false)
    ///     .colorize(Colorize::new(|level| level.to_uppercase()));
    /// ```
    pub fn colorize(mut self, colorize: impl Into<Colorize>) -> Self {
        self.colorize = Some(colorize.into());
        self
    }

    /// Set how lines are timestamped. Defaults to no timestamp.
    ///
    /// `true` selects the default format, like `Aug 10 2024 17:12:52`.
    pub fn timestamp(mut self, timestamp: impl Into<TimestampFormat>) -> Self {
        self.timestamp = timestamp.into();
        self
    }

    /// Set the number of dated files to keep, today's included.
    ///
    /// Default to [`DEFAULT_RETENTION_COUNT`].
    pub fn retention_count(mut self, n: NonZeroUsize) -> Self {
        self.retention_count = n;
        self
    }

    /// Enable or disable the write permission check on the log directory.
    ///
    /// Enabled by default with [`ModeBits`].
    pub fn check_permissions(mut self, check: bool) -> Self {
        self.write_access = if check {
            Some(Box::new(ModeBits::default()))
        } else {
            None
        };
        self
    }

    /// Replace the write permission check.
    ///
    /// # Examples
    ///
    /// ```
    /// use dayroll::SinkBuilder;
    /// use dayroll::permission::SkipCheck;
    ///
    /// let builder = SinkBuilder::new().directory("logs").write_access(SkipCheck::default());
    /// ```
    pub fn write_access(mut self, write_access: impl Into<Box<dyn WriteAccess>>) -> Self {
        self.write_access = Some(write_access.into());
        self
    }

    /// Accept and drop every record without touching the file system.
    pub fn silent(mut self, silent: bool) -> Self {
        self.silent = silent;
        self
    }

    /// Set the time zone whose midnight starts a new file. Default to UTC.
    pub fn time_zone(mut self, time_zone: TimeZone) -> Self {
        self.time_zone = time_zone;
        self
    }

    /// Bound the number of lines buffered while a file is being opened.
    ///
    /// Once the bound is reached, appends block until the file is open. Unbounded by default.
    pub fn pending_lines_limit(mut self, limit: NonZeroUsize) -> Self {
        self.pending_lines_limit = Some(limit);
        self
    }

    /// Set the name of the thread that opens files. Default to `dayroll-opener`.
    pub fn thread_name(mut self, name: impl Into<String>) -> Self {
        self.thread_name = name.into();
        self
    }

    /// Set the trap for errors that happen in the background.
    ///
    /// Default to [`DefaultTrap`].
    pub fn trap(mut self, trap: impl Into<Box<dyn Trap>>) -> Self {
        self.trap = trap.into();
        self
    }

    #[cfg(test)]
    pub(crate) fn clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Build the [`Sink`].
    ///
    /// # Errors
    ///
    /// Return an error if either:
    ///
    /// * Neither a filename nor a directory is set.
    /// * The filename names a directory different from the configured one.
    /// * The permission check rejects the log directory.
    /// * The opener thread cannot be spawned.
    pub fn build(self) -> Result<Sink, Error> {
        let SinkBuilder {
            filename,
            directory,
            json,
            layout,
            colorize,
            timestamp,
            retention_count,
            write_access,
            silent,
            time_zone,
            pending_lines_limit,
            thread_name,
            trap,
            clock,
        } = self;

        let (dir, filename) = resolve_location(filename, directory)?;
        if let Some(write_access) = write_access {
            write_access.check(nearest_existing(&dir))?;
        }

        let layout = match layout {
            Some(layout) => layout,
            None if json => Box::new(JsonLayout::default().timestamp(timestamp)),
            None => {
                let text = TextLayout::default().timestamp(timestamp);
                match colorize {
                    Some(colorize) => Box::new(text.colorize(colorize)),
                    None => Box::new(text),
                }
            }
        };

        let rotator = FileRotator::new(RotatorOptions {
            naming: FileNaming::new(dir, &filename),
            retention: RetentionPolicy::new(retention_count),
            time_zone,
            clock,
            trap,
            pending_lines_limit,
            thread_name,
        })?;

        Ok(Sink {
            rotator,
            layout,
            silent,
        })
    }
}

/// Split the configured location into the log directory and the bare filename.
fn resolve_location(
    filename: Option<PathBuf>,
    directory: Option<PathBuf>,
) -> Result<(PathBuf, String), Error> {
    let Some(filename) = filename else {
        let directory = directory.ok_or_else(|| {
            Error::new(
                ErrorKind::ConfigInvalid,
                "either a filename or a directory must be set",
            )
        })?;
        return Ok((directory, DEFAULT_FILENAME.to_string()));
    };

    let name = filename
        .file_name()
        .and_then(|name| name.to_str())
        .filter(|name| !name.is_empty())
        .ok_or_else(|| {
            Error::new(ErrorKind::ConfigInvalid, "filename must name a UTF-8 file")
                .with_context("filename", filename.display())
        })?
        .to_string();

    let parent = filename
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty());
    let dir = match (parent, directory) {
        (Some(parent), Some(directory)) if parent != directory => {
            return Err(Error::new(
                ErrorKind::ConfigInvalid,
                "filename and directory name different directories",
            )
            .with_context("filename", filename.display())
            .with_context("directory", directory.display()));
        }
        (Some(parent), _) => parent.to_path_buf(),
        (None, Some(directory)) => directory,
        (None, None) => PathBuf::from("."),
    };

    Ok((dir, name))
}

/// The log directory is created on first use, so check the closest ancestor that exists.
fn nearest_existing(dir: &Path) -> &Path {
    dir.ancestors()
        .find(|ancestor| !ancestor.as_os_str().is_empty() && ancestor.exists())
        .unwrap_or(Path::new("."))
}

/// A log sink that writes records to one file per calendar day.
///
/// Dropping the sink closes it.
#[derive(Debug)]
pub struct Sink {
    rotator: FileRotator,
    layout: Box<dyn Layout>,
    silent: bool,
}

impl Sink {
    /// Create a new [`SinkBuilder`].
    pub fn builder() -> SinkBuilder {
        SinkBuilder::default()
    }

    /// Format `record` and append it to today's file.
    ///
    /// The line is handed off once this returns; it reaches the file immediately or as soon as
    /// a pending rotation completes.
    ///
    /// # Errors
    ///
    /// Return an error if the record cannot be formatted, the line cannot be written, the
    /// previous attempt to open today's file failed, or the sink is closed.
    pub fn append(&self, record: &Record) -> Result<(), Error> {
        if self.silent {
            return Ok(());
        }

        let mut line = self.layout.format(record)?;
        line.push(b'\n');
        self.rotator.append(line)
    }

    /// Like [`append`](Sink::append), reporting the outcome to `callback`.
    pub fn write<F>(&self, record: &Record, callback: F)
    where
        F: FnOnce(Result<(), Error>),
    {
        callback(self.append(record));
    }

    /// Return whether today's file is open, and start opening it if not.
    ///
    /// A silent sink never opens a file and always reports `true`.
    pub fn ensure_open(&self) -> bool {
        if self.silent {
            return true;
        }
        self.rotator.ensure_open()
    }

    /// Wait for any pending rotation and flush today's file.
    pub fn flush(&self) -> Result<(), Error> {
        if self.silent {
            return Ok(());
        }
        self.rotator.flush()
    }

    /// Flush and release the active file and stop the opener thread.
    ///
    /// Later appends fail with [`ErrorKind::Closed`]. Closing twice is a no-op.
    pub fn close(&self) -> Result<(), Error> {
        self.rotator.close()
    }

    /// Subscribe to rotation events.
    pub fn subscribe(&self) -> Receiver<RotationEvent> {
        self.rotator.subscribe()
    }

    /// The path of the file currently written to, if one is open.
    pub fn current_path(&self) -> Option<PathBuf> {
        self.rotator.current_path()
    }

    /// The path of the alias that points at the newest dated file.
    pub fn alias_path(&self) -> PathBuf {
        self.rotator.alias_path()
    }
}
