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

//! Daily file rotation.
//!
//! A [`FileRotator`] owns one [`RotationState`] behind a mutex. Appends evaluate and write under
//! that lock, so lines reach the file in call order. When the active file belongs to an earlier
//! day (or no file is open yet), the state moves to `Opening` and the opener worker does the
//! blocking work: creating the dated file, repointing the alias, and sweeping aged files. Lines
//! appended meanwhile are buffered and drained into the new file when the worker installs it.

use std::fs;
use std::fs::File;
use std::fs::OpenOptions;
use std::io;
use std::io::Write;
use std::mem;
use std::num::NonZeroUsize;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::Condvar;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::thread::JoinHandle;

use crossbeam_channel::Receiver;
use crossbeam_channel::Sender;
use crossbeam_channel::unbounded;
use jiff::civil::Date;
use jiff::tz::TimeZone;

pub use self::event::RotationEvent;
use self::event::Subscribers;
use self::worker::Command;
use self::worker::Worker;
use crate::Error;
use crate::ErrorKind;
use crate::Trap;
use crate::alias;
use crate::clock::Clock;
use crate::naming::FileNaming;
use crate::retention::RetentionPolicy;

mod event;
mod worker;

#[derive(Debug)]
pub(crate) struct RotatorOptions {
    pub(crate) naming: FileNaming,
    pub(crate) retention: RetentionPolicy,
    pub(crate) time_zone: TimeZone,
    pub(crate) clock: Clock,
    pub(crate) trap: Box<dyn Trap>,
    pub(crate) pending_lines_limit: Option<NonZeroUsize>,
    pub(crate) thread_name: String,
}

/// Lines kept across failed opens when no `pending_lines_limit` is set.
const FAILED_OPEN_BACKLOG_LIMIT: usize = 1024;

#[derive(Debug)]
enum RotationState {
    /// No file installed. After a failed open the backlog stays here, next to its error.
    Closed {
        backlog: Backlog,
        failure: Option<Error>,
    },
    /// The worker is opening the file of `day`.
    Opening { day: Date, backlog: Backlog },
    Ready(ActiveFile),
    Shutdown,
}

#[derive(Debug)]
struct ActiveFile {
    day: Date,
    path: PathBuf,
    file: File,
}

impl ActiveFile {
    fn write_line(&mut self, line: &[u8]) -> Result<(), Error> {
        self.file.write_all(line).map_err(|err| {
            Error::new(ErrorKind::Io, "failed to write log file")
                .with_context("path", self.path.display())
                .with_source(err)
        })
    }

    fn flush(&mut self) -> Result<(), Error> {
        self.file.flush().map_err(|err| {
            Error::new(ErrorKind::Io, "failed to flush log file")
                .with_context("path", self.path.display())
                .with_source(err)
        })
    }
}

/// Lines waiting for a file, in arrival order.
#[derive(Debug, Default)]
struct Backlog {
    lines: Vec<Vec<u8>>,
    /// Lines turned away since an open failed.
    dropped: usize,
    /// Set once an open failed. Appends then never block; past the limit they are dropped.
    failed: bool,
}

enum Admission {
    Push,
    Wait,
    Drop,
}

enum Readiness {
    Ready,
    /// An open is in flight. Carries the error of the previous failed open, if this call
    /// started the retry.
    Opening(Option<Error>),
}

#[derive(Debug)]
struct Shared {
    state: Mutex<RotationState>,
    changed: Condvar,
    naming: FileNaming,
    retention: RetentionPolicy,
    time_zone: TimeZone,
    clock: Clock,
    trap: Box<dyn Trap>,
    pending_lines_limit: Option<NonZeroUsize>,
    events: Subscribers,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, RotationState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn wait<'a>(&self, state: MutexGuard<'a, RotationState>) -> MutexGuard<'a, RotationState> {
        self.changed.wait(state).unwrap_or_else(|e| e.into_inner())
    }

    /// Block until no open is in flight.
    fn settle<'a>(&self, mut state: MutexGuard<'a, RotationState>) -> MutexGuard<'a, RotationState> {
        while matches!(*state, RotationState::Opening { .. }) {
            state = self.wait(state);
        }
        state
    }

    fn today(&self) -> Date {
        self.clock.today(&self.time_zone)
    }

    fn admission(&self, backlog: &Backlog) -> Admission {
        let len = backlog.lines.len();
        if backlog.failed {
            let limit = self
                .pending_lines_limit
                .map_or(FAILED_OPEN_BACKLOG_LIMIT, NonZeroUsize::get);
            if len >= limit {
                Admission::Drop
            } else {
                Admission::Push
            }
        } else if self.pending_lines_limit.is_some_and(|limit| len >= limit.get()) {
            Admission::Wait
        } else {
            Admission::Push
        }
    }

    /// Open the file of `day`, repoint the alias and sweep aged files. Runs on the worker.
    fn open_day(&self, day: Date) -> Result<ActiveFile, Error> {
        let dir = self.naming.dir();
        fs::create_dir_all(dir).map_err(|err| {
            Error::new(ErrorKind::Io, "failed to create log directory")
                .with_context("dir", dir.display())
                .with_source(err)
        })?;

        let path = self.naming.dated_path(day);
        let file = open_dated_file(&path)?;

        let target = self.naming.dated_filename(day);
        if let Err(err) = alias::replace(&self.naming.alias_path(), &target) {
            self.trap.trap(&err);
        }

        let report = self.retention.sweep(&self.naming, day, self.trap.as_ref());
        if !report.deleted.is_empty() {
            self.events.emit(RotationEvent::Pruned(report.deleted));
        }

        Ok(ActiveFile { day, path, file })
    }

    /// Install the outcome of an open and release everything waiting on it.
    fn install(&self, day: Date, opened: Result<ActiveFile, Error>) {
        let mut state = self.lock();
        let mut backlog = match mem::replace(&mut *state, RotationState::Shutdown) {
            RotationState::Opening {
                day: opening,
                backlog,
            } if opening == day => backlog,
            other => {
                *state = other;
                return;
            }
        };

        match opened {
            Ok(mut active) => {
                if backlog.dropped > 0 {
                    let err = Error::new(
                        ErrorKind::Io,
                        "log lines dropped while the log file was unavailable",
                    )
                    .with_context("dropped", backlog.dropped);
                    self.trap.trap(&err);
                }
                flush_buffer(&mut active, backlog.lines, self.trap.as_ref());
                let path = active.path.clone();
                *state = RotationState::Ready(active);
                self.events.emit(RotationEvent::Flushed);
                self.events.emit(RotationEvent::Opened(path));
            }
            Err(failure) => {
                backlog.failed = true;
                *state = RotationState::Closed {
                    backlog,
                    failure: Some(failure),
                };
            }
        }

        drop(state);
        self.changed.notify_all();
    }
}

/// Write buffered lines to the new file in arrival order, then flush it.
fn flush_buffer(active: &mut ActiveFile, pending: Vec<Vec<u8>>, trap: &dyn Trap) {
    for line in pending {
        if let Err(err) = active.write_line(&line) {
            trap.trap(&err);
        }
    }
    if let Err(err) = active.flush() {
        trap.trap(&err);
    }
}

/// Append to the file if it exists, create it otherwise.
fn open_dated_file(path: &Path) -> Result<File, Error> {
    let open_error = |err: io::Error| {
        Error::new(ErrorKind::Io, "failed to open log file")
            .with_context("path", path.display())
            .with_source(err)
    };

    if path.try_exists().map_err(open_error)? {
        return OpenOptions::new()
            .append(true)
            .open(path)
            .map_err(open_error);
    }

    match OpenOptions::new().write(true).create_new(true).open(path) {
        // created by someone else in the meantime
        Err(err) if err.kind() == io::ErrorKind::AlreadyExists => OpenOptions::new()
            .append(true)
            .open(path)
            .map_err(open_error),
        opened => opened.map_err(open_error),
    }
}

/// Decides when to roll to a new dated file and owns the active file handle.
#[derive(Debug)]
pub(crate) struct FileRotator {
    shared: Arc<Shared>,
    opener: Sender<Command>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl FileRotator {
    pub(crate) fn new(options: RotatorOptions) -> Result<FileRotator, Error> {
        let RotatorOptions {
            naming,
            retention,
            time_zone,
            clock,
            trap,
            pending_lines_limit,
            thread_name,
        } = options;

        let shared = Arc::new(Shared {
            state: Mutex::new(RotationState::Closed {
                backlog: Backlog::default(),
                failure: None,
            }),
            changed: Condvar::new(),
            naming,
            retention,
            time_zone,
            clock,
            trap,
            pending_lines_limit,
            events: Subscribers::default(),
        });

        let (opener, receiver) = unbounded();
        let worker = Worker::new(shared.clone(), receiver).make_thread(thread_name)?;

        Ok(FileRotator {
            shared,
            opener,
            worker: Mutex::new(Some(worker)),
        })
    }

    /// Return whether today's file is installed. If not, start opening it unless an open is
    /// already in flight.
    pub(crate) fn ensure_open(&self) -> bool {
        let mut state = self.shared.lock();
        let today = self.shared.today();
        match self.arm(&mut state, today) {
            Ok(Readiness::Ready) => true,
            Ok(Readiness::Opening(failure)) => {
                if let Some(err) = failure {
                    self.shared.trap.trap(&err);
                }
                false
            }
            Err(_) => false,
        }
    }

    /// Move to `Opening` for `today` unless today's file is installed or an open is in flight.
    fn arm(&self, state: &mut RotationState, today: Date) -> Result<Readiness, Error> {
        let (backlog, failure) = match mem::replace(state, RotationState::Shutdown) {
            RotationState::Ready(active) if active.day == today => {
                *state = RotationState::Ready(active);
                return Ok(Readiness::Ready);
            }
            opening @ RotationState::Opening { .. } => {
                *state = opening;
                return Ok(Readiness::Opening(None));
            }
            RotationState::Shutdown => return Err(Error::closed()),
            RotationState::Ready(mut active) => {
                // the previous day's file takes no more writes
                if let Err(err) = active.flush() {
                    self.shared.trap.trap(&err);
                }
                (Backlog::default(), None)
            }
            RotationState::Closed { backlog, failure } => (backlog, failure),
        };

        // the worker cannot install before we release the lock
        if self.opener.send(Command::Open(today)).is_err() {
            *state = RotationState::Closed { backlog, failure };
            return Err(Error::new(ErrorKind::Closed, "log file opener has stopped"));
        }
        *state = RotationState::Opening {
            day: today,
            backlog,
        };
        Ok(Readiness::Opening(failure))
    }

    /// Write `line` to today's file, or buffer it while the file is being opened.
    ///
    /// Returns the error of a previous failed open when this call starts the retry; the line
    /// itself is still buffered in that case. While opens keep failing, lines past the backlog
    /// limit are dropped and reported instead of blocking.
    pub(crate) fn append(&self, line: Vec<u8>) -> Result<(), Error> {
        let mut state = self.shared.lock();
        let mut failure = None;

        loop {
            let today = self.shared.today();
            if let Readiness::Opening(Some(err)) = self.arm(&mut state, today)? {
                failure = Some(err);
            }

            match &mut *state {
                RotationState::Ready(active) => {
                    active.write_line(&line)?;
                    return failure.map_or(Ok(()), Err);
                }
                RotationState::Opening { backlog, .. } => match self.shared.admission(backlog) {
                    Admission::Push => {
                        backlog.lines.push(line);
                        return failure.map_or(Ok(()), Err);
                    }
                    Admission::Drop => {
                        backlog.dropped += 1;
                        let err = failure.unwrap_or_else(|| {
                            Error::new(ErrorKind::Io, "log file is unavailable")
                        });
                        return Err(err.with_context("dropped", backlog.dropped));
                    }
                    Admission::Wait => {}
                },
                RotationState::Closed { .. } | RotationState::Shutdown => {
                    return Err(Error::closed());
                }
            }

            // the backlog is full; wait for the open to land
            state = self.shared.wait(state);
        }
    }

    /// Wait for any in-flight open, then flush the active file.
    pub(crate) fn flush(&self) -> Result<(), Error> {
        let mut state = self.shared.settle(self.shared.lock());
        match &mut *state {
            RotationState::Ready(active) => {
                active.flush()?;
                self.shared.events.emit(RotationEvent::Flushed);
                Ok(())
            }
            RotationState::Closed { failure, .. } => failure.take().map_or(Ok(()), Err),
            RotationState::Opening { .. } => Ok(()),
            RotationState::Shutdown => Err(Error::closed()),
        }
    }

    /// Wait for any in-flight open, release the active file and stop the worker.
    ///
    /// Closing twice is a no-op.
    pub(crate) fn close(&self) -> Result<(), Error> {
        let mut state = self.shared.settle(self.shared.lock());
        let result = match mem::replace(&mut *state, RotationState::Shutdown) {
            RotationState::Shutdown => return Ok(()),
            RotationState::Ready(mut active) => active.flush(),
            RotationState::Closed { backlog, failure } => match failure {
                Some(err) => Err(err),
                None if backlog.lines.is_empty() && backlog.dropped == 0 => Ok(()),
                None => Err(Error::new(
                    ErrorKind::Io,
                    "log file was never opened; pending lines dropped",
                )
                .with_context("lines", backlog.lines.len() + backlog.dropped)),
            },
            RotationState::Opening { .. } => Ok(()),
        };
        drop(state);
        self.shared.changed.notify_all();

        let _ = self.opener.send(Command::Shutdown);
        let worker = self
            .worker
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take();
        if let Some(handle) = worker {
            if handle.join().is_err() {
                let err = Error::new(ErrorKind::Io, "log file opener thread panicked");
                self.shared.trap.trap(&err);
            }
        }

        self.shared.events.emit(RotationEvent::Closed);
        result
    }

    pub(crate) fn subscribe(&self) -> Receiver<RotationEvent> {
        self.shared.events.subscribe()
    }

    pub(crate) fn current_path(&self) -> Option<PathBuf> {
        match &*self.shared.lock() {
            RotationState::Ready(active) => Some(active.path.clone()),
            _ => None,
        }
    }

    pub(crate) fn alias_path(&self) -> PathBuf {
        self.shared.naming.alias_path()
    }
}

impl Drop for FileRotator {
    fn drop(&mut self) {
        if let Err(err) = self.close() {
            self.shared.trap.trap(&err);
        }
    }
}
