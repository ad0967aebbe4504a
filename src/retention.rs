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

use std::collections::HashSet;
use std::fs;
use std::num::NonZeroUsize;
use std::path::PathBuf;

use jiff::civil::Date;

use crate::Error;
use crate::ErrorKind;
use crate::Trap;
use crate::naming::FileNaming;

/// Default number of dated files to keep.
pub const DEFAULT_RETENTION_COUNT: NonZeroUsize = NonZeroUsize::new(10).unwrap();

/// Keeps the most recent dated files and deletes the rest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct RetentionPolicy {
    retention_count: NonZeroUsize,
}

/// The outcome of one retention sweep.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub(crate) struct SweepReport {
    pub(crate) deleted: Vec<PathBuf>,
}

impl RetentionPolicy {
    pub(crate) fn new(retention_count: NonZeroUsize) -> RetentionPolicy {
        RetentionPolicy { retention_count }
    }

    /// The filenames that survive a sweep: one per day from `today` back.
    pub(crate) fn whitelist(&self, naming: &FileNaming, today: Date) -> HashSet<String> {
        std::iter::successors(Some(today), |day| day.yesterday().ok())
            .take(self.retention_count.get())
            .map(|day| naming.dated_filename(day))
            .collect()
    }

    /// Delete dated files of `naming` outside the retention window.
    ///
    /// Failures are reported to `trap`; the sweep keeps going.
    pub(crate) fn sweep(&self, naming: &FileNaming, today: Date, trap: &dyn Trap) -> SweepReport {
        let mut report = SweepReport::default();
        let whitelist = self.whitelist(naming, today);

        let read_dir = match fs::read_dir(naming.dir()) {
            Ok(read_dir) => read_dir,
            Err(err) => {
                let err = Error::new(ErrorKind::Io, "failed to read log dir for cleanup")
                    .with_context("dir", naming.dir().display())
                    .with_source(err);
                trap.trap(&err);
                return report;
            }
        };

        for entry in read_dir {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    let err = Error::new(ErrorKind::Io, "failed to read log dir entry")
                        .with_context("dir", naming.dir().display())
                        .with_source(err);
                    trap.trap(&err);
                    continue;
                }
            };

            // the sink only creates regular files; never delete a dir or symlink.
            match entry.file_type() {
                Ok(file_type) if file_type.is_file() => {}
                _ => continue,
            }

            let filename = entry.file_name();
            // if the filename is not a UTF-8 string, skip it.
            let Some(filename) = filename.to_str() else {
                continue;
            };
            if naming.parse_day(filename).is_none() || whitelist.contains(filename) {
                continue;
            }

            let path = entry.path();
            match fs::remove_file(&path) {
                Ok(()) => report.deleted.push(path),
                Err(err) => {
                    let err = Error::new(ErrorKind::Io, "failed to remove old log file")
                        .with_context("path", path.display())
                        .with_source(err);
                    trap.trap(&err);
                }
            }
        }

        report
    }
}
