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

//! Checks that the log directory is writable before a sink starts.

use std::fmt;
use std::fs;
use std::path::Path;

use crate::Error;
use crate::ErrorKind;

/// A capability check run against the log directory when a sink is built.
pub trait WriteAccess: fmt::Debug + Send + Sync + 'static {
    /// Return an error if the process cannot create files in `dir`.
    fn check(&self, dir: &Path) -> Result<(), Error>;
}

impl<T: WriteAccess> From<T> for Box<dyn WriteAccess> {
    fn from(value: T) -> Self {
        Box::new(value)
    }
}

/// Evaluates the directory's permission bits against the process identity.
///
/// On Unix the owner, group and other write bits are checked against the real uid and gid. On
/// other platforms only the read-only attribute is checked.
#[derive(Debug, Default, Clone, Copy)]
#[non_exhaustive]
pub struct ModeBits {}

/// Accepts any directory. Use it in sandboxes where the mode bits say nothing useful.
#[derive(Debug, Default, Clone, Copy)]
#[non_exhaustive]
pub struct SkipCheck {}

impl WriteAccess for SkipCheck {
    fn check(&self, _: &Path) -> Result<(), Error> {
        Ok(())
    }
}

impl WriteAccess for ModeBits {
    fn check(&self, dir: &Path) -> Result<(), Error> {
        let metadata = fs::metadata(dir).map_err(|err| {
            Error::new(ErrorKind::Io, "failed to inspect log directory")
                .with_context("dir", dir.display())
                .with_source(err)
        })?;

        if !metadata.is_dir() {
            return Err(Error::new(ErrorKind::ConfigInvalid, "log location is not a directory")
                .with_context("dir", dir.display()));
        }

        if writable(&metadata) {
            Ok(())
        } else {
            Err(
                Error::new(ErrorKind::PermissionDenied, "cannot create logs in directory")
                    .with_context("dir", dir.display()),
            )
        }
    }
}

#[cfg(unix)]
fn writable(metadata: &fs::Metadata) -> bool {
    use std::os::unix::fs::MetadataExt;

    // SAFETY: getuid and getgid are always successful and have no side effects.
    let (uid, gid) = unsafe { (libc::getuid(), libc::getgid()) };
    can_write(
        metadata.uid() == uid,
        metadata.gid() == gid,
        metadata.mode(),
    )
}

#[cfg(not(unix))]
fn writable(metadata: &fs::Metadata) -> bool {
    !metadata.permissions().readonly()
}

/// Whether any write bit applies to a process with the given relationship to the directory.
#[cfg_attr(not(unix), allow(dead_code))]
fn can_write(owner: bool, in_group: bool, mode: u32) -> bool {
    (owner && mode & 0o200 != 0) || (in_group && mode & 0o020 != 0) || mode & 0o002 != 0
}
