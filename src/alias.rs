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

//! The `base.ext` alias that always names the active dated file.
//!
//! On Unix the alias is a relative symlink. Elsewhere it is a small pointer file holding the
//! target filename.

use std::fs;
use std::io;
use std::path::Path;
use std::path::PathBuf;

use crate::Error;
use crate::ErrorKind;

/// Point the alias at `target`, a filename in the same directory.
///
/// An alias that already names `target` is left alone. Anything else at the alias path is
/// removed and relinked.
pub(crate) fn replace(alias: &Path, target: &str) -> Result<(), Error> {
    let existing = match fs::symlink_metadata(alias) {
        Ok(_) => Some(read(alias)),
        Err(err) if err.kind() == io::ErrorKind::NotFound => None,
        Err(err) => return Err(alias_error("failed to inspect log alias", alias, err)),
    };

    match existing {
        None => {}
        Some(Some(current)) if current.as_path() == Path::new(target) => return Ok(()),
        Some(_) => fs::remove_file(alias)
            .map_err(|err| alias_error("failed to remove stale log alias", alias, err))?,
    }

    link(target, alias).map_err(|err| alias_error("failed to create log alias", alias, err))
}

/// The target the alias currently names, if it is a readable alias.
pub(crate) fn read(alias: &Path) -> Option<PathBuf> {
    #[cfg(unix)]
    {
        fs::read_link(alias).ok()
    }

    #[cfg(not(unix))]
    {
        let meta = fs::symlink_metadata(alias).ok()?;
        if meta.file_type().is_symlink() {
            return fs::read_link(alias).ok();
        }
        let content = fs::read_to_string(alias).ok()?;
        Some(PathBuf::from(content.trim_end()))
    }
}

#[cfg(unix)]
fn link(target: &str, alias: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(target, alias)
}

#[cfg(not(unix))]
fn link(target: &str, alias: &Path) -> io::Result<()> {
    fs::write(alias, target)
}

fn alias_error(message: &'static str, alias: &Path, err: io::Error) -> Error {
    Error::new(ErrorKind::Io, message)
        .with_context("alias", alias.display())
        .with_source(err)
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn test_create_then_unchanged_then_repoint() {
        let temp_dir = TempDir::new().expect("failed to create a temporary directory");
        let alias = temp_dir.path().join("app.log");
        fs::write(temp_dir.path().join("app.2024-08-10.log"), b"day one\n").unwrap();
        fs::write(temp_dir.path().join("app.2024-08-11.log"), b"day two\n").unwrap();

        replace(&alias, "app.2024-08-10.log").unwrap();
        assert_eq!(read(&alias), Some(PathBuf::from("app.2024-08-10.log")));
        replace(&alias, "app.2024-08-10.log").unwrap();
        assert_eq!(read(&alias), Some(PathBuf::from("app.2024-08-10.log")));
        replace(&alias, "app.2024-08-11.log").unwrap();
        assert_eq!(read(&alias), Some(PathBuf::from("app.2024-08-11.log")));
    }

    #[cfg(unix)]
    #[test]
    fn test_alias_resolves_to_target_content() {
        let temp_dir = TempDir::new().expect("failed to create a temporary directory");
        let alias = temp_dir.path().join("app.log");
        fs::write(temp_dir.path().join("app.2024-08-10.log"), b"hello\n").unwrap();

        replace(&alias, "app.2024-08-10.log").unwrap();
        assert_eq!(fs::read_to_string(&alias).unwrap(), "hello\n");
        assert_eq!(
            fs::canonicalize(&alias).unwrap(),
            fs::canonicalize(temp_dir.path().join("app.2024-08-10.log")).unwrap()
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_regular_file_at_alias_is_replaced() {
        let temp_dir = TempDir::new().expect("failed to create a temporary directory");
        let alias = temp_dir.path().join("app.log");
        fs::write(&alias, b"left over from an older layout").unwrap();

        replace(&alias, "app.2024-08-10.log").unwrap();
        assert!(fs::symlink_metadata(&alias).unwrap().file_type().is_symlink());
    }

    #[cfg(unix)]
    #[test]
    fn test_dangling_alias_is_repointed() {
        let temp_dir = TempDir::new().expect("failed to create a temporary directory");
        let alias = temp_dir.path().join("app.log");
        std::os::unix::fs::symlink("app.2020-01-01.log", &alias).unwrap();

        replace(&alias, "app.2024-08-10.log").unwrap();
        assert_eq!(read(&alias), Some(PathBuf::from("app.2024-08-10.log")));
    }
}
