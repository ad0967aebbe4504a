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

use std::path::Path;
use std::path::PathBuf;

use jiff::civil::Date;

/// How dated log files and the alias are named inside the log directory.
///
/// A configured filename `app.log` yields dated files `app.2024-08-10.log` and the alias
/// `app.log`. A filename without extension yields `app.2024-08-10` and `app`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct FileNaming {
    dir: PathBuf,
    basename: String,
    extension: Option<String>,
}

impl FileNaming {
    pub(crate) fn new(dir: impl Into<PathBuf>, filename: &str) -> FileNaming {
        let (basename, extension) = match filename.rsplit_once('.') {
            Some((base, ext)) if !base.is_empty() && !ext.is_empty() => {
                (base.to_string(), Some(ext.to_string()))
            }
            _ => (filename.to_string(), None),
        };

        FileNaming {
            dir: dir.into(),
            basename,
            extension,
        }
    }

    pub(crate) fn dir(&self) -> &Path {
        &self.dir
    }

    pub(crate) fn dated_filename(&self, day: Date) -> String {
        match &self.extension {
            Some(ext) => format!("{}.{day}.{ext}", self.basename),
            None => format!("{}.{day}", self.basename),
        }
    }

    pub(crate) fn dated_path(&self, day: Date) -> PathBuf {
        self.dir.join(self.dated_filename(day))
    }

    pub(crate) fn alias_filename(&self) -> String {
        match &self.extension {
            Some(ext) => format!("{}.{ext}", self.basename),
            None => self.basename.clone(),
        }
    }

    pub(crate) fn alias_path(&self) -> PathBuf {
        self.dir.join(self.alias_filename())
    }

    /// Returns the day of a dated filename of this scheme, or `None` for any other name.
    pub(crate) fn parse_day(&self, filename: &str) -> Option<Date> {
        let rest = filename.strip_prefix(&self.basename)?.strip_prefix('.')?;
        let stamp = match &self.extension {
            Some(ext) => rest.strip_suffix(ext.as_str())?.strip_suffix('.')?,
            None => rest,
        };

        // only the canonical YYYY-MM-DD form counts
        if stamp.len() != 10 {
            return None;
        }
        stamp.parse::<Date>().ok()
    }
}

#[cfg(test)]
mod tests {
    use jiff::civil::date;

    use super::*;

    #[test]
    fn test_names_with_extension() {
        let naming = FileNaming::new("/var/log/app", "app.log");
        let day = date(2024, 8, 10);

        assert_eq!(naming.dated_filename(day), "app.2024-08-10.log");
        assert_eq!(
            naming.dated_path(day),
            PathBuf::from("/var/log/app/app.2024-08-10.log")
        );
        assert_eq!(naming.alias_filename(), "app.log");
        assert_eq!(naming.alias_path(), PathBuf::from("/var/log/app/app.log"));
    }

    #[test]
    fn test_names_without_extension() {
        let naming = FileNaming::new("logs", "server");
        let day = date(2024, 1, 2);

        assert_eq!(naming.dated_filename(day), "server.2024-01-02");
        assert_eq!(naming.alias_filename(), "server");
        assert_eq!(naming.parse_day("server.2024-01-02"), Some(day));
    }

    #[test]
    fn test_dotted_basename_splits_on_last_dot() {
        let naming = FileNaming::new("logs", "my.service.log");
        assert_eq!(
            naming.dated_filename(date(2024, 8, 10)),
            "my.service.2024-08-10.log"
        );

        let naming = FileNaming::new("logs", ".hidden");
        assert_eq!(naming.alias_filename(), ".hidden");
    }

    #[test]
    fn test_parse_day_rejects_foreign_names() {
        let naming = FileNaming::new("logs", "app.log");

        assert_eq!(naming.parse_day("app.2024-08-10.log"), Some(date(2024, 8, 10)));
        assert_eq!(naming.parse_day("app.log"), None);
        assert_eq!(naming.parse_day("app.2024-08-10.txt"), None);
        assert_eq!(naming.parse_day("other.2024-08-10.log"), None);
        assert_eq!(naming.parse_day("app.2024-13-40.log"), None);
        assert_eq!(naming.parse_day("app.2024-8-1.log"), None);
        assert_eq!(naming.parse_day("app.backup.log"), None);
        assert_eq!(naming.parse_day("app-2024-08-10.log"), None);
    }
}
