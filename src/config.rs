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

//! Sink options loaded from configuration files.

use std::num::NonZeroUsize;
use std::path::PathBuf;

use jiff::tz::TimeZone;
use serde::Deserialize;

use crate::Error;
use crate::ErrorKind;
use crate::Sink;
use crate::SinkBuilder;

/// Serializable sink options.
///
/// Every field is optional and defaults like the matching [`SinkBuilder`] method.
///
/// # Examples
///
/// ```
/// use dayroll::SinkConfig;
///
/// let config: SinkConfig = serde_json::from_str(
///     r#"{"dirname": "logs", "filename": "app.log", "json": false, "max_files": 7}"#,
/// )
/// .unwrap();
/// let builder = config.into_builder().unwrap();
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SinkConfig {
    /// The log file name; may include its directory.
    pub filename: Option<PathBuf>,
    /// The directory of the log files.
    #[serde(alias = "dirname")]
    pub directory: Option<PathBuf>,
    /// JSON output when `true` or unset, text otherwise.
    pub json: Option<bool>,
    /// Number of dated files to keep.
    #[serde(alias = "max_files")]
    pub retention_count: Option<NonZeroUsize>,
    /// Stamp lines with the default timestamp format.
    pub timestamp: bool,
    /// Check the log directory is writable. Enabled when unset.
    pub check_permissions: Option<bool>,
    /// Drop every record.
    pub silent: bool,
    /// IANA name of the time zone whose midnight starts a new file.
    pub time_zone: Option<String>,
    /// Bound on lines buffered while a file is being opened.
    pub pending_lines_limit: Option<NonZeroUsize>,
}

impl SinkConfig {
    /// Convert into a [`SinkBuilder`].
    ///
    /// # Errors
    ///
    /// Return an error if the time zone is unknown.
    pub fn into_builder(self) -> Result<SinkBuilder, Error> {
        let mut builder = SinkBuilder::new()
            .json(self.json.unwrap_or(true))
            .timestamp(self.timestamp)
            .check_permissions(self.check_permissions.unwrap_or(true))
            .silent(self.silent);

        if let Some(filename) = self.filename {
            builder = builder.filename(filename);
        }
        if let Some(directory) = self.directory {
            builder = builder.directory(directory);
        }
        if let Some(n) = self.retention_count {
            builder = builder.retention_count(n);
        }
        if let Some(limit) = self.pending_lines_limit {
            builder = builder.pending_lines_limit(limit);
        }
        if let Some(name) = self.time_zone {
            builder = builder.time_zone(time_zone(&name)?);
        }

        Ok(builder)
    }

    /// Build a [`Sink`] from these options.
    pub fn build(self) -> Result<Sink, Error> {
        self.into_builder()?.build()
    }
}

fn time_zone(name: &str) -> Result<TimeZone, Error> {
    if name.eq_ignore_ascii_case("UTC") {
        return Ok(TimeZone::UTC);
    }

    TimeZone::get(name).map_err(|err| {
        Error::new(ErrorKind::ConfigInvalid, "unknown time zone")
            .with_context("time_zone", name)
            .with_source(err)
    })
}
