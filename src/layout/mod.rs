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

//! Layouts for formatting log records into lines.

use std::fmt;
use std::sync::Arc;

use jiff::Zoned;

use crate::Error;
use crate::record::Record;

mod json;
mod text;

pub use self::json::JsonLayout;
pub use self::text::Colorize;
pub use self::text::TextLayout;

/// A layout for formatting log records.
///
/// The returned bytes must not carry a trailing line terminator; the sink appends it.
pub trait Layout: fmt::Debug + Send + Sync + 'static {
    /// Formats a log record.
    fn format(&self, record: &Record) -> Result<Vec<u8>, Error>;
}

impl<T: Layout> From<T> for Box<dyn Layout> {
    fn from(value: T) -> Self {
        Box::new(value)
    }
}

/// How a layout stamps time onto each line.
#[derive(Clone, Default)]
pub enum TimestampFormat {
    /// No timestamp.
    #[default]
    Off,
    /// Local time, formatted like `Aug 10 2024 17:12:52`.
    Default,
    /// A caller-provided timestamp.
    Custom(Arc<dyn Fn() -> String + Send + Sync>),
}

impl TimestampFormat {
    /// Create a [`TimestampFormat::Custom`] from a function.
    pub fn custom(f: impl Fn() -> String + Send + Sync + 'static) -> Self {
        TimestampFormat::Custom(Arc::new(f))
    }

    pub(crate) fn render(&self) -> Option<String> {
        match self {
            TimestampFormat::Off => None,
            TimestampFormat::Default => Some(Zoned::now().strftime("%b %d %Y %H:%M:%S").to_string()),
            TimestampFormat::Custom(f) => Some(f()),
        }
    }
}

impl From<bool> for TimestampFormat {
    fn from(enabled: bool) -> Self {
        if enabled {
            TimestampFormat::Default
        } else {
            TimestampFormat::Off
        }
    }
}

impl fmt::Debug for TimestampFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimestampFormat::Off => f.write_str("Off"),
            TimestampFormat::Default => f.write_str("Default"),
            TimestampFormat::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}
