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

use std::fmt;
use std::fmt::Write;
use std::sync::Arc;

use crate::Error;
use crate::layout::Layout;
use crate::layout::TimestampFormat;
use crate::record::Payload;
use crate::record::Record;

/// Decorates a level name, typically with terminal colors.
#[derive(Clone)]
pub struct Colorize(Arc<dyn Fn(&str) -> String + Send + Sync>);

impl Colorize {
    /// Create a new colorizer from a function.
    pub fn new(f: impl Fn(&str) -> String + Send + Sync + 'static) -> Self {
        Colorize(Arc::new(f))
    }

    /// Decorate the level.
    pub fn colorize(&self, level: &str) -> String {
        (self.0)(level)
    }
}

impl fmt::Debug for Colorize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Colorize(..)")
    }
}

/// A layout that formats each record as a plain text line.
///
/// Output format:
///
/// ```text
/// Aug 10 2024 17:12:52 - info: hello
/// ```
///
/// The timestamp prefix is only present when enabled. Metadata, when present, is appended as a
/// JSON object.
///
/// # Examples
///
/// ```
/// use dayroll::layout::TextLayout;
///
/// let text_layout = TextLayout::default().timestamp(true);
/// ```
#[derive(Default, Debug, Clone)]
pub struct TextLayout {
    timestamp: TimestampFormat,
    colorize: Option<Colorize>,
}

impl TextLayout {
    /// Sets how lines are timestamped. Defaults to no timestamp.
    pub fn timestamp(mut self, timestamp: impl Into<TimestampFormat>) -> Self {
        self.timestamp = timestamp.into();
        self
    }

    /// Sets the level colorizer.
    pub fn colorize(mut self, colorize: impl Into<Colorize>) -> Self {
        self.colorize = Some(colorize.into());
        self
    }

    /// Removes the level colorizer.
    pub fn no_color(mut self) -> Self {
        self.colorize = None;
        self
    }
}

impl Layout for TextLayout {
    fn format(&self, record: &Record) -> Result<Vec<u8>, Error> {
        let mut text = String::new();

        // SAFETY: write to a string always succeeds
        if let Some(time) = self.timestamp.render() {
            write!(&mut text, "{time} - ").unwrap();
        }

        match &self.colorize {
            Some(colorize) => text.push_str(&colorize.colorize(record.level())),
            None => text.push_str(record.level()),
        }
        text.push_str(": ");

        match record.payload() {
            Payload::Text(message) => text.push_str(message),
            Payload::Binary(bytes) => text.push_str(&String::from_utf8_lossy(bytes)),
        }

        if let Some(metadata) = record.metadata() {
            let metadata = serde_json::to_string(metadata).map_err(Error::from_json_error)?;
            write!(&mut text, " {metadata}").unwrap();
        }

        Ok(text.into_bytes())
    }
}
