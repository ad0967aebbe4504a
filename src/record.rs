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

//! Log records handed to a sink.

use std::borrow::Cow;

use serde_json::Map;
use serde_json::Value;

/// The message body of a [`Record`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Payload {
    /// A text message.
    Text(Cow<'static, str>),
    /// A binary message. JSON output encodes it as base64.
    Binary(Vec<u8>),
}

impl From<&'static str> for Payload {
    fn from(value: &'static str) -> Self {
        Payload::Text(Cow::Borrowed(value))
    }
}

impl From<String> for Payload {
    fn from(value: String) -> Self {
        Payload::Text(Cow::Owned(value))
    }
}

impl From<Vec<u8>> for Payload {
    fn from(value: Vec<u8>) -> Self {
        Payload::Binary(value)
    }
}

/// A single log record.
///
/// A record is immutable once built.
#[derive(Clone, Debug)]
pub struct Record {
    level: Cow<'static, str>,
    payload: Payload,
    metadata: Option<Map<String, Value>>,
}

impl Record {
    /// Create a new [`RecordBuilder`].
    ///
    /// # Examples
    ///
    /// ```
    /// use dayroll::Record;
    ///
    /// let record = Record::builder().level("warn").payload("disk almost full").build();
    /// assert_eq!(record.level(), "warn");
    /// ```
    pub fn builder() -> RecordBuilder {
        RecordBuilder::default()
    }

    /// The level of the record, such as `info` or `error`.
    pub fn level(&self) -> &str {
        &self.level
    }

    /// The message body.
    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    /// Additional metadata attached to the record.
    pub fn metadata(&self) -> Option<&Map<String, Value>> {
        self.metadata.as_ref()
    }
}

/// Builder for [`Record`].
#[derive(Debug)]
pub struct RecordBuilder {
    record: Record,
}

impl Default for RecordBuilder {
    fn default() -> Self {
        Self {
            record: Record {
                level: Cow::Borrowed("info"),
                payload: Payload::Text(Cow::Borrowed("")),
                metadata: None,
            },
        }
    }
}

impl RecordBuilder {
    /// Set the level. Defaults to `info`.
    pub fn level(mut self, level: impl Into<Cow<'static, str>>) -> Self {
        self.record.level = level.into();
        self
    }

    /// Set the message body.
    pub fn payload(mut self, payload: impl Into<Payload>) -> Self {
        self.record.payload = payload.into();
        self
    }

    /// Attach metadata. An empty map is treated as no metadata.
    pub fn metadata(mut self, metadata: Map<String, Value>) -> Self {
        self.record.metadata = if metadata.is_empty() {
            None
        } else {
            Some(metadata)
        };
        self
    }

    /// Add one metadata entry.
    pub fn metadata_entry(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.record
            .metadata
            .get_or_insert_with(Map::new)
            .insert(key.into(), value.into());
        self
    }

    /// Build the record.
    pub fn build(self) -> Record {
        self.record
    }
}
