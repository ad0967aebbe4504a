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

use base64::Engine;
use base64::prelude::BASE64_STANDARD;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;

use crate::Error;
use crate::layout::Layout;
use crate::layout::TimestampFormat;
use crate::record::Payload;
use crate::record::Record;

/// A layout that formats each record as one JSON object.
///
/// Output format:
///
/// ```json
/// {"level":"info","message":"hello","timestamp":"Aug 10 2024 17:12:52"}
/// ```
///
/// Binary payloads are encoded as base64. Metadata, when present, is emitted under `meta`.
///
/// # Examples
///
/// ```
/// use dayroll::layout::JsonLayout;
///
/// let json_layout = JsonLayout::default().timestamp(true);
/// ```
#[derive(Default, Debug, Clone)]
pub struct JsonLayout {
    timestamp: TimestampFormat,
}

impl JsonLayout {
    /// Sets how lines are timestamped. Defaults to no timestamp.
    pub fn timestamp(mut self, timestamp: impl Into<TimestampFormat>) -> Self {
        self.timestamp = timestamp.into();
        self
    }
}

#[derive(Debug, Serialize)]
struct RecordLine<'a> {
    level: &'a str,
    #[serde(serialize_with = "serialize_payload")]
    message: &'a Payload,
    #[serde(skip_serializing_if = "Option::is_none")]
    timestamp: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    meta: Option<&'a Map<String, Value>>,
}

fn serialize_payload<S>(payload: &Payload, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    match payload {
        Payload::Text(text) => serializer.serialize_str(text),
        Payload::Binary(bytes) => serializer.serialize_str(&BASE64_STANDARD.encode(bytes)),
    }
}

impl Layout for JsonLayout {
    fn format(&self, record: &Record) -> Result<Vec<u8>, Error> {
        let record_line = RecordLine {
            level: record.level(),
            message: record.payload(),
            timestamp: self.timestamp.render(),
            meta: record.metadata(),
        };

        serde_json::to_vec(&record_line).map_err(Error::from_json_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn format(layout: &JsonLayout, record: &Record) -> String {
        String::from_utf8(layout.format(record).unwrap()).unwrap()
    }

    #[test]
    fn test_plain_record() {
        let record = Record::builder().level("info").payload("hello").build();
        assert_eq!(
            format(&JsonLayout::default(), &record),
            r#"{"level":"info","message":"hello"}"#
        );
    }

    #[test]
    fn test_binary_payload_is_base64() {
        let record = Record::builder()
            .level("debug")
            .payload(b"\x00\x01binary".to_vec())
            .build();
        assert_eq!(
            format(&JsonLayout::default(), &record),
            r#"{"level":"debug","message":"AAFiaW5hcnk="}"#
        );
    }

    #[test]
    fn test_timestamp_and_metadata() {
        let layout = JsonLayout::default().timestamp(TimestampFormat::custom(|| "T".to_string()));
        let record = Record::builder()
            .level("warn")
            .payload("slow request")
            .metadata_entry("elapsed_ms", 1200)
            .build();
        assert_eq!(
            format(&layout, &record),
            r#"{"level":"warn","message":"slow request","timestamp":"T","meta":{"elapsed_ms":1200}}"#
        );
    }

    #[test]
    fn test_message_escaping() {
        let record = Record::builder()
            .payload(String::from("line \"one\"\nline two"))
            .build();
        let line = format(&JsonLayout::default(), &record);
        assert!(!line.contains('\n'));
        let parsed: Value = serde_json::from_str(&line).unwrap();
        assert_eq!(parsed["message"], "line \"one\"\nline two");
    }
}
