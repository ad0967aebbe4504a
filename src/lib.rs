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

//! Dayroll is a log sink that writes records to one file per calendar day.
//!
//! # Overview
//!
//! A [`Sink`] formats each [`Record`] with a [`Layout`] and appends the line to a dated file
//! such as `app.2024-08-10.log`. At the first write of a new day the next file is opened on a
//! background thread while writes are buffered in order. Each rotation repoints the alias
//! `app.log` at the newest file and deletes dated files older than the retention window.
//!
//! # Examples
//!
//! ```
//! use dayroll::Record;
//! use dayroll::Sink;
//!
//! let dir = tempfile::tempdir().unwrap();
//! let sink = Sink::builder()
//!     .directory(dir.path())
//!     .filename("app.log")
//!     .build()
//!     .unwrap();
//!
//! sink.append(&Record::builder().payload("hello").build())
//!     .unwrap();
//! sink.flush().unwrap();
//!
//! let path = sink.current_path().unwrap();
//! let line = std::fs::read_to_string(path).unwrap();
//! assert_eq!(line, "{\"level\":\"info\",\"message\":\"hello\"}\n");
//! sink.close().unwrap();
//! ```

#![cfg_attr(docsrs, feature(doc_auto_cfg))]

pub mod layout;
pub mod permission;

mod alias;
mod clock;
#[cfg(feature = "colored")]
mod color;
mod config;
mod error;
mod naming;
mod record;
mod retention;
mod rotator;
mod sink;
mod trap;

#[cfg(feature = "colored")]
pub use self::color::LevelColor;
pub use self::config::SinkConfig;
pub use self::error::Error;
pub use self::error::ErrorKind;
pub use self::layout::Layout;
pub use self::record::Payload;
pub use self::record::Record;
pub use self::record::RecordBuilder;
pub use self::retention::DEFAULT_RETENTION_COUNT;
pub use self::rotator::RotationEvent;
pub use self::sink::Sink;
pub use self::sink::SinkBuilder;
pub use self::trap::DefaultTrap;
pub use self::trap::Trap;
