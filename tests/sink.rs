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

use std::fs;
use std::num::NonZeroUsize;
use std::path::Path;
use std::sync::Arc;
use std::sync::Mutex;
use std::thread;

use dayroll::Error;
use dayroll::ErrorKind;
use dayroll::Layout;
use dayroll::Payload;
use dayroll::Record;
use dayroll::RotationEvent;
use dayroll::Sink;
use dayroll::SinkConfig;
use dayroll::Trap;
use jiff::Timestamp;
use jiff::civil::Date;
use jiff::tz::TimeZone;
use rand::Rng;
use rand::distr::Alphanumeric;
use tempfile::TempDir;

#[derive(Debug, Clone, Default)]
struct RecordingTrap {
    messages: Arc<Mutex<Vec<String>>>,
}

impl Trap for RecordingTrap {
    fn trap(&self, err: &Error) {
        self.messages.lock().unwrap().push(err.to_string());
    }
}

fn today() -> Date {
    Timestamp::now().to_zoned(TimeZone::UTC).date()
}

fn dated(day: Date) -> String {
    format!("app.{day}.log")
}

fn generate_random_string() -> String {
    let mut rng = rand::rng();
    let len = rng.random_range(50..=100);
    std::iter::repeat(())
        .map(|()| rng.sample(Alphanumeric))
        .map(char::from)
        .take(len)
        .collect()
}

fn dated_files(dir: &Path) -> Vec<String> {
    let mut names = fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().into_string().unwrap())
        .filter(|name| name != "app.log")
        .collect::<Vec<_>>();
    names.sort();
    names
}

#[test]
fn test_concurrent_writers_keep_per_thread_order() {
    let temp_dir = TempDir::new().expect("failed to create a temporary directory");
    let trap = RecordingTrap::default();
    let sink = Arc::new(
        Sink::builder()
            .directory(temp_dir.path())
            .filename("app.log")
            .json(false)
            .trap(trap.clone())
            .build()
            .unwrap(),
    );

    let handles = (0..4)
        .map(|writer| {
            let sink = sink.clone();
            thread::spawn(move || {
                for seq in 0..250 {
                    let record = Record::builder()
                        .payload(format!("{writer}-{seq}"))
                        .build();
                    sink.append(&record).unwrap();
                }
            })
        })
        .collect::<Vec<_>>();
    for handle in handles {
        handle.join().unwrap();
    }
    sink.flush().unwrap();

    // a run straddling midnight may have split the lines over two files
    let mut content = String::new();
    for name in dated_files(temp_dir.path()) {
        content.push_str(&fs::read_to_string(temp_dir.path().join(name)).unwrap());
    }

    let mut next = [0usize; 4];
    for line in content.lines() {
        let message = line.strip_prefix("info: ").unwrap();
        let (writer, seq) = message.split_once('-').unwrap();
        let writer = writer.parse::<usize>().unwrap();
        assert_eq!(seq.parse::<usize>().unwrap(), next[writer]);
        next[writer] += 1;
    }
    assert_eq!(next, [250; 4]);
    assert!(trap.messages.lock().unwrap().is_empty());
}

#[test]
fn test_first_open_prunes_aged_files() {
    let temp_dir = TempDir::new().expect("failed to create a temporary directory");
    let today = today();
    let yesterday = today.yesterday().unwrap();
    for name in [
        "app.2020-01-01.log".to_string(),
        "app.2020-01-02.log".to_string(),
        dated(yesterday),
        "notes.txt".to_string(),
    ] {
        fs::write(temp_dir.path().join(name), b"old\n").unwrap();
    }

    let sink = Sink::builder()
        .directory(temp_dir.path())
        .filename("app.log")
        .retention_count(NonZeroUsize::new(3).unwrap())
        .build()
        .unwrap();
    let events = sink.subscribe();

    sink.append(&Record::builder().payload("hello").build())
        .unwrap();
    sink.flush().unwrap();

    let mut pruned = events
        .try_iter()
        .find_map(|event| match event {
            RotationEvent::Pruned(paths) => Some(paths),
            _ => None,
        })
        .unwrap();
    pruned.sort();
    assert_eq!(
        pruned,
        vec![
            temp_dir.path().join("app.2020-01-01.log"),
            temp_dir.path().join("app.2020-01-02.log"),
        ]
    );

    let remaining = dated_files(temp_dir.path());
    assert!(remaining.contains(&dated(yesterday)));
    assert!(remaining.contains(&"notes.txt".to_string()));
    assert_eq!(
        fs::read_to_string(sink.alias_path()).unwrap(),
        "{\"level\":\"info\",\"message\":\"hello\"}\n"
    );
}

#[test]
fn test_binary_and_metadata() {
    let temp_dir = TempDir::new().expect("failed to create a temporary directory");
    let sink = Sink::builder()
        .directory(temp_dir.path())
        .filename("app.log")
        .build()
        .unwrap();

    let record = Record::builder()
        .level("debug")
        .payload(b"\x00\x01binary".to_vec())
        .metadata_entry("request_id", 42)
        .build();
    assert!(matches!(record.payload(), Payload::Binary(_)));
    sink.append(&record).unwrap();
    sink.flush().unwrap();

    let content = fs::read_to_string(sink.current_path().unwrap()).unwrap();
    assert_eq!(
        content,
        "{\"level\":\"debug\",\"message\":\"AAFiaW5hcnk=\",\"meta\":{\"request_id\":42}}\n"
    );
}

#[derive(Debug)]
struct Upper;

impl Layout for Upper {
    fn format(&self, record: &Record) -> Result<Vec<u8>, Error> {
        match record.payload() {
            Payload::Text(text) => Ok(text.to_uppercase().into_bytes()),
            Payload::Binary(_) => Err(Error::new(ErrorKind::Format, "binary not supported")),
        }
    }
}

#[test]
fn test_custom_layout() {
    let temp_dir = TempDir::new().expect("failed to create a temporary directory");
    let sink = Sink::builder()
        .directory(temp_dir.path())
        .filename("app.log")
        .layout(Upper)
        .build()
        .unwrap();

    sink.append(&Record::builder().payload("quiet").build())
        .unwrap();
    let err = sink
        .append(&Record::builder().payload(vec![1u8]).build())
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Format);
    sink.flush().unwrap();

    let content = fs::read_to_string(sink.current_path().unwrap()).unwrap();
    assert_eq!(content, "QUIET\n");
}

#[cfg(feature = "colored")]
#[test]
fn test_level_color_preset() {
    use dayroll::LevelColor;

    colored::control::set_override(false);

    let temp_dir = TempDir::new().expect("failed to create a temporary directory");
    let sink = Sink::builder()
        .directory(temp_dir.path())
        .filename("app.log")
        .json(false)
        .colorize(LevelColor::default())
        .build()
        .unwrap();

    sink.append(&Record::builder().level("error").payload("boom").build())
        .unwrap();
    sink.flush().unwrap();

    let content = fs::read_to_string(sink.current_path().unwrap()).unwrap();
    assert_eq!(content, "error: boom\n");
}

#[test]
fn test_large_volume_is_complete() {
    let temp_dir = TempDir::new().expect("failed to create a temporary directory");
    let sink = Sink::builder()
        .directory(temp_dir.path().join("deep").join("logs"))
        .filename("app.log")
        .json(false)
        .pending_lines_limit(NonZeroUsize::new(16).unwrap())
        .build()
        .unwrap();

    let mut expected = 0;
    for _ in 0..2000 {
        let message = generate_random_string();
        expected += "info: ".len() + message.len() + 1;
        sink.append(&Record::builder().payload(message).build())
            .unwrap();
    }
    sink.flush().unwrap();

    let written = dated_files(&temp_dir.path().join("deep").join("logs"))
        .into_iter()
        .map(|name| {
            fs::metadata(temp_dir.path().join("deep").join("logs").join(name))
                .unwrap()
                .len() as usize
        })
        .sum::<usize>();
    assert_eq!(written, expected);
}

#[test]
fn test_sink_from_config() {
    let temp_dir = TempDir::new().expect("failed to create a temporary directory");
    let json = format!(
        r#"{{"dirname": {:?}, "filename": "app.log", "json": false, "max_files": 2}}"#,
        temp_dir.path().to_str().unwrap()
    );
    let config: SinkConfig = serde_json::from_str(&json).unwrap();
    let sink = config.build().unwrap();

    sink.append(&Record::builder().level("warn").payload("hi").build())
        .unwrap();
    sink.flush().unwrap();
    assert_eq!(
        fs::read_to_string(sink.alias_path()).unwrap(),
        "warn: hi\n"
    );
}

#[test]
fn test_drop_closes() {
    let temp_dir = TempDir::new().expect("failed to create a temporary directory");
    let sink = Sink::builder()
        .directory(temp_dir.path())
        .filename("app.log")
        .build()
        .unwrap();
    let events = sink.subscribe();

    sink.append(&Record::builder().payload("bye").build())
        .unwrap();
    drop(sink);

    let events = events.iter().collect::<Vec<_>>();
    assert_eq!(events.last(), Some(&RotationEvent::Closed));
    assert!(
        events
            .iter()
            .any(|event| matches!(event, RotationEvent::Opened(_)))
    );
}
