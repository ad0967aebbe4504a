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

use std::sync::Arc;
use std::thread::JoinHandle;

use crossbeam_channel::Receiver;
use crossbeam_channel::RecvError;
use jiff::civil::Date;

use super::Shared;
use crate::Error;
use crate::ErrorKind;

#[derive(Debug)]
pub(super) enum Command {
    Open(Date),
    Shutdown,
}

/// Performs the blocking part of a rotation off the append path.
pub(super) struct Worker {
    shared: Arc<Shared>,
    receiver: Receiver<Command>,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
enum WorkerState {
    Continue,
    Disconnected,
    Shutdown,
}

impl Worker {
    pub(super) fn new(shared: Arc<Shared>, receiver: Receiver<Command>) -> Worker {
        Self { shared, receiver }
    }

    fn work(&self) -> WorkerState {
        match self.receiver.recv() {
            Ok(Command::Open(day)) => {
                let opened = self.shared.open_day(day);
                self.shared.install(day, opened);
                WorkerState::Continue
            }
            Ok(Command::Shutdown) => WorkerState::Shutdown,
            Err(RecvError) => WorkerState::Disconnected,
        }
    }

    pub(super) fn make_thread(self, name: String) -> Result<JoinHandle<()>, Error> {
        std::thread::Builder::new()
            .name(name)
            .spawn(move || while self.work() == WorkerState::Continue {})
            .map_err(|err| {
                Error::new(ErrorKind::Io, "failed to spawn the log file opener thread")
                    .with_source(err)
            })
    }
}
