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

use std::path::PathBuf;
use std::sync::Mutex;

use crossbeam_channel::Receiver;
use crossbeam_channel::Sender;
use crossbeam_channel::unbounded;

/// Lifecycle notifications of a sink's file rotation.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum RotationEvent {
    /// A retention sweep deleted these aged files.
    Pruned(Vec<PathBuf>),
    /// Lines buffered during an open, or written since the last flush, reached the file.
    Flushed,
    /// A dated file was installed as the active file.
    Opened(PathBuf),
    /// The sink was closed.
    Closed,
}

#[derive(Debug, Default)]
pub(crate) struct Subscribers {
    senders: Mutex<Vec<Sender<RotationEvent>>>,
}

impl Subscribers {
    pub(crate) fn subscribe(&self) -> Receiver<RotationEvent> {
        let (sender, receiver) = unbounded();
        let mut senders = self.senders.lock().unwrap_or_else(|e| e.into_inner());
        senders.push(sender);
        receiver
    }

    /// Deliver `event` to every live subscriber, forgetting the dropped ones.
    pub(crate) fn emit(&self, event: RotationEvent) {
        let mut senders = self.senders.lock().unwrap_or_else(|e| e.into_inner());
        senders.retain(|sender| sender.send(event.clone()).is_ok());
    }
}
