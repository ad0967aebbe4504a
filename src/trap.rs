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

//! Traps for errors that have no caller waiting on them.
//!
//! Retention sweeps and alias replacement run on the opener worker. Their failures are handed
//! to a [`Trap`] instead of being returned, and the sink keeps going.

use std::fmt;
use std::io;
use std::io::Write;

use crate::Error;

/// A handler for errors raised in the background.
pub trait Trap: fmt::Debug + Send + Sync + 'static {
    /// Handle an error that occurred in the background.
    fn trap(&self, err: &Error);
}

impl<T: Trap> From<T> for Box<dyn Trap> {
    fn from(value: T) -> Self {
        Box::new(value)
    }
}

/// A default trap that sends errors to standard error if possible.
///
/// If standard error is not available, it does nothing.
#[derive(Debug, Default)]
#[non_exhaustive]
pub struct DefaultTrap {}

impl Trap for DefaultTrap {
    fn trap(&self, err: &Error) {
        let _ = writeln!(io::stderr(), "{err}");
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Arc;
    use std::sync::Mutex;

    use super::*;
    use crate::ErrorKind;

    /// Collects trapped errors so tests can assert on them.
    #[derive(Debug, Clone, Default)]
    pub(crate) struct CollectingTrap {
        errors: Arc<Mutex<Vec<(ErrorKind, String)>>>,
    }

    impl CollectingTrap {
        pub(crate) fn messages(&self) -> Vec<String> {
            let errors = self.errors.lock().unwrap();
            errors.iter().map(|(_, msg)| msg.clone()).collect()
        }
    }

    impl Trap for CollectingTrap {
        fn trap(&self, err: &Error) {
            let mut errors = self.errors.lock().unwrap();
            errors.push((err.kind(), err.message().to_string()));
        }
    }
}
