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

use jiff::Timestamp;
use jiff::civil::Date;
use jiff::tz::TimeZone;

#[derive(Debug, Clone)]
pub(crate) enum Clock {
    DefaultClock,
    #[cfg(test)]
    ManualClock(ManualClock),
}

impl Clock {
    pub(crate) fn now(&self) -> Timestamp {
        match self {
            Clock::DefaultClock => Timestamp::now(),
            #[cfg(test)]
            Clock::ManualClock(clock) => clock.now(),
        }
    }

    /// The calendar day of now in the given time zone.
    pub(crate) fn today(&self, tz: &TimeZone) -> Date {
        self.now().to_zoned(tz.clone()).date()
    }
}

/// The time could be reset, and clones observe the reset.
#[derive(Debug, Clone)]
#[cfg(test)]
pub(crate) struct ManualClock {
    now: std::sync::Arc<std::sync::Mutex<Timestamp>>,
}

#[cfg(test)]
impl ManualClock {
    pub(crate) fn new(now: Timestamp) -> ManualClock {
        ManualClock {
            now: std::sync::Arc::new(std::sync::Mutex::new(now)),
        }
    }

    fn now(&self) -> Timestamp {
        *self.now.lock().unwrap()
    }

    pub(crate) fn set_now(&self, now: Timestamp) {
        *self.now.lock().unwrap() = now;
    }

    /// Move the clock forward by whole days.
    pub(crate) fn advance_days(&self, days: i64) {
        let mut now = self.now.lock().unwrap();
        *now = now
            .checked_add(jiff::SignedDuration::from_hours(24 * days))
            .unwrap();
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn test_manual_clock_adjusting() {
        let now = Timestamp::from_str("2023-01-01T12:00:00Z").unwrap();
        let clock = ManualClock::new(now);
        assert_eq!(clock.now(), now);

        let now = Timestamp::from_str("2024-01-01T12:00:00Z").unwrap();
        let observer = clock.clone();
        clock.set_now(now);
        assert_eq!(observer.now(), now);
    }

    #[test]
    fn test_today_depends_on_time_zone() {
        let now = Timestamp::from_str("2024-08-10T20:00:00Z").unwrap();
        let clock = Clock::ManualClock(ManualClock::new(now));

        assert_eq!(clock.today(&TimeZone::UTC).to_string(), "2024-08-10");
        let east = TimeZone::fixed(jiff::tz::offset(8));
        assert_eq!(clock.today(&east).to_string(), "2024-08-11");
    }

    #[test]
    fn test_advance_days() {
        let now = Timestamp::from_str("2024-08-10T23:59:59Z").unwrap();
        let manual = ManualClock::new(now);
        let clock = Clock::ManualClock(manual.clone());
        manual.advance_days(2);
        assert_eq!(clock.today(&TimeZone::UTC).to_string(), "2024-08-12");
    }
}
