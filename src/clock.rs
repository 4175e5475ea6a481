/*
 *  clock.rs
 *
 *  ambient-kiosk - adaptive display state engine
 *	(c) 2020-26 Stuart Hunter
 *
 *	wall clock sources
 *
 *	This program is free software: you can redistribute it and/or modify
 *	it under the terms of the GNU General Public License as published by
 *	the Free Software Foundation, either version 3 of the License, or
 *	(at your option) any later version.
 *
 *	This program is distributed in the hope that it will be useful,
 *	but WITHOUT ANY WARRANTY; without even the implied warranty of
 *	MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 *	GNU General Public License for more details.
 *
 *	See <http://www.gnu.org/licenses/> to get a copy of the GNU General
 *	Public License.
 *
 */

use chrono::{DateTime, FixedOffset, Local, Timelike};
use std::sync::{Arc, Mutex};

/// Wall-clock source. The engine only asks for "now"; tests swap in a
/// `ManualClock` so phases and air quality hours can be driven directly.
pub trait WallClock: Send + Sync {
    fn now(&self) -> DateTime<FixedOffset>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl WallClock for SystemClock {
    fn now(&self) -> DateTime<FixedOffset> {
        Local::now().fixed_offset()
    }
}

/// Settable clock shared between a test and the engine under test.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<Mutex<DateTime<FixedOffset>>>,
}

impl ManualClock {
    pub fn new(start: DateTime<FixedOffset>) -> Self {
        Self { now: Arc::new(Mutex::new(start)) }
    }

    /// Parse an RFC 3339 timestamp; `None` if it does not parse.
    pub fn at(rfc3339: &str) -> Option<Self> {
        DateTime::parse_from_rfc3339(rfc3339).ok().map(Self::new)
    }

    pub fn set(&self, to: DateTime<FixedOffset>) {
        if let Ok(mut now) = self.now.lock() {
            *now = to;
        }
    }

    /// Jump to `hour:00:00` of the current day.
    pub fn set_hour(&self, hour: u32) {
        let Ok(mut now) = self.now.lock() else { return };
        if let Some(t) = now.with_hour(hour).and_then(|t| t.with_minute(0)).and_then(|t| t.with_second(0)) {
            *now = t;
        }
    }

    pub fn advance(&self, by: chrono::Duration) {
        if let Ok(mut now) = self.now.lock() {
            *now += by;
        }
    }
}

impl WallClock for ManualClock {
    fn now(&self) -> DateTime<FixedOffset> {
        match self.now.lock() {
            Ok(now) => *now,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }
}

/// "HH:MM" for the clock widget.
pub fn format_clock<T: Timelike>(now: &T) -> String {
    format!("{:02}:{:02}", now.hour(), now.minute())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_clock_hours() {
        let clock = ManualClock::at("2026-05-04T06:42:10+02:00").unwrap();
        assert_eq!(format_clock(&clock.now()), "06:42");
        clock.set_hour(15);
        assert_eq!(format_clock(&clock.now()), "15:00");
        clock.advance(chrono::Duration::minutes(75));
        assert_eq!(clock.now().hour(), 16);
    }

    #[test]
    fn test_system_clock_is_sane() {
        let now = SystemClock.now();
        assert!(now.hour() < 24);
    }
}
