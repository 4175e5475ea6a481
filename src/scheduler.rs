/*
 *  scheduler.rs
 *
 *  ambient-kiosk - adaptive display state engine
 *	(c) 2020-26 Stuart Hunter
 *
 *	timers, job slots, debounce
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

//! Timer table and job bookkeeping behind the engine loop.
//!
//! Every periodic job re-arms itself only once its run has completed, so a
//! slow fetch stretches the cadence instead of stacking up concurrent runs.

use log::{debug, info};
use std::collections::HashMap;
use std::fmt;
use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum JobKind {
    Weather,
    Clock,
    AirQuality,
    Transit,
}

impl JobKind {
    pub const ALL: [JobKind; 4] = [JobKind::Weather, JobKind::Clock, JobKind::AirQuality, JobKind::Transit];
}

impl fmt::Display for JobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            JobKind::Weather => "weather",
            JobKind::Clock => "clock",
            JobKind::AirQuality => "air quality",
            JobKind::Transit => "transit",
        };
        f.write_str(s)
    }
}

/// Everything the engine can have a timer pending for. One entry per key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerKey {
    Job(JobKind),
    AnimationTick,
    DemoStage,
    LayoutDebounce,
    IndicatorRetry,
}

#[derive(Debug, Clone, Copy)]
struct Deadline {
    at: Instant,
    seq: u64,
}

/// Deadlines keyed by purpose; scheduling a key again replaces its deadline.
#[derive(Debug, Default)]
pub struct TimerQueue {
    pending: HashMap<TimerKey, Deadline>,
    seq: u64,
}

impl TimerQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm `key` for `at`. Returns true if an earlier deadline was replaced.
    pub fn schedule(&mut self, key: TimerKey, at: Instant) -> bool {
        self.seq += 1;
        self.pending.insert(key, Deadline { at, seq: self.seq }).is_some()
    }

    pub fn cancel(&mut self, key: TimerKey) -> bool {
        self.pending.remove(&key).is_some()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending.values().map(|d| d.at).min()
    }

    /// Remove and return every key due at `now`, earliest first; keys with
    /// the same deadline come out in the order they were armed.
    pub fn drain_due(&mut self, now: Instant) -> Vec<TimerKey> {
        let mut due: Vec<(TimerKey, Deadline)> = self
            .pending
            .iter()
            .filter(|(_, d)| d.at <= now)
            .map(|(k, d)| (*k, *d))
            .collect();
        due.sort_by_key(|(_, d)| (d.at, d.seq));
        for (key, _) in &due {
            self.pending.remove(key);
        }
        due.into_iter().map(|(k, _)| k).collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Idle,
    Running,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JobStats {
    pub runs: u64,
    pub failures: u64,
}

/// Outcome of finishing a run, as far as placeholders are concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    Succeeded,
    /// Failed and nothing was ever fetched; show placeholder text.
    FailedFirst,
    /// Failed, keep showing the last good values.
    FailedStale,
}

/// In-flight guard and counters for one periodic job.
#[derive(Debug, Clone)]
pub struct JobSlot {
    pub kind: JobKind,
    pub period: Duration,
    state: JobState,
    has_succeeded: bool,
    stats: JobStats,
}

impl JobSlot {
    pub fn new(kind: JobKind, period: Duration) -> Self {
        Self { kind, period, state: JobState::Idle, has_succeeded: false, stats: JobStats::default() }
    }

    pub fn state(&self) -> JobState {
        self.state
    }

    pub fn stats(&self) -> JobStats {
        self.stats
    }

    /// Idle → Running. False if a run is still in flight.
    pub fn try_begin(&mut self) -> bool {
        if self.state == JobState::Running {
            debug!("{} job still running, skipping trigger", self.kind);
            return false;
        }
        self.state = JobState::Running;
        true
    }

    /// Running → Idle, recording the result.
    pub fn finish(&mut self, ok: bool) -> Completion {
        self.state = JobState::Idle;
        self.stats.runs += 1;
        if ok {
            self.has_succeeded = true;
            Completion::Succeeded
        } else {
            self.stats.failures += 1;
            if self.has_succeeded { Completion::FailedStale } else { Completion::FailedFirst }
        }
    }
}

/// Air quality is only fetched during a few allow-listed hours, once each.
#[derive(Debug, Clone)]
pub struct AirQualityGate {
    allowed_hours: Vec<u32>,
    last_fetched_hour: Option<u32>,
}

impl AirQualityGate {
    pub fn new(allowed_hours: &[u32]) -> Self {
        Self { allowed_hours: allowed_hours.to_vec(), last_fetched_hour: None }
    }

    pub fn last_fetched_hour(&self) -> Option<u32> {
        self.last_fetched_hour
    }

    /// True when `hour` is allowed and was not the last fetched hour.
    /// The hour is claimed before the fetch starts, so a failed fetch is
    /// not retried within the same hour.
    pub fn should_fetch(&mut self, hour: u32) -> bool {
        if !self.allowed_hours.contains(&hour) || self.last_fetched_hour == Some(hour) {
            return false;
        }
        info!("air quality window {:02}:00 open", hour);
        self.last_fetched_hour = Some(hour);
        true
    }
}

/// Keeps only the latest value of a burst.
#[derive(Debug, Clone)]
pub struct Debouncer<T> {
    quiet: Duration,
    pending: Option<T>,
    notifications: u64,
}

impl<T> Debouncer<T> {
    pub fn new(quiet: Duration) -> Self {
        Self { quiet, pending: None, notifications: 0 }
    }

    /// Remember `value` and return when it may fire if nothing else arrives.
    pub fn notify(&mut self, value: T, now: Instant) -> Instant {
        self.pending = Some(value);
        self.notifications += 1;
        now + self.quiet
    }

    pub fn fire(&mut self) -> Option<T> {
        self.pending.take()
    }

    pub fn notifications(&self) -> u64 {
        self.notifications
    }
}
