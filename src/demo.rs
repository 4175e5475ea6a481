/*
 *  demo.rs
 *
 *  ambient-kiosk - adaptive display state engine
 *	(c) 2020-26 Stuart Hunter
 *
 *	background palette walk-through
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

use crate::state::Phase;
use log::info;

/// One stop of the demo walk-through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DemoStage {
    pub phase: Phase,
    pub weather_code: i32,
}

/// Sunrise, clear day, overcast, rain, snow, sunset.
pub const DEMO_STAGES: [DemoStage; 6] = [
    DemoStage { phase: Phase::Sunrise, weather_code: 0 },
    DemoStage { phase: Phase::Day, weather_code: 0 },
    DemoStage { phase: Phase::Day, weather_code: 3 },
    DemoStage { phase: Phase::Day, weather_code: 63 },
    DemoStage { phase: Phase::Day, weather_code: 73 },
    DemoStage { phase: Phase::Sunset, weather_code: 0 },
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DemoStep {
    Stage(DemoStage),
    Finished,
}

/// Cycles the background through every palette. Only one walk-through runs
/// at a time; triggering again while it runs does nothing.
#[derive(Debug, Default)]
pub struct DemoSequence {
    running: bool,
    index: usize,
    completed: u32,
}

impl DemoSequence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// How many walk-throughs ran to the end.
    pub fn completed(&self) -> u32 {
        self.completed
    }

    /// First stage, or `None` if a walk-through is already in progress.
    pub fn start(&mut self) -> Option<DemoStage> {
        if self.running {
            return None;
        }
        info!("demo sequence started");
        self.running = true;
        self.index = 0;
        Some(DEMO_STAGES[0])
    }

    /// Called once the current stage's time is up.
    pub fn advance(&mut self) -> DemoStep {
        if !self.running {
            return DemoStep::Finished;
        }
        self.index += 1;
        match DEMO_STAGES.get(self.index) {
            Some(stage) => DemoStep::Stage(*stage),
            None => {
                self.running = false;
                self.completed += 1;
                info!("demo sequence finished");
                DemoStep::Finished
            }
        }
    }

    pub fn current(&self) -> Option<DemoStage> {
        if self.running { DEMO_STAGES.get(self.index).copied() } else { None }
    }
}
