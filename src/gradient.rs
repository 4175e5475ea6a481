/*
 *  gradient.rs
 *
 *  ambient-kiosk - adaptive display state engine
 *	(c) 2020-26 Stuart Hunter
 *
 *	time of day and weather background gradients
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

use crate::state::{Gradient, Phase, Rgb};
use crate::weather::WeatherFamily;
use chrono::Timelike;
use log::debug;
use std::time::Duration;

/// Shortest spacing between two animation ticks.
pub const MIN_TICK: Duration = Duration::from_millis(1);

/// Bucket an hour of the day, unless demo mode pins the phase.
pub fn compute_phase(hour: u32, phase_override: Option<Phase>) -> Phase {
    if let Some(phase) = phase_override {
        return phase;
    }
    match hour % 24 {
        0..=4 | 21..=23 => Phase::Night,
        5..=7 => Phase::Sunrise,
        17..=20 => Phase::Sunset,
        _ => Phase::Day,
    }
}

pub fn phase_at<T: Timelike>(now: &T, phase_override: Option<Phase>) -> Phase {
    compute_phase(now.hour(), phase_override)
}

/// Background colours for a phase and weather code. Weather only matters
/// during the day; night, sunrise and sunset have their own palettes.
pub fn compute_gradient(phase: Phase, weather_code: i32) -> Gradient {
    let (start, end) = match phase {
        Phase::Night => ((11, 29, 58), (10, 25, 48)),
        Phase::Sunrise => ((255, 207, 113), (255, 140, 66)),
        Phase::Sunset => ((255, 159, 104), (46, 26, 71)),
        Phase::Day => match WeatherFamily::of(weather_code) {
            WeatherFamily::Rain => ((91, 75, 138), (60, 47, 88)),
            WeatherFamily::Snow => ((168, 192, 255), (63, 43, 150)),
            WeatherFamily::Cloud => ((127, 141, 161), (84, 99, 119)),
            WeatherFamily::Clear => ((77, 163, 255), (43, 111, 214)),
        },
    };
    Gradient::new(Rgb::new(start.0, start.1, start.2), Rgb::new(end.0, end.1, end.2))
}

/// One in-flight transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnimationRun {
    pub start: Gradient,
    pub target: Gradient,
    pub step_count: u32,
    pub current_step: u32,
}

impl AnimationRun {
    fn advance(&mut self) -> Gradient {
        self.current_step = (self.current_step + 1).min(self.step_count);
        self.start.lerp(&self.target, self.current_step, self.step_count)
    }

    fn is_complete(&self) -> bool {
        self.current_step >= self.step_count
    }
}

/// Result of one animation tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    /// Intermediate colours, schedule another tick.
    Continue(Gradient),
    /// Landed exactly on the target, the run is gone.
    Finished(Gradient),
    /// Nothing is animating (stale tick).
    Idle,
}

/// Holds the displayed gradient and at most one active transition.
#[derive(Debug, Clone)]
pub struct GradientAnimator {
    current: Gradient,
    run: Option<AnimationRun>,
    interval: Duration,
}

impl GradientAnimator {
    pub fn new(initial: Gradient) -> Self {
        Self { current: initial, run: None, interval: MIN_TICK }
    }

    pub fn current(&self) -> Gradient {
        self.current
    }

    /// Where the display is heading: the active target, or the current colours.
    pub fn target(&self) -> Gradient {
        self.run.map(|r| r.target).unwrap_or(self.current)
    }

    pub fn is_animating(&self) -> bool {
        self.run.is_some()
    }

    pub fn tick_interval(&self) -> Duration {
        self.interval
    }

    /// Jump straight to `gradient`, dropping any active run.
    pub fn set(&mut self, gradient: Gradient) {
        self.run = None;
        self.current = gradient;
    }

    /// Start interpolating from the current colours towards `target`,
    /// replacing whatever run was active. Returns the tick spacing when a
    /// run was started, `None` when it snapped immediately.
    pub fn animate_to(&mut self, target: Gradient, duration: Duration, steps: u32) -> Option<Duration> {
        if steps == 0 || target == self.current {
            self.set(target);
            return None;
        }
        self.interval = (duration / steps).max(MIN_TICK);
        if let Some(old) = self.run.replace(AnimationRun {
            start: self.current,
            target,
            step_count: steps,
            current_step: 0,
        }) {
            debug!("gradient run to {} replaced at step {}/{}", old.target, old.current_step, old.step_count);
        }
        Some(self.interval)
    }

    pub fn tick(&mut self) -> Tick {
        let Some(run) = self.run.as_mut() else {
            return Tick::Idle;
        };
        self.current = run.advance();
        if run.is_complete() {
            // exact landing, whatever rounding happened on the way
            self.current = run.target;
            self.run = None;
            Tick::Finished(self.current)
        } else {
            Tick::Continue(self.current)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;

    #[test]
    fn test_phase_boundaries() {
        assert_eq!(compute_phase(4, None), Phase::Night);
        assert_eq!(compute_phase(5, None), Phase::Sunrise);
        assert_eq!(compute_phase(7, None), Phase::Sunrise);
        assert_eq!(compute_phase(8, None), Phase::Day);
        assert_eq!(compute_phase(16, None), Phase::Day);
        assert_eq!(compute_phase(17, None), Phase::Sunset);
        assert_eq!(compute_phase(20, None), Phase::Sunset);
        assert_eq!(compute_phase(21, None), Phase::Night);
        assert_eq!(compute_phase(0, None), Phase::Night);
    }

    #[test]
    fn test_phase_total_and_override() {
        for h in 0..24 {
            let _ = compute_phase(h, None);
            assert_eq!(compute_phase(h, Some(Phase::Sunset)), Phase::Sunset);
        }
        let t = NaiveTime::from_hms_opt(18, 30, 0).unwrap();
        assert_eq!(phase_at(&t, None), Phase::Sunset);
    }

    #[test]
    fn test_gradient_table() {
        let night = compute_gradient(Phase::Night, 61);
        assert_eq!(night.start, Rgb::new(11, 29, 58));
        let rain = compute_gradient(Phase::Day, 95);
        assert_eq!(rain, Gradient::new(Rgb::new(91, 75, 138), Rgb::new(60, 47, 88)));
        let snow = compute_gradient(Phase::Day, 86);
        assert_eq!(snow.end, Rgb::new(63, 43, 150));
        let cloud = compute_gradient(Phase::Day, 48);
        assert_eq!(cloud.start, Rgb::new(127, 141, 161));
        let clear = compute_gradient(Phase::Day, 1);
        assert_eq!(clear.start, Rgb::new(77, 163, 255));
        assert_eq!(compute_gradient(Phase::Sunrise, 73).end, Rgb::new(255, 140, 66));
    }

    #[test]
    fn test_gradient_total_over_codes() {
        let clear = compute_gradient(Phase::Day, 0);
        for code in [-1, 4, 100, 1000, i32::MIN, i32::MAX] {
            assert_eq!(compute_gradient(Phase::Day, code), clear);
        }
    }

    #[test]
    fn test_animation_lands_on_target() {
        let mut a = GradientAnimator::new(Gradient::NIGHT_NAVY);
        let target = compute_gradient(Phase::Day, 0);
        let interval = a.animate_to(target, Duration::from_millis(1000), 10).unwrap();
        assert_eq!(interval, Duration::from_millis(100));
        for _ in 0..9 {
            assert!(matches!(a.tick(), Tick::Continue(_)));
        }
        assert_eq!(a.tick(), Tick::Finished(target));
        assert_eq!(a.current(), target);
        assert_eq!(a.tick(), Tick::Idle);
    }

    #[test]
    fn test_second_animate_replaces_first() {
        let mut a = GradientAnimator::new(Gradient::NIGHT_NAVY);
        let first = compute_gradient(Phase::Sunrise, 0);
        let second = compute_gradient(Phase::Day, 71);
        a.animate_to(first, Duration::from_millis(500), 5);
        a.tick();
        a.tick();
        a.animate_to(second, Duration::from_millis(500), 5);
        assert_eq!(a.target(), second);
        let mut last = Tick::Idle;
        for _ in 0..5 {
            last = a.tick();
        }
        assert_eq!(last, Tick::Finished(second));
        assert_eq!(a.current(), second);
    }

    #[test]
    fn test_zero_steps_snaps() {
        let mut a = GradientAnimator::new(Gradient::NIGHT_NAVY);
        let target = compute_gradient(Phase::Sunset, 0);
        assert_eq!(a.animate_to(target, Duration::from_secs(2), 0), None);
        assert_eq!(a.current(), target);
        assert!(!a.is_animating());
    }

    #[test]
    fn test_tick_interval_floor() {
        let mut a = GradientAnimator::new(Gradient::NIGHT_NAVY);
        let target = compute_gradient(Phase::Day, 3);
        let interval = a.animate_to(target, Duration::from_millis(5), 50).unwrap();
        assert_eq!(interval, MIN_TICK);
    }

    #[test]
    fn test_intermediate_channels_stay_between_endpoints() {
        let mut a = GradientAnimator::new(compute_gradient(Phase::Sunrise, 0));
        let target = compute_gradient(Phase::Night, 0);
        a.animate_to(target, Duration::from_secs(1), 7);
        while let Tick::Continue(g) = a.tick() {
            assert!(g.start.r >= 11);
            assert!(g.end.b >= 48 && g.end.b <= 66);
        }
    }
}
