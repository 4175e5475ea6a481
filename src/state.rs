/*
 *  state.rs
 *
 *  ambient-kiosk - adaptive display state engine
 *	(c) 2020-26 Stuart Hunter
 *
 *	display state and colour types
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

use serde::{Deserialize, Serialize};
use std::fmt;

/// Placeholder shown for any value that has not been fetched yet.
pub const PLACEHOLDER: &str = "--";

/// One 8-bit-per-channel colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Linear blend towards `target`, `step` of `steps` of the way there.
    ///
    /// Integer arithmetic keeps every intermediate channel between the two
    /// endpoints, and `step >= steps` lands exactly on `target`.
    pub fn lerp(self, target: Rgb, step: u32, steps: u32) -> Rgb {
        if steps == 0 || step >= steps {
            return target;
        }
        let mix = |a: u8, b: u8| -> u8 {
            let a = a as i64;
            let b = b as i64;
            let v = a + (b - a) * step as i64 / steps as i64;
            v.clamp(0, 255) as u8
        };
        Rgb::new(mix(self.r, target.r), mix(self.g, target.g), mix(self.b, target.b))
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

/// Two-colour vertical background, `start` at the top.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Gradient {
    pub start: Rgb,
    pub end: Rgb,
}

impl Gradient {
    /// Start-up colours before anything has been computed.
    pub const NIGHT_NAVY: Gradient = Gradient {
        start: Rgb::new(0x0B, 0x1D, 0x3A),
        end: Rgb::new(0x0A, 0x19, 0x30),
    };

    pub const fn new(start: Rgb, end: Rgb) -> Self {
        Self { start, end }
    }

    pub fn lerp(&self, target: &Gradient, step: u32, steps: u32) -> Gradient {
        Gradient {
            start: self.start.lerp(target.start, step, steps),
            end: self.end.lerp(target.end, step, steps),
        }
    }

    /// Colour `band` of `bands` horizontal bands, top to bottom.
    pub fn band(&self, band: u32, bands: u32) -> Rgb {
        if bands <= 1 {
            return self.start;
        }
        self.start.lerp(self.end, band, bands - 1)
    }
}

impl Default for Gradient {
    fn default() -> Self {
        Gradient::NIGHT_NAVY
    }
}

impl fmt::Display for Gradient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.start, self.end)
    }
}

/// Coarse time-of-day bucket driving the background mood.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Night,
    Sunrise,
    Day,
    Sunset,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Phase::Night => "night",
            Phase::Sunrise => "sunrise",
            Phase::Day => "day",
            Phase::Sunset => "sunset",
        };
        f.write_str(s)
    }
}

/// Departure minutes for one transit row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DepartureTimes {
    /// Exactly three slots: `"7"`, `"7+2"`, `"?"` (missing) or `"--"` (bad time).
    Slots([String; 3]),
    /// Row-level placeholder, the group had no departures at all.
    Placeholder,
}

impl fmt::Display for DepartureTimes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DepartureTimes::Slots(slots) => write!(f, "{}", slots.join(", ")),
            DepartureTimes::Placeholder => f.write_str(PLACEHOLDER),
        }
    }
}

/// One line of the transit board.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    pub line: String,
    pub destinations: String,
    pub times: DepartureTimes,
}

impl Row {
    pub fn placeholder() -> Self {
        Row {
            line: PLACEHOLDER.to_string(),
            destinations: PLACEHOLDER.to_string(),
            times: DepartureTimes::Placeholder,
        }
    }

    /// Shown when the very first transit fetch failed.
    pub fn unavailable() -> Self {
        Row {
            line: PLACEHOLDER.to_string(),
            destinations: "unavailable".to_string(),
            times: DepartureTimes::Placeholder,
        }
    }
}

impl fmt::Display for Row {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}  {}  {}", self.line, self.destinations, self.times)
    }
}

/// Everything the kiosk shows, owned by the engine and rewritten only from
/// its message/timer handlers.
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayState {
    pub weather_code: i32,
    pub temperature_c: Option<f64>,
    pub caqi_score: Option<f64>,
    pub transit_rows: [Row; 2],
    /// Wall clock as "HH:MM".
    pub clock: String,
    pub phase_override: Option<Phase>,
    pub gradient: Gradient,
    pub debug_mode: bool,

    pub location_label: String,
    pub temperature_text: String,
    pub description: String,
    /// 1.0 is clean air (right edge), 0.0 is the worst (left edge).
    pub aq_position: Option<f64>,
    pub aq_status: String,
}

impl DisplayState {
    pub fn new(debug_mode: bool) -> Self {
        Self {
            weather_code: 0,
            temperature_c: None,
            caqi_score: None,
            transit_rows: [Row::placeholder(), Row::placeholder()],
            clock: PLACEHOLDER.to_string(),
            phase_override: None,
            gradient: Gradient::NIGHT_NAVY,
            debug_mode,
            location_label: PLACEHOLDER.to_string(),
            temperature_text: PLACEHOLDER.to_string(),
            description: PLACEHOLDER.to_string(),
            aq_position: None,
            aq_status: PLACEHOLDER.to_string(),
        }
    }
}

impl Default for DisplayState {
    fn default() -> Self {
        Self::new(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_state_placeholders() {
        let s = DisplayState::new(false);
        assert_eq!(s.clock, "--");
        assert_eq!(s.weather_code, 0);
        assert_eq!(s.gradient, Gradient::NIGHT_NAVY);
        assert_eq!(s.transit_rows[0], Row::placeholder());
        assert!(s.temperature_c.is_none());
    }

    #[test]
    fn test_rgb_lerp_endpoints() {
        let a = Rgb::new(0, 100, 255);
        let b = Rgb::new(255, 100, 0);
        assert_eq!(a.lerp(b, 0, 10), a);
        assert_eq!(a.lerp(b, 10, 10), b);
        assert_eq!(a.lerp(b, 5, 10), Rgb::new(127, 100, 128));
        assert_eq!(a.lerp(b, 3, 0), b);
    }

    #[test]
    fn test_gradient_bands() {
        let g = Gradient::new(Rgb::new(0, 0, 0), Rgb::new(100, 100, 100));
        assert_eq!(g.band(0, 101), g.start);
        assert_eq!(g.band(100, 101), g.end);
        assert_eq!(g.band(50, 101), Rgb::new(50, 50, 50));
    }

    #[test]
    fn test_hex_display() {
        assert_eq!(Gradient::NIGHT_NAVY.start.to_string(), "#0B1D3A");
    }

    #[test]
    fn test_placeholder_row_times() {
        assert_eq!(Row::placeholder().times.to_string(), "--");
        let r = DepartureTimes::Slots(["7+2".into(), "?".into(), "?".into()]);
        assert_eq!(r.to_string(), "7+2, ?, ?");
    }
}
