/*
 *  air_quality.rs
 *
 *  ambient-kiosk - adaptive display state engine
 *	(c) 2020-26 Stuart Hunter
 *
 *	air quality score and indicator position
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

//! Air quality reading to score to indicator position.

use serde::{Deserialize, Serialize};

/// Name of the Airly index carrying the CAQI value.
pub const CAQI_INDEX: &str = "AIRLY_CAQI";
/// Measurement name for fine particulate matter.
pub const PM25_VALUE: &str = "PM25";
/// Rough PM2.5 to CAQI-like scaling used when no index is published.
pub const PM25_SCORE_FACTOR: f64 = 2.0;
pub const SCORE_MAX: f64 = 100.0;

/// A single named number, as sensor APIs report indexes and measurements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedValue {
    pub name: String,
    pub value: Option<f64>,
}

impl NamedValue {
    pub fn new(name: &str, value: f64) -> Self {
        Self { name: name.to_string(), value: Some(value) }
    }
}

/// Latest reading of one sensor installation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AirQualityReading {
    #[serde(default)]
    pub indexes: Vec<NamedValue>,
    #[serde(default)]
    pub values: Vec<NamedValue>,
}

impl AirQualityReading {
    fn lookup(list: &[NamedValue], name: &str) -> Option<f64> {
        list.iter()
            .find(|v| v.name == name)
            .and_then(|v| v.value)
            .filter(|v| v.is_finite())
    }

    pub fn index(&self, name: &str) -> Option<f64> {
        Self::lookup(&self.indexes, name)
    }

    pub fn value(&self, name: &str) -> Option<f64> {
        Self::lookup(&self.values, name)
    }
}

/// CAQI when published, otherwise a PM2.5 estimate capped at 100.
/// `None` leaves the previous score on screen.
pub fn score_from_reading(reading: &AirQualityReading) -> Option<f64> {
    if let Some(caqi) = reading.index(CAQI_INDEX) {
        return Some(caqi);
    }
    reading
        .value(PM25_VALUE)
        .map(|pm25| (pm25 * PM25_SCORE_FACTOR).min(SCORE_MAX))
}

/// Clean air sits at the right edge (1.0), a score of 100 or worse at the
/// left edge (0.0).
pub fn position_from_score(score: f64) -> f64 {
    1.0 - score.clamp(0.0, SCORE_MAX) / SCORE_MAX
}

/// Status line under the indicator bar.
pub fn caqi_status(score: f64) -> &'static str {
    match score.max(0.0) as i64 {
        0..=33 => "A-MAZE-BALLS",
        34..=66 => "Open the windows, go out!",
        67..=99 => "It's ok...",
        100..=150 => "Bad, but will survive",
        _ => "Hazardous, do not open the windows",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reading(indexes: &[(&str, f64)], values: &[(&str, f64)]) -> AirQualityReading {
        AirQualityReading {
            indexes: indexes.iter().map(|(n, v)| NamedValue::new(n, *v)).collect(),
            values: values.iter().map(|(n, v)| NamedValue::new(n, *v)).collect(),
        }
    }

    #[test]
    fn test_position_bounds() {
        assert_eq!(position_from_score(0.0), 1.0);
        assert_eq!(position_from_score(100.0), 0.0);
        assert_eq!(position_from_score(150.0), 0.0);
        assert_eq!(position_from_score(-5.0), 1.0);
        assert!((position_from_score(25.0) - 0.75).abs() < 1e-9);
    }

    #[test]
    fn test_caqi_index_preferred() {
        let r = reading(&[("AIRLY_CAQI", 42.0)], &[("PM25", 10.0)]);
        assert_eq!(score_from_reading(&r), Some(42.0));
    }

    #[test]
    fn test_pm25_fallback_is_capped() {
        assert_eq!(score_from_reading(&reading(&[], &[("PM25", 12.5)])), Some(25.0));
        assert_eq!(score_from_reading(&reading(&[], &[("PM25", 80.0)])), Some(100.0));
    }

    #[test]
    fn test_no_usable_value() {
        assert_eq!(score_from_reading(&AirQualityReading::default()), None);
        let missing = AirQualityReading {
            indexes: vec![NamedValue { name: CAQI_INDEX.into(), value: None }],
            values: vec![NamedValue::new("PM10", 30.0)],
        };
        assert_eq!(score_from_reading(&missing), None);
        let nan = reading(&[("AIRLY_CAQI", f64::NAN)], &[]);
        assert_eq!(score_from_reading(&nan), None);
    }

    #[test]
    fn test_status_wording() {
        assert_eq!(caqi_status(12.0), "A-MAZE-BALLS");
        assert_eq!(caqi_status(50.0), "Open the windows, go out!");
        assert_eq!(caqi_status(99.9), "It's ok...");
        assert_eq!(caqi_status(120.0), "Bad, but will survive");
        assert_eq!(caqi_status(151.0), "Hazardous, do not open the windows");
        assert_eq!(caqi_status(-4.0), "A-MAZE-BALLS");
    }
}
