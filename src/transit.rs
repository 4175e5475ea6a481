/*
 *  transit.rs
 *
 *  ambient-kiosk - adaptive display state engine
 *	(c) 2020-26 Stuart Hunter
 *
 *	departure grouping and formatting
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

//! Raw departures into the two rows of the transit board.

use crate::state::{DepartureTimes, Row, PLACEHOLDER};
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

pub const ROWS: usize = 2;
pub const SLOTS: usize = 3;
/// Slot text for a departure that is not there.
pub const MISSING: &str = "?";

/// Station boilerplate dropped from the end of destination names.
const DESTINATION_SUFFIXES: &[&str] = &["(Berlin)", "[Bus]", "[Tram]", "(S)", "(U)"];
/// Dropped only as a separate trailing word.
const DESTINATION_WORDS: &[&str] = &["Bhf", "Bahnhof"];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Departure {
    pub line: Option<String>,
    pub destination: Option<String>,
    /// RFC 3339 timestamp of the planned departure.
    pub scheduled: Option<String>,
    pub delay_secs: Option<i64>,
}

impl Departure {
    pub fn new(line: &str, destination: &str, scheduled: &str, delay_secs: Option<i64>) -> Self {
        Self {
            line: Some(line.to_string()),
            destination: Some(destination.to_string()),
            scheduled: Some(scheduled.to_string()),
            delay_secs,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LineKey {
    Named(String),
    /// Every departure without a usable line id lands here.
    Unknown,
}

impl LineKey {
    pub fn of(departure: &Departure) -> Self {
        match departure.line.as_deref().map(str::trim) {
            Some(line) if !line.is_empty() => LineKey::Named(line.to_string()),
            _ => LineKey::Unknown,
        }
    }

    pub fn label(&self) -> &str {
        match self {
            LineKey::Named(line) => line,
            LineKey::Unknown => MISSING,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LineGroup {
    pub key: LineKey,
    pub departures: Vec<Departure>,
}

/// Group by line in first-seen order, keeping only the first two lines.
pub fn group_by_line(departures: &[Departure]) -> Vec<LineGroup> {
    let mut groups: Vec<LineGroup> = Vec::with_capacity(ROWS);
    for departure in departures {
        let key = LineKey::of(departure);
        if let Some(group) = groups.iter_mut().find(|g| g.key == key) {
            group.departures.push(departure.clone());
        } else if groups.len() < ROWS {
            groups.push(LineGroup { key, departures: vec![departure.clone()] });
        }
    }
    groups
}

/// Strip trailing station boilerplate, e.g. "S Südkreuz Bhf (Berlin)" → "S Südkreuz".
pub fn normalize_destination(raw: &str) -> String {
    let mut name = raw.trim();
    loop {
        let before = name.len();
        for suffix in DESTINATION_SUFFIXES {
            if let Some(stripped) = name.strip_suffix(suffix) {
                name = stripped.trim_end();
            }
        }
        for word in DESTINATION_WORDS {
            if let Some(stripped) = name.strip_suffix(word) {
                if stripped.ends_with(char::is_whitespace) {
                    name = stripped.trim_end();
                }
            }
        }
        if name.len() == before {
            break;
        }
    }
    if name.is_empty() { raw.trim().to_string() } else { name.to_string() }
}

/// Minutes until departure, "m" or "m+d" when delayed; "--" for a bad timestamp.
pub fn format_slot(departure: &Departure, now: &DateTime<FixedOffset>) -> String {
    let Some(when) = departure
        .scheduled
        .as_deref()
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
    else {
        return PLACEHOLDER.to_string();
    };
    let secs = (when - *now).num_seconds() as f64;
    let minutes = ((secs / 60.0).round() as i64).max(0);
    let delay = departure
        .delay_secs
        .map(|d| (d as f64 / 60.0).round() as i64)
        .unwrap_or(0);
    if delay > 0 {
        format!("{}+{}", minutes, delay)
    } else {
        minutes.to_string()
    }
}

/// One display row from a line group's departures.
pub fn format_row(departures: &[Departure], now: &DateTime<FixedOffset>) -> Row {
    let Some(first) = departures.first() else {
        return Row::placeholder();
    };
    let line = LineKey::of(first).label().to_string();
    let destinations = first
        .destination
        .as_deref()
        .map(normalize_destination)
        .unwrap_or_else(|| PLACEHOLDER.to_string());

    let mut slots: [String; SLOTS] = std::array::from_fn(|_| MISSING.to_string());
    for (slot, departure) in slots.iter_mut().zip(departures.iter()) {
        *slot = format_slot(departure, now);
    }
    Row { line, destinations, times: DepartureTimes::Slots(slots) }
}

/// Both board rows, padded with placeholders when fewer lines depart.
pub fn aggregate(departures: &[Departure], now: &DateTime<FixedOffset>) -> [Row; ROWS] {
    let groups = group_by_line(departures);
    std::array::from_fn(|i| match groups.get(i) {
        Some(group) => format_row(&group.departures, now),
        None => Row::placeholder(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339("2026-05-04T08:00:00+02:00").unwrap()
    }

    #[test]
    fn test_group_first_seen_order() {
        let deps = vec![
            Departure::new("S42", "Ringbahn", "2026-05-04T08:03:00+02:00", None),
            Departure::new("S41", "Ringbahn", "2026-05-04T08:05:00+02:00", None),
            Departure::new("S42", "Ringbahn", "2026-05-04T08:08:00+02:00", None),
        ];
        let groups = group_by_line(&deps);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].key, LineKey::Named("S42".into()));
        assert_eq!(groups[0].departures.len(), 2);
        assert_eq!(groups[1].key, LineKey::Named("S41".into()));
        assert_eq!(groups[1].departures.len(), 1);
    }

    #[test]
    fn test_third_line_dropped() {
        let deps = vec![
            Departure::new("U8", "Wittenau", "2026-05-04T08:01:00+02:00", None),
            Departure::new("M10", "Warschauer", "2026-05-04T08:02:00+02:00", None),
            Departure::new("N5", "Hackescher", "2026-05-04T08:03:00+02:00", None),
            Departure::new("U8", "Wittenau", "2026-05-04T08:06:00+02:00", None),
        ];
        let groups = group_by_line(&deps);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].departures.len(), 2);
    }

    #[test]
    fn test_missing_lines_share_unknown_group() {
        let mut a = Departure::new("", "Somewhere", "2026-05-04T08:01:00+02:00", None);
        a.line = None;
        let b = Departure::new("  ", "Elsewhere", "2026-05-04T08:04:00+02:00", None);
        let groups = group_by_line(&[a, b]);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].key, LineKey::Unknown);
        let row = format_row(&groups[0].departures, &now());
        assert_eq!(row.line, "?");
    }

    #[test]
    fn test_delay_and_padding() {
        let deps = vec![Departure::new("S42", "Ringbahn", "2026-05-04T08:07:00+02:00", Some(120))];
        let row = format_row(&deps, &now());
        assert_eq!(row.times, DepartureTimes::Slots(["7+2".into(), "?".into(), "?".into()]));
    }

    #[test]
    fn test_minutes_rounding_and_floor() {
        let deps = vec![
            Departure::new("S1", "Wannsee", "2026-05-04T07:58:00+02:00", None),
            Departure::new("S1", "Wannsee", "2026-05-04T08:02:31+02:00", Some(20)),
            Departure::new("S1", "Wannsee", "2026-05-04T06:10:00Z", Some(-60)),
        ];
        let row = format_row(&deps, &now());
        assert_eq!(row.times, DepartureTimes::Slots(["0".into(), "3".into(), "10".into()]));
    }

    #[test]
    fn test_unparseable_time_is_placeholder_slot() {
        let deps = vec![
            Departure::new("S1", "Wannsee", "soon", None),
            Departure::new("S1", "Wannsee", "2026-05-04T08:04:00+02:00", None),
        ];
        let row = format_row(&deps, &now());
        assert_eq!(row.times, DepartureTimes::Slots(["--".into(), "4".into(), "?".into()]));
    }

    #[test]
    fn test_empty_group_row_level_placeholder() {
        let row = format_row(&[], &now());
        assert_eq!(row, Row { line: "--".into(), destinations: "--".into(), times: DepartureTimes::Placeholder });
    }

    #[test]
    fn test_aggregate_pads_rows() {
        let deps = vec![Departure::new("M10", "S+U Hauptbahnhof", "2026-05-04T08:12:00+02:00", None)];
        let rows = aggregate(&deps, &now());
        assert_eq!(rows[0].line, "M10");
        assert_eq!(rows[1], Row::placeholder());
        assert_eq!(aggregate(&[], &now()), [Row::placeholder(), Row::placeholder()]);
    }

    #[test]
    fn test_normalize_destination() {
        assert_eq!(normalize_destination("S Südkreuz Bhf (Berlin)"), "S Südkreuz");
        assert_eq!(normalize_destination("Zoologischer Garten [Bus]"), "Zoologischer Garten");
        assert_eq!(normalize_destination("Alexanderplatz (U)"), "Alexanderplatz");
        assert_eq!(normalize_destination("Ringbahn"), "Ringbahn");
        assert_eq!(normalize_destination("Bhf"), "Bhf");
        assert_eq!(normalize_destination("Hauptbahnhof"), "Hauptbahnhof");
        assert_eq!(normalize_destination("S Westend Bahnhof"), "S Westend");
    }

    #[test]
    fn test_word_suffix_needs_a_word_boundary() {
        assert_eq!(normalize_destination("Neuer Bhf"), "Neuer");
        assert_eq!(normalize_destination("Am Alten-Bahnhof"), "Am Alten-Bahnhof");
        assert_eq!(normalize_destination("S+U Hauptbhf"), "S+U Hauptbhf");
        assert_eq!(normalize_destination("Ostbahnhof (Berlin)"), "Ostbahnhof");
    }
}
