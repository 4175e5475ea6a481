/*
 *  config.rs
 *
 *  ambient-kiosk - adaptive display state engine
 *	(c) 2020-26 Stuart Hunter
 *
 *	layered YAML + CLI configuration
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

use clap::{ArgAction, Parser, ValueHint};
use dirs_next::home_dir;
use serde::{Deserialize, Serialize};
use std::{fs, path::{Path, PathBuf}, time::Duration};
use thiserror::Error;

use crate::location::LocationRequest;

pub const DEFAULT_STATION_ID: &str = "900120003"; // S Ostkreuz
pub const DEFAULT_AQ_HOURS: [u32; 3] = [6, 15, 20];
pub const DEFAULT_WIDTH: u32 = 800;
pub const DEFAULT_HEIGHT: u32 = 480;

/// Error type for config loading/validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Validation error: {0}")]
    Validation(String),
}

/// Top-level kiosk configuration; every field is optional and falls back
/// to the defaults exposed by the accessor methods.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    pub log_level: Option<String>,     // e.g., "info" | "debug"
    pub debug: Option<bool>,           // overlay + demo at start
    pub fetch_timeout_secs: Option<u64>,
    pub location: Option<LocationConfig>,
    pub weather: Option<WeatherConfig>,
    pub air_quality: Option<AirQualityConfig>,
    pub transit: Option<TransitConfig>,
    pub clock: Option<ClockConfig>,
    pub display: Option<DisplayConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LocationConfig {
    pub city: Option<String>,
    pub country: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct WeatherConfig {
    pub interval_mins: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AirQualityConfig {
    pub api_key: Option<String>,
    pub hours: Option<Vec<u32>>,
    pub max_distance_km: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TransitConfig {
    pub station_id: Option<String>,
    pub interval_mins: Option<u64>,
    pub base_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ClockConfig {
    pub interval_secs: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DisplayConfig {
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub snapshot: Option<PathBuf>,   // PPM written on every changed frame
    pub transition_ms: Option<u64>,
    pub demo_stage_ms: Option<u64>,
}

/// CLI overrides. All fields are Options so we can layer them over YAML.
#[derive(Debug, Parser, Clone, Default)]
#[command(name = "ambient-kiosk", version, about = "Ambient weather, air quality and transit kiosk")]
pub struct Cli {
    /// Path to a YAML config file (overrides search)
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,
    #[arg(long)]
    pub log_level: Option<String>,
    /// debug overlay and a demo run at start
    #[arg(short = 'v', long, action = ArgAction::SetTrue)]
    pub debug: bool,
    #[arg(long)]
    pub city: Option<String>,
    #[arg(long)]
    pub country: Option<String>,
    #[arg(long, allow_negative_numbers = true)]
    pub latitude: Option<f64>,
    #[arg(long, allow_negative_numbers = true)]
    pub longitude: Option<f64>,
    /// transit stop id
    #[arg(long)]
    pub station: Option<String>,
    #[arg(long, env = "AIRLY_API_KEY", hide_env_values = true)]
    pub airly_api_key: Option<String>,
    /// comma separated hours, e.g. 6,15,20
    #[arg(long, value_delimiter = ',')]
    pub aq_hours: Option<Vec<u32>>,
    #[arg(long)]
    pub weather_interval_mins: Option<u64>,
    #[arg(long)]
    pub transit_interval_mins: Option<u64>,
    #[arg(long)]
    pub clock_interval_secs: Option<u64>,
    #[arg(long)]
    pub fetch_timeout_secs: Option<u64>,
    #[arg(long)]
    pub width: Option<u32>,
    #[arg(long)]
    pub height: Option<u32>,
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub snapshot: Option<PathBuf>,
    /// dump fully merged config (after overrides) and exit
    #[arg(long, action = ArgAction::SetTrue)]
    pub dump_config: bool,
}

/// Defaults, then YAML, then CLI overrides, then validation.
pub fn load(cli: &Cli) -> Result<Config, ConfigError> {
    let mut cfg = Config::default();

    if let Some(p) = cli.config.as_ref() {
        if p.exists() {
            let y = read_yaml(p)?;
            merge(&mut cfg, y);
        } else {
            return Err(ConfigError::Validation(format!(
                "Config file not found: {}",
                p.display()
            )));
        }
    } else if let Some(p) = find_config_file() {
        let y = read_yaml(&p)?;
        merge(&mut cfg, y);
    }

    apply_cli_overrides(&mut cfg, cli);
    validate(&cfg)?;
    Ok(cfg)
}

/// Try common locations in order (first hit wins).
fn find_config_file() -> Option<PathBuf> {
    if let Some(home) = home_dir() {
        let p = home.join(".config/ambient-kiosk/config.yaml");
        if p.exists() { return Some(p) }
        let p = home.join(".config/ambient-kiosk.yaml");
        if p.exists() { return Some(p) }
    }
    for candidate in &["ambient-kiosk.yaml", "config/ambient-kiosk.yaml"] {
        let p = PathBuf::from(candidate);
        if p.exists() { return Some(p) }
    }
    None
}

fn read_yaml(path: &Path) -> Result<Config, ConfigError> {
    let s = fs::read_to_string(path)?;
    parse_yaml(&s)
}

pub fn parse_yaml(s: &str) -> Result<Config, ConfigError> {
    Ok(serde_yaml::from_str(s)?)
}

/// Merge two option-only sections field by field.
macro_rules! merge_fields {
    ($dst:expr, $src:expr, $($field:ident),+) => {
        $( if $src.$field.is_some() { $dst.$field = $src.$field; } )+
    };
}

/// Section-wise merge: a section present in `src` overlays `dst` field by field.
macro_rules! merge_section {
    ($dst:expr, $src:expr, $($field:ident),+) => {
        match (&mut $dst, $src) {
            (None, Some(s)) => $dst = Some(s),
            (Some(d), Some(s)) => { merge_fields!(d, s, $($field),+); }
            _ => {}
        }
    };
}

/// Shallow merge `src` into `dst`, Option-by-Option.
fn merge(dst: &mut Config, src: Config) {
    if src.log_level.is_some()          { dst.log_level = src.log_level; }
    if src.debug.is_some()              { dst.debug = src.debug; }
    if src.fetch_timeout_secs.is_some() { dst.fetch_timeout_secs = src.fetch_timeout_secs; }
    merge_section!(dst.location, src.location, city, country, latitude, longitude);
    merge_section!(dst.weather, src.weather, interval_mins);
    merge_section!(dst.air_quality, src.air_quality, api_key, hours, max_distance_km);
    merge_section!(dst.transit, src.transit, station_id, interval_mins, base_url);
    merge_section!(dst.clock, src.clock, interval_secs);
    merge_section!(dst.display, src.display, width, height, snapshot, transition_ms, demo_stage_ms);
}

fn apply_cli_overrides(cfg: &mut Config, cli: &Cli) {
    if cli.log_level.is_some()          { cfg.log_level = cli.log_level.clone(); }
    if cli.debug                        { cfg.debug = Some(true); }
    if cli.fetch_timeout_secs.is_some() { cfg.fetch_timeout_secs = cli.fetch_timeout_secs; }

    let location = cfg.location.get_or_insert_with(LocationConfig::default);
    if cli.city.is_some()      { location.city = cli.city.clone(); }
    if cli.country.is_some()   { location.country = cli.country.clone(); }
    if cli.latitude.is_some()  { location.latitude = cli.latitude; }
    if cli.longitude.is_some() { location.longitude = cli.longitude; }

    if cli.weather_interval_mins.is_some() {
        cfg.weather.get_or_insert_with(WeatherConfig::default).interval_mins = cli.weather_interval_mins;
    }
    if cli.clock_interval_secs.is_some() {
        cfg.clock.get_or_insert_with(ClockConfig::default).interval_secs = cli.clock_interval_secs;
    }

    if cli.airly_api_key.is_some() || cli.aq_hours.is_some() {
        let aq = cfg.air_quality.get_or_insert_with(AirQualityConfig::default);
        if cli.airly_api_key.is_some() { aq.api_key = cli.airly_api_key.clone(); }
        if cli.aq_hours.is_some()      { aq.hours = cli.aq_hours.clone(); }
    }

    if cli.station.is_some() || cli.transit_interval_mins.is_some() {
        let transit = cfg.transit.get_or_insert_with(TransitConfig::default);
        if cli.station.is_some()               { transit.station_id = cli.station.clone(); }
        if cli.transit_interval_mins.is_some() { transit.interval_mins = cli.transit_interval_mins; }
    }

    if cli.width.is_some() || cli.height.is_some() || cli.snapshot.is_some() {
        let display = cfg.display.get_or_insert_with(DisplayConfig::default);
        if cli.width.is_some()    { display.width = cli.width; }
        if cli.height.is_some()   { display.height = cli.height; }
        if cli.snapshot.is_some() { display.snapshot = cli.snapshot.clone(); }
    }
}

/// Put any invariants here (required fields, ranges, etc.)
pub fn validate(cfg: &Config) -> Result<(), ConfigError> {
    let positive = [
        ("weather.interval_mins", cfg.weather.as_ref().and_then(|w| w.interval_mins)),
        ("transit.interval_mins", cfg.transit.as_ref().and_then(|t| t.interval_mins)),
        ("clock.interval_secs", cfg.clock.as_ref().and_then(|c| c.interval_secs)),
        ("fetch_timeout_secs", cfg.fetch_timeout_secs),
    ];
    for (name, value) in positive {
        if value == Some(0) {
            return Err(ConfigError::Validation(format!("{} must be > 0", name)));
        }
    }
    if let Some(hours) = cfg.air_quality.as_ref().and_then(|a| a.hours.as_ref()) {
        if let Some(bad) = hours.iter().find(|h| **h > 23) {
            return Err(ConfigError::Validation(format!("air_quality.hours: {} is not an hour of the day", bad)));
        }
    }
    if let Some(display) = cfg.display.as_ref() {
        if display.width == Some(0) || display.height == Some(0) {
            return Err(ConfigError::Validation("display width/height must be > 0".into()));
        }
    }
    if let Some(station) = cfg.transit.as_ref().and_then(|t| t.station_id.as_deref()) {
        if station.trim().is_empty() {
            return Err(ConfigError::Validation("transit.station_id must not be empty".into()));
        }
    }
    Ok(())
}

impl Config {
    pub fn debug(&self) -> bool {
        self.debug.unwrap_or(false)
    }

    pub fn log_level(&self) -> &str {
        match self.log_level.as_deref() {
            Some(level) => level,
            None if self.debug() => "debug",
            None => "info",
        }
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs.unwrap_or(10))
    }

    pub fn location_request(&self) -> LocationRequest {
        let l = self.location.clone().unwrap_or_default();
        LocationRequest {
            city: l.city.or_else(|| Some("Berlin".to_string())),
            country: l.country,
            latitude: l.latitude,
            longitude: l.longitude,
        }
    }

    pub fn weather_interval(&self) -> Duration {
        Duration::from_secs(60 * self.weather.as_ref().and_then(|w| w.interval_mins).unwrap_or(30))
    }

    pub fn clock_interval(&self) -> Duration {
        Duration::from_secs(self.clock.as_ref().and_then(|c| c.interval_secs).unwrap_or(60))
    }

    pub fn transit_interval(&self) -> Duration {
        Duration::from_secs(60 * self.transit.as_ref().and_then(|t| t.interval_mins).unwrap_or(5))
    }

    pub fn station_id(&self) -> String {
        self.transit
            .as_ref()
            .and_then(|t| t.station_id.clone())
            .unwrap_or_else(|| DEFAULT_STATION_ID.to_string())
    }

    pub fn transit_base_url(&self) -> Option<&str> {
        self.transit.as_ref().and_then(|t| t.base_url.as_deref())
    }

    pub fn airly_api_key(&self) -> Option<&str> {
        self.air_quality
            .as_ref()
            .and_then(|a| a.api_key.as_deref())
            .filter(|k| !k.trim().is_empty())
    }

    pub fn aq_hours(&self) -> Vec<u32> {
        self.air_quality
            .as_ref()
            .and_then(|a| a.hours.clone())
            .unwrap_or_else(|| DEFAULT_AQ_HOURS.to_vec())
    }

    pub fn aq_max_distance_km(&self) -> f64 {
        self.air_quality.as_ref().and_then(|a| a.max_distance_km).unwrap_or(5.0)
    }

    pub fn surface_size(&self) -> (u32, u32) {
        let d = self.display.as_ref();
        (
            d.and_then(|d| d.width).unwrap_or(DEFAULT_WIDTH),
            d.and_then(|d| d.height).unwrap_or(DEFAULT_HEIGHT),
        )
    }

    pub fn snapshot_path(&self) -> Option<PathBuf> {
        self.display.as_ref().and_then(|d| d.snapshot.clone())
    }

    pub fn transition(&self) -> Duration {
        Duration::from_millis(self.display.as_ref().and_then(|d| d.transition_ms).unwrap_or(2000))
    }

    pub fn demo_stage(&self) -> Duration {
        Duration::from_millis(self.display.as_ref().and_then(|d| d.demo_stage_ms).unwrap_or(3000))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const YAML: &str = r#"
log_level: warn
location:
  city: Kraków
  country: Poland
air_quality:
  api_key: file-key
  hours: [7, 19]
transit:
  station_id: "900100003"
display:
  width: 1024
"#;

    #[test]
    fn test_defaults() {
        let cfg = Config::default();
        assert_eq!(cfg.aq_hours(), vec![6, 15, 20]);
        assert_eq!(cfg.weather_interval(), Duration::from_secs(1800));
        assert_eq!(cfg.clock_interval(), Duration::from_secs(60));
        assert_eq!(cfg.transit_interval(), Duration::from_secs(300));
        assert_eq!(cfg.fetch_timeout(), Duration::from_secs(10));
        assert_eq!(cfg.surface_size(), (800, 480));
        assert_eq!(cfg.station_id(), DEFAULT_STATION_ID);
        assert_eq!(cfg.log_level(), "info");
        assert!(cfg.airly_api_key().is_none());
    }

    #[test]
    fn test_yaml_then_cli() {
        let mut cfg = Config::default();
        merge(&mut cfg, parse_yaml(YAML).unwrap());
        let cli = Cli::try_parse_from([
            "ambient-kiosk",
            "--airly-api-key", "cli-key",
            "--aq-hours", "6,12",
            "--height", "600",
            "-v",
        ])
        .unwrap();
        apply_cli_overrides(&mut cfg, &cli);
        validate(&cfg).unwrap();

        assert_eq!(cfg.airly_api_key(), Some("cli-key"));
        assert_eq!(cfg.aq_hours(), vec![6, 12]);
        assert_eq!(cfg.surface_size(), (1024, 600));
        assert_eq!(cfg.station_id(), "900100003");
        assert_eq!(cfg.location_request().city.as_deref(), Some("Kraków"));
        assert!(cfg.debug());
        assert_eq!(cfg.log_level(), "warn");
    }

    #[test]
    fn test_merge_keeps_unset_fields() {
        let mut cfg = parse_yaml(YAML).unwrap();
        merge(&mut cfg, parse_yaml("location:\n  country: PL\n").unwrap());
        let loc = cfg.location.unwrap();
        assert_eq!(loc.city.as_deref(), Some("Kraków"));
        assert_eq!(loc.country.as_deref(), Some("PL"));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let hours = parse_yaml("air_quality:\n  hours: [6, 24]\n").unwrap();
        assert!(matches!(validate(&hours), Err(ConfigError::Validation(_))));
        let interval = parse_yaml("weather:\n  interval_mins: 0\n").unwrap();
        assert!(validate(&interval).is_err());
        let size = parse_yaml("display:\n  width: 0\n").unwrap();
        assert!(validate(&size).is_err());
    }

    #[test]
    fn test_missing_explicit_file() {
        let cli = Cli { config: Some(PathBuf::from("/nonexistent/kiosk.yaml")), ..Default::default() };
        assert!(matches!(load(&cli), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_negative_longitude_on_cli() {
        let cli = Cli::try_parse_from(["ambient-kiosk", "--latitude", "40.7", "--longitude", "-74.0"]).unwrap();
        assert_eq!(cli.longitude, Some(-74.0));
    }
}
