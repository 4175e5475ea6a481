/*
 *  weather.rs
 *
 *  ambient-kiosk - adaptive display state engine
 *	(c) 2020-26 Stuart Hunter
 *
 *	Open-Meteo current weather and WMO codes
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

use crate::error::Result;
use crate::http::send_json;
use crate::services::{Coordinates, CurrentWeather, WeatherClient};
use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use serde::Deserialize;

pub const OPEN_METEO_FORECAST_URL: &str = "https://api.open-meteo.com/v1/forecast";

/// WMO codes that paint the rain mood (drizzle, rain, showers, thunder).
pub const RAIN_CODES: [i32; 12] = [51, 53, 55, 61, 63, 65, 80, 81, 82, 95, 96, 99];
/// Snowfall, snow grains and snow showers.
pub const SNOW_CODES: [i32; 6] = [71, 73, 75, 77, 85, 86];
/// Partly cloudy, overcast and fog.
pub const CLOUD_CODES: [i32; 4] = [2, 3, 45, 48];

/// Visual family of a weather code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeatherFamily {
    Rain,
    Snow,
    Cloud,
    Clear,
}

impl WeatherFamily {
    /// Total over every integer; unknown codes read as clear sky.
    pub fn of(code: i32) -> Self {
        if RAIN_CODES.contains(&code) {
            WeatherFamily::Rain
        } else if SNOW_CODES.contains(&code) {
            WeatherFamily::Snow
        } else if CLOUD_CODES.contains(&code) {
            WeatherFamily::Cloud
        } else {
            WeatherFamily::Clear
        }
    }
}

/// Human readable text for a WMO weather interpretation code.
pub fn describe(code: i32) -> &'static str {
    match code {
        0 => "Clear sky",
        1 => "Mainly clear",
        2 => "Partly cloudy",
        3 => "Overcast",
        45 => "Foggy",
        48 => "Depositing rime fog",
        51 => "Light drizzle",
        53 => "Moderate drizzle",
        55 => "Dense drizzle",
        61 => "Slight rain",
        63 => "Moderate rain",
        65 => "Heavy rain",
        71 => "Slight snow",
        73 => "Moderate snow",
        75 => "Heavy snow",
        77 => "Snow grains",
        80 => "Slight rain showers",
        81 => "Moderate rain showers",
        82 => "Violent rain showers",
        85 => "Slight snow showers",
        86 => "Heavy snow showers",
        95 => "Thunderstorm",
        96 => "Thunderstorm with slight hail",
        99 => "Thunderstorm with heavy hail",
        _ => "Unknown",
    }
}

/// "17°" style, rounded to whole degrees.
pub fn format_temperature(celsius: f64) -> String {
    format!("{}°", celsius.round() as i64)
}

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    current: CurrentBlock,
}

#[derive(Debug, Deserialize)]
struct CurrentBlock {
    temperature_2m: f64,
    weather_code: i32,
}

/// Open-Meteo current conditions, no API key required.
pub struct OpenMeteoWeather {
    client: Client,
    base_url: String,
}

impl OpenMeteoWeather {
    pub fn new(client: Client) -> Self {
        Self::with_base_url(client, OPEN_METEO_FORECAST_URL)
    }

    pub fn with_base_url(client: Client, base_url: &str) -> Self {
        Self { client, base_url: base_url.to_string() }
    }
}

#[async_trait]
impl WeatherClient for OpenMeteoWeather {
    async fn fetch_current(&self, at: Coordinates) -> Result<CurrentWeather> {
        debug!("fetching current weather for {}", at);
        let request = self.client.get(&self.base_url).query(&[
            ("latitude", at.latitude.to_string()),
            ("longitude", at.longitude.to_string()),
            ("current", "temperature_2m,weather_code".to_string()),
            ("timezone", "auto".to_string()),
        ]);
        let body: ForecastResponse = send_json(request, 2).await?;
        Ok(CurrentWeather {
            temperature_c: body.current.temperature_2m,
            weather_code: body.current.weather_code,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weather_families() {
        assert_eq!(WeatherFamily::of(61), WeatherFamily::Rain);
        assert_eq!(WeatherFamily::of(99), WeatherFamily::Rain);
        assert_eq!(WeatherFamily::of(77), WeatherFamily::Snow);
        assert_eq!(WeatherFamily::of(45), WeatherFamily::Cloud);
        assert_eq!(WeatherFamily::of(0), WeatherFamily::Clear);
        assert_eq!(WeatherFamily::of(1), WeatherFamily::Clear);
        assert_eq!(WeatherFamily::of(-7), WeatherFamily::Clear);
        assert_eq!(WeatherFamily::of(i32::MAX), WeatherFamily::Clear);
    }

    #[test]
    fn test_describe_codes() {
        assert_eq!(describe(3), "Overcast");
        assert_eq!(describe(96), "Thunderstorm with slight hail");
        assert_eq!(describe(42), "Unknown");
    }

    #[test]
    fn test_format_temperature() {
        assert_eq!(format_temperature(17.4), "17°");
        assert_eq!(format_temperature(-0.6), "-1°");
        assert_eq!(format_temperature(2.5), "3°");
    }

    #[test]
    fn test_parse_forecast_payload() {
        let raw = r#"{"latitude":52.52,"current":{"time":"2026-01-01T10:00","temperature_2m":3.2,"weather_code":61}}"#;
        let body: ForecastResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(body.current.weather_code, 61);
        assert!((body.current.temperature_2m - 3.2).abs() < f64::EPSILON);
    }
}
