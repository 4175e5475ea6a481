/*
 *  airly.rs
 *
 *  ambient-kiosk - adaptive display state engine
 *	(c) 2020-26 Stuart Hunter
 *
 *	Airly v2 nearest sensor client
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

use crate::air_quality::AirQualityReading;
use crate::error::{KioskError, Result};
use crate::http::send_json;
use crate::services::{AirQualityClient, Coordinates};
use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use serde::Deserialize;

pub const AIRLY_BASE_URL: &str = "https://airapi.airly.eu/v2";

#[derive(Debug, Deserialize)]
struct Installation {
    id: i64,
}

#[derive(Debug, Deserialize)]
struct Measurements {
    current: AirQualityReading,
}

/// Airly v2: nearest installation, then its current measurements.
pub struct AirlyClient {
    client: Client,
    api_key: String,
    base_url: String,
    max_distance_km: f64,
}

impl AirlyClient {
    pub fn new(client: Client, api_key: &str, max_distance_km: f64) -> Self {
        Self {
            client,
            api_key: api_key.to_string(),
            base_url: AIRLY_BASE_URL.to_string(),
            max_distance_km,
        }
    }

    async fn nearest_installation(&self, at: Coordinates) -> Result<i64> {
        let url = format!("{}/installations/nearest", self.base_url);
        let request = self
            .client
            .get(url)
            .header("apikey", &self.api_key)
            .query(&[
                ("lat", at.latitude.to_string()),
                ("lng", at.longitude.to_string()),
                ("maxDistanceKM", self.max_distance_km.to_string()),
                ("maxResults", "1".to_string()),
            ]);
        let found: Vec<Installation> = send_json(request, 2).await?;
        found
            .first()
            .map(|i| i.id)
            .ok_or_else(|| KioskError::NotFound(format!("no installation within {} km of {}", self.max_distance_km, at)))
    }
}

#[async_trait]
impl AirQualityClient for AirlyClient {
    async fn fetch_nearest(&self, at: Coordinates) -> Result<AirQualityReading> {
        let id = self.nearest_installation(at).await?;
        debug!("airly installation {}", id);
        let url = format!("{}/measurements/installation", self.base_url);
        let request = self
            .client
            .get(url)
            .header("apikey", &self.api_key)
            .query(&[("installationId", id.to_string())]);
        let body: Measurements = send_json(request, 2).await?;
        Ok(body.current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::air_quality::score_from_reading;

    #[test]
    fn test_parse_measurements() {
        let raw = r#"{"current":{"fromDateTime":"2026-03-01T10:00:00Z",
            "values":[{"name":"PM1","value":7.1},{"name":"PM25","value":11.3}],
            "indexes":[{"name":"AIRLY_CAQI","value":21.8,"level":"VERY_LOW"}],
            "standards":[]}}"#;
        let body: Measurements = serde_json::from_str(raw).unwrap();
        assert_eq!(score_from_reading(&body.current), Some(21.8));
    }

    #[test]
    fn test_parse_installations() {
        let found: Vec<Installation> = serde_json::from_str(r#"[{"id":8077,"location":{}}]"#).unwrap();
        assert_eq!(found[0].id, 8077);
        let none: Vec<Installation> = serde_json::from_str("[]").unwrap();
        assert!(none.is_empty());
    }
}
