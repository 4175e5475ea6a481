/*
 *  geoloc.rs
 *
 *  ambient-kiosk - adaptive display state engine
 *	(c) 2020-26 Stuart Hunter
 *
 *	Open-Meteo geocoding
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

use crate::error::{KioskError, Result};
use crate::http::send_json;
use crate::services::{Coordinates, GeocodeClient, Place};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

pub const OPEN_METEO_GEOCODING_URL: &str = "https://geocoding-api.open-meteo.com/v1/search";

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    latitude: f64,
    longitude: f64,
    name: String,
    country: Option<String>,
}

fn first_place(body: SearchResponse, city: &str) -> Result<Place> {
    let hit = body
        .results
        .into_iter()
        .next()
        .ok_or_else(|| KioskError::NotFound(format!("no geocoding match for '{}'", city)))?;
    Ok(Place {
        coordinates: Coordinates::new(hit.latitude, hit.longitude),
        name: hit.name,
        country: hit.country,
    })
}

/// City name lookup against the Open-Meteo geocoding API.
pub struct OpenMeteoGeocoder {
    client: Client,
    base_url: String,
}

impl OpenMeteoGeocoder {
    pub fn new(client: Client) -> Self {
        Self { client, base_url: OPEN_METEO_GEOCODING_URL.to_string() }
    }
}

#[async_trait]
impl GeocodeClient for OpenMeteoGeocoder {
    async fn resolve(&self, city: &str) -> Result<Place> {
        let request = self.client.get(&self.base_url).query(&[
            ("name", city),
            ("count", "1"),
            ("language", "en"),
            ("format", "json"),
        ]);
        let body: SearchResponse = send_json(request, 2).await?;
        first_place(body, city)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_hit_wins() {
        let raw = r#"{"results":[{"latitude":48.137,"longitude":11.575,"name":"Munich","country":"Germany"},
                                  {"latitude":0.0,"longitude":0.0,"name":"Other"}]}"#;
        let body: SearchResponse = serde_json::from_str(raw).unwrap();
        let place = first_place(body, "Munich").unwrap();
        assert_eq!(place.name, "Munich");
        assert_eq!(place.country.as_deref(), Some("Germany"));
        assert_eq!(place.coordinates, Coordinates::new(48.137, 11.575));
    }

    #[test]
    fn test_missing_results_is_not_found() {
        // the API omits "results" entirely when nothing matches
        let body: SearchResponse = serde_json::from_str(r#"{"generationtime_ms":0.3}"#).unwrap();
        assert!(matches!(first_place(body, "Nowhere"), Err(KioskError::NotFound(_))));
    }
}
