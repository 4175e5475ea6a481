/*
 *  services.rs
 *
 *  ambient-kiosk - adaptive display state engine
 *	(c) 2020-26 Stuart Hunter
 *
 *	collaborator contracts
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

//! Collaborator contracts. The engine only ever talks to these traits, the
//! concrete HTTP clients live in `geoloc`, `weather`, `airly` and `bvg`.

use crate::air_quality::AirQualityReading;
use crate::error::Result;
use crate::transit::Departure;
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    pub fn is_valid(&self) -> bool {
        (-90.0..=90.0).contains(&self.latitude) && (-180.0..=180.0).contains(&self.longitude)
    }
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.4}, {:.4})", self.latitude, self.longitude)
    }
}

/// A geocoded place.
#[derive(Debug, Clone, PartialEq)]
pub struct Place {
    pub coordinates: Coordinates,
    pub name: String,
    pub country: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurrentWeather {
    pub temperature_c: f64,
    pub weather_code: i32,
}

#[async_trait]
pub trait GeocodeClient: Send + Sync {
    /// Resolve a city name; `NotFound` when nothing matches.
    async fn resolve(&self, city: &str) -> Result<Place>;
}

#[async_trait]
pub trait WeatherClient: Send + Sync {
    async fn fetch_current(&self, at: Coordinates) -> Result<CurrentWeather>;
}

#[async_trait]
pub trait AirQualityClient: Send + Sync {
    /// Latest reading of the closest sensor; `NotFound` when none is in range.
    async fn fetch_nearest(&self, at: Coordinates) -> Result<AirQualityReading>;
}

#[async_trait]
pub trait TransitClient: Send + Sync {
    async fn fetch_departures(&self, station_id: &str) -> Result<Vec<Departure>>;
}

/// The fetchers a running engine uses.
#[derive(Clone)]
pub struct Services {
    pub weather: Arc<dyn WeatherClient>,
    /// None when no air quality API key is configured.
    pub air_quality: Option<Arc<dyn AirQualityClient>>,
    pub transit: Arc<dyn TransitClient>,
}
