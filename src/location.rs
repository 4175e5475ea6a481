/*
 *  location.rs
 *
 *  ambient-kiosk - adaptive display state engine
 *	(c) 2020-26 Stuart Hunter
 *
 *	kiosk location resolution
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

use crate::services::{Coordinates, GeocodeClient};
use log::{info, warn};
use std::fmt;
use std::time::Duration;

pub const FALLBACK_COORDINATES: Coordinates = Coordinates::new(52.52, 13.405);
pub const FALLBACK_LABEL: &str = "Berlin, Germany";

/// Where the kiosk is, and the label shown at the top of the screen.
#[derive(Debug, Clone, PartialEq)]
pub struct Location {
    pub coordinates: Coordinates,
    pub label: String,
    pub source: LocationSource,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocationSource {
    UserConfig,
    Geocoded,
    Fallback,
}

impl Location {
    pub fn fallback() -> Self {
        Self {
            coordinates: FALLBACK_COORDINATES,
            label: FALLBACK_LABEL.to_string(),
            source: LocationSource::Fallback,
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let source = match self.source {
            LocationSource::UserConfig => "config",
            LocationSource::Geocoded => "geocoded",
            LocationSource::Fallback => "fallback",
        };
        write!(f, "{} {} [{}]", self.label, self.coordinates, source)
    }
}

/// "City, Country", or just the city.
pub fn place_label(city: &str, country: Option<&str>) -> String {
    match country.map(str::trim).filter(|c| !c.is_empty()) {
        Some(country) => format!("{}, {}", city.trim(), country),
        None => city.trim().to_string(),
    }
}

/// What the user asked for.
#[derive(Debug, Clone, Default)]
pub struct LocationRequest {
    pub city: Option<String>,
    pub country: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

/// Configured coordinates first, then geocoding of the configured city,
/// then the built-in default. Never fails.
pub async fn resolve_location(request: &LocationRequest, geocoder: &dyn GeocodeClient, timeout: Duration) -> Location {
    if let (Some(lat), Some(lng)) = (request.latitude, request.longitude) {
        let coordinates = Coordinates::new(lat, lng);
        if coordinates.is_valid() {
            info!("Using location from config: {}", coordinates);
            let label = request
                .city
                .as_deref()
                .map(|c| place_label(c, request.country.as_deref()))
                .unwrap_or_else(|| format!("{:.2}, {:.2}", lat, lng));
            return Location { coordinates, label, source: LocationSource::UserConfig };
        }
        warn!("Invalid coordinates in config: {}, {}", lat, lng);
    }

    let Some(city) = request.city.as_deref().filter(|c| !c.trim().is_empty()) else {
        info!("No location configured, using {}", FALLBACK_LABEL);
        return Location::fallback();
    };

    match tokio::time::timeout(timeout, geocoder.resolve(city)).await {
        Ok(Ok(place)) => {
            let country = request.country.as_deref().or(place.country.as_deref());
            let location = Location {
                coordinates: place.coordinates,
                label: place_label(&place.name, country),
                source: LocationSource::Geocoded,
            };
            info!("Geocoded {}: {}", city, location);
            location
        }
        Ok(Err(e)) => {
            warn!("Geocoding '{}' failed: {}, using {}", city, e, FALLBACK_LABEL);
            Location::fallback()
        }
        Err(_) => {
            warn!("Geocoding '{}' timed out, using {}", city, FALLBACK_LABEL);
            Location::fallback()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{KioskError, Result};
    use crate::services::Place;
    use async_trait::async_trait;

    struct FixedGeocoder(Option<Place>);

    #[async_trait]
    impl GeocodeClient for FixedGeocoder {
        async fn resolve(&self, city: &str) -> Result<Place> {
            self.0.clone().ok_or_else(|| KioskError::NotFound(city.to_string()))
        }
    }

    fn munich() -> FixedGeocoder {
        FixedGeocoder(Some(Place {
            coordinates: Coordinates::new(48.137, 11.575),
            name: "Munich".into(),
            country: Some("Germany".into()),
        }))
    }

    #[tokio::test]
    async fn test_config_location() {
        let req = LocationRequest {
            city: Some("New York".into()),
            country: Some("USA".into()),
            latitude: Some(40.7128),
            longitude: Some(-74.0060),
        };
        let loc = resolve_location(&req, &munich(), Duration::from_secs(1)).await;
        assert_eq!(loc.coordinates, Coordinates::new(40.7128, -74.0060));
        assert_eq!(loc.label, "New York, USA");
        assert_eq!(loc.source, LocationSource::UserConfig);
    }

    #[tokio::test]
    async fn test_geocoded_city() {
        let req = LocationRequest { city: Some("Munich".into()), ..Default::default() };
        let loc = resolve_location(&req, &munich(), Duration::from_secs(1)).await;
        assert_eq!(loc.source, LocationSource::Geocoded);
        assert_eq!(loc.label, "Munich, Germany");
    }

    #[tokio::test]
    async fn test_invalid_coordinates_fall_through_to_geocoder() {
        let req = LocationRequest {
            city: Some("Munich".into()),
            latitude: Some(100.0),
            longitude: Some(-74.0),
            ..Default::default()
        };
        let loc = resolve_location(&req, &munich(), Duration::from_secs(1)).await;
        assert_eq!(loc.source, LocationSource::Geocoded);
    }

    #[tokio::test]
    async fn test_geocode_failure_falls_back() {
        let req = LocationRequest { city: Some("Atlantis".into()), ..Default::default() };
        let loc = resolve_location(&req, &FixedGeocoder(None), Duration::from_secs(1)).await;
        assert_eq!(loc, Location::fallback());
        assert_eq!(loc.label, "Berlin, Germany");
    }

    #[test]
    fn test_place_label() {
        assert_eq!(place_label("Kraków", Some("Poland")), "Kraków, Poland");
        assert_eq!(place_label(" Oslo ", Some("")), "Oslo");
        assert_eq!(place_label("Oslo", None), "Oslo");
    }
}
