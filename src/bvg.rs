/*
 *  bvg.rs
 *
 *  ambient-kiosk - adaptive display state engine
 *	(c) 2020-26 Stuart Hunter
 *
 *	transport.rest departure board client
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
use crate::services::TransitClient;
use crate::transit::Departure;
use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use serde::Deserialize;

pub const TRANSPORT_REST_URL: &str = "https://v6.bvg.transport.rest";

#[derive(Debug, Deserialize)]
struct DeparturesResponse {
    #[serde(default)]
    departures: Vec<RawDeparture>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawDeparture {
    line: Option<RawLine>,
    direction: Option<String>,
    planned_when: Option<String>,
    when: Option<String>,
    delay: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct RawLine {
    name: Option<String>,
}

fn into_departures(body: DeparturesResponse) -> Vec<Departure> {
    body.departures
        .into_iter()
        .map(|d| Departure {
            line: d.line.and_then(|l| l.name),
            destination: d.direction,
            scheduled: d.planned_when.or(d.when),
            delay_secs: d.delay,
        })
        .collect()
}

/// Departure board from a transport.rest (HAFAS) endpoint.
pub struct BvgClient {
    client: Client,
    base_url: String,
    window_mins: u32,
    results: u32,
}

impl BvgClient {
    pub fn new(client: Client) -> Self {
        Self::with_base_url(client, TRANSPORT_REST_URL)
    }

    pub fn with_base_url(client: Client, base_url: &str) -> Self {
        Self { client, base_url: base_url.trim_end_matches('/').to_string(), window_mins: 30, results: 12 }
    }
}

#[async_trait]
impl TransitClient for BvgClient {
    async fn fetch_departures(&self, station_id: &str) -> Result<Vec<Departure>> {
        let url = format!("{}/stops/{}/departures", self.base_url, station_id);
        let request = self.client.get(url).query(&[
            ("duration", self.window_mins.to_string()),
            ("results", self.results.to_string()),
            ("remarks", "false".to_string()),
        ]);
        let body: DeparturesResponse = send_json(request, 2).await?;
        let departures = into_departures(body);
        debug!("{} departures for stop {}", departures.len(), station_id);
        Ok(departures)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_departures() {
        let raw = r#"{"departures":[
            {"tripId":"1","when":"2026-05-04T08:09:00+02:00","plannedWhen":"2026-05-04T08:07:00+02:00",
             "delay":120,"direction":"Ringbahn S 42","line":{"name":"S42","mode":"train"}},
            {"tripId":"2","when":"2026-05-04T08:10:00+02:00","plannedWhen":null,
             "delay":null,"direction":"S Westend","line":{"name":"S46"}},
            {"tripId":"3","when":null,"plannedWhen":"2026-05-04T08:11:00+02:00","direction":null,"line":null}
        ],"realtimeDataUpdatedAt":1777874400}"#;
        let body: DeparturesResponse = serde_json::from_str(raw).unwrap();
        let deps = into_departures(body);
        assert_eq!(deps.len(), 3);
        assert_eq!(deps[0].line.as_deref(), Some("S42"));
        assert_eq!(deps[0].scheduled.as_deref(), Some("2026-05-04T08:07:00+02:00"));
        assert_eq!(deps[0].delay_secs, Some(120));
        assert_eq!(deps[1].scheduled.as_deref(), Some("2026-05-04T08:10:00+02:00"));
        assert_eq!(deps[2].line, None);
        assert_eq!(deps[2].destination, None);
    }
}
