/*
 *  http.rs
 *
 *  ambient-kiosk - adaptive display state engine
 *	(c) 2020-26 Stuart Hunter
 *
 *	shared HTTP client helpers
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
use flate2::read::GzDecoder;
use log::debug;
use reqwest::{header, Client, RequestBuilder};
use serde::de::DeserializeOwned;
use std::io::Read;
use std::time::Duration;

const VERSION: &str = concat!(env!("CARGO_PKG_NAME"), " v", env!("CARGO_PKG_VERSION"));

/// Shared HTTP client used by every bundled collaborator.
pub fn build_client(timeout: Duration) -> Result<Client> {
    let mut headers = header::HeaderMap::new();
    headers.insert("User-Agent", header::HeaderValue::from_static(VERSION));
    headers.insert("Accept", header::HeaderValue::from_static("application/json"));
    headers.insert("Accept-Encoding", header::HeaderValue::from_static("gzip"));

    Client::builder()
        .connect_timeout(timeout.min(Duration::from_secs(5)))
        .default_headers(headers)
        .timeout(timeout)
        .build()
        .map_err(|e| KioskError::FetchError(format!("unable to build http client: {}", e)))
}

/// Some endpoints answer gzip even when reqwest has no decoder configured,
/// others plain JSON. Try gzip, fall back to the raw bytes.
pub fn decode_body(raw: &[u8]) -> String {
    let mut decoder = GzDecoder::new(raw);
    let mut decoded = String::new();
    match decoder.read_to_string(&mut decoded) {
        Ok(_) => decoded,
        Err(_) => String::from_utf8_lossy(raw).to_string(),
    }
}

/// Send, retrying transport failures up to `max_attempts` times, and
/// deserialize the body. Non-2xx answers are not retried.
pub async fn send_json<T: DeserializeOwned>(request: RequestBuilder, max_attempts: u8) -> Result<T> {
    let mut attempt = 0;
    loop {
        attempt += 1;
        let pending = request
            .try_clone()
            .ok_or_else(|| KioskError::FetchError("request body cannot be retried".to_string()))?;
        match pending.send().await {
            Ok(response) => {
                let response = response.error_for_status()?; // none 2xx raise
                let raw = response.bytes().await?;
                let plain = decode_body(&raw);
                return Ok(serde_json::from_str::<T>(&plain)?);
            }
            Err(e) if attempt < max_attempts && !e.is_timeout() => {
                debug!("request attempt {} failed: {}", attempt, e);
                tokio::time::sleep(Duration::from_millis(500)).await;
            }
            Err(e) => return Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;

    #[test]
    fn test_decode_plain_body() {
        assert_eq!(decode_body(br#"{"a":1}"#), r#"{"a":1}"#);
    }

    #[test]
    fn test_decode_gzip_body() {
        let mut enc = GzEncoder::new(Vec::new(), Compression::default());
        enc.write_all(br#"{"current":{"weather_code":3}}"#).unwrap();
        let raw = enc.finish().unwrap();
        assert_eq!(decode_body(&raw), r#"{"current":{"weather_code":3}}"#);
    }

    #[test]
    fn test_build_client() {
        assert!(build_client(Duration::from_secs(10)).is_ok());
    }
}
