/*
 *  error.rs
 *
 *  ambient-kiosk - adaptive display state engine
 *	(c) 2020-26 Stuart Hunter
 *
 *	kiosk error taxonomy
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

use thiserror::Error;

/// Failures the engine knows how to absorb.
///
/// Job errors never escape a job boundary: they are logged, last-known
/// values stay on screen and the job re-arms at its normal cadence.
/// `LayoutNotReady` is not a failure as such, it only means the surface
/// has no usable size yet and placement has to be tried again later.
#[derive(Debug, Error)]
pub enum KioskError {
    #[error("fetch timed out")]
    FetchTimeout,
    #[error("fetch failed: {0}")]
    FetchError(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("malformed payload: {0}")]
    ParseError(String),
    #[error("surface not laid out yet ({width}x{height})")]
    LayoutNotReady { width: u32, height: u32 },
}

pub type Result<T> = std::result::Result<T, KioskError>;

impl KioskError {
    /// True for errors worth a warning in the log.
    pub fn is_job_failure(&self) -> bool {
        !matches!(self, KioskError::LayoutNotReady { .. })
    }
}

impl From<reqwest::Error> for KioskError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            KioskError::FetchTimeout
        } else if e.is_decode() {
            KioskError::ParseError(e.to_string())
        } else if let Some(status) = e.status() {
            KioskError::FetchError(format!("HTTP {}", status))
        } else {
            KioskError::FetchError(e.to_string())
        }
    }
}

impl From<serde_json::Error> for KioskError {
    fn from(e: serde_json::Error) -> Self {
        KioskError::ParseError(e.to_string())
    }
}

impl From<tokio::time::error::Elapsed> for KioskError {
    fn from(_: tokio::time::error::Elapsed) -> Self {
        KioskError::FetchTimeout
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_not_ready_is_not_a_job_failure() {
        assert!(!KioskError::LayoutNotReady { width: 0, height: 0 }.is_job_failure());
        assert!(KioskError::FetchTimeout.is_job_failure());
        assert!(KioskError::NotFound("station".into()).is_job_failure());
    }

    #[test]
    fn test_json_errors_map_to_parse_error() {
        let err = serde_json::from_str::<u32>("{").unwrap_err();
        assert!(matches!(KioskError::from(err), KioskError::ParseError(_)));
    }
}
