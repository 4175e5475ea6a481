/*
 *  lib.rs
 *
 *  ambient-kiosk - adaptive display state engine
 *	(c) 2020-26 Stuart Hunter
 *
 *	crate root
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

//! Ambient kiosk: weather, air quality, transit and a clock on one
//! always-on screen, driven by a single-owner display state engine.

pub mod air_quality;
pub mod airly;
pub mod bvg;
pub mod clock;
pub mod config;
pub mod demo;
pub mod display;
pub mod engine;
pub mod error;
pub mod geoloc;
pub mod gradient;
pub mod http;
pub mod location;
pub mod scheduler;
pub mod services;
pub mod state;
pub mod transit;
pub mod weather;

pub use engine::{Engine, EngineConfig, EngineHandle, Snapshot};
pub use error::{KioskError, Result};
pub use state::DisplayState;
