/*
 *  display/mod.rs
 *
 *  ambient-kiosk - adaptive display state engine
 *	(c) 2020-26 Stuart Hunter
 *
 *	layout and rendering
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

// Layout and paint side of the kiosk; the engine hands a Frame over and
// never touches pixels itself.
pub mod framebuffer;
pub mod layout;
pub mod metrics;
pub mod render;

pub use layout::{Layout, LayoutEngine, LayoutInput, WidgetGeometry, WidgetId, WidgetRegistry};
pub use metrics::{FontMetricsSource, FontSpec, FontWeight, MetricsCache, ProportionalMetrics};
pub use render::{Frame, FrameRenderer, LogRenderer, Renderer};
