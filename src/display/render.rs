/*
 *  display/render.rs
 *
 *  ambient-kiosk - adaptive display state engine
 *	(c) 2020-26 Stuart Hunter
 *
 *	frame renderers
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

use crate::display::framebuffer::FrameBuffer;
use crate::display::layout::{Layout, WidgetId};
use crate::state::{DisplayState, Gradient, Row};
use embedded_graphics::pixelcolor::{Rgb888, RgbColor};
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{PrimitiveStyle, Rectangle, RoundedRectangle};
use log::{debug, info};
use std::fs::File;
use std::io::{self, BufWriter};
use std::path::PathBuf;

/// Horizontal bands used to paint the background.
pub const GRADIENT_BANDS: u32 = 100;

/// Everything a renderer needs for one repaint.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub gradient: Gradient,
    pub location: String,
    pub clock: String,
    pub temperature: String,
    pub description: String,
    pub aq_position: Option<f64>,
    pub aq_status: String,
    pub transit_rows: [Row; 2],
    pub overlay: Option<String>,
    pub layout: Option<Layout>,
}

impl Frame {
    pub fn from_state(state: &DisplayState, overlay: Option<String>, layout: Option<Layout>) -> Self {
        Self {
            gradient: state.gradient,
            location: state.location_label.clone(),
            clock: state.clock.clone(),
            temperature: state.temperature_text.clone(),
            description: state.description.clone(),
            aq_position: state.aq_position,
            aq_status: state.aq_status.clone(),
            transit_rows: state.transit_rows.clone(),
            overlay,
            layout,
        }
    }
}

/// The pixel side of the kiosk. `present` is only called for changed frames.
pub trait Renderer: Send {
    fn present(&mut self, frame: &Frame) -> io::Result<()>;
}

/// Headless renderer: writes each new frame to the log.
#[derive(Debug, Default)]
pub struct LogRenderer {
    frames: u64,
}

impl Renderer for LogRenderer {
    fn present(&mut self, frame: &Frame) -> io::Result<()> {
        self.frames += 1;
        debug!(
            "frame {}: {} | {} {} {} | aq {} | {}",
            self.frames, frame.clock, frame.location, frame.temperature, frame.description, frame.aq_status, frame.gradient
        );
        for row in &frame.transit_rows {
            debug!("  {}", row);
        }
        if let Some(overlay) = frame.overlay.as_deref() {
            debug!("  [{}]", overlay);
        }
        Ok(())
    }
}

fn to_rgb888(c: crate::state::Rgb) -> Rgb888 {
    Rgb888::new(c.r, c.g, c.b)
}

/// Paints background and air quality bar into an RGB framebuffer, optionally
/// dumping each frame to a PPM snapshot.
pub struct FrameRenderer {
    fb: FrameBuffer<Rgb888>,
    snapshot: Option<PathBuf>,
    frames: u64,
}

impl FrameRenderer {
    pub fn new(snapshot: Option<PathBuf>) -> Self {
        if let Some(path) = snapshot.as_ref() {
            info!("writing frame snapshots to {}", path.display());
        }
        Self { fb: FrameBuffer::new(0, 0, Rgb888::BLACK), snapshot, frames: 0 }
    }

    pub fn framebuffer(&self) -> &FrameBuffer<Rgb888> {
        &self.fb
    }

    /// Background in horizontal bands, top colour to bottom colour.
    pub fn paint_gradient(&mut self, gradient: &Gradient) {
        let height = self.fb.height() as u32;
        if self.fb.width() < 2 || height < 2 {
            return;
        }
        let bands = GRADIENT_BANDS.min(height);
        for band in 0..bands {
            let y0 = (band * height / bands) as usize;
            let y1 = ((band + 1) * height / bands) as usize;
            self.fb.fill_rows(y0, y1, to_rgb888(gradient.band(band, bands)));
        }
    }

    fn paint_air_quality(&mut self, layout: &Layout) -> Result<(), core::convert::Infallible> {
        if let Some(bar) = layout.get(WidgetId::AirQualityBar) {
            let radius = Size::new(bar.height / 2, bar.height / 2);
            RoundedRectangle::with_equal_corners(
                Rectangle::new(Point::new(bar.x, bar.y), Size::new(bar.width, bar.height)),
                radius,
            )
            .into_styled(PrimitiveStyle::with_fill(Rgb888::new(0xE0, 0xE0, 0xE0)))
            .draw(&mut self.fb)?;
        }
        if let Some(marker) = layout.get(WidgetId::AirQualityIndicator) {
            Rectangle::new(Point::new(marker.x, marker.y), Size::new(marker.width, marker.height))
                .into_styled(PrimitiveStyle::with_fill(Rgb888::WHITE))
                .draw(&mut self.fb)?;
        }
        Ok(())
    }

    fn write_snapshot(&self) -> io::Result<()> {
        let Some(path) = self.snapshot.as_ref() else {
            return Ok(());
        };
        let mut out = BufWriter::new(File::create(path)?);
        self.fb.write_ppm(&mut out)
    }
}

impl Renderer for FrameRenderer {
    fn present(&mut self, frame: &Frame) -> io::Result<()> {
        let Some(layout) = frame.layout.as_ref() else {
            debug!("no layout yet, nothing to paint");
            return Ok(());
        };
        if self.fb.size() != Size::new(layout.width, layout.height) {
            self.fb.resize(layout.width, layout.height, Rgb888::BLACK);
        }
        self.paint_gradient(&frame.gradient);
        let Ok(()) = self.paint_air_quality(layout);
        self.frames += 1;
        self.write_snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::layout::{LayoutEngine, LayoutInput};
    use crate::state::Rgb;

    fn frame(width: u32, height: u32) -> Frame {
        let mut state = DisplayState::new(false);
        state.gradient = Gradient::new(Rgb::new(255, 0, 0), Rgb::new(0, 0, 255));
        state.aq_position = Some(0.5);
        let input = LayoutInput { aq_position: Some(0.5), ..Default::default() };
        let layout = LayoutEngine::default().compute(width, height, &input).ok();
        Frame::from_state(&state, None, layout)
    }

    #[test]
    fn test_gradient_top_and_bottom() {
        let mut r = FrameRenderer::new(None);
        r.present(&frame(200, 200)).unwrap();
        let fb = r.framebuffer();
        assert_eq!(fb.pixel(0, 0), Some(Rgb888::new(255, 0, 0)));
        assert_eq!(fb.pixel(199, 199), Some(Rgb888::new(0, 0, 255)));
    }

    #[test]
    fn test_indicator_painted_mid_bar() {
        let mut r = FrameRenderer::new(None);
        let f = frame(400, 300);
        r.present(&f).unwrap();
        let marker = f.layout.as_ref().and_then(|l| l.get(WidgetId::AirQualityIndicator)).unwrap();
        let (cx, cy) = (marker.x + marker.width as i32 / 2, marker.y + marker.height as i32 / 2);
        assert_eq!(r.framebuffer().pixel(cx as usize, cy as usize), Some(Rgb888::WHITE));
    }

    #[test]
    fn test_no_layout_is_a_noop() {
        let mut r = FrameRenderer::new(None);
        let f = Frame::from_state(&DisplayState::new(false), None, None);
        r.present(&f).unwrap();
        assert_eq!(r.framebuffer().width(), 0);
    }

    #[test]
    fn test_log_renderer_counts() {
        let mut r = LogRenderer::default();
        r.present(&frame(100, 100)).unwrap();
        r.present(&frame(100, 100)).unwrap();
        assert_eq!(r.frames, 2);
    }
}
