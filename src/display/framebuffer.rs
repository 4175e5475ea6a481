/*
 *  display/framebuffer.rs
 *
 *  ambient-kiosk - adaptive display state engine
 *	(c) 2020-26 Stuart Hunter
 *
 *	runtime sized RGB framebuffer
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

use core::convert::Infallible;
use embedded_graphics::geometry::{OriginDimensions, Size};
use embedded_graphics::pixelcolor::{PixelColor, Rgb888, RgbColor};
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;
use std::io::{self, Write};

/// Runtime-sized framebuffer that follows the surface as it is resized.
#[derive(Debug, Clone)]
pub struct FrameBuffer<C: PixelColor> {
    buf: Vec<C>,
    w: usize,
    h: usize,
}

impl<C: PixelColor> FrameBuffer<C> {
    pub fn new(width: u32, height: u32, fill: C) -> Self {
        let (w, h) = (width as usize, height as usize);
        Self { buf: vec![fill; w * h], w, h }
    }

    pub fn width(&self) -> usize {
        self.w
    }

    pub fn height(&self) -> usize {
        self.h
    }

    pub fn as_slice(&self) -> &[C] {
        &self.buf
    }

    /// Reallocate for a new surface size; contents are reset to `fill`.
    pub fn resize(&mut self, width: u32, height: u32, fill: C) {
        self.w = width as usize;
        self.h = height as usize;
        self.buf.clear();
        self.buf.resize(self.w * self.h, fill);
    }

    pub fn pixel(&self, x: usize, y: usize) -> Option<C> {
        if x < self.w && y < self.h { Some(self.buf[y * self.w + x]) } else { None }
    }

    /// Fill whole rows `y0..y1` with one colour.
    pub fn fill_rows(&mut self, y0: usize, y1: usize, color: C) {
        let y1 = y1.min(self.h);
        if y0 >= y1 {
            return;
        }
        self.buf[y0 * self.w..y1 * self.w].fill(color);
    }

    #[inline]
    fn idx(&self, p: Point) -> Option<usize> {
        if p.x >= 0 && p.y >= 0 {
            let (x, y) = (p.x as usize, p.y as usize);
            if x < self.w && y < self.h {
                return Some(y * self.w + x);
            }
        }
        None
    }
}

impl FrameBuffer<Rgb888> {
    /// Binary PPM (P6), readable by practically any image viewer.
    pub fn write_ppm<W: Write>(&self, out: &mut W) -> io::Result<()> {
        write!(out, "P6\n{} {}\n255\n", self.w, self.h)?;
        let mut bytes = Vec::with_capacity(self.buf.len() * 3);
        for c in &self.buf {
            bytes.extend_from_slice(&[c.r(), c.g(), c.b()]);
        }
        out.write_all(&bytes)
    }
}

impl<C: PixelColor> OriginDimensions for FrameBuffer<C> {
    fn size(&self) -> Size {
        Size::new(self.w as u32, self.h as u32)
    }
}

impl<C: PixelColor> DrawTarget for FrameBuffer<C> {
    type Color = C;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(p, c) in pixels {
            if let Some(i) = self.idx(p) {
                self.buf[i] = c;
            }
        }
        Ok(())
    }

    fn fill_solid(&mut self, area: &Rectangle, color: Self::Color) -> Result<(), Self::Error> {
        let clipped = area.intersection(&self.bounding_box());
        let Some(bottom_right) = clipped.bottom_right() else {
            return Ok(());
        };
        let (x0, x1) = (clipped.top_left.x as usize, bottom_right.x as usize + 1);
        for y in clipped.top_left.y as usize..=bottom_right.y as usize {
            let row = y * self.w;
            self.buf[row + x0..row + x1].fill(color);
        }
        Ok(())
    }

    fn clear(&mut self, color: Self::Color) -> Result<(), Self::Error> {
        self.buf.fill(color);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_graphics::primitives::{PrimitiveStyle, Rectangle};

    #[test]
    fn test_fill_solid_is_clipped() {
        let mut fb = FrameBuffer::new(10, 5, Rgb888::BLACK);
        Rectangle::new(Point::new(8, 3), Size::new(5, 5))
            .into_styled(PrimitiveStyle::with_fill(Rgb888::RED))
            .draw(&mut fb)
            .unwrap();
        assert_eq!(fb.pixel(8, 3), Some(Rgb888::RED));
        assert_eq!(fb.pixel(9, 4), Some(Rgb888::RED));
        assert_eq!(fb.pixel(7, 3), Some(Rgb888::BLACK));
        assert_eq!(fb.pixel(10, 4), None);
    }

    #[test]
    fn test_resize_and_rows() {
        let mut fb = FrameBuffer::new(2, 2, Rgb888::BLACK);
        fb.resize(4, 3, Rgb888::WHITE);
        assert_eq!(fb.size(), Size::new(4, 3));
        fb.fill_rows(1, 9, Rgb888::BLUE);
        assert_eq!(fb.pixel(0, 0), Some(Rgb888::WHITE));
        assert_eq!(fb.pixel(3, 2), Some(Rgb888::BLUE));
    }

    #[test]
    fn test_ppm_header_and_length() {
        let fb = FrameBuffer::new(3, 2, Rgb888::new(1, 2, 3));
        let mut out = Vec::new();
        fb.write_ppm(&mut out).unwrap();
        let header = b"P6\n3 2\n255\n";
        assert!(out.starts_with(header));
        assert_eq!(out.len(), header.len() + 3 * 2 * 3);
        assert_eq!(&out[header.len()..header.len() + 3], &[1, 2, 3]);
    }
}
