/*
 *  display/metrics.rs
 *
 *  ambient-kiosk - adaptive display state engine
 *	(c) 2020-26 Stuart Hunter
 *
 *	font metrics and cache
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

use mini_moka::sync::Cache;
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FontWeight {
    UltraLight,
    Light,
    Normal,
    Bold,
}

impl FontWeight {
    /// Heavier strokes run wider.
    fn width_factor(self) -> f32 {
        match self {
            FontWeight::UltraLight => 0.94,
            FontWeight::Light => 0.97,
            FontWeight::Normal => 1.0,
            FontWeight::Bold => 1.07,
        }
    }
}

/// Family, pixel size and weight; the metrics cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FontSpec {
    pub family: String,
    pub size: u16,
    pub weight: FontWeight,
}

impl FontSpec {
    pub fn new(family: &str, size: u16, weight: FontWeight) -> Self {
        Self { family: family.to_string(), size, weight }
    }
}

impl fmt::Display for FontSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}px {:?}", self.family, self.size, self.weight)
    }
}

/// Per-class glyph advances in pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct FontMetrics {
    pub digit: f32,
    pub narrow: f32,
    pub regular: f32,
    pub upper: f32,
    pub wide: f32,
    pub space: f32,
    pub line_height: f32,
}

impl FontMetrics {
    pub fn advance(&self, c: char) -> f32 {
        match c {
            ' ' => self.space,
            '0'..='9' => self.digit,
            'i' | 'l' | 'j' | 't' | 'f' | 'r' | 'I' | '1' | '.' | ',' | ':' | ';' | '\'' | '!' | '|' | '°' | '(' | ')' | '[' | ']' => {
                self.narrow
            }
            'm' | 'w' | 'M' | 'W' | '@' | '%' => self.wide,
            c if c.is_uppercase() => self.upper,
            _ => self.regular,
        }
    }

    /// Rendered width of a single line of text.
    pub fn measure(&self, text: &str) -> u32 {
        text.chars().map(|c| self.advance(c)).sum::<f32>().ceil() as u32
    }

    pub fn height(&self) -> u32 {
        self.line_height.ceil() as u32
    }
}

/// Where glyph metrics come from (a font rasterizer in production).
pub trait FontMetricsSource: Send + Sync {
    fn load(&self, font: &FontSpec) -> FontMetrics;
}

/// Em-ratio estimates good enough for a proportional sans serif.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProportionalMetrics;

impl FontMetricsSource for ProportionalMetrics {
    fn load(&self, font: &FontSpec) -> FontMetrics {
        let em = font.size as f32;
        let k = font.weight.width_factor();
        FontMetrics {
            digit: em * 0.56 * k,
            narrow: em * 0.28 * k,
            regular: em * 0.52 * k,
            upper: em * 0.66 * k,
            wide: em * 0.86 * k,
            space: em * 0.28,
            line_height: em * 1.2,
        }
    }
}

/// Memoizes `FontMetricsSource::load` per font spec.
#[derive(Clone)]
pub struct MetricsCache {
    source: Arc<dyn FontMetricsSource>,
    cache: Cache<FontSpec, FontMetrics>,
}

impl MetricsCache {
    pub fn new(source: Arc<dyn FontMetricsSource>, capacity: u64) -> Self {
        Self { source, cache: Cache::new(capacity) }
    }

    pub fn metrics(&self, font: &FontSpec) -> FontMetrics {
        if let Some(hit) = self.cache.get(font) {
            return hit;
        }
        let loaded = self.source.load(font);
        self.cache.insert(font.clone(), loaded.clone());
        loaded
    }

    pub fn measure(&self, text: &str, font: &FontSpec) -> u32 {
        self.metrics(font).measure(text)
    }
}

impl Default for MetricsCache {
    fn default() -> Self {
        Self::new(Arc::new(ProportionalMetrics), 256)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingSource(AtomicUsize);

    impl FontMetricsSource for CountingSource {
        fn load(&self, font: &FontSpec) -> FontMetrics {
            self.0.fetch_add(1, Ordering::SeqCst);
            ProportionalMetrics.load(font)
        }
    }

    #[test]
    fn test_metrics_are_cached_per_spec() {
        let source = Arc::new(CountingSource(AtomicUsize::new(0)));
        let cache = MetricsCache::new(source.clone(), 16);
        let font = FontSpec::new("Inter", 32, FontWeight::Light);
        let a = cache.measure("12:45", &font);
        let b = cache.measure("12:45", &font);
        assert_eq!(a, b);
        assert_eq!(source.0.load(Ordering::SeqCst), 1);
        cache.measure("12:45", &FontSpec::new("Inter", 32, FontWeight::Bold));
        assert_eq!(source.0.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_measure_scales_with_size() {
        let small = ProportionalMetrics.load(&FontSpec::new("Inter", 10, FontWeight::Normal));
        let large = ProportionalMetrics.load(&FontSpec::new("Inter", 40, FontWeight::Normal));
        assert!(large.measure("Partly cloudy") > 3 * small.measure("Partly cloudy"));
        assert_eq!(small.measure(""), 0);
    }

    #[test]
    fn test_weight_widens() {
        let light = ProportionalMetrics.load(&FontSpec::new("Inter", 40, FontWeight::UltraLight));
        let bold = ProportionalMetrics.load(&FontSpec::new("Inter", 40, FontWeight::Bold));
        assert!(bold.measure("Overcast") > light.measure("Overcast"));
    }
}
