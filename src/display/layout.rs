/*
 *  display/layout.rs
 *
 *  ambient-kiosk - adaptive display state engine
 *	(c) 2020-26 Stuart Hunter
 *
 *	widget layout and font auto-fit
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

use crate::display::metrics::{FontSpec, FontWeight, MetricsCache};
use crate::error::{KioskError, Result};
use std::collections::BTreeMap;

/// Smallest usable surface edge; anything below is treated as not laid out.
pub const MIN_SURFACE: u32 = 2;
/// Used when a candidate list is empty.
pub const MIN_FONT: u16 = 8;

pub const DEFAULT_FAMILY: &str = "Inter";
pub const MONO_FAMILY: &str = "DejaVu Sans Mono";

/// Every placeable element of the kiosk screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum WidgetId {
    Location,
    Clock,
    Temperature,
    Description,
    AirQualityBar,
    AirQualityIndicator,
    AirQualityStatus,
    TransitRow1,
    TransitRow2,
    DebugOverlay,
}

/// Which point of the widget `x`/`y` refer to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    /// top centre
    North,
    /// left edge, vertically centred
    West,
    /// bottom left
    SouthWest,
    /// top left
    TopLeft,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WidgetGeometry {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
    pub anchor: Anchor,
    /// None for graphic elements (bar, indicator).
    pub font: Option<FontSpec>,
}

/// Typed lookup of computed geometry, one entry per widget.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WidgetRegistry {
    widgets: BTreeMap<WidgetId, WidgetGeometry>,
}

impl WidgetRegistry {
    pub fn get(&self, id: WidgetId) -> Option<&WidgetGeometry> {
        self.widgets.get(&id)
    }

    pub fn insert(&mut self, id: WidgetId, geometry: WidgetGeometry) {
        self.widgets.insert(id, geometry);
    }

    pub fn contains(&self, id: WidgetId) -> bool {
        self.widgets.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.widgets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.widgets.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&WidgetId, &WidgetGeometry)> {
        self.widgets.iter()
    }
}

/// Computed placement for one surface size.
#[derive(Debug, Clone, PartialEq)]
pub struct Layout {
    pub width: u32,
    pub height: u32,
    pub category: LayoutCategory,
    pub widgets: WidgetRegistry,
}

impl Layout {
    pub fn get(&self, id: WidgetId) -> Option<&WidgetGeometry> {
        self.widgets.get(id)
    }
}

/// Text content the layout depends on.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LayoutInput {
    pub location: String,
    pub clock: String,
    pub temperature: String,
    pub description: String,
    pub aq_status: String,
    pub transit: [String; 2],
    pub aq_position: Option<f64>,
    pub debug_overlay: Option<String>,
}

/// Surface size class; picks the candidate font ladders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutCategory {
    /// Small panels (under 480 px tall)
    Compact,
    /// Typical 7" to 10" kiosk screens
    Regular,
    /// 1080p and up
    Large,
}

impl LayoutCategory {
    pub fn for_surface(_width: u32, height: u32) -> Self {
        match height {
            0..=479 => LayoutCategory::Compact,
            480..=899 => LayoutCategory::Regular,
            _ => LayoutCategory::Large,
        }
    }

    fn scale(self) -> f32 {
        match self {
            LayoutCategory::Compact => 0.5,
            LayoutCategory::Regular => 1.0,
            LayoutCategory::Large => 1.75,
        }
    }
}

/// A text widget's slot on screen, in fractions of the surface.
struct TextSlot {
    id: WidgetId,
    y: f32,
    max_width: f32,
    anchor: Anchor,
    weight: FontWeight,
    /// Descending, at Regular scale.
    sizes: &'static [u16],
}

static LOCATION: TextSlot = TextSlot {
    id: WidgetId::Location,
    y: 0.06,
    max_width: 0.9,
    anchor: Anchor::North,
    weight: FontWeight::Normal,
    sizes: &[40, 34, 28, 24, 20, 16],
};
static CLOCK: TextSlot = TextSlot {
    id: WidgetId::Clock,
    y: 0.15,
    max_width: 0.5,
    anchor: Anchor::North,
    weight: FontWeight::Light,
    sizes: &[72, 60, 48, 40, 32],
};
static TEMPERATURE: TextSlot = TextSlot {
    id: WidgetId::Temperature,
    y: 0.30,
    max_width: 0.6,
    anchor: Anchor::North,
    weight: FontWeight::UltraLight,
    sizes: &[120, 100, 84, 72, 60, 48],
};
static DESCRIPTION: TextSlot = TextSlot {
    id: WidgetId::Description,
    y: 0.52,
    max_width: 0.9,
    anchor: Anchor::North,
    weight: FontWeight::Normal,
    sizes: &[36, 30, 26, 22, 18, 14],
};
static AQ_STATUS: TextSlot = TextSlot {
    id: WidgetId::AirQualityStatus,
    y: 0.70,
    max_width: 0.8,
    anchor: Anchor::North,
    weight: FontWeight::Normal,
    sizes: &[24, 20, 18, 16, 14, 12],
};
static TRANSIT: [TextSlot; 2] = [
    TextSlot {
        id: WidgetId::TransitRow1,
        y: 0.82,
        max_width: 0.9,
        anchor: Anchor::West,
        weight: FontWeight::Normal,
        sizes: &[30, 26, 22, 18, 16, 12],
    },
    TextSlot {
        id: WidgetId::TransitRow2,
        y: 0.90,
        max_width: 0.9,
        anchor: Anchor::West,
        weight: FontWeight::Normal,
        sizes: &[30, 26, 22, 18, 16, 12],
    },
];

const BAR_Y: f32 = 0.64;
const BAR_WIDTH: f32 = 0.6;
const DEBUG_FONT: u16 = 14;

/// Turns a surface size plus the current texts into widget geometry.
#[derive(Clone, Default)]
pub struct LayoutEngine {
    metrics: MetricsCache,
}

impl LayoutEngine {
    pub fn new(metrics: MetricsCache) -> Self {
        Self { metrics }
    }

    pub fn metrics(&self) -> &MetricsCache {
        &self.metrics
    }

    /// Largest candidate (in list order) whose rendered width fits
    /// `max_width`; the last, smallest, candidate when none does.
    pub fn auto_fit(&self, text: &str, family: &str, weight: FontWeight, candidates: &[u16], max_width: u32) -> FontSpec {
        for &size in candidates {
            let font = FontSpec::new(family, size, weight);
            if self.metrics.measure(text, &font) <= max_width {
                return font;
            }
        }
        let smallest = candidates.last().copied().unwrap_or(MIN_FONT);
        FontSpec::new(family, smallest, weight)
    }

    pub fn compute(&self, width: u32, height: u32, input: &LayoutInput) -> Result<Layout> {
        if width < MIN_SURFACE || height < MIN_SURFACE {
            return Err(KioskError::LayoutNotReady { width, height });
        }
        let category = LayoutCategory::for_surface(width, height);
        let mut widgets = WidgetRegistry::default();

        let texts: [(&TextSlot, &str); 7] = [
            (&LOCATION, input.location.as_str()),
            (&CLOCK, input.clock.as_str()),
            (&TEMPERATURE, input.temperature.as_str()),
            (&DESCRIPTION, input.description.as_str()),
            (&AQ_STATUS, input.aq_status.as_str()),
            (&TRANSIT[0], input.transit[0].as_str()),
            (&TRANSIT[1], input.transit[1].as_str()),
        ];
        for (slot, text) in texts {
            widgets.insert(slot.id, self.place_text(slot, text, width, height, category));
        }

        let bar = bar_geometry(width, height);
        if let Some(position) = input.aq_position {
            widgets.insert(WidgetId::AirQualityIndicator, indicator_geometry(&bar, position));
        }
        widgets.insert(WidgetId::AirQualityBar, bar);

        if let Some(overlay) = input.debug_overlay.as_deref() {
            let font = FontSpec::new(MONO_FAMILY, DEBUG_FONT, FontWeight::Normal);
            let metrics = self.metrics.metrics(&font);
            widgets.insert(
                WidgetId::DebugOverlay,
                WidgetGeometry {
                    x: 8,
                    y: height as i32 - 8,
                    width: metrics.measure(overlay),
                    height: metrics.height(),
                    anchor: Anchor::SouthWest,
                    font: Some(font),
                },
            );
        }

        Ok(Layout { width, height, category, widgets })
    }

    fn place_text(&self, slot: &TextSlot, text: &str, width: u32, height: u32, category: LayoutCategory) -> WidgetGeometry {
        let candidates: Vec<u16> = slot
            .sizes
            .iter()
            .map(|&s| ((s as f32 * category.scale()).round() as u16).max(MIN_FONT))
            .collect();
        let max_width = (width as f32 * slot.max_width) as u32;
        let font = self.auto_fit(text, DEFAULT_FAMILY, slot.weight, &candidates, max_width);
        let metrics = self.metrics.metrics(&font);
        let x = match slot.anchor {
            Anchor::North => width as i32 / 2,
            _ => (width as f32 * 0.05) as i32,
        };
        WidgetGeometry {
            x,
            y: (height as f32 * slot.y) as i32,
            width: metrics.measure(text).min(max_width),
            height: metrics.height(),
            anchor: slot.anchor,
            font: Some(font),
        }
    }
}

fn bar_geometry(width: u32, height: u32) -> WidgetGeometry {
    let bar_width = ((width as f32 * BAR_WIDTH) as u32).max(1);
    WidgetGeometry {
        x: ((width - bar_width) / 2) as i32,
        y: (height as f32 * BAR_Y) as i32,
        width: bar_width,
        height: (height / 80).max(4),
        anchor: Anchor::TopLeft,
        font: None,
    }
}

/// Indicator marker centred on `position` (0.0 left, 1.0 right) along the bar.
pub fn indicator_geometry(bar: &WidgetGeometry, position: f64) -> WidgetGeometry {
    let size = (bar.height * 3).max(8);
    let centre = bar.x + (position.clamp(0.0, 1.0) * bar.width as f64).round() as i32;
    WidgetGeometry {
        x: centre - (size / 2) as i32,
        y: bar.y + bar.height as i32 / 2 - (size / 2) as i32,
        width: size,
        height: size,
        anchor: Anchor::TopLeft,
        font: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input() -> LayoutInput {
        LayoutInput {
            location: "Berlin, Germany".into(),
            clock: "12:34".into(),
            temperature: "17°".into(),
            description: "Partly cloudy".into(),
            aq_status: "A-MAZE-BALLS".into(),
            transit: ["S42  Ringbahn  3, 8, 13".into(), "--  --  --".into()],
            aq_position: Some(0.75),
            debug_overlay: None,
        }
    }

    #[test]
    fn test_degenerate_surface_not_ready() {
        let engine = LayoutEngine::default();
        assert!(matches!(
            engine.compute(0, 600, &input()),
            Err(KioskError::LayoutNotReady { width: 0, height: 600 })
        ));
        assert!(engine.compute(800, 1, &input()).is_err());
        assert!(engine.compute(2, 2, &input()).is_ok());
    }

    #[test]
    fn test_all_widgets_registered() {
        let layout = LayoutEngine::default().compute(1024, 600, &input()).unwrap();
        assert_eq!(layout.category, LayoutCategory::Regular);
        for id in [
            WidgetId::Location,
            WidgetId::Clock,
            WidgetId::Temperature,
            WidgetId::Description,
            WidgetId::AirQualityBar,
            WidgetId::AirQualityIndicator,
            WidgetId::AirQualityStatus,
            WidgetId::TransitRow1,
            WidgetId::TransitRow2,
        ] {
            assert!(layout.widgets.contains(id), "{:?} missing", id);
        }
        assert!(layout.get(WidgetId::DebugOverlay).is_none());
    }

    #[test]
    fn test_indicator_only_with_position() {
        let mut i = input();
        i.aq_position = None;
        let layout = LayoutEngine::default().compute(800, 480, &i).unwrap();
        assert!(!layout.widgets.contains(WidgetId::AirQualityIndicator));
    }

    #[test]
    fn test_indicator_tracks_position() {
        let layout = LayoutEngine::default().compute(1000, 600, &input()).unwrap();
        let bar = layout.get(WidgetId::AirQualityBar).unwrap();
        let left = indicator_geometry(bar, 0.0);
        let right = indicator_geometry(bar, 1.0);
        assert_eq!(left.x + (left.width / 2) as i32, bar.x);
        assert_eq!(right.x + (right.width / 2) as i32, bar.x + bar.width as i32);
    }

    #[test]
    fn test_auto_fit_picks_largest_that_fits() {
        let engine = LayoutEngine::default();
        let font = engine.auto_fit("12:34", DEFAULT_FAMILY, FontWeight::Normal, &[96, 48, 24], 200);
        assert_eq!(font.size, 48);
        assert!(engine.metrics().measure("12:34", &font) <= 200);
    }

    #[test]
    fn test_auto_fit_falls_back_to_smallest() {
        let engine = LayoutEngine::default();
        let long = "Thunderstorm with heavy hail over the whole of Brandenburg";
        let font = engine.auto_fit(long, DEFAULT_FAMILY, FontWeight::Normal, &[40, 30, 20], 50);
        assert_eq!(font.size, 20);
        let none = engine.auto_fit(long, DEFAULT_FAMILY, FontWeight::Normal, &[], 50);
        assert_eq!(none.size, MIN_FONT);
    }

    #[test]
    fn test_long_text_shrinks() {
        let engine = LayoutEngine::default();
        let mut i = input();
        let short = engine.compute(800, 480, &i).unwrap();
        i.description = "Thunderstorm with slight hail and a lot more words".into();
        let long = engine.compute(800, 480, &i).unwrap();
        let size = |l: &Layout| l.get(WidgetId::Description).and_then(|g| g.font.as_ref()).map(|f| f.size);
        assert!(size(&long) < size(&short));
    }

    #[test]
    fn test_debug_overlay_bottom_left() {
        let mut i = input();
        i.debug_overlay = Some("phase day | code 3".into());
        let layout = LayoutEngine::default().compute(800, 480, &i).unwrap();
        let overlay = layout.get(WidgetId::DebugOverlay).unwrap();
        assert_eq!((overlay.x, overlay.y), (8, 472));
        assert_eq!(overlay.anchor, Anchor::SouthWest);
    }
}
