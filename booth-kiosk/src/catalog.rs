//! Background catalog
//!
//! Fixed set of selectable backdrop descriptors: the "none" sentinel plus
//! the romantic gradient collection. Lookup by id is a total function that
//! falls back to the sentinel entry on miss, so a malformed or stale stored
//! preference can never fail a session.

use booth_common::{Error, Result};
use image::{imageops, Rgb, RgbImage};
use once_cell::sync::Lazy;
use serde::Serialize;
use std::path::PathBuf;

/// One color stop of a parametric gradient
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GradientStop {
    pub color: [u8; 3],
    /// Normalized position along the gradient axis (0.0 - 1.0)
    pub position: f32,
}

/// Backdrop content descriptor
#[derive(Debug, Clone)]
pub enum BackgroundKind {
    /// No backdrop: frames render without matting
    None,
    /// Parametric linear gradient
    Gradient {
        /// CSS-convention angle in degrees (0 = toward top, clockwise)
        angle_deg: f32,
        stops: Vec<GradientStop>,
    },
    /// Static image file, scaled to frame dimensions
    Image(PathBuf),
}

/// One catalog entry; immutable, referenced by sessions, never owned by them
#[derive(Debug, Clone)]
pub struct Background {
    pub id: String,
    pub name: String,
    pub kind: BackgroundKind,
}

/// Catalog entry summary for the selection API
#[derive(Debug, Clone, Serialize)]
pub struct BackgroundInfo {
    pub id: String,
    pub name: String,
}

impl Background {
    pub fn is_none(&self) -> bool {
        matches!(self.kind, BackgroundKind::None)
    }

    pub fn info(&self) -> BackgroundInfo {
        BackgroundInfo {
            id: self.id.clone(),
            name: self.name.clone(),
        }
    }

    /// Rasterize the backdrop at the given dimensions
    ///
    /// Returns `Ok(None)` for the "none" sentinel. Deterministic for
    /// gradient entries: same descriptor and dimensions yield identical
    /// pixels.
    pub fn rasterize(&self, width: u32, height: u32) -> Result<Option<RgbImage>> {
        match &self.kind {
            BackgroundKind::None => Ok(None),
            BackgroundKind::Gradient { angle_deg, stops } => {
                Ok(Some(rasterize_gradient(*angle_deg, stops, width, height)))
            }
            BackgroundKind::Image(path) => {
                let img = image::open(path)
                    .map_err(|e| Error::Image(format!("{}: {}", path.display(), e)))?
                    .to_rgb8();
                Ok(Some(imageops::resize(
                    &img,
                    width,
                    height,
                    imageops::FilterType::Triangle,
                )))
            }
        }
    }
}

fn rasterize_gradient(angle_deg: f32, stops: &[GradientStop], width: u32, height: u32) -> RgbImage {
    // CSS convention: 0deg points toward the top, angles grow clockwise
    let rad = angle_deg.to_radians();
    let (dx, dy) = (rad.sin(), -rad.cos());

    // Normalize projections over the corners so t spans exactly 0..1
    let corners = [
        (0.0, 0.0),
        (width as f32 - 1.0, 0.0),
        (0.0, height as f32 - 1.0),
        (width as f32 - 1.0, height as f32 - 1.0),
    ];
    let projections = corners.map(|(x, y)| x * dx + y * dy);
    let min = projections.iter().cloned().fold(f32::INFINITY, f32::min);
    let max = projections.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
    let span = (max - min).max(f32::EPSILON);

    let mut img = RgbImage::new(width, height);
    for y in 0..height {
        for x in 0..width {
            let t = ((x as f32 * dx + y as f32 * dy) - min) / span;
            img.put_pixel(x, y, Rgb(sample_stops(stops, t)));
        }
    }
    img
}

/// Interpolate gradient stops at normalized position `t`
fn sample_stops(stops: &[GradientStop], t: f32) -> [u8; 3] {
    match stops {
        [] => [0, 0, 0],
        [only] => only.color,
        _ => {
            if t <= stops[0].position {
                return stops[0].color;
            }
            for pair in stops.windows(2) {
                let (a, b) = (pair[0], pair[1]);
                if t <= b.position {
                    let span = (b.position - a.position).max(f32::EPSILON);
                    let f = (t - a.position) / span;
                    return [
                        lerp_u8(a.color[0], b.color[0], f),
                        lerp_u8(a.color[1], b.color[1], f),
                        lerp_u8(a.color[2], b.color[2], f),
                    ];
                }
            }
            stops[stops.len() - 1].color
        }
    }
}

fn lerp_u8(a: u8, b: u8, f: f32) -> u8 {
    (a as f32 + (b as f32 - a as f32) * f).round().clamp(0.0, 255.0) as u8
}

/// Parse a `#rrggbb` hex color
fn hex(s: &str) -> [u8; 3] {
    let s = s.trim_start_matches('#');
    let v = u32::from_str_radix(s, 16).unwrap_or(0);
    [(v >> 16) as u8, (v >> 8) as u8, v as u8]
}

fn gradient(id: &str, name: &str, colors: [&str; 3]) -> Background {
    Background {
        id: id.to_string(),
        name: name.to_string(),
        kind: BackgroundKind::Gradient {
            angle_deg: 135.0,
            stops: vec![
                GradientStop { color: hex(colors[0]), position: 0.0 },
                GradientStop { color: hex(colors[1]), position: 0.5 },
                GradientStop { color: hex(colors[2]), position: 1.0 },
            ],
        },
    }
}

static CATALOG: Lazy<Vec<Background>> = Lazy::new(|| {
    vec![
        Background {
            id: "none".to_string(),
            name: "No Background".to_string(),
            kind: BackgroundKind::None,
        },
        gradient("sunset-blush", "Sunset Blush", ["#f6d365", "#fda085", "#f093fb"]),
        gradient("rose-petals", "Rose Petals", ["#ffecd2", "#fcb69f", "#ee9ca7"]),
        gradient("twilight-love", "Twilight Love", ["#667eea", "#764ba2", "#f093fb"]),
        gradient("champagne-dreams", "Champagne Dreams", ["#fdfbfb", "#ebedee", "#d4af37"]),
        gradient("midnight-romance", "Midnight Romance", ["#0c0c0c", "#1a1a2e", "#4a1942"]),
        gradient("hearts-afire", "Hearts Afire", ["#ff416c", "#ff4b2b", "#f7797d"]),
        gradient("enchanted-garden", "Enchanted Garden", ["#134e5e", "#71b280", "#a8e063"]),
        gradient("cotton-candy", "Cotton Candy", ["#fbc2eb", "#a6c1ee", "#c2e9fb"]),
        gradient("vintage-love", "Vintage Love", ["#f5f5dc", "#d4a574", "#8b4513"]),
        gradient("starry-night", "Starry Night", ["#0f0c29", "#302b63", "#24243e"]),
    ]
});

/// The full catalog; index 0 is the guaranteed "none" sentinel
pub fn catalog() -> &'static [Background] {
    &CATALOG
}

/// Total lookup: unknown ids fall back to the "none" sentinel
pub fn background_by_id(id: &str) -> &'static Background {
    CATALOG.iter().find(|bg| bg.id == id).unwrap_or(&CATALOG[0])
}
