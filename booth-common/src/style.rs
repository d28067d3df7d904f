//! Style filter implementations for captured frames
//!
//! Provides the booth's photo styles as per-pixel color transforms. Filters
//! are applied to the foreground layer only, before matting, never to the
//! background layer.

use serde::{Deserialize, Serialize};

/// Photo style filters
///
/// - Monochrome: classic B&W film (grayscale + contrast + brightness boost)
/// - VintageColor: faded color film (contrast + brightness + saturation +
///   sepia tint)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StyleFilter {
    /// grayscale(100%) contrast(120%) brightness(110%)
    Monochrome,

    /// contrast(110%) brightness(108%) saturate(115%) + sepia tint
    VintageColor,
}

// Monochrome constants
const MONO_CONTRAST: f32 = 1.2;
const MONO_BRIGHTNESS: f32 = 1.1;

// Vintage constants
const VINTAGE_CONTRAST: f32 = 1.1;
const VINTAGE_BRIGHTNESS: f32 = 1.08;
const VINTAGE_SATURATION: f32 = 1.15;
/// Blend fraction toward the sepia-transformed color
const VINTAGE_SEPIA_MIX: f32 = 0.25;

/// Rec. 601 luma weights
fn luma(r: f32, g: f32, b: f32) -> f32 {
    0.299 * r + 0.587 * g + 0.114 * b
}

fn contrast_brightness(v: f32, contrast: f32, brightness: f32) -> f32 {
    ((v - 128.0) * contrast + 128.0) * brightness
}

fn clamp_u8(v: f32) -> u8 {
    v.round().clamp(0.0, 255.0) as u8
}

impl StyleFilter {
    /// Transform one RGB pixel
    pub fn apply_rgb(&self, pixel: [u8; 3]) -> [u8; 3] {
        let r = pixel[0] as f32;
        let g = pixel[1] as f32;
        let b = pixel[2] as f32;

        match self {
            StyleFilter::Monochrome => {
                let gray = contrast_brightness(luma(r, g, b), MONO_CONTRAST, MONO_BRIGHTNESS);
                let v = clamp_u8(gray);
                [v, v, v]
            }
            StyleFilter::VintageColor => {
                let r = contrast_brightness(r, VINTAGE_CONTRAST, VINTAGE_BRIGHTNESS);
                let g = contrast_brightness(g, VINTAGE_CONTRAST, VINTAGE_BRIGHTNESS);
                let b = contrast_brightness(b, VINTAGE_CONTRAST, VINTAGE_BRIGHTNESS);

                // Saturation: push channels away from their luma
                let gray = luma(r, g, b);
                let r = gray + (r - gray) * VINTAGE_SATURATION;
                let g = gray + (g - gray) * VINTAGE_SATURATION;
                let b = gray + (b - gray) * VINTAGE_SATURATION;

                // Sepia tint: partial blend toward the sepia matrix
                let sr = 0.393 * r + 0.769 * g + 0.189 * b;
                let sg = 0.349 * r + 0.686 * g + 0.168 * b;
                let sb = 0.272 * r + 0.534 * g + 0.131 * b;
                let r = r + (sr - r) * VINTAGE_SEPIA_MIX;
                let g = g + (sg - g) * VINTAGE_SEPIA_MIX;
                let b = b + (sb - b) * VINTAGE_SEPIA_MIX;

                [clamp_u8(r), clamp_u8(g), clamp_u8(b)]
            }
        }
    }

    /// Parse style from its wire string
    ///
    /// Accepts a few aliases seen in stored preferences:
    /// - 'monochrome', 'mono', 'bw', 'b&w'
    /// - 'vintage-color', 'vintage_color', 'vintage'
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "monochrome" | "mono" | "bw" | "b&w" => Some(StyleFilter::Monochrome),
            "vintage-color" | "vintage_color" | "vintage" => Some(StyleFilter::VintageColor),
            _ => None,
        }
    }

    /// Canonical wire string (kebab-case)
    pub fn as_str(&self) -> &'static str {
        match self {
            StyleFilter::Monochrome => "monochrome",
            StyleFilter::VintageColor => "vintage-color",
        }
    }

    /// All available style variants
    pub fn all_variants() -> &'static [StyleFilter] {
        &[StyleFilter::Monochrome, StyleFilter::VintageColor]
    }
}

impl Default for StyleFilter {
    /// The booth's signature look is B&W film
    fn default() -> Self {
        StyleFilter::Monochrome
    }
}

impl std::fmt::Display for StyleFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_monochrome_is_gray() {
        let out = StyleFilter::Monochrome.apply_rgb([200, 40, 90]);
        assert_eq!(out[0], out[1]);
        assert_eq!(out[1], out[2]);
    }

    #[test]
    fn test_monochrome_boosts_midtone_brightness() {
        // A mid-gray input should come out brighter than it went in
        let out = StyleFilter::Monochrome.apply_rgb([140, 140, 140]);
        assert!(out[0] > 140);
    }

    #[test]
    fn test_vintage_warms_neutral_gray() {
        // Sepia tint pushes neutral input toward red/yellow
        let out = StyleFilter::VintageColor.apply_rgb([128, 128, 128]);
        assert!(out[0] > out[2], "expected warm cast, got {:?}", out);
    }

    #[test]
    fn test_extremes_stay_in_range() {
        for style in StyleFilter::all_variants() {
            let black = style.apply_rgb([0, 0, 0]);
            let white = style.apply_rgb([255, 255, 255]);
            // clamp_u8 guarantees range; check black stays dark, white bright
            assert!(black[0] < 64, "{:?} black got {:?}", style, black);
            assert!(white[0] > 192, "{:?} white got {:?}", style, white);
        }
    }

    #[test]
    fn test_parse_aliases() {
        assert_eq!(StyleFilter::from_str("monochrome"), Some(StyleFilter::Monochrome));
        assert_eq!(StyleFilter::from_str("BW"), Some(StyleFilter::Monochrome));
        assert_eq!(StyleFilter::from_str("vintage-color"), Some(StyleFilter::VintageColor));
        assert_eq!(StyleFilter::from_str("vintage"), Some(StyleFilter::VintageColor));
        assert_eq!(StyleFilter::from_str("polaroid"), None);
    }

    #[test]
    fn test_round_trip() {
        for style in StyleFilter::all_variants() {
            assert_eq!(StyleFilter::from_str(style.as_str()), Some(*style));
        }
    }

    #[test]
    fn test_default() {
        assert_eq!(StyleFilter::default(), StyleFilter::Monochrome);
    }
}
