//! Frame compositor
//!
//! Turns one raw camera frame into one finished photo frame:
//! mirroring (selfie convention), style filtering on the foreground layer,
//! and mask-guided matting over the selected backdrop.
//!
//! Matting paths, in order of preference:
//! 1. no background → mirrored, styled frame as-is
//! 2. background + mask → per-pixel feathered alpha from the mask
//! 3. background, mask missing or late → whole-frame blend at reduced
//!    foreground opacity, so the shot stays usable instead of failing

use crate::frame::{Frame, RawFrame};
use crate::segmentation::SegmentationMask;
use booth_common::{MatteThresholds, Result, StyleFilter};
use image::{Rgb, RgbImage};
use std::time::Duration;
use tracing::warn;

/// Bounded wait for a mask before degrading to the fallback blend
pub const MASK_WAIT: Duration = Duration::from_millis(500);

/// Foreground opacity for the maskless fallback blend
///
/// Tunable constant, not a contract: chosen so the subject stays clearly
/// visible while the backdrop reads through.
pub const FALLBACK_FOREGROUND_ALPHA: u8 = 200;

/// Compositor with configured matte thresholds
#[derive(Debug, Clone, Default)]
pub struct Compositor {
    thresholds: MatteThresholds,
}

impl Compositor {
    pub fn new(thresholds: MatteThresholds) -> Self {
        Self { thresholds }
    }

    /// Produce one finished, encoded frame
    pub fn compose(
        &self,
        raw: &RawFrame,
        ordinal: u32,
        background: Option<&RgbImage>,
        mask: Option<&SegmentationMask>,
        style: StyleFilter,
    ) -> Result<Frame> {
        let rendered = self.render(raw, background, mask, style);
        Frame::from_image(ordinal, &rendered, false)
    }

    /// Render the composited pixels (pre-encode; exercised directly by
    /// pixel-exact tests)
    pub fn render(
        &self,
        raw: &RawFrame,
        background: Option<&RgbImage>,
        mask: Option<&SegmentationMask>,
        style: StyleFilter,
    ) -> RgbImage {
        let foreground = mirror_and_style(raw, style);

        let background = match background {
            None => return foreground,
            Some(bg) => bg,
        };

        // Backdrop must be pixel-aligned with the frame; the controller
        // rasterizes at camera dimensions so this only fires on
        // misconfiguration
        let scaled;
        let background = if background.dimensions() == (raw.width, raw.height) {
            background
        } else {
            warn!(
                "Backdrop {}x{} does not match frame {}x{}, rescaling",
                background.width(),
                background.height(),
                raw.width,
                raw.height
            );
            scaled = image::imageops::resize(
                background,
                raw.width,
                raw.height,
                image::imageops::FilterType::Triangle,
            );
            &scaled
        };

        match mask {
            Some(mask) if mask.matches_dimensions(raw.width, raw.height) => {
                self.matte(raw, &foreground, background, mask)
            }
            Some(mask) => {
                warn!(
                    "Mask {}x{} does not match frame {}x{}, using fallback blend",
                    mask.width, mask.height, raw.width, raw.height
                );
                blend_uniform(&foreground, background, FALLBACK_FOREGROUND_ALPHA)
            }
            None => blend_uniform(&foreground, background, FALLBACK_FOREGROUND_ALPHA),
        }
    }

    /// Per-pixel feathered matting
    ///
    /// The foreground buffer is already mirrored; the mask is in the
    /// camera's un-mirrored coordinate space, so the probability for output
    /// pixel (x, y) is read at the mirrored x.
    fn matte(
        &self,
        raw: &RawFrame,
        foreground: &RgbImage,
        background: &RgbImage,
        mask: &SegmentationMask,
    ) -> RgbImage {
        let mut out = RgbImage::new(raw.width, raw.height);
        for y in 0..raw.height {
            for x in 0..raw.width {
                let source_x = raw.width - 1 - x;
                let alpha = self.thresholds.alpha_for(mask.probability(source_x, y));
                let fg = foreground.get_pixel(x, y).0;
                let bg = background.get_pixel(x, y).0;
                out.put_pixel(x, y, Rgb(blend_pixel(fg, bg, alpha)));
            }
        }
        out
    }
}

/// Mirror the raw frame left-right and apply the style filter
///
/// Style is applied to foreground pixels only, before matting; the
/// background layer is never styled.
fn mirror_and_style(raw: &RawFrame, style: StyleFilter) -> RgbImage {
    let mut out = RgbImage::new(raw.width, raw.height);
    for y in 0..raw.height {
        for x in 0..raw.width {
            let src = raw.get(raw.width - 1 - x, y);
            out.put_pixel(x, y, Rgb(style.apply_rgb(src)));
        }
    }
    out
}

/// Whole-frame blend at a uniform foreground alpha
fn blend_uniform(foreground: &RgbImage, background: &RgbImage, alpha: u8) -> RgbImage {
    let mut out = RgbImage::new(foreground.width(), foreground.height());
    for (x, y, pixel) in out.enumerate_pixels_mut() {
        let fg = foreground.get_pixel(x, y).0;
        let bg = background.get_pixel(x, y).0;
        *pixel = Rgb(blend_pixel(fg, bg, alpha));
    }
    out
}

/// Integer alpha blend; alpha 0 yields exactly `bg`, 255 exactly `fg`
#[inline]
fn blend_pixel(fg: [u8; 3], bg: [u8; 3], alpha: u8) -> [u8; 3] {
    let a = alpha as u32;
    let inv = 255 - a;
    [
        ((fg[0] as u32 * a + bg[0] as u32 * inv + 127) / 255) as u8,
        ((fg[1] as u32 * a + bg[1] as u32 * inv + 127) / 255) as u8,
        ((fg[2] as u32 * a + bg[2] as u32 * inv + 127) / 255) as u8,
    ]
}
