//! Pixel-level compositing behavior
//!
//! Exercises the render path (pre-JPEG) so assertions can be exact.

use booth_common::{MatteThresholds, StyleFilter};
use booth_kiosk::compositor::{Compositor, FALLBACK_FOREGROUND_ALPHA};
use booth_kiosk::frame::RawFrame;
use booth_kiosk::segmentation::SegmentationMask;
use image::{Rgb, RgbImage};

const W: u32 = 16;
const H: u32 = 12;

fn solid_raw(rgb: [u8; 3]) -> RawFrame {
    let mut raw = RawFrame::new(W, H);
    for y in 0..H {
        for x in 0..W {
            raw.set(x, y, rgb);
        }
    }
    raw
}

fn backdrop(rgb: [u8; 3]) -> RgbImage {
    RgbImage::from_pixel(W, H, Rgb(rgb))
}

#[test]
fn test_confident_background_shows_backdrop_exactly() {
    let compositor = Compositor::default();
    let raw = solid_raw([128, 128, 128]);
    let bg = backdrop([10, 200, 30]);
    // Probability well below the low threshold: fully background
    let mask = SegmentationMask::uniform(W, H, 40);

    let out = compositor.render(&raw, Some(&bg), Some(&mask), StyleFilter::Monochrome);
    for (_, _, pixel) in out.enumerate_pixels() {
        assert_eq!(pixel.0, [10, 200, 30]);
    }
}

#[test]
fn test_confident_foreground_shows_styled_subject_exactly() {
    let compositor = Compositor::default();
    let raw = solid_raw([128, 128, 128]);
    let bg = backdrop([10, 200, 30]);
    // Probability at/above the high threshold: fully foreground
    let mask = SegmentationMask::uniform(W, H, 255);

    let out = compositor.render(&raw, Some(&bg), Some(&mask), StyleFilter::Monochrome);
    let styled = compositor.render(&raw, None, None, StyleFilter::Monochrome);
    assert_eq!(out.as_raw(), styled.as_raw());
}

#[test]
fn test_mask_is_read_at_mirrored_coordinate() {
    let compositor = Compositor::default();
    let raw = solid_raw([128, 128, 128]);
    let bg = backdrop([0, 0, 0]);

    // Left half of the mask (camera space) is foreground, right half is
    // background; in the mirrored output the subject lands on the right
    let mut data = vec![0u8; (W * H) as usize];
    for y in 0..H {
        for x in 0..W / 2 {
            data[(y * W + x) as usize] = 255;
        }
    }
    let mask = SegmentationMask::new(W, H, data).unwrap();

    let out = compositor.render(&raw, Some(&bg), Some(&mask), StyleFilter::Monochrome);
    // Right side of output: subject (bright gray); left side: black backdrop
    assert!(out.get_pixel(W - 1, 0).0[0] > 100);
    assert_eq!(out.get_pixel(0, 0).0, [0, 0, 0]);
}

#[test]
fn test_missing_mask_falls_back_to_uniform_blend() {
    let compositor = Compositor::default();
    let raw = solid_raw([128, 128, 128]);
    let bg = backdrop([0, 0, 0]);

    let out = compositor.render(&raw, Some(&bg), None, StyleFilter::Monochrome);
    let styled = compositor.render(&raw, None, None, StyleFilter::Monochrome);

    // Every pixel sits between the backdrop and the full foreground,
    // weighted by the fallback alpha
    let fg = styled.get_pixel(0, 0).0[0] as u32;
    let expected = ((fg * FALLBACK_FOREGROUND_ALPHA as u32) + 127) / 255;
    let got = out.get_pixel(0, 0).0[0] as u32;
    assert!(got.abs_diff(expected) <= 1, "got {}, expected ~{}", got, expected);
}

#[test]
fn test_mismatched_mask_degrades_to_fallback() {
    let compositor = Compositor::default();
    let raw = solid_raw([128, 128, 128]);
    let bg = backdrop([0, 0, 0]);
    let wrong = SegmentationMask::uniform(W / 2, H / 2, 255);

    let with_wrong_mask = compositor.render(&raw, Some(&bg), Some(&wrong), StyleFilter::Monochrome);
    let no_mask = compositor.render(&raw, Some(&bg), None, StyleFilter::Monochrome);
    assert_eq!(with_wrong_mask.as_raw(), no_mask.as_raw());
}

#[test]
fn test_feathered_band_interpolates() {
    let thresholds = MatteThresholds::default();
    let compositor = Compositor::new(thresholds);
    let raw = solid_raw([255, 255, 255]);
    let bg = backdrop([0, 0, 0]);

    // Midway through the transition band
    let mid = (180 + 220) / 2;
    let mask = SegmentationMask::uniform(W, H, mid as u8);
    let out = compositor.render(&raw, Some(&bg), Some(&mask), StyleFilter::Monochrome);

    let v = out.get_pixel(0, 0).0[0];
    assert!(v > 64 && v < 224, "expected a partial blend, got {}", v);
}

#[test]
fn test_vintage_stays_colorful() {
    let compositor = Compositor::default();
    let raw = solid_raw([200, 60, 60]);
    let out = compositor.render(&raw, None, None, StyleFilter::VintageColor);
    let px = out.get_pixel(0, 0).0;
    assert!(px[0] > px[2], "vintage should keep the red cast: {:?}", px);
}
