//! Strip assembly
//!
//! Stacks the session's frames into a single vertical keepsake strip with a
//! header banner and a footer carrying the session id and timestamp. Layout
//! is fixed-geometry and fully deterministic: the same frames, id, and
//! timestamp always produce byte-identical output.

use crate::frame::Frame;
use booth_common::{Error, Result};
use chrono::{DateTime, Utc};
use image::{imageops, Rgb, RgbImage};
use std::io::Cursor;
use uuid::Uuid;

/// Strip width in pixels
pub const STRIP_WIDTH: u32 = 480;
/// Margin around the frame column
pub const OUTER_MARGIN: u32 = 20;
/// Each frame is scaled to this width inside the strip
pub const FRAME_WIDTH: u32 = 440;
/// Scaled frame height (keeps the 4:3 camera aspect)
pub const FRAME_HEIGHT: u32 = 330;
/// Border drawn around each frame
pub const FRAME_BORDER: u32 = 2;
/// Vertical gap between frames
pub const FRAME_SPACING: u32 = 16;
/// Header banner height
pub const HEADER_HEIGHT: u32 = 96;
/// Footer banner height
pub const FOOTER_HEIGHT: u32 = 64;

const STRIP_BACKGROUND: Rgb<u8> = Rgb([245, 240, 230]);
const INK: Rgb<u8> = Rgb([40, 36, 32]);
const BORDER_COLOR: Rgb<u8> = Rgb([40, 36, 32]);

const TITLE: &str = "PHOTO-MATIC";

/// Assembled strip: pixels for inspection, JPEG bytes for delivery
#[derive(Debug, Clone)]
pub struct StripImage {
    pub width: u32,
    pub height: u32,
    pub jpeg: Vec<u8>,
}

impl StripImage {
    fn from_pixels(pixels: &RgbImage) -> Result<Self> {
        let mut jpeg = Vec::new();
        pixels
            .write_to(&mut Cursor::new(&mut jpeg), image::ImageFormat::Jpeg)
            .map_err(|e| Error::Image(format!("strip JPEG encode failed: {}", e)))?;
        Ok(Self {
            width: pixels.width(),
            height: pixels.height(),
            jpeg,
        })
    }
}

/// Fixed-layout strip assembler
#[derive(Debug, Clone, Default)]
pub struct StripAssembler;

impl StripAssembler {
    /// Total strip dimensions for a given frame count
    pub fn dimensions(frame_count: u32) -> (u32, u32) {
        let frames_height =
            frame_count * (FRAME_HEIGHT + 2 * FRAME_BORDER) + frame_count.saturating_sub(1) * FRAME_SPACING;
        (
            STRIP_WIDTH,
            HEADER_HEIGHT + frames_height + FOOTER_HEIGHT + 2 * OUTER_MARGIN,
        )
    }

    /// Stack frames in capture order into the finished strip
    pub fn assemble(
        &self,
        frames: &[Frame],
        session_id: Uuid,
        timestamp: DateTime<Utc>,
    ) -> Result<StripImage> {
        if frames.is_empty() {
            return Err(Error::InvalidInput("cannot assemble an empty strip".into()));
        }

        let (width, height) = Self::dimensions(frames.len() as u32);
        let mut canvas = RgbImage::from_pixel(width, height, STRIP_BACKGROUND);

        // Header: centered title
        let title_scale = 4;
        let title_w = text_width(TITLE, title_scale);
        draw_text(
            &mut canvas,
            TITLE,
            (width.saturating_sub(title_w)) / 2,
            OUTER_MARGIN + (HEADER_HEIGHT - 7 * title_scale) / 2,
            title_scale,
            INK,
        );

        // Frame column, capture order top to bottom
        let mut y = OUTER_MARGIN + HEADER_HEIGHT;
        for frame in frames {
            let photo = frame.decode()?;
            let scaled = if photo.dimensions() == (FRAME_WIDTH, FRAME_HEIGHT) {
                photo
            } else {
                imageops::resize(
                    &photo,
                    FRAME_WIDTH,
                    FRAME_HEIGHT,
                    imageops::FilterType::Triangle,
                )
            };

            let x = (width - FRAME_WIDTH) / 2;
            fill_rect(
                &mut canvas,
                x - FRAME_BORDER,
                y,
                FRAME_WIDTH + 2 * FRAME_BORDER,
                FRAME_HEIGHT + 2 * FRAME_BORDER,
                BORDER_COLOR,
            );
            imageops::overlay(&mut canvas, &scaled, x as i64, (y + FRAME_BORDER) as i64);

            y += FRAME_HEIGHT + 2 * FRAME_BORDER + FRAME_SPACING;
        }

        // Footer: short session id and timestamp
        let footer = format!(
            "#{}  {}",
            short_id(session_id),
            timestamp.format("%Y-%m-%d %H:%M")
        );
        let footer_scale = 2;
        let footer_w = text_width(&footer, footer_scale);
        let footer_y = height - OUTER_MARGIN - FOOTER_HEIGHT + (FOOTER_HEIGHT - 7 * footer_scale) / 2;
        draw_text(
            &mut canvas,
            &footer,
            (width.saturating_sub(footer_w)) / 2,
            footer_y,
            footer_scale,
            INK,
        );

        StripImage::from_pixels(&canvas)
    }
}

/// First uuid group, uppercased, as the human-readable session tag
fn short_id(id: Uuid) -> String {
    id.to_string()[..8].to_uppercase()
}

fn fill_rect(canvas: &mut RgbImage, x: u32, y: u32, w: u32, h: u32, color: Rgb<u8>) {
    for dy in 0..h {
        for dx in 0..w {
            let (px, py) = (x + dx, y + dy);
            if px < canvas.width() && py < canvas.height() {
                canvas.put_pixel(px, py, color);
            }
        }
    }
}

/// Rendered width of a string at the given scale
fn text_width(text: &str, scale: u32) -> u32 {
    if text.is_empty() {
        return 0;
    }
    text.chars().count() as u32 * 6 * scale - scale
}

/// Draw text with the built-in 5x7 glyph set; unknown characters render as
/// blanks
fn draw_text(canvas: &mut RgbImage, text: &str, x: u32, y: u32, scale: u32, color: Rgb<u8>) {
    let mut cx = x;
    for ch in text.chars() {
        let glyph = glyph_rows(ch);
        for (row, bits) in glyph.iter().enumerate() {
            for col in 0..5u32 {
                if bits & (0b10000 >> col) != 0 {
                    fill_rect(
                        canvas,
                        cx + col * scale,
                        y + row as u32 * scale,
                        scale,
                        scale,
                        color,
                    );
                }
            }
        }
        cx += 6 * scale;
    }
}

/// 5x7 glyph rows, MSB-left in the low 5 bits
///
/// Covers exactly the characters the strip prints: the title, hex session
/// tags, and timestamps.
fn glyph_rows(ch: char) -> [u8; 7] {
    match ch {
        '0' => [0b01110, 0b10001, 0b10011, 0b10101, 0b11001, 0b10001, 0b01110],
        '1' => [0b00100, 0b01100, 0b00100, 0b00100, 0b00100, 0b00100, 0b01110],
        '2' => [0b01110, 0b10001, 0b00001, 0b00010, 0b00100, 0b01000, 0b11111],
        '3' => [0b11111, 0b00010, 0b00100, 0b00010, 0b00001, 0b10001, 0b01110],
        '4' => [0b00010, 0b00110, 0b01010, 0b10010, 0b11111, 0b00010, 0b00010],
        '5' => [0b11111, 0b10000, 0b11110, 0b00001, 0b00001, 0b10001, 0b01110],
        '6' => [0b00110, 0b01000, 0b10000, 0b11110, 0b10001, 0b10001, 0b01110],
        '7' => [0b11111, 0b00001, 0b00010, 0b00100, 0b01000, 0b01000, 0b01000],
        '8' => [0b01110, 0b10001, 0b10001, 0b01110, 0b10001, 0b10001, 0b01110],
        '9' => [0b01110, 0b10001, 0b10001, 0b01111, 0b00001, 0b00010, 0b01100],
        'A' => [0b01110, 0b10001, 0b10001, 0b11111, 0b10001, 0b10001, 0b10001],
        'B' => [0b11110, 0b10001, 0b10001, 0b11110, 0b10001, 0b10001, 0b11110],
        'C' => [0b01110, 0b10001, 0b10000, 0b10000, 0b10000, 0b10001, 0b01110],
        'D' => [0b11110, 0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b11110],
        'E' => [0b11111, 0b10000, 0b10000, 0b11110, 0b10000, 0b10000, 0b11111],
        'F' => [0b11111, 0b10000, 0b10000, 0b11110, 0b10000, 0b10000, 0b10000],
        'H' => [0b10001, 0b10001, 0b10001, 0b11111, 0b10001, 0b10001, 0b10001],
        'I' => [0b01110, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100, 0b01110],
        'M' => [0b10001, 0b11011, 0b10101, 0b10101, 0b10001, 0b10001, 0b10001],
        'O' => [0b01110, 0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b01110],
        'P' => [0b11110, 0b10001, 0b10001, 0b11110, 0b10000, 0b10000, 0b10000],
        'T' => [0b11111, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100],
        '-' => [0b00000, 0b00000, 0b00000, 0b01110, 0b00000, 0b00000, 0b00000],
        ':' => [0b00000, 0b00100, 0b00100, 0b00000, 0b00100, 0b00100, 0b00000],
        '#' => [0b01010, 0b01010, 0b11111, 0b01010, 0b11111, 0b01010, 0b01010],
        '.' => [0b00000, 0b00000, 0b00000, 0b00000, 0b00000, 0b00100, 0b00100],
        _ => [0; 7],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::{CAMERA_HEIGHT, CAMERA_WIDTH};
    use chrono::TimeZone;

    fn solid_frame(ordinal: u32, color: [u8; 3]) -> Frame {
        let img = RgbImage::from_pixel(CAMERA_WIDTH, CAMERA_HEIGHT, Rgb(color));
        Frame::from_image(ordinal, &img, false).unwrap()
    }

    fn fixed_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 8, 25, 14, 30, 0).unwrap()
    }

    #[test]
    fn test_dimensions_for_four_frames() {
        let (w, h) = StripAssembler::dimensions(4);
        assert_eq!(w, STRIP_WIDTH);
        let frames = 4 * (FRAME_HEIGHT + 2 * FRAME_BORDER) + 3 * FRAME_SPACING;
        assert_eq!(h, HEADER_HEIGHT + frames + FOOTER_HEIGHT + 2 * OUTER_MARGIN);
    }

    #[test]
    fn test_empty_strip_rejected() {
        let err = StripAssembler::default()
            .assemble(&[], Uuid::new_v4(), fixed_time())
            .unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[test]
    fn test_assemble_is_deterministic() {
        let frames: Vec<Frame> = (0..4)
            .map(|i| solid_frame(i, [60 * i as u8, 100, 160]))
            .collect();
        let id = Uuid::nil();
        let a = StripAssembler::default()
            .assemble(&frames, id, fixed_time())
            .unwrap();
        let b = StripAssembler::default()
            .assemble(&frames, id, fixed_time())
            .unwrap();
        assert_eq!(a.jpeg, b.jpeg);
        let (w, h) = StripAssembler::dimensions(4);
        assert_eq!((a.width, a.height), (w, h));
    }

    #[test]
    fn test_frames_stack_in_capture_order() {
        // Distinct solid colors so the decoded strip reveals ordering
        let frames = vec![solid_frame(0, [220, 30, 30]), solid_frame(1, [30, 30, 220])];
        let strip = StripAssembler::default()
            .assemble(&frames, Uuid::nil(), fixed_time())
            .unwrap();

        let decoded = image::load_from_memory(&strip.jpeg).unwrap().to_rgb8();
        let x = STRIP_WIDTH / 2;
        let first_y = OUTER_MARGIN + HEADER_HEIGHT + FRAME_BORDER + FRAME_HEIGHT / 2;
        let second_y = first_y + FRAME_HEIGHT + 2 * FRAME_BORDER + FRAME_SPACING;

        let first = decoded.get_pixel(x, first_y).0;
        let second = decoded.get_pixel(x, second_y).0;
        // JPEG is lossy; channel dominance is stable
        assert!(first[0] > first[2], "first frame should be red: {:?}", first);
        assert!(second[2] > second[0], "second frame should be blue: {:?}", second);
    }

    #[test]
    fn test_text_width() {
        assert_eq!(text_width("", 2), 0);
        assert_eq!(text_width("AB", 2), 2 * 6 * 2 - 2);
    }
}
