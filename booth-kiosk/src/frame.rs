//! Frame types for the capture pipeline
//!
//! `RawFrame` is the camera-resolution pixel buffer handed to the
//! compositor; it is not retained past compositing. `Frame` is the
//! immutable, encoded result owned by the session.

use booth_common::{Error, Result};
use image::RgbImage;
use std::io::Cursor;

/// Camera capture width in pixels
pub const CAMERA_WIDTH: u32 = 640;
/// Camera capture height in pixels
pub const CAMERA_HEIGHT: u32 = 480;

/// One raw camera frame (packed RGB8, row-major)
#[derive(Debug, Clone)]
pub struct RawFrame {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl RawFrame {
    /// Create a black frame of the given dimensions
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![0; (width * height * 3) as usize],
        }
    }

    /// Wrap an existing RGB8 buffer, validating its length
    pub fn from_pixels(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self> {
        let expected = (width * height * 3) as usize;
        if pixels.len() != expected {
            return Err(Error::Camera(format!(
                "frame buffer length {} does not match {}x{} RGB",
                pixels.len(),
                width,
                height
            )));
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    #[inline]
    pub fn get(&self, x: u32, y: u32) -> [u8; 3] {
        let i = ((y * self.width + x) * 3) as usize;
        [self.pixels[i], self.pixels[i + 1], self.pixels[i + 2]]
    }

    #[inline]
    pub fn set(&mut self, x: u32, y: u32, rgb: [u8; 3]) {
        let i = ((y * self.width + x) * 3) as usize;
        self.pixels[i] = rgb[0];
        self.pixels[i + 1] = rgb[1];
        self.pixels[i + 2] = rgb[2];
    }
}

/// One composited, encoded photo frame
///
/// Never mutated after creation; owned by the session in capture order.
#[derive(Debug, Clone)]
pub struct Frame {
    /// Capture ordinal (0-based)
    pub ordinal: u32,
    pub width: u32,
    pub height: u32,
    /// Encoded JPEG bytes
    pub jpeg: Vec<u8>,
    /// True when the frame is a synthetic placeholder
    pub placeholder: bool,
    pub captured_at: chrono::DateTime<chrono::Utc>,
}

impl Frame {
    /// Encode an image into an immutable frame
    pub fn from_image(ordinal: u32, img: &RgbImage, placeholder: bool) -> Result<Self> {
        let mut buf = Cursor::new(Vec::new());
        img.write_to(&mut buf, image::ImageFormat::Jpeg)
            .map_err(|e| Error::Image(e.to_string()))?;
        Ok(Self {
            ordinal,
            width: img.width(),
            height: img.height(),
            jpeg: buf.into_inner(),
            placeholder,
            captured_at: chrono::Utc::now(),
        })
    }

    /// Decode the frame back into pixels (used by the strip assembler)
    pub fn decode(&self) -> Result<RgbImage> {
        let img = image::load_from_memory(&self.jpeg).map_err(|e| Error::Image(e.to_string()))?;
        Ok(img.to_rgb8())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_frame_roundtrip() {
        let mut frame = RawFrame::new(4, 2);
        frame.set(3, 1, [10, 20, 30]);
        assert_eq!(frame.get(3, 1), [10, 20, 30]);
        assert_eq!(frame.get(0, 0), [0, 0, 0]);
    }

    #[test]
    fn test_from_pixels_length_check() {
        assert!(RawFrame::from_pixels(4, 2, vec![0; 24]).is_ok());
        assert!(RawFrame::from_pixels(4, 2, vec![0; 23]).is_err());
    }

    #[test]
    fn test_frame_encode_decode() {
        let img = RgbImage::from_pixel(16, 12, image::Rgb([120, 80, 40]));
        let frame = Frame::from_image(2, &img, false).unwrap();
        assert_eq!(frame.ordinal, 2);
        assert_eq!(frame.width, 16);
        assert!(!frame.jpeg.is_empty());

        let decoded = frame.decode().unwrap();
        assert_eq!(decoded.dimensions(), (16, 12));
    }
}
