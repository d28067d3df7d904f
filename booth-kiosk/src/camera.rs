//! Camera device abstraction and placeholder frame synthesis
//!
//! Physical camera/USB driver integration is an external collaborator; the
//! kiosk talks to it through the `CameraDevice` seam. The bundled
//! `SimulatedCamera` produces a synthetic live feed so the booth remains
//! fully operable on hardware without a capture device.

use crate::frame::{Frame, RawFrame};
use async_trait::async_trait;
use booth_common::Result;
use image::{Rgb, RgbImage};
use rand::Rng;
use std::sync::atomic::{AtomicU32, Ordering};
use tracing::error;

/// Exclusive camera resource seam
///
/// At most one active session holds the device: acquired via `open` at
/// session start and released via `close` on every exit path.
#[async_trait]
pub trait CameraDevice: Send + Sync {
    /// Acquire the device. Failure puts the session into placeholder mode
    /// rather than aborting it.
    async fn open(&self) -> Result<()>;

    /// Grab one frame from the live feed
    async fn grab_frame(&self) -> Result<RawFrame>;

    /// Release the device
    async fn close(&self);
}

/// Synthetic camera producing a slowly shifting test pattern
pub struct SimulatedCamera {
    width: u32,
    height: u32,
    frame_counter: AtomicU32,
}

impl SimulatedCamera {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            frame_counter: AtomicU32::new(0),
        }
    }
}

#[async_trait]
impl CameraDevice for SimulatedCamera {
    async fn open(&self) -> Result<()> {
        Ok(())
    }

    async fn grab_frame(&self) -> Result<RawFrame> {
        let tick = self.frame_counter.fetch_add(1, Ordering::Relaxed);
        let mut frame = RawFrame::new(self.width, self.height);

        // Diagonal gradient with a drifting bright band, enough structure
        // for the compositor and strip to produce recognizable output
        let band = (tick * 7) % self.width;
        for y in 0..self.height {
            for x in 0..self.width {
                let g = ((x + y) * 255 / (self.width + self.height)) as u8;
                let boost = if x.abs_diff(band) < 24 { 60 } else { 0 };
                frame.set(x, y, [g.saturating_add(boost), g, 255 - g]);
            }
        }
        Ok(frame)
    }

    async fn close(&self) {}
}

/// Synthesize a placeholder image for a failed or simulated capture
///
/// Dark field with a row of pose markers (one per completed shot plus the
/// current one) and sparse noise, so the substituted frame is clearly
/// labeled as synthetic in the finished strip.
pub fn placeholder_image(ordinal: u32, width: u32, height: u32) -> RgbImage {
    let mut img = RgbImage::from_pixel(width, height, Rgb([17, 17, 17]));

    // Pose markers: (ordinal + 1) light squares centered horizontally
    let marker = width / 16;
    let gap = marker / 2;
    let count = ordinal + 1;
    let total = count * marker + (count - 1) * gap;
    let x0 = (width.saturating_sub(total)) / 2;
    let y0 = (height.saturating_sub(marker)) / 2;
    for i in 0..count {
        let mx = x0 + i * (marker + gap);
        for y in y0..(y0 + marker).min(height) {
            for x in mx..(mx + marker).min(width) {
                img.put_pixel(x, y, Rgb([68, 68, 68]));
            }
        }
    }

    // Sparse film-grain noise
    let mut rng = rand::thread_rng();
    for _ in 0..100 {
        // Bounds clamped so degenerate dimensions stay panic-free
        let x = rng.gen_range(0..width.saturating_sub(1).max(1));
        let y = rng.gen_range(0..height.saturating_sub(1).max(1));
        let v = if rng.gen_bool(0.5) { 255 } else { 0 };
        for (dx, dy) in [(0, 0), (1, 0), (0, 1), (1, 1)] {
            if x + dx < width && y + dy < height {
                img.put_pixel(x + dx, y + dy, Rgb([v, v, v]));
            }
        }
    }

    img
}

/// Build a placeholder `Frame` for a shot that could not be captured
///
/// Infallible by contract: a capture failure must yield a frame, never an
/// error, so the session always reaches its full shot count.
pub fn placeholder_frame(ordinal: u32, width: u32, height: u32) -> Frame {
    let img = placeholder_image(ordinal, width, height);
    Frame::from_image(ordinal, &img, true).unwrap_or_else(|e| {
        error!("Placeholder encode failed for shot {}: {}", ordinal, e);
        Frame {
            ordinal,
            width,
            height,
            jpeg: Vec::new(),
            placeholder: true,
            captured_at: chrono::Utc::now(),
        }
    })
}
