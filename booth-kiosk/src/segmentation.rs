//! Segmentation mask provider
//!
//! Wraps the external foreground/background inference service. The service
//! is a black box that may be slow or unavailable; this adapter bounds its
//! impact on the capture cadence:
//!
//! - at most one inference request in flight (excess submissions are
//!   dropped, not queued, to bound latency)
//! - the latest completed mask lives in an atomically swapped snapshot
//!   slot; readers clone an `Arc`, never observe a partial write
//! - no mask is ever invented or interpolated here

use crate::frame::RawFrame;
use async_trait::async_trait;
use booth_common::{Error, Result};
use std::io::Cursor;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tracing::{debug, warn};

/// Per-pixel probability-of-foreground map, pixel-aligned with the source
/// frame it was produced from
#[derive(Debug, Clone)]
pub struct SegmentationMask {
    pub width: u32,
    pub height: u32,
    /// Row-major probabilities, 0 (background) to 255 (foreground)
    pub data: Vec<u8>,
    /// When inference completed, for staleness checks by callers
    pub produced_at: Instant,
}

impl SegmentationMask {
    /// Wrap a probability buffer, validating its length
    pub fn new(width: u32, height: u32, data: Vec<u8>) -> Result<Self> {
        let expected = (width * height) as usize;
        if data.len() != expected {
            return Err(Error::Segmentation(format!(
                "mask length {} does not match {}x{}",
                data.len(),
                width,
                height
            )));
        }
        Ok(Self {
            width,
            height,
            data,
            produced_at: Instant::now(),
        })
    }

    /// Uniform-probability mask (test and fallback scenarios)
    pub fn uniform(width: u32, height: u32, probability: u8) -> Self {
        Self {
            width,
            height,
            data: vec![probability; (width * height) as usize],
            produced_at: Instant::now(),
        }
    }

    #[inline]
    pub fn probability(&self, x: u32, y: u32) -> u8 {
        self.data[(y * self.width + x) as usize]
    }

    /// Whether the mask is pixel-aligned with a frame of these dimensions
    pub fn matches_dimensions(&self, width: u32, height: u32) -> bool {
        self.width == width && self.height == height
    }
}

/// Inference seam for the external segmentation model
#[async_trait]
pub trait MaskInference: Send + Sync {
    /// Run inference on one frame, yielding a mask of matching dimensions
    async fn infer(&self, frame: &RawFrame) -> Result<SegmentationMask>;
}

/// Debounced adapter in front of a `MaskInference` implementation
pub struct MaskProvider {
    inference: Arc<dyn MaskInference>,
    latest: watch::Sender<Option<Arc<SegmentationMask>>>,
    in_flight: AtomicBool,
    dropped: AtomicU64,
}

impl MaskProvider {
    pub fn new(inference: Arc<dyn MaskInference>) -> Arc<Self> {
        let (latest, _) = watch::channel(None);
        Arc::new(Self {
            inference,
            latest,
            in_flight: AtomicBool::new(false),
            dropped: AtomicU64::new(0),
        })
    }

    /// Most recently completed mask, regardless of age
    ///
    /// Callers are responsible for freshness checks.
    pub fn latest(&self) -> Option<Arc<SegmentationMask>> {
        self.latest.borrow().clone()
    }

    /// Submit a frame for inference
    ///
    /// Dropped (not queued) when a request is already in flight.
    pub fn submit(self: &Arc<Self>, frame: RawFrame) {
        if self.in_flight.swap(true, Ordering::SeqCst) {
            self.dropped.fetch_add(1, Ordering::Relaxed);
            debug!("Mask submission dropped: inference already in flight");
            return;
        }

        let provider = Arc::clone(self);
        tokio::spawn(async move {
            match provider.inference.infer(&frame).await {
                Ok(mask) => {
                    let _ = provider.latest.send(Some(Arc::new(mask)));
                }
                Err(e) => {
                    warn!("Mask inference failed: {}", e);
                }
            }
            provider.in_flight.store(false, Ordering::SeqCst);
        });
    }

    /// Wait (bounded) for an in-flight inference, then return the latest
    /// snapshot, which may still be `None` or stale on timeout
    pub async fn wait_for_mask(&self, timeout: Duration) -> Option<Arc<SegmentationMask>> {
        if !self.in_flight.load(Ordering::SeqCst) {
            return self.latest();
        }
        let mut rx = self.latest.subscribe();
        // On timeout we fall through to whatever the slot holds now
        let _ = tokio::time::timeout(timeout, rx.changed()).await;
        self.latest()
    }

    /// Number of submissions dropped by the single-in-flight debounce
    pub fn dropped_submissions(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

/// HTTP client for the segmentation inference service
///
/// Posts the frame as PNG and expects a raw probability buffer of
/// width × height bytes back.
pub struct HttpMaskInference {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpMaskInference {
    pub fn new(endpoint: &str, timeout_ms: u64) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .build()
            .map_err(|e| Error::Segmentation(e.to_string()))?;
        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
        })
    }
}

#[async_trait]
impl MaskInference for HttpMaskInference {
    async fn infer(&self, frame: &RawFrame) -> Result<SegmentationMask> {
        let img = image::RgbImage::from_raw(frame.width, frame.height, frame.pixels.clone())
            .ok_or_else(|| Error::Segmentation("invalid frame buffer".to_string()))?;
        let mut png = Cursor::new(Vec::new());
        img.write_to(&mut png, image::ImageFormat::Png)
            .map_err(|e| Error::Image(e.to_string()))?;

        let response = self
            .client
            .post(&self.endpoint)
            .header("content-type", "image/png")
            .body(png.into_inner())
            .send()
            .await
            .map_err(|e| Error::Segmentation(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(Error::Segmentation(format!(
                "inference service returned {}: {}",
                status, detail
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| Error::Segmentation(e.to_string()))?;
        SegmentationMask::new(frame.width, frame.height, bytes.to_vec())
    }
}
