//! End-to-end session controller tests
//!
//! Drive the full countdown/capture/flash state machine with mock cameras
//! and inference, at millisecond cadence.

use async_trait::async_trait;
use booth_common::events::{BoothEvent, SessionPhase};
use booth_common::{Error, Result, StyleFilter};
use booth_kiosk::camera::CameraDevice;
use booth_kiosk::compositor::Compositor;
use booth_kiosk::frame::RawFrame;
use booth_kiosk::segmentation::{MaskInference, MaskProvider, SegmentationMask};
use booth_kiosk::session::{
    CaptureCadence, RecipientSet, SessionConfig, SessionController, SHOTS_PER_SESSION,
};
use booth_kiosk::state::SharedState;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use uuid::Uuid;

/// Camera whose device is present but whose captures always fail
struct BrokenCamera {
    closes: AtomicU32,
}

impl BrokenCamera {
    fn new() -> Self {
        Self {
            closes: AtomicU32::new(0),
        }
    }
}

#[async_trait]
impl CameraDevice for BrokenCamera {
    async fn open(&self) -> Result<()> {
        Ok(())
    }

    async fn grab_frame(&self) -> Result<RawFrame> {
        Err(Error::Camera("capture failed".into()))
    }

    async fn close(&self) {
        self.closes.fetch_add(1, Ordering::SeqCst);
    }
}

/// Camera whose device cannot be acquired at all
struct AbsentCamera {
    closes: AtomicU32,
}

impl AbsentCamera {
    fn new() -> Self {
        Self {
            closes: AtomicU32::new(0),
        }
    }
}

#[async_trait]
impl CameraDevice for AbsentCamera {
    async fn open(&self) -> Result<()> {
        Err(Error::Camera("device not found".into()))
    }

    async fn grab_frame(&self) -> Result<RawFrame> {
        Err(Error::Camera("device not open".into()))
    }

    async fn close(&self) {
        self.closes.fetch_add(1, Ordering::SeqCst);
    }
}

/// Healthy camera producing a solid mid-gray feed
struct SolidCamera;

#[async_trait]
impl CameraDevice for SolidCamera {
    async fn open(&self) -> Result<()> {
        Ok(())
    }

    async fn grab_frame(&self) -> Result<RawFrame> {
        let mut frame = RawFrame::new(64, 48);
        for y in 0..48 {
            for x in 0..64 {
                frame.set(x, y, [128, 128, 128]);
            }
        }
        Ok(frame)
    }

    async fn close(&self) {}
}

struct CountingInference {
    calls: AtomicU32,
}

#[async_trait]
impl MaskInference for CountingInference {
    async fn infer(&self, frame: &RawFrame) -> Result<SegmentationMask> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(SegmentationMask::uniform(frame.width, frame.height, 255))
    }
}

fn config(background_id: &str) -> SessionConfig {
    SessionConfig {
        session_id: Uuid::new_v4(),
        background_id: background_id.to_string(),
        style: StyleFilter::default(),
        recipients: RecipientSet::new(Some("guest@example.com".into()), None),
    }
}

fn controller(
    config: SessionConfig,
    camera: Arc<dyn CameraDevice>,
    masks: Option<Arc<MaskProvider>>,
    state: Arc<SharedState>,
    abort_rx: watch::Receiver<bool>,
) -> SessionController {
    SessionController::new(
        config,
        CaptureCadence::fast(),
        camera,
        masks,
        Compositor::default(),
        state,
        abort_rx,
    )
}

#[tokio::test]
async fn test_failing_captures_still_complete_with_placeholders() {
    let camera = Arc::new(BrokenCamera::new());
    let state = Arc::new(SharedState::new());
    let (_abort_tx, abort_rx) = watch::channel(false);

    let completed = controller(config("none"), camera.clone(), None, state.clone(), abort_rx)
        .run()
        .await
        .unwrap()
        .expect("session should complete");

    let frames = &completed.session.frames;
    assert_eq!(frames.len() as u32, SHOTS_PER_SESSION);
    assert!(completed.session.frames_contiguous());
    assert!(frames.iter().all(|f| f.placeholder));
    assert!(!completed.strip.jpeg.is_empty());

    assert_eq!(state.phase().await, SessionPhase::Complete);
    assert_eq!(camera.closes.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_unavailable_device_runs_whole_session_in_placeholder_mode() {
    let camera = Arc::new(AbsentCamera::new());
    let state = Arc::new(SharedState::new());
    let (_abort_tx, abort_rx) = watch::channel(false);

    let completed = controller(config("none"), camera.clone(), None, state.clone(), abort_rx)
        .run()
        .await
        .unwrap()
        .expect("session should complete");

    let frames = &completed.session.frames;
    assert_eq!(frames.len() as u32, SHOTS_PER_SESSION);
    assert!(completed.session.frames_contiguous());
    assert!(frames.iter().all(|f| f.placeholder));
    assert!(!completed.strip.jpeg.is_empty());

    assert_eq!(state.phase().await, SessionPhase::Complete);
    assert_eq!(camera.closes.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_plain_background_never_runs_inference() {
    let inference = Arc::new(CountingInference {
        calls: AtomicU32::new(0),
    });
    let provider = MaskProvider::new(inference.clone());
    let state = Arc::new(SharedState::new());
    let (_abort_tx, abort_rx) = watch::channel(false);

    let completed = controller(
        config("none"),
        Arc::new(SolidCamera),
        Some(provider),
        state,
        abort_rx,
    )
    .run()
    .await
    .unwrap()
    .expect("session should complete");

    assert_eq!(completed.session.frames.len() as u32, SHOTS_PER_SESSION);
    assert_eq!(inference.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_backdrop_session_runs_inference_and_composites() {
    let inference = Arc::new(CountingInference {
        calls: AtomicU32::new(0),
    });
    let provider = MaskProvider::new(inference.clone());
    let state = Arc::new(SharedState::new());
    let (_abort_tx, abort_rx) = watch::channel(false);

    let completed = controller(
        config("sunset-blush"),
        Arc::new(SolidCamera),
        Some(provider),
        state,
        abort_rx,
    )
    .run()
    .await
    .unwrap()
    .expect("session should complete");

    assert!(inference.calls.load(Ordering::SeqCst) >= 1);
    assert!(completed.session.frames.iter().all(|f| !f.placeholder));
}

#[tokio::test]
async fn test_abort_stops_session_and_releases_camera() {
    let camera = Arc::new(BrokenCamera::new());
    let state = Arc::new(SharedState::new());
    let (abort_tx, abort_rx) = watch::channel(false);

    // Stretch the countdown so the abort lands mid-session
    let cadence = CaptureCadence {
        settle: Duration::from_millis(1),
        countdown_tick: Duration::from_secs(10),
        flash: Duration::from_millis(1),
    };
    let controller = SessionController::new(
        config("none"),
        cadence,
        camera.clone(),
        None,
        Compositor::default(),
        state.clone(),
        abort_rx,
    );

    let handle = tokio::spawn(controller.run());
    tokio::time::sleep(Duration::from_millis(50)).await;
    abort_tx.send(true).unwrap();

    let outcome = handle.await.unwrap().unwrap();
    assert!(outcome.is_none());
    assert_eq!(state.phase().await, SessionPhase::Aborted);
    assert_eq!(camera.closes.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_event_sequence_for_one_session() {
    let state = Arc::new(SharedState::new());
    let mut events = state.subscribe_events();
    let (_abort_tx, abort_rx) = watch::channel(false);

    controller(
        config("none"),
        Arc::new(SolidCamera),
        None,
        state.clone(),
        abort_rx,
    )
    .run()
    .await
    .unwrap()
    .expect("session should complete");

    let mut ticks = 0;
    let mut captured = 0;
    let mut flashes = 0;
    let mut completed = 0;
    while let Ok(event) = events.try_recv() {
        match event {
            BoothEvent::CountdownTick { remaining, .. } => {
                assert!((1..=3).contains(&remaining));
                ticks += 1;
            }
            BoothEvent::FrameCaptured { .. } => captured += 1,
            BoothEvent::FlashFired { .. } => flashes += 1,
            BoothEvent::SessionCompleted { frame_count, .. } => {
                assert_eq!(frame_count, SHOTS_PER_SESSION);
                completed += 1;
            }
            _ => {}
        }
    }
    assert_eq!(ticks, 3 * SHOTS_PER_SESSION);
    assert_eq!(captured, SHOTS_PER_SESSION);
    assert_eq!(flashes, SHOTS_PER_SESSION);
    assert_eq!(completed, 1);
}
