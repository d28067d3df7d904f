//! Capture session controller
//!
//! Explicit finite-state machine for one photo-booth run:
//! `Idle → Countdown(3..1) → capture → Flash → (loop × 4) → Finalizing →
//! Complete`, with `Aborted` reachable at every suspension point.
//!
//! Capture failures are absorbed: a synthetic placeholder frame is
//! substituted and the count still advances, so the session always reaches
//! exactly the full shot count and terminates. The camera is the one shared
//! external resource and is released on every exit path.

use crate::camera::{placeholder_frame, CameraDevice};
use crate::catalog::background_by_id;
use crate::compositor::{Compositor, MASK_WAIT};
use crate::frame::{Frame, CAMERA_HEIGHT, CAMERA_WIDTH};
use crate::segmentation::MaskProvider;
use crate::session::types::{
    CaptureCadence, CompletedSession, Session, SessionConfig, COUNTDOWN_SECONDS, SHOTS_PER_SESSION,
};
use crate::state::SharedState;
use crate::strip::StripAssembler;
use booth_common::events::{BoothEvent, SessionPhase};
use booth_common::Result;
use image::RgbImage;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{info, warn};

pub struct SessionController {
    config: SessionConfig,
    cadence: CaptureCadence,
    camera: Arc<dyn CameraDevice>,
    /// Present only when the session has a backdrop and inference is
    /// configured (pure cost avoidance otherwise)
    masks: Option<Arc<MaskProvider>>,
    compositor: Compositor,
    state: Arc<SharedState>,
    abort_rx: watch::Receiver<bool>,
}

impl SessionController {
    pub fn new(
        config: SessionConfig,
        cadence: CaptureCadence,
        camera: Arc<dyn CameraDevice>,
        masks: Option<Arc<MaskProvider>>,
        compositor: Compositor,
        state: Arc<SharedState>,
        abort_rx: watch::Receiver<bool>,
    ) -> Self {
        Self {
            config,
            cadence,
            camera,
            masks,
            compositor,
            state,
            abort_rx,
        }
    }

    /// Run the session to completion
    ///
    /// Returns `Ok(None)` when aborted. The camera is released before this
    /// returns, on every path.
    pub async fn run(mut self) -> Result<Option<CompletedSession>> {
        let session_id = self.config.session_id;

        let camera_available = match self.camera.open().await {
            Ok(()) => true,
            Err(e) => {
                warn!("Camera unavailable, running session {} in placeholder mode: {}", session_id, e);
                false
            }
        };

        // Malformed backdrop degrades to no backdrop rather than failing
        let background = background_by_id(&self.config.background_id);
        let background_pixels = match background.rasterize(CAMERA_WIDTH, CAMERA_HEIGHT) {
            Ok(pixels) => pixels,
            Err(e) => {
                warn!("Backdrop '{}' failed to rasterize: {}", background.id, e);
                None
            }
        };

        self.state.begin_session(session_id).await;
        self.state.emit(BoothEvent::SessionStarted {
            session_id,
            background_id: self.config.background_id.clone(),
            style: self.config.style.to_string(),
            camera_available,
            timestamp: chrono::Utc::now(),
        });
        info!(
            "Session {} started (background: {}, style: {}, camera: {})",
            session_id, self.config.background_id, self.config.style, camera_available
        );

        let mut session = Session::new(self.config.clone());
        let outcome = self
            .capture_loop(camera_available, background_pixels.as_ref(), &mut session)
            .await;

        // The one shared external resource: released on every exit path
        self.camera.close().await;

        if !outcome {
            self.state.set_phase(SessionPhase::Aborted).await;
            self.state.emit(BoothEvent::SessionAborted {
                session_id,
                frames_captured: session.frames.len() as u32,
                timestamp: chrono::Utc::now(),
            });
            info!("Session {} aborted after {} frames", session_id, session.frames.len());
            return Ok(None);
        }

        debug_assert!(session.frames_contiguous());
        debug_assert_eq!(session.frames.len() as u32, SHOTS_PER_SESSION);

        self.state.set_phase(SessionPhase::Finalizing).await;
        let strip = StripAssembler::default().assemble(
            &session.frames,
            session_id,
            chrono::Utc::now(),
        )?;
        self.state.emit(BoothEvent::StripAssembled {
            session_id,
            width: strip.width,
            height: strip.height,
            timestamp: chrono::Utc::now(),
        });

        self.state.set_phase(SessionPhase::Complete).await;
        self.state.emit(BoothEvent::SessionCompleted {
            session_id,
            frame_count: session.frames.len() as u32,
            timestamp: chrono::Utc::now(),
        });
        info!("Session {} complete: strip {}x{}", session_id, strip.width, strip.height);

        Ok(Some(CompletedSession { session, strip }))
    }

    /// Countdown/capture/flash loop; returns false on abort
    async fn capture_loop(
        &mut self,
        camera_available: bool,
        background: Option<&RgbImage>,
        session: &mut Session,
    ) -> bool {
        for ordinal in 0..SHOTS_PER_SESSION {
            // Settle before the countdown starts
            if !self.sleep_or_abort(self.cadence.settle).await {
                return false;
            }

            self.state.set_phase(SessionPhase::Countdown).await;
            for remaining in (1..=COUNTDOWN_SECONDS).rev() {
                self.state.emit(BoothEvent::CountdownTick {
                    session_id: self.config.session_id,
                    shot: ordinal,
                    remaining,
                    timestamp: chrono::Utc::now(),
                });
                if !self.sleep_or_abort(self.cadence.countdown_tick).await {
                    return false;
                }
            }

            let frame = self.capture_shot(ordinal, camera_available, background).await;
            let placeholder = frame.placeholder;
            session.frames.push(frame);
            self.state.record_frame();
            self.state.emit(BoothEvent::FrameCaptured {
                session_id: self.config.session_id,
                ordinal,
                placeholder,
                timestamp: chrono::Utc::now(),
            });

            self.state.set_phase(SessionPhase::Flash).await;
            self.state.emit(BoothEvent::FlashFired {
                session_id: self.config.session_id,
                ordinal,
                timestamp: chrono::Utc::now(),
            });
            if !self.sleep_or_abort(self.cadence.flash).await {
                return false;
            }
        }
        true
    }

    /// Capture and composite one shot, absorbing every failure into a
    /// placeholder so the count always advances
    async fn capture_shot(
        &self,
        ordinal: u32,
        camera_available: bool,
        background: Option<&RgbImage>,
    ) -> Frame {
        if camera_available {
            match self.camera.grab_frame().await {
                Ok(raw) => {
                    // Mask inference only runs when a backdrop needs matting
                    let mask = match (&self.masks, background) {
                        (Some(provider), Some(_)) => {
                            provider.submit(raw.clone());
                            provider.wait_for_mask(MASK_WAIT).await
                        }
                        _ => None,
                    };

                    match self.compositor.compose(
                        &raw,
                        ordinal,
                        background,
                        mask.as_deref(),
                        self.config.style,
                    ) {
                        Ok(frame) => return frame,
                        Err(e) => warn!("Compositing failed for shot {}: {}", ordinal, e),
                    }
                }
                Err(e) => warn!("Capture failed for shot {}: {}", ordinal, e),
            }
        }
        placeholder_frame(ordinal, CAMERA_WIDTH, CAMERA_HEIGHT)
    }

    /// Sleep, waking early (returning false) when the session is aborted
    async fn sleep_or_abort(&mut self, duration: Duration) -> bool {
        tokio::select! {
            _ = tokio::time::sleep(duration) => true,
            // Fires on abort signal; a closed channel also ends the session
            _ = self.abort_rx.changed() => false,
        }
    }
}
