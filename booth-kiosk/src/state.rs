//! Shared kiosk state
//!
//! Thread-safe state shared between the session controller, the delivery
//! dispatcher, and the HTTP/SSE surface.

use booth_common::events::{BoothEvent, EventBus, SessionPhase};
use serde::Serialize;
use std::sync::atomic::{AtomicU32, Ordering};
use tokio::sync::{broadcast, RwLock};
use uuid::Uuid;

/// Point-in-time session status for the API
#[derive(Debug, Clone, Serialize)]
pub struct SessionStatus {
    pub session_id: Option<Uuid>,
    pub phase: SessionPhase,
    pub frames_captured: u32,
}

/// Shared state accessible by all components
pub struct SharedState {
    /// Current session phase
    phase: RwLock<SessionPhase>,

    /// Currently active (or last finished) session
    current_session: RwLock<Option<Uuid>>,

    /// Frames captured so far in the active session
    frames_captured: AtomicU32,

    /// Event broadcaster for SSE
    event_bus: EventBus,
}

impl SharedState {
    pub fn new() -> Self {
        Self {
            phase: RwLock::new(SessionPhase::Idle),
            current_session: RwLock::new(None),
            frames_captured: AtomicU32::new(0),
            event_bus: EventBus::default(),
        }
    }

    pub fn emit(&self, event: BoothEvent) {
        self.event_bus.emit(event);
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<BoothEvent> {
        self.event_bus.subscribe()
    }

    pub async fn phase(&self) -> SessionPhase {
        *self.phase.read().await
    }

    pub async fn set_phase(&self, phase: SessionPhase) {
        *self.phase.write().await = phase;
    }

    pub async fn begin_session(&self, session_id: Uuid) {
        *self.current_session.write().await = Some(session_id);
        self.frames_captured.store(0, Ordering::Relaxed);
    }

    pub fn record_frame(&self) {
        self.frames_captured.fetch_add(1, Ordering::Relaxed);
    }

    pub async fn snapshot(&self) -> SessionStatus {
        SessionStatus {
            session_id: *self.current_session.read().await,
            phase: *self.phase.read().await,
            frames_captured: self.frames_captured.load(Ordering::Relaxed),
        }
    }
}

impl Default for SharedState {
    fn default() -> Self {
        Self::new()
    }
}
