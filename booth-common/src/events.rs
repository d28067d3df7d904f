//! Event types for the booth event system
//!
//! Provides shared event definitions and the EventBus used by the kiosk
//! service and its SSE endpoint.
//!
//! # Architecture
//!
//! The kiosk uses hybrid communication:
//! - **EventBus** (tokio::broadcast): one-to-many event broadcasting
//! - **Shared state** (Arc<RwLock<T>>): read-heavy access
//! - **watch channels**: abort signaling and latest-mask snapshots

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

/// Capture session lifecycle phase
///
/// The session controller advances through these phases on a single
/// timer-driven timeline:
/// `Idle → Countdown → Flash → (loop) → Finalizing → Complete`
/// with `Aborted` reachable from any in-progress phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    /// No session in progress
    Idle,
    /// Counting down to the next shot
    Countdown,
    /// Shot just captured, flash feedback active
    Flash,
    /// All frames captured, assembling the strip
    Finalizing,
    /// Strip assembled and handed to delivery
    Complete,
    /// Session cancelled by the user
    Aborted,
}

impl SessionPhase {
    /// True while the camera resource is held
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            SessionPhase::Countdown | SessionPhase::Flash | SessionPhase::Finalizing
        )
    }
}

/// Delivery channel kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelKind {
    Email,
    Sms,
}

impl ChannelKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChannelKind::Email => "email",
            ChannelKind::Sms => "sms",
        }
    }

    /// Parse channel kind from its wire string
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "email" => Some(ChannelKind::Email),
            "sms" | "mms" => Some(ChannelKind::Sms),
            _ => None,
        }
    }
}

impl std::fmt::Display for ChannelKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Per-channel delivery task status
///
/// Transitions are guarded by [`DeliveryStatus::can_transition_to`]; the
/// dispatcher is the only writer. `Sent` is terminal except via an explicit
/// user-initiated resend, which re-enters `Pending`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryStatus {
    Pending,
    Sending,
    Sent,
    Error,
}

impl DeliveryStatus {
    /// Whether the guarded transition `self → next` is legal
    ///
    /// - `Pending → Sending` (dispatch picks up the task)
    /// - `Sending → Sent | Error` (transport outcome)
    /// - `Error → Pending` and `Sent → Pending` (explicit resend only)
    pub fn can_transition_to(&self, next: DeliveryStatus) -> bool {
        use DeliveryStatus::*;
        matches!(
            (self, next),
            (Pending, Sending) | (Sending, Sent) | (Sending, Error) | (Error, Pending) | (Sent, Pending)
        )
    }

    /// True once the task requires no further automatic work
    pub fn is_settled(&self) -> bool {
        matches!(self, DeliveryStatus::Sent | DeliveryStatus::Error)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryStatus::Pending => "pending",
            DeliveryStatus::Sending => "sending",
            DeliveryStatus::Sent => "sent",
            DeliveryStatus::Error => "error",
        }
    }
}

impl std::fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Booth event types
///
/// Events are broadcast via EventBus and serialized for SSE transmission.
/// All events use this central enum for type safety and exhaustive matching.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum BoothEvent {
    /// A capture session started and the camera was acquired (or fell back
    /// to placeholder mode)
    SessionStarted {
        session_id: Uuid,
        background_id: String,
        style: String,
        camera_available: bool,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Countdown tick before a shot (remaining seconds, 3..1)
    CountdownTick {
        session_id: Uuid,
        shot: u32,
        remaining: u32,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// A frame was captured and composited
    FrameCaptured {
        session_id: Uuid,
        ordinal: u32,
        /// True when the frame is a synthetic placeholder
        placeholder: bool,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Flash feedback fired for a shot
    FlashFired {
        session_id: Uuid,
        ordinal: u32,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Strip assembly finished
    StripAssembled {
        session_id: Uuid,
        width: u32,
        height: u32,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Session reached Complete and was handed to delivery
    SessionCompleted {
        session_id: Uuid,
        frame_count: u32,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Session was aborted by the user
    SessionAborted {
        session_id: Uuid,
        frames_captured: u32,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// A delivery task changed status
    DeliveryStatusChanged {
        session_id: Uuid,
        channel: ChannelKind,
        status: DeliveryStatus,
        /// Human-readable detail for `Error`, provider message id for `Sent`
        detail: Option<String>,
        timestamp: chrono::DateTime<chrono::Utc>,
    },
}

impl BoothEvent {
    /// Event type string for the SSE `event:` field
    pub fn type_str(&self) -> &'static str {
        match self {
            BoothEvent::SessionStarted { .. } => "SessionStarted",
            BoothEvent::CountdownTick { .. } => "CountdownTick",
            BoothEvent::FrameCaptured { .. } => "FrameCaptured",
            BoothEvent::FlashFired { .. } => "FlashFired",
            BoothEvent::StripAssembled { .. } => "StripAssembled",
            BoothEvent::SessionCompleted { .. } => "SessionCompleted",
            BoothEvent::SessionAborted { .. } => "SessionAborted",
            BoothEvent::DeliveryStatusChanged { .. } => "DeliveryStatusChanged",
        }
    }
}

/// One-to-many event broadcaster
///
/// Thin wrapper over `tokio::sync::broadcast`; emitting with no subscribers
/// is not an error.
pub struct EventBus {
    tx: broadcast::Sender<BoothEvent>,
}

impl EventBus {
    /// Create a new EventBus with the given channel capacity
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Subscribe to all future events
    pub fn subscribe(&self) -> broadcast::Receiver<BoothEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Send errors (no receivers) are ignored.
    pub fn emit(&self, event: BoothEvent) {
        let _ = self.tx.send(event);
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(1000)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delivery_transitions() {
        use DeliveryStatus::*;
        assert!(Pending.can_transition_to(Sending));
        assert!(Sending.can_transition_to(Sent));
        assert!(Sending.can_transition_to(Error));
        // Resend paths
        assert!(Error.can_transition_to(Pending));
        assert!(Sent.can_transition_to(Pending));
        // Illegal transitions
        assert!(!Pending.can_transition_to(Sent));
        assert!(!Pending.can_transition_to(Error));
        assert!(!Sent.can_transition_to(Sending));
        assert!(!Error.can_transition_to(Sent));
    }

    #[test]
    fn test_settled() {
        assert!(!DeliveryStatus::Pending.is_settled());
        assert!(!DeliveryStatus::Sending.is_settled());
        assert!(DeliveryStatus::Sent.is_settled());
        assert!(DeliveryStatus::Error.is_settled());
    }

    #[test]
    fn test_channel_parse() {
        assert_eq!(ChannelKind::from_str("email"), Some(ChannelKind::Email));
        assert_eq!(ChannelKind::from_str("SMS"), Some(ChannelKind::Sms));
        assert_eq!(ChannelKind::from_str("mms"), Some(ChannelKind::Sms));
        assert_eq!(ChannelKind::from_str("fax"), None);
    }

    #[test]
    fn test_phase_activity() {
        assert!(!SessionPhase::Idle.is_active());
        assert!(SessionPhase::Countdown.is_active());
        assert!(SessionPhase::Flash.is_active());
        assert!(SessionPhase::Finalizing.is_active());
        assert!(!SessionPhase::Complete.is_active());
        assert!(!SessionPhase::Aborted.is_active());
    }

    #[tokio::test]
    async fn test_event_bus_broadcast() {
        let bus = EventBus::new(16);
        let mut rx = bus.subscribe();

        bus.emit(BoothEvent::CountdownTick {
            session_id: Uuid::new_v4(),
            shot: 0,
            remaining: 3,
            timestamp: chrono::Utc::now(),
        });

        let event = rx.recv().await.unwrap();
        assert_eq!(event.type_str(), "CountdownTick");
    }

    #[test]
    fn test_event_serde_tag() {
        let event = BoothEvent::SessionCompleted {
            session_id: Uuid::new_v4(),
            frame_count: 4,
            timestamp: chrono::Utc::now(),
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"type\":\"SessionCompleted\""));
    }
}
