//! Session data model

use crate::frame::Frame;
use crate::strip::StripImage;
use booth_common::{Error, Result, StyleFilter};
use std::time::Duration;
use uuid::Uuid;

/// Shots per strip
pub const SHOTS_PER_SESSION: u32 = 4;

/// Countdown start value before each shot
pub const COUNTDOWN_SECONDS: u32 = 3;

/// Recipient contact set; at least one address is required to proceed
#[derive(Debug, Clone, Default)]
pub struct RecipientSet {
    pub email: Option<String>,
    pub phone: Option<String>,
}

impl RecipientSet {
    /// Build from raw inputs, treating blank strings as absent
    pub fn new(email: Option<String>, phone: Option<String>) -> Self {
        let clean = |v: Option<String>| v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty());
        Self {
            email: clean(email),
            phone: clean(phone),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.email.is_none() && self.phone.is_none() {
            return Err(Error::InvalidInput(
                "at least one recipient (email or phone) is required".to_string(),
            ));
        }
        Ok(())
    }
}

/// Immutable per-session configuration, read once at session start
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub session_id: Uuid,
    pub background_id: String,
    pub style: StyleFilter,
    pub recipients: RecipientSet,
}

/// Timing knobs for the countdown/capture/flash cadence
///
/// Defaults match the booth's production cadence; tests shrink them to
/// keep the full state machine fast.
#[derive(Debug, Clone)]
pub struct CaptureCadence {
    /// Settle delay before each countdown starts
    pub settle: Duration,
    /// One countdown tick
    pub countdown_tick: Duration,
    /// Flash feedback duration after each shot
    pub flash: Duration,
}

impl Default for CaptureCadence {
    fn default() -> Self {
        Self {
            settle: Duration::from_secs(1),
            countdown_tick: Duration::from_secs(1),
            flash: Duration::from_millis(200),
        }
    }
}

impl CaptureCadence {
    /// Millisecond-scale cadence for tests
    pub fn fast() -> Self {
        Self {
            settle: Duration::from_millis(1),
            countdown_tick: Duration::from_millis(1),
            flash: Duration::from_millis(1),
        }
    }
}

/// One photo-booth run, owned by the controller until handed off
#[derive(Debug)]
pub struct Session {
    pub config: SessionConfig,
    pub frames: Vec<Frame>,
    pub started_at: chrono::DateTime<chrono::Utc>,
}

impl Session {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config,
            frames: Vec::with_capacity(SHOTS_PER_SESSION as usize),
            started_at: chrono::Utc::now(),
        }
    }

    /// Frames present, contiguous, and in capture order (0..n-1)
    pub fn frames_contiguous(&self) -> bool {
        self.frames
            .iter()
            .enumerate()
            .all(|(i, f)| f.ordinal == i as u32)
    }
}

/// Finished session plus its assembled strip, handed to delivery
#[derive(Debug)]
pub struct CompletedSession {
    pub session: Session,
    pub strip: StripImage,
}
