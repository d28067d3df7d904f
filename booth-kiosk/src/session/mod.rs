//! Capture session sequencing
//!
//! The controller owns the session from start through strip assembly,
//! advancing an explicit state machine on a single timer-driven timeline.

mod controller;
mod types;

pub use controller::SessionController;
pub use types::{
    CaptureCadence, CompletedSession, RecipientSet, Session, SessionConfig, COUNTDOWN_SECONDS,
    SHOTS_PER_SESSION,
};
