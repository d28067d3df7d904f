//! Unattended photo-booth kiosk service
//!
//! Runs the full booth pipeline: timed multi-shot capture, mask-guided
//! compositing over selectable backdrops, strip assembly, and per-channel
//! delivery, all controlled over a local HTTP API with SSE event streaming.

pub mod api;
pub mod camera;
pub mod catalog;
pub mod compositor;
pub mod delivery;
pub mod engine;
pub mod frame;
pub mod segmentation;
pub mod session;
pub mod state;
pub mod strip;

pub use api::{create_router, AppState};
pub use engine::{BoothEngine, StartSessionRequest};
