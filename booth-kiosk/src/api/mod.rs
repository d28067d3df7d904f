//! HTTP control surface
//!
//! REST endpoints for the kiosk front-of-house UI plus the SSE event stream
//! and the hosted strips directory.

pub mod handlers;
pub mod sse;

mod server;

pub use server::{create_router, AppState};
