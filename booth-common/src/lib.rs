//! # Booth Common Library
//!
//! Shared code for the photo-booth kiosk:
//! - Error types
//! - Event types (BoothEvent enum) and EventBus
//! - Configuration loading
//! - Matte threshold math (feathered alpha ramp)
//! - Style filter definitions and per-pixel transforms

pub mod config;
pub mod error;
pub mod events;
pub mod matte;
pub mod style;

pub use error::{Error, Result};
pub use matte::MatteThresholds;
pub use style::StyleFilter;
