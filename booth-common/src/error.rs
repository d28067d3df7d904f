//! Common error types for the booth kiosk

use thiserror::Error;

/// Common result type for booth operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across booth crates
#[derive(Error, Debug)]
pub enum Error {
    /// Camera device unavailable or capture failed
    #[error("Camera error: {0}")]
    Camera(String),

    /// Segmentation inference failed or returned an unusable mask
    #[error("Segmentation error: {0}")]
    Segmentation(String),

    /// Delivery transport failure (per-channel, user-visible)
    #[error("Delivery error: {0}")]
    Delivery(String),

    /// Image encode/decode failure
    #[error("Image error: {0}")]
    Image(String),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Requested resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Operation rejected because another is in progress
    #[error("Busy: {0}")]
    Busy(String),

    /// Invalid user input or request parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}
