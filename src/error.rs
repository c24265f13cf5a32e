//! Error types shared by every stage of the encode pipeline.

use std::path::PathBuf;

use crate::crypto::CryptoError;

/// Errors produced while building, encrypting, rendering or saving a payload.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A required field is empty, or a confirmation did not match.
    #[error("validation failed: {0}")]
    Validation(String),

    /// A referenced input file does not exist.
    #[error("file not found: {}", .0.display())]
    NotFound(PathBuf),

    /// The payload does not fit in the largest symbol at the chosen
    /// error-correction level.
    #[error("payload of {len} bytes does not fit in a QR code: {reason}")]
    EncodingCapacity { len: usize, reason: String },

    /// Encryption or decryption failed.
    #[error(transparent)]
    Crypto(#[from] CryptoError),

    /// Filesystem read or write failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Decoding or encoding an image failed.
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    /// The JSON envelope could not be produced or parsed.
    #[error("envelope error: {0}")]
    Json(#[from] serde_json::Error),

    /// The settings file could not be parsed.
    #[error("config error: {0}")]
    Config(String),
}

impl Error {
    /// Shorthand for a [`Error::Validation`] about a missing required field.
    pub(crate) fn required(field: &str) -> Self {
        Error::Validation(format!("{field} is required"))
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
