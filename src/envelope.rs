//! JSON envelope wrapping image and file payloads.
//!
//! ```json
//! {"type":"encrypted_image","algorithm":"AES-256-CBC","data":"<base64>","timestamp":"2024-05-01T12:00:00.000000"}
//! ```

use chrono::Local;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::crypto::{self, ALGORITHM};
use crate::error::{Error, Result};

/// Value of the envelope's `format` field for embedded images.
pub const IMAGE_FORMAT: &str = "jpeg";

/// The `type` tag of an envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnvelopeType {
    Image,
    EncryptedImage,
    TextFile,
}

/// Metadata wrapper embedded in the QR payload for image and file kinds.
///
/// Field order matches the serialized key order; absent optional keys are
/// omitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(rename = "type")]
    pub kind: EnvelopeType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub algorithm: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    pub data: String,
    pub timestamp: String,
}

impl Envelope {
    /// Envelope for a plain `data:image/jpeg;base64,...` URI.
    pub fn image(data_uri: String) -> Self {
        Self {
            kind: EnvelopeType::Image,
            algorithm: None,
            format: Some(IMAGE_FORMAT.to_string()),
            filename: None,
            data: data_uri,
            timestamp: now_timestamp(),
        }
    }

    /// Envelope for the output of [`crypto::encrypt`].
    pub fn encrypted_image(ciphertext: String) -> Self {
        Self {
            kind: EnvelopeType::EncryptedImage,
            algorithm: Some(ALGORITHM.to_string()),
            format: None,
            filename: None,
            data: ciphertext,
            timestamp: now_timestamp(),
        }
    }

    /// Envelope for the text of a file.
    pub fn text_file(filename: String, content: String) -> Self {
        Self {
            kind: EnvelopeType::TextFile,
            algorithm: None,
            format: None,
            filename: Some(filename),
            data: content,
            timestamp: now_timestamp(),
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Local time as `YYYY-MM-DDTHH:MM:SS.ffffff`.
pub fn now_timestamp() -> String {
    Local::now().naive_local().format("%Y-%m-%dT%H:%M:%S%.6f").to_string()
}

/// Parses an `encrypted_image` envelope and returns the decrypted data URI.
///
/// # Errors
///
/// [`Error::Validation`] when the envelope is of another type or names an
/// unknown algorithm, [`Error::Crypto`] when decryption fails.
pub fn open_encrypted(json: &str, password: &str) -> Result<String> {
    let envelope = Envelope::from_json(json.trim())?;
    if envelope.kind != EnvelopeType::EncryptedImage {
        return Err(Error::Validation(format!(
            "envelope type {:?} is not encrypted",
            envelope.kind
        )));
    }
    match envelope.algorithm.as_deref() {
        Some(ALGORITHM) => {}
        other => {
            return Err(Error::Validation(format!(
                "unsupported algorithm {}",
                other.unwrap_or("<missing>")
            )))
        }
    }
    debug!(timestamp = %envelope.timestamp, "opening encrypted envelope");
    Ok(crypto::decrypt(&envelope.data, password)?)
}
