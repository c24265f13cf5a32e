//! Render an encoded payload to disk and describe the result.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::helper::{save_qr, to_hex_color, QrStyle};
use crate::payload::EncodedPayload;

/// Number of payload characters shown in the preview.
pub const PREVIEW_CHARS: usize = 100;

/// What was written, as reported to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Summary {
    pub path: PathBuf,
    pub file_size_kb: u64,
    pub data_len: usize,
    pub fill: String,
    pub back: String,
    pub preview: String,
}

/// Renders `payload` into `path` and returns a [`Summary`].
pub fn generate(payload: &EncodedPayload, path: &Path, style: &QrStyle) -> Result<Summary> {
    let written = save_qr(payload.as_str(), path, style)?;
    let file_size_kb = fs::metadata(&written)?.len() / 1024;
    Ok(Summary {
        path: written,
        file_size_kb,
        data_len: payload.len(),
        fill: to_hex_color(style.fill),
        back: to_hex_color(style.back),
        preview: preview(payload.as_str(), PREVIEW_CHARS),
    })
}

/// The first `max_chars` characters of `text`, followed by `...` if cut.
pub fn preview(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "QR code created")?;
        writeln!(f, "  file:   {}", self.path.display())?;
        writeln!(f, "  size:   {} KB", self.file_size_kb)?;
        if self.data_len > 1024 {
            writeln!(f, "  data:   {} KB", self.data_len / 1024)?;
        } else {
            writeln!(f, "  data:   {} bytes", self.data_len)?;
        }
        writeln!(f, "  colors: code {}, background {}", self.fill, self.back)?;
        write!(f, "  preview: {}", self.preview)
    }
}
