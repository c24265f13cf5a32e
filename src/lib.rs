//! # qrseal
//!
//! Turn structured data into QR codes, with optional encryption of embedded images.
//!
//! `qrseal` builds the canonical text for common QR payloads (URLs, WiFi credentials,
//! vCards, calendar events, `geo:`/`tel:`/`sms:`/`mailto:` URIs), wraps images and text
//! files in a small JSON envelope, and can seal an image with AES-256-CBC under a
//! password before it is embedded. Symbols are always drawn at error correction level
//! High with the smallest version that fits.
//!
//! ## Features
//!
//! - Twelve payload kinds behind a single closed [`payload::Payload`] enum.
//! - Password encryption: SHA-256 key, random IV, PKCS#7, base64 transport.
//! - Image recompression to a size budget (JPEG quality 85 down to 10).
//! - PNG/JPEG output through `image`, SVG output, console preview.
//! - Color presets, custom hex colors and module sizes.
//!
//! The key derivation is a single unsalted hash and the ciphertext is not
//! authenticated; these match the existing payload format and are not suitable for
//! protecting anything valuable.
//!
//! ## Example
//!
//! Encode a WiFi network:
//!
//! ```rust
//! use qrseal::payload::{Payload, WifiEncryption};
//!
//! let payload = Payload::Wifi {
//!     ssid: "Home".into(),
//!     password: Some("secret1".into()),
//!     encryption: WifiEncryption::Wpa,
//!     hidden: false,
//! }
//! .encode()
//! .unwrap();
//! assert_eq!(payload.as_str(), "WIFI:S:Home;T:WPA;P:secret1;;");
//! ```
//!
//! Encrypt an image and write the symbol:
//!
//! ```no_run
//! use std::path::Path;
//! use qrseal::{generate, helper::QrStyle, image_io, payload::Payload};
//!
//! let jpeg = image_io::load_and_recompress_image(Path::new("photo.png"), 300).unwrap();
//! let payload = Payload::EncryptedImage { jpeg: jpeg.bytes, password: "hunter2".into() }
//!     .encode()
//!     .unwrap();
//! let summary = generate::generate(&payload, Path::new("generated/photo_qr.png"), &QrStyle::default()).unwrap();
//! println!("{summary}");
//! ```
//!
//! ## Modules
//!
//! - [`payload`]: Payload kinds and their canonical encodings.
//! - [`crypto`]: Key derivation, AES-256-CBC, compression.
//! - [`envelope`]: JSON envelope for image and file payloads.
//! - [`image_io`]: Image loading and JPEG recompression.
//! - [`helper`]: Rendering QR codes to images, SVG and the console.
//! - [`generate`]: Render-and-save with a printable summary.
//! - [`config`]: TOML settings.

pub mod config;
pub mod crypto;
pub mod envelope;
pub mod error;
pub mod generate;
pub mod helper;
pub mod image_io;
pub mod payload;

pub use crypto::CryptoError;
pub use error::{Error, Result};
pub use payload::{EncodedPayload, Payload, PayloadKind};
