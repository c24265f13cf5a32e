//! Settings file (TOML).
//!
//! ```toml
//! [render]
//! scheme = "blue"
//! module_size = "large"
//! border = 4
//!
//! [image]
//! max_size_kb = 500
//! encrypted_max_size_kb = 300
//!
//! [output]
//! directory = "generated"
//! ```
//!
//! Every section and key is optional. Explicit `fill`/`back` colors override
//! the scheme.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::helper::{check_border, parse_hex_color, ColorScheme, ModuleSize, QrStyle, DEFAULT_BORDER};
use crate::image_io::{ENCRYPTED_IMAGE_MAX_KB, IMAGE_MAX_KB};

/// Complete settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub render: RenderSettings,
    #[serde(default)]
    pub image: ImageSettings,
    #[serde(default)]
    pub output: OutputSettings,
}

/// How symbols are drawn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderSettings {
    /// classic | inverted | blue | green | red | purple
    #[serde(default = "default_scheme")]
    pub scheme: String,
    /// Overrides the scheme's foreground.
    #[serde(default)]
    pub fill: Option<String>,
    /// Overrides the scheme's background.
    #[serde(default)]
    pub back: Option<String>,
    /// small | medium | large | pixels
    #[serde(default = "default_module_size")]
    pub module_size: String,
    #[serde(default = "default_border")]
    pub border: u32,
}

/// JPEG size budgets for embedded images.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageSettings {
    #[serde(default = "default_image_max_kb")]
    pub max_size_kb: usize,
    #[serde(default = "default_encrypted_max_kb")]
    pub encrypted_max_size_kb: usize,
}

/// Where files go when no explicit output path is given.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputSettings {
    #[serde(default = "default_directory")]
    pub directory: PathBuf,
}

fn default_scheme() -> String {
    "classic".to_string()
}

fn default_module_size() -> String {
    "medium".to_string()
}

fn default_border() -> u32 {
    DEFAULT_BORDER
}

fn default_image_max_kb() -> usize {
    IMAGE_MAX_KB
}

fn default_encrypted_max_kb() -> usize {
    ENCRYPTED_IMAGE_MAX_KB
}

fn default_directory() -> PathBuf {
    PathBuf::from("generated")
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            scheme: default_scheme(),
            fill: None,
            back: None,
            module_size: default_module_size(),
            border: default_border(),
        }
    }
}

impl Default for ImageSettings {
    fn default() -> Self {
        Self {
            max_size_kb: default_image_max_kb(),
            encrypted_max_size_kb: default_encrypted_max_kb(),
        }
    }
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            directory: default_directory(),
        }
    }
}

impl Settings {
    /// Loads settings from `path`, or returns the defaults when `path` is `None`.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Settings::default());
        };
        if !path.exists() {
            return Err(Error::NotFound(path.to_path_buf()));
        }
        let raw = fs::read_to_string(path)?;
        let settings = Self::from_toml(&raw)?;
        debug!(path = %path.display(), "settings loaded");
        Ok(settings)
    }

    pub fn from_toml(raw: &str) -> Result<Self> {
        toml::from_str(raw).map_err(|e| Error::Config(e.to_string()))
    }
}

impl RenderSettings {
    /// Resolves the settings into a drawable style.
    pub fn style(&self) -> Result<QrStyle> {
        let scheme: ColorScheme = self.scheme.parse()?;
        let size: ModuleSize = self.module_size.parse()?;
        let mut style = QrStyle::from_scheme(scheme, size);
        if let Some(fill) = &self.fill {
            style.fill = parse_hex_color(fill)?;
        }
        if let Some(back) = &self.back {
            style.back = parse_hex_color(back)?;
        }
        style.border = check_border(self.border)?;
        Ok(style)
    }
}
