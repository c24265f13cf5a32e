use crate::error::{Error, Result};

use image::{ImageBuffer, Rgb, RgbImage};
use qrcode::{Color, EcLevel, QrCode};
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, info};

/*---- Styling ----*/

/// Quiet-zone width used by default, in modules.
pub const DEFAULT_BORDER: u32 = 4;

/// Largest accepted module size, in pixels.
pub const MAX_MODULE_SIZE: u32 = 40;

/// Largest accepted quiet-zone width, in modules.
pub const MAX_BORDER: u32 = 100;

/// Foreground/background presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorScheme {
    #[default]
    Classic,
    Inverted,
    Blue,
    Green,
    Red,
    Purple,
}

impl ColorScheme {
    /// Returns `(fill, back)` as hex strings.
    pub fn colors(self) -> (&'static str, &'static str) {
        match self {
            ColorScheme::Classic => ("#000000", "#FFFFFF"),
            ColorScheme::Inverted => ("#FFFFFF", "#000000"),
            ColorScheme::Blue => ("#1E40AF", "#EFF6FF"),
            ColorScheme::Green => ("#065F46", "#ECFDF5"),
            ColorScheme::Red => ("#991B1B", "#FEF2F2"),
            ColorScheme::Purple => ("#5B21B6", "#FAF5FF"),
        }
    }
}

impl FromStr for ColorScheme {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "classic" => Ok(ColorScheme::Classic),
            "inverted" => Ok(ColorScheme::Inverted),
            "blue" => Ok(ColorScheme::Blue),
            "green" => Ok(ColorScheme::Green),
            "red" => Ok(ColorScheme::Red),
            "purple" => Ok(ColorScheme::Purple),
            other => Err(Error::Validation(format!("unknown color scheme {other:?}"))),
        }
    }
}

/// Pixel size of one module: a preset or a custom value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ModuleSize {
    Small,
    #[default]
    Medium,
    Large,
    Custom(u32),
}

impl ModuleSize {
    pub fn pixels(self) -> u32 {
        match self {
            ModuleSize::Small => 8,
            ModuleSize::Medium => 12,
            ModuleSize::Large => 16,
            ModuleSize::Custom(px) => px,
        }
    }
}

impl FromStr for ModuleSize {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "small" => Ok(ModuleSize::Small),
            "medium" => Ok(ModuleSize::Medium),
            "large" => Ok(ModuleSize::Large),
            other => {
                let px: u32 = other
                    .parse()
                    .map_err(|_| Error::Validation(format!("invalid module size {other:?}")))?;
                if px == 0 || px > MAX_MODULE_SIZE {
                    return Err(Error::Validation(format!(
                        "module size must be between 1 and {MAX_MODULE_SIZE}, got {px}"
                    )));
                }
                Ok(ModuleSize::Custom(px))
            }
        }
    }
}

/// Parses `#RRGGBB`, `RRGGBB`, `#RGB` or `RGB`.
pub fn parse_hex_color(hex: &str) -> Result<Rgb<u8>> {
    let digits = hex.trim().trim_start_matches('#');
    let invalid = || Error::Validation(format!("invalid hex color {hex:?}"));
    if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(invalid());
    }
    let channel = |s: &str| u8::from_str_radix(s, 16).map_err(|_| invalid());
    match digits.len() {
        6 => Ok(Rgb([channel(&digits[0..2])?, channel(&digits[2..4])?, channel(&digits[4..6])?])),
        3 => {
            let short = |i: usize| channel(&digits[i..i + 1]).map(|v| v * 17);
            Ok(Rgb([short(0)?, short(1)?, short(2)?]))
        }
        _ => Err(invalid()),
    }
}

/// Formats a color as `#RRGGBB`.
pub fn to_hex_color(color: Rgb<u8>) -> String {
    let [r, g, b] = color.0;
    format!("#{r:02X}{g:02X}{b:02X}")
}

/// Colors and geometry used to draw a symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QrStyle {
    pub fill: Rgb<u8>,
    pub back: Rgb<u8>,
    pub module_size: u32,
    pub border: u32,
}

impl QrStyle {
    pub fn from_scheme(scheme: ColorScheme, size: ModuleSize) -> Self {
        let (fill, back) = scheme.colors();
        Self {
            // presets are valid hex
            fill: parse_hex_color(fill).unwrap_or(Rgb([0, 0, 0])),
            back: parse_hex_color(back).unwrap_or(Rgb([255, 255, 255])),
            module_size: size.pixels(),
            border: DEFAULT_BORDER,
        }
    }
}

/// Rejects a quiet zone wider than [`MAX_BORDER`].
pub fn check_border(border: u32) -> Result<u32> {
    if border > MAX_BORDER {
        return Err(Error::Validation(format!(
            "border must be at most {MAX_BORDER} modules, got {border}"
        )));
    }
    Ok(border)
}

impl Default for QrStyle {
    fn default() -> Self {
        QrStyle::from_scheme(ColorScheme::default(), ModuleSize::default())
    }
}

/*---- Rendering ----*/

/// Encodes `text` at error-correction level High, picking the smallest
/// version that holds it.
///
/// # Errors
///
/// Returns [`Error::EncodingCapacity`] if `text` is too long for version 40.
pub fn encode_qr(text: &str) -> Result<QrCode> {
    QrCode::with_error_correction_level(text.as_bytes(), EcLevel::H).map_err(|e| {
        Error::EncodingCapacity {
            len: text.len(),
            reason: e.to_string(),
        }
    })
}

/// Renders `text` as an RGB image.
///
/// # Arguments
///
/// * `text` - The content to encode into the QR Code.
/// * `style` - Colors, module size and quiet-zone width.
///
/// # Example
///
/// ```
/// use qrseal::helper::{render_qr, QrStyle};
///
/// let img = render_qr("Hello, World!", &QrStyle::default()).unwrap();
/// assert_eq!(img.width(), img.height());
/// ```
pub fn render_qr(text: &str, style: &QrStyle) -> Result<RgbImage> {
    let qr = encode_qr(text)?;
    let width = qr.width() as u32;
    let colors = qr.to_colors();
    let scale = style.module_size.max(1);
    let size = canvas_size(width, style)?;
    debug!(version_width = width, pixels = size, "rendering symbol");

    let mut img = ImageBuffer::new(size, size);
    for (x, y, pixel) in img.enumerate_pixels_mut() {
        let qr_x = (x / scale) as i64 - style.border as i64;
        let qr_y = (y / scale) as i64 - style.border as i64;
        let dark = qr_x >= 0
            && qr_y >= 0
            && (qr_x as u32) < width
            && (qr_y as u32) < width
            && colors[qr_y as usize * width as usize + qr_x as usize] == Color::Dark;
        *pixel = if dark { style.fill } else { style.back };
    }

    Ok(img)
}

// Side length in pixels of the rendered image, quiet zone included.
fn canvas_size(width: u32, style: &QrStyle) -> Result<u32> {
    let border = check_border(style.border)?;
    if style.module_size > MAX_MODULE_SIZE {
        return Err(Error::Validation(format!(
            "module size must be between 1 and {MAX_MODULE_SIZE}, got {}",
            style.module_size
        )));
    }
    border
        .checked_mul(2)
        .and_then(|b| b.checked_add(width))
        .and_then(|modules| modules.checked_mul(style.module_size.max(1)))
        .ok_or_else(|| Error::Validation("rendered image would be too large".to_string()))
}

// Returns a string of SVG code for an image depicting
// the given text, drawn with the style's colors and border.
// The string always uses Unix newlines (\n), regardless of the platform.
pub fn to_svg_string(text: &str, style: &QrStyle) -> Result<String> {
    let qr = encode_qr(text)?;
    let width = qr.width();
    let colors = qr.to_colors();
    let border = check_border(style.border)? as usize;
    let dimension = width + border * 2;

    let mut result = String::new();
    result += "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n";
    result += "<!DOCTYPE svg PUBLIC \"-//W3C//DTD SVG 1.1//EN\" \"http://www.w3.org/Graphics/SVG/1.1/DTD/svg11.dtd\">\n";
    result += &format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" version=\"1.1\" viewBox=\"0 0 {0} {0}\" stroke=\"none\">\n",
        dimension
    );
    result += &format!("\t<rect width=\"100%\" height=\"100%\" fill=\"{}\"/>\n", to_hex_color(style.back));
    result += "\t<path d=\"";
    let mut first = true;
    for y in 0..width {
        for x in 0..width {
            if colors[y * width + x] == Color::Dark {
                if !first {
                    result += " ";
                }
                first = false;
                result += &format!("M{},{}h1v1h-1z", x + border, y + border);
            }
        }
    }
    result += &format!("\" fill=\"{}\"/>\n", to_hex_color(style.fill));
    result += "</svg>\n";
    Ok(result)
}

/// Prints the symbol for `text` to the console.
pub fn print_qr(text: &str) -> Result<()> {
    let qr = encode_qr(text)?;
    let width = qr.width() as i64;
    let colors = qr.to_colors();
    let border: i64 = DEFAULT_BORDER as i64;
    for y in -border..width + border {
        for x in -border..width + border {
            let dark = (0..width).contains(&x)
                && (0..width).contains(&y)
                && colors[(y * width + x) as usize] == Color::Dark;
            let c: char = if dark { '█' } else { ' ' };
            print!("{0}{0}", c);
        }
        println!();
    }
    println!();
    Ok(())
}

/*---- Saving ----*/

/// Ensures `path` has an extension, appending `.png` when it has none.
pub fn with_default_extension(path: &Path) -> PathBuf {
    if path.extension().is_some() {
        path.to_path_buf()
    } else {
        path.with_extension("png")
    }
}

fn is_svg(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.eq_ignore_ascii_case("svg"))
        .unwrap_or(false)
}

/// Renders `text` and writes it to `path`, choosing the format from the
/// extension (`.svg` writes vector output, anything else goes through
/// `image`). Missing parent directories are created.
///
/// Returns the path actually written.
///
/// # Example
///
/// ```no_run
/// use qrseal::helper::{save_qr, QrStyle};
///
/// save_qr("Hello, World!", std::path::Path::new("generated/hello.png"), &QrStyle::default()).unwrap();
/// ```
pub fn save_qr(text: &str, path: &Path, style: &QrStyle) -> Result<PathBuf> {
    let path = with_default_extension(path);

    // Check if the directory exists, create it if it doesn't
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        if !dir.exists() {
            fs::create_dir_all(dir)?;
        }
    }

    if is_svg(&path) {
        fs::write(&path, to_svg_string(text, style)?)?;
    } else {
        render_qr(text, style)?.save(&path)?;
    }
    info!(path = %path.display(), "QR code written");
    Ok(path)
}
