use std::fs;

use image::{DynamicImage, Rgba, RgbaImage};
use qrseal::envelope::{self, Envelope, EnvelopeType};
use qrseal::generate::generate;
use qrseal::helper::{ColorScheme, ModuleSize, QrStyle};
use qrseal::payload::{Payload, WifiEncryption, TEXT_FILE_MAX_CHARS};
use qrseal::{image_io, Error};
use tempfile::tempdir;

fn wifi() -> Payload {
    Payload::Wifi {
        ssid: "Home".into(),
        password: Some("secret1".into()),
        encryption: WifiEncryption::Wpa,
        hidden: false,
    }
}

#[test]
fn writes_png_and_reports_summary() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("nested/wifi");
    let encoded = wifi().encode().unwrap();
    let style = QrStyle::from_scheme(ColorScheme::Blue, ModuleSize::Small);

    let summary = generate(&encoded, &path, &style).unwrap();

    assert_eq!(summary.path, dir.path().join("nested/wifi.png"));
    assert!(summary.path.is_file());
    assert_eq!(summary.data_len, encoded.len());
    assert_eq!(summary.fill, "#1E40AF");
    assert_eq!(summary.back, "#EFF6FF");
    assert_eq!(summary.preview, "WIFI:S:Home;T:WPA;P:secret1;;");

    let img = image::open(&summary.path).unwrap();
    assert_eq!(img.width(), img.height());
    assert_eq!(img.width() % 8, 0);
}

#[test]
fn writes_svg_by_extension() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("phone.svg");
    let encoded = Payload::Phone("+15551111".into()).encode().unwrap();

    generate(&encoded, &path, &QrStyle::default()).unwrap();

    let svg = fs::read_to_string(&path).unwrap();
    assert!(svg.contains("<svg"));
}

#[test]
fn text_file_is_truncated_and_too_large_to_render() {
    let dir = tempdir().unwrap();
    let source = dir.path().join("notes.txt");
    fs::write(&source, "z".repeat(TEXT_FILE_MAX_CHARS * 2)).unwrap();

    let payload = Payload::text_file(&source).unwrap();
    let encoded = payload.encode().unwrap();
    let env = Envelope::from_json(encoded.as_str()).unwrap();
    assert_eq!(env.kind, EnvelopeType::TextFile);
    assert_eq!(env.filename.as_deref(), Some("notes.txt"));
    assert_eq!(env.data.len(), TEXT_FILE_MAX_CHARS);

    let err = generate(&encoded, &dir.path().join("file_qr.png"), &QrStyle::default()).unwrap_err();
    assert!(matches!(err, Error::EncodingCapacity { .. }));
}

#[test]
fn missing_text_file_is_not_found() {
    let dir = tempdir().unwrap();
    let err = Payload::text_file(&dir.path().join("absent.txt")).unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
}

#[test]
fn encrypted_image_round_trip() {
    let dir = tempdir().unwrap();
    let source = dir.path().join("logo.png");
    let mut rgba = RgbaImage::from_pixel(6, 6, Rgba([20, 120, 220, 255]));
    rgba.put_pixel(0, 0, Rgba([0, 0, 0, 0]));
    DynamicImage::ImageRgba8(rgba).save(&source).unwrap();

    let jpeg = image_io::load_and_recompress_image(&source, 300).unwrap();
    assert_eq!(jpeg.quality, 85);

    let encoded = Payload::EncryptedImage {
        jpeg: jpeg.bytes.clone(),
        password: "correct horse".into(),
    }
    .encode()
    .unwrap();

    let data_uri = envelope::open_encrypted(encoded.as_str(), "correct horse").unwrap();
    assert_eq!(image_io::from_data_uri(&data_uri).unwrap(), jpeg.bytes);

    let wrong = envelope::open_encrypted(encoded.as_str(), "wrong horse");
    if let Ok(text) = wrong {
        assert_ne!(text, data_uri);
    }
}

#[test]
fn empty_ssid_produces_nothing() {
    let dir = tempdir().unwrap();
    let payload = Payload::Wifi {
        ssid: String::new(),
        password: None,
        encryption: WifiEncryption::NoPass,
        hidden: false,
    };
    assert!(matches!(payload.encode(), Err(Error::Validation(_))));
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
}
