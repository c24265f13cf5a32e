//! Canonical text encodings for every supported payload kind.
//!
//! Each [`Payload`] variant carries the fields of one kind and
//! [`Payload::encode`] produces the exact string that ends up in the symbol.
//!
//! # Example
//!
//! ```rust
//! use qrseal::payload::{Payload, WifiEncryption};
//!
//! let wifi = Payload::Wifi {
//!     ssid: "Home".into(),
//!     password: Some("secret1".into()),
//!     encryption: WifiEncryption::Wpa,
//!     hidden: false,
//! };
//! assert_eq!(wifi.encode().unwrap().as_str(), "WIFI:S:Home;T:WPA;P:secret1;;");
//! ```

use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use tracing::{debug, warn};

use crate::crypto;
use crate::envelope::Envelope;
use crate::error::{Error, Result};
use crate::image_io;

/// Maximum number of characters kept from a text file.
pub const TEXT_FILE_MAX_CHARS: usize = 10_000;

/// The kinds of data that can be encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PayloadKind {
    Url,
    Text,
    Wifi,
    Email,
    Sms,
    VCard,
    Geo,
    Phone,
    Event,
    Image,
    EncryptedImage,
    TextFile,
}

impl PayloadKind {
    pub const ALL: [PayloadKind; 12] = [
        PayloadKind::Url,
        PayloadKind::Text,
        PayloadKind::Wifi,
        PayloadKind::Email,
        PayloadKind::Sms,
        PayloadKind::VCard,
        PayloadKind::Geo,
        PayloadKind::Phone,
        PayloadKind::Event,
        PayloadKind::Image,
        PayloadKind::EncryptedImage,
        PayloadKind::TextFile,
    ];

    /// File name used when no output path is given.
    pub fn default_filename(self) -> &'static str {
        match self {
            PayloadKind::Url => "url_qr.png",
            PayloadKind::Text => "text_qr.png",
            PayloadKind::Wifi => "wifi_qr.png",
            PayloadKind::Email => "email_qr.png",
            PayloadKind::Sms => "sms_qr.png",
            PayloadKind::VCard => "contact_qr.png",
            PayloadKind::Geo => "geo_qr.png",
            PayloadKind::Phone => "phone_qr.png",
            PayloadKind::Event => "event_qr.png",
            PayloadKind::Image => "image_qr.png",
            PayloadKind::EncryptedImage => "encrypted_image_qr.png",
            PayloadKind::TextFile => "file_qr.png",
        }
    }
}

impl fmt::Display for PayloadKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PayloadKind::Url => "URL",
            PayloadKind::Text => "text",
            PayloadKind::Wifi => "WiFi",
            PayloadKind::Email => "email",
            PayloadKind::Sms => "SMS",
            PayloadKind::VCard => "vCard",
            PayloadKind::Geo => "geolocation",
            PayloadKind::Phone => "phone",
            PayloadKind::Event => "event",
            PayloadKind::Image => "image",
            PayloadKind::EncryptedImage => "encrypted image",
            PayloadKind::TextFile => "text file",
        };
        f.write_str(name)
    }
}

/// WiFi authentication mode, written into the `T:` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WifiEncryption {
    #[default]
    Wpa,
    Wep,
    NoPass,
}

impl WifiEncryption {
    pub fn as_str(self) -> &'static str {
        match self {
            WifiEncryption::Wpa => "WPA",
            WifiEncryption::Wep => "WEP",
            WifiEncryption::NoPass => "nopass",
        }
    }
}

impl FromStr for WifiEncryption {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "wpa" | "wpa2" => Ok(WifiEncryption::Wpa),
            "wep" => Ok(WifiEncryption::Wep),
            "nopass" | "none" | "open" => Ok(WifiEncryption::NoPass),
            other => Err(Error::Validation(format!("unknown WiFi encryption {other:?}"))),
        }
    }
}

/// A contact card.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Contact {
    pub first_name: String,
    pub last_name: Option<String>,
    pub organization: Option<String>,
    pub title: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub website: Option<String>,
}

/// A calendar event.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Event {
    pub title: String,
    pub location: Option<String>,
    pub description: Option<String>,
    /// Start date, typically `YYYYMMDD`.
    pub start: Option<String>,
    /// End date, typically `YYYYMMDD`.
    pub end: Option<String>,
}

/// User data for one payload kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    Url(String),
    Text(String),
    Wifi {
        ssid: String,
        password: Option<String>,
        encryption: WifiEncryption,
        hidden: bool,
    },
    Email {
        to: String,
        subject: Option<String>,
        body: Option<String>,
    },
    Sms {
        number: String,
        message: Option<String>,
    },
    VCard(Contact),
    Geo {
        latitude: String,
        longitude: String,
        altitude: Option<String>,
    },
    Phone(String),
    Event(Event),
    /// JPEG bytes, already recompressed.
    Image(Vec<u8>),
    EncryptedImage {
        jpeg: Vec<u8>,
        password: String,
    },
    TextFile {
        filename: String,
        content: String,
    },
}

/// The string embedded in the symbol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedPayload(String);

impl EncodedPayload {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for EncodedPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for EncodedPayload {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Payload {
    pub fn kind(&self) -> PayloadKind {
        match self {
            Payload::Url(_) => PayloadKind::Url,
            Payload::Text(_) => PayloadKind::Text,
            Payload::Wifi { .. } => PayloadKind::Wifi,
            Payload::Email { .. } => PayloadKind::Email,
            Payload::Sms { .. } => PayloadKind::Sms,
            Payload::VCard(_) => PayloadKind::VCard,
            Payload::Geo { .. } => PayloadKind::Geo,
            Payload::Phone(_) => PayloadKind::Phone,
            Payload::Event(_) => PayloadKind::Event,
            Payload::Image(_) => PayloadKind::Image,
            Payload::EncryptedImage { .. } => PayloadKind::EncryptedImage,
            Payload::TextFile { .. } => PayloadKind::TextFile,
        }
    }

    /// Reads a UTF-8 text file into a [`Payload::TextFile`], keeping only the
    /// file's base name.
    pub fn text_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::NotFound(path.to_path_buf()));
        }
        let content = fs::read_to_string(path)?;
        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Payload::TextFile { filename, content })
    }

    /// Produces the canonical string for this payload.
    ///
    /// # Errors
    ///
    /// [`Error::Validation`] when a required field is empty. The image kinds
    /// can also fail while encrypting or serializing the envelope.
    pub fn encode(&self) -> Result<EncodedPayload> {
        let text = match self {
            Payload::Url(url) => required("URL", url)?.to_string(),
            Payload::Text(text) => required("text", text)?.to_string(),
            Payload::Phone(number) => format!("tel:{}", required("phone number", number)?),
            Payload::Wifi {
                ssid,
                password,
                encryption,
                hidden,
            } => encode_wifi(ssid, password.as_deref(), *encryption, *hidden)?,
            Payload::Email { to, subject, body } => {
                let mut uri = format!("mailto:{}", required("recipient", to)?);
                let params: Vec<String> = [("subject", subject), ("body", body)]
                    .into_iter()
                    .filter_map(|(name, value)| {
                        present(value).map(|v| format!("{name}={}", url_escape(v)))
                    })
                    .collect();
                if !params.is_empty() {
                    uri.push('?');
                    uri.push_str(&params.join("&"));
                }
                uri
            }
            Payload::Sms { number, message } => {
                let mut uri = format!("sms:{}", required("phone number", number)?);
                if let Some(message) = present(message) {
                    uri.push_str("?body=");
                    uri.push_str(&url_escape(message));
                }
                uri
            }
            Payload::Geo {
                latitude,
                longitude,
                altitude,
            } => {
                let mut uri = format!(
                    "geo:{},{}",
                    required("latitude", latitude)?,
                    required("longitude", longitude)?
                );
                if let Some(altitude) = present(altitude) {
                    uri.push(',');
                    uri.push_str(altitude);
                }
                uri
            }
            Payload::VCard(contact) => encode_vcard(contact)?,
            Payload::Event(event) => encode_event(event)?,
            Payload::Image(jpeg) => {
                if jpeg.is_empty() {
                    return Err(Error::required("image data"));
                }
                Envelope::image(image_io::to_data_uri(jpeg)).to_json()?
            }
            Payload::EncryptedImage { jpeg, password } => {
                if jpeg.is_empty() {
                    return Err(Error::required("image data"));
                }
                if password.is_empty() {
                    return Err(Error::required("password"));
                }
                let sealed = crypto::encrypt(&image_io::to_data_uri(jpeg), password)?;
                Envelope::encrypted_image(sealed).to_json()?
            }
            Payload::TextFile { filename, content } => {
                let filename = required("file name", filename)?;
                let data = truncate_chars(content, TEXT_FILE_MAX_CHARS);
                if data.len() < content.len() {
                    warn!(
                        filename,
                        max_chars = TEXT_FILE_MAX_CHARS,
                        "text file too large, keeping only the first characters"
                    );
                }
                Envelope::text_file(filename.to_string(), data.to_string()).to_json()?
            }
        };
        debug!(kind = %self.kind(), len = text.len(), "payload encoded");
        Ok(EncodedPayload(text))
    }
}

/// Checks that two password entries match and are not empty.
pub fn confirm_password<'a>(password: &'a str, confirmation: &str) -> Result<&'a str> {
    if password.is_empty() {
        return Err(Error::required("password"));
    }
    if password != confirmation {
        return Err(Error::Validation("passwords do not match".to_string()));
    }
    Ok(password)
}

/// Escapes space and `&` only. Every other character passes through.
pub fn url_escape(text: &str) -> String {
    text.replace(' ', "%20").replace('&', "%26")
}

/// Trims surrounding whitespace and rejects what is left if empty.
fn required<'a>(field: &str, value: &'a str) -> Result<&'a str> {
    let value = value.trim();
    if value.is_empty() {
        Err(Error::required(field))
    } else {
        Ok(value)
    }
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

fn encode_wifi(
    ssid: &str,
    password: Option<&str>,
    encryption: WifiEncryption,
    hidden: bool,
) -> Result<String> {
    let mut config = format!("WIFI:S:{};T:{};", required("SSID", ssid)?, encryption.as_str());
    if let Some(password) = password.map(str::trim).filter(|p| !p.is_empty()) {
        config.push_str(&format!("P:{password};"));
    }
    if hidden {
        config.push_str("H:true;");
    }
    config.push(';');
    Ok(config)
}

fn encode_vcard(contact: &Contact) -> Result<String> {
    let first = required("first name", &contact.first_name)?;
    let last = present(&contact.last_name);

    let mut lines = vec![
        "BEGIN:VCARD".to_string(),
        "VERSION:3.0".to_string(),
        format!("N:{};{first};;;", last.unwrap_or_default()),
        match last {
            Some(last) => format!("FN:{first} {last}"),
            None => format!("FN:{first}"),
        },
    ];
    let optional = [
        ("ORG", &contact.organization),
        ("TITLE", &contact.title),
        ("TEL;TYPE=WORK,VOICE", &contact.phone),
        ("EMAIL;TYPE=WORK", &contact.email),
        ("URL", &contact.website),
    ];
    for (property, value) in optional {
        if let Some(value) = present(value) {
            lines.push(format!("{property}:{value}"));
        }
    }
    lines.push("END:VCARD".to_string());
    Ok(lines.join("\n"))
}

fn encode_event(event: &Event) -> Result<String> {
    let mut lines = vec![
        "BEGIN:VEVENT".to_string(),
        format!("SUMMARY:{}", required("event title", &event.title)?),
    ];
    let optional = [
        ("LOCATION", &event.location),
        ("DESCRIPTION", &event.description),
        ("DTSTART", &event.start),
        ("DTEND", &event.end),
    ];
    for (property, value) in optional {
        if let Some(value) = present(value) {
            lines.push(format!("{property}:{value}"));
        }
    }
    lines.push("END:VEVENT".to_string());
    Ok(lines.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envelope::EnvelopeType;

    fn some(s: &str) -> Option<String> {
        Some(s.to_string())
    }

    fn encode(p: Payload) -> String {
        p.encode().unwrap().into_string()
    }

    #[test]
    fn test_wifi() {
        let wifi = Payload::Wifi {
            ssid: "Home".into(),
            password: some("secret1"),
            encryption: WifiEncryption::Wpa,
            hidden: false,
        };
        assert_eq!(encode(wifi), "WIFI:S:Home;T:WPA;P:secret1;;");
    }

    #[test]
    fn test_wifi_open_hidden() {
        let wifi = Payload::Wifi {
            ssid: "Cafe".into(),
            password: None,
            encryption: WifiEncryption::NoPass,
            hidden: true,
        };
        assert_eq!(encode(wifi), "WIFI:S:Cafe;T:nopass;H:true;;");
    }

    #[test]
    fn test_fields_are_trimmed() {
        let wifi = Payload::Wifi {
            ssid: " Home ".into(),
            password: some(" secret1\t"),
            encryption: WifiEncryption::Wpa,
            hidden: false,
        };
        assert_eq!(encode(wifi), "WIFI:S:Home;T:WPA;P:secret1;;");

        let card = Payload::VCard(Contact {
            first_name: " Ann".into(),
            last_name: some("  "),
            title: some(" CTO "),
            ..Default::default()
        });
        assert_eq!(encode(card), "BEGIN:VCARD\nVERSION:3.0\nN:;Ann;;;\nFN:Ann\nTITLE:CTO\nEND:VCARD");

        let sms = Payload::Sms {
            number: "555 ".into(),
            message: some(" hi there "),
        };
        assert_eq!(encode(sms), "sms:555?body=hi%20there");
    }

    #[test]
    fn test_wifi_empty_ssid_is_rejected() {
        let wifi = Payload::Wifi {
            ssid: "".into(),
            password: some("x"),
            encryption: WifiEncryption::Wep,
            hidden: false,
        };
        assert!(matches!(wifi.encode(), Err(Error::Validation(_))));
    }

    #[test]
    fn test_wifi_encryption_from_str() {
        assert_eq!("WPA".parse::<WifiEncryption>().unwrap(), WifiEncryption::Wpa);
        assert_eq!("wep".parse::<WifiEncryption>().unwrap(), WifiEncryption::Wep);
        assert_eq!("none".parse::<WifiEncryption>().unwrap(), WifiEncryption::NoPass);
        assert!("wpa3-enterprise".parse::<WifiEncryption>().is_err());
    }

    #[test]
    fn test_vcard_minimal() {
        let card = Payload::VCard(Contact {
            first_name: "Ann".into(),
            last_name: some("Lee"),
            phone: some("555-1111"),
            ..Default::default()
        });
        let text = encode(card);
        let lines: Vec<&str> = text.split('\n').collect();
        assert_eq!(
            lines,
            vec![
                "BEGIN:VCARD",
                "VERSION:3.0",
                "N:Lee;Ann;;;",
                "FN:Ann Lee",
                "TEL;TYPE=WORK,VOICE:555-1111",
                "END:VCARD",
            ]
        );
    }

    #[test]
    fn test_vcard_full_order() {
        let card = Payload::VCard(Contact {
            first_name: "Ann".into(),
            last_name: some("Lee"),
            organization: some("Acme"),
            title: some("CTO"),
            phone: some("1"),
            email: some("ann@acme.test"),
            website: some("https://acme.test"),
        });
        assert_eq!(
            encode(card),
            "BEGIN:VCARD\nVERSION:3.0\nN:Lee;Ann;;;\nFN:Ann Lee\nORG:Acme\nTITLE:CTO\n\
             TEL;TYPE=WORK,VOICE:1\nEMAIL;TYPE=WORK:ann@acme.test\nURL:https://acme.test\nEND:VCARD"
        );
    }

    #[test]
    fn test_vcard_without_last_name() {
        let card = Payload::VCard(Contact {
            first_name: "Ann".into(),
            last_name: some(""),
            ..Default::default()
        });
        assert_eq!(encode(card), "BEGIN:VCARD\nVERSION:3.0\nN:;Ann;;;\nFN:Ann\nEND:VCARD");
    }

    #[test]
    fn test_event() {
        let event = Payload::Event(Event {
            title: "Launch".into(),
            location: some("Hall B"),
            start: some("20250101"),
            ..Default::default()
        });
        assert_eq!(
            encode(event),
            "BEGIN:VEVENT\nSUMMARY:Launch\nLOCATION:Hall B\nDTSTART:20250101\nEND:VEVENT"
        );
    }

    #[test]
    fn test_uris() {
        assert_eq!(encode(Payload::Phone("+1 555".into())), "tel:+1 555");
        assert_eq!(encode(Payload::Url("https://a.b".into())), "https://a.b");
        assert_eq!(
            encode(Payload::Geo {
                latitude: "55.7558".into(),
                longitude: "37.6173".into(),
                altitude: None,
            }),
            "geo:55.7558,37.6173"
        );
        assert_eq!(
            encode(Payload::Geo {
                latitude: "1".into(),
                longitude: "2".into(),
                altitude: some("300"),
            }),
            "geo:1,2,300"
        );
        assert_eq!(
            encode(Payload::Sms {
                number: "555".into(),
                message: some("see you & bye"),
            }),
            "sms:555?body=see%20you%20%26%20bye"
        );
        assert_eq!(
            encode(Payload::Sms {
                number: "555".into(),
                message: None,
            }),
            "sms:555"
        );
    }

    #[test]
    fn test_mailto_params() {
        let both = Payload::Email {
            to: "a@b.c".into(),
            subject: some("Hi there"),
            body: some("x&y"),
        };
        assert_eq!(encode(both), "mailto:a@b.c?subject=Hi%20there&body=x%26y");

        let body_only = Payload::Email {
            to: "a@b.c".into(),
            subject: None,
            body: some("z"),
        };
        assert_eq!(encode(body_only), "mailto:a@b.c?body=z");

        let bare = Payload::Email {
            to: "a@b.c".into(),
            subject: some(""),
            body: None,
        };
        assert_eq!(encode(bare), "mailto:a@b.c");
    }

    #[test]
    fn test_url_escape_is_minimal() {
        assert_eq!(url_escape("a b&c?d=e#f"), "a%20b%26c?d=e#f");
    }

    #[test]
    fn test_required_fields() {
        assert!(matches!(Payload::Url("  ".into()).encode(), Err(Error::Validation(_))));
        assert!(matches!(Payload::Phone(String::new()).encode(), Err(Error::Validation(_))));
        assert!(matches!(
            Payload::Event(Event::default()).encode(),
            Err(Error::Validation(_))
        ));
        assert!(matches!(Payload::Image(Vec::new()).encode(), Err(Error::Validation(_))));
        assert!(matches!(
            Payload::EncryptedImage {
                jpeg: vec![1, 2, 3],
                password: String::new(),
            }
            .encode(),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn test_image_envelope() {
        let json = encode(Payload::Image(vec![0xFF, 0xD8, 0xFF]));
        let env = Envelope::from_json(&json).unwrap();
        assert_eq!(env.kind, EnvelopeType::Image);
        assert_eq!(env.format.as_deref(), Some("jpeg"));
        assert_eq!(env.data, "data:image/jpeg;base64,/9j/");
        assert!(env.algorithm.is_none());
    }

    #[test]
    fn test_encrypted_image_envelope() {
        let json = encode(Payload::EncryptedImage {
            jpeg: vec![0xFF, 0xD8, 0xFF],
            password: "pw".into(),
        });
        let env = Envelope::from_json(&json).unwrap();
        assert_eq!(env.kind, EnvelopeType::EncryptedImage);
        assert_eq!(env.algorithm.as_deref(), Some("AES-256-CBC"));
        assert_eq!(crypto::decrypt(&env.data, "pw").unwrap(), "data:image/jpeg;base64,/9j/");
    }

    #[test]
    fn test_text_file_truncation() {
        let content: String = "ж".repeat(TEXT_FILE_MAX_CHARS + 5);
        let json = encode(Payload::TextFile {
            filename: "big.txt".into(),
            content,
        });
        let env = Envelope::from_json(&json).unwrap();
        assert_eq!(env.kind, EnvelopeType::TextFile);
        assert_eq!(env.filename.as_deref(), Some("big.txt"));
        assert_eq!(env.data.chars().count(), TEXT_FILE_MAX_CHARS);
        assert!(env.data.chars().all(|c| c == 'ж'));
    }

    #[test]
    fn test_text_file_short_is_untouched() {
        let json = encode(Payload::TextFile {
            filename: "a.txt".into(),
            content: "line1\nline2 \"quoted\"".into(),
        });
        let env = Envelope::from_json(&json).unwrap();
        assert_eq!(env.data, "line1\nline2 \"quoted\"");
    }

    #[test]
    fn test_confirm_password() {
        assert_eq!(confirm_password("abc", "abc").unwrap(), "abc");
        assert!(matches!(confirm_password("abc", "abd"), Err(Error::Validation(_))));
        assert!(matches!(confirm_password("", ""), Err(Error::Validation(_))));
    }

    #[test]
    fn test_default_filenames_are_distinct() {
        let mut names: Vec<&str> = PayloadKind::ALL.iter().map(|k| k.default_filename()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), PayloadKind::ALL.len());
        assert_eq!(PayloadKind::VCard.default_filename(), "contact_qr.png");
    }
}
