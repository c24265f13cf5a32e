//! qrseal - encode structured data into QR codes

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use qrseal::config::Settings;
use qrseal::payload::{confirm_password, Contact, Event, WifiEncryption};
use qrseal::{crypto, envelope, generate, helper, image_io, Payload};

#[derive(Parser)]
#[command(name = "qrseal")]
#[command(about = "Encode URLs, WiFi, contacts, events, images and files into QR codes", long_about = None)]
#[command(version)]
struct Cli {
    /// Settings file (TOML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Output file; the extension picks the format (png, jpg, svg, ...)
    #[arg(short, long, global = true)]
    output: Option<PathBuf>,

    /// Color scheme (classic, inverted, blue, green, red, purple)
    #[arg(long, global = true)]
    scheme: Option<String>,

    /// Foreground color as hex, overrides the scheme
    #[arg(long, global = true)]
    fill: Option<String>,

    /// Background color as hex, overrides the scheme
    #[arg(long, global = true)]
    back: Option<String>,

    /// Module size (small, medium, large or pixels)
    #[arg(long, global = true)]
    size: Option<String>,

    /// Quiet-zone width in modules
    #[arg(long, global = true)]
    border: Option<u32>,

    /// Also print the symbol to the terminal
    #[arg(long, global = true)]
    show: bool,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Link to a web page
    Url {
        /// Full URL including http:// or https://
        url: String,
    },

    /// Plain text
    Text { text: String },

    /// WiFi network credentials
    Wifi {
        /// Network name
        ssid: String,

        /// Network password
        #[arg(short, long)]
        password: Option<String>,

        /// wpa, wep or nopass
        #[arg(short, long, default_value = "wpa")]
        encryption: WifiEncryption,

        /// The network does not broadcast its SSID
        #[arg(long)]
        hidden: bool,
    },

    /// Pre-filled email
    Email {
        /// Recipient address
        to: String,

        #[arg(short, long)]
        subject: Option<String>,

        #[arg(short, long)]
        body: Option<String>,
    },

    /// Pre-filled text message
    Sms {
        number: String,

        #[arg(short, long)]
        message: Option<String>,
    },

    /// Contact card (vCard 3.0)
    Vcard {
        first_name: String,

        last_name: Option<String>,

        #[arg(long)]
        org: Option<String>,

        #[arg(long)]
        title: Option<String>,

        #[arg(long)]
        phone: Option<String>,

        #[arg(long)]
        email: Option<String>,

        #[arg(long)]
        website: Option<String>,
    },

    /// Geographic location
    Geo {
        #[arg(allow_hyphen_values = true)]
        latitude: String,

        #[arg(allow_hyphen_values = true)]
        longitude: String,

        #[arg(allow_hyphen_values = true)]
        altitude: Option<String>,
    },

    /// Phone number to call
    Phone { number: String },

    /// Calendar event
    Event {
        title: String,

        #[arg(long)]
        location: Option<String>,

        #[arg(long)]
        description: Option<String>,

        /// Start date (YYYYMMDD)
        #[arg(long)]
        start: Option<String>,

        /// End date (YYYYMMDD)
        #[arg(long)]
        end: Option<String>,
    },

    /// Embed an image as base64 JPEG
    Image {
        path: PathBuf,

        /// JPEG size budget in KB
        #[arg(long)]
        max_kb: Option<usize>,
    },

    /// Embed an image encrypted with a password
    EncryptedImage {
        path: PathBuf,

        /// Password; prompted for (twice) when omitted
        #[arg(short, long)]
        password: Option<String>,

        /// JPEG size budget in KB
        #[arg(long)]
        max_kb: Option<usize>,
    },

    /// Embed the contents of a text file
    TextFile { path: PathBuf },

    /// Decrypt an encrypted-image envelope
    Decrypt {
        /// Envelope JSON, or a file containing it
        input: String,

        /// Password; prompted for when omitted
        #[arg(short, long)]
        password: Option<String>,

        /// Write the recovered JPEG here
        #[arg(long)]
        jpeg_out: Option<PathBuf>,
    },

    /// Check the encryption round trip with a password
    Demo {
        #[arg(short, long)]
        password: Option<String>,
    },
}

/// Exit status after Ctrl+C (128 + SIGINT).
const INTERRUPTED_EXIT_CODE: i32 = 130;

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    if let Err(e) = install_interrupt_handler() {
        warn!("{e:#}");
    }

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn install_interrupt_handler() -> Result<()> {
    ctrlc::set_handler(|| {
        eprintln!("\nInterrupted, shutting down.");
        std::process::exit(INTERRUPTED_EXIT_CODE);
    })
    .context("failed to set Ctrl+C handler")
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "qrseal=debug" } else { "qrseal=info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)))
        .with_writer(io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<()> {
    let mut settings = Settings::load(cli.config.as_deref()).context("failed to load settings")?;
    apply_overrides(&mut settings, &cli);

    let payload = match cli.command {
        Commands::Url { url } => Payload::Url(url),
        Commands::Text { text } => Payload::Text(text),
        Commands::Wifi {
            ssid,
            password,
            encryption,
            hidden,
        } => Payload::Wifi {
            ssid,
            password,
            encryption,
            hidden,
        },
        Commands::Email { to, subject, body } => Payload::Email { to, subject, body },
        Commands::Sms { number, message } => Payload::Sms { number, message },
        Commands::Vcard {
            first_name,
            last_name,
            org,
            title,
            phone,
            email,
            website,
        } => Payload::VCard(Contact {
            first_name,
            last_name,
            organization: org,
            title,
            phone,
            email,
            website,
        }),
        Commands::Geo {
            latitude,
            longitude,
            altitude,
        } => Payload::Geo {
            latitude,
            longitude,
            altitude,
        },
        Commands::Phone { number } => Payload::Phone(number),
        Commands::Event {
            title,
            location,
            description,
            start,
            end,
        } => Payload::Event(Event {
            title,
            location,
            description,
            start,
            end,
        }),
        Commands::Image { path, max_kb } => {
            let max_kb = max_kb.unwrap_or(settings.image.max_size_kb);
            let jpeg = image_io::load_and_recompress_image(&path, max_kb)?;
            println!("Image: {} KB, quality {}%", jpeg.size_kb(), jpeg.quality);
            Payload::Image(jpeg.bytes)
        }
        Commands::EncryptedImage {
            path,
            password,
            max_kb,
        } => {
            let password = match password {
                Some(password) => password,
                None => read_new_password(prompt_password)?,
            };
            let max_kb = max_kb.unwrap_or(settings.image.encrypted_max_size_kb);
            let jpeg = image_io::load_and_recompress_image(&path, max_kb)?;
            println!("Image: {} KB, quality {}%", jpeg.size_kb(), jpeg.quality);
            Payload::EncryptedImage {
                jpeg: jpeg.bytes,
                password,
            }
        }
        Commands::TextFile { path } => Payload::text_file(&path)?,
        Commands::Decrypt {
            input,
            password,
            jpeg_out,
        } => return decrypt(&input, password, jpeg_out.as_deref()),
        Commands::Demo { password } => {
            let password = password_or_prompt(password)?;
            let recovered = crypto::self_test(&password)?;
            println!("original:  {}", crypto::SELF_TEST_SAMPLE);
            println!("decrypted: {recovered}");
            println!("encryption round trip OK");
            return Ok(());
        }
    };

    let encoded = payload.encode()?;
    let style = settings.render.style()?;
    let path = cli
        .output
        .unwrap_or_else(|| settings.output.directory.join(payload.kind().default_filename()));

    if cli.show {
        helper::print_qr(encoded.as_str())?;
    }
    let summary = generate::generate(&encoded, &path, &style)
        .with_context(|| format!("failed to create {} QR code", payload.kind()))?;
    println!("{summary}");
    Ok(())
}

fn apply_overrides(settings: &mut Settings, cli: &Cli) {
    let render = &mut settings.render;
    if let Some(scheme) = &cli.scheme {
        render.scheme = scheme.clone();
    }
    if let Some(fill) = &cli.fill {
        render.fill = Some(fill.clone());
    }
    if let Some(back) = &cli.back {
        render.back = Some(back.clone());
    }
    if let Some(size) = &cli.size {
        render.module_size = size.clone();
    }
    if let Some(border) = cli.border {
        render.border = border;
    }
}

fn decrypt(input: &str, password: Option<String>, jpeg_out: Option<&Path>) -> Result<()> {
    let json = if Path::new(input).is_file() {
        fs::read_to_string(input).with_context(|| format!("failed to read {input}"))?
    } else {
        input.to_string()
    };
    let password = password_or_prompt(password)?;
    let data_uri = envelope::open_encrypted(&json, &password)?;

    match jpeg_out {
        Some(out) => {
            let jpeg = image_io::from_data_uri(&data_uri)?;
            fs::write(out, &jpeg).with_context(|| format!("failed to write {}", out.display()))?;
            info!(path = %out.display(), bytes = jpeg.len(), "decrypted image written");
            println!("Decrypted image written to {}", out.display());
        }
        None => {
            println!("{}", generate::preview(&data_uri, generate::PREVIEW_CHARS));
        }
    }
    Ok(())
}

fn password_or_prompt(password: Option<String>) -> Result<String> {
    match password {
        Some(password) => Ok(password),
        None => prompt_password("Password"),
    }
}

/// Asks for a password twice and keeps it only if both entries match.
fn read_new_password<F>(mut ask: F) -> Result<String>
where
    F: FnMut(&str) -> Result<String>,
{
    let first = ask("Password")?;
    let second = ask("Confirm password")?;
    Ok(confirm_password(&first, &second)?.to_string())
}

/// Reads a password from the terminal without echoing it.
fn prompt_password(label: &str) -> Result<String> {
    rpassword::prompt_password(format!("{label}: ")).context("failed to read password")
}
