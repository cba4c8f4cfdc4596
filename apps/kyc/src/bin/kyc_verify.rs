//! KYC verification from the command line.
//!
//! Walks the wizard with files on disk: email, ID document image, selfie upload,
//! then a single verification request.
//!
//! ## Exit status
//!
//! - `0`: identity verified
//! - `1`: rejected, transport failure, or invalid input
//! - `2`: usage or configuration error

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, bail};
use clap::Parser;
use kyc_wizard::{
    ImageFile, RemoteVerificationClient, Settings, VerificationOutcome, VerificationSession,
    WizardError, capture::UploadCapture, error::CaptureError, precheck, telemetry,
};

#[derive(Parser)]
#[command(name = "kyc-verify", version, about = "Verify an identity against the KYC service")]
struct Cli {
    /// Email address to verify.
    #[arg(long, env = "KYC_EMAIL")]
    email: String,

    /// Photo of the ID document (JPG or PNG).
    #[arg(long)]
    id_image: PathBuf,

    /// Selfie to match against the document (JPG or PNG).
    #[arg(long)]
    selfie: PathBuf,

    /// Verification service base URL (overrides KYC_API_BASE_URL).
    #[arg(long)]
    base_url: Option<String>,

    /// Downscale and re-encode both images before they are checked and sent.
    #[arg(long)]
    compress: bool,

    /// Print the outcome as JSON.
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    telemetry::init_tracing();

    let cli = Cli::parse();
    let code = match run(cli).await {
        Ok(outcome) if outcome.is_success() => ExitCode::SUCCESS,
        Ok(_) => ExitCode::from(1),
        Err(e) => {
            eprintln!("error: {e:#}");
            if e.is::<InputRejected>() {
                ExitCode::from(1)
            } else {
                ExitCode::from(2)
            }
        }
    };

    telemetry::shutdown_tracing();
    code
}

/// Local validation failed; the messages have already been printed.
#[derive(Debug, thiserror::Error)]
#[error("{0}")]
struct InputRejected(String);

async fn run(cli: Cli) -> anyhow::Result<VerificationOutcome> {
    let mut settings = Settings::from_env();
    if let Some(url) = cli.base_url {
        settings = settings.with_api_base_url(url);
    }
    if let Err(message) = settings.validate() {
        bail!(message);
    }

    let client = RemoteVerificationClient::new(&settings)?;
    let mut session = VerificationSession::new(client, &settings);
    tracing::debug!(session_id = %session.session_id(), base_url = settings.api_base_url(), "Starting verification");

    session
        .submit_email(&cli.email)
        .map_err(|e| rejected("Email", &e))?;

    let id_image = load(&cli.id_image, cli.compress, &settings)?;
    session
        .select_id_image(id_image)
        .map_err(|e| rejected("ID document", &e))?;
    session.continue_to_selfie()?;

    let mut upload = UploadCapture::new();
    let selfie = load(&cli.selfie, cli.compress, &settings)?;
    if let Err(e) = upload.select(selfie) {
        return Err(capture_rejected(&e).into());
    }
    session.set_selfie(upload.capture()?)?;

    let outcome = session.verify().await?;
    if cli.json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        println!("{}", outcome.summary());
    }
    Ok(outcome)
}

fn load(path: &Path, compress: bool, settings: &Settings) -> anyhow::Result<ImageFile> {
    let image =
        ImageFile::from_path(path).with_context(|| format!("Failed to read {}", path.display()))?;
    if !compress {
        return Ok(image);
    }

    let compressed = precheck::compress(
        &image,
        settings.compress_max_dimension(),
        settings.compress_jpeg_quality(),
    )
    .with_context(|| format!("Failed to compress {}", path.display()))?;
    tracing::info!(
        file = %path.display(),
        before = image.size(),
        after = compressed.size(),
        "Image compressed"
    );
    Ok(compressed)
}

fn rejected(field: &str, err: &WizardError) -> InputRejected {
    let messages = err.validation_messages();
    if messages.is_empty() {
        return InputRejected(format!("{field}: {err}"));
    }
    for message in &messages {
        eprintln!("{field}: {message}");
    }
    InputRejected(format!("{field} rejected"))
}

fn capture_rejected(err: &CaptureError) -> InputRejected {
    match err {
        CaptureError::Precheck(result) => {
            for message in result.messages() {
                eprintln!("Selfie: {message}");
            }
            InputRejected("Selfie rejected".to_string())
        }
        other => InputRejected(format!("Selfie: {other}")),
    }
}
