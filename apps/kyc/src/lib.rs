// Crate-level lint configuration
// Allow noisy pedantic/cargo lints that aren't worth fixing individually
#![allow(clippy::multiple_crate_versions)] // Transitive deps, can't easily fix
#![allow(clippy::missing_errors_doc)] // Would require extensive doc changes
#![allow(clippy::missing_panics_doc)] // Would require extensive doc changes
#![allow(clippy::must_use_candidate)] // Too many false positives for internal APIs
#![allow(clippy::module_name_repetitions)] // Acceptable for clarity (e.g., WizardError in error mod)
#![allow(clippy::doc_markdown)] // Too strict about backticks in docs
#![allow(clippy::missing_const_for_fn)] // Often debatable, runtime doesn't benefit

//! KYC Verification Wizard
//!
//! Client-side orchestration of a four-step identity verification flow: collect an
//! email address, an ID document image and a selfie, then submit all three to a
//! remote verification service and report the outcome.
//!
//! ## Architecture
//!
//! - **Image Precheck** (`precheck`): local format, size, resolution and quality
//!   checks, plus optional downscaling before upload.
//!
//! - **Capture Source** (`capture`): the selfie comes from either a live camera
//!   (one still frame, device released on every exit path) or a file upload.
//!
//! - **Verification Session** (`wizard`): the step state machine. Owns the inputs,
//!   the cached API key and the single in-flight submission, and publishes a
//!   `WizardView` after every change.
//!
//! - **Remote Verification Client** (`remote`): `POST /api-key` and the multipart
//!   `POST /kyc` submission.
//!
//! ## Guarantees
//!
//! - At most one verification request per entry into the result step
//! - An API key is reused until it expires or is rejected, across "start over"
//! - Only precheck-approved ID images reach the network
//! - API keys never appear in logs or `Debug` output

pub mod capture;
pub mod config;
mod console;
pub mod error;
pub mod precheck;
pub mod remote;
pub mod test_support;
pub mod types;
pub mod wizard;

#[cfg(feature = "otel")]
pub mod telemetry;

#[cfg(not(feature = "otel"))]
pub mod telemetry {
    //! Stub telemetry module when OpenTelemetry is disabled.

    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    use crate::console;

    /// Initialize tracing with console output only.
    pub fn init_tracing() {
        tracing_subscriber::registry()
            .with(console::env_filter())
            .with(console::layer())
            .init();
    }

    /// No-op shutdown when OpenTelemetry is disabled.
    pub fn shutdown_tracing() {}
}

// Re-export commonly used types
pub use config::Settings;
pub use error::{CaptureError, ClientError, WizardError};
pub use remote::{RemoteVerificationClient, VerificationApi};
pub use types::{
    AccessCredential, ImageFile, ImageValidationResult, PrecheckIssue, RejectionReason,
    VerificationInput, VerificationOutcome, WizardStep,
};
pub use wizard::{EmailAddress, VerificationSession, WizardView};
