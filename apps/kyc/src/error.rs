//! Error types for the verification wizard.
//!
//! Local errors (`WizardError`, `CaptureError`) never reach the network and are
//! recovered by asking the user to correct their input. `ClientError` covers the
//! remote boundary; the orchestrator folds it into a
//! [`VerificationOutcome::TransportError`](crate::types::VerificationOutcome).

use thiserror::Error;

use crate::types::{ImageValidationResult, WizardStep};

/// Errors raised by the remote verification client.
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Verification service unreachable: {0}")]
    Unreachable(String),

    #[error("Request failed: {0}")]
    Transport(String),

    #[error("Credential unavailable: {0}")]
    CredentialUnavailable(String),

    #[error("Credential rejected: {0}")]
    CredentialRejected(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Client configuration error: {0}")]
    Configuration(String),
}

impl ClientError {
    /// Get the error code for structured error reporting.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Unreachable(_) => "SERVICE_UNREACHABLE",
            Self::Transport(_) => "TRANSPORT_ERROR",
            Self::CredentialUnavailable(_) => "CREDENTIAL_UNAVAILABLE",
            Self::CredentialRejected(_) => "CREDENTIAL_REJECTED",
            Self::InvalidResponse(_) => "INVALID_RESPONSE",
            Self::Configuration(_) => "CLIENT_CONFIGURATION_ERROR",
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Unreachable(format!("Request timed out: {err}"))
        } else if err.is_connect() {
            Self::Unreachable(format!("Connection failed: {err}"))
        } else if err.is_decode() {
            Self::InvalidResponse(err.to_string())
        } else if err.is_builder() {
            Self::Configuration(err.to_string())
        } else {
            Self::Transport(err.to_string())
        }
    }
}

/// Errors raised by wizard transitions.
#[derive(Error, Debug)]
pub enum WizardError {
    #[error("Invalid email: {}", .errors.join("; "))]
    InvalidEmail { errors: Vec<String> },

    #[error("Image rejected: {}", .0.messages().join("; "))]
    InvalidImage(ImageValidationResult),

    #[error("Missing input: {0}")]
    MissingInput(&'static str),

    #[error("Cannot {action} from the {step} step")]
    InvalidTransition {
        step: WizardStep,
        action: &'static str,
    },

    #[error("A verification is already in progress")]
    SubmissionInProgress,
}

impl WizardError {
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidEmail { .. } => "INVALID_EMAIL",
            Self::InvalidImage(_) => "INVALID_IMAGE",
            Self::MissingInput(_) => "MISSING_INPUT",
            Self::InvalidTransition { .. } => "INVALID_TRANSITION",
            Self::SubmissionInProgress => "SUBMISSION_IN_PROGRESS",
        }
    }

    /// Validation errors to show next to the offending input, if any.
    pub fn validation_messages(&self) -> Vec<String> {
        match self {
            Self::InvalidEmail { errors } => errors.clone(),
            Self::InvalidImage(result) => result.messages(),
            _ => Vec::new(),
        }
    }
}

/// Errors raised while obtaining a selfie.
#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("Camera access denied")]
    PermissionDenied,

    #[error("Camera unavailable: {0}")]
    DeviceUnavailable(String),

    #[error("Camera is not streaming")]
    NotStreaming,

    #[error("No image selected")]
    NothingSelected,

    #[error("Image rejected: {}", .0.messages().join("; "))]
    Precheck(ImageValidationResult),

    #[error("Failed to encode frame: {0}")]
    Encoding(String),
}

impl CaptureError {
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::PermissionDenied => "CAMERA_PERMISSION_DENIED",
            Self::DeviceUnavailable(_) => "CAMERA_UNAVAILABLE",
            Self::NotStreaming => "CAMERA_NOT_STREAMING",
            Self::NothingSelected => "NOTHING_SELECTED",
            Self::Precheck(_) => "INVALID_IMAGE",
            Self::Encoding(_) => "ENCODING_FAILED",
        }
    }
}

impl From<image::ImageError> for CaptureError {
    fn from(err: image::ImageError) -> Self {
        Self::Encoding(err.to_string())
    }
}

/// Result type alias for remote client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Result type alias for wizard transitions.
pub type WizardResult<T> = Result<T, WizardError>;
