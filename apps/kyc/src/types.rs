//! Domain types shared by the precheck, capture, wizard and remote client.
//!
//! Everything here is plain data. The presentation layer can serialize any of
//! these (except raw image bytes) to render the wizard without reaching into
//! orchestrator internals.

use std::fmt;
use std::path::Path;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::wizard::EmailAddress;

/// Fallback content type for files whose extension is unknown.
const OCTET_STREAM: &str = "application/octet-stream";

// =============================================================================
// Images
// =============================================================================

/// An image selected or captured by the user.
///
/// Bytes are reference-counted, so cloning an `ImageFile` is cheap.
#[derive(Clone, PartialEq, Eq)]
pub struct ImageFile {
    file_name: String,
    content_type: String,
    bytes: Bytes,
}

impl ImageFile {
    pub fn new(
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        bytes: impl Into<Bytes>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            bytes: bytes.into(),
        }
    }

    /// Read an image from disk, deriving the content type from its extension.
    pub fn from_path(path: &Path) -> std::io::Result<Self> {
        let bytes = std::fs::read(path)?;
        let content_type = image::ImageFormat::from_path(path)
            .map(|format| format.to_mime_type())
            .unwrap_or(OCTET_STREAM);
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "image".to_string());

        Ok(Self::new(file_name, content_type, bytes))
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn bytes(&self) -> &Bytes {
        &self.bytes
    }

    /// Size in bytes.
    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

impl fmt::Debug for ImageFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageFile")
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("size", &self.bytes.len())
            .finish()
    }
}

/// A single precheck failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrecheckIssue {
    UnsupportedFormat,
    TooLarge,
    TooSmall,
    LowQuality,
    Undecodable,
}

impl PrecheckIssue {
    /// User-facing message for this issue.
    pub fn message(self) -> &'static str {
        match self {
            Self::UnsupportedFormat => "Please upload a JPG or PNG image",
            Self::TooLarge => "Image size must be less than 5MB",
            Self::TooSmall => "Image must be at least 300x300 pixels",
            Self::LowQuality => "Image quality is too low",
            Self::Undecodable => "Invalid image file",
        }
    }
}

impl fmt::Display for PrecheckIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// Result of running the local precheck over one image selection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageValidationResult {
    pub is_valid: bool,
    pub errors: Vec<PrecheckIssue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quality: Option<f64>,
}

impl ImageValidationResult {
    pub(crate) fn from_issues(errors: Vec<PrecheckIssue>, quality: Option<f64>) -> Self {
        Self {
            is_valid: errors.is_empty(),
            errors,
            quality,
        }
    }

    pub fn has(&self, issue: PrecheckIssue) -> bool {
        self.errors.contains(&issue)
    }

    /// Error messages in the order the checks ran.
    pub fn messages(&self) -> Vec<String> {
        self.errors.iter().map(|issue| issue.to_string()).collect()
    }
}

// =============================================================================
// Credentials
// =============================================================================

/// Short-lived bearer token for the remote verification endpoint.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessCredential {
    token: String,
    expires_at: DateTime<Utc>,
}

impl AccessCredential {
    pub fn new(token: impl Into<String>, expires_at: DateTime<Utc>) -> Self {
        Self {
            token: token.into(),
            expires_at,
        }
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    /// True when the credential must not be presented at `now`, treating it as
    /// expired `margin` ahead of its stated expiry.
    pub fn is_expired_at(&self, now: DateTime<Utc>, margin: chrono::Duration) -> bool {
        now + margin >= self.expires_at
    }
}

impl fmt::Debug for AccessCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessCredential")
            .field("token", &"[redacted]")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

// =============================================================================
// Verification
// =============================================================================

/// Everything the remote service needs for one verification attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationInput {
    pub email: EmailAddress,
    pub id_image: ImageFile,
    pub selfie: ImageFile,
}

/// Why the remote service declined a verification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "message", rename_all = "snake_case")]
pub enum RejectionReason {
    /// HTTP 429 from the verification endpoint.
    RateLimited,
    /// The service processed the images but could not match them.
    NotVerified(String),
    /// The request was refused (business rule, bad input, server error).
    Declined(String),
}

impl fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RateLimited => {
                write!(f, "Too many requests. Please wait a moment and try again.")
            }
            Self::NotVerified(message) | Self::Declined(message) => f.write_str(message),
        }
    }
}

/// Terminal result of one verification attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum VerificationOutcome {
    Success { similarity_percent: f64 },
    Rejected { reason: RejectionReason },
    TransportError { message: String },
}

impl VerificationOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// Short machine-readable label, used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Success { .. } => "success",
            Self::Rejected {
                reason: RejectionReason::RateLimited,
            } => "rate_limited",
            Self::Rejected { .. } => "rejected",
            Self::TransportError { .. } => "transport_error",
        }
    }

    /// One-line text suitable for showing to the user.
    pub fn summary(&self) -> String {
        match self {
            Self::Success { similarity_percent } => {
                format!("Identity verified with {similarity_percent:.1}% similarity")
            }
            Self::Rejected { reason } => reason.to_string(),
            Self::TransportError { message } => message.clone(),
        }
    }
}

// =============================================================================
// Wizard steps
// =============================================================================

/// The four wizard steps, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WizardStep {
    Email,
    IdDocument,
    Selfie,
    Result,
}

impl WizardStep {
    pub const ALL: [Self; 4] = [Self::Email, Self::IdDocument, Self::Selfie, Self::Result];

    /// 1-based position in the flow.
    pub fn number(self) -> u8 {
        match self {
            Self::Email => 1,
            Self::IdDocument => 2,
            Self::Selfie => 3,
            Self::Result => 4,
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Self::Email => "Email",
            Self::IdDocument => "ID Document",
            Self::Selfie => "Selfie",
            Self::Result => "Verification",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Self::Email => "Enter email",
            Self::IdDocument => "Upload ID",
            Self::Selfie => "Take photo",
            Self::Result => "Processing",
        }
    }
}

impl fmt::Display for WizardStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Email => write!(f, "email"),
            Self::IdDocument => write!(f, "id_document"),
            Self::Selfie => write!(f, "selfie"),
            Self::Result => write!(f, "result"),
        }
    }
}
