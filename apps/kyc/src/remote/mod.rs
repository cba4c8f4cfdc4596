//! Boundary with the remote verification service.
//!
//! This module contains:
//! - `VerificationApi`: the two operations the wizard needs from the service
//! - `http`: the reqwest-backed implementation
//! - Wire types for the `/api-key` and `/kyc` endpoints
//!
//! How the service performs document/selfie matching is not our concern; only
//! the request/response contract is modelled here.

pub mod http;

use std::future::Future;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ClientResult;
use crate::types::{AccessCredential, RejectionReason, VerificationInput, VerificationOutcome};

pub use http::RemoteVerificationClient;

/// Shown when the service answers `success: false` without explaining why.
const GENERIC_FAILURE: &str = "We could not verify your identity at this time.";

/// Shown when the service could not match the selfie to the document.
const NOT_VERIFIED: &str = "Identity could not be verified";

/// Remote operations used by the wizard. Both are single-attempt.
pub trait VerificationApi: Send + Sync {
    /// Obtain a fresh API key.
    fn acquire_credential(&self) -> impl Future<Output = ClientResult<AccessCredential>> + Send;

    /// Submit email, ID image and selfie for verification.
    ///
    /// Service-level refusals (rate limiting, business rules, failed matches) are
    /// returned as `Ok(VerificationOutcome::Rejected { .. })`. `Err` is reserved
    /// for transport failures and credential rejection.
    fn submit(
        &self,
        input: &VerificationInput,
        credential: &AccessCredential,
    ) -> impl Future<Output = ClientResult<VerificationOutcome>> + Send;
}

// =============================================================================
// Wire types
// =============================================================================

/// Response body of `POST /api-key`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiKeyResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub expires: Option<String>,
}

/// Response body of `POST /kyc`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KycResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verified: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub similarity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl KycResponse {
    /// Interpret a 2xx response body.
    pub fn into_outcome(self) -> VerificationOutcome {
        match (self.success, self.verified) {
            (true, Some(true)) => VerificationOutcome::Success {
                similarity_percent: self.similarity.unwrap_or(0.0),
            },
            (true, _) => VerificationOutcome::Rejected {
                reason: RejectionReason::NotVerified(
                    self.message.unwrap_or_else(|| NOT_VERIFIED.to_string()),
                ),
            },
            (false, _) => VerificationOutcome::Rejected {
                reason: RejectionReason::Declined(
                    self.error
                        .or(self.message)
                        .unwrap_or_else(|| GENERIC_FAILURE.to_string()),
                ),
            },
        }
    }
}

/// Parse the `expires` field of an API key response.
///
/// Accepts RFC 3339 timestamps and offset-less ISO-8601 date-times, which are
/// taken to be UTC.
pub fn parse_expiry(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(value) {
        return Some(timestamp.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn response(json: &str) -> KycResponse {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_verified_response() {
        let outcome =
            response(r#"{"success":true,"verified":true,"similarity":87.5}"#).into_outcome();
        assert_eq!(
            outcome,
            VerificationOutcome::Success {
                similarity_percent: 87.5
            }
        );
    }

    #[test]
    fn test_not_verified_response() {
        let outcome = response(
            r#"{"success":true,"verified":false,"similarity":12.0,"message":"Faces do not match"}"#,
        )
        .into_outcome();
        assert_eq!(
            outcome,
            VerificationOutcome::Rejected {
                reason: RejectionReason::NotVerified("Faces do not match".to_string())
            }
        );

        let outcome = response(r#"{"success":true}"#).into_outcome();
        assert_eq!(
            outcome,
            VerificationOutcome::Rejected {
                reason: RejectionReason::NotVerified(NOT_VERIFIED.to_string())
            }
        );
    }

    #[test]
    fn test_unsuccessful_response_prefers_error_text() {
        let outcome = response(r#"{"success":false,"error":"No face detected","message":"x"}"#)
            .into_outcome();
        assert_eq!(
            outcome,
            VerificationOutcome::Rejected {
                reason: RejectionReason::Declined("No face detected".to_string())
            }
        );

        let outcome = response("{}").into_outcome();
        assert_eq!(
            outcome,
            VerificationOutcome::Rejected {
                reason: RejectionReason::Declined(GENERIC_FAILURE.to_string())
            }
        );
    }

    #[test]
    fn test_parse_expiry_formats() {
        let expected = Utc.with_ymd_and_hms(2025, 3, 1, 12, 30, 0).unwrap();

        assert_eq!(parse_expiry("2025-03-01T12:30:00Z"), Some(expected));
        assert_eq!(parse_expiry("2025-03-01T14:30:00+02:00"), Some(expected));
        assert_eq!(parse_expiry("2025-03-01T12:30:00"), Some(expected));
        assert_eq!(parse_expiry(" 2025-03-01 12:30:00 "), Some(expected));
        assert_eq!(
            parse_expiry("2025-03-01T12:30:00.250000").map(|t| t.timestamp_millis()),
            Some(expected.timestamp_millis() + 250)
        );
        assert_eq!(parse_expiry("tomorrow"), None);
        assert_eq!(parse_expiry(""), None);
    }
}
