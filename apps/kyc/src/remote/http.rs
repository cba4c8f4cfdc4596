//! reqwest-backed client for the remote verification service.

use reqwest::multipart::{Form, Part};
use reqwest::{Body, Client, StatusCode};

use crate::config::Settings;
use crate::error::{ClientError, ClientResult};
use crate::remote::{ApiKeyResponse, KycResponse, VerificationApi, parse_expiry};
use crate::types::{
    AccessCredential, ImageFile, RejectionReason, VerificationInput, VerificationOutcome,
};

/// HTTP client for the verification service.
#[derive(Debug, Clone)]
pub struct RemoteVerificationClient {
    http: Client,
    base_url: String,
}

impl RemoteVerificationClient {
    /// Create a new client from settings.
    pub fn new(settings: &Settings) -> ClientResult<Self> {
        let http = Client::builder()
            .timeout(settings.request_timeout())
            .user_agent(concat!("kyc-wizard/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ClientError::Configuration(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url: settings.api_base_url().to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}

impl VerificationApi for RemoteVerificationClient {
    async fn acquire_credential(&self) -> ClientResult<AccessCredential> {
        let response = self
            .http
            .post(self.url("/api-key"))
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(status = status.as_u16(), "API key request failed");
            return Err(ClientError::CredentialUnavailable(format!(
                "API key request returned status {}",
                status.as_u16()
            )));
        }

        let body: ApiKeyResponse = response.json().await?;
        if !body.success {
            return Err(ClientError::CredentialUnavailable(
                "Service declined to issue an API key".to_string(),
            ));
        }

        let token = body
            .api_key
            .filter(|key| !key.is_empty())
            .ok_or_else(|| ClientError::InvalidResponse("API key missing from response".to_string()))?;
        let expires = body.expires.unwrap_or_default();
        let expires_at = parse_expiry(&expires).ok_or_else(|| {
            ClientError::InvalidResponse(format!("Unrecognised API key expiry: {expires:?}"))
        })?;

        tracing::info!(expires_at = %expires_at, "Acquired API key");
        Ok(AccessCredential::new(token, expires_at))
    }

    async fn submit(
        &self,
        input: &VerificationInput,
        credential: &AccessCredential,
    ) -> ClientResult<VerificationOutcome> {
        let form = Form::new()
            .text("email", input.email.as_str().to_owned())
            .part("id_image", image_part(&input.id_image)?)
            .part("selfie", image_part(&input.selfie)?);

        let response = self
            .http
            .post(self.url("/kyc"))
            .bearer_auth(credential.token())
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            tracing::warn!("Verification request rate limited");
            return Ok(VerificationOutcome::Rejected {
                reason: RejectionReason::RateLimited,
            });
        }

        let text = response.text().await?;
        let body = serde_json::from_str::<KycResponse>(&text).ok();

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            tracing::warn!(status = status.as_u16(), "API key rejected");
            let detail = body
                .and_then(|b| b.error)
                .unwrap_or_else(|| format!("status {}", status.as_u16()));
            return Err(ClientError::CredentialRejected(detail));
        }

        if !status.is_success() {
            tracing::info!(status = status.as_u16(), "Verification request declined");
            let reason = body.and_then(|b| b.error).unwrap_or_else(|| {
                format!("Verification request failed with status {}", status.as_u16())
            });
            return Ok(VerificationOutcome::Rejected {
                reason: RejectionReason::Declined(reason),
            });
        }

        let body = body.ok_or_else(|| {
            ClientError::InvalidResponse("Verification response is not valid JSON".to_string())
        })?;
        Ok(body.into_outcome())
    }
}

fn image_part(image: &ImageFile) -> ClientResult<Part> {
    Part::stream_with_length(Body::from(image.bytes().clone()), image.size())
        .file_name(image.file_name().to_string())
        .mime_str(image.content_type())
        .map_err(|e| {
            ClientError::Configuration(format!(
                "Invalid content type for {}: {e}",
                image.file_name()
            ))
        })
}
