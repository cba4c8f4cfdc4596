//! Client configuration derived from environment variables.
//!
//! Configuration is loaded once at startup and validated before any request is made.
//!
//! ## Environment Variables
//!
//! ### Remote service
//! - `KYC_API_BASE_URL`: Base URL of the verification service
//! - `KYC_REQUEST_TIMEOUT_MS`: Per-request timeout (default: 30000)
//! - `KYC_CREDENTIAL_EXPIRY_MARGIN_SECS`: Treat cached API keys as expired this many
//!   seconds early (default: 30)
//! - `KYC_ALLOW_INSECURE_HTTP`: Permit a plain `http://` base URL in production
//!
//! ### Images
//! - `KYC_CAPTURE_WIDTH` / `KYC_CAPTURE_HEIGHT`: Preferred camera resolution
//! - `KYC_CAPTURE_JPEG_QUALITY`: JPEG quality for captured frames (1-100)
//! - `KYC_COMPRESS_MAX_DIMENSION`: Bounding box used when compressing uploads
//! - `KYC_COMPRESS_JPEG_QUALITY`: JPEG quality used when compressing uploads (1-100)
//!
//! `RUST_LOG` controls the log filter.

use std::env;
use std::time::Duration;

use reqwest::Url;

const DEFAULT_API_BASE_URL: &str = "https://aws-kyc-verification.onrender.com";
const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 30_000;
const DEFAULT_CREDENTIAL_EXPIRY_MARGIN_SECS: i64 = 30;
const DEFAULT_CAPTURE_WIDTH: u32 = 1280;
const DEFAULT_CAPTURE_HEIGHT: u32 = 720;
const DEFAULT_CAPTURE_JPEG_QUALITY: u8 = 90;
const DEFAULT_COMPRESS_MAX_DIMENSION: u32 = 1024;
const DEFAULT_COMPRESS_JPEG_QUALITY: u8 = 80;

/// Helper to get trimmed env var or empty string.
fn env_trim(name: &str) -> String {
    env::var(name).unwrap_or_default().trim().to_string()
}

/// Helper to get lowercase env var.
fn env_lower(name: &str) -> String {
    env_trim(name).to_lowercase()
}

/// Check if a string value is truthy.
fn is_truthy(value: &str) -> bool {
    matches!(value.trim(), "1" | "true" | "yes")
}

/// Client configuration.
#[derive(Debug, Clone)]
pub struct Settings {
    api_base_url: String,
    request_timeout_ms: u64,
    credential_expiry_margin_secs: i64,
    is_production: bool,
    allow_insecure_http: bool,

    capture_width: u32,
    capture_height: u32,
    capture_jpeg_quality: u8,
    compress_max_dimension: u32,
    compress_jpeg_quality: u8,
}

impl Settings {
    /// Load settings from environment variables.
    pub fn from_env() -> Self {
        let api_base_url = env_trim("KYC_API_BASE_URL");
        let api_base_url = if api_base_url.is_empty() {
            DEFAULT_API_BASE_URL.to_string()
        } else {
            api_base_url
        };

        let request_timeout_ms = env_trim("KYC_REQUEST_TIMEOUT_MS")
            .parse::<u64>()
            .unwrap_or(DEFAULT_REQUEST_TIMEOUT_MS);

        let credential_expiry_margin_secs = env_trim("KYC_CREDENTIAL_EXPIRY_MARGIN_SECS")
            .parse::<i64>()
            .ok()
            .filter(|secs| *secs >= 0)
            .unwrap_or(DEFAULT_CREDENTIAL_EXPIRY_MARGIN_SECS);

        let node_env = env_lower("NODE_ENV");
        let app_env = env_lower("APP_ENV");
        let rust_env = env_lower("RUST_ENV");
        let is_production = matches!(node_env.as_str(), "production")
            || matches!(app_env.as_str(), "production")
            || matches!(rust_env.as_str(), "production");
        let allow_insecure_http = is_truthy(&env_lower("KYC_ALLOW_INSECURE_HTTP"));

        let capture_width = env_trim("KYC_CAPTURE_WIDTH")
            .parse::<u32>()
            .unwrap_or(DEFAULT_CAPTURE_WIDTH);
        let capture_height = env_trim("KYC_CAPTURE_HEIGHT")
            .parse::<u32>()
            .unwrap_or(DEFAULT_CAPTURE_HEIGHT);
        let capture_jpeg_quality = env_trim("KYC_CAPTURE_JPEG_QUALITY")
            .parse::<u8>()
            .unwrap_or(DEFAULT_CAPTURE_JPEG_QUALITY);

        let compress_max_dimension = env_trim("KYC_COMPRESS_MAX_DIMENSION")
            .parse::<u32>()
            .unwrap_or(DEFAULT_COMPRESS_MAX_DIMENSION);
        let compress_jpeg_quality = env_trim("KYC_COMPRESS_JPEG_QUALITY")
            .parse::<u8>()
            .unwrap_or(DEFAULT_COMPRESS_JPEG_QUALITY);

        Self {
            api_base_url,
            request_timeout_ms,
            credential_expiry_margin_secs,
            is_production,
            allow_insecure_http,
            capture_width,
            capture_height,
            capture_jpeg_quality,
            compress_max_dimension,
            compress_jpeg_quality,
        }
    }

    /// Create settings pointing at a local test server.
    pub fn for_tests(api_base_url: &str) -> Self {
        Self {
            api_base_url: api_base_url.to_string(),
            request_timeout_ms: 5_000,
            credential_expiry_margin_secs: DEFAULT_CREDENTIAL_EXPIRY_MARGIN_SECS,
            is_production: false,
            allow_insecure_http: true,
            capture_width: DEFAULT_CAPTURE_WIDTH,
            capture_height: DEFAULT_CAPTURE_HEIGHT,
            capture_jpeg_quality: DEFAULT_CAPTURE_JPEG_QUALITY,
            compress_max_dimension: DEFAULT_COMPRESS_MAX_DIMENSION,
            compress_jpeg_quality: DEFAULT_COMPRESS_JPEG_QUALITY,
        }
    }

    /// Validate settings.
    ///
    /// Returns an error message if validation fails.
    pub fn validate(&self) -> Result<(), String> {
        let url = Url::parse(&self.api_base_url)
            .map_err(|e| format!("KYC_API_BASE_URL is not a valid URL: {e}"))?;

        match url.scheme() {
            "https" => {}
            "http" => {
                if self.is_production && !self.allow_insecure_http {
                    return Err("KYC_API_BASE_URL must use https in production. \
                         Set KYC_ALLOW_INSECURE_HTTP=1 to override."
                        .to_string());
                }
            }
            other => {
                return Err(format!(
                    "KYC_API_BASE_URL has unsupported scheme '{other}'. Must be 'http' or 'https'."
                ));
            }
        }

        if self.request_timeout_ms == 0 {
            return Err("KYC_REQUEST_TIMEOUT_MS must be greater than zero".to_string());
        }

        for (name, quality) in [
            ("KYC_CAPTURE_JPEG_QUALITY", self.capture_jpeg_quality),
            ("KYC_COMPRESS_JPEG_QUALITY", self.compress_jpeg_quality),
        ] {
            if !(1..=100).contains(&quality) {
                return Err(format!("{name} must be between 1 and 100, got {quality}"));
            }
        }

        if self.compress_max_dimension == 0 {
            return Err("KYC_COMPRESS_MAX_DIMENSION must be greater than zero".to_string());
        }

        Ok(())
    }

    // Builders

    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    pub fn with_credential_expiry_margin(mut self, secs: i64) -> Self {
        self.credential_expiry_margin_secs = secs.max(0);
        self
    }

    pub fn with_production(mut self, is_production: bool, allow_insecure_http: bool) -> Self {
        self.is_production = is_production;
        self.allow_insecure_http = allow_insecure_http;
        self
    }

    // Getters

    /// Base URL without a trailing slash.
    pub fn api_base_url(&self) -> &str {
        self.api_base_url.trim_end_matches('/')
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn credential_expiry_margin(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.credential_expiry_margin_secs)
    }

    pub fn is_production(&self) -> bool {
        self.is_production
    }

    pub fn capture_resolution(&self) -> (u32, u32) {
        (self.capture_width, self.capture_height)
    }

    pub fn capture_jpeg_quality(&self) -> u8 {
        self.capture_jpeg_quality
    }

    pub fn compress_max_dimension(&self) -> u32 {
        self.compress_max_dimension
    }

    pub fn compress_jpeg_quality(&self) -> u8 {
        self.compress_jpeg_quality
    }
}
