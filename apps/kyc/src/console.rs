//! Console log output shared by both telemetry builds.

use tracing::Subscriber;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{EnvFilter, Layer};

const DEFAULT_FILTER: &str = "kyc_wizard=info,kyc_verify=info";

/// `RUST_LOG`, or the crate default.
pub(crate) fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_FILTER.into())
}

/// Formatter writing to stderr; JSON lines when `KYC_LOG_FORMAT=json`.
pub(crate) fn layer<S>() -> Box<dyn Layer<S> + Send + Sync + 'static>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    let layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);
    if json_requested() {
        layer.json().boxed()
    } else {
        layer.boxed()
    }
}

fn json_requested() -> bool {
    std::env::var("KYC_LOG_FORMAT").is_ok_and(|v| v.trim().eq_ignore_ascii_case("json"))
}
