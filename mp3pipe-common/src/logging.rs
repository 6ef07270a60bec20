//! Tracing subscriber setup shared by mp3pipe binaries

use crate::{Error, Result};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Build the filter directive used when `RUST_LOG` is not set
pub fn default_directive(crate_name: &str, level: &str) -> String {
    format!("{}={}", crate_name.replace('-', "_"), level)
}

/// Install the global tracing subscriber.
///
/// `RUST_LOG` wins over the configured level. The fallback filter covers
/// the calling crate and this one.
pub fn init_tracing(crate_name: &str, level: &str) -> Result<()> {
    let fallback = format!(
        "{},{}",
        default_directive(crate_name, level),
        default_directive(env!("CARGO_PKG_NAME"), level)
    );

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| fallback.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init()
        .map_err(|e| Error::Logging(e.to_string()))
}
