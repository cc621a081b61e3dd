//! Tracing subscriber setup.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::{Error, Result};

/// Build the env filter: `RUST_LOG` if set, otherwise `fallback`.
pub fn env_filter(fallback: &str) -> Result<EnvFilter> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(fallback).map_err(|e| Error::LogFilter(e.to_string())),
    }
}

/// Install a global console subscriber.
///
/// Fails if the filter doesn't parse or a global subscriber is already set.
pub fn setup(fallback_filter: &str) -> Result<()> {
    let console_layer = fmt::layer().with_target(true).with_writer(std::io::stdout);

    tracing_subscriber::registry()
        .with(console_layer)
        .with(env_filter(fallback_filter)?)
        .try_init()
        .map_err(|e| Error::Generic(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_bad_fallback() {
        // Only meaningful when RUST_LOG isn't overriding the fallback.
        if std::env::var_os("RUST_LOG").is_some() {
            return;
        }
        assert!(matches!(env_filter("display=notalevel"), Err(Error::LogFilter(_))));
        assert!(env_filter("display=debug,info").is_ok());
    }
}
