//! Tracing setup for native hosts.
//!
//! ```ignore
//! scrivo_editor_native::telemetry::init();
//! tracing::info!(target: "scrivo::view", "editor ready");
//! ```

use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Console level used when `RUST_LOG` is unset.
pub fn default_level() -> Level {
    if cfg!(debug_assertions) {
        Level::DEBUG
    } else {
        Level::INFO
    }
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level().as_str().to_lowercase()))
}

/// Install the console subscriber. Call once at startup; later calls are
/// ignored.
pub fn init() {
    let console_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .with_filter(env_filter());

    match tracing_subscriber::registry().with(console_layer).try_init() {
        Ok(()) => {
            tracing::debug!(target: "scrivo::telemetry", level = %default_level(), "telemetry initialized")
        }
        Err(e) => {
            tracing::debug!(target: "scrivo::telemetry", error = %e, "telemetry already initialized")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_twice_is_harmless() {
        init();
        init();
    }

    #[test]
    fn default_level_follows_build_profile() {
        let expected = if cfg!(debug_assertions) {
            Level::DEBUG
        } else {
            Level::INFO
        };
        assert_eq!(default_level(), expected);
    }
}
