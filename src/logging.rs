//! Logging setup
//!
//! Library code only emits `tracing` events. Binaries and demos call
//! [`init`] once to print them; the filter comes from `RUST_LOG` and
//! defaults to `info`.

use std::sync::OnceLock;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

static INITIALIZED: OnceLock<()> = OnceLock::new();

/// Default filter when `RUST_LOG` is unset or invalid
pub const DEFAULT_FILTER: &str = "info";

/// Install a global fmt subscriber. Subsequent calls are no-ops.
///
/// If another global subscriber is already installed the existing one is
/// kept.
pub fn init() {
    INITIALIZED.get_or_init(|| {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
        let result = tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(false))
            .try_init();
        if let Err(e) = result {
            tracing::debug!(error = %e, "tracing subscriber already installed");
        }
    });
}
