//! Tracing setup

use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is not set
pub const DEFAULT_DIRECTIVE: &str = "newsdesk=info,app_state=info";

/// Install a formatting subscriber
///
/// `RUST_LOG` takes precedence over `default_directive`. Returns `false` if a
/// global subscriber was already installed, so calling this more than once
/// is harmless.
pub fn init_tracing(default_directive: &str) -> bool {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .is_ok()
}
