//! Tracing setup
//!
//! Installs the fmt subscriber used by whichever binary hosts the cache layer.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Default filter when `RUST_LOG` is unset.
pub const DEFAULT_DIRECTIVES: &str = "str_analytics_cache=info";

/// Initializes the global tracing subscriber with an env filter.
///
/// Defaults to [`DEFAULT_DIRECTIVES`], overridable with `RUST_LOG`. Returns
/// false when a global subscriber was already installed.
pub fn init_tracing() -> bool {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_DIRECTIVES.into()))
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .is_ok()
}
