//! Tracing initialisation.

use std::sync::Once;

use tracing_subscriber::{EnvFilter, fmt, prelude::*};

static INIT: Once = Once::new();

/// Environment variable holding per-target log levels,
/// e.g. `SEEDGRAPH_LOG=seedgraph::physics=debug,seedgraph=info`.
pub const LOG_ENV: &str = "SEEDGRAPH_LOG";

/// Installs the global subscriber. Later calls are ignored.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter =
            EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("seedgraph=info"));

        let _ = tracing_subscriber::registry()
            .with(fmt::layer().with_target(true))
            .with(filter)
            .try_init();
    });
}
