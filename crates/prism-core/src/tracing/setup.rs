//! Tracing initialization.

use std::sync::Once;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

static INIT: Once = Once::new();

/// Environment variable holding the log filter directive.
pub const LOG_ENV_VAR: &str = "PRISM_LOG";

/// Initialize the PRISM tracing/logging system.
///
/// Reads `PRISM_LOG` for per-crate log levels, e.g.
/// `PRISM_LOG=prism_jobs=debug,prism_storage=warn`.
/// Falls back to `prism=info` if unset or invalid.
///
/// Logs go to stderr so stdout stays reserved for the run summary.
/// Calling this more than once is a no-op.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_env(LOG_ENV_VAR)
            .unwrap_or_else(|_| EnvFilter::new("prism=info"));

        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(filter)
            .init();
    });
}
