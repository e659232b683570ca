//! Tracing subscriber initialization.

use tracing_subscriber::{
    fmt::format::Format, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter,
};

/// Initialize tracing.
///
/// Respects `RUST_LOG` when set; otherwise defaults to debug output for the
/// application crates and tower-http.
pub fn init_telemetry() {
    // Console: compact format (message string for convenience).
    let console_fmt = tracing_subscriber::fmt::layer().event_format(
        Format::default()
            .compact()
            .with_target(false)
            .without_time(),
    );
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "firmado=debug,tower_http=debug".into()),
        )
        .with(console_fmt)
        .init();
}
