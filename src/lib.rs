pub mod config;
pub mod pipeline;

pub use pipeline::consistency::{parse_consistency_response, parse_consistency_response_with};
pub use pipeline::dispatcher::{parse_timeline_response, ResponseParser};
pub use pipeline::strategies::ParseStrategy;
pub use pipeline::structuring::{
    ConsistencyReport, EventCategory, FormatDetected, ParseError, ParseResult, ParsedEvent,
};

use tracing_subscriber::EnvFilter;

/// Install the fmt subscriber for a host that has none. Honors `RUST_LOG`,
/// falling back to [`config::default_log_filter`]. Calling it again is a no-op.
pub fn init_tracing() {
    let initialized = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .try_init()
        .is_ok();

    if initialized {
        tracing::info!("{} parser v{}", config::APP_NAME, config::APP_VERSION);
    }
}
