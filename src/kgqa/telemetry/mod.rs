use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize logging.
///
/// Configures `tracing-subscriber::fmt` with an `EnvFilter` read from
/// `RUST_LOG`, falling back to `info` globally and `debug` for this crate
/// (which includes per-candidate scores and extracted mentions).
pub fn init() {
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_thread_ids(true)
        .with_line_number(true)
        .compact();

    let filter_layer = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,graph_template_qa=debug"));

    // try_init: tests and the one-shot CLI may both install a subscriber.
    let _ = tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .try_init();
}
