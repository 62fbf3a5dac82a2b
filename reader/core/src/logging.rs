//! Tracing initialization for host applications.

/// Initialize a `tracing` subscriber with an env-filter.
///
/// Honors `RUST_LOG`; defaults to `reader_core=info`. Safe to call more than
/// once - later calls are no-ops.
pub fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("reader_core=info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init();
}
