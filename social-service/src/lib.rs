pub mod config;
pub mod db;
pub mod domain;
pub mod error;
pub mod repository;
pub mod services;

/// Install the global tracing subscriber. Embedders and integration tests
/// call this once; repeated calls are no-ops.
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
