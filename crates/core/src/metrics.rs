//! Prometheus metrics for the media cache.

use crate::Error;
use prometheus::{Encoder, IntGauge, Registry, TextEncoder};
use std::sync::{LazyLock, Once};

/// Global Prometheus registry for all metrics.
pub static REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

/// Rows in `cache_entries`. Set from a full count when a cache opens and
/// adjusted on every successful write after that.
pub static CACHE_ENTRIES: LazyLock<IntGauge> = LazyLock::new(|| {
    IntGauge::new("hoardcache_db_cache_entries", "Number of cache entries in the database")
        .expect("metric creation failed")
});

static REGISTER_ONCE: Once = Once::new();

/// Register all metrics with the global registry.
///
/// Subsequent calls after the first are no-ops.
pub fn register_metrics() {
    REGISTER_ONCE.call_once(|| {
        REGISTRY
            .register(Box::new(CACHE_ENTRIES.clone()))
            .expect("metric registration failed");
    });
}

/// Current metrics in the Prometheus text exposition format.
pub fn render() -> Result<String, Error> {
    let mut buffer = Vec::new();
    TextEncoder::new().encode(&REGISTRY.gather(), &mut buffer)?;
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}
