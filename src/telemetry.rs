//! Tracing setup and the metrics counter registry.
//!
//! Metrics are monotonically increasing counters kept out of the decision
//! logic: the orchestrator records into [`Metrics`] as an explicit side
//! channel, and the transport layer serves a [`MetricsSnapshot`] over HTTP.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;
use tracing_subscriber::EnvFilter;

/// Initializes the global tracing subscriber.
///
/// Filter defaults to `askd=info,tower_http=info` and is overridable via
/// `RUST_LOG`.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "askd=info,tower_http=info".into()),
        )
        .init();
}

/// Counter registry for the query pipeline.
///
/// Counter names are the observable contract; all are monotonic.
#[derive(Debug, Default)]
pub struct Metrics {
    tokens_in_llm: AtomicU64,
    tokens_out_llm: AtomicU64,
    tokens_in_cache: AtomicU64,
    tokens_out_cache: AtomicU64,
    cant_answer: AtomicU64,
}

/// Point-in-time view of all counters, served by the metrics endpoint.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct MetricsSnapshot {
    /// Query tokens consumed on the generation path.
    pub tokens_in_llm: u64,
    /// Response tokens produced on the generation path.
    pub tokens_out_llm: u64,
    /// Query tokens answered from the cache.
    pub tokens_in_cache: u64,
    /// Response tokens served from the cache.
    pub tokens_out_cache: u64,
    /// Responses that ended in the fallback sentinel.
    pub cant_answer: u64,
}

impl Metrics {
    /// Creates a registry with all counters at zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records token counts for a generation-path query/response pair.
    pub fn add_llm_tokens(&self, tokens_in: u64, tokens_out: u64) {
        self.tokens_in_llm.fetch_add(tokens_in, Ordering::Relaxed);
        self.tokens_out_llm.fetch_add(tokens_out, Ordering::Relaxed);
    }

    /// Records token counts for a cache-hit query/response pair.
    pub fn add_cache_tokens(&self, tokens_in: u64, tokens_out: u64) {
        self.tokens_in_cache.fetch_add(tokens_in, Ordering::Relaxed);
        self.tokens_out_cache
            .fetch_add(tokens_out, Ordering::Relaxed);
    }

    /// Increments the cannot-answer counter.
    pub fn incr_cant_answer(&self) {
        self.cant_answer.fetch_add(1, Ordering::Relaxed);
    }

    /// Returns a consistent-enough snapshot of all counters.
    #[must_use]
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            tokens_in_llm: self.tokens_in_llm.load(Ordering::Relaxed),
            tokens_out_llm: self.tokens_out_llm.load(Ordering::Relaxed),
            tokens_in_cache: self.tokens_in_cache.load(Ordering::Relaxed),
            tokens_out_cache: self.tokens_out_cache.load(Ordering::Relaxed),
            cant_answer: self.cant_answer.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_accumulate() {
        let metrics = Metrics::new();
        metrics.add_llm_tokens(10, 20);
        metrics.add_llm_tokens(1, 2);
        metrics.add_cache_tokens(5, 7);
        metrics.incr_cant_answer();

        let snap = metrics.snapshot();
        assert_eq!(snap.tokens_in_llm, 11);
        assert_eq!(snap.tokens_out_llm, 22);
        assert_eq!(snap.tokens_in_cache, 5);
        assert_eq!(snap.tokens_out_cache, 7);
        assert_eq!(snap.cant_answer, 1);
    }

    #[test]
    fn test_snapshot_serializes_contract_names() {
        let metrics = Metrics::new();
        let json = serde_json::to_string(&metrics.snapshot()).unwrap_or_default();
        for name in [
            "tokens_in_llm",
            "tokens_out_llm",
            "tokens_in_cache",
            "tokens_out_cache",
            "cant_answer",
        ] {
            assert!(json.contains(name), "missing counter {name}");
        }
    }
}
