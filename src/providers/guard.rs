//! Timeout, concurrency-limit and response-cache wrappers around the capability traits.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;
use tracing::{debug, warn};
use xxhash_rust::xxh3::Xxh3;

use crate::core::config::ProviderConfig;
use crate::core::errors::{Result, ScrivenerError};

use super::{CompletionOptions, EmbeddingCapability, LanguageModel};

/// Counters for calls routed through a guard.
#[derive(Debug, Default)]
struct CallCounters {
    issued: AtomicUsize,
    cache_hits: AtomicUsize,
    failures: AtomicUsize,
}

/// Snapshot of guard call statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallStats {
    /// Calls forwarded to the provider
    pub issued: usize,
    /// Calls answered from the response cache
    pub cache_hits: usize,
    /// Forwarded calls that failed or timed out
    pub failures: usize,
}

impl CallCounters {
    fn snapshot(&self) -> CallStats {
        CallStats {
            issued: self.issued.load(Ordering::Relaxed),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
        }
    }
}

/// A cached response with its access stamp.
struct CachedResponse {
    text: String,
    last_used: AtomicU64,
}

/// Bounded LLM-response cache keyed by a hash of prompt and options.
struct ResponseCache {
    entries: DashMap<u64, CachedResponse>,
    max_entries: usize,
    tick: AtomicU64,
}

impl ResponseCache {
    fn new(max_entries: usize) -> Self {
        Self {
            entries: DashMap::new(),
            max_entries: max_entries.max(1),
            tick: AtomicU64::new(0),
        }
    }

    fn next_tick(&self) -> u64 {
        self.tick.fetch_add(1, Ordering::Relaxed)
    }

    fn get(&self, key: u64) -> Option<String> {
        self.entries.get(&key).map(|entry| {
            entry.last_used.store(self.next_tick(), Ordering::Relaxed);
            entry.text.clone()
        })
    }

    /// Inserts a response; when full, the least recently used half goes first.
    fn insert(&self, key: u64, response: String) {
        if !self.entries.contains_key(&key) && self.entries.len() >= self.max_entries {
            let mut by_age: Vec<(u64, u64)> = self
                .entries
                .iter()
                .map(|entry| (entry.last_used.load(Ordering::Relaxed), *entry.key()))
                .collect();
            by_age.sort_unstable();
            for (_, stale) in by_age.into_iter().take(self.max_entries / 2 + 1) {
                self.entries.remove(&stale);
            }
        }
        let entry = CachedResponse {
            text: response,
            last_used: AtomicU64::new(self.next_tick()),
        };
        self.entries.insert(key, entry);
    }

    fn key(prompt: &str, options: &CompletionOptions) -> u64 {
        let mut hasher = Xxh3::new();
        hasher.update(&options.temperature.to_bits().to_le_bytes());
        hasher.update(&options.max_output_tokens.to_le_bytes());
        hasher.update(&[u8::from(options.json_response)]);
        hasher.update(prompt.as_bytes());
        hasher.digest()
    }
}

/// Language model wrapper that enforces a timeout, bounds concurrent calls
/// and caches responses.
pub struct GuardedLanguageModel {
    inner: Arc<dyn LanguageModel>,
    timeout: Duration,
    cache: Option<ResponseCache>,
    permits: Semaphore,
    counters: CallCounters,
}

impl GuardedLanguageModel {
    /// Wrap a provider with the timeout and cache settings from configuration.
    pub fn new(inner: Arc<dyn LanguageModel>, config: &ProviderConfig) -> Self {
        let cache = (config.response_cache_entries > 0)
            .then(|| ResponseCache::new(config.response_cache_entries));
        Self {
            inner,
            timeout: Duration::from_millis(config.llm_timeout_ms),
            cache,
            permits: Semaphore::new(config.max_concurrent_calls.max(1)),
            counters: CallCounters::default(),
        }
    }

    /// Wrap a provider with an explicit timeout and no response cache.
    pub fn with_timeout(inner: Arc<dyn LanguageModel>, timeout: Duration) -> Self {
        Self {
            inner,
            timeout,
            cache: None,
            permits: Semaphore::new(Semaphore::MAX_PERMITS),
            counters: CallCounters::default(),
        }
    }

    /// Statistics for calls routed through this guard.
    pub fn stats(&self) -> CallStats {
        self.counters.snapshot()
    }

    /// Drop every cached response.
    pub fn clear_cache(&self) {
        if let Some(cache) = &self.cache {
            cache.entries.clear();
        }
    }
}

#[async_trait]
impl LanguageModel for GuardedLanguageModel {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn complete(&self, prompt: &str, options: &CompletionOptions) -> Result<String> {
        let key = ResponseCache::key(prompt, options);
        if let Some(cached) = self.cache.as_ref().and_then(|cache| cache.get(key)) {
            self.counters.cache_hits.fetch_add(1, Ordering::Relaxed);
            debug!(provider = self.inner.name(), "LLM response cache hit");
            return Ok(cached);
        }

        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| ScrivenerError::internal("LLM call limiter closed"))?;
        self.counters.issued.fetch_add(1, Ordering::Relaxed);
        let outcome = tokio::time::timeout(self.timeout, self.inner.complete(prompt, options)).await;
        let response = match outcome {
            Ok(Ok(response)) => response,
            Ok(Err(err)) => {
                self.counters.failures.fetch_add(1, Ordering::Relaxed);
                return Err(err);
            }
            Err(_) => {
                self.counters.failures.fetch_add(1, Ordering::Relaxed);
                warn!(
                    provider = self.inner.name(),
                    timeout_ms = self.timeout.as_millis() as u64,
                    "LLM completion timed out"
                );
                return Err(ScrivenerError::timeout(
                    format!("{} completion", self.inner.name()),
                    self.timeout.as_millis() as u64,
                ));
            }
        };

        if let Some(cache) = &self.cache {
            cache.insert(key, response.clone());
        }
        Ok(response)
    }
}

/// Embedding wrapper that enforces a timeout.
pub struct GuardedEmbedder {
    inner: Arc<dyn EmbeddingCapability>,
    timeout: Duration,
    counters: CallCounters,
}

impl GuardedEmbedder {
    /// Wrap an embedder with the timeout from configuration.
    pub fn new(inner: Arc<dyn EmbeddingCapability>, config: &ProviderConfig) -> Self {
        Self::with_timeout(inner, Duration::from_millis(config.embedding_timeout_ms))
    }

    /// Wrap an embedder with an explicit timeout.
    pub fn with_timeout(inner: Arc<dyn EmbeddingCapability>, timeout: Duration) -> Self {
        Self {
            inner,
            timeout,
            counters: CallCounters::default(),
        }
    }

    /// Statistics for calls routed through this guard.
    pub fn stats(&self) -> CallStats {
        self.counters.snapshot()
    }
}

#[async_trait]
impl EmbeddingCapability for GuardedEmbedder {
    fn dimension(&self) -> usize {
        self.inner.dimension()
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        self.counters.issued.fetch_add(1, Ordering::Relaxed);
        match tokio::time::timeout(self.timeout, self.inner.embed(texts)).await {
            Ok(Ok(vectors)) if vectors.len() == texts.len() => Ok(vectors),
            Ok(Ok(vectors)) => {
                self.counters.failures.fetch_add(1, Ordering::Relaxed);
                Err(ScrivenerError::Embedding {
                    message: format!(
                        "provider returned {} vectors for {} texts",
                        vectors.len(),
                        texts.len()
                    ),
                    batch_size: Some(texts.len()),
                })
            }
            Ok(Err(err)) => {
                self.counters.failures.fetch_add(1, Ordering::Relaxed);
                Err(err)
            }
            Err(_) => {
                self.counters.failures.fetch_add(1, Ordering::Relaxed);
                Err(ScrivenerError::timeout(
                    "embedding batch",
                    self.timeout.as_millis() as u64,
                ))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EchoModel {
        calls: AtomicUsize,
        delay: Duration,
    }

    #[async_trait]
    impl LanguageModel for EchoModel {
        fn name(&self) -> &str {
            "echo"
        }

        async fn complete(&self, prompt: &str, _options: &CompletionOptions) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            Ok(format!("echo:{prompt}"))
        }
    }

    fn echo(delay: Duration) -> Arc<EchoModel> {
        Arc::new(EchoModel {
            calls: AtomicUsize::new(0),
            delay,
        })
    }

    #[tokio::test]
    async fn identical_prompts_hit_the_response_cache() {
        let model = echo(Duration::ZERO);
        let guard = GuardedLanguageModel::new(model.clone(), &ProviderConfig::default());
        let options = CompletionOptions::default();

        let first = guard.complete("hello", &options).await.unwrap();
        let second = guard.complete("hello", &options).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(model.calls.load(Ordering::SeqCst), 1);
        assert_eq!(guard.stats().cache_hits, 1);
    }

    #[tokio::test]
    async fn options_are_part_of_the_cache_key() {
        let model = echo(Duration::ZERO);
        let guard = GuardedLanguageModel::new(model.clone(), &ProviderConfig::default());

        guard
            .complete("hello", &CompletionOptions::json(0.1))
            .await
            .unwrap();
        guard
            .complete("hello", &CompletionOptions::json(0.9))
            .await
            .unwrap();

        assert_eq!(model.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn slow_provider_times_out() {
        let model = echo(Duration::from_millis(200));
        let guard = GuardedLanguageModel::with_timeout(model, Duration::from_millis(10));

        let err = guard
            .complete("hello", &CompletionOptions::default())
            .await
            .unwrap_err();

        assert!(matches!(err, ScrivenerError::Timeout { .. }));
        assert_eq!(guard.stats().failures, 1);
    }

    struct PeakModel {
        in_flight: AtomicUsize,
        peak: AtomicUsize,
    }

    #[async_trait]
    impl LanguageModel for PeakModel {
        fn name(&self) -> &str {
            "peak"
        }

        async fn complete(&self, prompt: &str, _options: &CompletionOptions) -> Result<String> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(20)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            Ok(prompt.to_string())
        }
    }

    #[tokio::test]
    async fn concurrent_calls_are_bounded() {
        let model = Arc::new(PeakModel {
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        });
        let config = ProviderConfig {
            max_concurrent_calls: 2,
            response_cache_entries: 0,
            ..ProviderConfig::default()
        };
        let guard = GuardedLanguageModel::new(model.clone(), &config);
        let options = CompletionOptions::default();

        let prompts: Vec<String> = (0..6).map(|i| format!("p{i}")).collect();
        let replies = futures::future::join_all(
            prompts.iter().map(|prompt| guard.complete(prompt, &options)),
        )
        .await;

        assert!(replies.iter().all(Result::is_ok));
        assert_eq!(model.peak.load(Ordering::SeqCst), 2);
        assert_eq!(guard.stats().issued, 6);
    }

    #[test]
    fn response_cache_evicts_at_capacity() {
        let cache = ResponseCache::new(4);
        for key in 0..4 {
            cache.insert(key, format!("r{key}"));
        }
        cache.insert(99, "new".to_string());
        assert!(cache.entries.len() <= 4);
        assert_eq!(cache.get(99).as_deref(), Some("new"));
    }

    #[test]
    fn response_cache_evicts_least_recently_used_first() {
        let cache = ResponseCache::new(4);
        for key in 0..4 {
            cache.insert(key, format!("r{key}"));
        }
        assert_eq!(cache.get(0).as_deref(), Some("r0"));

        cache.insert(99, "new".to_string());

        assert_eq!(cache.get(0).as_deref(), Some("r0"));
        assert!(cache.get(1).is_none());
        assert!(cache.get(2).is_none());
        assert_eq!(cache.get(99).as_deref(), Some("new"));
    }
}
