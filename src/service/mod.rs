//! Imaging Cache Service
//!
//! The façade the portal talks to. Composes the store, metrics, retry loop,
//! in-flight registry and prefetch scheduler behind four operations:
//! `get_study`, `clear_cache`, `get_metrics` and `get_config`.

mod inflight;
mod prefetch;

use std::sync::{Arc, PoisonError, RwLock as StdRwLock};

use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::cache::{CacheStore, Metrics, MetricsCollector};
use crate::config::{CacheConfig, PartialCacheConfig};
use crate::error::{ImagingError, Result};
use crate::fetch::{
    AttemptError, RawResponse, RetryExecutor, RetryPolicy, StudyFetcher, TokenProvider,
};
use crate::models::{decode_study, ImagingStudy};

pub use inflight::{Flight, InflightRegistry, LeaderGuard};
pub use prefetch::PrefetchScheduler;

// == Imaging Cache Service ==
/// Cheaply cloneable handle to one cache instance.
///
/// Clones share the same store and counters. Construct one per application
/// scope and pass it to consumers.
#[derive(Clone)]
pub struct ImagingCacheService {
    inner: Arc<ServiceInner>,
}

struct ServiceInner {
    config: StdRwLock<CacheConfig>,
    store: RwLock<CacheStore>,
    metrics: MetricsCollector,
    retry: RetryExecutor,
    fetcher: Arc<dyn StudyFetcher>,
    tokens: Arc<dyn TokenProvider>,
    inflight: InflightRegistry,
    prefetch: PrefetchScheduler,
}

impl ImagingCacheService {
    // == Constructor ==
    /// Creates a service; unset config fields take their defaults.
    pub fn new(
        config: PartialCacheConfig,
        fetcher: Arc<dyn StudyFetcher>,
        tokens: Arc<dyn TokenProvider>,
    ) -> Self {
        Self::with_retry_policy(config, fetcher, tokens, RetryPolicy::default())
    }

    /// Same as [`new`](Self::new) with an explicit retry schedule.
    pub fn with_retry_policy(
        config: PartialCacheConfig,
        fetcher: Arc<dyn StudyFetcher>,
        tokens: Arc<dyn TokenProvider>,
        policy: RetryPolicy,
    ) -> Self {
        let config = CacheConfig::from_partial(config);
        let store = CacheStore::new(config.max_cache_bytes(), config.max_age());

        Self {
            inner: Arc::new(ServiceInner {
                config: StdRwLock::new(config),
                store: RwLock::new(store),
                metrics: MetricsCollector::new(),
                retry: RetryExecutor::new(policy),
                fetcher,
                tokens,
                inflight: InflightRegistry::new(),
                prefetch: PrefetchScheduler::new(),
            }),
        }
    }

    // == Get Study ==
    /// Returns the study, from cache when fresh, otherwise from the remote API.
    ///
    /// Successful lookups may warm related studies in the background.
    pub async fn get_study(&self, study_id: &str, patient_id: &str) -> Result<ImagingStudy> {
        let study = self.inner.lookup(study_id, patient_id).await?;
        self.schedule_prefetch(&study, patient_id).await;
        Ok(study)
    }

    // == Clear Cache ==
    /// Drops every cached study. Metrics counters are kept.
    pub async fn clear_cache(&self) -> usize {
        let cleared = self.inner.store.write().await.clear();
        info!(cleared, "imaging cache cleared");
        cleared
    }

    // == Get Metrics ==
    pub async fn get_metrics(&self) -> Metrics {
        let mut metrics = self.inner.metrics.snapshot();
        let store = self.inner.store.read().await;
        metrics.total_cached_studies = store.len();
        metrics.cache_size_bytes = store.total_size();
        metrics.evictions = store.evictions();
        metrics
    }

    // == Get Config ==
    /// Returns a copy of the active configuration.
    pub fn get_config(&self) -> CacheConfig {
        self.inner.config()
    }

    // == Update Config ==
    /// Merges `partial` over the active configuration and applies the new
    /// budget and TTL to the store at once.
    pub async fn update_config(&self, partial: PartialCacheConfig) -> CacheConfig {
        let mut store = self.inner.store.write().await;
        let updated = {
            let mut config = self
                .inner
                .config
                .write()
                .unwrap_or_else(PoisonError::into_inner);
            *config = config.merged(partial);
            config.clone()
        };

        let evicted = store.set_limits(updated.max_cache_bytes(), updated.max_age());
        info!(
            max_cache_size_mb = updated.max_cache_size,
            max_study_age_min = updated.max_study_age,
            prefetch_enabled = updated.prefetch_enabled,
            evicted,
            "imaging cache reconfigured"
        );
        updated
    }

    // == Purge Expired ==
    /// Eagerly removes expired studies. Returns how many were dropped.
    pub async fn purge_expired(&self) -> usize {
        self.inner.store.write().await.purge_expired()
    }

    /// Waits for background prefetches submitted so far.
    pub async fn drain_prefetch(&self) {
        self.inner.prefetch.drain().await;
    }

    async fn schedule_prefetch(&self, study: &ImagingStudy, patient_id: &str) {
        let config = self.inner.config();
        if !config.prefetch_enabled {
            return;
        }

        for target in PrefetchScheduler::targets(study, config.prefetch_limit) {
            let inner = self.inner.clone();
            let patient_id = patient_id.to_string();
            debug!(study_id = %target, source = %study.id, "scheduling prefetch");

            self.inner
                .prefetch
                .submit(async move {
                    match inner.lookup(&target, &patient_id).await {
                        Ok(_) => debug!(study_id = %target, "prefetch complete"),
                        Err(err) => warn!(
                            study_id = %target,
                            kind = %err.kind(),
                            error = %err,
                            "prefetch failed"
                        ),
                    }
                })
                .await;
        }
    }
}

impl ServiceInner {
    fn config(&self) -> CacheConfig {
        self.config
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Cache-then-remote lookup shared by primary and prefetch requests.
    async fn lookup(&self, study_id: &str, patient_id: &str) -> Result<ImagingStudy> {
        if study_id.trim().is_empty() {
            return Err(ImagingError::InvalidRequest(
                "study id cannot be empty".to_string(),
            ));
        }
        if patient_id.trim().is_empty() {
            return Err(ImagingError::InvalidRequest(
                "patient id cannot be empty".to_string(),
            ));
        }

        if let Some(study) = self.store.write().await.get(study_id) {
            self.metrics.record_request(true);
            debug!(study_id, "cache hit");
            return Ok(study);
        }
        self.metrics.record_request(false);
        debug!(study_id, "cache miss");

        match self.inflight.join_or_lead(study_id) {
            Flight::Follower(mut outcome) => match outcome.recv().await {
                Ok(result) => result,
                Err(_) => {
                    debug!(study_id, "in-flight fetch abandoned, fetching directly");
                    self.fetch_and_store(study_id, patient_id).await
                }
            },
            Flight::Leader(guard) => {
                // a fetch may have landed between the miss and taking the lead
                let cached = self.store.write().await.get(study_id);
                let result = match cached {
                    Some(study) => Ok(study),
                    None => self.fetch_and_store(study_id, patient_id).await,
                };
                guard.complete(&result);
                result
            }
        }
    }

    async fn fetch_and_store(&self, study_id: &str, patient_id: &str) -> Result<ImagingStudy> {
        let token = self.tokens.bearer_token();

        let response = self
            .retry
            .execute(|attempt| self.attempt_fetch(study_id, patient_id, &token, attempt))
            .await
            .inspect_err(|err| {
                warn!(study_id, kind = %err.kind(), error = %err, "study fetch failed")
            })?;

        let study = decode_study(&response.body).inspect_err(|err| {
            warn!(study_id, kind = %err.kind(), error = %err, "malformed study response")
        })?;

        let size_bytes = study.estimated_size_bytes(self.config().compression_enabled);
        let evicted = self
            .store
            .write()
            .await
            .put(study_id.to_string(), study.clone(), size_bytes);

        info!(study_id, size_bytes, evicted, "cached study from imaging API");
        Ok(study)
    }

    async fn attempt_fetch(
        &self,
        study_id: &str,
        patient_id: &str,
        token: &str,
        attempt: u32,
    ) -> std::result::Result<RawResponse, AttemptError> {
        debug!(study_id, attempt, "fetching study");
        let response = self
            .fetcher
            .fetch_study(study_id, patient_id, token)
            .await
            .map_err(|err| AttemptError::Transient(err.0))?;

        if !response.is_success() {
            let reason = if response.status_text.is_empty() {
                "Unknown status".to_string()
            } else {
                response.status_text.clone()
            };
            return Err(AttemptError::Permanent(ImagingError::ApiRequestFailed {
                status: response.status,
                reason,
            }));
        }

        Ok(response)
    }
}
