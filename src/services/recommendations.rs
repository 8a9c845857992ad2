use std::sync::Arc;
use std::time::Instant;

use tokio::sync::RwLock;

use crate::{
    cached,
    db::{Cache, CacheKey},
    error::{AppError, AppResult},
    models::{ItemId, RecommendationResponse, RecommendationSource, UserId},
    recommender::{self, Explanation, Limits, RatingMatrix},
    services::{
        behavior::RatingStore,
        providers::{FallbackProvider, ItemResolver},
    },
};

/// Personalized resource recommendations
///
/// Runs the collaborative-filtering core on the current rating snapshot,
/// resolves the returned ids to resources, and switches to the fallback list
/// when the core has nothing to offer (cold start, no neighbors, nothing
/// unseen).
#[derive(Clone)]
pub struct RecommendationService {
    store: Arc<RwLock<RatingStore>>,
    resolver: Arc<dyn ItemResolver>,
    fallback: Arc<dyn FallbackProvider>,
    cache: Option<Cache>,
    cache_ttl: u64,
}

impl RecommendationService {
    pub fn new(
        store: Arc<RwLock<RatingStore>>,
        resolver: Arc<dyn ItemResolver>,
        fallback: Arc<dyn FallbackProvider>,
    ) -> Self {
        Self {
            store,
            resolver,
            fallback,
            cache: None,
            cache_ttl: 0,
        }
    }

    /// Caches personalized id lists per store epoch and snapshot version
    pub fn with_cache(mut self, cache: Cache, ttl: u64) -> Self {
        self.cache = Some(cache);
        self.cache_ttl = ttl;
        self
    }

    /// Recommends resources for `user`, falling back to popular ones
    pub async fn recommend(
        &self,
        user: UserId,
        limits: Limits,
    ) -> AppResult<RecommendationResponse> {
        let start = Instant::now();
        let (snapshot, epoch, snapshot_version) = self.store.read().await.snapshot();

        let ids = match &self.cache {
            Some(cache) => {
                let key = CacheKey::Recommendations {
                    epoch,
                    snapshot_version,
                    user,
                    k: limits.k,
                    n: limits.n,
                };
                cached!(
                    cache,
                    key,
                    self.cache_ttl,
                    Self::personalized_ids(snapshot, user, limits)
                )?
            }
            None => Self::personalized_ids(snapshot, user, limits).await?,
        };

        let (source, ids) = if ids.is_empty() {
            tracing::info!(
                user_id = %user,
                fallback = self.fallback.name(),
                "No personalized recommendations, using fallback"
            );
            let fallback_ids = self.fallback.fallback_items(limits.n).await?;
            (RecommendationSource::Fallback, fallback_ids)
        } else {
            (RecommendationSource::Personalized, ids)
        };

        let resources = self.resolver.resolve(&ids).await?;

        tracing::info!(
            user_id = %user,
            source = ?source,
            recommended = resources.len(),
            snapshot_version,
            processing_time_ms = start.elapsed().as_millis(),
            "Recommendations generated"
        );

        Ok(RecommendationResponse {
            user_id: user,
            source,
            snapshot_version,
            resources,
        })
    }

    /// Neighbors, predictions and ranking behind a recommendation
    pub async fn explain(&self, user: UserId, limits: Limits) -> AppResult<(Explanation, u64)> {
        let (snapshot, _, snapshot_version) = self.store.read().await.snapshot();
        let explanation = run_blocking(snapshot, move |matrix| {
            recommender::explain(user, matrix, limits.k, limits.n)
        })
        .await?;
        Ok((explanation, snapshot_version))
    }

    async fn personalized_ids(
        snapshot: Arc<RatingMatrix>,
        user: UserId,
        limits: Limits,
    ) -> AppResult<Vec<ItemId>> {
        run_blocking(snapshot, move |matrix| {
            recommender::recommend(user, matrix, limits.k, limits.n)
        })
        .await
    }
}

/// Runs CPU-bound work on a snapshot without stalling the async runtime
async fn run_blocking<T, F>(snapshot: Arc<RatingMatrix>, f: F) -> AppResult<T>
where
    T: Send + 'static,
    F: FnOnce(&RatingMatrix) -> T + Send + 'static,
{
    tokio::task::spawn_blocking(move || f(&snapshot))
        .await
        .map_err(|e| AppError::Internal(format!("Recommendation task failed: {}", e)))
}
