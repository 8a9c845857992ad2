use std::sync::Arc;

use tokio::sync::RwLock;

use crate::config::Config;
use crate::db::Cache;
use crate::services::{
    behavior::RatingStore,
    providers::{InMemoryCatalog, PopularityFallback},
    recommendations::RecommendationService,
};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Behavior log and the versioned rating snapshot built from it
    pub store: Arc<RwLock<RatingStore>>,
    pub catalog: Arc<InMemoryCatalog>,
    pub recommendations: RecommendationService,
    pub default_neighbors: usize,
    pub default_top_n: usize,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(&Config::default())
    }
}

impl AppState {
    /// Creates an empty state with in-memory collaborators and no cache
    pub fn new(config: &Config) -> Self {
        let store = Arc::new(RwLock::new(RatingStore::new()));
        let catalog = Arc::new(InMemoryCatalog::new());
        let fallback = Arc::new(PopularityFallback::new(Arc::clone(&store)));
        let recommendations =
            RecommendationService::new(Arc::clone(&store), catalog.clone(), fallback);

        Self {
            store,
            catalog,
            recommendations,
            default_neighbors: config.default_neighbors,
            default_top_n: config.default_top_n,
        }
    }

    /// Enables caching of personalized recommendation lists
    pub fn with_cache(mut self, cache: Cache, ttl: u64) -> Self {
        self.recommendations = self.recommendations.with_cache(cache, ttl);
        self
    }
}
