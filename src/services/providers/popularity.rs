use std::sync::Arc;
use tokio::sync::RwLock;

use crate::{
    error::AppResult,
    models::ItemId,
    services::{behavior::RatingStore, providers::FallbackProvider},
};

/// "Hot items" fallback: the most interacted-with resources
#[derive(Clone)]
pub struct PopularityFallback {
    store: Arc<RwLock<RatingStore>>,
}

impl PopularityFallback {
    pub fn new(store: Arc<RwLock<RatingStore>>) -> Self {
        Self { store }
    }
}

#[async_trait::async_trait]
impl FallbackProvider for PopularityFallback {
    async fn fallback_items(&self, limit: usize) -> AppResult<Vec<ItemId>> {
        Ok(self.store.read().await.hot_items(limit))
    }

    fn name(&self) -> &'static str {
        "popularity"
    }
}
