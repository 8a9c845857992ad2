use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::{
    error::AppResult,
    models::{ItemId, Resource},
    services::providers::ItemResolver,
};

/// Resource catalog held in memory
#[derive(Default)]
pub struct InMemoryCatalog {
    resources: RwLock<HashMap<ItemId, Resource>>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a resource, returning the previous record if any
    pub async fn upsert(&self, resource: Resource) -> Option<Resource> {
        self.resources.write().await.insert(resource.id, resource)
    }

    pub async fn get(&self, id: ItemId) -> Option<Resource> {
        self.resources.read().await.get(&id).cloned()
    }

    /// All resources ordered by id
    pub async fn list(&self) -> Vec<Resource> {
        let mut resources: Vec<Resource> = self.resources.read().await.values().cloned().collect();
        resources.sort_by_key(|r| r.id);
        resources
    }
}

#[async_trait::async_trait]
impl ItemResolver for InMemoryCatalog {
    async fn resolve(&self, ids: &[ItemId]) -> AppResult<Vec<Resource>> {
        let resources = self.resources.read().await;
        let resolved: Vec<Resource> = ids
            .iter()
            .filter_map(|id| resources.get(id).cloned())
            .collect();

        if resolved.len() < ids.len() {
            tracing::debug!(
                requested = ids.len(),
                resolved = resolved.len(),
                "Some recommended items are not in the catalog"
            );
        }

        Ok(resolved)
    }

    fn name(&self) -> &'static str {
        "in_memory_catalog"
    }
}
