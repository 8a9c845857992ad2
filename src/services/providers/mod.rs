//! Collaborators around the recommender core
//!
//! The core only produces item ids. Turning them into displayable resources and
//! supplying a default list when personalization yields nothing are separate
//! concerns with pluggable backing stores.

use crate::{
    error::AppResult,
    models::{ItemId, Resource},
};

pub mod catalog;
pub mod popularity;

pub use catalog::InMemoryCatalog;
pub use popularity::PopularityFallback;

/// Resolves item ids to resource records
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait ItemResolver: Send + Sync {
    /// Returns the known resources among `ids`, preserving their order
    ///
    /// Unknown ids are skipped rather than reported.
    async fn resolve(&self, ids: &[ItemId]) -> AppResult<Vec<Resource>>;

    /// Resolver name for logging and debugging
    fn name(&self) -> &'static str;
}

/// Supplies a ranked default list used when no recommendation can be made
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait FallbackProvider: Send + Sync {
    async fn fallback_items(&self, limit: usize) -> AppResult<Vec<ItemId>>;

    /// Provider name for logging and debugging
    fn name(&self) -> &'static str;
}
