//! User-based collaborative filtering.
//!
//! Everything in here is a pure, synchronous function of a ratings snapshot:
//! similarities are recomputed on every call and nothing is cached or
//! mutated. The pipeline is
//!
//! ```text
//! RatingSource → all_pairwise_similarities → k_nearest_neighbors → predict → top_n
//! ```
//!
//! Degenerate data (unknown user, no overlap, zero-weight candidates) produces
//! empty results, never errors. Only caller misuse is an error.

use serde::Serialize;
use thiserror::Error;

use crate::models::{ItemId, UserId};

pub mod neighborhood;
pub mod predictor;
pub mod ratings;
pub mod similarity;
pub mod top_n;

pub use neighborhood::{k_nearest_neighbors, Neighbor, Neighborhood};
pub use predictor::{predict, PredictionSet};
pub use ratings::{ItemRatings, RatingMatrix, RatingSource};
pub use similarity::{all_pairwise_similarities, similarity, SimilarityTable};
pub use top_n::top_n;

/// Error types for the recommender
#[derive(Debug, Error, PartialEq)]
pub enum RecommendError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Rating for user {user} on item {item} is not finite: {value}")]
    NonFiniteRating { user: UserId, item: ItemId, value: f64 },
}

/// Validated neighborhood size and list length
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Limits {
    pub k: usize,
    pub n: usize,
}

impl Limits {
    /// Checks signed caller input; negative values are rejected, zero is allowed
    pub fn new(k: i64, n: i64) -> Result<Self, RecommendError> {
        let k = usize::try_from(k)
            .map_err(|_| RecommendError::InvalidArgument(format!("k must be >= 0, got {}", k)))?;
        let n = usize::try_from(n)
            .map_err(|_| RecommendError::InvalidArgument(format!("n must be >= 0, got {}", n)))?;
        Ok(Self { k, n })
    }
}

/// Intermediate results of one recommendation run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Explanation {
    pub neighbors: Neighborhood,
    /// Predictions sorted the same way as `recommended`
    pub predictions: Vec<(ItemId, f64)>,
    pub recommended: Vec<ItemId>,
}

/// Runs the whole pipeline and keeps every intermediate result
pub fn explain<S>(target: UserId, source: &S, k: usize, n: usize) -> Explanation
where
    S: RatingSource + Sync + ?Sized,
{
    if source.ratings_of(target).is_none() {
        tracing::debug!(user = %target, "Target user has no ratings row");
        return Explanation {
            neighbors: Vec::new(),
            predictions: Vec::new(),
            recommended: Vec::new(),
        };
    }

    let table = all_pairwise_similarities(source);
    let neighbors = k_nearest_neighbors(target, &table, k);
    let predictions = predict(target, &neighbors, source);
    let recommended = top_n(&predictions, n);

    Explanation {
        neighbors,
        predictions: top_n::ranked(&predictions),
        recommended,
    }
}

/// Recommends up to `n` unseen items for `target` from its `k` nearest users
///
/// Returns an empty list for an unknown user, a user without neighbors, or
/// when no candidate gets a prediction. Falling back to popular items is up to
/// the caller.
pub fn recommend<S>(target: UserId, source: &S, k: usize, n: usize) -> Vec<ItemId>
where
    S: RatingSource + Sync + ?Sized,
{
    explain(target, source, k, n).recommended
}
