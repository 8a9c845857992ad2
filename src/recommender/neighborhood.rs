use serde::Serialize;
use std::cmp::Ordering;

use crate::models::UserId;

use super::similarity::SimilarityTable;

/// A neighbor of the target user together with its similarity
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Neighbor {
    pub user: UserId,
    pub similarity: f64,
}

/// Neighbors ordered by descending similarity, ties broken by ascending id
pub type Neighborhood = Vec<Neighbor>;

/// Orders by similarity descending, then user id ascending
pub(crate) fn by_similarity_then_id(a: &Neighbor, b: &Neighbor) -> Ordering {
    // + 0.0 folds -0.0 into 0.0 so the two still tie
    (b.similarity + 0.0)
        .total_cmp(&(a.similarity + 0.0))
        .then_with(|| a.user.cmp(&b.user))
}

/// Returns the `k` users most similar to `target`
///
/// An unknown target yields an empty neighborhood (cold start). The target
/// itself is never part of the result, even if the table somehow holds a
/// self-entry.
pub fn k_nearest_neighbors(target: UserId, table: &SimilarityTable, k: usize) -> Neighborhood {
    let Some(row) = table.row(target) else {
        return Vec::new();
    };

    let mut neighbors: Neighborhood = row
        .iter()
        .filter(|(&user, _)| user != target)
        .map(|(&user, &similarity)| Neighbor { user, similarity })
        .collect();

    neighbors.sort_by(by_similarity_then_id);
    neighbors.truncate(k);
    neighbors
}
