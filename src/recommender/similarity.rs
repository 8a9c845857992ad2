use rayon::prelude::*;
use std::collections::HashMap;

use crate::models::{ItemId, UserId};

use super::ratings::{ItemRatings, RatingSource};

/// Pairwise user similarities, stored in both directions
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SimilarityTable {
    rows: HashMap<UserId, HashMap<UserId, f64>>,
}

impl SimilarityTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `sim(a, b) = sim(b, a) = value`
    pub fn insert(&mut self, a: UserId, b: UserId, value: f64) {
        self.rows.entry(a).or_default().insert(b, value);
        self.rows.entry(b).or_default().insert(a, value);
    }

    /// Similarity between two distinct users, if recorded
    pub fn get(&self, a: UserId, b: UserId) -> Option<f64> {
        self.rows.get(&a).and_then(|row| row.get(&b)).copied()
    }

    /// Every recorded similarity to `user`, or `None` for an unknown user
    pub fn row(&self, user: UserId) -> Option<&HashMap<UserId, f64>> {
        self.rows.get(&user)
    }

    pub fn user_count(&self) -> usize {
        self.rows.len()
    }
}

/// Cosine similarity restricted to the items both users rated
///
/// The norms are taken over the shared items only, not over each user's full
/// rating vector. Returns 0.0 for an empty intersection or when either side's
/// shared ratings are all zero.
pub fn similarity(a: &ItemRatings, b: &ItemRatings) -> f64 {
    let mut shared: Vec<(ItemId, f64, f64)> = if a.len() <= b.len() {
        a.iter()
            .filter_map(|(item, &ra)| b.get(item).map(|&rb| (*item, ra, rb)))
            .collect()
    } else {
        b.iter()
            .filter_map(|(item, &rb)| a.get(item).map(|&ra| (*item, ra, rb)))
            .collect()
    };

    if shared.is_empty() {
        return 0.0;
    }

    // Sum in item order so sim(a, b) and sim(b, a) agree bit for bit
    shared.sort_unstable_by_key(|&(item, _, _)| item);

    // Cosine is scale invariant; dividing each side by its largest shared
    // magnitude keeps every square in [0, 1] so no finite input overflows
    let max_a = shared.iter().fold(0.0_f64, |m, &(_, ra, _)| m.max(ra.abs()));
    let max_b = shared.iter().fold(0.0_f64, |m, &(_, _, rb)| m.max(rb.abs()));
    if max_a == 0.0 || max_b == 0.0 {
        return 0.0;
    }

    let mut dot = 0.0;
    let mut norm_a = 0.0;
    let mut norm_b = 0.0;
    for (_, ra, rb) in shared {
        let (ra, rb) = (ra / max_a, rb / max_b);
        dot += ra * rb;
        norm_a += ra * ra;
        norm_b += rb * rb;
    }

    // norms are at least 1 here, the largest entry scales to exactly 1
    let sim = dot / (norm_a.sqrt() * norm_b.sqrt());
    // rounding can leave the quotient a hair outside [-1, 1]; also folds -0.0
    sim.clamp(-1.0, 1.0) + 0.0
}

/// Computes the similarity of every unordered pair of users exactly once
///
/// Rows are spread over the rayon pool; each worker only reads the source and
/// returns its pairs, which are merged into the table afterwards. Every user
/// gets a row, so a lone user maps to an empty row rather than to nothing.
pub fn all_pairwise_similarities<S>(source: &S) -> SimilarityTable
where
    S: RatingSource + Sync + ?Sized,
{
    let ids = source.users();
    let users: &[UserId] = &ids;
    let empty = ItemRatings::new();
    let empty = &empty;

    let pairs: Vec<(UserId, UserId, f64)> = (0..users.len())
        .into_par_iter()
        .flat_map_iter(|i| {
            let a = users[i];
            let ratings_a = source.ratings_of(a).unwrap_or(empty);
            users[i + 1..].iter().map(move |&b| {
                let ratings_b = source.ratings_of(b).unwrap_or(empty);
                (a, b, similarity(ratings_a, ratings_b))
            })
        })
        .collect();

    let mut table = SimilarityTable::new();
    for &user in users {
        table.rows.entry(user).or_default();
    }
    for (a, b, value) in pairs {
        table.insert(a, b, value);
    }

    tracing::debug!(
        users = users.len(),
        pairs = users.len() * users.len().saturating_sub(1) / 2,
        "Computed pairwise similarities"
    );

    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recommender::RatingMatrix;
    use proptest::prelude::*;

    fn ratings(pairs: &[(u64, f64)]) -> ItemRatings {
        pairs.iter().map(|&(i, r)| (ItemId(i), r)).collect()
    }

    #[test]
    fn test_similarity_overlapping_users() {
        let user1 = ratings(&[(1, 5.0), (2, 4.0), (3, 3.0)]);
        let user2 = ratings(&[(1, 4.5), (2, 4.5), (4, 5.0)]);

        // dot = 40.5, norms over items 1 and 2 only
        let expected = 40.5 / (41.0_f64.sqrt() * 40.5_f64.sqrt());
        let sim = similarity(&user1, &user2);

        assert!((sim - expected).abs() < 1e-12);
        assert!((sim - 0.9939).abs() < 1e-4);
    }

    #[test]
    fn test_similarity_no_overlap_is_zero() {
        let user1 = ratings(&[(1, 5.0), (2, 4.0), (3, 3.0)]);
        let user3 = ratings(&[(5, 5.0)]);

        assert_eq!(similarity(&user1, &user3), 0.0);
    }

    #[test]
    fn test_similarity_zero_shared_ratings_is_zero() {
        let a = ratings(&[(1, 0.0), (2, 0.0), (3, 5.0)]);
        let b = ratings(&[(1, 3.0), (2, 4.0)]);

        assert_eq!(similarity(&a, &b), 0.0);
    }

    #[test]
    fn test_similarity_ignores_unshared_magnitude() {
        // identical on the shared item, wildly different elsewhere
        let a = ratings(&[(1, 2.0), (2, 5.0), (3, 5.0)]);
        let b = ratings(&[(1, 4.0)]);

        assert!((similarity(&a, &b) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_similarity_negative_ratings_can_be_negative() {
        let a = ratings(&[(1, 1.0), (2, 1.0)]);
        let b = ratings(&[(1, -1.0), (2, -1.0)]);

        assert!((similarity(&a, &b) + 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_all_pairwise_is_symmetric_and_complete() {
        let matrix = RatingMatrix::from_triples([
            (UserId(1), ItemId(1), 5.0),
            (UserId(1), ItemId(2), 4.0),
            (UserId(2), ItemId(1), 4.5),
            (UserId(2), ItemId(2), 4.5),
            (UserId(3), ItemId(5), 5.0),
        ])
        .unwrap();

        let table = all_pairwise_similarities(&matrix);

        assert_eq!(table.user_count(), 3);
        for a in 1..=3 {
            let row = table.row(UserId(a)).unwrap();
            assert_eq!(row.len(), 2);
            assert!(!row.contains_key(&UserId(a)));
            for b in 1..=3 {
                if a != b {
                    assert_eq!(table.get(UserId(a), UserId(b)), table.get(UserId(b), UserId(a)));
                }
            }
        }
        assert_eq!(table.get(UserId(1), UserId(3)), Some(0.0));
    }

    #[test]
    fn test_all_pairwise_single_user_has_empty_row() {
        let matrix = RatingMatrix::from_triples([(UserId(1), ItemId(1), 5.0)]).unwrap();

        let table = all_pairwise_similarities(&matrix);

        assert!(table.row(UserId(1)).unwrap().is_empty());
        assert!(table.row(UserId(2)).is_none());
    }

    #[test]
    fn test_similarity_huge_ratings_stay_bounded() {
        let a = ratings(&[(1, 1e200), (2, 1e200)]);
        let b = ratings(&[(1, 2e200), (2, 1e200)]);

        // same direction as (1, 1) vs (2, 1)
        let expected = 3.0 / (2.0_f64.sqrt() * 5.0_f64.sqrt());
        let sim = similarity(&a, &b);

        assert!(sim.is_finite());
        assert!((-1.0..=1.0).contains(&sim));
        assert!((sim - expected).abs() < 1e-12);
        assert_eq!(sim, similarity(&b, &a));
    }

    #[test]
    fn test_similarity_extreme_finite_ratings() {
        let a = ratings(&[(1, f64::MAX), (2, -f64::MAX)]);
        let b = ratings(&[(1, f64::MAX), (2, -f64::MAX)]);
        let tiny = ratings(&[(1, f64::MIN_POSITIVE), (2, f64::MIN_POSITIVE)]);

        assert!((similarity(&a, &b) - 1.0).abs() < 1e-12);
        assert!(similarity(&a, &tiny).abs() < 1e-12);
    }

    fn arb_ratings() -> impl Strategy<Value = ItemRatings> {
        prop::collection::hash_map((0u64..12).prop_map(ItemId), 0.0f64..=5.0, 0..8)
    }

    proptest! {
        #[test]
        fn prop_similarity_is_symmetric(a in arb_ratings(), b in arb_ratings()) {
            prop_assert_eq!(similarity(&a, &b), similarity(&b, &a));
        }

        #[test]
        fn prop_similarity_bounded_for_non_negative(a in arb_ratings(), b in arb_ratings()) {
            let sim = similarity(&a, &b);
            prop_assert!((0.0..=1.0 + 1e-12).contains(&sim));
        }

        #[test]
        fn prop_similarity_bounded_for_huge_magnitudes(
            a in prop::collection::hash_map((0u64..12).prop_map(ItemId), -1e200f64..=1e200, 0..8),
            b in prop::collection::hash_map((0u64..12).prop_map(ItemId), 1e190f64..=1e200, 0..8),
        ) {
            let sim = similarity(&a, &b);
            prop_assert!(sim.is_finite());
            prop_assert!((-1.0..=1.0).contains(&sim));
            prop_assert_eq!(sim, similarity(&b, &a));
        }

        #[test]
        fn prop_disjoint_items_give_exact_zero(
            a in prop::collection::hash_map((0u64..6).prop_map(ItemId), 0.1f64..=5.0, 0..6),
            b in prop::collection::hash_map((6u64..12).prop_map(ItemId), 0.1f64..=5.0, 0..6),
        ) {
            prop_assert_eq!(similarity(&a, &b), 0.0);
        }
    }
}
