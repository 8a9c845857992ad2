use std::collections::HashMap;

use crate::models::{ItemId, UserId};

use super::neighborhood::Neighbor;
use super::ratings::RatingSource;

/// Predicted ratings for items the target user has not rated yet
pub type PredictionSet = HashMap<ItemId, f64>;

#[derive(Default)]
struct WeightedSum {
    numerator: f64,
    denominator: f64,
}

/// Weighted-neighbor-average prediction for every unseen candidate item
///
/// For a candidate `c`, each neighbor `n` that rated it contributes
/// `sim(target, n) * rating(n, c)` to the numerator and `|sim(target, n)|` to
/// the denominator. Candidates whose denominator ends up zero are left out
/// instead of being given a default score.
pub fn predict<S>(target: UserId, neighborhood: &[Neighbor], source: &S) -> PredictionSet
where
    S: RatingSource + ?Sized,
{
    if neighborhood.is_empty() {
        return PredictionSet::new();
    }

    let own = source.ratings_of(target);
    let already_rated = |item: &ItemId| own.is_some_and(|ratings| ratings.contains_key(item));

    let mut sums: HashMap<ItemId, WeightedSum> = HashMap::new();
    for neighbor in neighborhood {
        let Some(ratings) = source.ratings_of(neighbor.user) else {
            continue;
        };
        for (item, &rating) in ratings {
            if already_rated(item) {
                continue;
            }
            let sum = sums.entry(*item).or_default();
            sum.numerator += neighbor.similarity * rating;
            sum.denominator += neighbor.similarity.abs();
        }
    }

    let candidates = sums.len();
    let predictions: PredictionSet = sums
        .into_iter()
        .filter(|(_, sum)| sum.denominator > 0.0)
        .map(|(item, sum)| (item, sum.numerator / sum.denominator))
        .collect();

    tracing::debug!(
        user = %target,
        neighbors = neighborhood.len(),
        candidates,
        predicted = predictions.len(),
        "Predicted ratings"
    );

    predictions
}
