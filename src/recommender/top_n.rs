use std::cmp::Ordering;

use crate::models::ItemId;

use super::predictor::PredictionSet;

/// Predictions ranked by score descending, ties broken by ascending item id
pub fn ranked(predictions: &PredictionSet) -> Vec<(ItemId, f64)> {
    let mut entries: Vec<(ItemId, f64)> = predictions.iter().map(|(&i, &s)| (i, s)).collect();
    entries.sort_by(by_score_then_id);
    entries
}

/// Orders by score descending (a total order, NaN included), then item id ascending
fn by_score_then_id(a: &(ItemId, f64), b: &(ItemId, f64)) -> Ordering {
    // + 0.0 folds -0.0 into 0.0 so the two still tie
    (b.1 + 0.0)
        .total_cmp(&(a.1 + 0.0))
        .then_with(|| a.0.cmp(&b.0))
}

/// The `n` best predicted items, or all of them if there are fewer
pub fn top_n(predictions: &PredictionSet, n: usize) -> Vec<ItemId> {
    ranked(predictions)
        .into_iter()
        .take(n)
        .map(|(item, _)| item)
        .collect()
}
