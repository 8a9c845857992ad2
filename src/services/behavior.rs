use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{BehaviorAction, BehaviorEvent, ItemId, UserId, MAX_RATING},
    recommender::RatingMatrix,
};

/// Aggregated signals for one (user, item) pair
#[derive(Debug, Clone, Default)]
struct PairSignals {
    implicit: f64,
    explicit: Option<(f64, DateTime<Utc>)>,
}

impl PairSignals {
    /// Explicit rating if any, otherwise the capped implicit score
    fn rating(&self) -> f64 {
        match self.explicit {
            Some((value, _)) => value,
            None => self.implicit.min(MAX_RATING),
        }
    }
}

/// Turns raw interactions into ratings and interaction counts
///
/// Views, downloads and likes add up to an implicit score capped at
/// [`MAX_RATING`]; an explicit rating overrides it, latest timestamp wins.
#[derive(Debug, Default)]
pub struct BehaviorLog {
    signals: HashMap<(UserId, ItemId), PairSignals>,
    interactions: HashMap<ItemId, u64>,
    events: usize,
}

impl BehaviorLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one event and returns the pair's resulting rating
    pub fn record(&mut self, event: &BehaviorEvent) -> AppResult<f64> {
        if let BehaviorAction::Rate { value } = event.action {
            if !value.is_finite() || !(0.0..=MAX_RATING).contains(&value) {
                return Err(AppError::InvalidInput(format!(
                    "Rating must be between 0 and {}, got {}",
                    MAX_RATING, value
                )));
            }
        }

        let signals = self
            .signals
            .entry((event.user_id, event.item_id))
            .or_default();

        match event.action {
            BehaviorAction::Rate { value } => {
                let newer = signals
                    .explicit
                    .map_or(true, |(_, at)| event.recorded_at >= at);
                if newer {
                    signals.explicit = Some((value, event.recorded_at));
                }
            }
            action => {
                signals.implicit += action.implicit_weight().unwrap_or_default();
            }
        }

        *self.interactions.entry(event.item_id).or_default() += 1;
        self.events += 1;

        Ok(signals.rating())
    }

    /// Materializes the current ratings as a matrix
    pub fn build_matrix(&self) -> AppResult<RatingMatrix> {
        let mut matrix = RatingMatrix::new();
        for (&(user, item), signals) in &self.signals {
            matrix.insert(user, item, signals.rating())?;
        }
        Ok(matrix)
    }

    /// Most interacted-with items, ties broken by ascending id
    pub fn hot_items(&self, limit: usize) -> Vec<ItemId> {
        let mut counts: Vec<(ItemId, u64)> = self
            .interactions
            .iter()
            .map(|(&item, &count)| (item, count))
            .collect();
        counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        counts.into_iter().take(limit).map(|(item, _)| item).collect()
    }

    pub fn event_count(&self) -> usize {
        self.events
    }
}

/// Versioned, copy-on-write snapshot of the rating matrix
///
/// Readers clone the `Arc` and keep computing on it while writers swap in a
/// modified copy, so an in-flight recommendation never sees a half-applied
/// update.
///
/// Versions count from zero in every store. The random `epoch` tells two
/// stores apart, so `(epoch, version)` names one matrix even across restarts
/// or replicas sharing a cache.
#[derive(Debug)]
pub struct RatingStore {
    log: BehaviorLog,
    snapshot: Arc<RatingMatrix>,
    epoch: Uuid,
    version: u64,
}

impl Default for RatingStore {
    fn default() -> Self {
        Self {
            log: BehaviorLog::default(),
            snapshot: Arc::default(),
            epoch: Uuid::new_v4(),
            version: 0,
        }
    }
}

impl RatingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies an event and returns the snapshot version afterwards
    ///
    /// The version only moves when the pair's rating actually changed.
    pub fn record(&mut self, event: &BehaviorEvent) -> AppResult<u64> {
        let rating = self.log.record(event)?;
        if self.snapshot.rating(event.user_id, event.item_id) == Some(rating) {
            tracing::debug!(
                user_id = %event.user_id,
                item_id = %event.item_id,
                version = self.version,
                "Rating unchanged, snapshot kept"
            );
            return Ok(self.version);
        }

        Arc::make_mut(&mut self.snapshot).insert(event.user_id, event.item_id, rating)?;
        self.version += 1;

        tracing::debug!(
            user_id = %event.user_id,
            item_id = %event.item_id,
            rating,
            version = self.version,
            "Rating snapshot updated"
        );

        Ok(self.version)
    }

    /// Current snapshot, its store epoch and its version
    pub fn snapshot(&self) -> (Arc<RatingMatrix>, Uuid, u64) {
        (Arc::clone(&self.snapshot), self.epoch, self.version)
    }

    pub fn hot_items(&self, limit: usize) -> Vec<ItemId> {
        self.log.hot_items(limit)
    }

    pub fn log(&self) -> &BehaviorLog {
        &self.log
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::CacheKey;
    use crate::recommender::RatingSource;
    use chrono::TimeZone;

    fn event(user: u64, item: u64, action: BehaviorAction, minute: u32) -> BehaviorEvent {
        BehaviorEvent {
            user_id: UserId(user),
            item_id: ItemId(item),
            action,
            recorded_at: Utc.with_ymd_and_hms(2026, 1, 5, 10, minute, 0).unwrap(),
        }
    }

    #[test]
    fn test_implicit_signals_accumulate_and_cap() {
        let mut log = BehaviorLog::new();

        assert_eq!(log.record(&event(1, 1, BehaviorAction::View, 0)).unwrap(), 1.0);
        assert_eq!(log.record(&event(1, 1, BehaviorAction::Download, 1)).unwrap(), 3.0);
        assert_eq!(log.record(&event(1, 1, BehaviorAction::Like, 2)).unwrap(), 5.0);
        assert_eq!(log.record(&event(1, 1, BehaviorAction::Like, 3)).unwrap(), 5.0);
    }

    #[test]
    fn test_explicit_rating_overrides_implicit() {
        let mut log = BehaviorLog::new();
        log.record(&event(1, 1, BehaviorAction::Like, 0)).unwrap();

        let rating = log
            .record(&event(1, 1, BehaviorAction::Rate { value: 1.5 }, 1))
            .unwrap();
        assert_eq!(rating, 1.5);

        // later implicit signals do not replace an explicit rating
        let rating = log.record(&event(1, 1, BehaviorAction::View, 2)).unwrap();
        assert_eq!(rating, 1.5);
    }

    #[test]
    fn test_latest_explicit_rating_wins() {
        let mut log = BehaviorLog::new();
        log.record(&event(1, 1, BehaviorAction::Rate { value: 4.0 }, 30))
            .unwrap();

        // arrives later but happened earlier
        let rating = log
            .record(&event(1, 1, BehaviorAction::Rate { value: 2.0 }, 10))
            .unwrap();
        assert_eq!(rating, 4.0);
    }

    #[test]
    fn test_rejects_out_of_range_rating() {
        let mut log = BehaviorLog::new();

        for value in [-0.5, 5.5, f64::NAN] {
            let result = log.record(&event(1, 1, BehaviorAction::Rate { value }, 0));
            assert!(matches!(result, Err(AppError::InvalidInput(_))));
        }
        assert_eq!(log.event_count(), 0);
    }

    #[test]
    fn test_build_matrix() {
        let mut log = BehaviorLog::new();
        log.record(&event(1, 1, BehaviorAction::View, 0)).unwrap();
        log.record(&event(2, 1, BehaviorAction::Rate { value: 4.5 }, 0))
            .unwrap();

        let matrix = log.build_matrix().unwrap();

        assert_eq!(matrix.rating(UserId(1), ItemId(1)), Some(1.0));
        assert_eq!(matrix.rating(UserId(2), ItemId(1)), Some(4.5));
        assert_eq!(matrix.users(), vec![UserId(1), UserId(2)]);
    }

    #[test]
    fn test_hot_items_by_count_then_id() {
        let mut log = BehaviorLog::new();
        for (user, item) in [(1, 3), (2, 3), (1, 9), (2, 9), (3, 1), (1, 4), (2, 4), (3, 4)] {
            log.record(&event(user, item, BehaviorAction::View, 0)).unwrap();
        }

        assert_eq!(log.hot_items(3), vec![ItemId(4), ItemId(3), ItemId(9)]);
        assert_eq!(log.hot_items(10).len(), 4);
    }

    #[test]
    fn test_store_snapshot_is_copy_on_write() {
        let mut store = RatingStore::new();
        store.record(&event(1, 1, BehaviorAction::Like, 0)).unwrap();

        let (before, epoch_before, version_before) = store.snapshot();
        let version = store.record(&event(1, 2, BehaviorAction::View, 1)).unwrap();
        let (after, epoch_after, version_after) = store.snapshot();

        assert_eq!(version_before, 1);
        assert_eq!(version, 2);
        assert_eq!(version_after, 2);
        assert_eq!(epoch_before, epoch_after);
        assert_eq!(before.rating(UserId(1), ItemId(2)), None);
        assert_eq!(after.rating(UserId(1), ItemId(2)), Some(1.0));
        assert_eq!(*after, store.log().build_matrix().unwrap());
    }

    #[test]
    fn test_store_version_only_moves_on_change() {
        let mut store = RatingStore::new();
        assert_eq!(
            store
                .record(&event(1, 1, BehaviorAction::Rate { value: 4.0 }, 30))
                .unwrap(),
            1
        );

        let (before, _, _) = store.snapshot();
        // older explicit rating and a later view both leave 4.0 in place
        let stale = store
            .record(&event(1, 1, BehaviorAction::Rate { value: 2.0 }, 10))
            .unwrap();
        let viewed = store.record(&event(1, 1, BehaviorAction::View, 40)).unwrap();
        let (after, _, version) = store.snapshot();

        assert_eq!(stale, 1);
        assert_eq!(viewed, 1);
        assert_eq!(version, 1);
        assert!(Arc::ptr_eq(&before, &after));
        assert_eq!(store.log().event_count(), 3);

        let changed = store
            .record(&event(1, 1, BehaviorAction::Rate { value: 3.0 }, 50))
            .unwrap();
        assert_eq!(changed, 2);
        assert_eq!(store.snapshot().0.rating(UserId(1), ItemId(1)), Some(3.0));
    }

    #[test]
    fn test_stores_at_same_version_have_distinct_cache_keys() {
        let mut first = RatingStore::new();
        let mut second = RatingStore::new();
        first.record(&event(1, 1, BehaviorAction::Like, 0)).unwrap();
        second.record(&event(1, 4, BehaviorAction::View, 0)).unwrap();

        let key = |store: &RatingStore| {
            let (_, epoch, snapshot_version) = store.snapshot();
            CacheKey::Recommendations {
                epoch,
                snapshot_version,
                user: UserId(1),
                k: 10,
                n: 5,
            }
            .to_string()
        };

        assert_eq!(first.snapshot().2, second.snapshot().2);
        assert_ne!(first.snapshot().1, second.snapshot().1);
        assert_ne!(key(&first), key(&second));
    }
}
