use std::collections::HashMap;

use crate::models::{ItemId, UserId};

use super::RecommendError;

/// Ratings of a single user, keyed by item
pub type ItemRatings = HashMap<ItemId, f64>;

/// Read access to a snapshot of user ratings
///
/// The algorithms only ever look ratings up, so any backing store that can
/// enumerate its users and hand out one user's ratings can drive them.
pub trait RatingSource {
    /// All users with a ratings row, in ascending id order
    fn users(&self) -> Vec<UserId>;

    /// Ratings for one user, `None` when the user has no row
    fn ratings_of(&self, user: UserId) -> Option<&ItemRatings>;
}

/// Sparse user → item → rating matrix
///
/// A missing (user, item) pair means "no opinion", never zero. Every stored
/// rating is finite.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RatingMatrix {
    rows: HashMap<UserId, ItemRatings>,
}

impl RatingMatrix {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a rating, replacing any previous value for the same pair
    pub fn insert(&mut self, user: UserId, item: ItemId, rating: f64) -> Result<(), RecommendError> {
        if !rating.is_finite() {
            return Err(RecommendError::NonFiniteRating {
                user,
                item,
                value: rating,
            });
        }
        self.rows.entry(user).or_default().insert(item, rating);
        Ok(())
    }

    /// Builds a matrix from `(user, item, rating)` triples
    pub fn from_triples<I>(triples: I) -> Result<Self, RecommendError>
    where
        I: IntoIterator<Item = (UserId, ItemId, f64)>,
    {
        let mut matrix = Self::new();
        for (user, item, rating) in triples {
            matrix.insert(user, item, rating)?;
        }
        Ok(matrix)
    }

    pub fn rating(&self, user: UserId, item: ItemId) -> Option<f64> {
        self.rows.get(&user).and_then(|row| row.get(&item)).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl RatingSource for RatingMatrix {
    fn users(&self) -> Vec<UserId> {
        self.rows.users()
    }

    fn ratings_of(&self, user: UserId) -> Option<&ItemRatings> {
        self.rows.get(&user)
    }
}

/// Plain nested maps work as a source too, which keeps tests and callers that
/// already hold a `HashMap` from having to copy it.
impl RatingSource for HashMap<UserId, ItemRatings> {
    fn users(&self) -> Vec<UserId> {
        let mut users: Vec<UserId> = self.keys().copied().collect();
        users.sort_unstable();
        users
    }

    fn ratings_of(&self, user: UserId) -> Option<&ItemRatings> {
        self.get(&user)
    }
}

impl<T: RatingSource + ?Sized> RatingSource for &T {
    fn users(&self) -> Vec<UserId> {
        (**self).users()
    }

    fn ratings_of(&self, user: UserId) -> Option<&ItemRatings> {
        (**self).ratings_of(user)
    }
}

impl<T: RatingSource + ?Sized> RatingSource for std::sync::Arc<T> {
    fn users(&self) -> Vec<UserId> {
        (**self).users()
    }

    fn ratings_of(&self, user: UserId) -> Option<&ItemRatings> {
        (**self).ratings_of(user)
    }
}
