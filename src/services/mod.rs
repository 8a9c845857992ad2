pub mod behavior;
pub mod providers;
pub mod recommendations;

pub use behavior::{BehaviorLog, RatingStore};
pub use recommendations::RecommendationService;
