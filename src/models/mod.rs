use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

mod ids;

pub use ids::{ItemId, UserId};

/// Upper bound of the rating scale produced from user behavior
pub const MAX_RATING: f64 = 5.0;

/// A mental-health resource (article, exercise, audio...) returned to the client
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Resource {
    pub id: ItemId,
    pub title: String,
    pub category: ResourceCategory,
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ResourceCategory {
    Article,
    Video,
    Audio,
    Exercise,
    Other,
}

/// What a user did with a resource
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum BehaviorAction {
    View,
    Like,
    Download,
    Rate { value: f64 },
}

impl BehaviorAction {
    /// Implicit score contributed by this action, `None` for explicit ratings
    pub fn implicit_weight(&self) -> Option<f64> {
        match self {
            BehaviorAction::View => Some(1.0),
            BehaviorAction::Download => Some(2.0),
            BehaviorAction::Like => Some(3.0),
            BehaviorAction::Rate { .. } => None,
        }
    }
}

/// One recorded user interaction
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BehaviorEvent {
    pub user_id: UserId,
    pub item_id: ItemId,
    #[serde(flatten)]
    pub action: BehaviorAction,
    pub recorded_at: DateTime<Utc>,
}

/// Where a recommendation list came from
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RecommendationSource {
    Personalized,
    Fallback,
}

/// Recommendation response with resolved resources
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecommendationResponse {
    pub user_id: UserId,
    pub source: RecommendationSource,
    pub snapshot_version: u64,
    pub resources: Vec<Resource>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_behavior_action_serde_tagged() {
        let json = serde_json::to_string(&BehaviorAction::Rate { value: 4.5 }).unwrap();
        assert_eq!(json, r#"{"action":"rate","value":4.5}"#);

        let view: BehaviorAction = serde_json::from_str(r#"{"action":"view"}"#).unwrap();
        assert_eq!(view, BehaviorAction::View);
    }

    #[test]
    fn test_behavior_event_flattens_action() {
        let json = r#"{
            "user_id": 1,
            "item_id": 4,
            "action": "download",
            "recorded_at": "2026-01-05T10:00:00Z"
        }"#;

        let event: BehaviorEvent = serde_json::from_str(json).unwrap();
        assert_eq!(event.user_id, UserId(1));
        assert_eq!(event.item_id, ItemId(4));
        assert_eq!(event.action, BehaviorAction::Download);
    }

    #[test]
    fn test_implicit_weights() {
        assert_eq!(BehaviorAction::View.implicit_weight(), Some(1.0));
        assert_eq!(BehaviorAction::Download.implicit_weight(), Some(2.0));
        assert_eq!(BehaviorAction::Like.implicit_weight(), Some(3.0));
        assert_eq!(BehaviorAction::Rate { value: 1.0 }.implicit_weight(), None);
    }

    #[test]
    fn test_resource_category_lowercase() {
        let resource = Resource {
            id: ItemId(1),
            title: "Box breathing".to_string(),
            category: ResourceCategory::Exercise,
            url: None,
        };
        let json = serde_json::to_value(&resource).unwrap();
        assert_eq!(json["category"], "exercise");
        assert_eq!(json["id"], 1);
    }
}
