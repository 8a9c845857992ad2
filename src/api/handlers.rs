use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::{
    error::{AppError, AppResult},
    middleware::request_id::RequestId,
    models::{BehaviorAction, BehaviorEvent, ItemId, RecommendationResponse, Resource, UserId},
    recommender::{Limits, Neighbor},
};

use super::AppState;

// Request/Response types

#[derive(Debug, Deserialize)]
pub struct RecordBehaviorRequest {
    pub user_id: UserId,
    pub item_id: ItemId,
    #[serde(flatten)]
    pub action: BehaviorAction,
    /// Defaults to the time the request is received
    #[serde(default)]
    pub recorded_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
pub struct RecordBehaviorResponse {
    pub snapshot_version: u64,
}

/// Optional neighborhood size `k` and list length `n`
#[derive(Debug, Default, Deserialize)]
pub struct RecommendQuery {
    pub k: Option<i64>,
    pub n: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct PredictionEntry {
    pub item_id: ItemId,
    pub score: f64,
}

#[derive(Debug, Serialize)]
pub struct ExplainResponse {
    pub user_id: UserId,
    pub snapshot_version: u64,
    pub limits: Limits,
    pub neighbors: Vec<Neighbor>,
    pub predictions: Vec<PredictionEntry>,
    pub recommended: Vec<ItemId>,
}

impl RecommendQuery {
    fn limits(&self, state: &AppState) -> AppResult<Limits> {
        let k = self.k.unwrap_or(state.default_neighbors as i64);
        let n = self.n.unwrap_or(state.default_top_n as i64);
        Ok(Limits::new(k, n)?)
    }
}

// Handlers

/// Health check endpoint
pub async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}

/// Register or replace a resource in the catalog
pub async fn upsert_resource(
    State(state): State<AppState>,
    Json(resource): Json<Resource>,
) -> (StatusCode, Json<Resource>) {
    let replaced = state.catalog.upsert(resource.clone()).await.is_some();
    let status = if replaced {
        StatusCode::OK
    } else {
        StatusCode::CREATED
    };
    (status, Json(resource))
}

/// List all resources
pub async fn list_resources(State(state): State<AppState>) -> Json<Vec<Resource>> {
    Json(state.catalog.list().await)
}

/// Fetch a single resource by id
pub async fn get_resource(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> AppResult<Json<Resource>> {
    state
        .catalog
        .get(ItemId(id))
        .await
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Resource {} does not exist", id)))
}

/// Record a user interaction and advance the rating snapshot
pub async fn record_behavior(
    State(state): State<AppState>,
    Json(request): Json<RecordBehaviorRequest>,
) -> AppResult<(StatusCode, Json<RecordBehaviorResponse>)> {
    let event = BehaviorEvent {
        user_id: request.user_id,
        item_id: request.item_id,
        action: request.action,
        recorded_at: request.recorded_at.unwrap_or_else(Utc::now),
    };

    let snapshot_version = state.store.write().await.record(&event)?;

    Ok((
        StatusCode::CREATED,
        Json(RecordBehaviorResponse { snapshot_version }),
    ))
}

/// Recommend resources for a user
pub async fn recommend(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Path(user_id): Path<u64>,
    Query(query): Query<RecommendQuery>,
) -> AppResult<Json<RecommendationResponse>> {
    let limits = query.limits(&state)?;

    tracing::info!(
        request_id = %request_id,
        user_id,
        k = limits.k,
        n = limits.n,
        "Processing recommendation request"
    );

    let response = state
        .recommendations
        .recommend(UserId(user_id), limits)
        .await?;

    Ok(Json(response))
}

/// Show the neighbors and predictions behind a recommendation
pub async fn explain(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Path(user_id): Path<u64>,
    Query(query): Query<RecommendQuery>,
) -> AppResult<Json<ExplainResponse>> {
    let limits = query.limits(&state)?;

    tracing::info!(
        request_id = %request_id,
        user_id,
        k = limits.k,
        n = limits.n,
        "Processing explain request"
    );

    let (explanation, snapshot_version) = state
        .recommendations
        .explain(UserId(user_id), limits)
        .await?;

    Ok(Json(ExplainResponse {
        user_id: UserId(user_id),
        snapshot_version,
        limits,
        neighbors: explanation.neighbors,
        predictions: explanation
            .predictions
            .into_iter()
            .map(|(item_id, score)| PredictionEntry { item_id, score })
            .collect(),
        recommended: explanation.recommended,
    }))
}
