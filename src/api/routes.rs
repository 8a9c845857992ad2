use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::middleware::request_id::{make_span_with_request_id, request_id_middleware};

use super::handlers;
use super::AppState;

/// Creates the main API router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .nest("/api/v1", api_routes())
        .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id))
        .layer(CorsLayer::permissive())
        // outermost, so the trace span already sees the request id
        .layer(middleware::from_fn(request_id_middleware))
        .with_state(state)
}

/// API routes under /api/v1
fn api_routes() -> Router<AppState> {
    Router::new()
        // Catalog
        .route(
            "/resources",
            get(handlers::list_resources).post(handlers::upsert_resource),
        )
        .route("/resources/:id", get(handlers::get_resource))
        // Behavior events feeding the rating matrix
        .route("/behaviors", post(handlers::record_behavior))
        // Recommendations
        .route("/recommendations/:user_id", get(handlers::recommend))
        .route("/recommendations/:user_id/explain", get(handlers::explain))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::Request, http::StatusCode};
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_health_sets_request_id_header() {
        let app = create_router(AppState::default());

        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));
    }

    #[tokio::test]
    async fn test_incoming_request_id_is_echoed() {
        let app = create_router(AppState::default());
        let id = "7d3f0f4e-3c1a-4a55-9a7e-4f1c2b9d8e10";

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .header("x-request-id", id)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.headers()["x-request-id"], id);
    }
}
