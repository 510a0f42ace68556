use std::sync::Arc;

use axum::extract::State;
use axum::response::Html;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::Value;
use tower_governor::{
    governor::GovernorConfigBuilder,
    key_extractor::GlobalKeyExtractor,
    GovernorLayer,
};
use tracing::debug;

use crate::docs::swagger_ui_html;

use super::error::ApiError;
use super::responses::HealthResponse;
use super::state::AppState;
use super::{adoptions, mocks, pets, sessions, users};

const OPENAPI_PATH: &str = "/apidocs/openapi.json";

pub fn router(state: AppState) -> Router {
    let governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .per_second(20)
            .burst_size(50)
            .key_extractor(GlobalKeyExtractor)
            .finish()
            .unwrap_or_else(|| unreachable!("static governor config is valid")),
    );

    Router::new()
        .route("/health", get(health))
        .route("/apidocs", get(apidocs_ui))
        .route(OPENAPI_PATH, get(apidocs_json))
        .nest("/api/users", users::routes())
        .nest("/api/pets", pets::routes())
        .nest("/api/adoptions", adoptions::routes())
        .nest("/api/sessions", sessions::routes())
        .nest("/api/mocks", mocks::routes())
        .method_not_allowed_fallback(method_not_allowed)
        .fallback(route_not_found)
        .layer(GovernorLayer::new(governor_conf))
        .layer(
            tower_http::request_id::SetRequestIdLayer::new(
                axum::http::header::HeaderName::from_static("x-request-id"),
                tower_http::request_id::MakeRequestUuid::default(),
            ),
        )
        .layer(tower_http::request_id::PropagateRequestIdLayer::new(
            axum::http::header::HeaderName::from_static("x-request-id"),
        ))
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .with_state(state)
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let (users, pets, adoptions) = state.db.counts();
    Json(HealthResponse {
        status: "ok",
        users,
        pets,
        adoptions,
    })
}

async fn route_not_found() -> ApiError {
    ApiError::NotFound("Route not found")
}

async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed("Method not allowed")
}

async fn apidocs_ui() -> Html<String> {
    debug!("api docs requested");
    Html(swagger_ui_html(OPENAPI_PATH))
}

async fn apidocs_json(State(state): State<AppState>) -> Json<Value> {
    Json(state.openapi.as_ref().clone())
}
