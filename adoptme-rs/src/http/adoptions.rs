use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{NaiveDate, Utc};
use tracing::{debug, info};

use crate::models::{Adoption, AdoptionRequest, NewAdoption};

use super::error::ApiError;
use super::responses::{json_body, Envelope};
use super::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_adoptions).post(create_adoption))
        .route("/{aid}", get(get_adoption))
        .route("/{uid}/{pid}", post(create_adoption_by_path))
}

async fn list_adoptions(State(state): State<AppState>) -> Json<Envelope<Vec<Adoption>>> {
    let adoptions = state.db.adoptions();
    debug!(adoptions = adoptions.len(), "adoptions listed");
    Json(Envelope::success(adoptions))
}

async fn get_adoption(
    State(state): State<AppState>,
    Path(aid): Path<String>,
) -> Result<Json<Envelope<Adoption>>, ApiError> {
    Ok(Json(Envelope::success(state.db.adoption(&aid)?)))
}

async fn create_adoption(
    State(state): State<AppState>,
    payload: Result<Json<AdoptionRequest>, JsonRejection>,
) -> Result<Json<Envelope<Adoption>>, ApiError> {
    let request = json_body(payload)?.validate(today())?;
    adopt(&state, request).await
}

async fn create_adoption_by_path(
    State(state): State<AppState>,
    Path((uid, pid)): Path<(String, String)>,
) -> Result<Json<Envelope<Adoption>>, ApiError> {
    let request = NewAdoption {
        uid,
        pid,
        adoption_date: today(),
    };
    adopt(&state, request).await
}

async fn adopt(
    state: &AppState,
    request: NewAdoption,
) -> Result<Json<Envelope<Adoption>>, ApiError> {
    let adoption = state
        .db
        .adopt(&request.uid, &request.pid, request.adoption_date)
        .await?;
    info!(
        adoption_id = %adoption.id,
        user_id = %adoption.uid,
        pet_id = %adoption.pid,
        "pet adopted"
    );
    Ok(Json(Envelope::success(adoption).with_message("Pet adopted")))
}

fn today() -> NaiveDate {
    Utc::now().date_naive()
}
