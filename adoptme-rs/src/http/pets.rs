use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};
use tracing::{debug, info};

use crate::models::{Pet, PetRequest};

use super::error::ApiError;
use super::responses::{json_body, Envelope};
use super::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_pets).post(create_pet))
        .route(
            "/{pid}",
            get(get_pet).put(update_pet).delete(delete_pet),
        )
}

async fn list_pets(State(state): State<AppState>) -> Json<Envelope<Vec<Pet>>> {
    let pets = state.db.pets();
    debug!(pets = pets.len(), "pets listed");
    Json(Envelope::success(pets))
}

async fn create_pet(
    State(state): State<AppState>,
    payload: Result<Json<PetRequest>, JsonRejection>,
) -> Result<Json<Envelope<Pet>>, ApiError> {
    let new_pet = json_body(payload)?.validate()?;
    let pet = state.db.create_pet(new_pet).await?;
    info!(pet_id = %pet.id, name = %pet.name, "pet created");
    Ok(Json(Envelope::success(pet)))
}

async fn get_pet(
    State(state): State<AppState>,
    Path(pid): Path<String>,
) -> Result<Json<Envelope<Pet>>, ApiError> {
    let pet = state.db.pet(&pid).ok_or(ApiError::NotFound("Pet not found"))?;
    Ok(Json(Envelope::success(pet)))
}

async fn update_pet(
    State(state): State<AppState>,
    Path(pid): Path<String>,
    payload: Result<Json<PetRequest>, JsonRejection>,
) -> Result<Json<Envelope<Pet>>, ApiError> {
    let update = json_body(payload)?.validate_update()?;
    let pet = state.db.update_pet(&pid, update).await?;
    info!(pet_id = %pet.id, "pet updated");
    Ok(Json(Envelope::success(pet).with_message("pet updated")))
}

async fn delete_pet(
    State(state): State<AppState>,
    Path(pid): Path<String>,
) -> Result<Json<Envelope<()>>, ApiError> {
    let pet = state.db.delete_pet(&pid).await?;
    info!(pet_id = %pet.id, "pet deleted");
    Ok(Json(Envelope::message("pet deleted")))
}
