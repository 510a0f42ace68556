use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};
use tracing::info;

use crate::models::{PublicUser, UserUpdateRequest};

use super::error::ApiError;
use super::responses::{json_body, Envelope};
use super::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/", get(list_users)).route(
        "/{uid}",
        get(get_user).put(update_user).delete(delete_user),
    )
}

async fn list_users(State(state): State<AppState>) -> Json<Envelope<Vec<PublicUser>>> {
    let users = state.db.users().into_iter().map(PublicUser::from).collect();
    Json(Envelope::success(users))
}

async fn get_user(
    State(state): State<AppState>,
    Path(uid): Path<String>,
) -> Result<Json<Envelope<PublicUser>>, ApiError> {
    let user = state
        .db
        .user(&uid)
        .ok_or(ApiError::NotFound("User not found"))?;
    Ok(Json(Envelope::success(user.into())))
}

async fn update_user(
    State(state): State<AppState>,
    Path(uid): Path<String>,
    payload: Result<Json<UserUpdateRequest>, JsonRejection>,
) -> Result<Json<Envelope<PublicUser>>, ApiError> {
    let update = json_body(payload)?.validate()?;
    let user = state.db.update_user(&uid, update).await?;
    info!(user_id = %user.id, "user updated");
    Ok(Json(Envelope::success(user.into()).with_message("User updated")))
}

async fn delete_user(
    State(state): State<AppState>,
    Path(uid): Path<String>,
) -> Result<Json<Envelope<()>>, ApiError> {
    let user = state.db.delete_user(&uid).await?;
    info!(user_id = %user.id, "user deleted");
    Ok(Json(Envelope::message("User deleted")))
}
