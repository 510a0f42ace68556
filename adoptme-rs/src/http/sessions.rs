use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use axum_extra::extract::CookieJar;
use tracing::{info, warn};

use crate::auth::{hash_password_blocking, verify_password_blocking};
use crate::models::{LoginRequest, NewUser, PublicUser, RegisterRequest, Role};

use super::auth::{cleared_session_cookie, current_user, session_cookie};
use super::error::ApiError;
use super::responses::{json_body, Envelope};
use super::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/current", get(current))
        .route("/logout", post(logout))
}

async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Envelope<PublicUser>>), ApiError> {
    let registration = json_body(payload)?.validate()?;
    if state.db.user_by_email(&registration.email).is_some() {
        return Err(ApiError::Conflict("User already exists"));
    }

    let password_hash = hash_password_blocking(registration.password).await?;
    // Store re-checks the email index atomically.
    let user = state
        .db
        .create_user(NewUser {
            first_name: registration.first_name,
            last_name: registration.last_name,
            email: registration.email,
            password_hash,
            role: Role::User,
        })
        .await?;
    info!(user_id = %user.id, email = %user.email, "user registered");

    Ok((
        StatusCode::CREATED,
        Json(Envelope::success(user.into())),
    ))
}

async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<(CookieJar, Json<Envelope<()>>), ApiError> {
    let (email, password) = json_body(payload)?.validate()?;
    let Some(user) = state.db.user_by_email(&email) else {
        warn!(email = %email, "login for unknown email");
        return Err(ApiError::Unauthorized("Incorrect credentials"));
    };
    if !verify_password_blocking(password, user.password.clone()).await? {
        warn!(user_id = %user.id, "login with wrong password");
        return Err(ApiError::Unauthorized("Incorrect credentials"));
    }

    let token = state.sessions.issue(&user)?;
    info!(user_id = %user.id, "user logged in");
    Ok((
        jar.add(session_cookie(token)),
        Json(Envelope::message("Logged in")),
    ))
}

async fn current(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<Json<Envelope<PublicUser>>, ApiError> {
    let user = current_user(&state, &jar)?;
    Ok(Json(Envelope::success(user.into())))
}

async fn logout(jar: CookieJar) -> (CookieJar, Json<Envelope<()>>) {
    (
        jar.remove(cleared_session_cookie()),
        Json(Envelope::message("Logged out")),
    )
}
