use axum_extra::extract::cookie::{Cookie, SameSite};
use axum_extra::extract::CookieJar;
use tracing::{debug, warn};

use crate::auth::{SessionClaims, SESSION_COOKIE};
use crate::models::User;

use super::error::ApiError;
use super::state::AppState;

pub fn session_claims(state: &AppState, jar: &CookieJar) -> Result<SessionClaims, ApiError> {
    let Some(cookie) = jar.get(SESSION_COOKIE) else {
        debug!("request without session cookie");
        return Err(ApiError::Unauthorized("Not logged in"));
    };
    state.sessions.verify(cookie.value()).map_err(|error| {
        warn!(error = %error, "rejected session cookie");
        ApiError::from(error)
    })
}

/// Resolve the session cookie to a stored user.
pub fn current_user(state: &AppState, jar: &CookieJar) -> Result<User, ApiError> {
    let claims = session_claims(state, jar)?;
    state.db.user(&claims.sub).ok_or_else(|| {
        warn!(user_id = %claims.sub, "session refers to a missing user");
        ApiError::Unauthorized("Invalid session")
    })
}

pub fn session_cookie(token: String) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build()
}

pub fn cleared_session_cookie() -> Cookie<'static> {
    Cookie::build(SESSION_COOKIE).path("/").build()
}
