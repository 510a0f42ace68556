//! Password hashing and signed session tokens.
//!
//! ## Passwords
//!
//! Stored as Argon2id PHC strings (`$argon2id$v=19$...`). Hashing is CPU bound;
//! async callers should go through [`hash_password_blocking`] and
//! [`verify_password_blocking`], which run on the blocking pool.
//!
//! ## Sessions
//!
//! A session is an HS256 JWT carried in the `coderCookie` cookie. Nothing is
//! stored server-side: [`SessionKeys::verify`] is a pure function from token to
//! claims, checking signature and expiry.

use std::time::Duration;

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{Role, User};

pub const SESSION_COOKIE: &str = "coderCookie";

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("failed to hash password: {0}")]
    Hash(String),
    #[error("stored password hash is malformed: {0}")]
    MalformedHash(String),
    #[error("invalid session token: {0}")]
    InvalidToken(#[from] jsonwebtoken::errors::Error),
    #[error("password worker failed: {0}")]
    Worker(String),
    #[error("session lifetime of {0:?} overflows the token expiry")]
    TtlOverflow(Duration),
}

pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AuthError::Hash(e.to_string()))
}

/// `Ok(false)` on mismatch; `Err` only when the stored hash cannot be parsed.
pub fn verify_password(password: &str, password_hash: &str) -> Result<bool, AuthError> {
    let parsed =
        PasswordHash::new(password_hash).map_err(|e| AuthError::MalformedHash(e.to_string()))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

pub async fn hash_password_blocking(password: String) -> Result<String, AuthError> {
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| AuthError::Worker(e.to_string()))?
}

pub async fn verify_password_blocking(
    password: String,
    password_hash: String,
) -> Result<bool, AuthError> {
    tokio::task::spawn_blocking(move || verify_password(&password, &password_hash))
        .await
        .map_err(|e| AuthError::Worker(e.to_string()))?
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    /// User id.
    pub sub: String,
    pub email: String,
    pub name: String,
    pub role: Role,
    pub iat: u64,
    pub exp: u64,
}

/// Signing material and lifetime for session tokens.
#[derive(Clone)]
pub struct SessionKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl std::fmt::Debug for SessionKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionKeys")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl SessionKeys {
    pub fn new(secret: &str, ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl,
        }
    }

    pub fn issue(&self, user: &User) -> Result<String, AuthError> {
        self.issue_at(user, jsonwebtoken::get_current_timestamp())
    }

    fn issue_at(&self, user: &User, now: u64) -> Result<String, AuthError> {
        let exp = now
            .checked_add(self.ttl.as_secs())
            .ok_or(AuthError::TtlOverflow(self.ttl))?;
        let claims = SessionClaims {
            sub: user.id.clone(),
            email: user.email.clone(),
            name: format!("{} {}", user.first_name, user.last_name),
            role: user.role,
            iat: now,
            exp,
        };
        Ok(encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)?)
    }

    pub fn verify(&self, token: &str) -> Result<SessionClaims, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);
        Ok(decode::<SessionClaims>(token, &self.decoding, &validation)?.claims)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use std::time::Duration;

    use super::{hash_password, verify_password, AuthError, SessionKeys};
    use crate::models::{Role, User};

    fn user() -> User {
        User {
            id: String::from("0191b1c2d3e47f00a1b2c3d4e5f60718"),
            first_name: String::from("Edu"),
            last_name: String::from("Galli"),
            email: String::from("edu@correofalso.com"),
            password: String::new(),
            role: Role::Admin,
            pets: Vec::new(),
        }
    }

    #[test]
    fn password_hash_round_trip() {
        let hash = hash_password("1234").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("1234", &hash).unwrap());
        assert!(!verify_password("4321", &hash).unwrap());
    }

    #[test]
    fn verify_rejects_malformed_hash() {
        assert!(verify_password("1234", "plaintext").is_err());
    }

    #[test]
    fn issued_token_verifies_to_same_identity() {
        let keys = SessionKeys::new("secret", Duration::from_secs(3600));
        let token = keys.issue(&user()).unwrap();
        let claims = keys.verify(&token).unwrap();
        assert_eq!(claims.sub, user().id);
        assert_eq!(claims.email, "edu@correofalso.com");
        assert_eq!(claims.name, "Edu Galli");
        assert_eq!(claims.role, Role::Admin);
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let issuer = SessionKeys::new("secret", Duration::from_secs(3600));
        let other = SessionKeys::new("other", Duration::from_secs(3600));
        let token = issuer.issue(&user()).unwrap();
        assert!(other.verify(&token).is_err());
        assert!(issuer.verify("not.a.token").is_err());
    }

    #[test]
    fn expired_token_is_rejected() {
        let keys = SessionKeys::new("secret", Duration::from_secs(60));
        let long_ago = jsonwebtoken::get_current_timestamp() - 3600;
        let token = keys.issue_at(&user(), long_ago).unwrap();
        assert!(keys.verify(&token).is_err());
    }

    #[test]
    fn overflowing_ttl_fails_instead_of_wrapping() {
        let keys = SessionKeys::new("secret", Duration::from_secs(u64::MAX - 10));
        assert!(matches!(
            keys.issue(&user()),
            Err(AuthError::TtlOverflow(_))
        ));
    }
}
