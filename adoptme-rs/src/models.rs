//! Document schemas for users, pets and adoptions, plus request validation.
//!
//! Stored documents keep the wire names the API exposes (`_id`, `birthDate`,
//! `adoptionDate`). Incoming payloads are deserialized into loose `*Request`
//! structs with every field optional, then checked by `validate` into the
//! strict `New*` values the store accepts.

use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$")
        .unwrap_or_else(|e| panic!("email regex must be valid: {e}"))
});

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "_id")]
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    /// Argon2 PHC string.
    pub password: String,
    #[serde(default)]
    pub role: Role,
    #[serde(default)]
    pub pets: Vec<String>,
}

/// User as returned by the API: everything except the password hash.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PublicUser {
    #[serde(rename = "_id")]
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub role: Role,
    pub pets: Vec<String>,
}

impl From<User> for PublicUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            first_name: user.first_name,
            last_name: user.last_name,
            email: user.email,
            role: user.role,
            pets: user.pets,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pet {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub specie: Option<String>,
    #[serde(rename = "birthDate", default)]
    pub birth_date: Option<NaiveDate>,
    #[serde(default)]
    pub adopted: bool,
    #[serde(default)]
    pub owner: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Adoption {
    #[serde(rename = "_id")]
    pub id: String,
    pub uid: String,
    pub pid: String,
    #[serde(rename = "adoptionDate")]
    pub adoption_date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("missing required field: {0}")]
    Missing(&'static str),
    #[error("invalid email address: {0}")]
    InvalidEmail(String),
    #[error("invalid date for {field}: {value} (expected YYYY-MM-DD)")]
    InvalidDate { field: &'static str, value: String },
}

#[derive(Debug, Default, Deserialize)]
pub struct PetRequest {
    pub name: Option<String>,
    pub specie: Option<String>,
    #[serde(rename = "birthDate")]
    pub birth_date: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewPet {
    pub name: String,
    pub specie: Option<String>,
    pub birth_date: Option<NaiveDate>,
}

/// Partial pet update. `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PetUpdate {
    pub name: Option<String>,
    pub specie: Option<String>,
    pub birth_date: Option<NaiveDate>,
}

impl PetRequest {
    pub fn validate(self) -> Result<NewPet, ValidationError> {
        let name = required(self.name, "name")?;
        Ok(NewPet {
            name,
            specie: optional(self.specie),
            birth_date: parse_optional_date(self.birth_date, "birthDate")?,
        })
    }

    pub fn validate_update(self) -> Result<PetUpdate, ValidationError> {
        let name = match self.name {
            Some(raw) => Some(required(Some(raw), "name")?),
            None => None,
        };
        Ok(PetUpdate {
            name,
            specie: optional(self.specie),
            birth_date: parse_optional_date(self.birth_date, "birthDate")?,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct RegisterRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Validated registration; the password is still plaintext here.
#[derive(Debug, Clone, PartialEq)]
pub struct Registration {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
}

impl RegisterRequest {
    pub fn validate(self) -> Result<Registration, ValidationError> {
        let first_name = required(self.first_name, "first_name")?;
        let last_name = required(self.last_name, "last_name")?;
        let email = validate_email(required(self.email, "email")?)?;
        let password = self
            .password
            .filter(|p| !p.is_empty())
            .ok_or(ValidationError::Missing("password"))?;
        Ok(Registration {
            first_name,
            last_name,
            email,
            password,
        })
    }
}

/// A user ready to be stored, password already hashed.
#[derive(Debug, Clone, PartialEq)]
pub struct NewUser {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
}

#[derive(Debug, Default, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

impl LoginRequest {
    pub fn validate(self) -> Result<(String, String), ValidationError> {
        let email = required(self.email, "email")?.to_ascii_lowercase();
        let password = self
            .password
            .filter(|p| !p.is_empty())
            .ok_or(ValidationError::Missing("password"))?;
        Ok((email, password))
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct UserUpdateRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub role: Option<Role>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserUpdate {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub role: Option<Role>,
}

impl UserUpdateRequest {
    pub fn validate(self) -> Result<UserUpdate, ValidationError> {
        let first_name = match self.first_name {
            Some(raw) => Some(required(Some(raw), "first_name")?),
            None => None,
        };
        let last_name = match self.last_name {
            Some(raw) => Some(required(Some(raw), "last_name")?),
            None => None,
        };
        Ok(UserUpdate {
            first_name,
            last_name,
            role: self.role,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct AdoptionRequest {
    pub uid: Option<String>,
    pub pid: Option<String>,
    #[serde(rename = "adoptionDate")]
    pub adoption_date: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewAdoption {
    pub uid: String,
    pub pid: String,
    pub adoption_date: NaiveDate,
}

impl AdoptionRequest {
    /// `today` fills in a missing `adoptionDate`.
    pub fn validate(self, today: NaiveDate) -> Result<NewAdoption, ValidationError> {
        let uid = required(self.uid, "uid")?;
        let pid = required(self.pid, "pid")?;
        let adoption_date =
            parse_optional_date(self.adoption_date, "adoptionDate")?.unwrap_or(today);
        Ok(NewAdoption {
            uid,
            pid,
            adoption_date,
        })
    }
}

fn required(value: Option<String>, field: &'static str) -> Result<String, ValidationError> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or(ValidationError::Missing(field))
}

fn optional(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn validate_email(raw: String) -> Result<String, ValidationError> {
    if EMAIL_RE.is_match(&raw) {
        Ok(raw.to_ascii_lowercase())
    } else {
        Err(ValidationError::InvalidEmail(raw))
    }
}

fn parse_optional_date(
    raw: Option<String>,
    field: &'static str,
) -> Result<Option<NaiveDate>, ValidationError> {
    let Some(raw) = optional(raw) else {
        return Ok(None);
    };
    // A bare day or a full RFC 3339 timestamp; only the calendar date is kept.
    NaiveDate::parse_from_str(&raw, "%Y-%m-%d")
        .or_else(|_| DateTime::parse_from_rfc3339(&raw).map(|ts| ts.date_naive()))
        .map(Some)
        .map_err(|_| ValidationError::InvalidDate { field, value: raw })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    #[test]
    fn pet_request_requires_name() {
        let request = PetRequest {
            name: None,
            specie: Some(String::from("Gato")),
            birth_date: Some(String::from("2023-05-15")),
        };
        assert_eq!(request.validate(), Err(ValidationError::Missing("name")));

        let blank = PetRequest {
            name: Some(String::from("   ")),
            ..Default::default()
        };
        assert_eq!(blank.validate(), Err(ValidationError::Missing("name")));
    }

    #[test]
    fn pet_request_parses_birth_date() {
        let pet = PetRequest {
            name: Some(String::from(" Rambo ")),
            specie: Some(String::from("Pichicho")),
            birth_date: Some(String::from("2021-03-10")),
        }
        .validate()
        .unwrap();

        assert_eq!(pet.name, "Rambo");
        assert_eq!(pet.birth_date, NaiveDate::from_ymd_opt(2021, 3, 10));
    }

    #[test]
    fn pet_request_accepts_timestamp_and_rejects_garbage() {
        let pet = PetRequest {
            name: Some(String::from("Roger")),
            birth_date: Some(String::from("2016-01-08T00:00:00.000Z")),
            ..Default::default()
        }
        .validate()
        .unwrap();
        assert_eq!(pet.birth_date, NaiveDate::from_ymd_opt(2016, 1, 8));

        let bad = PetRequest {
            name: Some(String::from("Roger")),
            birth_date: Some(String::from("yesterday")),
            ..Default::default()
        }
        .validate();
        assert!(matches!(bad, Err(ValidationError::InvalidDate { .. })));

        for trailing in ["2021-03-10garbage", "2021-03-10T", "2021-03-10 12:00"] {
            let result = PetRequest {
                name: Some(String::from("Roger")),
                birth_date: Some(String::from(trailing)),
                ..Default::default()
            }
            .validate();
            assert!(
                matches!(result, Err(ValidationError::InvalidDate { .. })),
                "{trailing} should be rejected"
            );
        }
    }

    #[test]
    fn register_request_normalizes_email() {
        let registration = RegisterRequest {
            first_name: Some(String::from("Edu")),
            last_name: Some(String::from("Galli")),
            email: Some(String::from("Edu@CorreoFalso.com")),
            password: Some(String::from("1234")),
        }
        .validate()
        .unwrap();
        assert_eq!(registration.email, "edu@correofalso.com");
    }

    #[test]
    fn register_request_rejects_missing_and_malformed_fields() {
        let missing = RegisterRequest {
            first_name: Some(String::from("Edu")),
            email: Some(String::from("edu@correofalso.com")),
            password: Some(String::from("1234")),
            ..Default::default()
        }
        .validate();
        assert_eq!(missing, Err(ValidationError::Missing("last_name")));

        let malformed = RegisterRequest {
            first_name: Some(String::from("Edu")),
            last_name: Some(String::from("Galli")),
            email: Some(String::from("not-an-email")),
            password: Some(String::from("1234")),
        }
        .validate();
        assert!(matches!(malformed, Err(ValidationError::InvalidEmail(_))));
    }

    #[test]
    fn adoption_request_defaults_date_to_today() {
        let today = NaiveDate::from_ymd_opt(2024, 11, 21).unwrap();
        let adoption = AdoptionRequest {
            uid: Some(String::from("u1")),
            pid: Some(String::from("p1")),
            adoption_date: None,
        }
        .validate(today)
        .unwrap();
        assert_eq!(adoption.adoption_date, today);

        let missing = AdoptionRequest {
            uid: Some(String::from("u1")),
            ..Default::default()
        }
        .validate(today);
        assert_eq!(missing, Err(ValidationError::Missing("pid")));
    }

    #[test]
    fn public_user_drops_password() {
        let user = User {
            id: String::from("abc"),
            first_name: String::from("Edu"),
            last_name: String::from("Galli"),
            email: String::from("edu@correofalso.com"),
            password: String::from("$argon2id$secret"),
            role: Role::User,
            pets: Vec::new(),
        };
        let json = serde_json::to_value(PublicUser::from(user)).unwrap();
        assert!(json.get("password").is_none());
        assert_eq!(json["_id"], "abc");
        assert_eq!(json["role"], "user");
    }
}
