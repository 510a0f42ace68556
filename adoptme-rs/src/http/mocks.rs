use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use tracing::{debug, info};

use crate::auth::hash_password_blocking;
use crate::db::{new_id, DbError};
use crate::mocks::{mock_pets, mock_users, DEFAULT_SEED, MOCK_PASSWORD};
use crate::models::{NewUser, Pet, PublicUser};

use super::error::ApiError;
use super::responses::{json_body, query_params, Envelope, GeneratedCounts};
use super::state::AppState;

const MAX_MOCK_COUNT: usize = 1000;

#[derive(Debug, Default, Deserialize)]
struct MockQuery {
    count: Option<usize>,
    seed: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct GenerateRequest {
    #[serde(default)]
    users: usize,
    #[serde(default)]
    pets: usize,
    seed: Option<u64>,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/mockingpets", get(mocking_pets))
        .route("/mockingusers", get(mocking_users))
        .route("/generateData", post(generate_data))
}

async fn mocking_pets(
    query: Result<Query<MockQuery>, QueryRejection>,
) -> Result<Json<Envelope<Vec<Pet>>>, ApiError> {
    let params = query_params(query)?;
    let count = checked_count(params.count.unwrap_or(100))?;
    let pets = mock_pets(count, params.seed.unwrap_or(DEFAULT_SEED))
        .into_iter()
        .map(|new_pet| Pet {
            id: new_id(),
            name: new_pet.name,
            specie: new_pet.specie,
            birth_date: new_pet.birth_date,
            adopted: false,
            owner: None,
        })
        .collect();
    debug!(count, "mock pets generated");
    Ok(Json(Envelope::success(pets)))
}

async fn mocking_users(
    query: Result<Query<MockQuery>, QueryRejection>,
) -> Result<Json<Envelope<Vec<PublicUser>>>, ApiError> {
    let params = query_params(query)?;
    let count = checked_count(params.count.unwrap_or(50))?;
    let users = mock_users(count, params.seed.unwrap_or(DEFAULT_SEED))
        .into_iter()
        .map(|mock| PublicUser {
            id: new_id(),
            first_name: mock.first_name,
            last_name: mock.last_name,
            email: mock.email,
            role: mock.role,
            pets: Vec::new(),
        })
        .collect();
    debug!(count, "mock users generated");
    Ok(Json(Envelope::success(users)))
}

async fn generate_data(
    State(state): State<AppState>,
    payload: Result<Json<GenerateRequest>, JsonRejection>,
) -> Result<Json<Envelope<GeneratedCounts>>, ApiError> {
    let request = json_body(payload)?;
    let user_count = checked_count(request.users)?;
    let pet_count = checked_count(request.pets)?;
    let seed = request.seed.unwrap_or(DEFAULT_SEED);

    let mut counts = GeneratedCounts {
        users_inserted: 0,
        users_skipped: 0,
        pets_inserted: 0,
    };

    if user_count > 0 {
        // One hash shared by every fixture user.
        let password_hash = hash_password_blocking(MOCK_PASSWORD.to_string()).await?;
        for mock in mock_users(user_count, seed) {
            let result = state
                .db
                .create_user(NewUser {
                    first_name: mock.first_name,
                    last_name: mock.last_name,
                    email: mock.email,
                    password_hash: password_hash.clone(),
                    role: mock.role,
                })
                .await;
            match result {
                Ok(_) => counts.users_inserted += 1,
                Err(DbError::DuplicateEmail(_)) => counts.users_skipped += 1,
                Err(err) => return Err(err.into()),
            }
        }
    }

    if pet_count > 0 {
        counts.pets_inserted = state.db.create_pets(mock_pets(pet_count, seed)).await?.len();
    }

    info!(
        seed,
        users_inserted = counts.users_inserted,
        users_skipped = counts.users_skipped,
        pets_inserted = counts.pets_inserted,
        "mock data generated"
    );
    Ok(Json(
        Envelope::success(counts).with_message("Mock data generated"),
    ))
}

fn checked_count(count: usize) -> Result<usize, ApiError> {
    if count > MAX_MOCK_COUNT {
        return Err(ApiError::BadRequest(format!(
            "count must be at most {MAX_MOCK_COUNT}"
        )));
    }
    Ok(count)
}
