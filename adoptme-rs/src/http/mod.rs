//! HTTP layer: Axum router, resource handlers and the JSON envelope.
//!
//! Mounts `/api/users`, `/api/pets`, `/api/adoptions`, `/api/sessions` and
//! `/api/mocks`, plus `/health` and the `/apidocs` viewer.

mod adoptions;
mod auth;
mod error;
mod handlers;
mod mocks;
mod pets;
mod responses;
mod sessions;
mod state;
mod users;


pub use handlers::router;
pub use state::AppState;
