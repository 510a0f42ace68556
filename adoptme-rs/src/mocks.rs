//! Seeded fixture generation for pets and users.
//!
//! The same seed and count always produce the same names, species, dates and
//! roles. Identifiers are assigned by the store, so they differ between runs.

use chrono::NaiveDate;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use crate::models::{NewPet, Role};

pub const DEFAULT_SEED: u64 = 42;
pub const MOCK_PASSWORD: &str = "coder123";

const PET_NAMES: &[&str] = &[
    "Rambo", "Roger", "Bambi", "Luna", "Toby", "Milo", "Coco", "Nala", "Simba", "Kira", "Rocco",
    "Lola", "Thor", "Maya", "Chispa", "Pelusa",
];
const SPECIES: &[&str] = &["Perro", "Gato", "Conejo", "Hamster", "Loro", "Tortuga"];
const FIRST_NAMES: &[&str] = &[
    "Edu", "Yayo", "Lucia", "Martina", "Tomas", "Sofia", "Mateo", "Valentina", "Julian", "Camila",
];
const LAST_NAMES: &[&str] = &[
    "Galli", "Caceres", "Gomez", "Fernandez", "Lopez", "Diaz", "Martinez", "Romero", "Sosa",
];

/// A generated user before its password is hashed and it is stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockUser {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub role: Role,
}

pub fn mock_pets(count: usize, seed: u64) -> Vec<NewPet> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..count)
        .map(|_| NewPet {
            name: pick(&mut rng, PET_NAMES).to_string(),
            specie: Some(pick(&mut rng, SPECIES).to_string()),
            birth_date: Some(random_birth_date(&mut rng)),
        })
        .collect()
}

/// Emails embed the seed and index so a batch never collides with itself.
pub fn mock_users(count: usize, seed: u64) -> Vec<MockUser> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..count)
        .map(|i| {
            let first_name = pick(&mut rng, FIRST_NAMES);
            let last_name = pick(&mut rng, LAST_NAMES);
            let role = if rng.gen_bool(0.2) {
                Role::Admin
            } else {
                Role::User
            };
            MockUser {
                first_name: first_name.to_string(),
                last_name: last_name.to_string(),
                email: format!(
                    "{}.{}.{seed}.{i}@mock.adoptme.test",
                    first_name.to_ascii_lowercase(),
                    last_name.to_ascii_lowercase()
                ),
                role,
            }
        })
        .collect()
}

fn pick<'a>(rng: &mut StdRng, values: &[&'a str]) -> &'a str {
    values.choose(rng).copied().unwrap_or("Unknown")
}

fn random_birth_date(rng: &mut StdRng) -> NaiveDate {
    let year = rng.gen_range(2010..=2024);
    let month = rng.gen_range(1..=12);
    let day = rng.gen_range(1..=28);
    NaiveDate::from_ymd_opt(year, month, day).unwrap_or_default()
}
