//! Document store: users, pets and adoptions held in sharded concurrent maps.
//!
//! Opened once at startup from a URL:
//!
//! - `memory://` keeps documents for the lifetime of the process.
//! - `file://<path>` loads a JSON snapshot at open and rewrites it after every
//!   mutation (temp file + rename) and on [`Database::close`].
//!
//! Writes that must not race are done under the owning map's shard lock: the
//! email index goes through the entry API, and adoption flips a pet with
//! `get_mut` so that only one caller can observe `adopted == false`.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::NaiveDate;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::models::{Adoption, NewPet, NewUser, Pet, PetUpdate, User, UserUpdate};

#[derive(Debug, Error)]
pub enum DbError {
    #[error("unsupported database url {0} (expected memory:// or file://<path>)")]
    UnsupportedUrl(String),
    #[error("failed to read snapshot {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("invalid snapshot in {path}: {source}")]
    Parse {
        path: String,
        source: serde_json::Error,
    },
    #[error("failed to write snapshot {path}: {source}")]
    Write {
        path: String,
        source: std::io::Error,
    },
    #[error("email already registered: {0}")]
    DuplicateEmail(String),
    #[error("user not found: {0}")]
    UserNotFound(String),
    #[error("pet not found: {0}")]
    PetNotFound(String),
    #[error("adoption not found: {0}")]
    AdoptionNotFound(String),
    #[error("pet is already adopted: {0}")]
    AlreadyAdopted(String),
    #[error("pet {0} is adopted and cannot be deleted")]
    PetAdopted(String),
    #[error("user {0} has adopted pets and cannot be deleted")]
    UserHasPets(String),
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct Snapshot {
    #[serde(default)]
    users: Vec<User>,
    #[serde(default)]
    pets: Vec<Pet>,
    #[serde(default)]
    adoptions: Vec<Adoption>,
}

#[derive(Debug, Default)]
struct Collections {
    users: DashMap<String, User>,
    /// Lowercased email -> user id.
    emails: DashMap<String, String>,
    pets: DashMap<String, Pet>,
    adoptions: DashMap<String, Adoption>,
}

#[derive(Debug)]
struct Inner {
    collections: Collections,
    snapshot_path: Option<PathBuf>,
    /// Serializes snapshot writers.
    flush_lock: Mutex<()>,
}

/// Shared handle to the document store. Cloning is cheap.
#[derive(Debug, Clone)]
pub struct Database {
    inner: Arc<Inner>,
}

impl Database {
    pub fn in_memory() -> Self {
        Self::from_parts(Collections::default(), None)
    }

    pub async fn open(url: &str) -> Result<Self, DbError> {
        if let Some(rest) = url.strip_prefix("memory://") {
            if !rest.is_empty() {
                debug!(name = rest, "memory database name is ignored");
            }
            return Ok(Self::in_memory());
        }

        let Some(path) = url.strip_prefix("file://").filter(|p| !p.is_empty()) else {
            return Err(DbError::UnsupportedUrl(url.to_string()));
        };
        let path = PathBuf::from(path);
        let snapshot = read_snapshot(&path).await?;
        info!(
            path = %path.display(),
            users = snapshot.users.len(),
            pets = snapshot.pets.len(),
            adoptions = snapshot.adoptions.len(),
            "snapshot loaded"
        );
        Ok(Self::from_parts(Collections::from(snapshot), Some(path)))
    }

    fn from_parts(collections: Collections, snapshot_path: Option<PathBuf>) -> Self {
        Self {
            inner: Arc::new(Inner {
                collections,
                snapshot_path,
                flush_lock: Mutex::new(()),
            }),
        }
    }

    pub fn backend(&self) -> &'static str {
        if self.inner.snapshot_path.is_some() {
            "file"
        } else {
            "memory"
        }
    }

    /// Flush outstanding state. Call once on shutdown.
    pub async fn close(&self) -> Result<(), DbError> {
        self.persist().await?;
        info!(backend = self.backend(), "database closed");
        Ok(())
    }

    fn cols(&self) -> &Collections {
        &self.inner.collections
    }

    // users

    pub async fn create_user(&self, new_user: NewUser) -> Result<User, DbError> {
        let id = new_id();
        let key = new_user.email.to_ascii_lowercase();
        match self.cols().emails.entry(key) {
            Entry::Occupied(_) => return Err(DbError::DuplicateEmail(new_user.email)),
            Entry::Vacant(entry) => {
                entry.insert(id.clone());
            }
        }

        let user = User {
            id: id.clone(),
            first_name: new_user.first_name,
            last_name: new_user.last_name,
            email: new_user.email,
            password: new_user.password_hash,
            role: new_user.role,
            pets: Vec::new(),
        };
        self.cols().users.insert(id, user.clone());
        self.persist().await?;
        Ok(user)
    }

    pub fn users(&self) -> Vec<User> {
        sorted_values(&self.cols().users, |u| &u.id)
    }

    pub fn user(&self, id: &str) -> Option<User> {
        self.cols().users.get(id).map(|u| u.value().clone())
    }

    pub fn user_by_email(&self, email: &str) -> Option<User> {
        let id = self
            .cols()
            .emails
            .get(&email.to_ascii_lowercase())
            .map(|id| id.value().clone())?;
        self.user(&id)
    }

    pub async fn update_user(&self, id: &str, update: UserUpdate) -> Result<User, DbError> {
        let updated = {
            let mut user = self
                .cols()
                .users
                .get_mut(id)
                .ok_or_else(|| DbError::UserNotFound(id.to_string()))?;
            if let Some(first_name) = update.first_name {
                user.first_name = first_name;
            }
            if let Some(last_name) = update.last_name {
                user.last_name = last_name;
            }
            if let Some(role) = update.role {
                user.role = role;
            }
            user.clone()
        };
        self.persist().await?;
        Ok(updated)
    }

    pub async fn delete_user(&self, id: &str) -> Result<User, DbError> {
        let Some((_, user)) = self.cols().users.remove_if(id, |_, u| u.pets.is_empty()) else {
            return Err(if self.cols().users.contains_key(id) {
                DbError::UserHasPets(id.to_string())
            } else {
                DbError::UserNotFound(id.to_string())
            });
        };
        self.cols().emails.remove(&user.email.to_ascii_lowercase());
        self.persist().await?;
        Ok(user)
    }

    // pets

    pub async fn create_pet(&self, new_pet: NewPet) -> Result<Pet, DbError> {
        let pet = self.insert_pet(new_pet);
        self.persist().await?;
        Ok(pet)
    }

    /// Insert many pets with a single snapshot write.
    pub async fn create_pets(&self, new_pets: Vec<NewPet>) -> Result<Vec<Pet>, DbError> {
        let created = new_pets
            .into_iter()
            .map(|new_pet| self.insert_pet(new_pet))
            .collect();
        self.persist().await?;
        Ok(created)
    }

    fn insert_pet(&self, new_pet: NewPet) -> Pet {
        let pet = Pet {
            id: new_id(),
            name: new_pet.name,
            specie: new_pet.specie,
            birth_date: new_pet.birth_date,
            adopted: false,
            owner: None,
        };
        self.cols().pets.insert(pet.id.clone(), pet.clone());
        pet
    }

    pub fn pets(&self) -> Vec<Pet> {
        sorted_values(&self.cols().pets, |p| &p.id)
    }

    pub fn pet(&self, id: &str) -> Option<Pet> {
        self.cols().pets.get(id).map(|p| p.value().clone())
    }

    pub async fn update_pet(&self, id: &str, update: PetUpdate) -> Result<Pet, DbError> {
        let updated = {
            let mut pet = self
                .cols()
                .pets
                .get_mut(id)
                .ok_or_else(|| DbError::PetNotFound(id.to_string()))?;
            if let Some(name) = update.name {
                pet.name = name;
            }
            if let Some(specie) = update.specie {
                pet.specie = Some(specie);
            }
            if let Some(birth_date) = update.birth_date {
                pet.birth_date = Some(birth_date);
            }
            pet.clone()
        };
        self.persist().await?;
        Ok(updated)
    }

    pub async fn delete_pet(&self, id: &str) -> Result<Pet, DbError> {
        let Some((_, pet)) = self.cols().pets.remove_if(id, |_, p| !p.adopted) else {
            return Err(if self.cols().pets.contains_key(id) {
                DbError::PetAdopted(id.to_string())
            } else {
                DbError::PetNotFound(id.to_string())
            });
        };
        self.persist().await?;
        Ok(pet)
    }

    // adoptions

    /// Pair a user with an unadopted pet.
    ///
    /// The pet is flipped to adopted while its shard lock is held, so
    /// concurrent calls for the same pet see exactly one success.
    pub async fn adopt(
        &self,
        uid: &str,
        pid: &str,
        adoption_date: NaiveDate,
    ) -> Result<Adoption, DbError> {
        if !self.cols().users.contains_key(uid) {
            return Err(DbError::UserNotFound(uid.to_string()));
        }

        {
            let mut pet = self
                .cols()
                .pets
                .get_mut(pid)
                .ok_or_else(|| DbError::PetNotFound(pid.to_string()))?;
            if pet.adopted {
                return Err(DbError::AlreadyAdopted(pid.to_string()));
            }
            pet.adopted = true;
            pet.owner = Some(uid.to_string());
        }

        let linked = match self.cols().users.get_mut(uid) {
            Some(mut user) => {
                user.pets.push(pid.to_string());
                true
            }
            None => false,
        };
        if !linked {
            // User was deleted between the existence check and the link.
            if let Some(mut pet) = self.cols().pets.get_mut(pid) {
                pet.adopted = false;
                pet.owner = None;
            }
            return Err(DbError::UserNotFound(uid.to_string()));
        }

        let adoption = Adoption {
            id: new_id(),
            uid: uid.to_string(),
            pid: pid.to_string(),
            adoption_date,
        };
        self.cols()
            .adoptions
            .insert(adoption.id.clone(), adoption.clone());
        self.persist().await?;
        Ok(adoption)
    }

    pub fn adoptions(&self) -> Vec<Adoption> {
        sorted_values(&self.cols().adoptions, |a| &a.id)
    }

    pub fn adoption(&self, id: &str) -> Result<Adoption, DbError> {
        self.cols()
            .adoptions
            .get(id)
            .map(|a| a.value().clone())
            .ok_or_else(|| DbError::AdoptionNotFound(id.to_string()))
    }

    pub fn counts(&self) -> (usize, usize, usize) {
        let cols = self.cols();
        (cols.users.len(), cols.pets.len(), cols.adoptions.len())
    }

    async fn persist(&self) -> Result<(), DbError> {
        let Some(path) = self.inner.snapshot_path.as_deref() else {
            return Ok(());
        };
        let _guard = self.inner.flush_lock.lock().await;
        let snapshot = Snapshot {
            users: self.users(),
            pets: self.pets(),
            adoptions: self.adoptions(),
        };
        write_snapshot(path, &snapshot).await
    }
}

impl From<Snapshot> for Collections {
    fn from(snapshot: Snapshot) -> Self {
        let collections = Collections::default();
        for user in snapshot.users {
            collections
                .emails
                .insert(user.email.to_ascii_lowercase(), user.id.clone());
            collections.users.insert(user.id.clone(), user);
        }
        for pet in snapshot.pets {
            collections.pets.insert(pet.id.clone(), pet);
        }
        for adoption in snapshot.adoptions {
            collections.adoptions.insert(adoption.id.clone(), adoption);
        }
        collections
    }
}

/// Time-ordered identifier; sorting by id yields insertion order.
pub fn new_id() -> String {
    uuid::Uuid::now_v7().simple().to_string()
}

fn sorted_values<T: Clone>(map: &DashMap<String, T>, key: impl Fn(&T) -> &String) -> Vec<T> {
    let mut values: Vec<T> = map.iter().map(|entry| entry.value().clone()).collect();
    values.sort_by(|a, b| key(a).cmp(key(b)));
    values
}

async fn read_snapshot(path: &Path) -> Result<Snapshot, DbError> {
    let raw = match tokio::fs::read_to_string(path).await {
        Ok(raw) => raw,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return Ok(Snapshot::default());
        }
        Err(source) => {
            return Err(DbError::Read {
                path: path.display().to_string(),
                source,
            })
        }
    };
    if raw.trim().is_empty() {
        return Ok(Snapshot::default());
    }
    serde_json::from_str(&raw).map_err(|source| DbError::Parse {
        path: path.display().to_string(),
        source,
    })
}

async fn write_snapshot(path: &Path, snapshot: &Snapshot) -> Result<(), DbError> {
    let write_err = |source| DbError::Write {
        path: path.display().to_string(),
        source,
    };
    let body = serde_json::to_vec_pretty(snapshot)
        .map_err(|e| write_err(std::io::Error::new(std::io::ErrorKind::InvalidData, e)))?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(write_err)?;
    }
    let tmp = path.with_extension("json.tmp");
    tokio::fs::write(&tmp, body).await.map_err(write_err)?;
    tokio::fs::rename(&tmp, path).await.map_err(write_err)
}
