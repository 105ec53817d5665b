//! Persistence seams for orders and the signed-in session
//!
//! Both stores persist one JSON document each, wrapped with a format version.
//! The whole document is rewritten on every save, so two writers sharing a
//! file race and the last one wins.

pub mod orders;
pub mod session;

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;
use crate::domain::aggregates::{Order, OrderError, User};

pub use orders::{InMemoryOrderRepository, JsonFileOrderRepository, OrderChange, OrderStore};
pub use session::{InMemorySessionStore, JsonFileSessionStore};

/// Current on-disk record format.
pub const RECORD_VERSION: u32 = 1;

pub trait OrderRepository {
    fn load(&self) -> Result<Vec<Order>, StoreError>;
    fn save(&mut self, orders: &[Order]) -> Result<(), StoreError>;
}

pub trait SessionStore {
    fn current_user(&self) -> Result<Option<User>, StoreError>;
    fn sign_in(&mut self, user: &User) -> Result<(), StoreError>;
    fn sign_out(&mut self) -> Result<(), StoreError>;
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("order {0} not found")]
    NotFound(String),
    #[error("i/o error on {}: {source}", path.display())]
    Io { path: PathBuf, source: std::io::Error },
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("unsupported record version {found}, expected {}", RECORD_VERSION)]
    UnsupportedVersion { found: u32 },
    #[error(transparent)]
    Order(#[from] OrderError),
}

fn check_version(found: u32) -> Result<(), StoreError> {
    if found != RECORD_VERSION { return Err(StoreError::UnsupportedVersion { found }); }
    Ok(())
}

/// Reads a JSON document; a missing file is `None`.
fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, StoreError> {
    match fs::read_to_string(path) {
        Ok(raw) => Ok(Some(serde_json::from_str(&raw)?)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(source) => Err(StoreError::Io { path: path.to_path_buf(), source }),
    }
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), StoreError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| StoreError::Io { path: parent.to_path_buf(), source })?;
    }
    let raw = serde_json::to_string_pretty(value)?;
    fs::write(path, raw).map_err(|source| StoreError::Io { path: path.to_path_buf(), source })
}

fn remove_file(path: &Path) -> Result<(), StoreError> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(source) => Err(StoreError::Io { path: path.to_path_buf(), source }),
    }
}
