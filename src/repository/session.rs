//! Current-user session

use std::path::{Path, PathBuf};
use serde::{Deserialize, Serialize};
use tracing::debug;
use crate::domain::aggregates::User;
use super::{check_version, read_json, remove_file, write_json, SessionStore, StoreError, RECORD_VERSION};

#[derive(Debug, Serialize, Deserialize)]
struct SessionRecord {
    version: u32,
    user: User,
}

#[derive(Clone, Debug, Default)]
pub struct InMemorySessionStore { user: Option<User> }

impl InMemorySessionStore {
    pub fn new() -> Self { Self::default() }
}

impl SessionStore for InMemorySessionStore {
    fn current_user(&self) -> Result<Option<User>, StoreError> { Ok(self.user.clone()) }
    fn sign_in(&mut self, user: &User) -> Result<(), StoreError> {
        self.user = Some(user.clone());
        Ok(())
    }
    fn sign_out(&mut self) -> Result<(), StoreError> {
        self.user = None;
        Ok(())
    }
}

#[derive(Clone, Debug)]
pub struct JsonFileSessionStore { path: PathBuf }

impl JsonFileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self { Self { path: path.into() } }
    pub fn path(&self) -> &Path { &self.path }
}

impl SessionStore for JsonFileSessionStore {
    fn current_user(&self) -> Result<Option<User>, StoreError> {
        let Some(record) = read_json::<SessionRecord>(&self.path)? else { return Ok(None) };
        check_version(record.version)?;
        Ok(Some(record.user))
    }

    fn sign_in(&mut self, user: &User) -> Result<(), StoreError> {
        debug!(user_id = %user.id, "session saved");
        write_json(&self.path, &SessionRecord { version: RECORD_VERSION, user: user.clone() })
    }

    fn sign_out(&mut self) -> Result<(), StoreError> {
        debug!("session cleared");
        remove_file(&self.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::aggregates::Role;

    fn john() -> User {
        User { id: "2".into(), name: "John Doe".into(), email: "johndoe@quicksell.com".into(), role: Role::Customer }
    }

    #[test]
    fn test_file_session_lifecycle() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = JsonFileSessionStore::new(dir.path().join("session.json"));
        assert_eq!(store.current_user().unwrap(), None);
        store.sign_in(&john()).unwrap();
        assert_eq!(store.current_user().unwrap(), Some(john()));
        store.sign_out().unwrap();
        assert_eq!(store.current_user().unwrap(), None);
        store.sign_out().unwrap();
    }

    #[test]
    fn test_memory_session() {
        let mut store = InMemorySessionStore::new();
        store.sign_in(&john()).unwrap();
        assert!(!store.current_user().unwrap().unwrap().is_admin());
    }
}
