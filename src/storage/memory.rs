//! In-memory user state storage.
//!
//! Thread-safe and non-persistent; used by tests and by embedders that keep
//! state elsewhere.

use std::collections::BTreeMap;
use std::sync::{PoisonError, RwLock};

use crate::core::UserState;
use crate::error::Result;
use crate::storage::traits::validate_user_id;
use crate::storage::StateStore;

/// In-memory state store backed by `RwLock<BTreeMap>`.
#[derive(Debug, Default)]
pub struct MemoryStateStore {
    states: RwLock<BTreeMap<String, UserState>>,
}

impl MemoryStateStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored users.
    pub fn len(&self) -> usize {
        self.states.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Check if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove every record.
    pub fn clear(&self) {
        self.states
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl StateStore for MemoryStateStore {
    fn get(&self, user_id: &str) -> Result<Option<UserState>> {
        validate_user_id(user_id)?;
        let states = self.states.read().unwrap_or_else(PoisonError::into_inner);
        Ok(states.get(user_id).cloned())
    }

    fn put(&self, state: &UserState) -> Result<()> {
        validate_user_id(&state.user_id)?;
        let mut states = self.states.write().unwrap_or_else(PoisonError::into_inner);
        states.insert(state.user_id.clone(), state.clone());
        Ok(())
    }

    fn list(&self, limit: usize) -> Result<Vec<UserState>> {
        let states = self.states.read().unwrap_or_else(PoisonError::into_inner);
        Ok(states.values().take(limit).cloned().collect())
    }

    fn delete(&self, user_id: &str) -> Result<()> {
        validate_user_id(user_id)?;
        let mut states = self.states.write().unwrap_or_else(PoisonError::into_inner);
        states.remove(user_id);
        Ok(())
    }
}
