//! User state storage traits for renshu.
//!
//! This module defines the `StateStore` trait for proficiency persistence.

use std::sync::Arc;

use crate::core::UserState;
use crate::error::{CoachError, Result};

/// Trait for user state storage backends.
///
/// One record per user id. `put` overwrites unconditionally (last write
/// wins); callers that need read-modify-write atomicity serialise above
/// the store.
pub trait StateStore: Send + Sync {
    /// Retrieve a user's state.
    ///
    /// Returns `Ok(None)` if nothing has been stored for the user.
    fn get(&self, user_id: &str) -> Result<Option<UserState>>;

    /// Save a user's state, replacing any previous record.
    fn put(&self, state: &UserState) -> Result<()>;

    /// List stored states, ordered by user id, at most `limit`.
    fn list(&self, limit: usize) -> Result<Vec<UserState>>;

    /// Delete a user's state.
    ///
    /// Returns `Ok(())` even if the user has no record.
    fn delete(&self, user_id: &str) -> Result<()>;

    /// Check if a user has a stored record.
    fn exists(&self, user_id: &str) -> Result<bool> {
        Ok(self.get(user_id)?.is_some())
    }
}

/// Blanket implementation of StateStore for Arc-wrapped stores.
///
/// This allows sharing one store between a controller and test assertions.
impl<T: StateStore + ?Sized> StateStore for Arc<T> {
    fn get(&self, user_id: &str) -> Result<Option<UserState>> {
        (**self).get(user_id)
    }

    fn put(&self, state: &UserState) -> Result<()> {
        (**self).put(state)
    }

    fn list(&self, limit: usize) -> Result<Vec<UserState>> {
        (**self).list(limit)
    }

    fn delete(&self, user_id: &str) -> Result<()> {
        (**self).delete(user_id)
    }
}

/// Reject ids that are unusable as a storage key.
///
/// Empty ids, ids starting with `.`, and ids containing path separators or
/// NUL are refused so a user id can never escape the state directory.
pub fn validate_user_id(user_id: &str) -> Result<()> {
    let invalid = user_id.is_empty()
        || user_id.starts_with('.')
        || user_id.contains(['/', '\\', '\0']);
    if invalid {
        return Err(CoachError::invalid_user_id(user_id));
    }
    Ok(())
}

/// Test utilities for StateStore implementations.
#[cfg(test)]
pub mod tests {
    use super::*;
    use crate::core::{GrammarStats, Level};

    /// Test helper to verify StateStore implementations.
    pub fn test_state_store_crud<S: StateStore>(store: &S) {
        let mut state = UserState::new("学習者-1");
        state.level = Level::N3;
        state
            .grammar_stats
            .insert("～うちに".to_string(), GrammarStats { seen: 3, wrong: 1 });

        // Initially should not exist
        assert!(!store.exists(&state.user_id).unwrap());
        assert!(store.get(&state.user_id).unwrap().is_none());

        store.put(&state).unwrap();

        assert!(store.exists(&state.user_id).unwrap());

        // Unicode keys and values survive the round trip
        let retrieved = store.get(&state.user_id).unwrap().unwrap();
        assert_eq!(retrieved, state);

        // Last write wins
        state.level = Level::N2;
        state.grammar_stats.clear();
        store.put(&state).unwrap();
        assert_eq!(store.get(&state.user_id).unwrap().unwrap(), state);

        let states = store.list(10).unwrap();
        assert_eq!(states.len(), 1);
        assert_eq!(states[0].user_id, state.user_id);

        store.delete(&state.user_id).unwrap();

        assert!(!store.exists(&state.user_id).unwrap());
        assert!(store.get(&state.user_id).unwrap().is_none());

        // Delete again should succeed
        store.delete(&state.user_id).unwrap();
    }

    #[test]
    fn test_validate_user_id() {
        assert!(validate_user_id("alice").is_ok());
        assert!(validate_user_id("山田太郎").is_ok());
        assert!(validate_user_id("user.name").is_ok());

        for bad in ["", ".hidden", "..", "a/b", "a\\b", "../etc/passwd", "a\0b"] {
            assert!(
                matches!(validate_user_id(bad), Err(CoachError::InvalidUserId { .. })),
                "{bad:?} should be rejected"
            );
        }
    }
}
