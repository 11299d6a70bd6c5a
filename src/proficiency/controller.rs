//! Stateful side of proficiency tracking.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tracing::{debug, info};

use crate::core::{Level, TurnResult, UserState};
use crate::error::Result;
use crate::proficiency::policy;
use crate::storage::StateStore;

/// Owns user state during a turn and persists it through a [`StateStore`].
///
/// Read-modify-write sequences for one user run under a per-user lock so
/// concurrent turns for the same user never lose an update. Different users
/// never contend.
#[derive(Debug)]
pub struct ProficiencyController<S: StateStore> {
    store: S,
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl<S: StateStore> ProficiencyController<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// The underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Persisted state for `user_id`, or a fresh default when none exists.
    pub fn load(&self, user_id: &str) -> Result<UserState> {
        match self.store.get(user_id)? {
            Some(state) => Ok(state),
            None => {
                debug!(user_id, "no stored state, using defaults");
                Ok(UserState::new(user_id))
            }
        }
    }

    /// Fold a turn into `state`. See [`policy::record_turn`].
    pub fn record_turn(&self, state: &mut UserState, turn: &TurnResult) {
        policy::record_turn(state, turn);
    }

    /// See [`policy::decide_level`].
    pub fn decide_level(&self, state: &UserState) -> Level {
        policy::decide_level(state)
    }

    /// See [`policy::apply`].
    pub fn apply(&self, state: UserState) -> UserState {
        policy::apply(state)
    }

    /// Persist `state`, overwriting any previous record.
    pub fn save(&self, state: &UserState) -> Result<()> {
        self.store.put(state)
    }

    /// Load, record, apply, and save as one step for `user_id`.
    pub fn observe_turn(&self, user_id: &str, turn: &TurnResult) -> Result<UserState> {
        self.with_user_lock(user_id, || {
            let mut state = self.load(user_id)?;
            self.record_turn(&mut state, turn);
            let state = self.apply(state);
            self.save(&state)?;
            Ok(state)
        })
    }

    /// Clear statistics and drop the user to the lowest tier.
    pub fn reset(&self, user_id: &str) -> Result<UserState> {
        self.with_user_lock(user_id, || {
            let mut state = self.load(user_id)?;
            state.grammar_stats.clear();
            state.level = Level::LOWEST;
            self.save(&state)?;
            info!(user_id, "state reset");
            Ok(state)
        })
    }

    /// Run `f` holding the lock for `user_id`.
    ///
    /// The lock entry is dropped from the table once no other caller holds
    /// it, so the table only ever contains users with work in flight.
    fn with_user_lock<T>(&self, user_id: &str, f: impl FnOnce() -> Result<T>) -> Result<T> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(locks.entry(user_id.to_string()).or_default())
        };

        let result = {
            let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);
            f()
        };

        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        // One reference in the table plus ours: nobody else is waiting.
        if Arc::strong_count(&lock) == 2 {
            locks.remove(user_id);
        }
        result
    }
}
