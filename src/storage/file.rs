//! File-based user state storage for renshu.
//!
//! Each user's state is stored as `<state_dir>/<user_id>.json`, pretty
//! printed UTF-8 with non-ASCII text written as is. Writes go through a temp
//! file + rename so a crash never leaves a half-written record.

use std::fs;
use std::path::PathBuf;

use tracing::debug;

use crate::config::Config;
use crate::core::UserState;
use crate::error::{CoachError, Result};
use crate::storage::traits::validate_user_id;
use crate::storage::StateStore;
use crate::util::{atomic_write, read_to_string_limited};

/// File-based user state storage.
#[derive(Debug, Clone)]
pub struct FileStateStore {
    /// Directory where state files are stored.
    state_dir: PathBuf,
}

impl FileStateStore {
    /// Create a store in the configured state directory.
    ///
    /// Uses `[storage] state_dir`, `$RENSHU_STATE_DIR`, or
    /// `<renshu home>/user_state`.
    pub fn from_config(config: &Config) -> Result<Self> {
        let dir = config.state_dir().ok_or_else(|| {
            CoachError::config("Could not determine state directory (no home directory)")
        })?;
        Self::with_dir(dir)
    }

    /// Create a store with a custom directory, creating it if needed.
    pub fn with_dir(state_dir: impl Into<PathBuf>) -> Result<Self> {
        let state_dir = state_dir.into();

        if !state_dir.exists() {
            fs::create_dir_all(&state_dir).map_err(|e| CoachError::storage(&state_dir, e))?;
        }

        Ok(Self { state_dir })
    }

    /// The directory holding state files.
    pub fn dir(&self) -> &PathBuf {
        &self.state_dir
    }

    /// Get the path for a user's state file.
    fn state_path(&self, user_id: &str) -> Result<PathBuf> {
        validate_user_id(user_id)?;
        Ok(self.state_dir.join(format!("{}.json", user_id)))
    }
}

impl StateStore for FileStateStore {
    fn get(&self, user_id: &str) -> Result<Option<UserState>> {
        let path = self.state_path(user_id)?;

        if !path.exists() {
            return Ok(None);
        }

        let content = read_to_string_limited(&path)?;
        let state: UserState = serde_json::from_str(&content)?;

        Ok(Some(state))
    }

    fn put(&self, state: &UserState) -> Result<()> {
        let path = self.state_path(&state.user_id)?;
        let json = serde_json::to_string_pretty(state)?;
        atomic_write(&path, json.as_bytes())?;
        debug!(user_id = %state.user_id, level = %state.level, "state saved");
        Ok(())
    }

    fn list(&self, limit: usize) -> Result<Vec<UserState>> {
        if !self.state_dir.exists() {
            return Ok(Vec::new());
        }

        let entries =
            fs::read_dir(&self.state_dir).map_err(|e| CoachError::storage(&self.state_dir, e))?;

        let mut states = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| CoachError::storage(&self.state_dir, e))?;
            let path = entry.path();

            // Skip non-JSON files and temp files
            if path.extension().map(|e| e != "json").unwrap_or(true) {
                continue;
            }
            if path
                .file_name()
                .map(|n| n.to_string_lossy().starts_with('.'))
                .unwrap_or(true)
            {
                continue;
            }

            let parsed = read_to_string_limited(&path)
                .and_then(|content| serde_json::from_str::<UserState>(&content).map_err(Into::into));
            match parsed {
                Ok(state) => states.push(state),
                Err(e) => debug!(path = %path.display(), error = %e, "skipping unreadable state file"),
            }
        }

        states.sort_by(|a, b| a.user_id.cmp(&b.user_id));
        states.truncate(limit);

        Ok(states)
    }

    fn delete(&self, user_id: &str) -> Result<()> {
        let path = self.state_path(user_id)?;

        if path.exists() {
            fs::remove_file(&path).map_err(|e| CoachError::storage(&path, e))?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{GrammarStats, Level};
    use crate::storage::traits::tests::test_state_store_crud;
    use tempfile::TempDir;

    fn create_test_store() -> (FileStateStore, TempDir) {
        let dir = TempDir::new().unwrap();
        let store = FileStateStore::with_dir(dir.path()).unwrap();
        (store, dir)
    }

    #[test]
    fn test_file_state_store_crud() {
        let (store, _dir) = create_test_store();
        test_state_store_crud(&store);
    }

    #[test]
    fn test_with_dir_creates_directory() {
        let dir = TempDir::new().unwrap();
        let state_path = dir.path().join("user_state");

        assert!(!state_path.exists());

        let _store = FileStateStore::with_dir(&state_path).unwrap();

        assert!(state_path.is_dir());
    }

    #[test]
    fn test_state_path() {
        let (store, _dir) = create_test_store();
        let path = store.state_path("alice").unwrap();
        assert!(path.ends_with("alice.json"));
    }

    #[test]
    fn test_invalid_user_ids_rejected() {
        let (store, _dir) = create_test_store();

        assert!(matches!(
            store.get("../escape"),
            Err(CoachError::InvalidUserId { .. })
        ));
        assert!(matches!(
            store.put(&UserState::new("")),
            Err(CoachError::InvalidUserId { .. })
        ));
        assert!(matches!(
            store.delete(".hidden"),
            Err(CoachError::InvalidUserId { .. })
        ));
    }

    #[test]
    fn test_file_is_readable_utf8() {
        let (store, dir) = create_test_store();
        let mut state = UserState::new("alice");
        state
            .grammar_stats
            .insert("～ば～ほど".to_string(), GrammarStats { seen: 2, wrong: 0 });
        store.put(&state).unwrap();

        let raw = fs::read_to_string(dir.path().join("alice.json")).unwrap();
        // Written as is, not \u-escaped
        assert!(raw.contains("～ば～ほど"));
        assert!(raw.contains("\"level\": \"N5\""));
    }

    #[test]
    fn test_unknown_level_loads_as_lowest() {
        let (store, dir) = create_test_store();
        fs::write(
            dir.path().join("bob.json"),
            r#"{"user_id":"bob","level":"expert","grammar_stats":{"～から":{"seen":4,"wrong":1}}}"#,
        )
        .unwrap();

        let state = store.get("bob").unwrap().unwrap();
        assert_eq!(state.level, Level::N5);
        assert_eq!(state.grammar_stats["～から"].seen, 4);
    }

    #[test]
    fn test_corrupt_file_is_error_on_get() {
        let (store, dir) = create_test_store();
        fs::write(dir.path().join("carol.json"), "not valid json").unwrap();

        assert!(matches!(store.get("carol"), Err(CoachError::Serde { .. })));
    }

    #[test]
    fn test_list_sorted_and_limited() {
        let (store, _dir) = create_test_store();
        for id in ["charlie", "alice", "bob"] {
            store.put(&UserState::new(id)).unwrap();
        }

        let ids: Vec<String> = store.list(10).unwrap().into_iter().map(|s| s.user_id).collect();
        assert_eq!(ids, vec!["alice", "bob", "charlie"]);

        assert_eq!(store.list(2).unwrap().len(), 2);
    }

    #[test]
    fn test_list_ignores_temp_and_invalid_files() {
        let (store, dir) = create_test_store();
        store.put(&UserState::new("valid")).unwrap();

        fs::write(dir.path().join(".valid.json.tmp"), "{}").unwrap();
        fs::write(dir.path().join("invalid.json"), "not valid json").unwrap();
        fs::write(dir.path().join("notes.txt"), "hello").unwrap();

        let states = store.list(10).unwrap();
        assert_eq!(states.len(), 1);
        assert_eq!(states[0].user_id, "valid");
    }

    #[test]
    fn test_delete_nonexistent() {
        let (store, _dir) = create_test_store();
        store.delete("nobody").unwrap();
    }
}
