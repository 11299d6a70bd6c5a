//! State command for renshu.
//!
//! Shows, resets, or lists per-user proficiency state.

use serde::{Deserialize, Serialize};

use crate::core::UserState;
use crate::error::Result;
use crate::proficiency::ProficiencyController;
use crate::storage::StateStore;

/// Number of grammar points shown in human-readable state output.
pub const TOP_GRAMMAR: usize = 5;

/// Options for the state command.
#[derive(Debug, Clone, Default)]
pub struct StateOptions {
    /// Output as JSON.
    pub json: bool,
    /// Suppress output.
    pub quiet: bool,
}

/// What the state command should do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StateAction {
    Show { user_id: String },
    Reset { user_id: String },
    List { limit: usize },
}

/// Output format for the state command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateOutput {
    /// Whether the command was successful.
    pub success: bool,
    /// Affected or listed states.
    pub states: Vec<UserState>,
    /// Whether the state was reset.
    #[serde(default)]
    pub reset: bool,
    /// Error message if command failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl StateOutput {
    /// Create a successful output.
    pub fn success(states: Vec<UserState>, reset: bool) -> Self {
        Self {
            success: true,
            states,
            reset,
            error: None,
        }
    }

    /// Create a failed output.
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            states: vec![],
            reset: false,
            error: Some(error.into()),
        }
    }
}

/// The state command implementation.
pub struct StateCommand<S: StateStore> {
    controller: ProficiencyController<S>,
}

impl<S: StateStore> StateCommand<S> {
    /// Create a new state command.
    pub fn new(store: S) -> Self {
        Self {
            controller: ProficiencyController::new(store),
        }
    }

    /// Run the state command.
    pub fn run(&self, action: &StateAction) -> StateOutput {
        match self.execute(action) {
            Ok(states) => StateOutput::success(states, matches!(action, StateAction::Reset { .. })),
            Err(e) => StateOutput::failure(format!("State command failed: {}", e)),
        }
    }

    fn execute(&self, action: &StateAction) -> Result<Vec<UserState>> {
        match action {
            StateAction::Show { user_id } => Ok(vec![self.controller.load(user_id)?]),
            StateAction::Reset { user_id } => Ok(vec![self.controller.reset(user_id)?]),
            StateAction::List { limit } => self.controller.store().list(*limit),
        }
    }

    /// Format the output based on options.
    pub fn format_output(&self, output: &StateOutput, options: &StateOptions) -> String {
        if options.quiet {
            return String::new();
        }

        if options.json {
            return serde_json::to_string_pretty(output).unwrap_or_else(|_| "{}".to_string());
        }

        if !output.success {
            return output
                .error
                .clone()
                .unwrap_or_else(|| "unknown error".to_string());
        }

        if output.states.is_empty() {
            return "No users found.".to_string();
        }

        let mut blocks: Vec<String> = output.states.iter().map(format_state).collect();
        if output.reset {
            blocks.insert(0, "State reset.".to_string());
        }
        blocks.join("\n\n")
    }
}

/// Human-readable rendering of one user's state, shared with the chat REPL.
pub fn format_state(state: &UserState) -> String {
    let mut lines = vec![
        format!("User: {}", state.user_id),
        format!("Level: {}", state.level),
        format!(
            "Observed: {} seen, {} wrong",
            state.seen_total(),
            state.wrong_total()
        ),
    ];

    let top = state.top_grammar(TOP_GRAMMAR);
    if !top.is_empty() {
        lines.push("Top grammar:".to_string());
        for (name, stats) in top {
            lines.push(format!("  {}  seen {}  wrong {}", name, stats.seen, stats.wrong));
        }
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{GrammarStats, Level};
    use crate::storage::MemoryStateStore;
    use std::sync::Arc;

    fn seeded_store() -> Arc<MemoryStateStore> {
        let store = Arc::new(MemoryStateStore::new());
        let mut state = UserState::new("alice");
        state.level = Level::N3;
        for (i, name) in ["A", "B", "C", "D", "E", "F"].iter().enumerate() {
            state.grammar_stats.insert(
                name.to_string(),
                GrammarStats {
                    seen: (i as u64 + 1) * 10,
                    wrong: 1,
                },
            );
        }
        store.put(&state).unwrap();
        store
    }

    #[test]
    fn test_show_existing_user() {
        let cmd = StateCommand::new(seeded_store());
        let output = cmd.run(&StateAction::Show {
            user_id: "alice".to_string(),
        });

        assert!(output.success);
        assert_eq!(output.states[0].level, Level::N3);
    }

    #[test]
    fn test_show_unknown_user_defaults() {
        let cmd = StateCommand::new(seeded_store());
        let output = cmd.run(&StateAction::Show {
            user_id: "bob".to_string(),
        });

        assert!(output.success);
        assert_eq!(output.states[0], UserState::new("bob"));
    }

    #[test]
    fn test_reset() {
        let store = seeded_store();
        let cmd = StateCommand::new(Arc::clone(&store));
        let output = cmd.run(&StateAction::Reset {
            user_id: "alice".to_string(),
        });

        assert!(output.success);
        assert!(output.reset);
        assert_eq!(store.get("alice").unwrap().unwrap(), UserState::new("alice"));
    }

    #[test]
    fn test_invalid_user_id_fails() {
        let cmd = StateCommand::new(seeded_store());
        let output = cmd.run(&StateAction::Show {
            user_id: "../alice".to_string(),
        });

        assert!(!output.success);
        assert!(output.error.unwrap().contains("invalid user id"));
    }

    #[test]
    fn test_list() {
        let store = seeded_store();
        store.put(&UserState::new("bob")).unwrap();
        let cmd = StateCommand::new(store);

        let output = cmd.run(&StateAction::List { limit: 10 });
        assert_eq!(output.states.len(), 2);
    }

    #[test]
    fn test_format_state_shows_top_five_by_seen() {
        let store = seeded_store();
        let state = store.get("alice").unwrap().unwrap();

        let text = format_state(&state);

        assert!(text.contains("Level: N3"));
        assert!(text.contains("  F  seen 60"));
        assert!(text.contains("  B  seen 20"));
        // Sixth-most-seen point is cut
        assert!(!text.contains("  A  seen 10"));
    }

    #[test]
    fn test_format_output_json() {
        let cmd = StateCommand::new(seeded_store());
        let options = StateOptions {
            json: true,
            ..Default::default()
        };
        let output = cmd.run(&StateAction::Show {
            user_id: "alice".to_string(),
        });

        let value: serde_json::Value =
            serde_json::from_str(&cmd.format_output(&output, &options)).unwrap();
        assert_eq!(value["states"][0]["level"], "N3");
        assert_eq!(value["states"][0]["grammar_stats"]["F"]["seen"], 60);
    }
}
