//! Turn command for renshu.
//!
//! Runs a single conversational turn and prints the reply, translation,
//! correction, grammar points, and (for a named user) the resulting level.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::coordinator::TurnCoordinator;
use crate::core::{Message, TurnResult};
use crate::error::{CoachError, Result};
use crate::storage::StateStore;
use crate::util::read_to_string_limited;

/// Options for the turn command.
#[derive(Debug, Clone, Default)]
pub struct TurnOptions {
    /// Output as JSON.
    pub json: bool,
    /// Suppress output.
    pub quiet: bool,
    /// Track proficiency for this user.
    pub user_id: Option<String>,
    /// Prior conversation, oldest first.
    pub history: Vec<Message>,
}

/// Output format for the turn command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnOutput {
    /// Whether the command was successful.
    pub success: bool,
    /// The turn result.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub turn: Option<TurnResult>,
    /// Error message if command failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TurnOutput {
    /// Create a successful output.
    pub fn success(turn: TurnResult) -> Self {
        Self {
            success: true,
            turn: Some(turn),
            error: None,
        }
    }

    /// Create a failed output.
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            turn: None,
            error: Some(error.into()),
        }
    }
}

/// The turn command implementation.
pub struct TurnCommand<S: StateStore> {
    coordinator: TurnCoordinator<S>,
}

impl<S: StateStore> TurnCommand<S> {
    /// Create a new turn command.
    pub fn new(coordinator: TurnCoordinator<S>) -> Self {
        Self { coordinator }
    }

    /// Run the turn command.
    pub fn run(&self, text: &str, options: &TurnOptions) -> TurnOutput {
        let text = text.trim();
        if text.is_empty() {
            return TurnOutput::failure("Nothing to say: text is empty");
        }

        let history = (!options.history.is_empty()).then_some(options.history.as_slice());
        match self
            .coordinator
            .run_turn_for_user(text, history, options.user_id.as_deref())
        {
            Ok(turn) => TurnOutput::success(turn),
            Err(e) => TurnOutput::failure(format!("Turn failed: {}", e)),
        }
    }

    /// Format the output based on options.
    pub fn format_output(&self, output: &TurnOutput, options: &TurnOptions) -> String {
        if options.quiet {
            return String::new();
        }

        if options.json {
            serde_json::to_string_pretty(output).unwrap_or_else(|_| "{}".to_string())
        } else {
            match (&output.turn, &output.error) {
                (Some(turn), _) => format_turn(turn),
                (None, error) => error.clone().unwrap_or_else(|| "unknown error".to_string()),
            }
        }
    }
}

/// Human-readable rendering of a turn, shared with the chat REPL.
pub fn format_turn(turn: &TurnResult) -> String {
    let mut lines = vec![format!("AI: {}", turn.jp), format!("译: {}", turn.zh)];

    if let Some(correction) = &turn.user_correction {
        lines.push(String::new());
        lines.push(format!("Correction: {}", correction.corrected));
        for line in correction.explain.lines() {
            lines.push(format!("  {}", line));
        }
    }

    if !turn.grammar_ai.is_empty() {
        lines.push(String::new());
        lines.push("Grammar:".to_string());
        for point in &turn.grammar_ai {
            lines.push(format!("  {}  {}", point.name, point.description));
            lines.push(format!("      e.g. {}", point.example));
        }
    }

    if let Some(level) = turn.level {
        lines.push(String::new());
        lines.push(format!("Level: {}", level));
    }

    lines.join("\n")
}

/// Load a conversation history file: a JSON array of `{role, content}`.
pub fn load_history(path: &Path) -> Result<Vec<Message>> {
    let content = read_to_string_limited(path)?;
    serde_json::from_str(&content)
        .map_err(|e| CoachError::serde(format!("invalid history file {}: {}", path.display(), e)))
}
