//! Per-turn result types.
//!
//! A `TurnResult` is built fresh for every turn and never persisted; only
//! its effect on grammar statistics is.

use serde::{Deserialize, Serialize};

use crate::core::Level;

/// A grammar construct matched in a reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrammarPoint {
    pub name: String,
    pub description: String,
    pub example: String,
}

/// A suggested fix for the user's utterance.
///
/// Derived heuristically from unstructured model output, see
/// [`crate::pipeline::parse_correction`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserCorrection {
    pub original: String,
    pub corrected: String,
    pub explain: String,
}

/// Structured output of one turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnResult {
    /// Reply in the practice language.
    pub jp: String,
    /// Translation of `jp` into the learner's language.
    pub zh: String,
    pub user_correction: Option<UserCorrection>,
    pub grammar_ai: Vec<GrammarPoint>,
    /// Only set by the coordinator when the turn was tied to a user.
    pub level: Option<Level>,
}
