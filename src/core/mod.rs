//! Core value types for renshu.
//!
//! Conversation messages, per-turn results, and the persistent per-user
//! proficiency record.

pub mod message;
pub mod turn;
pub mod user_state;

pub use message::{Message, Role};
pub use turn::{GrammarPoint, TurnResult, UserCorrection};
pub use user_state::{GrammarStats, Level, UserState};
