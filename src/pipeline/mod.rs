//! Turn orchestration.
//!
//! Turns one user utterance into a [`crate::core::TurnResult`] through a
//! fixed sequence of model calls and grammar detection.

pub mod correction;
pub mod prompts;
pub mod turn;

pub use correction::parse_correction;
pub use prompts::{render, PromptSet};
pub use turn::TurnPipeline;
