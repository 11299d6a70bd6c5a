//! Renshu - Japanese conversation coach with adaptive difficulty
//!
//! Renshu turns one learner utterance into a structured turn: a correction
//! of what the learner wrote, a reply in Japanese, its translation, and the
//! grammar points the reply uses. For named users the grammar statistics of
//! every turn feed a persistent profile that moves the learner between JLPT
//! levels.

pub mod cli;
pub mod config;
pub mod content;
pub mod coordinator;
pub mod core;
pub mod error;
pub mod gateway;
pub mod grammar;
pub mod pipeline;
pub mod proficiency;
pub mod storage;
pub mod util;

pub use config::Config;
pub use content::ContentLibrary;
pub use coordinator::TurnCoordinator;
pub use core::{
    GrammarPoint, GrammarStats, Level, Message, Role, TurnResult, UserCorrection, UserState,
};
pub use error::{CoachError, Result};
pub use gateway::{ModelBackend, ModelGateway};
pub use grammar::GrammarDetector;
pub use pipeline::TurnPipeline;
pub use proficiency::ProficiencyController;
pub use storage::{FileStateStore, MemoryStateStore, StateStore};

// CLI commands
pub use cli::{
    ChatSession, GrammarCommand, LessonCommand, ModelsCommand, ScenarioCommand, StateCommand,
    TurnCommand,
};
