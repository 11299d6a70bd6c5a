//! CLI commands for renshu.
//!
//! Each command follows the same shape: a `XCommand` that does the work and
//! returns a serializable `XOutput`, plus `format_output` for human or JSON
//! rendering. The binary only parses arguments and maps outputs to exit
//! codes.

pub mod chat;
pub mod grammar;
pub mod lesson;
pub mod models;
pub mod scenario;
pub mod state;
pub mod turn;

pub use chat::{ChatResponse, ChatSession};
pub use grammar::{GrammarCommand, GrammarOptions, GrammarOutput};
pub use lesson::{LessonCommand, LessonOptions, LessonOutput};
pub use models::{BackendStatus, ModelsCommand, ModelsOptions, ModelsOutput};
pub use scenario::{ScenarioCommand, ScenarioOptions, ScenarioOutput};
pub use state::{StateAction, StateCommand, StateOptions, StateOutput};
pub use turn::{load_history, TurnCommand, TurnOptions, TurnOutput};
