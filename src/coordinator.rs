//! Top-level entry point binding turns to user state.
//!
//! The coordinator is the surface external callers use: run a turn with an
//! optional user id, inspect a user's state, or reset it.

use tracing::debug;

use crate::config::Config;
use crate::core::{Message, TurnResult, UserState};
use crate::error::Result;
use crate::gateway::create_gateway;
use crate::pipeline::TurnPipeline;
use crate::proficiency::ProficiencyController;
use crate::storage::{FileStateStore, StateStore};

/// Runs turns and, when a user is named, folds them into that user's state.
#[derive(Debug)]
pub struct TurnCoordinator<S: StateStore> {
    pipeline: TurnPipeline,
    proficiency: ProficiencyController<S>,
}

impl TurnCoordinator<FileStateStore> {
    /// Build the gateway, detector, prompts, and file store from `config`.
    pub fn from_config(config: &Config) -> Result<Self> {
        let pipeline = TurnPipeline::new(create_gateway(&config.llm)?, config.detector())
            .with_prompts(config.prompts.clone());
        let store = FileStateStore::from_config(config)?;
        Ok(Self::new(pipeline, store))
    }
}

impl<S: StateStore> TurnCoordinator<S> {
    pub fn new(pipeline: TurnPipeline, store: S) -> Self {
        Self {
            pipeline,
            proficiency: ProficiencyController::new(store),
        }
    }

    pub fn pipeline(&self) -> &TurnPipeline {
        &self.pipeline
    }

    pub fn proficiency(&self) -> &ProficiencyController<S> {
        &self.proficiency
    }

    /// Run one turn, tracking proficiency only when `user_id` is given.
    ///
    /// A blank `user_id` counts as absent. State is touched only after the
    /// whole pipeline has succeeded; a failed turn writes nothing.
    pub fn run_turn_for_user(
        &self,
        user_text: &str,
        history: Option<&[Message]>,
        user_id: Option<&str>,
    ) -> Result<TurnResult> {
        let mut turn = self.pipeline.run_turn(user_text, history)?;

        let Some(user_id) = user_id.filter(|id| !id.trim().is_empty()) else {
            debug!("anonymous turn, proficiency not tracked");
            return Ok(turn);
        };

        let state = self.proficiency.observe_turn(user_id, &turn)?;
        turn.level = Some(state.level);
        Ok(turn)
    }

    /// Current state for `user_id` (defaults when none is stored).
    pub fn get_user_state(&self, user_id: &str) -> Result<UserState> {
        self.proficiency.load(user_id)
    }

    /// Reset `user_id` to the lowest tier with no statistics.
    pub fn reset_user_state(&self, user_id: &str) -> Result<UserState> {
        self.proficiency.reset(user_id)
    }
}
