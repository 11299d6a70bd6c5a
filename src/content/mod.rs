//! Static lesson and scenario content.
//!
//! Content is read-only data loaded once into a [`ContentLibrary`] and
//! handed to whoever needs it.

pub mod lessons;
pub mod scenarios;

pub use lessons::{
    builtin_lessons, Lesson, LessonGrammar, LessonOverview, LessonStep, StepData, StepKind,
    VocabItem,
};
pub use scenarios::{
    builtin_scenarios, Scenario, ScenarioReply, ScenarioStep, ScriptLine, ScriptRole,
};

use tracing::warn;

use crate::coordinator::TurnCoordinator;
use crate::error::{CoachError, Result};
use crate::storage::StateStore;

/// Immutable lesson and scenario tables.
#[derive(Debug, Clone)]
pub struct ContentLibrary {
    lessons: Vec<Lesson>,
    scenarios: Vec<Scenario>,
}

impl Default for ContentLibrary {
    fn default() -> Self {
        Self::new(builtin_lessons(), builtin_scenarios())
    }
}

impl ContentLibrary {
    pub fn new(lessons: Vec<Lesson>, scenarios: Vec<Scenario>) -> Self {
        Self { lessons, scenarios }
    }

    pub fn lessons(&self) -> &[Lesson] {
        &self.lessons
    }

    pub fn scenarios(&self) -> &[Scenario] {
        &self.scenarios
    }

    pub fn lesson(&self, id: &str) -> Result<&Lesson> {
        self.lessons.iter().find(|l| l.id == id).ok_or_else(|| {
            warn!(id, "lesson not found");
            CoachError::not_found("lesson", id)
        })
    }

    pub fn overview(&self, id: &str) -> Result<LessonOverview> {
        Ok(self.lesson(id)?.overview())
    }

    /// Step `index` of lesson `id`.
    pub fn lesson_step(&self, id: &str, index: usize) -> Result<LessonStep> {
        let lesson = self.lesson(id)?;
        let len = lesson.step_count();
        lesson
            .steps()
            .into_iter()
            .nth(index)
            .ok_or_else(|| CoachError::index_out_of_range(index, len))
    }

    pub fn scenario(&self, id: &str) -> Result<&Scenario> {
        self.scenarios.iter().find(|s| s.id == id).ok_or_else(|| {
            warn!(id, "scenario not found");
            CoachError::not_found("scenario", id)
        })
    }

    /// Line `index` of scenario `id`.
    pub fn scenario_step(&self, id: &str, index: usize) -> Result<ScenarioStep> {
        let scenario = self.scenario(id)?;
        scenario
            .step(index)
            .ok_or_else(|| CoachError::index_out_of_range(index, scenario.script.len()))
    }

    /// Answer line `index` of scenario `id` with `user_text`.
    ///
    /// Runs a full turn on the answer (tracked for `user_id` when given) and
    /// returns it with the next script line. The index is checked before any
    /// model call.
    pub fn scenario_reply<S: StateStore>(
        &self,
        coordinator: &TurnCoordinator<S>,
        id: &str,
        index: usize,
        user_text: &str,
        user_id: Option<&str>,
    ) -> Result<ScenarioReply> {
        let scenario = self.scenario(id)?;
        if index >= scenario.script.len() {
            return Err(CoachError::index_out_of_range(index, scenario.script.len()));
        }

        let analysis = coordinator.run_turn_for_user(user_text, None, user_id)?;

        Ok(ScenarioReply {
            npc_line: scenario.step(index + 1),
            analysis,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::{ModelGateway, ScriptedBackend};
    use crate::grammar::GrammarDetector;
    use crate::pipeline::TurnPipeline;
    use crate::storage::MemoryStateStore;
    use std::sync::Arc;

    fn coordinator(backend: &Arc<ScriptedBackend>) -> TurnCoordinator<MemoryStateStore> {
        TurnCoordinator::new(
            TurnPipeline::new(
                ModelGateway::new(Box::new(Arc::clone(backend))),
                GrammarDetector::default(),
            ),
            MemoryStateStore::new(),
        )
    }

    #[test]
    fn test_lesson_lookup() {
        let library = ContentLibrary::default();
        assert_eq!(library.lesson("n5_lesson_01").unwrap().title, "自我介绍入门");
        assert!(matches!(
            library.lesson("n1_lesson_99"),
            Err(CoachError::NotFound { kind: "lesson", .. })
        ));
    }

    #[test]
    fn test_lesson_step_bounds() {
        let library = ContentLibrary::default();

        let first = library.lesson_step("n5_lesson_01", 0).unwrap();
        assert_eq!(first.kind, StepKind::Vocab);
        let last = library.lesson_step("n5_lesson_01", 6).unwrap();
        assert_eq!(last.kind, StepKind::Grammar);

        assert!(matches!(
            library.lesson_step("n5_lesson_01", 7),
            Err(CoachError::IndexOutOfRange { index: 7, len: 7 })
        ));
        assert!(matches!(
            library.lesson_step("missing", 0),
            Err(CoachError::NotFound { .. })
        ));
    }

    #[test]
    fn test_scenario_step_bounds() {
        let library = ContentLibrary::default();

        let step = library.scenario_step("scene_conbini_01", 0).unwrap();
        assert_eq!(step.jp, "コンビニに入りました。");

        assert!(matches!(
            library.scenario_step("scene_conbini_01", 6),
            Err(CoachError::IndexOutOfRange { index: 6, len: 6 })
        ));
        assert!(matches!(
            library.scenario_step("scene_bank", 0),
            Err(CoachError::NotFound { kind: "scenario", .. })
        ));
    }

    #[test]
    fn test_scenario_reply_returns_next_line() {
        let library = ContentLibrary::default();
        let backend = Arc::new(ScriptedBackend::sequence(["", "はい、温めます。", "好的，我来加热。"]));
        let coordinator = coordinator(&backend);

        let reply = library
            .scenario_reply(&coordinator, "scene_conbini_01", 3, "はい、お願いします。", Some("u1"))
            .unwrap();

        let next = reply.npc_line.unwrap();
        assert_eq!(next.index, 4);
        assert_eq!(next.jp, "レジに並んでいます。");
        assert_eq!(reply.analysis.jp, "はい、温めます。");
        assert!(reply.analysis.level.is_some());
    }

    #[test]
    fn test_scenario_reply_at_last_line() {
        let library = ContentLibrary::default();
        let backend = Arc::new(ScriptedBackend::constant(""));
        let coordinator = coordinator(&backend);

        let reply = library
            .scenario_reply(&coordinator, "scene_conbini_01", 5, "いいえ", None)
            .unwrap();

        assert!(reply.npc_line.is_none());
        assert!(reply.analysis.level.is_none());
    }

    #[test]
    fn test_scenario_reply_bad_index_skips_model() {
        let library = ContentLibrary::default();
        let backend = Arc::new(ScriptedBackend::constant(""));
        let coordinator = coordinator(&backend);

        let err = library
            .scenario_reply(&coordinator, "scene_conbini_01", 6, "x", None)
            .unwrap_err();

        assert!(matches!(err, CoachError::IndexOutOfRange { .. }));
        assert_eq!(backend.call_count(), 0);
    }
}
