//! Scenario command for renshu.
//!
//! Lists scenarios, shows a script line, or answers one and returns the
//! analysis of the answer together with the next line.

use serde::{Deserialize, Serialize};

use crate::cli::turn::format_turn;
use crate::content::{ContentLibrary, ScenarioReply, ScenarioStep, ScriptRole};
use crate::coordinator::TurnCoordinator;
use crate::core::Level;
use crate::storage::StateStore;

/// Options for the scenario command.
#[derive(Debug, Clone, Default)]
pub struct ScenarioOptions {
    /// Output as JSON.
    pub json: bool,
    /// Suppress output.
    pub quiet: bool,
    /// Track proficiency for this user when replying.
    pub user_id: Option<String>,
}

/// One row of the scenario listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioSummary {
    pub id: String,
    pub title: String,
    pub description: String,
    pub level: Level,
    pub lines: usize,
}

/// Output format for the scenario command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioOutput {
    /// Whether the command was successful.
    pub success: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub scenarios: Vec<ScenarioSummary>,
    /// A single script line.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step: Option<ScenarioStep>,
    /// Result of answering a line.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply: Option<ScenarioReply>,
    /// Error message if command failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ScenarioOutput {
    fn empty() -> Self {
        Self {
            success: true,
            scenarios: vec![],
            step: None,
            reply: None,
            error: None,
        }
    }

    /// Create a failed output.
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            ..Self::empty()
        }
    }
}

/// The scenario command implementation.
pub struct ScenarioCommand<'a> {
    library: &'a ContentLibrary,
}

impl<'a> ScenarioCommand<'a> {
    /// Create a new scenario command.
    pub fn new(library: &'a ContentLibrary) -> Self {
        Self { library }
    }

    /// List every scenario.
    pub fn list(&self) -> ScenarioOutput {
        ScenarioOutput {
            scenarios: self
                .library
                .scenarios()
                .iter()
                .map(|s| ScenarioSummary {
                    id: s.id.clone(),
                    title: s.title.clone(),
                    description: s.description.clone(),
                    level: s.level,
                    lines: s.script.len(),
                })
                .collect(),
            ..ScenarioOutput::empty()
        }
    }

    /// Show line `index` of scenario `id`.
    pub fn step(&self, id: &str, index: usize) -> ScenarioOutput {
        match self.library.scenario_step(id, index) {
            Ok(step) => ScenarioOutput {
                step: Some(step),
                ..ScenarioOutput::empty()
            },
            Err(e) => ScenarioOutput::failure(e.to_string()),
        }
    }

    /// Answer line `index` of scenario `id` with `text`.
    pub fn reply<S: StateStore>(
        &self,
        coordinator: &TurnCoordinator<S>,
        id: &str,
        index: usize,
        text: &str,
        options: &ScenarioOptions,
    ) -> ScenarioOutput {
        if text.trim().is_empty() {
            return ScenarioOutput::failure("Nothing to say: text is empty");
        }

        match self.library.scenario_reply(
            coordinator,
            id,
            index,
            text.trim(),
            options.user_id.as_deref(),
        ) {
            Ok(reply) => ScenarioOutput {
                reply: Some(reply),
                ..ScenarioOutput::empty()
            },
            Err(e) => ScenarioOutput::failure(format!("Scenario reply failed: {}", e)),
        }
    }

    /// Format the output based on options.
    pub fn format_output(&self, output: &ScenarioOutput, options: &ScenarioOptions) -> String {
        if options.quiet {
            return String::new();
        }

        if options.json {
            return serde_json::to_string_pretty(output).unwrap_or_else(|_| "{}".to_string());
        }

        if let Some(error) = &output.error {
            return error.clone();
        }

        if let Some(step) = &output.step {
            return format_scenario_step(step);
        }

        if let Some(reply) = &output.reply {
            let mut text = format_turn(&reply.analysis);
            match &reply.npc_line {
                Some(next) => {
                    text.push_str("\n\n");
                    text.push_str(&format_scenario_step(next));
                }
                None => text.push_str("\n\n(End of scenario)"),
            }
            return text;
        }

        if output.scenarios.is_empty() {
            return "No scenarios available.".to_string();
        }

        output
            .scenarios
            .iter()
            .map(|s| {
                format!(
                    "{}  [{}] {}  ({} lines)\n    {}",
                    s.id, s.level, s.title, s.lines, s.description
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Human-readable rendering of one script line.
pub fn format_scenario_step(step: &ScenarioStep) -> String {
    let speaker = match step.role {
        ScriptRole::System => "*",
        ScriptRole::Npc => "NPC:",
    };
    format!(
        "[{}/{}] {} {}\n      {}",
        step.index + 1,
        step.total,
        speaker,
        step.jp,
        step.zh
    )
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
    fn test_list() {
        let library = ContentLibrary::default();
        let cmd = ScenarioCommand::new(&library);
        let output = cmd.list();

        assert_eq!(output.scenarios.len(), 1);
        assert_eq!(output.scenarios[0].lines, 6);
    }

    #[test]
    fn test_step_formatting() {
        let library = ContentLibrary::default();
        let cmd = ScenarioCommand::new(&library);
        let output = cmd.step("scene_conbini_01", 1);

        let text = cmd.format_output(&output, &ScenarioOptions::default());
        assert_eq!(text, "[2/6] NPC: いらっしゃいませ！\n      欢迎光临！");
    }

    #[test]
    fn test_reply_shows_analysis_and_next_line() {
        let library = ContentLibrary::default();
        let cmd = ScenarioCommand::new(&library);
        let backend = Arc::new(ScriptedBackend::sequence(["", "はい、どうぞ。", "好的，请。"]));
        let coordinator = coordinator(&backend);
        let options = ScenarioOptions {
            user_id: Some("u1".to_string()),
            ..Default::default()
        };

        let output = cmd.reply(&coordinator, "scene_conbini_01", 3, "はい、お願いします。", &options);

        assert!(output.success);
        let text = cmd.format_output(&output, &options);
        assert!(text.contains("AI: はい、どうぞ。"));
        assert!(text.contains("[5/6] * レジに並んでいます。"));
    }

    #[test]
    fn test_reply_at_end() {
        let library = ContentLibrary::default();
        let cmd = ScenarioCommand::new(&library);
        let backend = Arc::new(ScriptedBackend::constant(""));
        let coordinator = coordinator(&backend);

        let output = cmd.reply(
            &coordinator,
            "scene_conbini_01",
            5,
            "いいえ",
            &ScenarioOptions::default(),
        );
        let text = cmd.format_output(&output, &ScenarioOptions::default());
        assert!(text.ends_with("(End of scenario)"));
    }

    #[test]
    fn test_reply_empty_text_skips_model() {
        let library = ContentLibrary::default();
        let cmd = ScenarioCommand::new(&library);
        let backend = Arc::new(ScriptedBackend::constant(""));
        let coordinator = coordinator(&backend);

        let output = cmd.reply(&coordinator, "scene_conbini_01", 0, " ", &ScenarioOptions::default());

        assert!(!output.success);
        assert_eq!(backend.call_count(), 0);
    }

    #[test]
    fn test_unknown_scenario() {
        let library = ContentLibrary::default();
        let cmd = ScenarioCommand::new(&library);
        let output = cmd.step("scene_bank", 0);
        assert!(output.error.unwrap().contains("scenario not found"));
    }
}
