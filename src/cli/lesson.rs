//! Lesson command for renshu.
//!
//! Lists lessons, shows a lesson overview, or shows a single step.

use serde::{Deserialize, Serialize};

use crate::content::{ContentLibrary, LessonOverview, LessonStep, StepData};

/// Options for the lesson command.
#[derive(Debug, Clone, Default)]
pub struct LessonOptions {
    /// Output as JSON.
    pub json: bool,
    /// Suppress output.
    pub quiet: bool,
}

/// Output format for the lesson command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LessonOutput {
    /// Whether the command was successful.
    pub success: bool,
    /// Lesson overviews (all lessons, or the requested one).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub lessons: Vec<LessonOverview>,
    /// The requested step.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step: Option<LessonStep>,
    /// Error message if command failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl LessonOutput {
    fn overviews(lessons: Vec<LessonOverview>) -> Self {
        Self {
            success: true,
            lessons,
            step: None,
            error: None,
        }
    }

    fn step(step: LessonStep) -> Self {
        Self {
            success: true,
            lessons: vec![],
            step: Some(step),
            error: None,
        }
    }

    /// Create a failed output.
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            lessons: vec![],
            step: None,
            error: Some(error.into()),
        }
    }
}

/// The lesson command implementation.
pub struct LessonCommand<'a> {
    library: &'a ContentLibrary,
}

impl<'a> LessonCommand<'a> {
    /// Create a new lesson command.
    pub fn new(library: &'a ContentLibrary) -> Self {
        Self { library }
    }

    /// Run the lesson command.
    ///
    /// With no id every lesson is listed; with an id and no step the
    /// lesson's overview is shown.
    pub fn run(&self, id: Option<&str>, step: Option<usize>) -> LessonOutput {
        match (id, step) {
            (None, _) => LessonOutput::overviews(
                self.library.lessons().iter().map(|l| l.overview()).collect(),
            ),
            (Some(id), None) => match self.library.overview(id) {
                Ok(overview) => LessonOutput::overviews(vec![overview]),
                Err(e) => LessonOutput::failure(e.to_string()),
            },
            (Some(id), Some(index)) => match self.library.lesson_step(id, index) {
                Ok(step) => LessonOutput::step(step),
                Err(e) => LessonOutput::failure(e.to_string()),
            },
        }
    }

    /// Format the output based on options.
    pub fn format_output(&self, output: &LessonOutput, options: &LessonOptions) -> String {
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
            return format_step(step);
        }

        if output.lessons.is_empty() {
            return "No lessons available.".to_string();
        }

        output
            .lessons
            .iter()
            .map(|l| {
                format!(
                    "{}  [{}] {}  ({} vocab, {} grammar)",
                    l.id, l.level, l.title, l.vocab_count, l.grammar_count
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Human-readable rendering of one lesson step.
pub fn format_step(step: &LessonStep) -> String {
    let header = format!("Step {}/{}", step.index + 1, step.total);
    match &step.data {
        StepData::Vocab(v) => format!(
            "{}  vocab\n{} ({})  {}\n  {}",
            header, v.jp, v.reading, v.zh, v.example
        ),
        StepData::Grammar(g) => {
            let mut lines = vec![
                format!("{}  grammar [{}]", header, g.level),
                format!("{}  {}", g.name, g.pattern),
                format!("  {}", g.explanation),
            ];
            lines.extend(g.examples.iter().map(|e| format!("  e.g. {}", e)));
            lines.join("\n")
        }
    }
}
