//! Grammar command for renshu.
//!
//! Runs keyword grammar detection on a piece of text without calling a model.

use serde::{Deserialize, Serialize};

use crate::core::GrammarPoint;
use crate::grammar::GrammarDetector;

/// Options for the grammar command.
#[derive(Debug, Clone, Default)]
pub struct GrammarOptions {
    /// Output as JSON.
    pub json: bool,
    /// Suppress output.
    pub quiet: bool,
}

/// Output format for the grammar command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GrammarOutput {
    /// Whether the command was successful.
    pub success: bool,
    /// Detected grammar points, in rule-table order.
    pub points: Vec<GrammarPoint>,
    /// Error message if command failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl GrammarOutput {
    /// Create a successful output.
    pub fn success(points: Vec<GrammarPoint>) -> Self {
        Self {
            success: true,
            points,
            error: None,
        }
    }

    /// Create a failed output.
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            points: vec![],
            error: Some(error.into()),
        }
    }
}

/// The grammar command implementation.
pub struct GrammarCommand {
    detector: GrammarDetector,
}

impl GrammarCommand {
    /// Create a new grammar command.
    pub fn new(detector: GrammarDetector) -> Self {
        Self { detector }
    }

    /// Run the grammar command.
    pub fn run(&self, text: &str) -> GrammarOutput {
        if text.trim().is_empty() {
            return GrammarOutput::failure("Nothing to analyze: text is empty");
        }
        GrammarOutput::success(self.detector.detect(text))
    }

    /// Format the output based on options.
    pub fn format_output(&self, output: &GrammarOutput, options: &GrammarOptions) -> String {
        if options.quiet {
            return String::new();
        }

        if options.json {
            return serde_json::to_string_pretty(output).unwrap_or_else(|_| "{}".to_string());
        }

        if let Some(error) = &output.error {
            return error.clone();
        }

        if output.points.is_empty() {
            return "No grammar points detected.".to_string();
        }

        output
            .points
            .iter()
            .map(|p| format!("{}  {}\n    e.g. {}", p.name, p.description, p.example))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::GrammarRule;

    #[test]
    fn test_detects_builtin_points() {
        let cmd = GrammarCommand::new(GrammarDetector::default());
        let output = cmd.run("来週旅行に行くつもりです。");

        assert!(output.success);
        assert!(output.points.iter().any(|p| p.name == "～つもり"));
    }

    #[test]
    fn test_empty_text_fails() {
        let cmd = GrammarCommand::new(GrammarDetector::default());
        let output = cmd.run("  \n");
        assert!(!output.success);
    }

    #[test]
    fn test_no_match_message() {
        let cmd = GrammarCommand::new(GrammarDetector::new(vec![GrammarRule::new(
            "～ばかり",
            &["ばかり"],
            "刚刚……",
            "食べたばかりです。",
        )]));
        let output = cmd.run("こんにちは");

        assert!(output.success);
        assert_eq!(
            cmd.format_output(&output, &GrammarOptions::default()),
            "No grammar points detected."
        );
    }

    #[test]
    fn test_format_output_json() {
        let cmd = GrammarCommand::new(GrammarDetector::default());
        let options = GrammarOptions {
            json: true,
            ..Default::default()
        };
        let output = cmd.run("行くつもり");

        let value: serde_json::Value =
            serde_json::from_str(&cmd.format_output(&output, &options)).unwrap();
        assert_eq!(value["success"], true);
        assert!(value["points"].is_array());
    }
}
