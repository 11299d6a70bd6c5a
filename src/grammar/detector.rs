//! Keyword-based grammar detection.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::core::GrammarPoint;
use crate::grammar::rules::{builtin_rules, GrammarRule};

/// Maps text to the grammar points whose keywords it contains.
///
/// Matching is a case-sensitive substring test. A rule is emitted at most
/// once, and output follows table order rather than position in the text.
/// An empty keyword is a substring of every text, so its rule always matches.
#[derive(Debug, Clone)]
pub struct GrammarDetector {
    rules: Arc<[GrammarRule]>,
}

impl GrammarDetector {
    /// Detector over an explicit rule table.
    pub fn new(rules: Vec<GrammarRule>) -> Self {
        for rule in rules.iter().filter(|r| r.keywords.iter().any(String::is_empty)) {
            warn!(rule = %rule.name, "grammar rule has an empty keyword and matches every text");
        }
        Self {
            rules: rules.into(),
        }
    }

    /// The rules in evaluation order.
    pub fn rules(&self) -> &[GrammarRule] {
        &self.rules
    }

    /// Detect grammar points in `text`.
    pub fn detect(&self, text: &str) -> Vec<GrammarPoint> {
        let points: Vec<GrammarPoint> = self
            .rules
            .iter()
            .filter(|rule| {
                rule.keywords
                    .iter()
                    .any(|keyword| text.contains(keyword.as_str()))
            })
            .map(GrammarRule::to_point)
            .collect();

        debug!(matched = points.len(), "grammar detection");
        points
    }
}

impl Default for GrammarDetector {
    fn default() -> Self {
        Self::new(builtin_rules())
    }
}
