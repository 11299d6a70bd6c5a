//! Persona instructions and message framing for the model-backed steps.
//!
//! Templates use `{text}` as the only placeholder. Defaults address a
//! Chinese-speaking learner practising Japanese.

use serde::{Deserialize, Serialize};

/// Placeholder replaced by the step input.
pub const TEXT_PLACEHOLDER: &str = "{text}";

/// System prompts and user framings for the three model-backed steps.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PromptSet {
    /// Persona for correction analysis.
    pub critique_system: String,
    /// Framing of the user's sentence for correction analysis.
    pub critique_user: String,
    /// Persona for reply generation.
    pub partner_system: String,
    /// Framing of the user's sentence for reply generation.
    pub partner_user: String,
    /// Persona for translation.
    pub translator_system: String,
    /// Framing of the reply for translation.
    pub translator_user: String,
    /// Reply used when the model returns nothing.
    pub fallback_reply: String,
}

impl Default for PromptSet {
    fn default() -> Self {
        Self {
            critique_system: "你是一名严格的日语老师，请指出语法与用词问题。".to_string(),
            critique_user: "请纠正这个日语句子并解释错误：{text}".to_string(),
            partner_system: "你是一位友好的日语对话伙伴，请保持自然且鼓励式的语气。".to_string(),
            partner_user: "你是一个日语对话伙伴，请用自然日语回复：{text}".to_string(),
            translator_system: "你是一名专业的中日互译译者。".to_string(),
            translator_user: "请把以下日语翻译成中文：{text}".to_string(),
            fallback_reply: "すみません、もう一度お願いします。".to_string(),
        }
    }
}

/// Substitute `text` into a template.
///
/// A template without the placeholder gets the text appended so the input
/// is never silently dropped.
pub fn render(template: &str, text: &str) -> String {
    if template.contains(TEXT_PLACEHOLDER) {
        template.replace(TEXT_PLACEHOLDER, text)
    } else {
        format!("{}{}", template, text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_replaces_placeholder() {
        assert_eq!(render("请翻译：{text}", "こんにちは"), "请翻译：こんにちは");
    }

    #[test]
    fn test_render_replaces_every_occurrence() {
        assert_eq!(render("{text}/{text}", "a"), "a/a");
    }

    #[test]
    fn test_render_appends_without_placeholder() {
        assert_eq!(render("Translate: ", "はい"), "Translate: はい");
    }

    #[test]
    fn test_partial_override_from_toml() {
        let prompts: PromptSet = toml::from_str(r#"translator_user = "Translate to English: {text}""#).unwrap();
        assert_eq!(prompts.translator_user, "Translate to English: {text}");
        assert_eq!(prompts.fallback_reply, PromptSet::default().fallback_reply);
    }
}
