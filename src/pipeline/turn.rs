//! One conversational turn.
//!
//! A turn runs four steps strictly in order:
//!
//! 1. correction analysis of the user's sentence (model call, no history)
//! 2. reply generation over the history plus the new sentence (model call)
//! 3. grammar detection on the reply (pure)
//! 4. translation of the reply (model call)
//!
//! Any model failure aborts the whole turn. The pipeline never touches user
//! state; `level` in the result is always `None` here.

use tracing::{debug, info};

use crate::core::{Message, TurnResult, UserCorrection};
use crate::error::Result;
use crate::gateway::ModelGateway;
use crate::grammar::GrammarDetector;
use crate::pipeline::correction::parse_correction;
use crate::pipeline::prompts::{render, PromptSet};

/// Stateless turn orchestrator.
#[derive(Debug)]
pub struct TurnPipeline {
    gateway: ModelGateway,
    detector: GrammarDetector,
    prompts: PromptSet,
}

impl TurnPipeline {
    pub fn new(gateway: ModelGateway, detector: GrammarDetector) -> Self {
        Self {
            gateway,
            detector,
            prompts: PromptSet::default(),
        }
    }

    /// Replace the default prompt set.
    pub fn with_prompts(mut self, prompts: PromptSet) -> Self {
        self.prompts = prompts;
        self
    }

    pub fn gateway(&self) -> &ModelGateway {
        &self.gateway
    }

    pub fn detector(&self) -> &GrammarDetector {
        &self.detector
    }

    pub fn prompts(&self) -> &PromptSet {
        &self.prompts
    }

    /// Run one turn for `user_text`.
    ///
    /// `history` is the prior conversation, oldest first. Entries with empty
    /// content are dropped; the rest keep their role and order.
    pub fn run_turn(&self, user_text: &str, history: Option<&[Message]>) -> Result<TurnResult> {
        info!(chars = user_text.chars().count(), "turn started");

        let user_correction = self.analyze(user_text)?;
        debug!(corrected = user_correction.is_some(), "correction step done");

        let reply = self.reply(user_text, history.unwrap_or_default())?;
        debug!(chars = reply.chars().count(), "reply step done");

        let grammar_ai = self.detector.detect(&reply);

        let translation = self.translate(&reply)?;
        debug!(chars = translation.chars().count(), "translation step done");

        info!(grammar = grammar_ai.len(), "turn finished");
        Ok(TurnResult {
            jp: reply,
            zh: translation,
            user_correction,
            grammar_ai,
            level: None,
        })
    }

    fn analyze(&self, user_text: &str) -> Result<Option<UserCorrection>> {
        let conversation = [
            Message::system(&self.prompts.critique_system),
            Message::user(render(&self.prompts.critique_user, user_text)),
        ];
        let feedback = self.gateway.generate(&conversation)?;
        Ok(parse_correction(user_text, &feedback))
    }

    fn reply(&self, user_text: &str, history: &[Message]) -> Result<String> {
        let mut conversation = Vec::with_capacity(history.len() + 2);
        conversation.push(Message::system(&self.prompts.partner_system));
        conversation.extend(
            history
                .iter()
                .filter(|message| !message.content.is_empty())
                .cloned(),
        );
        conversation.push(Message::user(render(&self.prompts.partner_user, user_text)));

        let reply = self.gateway.generate(&conversation)?;
        let reply = reply.trim();
        if reply.is_empty() {
            Ok(self.prompts.fallback_reply.clone())
        } else {
            Ok(reply.to_string())
        }
    }

    fn translate(&self, reply: &str) -> Result<String> {
        let conversation = [
            Message::system(&self.prompts.translator_system),
            Message::user(render(&self.prompts.translator_user, reply)),
        ];
        let translation = self.gateway.generate(&conversation)?;
        let translation = translation.trim();
        if translation.is_empty() {
            Ok(reply.to_string())
        } else {
            Ok(translation.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Role;
    use crate::error::CoachError;
    use crate::gateway::{ScriptedBackend, ScriptedReply};
    use std::sync::Arc;

    fn pipeline_over(backend: &Arc<ScriptedBackend>) -> TurnPipeline {
        TurnPipeline::new(
            ModelGateway::new(Box::new(Arc::clone(backend))),
            GrammarDetector::default(),
        )
    }

    #[test]
    fn test_all_empty_replies_use_fallbacks() {
        let backend = Arc::new(ScriptedBackend::constant(""));
        let pipeline = pipeline_over(&backend);

        let turn = pipeline.run_turn("text", None).unwrap();

        assert_eq!(turn.jp, "すみません、もう一度お願いします。");
        assert_eq!(turn.zh, turn.jp);
        assert!(turn.grammar_ai.is_empty());
        assert!(turn.user_correction.is_none());
        assert!(turn.level.is_none());
        assert_eq!(backend.call_count(), 3);
    }

    #[test]
    fn test_full_turn() {
        let backend = Arc::new(ScriptedBackend::sequence([
            "修改: 週末は友達と映画を見るつもりです。\n「見る」を使いましょう。",
            "いいですね！どんな映画を見るつもりですか。",
            "不错！你打算看什么电影？",
        ]));
        let pipeline = pipeline_over(&backend);

        let turn = pipeline
            .run_turn("週末は友達と映画を見たつもりです", None)
            .unwrap();

        assert_eq!(turn.jp, "いいですね！どんな映画を見るつもりですか。");
        assert_eq!(turn.zh, "不错！你打算看什么电影？");
        let correction = turn.user_correction.unwrap();
        assert_eq!(correction.original, "週末は友達と映画を見たつもりです");
        assert_eq!(correction.corrected, "週末は友達と映画を見るつもりです。");
        assert_eq!(correction.explain, "「見る」を使いましょう。");
        let names: Vec<&str> = turn.grammar_ai.iter().map(|g| g.name.as_str()).collect();
        assert_eq!(names, vec!["～つもり"]);
        assert!(turn.level.is_none());
    }

    #[test]
    fn test_step_framing_and_order() {
        let backend = Arc::new(ScriptedBackend::sequence(["", "はい、そうです。", "是的。"]));
        let pipeline = pipeline_over(&backend);
        let prompts = PromptSet::default();

        pipeline.run_turn("学生ですか", None).unwrap();

        let calls = backend.calls();
        assert_eq!(calls.len(), 3);

        // Critique: persona + framed sentence, no history
        assert_eq!(calls[0].len(), 2);
        assert_eq!(calls[0][0], Message::system(&prompts.critique_system));
        assert_eq!(
            calls[0][1],
            Message::user("请纠正这个日语句子并解释错误：学生ですか")
        );

        // Reply: persona + framed sentence
        assert_eq!(calls[1][0], Message::system(&prompts.partner_system));
        assert_eq!(
            calls[1].last().unwrap(),
            &Message::user("你是一个日语对话伙伴，请用自然日语回复：学生ですか")
        );

        // Translation consumes the reply, not the user's text
        assert_eq!(calls[2][0], Message::system(&prompts.translator_system));
        assert_eq!(
            calls[2][1],
            Message::user("请把以下日语翻译成中文：はい、そうです。")
        );
    }

    #[test]
    fn test_history_kept_in_order_and_empty_entries_skipped() {
        let backend = Arc::new(ScriptedBackend::sequence(["", "そうですね。", "是啊。"]));
        let pipeline = pipeline_over(&backend);
        let history = vec![
            Message::user("こんにちは"),
            Message::assistant("こんにちは！"),
            Message::user(""),
            Message::user("   "),
            Message::assistant("お元気ですか。"),
        ];

        pipeline.run_turn("元気です", Some(&history)).unwrap();

        let reply_call = &backend.calls()[1];
        let middle: Vec<(Role, &str)> = reply_call[1..reply_call.len() - 1]
            .iter()
            .map(|m| (m.role, m.content.as_str()))
            .collect();
        assert_eq!(
            middle,
            vec![
                (Role::User, "こんにちは"),
                (Role::Assistant, "こんにちは！"),
                (Role::User, "   "),
                (Role::Assistant, "お元気ですか。"),
            ]
        );
    }

    #[test]
    fn test_critique_never_sees_history() {
        let backend = Arc::new(ScriptedBackend::constant("x"));
        let pipeline = pipeline_over(&backend);
        let history = vec![Message::user("前の話")];

        pipeline.run_turn("今の話", Some(&history)).unwrap();

        assert!(backend.calls()[0].iter().all(|m| m.content != "前の話"));
    }

    #[test]
    fn test_empty_translation_returns_reply() {
        let backend = Arc::new(ScriptedBackend::sequence(["", "雨が降っているから、帰ります。", "  "]));
        let pipeline = pipeline_over(&backend);

        let turn = pipeline.run_turn("帰りますか", None).unwrap();

        assert_eq!(turn.zh, "雨が降っているから、帰ります。");
        assert_eq!(turn.grammar_ai[0].name, "～から");
    }

    #[test]
    fn test_grammar_detected_on_fallback_reply() {
        let mut prompts = PromptSet::default();
        prompts.fallback_reply = "もう一度言ってくれるつもりですか。".to_string();
        let backend = Arc::new(ScriptedBackend::constant(""));
        let pipeline = pipeline_over(&backend).with_prompts(prompts);

        let turn = pipeline.run_turn("x", None).unwrap();

        assert_eq!(turn.grammar_ai.len(), 1);
    }

    #[test]
    fn test_failure_in_any_step_aborts_turn() {
        for failing_step in 0..3 {
            let backend = Arc::new(ScriptedBackend::constant(""));
            for step in 0..3 {
                backend.push(if step == failing_step {
                    ScriptedReply::Fail("boom".to_string())
                } else {
                    ScriptedReply::Text("ok".to_string())
                });
            }
            let pipeline = pipeline_over(&backend);

            let err = pipeline.run_turn("x", None).unwrap_err();

            assert!(matches!(err, CoachError::Model { .. }));
            // No step after the failing one runs
            assert_eq!(backend.call_count(), failing_step + 1);
        }
    }

    #[test]
    fn test_custom_prompts_used() {
        let mut prompts = PromptSet::default();
        prompts.translator_user = "Translate to English: {text}".to_string();
        let backend = Arc::new(ScriptedBackend::sequence(["", "はい"]));
        let pipeline = pipeline_over(&backend).with_prompts(prompts);

        pipeline.run_turn("x", None).unwrap();

        assert_eq!(backend.calls()[2][1].content, "Translate to English: はい");
    }
}
