//! Lesson tables and step-by-step walkthroughs.

use serde::{Deserialize, Serialize};

use crate::core::Level;

/// One vocabulary entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VocabItem {
    pub jp: String,
    /// Kana reading.
    pub reading: String,
    pub zh: String,
    pub example: String,
}

/// One grammar entry taught by a lesson.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LessonGrammar {
    pub name: String,
    pub pattern: String,
    pub explanation: String,
    pub examples: Vec<String>,
    pub level: Level,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lesson {
    pub id: String,
    pub title: String,
    pub level: Level,
    pub vocab: Vec<VocabItem>,
    pub grammar: Vec<LessonGrammar>,
}

/// Summary shown before a lesson starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LessonOverview {
    pub id: String,
    pub title: String,
    pub level: Level,
    pub vocab_count: usize,
    pub grammar_count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepKind {
    Vocab,
    Grammar,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StepData {
    Vocab(VocabItem),
    Grammar(LessonGrammar),
}

/// One step of a lesson walkthrough.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LessonStep {
    #[serde(rename = "type")]
    pub kind: StepKind,
    pub index: usize,
    pub total: usize,
    pub data: StepData,
}

impl Lesson {
    pub fn overview(&self) -> LessonOverview {
        LessonOverview {
            id: self.id.clone(),
            title: self.title.clone(),
            level: self.level,
            vocab_count: self.vocab.len(),
            grammar_count: self.grammar.len(),
        }
    }

    /// Number of steps: one per vocabulary entry plus one per grammar entry.
    pub fn step_count(&self) -> usize {
        self.vocab.len() + self.grammar.len()
    }

    /// Vocabulary steps first, then grammar steps, indexed from zero.
    pub fn steps(&self) -> Vec<LessonStep> {
        let total = self.step_count();
        let vocab = self
            .vocab
            .iter()
            .map(|v| (StepKind::Vocab, StepData::Vocab(v.clone())));
        let grammar = self
            .grammar
            .iter()
            .map(|g| (StepKind::Grammar, StepData::Grammar(g.clone())));

        vocab
            .chain(grammar)
            .enumerate()
            .map(|(index, (kind, data))| LessonStep {
                kind,
                index,
                total,
                data,
            })
            .collect()
    }
}

fn vocab(jp: &str, reading: &str, zh: &str, example: &str) -> VocabItem {
    VocabItem {
        jp: jp.to_string(),
        reading: reading.to_string(),
        zh: zh.to_string(),
        example: example.to_string(),
    }
}

fn grammar(name: &str, pattern: &str, explanation: &str, examples: &[&str]) -> LessonGrammar {
    LessonGrammar {
        name: name.to_string(),
        pattern: pattern.to_string(),
        explanation: explanation.to_string(),
        examples: examples.iter().map(|e| e.to_string()).collect(),
        level: Level::N5,
    }
}

/// Built-in sample lessons.
pub fn builtin_lessons() -> Vec<Lesson> {
    vec![Lesson {
        id: "n5_lesson_01".to_string(),
        title: "自我介绍入门".to_string(),
        level: Level::N5,
        vocab: vec![
            vocab("はじめまして", "はじめまして", "初次见面", "はじめまして、山田です。"),
            vocab(
                "よろしくお願いします",
                "よろしくおねがいします",
                "请多关照",
                "これからよろしくお願いします。",
            ),
            vocab("学生", "がくせい", "学生", "私は学生です。"),
            vocab("会社員", "かいしゃいん", "公司职员", "父は会社員です。"),
        ],
        grammar: vec![
            grammar(
                "～です",
                "名词 + です",
                "表示判断或说明，礼貌体。",
                &["私は学生です。", "田中さんは会社員です。"],
            ),
            grammar(
                "～は～です",
                "名词1 は 名词2 です",
                "提示主题并进行说明。",
                &["私は山田です。", "これは本です。"],
            ),
            grammar(
                "～も",
                "名词 も",
                "表示“也”，与前项并列。",
                &["私も学生です。", "彼も日本人です。"],
            ),
        ],
    }]
}
