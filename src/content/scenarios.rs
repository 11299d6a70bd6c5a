//! Scripted role-play scenarios.

use serde::{Deserialize, Serialize};

use crate::core::{Level, TurnResult};

/// Who speaks a script line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScriptRole {
    /// Scene narration.
    System,
    /// The character the learner talks to.
    Npc,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptLine {
    pub role: ScriptRole,
    pub jp: String,
    pub zh: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scenario {
    pub id: String,
    pub title: String,
    pub description: String,
    pub level: Level,
    pub related_lessons: Vec<String>,
    pub script: Vec<ScriptLine>,
}

/// A script line with its position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioStep {
    pub role: ScriptRole,
    pub jp: String,
    pub zh: String,
    pub index: usize,
    pub total: usize,
}

/// Outcome of answering a scenario line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioReply {
    /// The following line, or `None` at the end of the script.
    pub npc_line: Option<ScenarioStep>,
    pub analysis: TurnResult,
}

impl Scenario {
    /// The line at `index`, if the script has one.
    pub fn step(&self, index: usize) -> Option<ScenarioStep> {
        self.script.get(index).map(|line| ScenarioStep {
            role: line.role,
            jp: line.jp.clone(),
            zh: line.zh.clone(),
            index,
            total: self.script.len(),
        })
    }
}

fn line(role: ScriptRole, jp: &str, zh: &str) -> ScriptLine {
    ScriptLine {
        role,
        jp: jp.to_string(),
        zh: zh.to_string(),
    }
}

/// Built-in sample scenarios.
pub fn builtin_scenarios() -> Vec<Scenario> {
    use ScriptRole::{Npc, System};

    vec![Scenario {
        id: "scene_conbini_01".to_string(),
        title: "在便利店购物".to_string(),
        description: "练习在便利店购物时的基本对话与礼貌表达。".to_string(),
        level: Level::N5,
        related_lessons: vec!["n5_lesson_01".to_string()],
        script: vec![
            line(System, "コンビニに入りました。", "你走进了一家便利店。"),
            line(Npc, "いらっしゃいませ！", "欢迎光临！"),
            line(System, "商品を手に取りました。", "你拿起了想买的商品。"),
            line(Npc, "温めますか？", "需要加热吗？"),
            line(System, "レジに並んでいます。", "你正排队结账。"),
            line(Npc, "ポイントカードはお持ちですか？", "有积分卡吗？"),
        ],
    }]
}
