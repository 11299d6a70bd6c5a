//! Grammar rule table.
//!
//! Each rule names a grammar construct and the keywords that signal it.
//! The table is ordinary configuration: the built-in set below is used
//! unless `[grammar] rules` in the config supplies a replacement.

use serde::{Deserialize, Serialize};

use crate::core::GrammarPoint;

/// One detectable grammar construct.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrammarRule {
    pub name: String,
    /// Substrings, any one of which marks the construct as present.
    pub keywords: Vec<String>,
    pub description: String,
    pub example: String,
}

impl GrammarRule {
    pub fn new(name: &str, keywords: &[&str], description: &str, example: &str) -> Self {
        Self {
            name: name.to_string(),
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
            description: description.to_string(),
            example: example.to_string(),
        }
    }

    /// The grammar point emitted when this rule matches.
    pub fn to_point(&self) -> GrammarPoint {
        GrammarPoint {
            name: self.name.clone(),
            description: self.description.clone(),
            example: self.example.clone(),
        }
    }
}

/// Built-in rule table, in evaluation order.
pub fn builtin_rules() -> Vec<GrammarRule> {
    vec![
        GrammarRule::new(
            "～うちに",
            &["うちに"],
            "在……期间；趁……的时候",
            "雨が降らないうちに帰りましょう。",
        ),
        GrammarRule::new(
            "～てから",
            &["てから"],
            "做完前项之后再进行后项",
            "宿題をしてから遊びに行きます。",
        ),
        GrammarRule::new(
            "～ば～ほど",
            &["ば", "ほど"],
            "越……越……的程度变化",
            "勉強すればするほど上手になります。",
        ),
        GrammarRule::new(
            "～ばいい",
            &["ばいい"],
            "只要……就可以；应当……",
            "分からなければ先生に聞けばいい。",
        ),
        GrammarRule::new(
            "～だけで",
            &["だけで"],
            "只凭……就；仅仅……就",
            "君の声を聞くだけで元気になる。",
        ),
        GrammarRule::new(
            "～ところだ",
            &["ところだ"],
            "正要……；刚刚……；正在……的时候",
            "今出かけるところだから、後で電話するね。",
        ),
        GrammarRule::new(
            "～ようにする",
            &["ようにする"],
            "尽量做到；努力保持某习惯",
            "毎日日本語で日記を書くようにしています。",
        ),
        GrammarRule::new(
            "～ことにする",
            &["ことにする"],
            "决定做……；将……定为习惯",
            "今年から早起きすることにしました。",
        ),
        GrammarRule::new(
            "～らしい",
            &["らしい"],
            "听说；好像有那种典型特征",
            "彼は来ないらしいです。",
        ),
        GrammarRule::new(
            "～みたい",
            &["みたい"],
            "像……一样；似乎……",
            "雨が降りそうみたいだ。",
        ),
        GrammarRule::new(
            "～つもり",
            &["つもり"],
            "打算……；原以为……",
            "来週旅行に行くつもりです。",
        ),
        GrammarRule::new(
            "～てもいい",
            &["てもいい"],
            "表示许可或允许",
            "ここに座ってもいいですか。",
        ),
        GrammarRule::new(
            "～から",
            &["から"],
            "表示原因或理由",
            "雨が降っているから、傘を持って行きます。",
        ),
    ]
}
