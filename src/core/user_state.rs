//! Persistent per-user proficiency state.
//!
//! One `UserState` exists per user id. It is created lazily with defaults,
//! updated after every tracked turn, and only cleared by an explicit reset.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Five ordered proficiency tiers, lowest first.
///
/// Serialized as the tier label (`"N5"` .. `"N1"`). An unrecognised label in
/// a persisted record reads back as the lowest tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Level {
    #[default]
    N5,
    N4,
    N3,
    N2,
    N1,
}

impl Level {
    /// All tiers in ascending order.
    pub const ALL: [Level; 5] = [Level::N5, Level::N4, Level::N3, Level::N2, Level::N1];

    /// The lowest tier.
    pub const LOWEST: Level = Level::N5;

    /// The highest tier.
    pub const HIGHEST: Level = Level::N1;

    /// Position in the ascending scale (0 = lowest).
    pub fn rank(self) -> usize {
        match self {
            Level::N5 => 0,
            Level::N4 => 1,
            Level::N3 => 2,
            Level::N2 => 3,
            Level::N1 => 4,
        }
    }

    /// One tier up, clamped at the top.
    pub fn advance(self) -> Level {
        Self::ALL[(self.rank() + 1).min(Self::ALL.len() - 1)]
    }

    /// One tier down, clamped at the bottom.
    pub fn regress(self) -> Level {
        Self::ALL[self.rank().saturating_sub(1)]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Level::N5 => "N5",
            Level::N4 => "N4",
            Level::N3 => "N3",
            Level::N2 => "N2",
            Level::N1 => "N1",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Level {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|level| level.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown level '{}'", s))
    }
}

impl From<String> for Level {
    fn from(value: String) -> Self {
        value.parse().unwrap_or_else(|_| {
            tracing::warn!(level = %value, "unknown level in stored state, using {}", Level::LOWEST);
            Level::LOWEST
        })
    }
}

impl From<Level> for String {
    fn from(level: Level) -> Self {
        level.as_str().to_string()
    }
}

/// Practice counters for one grammar point.
///
/// `wrong <= seen` is not enforced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GrammarStats {
    #[serde(default)]
    pub seen: u64,
    #[serde(default)]
    pub wrong: u64,
}

/// Proficiency record for one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserState {
    pub user_id: String,
    #[serde(default)]
    pub level: Level,
    /// Keyed by grammar point name.
    #[serde(default)]
    pub grammar_stats: BTreeMap<String, GrammarStats>,
}

impl UserState {
    /// Fresh state at the lowest tier with no statistics.
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            level: Level::LOWEST,
            grammar_stats: BTreeMap::new(),
        }
    }

    /// Sum of `seen` over all grammar points.
    pub fn seen_total(&self) -> u64 {
        self.grammar_stats.values().map(|s| s.seen).sum()
    }

    /// Sum of `wrong` over all grammar points.
    pub fn wrong_total(&self) -> u64 {
        self.grammar_stats.values().map(|s| s.wrong).sum()
    }

    /// Grammar points ordered by `seen` (descending), at most `limit`.
    pub fn top_grammar(&self, limit: usize) -> Vec<(&str, GrammarStats)> {
        let mut items: Vec<(&str, GrammarStats)> = self
            .grammar_stats
            .iter()
            .map(|(name, stats)| (name.as_str(), *stats))
            .collect();
        items.sort_by(|a, b| b.1.seen.cmp(&a.1.seen));
        items.truncate(limit);
        items
    }
}
