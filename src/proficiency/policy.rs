//! Level policy: how turn results feed grammar statistics and when a user
//! moves between tiers.
//!
//! Every function here is pure; persistence lives in the controller.

use tracing::info;

use crate::core::{GrammarStats, Level, TurnResult, UserState};

/// Observations required before the level may move.
pub const MIN_OBSERVATIONS: u64 = 30;

/// Error rate strictly below which the user advances a tier.
pub const ADVANCE_BELOW: f64 = 0.15;

/// Error rate strictly above which the user regresses a tier.
pub const REGRESS_ABOVE: f64 = 0.5;

/// Fold one turn into the user's grammar statistics.
///
/// Every grammar point detected in the reply counts as seen. When the turn
/// carried a correction, every one of those points also counts as wrong,
/// whether or not the user misused that particular construct.
pub fn record_turn(state: &mut UserState, turn: &TurnResult) {
    let corrected = turn.user_correction.is_some();
    for point in &turn.grammar_ai {
        let name = point.name.trim();
        if name.is_empty() {
            continue;
        }
        let stats = state
            .grammar_stats
            .entry(name.to_string())
            .or_insert_with(GrammarStats::default);
        stats.seen += 1;
        if corrected {
            stats.wrong += 1;
        }
    }
}

/// The level the state should hold given its statistics.
pub fn decide_level(state: &UserState) -> Level {
    let seen = state.seen_total();
    if seen == 0 {
        return state.level;
    }

    let error_rate = state.wrong_total() as f64 / seen as f64;
    if seen >= MIN_OBSERVATIONS && error_rate < ADVANCE_BELOW {
        state.level.advance()
    } else if seen >= MIN_OBSERVATIONS && error_rate > REGRESS_ABOVE {
        state.level.regress()
    } else {
        state.level
    }
}

/// Set `state.level` from its statistics and return the state.
pub fn apply(mut state: UserState) -> UserState {
    let next = decide_level(&state);
    if next != state.level {
        info!(user_id = %state.user_id, from = %state.level, to = %next, "level changed");
        state.level = next;
    }
    state
}
