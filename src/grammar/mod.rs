//! Grammar detection for renshu.
//!
//! A pure keyword matcher over an injected rule table. Its output feeds the
//! proficiency statistics, so it must stay deterministic.

pub mod detector;
pub mod rules;

pub use detector::GrammarDetector;
pub use rules::{builtin_rules, GrammarRule};
