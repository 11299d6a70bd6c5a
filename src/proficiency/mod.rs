//! Adaptive proficiency tracking.
//!
//! Grammar statistics accumulate per user and drive a five-tier level.

pub mod controller;
pub mod policy;

pub use controller::ProficiencyController;
pub use policy::{ADVANCE_BELOW, MIN_OBSERVATIONS, REGRESS_ABOVE};
