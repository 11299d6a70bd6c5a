//! Primary/fallback model gateway.
//!
//! The gateway tries the primary backend first and, if that call fails and
//! a fallback is configured, tries the fallback once. Each backend is
//! attempted at most once per call.

use tracing::{debug, warn};

use crate::core::Message;
use crate::error::{CoachError, Result};
use crate::gateway::ModelBackend;

/// Text-generation entry point used by the turn pipeline.
pub struct ModelGateway {
    /// Primary backend (tried first).
    primary: Box<dyn ModelBackend>,
    /// Fallback backend (used only if the primary fails).
    fallback: Option<Box<dyn ModelBackend>>,
}

impl ModelGateway {
    /// Create a gateway with no fallback.
    pub fn new(primary: Box<dyn ModelBackend>) -> Self {
        Self {
            primary,
            fallback: None,
        }
    }

    /// Enable the fallback path.
    pub fn with_fallback(mut self, fallback: Box<dyn ModelBackend>) -> Self {
        self.fallback = Some(fallback);
        self
    }

    /// Get the primary backend name.
    pub fn primary_name(&self) -> &str {
        self.primary.name()
    }

    /// Get the fallback backend name, if enabled.
    pub fn fallback_name(&self) -> Option<&str> {
        self.fallback.as_ref().map(|b| b.name())
    }

    /// Whether the primary backend answers a ping.
    pub fn ping_primary(&self) -> bool {
        self.primary.ping()
    }

    /// Generate text for a conversation.
    ///
    /// Fails with `EmptyInput` for an empty conversation. With fallback
    /// disabled a primary failure is returned as is; with fallback enabled a
    /// double failure becomes `ModelUnavailable` carrying both causes.
    /// Empty replies are passed through untouched.
    pub fn generate(&self, conversation: &[Message]) -> Result<String> {
        if conversation.is_empty() {
            return Err(CoachError::EmptyInput);
        }

        let primary_err = match self.primary.complete(conversation) {
            Ok(text) => {
                debug!(backend = self.primary.name(), chars = text.chars().count(), "generated");
                return Ok(text);
            }
            Err(err) => err,
        };

        let Some(fallback) = &self.fallback else {
            return Err(primary_err);
        };

        warn!(
            "Primary backend '{}' failed ({}), falling back to '{}'",
            self.primary.name(),
            primary_err,
            fallback.name()
        );

        match fallback.complete(conversation) {
            Ok(text) => {
                debug!(backend = fallback.name(), chars = text.chars().count(), "generated via fallback");
                Ok(text)
            }
            Err(fallback_err) => {
                warn!("Fallback backend '{}' also failed", fallback.name());
                Err(CoachError::model_unavailable(primary_err, fallback_err))
            }
        }
    }
}

impl std::fmt::Debug for ModelGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelGateway")
            .field("primary", &self.primary.name())
            .field("fallback", &self.fallback_name())
            .finish()
    }
}
