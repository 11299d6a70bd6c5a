//! Scripted model backend for offline use and tests.
//!
//! Replies are served from a queue; once the queue is empty the backend
//! falls back to its default reply. Every conversation it receives is
//! recorded so callers can assert on message framing.

use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};

use crate::core::Message;
use crate::error::{CoachError, Result};
use crate::gateway::ModelBackend;

/// One scripted outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptedReply {
    Text(String),
    Fail(String),
}

/// In-memory backend driven by a reply script.
#[derive(Debug)]
pub struct ScriptedBackend {
    name: String,
    queue: Mutex<VecDeque<ScriptedReply>>,
    default: ScriptedReply,
    calls: Mutex<Vec<Vec<Message>>>,
}

impl ScriptedBackend {
    /// Backend that answers every call with `reply`.
    pub fn constant(reply: impl Into<String>) -> Self {
        Self::with_default(ScriptedReply::Text(reply.into()))
    }

    /// Backend that fails every call with `message`.
    pub fn failing(message: impl Into<String>) -> Self {
        Self::with_default(ScriptedReply::Fail(message.into()))
    }

    /// Backend that serves `replies` in order, then empty strings.
    pub fn sequence<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let backend = Self::constant("");
        {
            let mut queue = backend.queue.lock().unwrap_or_else(PoisonError::into_inner);
            queue.extend(replies.into_iter().map(|r| ScriptedReply::Text(r.into())));
        }
        backend
    }

    fn with_default(default: ScriptedReply) -> Self {
        Self {
            name: "scripted".to_string(),
            queue: Mutex::new(VecDeque::new()),
            default,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Rename the backend (useful when two scripted backends are chained).
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Append a reply to the script.
    pub fn push(&self, reply: ScriptedReply) {
        self.queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(reply);
    }

    /// Conversations received so far, oldest first.
    pub fn calls(&self) -> Vec<Vec<Message>> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of calls received so far.
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

impl ModelBackend for ScriptedBackend {
    fn complete(&self, conversation: &[Message]) -> Result<String> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(conversation.to_vec());

        let next = self
            .queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
            .unwrap_or_else(|| self.default.clone());

        match next {
            ScriptedReply::Text(text) => Ok(text.trim().to_string()),
            ScriptedReply::Fail(message) => Err(CoachError::model(&self.name, message)),
        }
    }

    fn ping(&self) -> bool {
        !matches!(self.default, ScriptedReply::Fail(_))
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constant_reply() {
        let backend = ScriptedBackend::constant("  こんにちは \n");
        let reply = backend.complete(&[Message::user("hi")]).unwrap();
        assert_eq!(reply, "こんにちは");
        assert_eq!(backend.call_count(), 1);
    }

    #[test]
    fn test_sequence_then_empty() {
        let backend = ScriptedBackend::sequence(["one", "two"]);
        let msgs = [Message::user("x")];
        assert_eq!(backend.complete(&msgs).unwrap(), "one");
        assert_eq!(backend.complete(&msgs).unwrap(), "two");
        assert_eq!(backend.complete(&msgs).unwrap(), "");
    }

    #[test]
    fn test_failing_backend() {
        let backend = ScriptedBackend::failing("down").named("primary");
        let err = backend.complete(&[Message::user("x")]).unwrap_err();
        assert_eq!(err.to_string(), "model backend 'primary' failed: down");
        assert!(!backend.ping());
    }

    #[test]
    fn test_push_failure_mid_script() {
        let backend = ScriptedBackend::sequence(["ok"]);
        backend.push(ScriptedReply::Fail("boom".to_string()));
        let msgs = [Message::user("x")];
        assert!(backend.complete(&msgs).is_ok());
        assert!(backend.complete(&msgs).is_err());
    }

    #[test]
    fn test_records_conversations() {
        let backend = ScriptedBackend::constant("ok");
        backend
            .complete(&[Message::system("s"), Message::user("u")])
            .unwrap();
        let calls = backend.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0][0], Message::system("s"));
        assert_eq!(calls[0][1], Message::user("u"));
    }
}
