//! Model backend trait.

use std::sync::Arc;

use crate::core::Message;
use crate::error::Result;

/// A text-generation backend.
///
/// Implementations send the conversation in order and return the generated
/// text trimmed of surrounding whitespace. An empty reply is returned as an
/// empty string; deciding what an empty reply means is up to the caller.
pub trait ModelBackend: Send + Sync {
    /// Generate a reply for the conversation.
    fn complete(&self, conversation: &[Message]) -> Result<String>;

    /// Check whether the backend is reachable.
    fn ping(&self) -> bool;

    /// Short backend name for logs and errors.
    fn name(&self) -> &str;
}

impl<T: ModelBackend + ?Sized> ModelBackend for Arc<T> {
    fn complete(&self, conversation: &[Message]) -> Result<String> {
        (**self).complete(conversation)
    }

    fn ping(&self) -> bool {
        (**self).ping()
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

impl<T: ModelBackend + ?Sized> ModelBackend for Box<T> {
    fn complete(&self, conversation: &[Message]) -> Result<String> {
        (**self).complete(conversation)
    }

    fn ping(&self) -> bool {
        (**self).ping()
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}
