//! User state storage for renshu.
//!
//! One durable record per user, addressed by user id, with file-based and
//! in-memory backends.

pub mod file;
pub mod memory;
pub mod traits;

pub use file::FileStateStore;
pub use memory::MemoryStateStore;
pub use traits::{validate_user_id, StateStore};
