//! core::ops
//!
//! Cross-process operation state.
//!
//! # Modules
//!
//! - [`session`] - The persisted replay session and its atomic store
//! - [`lock`] - Exclusive repository lock
//!
//! # Architecture
//!
//! Every mutating command:
//! 1. Acquires the exclusive repo lock
//! 2. Saves the session before moving HEAD
//! 3. Saves again at every stop point
//! 4. Clears the session when the operation finishes or is aborted

pub mod lock;
pub mod session;

pub use lock::{LockError, RepoLock};
pub use session::{OperationKind, ReplaySession, SessionStore, StoreError, SESSION_SCHEMA_VERSION};
