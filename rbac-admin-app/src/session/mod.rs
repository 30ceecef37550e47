//! Session Management Module
//!
//! Authentication state lives in a process-wide [`SessionStore`]; the
//! [`SessionManager`] is the only writer and mirrors every change into a
//! [`CredentialStore`] so a later run can restore it.

pub mod manager;
pub mod prompt;
pub mod storage;
pub mod store;

pub use manager::SessionManager;
pub use prompt::{FixedAnswer, ForceLoginPrompt};
pub use storage::{CredentialStore, FileCredentialStore, MemoryCredentialStore, StoredCredentials};
pub use store::SessionStore;
