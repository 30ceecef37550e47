//! RBAC Admin Applications - stateful components built on the API clients
//!
//! - Session lifecycle with credential persistence and forced re-login
//! - Role and menu directory cache feeding the rights editor
//! - Rights matrix reconciliation, toggling and bulk save
//!
//! ## Architecture
//!
//! - **Transport** (rbac-admin-api): one async trait per REST resource
//! - **Applications** (this crate): state, invariants and caching
//! - **Presentation** (rbac-admin-cli): prompts and output

pub mod directory;
pub mod rights;
pub mod session;

pub use directory::{DirectoryCache, MenuCatalog};
pub use rights::{carry_edits, reconcile, toggle, LoadOutcome, RightsReconciler, SaveOutcome};
pub use session::{
    CredentialStore, FileCredentialStore, FixedAnswer, ForceLoginPrompt, MemoryCredentialStore,
    SessionManager, SessionStore, StoredCredentials,
};
