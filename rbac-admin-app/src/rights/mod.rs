//! Rights matrix editing
//!
//! [`reconcile`] and [`toggle`] are pure; [`RightsReconciler`] wraps them with
//! the selected role, load tickets and bulk save.

pub mod editor;
pub mod reconcile;

pub use editor::{LoadOutcome, RightsReconciler, SaveOutcome};
pub use reconcile::{carry_edits, reconcile, toggle};
