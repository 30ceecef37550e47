//! REST client for the RBAC admin backend
//!
//! One async trait per resource family, implemented over HTTP by
//! [`HttpConsoleApi`]. Application code depends on the traits so it can be
//! exercised against in-memory fakes.

pub mod api;

pub use api::*;
