//! Role/Menu Directory Cache
//!
//! In-memory role and menu lists that feed the rights editor, refreshed on
//! demand and after every administrative change.

pub mod cache;

pub use cache::{sort_menus, DirectoryCache, MenuCatalog};
