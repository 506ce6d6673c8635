//! User directory lookups.
//!
//! Accounts are provisioned outside this service; reviews only need to
//! resolve authors and check moderation rights, so this feature exposes
//! no HTTP routes of its own.

pub mod models;
pub mod services;

pub use services::UserService;
