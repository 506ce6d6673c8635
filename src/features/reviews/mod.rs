//! Facility reviews and their moderation lifecycle.
//!
//! Reviews are submitted with optional image attachments, start out
//! `pending`, and become publicly visible only once an admin approves
//! them. One review per user per facility, enforced at the database.

pub mod dtos;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;

pub use routes::routes;
pub use services::ReviewService;
