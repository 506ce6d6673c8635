//! Attachment registry: metadata rows in the database, bytes on disk.
//!
//! Files enter through review creation and leave through review deletion
//! or the admin reconciliation sweep; this feature serves downloads and
//! listings and keeps both sides consistent.

pub mod dtos;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;

pub use routes::routes;
pub use services::AttachmentService;
