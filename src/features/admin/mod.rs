//! Moderation and maintenance surface: the pending queue, approve and
//! reject decisions, attachment integrity tooling and the dashboard.

pub mod dtos;
pub mod handlers;
pub mod routes;

pub use routes::routes;
