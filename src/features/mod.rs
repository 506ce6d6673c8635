//! Features layer - one module per business capability
//!
//! Each feature keeps its own models, DTOs, services, handlers and
//! routes; features talk to each other through their service types.

pub mod admin;
pub mod attachments;
pub mod facilities;
pub mod reviews;
pub mod stats;
pub mod users;
