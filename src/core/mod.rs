//! Core layer - cross-cutting application concerns
//!
//! Configuration, database pooling, error taxonomy, extractors and HTTP
//! middleware shared by every feature.

pub mod config;
pub mod database;
pub mod error;
pub mod extractor;
pub mod middleware;
pub mod openapi;
