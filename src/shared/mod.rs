//! Shared layer - constants, common types and validation helpers

pub mod constants;
pub mod test_helpers;
pub mod types;
pub mod validation;
