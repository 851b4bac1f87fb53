//! CLI command implementations.

pub mod common;
pub mod counts;
pub mod layout;
pub mod version;
pub mod zne;
