//! CLI command implementations.

pub mod replay;
pub mod strategies;
pub mod validate;
