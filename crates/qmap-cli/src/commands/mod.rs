//! CLI command implementations.

pub mod arch;
pub mod common;
pub mod passes;
pub mod route;
