//! CLI command implementations.

pub mod analyze;
pub mod common;
pub mod forward;
pub mod properties;
pub mod reverse;
pub mod schedule;
pub mod solvers;
pub mod sweep;
