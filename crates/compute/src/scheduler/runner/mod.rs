//! Orchestrator runner -- dispatches analyzers and merges their findings.
//!
//! Split into focused submodules:
//! - `core`: Orchestrator struct, constructor, registration, and accessor methods
//! - `execution`: parallel and sequential dispatch plus the merge step

mod core;
mod execution;
#[cfg(test)]
mod tests;

pub use self::core::Orchestrator;
