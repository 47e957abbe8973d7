//! CLI command handlers.

pub mod assets;
pub mod predict;
pub mod serve;
