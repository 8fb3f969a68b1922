//! Subcommand implementations.

pub mod clean;
pub mod list;
pub mod verify;
