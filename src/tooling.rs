//! Tooling layer
//!
//! Command-line access to the gallery store.

pub mod cli;

pub use cli::{Cli, CliContext, Commands, OutputFormat};
