//! Command handlers, one module per subcommand.

pub mod common;
pub mod config;
pub mod manifest;
pub mod plan;
pub mod render;
