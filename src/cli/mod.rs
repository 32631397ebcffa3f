//! CLI command handlers

pub mod commands;

pub use commands::{load_registry, normalize, rules, sql, NormalizeOptions};
