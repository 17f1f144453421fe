//! CLI module for voicecrm
//!
//! Contains argument parsing and command implementations.

pub mod args;
pub mod commands;
pub mod completions;

pub use args::{
    CallFilterArgs, CallsCommand, Cli, Commands, ConfigCommand, CustomersCommand, ExportTarget,
};
