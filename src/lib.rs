//! Hierarchical configuration loader for a security-monitoring agent.
//!
//! Reads a main YAML file, merges the files and directories it includes,
//! applies command-line overrides and exposes the result through typed,
//! path-addressed accessors with environment variable expansion.

pub mod address;
pub mod cli;
pub mod config;
pub mod document;
pub mod env;
pub mod error;
pub mod include;
pub mod logging;
