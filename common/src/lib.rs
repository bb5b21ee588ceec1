//! Functions, constants, and types needed by anything in this workspace which drives
//! the zfs(8) command line.
//!
pub mod command_helpers;
pub mod constants;
pub mod rules;
pub mod types;
