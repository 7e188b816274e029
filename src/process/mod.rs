//! Plugin process execution.
//!
//! This module spawns runner processes and encodes structured runner
//! options into command-line arguments.

pub mod cli_args;
pub mod executor;

pub use cli_args::{encode_cli_args, CliOptions};
pub use executor::{execute_process, ProcessConfig, ProcessEvent};
