//! Command-line interface module.
//!
//! This module provides the CLI structure and command handlers for the taleweaver binary.

mod commands;
mod flows;
mod run;
mod serve;

pub use commands::{Cli, Commands};
pub use flows::list_flows;
pub use run::run_flow;
pub use serve::serve;
