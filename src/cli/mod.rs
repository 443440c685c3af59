//! Command-line front end: argument parsing and passphrase input

pub mod commands;
pub mod passphrase;

pub use commands::{run_cli, Cli, CliOutcome, Commands};
