//! CLI module for parsesmith - command-line interface and subcommands.

pub mod commands;

pub use commands::Cli;
