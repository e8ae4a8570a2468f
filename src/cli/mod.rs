//! CLI module for hdb-advisor - command-line interface and subcommands.
//!
//! Provides the main entry point with one subcommand per page, plus TUI
//! launch when no subcommand is given.

pub mod commands;

pub use commands::Cli;
