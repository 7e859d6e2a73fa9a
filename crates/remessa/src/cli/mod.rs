//! Command-line interface for remessa.
//!
//! This module provides the CLI structure and command definitions for the
//! `remessa` binary.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use commands::{
    parse_date_arg, AddCommand, BackupCommand, ConfigCommand, DeleteCommand, EditCommand,
    ExportCommand, ListCommand, LoginCommand, ReceiveCommand, SearchCommand, StatusCommand,
};

/// remessa - patient shipment logistics tracking
///
/// A local-first tracker for patient sample shipments: records live in a
/// local database and are mirrored best-effort to a hosted backend when
/// one is configured.
#[derive(Debug, Parser)]
#[command(name = "remessa")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Log in with a configured identifier
    Login(LoginCommand),

    /// End the current session
    Logout,

    /// Add a shipment record
    Add(AddCommand),

    /// Edit an existing shipment record
    Edit(EditCommand),

    /// Mark a shipment as received
    Receive(ReceiveCommand),

    /// List shipment records
    List(ListCommand),

    /// Search shipment records
    Search(SearchCommand),

    /// Delete a shipment record
    Delete(DeleteCommand),

    /// Export records as a spreadsheet file
    Export(ExportCommand),

    /// Export or import JSON backups of the local collection
    #[command(subcommand)]
    Backup(BackupCommand),

    /// Show storage mode, record count, and session
    Status(StatusCommand),

    /// View or validate configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> crate::logging::Verbosity {
        if self.quiet {
            crate::logging::Verbosity::Quiet
        } else {
            match self.verbose {
                0 => crate::logging::Verbosity::Normal,
                1 => crate::logging::Verbosity::Verbose,
                _ => crate::logging::Verbosity::Trace,
            }
        }
    }
}
