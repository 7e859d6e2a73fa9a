//! CLI command definitions.
//!
//! This module defines the structure of all CLI subcommands.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Subcommand};

use crate::export::parse_display_date;

/// Parse a date argument in either ISO (`YYYY-MM-DD`) or display
/// (`DD/MM/YYYY`) form.
///
/// # Errors
///
/// Returns a message naming both accepted forms when neither matches.
pub fn parse_date_arg(input: &str) -> Result<NaiveDate, String> {
    input
        .parse::<NaiveDate>()
        .ok()
        .or_else(|| parse_display_date(input))
        .ok_or_else(|| format!("expected YYYY-MM-DD or DD/MM/YYYY, got {input:?}"))
}

/// Login command arguments.
#[derive(Debug, Args)]
pub struct LoginCommand {
    /// Login identifier
    pub identifier: String,

    /// Login secret
    #[arg(short, long)]
    pub password: String,
}

/// Add command arguments.
#[derive(Debug, Args)]
pub struct AddCommand {
    /// Tracking ("conhecimento") number
    #[arg(short, long)]
    pub tracking: String,

    /// Patient name
    #[arg(short, long)]
    pub patient: String,

    /// Ship date (YYYY-MM-DD or DD/MM/YYYY)
    #[arg(short, long, value_parser = parse_date_arg)]
    pub ship_date: NaiveDate,

    /// Destination
    #[arg(short, long)]
    pub destination: String,

    /// Receive date, if already received (YYYY-MM-DD or DD/MM/YYYY)
    #[arg(short, long, value_parser = parse_date_arg)]
    pub receive_date: Option<NaiveDate>,

    /// Free-text note
    #[arg(short, long)]
    pub note: Option<String>,
}

/// Edit command arguments. Only the provided fields change; the record is
/// re-saved whole.
#[derive(Debug, Args)]
pub struct EditCommand {
    /// Id of the record to edit
    pub id: String,

    /// New tracking number
    #[arg(short, long)]
    pub tracking: Option<String>,

    /// New patient name
    #[arg(short, long)]
    pub patient: Option<String>,

    /// New ship date (YYYY-MM-DD or DD/MM/YYYY)
    #[arg(short, long, value_parser = parse_date_arg)]
    pub ship_date: Option<NaiveDate>,

    /// New destination
    #[arg(short, long)]
    pub destination: Option<String>,

    /// New receive date (YYYY-MM-DD or DD/MM/YYYY)
    #[arg(short, long, value_parser = parse_date_arg)]
    pub receive_date: Option<NaiveDate>,

    /// New note (pass an empty string to clear it)
    #[arg(short, long)]
    pub note: Option<String>,
}

/// Receive command arguments.
#[derive(Debug, Args)]
pub struct ReceiveCommand {
    /// Id of the record to mark received
    pub id: String,

    /// Receive date; defaults to today (YYYY-MM-DD or DD/MM/YYYY)
    #[arg(long, value_parser = parse_date_arg)]
    pub date: Option<NaiveDate>,
}

/// List command arguments.
#[derive(Debug, Args)]
pub struct ListCommand {
    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,

    /// Maximum number of records to show
    #[arg(short, long)]
    pub limit: Option<usize>,
}

/// Search command arguments.
#[derive(Debug, Args)]
pub struct SearchCommand {
    /// Free-text query (matches all fields and date fragments)
    pub query: String,

    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Delete command arguments.
#[derive(Debug, Args)]
pub struct DeleteCommand {
    /// Id of the record to delete
    pub id: String,

    /// Confirm the deletion
    #[arg(short, long)]
    pub yes: bool,
}

/// Export command arguments.
#[derive(Debug, Args)]
pub struct ExportCommand {
    /// Output file; `-` for stdout. Defaults to a dated file name in the
    /// current directory.
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Backup commands.
#[derive(Debug, Subcommand)]
pub enum BackupCommand {
    /// Write the full local collection to a JSON backup file
    Export {
        /// Output file; `-` for stdout. Defaults to a dated file name.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Merge a JSON backup file into the local collection
    Import {
        /// Backup file to read
        file: PathBuf,
    },
}

/// Status command arguments.
#[derive(Debug, Args)]
pub struct StatusCommand {
    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Print the default configuration file path
    Path,

    /// Validate a configuration file
    Validate {
        /// File to validate; defaults to the default config path
        file: Option<PathBuf>,
    },
}
