//! `remessa` - CLI for patient shipment logistics tracking
//!
//! This binary provides the command-line interface over the shipment data
//! service: record management, search, spreadsheet export, JSON backups,
//! and the login gate.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use chrono::Utc;
use clap::Parser;

use remessa::cli::{
    AddCommand, BackupCommand, Cli, Command, ConfigCommand, DeleteCommand, EditCommand,
    ExportCommand, ListCommand, LoginCommand, ReceiveCommand, SearchCommand, StatusCommand,
};
use remessa::export::{
    default_backup_filename, default_export_filename, display_date, to_csv,
};
use remessa::{
    init_logging, Config, Session, SessionStore, ShipmentRecord, ShipmentService,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    init_logging(cli.verbosity());

    // Load configuration
    let config = Config::load_from(cli.config.clone())?;

    // Execute the command
    match cli.command {
        Command::Login(cmd) => handle_login(&config, &cmd),
        Command::Logout => handle_logout(&config),
        Command::Add(cmd) => handle_add(&config, cmd).await,
        Command::Edit(cmd) => handle_edit(&config, cmd).await,
        Command::Receive(cmd) => handle_receive(&config, cmd).await,
        Command::List(cmd) => handle_list(&config, &cmd).await,
        Command::Search(cmd) => handle_search(&config, &cmd).await,
        Command::Delete(cmd) => handle_delete(&config, &cmd).await,
        Command::Export(cmd) => handle_export(&config, &cmd).await,
        Command::Backup(cmd) => handle_backup(&config, cmd),
        Command::Status(cmd) => handle_status(&config, &cmd),
        Command::Config(cmd) => handle_config(&config, cmd),
    }
}

/// The login gate: data commands refuse to run without a session.
fn require_session(config: &Config) -> anyhow::Result<Session> {
    let sessions = SessionStore::open(config.database_path())?;
    match sessions.current()? {
        Some(session) => Ok(session),
        None => bail!("no active session; run `remessa login <identifier>` first"),
    }
}

fn handle_login(config: &Config, cmd: &LoginCommand) -> anyhow::Result<()> {
    let sessions = SessionStore::open(config.database_path())?;
    let session = sessions.authenticate(&config.auth.accounts, &cmd.identifier, &cmd.password)?;
    println!("Logged in as {}", session.name);
    Ok(())
}

fn handle_logout(config: &Config) -> anyhow::Result<()> {
    let sessions = SessionStore::open(config.database_path())?;
    sessions.end()?;
    println!("Session ended.");
    Ok(())
}

async fn handle_add(config: &Config, cmd: AddCommand) -> anyhow::Result<()> {
    require_session(config)?;
    let service = ShipmentService::from_config(config)?;

    let record = ShipmentRecord::new(
        cmd.tracking,
        cmd.patient,
        cmd.ship_date,
        cmd.destination,
        cmd.receive_date,
        cmd.note,
    );
    let saved = service.save(record).await?;
    println!("Saved record {}", saved.id);
    Ok(())
}

async fn handle_edit(config: &Config, cmd: EditCommand) -> anyhow::Result<()> {
    require_session(config)?;
    let service = ShipmentService::from_config(config)?;

    let records = service.fetch_all().await?;
    let Some(mut record) = records.into_iter().find(|r| r.id == cmd.id) else {
        bail!("no record with id {}", cmd.id);
    };

    if let Some(tracking) = cmd.tracking {
        record.tracking_number = tracking;
    }
    if let Some(patient) = cmd.patient {
        record.patient_name = patient;
    }
    if let Some(ship_date) = cmd.ship_date {
        record.ship_date = ship_date;
    }
    if let Some(destination) = cmd.destination {
        record.destination = destination;
    }
    if let Some(receive_date) = cmd.receive_date {
        record.receive_date = Some(receive_date);
    }
    if let Some(note) = cmd.note {
        // An empty string clears the note via normalization
        record.note = Some(note);
    }

    let saved = service.save(record).await?;
    println!("Updated record {}", saved.id);
    Ok(())
}

async fn handle_receive(config: &Config, cmd: ReceiveCommand) -> anyhow::Result<()> {
    require_session(config)?;
    let service = ShipmentService::from_config(config)?;

    let records = service.fetch_all().await?;
    let Some(mut record) = records.into_iter().find(|r| r.id == cmd.id) else {
        bail!("no record with id {}", cmd.id);
    };

    let date = cmd.date.unwrap_or_else(|| Utc::now().date_naive());
    record.receive_date = Some(date);

    let saved = service.save(record).await?;
    println!(
        "Marked {} received on {}",
        saved.id,
        display_date(saved.receive_date)
    );
    Ok(())
}

async fn handle_list(config: &Config, cmd: &ListCommand) -> anyhow::Result<()> {
    require_session(config)?;
    let service = ShipmentService::from_config(config)?;

    let mut records = service.fetch_all().await?;
    if let Some(limit) = cmd.limit {
        records.truncate(limit);
    }

    if cmd.json {
        println!("{}", serde_json::to_string_pretty(&records)?);
    } else {
        print_table(&records);
    }
    Ok(())
}

async fn handle_search(config: &Config, cmd: &SearchCommand) -> anyhow::Result<()> {
    require_session(config)?;
    let service = ShipmentService::from_config(config)?;

    let records = service.search(&cmd.query).await?;
    if cmd.json {
        println!("{}", serde_json::to_string_pretty(&records)?);
    } else if records.is_empty() {
        println!("No records match \"{}\".", cmd.query);
    } else {
        print_table(&records);
    }
    Ok(())
}

async fn handle_delete(config: &Config, cmd: &DeleteCommand) -> anyhow::Result<()> {
    require_session(config)?;

    if !cmd.yes {
        println!("This permanently deletes record {}.", cmd.id);
        println!("Use --yes to confirm.");
        return Ok(());
    }

    let service = ShipmentService::from_config(config)?;
    if service.delete(&cmd.id).await? {
        println!("Deleted record {}.", cmd.id);
    } else {
        println!("No record with id {}.", cmd.id);
    }
    Ok(())
}

async fn handle_export(config: &Config, cmd: &ExportCommand) -> anyhow::Result<()> {
    require_session(config)?;
    let service = ShipmentService::from_config(config)?;

    let records = service.fetch_all().await?;
    let csv = to_csv(&records);
    let output = cmd
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(default_export_filename(Utc::now().date_naive())));

    write_payload(&output, csv.as_bytes())?;
    if output != Path::new("-") {
        println!("Exported {} records to {}", records.len(), output.display());
    }
    Ok(())
}

fn handle_backup(config: &Config, cmd: BackupCommand) -> anyhow::Result<()> {
    require_session(config)?;
    let service = ShipmentService::from_config(config)?;

    match cmd {
        BackupCommand::Export { output } => {
            let payload = service.local().export_backup()?;
            let output = output
                .unwrap_or_else(|| PathBuf::from(default_backup_filename(Utc::now().date_naive())));
            write_payload(&output, &payload)?;
            if output != Path::new("-") {
                println!("Backup written to {}", output.display());
            }
        }
        BackupCommand::Import { file } => {
            let payload = std::fs::read(&file)
                .with_context(|| format!("failed to read backup file {}", file.display()))?;
            let added = service.local().import_backup(&payload)?;
            println!("Imported {added} new records (existing records kept).");
        }
    }
    Ok(())
}

fn handle_status(config: &Config, cmd: &StatusCommand) -> anyhow::Result<()> {
    let service = ShipmentService::from_config(config)?;
    let sessions = SessionStore::open(config.database_path())?;

    let status = service.status()?;
    let session = sessions.current()?;

    if cmd.json {
        let json = serde_json::json!({
            "mode": status.mode.to_string(),
            "records": status.records,
            "database_path": status.database_path,
            "session": session,
        });
        println!("{}", serde_json::to_string_pretty(&json)?);
    } else {
        println!("remessa status");
        println!("--------------");
        println!("Mode:      {}", status.mode);
        println!("Records:   {}", status.records);
        println!("Database:  {}", status.database_path.display());
        match session {
            Some(session) => println!("Session:   {}", session.name),
            None => println!("Session:   not logged in"),
        }
    }
    Ok(())
}

fn handle_config(config: &Config, cmd: ConfigCommand) -> anyhow::Result<()> {
    match cmd {
        ConfigCommand::Show { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(config)?);
            } else {
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[storage]");
                println!("  Database path:  {}", config.database_path().display());
                println!();
                println!("[remote]");
                println!(
                    "  Configured:     {}",
                    if config.remote_configured() { "yes" } else { "no" }
                );
                if !config.remote.base_url.is_empty() {
                    println!("  Base URL:       {}", config.remote.base_url);
                }
                println!();
                println!("[auth]");
                println!("  Accounts:       {}", config.auth.accounts.len());
            }
        }
        ConfigCommand::Path => {
            println!("{}", Config::default_config_path().display());
        }
        ConfigCommand::Validate { file } => {
            let path = file.unwrap_or_else(Config::default_config_path);
            println!("Validating configuration: {}", path.display());
            match Config::load_from(Some(path)) {
                Ok(_) => println!("Configuration is valid."),
                Err(e) => println!("Configuration error: {e}"),
            }
        }
    }
    Ok(())
}

/// Write an export payload to a file, or to stdout when the path is `-`.
fn write_payload(output: &Path, payload: &[u8]) -> anyhow::Result<()> {
    if output == Path::new("-") {
        std::io::stdout().write_all(payload)?;
        return Ok(());
    }
    std::fs::write(output, payload)
        .with_context(|| format!("failed to write {}", output.display()))?;
    Ok(())
}

/// Print records as a fixed-width table.
///
/// A pending receive date is shown as "pendente"; that label is
/// presentation only and never appears in exports.
fn print_table(records: &[ShipmentRecord]) {
    if records.is_empty() {
        println!("No records.");
        return;
    }

    println!(
        "{:<10}  {:<16}  {:<24}  {:<10}  {:<14}  {:<10}  {}",
        "ID", "CONHECIMENTO", "PACIENTE", "ENVIO", "DESTINO", "RECEBIDO", "OBSERVACAO"
    );
    for record in records {
        let received = if record.is_received() {
            record.receive_date_display()
        } else {
            "pendente".to_string()
        };
        println!(
            "{:<10}  {:<16}  {:<24}  {:<10}  {:<14}  {:<10}  {}",
            record.id,
            record.tracking_number,
            record.patient_name,
            display_date(Some(record.ship_date)),
            record.destination,
            received,
            record.note.as_deref().unwrap_or("")
        );
    }
}
