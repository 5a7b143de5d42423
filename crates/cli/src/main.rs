//! Operator tool for the document-store access layer.
//!
//! Run with: `docbridge <command>`
//!
//! Results are written to stdout as pretty JSON; logs go to stderr.

#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::env;
use std::io::Write as _;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{anyhow, Context};
use docbridge_core::Diagnostics;
use docbridge_infra::{config, GraphDocumentClient};
use serde::Serialize;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Debug, PartialEq, Eq)]
enum Command {
    TestConnection,
    Verify(String),
    List(String),
    Get(String),
    GetItem { item_id: String, drive: Option<String> },
    Drives,
    Search { query: String, drive: Option<String> },
    Help,
}

fn parse_command(args: &[&str]) -> anyhow::Result<Command> {
    match args {
        [] | ["help"] => Ok(Command::Help),
        ["test-connection"] => Ok(Command::TestConnection),
        ["verify", path] => Ok(Command::Verify((*path).to_string())),
        ["list"] => Ok(Command::List(String::new())),
        ["list", folder] => Ok(Command::List((*folder).to_string())),
        ["get", path] => Ok(Command::Get((*path).to_string())),
        ["get-item", item_id] => {
            Ok(Command::GetItem { item_id: (*item_id).to_string(), drive: None })
        }
        ["get-item", item_id, drive] => Ok(Command::GetItem {
            item_id: (*item_id).to_string(),
            drive: Some((*drive).to_string()),
        }),
        ["drives"] => Ok(Command::Drives),
        ["search", "--drive", drive, query @ ..] if !query.is_empty() => Ok(Command::Search {
            query: query.join(" "),
            drive: Some((*drive).to_string()),
        }),
        ["search", query @ ..] if !query.is_empty() && query[0] != "--drive" => {
            Ok(Command::Search { query: query.join(" "), drive: None })
        }
        [command, ..] => Err(anyhow!("Unknown command or wrong arguments: {command}")),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let raw: Vec<String> = env::args().skip(1).collect();
    let json_logs = raw.iter().any(|arg| arg == "--json-logs");
    let args: Vec<&str> =
        raw.iter().map(String::as_str).filter(|arg| *arg != "--json-logs").collect();

    // before tracing, so RUST_LOG from .env applies
    let dotenv = dotenvy::dotenv();
    init_tracing(json_logs);
    if let Ok(path) = dotenv {
        debug!(path = %path.display(), "Loaded .env file");
    }

    let result = match parse_command(&args) {
        Ok(Command::Help) => {
            print_help();
            Ok(true)
        }
        Ok(command) => run(command).await,
        Err(e) => {
            eprintln!("{e}");
            eprintln!();
            print_help();
            Err(anyhow!("Invalid arguments"))
        }
    };

    match result {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("Command failed: {e:#}");
            ExitCode::FAILURE
        }
    }
}

/// `RUST_LOG`, or `info` when unset or invalid.
fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

fn init_tracing(json_logs: bool) {
    let builder = tracing_subscriber::fmt().with_env_filter(env_filter()).with_writer(std::io::stderr);
    if json_logs {
        builder.json().init();
    } else {
        builder.with_target(false).init();
    }
}

fn print_help() {
    println!("DocBridge document-store tool");
    println!();
    println!("USAGE:");
    println!("    docbridge [--json-logs] <COMMAND>");
    println!();
    println!("COMMANDS:");
    println!("    test-connection  Check connectivity and print a diagnostic report");
    println!("    verify <path>    Check that a file can be read and show a preview");
    println!("    list [folder]    List a folder of the document library");
    println!("    get <path>       Write a file's raw content to stdout");
    println!("    get-item <id> [drive-id]");
    println!("                     Write an item's raw content to stdout, by item id");
    println!("    drives           List the site's document libraries");
    println!("    search [--drive <drive-id>] <query>");
    println!("                     Search a drive (default: the site's default drive)");
    println!("    help             Show this help message");
    println!();
    println!("Configuration is read from the environment (a .env file is honoured) or");
    println!("from docbridge.json / docbridge.toml.");
}

/// Run a command; `Ok(false)` means the command ran but reported a failure.
async fn run(command: Command) -> anyhow::Result<bool> {
    let config = config::load().context("Failed to load configuration")?;
    let client = Arc::new(
        GraphDocumentClient::from_config(&config).context("Failed to build document client")?,
    );

    match command {
        Command::TestConnection => {
            let report = Diagnostics::new(client).test_connection().await;
            print_json(&report)?;
            Ok(report.connected)
        }
        Command::Verify(path) => {
            let report = Diagnostics::new(client).verify_file_access(&path).await;
            print_json(&report)?;
            Ok(report.accessible)
        }
        Command::List(folder) => {
            let items = client.list_files(&folder).await?;
            print_json(&items)?;
            Ok(true)
        }
        Command::Get(path) => {
            let content = client.get_file_content(&path).await?;
            write_raw(&content)?;
            Ok(true)
        }
        Command::GetItem { item_id, drive } => {
            let content = client.get_item_content(&item_id, drive.as_deref()).await?;
            write_raw(&content)?;
            Ok(true)
        }
        Command::Drives => {
            let drives = client.list_drives().await?;
            print_json(&drives)?;
            Ok(true)
        }
        Command::Search { query, drive } => {
            let hits = client.search_files(&query, drive.as_deref()).await?;
            print_json(&hits)?;
            Ok(true)
        }
        Command::Help => {
            print_help();
            Ok(true)
        }
    }
}

fn write_raw(content: &[u8]) -> anyhow::Result<()> {
    let mut stdout = std::io::stdout().lock();
    stdout.write_all(content).context("Failed to write file content")?;
    stdout.flush()?;
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
