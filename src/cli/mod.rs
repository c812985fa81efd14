// src/cli/mod.rs
// Command-line front end over the record and attendance stores.

pub mod attendance;
pub mod records;
pub mod transfer;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::persistence::SharedGateway;
use crate::records::{ModuleKey, TableStore};
use crate::settings::{self, AppSettings, BackendKind};

#[derive(Parser)]
#[command(name = "recorddesk")]
#[command(about = "RecordDesk - spreadsheet-style record modules and attendance", long_about = None)]
pub struct Cli {
    /// Storage backend (overrides settings and RECORDDESK_BACKEND)
    #[arg(long, global = true, value_enum)]
    pub backend: Option<BackendKind>,

    /// Directory holding the database or JSON files
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Base URL of a remote store for the http backend
    #[arg(long, global = true)]
    pub server_url: Option<String>,

    /// More log output (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn apply_overrides(&self, settings: &mut AppSettings) {
        if let Some(backend) = self.backend {
            settings.backend = backend;
        }
        if let Some(dir) = &self.data_dir {
            settings.data_dir = Some(dir.clone());
        }
        if let Some(url) = &self.server_url {
            settings.server_url = Some(url.clone());
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show a module's rows, optionally filtered
    List {
        module: String,
        /// Case-insensitive text to search for in any column
        #[arg(short, long)]
        query: Option<String>,
        /// Print row ids
        #[arg(long)]
        ids: bool,
    },

    /// Show a module's columns
    Columns { module: String },

    /// Create a row from NAME=VALUE pairs
    Add {
        module: String,
        #[arg(value_parser = parse_field, required = true)]
        fields: Vec<(String, String)>,
    },

    /// Replace the values of an existing row
    Edit {
        module: String,
        id: String,
        #[arg(value_parser = parse_field, required = true)]
        fields: Vec<(String, String)>,
    },

    /// Delete rows by id, or every row matching a query
    Delete {
        module: String,
        ids: Vec<String>,
        /// Delete all rows matching this text instead of listing ids
        #[arg(long, conflicts_with = "ids")]
        matching: Option<String>,
    },

    /// Remove all rows and columns of a module
    Clear {
        module: String,
        /// Required confirmation
        #[arg(long)]
        yes: bool,
    },

    /// Append rows from an xlsx/xls/ods/csv file
    Import { module: String, file: PathBuf },

    /// Write a module to an xlsx file
    Export {
        module: String,
        /// Output path (defaults to <Title>_Export.xlsx)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Sheet title
        #[arg(long)]
        title: Option<String>,
    },

    /// Monthly attendance grid
    Attendance {
        #[command(subcommand)]
        command: attendance::AttendanceCommand,
    },

    /// Print the effective settings
    Config {
        /// Store the effective settings in the settings file
        #[arg(long)]
        save: bool,
    },
}

/// `NAME=VALUE`. The value may be empty; the name may not.
pub fn parse_field(raw: &str) -> Result<(String, String), String> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got '{}'", raw))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("missing column name in '{}'", raw));
    }
    Ok((name.to_string(), value.to_string()))
}

pub async fn open_store(gateway: &SharedGateway, settings: &AppSettings, module: &str) -> Result<TableStore> {
    let key = ModuleKey::parse(module)?;
    let store = TableStore::open(gateway.clone(), key, settings.default_columns())
        .await
        .with_context(|| format!("Failed to load module '{}'", module))?;
    Ok(store)
}

pub async fn dispatch(command: Commands, settings: &AppSettings) -> Result<()> {
    if let Commands::Config { save } = command {
        println!("{}", serde_json::to_string_pretty(settings)?);
        if save {
            let path = settings::io::save(settings)?;
            println!("Saved to {}", path.display());
        }
        return Ok(());
    }

    let gateway = settings.build_gateway().context("Failed to open storage")?;
    match command {
        Commands::List { module, query, ids } => {
            let store = open_store(&gateway, settings, &module).await?;
            records::list(&store, query.as_deref().unwrap_or(""), ids).await
        }
        Commands::Columns { module } => {
            let store = open_store(&gateway, settings, &module).await?;
            records::columns(&store).await
        }
        Commands::Add { module, fields } => {
            let store = open_store(&gateway, settings, &module).await?;
            records::upsert(&store, fields, None).await
        }
        Commands::Edit { module, id, fields } => {
            let store = open_store(&gateway, settings, &module).await?;
            records::upsert(&store, fields, Some(id)).await
        }
        Commands::Delete { module, ids, matching } => {
            let store = open_store(&gateway, settings, &module).await?;
            match matching {
                Some(query) => records::delete_matching(&store, &query).await,
                None if ids.is_empty() => bail!("Give row ids or --matching <text>."),
                None => records::delete(&store, ids).await,
            }
        }
        Commands::Clear { module, yes } => {
            if !yes {
                bail!("Refusing to clear '{}' without --yes.", module);
            }
            let store = open_store(&gateway, settings, &module).await?;
            records::clear(&store).await
        }
        Commands::Import { module, file } => {
            let store = open_store(&gateway, settings, &module).await?;
            transfer::import(&store, &file).await
        }
        Commands::Export { module, output, title } => {
            let store = open_store(&gateway, settings, &module).await?;
            transfer::export(&store, output, title.as_deref()).await
        }
        Commands::Attendance { command } => attendance::run(gateway, command).await,
        Commands::Config { .. } => Ok(()),
    }
}
