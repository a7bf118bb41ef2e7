use std::path::PathBuf;
use std::process::exit;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use metadata_manager::config::context::build_session;
use metadata_manager::config::schema::{load_config, load_config_from_env};
use metadata_manager::dao::utils::{str_to_floating_point, str_to_integral, ConversionError};
use metadata_manager::dao::DbSessionManager;
use metadata_manager::error::{ErrorCode, Result};
use metadata_manager::metadata::{DataTypes, Roles, Statistics, Tables};
use metadata_manager::model::TableStatistic;

#[derive(Debug, Parser)]
#[clap(name = "metadata-manager", about = "Inspect and maintain the metadata catalog", version)]
struct Args {
    /// TOML configuration file; the METADATA_* environment is used without it
    #[clap(short, long)]
    config: Option<PathBuf>,

    /// Emit logs as JSON lines
    #[clap(long)]
    json_logs: bool,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Connect and prepare every data access object
    Init,
    /// List all tables
    Tables,
    /// Show one table
    Table { table: String },
    /// List all data types
    Datatypes,
    /// Show one role
    Role { role: String },
    /// Set the row count estimate of a table
    SetTuples { table: String, tuples: String },
}

/// An `<ID|NAME>` argument.
enum Target {
    Id(i64),
    Name(String),
}

fn parse_target(input: &str) -> Result<Target> {
    match str_to_integral::<i64>(input) {
        Ok(id) => Ok(Target::Id(id)),
        Err(ConversionError::NotANumber) => Ok(Target::Name(input.to_string())),
        Err(ConversionError::OutOfRange) => Err(ErrorCode::InvalidParameter),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let output = serde_json::to_string_pretty(value).map_err(|_| ErrorCode::InternalError)?;
    println!("{output}");
    Ok(())
}

async fn run(session: Arc<dyn DbSessionManager>, command: Command) -> Result<()> {
    session.connect().await?;

    let tables = Tables::new(session.clone());
    match command {
        Command::Init => {
            tables.init().await?;
            Statistics::new(session.clone()).init().await?;
            Roles::new(session.clone()).init().await?;
            info!("Metadata catalog is ready");
        }
        Command::Tables => print_json(&tables.get_all().await?)?,
        Command::Table { table } => {
            let table = match parse_target(&table)? {
                Target::Id(id) => tables.get(id).await?,
                Target::Name(name) => tables.get_by_name(&name).await?,
            };
            print_json(&table)?
        }
        Command::Datatypes => print_json(&DataTypes::new(session.clone()).get_all().await?)?,
        Command::Role { role } => {
            let roles = Roles::new(session.clone());
            let role = match parse_target(&role)? {
                Target::Id(id) => roles.get(id).await?,
                Target::Name(name) => roles.get_by_name(&name).await?,
            };
            print_json(&role)?
        }
        Command::SetTuples { table, tuples } => {
            let tuples = str_to_floating_point::<f32>(&tuples).map_err(|error| {
                error!("Invalid row count {tuples:?}: {error}");
                ErrorCode::InvalidParameter
            })?;
            let (id, name) = match parse_target(&table)? {
                Target::Id(id) => (Some(id), None),
                Target::Name(name) => (None, Some(name)),
            };
            let statistic = TableStatistic {
                id,
                name,
                tuples: Some(tuples),
                ..Default::default()
            };
            let table_id = tables.set_statistic(&statistic).await?;
            info!("Updated the row count of table {table_id}");
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("metadata_manager=info"));
    if args.json_logs {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }

    let config = match &args.config {
        Some(path) => load_config(path),
        None => load_config_from_env(),
    };
    let config = match config {
        Ok(config) => config,
        Err(error) => {
            error!("Error loading the configuration: {error}");
            exit(2);
        }
    };

    let session = build_session(&config);
    if let Err(code) = run(session, args.command).await {
        error!("Command failed: {code}");
        exit(1);
    }
}
