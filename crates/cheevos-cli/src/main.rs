use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use cheevos::{Client, ClientConfig, ConsoleId, InlineExecutor, UreqTransport};
use clap::{Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "cheevos")]
#[command(about = "Achievement service client", version)]
struct Args {
    /// Client configuration file (TOML)
    #[arg(short, long, env = "CHEEVOS_CONFIG")]
    config: Option<PathBuf>,

    /// Service base URL, overrides the configuration file
    #[arg(long, env = "CHEEVOS_HOST")]
    host: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Log in and store the session token
    Login {
        username: String,
        /// Account password
        #[arg(short, long, env = "CHEEVOS_PASSWORD")]
        password: String,
    },
    /// Remove the stored session token
    Logout,
    /// Show unlock progress for every game of a console
    Progress {
        /// Console id or name
        #[arg(value_parser = parse_console)]
        console: ConsoleId,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// List known content hashes for a console
    Hashes {
        /// Console id or name
        #[arg(value_parser = parse_console)]
        console: ConsoleId,
        #[arg(long)]
        json: bool,
    },
    /// Print the text for a runtime error code
    Describe {
        #[arg(allow_hyphen_values = true)]
        code: i32,
    },
}

fn parse_console(value: &str) -> std::result::Result<ConsoleId, String> {
    match value.parse::<u32>() {
        Ok(id) => ConsoleId::from_u32(id).ok_or_else(|| format!("unknown console id {id}")),
        Err(_) => value
            .parse::<ConsoleId>()
            .map_err(|_| format!("unknown console '{value}'")),
    }
}

fn load_config(args: &Args) -> Result<ClientConfig> {
    let mut config = match &args.config {
        Some(path) => ClientConfig::load(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => ClientConfig::default(),
    };
    if let Some(host) = &args.host {
        config.host = host.clone();
    }
    debug!(host = %config.host, "configuration loaded");
    Ok(config)
}

/// A client that runs every request on the calling thread.
fn build_client(config: ClientConfig) -> Result<Client> {
    Client::builder()
        .config(config)
        .transport(Arc::new(UreqTransport::new(Duration::from_secs(30))))
        .executor(Arc::new(InlineExecutor))
        .build()
        .context("Failed to create client")
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("cheevos=info".parse()?))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    match &args.command {
        Command::Describe { code } => commands::describe::run(*code),
        Command::Logout => commands::login::logout(),
        Command::Login { username, password } => {
            let client = build_client(load_config(&args)?)?;
            commands::login::run(&client, username, password)
        }
        Command::Progress { console, json } => {
            let client = build_client(load_config(&args)?)?;
            commands::progress::run(&client, *console, *json)
        }
        Command::Hashes { console, json } => {
            let client = build_client(load_config(&args)?)?;
            commands::hashes::run(&client, *console, *json)
        }
    }
}
