mod commands;
mod config;
mod server;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::process;
use tracing_subscriber::EnvFilter;

use crate::commands::{cmd_add, cmd_list, cmd_summary};
use crate::config::Config;
use nibble_core::FoodLogService;
use nibble_core::day::parse_utc_offset;

#[derive(Parser)]
#[command(
    name = "nibble",
    version,
    about = "A simple calorie log",
    long_about = "A simple calorie log.\n\nLog what you eat, list a day's entries, and see the day's total."
)]
struct Cli {
    /// Reference time zone for calendar days, e.g. +02:00 (default: UTC or $NIBBLE_UTC_OFFSET)
    #[arg(long, global = true, value_name = "OFFSET", allow_hyphen_values = true)]
    utc_offset: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log a food item
    Add {
        /// Food name
        name: String,
        /// Calories (non-negative whole number)
        #[arg(allow_negative_numbers = true)]
        calories: i64,
        /// When it was eaten (RFC 3339, default: now)
        #[arg(long, value_name = "TIMESTAMP")]
        at: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List logged food items, newest first
    List {
        /// Only show one day (YYYY-MM-DD or today/yesterday/tomorrow)
        #[arg(short, long)]
        date: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show the daily total (defaults to today)
    Summary {
        /// Date to show (YYYY-MM-DD or today/yesterday/tomorrow, default: today)
        date: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Start the HTTP API server
    Serve {
        /// Port to listen on (default: $SERVER_PORT or 2022)
        #[arg(short, long)]
        port: Option<u16>,
        /// Address to bind to (default: $SERVER_BIND or 127.0.0.1; use 0.0.0.0 to expose to network)
        #[arg(short, long)]
        bind: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    let default_level = if matches!(cli.command, Commands::Serve { .. }) {
        "info"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = Config::load()?;
    let zone = match cli.utc_offset.as_deref() {
        Some(raw) => parse_utc_offset(raw)?,
        None => config.utc_offset,
    };
    let svc = FoodLogService::new(&config.db_path, zone)?;

    match cli.command {
        Commands::Add {
            name,
            calories,
            at,
            json,
        } => cmd_add(&svc, &name, calories, at.as_deref(), json),
        Commands::List { date, json } => cmd_list(&svc, date, json),
        Commands::Summary { date, json } => cmd_summary(&svc, date, json),
        Commands::Serve { port, bind } => {
            let port = port.unwrap_or(config.port);
            let bind = bind.unwrap_or(config.bind);
            server::start_server(svc, &bind, port).await
        }
    }
}
