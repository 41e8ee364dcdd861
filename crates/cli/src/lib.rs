pub mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use homesearch_core::config::{AppConfig, LoadOptions, LogFormat};
use tracing_subscriber::EnvFilter;

use commands::CallerArgs;

#[derive(Debug, Parser)]
#[command(
    name = "homesearch",
    about = "Homesearch listing assistant CLI",
    long_about = "Search listings, inspect signed requests and configuration, and talk to the listing assistant.",
    after_help = "Examples:\n  homesearch search --city Houston --max-price 500000\n  homesearch detail 84512233\n  homesearch sign listings --query city=Katy\n  homesearch config\n  homesearch ask \"3 bedroom homes in Bridgeland\""
)]
pub struct Cli {
    #[arg(long, global = true, help = "Read configuration from this TOML file")]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Search active or sold listings from flags or a JSON search intent")]
    Search(commands::search::SearchArgs),
    #[command(about = "Fetch one property by listing id")]
    Detail {
        #[arg(help = "Listing id")]
        id: String,
        #[command(flatten)]
        caller: CallerArgs,
    },
    #[command(about = "Print the signed request for an endpoint without sending it")]
    Sign(commands::sign::SignArgs),
    #[command(
        about = "Inspect effective configuration values with source attribution and redaction"
    )]
    Config,
    #[command(about = "Ask the listing assistant; without a message, start an interactive session")]
    Ask {
        #[arg(help = "Message for a single turn")]
        message: Option<String>,
        #[command(flatten)]
        caller: CallerArgs,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();
    let options = LoadOptions { config_path: cli.config.clone(), ..LoadOptions::default() };

    if let Ok(config) = AppConfig::load(options.clone()) {
        init_logging(&config);
    }

    let result = match cli.command {
        Command::Search(args) => commands::search::run(options, args),
        Command::Detail { id, caller } => commands::detail::run(options, &id, caller),
        Command::Sign(args) => commands::sign::run(options, args),
        Command::Config => commands::config::run(options),
        Command::Ask { message, caller } => commands::ask::run(options, message, caller),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}

/// Logs go to stderr so command output on stdout stays machine-readable.
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_new(&config.logging.level).unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    // Only the first subscriber is installed.
    let _ = match config.logging.format {
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
}
