//! Vouch - LDAP password comparison authenticator
//!
//! Verifies user credentials against an LDAP directory without binding as
//! the user.

mod commands;

use clap::{Parser, Subcommand};
use commands::encode::Scheme;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use vouch_core::config::LoggingConfig;
use vouch_core::VouchConfig;

#[derive(Parser)]
#[command(name = "vouch")]
#[command(author = "Vouch Team")]
#[command(version = vouch_core::VERSION)]
#[command(about = "LDAP password comparison authenticator", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long, global = true, env = "VOUCH_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    log_level: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Verify a username and password against the directory
    Authenticate {
        /// Username to authenticate
        #[arg(short, long)]
        username: String,

        /// Password to verify
        #[arg(short, long, env = "VOUCH_PASSWORD", hide_env_values = true)]
        password: String,

        /// Authenticate against a JSON directory fixture instead of a server
        #[arg(long)]
        fixture: Option<PathBuf>,

        /// Print the identity as JSON
        #[arg(long)]
        json: bool,
    },

    /// Validate the configuration
    CheckConfig {
        /// Also open and bind a directory connection
        #[arg(long)]
        connect: bool,
    },

    /// Encode a password in an RFC 2307 scheme
    EncodePassword {
        #[arg(short, long, value_enum, default_value_t = Scheme::Ssha)]
        scheme: Scheme,

        /// Raw password
        password: String,
    },

    /// Show version information
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    // Load or create config
    let mut config = if let Some(config_path) = &cli.config {
        let mut config = VouchConfig::from_file(config_path)?;
        config.apply_env();
        config
    } else {
        VouchConfig::from_env()
    };

    // Override with CLI args
    if let Some(level) = cli.log_level {
        config.logging.level = level;
    }

    init_logging(&config.logging);
    debug!("Configuration loaded");

    match cli.command {
        Commands::Authenticate {
            username,
            password,
            fixture,
            json,
        } => commands::authenticate::run(&config, &username, &password, fixture, json).await,
        Commands::CheckConfig { connect } => commands::check::run(&config, connect).await,
        Commands::EncodePassword { scheme, password } => {
            println!("{}", commands::encode::encode(scheme, &password));
            Ok(ExitCode::SUCCESS)
        }
        Commands::Version => {
            println!("vouch {}", vouch_core::VERSION);
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Logs go to stderr so command output on stdout stays parseable
fn init_logging(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&logging.level));

    let json = logging.format.eq_ignore_ascii_case("json");

    tracing_subscriber::registry()
        .with(json.then(|| fmt::layer().json().with_writer(std::io::stderr)))
        .with((!json).then(|| fmt::layer().with_target(true).with_writer(std::io::stderr)))
        .with(filter)
        .init();
}
