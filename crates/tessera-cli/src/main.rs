//! Tessera CLI - key provisioning, token and capability tooling.

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;
pub mod config_bridge;
mod theme;

use commands::{caps, keys, token};

/// Tessera - signed tokens and capability checks
#[derive(Parser)]
#[command(name = "tessera")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to configuration file
    #[arg(short, long, global = true, env = "TESSERA_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage the signing keypair
    Keys {
        #[command(subcommand)]
        command: KeyCommands,
    },

    /// Mint and verify tokens
    Token {
        #[command(subcommand)]
        command: TokenCommands,
    },

    /// Inspect capability masks
    Caps {
        #[command(subcommand)]
        command: CapsCommands,
    },
}

#[derive(Subcommand)]
enum KeyCommands {
    /// Create the keypair (fails if one exists)
    Init,
    /// Show the current keypair
    Show,
}

#[derive(Subcommand)]
enum TokenCommands {
    /// Mint a token for a subject
    Mint {
        /// Subject to sign
        subject: String,
        /// Embed an expiry deadline
        #[arg(long)]
        expiring: bool,
    },
    /// Verify a token and print its subject
    Verify {
        /// Token to verify
        token: String,
        /// Enforce and strip the expiry deadline
        #[arg(long)]
        expiring: bool,
    },
}

#[derive(Subcommand)]
enum CapsCommands {
    /// List every capability
    List,
    /// Print the capabilities in a mask (decimal or 0x hex)
    Render {
        /// Capability mask
        mask: String,
        /// Print keys instead of labels
        #[arg(long)]
        keys: bool,
    },
    /// Check whether a mask grants a capability
    Check {
        /// Capability mask
        mask: String,
        /// Capability key (e.g. user.read)
        key: String,
    },
    /// Resolve a principal's capabilities from the role directory
    Resolve {
        /// Principal ID
        principal: String,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let config = tessera_config::Config::load(cli.config.as_deref())?.config;

    let mut log_config = config_bridge::to_log_config(&config);
    if cli.verbose {
        "debug".clone_into(&mut log_config.level);
    }
    if let Err(e) = tessera_telemetry::setup_logging(&log_config) {
        eprintln!("Failed to initialize logging: {e}");
    }

    let ok = match cli.command {
        Commands::Keys { command } => match command {
            KeyCommands::Init => keys::init_keys(&config).map(|()| true)?,
            KeyCommands::Show => keys::show_keys(&config).map(|()| true)?,
        },
        Commands::Token { command } => match command {
            TokenCommands::Mint { subject, expiring } => {
                token::mint(&config, &subject, expiring).map(|()| true)?
            },
            TokenCommands::Verify { token, expiring } => {
                token::verify(&config, &token, expiring)?
            },
        },
        Commands::Caps { command } => match command {
            CapsCommands::List => {
                caps::list();
                true
            },
            CapsCommands::Render { mask, keys } => caps::render_mask(&mask, keys).map(|()| true)?,
            CapsCommands::Check { mask, key } => caps::check(&mask, &key)?,
            CapsCommands::Resolve { principal } => {
                caps::resolve(&config, &principal).await.map(|()| true)?
            },
        },
    };

    Ok(if ok { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}
