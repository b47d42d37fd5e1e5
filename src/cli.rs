//! Command-line interface

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Payment runtime assembled from a YAML configuration
#[derive(Parser, Debug)]
#[command(name = "payum")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file (YAML)
    #[arg(short, long, env = "PAYUM_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", env = "PAYUM_LOG_LEVEL", global = true)]
    pub log_level: String,

    /// Log format (text, json)
    #[arg(long, env = "PAYUM_LOG_FORMAT", global = true)]
    pub log_format: Option<String>,

    /// Subcommand (defaults to `check`)
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Build the runtime and report what was resolved (default)
    Check,

    /// List gateway factories
    Factories {
        /// Also construct each factory and show its title
        #[arg(long)]
        details: bool,
    },

    /// List configured gateways
    Gateways,

    /// Run a capture and a status request through a gateway
    Capture {
        /// Gateway name
        #[arg(required = true)]
        gateway: String,

        /// Amount in minor units
        #[arg(short, long, default_value_t = 100)]
        amount: u64,

        /// ISO 4217 currency code
        #[arg(long, default_value = "EUR")]
        currency: String,

        /// Mark the payment as already paid (offline gateways)
        #[arg(long)]
        paid: bool,
    },
}
