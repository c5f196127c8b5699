//! CLI module for oaigw
//!
//! Provides the command-line interface for running the gateway and
//! inspecting the discovered model registry.

pub mod models;
pub mod serve;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// OpenAI-compatible gateway - one chat endpoint in front of many providers
#[derive(Parser, Debug)]
#[command(name = "oaigw")]
#[command(version, about, long_about = None)]
#[command(after_help = r#"ENVIRONMENT VARIABLES:
    OAIGW_CONFIG                  Config file path (default: config.yaml)
    OAIGW_HOST                    Bind address (overrides server.host)
    OAIGW_PORT                    Listen port (overrides server.port)
    OAIGW_LOG_LEVEL               Log level (default: info, RUST_LOG wins)
    OAIGW_DISCOVERY_TIMEOUT_SECS  Per-endpoint discovery timeout (default: 10)
    OAIGW_UPSTREAM_TIMEOUT_SECS   Forwarded request timeout (default: 300)
"#)]
pub struct Cli {
    /// Path to the YAML config file
    #[arg(
        short,
        long,
        global = true,
        default_value = "config.yaml",
        env = "OAIGW_CONFIG"
    )]
    pub config: PathBuf,

    /// Subcommand to execute (default: serve)
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the gateway server
    Serve(serve::ServeArgs),
    /// Run discovery once and print the model registry
    Models(models::ModelsArgs),
}
