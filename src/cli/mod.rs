//! CLI module for nexus-gate
//!
//! Operator commands for inspecting the capability gate offline.
//!
//! # Commands
//!
//! - `classify` - Classify one message against the configured endpoint
//! - `detect` - Run the fallback detector on a response text
//! - `config` - Configuration utilities (init)
//! - `completions` - Generate shell completions
//!
//! # Example
//!
//! ```bash
//! # Would this message load capabilities?
//! nexus-gate classify "Send an email to j@example.com" --json
//!
//! # Would this answer trigger a fallback retry?
//! nexus-gate detect "I don't have access to your calendar" --capability calendar_lookup
//!
//! # Generate shell completions
//! nexus-gate completions bash > ~/.bash_completion.d/nexus-gate
//! ```

pub mod classify;
pub mod completions;
pub mod config;
pub mod detect;
pub mod output;

pub use classify::handle_classify;
pub use completions::handle_completions;
pub use config::handle_config_init;
pub use detect::handle_detect;

use crate::config::{ConfigError, GateConfig};
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};

/// nexus-gate - Intent-aware capability gating
#[derive(Parser, Debug)]
#[command(
    name = "nexus-gate",
    version,
    about = "Intent-aware capability gating for tool-augmented completions"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Classify a message
    Classify(ClassifyArgs),
    /// Check a response for missed capability needs
    Detect(DetectArgs),
    /// Configuration utilities
    #[command(subcommand)]
    Config(ConfigCommands),
    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Args, Debug)]
pub struct ClassifyArgs {
    /// Message text to classify
    pub text: String,

    /// Agent the message is addressed to
    #[arg(short, long, default_value = "default")]
    pub agent: String,

    /// Override the inference endpoint
    #[arg(short, long, env = "GATE_INFERENCE_URL")]
    pub url: Option<String>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Path to configuration file
    #[arg(short, long, env = "GATE_CONFIG")]
    pub config: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct DetectArgs {
    /// Response text to inspect
    pub text: String,

    /// Capability name the agent has (repeatable)
    #[arg(long = "capability", value_name = "NAME")]
    pub capabilities: Vec<String>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Path to configuration file
    #[arg(short, long, env = "GATE_CONFIG")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Initialize a new configuration file
    Init(ConfigInitArgs),
}

#[derive(Args, Debug)]
pub struct ConfigInitArgs {
    /// Output file path
    #[arg(short, long, default_value = "gate.toml")]
    pub output: PathBuf,

    /// Overwrite existing file
    #[arg(short, long)]
    pub force: bool,
}

#[derive(Args, Debug)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: clap_complete::Shell,
}

/// Load, override from the environment and validate.
pub fn load_config(path: Option<&Path>) -> Result<GateConfig, ConfigError> {
    let config = GateConfig::load(path)?.with_env_overrides();
    config.validate()?;
    Ok(config)
}
