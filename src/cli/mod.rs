//! CLI command definitions for config-graph
//!
//! This module defines the CLI structure using clap's derive macros.
//! The parsed `Cli` is also serialized into the runtime context as `context.args`.

use crate::format::OutputFormat;
use crate::secrets::REDACTION_MARKER;
use clap::{Parser, Subcommand, ValueEnum};
use serde::{Serialize, Serializer};
use std::path::PathBuf;

/// Deployment environment a configuration is run against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize)]
#[value(rename_all = "UPPER")]
#[serde(rename_all = "UPPERCASE")]
pub enum Environment {
    Dev,
    Test,
    Prod,
}

/// Resolve layered YAML configuration with encrypted secrets
#[derive(Parser, Debug, Serialize)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to the primary configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Target environment
    #[arg(short, long, value_enum, global = true)]
    pub env: Option<Environment>,

    /// Path to the secret key file (overrides CONFIG_GRAPH_KEY_FILE)
    #[arg(long, global = true)]
    pub key_file: Option<PathBuf>,

    /// Enable verbose logging during resolution
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Available subcommands
#[derive(Subcommand, Debug, Serialize)]
#[serde(tag = "name", rename_all = "kebab-case")]
pub enum Command {
    /// Resolve and print the configuration (default if no subcommand given)
    Show {
        /// Output format
        #[arg(short, long, value_enum)]
        format: Option<OutputFormat>,
    },

    /// Encrypt a value for use under an `!encrypted` tag
    Encrypt {
        /// Plaintext to encrypt
        #[arg(short, long)]
        #[serde(serialize_with = "redacted")]
        text: String,
    },

    /// Decrypt a token produced by `encrypt`
    Decrypt {
        /// Token to decrypt
        #[arg(short, long)]
        text: String,
    },

    /// Write a new secret key file
    GenerateKey {
        /// Replace an existing key file
        #[arg(long)]
        force: bool,
    },
}

fn redacted<S: Serializer>(_: &String, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(REDACTION_MARKER)
}
