//! config-graph
//!
//! Resolves a layered YAML configuration, decrypts its secrets, sets up
//! logging from the result and runs the requested command.

use anyhow::{Context, Result, bail};
use clap::Parser;
use config_graph::cli::{Cli, Command};
use config_graph::config::{ConfigResolver, ConfigValue, Mapping, MergedConfig, script_name};
use config_graph::format::render;
use config_graph::logging::{Logger, LoggingSettings};
use config_graph::secrets::{Cipher, Decryptor, FileKeyStore};
use std::io::IsTerminal;
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

fn main() -> Result<()> {
    let cli = Cli::parse();

    let key_store = match &cli.key_file {
        Some(path) => FileKeyStore::new(path),
        None => FileKeyStore::discover(),
    };

    if let Some(Command::GenerateKey { force }) = &cli.command {
        key_store
            .write_new_key(*force)
            .with_context(|| format!("Failed to write key file: {}", key_store.path().display()))?;
        println!("Wrote new key to {}", key_store.path().display());
        return Ok(());
    }

    let Some(config_path) = cli.config.clone() else {
        bail!("--config is required for this command");
    };

    let args = match ConfigValue::from_serialize(&cli).context("Failed to capture arguments")? {
        ConfigValue::Mapping(map) => map,
        _ => Mapping::new(),
    };

    // Resolution happens before the configured logger exists; diagnostics go to stderr.
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let early = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .finish();

    let cipher = Cipher::new(key_store);
    let resolver = ConfigResolver::new(&cipher);
    let config = tracing::subscriber::with_default(early, || resolver.resolve(&config_path, args))
        .with_context(|| format!("Failed to resolve {}", config_path.display()))?;

    let settings = LoggingSettings::from_config(&config)?;
    let logger = Logger::init(&settings, &script_name())?;
    logger.display_config(&config);
    logger.scope(|| info!(log_file = %logger.log_file().display(), "Logger ready"));

    for diagnostic in config.diagnostics() {
        logger.warning(&diagnostic.to_string());
    }

    let command = cli.command.unwrap_or(Command::Show { format: None });
    if let Err(err) = run_command(command, &config, &cipher, &logger) {
        logger.error(&format!("{:#}", err));
        return Err(err);
    }

    Ok(())
}

/// Run a subcommand against the resolved configuration. Results go to stdout.
fn run_command(
    command: Command,
    config: &MergedConfig,
    cipher: &Cipher,
    logger: &Logger,
) -> Result<()> {
    match command {
        Command::Show { format } => {
            if let Some(format) = format {
                print!("{}", render(config, format)?);
            }
        }
        Command::Encrypt { text } => {
            let token = cipher.encrypt(&text)?;
            logger.info("Encrypted value");
            println!("{}", token);
        }
        Command::Decrypt { text } => {
            let secret = cipher.decrypt(&text)?;
            logger.info(&format!("Decrypted value: {}", secret));
            println!("{}", secret.expose());
        }
        // Handled before resolution.
        Command::GenerateKey { .. } => {}
    }
    Ok(())
}
