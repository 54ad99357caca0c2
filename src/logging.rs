//! Logging built from the resolved configuration.
//!
//! The [`Logger`] is an explicit object created after resolution and passed to
//! whoever needs it. It owns its own `tracing` dispatch (file + stderr) and
//! scopes it around each call instead of installing a global subscriber.

use crate::config::{CONTEXT_KEY, MergedConfig, script_name};
use crate::error::{ConfigError, Result};
use crate::format::format_lines;
use anyhow::Context;
use chrono::Local;
use std::fs::OpenOptions;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::Dispatch;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{fmt, prelude::*};

/// Width of the banner framing the configuration dump.
const BANNER_WIDTH: usize = 30;

/// Severity names accepted for `logging.log_level`.
pub const LEVEL_NAMES: &[&str] = &[
    "CRITICAL", "FATAL", "ERROR", "WARN", "WARNING", "INFO", "DEBUG", "NOTSET",
];

/// Configured minimum severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Critical,
    Error,
    Warning,
    Info,
    Debug,
    /// Log everything.
    NotSet,
}

impl LogLevel {
    /// Parse a severity name. Names are case-sensitive.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "CRITICAL" | "FATAL" => Some(LogLevel::Critical),
            "ERROR" => Some(LogLevel::Error),
            "WARNING" | "WARN" => Some(LogLevel::Warning),
            "INFO" => Some(LogLevel::Info),
            "DEBUG" => Some(LogLevel::Debug),
            "NOTSET" => Some(LogLevel::NotSet),
            _ => None,
        }
    }

    /// Convert to a `tracing` level filter.
    pub fn to_filter(self) -> LevelFilter {
        match self {
            LogLevel::Critical | LogLevel::Error => LevelFilter::ERROR,
            LogLevel::Warning => LevelFilter::WARN,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::NotSet => LevelFilter::TRACE,
        }
    }
}

/// Validated `logging` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingSettings {
    pub log_dir: PathBuf,
    pub level: LogLevel,
}

impl LoggingSettings {
    /// Validate the `logging` section. Performs no I/O.
    pub fn from_config(config: &MergedConfig) -> Result<Self> {
        let section = config
            .get("logging")
            .ok_or_else(|| ConfigError::validation("logging", "section is missing"))?;
        if section.as_mapping().is_none() {
            return Err(ConfigError::validation(
                "logging",
                format!("must be a mapping, got {}", section.kind()),
            ));
        }

        let log_dir = required_string(section, "log_dir")?;
        let level_name = required_string(section, "log_level")?;
        let level = LogLevel::from_name(level_name).ok_or_else(|| {
            ConfigError::validation(
                "logging.log_level",
                format!(
                    "'{}' is not a valid logging level. Available options: {}",
                    level_name,
                    LEVEL_NAMES.join(", ")
                ),
            )
        })?;

        Ok(Self {
            log_dir: PathBuf::from(log_dir),
            level,
        })
    }
}

fn required_string<'a>(section: &'a crate::config::ConfigValue, field: &str) -> Result<&'a str> {
    let path = format!("logging.{}", field);
    match section.get(field) {
        None => Err(ConfigError::validation(path, "field is missing")),
        Some(value) => match value.as_str() {
            Some(s) if !s.trim().is_empty() => Ok(s),
            Some(_) => Err(ConfigError::validation(path, "must not be empty")),
            None => Err(ConfigError::validation(
                path,
                format!("must be a string, got {}", value.kind()),
            )),
        },
    }
}

/// Logger writing to a timestamped file and, optionally, stderr.
///
/// Stdout is left to command output.
#[derive(Clone)]
pub struct Logger {
    name: String,
    dispatch: Dispatch,
    log_file: PathBuf,
}

impl Logger {
    /// Create the log directory and file, logging to both file and stderr.
    pub fn init(settings: &LoggingSettings, name: &str) -> anyhow::Result<Self> {
        Self::build(settings, name, true)
    }

    /// Like [`Logger::init`] but without the stderr layer.
    pub fn file_only(settings: &LoggingSettings, name: &str) -> anyhow::Result<Self> {
        Self::build(settings, name, false)
    }

    /// Log to `log_dir` at INFO without a resolved configuration.
    pub fn without_config(log_dir: impl Into<PathBuf>, name: &str) -> anyhow::Result<Self> {
        let settings = LoggingSettings {
            log_dir: log_dir.into(),
            level: LogLevel::Info,
        };
        let logger = Self::build(&settings, name, true)?;
        logger.info(&format!("Executing '{}' without loading a configuration", name));
        logger.info(&format!("Current time: {}", Local::now().format("%Y-%m-%d %H:%M:%S")));
        Ok(logger)
    }

    fn build(settings: &LoggingSettings, name: &str, console: bool) -> anyhow::Result<Self> {
        std::fs::create_dir_all(&settings.log_dir).with_context(|| {
            format!("Failed to create log dir: {}", settings.log_dir.display())
        })?;

        let file_name = format!("{}-{}.log", Local::now().format("%Y-%m-%d-%H%M%S"), name);
        let log_file = settings.log_dir.join(file_name);
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_file)
            .with_context(|| format!("Failed to open log file: {}", log_file.display()))?;

        let file_layer = fmt::layer()
            .with_writer(Mutex::new(file))
            .with_ansi(false)
            .with_target(false);
        let console_layer = console.then(|| {
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(std::io::stderr().is_terminal())
                .with_target(false)
        });

        let subscriber = tracing_subscriber::registry()
            .with(settings.level.to_filter())
            .with(file_layer)
            .with(console_layer);

        Ok(Self {
            name: name.to_string(),
            dispatch: Dispatch::new(subscriber),
            log_file,
        })
    }

    /// Path of the file this logger writes to.
    pub fn log_file(&self) -> &Path {
        &self.log_file
    }

    /// Run `f` with this logger's dispatch as the default subscriber.
    pub fn scope<T>(&self, f: impl FnOnce() -> T) -> T {
        tracing::dispatcher::with_default(&self.dispatch, f)
    }

    pub fn debug(&self, msg: &str) {
        self.scope(|| tracing::debug!(logger = %self.name, "{}", msg));
    }

    pub fn info(&self, msg: &str) {
        self.scope(|| tracing::info!(logger = %self.name, "{}", msg));
    }

    pub fn warning(&self, msg: &str) {
        self.scope(|| tracing::warn!(logger = %self.name, "{}", msg));
    }

    pub fn error(&self, msg: &str) {
        self.scope(|| tracing::error!(logger = %self.name, "{}", msg));
    }

    /// Log the invocation and the full configuration, secrets redacted.
    pub fn display_config(&self, config: &MergedConfig) {
        let script = config
            .get_path(&format!("{}.script_name", CONTEXT_KEY))
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .unwrap_or_else(script_name);
        let command_line: Vec<String> = std::env::args().collect();

        self.info(&format!("Running {}", script));
        self.info(&format!("Command line: {}", command_line.join(" ")));
        self.info(&"=".repeat(BANNER_WIDTH));
        for line in format_lines(config.values(), 0) {
            self.info(&line);
        }
        self.info(&"=".repeat(BANNER_WIDTH));
    }
}

impl std::fmt::Debug for Logger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Logger")
            .field("name", &self.name)
            .field("log_file", &self.log_file)
            .finish()
    }
}
