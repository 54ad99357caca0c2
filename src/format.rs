//! Rendering of merged configurations: indented lines, YAML and JSON.

use crate::config::{ConfigValue, Mapping, MergedConfig};
use clap::ValueEnum;
use serde::Serialize;

/// Output format for `show`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Indented `key -> value` lines (default)
    #[default]
    Lines,
    Yaml,
    Json,
}

/// Flatten a mapping into display lines.
///
/// Non-empty mappings open a `[key]` section indented two spaces per level;
/// empty mappings print as `key -> {}`; everything else as `key -> value`.
/// Secrets render as the redaction marker.
pub fn format_lines(map: &Mapping, indent: usize) -> Vec<String> {
    let spacing = "  ".repeat(indent);
    let mut lines = Vec::new();

    for (key, value) in map {
        match value {
            ConfigValue::Mapping(inner) if !inner.is_empty() => {
                lines.push(format!("{}[{}]", spacing, key));
                lines.extend(format_lines(inner, indent + 1));
            }
            ConfigValue::Mapping(_) => lines.push(format!("{}{} -> {{}}", spacing, key)),
            other => lines.push(format!("{}{} -> {}", spacing, key, other)),
        }
    }

    lines
}

/// Render a merged configuration in the requested format.
pub fn render(config: &MergedConfig, format: OutputFormat) -> anyhow::Result<String> {
    let rendered = match format {
        OutputFormat::Lines => {
            let mut out = format_lines(config.values(), 0).join("\n");
            out.push('\n');
            out
        }
        OutputFormat::Yaml => serde_yaml::to_string(config)?,
        OutputFormat::Json => {
            let mut out = serde_json::to_string_pretty(config)?;
            out.push('\n');
            out
        }
    };
    Ok(rendered)
}
