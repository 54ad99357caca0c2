//! Runtime context injected after merge.

use super::diagnostics::Diagnostic;
use super::merged::MergedConfig;
use super::value::{ConfigValue, Mapping};
use chrono::{DateTime, Local};
use tracing::warn;

/// Reserved top-level key holding the runtime context.
pub const CONTEXT_KEY: &str = "context";

/// Process metadata captured once per run.
#[derive(Debug, Clone)]
pub struct RuntimeContext {
    pub script_name: String,
    pub start_time: DateTime<Local>,
    pub user: String,
    pub host: String,
    pub platform: String,
    pub args: Mapping,
}

impl RuntimeContext {
    /// Capture metadata for the current process.
    pub fn capture(args: Mapping) -> Self {
        Self {
            script_name: script_name(),
            start_time: Local::now(),
            user: current_user(),
            host: host_name(),
            platform: platform(),
            args,
        }
    }

    /// The context as a configuration mapping.
    pub fn to_value(&self) -> ConfigValue {
        let mut map = Mapping::new();
        map.insert("script_name".into(), self.script_name.clone().into());
        map.insert("start_time".into(), self.start_time.to_rfc3339().into());
        map.insert("user".into(), self.user.clone().into());
        map.insert("host".into(), self.host.clone().into());
        map.insert("platform".into(), self.platform.clone().into());
        map.insert("args".into(), ConfigValue::Mapping(self.args.clone()));
        ConfigValue::Mapping(map)
    }
}

/// Attach `context` under [`CONTEXT_KEY`].
///
/// A user-defined key of the same name is replaced; a diagnostic records it.
pub fn inject_context(mut config: MergedConfig, context: &RuntimeContext) -> MergedConfig {
    if config.insert_reserved(CONTEXT_KEY, context.to_value()).is_some() {
        let diagnostic = Diagnostic::ContextOverwritten {
            key: CONTEXT_KEY.to_string(),
        };
        warn!("{}", diagnostic);
        config.push_diagnostic(diagnostic);
    }
    config
}

/// File name of the running executable.
pub fn script_name() -> String {
    std::env::args_os()
        .next()
        .as_deref()
        .map(std::path::Path::new)
        .and_then(|p| p.file_stem())
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| env!("CARGO_PKG_NAME").to_string())
}

fn current_user() -> String {
    ["USER", "USERNAME", "LOGNAME"]
        .iter()
        .find_map(|var| std::env::var(var).ok().filter(|v| !v.is_empty()))
        .unwrap_or_else(|| "unknown".to_string())
}

fn host_name() -> String {
    ["HOSTNAME", "COMPUTERNAME"]
        .iter()
        .find_map(|var| std::env::var(var).ok().filter(|v| !v.is_empty()))
        .or_else(|| {
            std::fs::read_to_string("/etc/hostname")
                .ok()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
        })
        .unwrap_or_else(|| "unknown".to_string())
}

fn platform() -> String {
    format!("{}-{}", std::env::consts::OS, std::env::consts::ARCH)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args() -> Mapping {
        let mut args = Mapping::new();
        args.insert("config".into(), "main.yaml".into());
        args.insert("env".into(), "DEV".into());
        args
    }

    #[test]
    fn test_context_fields_present() {
        let ctx = RuntimeContext::capture(args());
        let value = ctx.to_value();
        for key in ["script_name", "start_time", "user", "host", "platform", "args"] {
            assert!(value.get(key).is_some(), "missing {}", key);
        }
        assert_eq!(value.get_path("args.env").and_then(|v| v.as_str()), Some("DEV"));
        assert!(!ctx.platform.is_empty());
        assert!(!ctx.script_name.is_empty());
    }

    #[test]
    fn test_start_time_is_rfc3339() {
        let ctx = RuntimeContext::capture(Mapping::new());
        let rendered = ctx.to_value();
        let start = rendered.get("start_time").and_then(|v| v.as_str()).unwrap();
        assert!(DateTime::parse_from_rfc3339(start).is_ok());
    }

    #[test]
    fn test_inject_adds_context() {
        let mut values = Mapping::new();
        values.insert("a".into(), ConfigValue::Integer(1));
        let config = MergedConfig::new(values, Vec::new(), Vec::new());

        let config = inject_context(config, &RuntimeContext::capture(args()));
        assert!(config.get(CONTEXT_KEY).is_some());
        assert_eq!(config.get("a"), Some(&ConfigValue::Integer(1)));
        assert!(config.diagnostics().is_empty());
    }

    #[test]
    fn test_inject_overwrites_user_context_with_diagnostic() {
        let mut values = Mapping::new();
        values.insert(CONTEXT_KEY.into(), "user value".into());
        let config = MergedConfig::new(values, Vec::new(), Vec::new());

        let config = inject_context(config, &RuntimeContext::capture(args()));
        assert!(config.get(CONTEXT_KEY).and_then(|v| v.as_mapping()).is_some());
        assert_eq!(
            config.diagnostics(),
            &[Diagnostic::ContextOverwritten {
                key: CONTEXT_KEY.to_string()
            }]
        );
    }
}
