//! Tagged-variant configuration values.
//!
//! Documents are arbitrary trees of unknown shape. Every consumer (merge,
//! rendering, redaction) matches over this closed set of variants.

use crate::secrets::SecretValue;
use indexmap::IndexMap;
use serde::{Serialize, Serializer};
use std::fmt;

/// Insertion-ordered mapping with string keys.
pub type Mapping = IndexMap<String, ConfigValue>;

/// One node of a resolved configuration tree.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigValue {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
    Sequence(Vec<ConfigValue>),
    Mapping(Mapping),
    /// A decrypted value; always rendered redacted.
    Secret(SecretValue),
}

impl ConfigValue {
    /// Short name of the variant, for diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            ConfigValue::Null => "null",
            ConfigValue::Bool(_) => "bool",
            ConfigValue::Integer(_) => "integer",
            ConfigValue::Float(_) => "float",
            ConfigValue::String(_) => "string",
            ConfigValue::Sequence(_) => "sequence",
            ConfigValue::Mapping(_) => "mapping",
            ConfigValue::Secret(_) => "secret",
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ConfigValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_mapping(&self) -> Option<&Mapping> {
        match self {
            ConfigValue::Mapping(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_secret(&self) -> Option<&SecretValue> {
        match self {
            ConfigValue::Secret(s) => Some(s),
            _ => None,
        }
    }

    /// Look up a key in a mapping value.
    pub fn get(&self, key: &str) -> Option<&ConfigValue> {
        self.as_mapping().and_then(|m| m.get(key))
    }

    /// Walk a dotted path through nested mappings (`"logging.log_dir"`).
    pub fn get_path(&self, path: &str) -> Option<&ConfigValue> {
        path.split('.').try_fold(self, |node, key| node.get(key))
    }

    /// Convert any serializable value into a plain (secret-free) tree.
    pub fn from_serialize<T: Serialize>(value: &T) -> Result<Self, serde_yaml::Error> {
        let yaml = serde_yaml::to_value(value)?;
        Ok(Self::from_plain_yaml(yaml))
    }

    /// Convert an untagged YAML tree. Tags are dropped, keeping the inner value.
    pub(crate) fn from_plain_yaml(value: serde_yaml::Value) -> Self {
        match value {
            serde_yaml::Value::Null => ConfigValue::Null,
            serde_yaml::Value::Bool(b) => ConfigValue::Bool(b),
            serde_yaml::Value::Number(n) => number_value(&n),
            serde_yaml::Value::String(s) => ConfigValue::String(s),
            serde_yaml::Value::Sequence(seq) => {
                ConfigValue::Sequence(seq.into_iter().map(Self::from_plain_yaml).collect())
            }
            serde_yaml::Value::Mapping(map) => ConfigValue::Mapping(
                map.into_iter()
                    .filter_map(|(k, v)| scalar_key(&k).map(|k| (k, Self::from_plain_yaml(v))))
                    .collect(),
            ),
            serde_yaml::Value::Tagged(tagged) => Self::from_plain_yaml(tagged.value),
        }
    }
}

/// Convert a YAML number, preferring the integer representation.
pub(crate) fn number_value(n: &serde_yaml::Number) -> ConfigValue {
    if let Some(i) = n.as_i64() {
        ConfigValue::Integer(i)
    } else {
        ConfigValue::Float(n.as_f64().unwrap_or(f64::NAN))
    }
}

/// Stringify a scalar mapping key. Returns `None` for sequence, mapping or tagged keys.
pub(crate) fn scalar_key(key: &serde_yaml::Value) -> Option<String> {
    match key {
        serde_yaml::Value::String(s) => Some(s.clone()),
        serde_yaml::Value::Number(n) => Some(n.to_string()),
        serde_yaml::Value::Bool(b) => Some(b.to_string()),
        serde_yaml::Value::Null => Some("null".to_string()),
        _ => None,
    }
}

impl From<&str> for ConfigValue {
    fn from(s: &str) -> Self {
        ConfigValue::String(s.to_string())
    }
}

impl From<String> for ConfigValue {
    fn from(s: String) -> Self {
        ConfigValue::String(s)
    }
}

impl From<i64> for ConfigValue {
    fn from(i: i64) -> Self {
        ConfigValue::Integer(i)
    }
}

impl From<bool> for ConfigValue {
    fn from(b: bool) -> Self {
        ConfigValue::Bool(b)
    }
}

impl From<Mapping> for ConfigValue {
    fn from(m: Mapping) -> Self {
        ConfigValue::Mapping(m)
    }
}

impl From<SecretValue> for ConfigValue {
    fn from(s: SecretValue) -> Self {
        ConfigValue::Secret(s)
    }
}

impl Serialize for ConfigValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ConfigValue::Null => serializer.serialize_unit(),
            ConfigValue::Bool(b) => serializer.serialize_bool(*b),
            ConfigValue::Integer(i) => serializer.serialize_i64(*i),
            ConfigValue::Float(f) => serializer.serialize_f64(*f),
            ConfigValue::String(s) => serializer.serialize_str(s),
            ConfigValue::Sequence(seq) => seq.serialize(serializer),
            ConfigValue::Mapping(map) => map.serialize(serializer),
            ConfigValue::Secret(secret) => secret.serialize(serializer),
        }
    }
}

/// Compact single-line rendering. Secrets render as the redaction marker.
impl fmt::Display for ConfigValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigValue::Null => f.write_str("null"),
            ConfigValue::Bool(b) => write!(f, "{}", b),
            ConfigValue::Integer(i) => write!(f, "{}", i),
            ConfigValue::Float(x) => write!(f, "{}", x),
            ConfigValue::String(s) => f.write_str(s),
            ConfigValue::Secret(secret) => write!(f, "{}", secret),
            ConfigValue::Sequence(seq) => {
                f.write_str("[")?;
                for (i, item) in seq.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                f.write_str("]")
            }
            ConfigValue::Mapping(map) => {
                f.write_str("{")?;
                for (i, (key, value)) in map.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}: {}", key, value)?;
                }
                f.write_str("}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::secrets::REDACTION_MARKER;

    fn sample() -> ConfigValue {
        let mut logging = Mapping::new();
        logging.insert("log_dir".into(), "logs".into());
        let mut root = Mapping::new();
        root.insert("logging".into(), ConfigValue::Mapping(logging));
        root.insert("password".into(), SecretValue::new("hunter2").into());
        root.insert(
            "ports".into(),
            ConfigValue::Sequence(vec![ConfigValue::Integer(8080), ConfigValue::Integer(9090)]),
        );
        ConfigValue::Mapping(root)
    }

    #[test]
    fn test_get_path_walks_mappings() {
        let value = sample();
        assert_eq!(
            value.get_path("logging.log_dir").and_then(|v| v.as_str()),
            Some("logs")
        );
        assert!(value.get_path("logging.missing").is_none());
        assert!(value.get_path("ports.0").is_none());
    }

    #[test]
    fn test_display_redacts_nested_secret() {
        let rendered = sample().to_string();
        assert!(rendered.contains(REDACTION_MARKER));
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("ports: [8080, 9090]"));
    }

    #[test]
    fn test_debug_redacts_nested_secret() {
        let rendered = format!("{:?}", sample());
        assert!(!rendered.contains("hunter2"));
    }

    #[test]
    fn test_serialize_json_redacts_and_keeps_order() {
        let json = serde_json::to_string(&sample()).unwrap();
        assert_eq!(
            json,
            format!(
                r#"{{"logging":{{"log_dir":"logs"}},"password":"{}","ports":[8080,9090]}}"#,
                REDACTION_MARKER
            )
        );
    }

    #[test]
    fn test_clone_is_independent() {
        let original = sample();
        let mut copy = original.clone();
        if let ConfigValue::Mapping(ref mut m) = copy {
            m.insert("extra".into(), true.into());
        }
        assert!(original.get("extra").is_none());
        assert_eq!(copy.get("extra"), Some(&ConfigValue::Bool(true)));
    }

    #[test]
    fn test_from_serialize_struct() {
        #[derive(Serialize)]
        struct Args {
            config: String,
            env: Option<String>,
            verbose: bool,
        }
        let value = ConfigValue::from_serialize(&Args {
            config: "main.yaml".into(),
            env: None,
            verbose: true,
        })
        .unwrap();
        assert_eq!(value.get("config").and_then(|v| v.as_str()), Some("main.yaml"));
        assert_eq!(value.get("env"), Some(&ConfigValue::Null));
        assert_eq!(value.get("verbose"), Some(&ConfigValue::Bool(true)));
    }

    #[test]
    fn test_scalar_keys_are_stringified() {
        let yaml: serde_yaml::Value = serde_yaml::from_str("1: one\ntrue: yes\n").unwrap();
        let value = ConfigValue::from_plain_yaml(yaml);
        assert_eq!(value.get("1").and_then(|v| v.as_str()), Some("one"));
        assert_eq!(value.get("true").and_then(|v| v.as_str()), Some("yes"));
    }
}
