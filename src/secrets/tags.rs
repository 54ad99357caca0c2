//! Tag pass: turns a parsed YAML tree into [`ConfigValue`]s.
//!
//! Parsing keeps tag annotations untouched (`serde_yaml::Value::Tagged`), so a
//! document can be parsed and structurally checked without key store access.
//! This pass then replaces every `!encrypted` scalar with a decrypted
//! [`SecretValue`](super::SecretValue).

use super::cipher::Decryptor;
use crate::config::value::{ConfigValue, Mapping, number_value, scalar_key};
use crate::error::{ConfigError, Result};
use serde_yaml::Value;
use serde_yaml::value::TaggedValue;
use std::path::Path;

/// Tag marking a scalar as ciphertext (`!encrypted`).
pub const ENCRYPTED_TAG: &str = "encrypted";

/// Resolve a parsed tree, decrypting tagged scalars.
///
/// `source` is only used for error context.
pub fn resolve_tags(raw: Value, source: &Path, decryptor: &dyn Decryptor) -> Result<ConfigValue> {
    let value = match raw {
        Value::Null => ConfigValue::Null,
        Value::Bool(b) => ConfigValue::Bool(b),
        Value::Number(n) => number_value(&n),
        Value::String(s) => ConfigValue::String(s),
        Value::Sequence(seq) => ConfigValue::Sequence(
            seq.into_iter()
                .map(|item| resolve_tags(item, source, decryptor))
                .collect::<Result<Vec<_>>>()?,
        ),
        Value::Mapping(map) => {
            let mut out = Mapping::with_capacity(map.len());
            for (key, value) in map {
                let key = scalar_key(&key).ok_or_else(|| {
                    ConfigError::parse(source, "mapping keys must be scalars")
                })?;
                out.insert(key, resolve_tags(value, source, decryptor)?);
            }
            ConfigValue::Mapping(out)
        }
        Value::Tagged(tagged) => resolve_tagged(*tagged, source, decryptor)?,
    };
    Ok(value)
}

fn resolve_tagged(
    tagged: TaggedValue,
    source: &Path,
    decryptor: &dyn Decryptor,
) -> Result<ConfigValue> {
    // `Tag` equality ignores exactly one leading `!`, so `!!encrypted` does not match.
    if tagged.tag != ENCRYPTED_TAG {
        return Err(ConfigError::parse(
            source,
            format!("unsupported tag '{}'", tagged.tag),
        ));
    }

    let Value::String(ciphertext) = tagged.value else {
        return Err(ConfigError::parse(
            source,
            format!("!{} must tag a string scalar", ENCRYPTED_TAG),
        ));
    };

    let secret = decryptor.decrypt(&ciphertext).map_err(|e| match e {
        ConfigError::Decryption { message } => {
            ConfigError::decryption(format!("{}: {}", source.display(), message))
        }
        other => other,
    })?;
    Ok(ConfigValue::Secret(secret))
}

/// Whether a parsed tree contains any tagged node.
pub fn contains_tags(raw: &Value) -> bool {
    match raw {
        Value::Tagged(_) => true,
        Value::Sequence(seq) => seq.iter().any(contains_tags),
        Value::Mapping(map) => map.iter().any(|(k, v)| contains_tags(k) || contains_tags(v)),
        _ => false,
    }
}
