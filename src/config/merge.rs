//! Shallow, precedence-ordered merge of configuration documents.
//!
//! Merging happens at the top-level key only. Nested mappings are replaced
//! entirely, never merged field by field.
//!
//! Precedence: primary > later-visited include > earlier-visited include.
//! The reserved `includes` key never reaches the result.

use super::diagnostics::{Diagnostic, Diagnostics};
use super::loader::{ConfigDocument, INCLUDES_KEY};
use super::value::{ConfigValue, Mapping};
use crate::error::{ConfigError, Result};
use indexmap::IndexMap;
use std::path::{Path, PathBuf};

/// Result of a merge: the combined mapping plus any non-fatal diagnostics.
#[derive(Debug)]
pub struct MergeOutcome {
    pub values: Mapping,
    pub diagnostics: Vec<Diagnostic>,
}

/// Merge the primary mapping over included values.
///
/// `included` is in visitation order; each entry pairs the source path with
/// the document's top-level value. Non-mapping entries are skipped with a
/// diagnostic. Values are deep-copied, so the result shares nothing with the inputs.
pub fn merge(primary: &Mapping, included: &[(&Path, &ConfigValue)]) -> MergeOutcome {
    let mut values = Mapping::new();
    // Which include last contributed each key.
    let mut contributors: IndexMap<String, PathBuf> = IndexMap::new();
    let mut diagnostics = Diagnostics::new();

    for (index, (source, value)) in included.iter().enumerate() {
        let Some(mapping) = value.as_mapping() else {
            diagnostics.push(Diagnostic::SkippedNonMapping {
                index,
                source: source.to_path_buf(),
                kind: value.kind(),
            });
            continue;
        };

        for (key, value) in mapping {
            if key == INCLUDES_KEY {
                continue;
            }
            if let Some(previous) = contributors.get(key) {
                diagnostics.push(Diagnostic::IncludeOverwrite {
                    key: key.clone(),
                    previous: previous.clone(),
                    source: source.to_path_buf(),
                });
            }
            values.insert(key.clone(), value.clone());
            contributors.insert(key.clone(), source.to_path_buf());
        }
    }

    for (key, value) in primary {
        if key == INCLUDES_KEY {
            continue;
        }
        if let Some(previous) = contributors.get(key) {
            diagnostics.push(Diagnostic::PrimaryOverride {
                key: key.clone(),
                previous: previous.clone(),
                previous_value: values
                    .get(key)
                    .map(|v| v.to_string())
                    .unwrap_or_default(),
            });
        }
        values.insert(key.clone(), value.clone());
    }

    MergeOutcome {
        values,
        diagnostics: diagnostics.into_vec(),
    }
}

/// Merge loaded documents. The primary must be a mapping.
pub fn merge_documents(primary: &ConfigDocument, included: &[ConfigDocument]) -> Result<MergeOutcome> {
    let primary_mapping = primary.as_mapping().ok_or_else(|| {
        ConfigError::parse(
            primary.path(),
            format!("primary config must be a mapping, got {}", primary.root().kind()),
        )
    })?;

    let layers: Vec<(&Path, &ConfigValue)> = included
        .iter()
        .map(|doc| (doc.path(), doc.root()))
        .collect();

    Ok(merge(primary_mapping, &layers))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::secrets::{REDACTION_MARKER, SecretValue};

    fn mapping(pairs: &[(&str, ConfigValue)]) -> Mapping {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    fn int(i: i64) -> ConfigValue {
        ConfigValue::Integer(i)
    }

    #[test]
    fn test_primary_wins() {
        let primary = mapping(&[("a", int(1))]);
        let include = ConfigValue::Mapping(mapping(&[("a", int(2)), ("b", int(3))]));
        let outcome = merge(&primary, &[(Path::new("inc.yaml"), &include)]);

        assert_eq!(outcome.values.get("a"), Some(&int(1)));
        assert_eq!(outcome.values.get("b"), Some(&int(3)));
        assert_eq!(outcome.diagnostics.len(), 1);
        assert!(matches!(
            &outcome.diagnostics[0],
            Diagnostic::PrimaryOverride { key, .. } if key == "a"
        ));
    }

    #[test]
    fn test_later_include_wins() {
        let first = ConfigValue::Mapping(mapping(&[("x", int(1))]));
        let second = ConfigValue::Mapping(mapping(&[("x", int(2))]));
        let outcome = merge(
            &Mapping::new(),
            &[(Path::new("first.yaml"), &first), (Path::new("second.yaml"), &second)],
        );

        assert_eq!(outcome.values.get("x"), Some(&int(2)));
        assert_eq!(
            outcome.diagnostics,
            vec![Diagnostic::IncludeOverwrite {
                key: "x".into(),
                previous: PathBuf::from("first.yaml"),
                source: PathBuf::from("second.yaml"),
            }]
        );
    }

    #[test]
    fn test_merge_is_shallow() {
        let primary = mapping(&[("section", ConfigValue::Mapping(mapping(&[("x", int(1))])))]);
        let include = ConfigValue::Mapping(mapping(&[(
            "section",
            ConfigValue::Mapping(mapping(&[("y", int(2))])),
        )]));
        let outcome = merge(&primary, &[(Path::new("inc.yaml"), &include)]);

        assert_eq!(
            outcome.values.get("section"),
            Some(&ConfigValue::Mapping(mapping(&[("x", int(1))])))
        );
    }

    #[test]
    fn test_includes_key_never_in_result() {
        let primary = mapping(&[
            ("includes", ConfigValue::Sequence(vec!["a.yaml".into()])),
            ("k", int(1)),
        ]);
        let include = ConfigValue::Mapping(mapping(&[
            ("includes", ConfigValue::Sequence(vec!["b.yaml".into()])),
            (
                "nested",
                ConfigValue::Mapping(mapping(&[("includes", "kept".into())])),
            ),
        ]));
        let outcome = merge(&primary, &[(Path::new("inc.yaml"), &include)]);

        assert!(!outcome.values.contains_key(INCLUDES_KEY));
        assert_eq!(
            outcome
                .values
                .get("nested")
                .and_then(|v| v.get(INCLUDES_KEY))
                .and_then(|v| v.as_str()),
            Some("kept")
        );
        assert!(outcome.diagnostics.is_empty());
    }

    #[test]
    fn test_non_mapping_include_skipped() {
        let list = ConfigValue::Sequence(vec![int(1)]);
        let good = ConfigValue::Mapping(mapping(&[("b", int(2))]));
        let outcome = merge(
            &mapping(&[("a", int(1))]),
            &[(Path::new("list.yaml"), &list), (Path::new("good.yaml"), &good)],
        );

        assert_eq!(outcome.values.get("a"), Some(&int(1)));
        assert_eq!(outcome.values.get("b"), Some(&int(2)));
        assert_eq!(
            outcome.diagnostics,
            vec![Diagnostic::SkippedNonMapping {
                index: 0,
                source: PathBuf::from("list.yaml"),
                kind: "sequence",
            }]
        );
    }

    #[test]
    fn test_override_diagnostic_redacts_secret() {
        let primary = mapping(&[("password", "plain".into())]);
        let include = ConfigValue::Mapping(mapping(&[(
            "password",
            SecretValue::new("hunter2").into(),
        )]));
        let outcome = merge(&primary, &[(Path::new("secrets.yaml"), &include)]);

        let rendered = outcome.diagnostics[0].to_string();
        assert!(rendered.contains(REDACTION_MARKER));
        assert!(!rendered.contains("hunter2"));
    }

    #[test]
    fn test_result_is_independent_copy() {
        let include = ConfigValue::Mapping(mapping(&[(
            "list",
            ConfigValue::Sequence(vec![int(1)]),
        )]));
        let mut outcome = merge(&Mapping::new(), &[(Path::new("inc.yaml"), &include)]);
        if let Some(ConfigValue::Sequence(items)) = outcome.values.get_mut("list") {
            items.push(int(2));
        }
        assert_eq!(
            include.get("list"),
            Some(&ConfigValue::Sequence(vec![int(1)]))
        );
    }

    #[test]
    fn test_key_order_follows_first_insertion() {
        let first = ConfigValue::Mapping(mapping(&[("b", int(1)), ("a", int(1))]));
        let outcome = merge(
            &mapping(&[("c", int(1)), ("b", int(2))]),
            &[(Path::new("first.yaml"), &first)],
        );
        let keys: Vec<&str> = outcome.values.keys().map(|k| k.as_str()).collect();
        assert_eq!(keys, vec!["b", "a", "c"]);
    }
}
