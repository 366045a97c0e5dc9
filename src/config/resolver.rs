//! Effective node configuration: catalog defaults with user overrides
//! applied, plus validation of user edits.

use tracing::warn;

use crate::config::catalog::NodeCatalog;
use crate::config::types::{ConfigType, infer_type, is_reserved_key};
use crate::config::value::{ConfigMap, ConfigValue, lookup};
use crate::error::{StudioError, StudioResult};
use crate::model::node::NodeRecord;

/// One displayed config key.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigEntry {
    pub key: String,
    pub value: ConfigValue,
    /// Inferred from the default value, not the override.
    pub kind: ConfigType,
    /// The user changed this key; the GUI shows a checkmark.
    pub user_set: bool,
}

impl ConfigEntry {
    pub fn is_readonly(&self) -> bool {
        !self.kind.is_editable()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EffectiveConfig {
    pub title: String,
    entries: Vec<ConfigEntry>,
    /// Overrides naming keys the catalog no longer has.
    stale_keys: Vec<String>,
}

impl EffectiveConfig {
    pub fn entries(&self) -> &[ConfigEntry] {
        &self.entries
    }

    /// The contracted view: only keys the user changed.
    pub fn user_set(&self) -> impl Iterator<Item = &ConfigEntry> {
        self.entries.iter().filter(|entry| entry.user_set)
    }

    pub fn get(&self, key: &str) -> Option<&ConfigEntry> {
        self.entries.iter().find(|entry| entry.key == key)
    }

    pub fn value(&self, key: &str) -> Option<&ConfigValue> {
        self.get(key).map(|entry| &entry.value)
    }

    pub fn stale_keys(&self) -> &[String] {
        &self.stale_keys
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn to_map(&self) -> ConfigMap {
        self.entries
            .iter()
            .map(|entry| (entry.key.clone(), entry.value.clone()))
            .collect()
    }
}

/// Defaults for `node`'s title, overridden key by key by its overrides.
/// Reserved keys are dropped. The catalog is never modified.
pub fn effective_config(
    catalog: &dyn NodeCatalog,
    node: &NodeRecord,
) -> StudioResult<EffectiveConfig> {
    let title = node.title();
    let defaults = defaults_for(catalog, title)?;

    let mut stale_keys = Vec::new();
    for (key, _) in node.overrides().iter() {
        if lookup(defaults, key).is_none() {
            warn!(title = %title, key = %key, "override has no matching default config, ignoring");
            stale_keys.push(key.to_string());
        }
    }

    let entries = defaults
        .iter()
        .filter(|(key, _)| !is_reserved_key(key))
        .map(|(key, default)| {
            let user_value = node.override_value(key);
            ConfigEntry {
                key: key.clone(),
                value: user_value.unwrap_or(default).clone(),
                kind: infer_type(key, default),
                user_set: user_value.is_some(),
            }
        })
        .collect();

    Ok(EffectiveConfig {
        title: title.to_string(),
        entries,
        stale_keys,
    })
}

/// Outcome of validating an edit.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigEdit {
    /// Store this override.
    Set(ConfigValue),
    /// The value equals the default: drop the override.
    Reset,
}

/// Validates text typed by the user for `key` of node `title`.
pub fn resolve_text_edit(
    catalog: &dyn NodeCatalog,
    title: &str,
    key: &str,
    text: &str,
) -> StudioResult<ConfigEdit> {
    resolve_edit(catalog, title, key, ConfigValue::parse_literal(text))
}

/// Validates `value` for `key` of node `title` against the default's
/// inferred type.
pub fn resolve_edit(
    catalog: &dyn NodeCatalog,
    title: &str,
    key: &str,
    value: ConfigValue,
) -> StudioResult<ConfigEdit> {
    let defaults = defaults_for(catalog, title)?;
    let default = match lookup(defaults, key) {
        Some(default) if !is_reserved_key(key) => default,
        _ => {
            return Err(StudioError::UnknownConfigKey {
                title: title.to_string(),
                key: key.to_string(),
            });
        }
    };

    let kind = infer_type(key, default);
    if !kind.is_editable() {
        return Err(StudioError::ReadOnlyKey {
            title: title.to_string(),
            key: key.to_string(),
        });
    }

    let shown = value.to_string();
    let Some(value) = kind.accept(value) else {
        return Err(StudioError::TypeMismatch {
            title: title.to_string(),
            key: key.to_string(),
            expected: kind,
            value: shown,
        });
    };

    if value.loosely_eq(default) {
        Ok(ConfigEdit::Reset)
    } else {
        Ok(ConfigEdit::Set(value))
    }
}

fn defaults_for<'c>(catalog: &'c dyn NodeCatalog, title: &str) -> StudioResult<&'c ConfigMap> {
    catalog
        .default_config(title)
        .ok_or_else(|| StudioError::UnknownNode {
            title: title.to_string(),
        })
}
