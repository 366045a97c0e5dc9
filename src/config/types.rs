//! Edit-affordance classification of config keys.

use std::fmt;

use crate::config::value::ConfigValue;

/// Keys shown to the user but never editable.
pub const READONLY_KEYS: &[&str] = &["input", "output"];

/// Internal bookkeeping keys, never shown or edited.
pub const RESERVED_KEYS: &[&str] = &["MODEL_NODES", "model_size", "weights", "weights_parent_dir"];

pub fn is_readonly_key(key: &str) -> bool {
    READONLY_KEYS.contains(&key)
}

pub fn is_reserved_key(key: &str) -> bool {
    RESERVED_KEYS.contains(&key)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigType {
    ReadOnly,
    Bool,
    Int,
    /// Float in `[0, 1]`, e.g. a threshold.
    UnitFloat,
    Float,
    /// Two-entry mapping describing a resolution.
    WidthHeightMap,
    Map,
    /// Two-element list describing a resolution.
    WidthHeightList,
    /// Blue, green, red.
    BgrList,
    List,
    PathString,
    String,
    NoneType,
}

impl ConfigType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConfigType::ReadOnly => "readonly",
            ConfigType::Bool => "bool",
            ConfigType::Int => "int",
            ConfigType::UnitFloat => "float_01",
            ConfigType::Float => "float",
            ConfigType::WidthHeightMap => "dict_wh",
            ConfigType::Map => "dict",
            ConfigType::WidthHeightList => "list_wh",
            ConfigType::BgrList => "list_bgr",
            ConfigType::List => "list",
            ConfigType::PathString => "str_path",
            ConfigType::String => "str",
            ConfigType::NoneType => "nonetype",
        }
    }

    pub fn is_editable(&self) -> bool {
        *self != ConfigType::ReadOnly
    }

    /// Whether `value` is acceptable for a key of this type. Returns the
    /// value coerced to the stored representation.
    pub fn accept(&self, value: ConfigValue) -> Option<ConfigValue> {
        match self {
            ConfigType::ReadOnly => None,
            ConfigType::Bool => value.as_bool().map(ConfigValue::Bool),
            ConfigType::Int => value.as_int().map(ConfigValue::Int),
            ConfigType::UnitFloat => value
                .as_float()
                .filter(|v| (0.0..=1.0).contains(v))
                .map(ConfigValue::Float),
            ConfigType::Float => value.as_float().map(ConfigValue::Float),
            ConfigType::WidthHeightMap => {
                matches!(&value, ConfigValue::Map(entries) if entries.len() == 2).then_some(value)
            }
            ConfigType::Map => value.as_map().is_some().then_some(value),
            ConfigType::WidthHeightList => {
                matches!(&value, ConfigValue::List(items) if items.len() == 2).then_some(value)
            }
            ConfigType::BgrList => {
                let is_bgr = match &value {
                    ConfigValue::List(items) => {
                        items.len() == 3 && items.iter().all(|c| c.as_int().is_some())
                    }
                    _ => false,
                };
                is_bgr.then_some(value)
            }
            ConfigType::List => value.as_list().is_some().then_some(value),
            // Parsed scalars are kept as typed: `source: 0` selects a camera
            // even where the default is a URL.
            ConfigType::PathString | ConfigType::String => {
                (value.is_scalar() && value != ConfigValue::Null).then_some(value)
            }
            ConfigType::NoneType => Some(value),
        }
    }
}

impl fmt::Display for ConfigType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Classify a config key from its default value and naming convention.
pub fn infer_type(key: &str, value: &ConfigValue) -> ConfigType {
    if is_readonly_key(key) {
        return ConfigType::ReadOnly;
    }
    match value {
        ConfigValue::Bool(_) => ConfigType::Bool,
        ConfigValue::Int(_) => ConfigType::Int,
        ConfigValue::Float(v) => {
            let unit_suffix = key.ends_with("_factor") || key.ends_with("_threshold");
            if (0.0..=1.0).contains(v) && unit_suffix {
                ConfigType::UnitFloat
            } else {
                ConfigType::Float
            }
        }
        ConfigValue::Map(entries) => {
            if entries.len() == 2 && key.ends_with("resolution") {
                ConfigType::WidthHeightMap
            } else {
                ConfigType::Map
            }
        }
        ConfigValue::List(items) => {
            if items.len() == 2 && key.ends_with("resolution") {
                ConfigType::WidthHeightList
            } else if items.len() == 3 && key.ends_with("_color") {
                ConfigType::BgrList
            } else {
                ConfigType::List
            }
        }
        ConfigValue::String(_) => {
            if key.ends_with("_path") {
                ConfigType::PathString
            } else {
                ConfigType::String
            }
        }
        ConfigValue::Null => ConfigType::NoneType,
    }
}
