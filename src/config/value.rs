//! Configuration values.
//!
//! Node configs in catalog files and pipeline overrides are loosely typed
//! YAML. `ConfigValue` is the closed set of shapes they may take; it
//! (de)serializes through `serde_yaml::Value` so mapping order survives.

use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Number, Value as YamlValue};
use std::fmt;

/// Ordered key/value pairs. Keys are unique; order is the file order.
pub type ConfigMap = Vec<(String, ConfigValue)>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "YamlValue", into = "YamlValue")]
pub enum ConfigValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    List(Vec<ConfigValue>),
    Map(ConfigMap),
}

impl ConfigValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ConfigValue::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            ConfigValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Integers widen to floats.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            ConfigValue::Float(v) => Some(*v),
            ConfigValue::Int(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ConfigValue::String(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[ConfigValue]> {
        match self {
            ConfigValue::List(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&ConfigMap> {
        match self {
            ConfigValue::Map(v) => Some(v),
            _ => None,
        }
    }

    pub fn is_scalar(&self) -> bool {
        !matches!(self, ConfigValue::List(_) | ConfigValue::Map(_))
    }

    /// Equality as a user perceives it: `5` equals `5.0`, mapping order
    /// is irrelevant.
    pub fn loosely_eq(&self, other: &ConfigValue) -> bool {
        match (self, other) {
            (ConfigValue::Int(a), ConfigValue::Float(b))
            | (ConfigValue::Float(b), ConfigValue::Int(a)) => {
                (*a as f64) == *b
            }
            (ConfigValue::List(a), ConfigValue::List(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.loosely_eq(y))
            }
            (ConfigValue::Map(a), ConfigValue::Map(b)) => {
                a.len() == b.len()
                    && a.iter()
                        .all(|(k, v)| lookup(b, k).is_some_and(|other| v.loosely_eq(other)))
            }
            _ => self == other,
        }
    }

    /// Short human description of the value's shape, for error messages.
    pub fn shape(&self) -> String {
        match self {
            ConfigValue::Null => "null".to_string(),
            ConfigValue::Bool(_) => "boolean".to_string(),
            ConfigValue::Int(_) => "integer".to_string(),
            ConfigValue::Float(_) => "float".to_string(),
            ConfigValue::String(_) => "string".to_string(),
            ConfigValue::List(items) => format!("list of {}", items.len()),
            ConfigValue::Map(entries) => format!("mapping of {}", entries.len()),
        }
    }

    /// Parse text typed by a user. Anything that is not a valid YAML
    /// value is kept verbatim as a string (`v4tiny`, `C:\videos`).
    pub fn parse_literal(text: &str) -> ConfigValue {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return ConfigValue::String(text.to_string());
        }
        serde_yaml::from_str::<YamlValue>(trimmed)
            .ok()
            .and_then(|value| ConfigValue::try_from(value).ok())
            .unwrap_or_else(|| ConfigValue::String(text.to_string()))
    }
}

pub fn lookup<'a>(map: &'a ConfigMap, key: &str) -> Option<&'a ConfigValue> {
    map.iter().find(|(k, _)| k == key).map(|(_, v)| v)
}

impl From<bool> for ConfigValue {
    fn from(v: bool) -> Self {
        ConfigValue::Bool(v)
    }
}

impl From<i64> for ConfigValue {
    fn from(v: i64) -> Self {
        ConfigValue::Int(v)
    }
}

impl From<i32> for ConfigValue {
    fn from(v: i32) -> Self {
        ConfigValue::Int(v as i64)
    }
}

impl From<f64> for ConfigValue {
    fn from(v: f64) -> Self {
        ConfigValue::Float(v)
    }
}

impl From<&str> for ConfigValue {
    fn from(v: &str) -> Self {
        ConfigValue::String(v.to_string())
    }
}

impl From<String> for ConfigValue {
    fn from(v: String) -> Self {
        ConfigValue::String(v)
    }
}

impl<T: Into<ConfigValue>> From<Vec<T>> for ConfigValue {
    fn from(v: Vec<T>) -> Self {
        ConfigValue::List(v.into_iter().map(Into::into).collect())
    }
}

impl TryFrom<YamlValue> for ConfigValue {
    type Error = String;

    fn try_from(value: YamlValue) -> Result<Self, Self::Error> {
        Ok(match value {
            YamlValue::Null => ConfigValue::Null,
            YamlValue::Bool(b) => ConfigValue::Bool(b),
            YamlValue::Number(n) => number_to_value(&n)?,
            YamlValue::String(s) => ConfigValue::String(s),
            YamlValue::Sequence(items) => ConfigValue::List(
                items
                    .into_iter()
                    .map(ConfigValue::try_from)
                    .collect::<Result<_, _>>()?,
            ),
            YamlValue::Mapping(map) => ConfigValue::Map(mapping_to_config(map)?),
            YamlValue::Tagged(tagged) => {
                return Err(format!("unsupported tagged value `{}`", tagged.tag));
            }
        })
    }
}

impl From<ConfigValue> for YamlValue {
    fn from(value: ConfigValue) -> Self {
        match value {
            ConfigValue::Null => YamlValue::Null,
            ConfigValue::Bool(b) => YamlValue::Bool(b),
            ConfigValue::Int(i) => YamlValue::Number(Number::from(i)),
            ConfigValue::Float(f) => YamlValue::Number(Number::from(f)),
            ConfigValue::String(s) => YamlValue::String(s),
            ConfigValue::List(items) => {
                YamlValue::Sequence(items.into_iter().map(YamlValue::from).collect())
            }
            ConfigValue::Map(entries) => YamlValue::Mapping(config_to_mapping(entries)),
        }
    }
}

/// Integers must fit in `i64`; larger ones are an error, not a lossy float.
fn number_to_value(n: &Number) -> Result<ConfigValue, String> {
    if let Some(i) = n.as_i64() {
        return Ok(ConfigValue::Int(i));
    }
    if n.is_u64() {
        return Err(format!("integer {n} is out of range"));
    }
    n.as_f64()
        .map(ConfigValue::Float)
        .ok_or_else(|| format!("unsupported number {n}"))
}

/// Converts a YAML mapping, stringifying scalar keys.
pub fn mapping_to_config(map: Mapping) -> Result<ConfigMap, String> {
    let mut entries = ConfigMap::with_capacity(map.len());
    for (key, value) in map {
        let key = match key {
            YamlValue::String(s) => s,
            YamlValue::Number(n) => n.to_string(),
            YamlValue::Bool(b) => b.to_string(),
            other => return Err(format!("unsupported mapping key {other:?}")),
        };
        entries.push((key, ConfigValue::try_from(value)?));
    }
    Ok(entries)
}

pub fn config_to_mapping(entries: ConfigMap) -> Mapping {
    let mut map = Mapping::with_capacity(entries.len());
    for (key, value) in entries {
        map.insert(YamlValue::String(key), value.into());
    }
    map
}

impl fmt::Display for ConfigValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigValue::Null => write!(f, "null"),
            ConfigValue::Bool(b) => write!(f, "{b}"),
            ConfigValue::Int(i) => write!(f, "{i}"),
            ConfigValue::Float(x) => write!(f, "{x:?}"),
            ConfigValue::String(s) => write!(f, "{s}"),
            ConfigValue::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            ConfigValue::Map(entries) => {
                write!(f, "{{")?;
                for (i, (key, value)) in entries.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{key}: {value}")?;
                }
                write!(f, "}}")
            }
        }
    }
}
