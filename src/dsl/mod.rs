pub mod builder;

use serde::de::Error as _;
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_yaml::Value as YamlValue;

use crate::config::value::{ConfigMap, ConfigValue};
use crate::error::{PipelineParseError, StudioError, StudioResult};

/// Override body older files use to mean "no overrides".
const NO_CONFIG_KEY: &str = "None";
const NO_CONFIG_VALUE: &str = "No Config";

/// Pipeline description as stored on disk and handed to the execution
/// engine:
///
/// ```yaml
/// nodes:
/// - input.visual
/// - model.yolo:
///     model_type: v4
/// - draw.bbox
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct PipelineDescription {
    pub nodes: Vec<NodeEntry>,
}

/// One element of `nodes`: a bare title, or a title with overrides.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeEntry {
    Bare(String),
    Configured { title: String, config: ConfigMap },
}

impl NodeEntry {
    pub fn title(&self) -> &str {
        match self {
            NodeEntry::Bare(title) => title,
            NodeEntry::Configured { title, .. } => title,
        }
    }

    pub fn config(&self) -> &[(String, ConfigValue)] {
        match self {
            NodeEntry::Bare(_) => &[],
            NodeEntry::Configured { config, .. } => config,
        }
    }

    fn from_value(index: usize, value: YamlValue) -> Result<Self, PipelineParseError> {
        let map = match value {
            YamlValue::String(title) => return Ok(NodeEntry::Bare(title)),
            YamlValue::Mapping(map) => map,
            other => {
                return Err(PipelineParseError::MalformedNode {
                    index,
                    shape: yaml_shape(&other),
                });
            }
        };

        let key_count = map.len();
        let mut entries = map.into_iter();
        let (key, body) = match (entries.next(), entries.next()) {
            (Some(entry), None) => entry,
            _ => {
                return Err(PipelineParseError::MalformedNode {
                    index,
                    shape: format!("mapping with {key_count} keys"),
                });
            }
        };
        let title = match key {
            YamlValue::String(title) => title,
            other => {
                return Err(PipelineParseError::MalformedNode {
                    index,
                    shape: format!("mapping keyed by {}", yaml_shape(&other)),
                });
            }
        };

        let body = match body {
            YamlValue::Null => return Ok(NodeEntry::Bare(title)),
            YamlValue::Mapping(body) => body,
            other => {
                return Err(PipelineParseError::MalformedOverrides {
                    index,
                    title,
                    shape: yaml_shape(&other),
                });
            }
        };

        let mut config = ConfigMap::with_capacity(body.len());
        for (key, value) in body {
            let key = match key {
                YamlValue::String(key) => key,
                YamlValue::Number(n) => n.to_string(),
                YamlValue::Bool(b) => b.to_string(),
                other => {
                    return Err(PipelineParseError::InvalidValue {
                        index,
                        title,
                        key: format!("{other:?}"),
                        reason: "config keys must be scalars".to_string(),
                    });
                }
            };
            match ConfigValue::try_from(value) {
                Ok(value) => config.push((key, value)),
                Err(reason) => {
                    return Err(PipelineParseError::InvalidValue {
                        index,
                        title,
                        key,
                        reason,
                    });
                }
            }
        }

        if config.is_empty() || is_no_config_sentinel(&config) {
            Ok(NodeEntry::Bare(title))
        } else {
            Ok(NodeEntry::Configured { title, config })
        }
    }
}

fn is_no_config_sentinel(config: &ConfigMap) -> bool {
    matches!(
        config.as_slice(),
        [(key, ConfigValue::String(value))] if key == NO_CONFIG_KEY && value == NO_CONFIG_VALUE
    )
}

impl Serialize for NodeEntry {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            NodeEntry::Bare(title) => serializer.serialize_str(title),
            NodeEntry::Configured { title, config } => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry(title, &ConfigValue::Map(config.clone()))?;
                map.end()
            }
        }
    }
}

impl PipelineDescription {
    /// Structural parse of a loaded YAML document. Node titles are not
    /// checked against any catalog here.
    pub fn from_value(value: YamlValue) -> Result<Self, PipelineParseError> {
        let items = match value {
            YamlValue::Mapping(mut map) => match map.remove("nodes") {
                Some(YamlValue::Sequence(items)) => items,
                Some(other) => {
                    return Err(PipelineParseError::MissingNodes {
                        found: format!("`nodes` as {}", yaml_shape(&other)),
                    });
                }
                None => {
                    return Err(PipelineParseError::MissingNodes {
                        found: "no `nodes` key".to_string(),
                    });
                }
            },
            other => {
                return Err(PipelineParseError::MissingNodes {
                    found: yaml_shape(&other),
                });
            }
        };

        let nodes = items
            .into_iter()
            .enumerate()
            .map(|(index, item)| NodeEntry::from_value(index, item))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { nodes })
    }

    pub fn titles(&self) -> impl Iterator<Item = &str> {
        self.nodes.iter().map(NodeEntry::title)
    }

    pub fn to_yaml(&self) -> StudioResult<String> {
        serde_yaml::to_string(self).map_err(|e| StudioError::Serialize(e.to_string()))
    }

    /// Compact JSON, the form the execution engine takes on its command line.
    pub fn to_json(&self) -> StudioResult<String> {
        serde_json::to_string(self).map_err(|e| StudioError::Serialize(e.to_string()))
    }
}

impl<'de> Deserialize<'de> for PipelineDescription {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = YamlValue::deserialize(deserializer)?;
        PipelineDescription::from_value(value).map_err(D::Error::custom)
    }
}

pub(crate) fn yaml_shape(value: &YamlValue) -> String {
    match value {
        YamlValue::Null => "null".to_string(),
        YamlValue::Bool(_) => "boolean".to_string(),
        YamlValue::Number(_) => "number".to_string(),
        YamlValue::String(_) => "string".to_string(),
        YamlValue::Sequence(items) => format!("list of {} items", items.len()),
        YamlValue::Mapping(map) => format!("mapping with {} keys", map.len()),
        YamlValue::Tagged(tagged) => format!("tagged value `{}`", tagged.tag),
    }
}
