//! Node catalogs: which node titles exist and their default configs.
//!
//! A catalog directory looks like
//!
//! ```text
//! configs/
//!   input/
//!     visual.yml
//!   model/
//!     posenet.yml
//!     yolo.yml
//! ```
//!
//! where each subdirectory is a node type and each `.yml` file holds the
//! default config of node `<type>.<file stem>`.

use serde_yaml::Value as YamlValue;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::config::types::{ConfigType, infer_type, is_reserved_key};
use crate::config::value::{ConfigMap, mapping_to_config};
use crate::dsl::yaml_shape;
use crate::error::{StudioError, StudioResult};

/// Namespace prefix of user-supplied nodes.
pub const CUSTOM_NODES: &str = "custom_nodes";

/// Where custom node configs live, relative to the pipeline file.
pub const CUSTOM_NODES_CONFIG_DIR: &str = "src/custom_nodes/configs";

const CONFIG_EXTENSION: &str = "yml";

/// Read-only source of node defaults.
pub trait NodeCatalog {
    fn default_config(&self, title: &str) -> Option<&ConfigMap>;

    fn node_types(&self) -> Vec<String>;

    fn node_titles(&self, node_type: &str) -> Vec<String>;

    fn contains(&self, title: &str) -> bool {
        self.default_config(title).is_some()
    }

    /// Inferred type of every non-reserved key, in default order.
    fn config_types(&self, title: &str) -> Option<Vec<(String, ConfigType)>> {
        self.default_config(title).map(|defaults| {
            defaults
                .iter()
                .filter(|(key, _)| !is_reserved_key(key))
                .map(|(key, value)| (key.clone(), infer_type(key, value)))
                .collect()
        })
    }
}

/// Catalog loaded from a config directory, or assembled in memory.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    nodes_by_type: BTreeMap<String, Vec<String>>,
    defaults: HashMap<String, ConfigMap>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, title: impl Into<String>, defaults: ConfigMap) {
        let title = title.into();
        let titles = self
            .nodes_by_type
            .entry(node_type(&title).to_string())
            .or_default();
        if !titles.contains(&title) {
            titles.push(title.clone());
        }
        self.defaults.insert(title, defaults);
    }

    pub fn with_node(mut self, title: &str, defaults: ConfigMap) -> Self {
        self.insert(title, defaults);
        self
    }

    pub fn len(&self) -> usize {
        self.defaults.len()
    }

    pub fn is_empty(&self) -> bool {
        self.defaults.is_empty()
    }

    /// Loads every `<type>/<name>.yml` below `config_path`, types and
    /// names in sorted order.
    pub fn load_dir(config_path: &Path) -> StudioResult<Self> {
        let mut catalog = Catalog::new();
        for type_dir in sorted_entries(config_path)?.into_iter().filter(|p| p.is_dir()) {
            let node_type = file_name(&type_dir);
            debug!(node_type = %node_type, "loading node configs");
            catalog.nodes_by_type.entry(node_type.clone()).or_default();

            let files = sorted_entries(&type_dir)?.into_iter().filter(|p| {
                p.is_file() && p.extension().is_some_and(|ext| ext == CONFIG_EXTENSION)
            });
            for file in files {
                let name = file
                    .file_stem()
                    .map(|stem| stem.to_string_lossy().into_owned())
                    .unwrap_or_default();
                let title = format!("{node_type}.{name}");
                let defaults = read_defaults(&file)?;
                debug!(title = %title, keys = defaults.len(), "loaded default config");
                catalog.insert(title, defaults);
            }
        }
        Ok(catalog)
    }

    /// Custom node catalog next to a pipeline file, if there is a
    /// non-empty `src/custom_nodes/configs` directory.
    pub fn discover_custom(pipeline_dir: &Path) -> StudioResult<Option<Self>> {
        let config_path = pipeline_dir.join(CUSTOM_NODES_CONFIG_DIR);
        if !has_entries(&config_path) {
            return Ok(None);
        }
        debug!(path = %config_path.display(), "pipeline has custom nodes");
        Catalog::load_dir(&config_path).map(Some)
    }
}

impl NodeCatalog for Catalog {
    fn default_config(&self, title: &str) -> Option<&ConfigMap> {
        self.defaults.get(title)
    }

    fn node_types(&self) -> Vec<String> {
        self.nodes_by_type.keys().cloned().collect()
    }

    fn node_titles(&self, node_type: &str) -> Vec<String> {
        self.nodes_by_type.get(node_type).cloned().unwrap_or_default()
    }
}

/// The built-in catalog, extended by a pipeline's custom nodes.
///
/// Custom titles carry the `custom_nodes.` prefix on the outside and are
/// looked up without it.
#[derive(Debug, Clone, Copy)]
pub struct LayeredCatalog<'a> {
    builtin: &'a Catalog,
    custom: Option<&'a Catalog>,
}

impl<'a> LayeredCatalog<'a> {
    pub fn new(builtin: &'a Catalog, custom: Option<&'a Catalog>) -> Self {
        Self { builtin, custom }
    }

    pub fn is_custom_node(&self, title: &str) -> bool {
        strip_custom(title)
            .zip(self.custom)
            .is_some_and(|(inner, custom)| custom.contains(inner))
    }
}

impl NodeCatalog for LayeredCatalog<'_> {
    fn default_config(&self, title: &str) -> Option<&ConfigMap> {
        match strip_custom(title) {
            Some(inner) => self.custom?.default_config(inner),
            None => self.builtin.default_config(title),
        }
    }

    /// Built-in types only; custom nodes extend existing types.
    fn node_types(&self) -> Vec<String> {
        self.builtin.node_types()
    }

    fn node_titles(&self, node_type: &str) -> Vec<String> {
        let mut titles = self.builtin.node_titles(node_type);
        if let Some(custom) = self.custom {
            titles.extend(
                custom
                    .node_titles(node_type)
                    .into_iter()
                    .map(|title| format!("{CUSTOM_NODES}.{title}")),
            );
        }
        titles
    }
}

// --- Title helpers ---

pub fn strip_custom(title: &str) -> Option<&str> {
    title
        .strip_prefix(CUSTOM_NODES)
        .and_then(|rest| rest.strip_prefix('.'))
}

pub fn is_custom(title: &str) -> bool {
    strip_custom(title).is_some()
}

/// `model` for `model.yolo` and for `custom_nodes.model.my_detector`.
pub fn node_type(title: &str) -> &str {
    let inner = strip_custom(title).unwrap_or(title);
    inner.split('.').next().unwrap_or(inner)
}

/// Last dotted token of the title.
pub fn node_name(title: &str) -> &str {
    title.rsplit('.').next().unwrap_or(title)
}

// --- File helpers ---

fn sorted_entries(dir: &Path) -> StudioResult<Vec<PathBuf>> {
    let io_err = |source| StudioError::Io {
        path: dir.to_path_buf(),
        source,
    };
    let mut paths = Vec::new();
    for entry in fs::read_dir(dir).map_err(io_err)? {
        paths.push(entry.map_err(io_err)?.path());
    }
    paths.sort();
    Ok(paths)
}

fn has_entries(dir: &Path) -> bool {
    fs::read_dir(dir).is_ok_and(|mut entries| entries.next().is_some())
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn read_defaults(file: &Path) -> StudioResult<ConfigMap> {
    let text = fs::read_to_string(file).map_err(|source| StudioError::Io {
        path: file.to_path_buf(),
        source,
    })?;
    let value: YamlValue = serde_yaml::from_str(&text).map_err(|source| StudioError::Yaml {
        path: file.to_path_buf(),
        source,
    })?;
    match value {
        YamlValue::Null => Ok(ConfigMap::new()),
        YamlValue::Mapping(map) => mapping_to_config(map).map_err(|message| StudioError::Catalog {
            path: file.to_path_buf(),
            message,
        }),
        other => Err(StudioError::Catalog {
            path: file.to_path_buf(),
            message: format!("expected a mapping, found {}", yaml_shape(&other)),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_title_helpers() {
        assert_eq!(node_type("model.yolo"), "model");
        assert_eq!(node_name("model.yolo"), "yolo");
        assert_eq!(node_type("custom_nodes.dabble.counter"), "dabble");
        assert_eq!(node_name("custom_nodes.dabble.counter"), "counter");
        assert!(is_custom("custom_nodes.dabble.counter"));
        assert!(!is_custom("custom_nodesx.dabble"));
        assert_eq!(strip_custom("custom_nodes.dabble.counter"), Some("dabble.counter"));
    }

    #[test]
    fn test_insert_groups_by_type() {
        let catalog = Catalog::new()
            .with_node("model.yolo", vec![])
            .with_node("model.posenet", vec![])
            .with_node("draw.bbox", vec![]);
        assert_eq!(catalog.node_types(), vec!["draw", "model"]);
        assert_eq!(catalog.node_titles("model"), vec!["model.yolo", "model.posenet"]);
        assert!(catalog.node_titles("output").is_empty());
    }
}
