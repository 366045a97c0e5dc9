use crate::config::value::{ConfigMap, ConfigValue};
use crate::model::id::NodeId;
use std::fmt;

/// Config keys the user changed from their defaults, in the order they
/// were first set. At most one entry per key.
///
/// An empty set means "use every default"; such a node serializes as a
/// bare title.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Overrides {
    entries: ConfigMap,
}

impl Overrides {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds from flat pairs. A repeated key keeps its first position
    /// and its last value.
    pub fn from_pairs(pairs: impl IntoIterator<Item = (String, ConfigValue)>) -> Self {
        let mut overrides = Self::new();
        for (key, value) in pairs {
            overrides.set(key, value);
        }
        overrides
    }

    pub fn set(&mut self, key: impl Into<String>, value: ConfigValue) {
        let key = key.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => *existing = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn pop(&mut self, key: &str) -> Option<ConfigValue> {
        let pos = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(pos).1)
    }

    pub fn get(&self, key: &str) -> Option<&ConfigValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ConfigValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Flattened copy for serialization.
    pub fn to_map(&self) -> ConfigMap {
        self.entries.clone()
    }
}

/// One stage of a pipeline: which catalog entry it instantiates, plus
/// the user's config changes.
#[derive(Debug, Clone)]
pub struct NodeRecord {
    id: NodeId,
    title: String,
    overrides: Overrides,
}

impl NodeRecord {
    pub fn new(title: impl Into<String>) -> Self {
        Self::with_overrides(title, Overrides::new())
    }

    pub fn with_overrides(title: impl Into<String>, overrides: Overrides) -> Self {
        Self {
            id: NodeId::new(),
            title: title.into(),
            overrides,
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn overrides(&self) -> &Overrides {
        &self.overrides
    }

    pub fn has_overrides(&self) -> bool {
        !self.overrides.is_empty()
    }

    pub fn override_value(&self, key: &str) -> Option<&ConfigValue> {
        self.overrides.get(key)
    }

    pub fn set_override(&mut self, key: impl Into<String>, value: ConfigValue) {
        self.overrides.set(key, value);
    }

    /// Removes the override for `key`. Popping the last one returns the
    /// node to its all-defaults state.
    pub fn pop_override(&mut self, key: &str) -> Option<ConfigValue> {
        self.overrides.pop(key)
    }
}

impl fmt::Display for NodeRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.title)?;
        if self.has_overrides() {
            write!(f, " {{")?;
            for (i, (key, value)) in self.overrides.iter().enumerate() {
                if i > 0 {
                    write!(f, ",")?;
                }
                write!(f, " {key}: {value}")?;
            }
            write!(f, " }}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_node_has_no_overrides() {
        let node = NodeRecord::new("draw.bbox");
        assert_eq!(node.title(), "draw.bbox");
        assert!(!node.has_overrides());
    }

    #[test]
    fn test_set_updates_in_place() {
        let mut node = NodeRecord::new("model.yolo");
        node.set_override("model_type", "v4".into());
        node.set_override("score_threshold", 0.2.into());
        node.set_override("model_type", "v4tiny".into());

        let keys: Vec<_> = node.overrides().iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["model_type", "score_threshold"]);
        assert_eq!(node.override_value("model_type"), Some(&"v4tiny".into()));
    }

    #[test]
    fn test_pop_last_override_resets() {
        let mut node = NodeRecord::new("model.yolo");
        node.set_override("model_type", "v4".into());
        assert_eq!(node.pop_override("model_type"), Some("v4".into()));
        assert!(!node.has_overrides());
        assert_eq!(node.pop_override("model_type"), None);
    }

    #[test]
    fn test_from_pairs_dedups() {
        let overrides = Overrides::from_pairs(vec![
            ("a".to_string(), ConfigValue::Int(1)),
            ("b".to_string(), ConfigValue::Int(2)),
            ("a".to_string(), ConfigValue::Int(3)),
        ]);
        assert_eq!(overrides.len(), 2);
        assert_eq!(overrides.get("a"), Some(&ConfigValue::Int(3)));
    }

    #[test]
    fn test_display() {
        let mut node = NodeRecord::new("input.visual");
        assert_eq!(node.to_string(), "input.visual");
        node.set_override("source", 0.into());
        assert_eq!(node.to_string(), "input.visual { source: 0 }");
    }
}
