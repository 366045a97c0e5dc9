use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::config::catalog::Catalog;
use crate::config::value::ConfigValue;
use crate::dsl::{NodeEntry, PipelineDescription};
use crate::model::id::NodeId;
use crate::model::node::NodeRecord;

/// Node inserted by `Pipeline::insert`. There is no "empty" node, so an
/// innocuous augmentation stands in until the user picks a type.
pub const PLACEHOLDER_NODE: &str = "augment.brightness";

pub const DEFAULT_PIPELINE_FILENAME: &str = "pipeline_config.yml";

/// Contents of a new pipeline.
pub const DEFAULT_NODES: [&str; 4] =
    ["input.visual", "model.posenet", "draw.poses", "output.screen"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Toward the start of the pipeline.
    Up,
    /// Toward the end of the pipeline.
    Down,
}

/// An ordered pipeline of nodes.
///
/// Records live in an arena keyed by `NodeId`; `order` is execution
/// order and `positions` is its reverse index. Every mutation leaves
/// `positions[order[i]] == i` for all `i`, with no extra entries, and
/// marks the pipeline dirty.
///
/// Positions and ids handed in by callers are trusted: an index out of
/// range or an id that is not in the pipeline is a caller bug and panics.
#[derive(Debug, Clone)]
pub struct Pipeline {
    records: HashMap<NodeId, NodeRecord>,
    order: Vec<NodeId>,
    positions: HashMap<NodeId, usize>,
    dirty: bool,
    filepath: PathBuf,
    custom_nodes: Option<Catalog>,
}

impl Pipeline {
    /// The default four-stage pipeline, unsaved.
    pub fn new() -> Self {
        Self::from_records(DEFAULT_NODES.iter().map(|title| NodeRecord::new(*title)))
    }

    pub fn from_records(records: impl IntoIterator<Item = NodeRecord>) -> Self {
        let mut pipeline = Self {
            records: HashMap::new(),
            order: Vec::new(),
            positions: HashMap::new(),
            dirty: true,
            filepath: PathBuf::from(DEFAULT_PIPELINE_FILENAME),
            custom_nodes: None,
        };
        for record in records {
            let id = record.id();
            assert!(
                !pipeline.records.contains_key(&id),
                "node {id} added to pipeline twice"
            );
            pipeline.positions.insert(id, pipeline.order.len());
            pipeline.order.push(id);
            pipeline.records.insert(id, record);
        }
        pipeline
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Only the execution side clears the flag, after a successful run.
    pub(crate) fn mark_clean(&mut self) {
        self.dirty = false;
    }

    fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    // --- Lookup ---

    pub fn iter(&self) -> impl Iterator<Item = &NodeRecord> + '_ {
        self.order.iter().map(move |id| &self.records[id])
    }

    pub fn ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.order.iter().copied()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.positions.contains_key(&id)
    }

    pub fn position_of(&self, id: NodeId) -> Option<usize> {
        self.positions.get(&id).copied()
    }

    pub fn position(&self, id: NodeId) -> usize {
        match self.positions.get(&id) {
            Some(pos) => *pos,
            None => panic!("node {id} is not in the pipeline"),
        }
    }

    pub fn get_by_id(&self, id: NodeId) -> &NodeRecord {
        match self.records.get(&id) {
            Some(record) => record,
            None => panic!("node {id} is not in the pipeline"),
        }
    }

    pub fn get_by_index(&self, index: usize) -> &NodeRecord {
        assert!(
            index < self.len(),
            "node index {index} out of range for pipeline of {} nodes",
            self.len()
        );
        &self.records[&self.order[index]]
    }

    fn get_mut(&mut self, id: NodeId) -> &mut NodeRecord {
        match self.records.get_mut(&id) {
            Some(record) => record,
            None => panic!("node {id} is not in the pipeline"),
        }
    }

    // --- Mutation ---

    /// Inserts a placeholder node so it ends up at `at`; nodes from `at`
    /// onward shift one place later. `at == len()` appends.
    pub fn insert(&mut self, at: usize) -> NodeId {
        assert!(
            at <= self.len(),
            "insert position {at} out of range for pipeline of {} nodes",
            self.len()
        );
        let record = NodeRecord::new(PLACEHOLDER_NODE);
        let id = record.id();
        self.records.insert(id, record);
        self.order.insert(at, id);
        self.reindex_from(at);
        self.mark_dirty();
        debug!(node = %id, position = at, "inserted {}", PLACEHOLDER_NODE);
        id
    }

    /// Removes the node at `index`, keeping the others in order.
    ///
    /// The node is walked to the end one swap at a time, so the reverse
    /// index is consistent after every step, then truncated. This is O(n)
    /// per delete, which is fine for pipelines of tens of nodes.
    pub fn delete(&mut self, index: usize) -> NodeRecord {
        assert!(
            index < self.len(),
            "delete position {index} out of range for pipeline of {} nodes",
            self.len()
        );
        let id = self.order[index];
        for pos in index..self.len() - 1 {
            self.swap(pos, pos + 1);
        }
        self.order.pop();
        self.positions.remove(&id);
        let record = match self.records.remove(&id) {
            Some(record) => record,
            None => panic!("node {id} missing from arena"),
        };
        self.mark_dirty();
        debug!(node = %id, position = index, "deleted {}", record.title());
        record
    }

    /// Swaps the node with its neighbour in `direction`. Nothing moves at
    /// the boundary, but the pipeline is still marked dirty.
    pub fn move_node(&mut self, id: NodeId, direction: Direction) {
        let pos = self.position(id);
        match direction {
            Direction::Up if pos > 0 => self.swap(pos - 1, pos),
            Direction::Down if pos + 1 < self.len() => self.swap(pos, pos + 1),
            _ => {}
        }
        self.mark_dirty();
    }

    pub fn move_up(&mut self, id: NodeId) {
        self.move_node(id, Direction::Up);
    }

    pub fn move_down(&mut self, id: NodeId) {
        self.move_node(id, Direction::Down);
    }

    /// Puts `node` at `index` and returns the record it displaced. The
    /// displaced id is no longer valid.
    pub fn replace(&mut self, index: usize, node: NodeRecord) -> NodeRecord {
        assert!(
            index < self.len(),
            "replace position {index} out of range for pipeline of {} nodes",
            self.len()
        );
        let new_id = node.id();
        assert!(!self.contains(new_id), "node {new_id} is already in the pipeline");

        let old_id = self.order[index];
        self.positions.remove(&old_id);
        let old = match self.records.remove(&old_id) {
            Some(record) => record,
            None => panic!("node {old_id} missing from arena"),
        };

        self.order[index] = new_id;
        self.positions.insert(new_id, index);
        self.records.insert(new_id, node);
        self.mark_dirty();
        debug!(old = %old_id, new = %new_id, position = index, "replaced {}", old.title());
        old
    }

    /// Replaces the node at `index` with a fresh node of another type.
    pub fn swap_node_type(&mut self, index: usize, title: impl Into<String>) -> NodeId {
        let record = NodeRecord::new(title);
        let id = record.id();
        self.replace(index, record);
        id
    }

    pub fn set_override(&mut self, id: NodeId, key: impl Into<String>, value: ConfigValue) {
        self.get_mut(id).set_override(key, value);
        self.mark_dirty();
    }

    pub fn pop_override(&mut self, id: NodeId, key: &str) -> Option<ConfigValue> {
        let popped = self.get_mut(id).pop_override(key);
        self.mark_dirty();
        popped
    }

    fn swap(&mut self, a: usize, b: usize) {
        self.order.swap(a, b);
        self.positions.insert(self.order[a], a);
        self.positions.insert(self.order[b], b);
    }

    fn reindex_from(&mut self, start: usize) {
        for pos in start..self.order.len() {
            self.positions.insert(self.order[pos], pos);
        }
    }

    /// Checks the identity/position invariant.
    pub fn is_consistent(&self) -> bool {
        self.order.len() == self.positions.len()
            && self.order.len() == self.records.len()
            && self
                .order
                .iter()
                .enumerate()
                .all(|(pos, id)| {
                    self.positions.get(id) == Some(&pos) && self.records.contains_key(id)
                })
    }

    // --- Serialization ---

    pub fn to_description(&self) -> PipelineDescription {
        let nodes = self
            .iter()
            .map(|node| {
                if node.has_overrides() {
                    NodeEntry::Configured {
                        title: node.title().to_string(),
                        config: node.overrides().to_map(),
                    }
                } else {
                    NodeEntry::Bare(node.title().to_string())
                }
            })
            .collect();
        PipelineDescription { nodes }
    }

    // --- File and custom nodes ---

    pub fn filepath(&self) -> &Path {
        &self.filepath
    }

    pub fn set_filepath(&mut self, path: impl Into<PathBuf>) {
        self.filepath = path.into();
    }

    pub fn filename(&self) -> String {
        self.filepath
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Directory the pipeline file lives in.
    pub fn parent_dir(&self) -> &Path {
        self.filepath.parent().unwrap_or_else(|| Path::new(""))
    }

    pub fn custom_nodes(&self) -> Option<&Catalog> {
        self.custom_nodes.as_ref()
    }

    pub fn has_custom_nodes(&self) -> bool {
        self.custom_nodes.is_some()
    }

    pub fn set_custom_nodes(&mut self, catalog: Option<Catalog>) {
        self.custom_nodes = catalog;
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Pipeline: {} nodes", self.len())?;
        for (pos, node) in self.iter().enumerate() {
            writeln!(f, "{:>3}  {}", pos + 1, node)?;
        }
        Ok(())
    }
}
