use crate::config::value::{ConfigMap, ConfigValue};
use crate::dsl::{NodeEntry, PipelineDescription};

pub struct PipelineBuilder {
    pub nodes: Vec<NodeEntry>, // public so tests can splice in raw entries
}

impl PipelineBuilder {
    pub fn new() -> Self {
        Self { nodes: Vec::new() }
    }

    /// Node without overrides.
    pub fn node(mut self, title: &str) -> Self {
        self.nodes.push(NodeEntry::Bare(title.to_string()));
        self
    }

    /// Node with overrides; finish it with `NodeBuilder::build`.
    pub fn configured(self, title: &str) -> NodeBuilder {
        NodeBuilder {
            pipeline_builder: self,
            title: title.to_string(),
            config: ConfigMap::new(),
        }
    }

    pub fn build(self) -> PipelineDescription {
        PipelineDescription { nodes: self.nodes }
    }
}

impl Default for PipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

pub struct NodeBuilder {
    pipeline_builder: PipelineBuilder,
    title: String,
    config: ConfigMap,
}

impl NodeBuilder {
    pub fn param(mut self, key: &str, value: impl Into<ConfigValue>) -> Self {
        self.config.push((key.to_string(), value.into()));
        self
    }

    pub fn build(mut self) -> PipelineBuilder {
        self.pipeline_builder.nodes.push(NodeEntry::Configured {
            title: self.title,
            config: self.config,
        });
        self.pipeline_builder
    }
}
