use serde_yaml::Value as YamlValue;
use tracing::debug;

use crate::compiler::legacy;
use crate::dsl::{NodeEntry, PipelineDescription};
use crate::error::PipelineParseError;
use crate::model::node::{NodeRecord, Overrides};
use crate::model::pipeline::Pipeline;

/// Turns descriptions into pipelines.
///
/// The result is always a fresh, detached `Pipeline`: callers swap it in
/// only once parsing has fully succeeded.
pub struct PipelineParser;

impl PipelineParser {
    pub fn new() -> Self {
        Self
    }

    /// Parses a loaded YAML document.
    pub fn parse_value(&self, value: YamlValue) -> Result<Pipeline, PipelineParseError> {
        let description = PipelineDescription::from_value(value)?;
        Ok(self.parse(description))
    }

    pub fn parse(&self, description: PipelineDescription) -> Pipeline {
        let records = description
            .nodes
            .into_iter()
            .map(legacy::rewrite)
            .map(|entry| self.to_record(entry));
        let pipeline = Pipeline::from_records(records);
        debug!("parsed pipeline with {} nodes", pipeline.len());
        pipeline
    }

    fn to_record(&self, entry: NodeEntry) -> NodeRecord {
        match entry {
            NodeEntry::Bare(title) => NodeRecord::new(title),
            NodeEntry::Configured { title, config } => {
                NodeRecord::with_overrides(title, Overrides::from_pairs(config))
            }
        }
    }
}

impl Default for PipelineParser {
    fn default() -> Self {
        Self::new()
    }
}
