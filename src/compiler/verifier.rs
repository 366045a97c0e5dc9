//! Data-flow check of a pipeline against node defaults.
//!
//! Every node declares the data types it consumes (`input`) and produces
//! (`output`) in its default config. A node whose inputs were not produced
//! by an earlier node will fail at run time, so we report it up front.

use std::collections::HashSet;
use std::fmt;
use tracing::debug;

use crate::config::catalog::{NodeCatalog, is_custom};
use crate::config::value::{ConfigValue, lookup};
use crate::model::pipeline::Pipeline;

/// Inputs that are satisfied without an upstream producer.
const ANY_INPUT: &[&str] = &["all", "none"];
/// Output that produces nothing.
const NO_OUTPUT: &str = "none";

#[derive(Debug, Clone, PartialEq)]
pub enum IssueKind {
    /// Title is not in the catalog.
    UnknownNode,
    /// Data types no earlier node produces.
    MissingInputs(Vec<String>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct PipelineIssue {
    pub index: usize,
    pub title: String,
    pub kind: IssueKind,
}

impl fmt::Display for PipelineIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            IssueKind::UnknownNode => {
                write!(f, "node {} ({}): unknown node", self.index + 1, self.title)
            }
            IssueKind::MissingInputs(missing) => write!(
                f,
                "node {} ({}): input not available: {}",
                self.index + 1,
                self.title,
                missing.join(", ")
            ),
        }
    }
}

pub struct Verifier;

impl Verifier {
    pub fn new() -> Self {
        Self
    }

    /// Custom nodes are not checked.
    pub fn verify(&self, pipeline: &Pipeline, catalog: &dyn NodeCatalog) -> Vec<PipelineIssue> {
        let mut issues = Vec::new();
        let mut available: HashSet<String> = HashSet::new();

        for (index, node) in pipeline.iter().enumerate() {
            let title = node.title();
            if is_custom(title) {
                debug!(title = %title, "skipping custom node");
                continue;
            }
            let Some(defaults) = catalog.default_config(title) else {
                issues.push(PipelineIssue {
                    index,
                    title: title.to_string(),
                    kind: IssueKind::UnknownNode,
                });
                continue;
            };

            let missing: Vec<String> = data_types(lookup(defaults, "input"))
                .filter(|input| !ANY_INPUT.contains(input) && !available.contains(*input))
                .map(str::to_string)
                .collect();
            if !missing.is_empty() {
                debug!(title = %title, ?missing, "inputs not available");
                issues.push(PipelineIssue {
                    index,
                    title: title.to_string(),
                    kind: IssueKind::MissingInputs(missing),
                });
            }

            available.extend(
                data_types(lookup(defaults, "output"))
                    .filter(|output| *output != NO_OUTPUT)
                    .map(str::to_string),
            );
        }
        issues
    }
}

impl Default for Verifier {
    fn default() -> Self {
        Self::new()
    }
}

/// `input`/`output` are lists of data type names; a lone string is
/// accepted too.
fn data_types(value: Option<&ConfigValue>) -> impl Iterator<Item = &str> {
    let items: Vec<&str> = match value {
        Some(ConfigValue::List(items)) => items.iter().filter_map(ConfigValue::as_str).collect(),
        Some(ConfigValue::String(single)) => vec![single.as_str()],
        _ => Vec::new(),
    };
    items.into_iter()
}
