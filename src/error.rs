//! Error types surfaced to the user.
//!
//! Contract violations (bad index, unknown `NodeId`) are not represented
//! here: they panic, because they mean the caller is wrong.

use std::path::PathBuf;
use thiserror::Error;

use crate::config::types::ConfigType;

/// A pipeline description could not be turned into a pipeline.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PipelineParseError {
    #[error("pipeline description must be a mapping with a `nodes` list, found {found}")]
    MissingNodes { found: String },

    #[error("node {index}: expected a node title or a single-key mapping, found {shape}")]
    MalformedNode { index: usize, shape: String },

    #[error("node {index} ({title}): overrides must be a mapping, found {shape}")]
    MalformedOverrides {
        index: usize,
        title: String,
        shape: String,
    },

    #[error("node {index} ({title}): cannot read value of `{key}`: {reason}")]
    InvalidValue {
        index: usize,
        title: String,
        key: String,
        reason: String,
    },
}

/// Errors returned by the studio session, loaders and the catalog.
#[derive(Error, Debug)]
pub enum StudioError {
    #[error(transparent)]
    Parse(#[from] PipelineParseError),

    #[error("failed to access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid YAML in {}: {source}", path.display())]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("failed to serialize pipeline: {0}")]
    Serialize(String),

    #[error("catalog entry {}: {message}", path.display())]
    Catalog { path: PathBuf, message: String },

    #[error("unknown node `{title}`")]
    UnknownNode { title: String },

    #[error("node `{title}` has no config key `{key}`")]
    UnknownConfigKey { title: String, key: String },

    #[error("config key `{key}` of node `{title}` is read-only")]
    ReadOnlyKey { title: String, key: String },

    #[error("config key `{key}` of node `{title}` expects {expected}, got `{value}`")]
    TypeMismatch {
        title: String,
        key: String,
        expected: ConfigType,
        value: String,
    },

    #[error(transparent)]
    Execution(#[from] anyhow::Error),
}

pub type StudioResult<T> = std::result::Result<T, StudioError>;
