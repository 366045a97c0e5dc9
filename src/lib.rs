//! Editing core of PeekingDuck Studio: the pipeline/node data model, node
//! config resolution, and the pipeline file format.
//!
//! The GUI and the vision execution engine live elsewhere. The GUI holds
//! `NodeId`s and calls into `runtime::session::Studio`; the engine is a
//! `runtime::playback::PipelineRunner` fed with pipeline snapshots.

pub mod compiler;
pub mod config;
pub mod dsl;
pub mod error;
pub mod model;
pub mod runtime;

pub use error::{PipelineParseError, StudioError, StudioResult};
pub use model::id::NodeId;
pub use model::node::{NodeRecord, Overrides};
pub use model::pipeline::{Direction, Pipeline};
pub use runtime::session::Studio;
