use anyhow::{Context as _, Result};
use tracing::{debug, info};

use crate::dsl::PipelineDescription;
use crate::error::StudioResult;
use crate::model::pipeline::Pipeline;

/// The execution engine. It receives a snapshot of the pipeline and owns
/// everything downstream of it: node instantiation, frame iteration and
/// cleanup.
pub trait PipelineRunner {
    fn run(&mut self, description: &PipelineDescription) -> Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayOutcome {
    /// The runner executed a new snapshot.
    Executed,
    /// Nothing changed since the last run; replay its output.
    Replayed,
}

/// Decides between re-running the pipeline and replaying the last run,
/// based on the pipeline's dirty flag.
#[derive(Debug, Default)]
pub struct Playback {
    last_run: Option<PipelineDescription>,
}

impl Playback {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the last successful run.
    pub fn last_run(&self) -> Option<&PipelineDescription> {
        self.last_run.as_ref()
    }

    /// Forget the last run, e.g. after loading another pipeline.
    pub fn reset(&mut self) {
        self.last_run = None;
    }

    /// Runs `pipeline` unless it is clean and was already run. The runner
    /// only ever sees a snapshot, never the live pipeline. On success the
    /// pipeline is marked clean; on failure it stays dirty.
    pub fn play<R: PipelineRunner + ?Sized>(
        &mut self,
        pipeline: &mut Pipeline,
        runner: &mut R,
    ) -> StudioResult<PlayOutcome> {
        if !pipeline.is_dirty() && self.last_run.is_some() {
            debug!("pipeline unchanged, replaying last run");
            return Ok(PlayOutcome::Replayed);
        }

        let snapshot = pipeline.to_description();
        info!("running pipeline with {} nodes", snapshot.nodes.len());
        runner
            .run(&snapshot)
            .with_context(|| format!("failed to run pipeline {}", pipeline.filepath().display()))?;

        pipeline.mark_clean();
        self.last_run = Some(snapshot);
        Ok(PlayOutcome::Executed)
    }
}
