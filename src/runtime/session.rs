use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::compiler::loader::{
    load_pipeline_from_str, load_pipeline_from_yaml, save_pipeline_to_yaml,
};
use crate::compiler::verifier::{PipelineIssue, Verifier};
use crate::config::catalog::{Catalog, LayeredCatalog, NodeCatalog};
use crate::config::resolver::{ConfigEdit, EffectiveConfig, effective_config, resolve_edit};
use crate::config::value::ConfigValue;
use crate::error::StudioResult;
use crate::model::id::NodeId;
use crate::model::pipeline::Pipeline;
use crate::runtime::playback::{PipelineRunner, PlayOutcome, Playback};

/// Everything an editor front end talks to: the node catalog, the
/// pipeline being edited, and playback state.
///
/// Loading never corrupts the current pipeline. A new pipeline is parsed
/// on its own and swapped in only once parsing and custom node discovery
/// have both succeeded.
pub struct Studio {
    catalog: Catalog,
    pipeline: Option<Pipeline>,
    playback: Playback,
}

impl Studio {
    pub fn new(catalog: Catalog) -> Self {
        Self {
            catalog,
            pipeline: None,
            playback: Playback::new(),
        }
    }

    /// Built-in nodes plus the current pipeline's custom nodes.
    pub fn catalog(&self) -> LayeredCatalog<'_> {
        LayeredCatalog::new(
            &self.catalog,
            self.pipeline.as_ref().and_then(Pipeline::custom_nodes),
        )
    }

    pub fn has_pipeline(&self) -> bool {
        self.pipeline.is_some()
    }

    pub fn try_pipeline(&self) -> Option<&Pipeline> {
        self.pipeline.as_ref()
    }

    /// Panics if no pipeline was created or loaded yet.
    pub fn pipeline(&self) -> &Pipeline {
        match &self.pipeline {
            Some(pipeline) => pipeline,
            None => panic!("no pipeline loaded"),
        }
    }

    /// Panics if no pipeline was created or loaded yet.
    pub fn pipeline_mut(&mut self) -> &mut Pipeline {
        match &mut self.pipeline {
            Some(pipeline) => pipeline,
            None => panic!("no pipeline loaded"),
        }
    }

    // --- Pipeline lifecycle ---

    pub fn new_pipeline(&mut self) -> &Pipeline {
        self.commit(Pipeline::new())
    }

    pub fn load_pipeline(&mut self, path: &Path) -> StudioResult<&Pipeline> {
        info!("loading pipeline from {}", path.display());
        let mut scratch = load_pipeline_from_yaml(path)?;
        let custom = Catalog::discover_custom(scratch.parent_dir())?;
        scratch.set_custom_nodes(custom);
        Ok(self.commit(scratch))
    }

    /// Loads from text; `path` becomes the pipeline's file path and is
    /// where custom nodes are looked up.
    pub fn load_pipeline_str(&mut self, yaml: &str, path: &Path) -> StudioResult<&Pipeline> {
        let mut scratch = load_pipeline_from_str(yaml, path)?;
        scratch.set_filepath(path);
        let custom = Catalog::discover_custom(scratch.parent_dir())?;
        scratch.set_custom_nodes(custom);
        Ok(self.commit(scratch))
    }

    fn commit(&mut self, pipeline: Pipeline) -> &Pipeline {
        debug!(
            nodes = pipeline.len(),
            custom_nodes = pipeline.has_custom_nodes(),
            "switching pipeline"
        );
        self.playback.reset();
        self.pipeline.insert(pipeline)
    }

    /// Saves to `path`, or to the pipeline's own path when `None`.
    pub fn save_pipeline(&mut self, path: Option<&Path>) -> StudioResult<PathBuf> {
        let pipeline = self.pipeline_mut();
        let target = path.map_or_else(|| pipeline.filepath().to_path_buf(), Path::to_path_buf);
        save_pipeline_to_yaml(pipeline, &target)?;
        info!("saved pipeline to {}", target.display());
        Ok(target)
    }

    // --- Config ---

    pub fn effective_config(&self, id: NodeId) -> StudioResult<EffectiveConfig> {
        let node = self.pipeline().get_by_id(id);
        effective_config(&self.catalog(), node)
    }

    /// Sets `key` from text typed by the user. A value equal to the
    /// default removes the override instead.
    pub fn set_config_text(
        &mut self,
        id: NodeId,
        key: &str,
        text: &str,
    ) -> StudioResult<ConfigEdit> {
        self.set_config_value(id, key, ConfigValue::parse_literal(text))
    }

    pub fn set_config_value(
        &mut self,
        id: NodeId,
        key: &str,
        value: ConfigValue,
    ) -> StudioResult<ConfigEdit> {
        let edit = {
            let title = self.pipeline().get_by_id(id).title();
            resolve_edit(&self.catalog(), title, key, value)?
        };
        match &edit {
            ConfigEdit::Set(value) => self.pipeline_mut().set_override(id, key, value.clone()),
            ConfigEdit::Reset => self.reset_config(id, key),
        }
        Ok(edit)
    }

    pub fn reset_config(&mut self, id: NodeId, key: &str) {
        let pipeline = self.pipeline_mut();
        if pipeline.get_by_id(id).override_value(key).is_some() {
            pipeline.pop_override(id, key);
        }
    }

    pub fn node_types(&self) -> Vec<String> {
        self.catalog().node_types()
    }

    pub fn node_titles(&self, node_type: &str) -> Vec<String> {
        self.catalog().node_titles(node_type)
    }

    pub fn verify(&self) -> Vec<PipelineIssue> {
        Verifier::new().verify(self.pipeline(), &self.catalog())
    }

    // --- Playback ---

    pub fn play<R: PipelineRunner + ?Sized>(
        &mut self,
        runner: &mut R,
    ) -> StudioResult<PlayOutcome> {
        let pipeline = match &mut self.pipeline {
            Some(pipeline) => pipeline,
            None => panic!("no pipeline loaded"),
        };
        self.playback.play(pipeline, runner)
    }

    pub fn playback(&self) -> &Playback {
        &self.playback
    }
}
