use serde_yaml::Value as YamlValue;
use std::fs;
use std::path::Path;

use crate::compiler::core::PipelineParser;
use crate::dsl::PipelineDescription;
use crate::error::{StudioError, StudioResult};
use crate::model::pipeline::Pipeline;

/// Reads and parses a pipeline file. The returned pipeline carries the
/// file path but no custom node catalog.
pub fn load_pipeline_from_yaml(file_path: &Path) -> StudioResult<Pipeline> {
    let yaml_content = fs::read_to_string(file_path).map_err(|source| StudioError::Io {
        path: file_path.to_path_buf(),
        source,
    })?;
    let mut pipeline = load_pipeline_from_str(&yaml_content, file_path)?;
    pipeline.set_filepath(file_path);
    Ok(pipeline)
}

/// `origin` is only used in error messages.
pub fn load_pipeline_from_str(yaml_content: &str, origin: &Path) -> StudioResult<Pipeline> {
    let document: YamlValue =
        serde_yaml::from_str(yaml_content).map_err(|source| StudioError::Yaml {
            path: origin.to_path_buf(),
            source,
        })?;
    Ok(PipelineParser::new().parse_value(document)?)
}

pub fn save_description_to_yaml(
    description: &PipelineDescription,
    file_path: &Path,
) -> StudioResult<()> {
    let yaml = description.to_yaml()?;
    fs::write(file_path, yaml).map_err(|source| StudioError::Io {
        path: file_path.to_path_buf(),
        source,
    })
}

/// Writes the pipeline and points it at the new location.
pub fn save_pipeline_to_yaml(pipeline: &mut Pipeline, file_path: &Path) -> StudioResult<()> {
    save_description_to_yaml(&pipeline.to_description(), file_path)?;
    pipeline.set_filepath(file_path);
    Ok(())
}
