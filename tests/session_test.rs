use anyhow::bail;
use duck_studio::config::catalog::{CUSTOM_NODES_CONFIG_DIR, Catalog};
use duck_studio::config::resolver::ConfigEdit;
use duck_studio::config::value::ConfigValue;
use duck_studio::dsl::PipelineDescription;
use duck_studio::runtime::playback::{PipelineRunner, PlayOutcome};
use duck_studio::{Studio, StudioError};
use std::fs;
use std::path::Path;

#[derive(Default)]
struct RecordingRunner {
    runs: Vec<PipelineDescription>,
    fail: bool,
}

impl PipelineRunner for RecordingRunner {
    fn run(&mut self, description: &PipelineDescription) -> anyhow::Result<()> {
        if self.fail {
            bail!("camera not found");
        }
        self.runs.push(description.clone());
        Ok(())
    }
}

fn studio() -> Studio {
    Studio::new(
        Catalog::new()
            .with_node("input.visual", vec![("source".into(), 0.into())])
            .with_node(
                "model.posenet",
                vec![
                    ("model_type".into(), "resnet".into()),
                    ("score_threshold".into(), 0.4.into()),
                ],
            )
            .with_node("draw.poses", vec![("keypoint_dot_radius".into(), 5.into())])
            .with_node("output.screen", vec![("window_name".into(), "PeekingDuck".into())]),
    )
}

#[test]
fn test_failed_load_keeps_current_pipeline() {
    let mut studio = studio();
    assert!(!studio.has_pipeline());
    studio.new_pipeline();
    let ids: Vec<_> = studio.pipeline().ids().collect();

    let err = studio
        .load_pipeline_str("nodes:\n- input.visual\n- [oops]\n", Path::new("bad.yml"))
        .unwrap_err();
    assert!(matches!(err, StudioError::Parse(_)));
    assert_eq!(studio.pipeline().ids().collect::<Vec<_>>(), ids);

    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let err = studio.load_pipeline(&temp_dir.path().join("absent.yml")).unwrap_err();
    assert!(matches!(err, StudioError::Io { .. }));
    assert_eq!(studio.pipeline().ids().collect::<Vec<_>>(), ids);
}

#[test]
fn test_broken_custom_nodes_abort_load() {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let custom_type_dir = temp_dir.path().join(CUSTOM_NODES_CONFIG_DIR).join("dabble");
    fs::create_dir_all(&custom_type_dir).unwrap();
    fs::write(custom_type_dir.join("counter.yml"), "just a string").unwrap();
    let file = temp_dir.path().join("pipeline_config.yml");
    fs::write(&file, "nodes:\n- input.visual\n- custom_nodes.dabble.counter\n").unwrap();

    let mut studio = studio();
    let err = studio.load_pipeline(&file).unwrap_err();
    assert!(matches!(err, StudioError::Catalog { .. }));
    assert!(!studio.has_pipeline());
}

#[test]
fn test_load_with_custom_nodes() {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let custom_type_dir = temp_dir.path().join(CUSTOM_NODES_CONFIG_DIR).join("dabble");
    fs::create_dir_all(&custom_type_dir).unwrap();
    fs::write(custom_type_dir.join("counter.yml"), "limit: 10\n").unwrap();
    let file = temp_dir.path().join("pipeline_config.yml");
    fs::write(&file, "nodes:\n- input.visual\n- custom_nodes.dabble.counter\n").unwrap();

    let mut studio = studio();
    studio.load_pipeline(&file).unwrap();
    assert!(studio.pipeline().has_custom_nodes());
    assert!(studio.node_titles("dabble").contains(&"custom_nodes.dabble.counter".to_string()));

    let counter = studio.pipeline().get_by_index(1).id();
    assert_eq!(
        studio.set_config_text(counter, "limit", "25").unwrap(),
        ConfigEdit::Set(ConfigValue::Int(25))
    );
    let config = studio.effective_config(counter).unwrap();
    assert_eq!(config.value("limit"), Some(&ConfigValue::Int(25)));
}

#[test]
fn test_config_edits_through_studio() {
    let mut studio = studio();
    studio.new_pipeline();
    let posenet = studio.pipeline().get_by_index(1).id();

    studio.set_config_text(posenet, "score_threshold", "0.6").unwrap();
    assert_eq!(
        studio.pipeline().get_by_id(posenet).override_value("score_threshold"),
        Some(&ConfigValue::Float(0.6))
    );

    assert_eq!(
        studio.set_config_text(posenet, "score_threshold", "0.4").unwrap(),
        ConfigEdit::Reset
    );
    assert!(!studio.pipeline().get_by_id(posenet).has_overrides());

    let err = studio.set_config_text(posenet, "score_threshold", "high").unwrap_err();
    assert!(matches!(err, StudioError::TypeMismatch { .. }));
    assert!(!studio.pipeline().get_by_id(posenet).has_overrides());

    studio.set_config_value(posenet, "model_type", "mobilenet".into()).unwrap();
    studio.reset_config(posenet, "model_type");
    studio.reset_config(posenet, "model_type");
    assert!(!studio.pipeline().get_by_id(posenet).has_overrides());
}

#[test]
fn test_numeric_source_stays_numeric() {
    let mut studio = Studio::new(Catalog::new().with_node(
        "input.visual",
        vec![("source".into(), "https://example.com/video.mp4".into())],
    ));
    studio
        .load_pipeline_str("nodes:\n- input.visual\n", Path::new("webcam.yml"))
        .unwrap();
    let input = studio.pipeline().get_by_index(0).id();

    assert_eq!(
        studio.set_config_text(input, "source", "0").unwrap(),
        ConfigEdit::Set(ConfigValue::Int(0))
    );
    assert_eq!(
        studio.pipeline().to_description().to_json().unwrap(),
        r#"{"nodes":[{"input.visual":{"source":0}}]}"#
    );

    studio.set_config_text(input, "source", "videos/clip.mp4").unwrap();
    assert_eq!(
        studio.pipeline().get_by_id(input).override_value("source"),
        Some(&ConfigValue::from("videos/clip.mp4"))
    );
}

#[test]
fn test_save_to_own_path() {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let file = temp_dir.path().join("demo.yml");
    fs::write(&file, "nodes:\n- input.visual\n- output.screen\n").unwrap();

    let mut studio = studio();
    studio.load_pipeline(&file).unwrap();
    let screen = studio.pipeline().get_by_index(1).id();
    studio.set_config_text(screen, "window_name", "Demo").unwrap();

    let saved = studio.save_pipeline(None).unwrap();
    assert_eq!(saved, file);
    assert_eq!(
        fs::read_to_string(&file).unwrap(),
        "nodes:\n- input.visual\n- output.screen:\n    window_name: Demo\n"
    );
}

#[test]
fn test_play_replays_until_edited() {
    let mut studio = studio();
    studio.new_pipeline();
    let mut runner = RecordingRunner::default();

    assert_eq!(studio.play(&mut runner).unwrap(), PlayOutcome::Executed);
    assert!(!studio.pipeline().is_dirty());
    assert_eq!(studio.play(&mut runner).unwrap(), PlayOutcome::Replayed);
    assert_eq!(runner.runs.len(), 1);
    assert_eq!(studio.playback().last_run(), Some(&runner.runs[0]));

    let first = studio.pipeline().get_by_index(0).id();
    studio.pipeline_mut().move_down(first);
    assert!(studio.pipeline().is_dirty());
    assert_eq!(studio.play(&mut runner).unwrap(), PlayOutcome::Executed);
    assert_eq!(runner.runs.len(), 2);
    assert_eq!(runner.runs[1].nodes[0].title(), "model.posenet");
}

#[test]
fn test_failed_run_stays_dirty() {
    let mut studio = studio();
    studio.new_pipeline();
    let mut runner = RecordingRunner {
        fail: true,
        ..Default::default()
    };

    let err = studio.play(&mut runner).unwrap_err();
    assert!(matches!(err, StudioError::Execution(_)));
    assert!(err.to_string().contains("failed to run pipeline"));
    assert!(studio.pipeline().is_dirty());
    assert!(studio.playback().last_run().is_none());
}

#[test]
fn test_loading_forgets_last_run() {
    let mut studio = studio();
    studio.new_pipeline();
    let mut runner = RecordingRunner::default();
    studio.play(&mut runner).unwrap();

    studio
        .load_pipeline_str("nodes:\n- input.visual\n", Path::new("other.yml"))
        .unwrap();
    assert!(studio.playback().last_run().is_none());
    assert_eq!(studio.play(&mut runner).unwrap(), PlayOutcome::Executed);
}

#[test]
#[should_panic(expected = "no pipeline loaded")]
fn test_pipeline_before_load_panics() {
    studio().pipeline();
}
