use duck_studio::compiler::core::PipelineParser;
use duck_studio::config::value::ConfigValue;
use duck_studio::dsl::NodeEntry;
use duck_studio::dsl::builder::PipelineBuilder;
use duck_studio::model::pipeline::PLACEHOLDER_NODE;
use duck_studio::{Direction, NodeId, NodeRecord, Pipeline};

fn sample_pipeline() -> Pipeline {
    let description = PipelineBuilder::new()
        .node("input.visual")
        .configured("model.yolo")
            .param("model_type", "v4")
            .build()
        .node("draw.bbox")
        .node("output.screen")
        .build();
    PipelineParser::new().parse(description)
}

fn titles(pipeline: &Pipeline) -> Vec<String> {
    pipeline.iter().map(|n| n.title().to_string()).collect()
}

#[test]
fn test_insert_then_move_to_front() {
    let mut pipeline = sample_pipeline();
    assert_eq!(pipeline.len(), 4);

    let yolo = pipeline.get_by_index(1);
    assert_eq!(yolo.title(), "model.yolo");
    let overrides: Vec<_> = yolo.overrides().iter().collect();
    assert_eq!(overrides, vec![("model_type", &ConfigValue::from("v4"))]);

    let before: Vec<NodeId> = pipeline.ids().collect();
    let new_id = pipeline.insert(4);
    assert_eq!(pipeline.len(), 5);
    let placeholder = pipeline.get_by_index(4);
    assert_eq!(placeholder.id(), new_id);
    assert_eq!(placeholder.title(), PLACEHOLDER_NODE);
    assert!(!placeholder.has_overrides());

    for _ in 0..4 {
        pipeline.move_node(new_id, Direction::Up);
        assert!(pipeline.is_consistent());
    }
    assert_eq!(pipeline.position(new_id), 0);
    for (old_pos, id) in before.iter().enumerate() {
        assert_eq!(pipeline.position(*id), old_pos + 1);
    }
}

#[test]
fn test_delete_first_keeps_order() {
    let mut pipeline = sample_pipeline();
    let first = pipeline.get_by_index(0).id();

    let removed = pipeline.delete(0);
    assert_eq!(removed.id(), first);
    assert_eq!(removed.title(), "input.visual");
    assert_eq!(pipeline.len(), 3);
    assert_eq!(titles(&pipeline), vec!["model.yolo", "draw.bbox", "output.screen"]);
    assert!(!pipeline.contains(first));
    assert_eq!(pipeline.position_of(first), None);
    assert!(pipeline.is_consistent());
}

#[test]
fn test_delete_middle_and_last() {
    let mut pipeline = sample_pipeline();
    pipeline.delete(3);
    pipeline.delete(1);
    assert_eq!(titles(&pipeline), vec!["input.visual", "draw.bbox"]);
    assert!(pipeline.is_consistent());

    pipeline.delete(0);
    pipeline.delete(0);
    assert!(pipeline.is_empty());
    assert!(pipeline.is_consistent());
}

#[test]
fn test_move_keeps_identities() {
    let mut pipeline = sample_pipeline();
    let ids: Vec<NodeId> = pipeline.ids().collect();

    pipeline.move_down(ids[0]);
    pipeline.move_down(ids[0]);
    pipeline.move_up(ids[3]);

    let mut after: Vec<NodeId> = pipeline.ids().collect();
    assert_eq!(after, vec![ids[1], ids[2], ids[3], ids[0]]);
    after.sort_by_key(|id| id.as_uuid());
    let mut sorted = ids.clone();
    sorted.sort_by_key(|id| id.as_uuid());
    assert_eq!(after, sorted);
    assert_eq!(pipeline.get_by_id(ids[1]).title(), "model.yolo");
}

#[test]
fn test_move_at_boundary_marks_dirty() {
    let mut pipeline = sample_pipeline();
    let first = pipeline.get_by_index(0).id();
    let order: Vec<NodeId> = pipeline.ids().collect();

    pipeline.move_node(first, Direction::Up);
    assert_eq!(pipeline.ids().collect::<Vec<_>>(), order);
    assert!(pipeline.is_dirty());
}

#[test]
fn test_replace_returns_old_record() {
    let mut pipeline = sample_pipeline();
    let old_id = pipeline.get_by_index(2).id();

    let new_node = NodeRecord::new("draw.poses");
    let new_id = new_node.id();
    let old = pipeline.replace(2, new_node);

    assert_eq!(old.id(), old_id);
    assert_eq!(old.title(), "draw.bbox");
    assert_eq!(pipeline.position(new_id), 2);
    assert!(!pipeline.contains(old_id));
    assert!(pipeline.is_consistent());
}

#[test]
fn test_swap_node_type_drops_overrides() {
    let mut pipeline = sample_pipeline();
    let id = pipeline.swap_node_type(1, "model.posenet");
    let node = pipeline.get_by_id(id);
    assert_eq!(node.title(), "model.posenet");
    assert!(!node.has_overrides());
}

#[test]
#[should_panic(expected = "already in the pipeline")]
fn test_replace_with_present_node_panics() {
    let mut pipeline = sample_pipeline();
    let duplicate = pipeline.get_by_index(0).clone();
    pipeline.replace(1, duplicate);
}

#[test]
#[should_panic(expected = "out of range")]
fn test_delete_out_of_range_panics() {
    let mut pipeline = sample_pipeline();
    pipeline.delete(4);
}

#[test]
fn test_override_round_trip_to_bare_title() {
    let mut pipeline = sample_pipeline();
    let id = pipeline.get_by_index(2).id();
    assert_eq!(pipeline.to_description().nodes[2], NodeEntry::Bare("draw.bbox".into()));

    pipeline.set_override(id, "thickness", 3.into());
    assert_eq!(
        pipeline.to_description().nodes[2],
        NodeEntry::Configured {
            title: "draw.bbox".into(),
            config: vec![("thickness".into(), ConfigValue::Int(3))],
        }
    );

    assert_eq!(pipeline.pop_override(id, "thickness"), Some(ConfigValue::Int(3)));
    assert_eq!(pipeline.to_description().nodes[2], NodeEntry::Bare("draw.bbox".into()));
}

#[test]
fn test_set_override_is_idempotent() {
    let mut once = sample_pipeline();
    let id = once.get_by_index(1).id();
    once.set_override(id, "score_threshold", 0.3.into());

    let mut twice = once.clone();
    twice.set_override(id, "score_threshold", 0.3.into());

    assert_eq!(once.get_by_id(id).overrides(), twice.get_by_id(id).overrides());
    assert_eq!(once.to_description(), twice.to_description());
}

#[test]
fn test_description_serializes_like_pipeline_file() {
    let pipeline = sample_pipeline();
    let yaml = pipeline.to_description().to_yaml().unwrap();
    assert_eq!(
        yaml,
        "nodes:\n- input.visual\n- model.yolo:\n    model_type: v4\n- draw.bbox\n- output.screen\n"
    );

    let json = pipeline.to_description().to_json().unwrap();
    let expected = concat!(
        r#"{"nodes":["input.visual",{"model.yolo":{"model_type":"v4"}},"#,
        r#""draw.bbox","output.screen"]}"#
    );
    assert_eq!(json, expected);
}
