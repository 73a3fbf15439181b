//! Round-trip tests: session -> document -> session.

use serde_json::json;

use crate::format::{MemoryBackend, SessionBackend, TaskKey, decode, encode, from_json, to_json};
use crate::model::{BoxGeometry, LabelShape, LabelTemplate};
use crate::state::{DeletePolicy, Session};

/// A session with a composite label, a three-item track and a deleted label.
fn create_comprehensive_session() -> Session {
    let mut session = Session::new("traffic");
    session.task_index = 4;
    session.categories = json!({"vehicle/car": {"color": "red"}});
    session.ip_info = json!({"country": "NO"});
    session.user_agent = "unit-test".to_string();
    for i in 0..3 {
        session.add_item(format!("frames/{:03}.jpg", i));
    }

    let car = LabelTemplate::new("vehicle/car").with_attribute("occluded", false);
    let shape = |x: f32| Some(LabelShape::Box(BoxGeometry::new(x, 10.0, 50.0, 40.0)));

    let first = session.create_label_on(0, &car, shape(10.0)).unwrap();
    let second = session.propagate_track(first, 1).unwrap();
    session.propagate_track(second, 2).unwrap();

    let light = session
        .create_label_on(0, &LabelTemplate::new("light"), None)
        .unwrap();
    let color = session
        .create_label_on(0, &LabelTemplate::new("light/color"), shape(100.0))
        .unwrap();
    session.set_parent(color, light).unwrap();

    let scratch = session
        .create_label_on(1, &LabelTemplate::new("vehicle/bus"), shape(60.0))
        .unwrap();
    session.delete_label(scratch, DeletePolicy::Full).unwrap();

    session
}

#[test]
fn test_graph_survives_round_trip() {
    let original = create_comprehensive_session();
    let json = to_json(&original).unwrap();
    let restored = from_json(&json).unwrap();

    let ids = |s: &Session| s.labels().map(|l| l.id).collect::<Vec<_>>();
    assert_eq!(ids(&restored), ids(&original));

    for label in original.labels() {
        let copy = restored.label(label.id).unwrap();
        assert_eq!(copy.parent, label.parent);
        assert_eq!(copy.children, label.children);
        assert_eq!(copy.previous_label_id, label.previous_label_id);
        assert_eq!(copy.next_label_id, label.next_label_id);
        assert_eq!(copy.item_index, label.item_index);
        assert_eq!(copy.shape, label.shape);
        assert_eq!(copy.attributes, label.attributes);
    }
    for (a, b) in original.items().iter().zip(restored.items()) {
        assert_eq!(a.url, b.url);
        assert_eq!(a.label_refs, b.label_refs);
    }

    assert_eq!(restored.categories, original.categories);
    assert_eq!(restored.ip_info, original.ip_info);
    assert_eq!(restored.user_agent, original.user_agent);
    assert_eq!(restored.task_index, 4);
    assert_eq!(restored.events().len(), original.events().len());
}

#[test]
fn test_second_encode_is_identical() {
    let original = create_comprehensive_session();
    let first = encode(&original);
    let second = encode(&decode(&first).unwrap());
    assert_eq!(first, second);
}

#[test]
fn test_deleted_labels_are_not_written() {
    let session = create_comprehensive_session();
    let doc = encode(&session);

    assert_eq!(doc.labels.len(), session.num_valid_labels());
    assert!(doc.labels.iter().all(|l| l.category_path.as_deref() != Some("vehicle/bus")));
    // The deleted id is still reserved
    assert_eq!(doc.last_label_id, Some(session.last_label_id()));
    let restored = decode(&doc).unwrap();
    assert_eq!(restored.last_label_id(), session.last_label_id());
}

#[test]
fn test_childless_label_omits_children() {
    let session = create_comprehensive_session();
    let json: serde_json::Value = serde_json::from_str(&to_json(&session).unwrap()).unwrap();
    let labels = json["labels"].as_array().unwrap();

    let with_children: Vec<_> = labels
        .iter()
        .filter(|l| l.get("children").is_some())
        .collect();
    assert_eq!(with_children.len(), 1);
    assert_eq!(with_children[0]["categoryPath"], "light");
    assert!(labels.iter().all(|l| l["parent"].is_i64()));
}

#[test]
fn test_load_and_save_through_backend() {
    let backend = MemoryBackend::new();
    let key = TaskKey::new(4, "traffic");
    backend
        .save(&key, &to_json(&create_comprehensive_session()).unwrap())
        .unwrap();

    let mut session = Session::load(&backend, 4, "traffic").unwrap();
    assert_eq!(session.items().len(), 3);
    assert_eq!(session.num_valid_labels(), 5);

    let id = session.labels().next().map(|l| l.id).unwrap();
    session.delete_label(id, DeletePolicy::Full).unwrap();
    assert!(session.has_unsaved_changes());
    session.save(&backend);
    assert!(!session.has_unsaved_changes());

    let reloaded = Session::load(&backend, 4, "traffic").unwrap();
    // The whole three-item track went with it
    assert_eq!(reloaded.num_valid_labels(), 2);
}

#[test]
fn test_load_missing_task_fails() {
    let backend = MemoryBackend::new();
    assert!(Session::load(&backend, 0, "nothing").is_err());
}
