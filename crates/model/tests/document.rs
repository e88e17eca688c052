//! Integration tests for revival, navigation, editing and serialization
//! of study documents.

use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use serde_json::{json, Value};
use studyconf_model::{
    revive, ChangeEvent, Document, ModelError, NotificationBus, Reviver, STUDY_SCHEMA,
};

fn workspace_root() -> PathBuf {
    let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));
    manifest_dir
        .parent()
        .and_then(|p| p.parent())
        .expect("workspace root")
        .to_path_buf()
}

fn load_fixture(name: &str) -> Value {
    let path = workspace_root().join("fixtures").join(name);
    let text = std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("cannot read {}: {}", path.display(), e));
    serde_json::from_str(&text).expect("fixture is valid JSON")
}

fn study() -> Document {
    revive(&load_fixture("study_v119.json")).expect("fixture revives")
}

fn recorder(bus: &NotificationBus) -> Rc<RefCell<Vec<ChangeEvent>>> {
    let events = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&events);
    bus.subscribe(move |event| sink.borrow_mut().push(event.clone()))
        .expect("bus is unlocked");
    events
}

// ──────────────────────────────────────────────
// Revival and serialization
// ──────────────────────────────────────────────

#[test]
fn round_trip_preserves_the_plain_document() {
    let plain = load_fixture("study_v119.json");
    let document = revive(&plain).unwrap();
    assert_eq!(document.serialize(), plain);
}

#[test]
fn round_trip_keeps_absent_slots_absent() {
    let plain = json!({
        "className": "Study",
        "id": "MINI",
        "configVersion": 119,
        "menus": [{"className": "Menu", "id": "HOME"}]
    });
    let document = revive(&plain).unwrap();
    assert_eq!(document.serialize(), plain);
}

#[test]
fn round_trip_keeps_null_slots_null() {
    let plain = json!({
        "className": "Study",
        "id": "MINI",
        "configVersion": 119,
        "menus": null,
        "formModels": []
    });
    let mut document = revive(&plain).unwrap();
    assert_eq!(document.serialize(), plain);

    let root = document.root();
    document
        .add_child(root, "menus", &json!({"className": "Menu", "id": "HOME"}))
        .unwrap();
    assert_eq!(
        document.serialize()["menus"],
        json!([{"className": "Menu", "id": "HOME"}])
    );
}

#[test]
fn global_ids_follow_the_tree() {
    let document = study();
    for global_id in [
        "Study:TEST",
        "Study:TEST|ScopeModel:PATIENT",
        "Study:TEST|ScopeModel:PATIENT|Rule-0:INIT",
        "Study:TEST|ScopeModel:PATIENT|Rule-0:INIT|RuleAction:#0",
        "Study:TEST|ScopeModel:PATIENT|Rule-1:ON_DELETE",
        "Study:TEST|FormModel:F1|Layout:MAIN|Line:#0|Cell:#0",
        "Study:TEST|DatasetModel:DEMOGRAPHICS|FieldModel:SEX|PossibleValue:F",
    ] {
        let node = document.get_node(global_id).unwrap();
        assert_eq!(node.global_id(), global_id);
    }
}

#[test]
fn parent_links_are_assigned() {
    let document = study();
    let field = document
        .node_id("Study:TEST|DatasetModel:DEMOGRAPHICS|FieldModel:SEX")
        .unwrap();
    let dataset = document.node(field).parent().unwrap();
    assert_eq!(document.node(dataset).id(), Some("DEMOGRAPHICS"));
    assert_eq!(
        document.ancestor_of_type(field, "Study"),
        Some(document.root())
    );
    assert_eq!(document.path(field).len(), 3);
}

#[test]
fn missing_global_id_is_not_found() {
    let document = study();
    let err = document.get_node("Study:TEST|FormModel:F9").unwrap_err();
    assert_eq!(
        err,
        ModelError::NotFound {
            global_id: "Study:TEST|FormModel:F9".to_string()
        }
    );
}

#[test]
fn duplicate_sibling_ids_fail_revival() {
    let err = revive(&json!({
        "className": "Study",
        "id": "TEST",
        "formModels": [
            {"className": "FormModel", "id": "F1"},
            {"className": "FormModel", "id": "F1"}
        ]
    }))
    .unwrap_err();
    assert_eq!(
        err,
        ModelError::DuplicateId {
            entity: "FormModel".to_string(),
            id: "F1".to_string(),
            parent: "Study:TEST".to_string(),
        }
    );
}

#[test]
fn numeric_ids_do_not_clash_with_positional_keys() {
    let document = revive(&json!({
        "className": "Study",
        "id": "TEST",
        "menus": [
            {"className": "Menu", "id": "1"},
            {"className": "Menu"}
        ]
    }))
    .unwrap();
    let numbered = document.get_node("Study:TEST|Menu:1").unwrap();
    assert_eq!(numbered.id(), Some("1"));
    let unnamed = document.get_node("Study:TEST|Menu:#1").unwrap();
    assert_eq!(unnamed.id(), None);
}

#[test]
fn same_id_in_different_rule_slots_is_allowed() {
    let document = revive(&json!({
        "className": "Study",
        "id": "TEST",
        "scopeModels": [{
            "className": "ScopeModel",
            "id": "PATIENT",
            "createRules": [{"className": "Rule", "id": "R"}],
            "removeRules": [{"className": "Rule", "id": "R"}]
        }]
    }))
    .unwrap();
    assert!(document.find("Study:TEST|ScopeModel:PATIENT|Rule-0:R").is_some());
    assert!(document.find("Study:TEST|ScopeModel:PATIENT|Rule-1:R").is_some());
}

#[test]
fn children_must_match_their_relation() {
    let err = revive(&json!({
        "className": "Study",
        "id": "TEST",
        "formModels": [{"className": "Menu", "id": "M"}]
    }))
    .unwrap_err();
    assert!(matches!(err, ModelError::TypeMismatch { expected: "FormModel", .. }));

    let err = revive(&json!({
        "className": "Study",
        "id": "TEST",
        "formModels": [{"id": "F1"}]
    }))
    .unwrap_err();
    assert!(matches!(err, ModelError::MissingEntityTag { .. }));

    let err = revive(&json!({
        "className": "Study",
        "id": "TEST",
        "formModels": [{"className": "Unheard", "id": "F1"}]
    }))
    .unwrap_err();
    assert_eq!(
        err,
        ModelError::UnknownEntity {
            entity: "Unheard".to_string()
        }
    );
}

#[test]
fn bulk_revival_does_not_notify_and_releases_the_bus() {
    let bus = Rc::new(NotificationBus::new());
    let events = recorder(&bus);
    let document = Reviver::new(&STUDY_SCHEMA)
        .with_bus(Rc::clone(&bus))
        .revive(&load_fixture("study_v119.json"))
        .unwrap();
    assert!(events.borrow().is_empty());
    assert!(bus.is_enabled());
    assert!(document.node_count() > 20);
}

#[test]
fn failed_revival_releases_the_bus() {
    let bus = Rc::new(NotificationBus::new());
    let result = Reviver::new(&STUDY_SCHEMA)
        .with_bus(Rc::clone(&bus))
        .revive(&json!({
            "className": "Study",
            "id": "TEST",
            "configVersion": "not a number",
            "formModels": [{"className": "FormModel", "id": "F1", "layouts": 3}]
        }));
    assert!(result.is_err());
    assert!(bus.is_enabled());
    assert!(!bus.is_locked());
    assert!(bus.subscribe(|_| {}).is_ok());
}

#[test]
fn interactive_revival_notifies_each_node() {
    let bus = Rc::new(NotificationBus::new());
    let events = recorder(&bus);
    Reviver::new(&STUDY_SCHEMA)
        .with_bus(Rc::clone(&bus))
        .bulk(false)
        .revive(&json!({
            "className": "Study",
            "id": "TEST",
            "formModels": [{"className": "FormModel", "id": "F1"}]
        }))
        .unwrap();
    assert_eq!(events.borrow().len(), 2);
}

#[test]
fn static_nodes_are_injected_but_not_serialized() {
    let plain = load_fixture("study_v119.json");
    let document = Reviver::new(&STUDY_SCHEMA)
        .with_static_nodes(true)
        .revive(&plain)
        .unwrap();
    let english = document.get_node("Study:TEST|Language:en").unwrap();
    assert!(english.is_static());
    assert!(document.find("Study:TEST|Feature:EXPORT").is_some());
    assert_eq!(document.serialize(), plain);
}

// ──────────────────────────────────────────────
// Navigation
// ──────────────────────────────────────────────

#[test]
fn sorted_children_use_sort_keys() {
    let document = study();
    let patient = document.node_id("Study:TEST|ScopeModel:PATIENT").unwrap();
    let declared: Vec<_> = document
        .children_of(patient, "EventModel")
        .into_iter()
        .map(|id| document.node(id).id().unwrap_or_default().to_string())
        .collect();
    assert_eq!(declared, vec!["FOLLOW_UP", "BASELINE"]);

    let sorted: Vec<_> = document
        .sorted_children(patient, "EventModel")
        .into_iter()
        .map(|id| document.node(id).id().unwrap_or_default().to_string())
        .collect();
    assert_eq!(sorted, vec!["BASELINE", "FOLLOW_UP"]);
}

#[test]
fn same_entity_across_documents() {
    let a = study();
    let b = study();
    let field_a = a
        .node_id("Study:TEST|DatasetModel:DEMOGRAPHICS|FieldModel:SEX")
        .unwrap();
    let field_b = b
        .node_id("Study:TEST|DatasetModel:DEMOGRAPHICS|FieldModel:SEX")
        .unwrap();
    let other_b = b
        .node_id("Study:TEST|DatasetModel:DEMOGRAPHICS|FieldModel:BIRTH_DATE")
        .unwrap();
    assert!(Document::same_entity(&a, field_a, &b, field_b));
    assert!(!Document::same_entity(&a, field_a, &b, other_b));
}

#[test]
fn descendants_are_pre_order() {
    let document = study();
    let form = document.node_id("Study:TEST|FormModel:F1").unwrap();
    let ids: Vec<_> = document
        .descendants(form)
        .into_iter()
        .map(|id| document.node(id).global_id().to_string())
        .collect();
    assert_eq!(
        ids,
        vec![
            "Study:TEST|FormModel:F1|Layout:MAIN",
            "Study:TEST|FormModel:F1|Layout:MAIN|Line:#0",
            "Study:TEST|FormModel:F1|Layout:MAIN|Line:#0|Cell:#0",
        ]
    );
}

#[test]
fn config_version_is_read_from_the_root() {
    assert_eq!(study().config_version(), Some(119));
}

// ──────────────────────────────────────────────
// Editing
// ──────────────────────────────────────────────

#[test]
fn renaming_reindexes_the_subtree() {
    let mut document = study();
    let events = recorder(document.bus());
    let form = document.node_id("Study:TEST|FormModel:F1").unwrap();
    document.set_property(form, "id", json!("FORM_1")).unwrap();

    assert!(document.find("Study:TEST|FormModel:F1").is_none());
    assert!(document
        .find("Study:TEST|FormModel:FORM_1|Layout:MAIN|Line:#0|Cell:#0")
        .is_some());
    assert_eq!(
        *events.borrow(),
        vec![ChangeEvent::PropertyChanged {
            global_id: "Study:TEST|FormModel:FORM_1".to_string(),
            property: "id".to_string(),
            old_value: json!("F1"),
            new_value: json!("FORM_1"),
        }]
    );
}

#[test]
fn renaming_onto_a_sibling_fails() {
    let mut document = study();
    let form = document.node_id("Study:TEST|FormModel:F1").unwrap();
    let err = document.set_property(form, "id", json!("F2")).unwrap_err();
    assert!(matches!(err, ModelError::DuplicateId { .. }));
    assert_eq!(document.node(form).id(), Some("F1"));
}

#[test]
fn set_property_checks_declarations() {
    let mut document = study();
    let root = document.root();
    assert!(matches!(
        document.set_property(root, "colour", json!("red")),
        Err(ModelError::UnknownProperty { .. })
    ));
    assert!(matches!(
        document.set_property(root, "languageIds", json!("en")),
        Err(ModelError::TypeMismatch { .. })
    ));
}

#[test]
fn add_and_remove_children() {
    let mut document = study();
    let events = recorder(document.bus());
    let root = document.root();
    let before = document.node_count();

    let form = document
        .add_child(
            root,
            "formModels",
            &json!({"className": "FormModel", "id": "F3", "layouts": []}),
        )
        .unwrap();
    assert_eq!(document.node(form).global_id(), "Study:TEST|FormModel:F3");
    assert_eq!(document.node_count(), before + 1);

    document.remove_child(form).unwrap();
    assert!(document.find("Study:TEST|FormModel:F3").is_none());
    assert_eq!(document.node_count(), before);

    let kinds: Vec<_> = events
        .borrow()
        .iter()
        .map(|e| match e {
            ChangeEvent::NodeCreated { .. } => "created",
            ChangeEvent::ChildAdded { .. } => "added",
            ChangeEvent::ChildRemoved { .. } => "removed",
            ChangeEvent::PropertyChanged { .. } => "changed",
        })
        .collect();
    assert_eq!(kinds, vec!["created", "added", "removed"]);
}

#[test]
fn removing_shifts_positional_siblings() {
    let mut document = revive(&json!({
        "className": "Study",
        "id": "TEST",
        "formModels": [{
            "className": "FormModel",
            "id": "F1",
            "layouts": [{
                "className": "Layout",
                "id": "MAIN",
                "lines": [
                    {"className": "Line", "displayLabel": "first"},
                    {"className": "Line", "displayLabel": "second"}
                ]
            }]
        }]
    }))
    .unwrap();
    let first = document
        .node_id("Study:TEST|FormModel:F1|Layout:MAIN|Line:#0")
        .unwrap();
    document.remove_child(first).unwrap();
    let line = document
        .get_node("Study:TEST|FormModel:F1|Layout:MAIN|Line:#0")
        .unwrap();
    assert_eq!(line.property("displayLabel"), Some(&json!("second")));
    assert!(document
        .find("Study:TEST|FormModel:F1|Layout:MAIN|Line:#1")
        .is_none());
}

#[test]
fn failed_add_child_leaves_the_document_untouched() {
    let mut document = study();
    let root = document.root();
    let before = document.serialize();
    let err = document
        .add_child(
            root,
            "formModels",
            &json!({
                "className": "FormModel",
                "id": "F3",
                "layouts": [{"className": "Line"}]
            }),
        )
        .unwrap_err();
    assert!(matches!(err, ModelError::TypeMismatch { .. }));
    assert!(document.find("Study:TEST|FormModel:F3").is_none());
    assert_eq!(document.serialize(), before);
}

#[test]
fn root_cannot_be_removed() {
    let mut document = study();
    let root = document.root();
    assert_eq!(document.remove_child(root), Err(ModelError::RootRemoval));
}

#[test]
fn single_slots_hold_one_child() {
    let mut document = study();
    let rule = document
        .node_id("Study:TEST|ScopeModel:PATIENT|Rule-1:ON_DELETE")
        .unwrap();
    let constraint = json!({"className": "RuleConstraint", "conditions": {}});
    document.add_child(rule, "constraint", &constraint).unwrap();
    assert!(matches!(
        document.add_child(rule, "constraint", &constraint),
        Err(ModelError::SlotOccupied { .. })
    ));
    let plain = document.serialize_node(rule);
    assert_eq!(plain["constraint"]["className"], json!("RuleConstraint"));
}
