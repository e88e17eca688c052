//! Revival: building a typed [`Document`] from a plain JSON document.
//!
//! Construction is depth-first. Each object names its entity through
//! `className`; declared properties are type-checked and copied, child slots
//! are revived recursively and everything else is dropped. Global ids and
//! parent links are assigned as nodes are attached.

use std::rc::Rc;

use serde_json::{Map, Value};

use crate::bus::NotificationBus;
use crate::document::Document;
use crate::error::ModelError;
use crate::node::{Node, NodeId, SlotLocation};
use crate::registry::{
    EntityDef, EntityRegistry, PropertyDef, PropertyKind, SlotShape, ENTITY_TAG,
};
use crate::schema::STUDY_SCHEMA;
use crate::static_nodes;

/// Configurable entry point for revival.
pub struct Reviver {
    registry: &'static dyn EntityRegistry,
    bus: Rc<NotificationBus>,
    bulk: bool,
    static_nodes: bool,
}

impl Reviver {
    /// A reviver in bulk mode, with a private bus and no static nodes.
    pub fn new(registry: &'static dyn EntityRegistry) -> Self {
        Reviver {
            registry,
            bus: Rc::new(NotificationBus::new()),
            bulk: true,
            static_nodes: false,
        }
    }

    /// Share an existing notification bus with the revived document.
    pub fn with_bus(mut self, bus: Rc<NotificationBus>) -> Self {
        self.bus = bus;
        self
    }

    /// In bulk mode (the default) notifications are suppressed and the bus is
    /// locked while the document is built.
    pub fn bulk(mut self, bulk: bool) -> Self {
        self.bulk = bulk;
        self
    }

    /// Inject the built-in languages and features as static nodes.
    pub fn with_static_nodes(mut self, enabled: bool) -> Self {
        self.static_nodes = enabled;
        self
    }

    pub fn revive(&self, plain: &Value) -> Result<Document, ModelError> {
        let bus = Rc::clone(&self.bus);
        let _suppression = self.bulk.then(|| bus.suppress());

        let root_entity = self.registry.root();
        let object = root_object(root_entity, plain)?;
        let mut document = Document::empty(self.registry, Rc::clone(&self.bus));
        document.root = build_node(&mut document, object, root_entity, None, None)?;
        if self.static_nodes {
            static_nodes::inject(&mut document)?;
        }

        tracing::debug!(
            root = %document.node(document.root).global_id(),
            nodes = document.node_count(),
            "document revived"
        );
        Ok(document)
    }
}

/// Revive a study document with the built-in schema.
pub fn revive(plain: &Value) -> Result<Document, ModelError> {
    Reviver::new(&STUDY_SCHEMA).revive(plain)
}

fn root_object<'a>(
    root: &EntityDef,
    plain: &'a Value,
) -> Result<&'a Map<String, Value>, ModelError> {
    let invalid = |found: String| ModelError::InvalidRoot {
        expected: root.name.to_string(),
        found,
    };
    let object = plain.as_object().ok_or_else(|| invalid(describe_value(plain)))?;
    match object.get(ENTITY_TAG).and_then(Value::as_str) {
        Some(tag) if tag == root.name => Ok(object),
        Some(tag) => Err(invalid(tag.to_string())),
        None => Err(invalid("an untagged object".to_string())),
    }
}

/// Build one node and, recursively, its children.
fn build_node(
    document: &mut Document,
    object: &Map<String, Value>,
    entity: &'static EntityDef,
    parent: Option<NodeId>,
    location: Option<SlotLocation>,
) -> Result<NodeId, ModelError> {
    let mut node = Node::new(entity);
    node.parent = parent;
    node.location = location;

    let mut slots = Vec::new();
    for (key, value) in object {
        if key == ENTITY_TAG {
            continue;
        }
        if let Some(def) = entity.property(key) {
            check_kind(entity, def, value)?;
            node.properties.insert(def.name, value.clone());
        } else if let Some((relation, slot)) = entity.slot_for_property(key) {
            slots.push((relation, slot, value));
        } else {
            tracing::debug!(entity = entity.name, property = %key, "dropping undeclared property");
        }
    }

    let id = document.attach(node)?;
    slots.sort_by_key(|(relation, slot, _)| (*relation, *slot));
    for (relation, slot, value) in slots {
        revive_slot(document, id, relation, slot, value)?;
    }
    Ok(id)
}

fn revive_slot(
    document: &mut Document,
    owner: NodeId,
    relation: usize,
    slot: usize,
    value: &Value,
) -> Result<(), ModelError> {
    let entity = document.node(owner).entity();
    let def = entity.relations[relation].slots[slot];
    let state = &mut document.nodes[owner.0].relations[relation].slots[slot];
    state.present = true;
    state.null = value.is_null();

    let items: Vec<&Value> = match (def.shape, value) {
        (_, Value::Null) => Vec::new(),
        (SlotShape::One, Value::Object(_)) => vec![value],
        (SlotShape::Many, Value::Array(items)) => items.iter().collect(),
        (shape, other) => {
            return Err(ModelError::TypeMismatch {
                entity: entity.name.to_string(),
                property: def.property.to_string(),
                expected: match shape {
                    SlotShape::One => "an object",
                    SlotShape::Many => "an array of objects",
                },
                found: describe_value(other),
            })
        }
    };
    for item in items {
        revive_child(document, owner, relation, slot, item)?;
    }
    Ok(())
}

/// Revive `plain` as the last child of one slot of `owner`.
pub(crate) fn revive_child(
    document: &mut Document,
    owner: NodeId,
    relation: usize,
    slot: usize,
    plain: &Value,
) -> Result<NodeId, ModelError> {
    let owner_entity = document.node(owner).entity();
    let relation_def = &owner_entity.relations[relation];
    let slot_def = relation_def.slots[slot];

    let object = plain.as_object().ok_or_else(|| ModelError::TypeMismatch {
        entity: owner_entity.name.to_string(),
        property: slot_def.property.to_string(),
        expected: "an object",
        found: describe_value(plain),
    })?;
    let tag = object
        .get(ENTITY_TAG)
        .and_then(Value::as_str)
        .ok_or_else(|| ModelError::MissingEntityTag {
            entity: owner_entity.name.to_string(),
            property: slot_def.property.to_string(),
        })?;
    let entity = document.registry.require(tag)?;
    if entity.name != relation_def.entity {
        return Err(ModelError::TypeMismatch {
            entity: owner_entity.name.to_string(),
            property: slot_def.property.to_string(),
            expected: relation_def.entity,
            found: tag.to_string(),
        });
    }

    let position = document.nodes[owner.0].relations[relation].slots[slot]
        .children
        .len();
    if slot_def.shape == SlotShape::One && position > 0 {
        return Err(ModelError::SlotOccupied {
            entity: owner_entity.name.to_string(),
            property: slot_def.property.to_string(),
        });
    }

    let location = SlotLocation {
        relation,
        slot,
        position,
    };
    let child = build_node(document, object, entity, Some(owner), Some(location))?;
    document.nodes[owner.0].relations[relation].slots[slot]
        .children
        .push(child);
    Ok(child)
}

/// Check a property value against its declared kind. Null is accepted
/// everywhere.
pub(crate) fn check_kind(
    entity: &EntityDef,
    def: &PropertyDef,
    value: &Value,
) -> Result<(), ModelError> {
    let scalar = |v: &Value| !matches!(v, Value::Array(_) | Value::Object(_));
    let valid = match def.kind {
        PropertyKind::Scalar => scalar(value),
        PropertyKind::ScalarArray => match value {
            Value::Null => true,
            Value::Array(items) => items.iter().all(scalar),
            _ => false,
        },
        PropertyKind::Object => true,
    };
    if valid {
        Ok(())
    } else {
        Err(ModelError::TypeMismatch {
            entity: entity.name.to_string(),
            property: def.name.to_string(),
            expected: def.kind.describe(),
            found: describe_value(value),
        })
    }
}

pub(crate) fn describe_value(value: &Value) -> String {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{FIELD_MODEL, STUDY};
    use serde_json::json;

    #[test]
    fn checks_property_kinds() {
        let id = STUDY.property("id").unwrap();
        let languages = STUDY.property("languageIds").unwrap();
        let shortname = STUDY.property("shortname").unwrap();
        assert!(check_kind(&STUDY, id, &json!("TEST")).is_ok());
        assert!(check_kind(&STUDY, id, &json!(null)).is_ok());
        assert!(check_kind(&STUDY, id, &json!(["TEST"])).is_err());
        assert!(check_kind(&STUDY, languages, &json!(["en", "fr"])).is_ok());
        assert!(check_kind(&STUDY, languages, &json!([{"id": "en"}])).is_err());
        assert!(check_kind(&STUDY, shortname, &json!({"en": "Test"})).is_ok());
    }

    #[test]
    fn type_mismatch_names_the_property() {
        let def = FIELD_MODEL.property("readOnly").unwrap();
        let err = check_kind(&FIELD_MODEL, def, &json!({"a": 1})).unwrap_err();
        assert_eq!(
            err,
            ModelError::TypeMismatch {
                entity: "FieldModel".to_string(),
                property: "readOnly".to_string(),
                expected: "a scalar",
                found: "an object".to_string(),
            }
        );
    }

    #[test]
    fn root_must_be_a_study() {
        let err = revive(&json!({"className": "Menu", "id": "M"})).unwrap_err();
        assert!(matches!(err, ModelError::InvalidRoot { ref found, .. } if found == "Menu"));
        let err = revive(&json!(["Study"])).unwrap_err();
        assert!(matches!(err, ModelError::InvalidRoot { ref found, .. } if found == "an array"));
        let err = revive(&json!({"id": "TEST"})).unwrap_err();
        assert!(matches!(err, ModelError::InvalidRoot { .. }));
    }

    #[test]
    fn undeclared_properties_are_dropped() {
        let document = revive(&json!({
            "className": "Study",
            "id": "TEST",
            "legacyOption": true
        }))
        .unwrap();
        let root = document.node(document.root());
        assert!(root.property("legacyOption").is_none());
        assert_eq!(root.id(), Some("TEST"));
    }
}
