//! Serialization of a document back to its plain form.

use serde_json::{Map, Value};

use crate::document::Document;
use crate::node::NodeId;
use crate::registry::{SlotShape, ENTITY_TAG};

impl Document {
    /// Plain form of the whole document.
    pub fn serialize(&self) -> Value {
        self.serialize_node(self.root())
    }

    /// Plain form of one node and its subtree.
    ///
    /// Properties come in declaration order after the entity tag, followed by
    /// the slots that were present at revival. Static nodes are skipped.
    pub fn serialize_node(&self, id: NodeId) -> Value {
        let node = self.node(id);
        let mut object = Map::new();
        object.insert(ENTITY_TAG.to_string(), Value::String(node.entity_name().to_string()));

        for def in node.entity().properties {
            if let Some(value) = node.property(def.name) {
                object.insert(def.name.to_string(), value.clone());
            }
        }

        for slot in node.relations().iter().flat_map(|r| r.slots.iter()) {
            if !slot.present {
                continue;
            }
            let mut children: Vec<Value> = slot
                .children
                .iter()
                .filter(|c| !self.node(**c).is_static())
                .map(|c| self.serialize_node(*c))
                .collect();
            let value = match slot.shape {
                _ if slot.null && children.is_empty() => Value::Null,
                SlotShape::One if children.is_empty() => Value::Null,
                SlotShape::One => children.swap_remove(0),
                SlotShape::Many => Value::Array(children),
            };
            object.insert(slot.property.to_string(), value);
        }

        Value::Object(object)
    }
}
