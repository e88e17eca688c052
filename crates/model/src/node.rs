//! Nodes of a revived document graph.
//!
//! Nodes live in the arena owned by their [`Document`](crate::Document) and
//! refer to each other by [`NodeId`]. Ownership flows from parent to child
//! through slots; the `parent` link is a plain index recorded at revival and
//! never serialized.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::registry::{EntityDef, RelationDef, SlotShape, ID_PROPERTY};

/// Index of a node in its document arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Where a node sits inside its parent: relation, slot and position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotLocation {
    pub relation: usize,
    pub slot: usize,
    pub position: usize,
}

/// One ordered list of children.
#[derive(Debug, Clone)]
pub struct Slot {
    pub property: &'static str,
    pub shape: SlotShape,
    pub children: Vec<NodeId>,
    /// Whether the slot appeared in the plain document (or was filled by an
    /// edit). Absent slots stay absent when serializing.
    pub present: bool,
    /// The slot was `null` in the plain document and has stayed empty.
    pub null: bool,
}

/// Children of a node towards one entity kind.
#[derive(Debug, Clone)]
pub struct Relation {
    pub def: &'static RelationDef,
    pub slots: Vec<Slot>,
}

impl Relation {
    pub(crate) fn empty(def: &'static RelationDef) -> Self {
        Relation {
            def,
            slots: def
                .slots
                .iter()
                .map(|s| Slot {
                    property: s.property,
                    shape: s.shape,
                    children: Vec::new(),
                    present: false,
                    null: false,
                })
                .collect(),
        }
    }
}

/// A typed entity instance.
#[derive(Debug, Clone)]
pub struct Node {
    pub(crate) global_id: String,
    pub(crate) entity: &'static EntityDef,
    pub(crate) properties: BTreeMap<&'static str, Value>,
    pub(crate) relations: Vec<Relation>,
    pub(crate) parent: Option<NodeId>,
    pub(crate) location: Option<SlotLocation>,
    pub(crate) static_node: bool,
}

impl Node {
    pub(crate) fn new(entity: &'static EntityDef) -> Self {
        Node {
            global_id: String::new(),
            entity,
            properties: BTreeMap::new(),
            relations: entity.relations.iter().map(Relation::empty).collect(),
            parent: None,
            location: None,
            static_node: false,
        }
    }

    pub fn global_id(&self) -> &str {
        &self.global_id
    }

    pub fn entity(&self) -> &'static EntityDef {
        self.entity
    }

    pub fn entity_name(&self) -> &'static str {
        self.entity.name
    }

    /// The node id, when the entity declares one and it is a string.
    pub fn id(&self) -> Option<&str> {
        self.properties.get(ID_PROPERTY).and_then(Value::as_str)
    }

    pub fn property(&self, name: &str) -> Option<&Value> {
        self.properties.get(name)
    }

    pub fn properties(&self) -> &BTreeMap<&'static str, Value> {
        &self.properties
    }

    pub fn relations(&self) -> &[Relation] {
        &self.relations
    }

    /// The relation towards `entity`, if declared.
    pub fn relation(&self, entity: &str) -> Option<&Relation> {
        self.relations.iter().find(|r| r.def.entity == entity)
    }

    /// Children stored under a plain-document slot property.
    pub fn slot(&self, property: &str) -> Option<&Slot> {
        self.relations
            .iter()
            .flat_map(|r| r.slots.iter())
            .find(|s| s.property == property)
    }

    /// All children, in relation then slot order.
    pub fn children(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.relations
            .iter()
            .flat_map(|r| r.slots.iter())
            .flat_map(|s| s.children.iter().copied())
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn location(&self) -> Option<SlotLocation> {
        self.location
    }

    /// Runtime-injected node, omitted from serialization.
    pub fn is_static(&self) -> bool {
        self.static_node
    }
}
