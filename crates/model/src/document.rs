//! A revived document: node arena, global id index and editing operations.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::rc::Rc;

use serde_json::Value;

use crate::bus::{ChangeEvent, NotificationBus};
use crate::error::ModelError;
use crate::global_id::{self, node_key, Segment};
use crate::node::{Node, NodeId, SlotLocation};
use crate::registry::{EntityDef, EntityRegistry, ID_PROPERTY};
use crate::revive;

/// Property of the root node carrying the schema version.
pub const CONFIG_VERSION: &str = "configVersion";

/// A typed entity graph built from one plain document.
pub struct Document {
    pub(crate) nodes: Vec<Node>,
    pub(crate) root: NodeId,
    pub(crate) index: HashMap<String, NodeId>,
    pub(crate) registry: &'static dyn EntityRegistry,
    pub(crate) bus: Rc<NotificationBus>,
}

impl std::fmt::Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Document")
            .field("root", &self.node(self.root).global_id)
            .field("nodes", &self.index.len())
            .finish()
    }
}

impl Document {
    pub(crate) fn empty(registry: &'static dyn EntityRegistry, bus: Rc<NotificationBus>) -> Self {
        Document {
            nodes: Vec::new(),
            root: NodeId(0),
            index: HashMap::new(),
            registry,
            bus,
        }
    }

    // ── Access ──────────────────────────────────────────────────────────

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Borrow a node. Ids are only handed out by this document.
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn registry(&self) -> &'static dyn EntityRegistry {
        self.registry
    }

    pub fn bus(&self) -> &Rc<NotificationBus> {
        &self.bus
    }

    /// Schema version recorded on the root node.
    pub fn config_version(&self) -> Option<u64> {
        self.node(self.root)
            .property(CONFIG_VERSION)
            .and_then(Value::as_u64)
    }

    pub fn find(&self, global_id: &str) -> Option<NodeId> {
        self.index.get(global_id).copied()
    }

    /// Resolve a global id to a node id.
    pub fn node_id(&self, global_id: &str) -> Result<NodeId, ModelError> {
        self.find(global_id).ok_or_else(|| {
            tracing::debug!(global_id, "global id lookup missed");
            ModelError::NotFound {
                global_id: global_id.to_string(),
            }
        })
    }

    /// Resolve a global id to a node.
    pub fn get_node(&self, global_id: &str) -> Result<&Node, ModelError> {
        self.node_id(global_id).map(|id| self.node(id))
    }

    /// Number of nodes reachable from the root, static nodes included.
    pub fn node_count(&self) -> usize {
        self.index.len()
    }

    // ── Navigation ──────────────────────────────────────────────────────

    /// Children of `id` towards `entity`, across all slots of the relation.
    pub fn children_of(&self, id: NodeId, entity: &str) -> Vec<NodeId> {
        self.node(id)
            .relation(entity)
            .map(|r| {
                r.slots
                    .iter()
                    .flat_map(|s| s.children.iter().copied())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Children of `id` towards `entity`, ordered by the entity's sort keys.
    pub fn sorted_children(&self, id: NodeId, entity: &str) -> Vec<NodeId> {
        let mut children = self.children_of(id, entity);
        let Some(def) = self.registry.entity(entity) else {
            return children;
        };
        children.sort_by(|a, b| {
            let (a, b) = (self.node(*a), self.node(*b));
            def.sort_keys
                .iter()
                .map(|key| compare_values(a.property(key), b.property(key)))
                .find(|o| o.is_ne())
                .unwrap_or(Ordering::Equal)
        });
        children
    }

    /// All nodes below `id`, in pre-order. `id` itself is not included.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut result = Vec::new();
        let mut stack: Vec<NodeId> = self.node(id).children().collect();
        stack.reverse();
        while let Some(current) = stack.pop() {
            result.push(current);
            let mut children: Vec<NodeId> = self.node(current).children().collect();
            children.reverse();
            stack.extend(children);
        }
        result
    }

    /// Closest strict ancestor of the given entity kind.
    pub fn ancestor_of_type(&self, id: NodeId, entity: &str) -> Option<NodeId> {
        let mut current = self.node(id).parent;
        while let Some(candidate) = current {
            if self.node(candidate).entity.name == entity {
                return Some(candidate);
            }
            current = self.node(candidate).parent;
        }
        None
    }

    /// Nodes from the root down to `id`, both included.
    pub fn path(&self, id: NodeId) -> Vec<NodeId> {
        let mut path = vec![id];
        let mut current = self.node(id).parent;
        while let Some(parent) = current {
            path.push(parent);
            current = self.node(parent).parent;
        }
        path.reverse();
        path
    }

    /// Whether two nodes of possibly different documents denote the same
    /// logical entity: same kinds and same ids all the way from the root.
    pub fn same_entity(a_doc: &Document, a: NodeId, b_doc: &Document, b: NodeId) -> bool {
        let (a_path, b_path) = (a_doc.path(a), b_doc.path(b));
        a_path.len() == b_path.len()
            && a_path.iter().zip(&b_path).all(|(x, y)| {
                let (x, y) = (a_doc.node(*x), b_doc.node(*y));
                x.entity.name == y.entity.name
                    && x.location.map(|l| l.slot) == y.location.map(|l| l.slot)
                    && sibling_key(x) == sibling_key(y)
            })
    }

    // ── Editing ─────────────────────────────────────────────────────────

    /// Set a declared property. Changing the id re-indexes the subtree.
    pub fn set_property(
        &mut self,
        id: NodeId,
        property: &str,
        value: Value,
    ) -> Result<(), ModelError> {
        self.ensure_attached(id)?;
        let entity = self.node(id).entity;
        let def = entity
            .property(property)
            .ok_or_else(|| ModelError::UnknownProperty {
                entity: entity.name.to_string(),
                property: property.to_string(),
            })?;
        revive::check_kind(entity, def, &value)?;

        let old_value = self.node(id).property(def.name).cloned().unwrap_or(Value::Null);
        if old_value == value {
            return Ok(());
        }

        let renamed = def.name == ID_PROPERTY;
        if renamed {
            let node = self.node(id);
            let probe = self.global_id_for(node.entity, node.parent, node.location, value.as_str());
            if probe != node.global_id && self.index.contains_key(&probe) {
                return Err(self.duplicate(node, value.as_str()));
            }
        }

        self.nodes[id.0].properties.insert(def.name, value.clone());
        if renamed {
            self.reindex(id);
        }
        self.bus.publish(ChangeEvent::PropertyChanged {
            global_id: self.node(id).global_id.clone(),
            property: def.name.to_string(),
            old_value,
            new_value: value,
        });
        Ok(())
    }

    /// Revive `plain` and append it to the slot stored under `property`.
    pub fn add_child(
        &mut self,
        parent: NodeId,
        property: &str,
        plain: &Value,
    ) -> Result<NodeId, ModelError> {
        self.ensure_attached(parent)?;
        let entity = self.node(parent).entity;
        let (relation, slot) =
            entity
                .slot_for_property(property)
                .ok_or_else(|| ModelError::UnknownProperty {
                    entity: entity.name.to_string(),
                    property: property.to_string(),
                })?;

        let mark = self.nodes.len();
        let child = match revive::revive_child(self, parent, relation, slot, plain) {
            Ok(child) => child,
            Err(e) => {
                self.rollback(mark);
                return Err(e);
            }
        };
        let state = &mut self.nodes[parent.0].relations[relation].slots[slot];
        state.present = true;
        state.null = false;
        self.bus.publish(ChangeEvent::ChildAdded {
            parent: self.node(parent).global_id.clone(),
            child: self.node(child).global_id.clone(),
        });
        Ok(child)
    }

    /// Detach a node and its subtree from the document.
    ///
    /// Detached nodes stay in the arena but can no longer be reached by
    /// global id. Later siblings shift down and are re-indexed.
    pub fn remove_child(&mut self, id: NodeId) -> Result<(), ModelError> {
        self.ensure_attached(id)?;
        let node = self.node(id);
        let (Some(parent), Some(location)) = (node.parent, node.location) else {
            return Err(ModelError::RootRemoval);
        };
        let removed = node.global_id.clone();
        let entity = node.entity.name;

        for gone in std::iter::once(id).chain(self.descendants(id)) {
            self.index.remove(&self.nodes[gone.0].global_id);
        }

        let slot = &mut self.nodes[parent.0].relations[location.relation].slots[location.slot];
        slot.children.remove(location.position);
        let shifted: Vec<NodeId> = slot.children[location.position..].to_vec();
        for (offset, sibling) in shifted.into_iter().enumerate() {
            if let Some(l) = self.nodes[sibling.0].location.as_mut() {
                l.position = location.position + offset;
            }
            self.reindex(sibling);
        }
        self.nodes[id.0].parent = None;
        self.nodes[id.0].location = None;

        self.bus.publish(ChangeEvent::ChildRemoved {
            parent: self.node(parent).global_id.clone(),
            child: removed,
            entity,
        });
        Ok(())
    }

    // ── Internals ───────────────────────────────────────────────────────

    /// Register a freshly built node: assign its global id and index it.
    pub(crate) fn attach(&mut self, mut node: Node) -> Result<NodeId, ModelError> {
        node.global_id = self.global_id_for(node.entity, node.parent, node.location, node.id());
        if self.index.contains_key(&node.global_id) {
            return Err(self.duplicate(&node, node.id()));
        }
        let id = NodeId(self.nodes.len());
        self.index.insert(node.global_id.clone(), id);
        self.bus.publish(ChangeEvent::NodeCreated {
            global_id: node.global_id.clone(),
            entity: node.entity.name,
        });
        self.nodes.push(node);
        Ok(id)
    }

    fn global_id_for(
        &self,
        entity: &EntityDef,
        parent: Option<NodeId>,
        location: Option<SlotLocation>,
        id: Option<&str>,
    ) -> String {
        match (parent, location) {
            (Some(parent), Some(location)) => {
                let parent = self.node(parent);
                let multi = parent.entity.relations[location.relation].is_multi_slot();
                let segment = Segment::new(
                    entity.name,
                    multi.then_some(location.slot),
                    node_key(id, location.position),
                );
                global_id::child(&parent.global_id, &segment)
            }
            _ => Segment::new(entity.name, None, node_key(id, 0)).to_string(),
        }
    }

    fn duplicate(&self, node: &Node, id: Option<&str>) -> ModelError {
        let position = node.location.map(|l| l.position).unwrap_or(0);
        ModelError::DuplicateId {
            entity: node.entity.name.to_string(),
            id: node_key(id, position),
            parent: node
                .parent
                .map(|p| self.node(p).global_id.clone())
                .unwrap_or_default(),
        }
    }

    /// Recompute the global ids of `id` and its subtree, parents first.
    fn reindex(&mut self, id: NodeId) {
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let node = self.node(current);
            let fresh = self.global_id_for(node.entity, node.parent, node.location, node.id());
            let stale = std::mem::replace(&mut self.nodes[current.0].global_id, fresh.clone());
            if self.index.get(&stale) == Some(&current) {
                self.index.remove(&stale);
            }
            self.index.insert(fresh, current);
            stack.extend(self.node(current).children());
        }
    }

    fn ensure_attached(&self, id: NodeId) -> Result<(), ModelError> {
        let node = self.node(id);
        if self.index.get(&node.global_id) == Some(&id) {
            Ok(())
        } else {
            Err(ModelError::NotFound {
                global_id: node.global_id.clone(),
            })
        }
    }

    /// Drop nodes built after `mark` by a failed edit.
    fn rollback(&mut self, mark: usize) {
        for (offset, node) in self.nodes.drain(mark..).enumerate() {
            if self.index.get(&node.global_id) == Some(&NodeId(mark + offset)) {
                self.index.remove(&node.global_id);
            }
        }
    }
}

fn sibling_key(node: &Node) -> String {
    node_key(node.id(), node.location.map(|l| l.position).unwrap_or(0))
}

/// Order two optional property values: absent and null first, then numbers,
/// then strings. Booleans order false before true.
fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    fn rank(value: Option<&Value>) -> u8 {
        match value {
            None | Some(Value::Null) => 0,
            Some(Value::Bool(_)) => 1,
            Some(Value::Number(_)) => 2,
            Some(Value::String(_)) => 3,
            Some(_) => 4,
        }
    }
    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            let (x, y) = (x.as_f64().unwrap_or(0.0), y.as_f64().unwrap_or(0.0));
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        _ => rank(a).cmp(&rank(b)),
    }
}
