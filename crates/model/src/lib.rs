//! studyconf-model: entity registry and typed node graph for versioned study
//! configuration documents.
//!
//! A plain JSON document is revived into a [`Document`], an arena of typed
//! [`Node`]s whose shape is dictated by an [`EntityRegistry`]. Documents can be
//! navigated by global id, edited with change notifications, and serialized
//! back to their plain form.

pub mod bus;
pub mod document;
pub mod error;
pub mod global_id;
pub mod node;
pub mod registry;
pub mod revive;
pub mod schema;
mod serialize;
pub mod static_nodes;

pub use bus::{ChangeEvent, ListenerId, NotificationBus, Suppression};
pub use document::{Document, CONFIG_VERSION};
pub use error::ModelError;
pub use node::{Node, NodeId, Relation, Slot, SlotLocation};
pub use registry::{
    EntityDef, EntityRegistry, PropertyDef, PropertyKind, RelationDef, SlotDef, SlotShape,
    ENTITY_TAG, ID_PROPERTY,
};
pub use revive::{revive, Reviver};
pub use schema::{StudySchema, STUDY_SCHEMA};
