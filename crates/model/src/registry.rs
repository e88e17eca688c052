//! Static entity metadata.
//!
//! Every entity kind a document may contain is described once by an
//! [`EntityDef`]: its declared properties, its child relations and a few
//! comparison hints. Revival, serialization and the differencer all consult
//! this table explicitly instead of inspecting object shapes at runtime.

use crate::error::ModelError;

/// Name of the plain-document property carrying the entity of an object.
pub const ENTITY_TAG: &str = "className";

/// Name of the identifying property shared by all entities that have one.
pub const ID_PROPERTY: &str = "id";

/// How a declared property is stored and compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyKind {
    /// String, number or boolean.
    Scalar,
    /// Array of strings, numbers or booleans.
    ScalarArray,
    /// Structured value (localized labels, free-form settings) carried
    /// through revival as-is and never compared.
    Object,
}

impl PropertyKind {
    pub fn describe(self) -> &'static str {
        match self {
            PropertyKind::Scalar => "a scalar",
            PropertyKind::ScalarArray => "an array of scalars",
            PropertyKind::Object => "an object",
        }
    }
}

/// A declared property of an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PropertyDef {
    pub name: &'static str,
    pub kind: PropertyKind,
}

impl PropertyDef {
    pub const fn scalar(name: &'static str) -> Self {
        PropertyDef {
            name,
            kind: PropertyKind::Scalar,
        }
    }

    pub const fn array(name: &'static str) -> Self {
        PropertyDef {
            name,
            kind: PropertyKind::ScalarArray,
        }
    }

    pub const fn object(name: &'static str) -> Self {
        PropertyDef {
            name,
            kind: PropertyKind::Object,
        }
    }
}

/// Whether a slot holds a single child object or a list of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotShape {
    One,
    Many,
}

/// One ordered list of children, stored under `property` in the plain document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotDef {
    pub property: &'static str,
    pub shape: SlotShape,
}

impl SlotDef {
    pub const fn one(property: &'static str) -> Self {
        SlotDef {
            property,
            shape: SlotShape::One,
        }
    }

    pub const fn many(property: &'static str) -> Self {
        SlotDef {
            property,
            shape: SlotShape::Many,
        }
    }
}

/// A parent-to-child relation towards one entity kind.
///
/// Most relations have a single slot. Entities that hold the same child kind
/// in several lists (scope models keep create, delete and restore rules)
/// declare one slot per list, in a fixed order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelationDef {
    pub entity: &'static str,
    pub slots: &'static [SlotDef],
}

impl RelationDef {
    pub fn is_multi_slot(&self) -> bool {
        self.slots.len() > 1
    }
}

/// Metadata for one entity kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntityDef {
    pub name: &'static str,
    pub label: &'static str,
    pub properties: &'static [PropertyDef],
    pub relations: &'static [RelationDef],
    /// Whether deleting a node of this kind changes the shape of the study,
    /// as opposed to presentation-only entities.
    pub structural: bool,
    /// Properties used to order siblings for display.
    pub sort_keys: &'static [&'static str],
}

impl EntityDef {
    pub fn property(&self, name: &str) -> Option<&'static PropertyDef> {
        self.properties.iter().find(|p| p.name == name)
    }

    /// Index and definition of the relation towards `entity`.
    pub fn relation(&self, entity: &str) -> Option<(usize, &'static RelationDef)> {
        self.relations
            .iter()
            .enumerate()
            .find(|(_, r)| r.entity == entity)
    }

    /// Locate the relation and slot stored under a plain-document property.
    pub fn slot_for_property(&self, property: &str) -> Option<(usize, usize)> {
        self.relations.iter().enumerate().find_map(|(ri, r)| {
            r.slots
                .iter()
                .position(|s| s.property == property)
                .map(|si| (ri, si))
        })
    }

    pub fn has_id(&self) -> bool {
        self.property(ID_PROPERTY).is_some()
    }
}

/// Source of entity metadata for one document schema.
pub trait EntityRegistry: Sync {
    /// Look up an entity by name.
    fn entity(&self, name: &str) -> Option<&'static EntityDef>;

    /// The entity every document root must be.
    fn root(&self) -> &'static EntityDef;

    /// All entities, in declaration order.
    fn entities(&self) -> &'static [&'static EntityDef];

    fn require(&self, name: &str) -> Result<&'static EntityDef, ModelError> {
        self.entity(name).ok_or_else(|| ModelError::UnknownEntity {
            entity: name.to_string(),
        })
    }

    /// Whether removing a node of this kind is a structural change.
    /// Unknown entities are treated as structural.
    fn is_structural(&self, name: &str) -> bool {
        self.entity(name).map(|e| e.structural).unwrap_or(true)
    }

    /// Display label of an entity, falling back to its name.
    fn label(&self, name: &str) -> String {
        self.entity(name)
            .map(|e| e.label.to_string())
            .unwrap_or_else(|| name.to_string())
    }
}
