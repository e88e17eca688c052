use std::fmt;

use serde::Serialize;
use serde_json::Value;
use studyconf_model::Node;

/// The node a difference is reported on, on the target side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NodeRef {
    pub entity: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub global_id: String,
}

impl NodeRef {
    pub fn of(node: &Node) -> Self {
        NodeRef {
            entity: node.entity_name().to_string(),
            id: node.id().map(str::to_string),
            global_id: node.global_id().to_string(),
        }
    }

    /// The id, or the sibling key from the global id for id-less nodes.
    pub fn display_id(&self) -> &str {
        match &self.id {
            Some(id) => id,
            None => self
                .global_id
                .rsplit_once(':')
                .map(|(_, key)| key)
                .unwrap_or(&self.global_id),
        }
    }
}

/// Identifies a child among its siblings: by id, or by position for
/// entities without one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ChildKey {
    Id(String),
    Position(usize),
}

impl ChildKey {
    pub fn of(node: &Node) -> Self {
        match node.id() {
            Some(id) if !id.is_empty() => ChildKey::Id(id.to_string()),
            _ => ChildKey::Position(node.location().map(|l| l.position).unwrap_or(0)),
        }
    }

    /// Whether a property value refers to this child.
    pub fn is_referenced_by(&self, value: &Value) -> bool {
        match self {
            ChildKey::Id(id) => value.as_str() == Some(id.as_str()),
            ChildKey::Position(_) => false,
        }
    }
}

impl fmt::Display for ChildKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChildKey::Id(id) => write!(f, "{}", id),
            ChildKey::Position(position) => write!(f, "#{}", position),
        }
    }
}

/// What changed. "Old" values come from the source document and "new"
/// values from the target.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DifferenceKind {
    PropertyChange {
        property: String,
        old_value: Value,
        new_value: Value,
    },
    ArrayLengthChange {
        property: String,
        element: Value,
        added: bool,
    },
    ArrayOrderingChange {
        property: String,
    },
    ArrayElementChange {
        property: String,
        index: usize,
        old_element: Value,
        new_element: Value,
    },
    ChildChange {
        child_entity: String,
        child_id: ChildKey,
        added: bool,
    },
}

impl DifferenceKind {
    pub fn name(&self) -> &'static str {
        match self {
            DifferenceKind::PropertyChange { .. } => "property_change",
            DifferenceKind::ArrayLengthChange { .. } => "array_length_change",
            DifferenceKind::ArrayOrderingChange { .. } => "array_ordering_change",
            DifferenceKind::ArrayElementChange { .. } => "array_element_change",
            DifferenceKind::ChildChange { .. } => "child_change",
        }
    }
}

/// Summary bucket of a difference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Modification,
    Addition,
    Deletion,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Category::Modification => write!(f, "modification"),
            Category::Addition => write!(f, "addition"),
            Category::Deletion => write!(f, "deletion"),
        }
    }
}

/// One semantic difference between two documents, with the secondary
/// differences attributed to it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Difference {
    pub node: NodeRef,
    #[serde(flatten)]
    pub kind: DifferenceKind,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub results: Vec<Difference>,
}

impl Difference {
    pub fn new(node: NodeRef, kind: DifferenceKind) -> Self {
        Difference {
            node,
            kind,
            results: Vec::new(),
        }
    }

    pub fn category(&self) -> Category {
        match &self.kind {
            DifferenceKind::PropertyChange { .. }
            | DifferenceKind::ArrayOrderingChange { .. }
            | DifferenceKind::ArrayElementChange { .. }
            | DifferenceKind::ArrayLengthChange { added: false, .. } => Category::Modification,
            DifferenceKind::ArrayLengthChange { added: true, .. }
            | DifferenceKind::ChildChange { added: true, .. } => Category::Addition,
            DifferenceKind::ChildChange { added: false, .. } => Category::Deletion,
        }
    }

    /// A change of the `id` property.
    pub fn is_rename(&self) -> bool {
        matches!(&self.kind, DifferenceKind::PropertyChange { property, .. } if property == studyconf_model::ID_PROPERTY)
    }

    /// A child present only in the source document.
    pub fn is_deletion(&self) -> bool {
        matches!(self.kind, DifferenceKind::ChildChange { added: false, .. })
    }
}
