/// Errors raised while reviving, navigating or editing a document graph.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModelError {
    /// No node is registered under the given global id. Usually a stale reference.
    #[error("no node matching global id '{global_id}'")]
    NotFound { global_id: String },

    /// An entity name that the registry does not declare.
    #[error("unknown entity '{entity}'")]
    UnknownEntity { entity: String },

    /// A plain object nested in a child slot carries no entity tag.
    #[error("object in {entity}.{property} has no 'className'")]
    MissingEntityTag { entity: String, property: String },

    /// A property value does not match its declared kind.
    #[error("{entity}.{property}: expected {expected}, found {found}")]
    TypeMismatch {
        entity: String,
        property: String,
        expected: &'static str,
        found: String,
    },

    /// Two siblings of the same slot share an id.
    #[error("duplicate {entity} '{id}' under '{parent}'")]
    DuplicateId {
        entity: String,
        id: String,
        parent: String,
    },

    /// The document root is not an object of the registry's root entity.
    #[error("document root must be a {expected} object, found {found}")]
    InvalidRoot { expected: String, found: String },

    /// A property or slot that the entity does not declare.
    #[error("{entity} has no property '{property}'")]
    UnknownProperty { entity: String, property: String },

    /// A single-child slot already holds a node.
    #[error("{entity}.{property} already holds a child")]
    SlotOccupied { entity: String, property: String },

    /// The root node cannot be detached from its own document.
    #[error("the root node cannot be removed")]
    RootRemoval,

    /// Listener registration was attempted while notifications are suppressed.
    #[error("notification bus is locked")]
    BusLocked,
}
