//! Languages and features every study implicitly carries.
//!
//! They are injected into a revived document on request, flagged static, and
//! left out of serialization.

use serde_json::{json, Value};

use crate::document::Document;
use crate::error::ModelError;
use crate::registry::ID_PROPERTY;
use crate::revive;

/// Root slots receiving static nodes.
pub const STATIC_SLOTS: [&str; 2] = ["languages", "features"];

fn feature(id: &str, en: &str, fr: &str, optional: bool) -> Value {
    json!({
        "className": "Feature",
        "id": id,
        "shortname": {"en": en, "fr": fr},
        "optional": optional
    })
}

/// Plain definitions of the static nodes, keyed by root slot.
pub fn static_config() -> Value {
    json!({
        "languages": [
            {"className": "Language", "id": "en", "shortname": {"en": "English", "fr": "Anglais"}},
            {"className": "Language", "id": "fr", "shortname": {"en": "French", "fr": "Français"}}
        ],
        "features": [
            feature("ADMIN", "Administrator", "Administrateur", false),
            feature("MANAGE_CONFIGURATION", "Manage configuration", "Gestion de la configuration", false),
            feature("MANAGE_DELETED_DATA", "Manage deleted data", "Gestion des données supprimées", false),
            feature("MANAGE_MAILS", "Manage e-mails", "Gestion des e-mails", false),
            feature("MANAGE_RESOURCE", "Manage resources", "Gestion des ressources", false),
            feature("LOCK", "Lock scopes and events", "Verrouiller les scopes et les évènements", false),
            feature("DOCUMENTATION", "Documentation", "Documentation", false),
            feature("EXPORT", "Export", "Export", false),
            feature("NOTIFY_RESOURCE_PUBLISHED", "Get notified of resources published", "Être notifié lorsque des ressources sont publiées", true),
            feature("VIEW_AUDIT_TRAIL", "View audit trails", "Voir les audit trails", false)
        ]
    })
}

/// Append the static nodes to the root. Ids already present in the
/// document are skipped.
pub(crate) fn inject(document: &mut Document) -> Result<(), ModelError> {
    let config = static_config();
    let root = document.root();
    let entity = document.node(root).entity();

    for property in STATIC_SLOTS {
        let (relation, slot) =
            entity
                .slot_for_property(property)
                .ok_or_else(|| ModelError::UnknownProperty {
                    entity: entity.name.to_string(),
                    property: property.to_string(),
                })?;
        let Some(items) = config.get(property).and_then(Value::as_array) else {
            continue;
        };
        for item in items {
            let id = item.get(ID_PROPERTY).and_then(Value::as_str);
            let exists = document.node(root).relations()[relation].slots[slot]
                .children
                .iter()
                .any(|c| document.node(*c).id() == id);
            if exists {
                continue;
            }
            let child = revive::revive_child(document, root, relation, slot, item)?;
            for node in std::iter::once(child).chain(document.descendants(child)) {
                document.nodes[node.0].static_node = true;
            }
        }
    }
    tracing::debug!("static nodes injected");
    Ok(())
}
