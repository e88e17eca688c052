//! Helpers for walking and editing plain documents inside migration steps.

use serde_json::{Map, Value};
use studyconf_model::ID_PROPERTY;

use super::error::MigrationStepError;
use super::report::AffectedNode;

pub(crate) type Object = Map<String, Value>;

/// Global id of the document root.
pub(crate) fn root_global_id(document: &Value) -> String {
    document
        .as_object()
        .map(|root| AffectedNode::locate("", "Study", root, 0).global_id)
        .unwrap_or_default()
}

/// Object entries of an array slot, with their positions. Missing slots and
/// non-object entries are skipped.
pub(crate) fn entries_mut(slot: Option<&mut Value>) -> impl Iterator<Item = (usize, &mut Object)> {
    slot.and_then(Value::as_array_mut)
        .into_iter()
        .flat_map(|items| items.iter_mut().enumerate())
        .filter_map(|(position, item)| item.as_object_mut().map(|object| (position, object)))
}

/// Id of a plain object, for error messages.
pub(crate) fn object_id(object: &Object) -> String {
    object
        .get(ID_PROPERTY)
        .and_then(Value::as_str)
        .unwrap_or("?")
        .to_string()
}

/// A string property every object of this kind must carry.
pub(crate) fn required_str<'a>(
    object: &'a Object,
    entity: &'static str,
    property: &'static str,
) -> Result<&'a str, MigrationStepError> {
    match object.get(property) {
        None | Some(Value::Null) => Err(MigrationStepError::MissingProperty {
            entity,
            id: object_id(object),
            property,
        }),
        Some(Value::String(value)) => Ok(value),
        Some(_) => Err(MigrationStepError::UnexpectedType {
            entity,
            id: object_id(object),
            property,
            expected: "a string",
        }),
    }
}

/// Copy `from` into `to` when present. Returns whether anything was copied.
pub(crate) fn copy_key(object: &mut Object, from: &str, to: &str) -> bool {
    match object.get(from).cloned() {
        Some(value) => {
            object.insert(to.to_string(), value);
            true
        }
        None => false,
    }
}

/// Move `from` to `to` when present. Returns whether anything moved.
pub(crate) fn rename_key(object: &mut Object, from: &str, to: &str) -> bool {
    match object.remove(from) {
        Some(value) => {
            object.insert(to.to_string(), value);
            true
        }
        None => false,
    }
}
