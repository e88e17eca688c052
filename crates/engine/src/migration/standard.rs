//! Built-in migration steps of the study configuration schema.

use std::sync::OnceLock;

use serde_json::{json, Value};

use super::error::MigrationStepError;
use super::plain::{self, copy_key, entries_mut, object_id, rename_key, required_str, Object};
use super::registry::{MigrationRegistry, MigrationStep};
use super::report::AffectedNode;

pub static STANDARD_STEPS: [MigrationStep; 3] = [
    MigrationStep {
        from_version: 116,
        to_version: 117,
        description: "Update menu pages to the new application routes",
        instructions: None,
        transform: update_menu_pages,
    },
    MigrationStep {
        from_version: 117,
        to_version: 118,
        description: "Migrate date and number format",
        instructions: Some("Review the date and number fields of each dataset model"),
        transform: update_field_formats,
    },
    MigrationStep {
        from_version: 118,
        to_version: 119,
        description: "Rename and remove configuration options",
        instructions: None,
        transform: rename_options,
    },
];

/// Registry holding [`STANDARD_STEPS`].
pub fn standard_registry() -> &'static MigrationRegistry {
    static REGISTRY: OnceLock<MigrationRegistry> = OnceLock::new();
    REGISTRY.get_or_init(|| MigrationRegistry {
        steps: STANDARD_STEPS.to_vec(),
    })
}

// ── 116 -> 117 ──────────────────────────────────────────────────────────

fn update_menu_pages(document: &mut Value) -> Result<Vec<AffectedNode>, MigrationStepError> {
    let study = plain::root_global_id(document);
    let mut affected = Vec::new();
    for (position, menu) in entries_mut(document.get_mut("menus")) {
        let node = AffectedNode::locate(&study, "Menu", menu, position);
        if update_menu_page(menu)? {
            affected.push(node.clone());
        }
        for (sub_position, submenu) in entries_mut(menu.get_mut("submenus")) {
            if update_menu_page(submenu)? {
                affected.push(AffectedNode::locate(&node.global_id, "Menu", submenu, sub_position));
            }
        }
    }
    Ok(affected)
}

fn update_menu_page(menu: &mut Object) -> Result<bool, MigrationStepError> {
    let id = object_id(menu);
    let Some(action) = menu.get_mut("action").and_then(Value::as_object_mut) else {
        return Ok(false);
    };
    let Some(page) = action.get("page").and_then(Value::as_str) else {
        return Ok(false);
    };
    let (page, clear_context) = match page {
        "scope-page" => {
            let scope = action
                .get("context")
                .and_then(|c| c.get(0))
                .and_then(Value::as_str)
                .ok_or(MigrationStepError::MissingProperty {
                    entity: "Menu",
                    id,
                    property: "action.context",
                })?;
            (format!("scopes/{}", scope.to_uppercase()), true)
        }
        "contacts" => ("users".to_string(), false),
        "crf" => ("search".to_string(), true),
        "extract" => ("extracts".to_string(), false),
        "send-mail" => ("send-test-mail".to_string(), false),
        _ => return Ok(false),
    };
    action.insert("page".to_string(), Value::String(page));
    if clear_context {
        action.insert("context".to_string(), json!([]));
    }
    Ok(true)
}

// ── 117 -> 118 ──────────────────────────────────────────────────────────

const LEGACY_FORMAT_KEYS: [&str; 6] = [
    "yearsStart",
    "yearsStop",
    "displayYears",
    "displayMonths",
    "displayDays",
    "format",
];

const DATE_TOKENS: [(&str, &str); 6] = [
    ("withYears", "yyyy"),
    ("withMonths", "MM"),
    ("withDays", "dd"),
    ("withHours", "HH"),
    ("withMinutes", "mm"),
    ("withSeconds", "ss"),
];

fn update_field_formats(document: &mut Value) -> Result<Vec<AffectedNode>, MigrationStepError> {
    let study = plain::root_global_id(document);
    let mut affected = Vec::new();
    for (position, dataset) in entries_mut(document.get_mut("datasetModels")) {
        let parent = AffectedNode::locate(&study, "DatasetModel", dataset, position).global_id;
        for (field_position, field) in entries_mut(dataset.get_mut("fieldModels")) {
            update_field_format(field)?;
            affected.push(AffectedNode::locate(&parent, "FieldModel", field, field_position));
        }
    }
    Ok(affected)
}

fn update_field_format(field: &mut Object) -> Result<(), MigrationStepError> {
    match field.get("type").and_then(Value::as_str) {
        Some("DATE") => {
            let format = required_str(field, "FieldModel", "format")?.to_string();
            copy_key(field, "yearsStart", "minYear");
            copy_key(field, "yearsStop", "maxYear");
            for (flag, token) in DATE_TOKENS {
                field.insert(flag.to_string(), Value::Bool(format.contains(token)));
            }
        }
        Some("DATE_SELECT") => {
            copy_key(field, "yearsStart", "minYear");
            copy_key(field, "yearsStop", "maxYear");
            copy_key(field, "displayYears", "withYears");
            copy_key(field, "displayMonths", "withMonths");
            copy_key(field, "displayDays", "withDays");
        }
        Some("NUMBER") => {
            let format = required_str(field, "FieldModel", "format")?;
            let (integer, decimal) = match format.split_once('.') {
                Some((integer, decimal)) => (integer.chars().count(), Some(decimal.chars().count())),
                None => (format.chars().count(), None),
            };
            field.insert("maxIntegerDigits".to_string(), json!(integer));
            if let Some(decimal) = decimal {
                field.insert("maxDecimalDigits".to_string(), json!(decimal));
            }
        }
        _ => {}
    }
    for key in LEGACY_FORMAT_KEYS {
        field.remove(key);
    }
    Ok(())
}

// ── 118 -> 119 ──────────────────────────────────────────────────────────

fn rename_options(document: &mut Value) -> Result<Vec<AffectedNode>, MigrationStepError> {
    let study = plain::root_global_id(document);
    let mut affected = Vec::new();

    for (position, scope) in entries_mut(document.get_mut("scopeModels")) {
        if rename_key(scope, "parents", "parentIds") {
            affected.push(AffectedNode::locate(&study, "ScopeModel", scope, position));
        }
    }

    for (position, dataset) in entries_mut(document.get_mut("datasetModels")) {
        let parent = AffectedNode::locate(&study, "DatasetModel", dataset, position).global_id;
        for (field_position, field) in entries_mut(dataset.get_mut("fieldModels")) {
            let mut changed = field.remove("helpHover").is_some();
            changed |= rename_key(field, "forDisplay", "inlineHelp");
            changed |= rename_key(field, "helpText", "advancedHelp");
            changed |= field.remove("size").is_some();
            if changed {
                affected.push(AffectedNode::locate(&parent, "FieldModel", field, field_position));
            }
        }
    }
    Ok(affected)
}
