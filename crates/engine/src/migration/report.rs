use std::fmt;

use serde::Serialize;
use serde_json::{Map, Value};
use studyconf_model::global_id::{self, node_key, Segment};
use studyconf_model::ID_PROPERTY;

use super::registry::MigrationStep;

/// A node touched by a migration step, located the way the revived
/// document will index it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AffectedNode {
    pub entity: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub global_id: String,
}

impl AffectedNode {
    /// Locate a plain object stored at `position` below `parent`.
    /// An empty parent denotes the document root.
    pub fn locate(parent: &str, entity: &str, object: &Map<String, Value>, position: usize) -> Self {
        let id = object.get(ID_PROPERTY).and_then(Value::as_str);
        let segment = Segment::new(entity, None, node_key(id, position));
        let global_id = if parent.is_empty() {
            segment.to_string()
        } else {
            global_id::child(parent, &segment)
        };
        AffectedNode {
            entity: entity.to_string(),
            id: id.map(str::to_string),
            global_id,
        }
    }
}

/// Outcome of one applied step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MigrationReport {
    pub from_version: u64,
    pub to_version: u64,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
    pub nodes: Vec<AffectedNode>,
}

impl MigrationReport {
    pub(crate) fn new(step: &MigrationStep, nodes: Vec<AffectedNode>) -> Self {
        MigrationReport {
            from_version: step.from_version,
            to_version: step.to_version,
            description: step.description.to_string(),
            instructions: step.instructions.map(str::to_string),
            nodes,
        }
    }
}

impl fmt::Display for MigrationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} -> {}: {} ({} node(s))",
            self.from_version,
            self.to_version,
            self.description,
            self.nodes.len()
        )?;
        if let Some(instructions) = &self.instructions {
            write!(f, "\n  {}", instructions)?;
        }
        Ok(())
    }
}
