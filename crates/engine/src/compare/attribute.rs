use serde::Serialize;
use serde_json::Value;
use studyconf_model::EntityRegistry;

use super::difference::{Category, Difference, DifferenceKind};

/// Per-category counts of top-level differences.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DifferenceSummary {
    pub modifications: usize,
    pub additions: usize,
    pub deletions: usize,
    pub total: usize,
}

impl DifferenceSummary {
    fn record(&mut self, category: Category) {
        match category {
            Category::Modification => self.modifications += 1,
            Category::Addition => self.additions += 1,
            Category::Deletion => self.deletions += 1,
        }
        self.total += 1;
    }
}

/// Differences with cascades collapsed under their cause.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttributedDiff {
    pub differences: Vec<Difference>,
    pub summary: DifferenceSummary,
}

impl AttributedDiff {
    /// Raw differences, every one of them top-level.
    pub fn unattributed(differences: Vec<Difference>) -> Self {
        let mut summary = DifferenceSummary::default();
        for difference in &differences {
            summary.record(difference.category());
        }
        AttributedDiff {
            differences,
            summary,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.differences.is_empty()
    }
}

/// Attach secondary differences to the rename or deletion that caused them.
///
/// A value change whose old/new pair equals that of an id change is a
/// consequence of the rename; the latest matching rename in traversal order
/// claims it. A reference cleared to null or `""`, or an array element
/// removed, whose old value is the id of a deleted child is a consequence of
/// that deletion; deletions of structural entities claim first.
pub fn attribute(differences: Vec<Difference>, registry: &dyn EntityRegistry) -> AttributedDiff {
    let count = differences.len();
    let mut pending: Vec<Option<Difference>> = differences.into_iter().map(Some).collect();
    let mut results: Vec<Vec<Difference>> = vec![Vec::new(); count];

    let renames: Vec<usize> = (0..count)
        .filter(|&i| pending[i].as_ref().is_some_and(Difference::is_rename))
        .collect();
    for i in 0..count {
        let claimant = pending[i].as_ref().and_then(|d| {
            if d.is_rename() {
                return None;
            }
            let pair = value_pair(&d.kind)?;
            renames.iter().rev().copied().find(|&r| {
                pending[r].as_ref().and_then(|p| value_pair(&p.kind)) == Some(pair)
            })
        });
        if let Some(r) = claimant {
            if let Some(secondary) = pending[i].take() {
                results[r].push(secondary);
            }
        }
    }

    let mut deletions: Vec<usize> = (0..count)
        .filter(|&i| pending[i].as_ref().is_some_and(Difference::is_deletion))
        .collect();
    deletions.sort_by_key(|&i| {
        let structural = match pending[i].as_ref().map(|d| &d.kind) {
            Some(DifferenceKind::ChildChange { child_entity, .. }) => registry.is_structural(child_entity),
            _ => true,
        };
        !structural
    });
    for i in 0..count {
        let claimant = pending[i].as_ref().and_then(|d| {
            let reference = cleared_reference(d)?;
            deletions.iter().copied().find(|&p| match pending[p].as_ref().map(|p| &p.kind) {
                Some(DifferenceKind::ChildChange { child_id, .. }) => child_id.is_referenced_by(reference),
                _ => false,
            })
        });
        if let Some(p) = claimant {
            if let Some(secondary) = pending[i].take() {
                results[p].push(secondary);
            }
        }
    }

    let mut summary = DifferenceSummary::default();
    let mut attributed = Vec::new();
    for (difference, nested) in pending.into_iter().zip(results) {
        if let Some(mut difference) = difference {
            summary.record(difference.category());
            difference.results = nested;
            attributed.push(difference);
        }
    }
    tracing::debug!(
        raw = count,
        top_level = attributed.len(),
        "differences attributed"
    );
    AttributedDiff {
        differences: attributed,
        summary,
    }
}

/// Old/new pair of a property change or an array element change.
fn value_pair(kind: &DifferenceKind) -> Option<(&Value, &Value)> {
    match kind {
        DifferenceKind::PropertyChange {
            old_value,
            new_value,
            ..
        } => Some((old_value, new_value)),
        DifferenceKind::ArrayElementChange {
            old_element,
            new_element,
            ..
        } => Some((old_element, new_element)),
        _ => None,
    }
}

/// The value a difference lost: a property emptied to null or `""`, or a
/// removed array element.
fn cleared_reference(difference: &Difference) -> Option<&Value> {
    match &difference.kind {
        DifferenceKind::PropertyChange {
            old_value,
            new_value,
            ..
        } if !difference.is_rename() && is_empty(new_value) => Some(old_value),
        DifferenceKind::ArrayLengthChange {
            element,
            added: false,
            ..
        } => Some(element),
        _ => None,
    }
}

fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}
