use serde_json::Value;
use studyconf_model::{Document, Node, NodeId, PropertyKind};

use super::difference::{ChildKey, Difference, DifferenceKind, NodeRef};
use super::error::CompareError;

/// Own-property differences, the id included, a renamed child may carry.
const RENAME_THRESHOLD: usize = 2;

/// Tuning of the tree walk. By default children are matched on entity and
/// id only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CompareOptions {
    /// Pair an unmatched target child with an unmatched source child of the
    /// same slot when they differ by their id and at most one other
    /// property, so renames surface as an id change. Only mutual best
    /// matches are paired, which keeps the result independent of which
    /// document is the target.
    pub detect_renames: bool,
}

/// Differences needed to turn `source` into `target`, with default options.
pub fn compare(target: &Document, source: &Document) -> Result<Vec<Difference>, CompareError> {
    compare_with(target, source, &CompareOptions::default())
}

/// Walk both documents in pre-order and list their differences.
///
/// Within a node, declared properties come first, in declaration order,
/// then each child slot in relation order. Inside a slot, matched children
/// are compared in target order, followed by additions and removals.
pub fn compare_with(
    target: &Document,
    source: &Document,
    options: &CompareOptions,
) -> Result<Vec<Difference>, CompareError> {
    let (target_version, source_version) = (target.config_version(), source.config_version());
    if target_version != source_version {
        return Err(CompareError::VersionMismatch {
            target_version,
            source_version,
        });
    }

    let differ = Differ {
        target,
        source,
        options,
    };
    let mut differences = Vec::new();
    differ.compare_nodes(target.root(), source.root(), &mut differences);
    tracing::info!(differences = differences.len(), "documents compared");
    Ok(differences)
}

struct Differ<'a> {
    target: &'a Document,
    source: &'a Document,
    options: &'a CompareOptions,
}

impl Differ<'_> {
    fn compare_nodes(&self, target_id: NodeId, source_id: NodeId, out: &mut Vec<Difference>) {
        let (target, source) = (self.target.node(target_id), self.source.node(source_id));
        compare_properties(target, source, out);

        for (target_relation, source_relation) in target.relations().iter().zip(source.relations()) {
            for (target_slot, source_slot) in target_relation.slots.iter().zip(&source_relation.slots) {
                let target_children = live_children(self.target, &target_slot.children);
                let source_children = live_children(self.source, &source_slot.children);
                self.compare_slot(target, &target_children, &source_children, out);
            }
        }
    }

    fn compare_slot(
        &self,
        parent: &Node,
        targets: &[NodeId],
        sources: &[NodeId],
        out: &mut Vec<Difference>,
    ) {
        let mut pairs: Vec<Option<usize>> = vec![None; targets.len()];
        let mut used = vec![false; sources.len()];

        for (t, target) in targets.iter().enumerate() {
            let key = ChildKey::of(self.target.node(*target));
            let found = sources
                .iter()
                .enumerate()
                .position(|(s, source)| !used[s] && ChildKey::of(self.source.node(*source)) == key);
            if let Some(s) = found {
                used[s] = true;
                pairs[t] = Some(s);
            }
        }

        if self.options.detect_renames {
            self.pair_renames(targets, sources, &mut pairs, &mut used);
        }

        for (t, pair) in pairs.iter().enumerate() {
            if let Some(s) = pair {
                self.compare_nodes(targets[t], sources[*s], out);
            }
        }

        let parent_ref = NodeRef::of(parent);
        let child_change = |node: &Node, added: bool| {
            Difference::new(
                parent_ref.clone(),
                DifferenceKind::ChildChange {
                    child_entity: node.entity_name().to_string(),
                    child_id: ChildKey::of(node),
                    added,
                },
            )
        };
        for (t, pair) in pairs.iter().enumerate() {
            if pair.is_none() {
                out.push(child_change(self.target.node(targets[t]), true));
            }
        }
        for (s, taken) in used.iter().enumerate() {
            if !taken {
                out.push(child_change(self.source.node(sources[s]), false));
            }
        }
    }

    /// Pair children left over by exact matching when each is the other's
    /// unique closest candidate.
    fn pair_renames(
        &self,
        targets: &[NodeId],
        sources: &[NodeId],
        pairs: &mut [Option<usize>],
        used: &mut [bool],
    ) {
        let open_targets: Vec<usize> = (0..targets.len())
            .filter(|&t| pairs[t].is_none() && self.target.node(targets[t]).id().is_some())
            .collect();
        let open_sources: Vec<usize> = (0..sources.len())
            .filter(|&s| !used[s] && self.source.node(sources[s]).id().is_some())
            .collect();
        if open_targets.is_empty() || open_sources.is_empty() {
            return;
        }

        let distance = |t: usize, s: usize| {
            let mut own = Vec::new();
            compare_properties(self.target.node(targets[t]), self.source.node(sources[s]), &mut own);
            own.len()
        };
        let scores: Vec<Vec<usize>> = open_targets
            .iter()
            .map(|&t| open_sources.iter().map(|&s| distance(t, s)).collect())
            .collect();

        let target_choice: Vec<Option<usize>> = scores
            .iter()
            .map(|row| unique_closest(row.iter().copied()))
            .collect();
        let source_choice: Vec<Option<usize>> = (0..open_sources.len())
            .map(|j| unique_closest(scores.iter().map(|row| row[j])))
            .collect();

        for (i, choice) in target_choice.iter().enumerate() {
            let Some(j) = *choice else { continue };
            if source_choice[j] != Some(i) {
                continue;
            }
            let (t, s) = (open_targets[i], open_sources[j]);
            tracing::debug!(
                renamed_to = self.target.node(targets[t]).global_id(),
                renamed_from = self.source.node(sources[s]).global_id(),
                "paired renamed child"
            );
            used[s] = true;
            pairs[t] = Some(s);
        }
    }
}

/// Index of the single lowest score within the rename threshold. Ties yield
/// no candidate.
fn unique_closest(scores: impl Iterator<Item = usize>) -> Option<usize> {
    let mut best: Option<(usize, usize)> = None;
    let mut tied = false;
    for (index, score) in scores.enumerate() {
        if score > RENAME_THRESHOLD {
            continue;
        }
        match best {
            Some((_, b)) if score > b => {}
            Some((_, b)) if score == b => tied = true,
            _ => {
                best = Some((index, score));
                tied = false;
            }
        }
    }
    if tied {
        None
    } else {
        best.map(|(index, _)| index)
    }
}

fn live_children(document: &Document, children: &[NodeId]) -> Vec<NodeId> {
    children
        .iter()
        .copied()
        .filter(|c| !document.node(*c).is_static())
        .collect()
}

/// Compare the scalar and scalar-array properties of two nodes of the same
/// entity. Object properties are not compared.
fn compare_properties(target: &Node, source: &Node, out: &mut Vec<Difference>) {
    let node = NodeRef::of(target);
    for def in target.entity().properties {
        if def.kind == PropertyKind::Object {
            continue;
        }
        let new_value = target.property(def.name).unwrap_or(&Value::Null);
        let old_value = source.property(def.name).unwrap_or(&Value::Null);
        match (new_value, old_value) {
            (Value::Array(new), Value::Array(old)) => {
                compare_arrays(&node, def.name, new, old, out);
            }
            _ if new_value != old_value => out.push(Difference::new(
                node.clone(),
                DifferenceKind::PropertyChange {
                    property: def.name.to_string(),
                    old_value: old_value.clone(),
                    new_value: new_value.clone(),
                },
            )),
            _ => {}
        }
    }
}

/// Element-level comparison of two scalar arrays.
///
/// Each target element is matched with the first unused equal source
/// element. Unmatched elements are additions or deletions; for arrays of the
/// same length, an addition and a deletion at the same index are reported
/// as a single element change. The matched elements are then checked for a
/// change of order.
fn compare_arrays(node: &NodeRef, property: &str, new: &[Value], old: &[Value], out: &mut Vec<Difference>) {
    let mut used = vec![false; old.len()];
    let mut additions: Vec<(usize, &Value)> = Vec::new();
    let mut kept_new: Vec<&Value> = Vec::new();
    for (i, element) in new.iter().enumerate() {
        match (0..old.len()).find(|&j| !used[j] && old[j] == *element) {
            Some(j) => {
                used[j] = true;
                kept_new.push(element);
            }
            None => additions.push((i, element)),
        }
    }
    let mut deletions: Vec<(usize, &Value)> = old
        .iter()
        .enumerate()
        .filter(|(j, _)| !used[*j])
        .collect();
    let kept_old: Vec<&Value> = old
        .iter()
        .enumerate()
        .filter(|(j, _)| used[*j])
        .map(|(_, v)| v)
        .collect();

    let make = |kind| Difference::new(node.clone(), kind);

    if new.len() == old.len() {
        additions.retain(|(i, new_element)| {
            match deletions.iter().position(|(j, _)| j == i) {
                Some(d) => {
                    let (_, old_element) = deletions.remove(d);
                    out.push(make(DifferenceKind::ArrayElementChange {
                        property: property.to_string(),
                        index: *i,
                        old_element: old_element.clone(),
                        new_element: Value::clone(new_element),
                    }));
                    false
                }
                None => true,
            }
        });
    }

    for (_, element) in additions {
        out.push(make(DifferenceKind::ArrayLengthChange {
            property: property.to_string(),
            element: element.clone(),
            added: true,
        }));
    }
    for (_, element) in deletions {
        out.push(make(DifferenceKind::ArrayLengthChange {
            property: property.to_string(),
            element: element.clone(),
            added: false,
        }));
    }
    if kept_new != kept_old {
        out.push(make(DifferenceKind::ArrayOrderingChange {
            property: property.to_string(),
        }));
    }
}
