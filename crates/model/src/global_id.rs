//! Path-qualified node identifiers.
//!
//! A global id chains one segment per node from the root, joined by `|`.
//! Each segment is `Entity:key`, where the key is the node id or, for nodes
//! without one, `#` followed by its position in its slot. When the parent keeps several
//! slots for the same entity, the slot index is recorded as `Entity-n:key`.
//!
//! ```text
//! Study:TEST|ScopeModel:PATIENT|Rule-1:ON_DELETE
//! ```

use std::fmt;

pub const SEPARATOR: char = '|';

/// One `Entity[-slot]:key` element of a global id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub entity: String,
    pub slot: Option<usize>,
    pub key: String,
}

impl Segment {
    pub fn new(entity: &str, slot: Option<usize>, key: impl Into<String>) -> Self {
        Segment {
            entity: entity.to_string(),
            slot,
            key: key.into(),
        }
    }

    /// Parse a single segment. Returns `None` when the `:` is missing or the
    /// slot suffix is not a number.
    pub fn parse(raw: &str) -> Option<Self> {
        let (head, key) = raw.split_once(':')?;
        let (entity, slot) = match head.split_once('-') {
            Some((entity, slot)) => (entity, Some(slot.parse().ok()?)),
            None => (head, None),
        };
        if entity.is_empty() {
            return None;
        }
        Some(Segment::new(entity, slot, key))
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.slot {
            Some(slot) => write!(f, "{}-{}:{}", self.entity, slot, self.key),
            None => write!(f, "{}:{}", self.entity, self.key),
        }
    }
}

/// Key identifying a node among its siblings.
pub fn node_key(id: Option<&str>, position: usize) -> String {
    match id {
        Some(id) if !id.is_empty() => id.to_string(),
        _ => format!("#{}", position),
    }
}

/// Append a segment to a parent global id.
pub fn child(parent: &str, segment: &Segment) -> String {
    format!("{}{}{}", parent, SEPARATOR, segment)
}

/// Split a global id into its segments.
pub fn parse(global_id: &str) -> Option<Vec<Segment>> {
    if global_id.is_empty() {
        return None;
    }
    global_id.split(SEPARATOR).map(Segment::parse).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_single_and_multi_slot_segments() {
        assert_eq!(Segment::new("ScopeModel", None, "PATIENT").to_string(), "ScopeModel:PATIENT");
        assert_eq!(Segment::new("Rule", Some(1), "ON_DELETE").to_string(), "Rule-1:ON_DELETE");
    }

    #[test]
    fn parses_a_full_path() {
        let segments = parse("Study:TEST|ScopeModel:PATIENT|Rule-2:R1").unwrap();
        assert_eq!(segments.len(), 3);
        assert_eq!(segments[0], Segment::new("Study", None, "TEST"));
        assert_eq!(segments[2], Segment::new("Rule", Some(2), "R1"));
    }

    #[test]
    fn keys_fall_back_to_position() {
        assert_eq!(node_key(Some("F1"), 3), "F1");
        assert_eq!(node_key(None, 3), "#3");
        assert_eq!(node_key(Some(""), 0), "#0");
        assert_ne!(node_key(Some("1"), 0), node_key(None, 1));
    }

    #[test]
    fn rejects_junk() {
        assert!(parse("").is_none());
        assert!(parse("not a global id").is_none());
        assert!(parse("Study:X|Rule-a:R1").is_none());
    }

    #[test]
    fn keys_may_contain_colons() {
        let segment = Segment::parse("Menu:home:main").unwrap();
        assert_eq!(segment.key, "home:main");
    }

    #[test]
    fn positional_keys_parse_back() {
        let segments = parse("Study:TEST|FormModel:F1|Layout:MAIN|Line:#0").unwrap();
        assert_eq!(segments[3], Segment::new("Line", None, "#0"));
    }
}
