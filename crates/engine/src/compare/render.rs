//! Human-readable, JSON and CSV renderings of a comparison.

use serde_json::Value;
use studyconf_model::EntityRegistry;

use super::attribute::AttributedDiff;
use super::difference::{Category, Difference, DifferenceKind};

/// Column header of the CSV rendering.
pub const CSV_HEADER: &str = "category,type,entity,id,global_id,message,cause";

impl Difference {
    /// One-line description, e.g.
    /// `Event model BASELINE - Property number (from 1 to 2)`.
    pub fn message(&self, registry: &dyn EntityRegistry) -> String {
        let subject = format!(
            "{} {}",
            registry.label(&self.node.entity),
            self.node.display_id()
        );
        match &self.kind {
            DifferenceKind::PropertyChange {
                property,
                old_value,
                new_value,
            } => format!(
                "{} - Property {} (from {} to {})",
                subject,
                property,
                display_value(old_value),
                display_value(new_value)
            ),
            DifferenceKind::ArrayLengthChange {
                property,
                element,
                added,
            } => format!(
                "{} - Property {} - {} element {}",
                subject,
                property,
                if *added { "New" } else { "Missing" },
                display_value(element)
            ),
            DifferenceKind::ArrayOrderingChange { property } => {
                format!("{} - Property {} has been mixed up", subject, property)
            }
            DifferenceKind::ArrayElementChange {
                property,
                index,
                old_element,
                new_element,
            } => format!(
                "{} - Property {}, index {} (from {} to {})",
                subject,
                property,
                index,
                display_value(old_element),
                display_value(new_element)
            ),
            DifferenceKind::ChildChange {
                child_entity,
                child_id,
                added,
            } => format!(
                "{} - {} child {} {}",
                subject,
                if *added { "New" } else { "Missing" },
                registry.label(child_entity),
                child_id
            ),
        }
    }
}

impl AttributedDiff {
    pub fn to_json(&self) -> serde_json::Result<Value> {
        serde_json::to_value(self)
    }

    /// Summary line followed by one line per top-level difference, with the
    /// differences it caused indented below it.
    pub fn to_text(&self, registry: &dyn EntityRegistry) -> String {
        let summary = &self.summary;
        let mut lines = vec![format!(
            "{} differences ({} modifications, {} additions, {} deletions)",
            summary.total, summary.modifications, summary.additions, summary.deletions
        )];
        for difference in &self.differences {
            push_text(&mut lines, difference, registry, 0);
        }
        lines.join("\n")
    }

    /// One row per difference, nested results included. The `cause` column
    /// holds the message of the difference a row was attributed to.
    pub fn to_csv(&self, registry: &dyn EntityRegistry) -> String {
        let mut rows = vec![CSV_HEADER.to_string()];
        for difference in &self.differences {
            push_csv(&mut rows, difference, registry, None);
        }
        let mut out = rows.join("\n");
        out.push('\n');
        out
    }
}

fn push_text(lines: &mut Vec<String>, difference: &Difference, registry: &dyn EntityRegistry, depth: usize) {
    let indent = "    ".repeat(depth);
    let marker = match difference.category() {
        Category::Modification => '~',
        Category::Addition => '+',
        Category::Deletion => '-',
    };
    lines.push(format!("{}{} {}", indent, marker, difference.message(registry)));
    if !difference.results.is_empty() {
        lines.push(format!(
            "{}  {} resulting modifications",
            indent,
            difference.results.len()
        ));
        for result in &difference.results {
            push_text(lines, result, registry, depth + 1);
        }
    }
}

fn push_csv(rows: &mut Vec<String>, difference: &Difference, registry: &dyn EntityRegistry, cause: Option<&str>) {
    let message = difference.message(registry);
    let fields = [
        difference.category().to_string(),
        difference.kind.name().to_string(),
        difference.node.entity.clone(),
        difference.node.id.clone().unwrap_or_default(),
        difference.node.global_id.clone(),
        message.clone(),
        cause.unwrap_or_default().to_string(),
    ];
    rows.push(fields.iter().map(|f| csv_field(f)).collect::<Vec<_>>().join(","));
    for result in &difference.results {
        push_csv(rows, result, registry, Some(&message));
    }
}

fn csv_field(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// Strings are shown bare, everything else as JSON.
fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compare::attribute::attribute;
    use crate::compare::difference::{ChildKey, NodeRef};
    use serde_json::json;
    use studyconf_model::STUDY_SCHEMA;

    fn event() -> NodeRef {
        NodeRef {
            entity: "EventModel".to_string(),
            id: Some("BASELINE".to_string()),
            global_id: "Study:TEST|ScopeModel:PATIENT|EventModel:BASELINE".to_string(),
        }
    }

    fn deleted_form() -> AttributedDiff {
        attribute(
            vec![
                Difference::new(
                    event(),
                    DifferenceKind::PropertyChange {
                        property: "defaultFormModelId".to_string(),
                        old_value: json!("F1"),
                        new_value: Value::Null,
                    },
                ),
                Difference::new(
                    NodeRef {
                        entity: "Study".to_string(),
                        id: Some("TEST".to_string()),
                        global_id: "Study:TEST".to_string(),
                    },
                    DifferenceKind::ChildChange {
                        child_entity: "FormModel".to_string(),
                        child_id: ChildKey::Id("F1".to_string()),
                        added: false,
                    },
                ),
            ],
            &STUDY_SCHEMA,
        )
    }

    #[test]
    fn messages() {
        let make = |kind| Difference::new(event(), kind).message(&STUDY_SCHEMA);
        assert_eq!(
            make(DifferenceKind::PropertyChange {
                property: "number".to_string(),
                old_value: json!(1),
                new_value: json!(2),
            }),
            "Event model BASELINE - Property number (from 1 to 2)"
        );
        assert_eq!(
            make(DifferenceKind::ArrayLengthChange {
                property: "formModelIds".to_string(),
                element: json!("F2"),
                added: true,
            }),
            "Event model BASELINE - Property formModelIds - New element F2"
        );
        assert_eq!(
            make(DifferenceKind::ArrayOrderingChange {
                property: "formModelIds".to_string(),
            }),
            "Event model BASELINE - Property formModelIds has been mixed up"
        );
        assert_eq!(
            make(DifferenceKind::ArrayElementChange {
                property: "formModelIds".to_string(),
                index: 1,
                old_element: json!("F1"),
                new_element: json!("F3"),
            }),
            "Event model BASELINE - Property formModelIds, index 1 (from F1 to F3)"
        );
        assert_eq!(
            make(DifferenceKind::ChildChange {
                child_entity: "Rule".to_string(),
                child_id: ChildKey::Id("INIT".to_string()),
                added: false,
            }),
            "Event model BASELINE - Missing child Rule INIT"
        );
    }

    #[test]
    fn text_nests_attributed_differences() {
        let text = deleted_form().to_text(&STUDY_SCHEMA);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines,
            vec![
                "1 differences (0 modifications, 0 additions, 1 deletions)",
                "- Study TEST - Missing child Form model F1",
                "  1 resulting modifications",
                "    ~ Event model BASELINE - Property defaultFormModelId (from F1 to null)",
            ]
        );
    }

    #[test]
    fn csv_rows_carry_their_cause() {
        let csv = deleted_form().to_csv(&STUDY_SCHEMA);
        let rows: Vec<&str> = csv.lines().collect();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0], CSV_HEADER);
        assert!(rows[1].starts_with("deletion,child_change,Study,TEST,Study:TEST,"));
        assert!(rows[2].ends_with(",Study TEST - Missing child Form model F1"));
    }

    #[test]
    fn csv_quotes_fields_with_separators() {
        assert_eq!(csv_field("plain"), "plain");
        assert_eq!(csv_field("a,b"), "\"a,b\"");
        assert_eq!(csv_field("say \"hi\""), "\"say \"\"hi\"\"\"");
    }

    #[test]
    fn json_has_summary_and_nested_results() {
        let json = deleted_form().to_json().unwrap();
        assert_eq!(json["summary"]["deletions"], json!(1));
        assert_eq!(json["differences"][0]["type"], json!("child_change"));
        assert_eq!(json["differences"][0]["results"][0]["property"], json!("defaultFormModelId"));
    }
}
