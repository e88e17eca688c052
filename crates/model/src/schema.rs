//! The study configuration schema.
//!
//! A study document is rooted at a `Study` object. Data entities (scope,
//! event, dataset and field models), user interface entities (forms and
//! their layouts), workflows, profiles, rules and menus hang below it.

use crate::registry::{EntityDef, EntityRegistry, PropertyDef as P, RelationDef, SlotDef};

const RULE_SLOTS: &[SlotDef] = &[
    SlotDef::many("createRules"),
    SlotDef::many("removeRules"),
    SlotDef::many("restoreRules"),
];

macro_rules! relation {
    ($entity:literal, many $property:literal) => {
        RelationDef {
            entity: $entity,
            slots: &[SlotDef::many($property)],
        }
    };
    ($entity:literal, one $property:literal) => {
        RelationDef {
            entity: $entity,
            slots: &[SlotDef::one($property)],
        }
    };
}

pub static STUDY: EntityDef = EntityDef {
    name: "Study",
    label: "Study",
    properties: &[
        P::scalar("id"),
        P::object("shortname"),
        P::object("longname"),
        P::object("description"),
        P::scalar("url"),
        P::scalar("email"),
        P::scalar("protocolNo"),
        P::scalar("versionNumber"),
        P::scalar("versionDate"),
        P::scalar("configVersion"),
        P::scalar("configDate"),
        P::scalar("configUser"),
        P::array("languageIds"),
        P::scalar("defaultLanguageId"),
        P::scalar("eproEnabled"),
        P::scalar("eproProfileId"),
        P::array("ruleTags"),
        P::object("eventActions"),
    ],
    relations: &[
        relation!("Language", many "languages"),
        relation!("Feature", many "features"),
        relation!("ScopeModel", many "scopeModels"),
        relation!("DatasetModel", many "datasetModels"),
        relation!("FormModel", many "formModels"),
        relation!("Workflow", many "workflows"),
        relation!("Profile", many "profiles"),
        relation!("Menu", many "menus"),
        relation!("PrivacyPolicy", many "privacyPolicies"),
        relation!("WorkflowWidget", many "workflowWidgets"),
        relation!("WorkflowSummary", many "workflowSummaries"),
    ],
    structural: true,
    sort_keys: &["id"],
};

pub static LANGUAGE: EntityDef = EntityDef {
    name: "Language",
    label: "Language",
    properties: &[P::scalar("id"), P::object("shortname")],
    relations: &[],
    structural: true,
    sort_keys: &["id"],
};

pub static FEATURE: EntityDef = EntityDef {
    name: "Feature",
    label: "Feature",
    properties: &[
        P::scalar("id"),
        P::object("shortname"),
        P::object("description"),
        P::scalar("optional"),
    ],
    relations: &[],
    structural: true,
    sort_keys: &["id"],
};

pub static SCOPE_MODEL: EntityDef = EntityDef {
    name: "ScopeModel",
    label: "Scope model",
    properties: &[
        P::scalar("id"),
        P::object("shortname"),
        P::object("longname"),
        P::array("parentIds"),
        P::scalar("defaultParentId"),
        P::scalar("virtual"),
        P::array("datasetModelIds"),
        P::array("formModelIds"),
        P::array("workflowIds"),
        P::scalar("labelPattern"),
    ],
    relations: &[
        relation!("EventModel", many "eventModels"),
        relation!("EventGroup", many "eventGroups"),
        RelationDef {
            entity: "Rule",
            slots: RULE_SLOTS,
        },
    ],
    structural: true,
    sort_keys: &["id"],
};

pub static EVENT_GROUP: EntityDef = EntityDef {
    name: "EventGroup",
    label: "Event group",
    properties: &[P::scalar("id"), P::object("shortname")],
    relations: &[],
    structural: true,
    sort_keys: &["id"],
};

pub static EVENT_MODEL: EntityDef = EntityDef {
    name: "EventModel",
    label: "Event model",
    properties: &[
        P::scalar("id"),
        P::object("shortname"),
        P::object("longname"),
        P::object("description"),
        P::scalar("eventGroupId"),
        P::scalar("inceptive"),
        P::array("datasetModelIds"),
        P::array("formModelIds"),
        P::array("workflowIds"),
        P::scalar("number"),
        P::scalar("mandatory"),
        P::scalar("maxOccurrence"),
        P::scalar("preventAdd"),
        P::scalar("deadline"),
        P::scalar("deadlineUnit"),
        P::array("deadlineReferenceEventModelIds"),
        P::scalar("deadlineAggregationFunction"),
        P::scalar("interval"),
        P::scalar("intervalUnit"),
        P::array("impliedEventModelIds"),
        P::array("blockedEventModelIds"),
        P::scalar("labelPattern"),
    ],
    relations: &[
        relation!("RuleConstraint", one "constraint"),
        RelationDef {
            entity: "Rule",
            slots: RULE_SLOTS,
        },
    ],
    structural: true,
    sort_keys: &["number", "id"],
};

pub static DATASET_MODEL: EntityDef = EntityDef {
    name: "DatasetModel",
    label: "Dataset model",
    properties: &[
        P::scalar("id"),
        P::object("shortname"),
        P::scalar("scopeModelId"),
        P::scalar("multiple"),
        P::scalar("exportLabel"),
    ],
    relations: &[relation!("FieldModel", many "fieldModels")],
    structural: true,
    sort_keys: &["id"],
};

pub static FIELD_MODEL: EntityDef = EntityDef {
    name: "FieldModel",
    label: "Field model",
    properties: &[
        P::scalar("id"),
        P::object("shortname"),
        P::object("longname"),
        P::object("inlineHelp"),
        P::object("advancedHelp"),
        P::scalar("type"),
        P::scalar("exportLabel"),
        P::scalar("readOnly"),
        P::scalar("minYear"),
        P::scalar("maxYear"),
        P::scalar("withYears"),
        P::scalar("withMonths"),
        P::scalar("withDays"),
        P::scalar("withHours"),
        P::scalar("withMinutes"),
        P::scalar("withSeconds"),
        P::scalar("maxIntegerDigits"),
        P::scalar("maxDecimalDigits"),
        P::scalar("minValue"),
        P::scalar("maxValue"),
        P::scalar("matcher"),
    ],
    relations: &[relation!("PossibleValue", many "possibleValues")],
    structural: true,
    sort_keys: &["id"],
};

pub static POSSIBLE_VALUE: EntityDef = EntityDef {
    name: "PossibleValue",
    label: "Possible value",
    properties: &[
        P::scalar("id"),
        P::object("shortname"),
        P::scalar("exportValue"),
        P::scalar("deleted"),
    ],
    relations: &[],
    structural: true,
    sort_keys: &["id"],
};

pub static FORM_MODEL: EntityDef = EntityDef {
    name: "FormModel",
    label: "Form model",
    properties: &[
        P::scalar("id"),
        P::object("shortname"),
        P::scalar("scopeModelId"),
        P::scalar("eventModelId"),
        P::scalar("workflowId"),
        P::scalar("actionId"),
        P::scalar("newEventModelId"),
    ],
    relations: &[
        relation!("Layout", many "layouts"),
        relation!("Rule", many "rules"),
    ],
    structural: true,
    sort_keys: &["id"],
};

pub static LAYOUT: EntityDef = EntityDef {
    name: "Layout",
    label: "Layout",
    properties: &[P::scalar("id"), P::scalar("type"), P::object("label")],
    relations: &[relation!("Line", many "lines")],
    structural: true,
    sort_keys: &["id"],
};

pub static LINE: EntityDef = EntityDef {
    name: "Line",
    label: "Line",
    properties: &[P::scalar("displayLabel")],
    relations: &[relation!("Cell", many "cells")],
    structural: true,
    sort_keys: &[],
};

pub static CELL: EntityDef = EntityDef {
    name: "Cell",
    label: "Cell",
    properties: &[
        P::scalar("datasetModelId"),
        P::scalar("fieldModelId"),
        P::object("textBefore"),
        P::object("textAfter"),
        P::scalar("colspan"),
    ],
    relations: &[],
    structural: true,
    sort_keys: &[],
};

pub static WORKFLOW: EntityDef = EntityDef {
    name: "Workflow",
    label: "Workflow",
    properties: &[
        P::scalar("id"),
        P::object("shortname"),
        P::scalar("scopeModelId"),
        P::scalar("eventModelId"),
        P::scalar("formModelId"),
        P::scalar("fieldModelId"),
        P::scalar("mainWorkflow"),
        P::array("unique"),
    ],
    relations: &[
        relation!("WorkflowState", many "states"),
        relation!("Action", many "actions"),
        relation!("Rule", many "rules"),
    ],
    structural: true,
    sort_keys: &["id"],
};

pub static WORKFLOW_STATE: EntityDef = EntityDef {
    name: "WorkflowState",
    label: "State",
    properties: &[
        P::scalar("id"),
        P::object("shortname"),
        P::scalar("color"),
        P::scalar("important"),
        P::array("aggregator"),
    ],
    relations: &[],
    structural: true,
    sort_keys: &["id"],
};

pub static ACTION: EntityDef = EntityDef {
    name: "Action",
    label: "Action",
    properties: &[
        P::scalar("id"),
        P::object("shortname"),
        P::array("requiredStateIds"),
        P::scalar("endStateId"),
        P::array("profileIds"),
        P::scalar("documentable"),
    ],
    relations: &[relation!("Rule", many "rules")],
    structural: true,
    sort_keys: &["id"],
};

pub static PROFILE: EntityDef = EntityDef {
    name: "Profile",
    label: "Profile",
    properties: &[
        P::scalar("id"),
        P::object("shortname"),
        P::array("featureIds"),
        P::array("assignableByProfileIds"),
        P::scalar("defaultScopeModelId"),
    ],
    relations: &[],
    structural: true,
    sort_keys: &["id"],
};

pub static RULE: EntityDef = EntityDef {
    name: "Rule",
    label: "Rule",
    properties: &[
        P::scalar("id"),
        P::object("description"),
        P::array("tags"),
        P::scalar("disabled"),
    ],
    relations: &[
        relation!("RuleConstraint", one "constraint"),
        relation!("RuleAction", many "actions"),
    ],
    structural: true,
    sort_keys: &["id"],
};

pub static RULE_CONSTRAINT: EntityDef = EntityDef {
    name: "RuleConstraint",
    label: "Constraint",
    properties: &[P::object("conditions"), P::object("evaluations")],
    relations: &[],
    structural: true,
    sort_keys: &[],
};

pub static RULE_ACTION: EntityDef = EntityDef {
    name: "RuleAction",
    label: "Rule action",
    properties: &[
        P::scalar("actionId"),
        P::scalar("rulableEntity"),
        P::object("parameters"),
    ],
    relations: &[],
    structural: true,
    sort_keys: &[],
};

pub static MENU: EntityDef = EntityDef {
    name: "Menu",
    label: "Menu",
    properties: &[
        P::scalar("id"),
        P::object("shortname"),
        P::scalar("public"),
        P::scalar("homePage"),
        P::scalar("icon"),
        P::object("action"),
    ],
    relations: &[relation!("Menu", many "submenus")],
    structural: true,
    sort_keys: &["id"],
};

pub static PRIVACY_POLICY: EntityDef = EntityDef {
    name: "PrivacyPolicy",
    label: "Privacy policy",
    properties: &[
        P::scalar("id"),
        P::object("title"),
        P::object("content"),
        P::scalar("date"),
    ],
    relations: &[],
    structural: false,
    sort_keys: &["id"],
};

pub static WORKFLOW_WIDGET: EntityDef = EntityDef {
    name: "WorkflowWidget",
    label: "Workflow widget",
    properties: &[
        P::scalar("id"),
        P::object("shortname"),
        P::scalar("scopeModelId"),
        P::scalar("workflowId"),
        P::array("states"),
    ],
    relations: &[],
    structural: false,
    sort_keys: &["id"],
};

pub static WORKFLOW_SUMMARY: EntityDef = EntityDef {
    name: "WorkflowSummary",
    label: "Workflow summary",
    properties: &[
        P::scalar("id"),
        P::object("shortname"),
        P::scalar("workflowId"),
        P::array("stateIds"),
    ],
    relations: &[],
    structural: false,
    sort_keys: &["id"],
};

static ENTITIES: &[&EntityDef] = &[
    &STUDY,
    &LANGUAGE,
    &FEATURE,
    &SCOPE_MODEL,
    &EVENT_GROUP,
    &EVENT_MODEL,
    &DATASET_MODEL,
    &FIELD_MODEL,
    &POSSIBLE_VALUE,
    &FORM_MODEL,
    &LAYOUT,
    &LINE,
    &CELL,
    &WORKFLOW,
    &WORKFLOW_STATE,
    &ACTION,
    &PROFILE,
    &RULE,
    &RULE_CONSTRAINT,
    &RULE_ACTION,
    &MENU,
    &PRIVACY_POLICY,
    &WORKFLOW_WIDGET,
    &WORKFLOW_SUMMARY,
];

/// Registry of the study configuration entities.
#[derive(Debug, Clone, Copy, Default)]
pub struct StudySchema;

/// Shared instance, usable wherever a `&'static dyn EntityRegistry` is needed.
pub static STUDY_SCHEMA: StudySchema = StudySchema;

impl EntityRegistry for StudySchema {
    fn entity(&self, name: &str) -> Option<&'static EntityDef> {
        ENTITIES.iter().copied().find(|e| e.name == name)
    }

    fn root(&self) -> &'static EntityDef {
        &STUDY
    }

    fn entities(&self) -> &'static [&'static EntityDef] {
        ENTITIES
    }
}
