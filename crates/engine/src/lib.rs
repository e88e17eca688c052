//! studyconf-engine: schema migration and structural comparison of study
//! configuration documents.
//!
//! Migration works on plain JSON documents, before revival: a
//! [`Migrator`] brings a document from its `configVersion` up to the
//! current version one registered step at a time. Comparison works on
//! revived [`studyconf_model::Document`]s at the same version and yields
//! differences attributed to the renames and deletions that caused them.

pub mod compare;
pub mod migration;

pub use compare::{
    attribute, compare, compare_with, diff, AttributedDiff, CompareError, CompareOptions,
    Difference, DifferenceKind, DifferenceSummary,
};
pub use migration::{
    document_version, standard_registry, MigrationError, MigrationRegistry, MigrationReport,
    MigrationStep, MigrationStepError, Migrator, BASELINE_VERSION,
};
