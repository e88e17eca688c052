//! Schema migration of plain documents.
//!
//! A [`MigrationRegistry`] holds version-to-version [`MigrationStep`]s. The
//! [`Migrator`] applies the steps between a document's `configVersion` and
//! the current version in ascending order, producing one
//! [`MigrationReport`] per step.

pub mod error;
pub mod migrator;
mod plain;
pub mod registry;
pub mod report;
pub mod standard;

pub use error::{MigrationError, MigrationStepError, RegistryError};
pub use migrator::{document_version, Migrator};
pub use registry::{MigrationRegistry, MigrationStep, Transform, BASELINE_VERSION};
pub use report::{AffectedNode, MigrationReport};
pub use standard::{standard_registry, STANDARD_STEPS};
