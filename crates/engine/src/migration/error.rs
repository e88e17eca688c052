use super::report::MigrationReport;

/// A step found the document in a shape it cannot transform.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MigrationStepError {
    #[error("{entity} '{id}' has no '{property}'")]
    MissingProperty {
        entity: &'static str,
        id: String,
        property: &'static str,
    },

    #[error("{entity} '{id}': '{property}' must be {expected}")]
    UnexpectedType {
        entity: &'static str,
        id: String,
        property: &'static str,
        expected: &'static str,
    },
}

/// Rejected step registrations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("step {from} -> {to} does not move forward")]
    InvalidRange { from: u64, to: u64 },

    #[error("two steps start at version {from}")]
    DuplicateStep { from: u64 },

    #[error("step starting at {second} begins before step {first} -> {first_to} ends")]
    OverlappingSteps { first: u64, first_to: u64, second: u64 },
}

/// Errors raised by [`Migrator::migrate`](super::Migrator::migrate).
///
/// Failures after the first step carry the reports of the steps that did
/// succeed; the document keeps their changes.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MigrationError {
    /// The document is newer than anything this application knows.
    #[error(
        "application is outdated: document version is {document}, supported version is {supported}"
    )]
    ApplicationOutdated { document: u64, supported: u64 },

    /// No registered step starts at the document version.
    #[error("no migration step registered for version {version}")]
    MissingStep {
        version: u64,
        completed: Vec<MigrationReport>,
    },

    /// A step's precondition failed. The document is left as it was before
    /// that step.
    #[error("migration from version {from} to {to} failed: {source}")]
    Step {
        from: u64,
        to: u64,
        #[source]
        source: MigrationStepError,
        completed: Vec<MigrationReport>,
    },

    #[error("invalid document: {0}")]
    InvalidDocument(String),
}

impl MigrationError {
    /// Reports of the steps applied before the failure.
    pub fn completed(&self) -> &[MigrationReport] {
        match self {
            MigrationError::MissingStep { completed, .. }
            | MigrationError::Step { completed, .. } => completed,
            MigrationError::ApplicationOutdated { .. } | MigrationError::InvalidDocument(_) => &[],
        }
    }
}
