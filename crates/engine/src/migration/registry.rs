use serde_json::Value;

use super::error::{MigrationStepError, RegistryError};
use super::report::AffectedNode;

/// Version assumed current when no step is registered.
pub const BASELINE_VERSION: u64 = 119;

/// Transformation applied to a plain document, returning the nodes it touched.
pub type Transform = fn(&mut Value) -> Result<Vec<AffectedNode>, MigrationStepError>;

/// One version-to-version transformation.
#[derive(Clone, Copy)]
pub struct MigrationStep {
    pub from_version: u64,
    pub to_version: u64,
    pub description: &'static str,
    /// Manual follow-up the user should carry out after the step.
    pub instructions: Option<&'static str>,
    pub transform: Transform,
}

impl std::fmt::Debug for MigrationStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MigrationStep")
            .field("from_version", &self.from_version)
            .field("to_version", &self.to_version)
            .field("description", &self.description)
            .finish()
    }
}

/// An ordered, validated set of migration steps.
#[derive(Debug, Clone, Default)]
pub struct MigrationRegistry {
    pub(crate) steps: Vec<MigrationStep>,
}

impl MigrationRegistry {
    /// Sort and validate steps. Each step must move forward, and no two
    /// steps may cover the same version.
    pub fn new(mut steps: Vec<MigrationStep>) -> Result<Self, RegistryError> {
        if let Some(step) = steps.iter().find(|s| s.to_version <= s.from_version) {
            return Err(RegistryError::InvalidRange {
                from: step.from_version,
                to: step.to_version,
            });
        }
        steps.sort_by_key(|s| s.from_version);
        for pair in steps.windows(2) {
            let (first, second) = (&pair[0], &pair[1]);
            if first.from_version == second.from_version {
                return Err(RegistryError::DuplicateStep {
                    from: first.from_version,
                });
            }
            if second.from_version < first.to_version {
                return Err(RegistryError::OverlappingSteps {
                    first: first.from_version,
                    first_to: first.to_version,
                    second: second.from_version,
                });
            }
        }
        Ok(MigrationRegistry { steps })
    }

    pub fn steps(&self) -> &[MigrationStep] {
        &self.steps
    }

    /// Target version of the newest step, or [`BASELINE_VERSION`].
    pub fn current_version(&self) -> u64 {
        self.steps
            .last()
            .map(|s| s.to_version)
            .unwrap_or(BASELINE_VERSION)
    }

    /// The step whose range covers `version`.
    pub fn step_for(&self, version: u64) -> Option<&MigrationStep> {
        self.steps
            .iter()
            .find(|s| s.from_version <= version && version < s.to_version)
    }
}
