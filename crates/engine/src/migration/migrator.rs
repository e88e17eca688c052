use serde_json::Value;
use studyconf_model::CONFIG_VERSION;

use super::error::MigrationError;
use super::registry::MigrationRegistry;
use super::report::MigrationReport;
use super::standard::standard_registry;

/// Upgrades plain documents through the steps of a [`MigrationRegistry`].
#[derive(Debug, Clone, Copy)]
pub struct Migrator<'r> {
    registry: &'r MigrationRegistry,
}

impl Migrator<'static> {
    /// A migrator over the built-in steps.
    pub fn standard() -> Self {
        Migrator::new(standard_registry())
    }
}

impl<'r> Migrator<'r> {
    pub fn new(registry: &'r MigrationRegistry) -> Self {
        Migrator { registry }
    }

    pub fn current_version(&self) -> u64 {
        self.registry.current_version()
    }

    pub fn is_up_to_date(&self, document: &Value) -> bool {
        document_version(document).ok() == Some(self.current_version())
    }

    /// Apply every step between the document version and the current one,
    /// in ascending order, and return one report per applied step.
    ///
    /// `configVersion` is advanced after each successful step. A failing step
    /// is undone before the error is returned; earlier steps are kept.
    pub fn migrate(&self, document: &mut Value) -> Result<Vec<MigrationReport>, MigrationError> {
        let current = self.current_version();
        let initial = document_version(document)?;
        if initial > current {
            return Err(MigrationError::ApplicationOutdated {
                document: initial,
                supported: current,
            });
        }

        let mut version = initial;
        let mut reports = Vec::new();
        while version < current {
            let Some(step) = self.registry.step_for(version) else {
                return Err(MigrationError::MissingStep {
                    version,
                    completed: reports,
                });
            };
            tracing::debug!(
                from = step.from_version,
                to = step.to_version,
                description = step.description,
                "applying migration step"
            );

            let snapshot = document.clone();
            match (step.transform)(document) {
                Ok(nodes) => {
                    set_document_version(document, step.to_version);
                    version = step.to_version;
                    reports.push(MigrationReport::new(step, nodes));
                }
                Err(source) => {
                    tracing::warn!(
                        from = step.from_version,
                        to = step.to_version,
                        error = %source,
                        "migration step failed, document restored to version {}",
                        version
                    );
                    *document = snapshot;
                    return Err(MigrationError::Step {
                        from: step.from_version,
                        to: step.to_version,
                        source,
                        completed: reports,
                    });
                }
            }
        }

        if !reports.is_empty() {
            tracing::info!(from = initial, to = version, steps = reports.len(), "document migrated");
        }
        Ok(reports)
    }
}

/// Read `configVersion` from a plain document.
pub fn document_version(document: &Value) -> Result<u64, MigrationError> {
    let root = document
        .as_object()
        .ok_or_else(|| MigrationError::InvalidDocument("document is not an object".to_string()))?;
    root.get(CONFIG_VERSION)
        .and_then(Value::as_u64)
        .ok_or_else(|| {
            MigrationError::InvalidDocument(format!(
                "'{}' is missing or not a non-negative integer",
                CONFIG_VERSION
            ))
        })
}

fn set_document_version(document: &mut Value, version: u64) {
    if let Some(root) = document.as_object_mut() {
        root.insert(CONFIG_VERSION.to_string(), Value::from(version));
    }
}
