/// Errors raised by [`compare`](super::compare).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CompareError {
    /// The documents are at different schema versions; migrate first.
    #[error(
        "cannot compare documents at different versions (target {}, source {})",
        display_version(.target_version),
        display_version(.source_version)
    )]
    VersionMismatch {
        target_version: Option<u64>,
        source_version: Option<u64>,
    },
}

fn display_version(version: &Option<u64>) -> String {
    version
        .map(|v| v.to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn version_mismatch_names_both_versions() {
        let err = CompareError::VersionMismatch {
            target_version: Some(119),
            source_version: None,
        };
        assert_eq!(
            err.to_string(),
            "cannot compare documents at different versions (target 119, source unknown)"
        );
        assert!(err.source().is_none());
    }
}
