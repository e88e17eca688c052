//! Structural comparison of two revived documents.
//!
//! [`compare`] walks both trees and lists raw [`Difference`]s; [`attribute`]
//! then folds the differences caused by a rename or a deletion under it.

pub mod attribute;
pub mod differ;
pub mod difference;
pub mod error;
pub mod render;

pub use attribute::{attribute, AttributedDiff, DifferenceSummary};
pub use differ::{compare, compare_with, CompareOptions};
pub use difference::{Category, ChildKey, Difference, DifferenceKind, NodeRef};
pub use error::CompareError;
pub use render::CSV_HEADER;

use studyconf_model::Document;

/// Compare two documents and attribute the result with the target's
/// registry.
pub fn diff(
    target: &Document,
    source: &Document,
    options: &CompareOptions,
) -> Result<AttributedDiff, CompareError> {
    let differences = compare_with(target, source, options)?;
    Ok(attribute(differences, target.registry()))
}
