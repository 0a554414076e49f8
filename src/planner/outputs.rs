//! Set reconciliation for the output list.
//!
//! Outputs are matched by content, ignoring identity. Anything desired but
//! not observed is added; anything observed but not desired is deleted by
//! its identity.

use tracing::warn;

use crate::config::{Identified, Output};

/// Calls needed to turn the observed outputs into the desired ones.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutputChanges {
    /// Identities of observed outputs to delete. Drained before any add.
    pub to_remove: Vec<String>,
    /// Desired outputs to add, without identities.
    pub to_add: Vec<Output>,
    /// Entries that could not be reconciled and were skipped.
    pub warnings: Vec<String>,
}

impl OutputChanges {
    /// Returns true when no call is needed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.to_remove.is_empty() && self.to_add.is_empty()
    }
}

/// Computes removals and additions between two output lists.
///
/// Outputs present on both sides with the same content are left alone. A
/// desired output that already carries an identity, or an observed output
/// that has none, is skipped with a warning.
#[must_use]
pub fn reconcile_outputs(observed: &[Output], desired: &[Output]) -> OutputChanges {
    let mut changes = OutputChanges::default();

    for output in observed {
        if desired.iter().any(|d| d.same_content(output)) {
            continue;
        }
        match output.identity().filter(|id| !id.is_empty()) {
            Some(id) => changes.to_remove.push(id.to_string()),
            None => {
                let message = format!(
                    "Observed output '{}' has no identity and cannot be deleted",
                    output.name
                );
                warn!("{}", message);
                changes.warnings.push(message);
            }
        }
    }

    for output in desired {
        if observed.iter().any(|o| o.same_content(output)) {
            continue;
        }
        if output.identity().is_some_and(|id| !id.is_empty()) {
            let message = format!(
                "Desired output '{}' carries an identity and was not added",
                output.name
            );
            warn!("{}", message);
            changes.warnings.push(message);
            continue;
        }
        changes.to_add.push(output.clone());
    }

    changes
}
