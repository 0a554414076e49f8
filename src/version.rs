//! Application version tracking.
//!
//! Every mutating call names the version it is based on, and every
//! successful call returns the next one. The handle threads that value
//! through a reconciliation run.

use std::fmt;
use tracing::{debug, warn};

/// Name and current version of a remote application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionedHandle {
    /// Application name.
    resource_name: String,
    /// Version the next mutating call must carry.
    current_version: i64,
}

impl VersionedHandle {
    /// Creates a handle from the last observed version.
    #[must_use]
    pub fn new(resource_name: impl Into<String>, current_version: i64) -> Self {
        Self {
            resource_name: resource_name.into(),
            current_version,
        }
    }

    /// Returns the application name.
    #[must_use]
    pub fn resource_name(&self) -> &str {
        &self.resource_name
    }

    /// Returns the version the next mutating call must carry.
    #[must_use]
    pub const fn current(&self) -> i64 {
        self.current_version
    }

    /// Records the version returned by a successful call.
    ///
    /// The returned value is taken as-is; a value that does not increase is
    /// logged since it means another writer or a remote rollback.
    pub fn advance(&mut self, new_version: i64) {
        if new_version <= self.current_version {
            warn!(
                "Version of '{}' did not increase: {} -> {}",
                self.resource_name, self.current_version, new_version
            );
        } else {
            debug!(
                "Version of '{}' advanced: {} -> {}",
                self.resource_name, self.current_version, new_version
            );
        }
        self.current_version = new_version;
    }
}

impl fmt::Display for VersionedHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@v{}", self.resource_name, self.current_version)
    }
}
