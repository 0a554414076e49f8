//! Snapshot types.
//!
//! An [`ObservedSnapshot`] is what the engine last saw of the remote
//! application after a successful sync. It is used for `status`, for
//! carrying run intent (`start_application`, `force_stop`) that the remote
//! system does not report, and for the sync history.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::ApplicationTree;
use crate::remote::types::{ApplicationDetail, ApplicationStatus};

/// Current snapshot format version.
pub const SNAPSHOT_VERSION: &str = "1.0";

/// Maximum number of history entries kept in a snapshot.
pub const MAX_HISTORY: usize = 100;

/// The observed state of one application.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ObservedSnapshot {
    /// Snapshot format version.
    pub version: String,
    /// Application name.
    pub application_name: String,
    /// Application ARN.
    pub application_arn: String,
    /// Remote version after the last sync.
    pub version_id: i64,
    /// Remote status after the last sync.
    pub status: ApplicationStatus,
    /// Creation time reported by the remote system, needed for delete.
    #[serde(default)]
    pub create_timestamp: Option<f64>,
    /// Observed configuration tree, identities included.
    pub tree: ApplicationTree,
    /// Hash of the desired tree that produced this snapshot.
    pub config_hash: String,
    /// When the snapshot was written.
    pub last_updated: DateTime<Utc>,
    /// Sync history, newest last.
    #[serde(default)]
    pub history: Vec<HistoryEntry>,
}

impl ObservedSnapshot {
    /// Builds a snapshot from a description and the tree flattened from it.
    #[must_use]
    pub fn from_detail(detail: &ApplicationDetail, tree: ApplicationTree, config_hash: &str) -> Self {
        Self {
            version: SNAPSHOT_VERSION.to_string(),
            application_name: detail.application_name.clone(),
            application_arn: detail.application_arn.clone(),
            version_id: detail.application_version_id,
            status: detail.application_status,
            create_timestamp: detail.create_timestamp,
            tree,
            config_hash: config_hash.to_string(),
            last_updated: Utc::now(),
            history: Vec::new(),
        }
    }

    /// Carries the history of a previous snapshot over.
    #[must_use]
    pub fn with_history(mut self, history: Vec<HistoryEntry>) -> Self {
        self.history = history;
        self
    }

    /// Appends a history entry, dropping the oldest past [`MAX_HISTORY`].
    pub fn add_history(&mut self, entry: HistoryEntry) {
        self.history.push(entry);
        if self.history.len() > MAX_HISTORY {
            let excess = self.history.len() - MAX_HISTORY;
            self.history.drain(..excess);
        }
    }

    /// Last history entry, if any.
    #[must_use]
    pub fn last_sync(&self) -> Option<&HistoryEntry> {
        self.history.last()
    }
}

/// One sync recorded in a snapshot.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HistoryEntry {
    /// When the sync finished.
    pub timestamp: DateTime<Utc>,
    /// What the sync did.
    pub operation: SyncOperation,
    /// Remote version after the sync.
    pub version_id: i64,
    /// Number of remote mutations issued.
    pub mutations: usize,
    /// Whether the sync succeeded.
    pub success: bool,
    /// Error message if it failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl HistoryEntry {
    /// A successful sync.
    #[must_use]
    pub fn new(operation: SyncOperation, version_id: i64, mutations: usize) -> Self {
        Self {
            timestamp: Utc::now(),
            operation,
            version_id,
            mutations,
            success: true,
            error: None,
        }
    }

    /// A failed sync.
    #[must_use]
    pub fn failed(operation: SyncOperation, version_id: i64, error: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            operation,
            version_id,
            mutations: 0,
            success: false,
            error: Some(error.into()),
        }
    }
}

/// Kind of sync recorded in history.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SyncOperation {
    /// The application was created.
    Create,
    /// Configuration was reconciled.
    Reconcile,
    /// No remote change was needed.
    NoOp,
}

impl std::fmt::Display for SyncOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Create => write!(f, "create"),
            Self::Reconcile => write!(f, "reconcile"),
            Self::NoOp => write!(f, "no-op"),
        }
    }
}
