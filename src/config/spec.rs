//! Manifest types for the reconciliation engine.
//!
//! This module defines the structs that map to the `kda.deploy.yaml` file:
//! the application being reconciled plus where to reach the remote API,
//! where to keep the observed snapshot, and how long to wait.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::tree::ApplicationTree;

/// The root structure of a manifest.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeployManifest {
    /// The application to reconcile.
    pub application: ApplicationSpec,
    /// Remote API settings.
    #[serde(default)]
    pub remote: RemoteConfig,
    /// Snapshot settings.
    #[serde(default)]
    pub state: StateConfig,
    /// Wait deadlines.
    #[serde(default)]
    pub timeouts: TimeoutConfig,
}

/// Identity and desired configuration of an application.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ApplicationSpec {
    /// Application name.
    pub name: String,
    /// Runtime identifier (for example `SQL-1_0` or `FLINK-1_18`). Create-only.
    pub runtime_environment: String,
    /// Free-form description. Create-only.
    #[serde(default)]
    pub description: Option<String>,
    /// Reconcilable configuration.
    #[serde(flatten)]
    pub tree: ApplicationTree,
}

/// Remote API settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RemoteConfig {
    /// Control-plane endpoint.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Per-request timeout in seconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    /// Environment variable holding a bearer token, if the endpoint requires one.
    #[serde(default)]
    pub auth_token_env: Option<String>,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            request_timeout_secs: default_request_timeout(),
            auth_token_env: None,
        }
    }
}

/// Snapshot settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct StateConfig {
    /// Directory holding the snapshot and lock files (defaults to `.kda`).
    #[serde(default)]
    pub path: Option<String>,
}

/// Wait deadlines, in seconds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TimeoutConfig {
    /// Deadline for each update to settle.
    #[serde(default = "default_wait")]
    pub update_secs: u64,
    /// Deadline for a start to reach RUNNING.
    #[serde(default = "default_wait")]
    pub start_secs: u64,
    /// Deadline for a stop to reach READY.
    #[serde(default = "default_wait")]
    pub stop_secs: u64,
    /// Deadline for a delete to complete.
    #[serde(default = "default_wait")]
    pub delete_secs: u64,
    /// Delay between status polls.
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            update_secs: default_wait(),
            start_secs: default_wait(),
            stop_secs: default_wait(),
            delete_secs: default_wait(),
            poll_interval_secs: default_poll_interval(),
        }
    }
}

impl TimeoutConfig {
    /// Update deadline.
    #[must_use]
    pub const fn update(&self) -> Duration {
        Duration::from_secs(self.update_secs)
    }

    /// Start deadline.
    #[must_use]
    pub const fn start(&self) -> Duration {
        Duration::from_secs(self.start_secs)
    }

    /// Stop deadline.
    #[must_use]
    pub const fn stop(&self) -> Duration {
        Duration::from_secs(self.stop_secs)
    }

    /// Delete deadline.
    #[must_use]
    pub const fn delete(&self) -> Duration {
        Duration::from_secs(self.delete_secs)
    }

    /// Poll interval.
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}

fn default_endpoint() -> String {
    String::from("https://kinesisanalytics.us-east-1.amazonaws.com")
}

const fn default_request_timeout() -> u64 {
    30
}

const fn default_wait() -> u64 {
    600
}

const fn default_poll_interval() -> u64 {
    5
}
