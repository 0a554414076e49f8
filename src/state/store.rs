//! Source of desired configuration and keeper of observed snapshots.

use async_trait::async_trait;

use crate::config::DeployManifest;
use crate::error::Result;

use super::lock::LockInfo;
use super::types::ObservedSnapshot;

/// Supplies the desired manifest and persists what was observed.
///
/// How the manifest is found and how snapshots are stored is entirely up to
/// the implementation.
#[async_trait]
pub trait ConfigSource: Send + Sync {
    /// Loads the desired manifest.
    async fn desired(&self) -> Result<DeployManifest>;

    /// Loads the last saved snapshot, if any.
    async fn load_snapshot(&self) -> Result<Option<ObservedSnapshot>>;

    /// Saves a snapshot, replacing the previous one.
    async fn save_snapshot(&self, snapshot: &ObservedSnapshot) -> Result<()>;

    /// Removes the saved snapshot.
    async fn delete_snapshot(&self) -> Result<()>;

    /// Takes the lock for `application`.
    ///
    /// Fails with `StateError::LockedByOther` while another live lock exists.
    async fn acquire_lock(&self, holder: &str, application: &str) -> Result<LockInfo>;

    /// Releases a lock previously returned by [`acquire_lock`](Self::acquire_lock).
    async fn release_lock(&self, lock_id: &str) -> Result<()>;

    /// Returns the current lock, expired or not.
    async fn lock_info(&self) -> Result<Option<LockInfo>>;

    /// Removes any lock regardless of holder.
    async fn force_unlock(&self) -> Result<()>;

    /// Short backend name for display.
    fn backend_type(&self) -> &'static str;
}
