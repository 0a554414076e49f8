//! Local file-based config source.
//!
//! The desired manifest is read from a YAML file; snapshots and the lock
//! live next to it in a `.kda/` directory unless another one is given.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

use crate::config::{ConfigParser, DeployManifest};
use crate::error::{KdaError, Result, StateError};

use super::lock::{LOCK_EXPIRY_SECS, LockInfo, generate_holder_id};
use super::store::ConfigSource;
use super::types::{ObservedSnapshot, SNAPSHOT_VERSION};

/// Default state directory name.
pub const STATE_DIR: &str = ".kda";

const SNAPSHOT_FILE: &str = "snapshot.json";
const LOCK_FILE: &str = "state.lock";

/// Config source backed by a manifest file and a local state directory.
#[derive(Debug, Clone)]
pub struct LocalConfigSource {
    manifest_path: PathBuf,
    base_dir: PathBuf,
    snapshot_path: PathBuf,
    lock_path: PathBuf,
}

impl LocalConfigSource {
    /// Creates a source for `manifest_path`, keeping state in a `.kda`
    /// directory beside it.
    #[must_use]
    pub fn new(manifest_path: impl Into<PathBuf>) -> Self {
        let manifest_path = manifest_path.into();
        let base_dir = manifest_path
            .parent()
            .map_or_else(|| PathBuf::from("."), Path::to_path_buf)
            .join(STATE_DIR);
        Self::with_paths(manifest_path, base_dir)
    }

    /// Keeps state in `dir` instead.
    #[must_use]
    pub fn with_state_dir(self, dir: impl Into<PathBuf>) -> Self {
        Self::with_paths(self.manifest_path, dir.into())
    }

    fn with_paths(manifest_path: PathBuf, base_dir: PathBuf) -> Self {
        Self {
            snapshot_path: base_dir.join(SNAPSHOT_FILE),
            lock_path: base_dir.join(LOCK_FILE),
            manifest_path,
            base_dir,
        }
    }

    /// Path of the manifest.
    #[must_use]
    pub fn manifest_path(&self) -> &Path {
        &self.manifest_path
    }

    /// Directory holding snapshot and lock files.
    #[must_use]
    pub fn state_dir(&self) -> &Path {
        &self.base_dir
    }

    async fn ensure_dir(&self) -> Result<()> {
        if !self.base_dir.exists() {
            debug!("Creating state directory: {}", self.base_dir.display());
            fs::create_dir_all(&self.base_dir).await?;
        }
        Ok(())
    }

    async fn read_lock_file(&self) -> Result<Option<LockInfo>> {
        if !self.lock_path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&self.lock_path).await?;
        let lock: LockInfo = serde_json::from_str(&content).map_err(|e| {
            KdaError::State(StateError::Corrupted {
                message: format!("Failed to parse lock file: {e}"),
            })
        })?;

        Ok(Some(lock))
    }

    async fn write_lock_file(&self, lock: &LockInfo) -> Result<()> {
        self.ensure_dir().await?;

        let content = serde_json::to_string_pretty(lock)
            .map_err(|e| StateError::serialization(e.to_string()))?;
        let lock_failed = |e: std::io::Error| {
            KdaError::State(StateError::LockFailed {
                message: format!("Failed to write lock file: {e}"),
            })
        };

        let mut file = fs::File::create(&self.lock_path).await.map_err(lock_failed)?;
        file.write_all(content.as_bytes()).await.map_err(lock_failed)?;
        file.sync_all().await.map_err(lock_failed)?;
        Ok(())
    }

    async fn delete_lock_file(&self) -> Result<()> {
        if self.lock_path.exists() {
            fs::remove_file(&self.lock_path).await.map_err(|e| {
                KdaError::State(StateError::LockFailed {
                    message: format!("Failed to delete lock file: {e}"),
                })
            })?;
        }
        Ok(())
    }
}

#[async_trait]
impl ConfigSource for LocalConfigSource {
    async fn desired(&self) -> Result<DeployManifest> {
        let parser = match self.manifest_path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => ConfigParser::new().with_base_path(dir),
            _ => ConfigParser::new(),
        };
        parser.load_dotenv()?;
        parser.load_with_env(&self.manifest_path)
    }

    async fn load_snapshot(&self) -> Result<Option<ObservedSnapshot>> {
        if !self.snapshot_path.exists() {
            debug!("No snapshot at: {}", self.snapshot_path.display());
            return Ok(None);
        }

        debug!("Loading snapshot from: {}", self.snapshot_path.display());
        let content = fs::read_to_string(&self.snapshot_path).await?;
        let snapshot: ObservedSnapshot = serde_json::from_str(&content).map_err(|e| {
            KdaError::State(StateError::Corrupted {
                message: format!("Failed to parse snapshot: {e}"),
            })
        })?;

        if snapshot.version != SNAPSHOT_VERSION {
            return Err(KdaError::State(StateError::VersionMismatch {
                expected: SNAPSHOT_VERSION.to_string(),
                found: snapshot.version,
            }));
        }

        Ok(Some(snapshot))
    }

    async fn save_snapshot(&self, snapshot: &ObservedSnapshot) -> Result<()> {
        self.ensure_dir().await?;

        info!("Saving snapshot to: {}", self.snapshot_path.display());
        let content = serde_json::to_string_pretty(snapshot)
            .map_err(|e| StateError::serialization(e.to_string()))?;

        // Written beside the target and renamed over it.
        let temp_path = self.snapshot_path.with_extension("tmp");
        let mut file = fs::File::create(&temp_path).await?;
        file.write_all(content.as_bytes()).await?;
        file.sync_all().await?;
        fs::rename(&temp_path, &self.snapshot_path).await?;

        debug!("Snapshot saved at version {}", snapshot.version_id);
        Ok(())
    }

    async fn delete_snapshot(&self) -> Result<()> {
        if self.snapshot_path.exists() {
            info!("Deleting snapshot: {}", self.snapshot_path.display());
            fs::remove_file(&self.snapshot_path).await?;
        }
        Ok(())
    }

    async fn acquire_lock(&self, holder: &str, application: &str) -> Result<LockInfo> {
        if let Some(existing) = self.read_lock_file().await? {
            if !existing.is_expired() {
                return Err(KdaError::State(StateError::LockedByOther {
                    holder: existing.holder,
                    since: existing.acquired_at.to_rfc3339(),
                }));
            }
            warn!("Taking over expired lock held by {}", existing.holder);
        }

        let holder = if holder.is_empty() {
            generate_holder_id()
        } else {
            holder.to_string()
        };

        let lock = LockInfo::new(&holder, application);
        self.write_lock_file(&lock).await?;

        info!(
            "Acquired state lock: {} (expires in {}s)",
            lock.lock_id, LOCK_EXPIRY_SECS
        );
        Ok(lock)
    }

    async fn release_lock(&self, lock_id: &str) -> Result<()> {
        match self.read_lock_file().await? {
            Some(existing) if existing.lock_id == lock_id => {
                self.delete_lock_file().await?;
                info!("Released state lock: {}", lock_id);
            }
            Some(existing) => {
                debug!("Lock {} is now held as {}, leaving it", lock_id, existing.lock_id);
            }
            None => {}
        }
        Ok(())
    }

    async fn lock_info(&self) -> Result<Option<LockInfo>> {
        self.read_lock_file().await
    }

    async fn force_unlock(&self) -> Result<()> {
        if let Some(existing) = self.read_lock_file().await? {
            warn!("Force-removing lock held by {}", existing.holder);
        }
        self.delete_lock_file().await
    }

    fn backend_type(&self) -> &'static str {
        "local"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ApplicationTree;
    use crate::remote::types::ApplicationStatus;
    use crate::state::{HistoryEntry, SyncOperation};
    use crate::testing::detail;
    use tempfile::TempDir;
    use tokio_test::block_on;

    const MANIFEST: &str = r"
application:
  name: clicks
  runtime_environment: FLINK-1_18
  service_execution_role: arn:role
";

    fn create_source() -> (LocalConfigSource, TempDir) {
        let temp = TempDir::new().expect("temp dir");
        let manifest = temp.path().join("kda.deploy.yaml");
        std::fs::write(&manifest, MANIFEST).expect("write manifest");
        (LocalConfigSource::new(manifest), temp)
    }

    #[tokio::test]
    async fn test_desired_reads_manifest() {
        let (source, _temp) = create_source();
        let manifest = source.desired().await.expect("desired");
        assert_eq!(manifest.application.name, "clicks");
        assert_eq!(manifest.application.tree.service_execution_role, "arn:role");
    }

    #[tokio::test]
    async fn test_snapshot_round_trip() {
        let (source, _temp) = create_source();
        assert!(source.load_snapshot().await.expect("load").is_none());

        let described = detail("clicks", 4, ApplicationStatus::Running);
        let mut snapshot = ObservedSnapshot::from_detail(&described, ApplicationTree::default(), "h");
        snapshot.add_history(HistoryEntry::new(SyncOperation::Reconcile, 4, 2));
        source.save_snapshot(&snapshot).await.expect("save");

        let loaded = source
            .load_snapshot()
            .await
            .expect("load")
            .expect("snapshot should exist");
        assert_eq!(loaded, snapshot);
        assert!(source.state_dir().ends_with(STATE_DIR));

        source.delete_snapshot().await.expect("delete");
        assert!(source.load_snapshot().await.expect("load").is_none());
    }

    #[tokio::test]
    async fn test_corrupted_snapshot() {
        let (source, _temp) = create_source();
        std::fs::create_dir_all(source.state_dir()).expect("mkdir");
        std::fs::write(source.state_dir().join(SNAPSHOT_FILE), "{not json").expect("write");

        let err = source.load_snapshot().await.unwrap_err();
        assert!(matches!(err, KdaError::State(StateError::Corrupted { .. })));
    }

    #[test]
    fn test_snapshot_format_mismatch() {
        let (source, _temp) = create_source();
        let described = detail("clicks", 1, ApplicationStatus::Ready);
        let mut snapshot = ObservedSnapshot::from_detail(&described, ApplicationTree::default(), "h");
        snapshot.version = "0.9".to_string();
        block_on(source.save_snapshot(&snapshot)).expect("save");

        let err = block_on(source.load_snapshot()).unwrap_err();
        assert!(matches!(
            err,
            KdaError::State(StateError::VersionMismatch { ref found, .. }) if found == "0.9"
        ));
    }

    #[tokio::test]
    async fn test_lock_conflict_and_release() {
        let (source, _temp) = create_source();

        let lock = source.acquire_lock("holder-1", "clicks").await.expect("first lock");
        let err = source.acquire_lock("holder-2", "clicks").await.unwrap_err();
        assert!(matches!(
            err,
            KdaError::State(StateError::LockedByOther { ref holder, .. }) if holder == "holder-1"
        ));

        source.release_lock("someone-else").await.expect("release");
        assert!(source.lock_info().await.expect("info").is_some());

        source.release_lock(&lock.lock_id).await.expect("release");
        assert!(source.lock_info().await.expect("info").is_none());
    }

    #[tokio::test]
    async fn test_expired_lock_is_taken_over() {
        let (source, _temp) = create_source();
        let mut stale = LockInfo::new("crashed", "clicks");
        stale.expires_at = chrono::Utc::now() - chrono::Duration::seconds(1);
        source.write_lock_file(&stale).await.expect("write lock");

        let lock = source.acquire_lock("", "clicks").await.expect("take over");
        assert_ne!(lock.holder, "crashed");
    }

    #[tokio::test]
    async fn test_force_unlock() {
        let (source, _temp) = create_source();
        source.acquire_lock("holder-1", "clicks").await.expect("lock");
        source.force_unlock().await.expect("force unlock");
        assert!(source.lock_info().await.expect("info").is_none());
    }
}
