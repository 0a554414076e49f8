//! Reconciler entry points.
//!
//! [`Reconciler::reconcile`] converges one application's configuration from
//! an observed tree to a desired tree and returns the final version.
//! [`Reconciler::apply_lifecycle`] then brings the run state in line.
//! [`Reconciler::sync`] drives both from a [`ConfigSource`], creating the
//! application when it does not exist yet and saving a snapshot afterwards.

use serde::Serialize;
use std::fmt;
use std::future::Future;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::{
    ApplicationSpec, ApplicationTree, ConfigHasher, ConfigValidator, DeployManifest, TimeoutConfig,
    contract_violations,
};
use crate::error::{KdaError, ReconcileError, RemoteError, Result};
use crate::lifecycle::{LifecycleController, LifecycleOutcome};
use crate::mapper::{expand, flatten};
use crate::planner::{DiffEngine, ExecutionResult, OperationKind, OperationPlan, PlanExecutor};
use crate::remote::types::{self as wire, ApplicationStatus};
use crate::remote::{RemoteClient, Waiter};
use crate::state::{ConfigSource, HistoryEntry, ObservedSnapshot, SyncOperation};
use crate::version::VersionedHandle;

/// Reconciler for one remote application at a time.
pub struct Reconciler<'a> {
    /// Remote client.
    client: &'a dyn RemoteClient,
    /// Convergence waiter.
    waiter: &'a dyn Waiter,
    /// Wait deadlines.
    timeouts: TimeoutConfig,
    /// Caller-supplied cancellation signal.
    cancel: CancellationToken,
    /// Diff engine.
    diff_engine: DiffEngine,
    /// Tree hasher.
    hasher: ConfigHasher,
}

/// What a sync did.
#[derive(Debug, Clone, Serialize)]
pub struct SyncReport {
    /// Application name.
    pub application: String,
    /// Whether the application was created.
    pub created: bool,
    /// Descriptions of the configuration operations issued.
    pub operations: Vec<String>,
    /// Start/stop outcome.
    pub lifecycle: String,
    /// Version after the sync.
    pub version_id: i64,
    /// Status after the sync.
    pub status: ApplicationStatus,
    /// Hash of the desired tree.
    pub config_hash: String,
}

impl SyncReport {
    /// Returns true when no remote change was made.
    #[must_use]
    pub fn is_noop(&self) -> bool {
        !self.created
            && self.operations.is_empty()
            && self.lifecycle == LifecycleOutcome::Unchanged.to_string()
    }
}

impl fmt::Display for SyncReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_noop() {
            return write!(
                f,
                "'{}' is up to date (version {}, {})",
                self.application, self.version_id, self.status
            );
        }

        writeln!(f, "Synced '{}':", self.application)?;
        if self.created {
            writeln!(f, "  Created application")?;
        }
        for operation in &self.operations {
            writeln!(f, "  - {operation}")?;
        }
        writeln!(f, "  Lifecycle: {}", self.lifecycle)?;
        write!(f, "  Version: {}  Status: {}", self.version_id, self.status)
    }
}

/// What a sync would do, computed without mutating anything.
#[derive(Debug, Clone)]
pub enum SyncPreview {
    /// The application does not exist and would be created.
    Create(Box<wire::CreateApplicationRequest>),
    /// The application exists.
    Update {
        /// Version the plan would start from.
        version_id: i64,
        /// Status at the time of the preview.
        status: ApplicationStatus,
        /// Configuration operations, in order.
        plan: OperationPlan,
        /// Start or stop that would follow, if any.
        lifecycle: Option<OperationKind>,
    },
}

impl fmt::Display for SyncPreview {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Create(request) => write!(
                f,
                "Application '{}' does not exist and will be created ({})",
                request.application_name, request.runtime_environment
            ),
            Self::Update {
                version_id,
                status,
                plan,
                lifecycle,
            } => {
                writeln!(f, "Current version {version_id} ({status})")?;
                write!(f, "{plan}")?;
                if let Some(kind) = lifecycle {
                    write!(f, "\nThen: {kind} application")?;
                }
                Ok(())
            }
        }
    }
}

impl<'a> Reconciler<'a> {
    /// Creates a new reconciler.
    #[must_use]
    pub fn new(client: &'a dyn RemoteClient, waiter: &'a dyn Waiter, timeouts: TimeoutConfig) -> Self {
        Self {
            client,
            waiter,
            timeouts,
            cancel: CancellationToken::new(),
            diff_engine: DiffEngine::new(),
            hasher: ConfigHasher::new(),
        }
    }

    /// Sets the cancellation signal.
    #[must_use]
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    async fn cancellable<T>(&self, future: impl Future<Output = Result<T>>) -> Result<T> {
        if self.cancel.is_cancelled() {
            return Err(KdaError::Reconcile(ReconcileError::Cancelled));
        }
        tokio::select! {
            biased;
            () = self.cancel.cancelled() => Err(KdaError::Reconcile(ReconcileError::Cancelled)),
            result = future => result,
        }
    }

    /// Plans the operations that take `observed` to `desired`.
    ///
    /// # Errors
    ///
    /// Returns a contract violation if `desired` breaks a structural rule or
    /// the diff cannot be expressed as remote calls.
    pub fn plan(&self, observed: &ApplicationTree, desired: &ApplicationTree) -> Result<OperationPlan> {
        if let Some(violation) = contract_violations(desired).into_iter().next() {
            return Err(violation.into());
        }

        let diff = self.diff_engine.diff(observed, desired);
        if !diff.has_changes() {
            debug!("No configuration changes");
            return Ok(OperationPlan::empty());
        }

        OperationPlan::from_diff(&diff)
    }

    /// Converges the configuration of `handle`'s application.
    ///
    /// The whole plan is computed before the first call. Returns the version
    /// after the last applied call, which is the starting version when
    /// nothing needed to change.
    ///
    /// # Errors
    ///
    /// Returns a contract violation with no call issued, or the first
    /// failing step's error. Steps before it stay applied.
    pub async fn reconcile(
        &self,
        observed: &ApplicationTree,
        desired: &ApplicationTree,
        handle: &mut VersionedHandle,
    ) -> Result<i64> {
        let result = self.execute(observed, desired, handle).await?;
        Ok(result.final_version)
    }

    async fn execute(
        &self,
        observed: &ApplicationTree,
        desired: &ApplicationTree,
        handle: &mut VersionedHandle,
    ) -> Result<ExecutionResult> {
        let plan = self.plan(observed, desired)?;
        if plan.is_empty() {
            info!("{} is converged", handle);
            return Ok(ExecutionResult {
                results: Vec::new(),
                final_version: handle.current(),
            });
        }

        info!(
            "Reconciling {}: {} operations across {} areas",
            handle,
            plan.operation_count(),
            plan.areas().len()
        );

        PlanExecutor::new(self.client, self.waiter, self.timeouts.update())
            .with_cancellation(self.cancel.clone())
            .execute(&plan, handle)
            .await
    }

    /// Brings the run state of `name` to the one in `desired`.
    ///
    /// # Errors
    ///
    /// Returns an error if describing, starting, stopping or waiting fails.
    pub async fn apply_lifecycle(&self, name: &str, desired: &ApplicationTree) -> Result<LifecycleOutcome> {
        LifecycleController::new(self.client, self.waiter, self.timeouts.clone())
            .with_cancellation(self.cancel.clone())
            .apply(name, desired)
            .await
    }

    /// Computes what [`sync`](Self::sync) would do for `manifest`.
    ///
    /// # Errors
    ///
    /// Returns an error if the manifest is invalid or describing fails.
    pub async fn preview(&self, manifest: &DeployManifest) -> Result<SyncPreview> {
        ConfigValidator::new().validate(manifest)?;
        let spec = &manifest.application;

        let detail = match self.describe(&spec.name).await? {
            Some(detail) => detail,
            None => return Ok(SyncPreview::Create(Box::new(expand::create_request(spec)?))),
        };

        let observed = flatten::application_tree(&detail);
        let plan = self.plan(&observed, &spec.tree)?;
        let lifecycle = match (spec.tree.start_application, detail.application_status) {
            (true, ApplicationStatus::Ready) => Some(OperationKind::Start),
            (false, ApplicationStatus::Running) => Some(OperationKind::Stop),
            _ => None,
        };

        Ok(SyncPreview::Update {
            version_id: detail.application_version_id,
            status: detail.application_status,
            plan,
            lifecycle,
        })
    }

    /// Loads the desired manifest from `source` and converges the remote
    /// application to it.
    ///
    /// The source lock is held for the whole run and released on failure
    /// too. A failed run is recorded in the previous snapshot's history.
    ///
    /// # Errors
    ///
    /// Returns an error if the manifest is invalid, the lock is held, or any
    /// remote step fails.
    pub async fn sync(&self, source: &dyn ConfigSource) -> Result<SyncReport> {
        let manifest = source.desired().await?;
        ConfigValidator::new().validate(&manifest)?;
        let name = manifest.application.name.clone();

        let lock = source.acquire_lock("", &name).await?;
        let result = self.sync_locked(source, &manifest.application).await;

        if let Err(e) = &result {
            Self::record_failure(source, e).await;
        }
        if let Err(e) = source.release_lock(&lock.lock_id).await {
            warn!("Failed to release state lock: {}", e);
        }

        result
    }

    async fn sync_locked(&self, source: &dyn ConfigSource, spec: &ApplicationSpec) -> Result<SyncReport> {
        let previous = source.load_snapshot().await?;
        let desired = &spec.tree;

        let (created, operations) = match self.describe(&spec.name).await? {
            Some(detail) => {
                let observed = flatten::application_tree(&detail);
                let mut handle = VersionedHandle::new(&spec.name, detail.application_version_id);
                let result = self.execute(&observed, desired, &mut handle).await?;
                let operations = result
                    .results
                    .iter()
                    .filter(|r| !r.skipped())
                    .map(|r| r.operation.description.clone())
                    .collect();
                (false, operations)
            }
            None => {
                self.create(spec).await?;
                (true, Vec::new())
            }
        };

        let lifecycle = self.apply_lifecycle(&spec.name, desired).await?;

        let detail = self
            .cancellable(self.client.describe_application(&spec.name))
            .await?;
        let mut tree = flatten::application_tree(&detail);
        tree.start_application = desired.start_application;
        tree.force_stop = desired.force_stop;

        let config_hash = self.hasher.hash_tree(desired);
        let mut snapshot = ObservedSnapshot::from_detail(&detail, tree, &config_hash)
            .with_history(previous.map(|p| p.history).unwrap_or_default());

        let operation = if created {
            SyncOperation::Create
        } else if operations.is_empty() && lifecycle == LifecycleOutcome::Unchanged {
            SyncOperation::NoOp
        } else {
            SyncOperation::Reconcile
        };
        snapshot.add_history(HistoryEntry::new(
            operation,
            detail.application_version_id,
            operations.len() + usize::from(created),
        ));
        source.save_snapshot(&snapshot).await?;

        info!(
            "Sync of '{}' finished at version {} ({})",
            spec.name, detail.application_version_id, detail.application_status
        );

        Ok(SyncReport {
            application: spec.name.clone(),
            created,
            operations,
            lifecycle: lifecycle.to_string(),
            version_id: detail.application_version_id,
            status: detail.application_status,
            config_hash,
        })
    }

    async fn record_failure(source: &dyn ConfigSource, error: &KdaError) {
        match source.load_snapshot().await {
            Ok(Some(mut snapshot)) => {
                snapshot.add_history(HistoryEntry::failed(
                    SyncOperation::Reconcile,
                    snapshot.version_id,
                    error.to_string(),
                ));
                if let Err(e) = source.save_snapshot(&snapshot).await {
                    warn!("Failed to record sync failure: {}", e);
                }
            }
            Ok(None) => {}
            Err(e) => warn!("Failed to load snapshot to record failure: {}", e),
        }
    }

    /// Describes `name`, mapping NotFound to `None`.
    async fn describe(&self, name: &str) -> Result<Option<wire::ApplicationDetail>> {
        match self.cancellable(self.client.describe_application(name)).await {
            Ok(detail) => Ok(Some(detail)),
            Err(e) if e.is_not_found() => {
                debug!("Application '{}' does not exist", name);
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    async fn create(&self, spec: &ApplicationSpec) -> Result<()> {
        let request = expand::create_request(spec)?;

        info!("Creating application '{}' ({})", spec.name, spec.runtime_environment);
        let detail = self
            .cancellable(self.client.create_application(&request))
            .await?;
        self.cancellable(self.waiter.wait_until_stable(&spec.name, self.timeouts.update()))
            .await?;

        info!(
            "Created '{}' at version {}",
            spec.name, detail.application_version_id
        );
        Ok(())
    }

    /// Deletes the application named `name` and waits until it is gone.
    ///
    /// Returns false when it did not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the delete is rejected or does not finish in time.
    pub async fn destroy(&self, name: &str) -> Result<bool> {
        let Some(detail) = self.describe(name).await? else {
            info!("Application '{}' is already gone", name);
            return Ok(false);
        };

        let create_timestamp = detail.create_timestamp.ok_or_else(|| {
            KdaError::Remote(RemoteError::InvalidResponse {
                message: format!("description of '{name}' has no create timestamp"),
            })
        })?;

        let request = wire::DeleteApplicationRequest {
            application_name: name.to_string(),
            create_timestamp,
        };

        info!("Deleting application '{}' ({})", name, detail.application_status);
        match self.cancellable(self.client.delete_application(&request)).await {
            Ok(()) => {}
            Err(e) if e.is_not_found() => {
                info!("Application '{}' disappeared before delete", name);
                return Ok(true);
            }
            Err(e) => return Err(e),
        }

        self.cancellable(self.waiter.wait_until_deleted(name, self.timeouts.delete()))
            .await?;
        info!("Application '{}' deleted", name);
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{
        ApplicationConfiguration, ApplicationRestoreType, EnvironmentProperties,
        FlinkRunConfiguration, Input, Output, PropertyGroup, ResourceArn, RunConfiguration,
        SqlApplicationConfiguration,
    };
    use crate::error::{ErrorKind, StateError};
    use crate::planner::Area;
    use crate::state::LocalConfigSource;
    use crate::testing::{FakeRemoteClient, InstantWaiter};
    use std::collections::BTreeMap;
    use tempfile::TempDir;

    fn output(name: &str, id: Option<&str>) -> Output {
        Output {
            output_id: id.map(str::to_string),
            name: name.to_string(),
            kinesis_streams_output: Some(ResourceArn::new(format!("arn:stream/{name}"))),
            ..Default::default()
        }
    }

    fn sql_tree(input: Option<Input>, outputs: Vec<Output>) -> ApplicationTree {
        ApplicationTree {
            service_execution_role: "arn:role".to_string(),
            application_configuration: Some(ApplicationConfiguration {
                sql_application_configuration: Some(SqlApplicationConfiguration {
                    input,
                    outputs,
                    ..Default::default()
                }),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    fn flink_tree(groups: &[(&str, &str)]) -> ApplicationTree {
        ApplicationTree {
            service_execution_role: "arn:role".to_string(),
            application_configuration: Some(ApplicationConfiguration {
                environment_properties: Some(EnvironmentProperties {
                    property_groups: groups
                        .iter()
                        .map(|(id, value)| PropertyGroup {
                            property_group_id: (*id).to_string(),
                            property_map: BTreeMap::from([("key".to_string(), (*value).to_string())]),
                        })
                        .collect(),
                }),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_reconcile_threads_versions_through_calls() {
        let client = FakeRemoteClient::new("app", 1);
        let waiter = InstantWaiter::new();
        let reconciler = Reconciler::new(&client, &waiter, TimeoutConfig::default());
        let mut handle = VersionedHandle::new("app", 1);

        let observed = sql_tree(None, vec![output("A", Some("1.1"))]);
        let desired = sql_tree(None, vec![output("B", None), output("C", None)]);

        let version = reconciler
            .reconcile(&observed, &desired, &mut handle)
            .await
            .expect("reconcile");

        assert_eq!(
            client.mutations(),
            vec![
                "DeleteApplicationOutput",
                "AddApplicationOutput",
                "AddApplicationOutput"
            ]
        );
        assert_eq!(client.mutation_versions(), vec![1, 2, 3]);
        assert_eq!(version, 4);
        assert_eq!(handle.current(), 4);
    }

    #[tokio::test]
    async fn test_reconcile_converged_issues_no_calls() {
        let client = FakeRemoteClient::new("app", 5);
        let waiter = InstantWaiter::new();
        let reconciler = Reconciler::new(&client, &waiter, TimeoutConfig::default());
        let mut handle = VersionedHandle::new("app", 5);

        let tree = flink_tree(&[("g1", "v")]);
        let version = reconciler
            .reconcile(&tree, &tree, &mut handle)
            .await
            .expect("reconcile");

        assert_eq!(version, 5);
        assert!(client.calls().is_empty());
    }

    #[tokio::test]
    async fn test_input_removal_is_rejected_before_any_call() {
        let client = FakeRemoteClient::new("app", 1);
        let waiter = InstantWaiter::new();
        let reconciler = Reconciler::new(&client, &waiter, TimeoutConfig::default());
        let mut handle = VersionedHandle::new("app", 1);

        let input = Input {
            input_id: Some("1.1".to_string()),
            name_prefix: "SRC".to_string(),
            kinesis_streams_input: Some(ResourceArn::new("arn:in")),
            ..Default::default()
        };
        let observed = sql_tree(Some(input), vec![output("A", Some("1.2"))]);
        let desired = sql_tree(None, vec![output("B", None)]);

        let err = reconciler
            .reconcile(&observed, &desired, &mut handle)
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::ContractViolation);
        assert!(client.calls().is_empty());
        assert_eq!(handle.current(), 1);
    }

    #[tokio::test]
    async fn test_first_failure_stops_later_areas() {
        let client = FakeRemoteClient::new("app", 1).failing_on("DeleteApplicationOutput", 1);
        let waiter = InstantWaiter::new();
        let reconciler = Reconciler::new(&client, &waiter, TimeoutConfig::default());
        let mut handle = VersionedHandle::new("app", 1);

        let observed = sql_tree(None, vec![output("A", Some("1.1"))]);
        let desired = sql_tree(None, vec![output("B", None)]);

        let err = reconciler
            .reconcile(&observed, &desired, &mut handle)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            KdaError::Reconcile(ReconcileError::StepFailed {
                area: Area::Outputs,
                ..
            })
        ));
        assert_eq!(client.mutations(), vec!["DeleteApplicationOutput"]);
        assert_eq!(handle.current(), 1);
    }

    #[tokio::test]
    async fn test_preview_reports_create_for_missing_application() {
        let client = FakeRemoteClient::missing("app");
        let waiter = InstantWaiter::new();
        let reconciler = Reconciler::new(&client, &waiter, TimeoutConfig::default());

        let manifest: DeployManifest = serde_yaml::from_str(
            "application:\n  name: app\n  runtime_environment: FLINK-1_18\n  service_execution_role: arn:role\n",
        )
        .expect("manifest");

        let preview = reconciler.preview(&manifest).await.expect("preview");
        assert!(matches!(preview, SyncPreview::Create(_)));
        assert_eq!(client.mutation_count(), 0);
    }

    #[tokio::test]
    async fn test_preview_gates_lifecycle_on_stable_status() {
        let manifest: DeployManifest = serde_yaml::from_str(
            "application:\n  name: app\n  runtime_environment: FLINK-1_18\n  service_execution_role: arn:role\n  start_application: true\n",
        )
        .expect("manifest");
        let waiter = InstantWaiter::new();

        let starting = FakeRemoteClient::new("app", 2).with_status(ApplicationStatus::Starting);
        let preview = Reconciler::new(&starting, &waiter, TimeoutConfig::default())
            .preview(&manifest)
            .await
            .expect("preview");
        assert!(matches!(preview, SyncPreview::Update { lifecycle: None, .. }));

        let ready = FakeRemoteClient::new("app", 2);
        let preview = Reconciler::new(&ready, &waiter, TimeoutConfig::default())
            .preview(&manifest)
            .await
            .expect("preview");
        assert!(matches!(
            preview,
            SyncPreview::Update {
                lifecycle: Some(OperationKind::Start),
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_remote_snapshot_block_is_kept_when_left_out() {
        let mut described = crate::testing::detail("app", 4, ApplicationStatus::Ready);
        described.application_configuration_description =
            Some(wire::ApplicationConfigurationDescription {
                application_snapshot_configuration_description: Some(
                    wire::ApplicationSnapshotConfiguration {
                        snapshots_enabled: false,
                    },
                ),
                ..Default::default()
            });
        let client = FakeRemoteClient::new("app", 4).with_detail(described.clone());
        let waiter = InstantWaiter::new();
        let reconciler = Reconciler::new(&client, &waiter, TimeoutConfig::default());
        let mut handle = VersionedHandle::new("app", 4);

        let observed = flatten::application_tree(&described);
        let desired = ApplicationTree {
            service_execution_role: "arn:role".to_string(),
            ..Default::default()
        };

        let version = reconciler
            .reconcile(&observed, &desired, &mut handle)
            .await
            .expect("reconcile");

        assert_eq!(version, 4);
        assert!(client.calls().is_empty());
    }

    #[tokio::test]
    async fn test_run_configuration_filled_by_remote_is_not_resent() {
        let mut described = crate::testing::detail("app", 7, ApplicationStatus::Running);
        described.runtime_environment = "FLINK-1_18".to_string();
        described.application_configuration_description =
            Some(wire::ApplicationConfigurationDescription {
                run_configuration_description: Some(wire::RunConfigurationDescription {
                    application_restore_configuration_description: Some(
                        wire::ApplicationRestoreConfiguration {
                            application_restore_type:
                                ApplicationRestoreType::RestoreFromLatestSnapshot,
                            snapshot_name: None,
                        },
                    ),
                    flink_run_configuration_description: Some(wire::FlinkRunConfiguration {
                        allow_non_restored_state: Some(true),
                    }),
                }),
                ..Default::default()
            });
        let client = FakeRemoteClient::new("app", 7).with_detail(described.clone());
        let waiter = InstantWaiter::new();
        let reconciler = Reconciler::new(&client, &waiter, TimeoutConfig::default());
        let mut handle = VersionedHandle::new("app", 7);

        let observed = flatten::application_tree(&described);
        let desired = ApplicationTree {
            service_execution_role: "arn:role".to_string(),
            application_configuration: Some(ApplicationConfiguration {
                run_configuration: Some(RunConfiguration {
                    application_restore_configuration: None,
                    flink_run_configuration: Some(FlinkRunConfiguration {
                        allow_non_restored_state: true,
                    }),
                }),
                ..Default::default()
            }),
            start_application: true,
            ..Default::default()
        };

        let version = reconciler
            .reconcile(&observed, &desired, &mut handle)
            .await
            .expect("reconcile");

        assert_eq!(version, 7);
        assert!(!client.mutations().contains(&"UpdateApplication"));
        assert_eq!(client.mutation_count(), 0);
    }

    const MANIFEST: &str = r"
application:
  name: clicks
  runtime_environment: FLINK-1_18
  service_execution_role: arn:role
  start_application: true
";

    fn source_with_manifest() -> (LocalConfigSource, TempDir) {
        source_with(MANIFEST)
    }

    #[tokio::test]
    async fn test_sync_creates_starts_and_saves_snapshot() {
        let (source, _temp) = source_with_manifest();
        let client = FakeRemoteClient::missing("clicks");
        let waiter = InstantWaiter::new();
        let reconciler = Reconciler::new(&client, &waiter, TimeoutConfig::default());

        let report = reconciler.sync(&source).await.expect("sync");

        assert!(report.created);
        assert_eq!(report.lifecycle, "started");
        assert_eq!(report.status, ApplicationStatus::Running);
        assert_eq!(client.mutations(), vec!["CreateApplication", "StartApplication"]);

        let snapshot = source
            .load_snapshot()
            .await
            .expect("load")
            .expect("snapshot saved");
        assert_eq!(snapshot.application_name, "clicks");
        assert!(snapshot.tree.start_application);
        assert_eq!(snapshot.config_hash, report.config_hash);
        assert_eq!(snapshot.last_sync().map(|h| h.operation), Some(SyncOperation::Create));
        assert!(source.lock_info().await.expect("lock info").is_none());
    }

    #[tokio::test]
    async fn test_second_sync_is_noop() {
        let (source, _temp) = source_with_manifest();
        let client = FakeRemoteClient::missing("clicks");
        let waiter = InstantWaiter::new();
        let reconciler = Reconciler::new(&client, &waiter, TimeoutConfig::default());

        reconciler.sync(&source).await.expect("first sync");
        let report = reconciler.sync(&source).await.expect("second sync");

        assert!(report.is_noop());
        assert_eq!(client.mutation_count(), 2);
        let snapshot = source.load_snapshot().await.expect("load").expect("snapshot");
        assert_eq!(snapshot.history.len(), 2);
        assert_eq!(snapshot.last_sync().map(|h| h.operation), Some(SyncOperation::NoOp));
    }

    fn source_with(manifest: &str) -> (LocalConfigSource, TempDir) {
        let temp = TempDir::new().expect("temp dir");
        let path = temp.path().join("kda.deploy.yaml");
        std::fs::write(&path, manifest).expect("write manifest");
        (LocalConfigSource::new(path), temp)
    }

    const FLINK_MANIFEST: &str = r"
application:
  name: orders
  runtime_environment: FLINK-1_18
  service_execution_role: arn:role
  start_application: true
  application_configuration:
    application_code_configuration:
      code_content_type: ZIPFILE
      code_content:
        s3_content_location:
          bucket_arn: arn:bucket
          file_key: orders.jar
    environment_properties:
      property_groups:
        - property_group_id: consumer
          property_map:
            stream: orders
    flink_application_configuration:
      checkpoint_configuration:
        configuration_type: DEFAULT
      monitoring_configuration:
        configuration_type: CUSTOM
        log_level: INFO
        metrics_level: TASK
      parallelism_configuration:
        configuration_type: CUSTOM
        auto_scaling_enabled: true
        parallelism: 4
        parallelism_per_kpu: 2
    run_configuration:
      flink_run_configuration:
        allow_non_restored_state: true
";

    const SQL_MANIFEST: &str = r"
application:
  name: ticker
  runtime_environment: SQL-1_0
  service_execution_role: arn:role
  start_application: true
  application_configuration:
    sql_application_configuration:
      input:
        name_prefix: SOURCE
        kinesis_streams_input:
          resource_arn: arn:stream/in
        input_schema:
          record_columns:
            - name: ticker
              sql_type: VARCHAR(8)
          record_format:
            record_format_type: JSON
            mapping_parameters:
              json_mapping_parameters:
                record_row_path: $
      outputs:
        - name: DEST_A
          kinesis_streams_output:
            resource_arn: arn:stream/a
          destination_schema:
            record_format_type: JSON
        - name: DEST_B
          lambda_output:
            resource_arn: arn:fn/b
          destination_schema:
            record_format_type: CSV
";

    #[tokio::test]
    async fn test_second_sync_of_flink_manifest_is_noop() {
        let (source, _temp) = source_with(FLINK_MANIFEST);
        let client = FakeRemoteClient::missing("orders");
        let waiter = InstantWaiter::new();
        let reconciler = Reconciler::new(&client, &waiter, TimeoutConfig::default());

        reconciler.sync(&source).await.expect("first sync");
        let after_first = client.mutation_count();
        let report = reconciler.sync(&source).await.expect("second sync");

        assert!(report.is_noop(), "second sync did work: {:?}", report.operations);
        assert_eq!(client.mutation_count(), after_first);
    }

    #[tokio::test]
    async fn test_second_sync_of_sql_manifest_is_noop() {
        let (source, _temp) = source_with(SQL_MANIFEST);
        let client = FakeRemoteClient::missing("ticker");
        let waiter = InstantWaiter::new();
        let reconciler = Reconciler::new(&client, &waiter, TimeoutConfig::default());

        let first = reconciler.sync(&source).await.expect("first sync");
        assert_eq!(first.status, ApplicationStatus::Running);
        let after_first = client.mutation_count();
        let report = reconciler.sync(&source).await.expect("second sync");

        assert!(report.is_noop(), "second sync did work: {:?}", report.operations);
        assert_eq!(client.mutation_count(), after_first);
    }

    #[tokio::test]
    async fn test_sync_refuses_when_locked() {
        let (source, _temp) = source_with_manifest();
        let client = FakeRemoteClient::missing("clicks");
        let waiter = InstantWaiter::new();
        let reconciler = Reconciler::new(&client, &waiter, TimeoutConfig::default());

        let held = source.acquire_lock("other", "clicks").await.expect("lock");
        let err = reconciler.sync(&source).await.unwrap_err();

        assert!(matches!(err, KdaError::State(StateError::LockedByOther { .. })));
        assert!(client.calls().is_empty());
        source.release_lock(&held.lock_id).await.expect("release");
    }

    #[tokio::test]
    async fn test_sync_failure_releases_lock_and_records_history() {
        let (source, _temp) = source_with_manifest();
        let client = FakeRemoteClient::missing("clicks");
        let waiter = InstantWaiter::new();
        let reconciler = Reconciler::new(&client, &waiter, TimeoutConfig::default());
        reconciler.sync(&source).await.expect("first sync");

        let cancel = CancellationToken::new();
        cancel.cancel();
        let cancelled =
            Reconciler::new(&client, &waiter, TimeoutConfig::default()).with_cancellation(cancel);
        let err = cancelled.sync(&source).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Cancelled);
        assert!(source.lock_info().await.expect("lock info").is_none());
        let snapshot = source.load_snapshot().await.expect("load").expect("snapshot");
        assert_eq!(snapshot.last_sync().map(|h| h.success), Some(false));
    }

    #[tokio::test]
    async fn test_destroy_deletes_and_waits() {
        let client = FakeRemoteClient::new("app", 3).with_status(ApplicationStatus::Running);
        let waiter = InstantWaiter::new();
        let reconciler = Reconciler::new(&client, &waiter, TimeoutConfig::default());

        assert!(reconciler.destroy("app").await.expect("destroy"));
        assert_eq!(client.mutations(), vec!["DeleteApplication"]);
        assert_eq!(waiter.deletion_waits(), 1);
        assert!(client.current().is_none());
    }

    #[tokio::test]
    async fn test_destroy_missing_is_noop() {
        let client = FakeRemoteClient::missing("app");
        let waiter = InstantWaiter::new();
        let reconciler = Reconciler::new(&client, &waiter, TimeoutConfig::default());

        assert!(!reconciler.destroy("app").await.expect("destroy"));
        assert_eq!(client.mutation_count(), 0);
        assert_eq!(waiter.deletion_waits(), 0);
    }
}
