//! In-memory doubles for the remote client and waiter.

use async_trait::async_trait;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::config::{ApplicationRestoreType, ConfigurationType, LogLevel, MetricsLevel};
use crate::error::{KdaError, RemoteError, Result};
use crate::remote::types::{self as wire, ApplicationStatus, OperationStatus};
use crate::remote::{RemoteClient, Waiter};

/// A call recorded by [`FakeRemoteClient`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    /// Remote operation name.
    pub operation: &'static str,
    /// Version carried by the request, for versioned mutations.
    pub version: Option<i64>,
}

#[derive(Debug)]
struct FakeState {
    name: String,
    detail: Option<wire::ApplicationDetail>,
    calls: Vec<RecordedCall>,
    failure: Option<(&'static str, usize)>,
    operation_ids: bool,
    operation_status: OperationStatus,
    operation_error: Option<String>,
}

/// Remote client keeping one application in memory.
///
/// Versioned mutations are checked against the current version and bump it
/// by one, like the real system.
#[derive(Debug)]
pub struct FakeRemoteClient {
    state: Mutex<FakeState>,
}

/// Builds a minimal description.
pub fn detail(name: &str, version: i64, status: ApplicationStatus) -> wire::ApplicationDetail {
    wire::ApplicationDetail {
        application_arn: format!("arn:app/{name}"),
        application_description: None,
        application_name: name.to_string(),
        runtime_environment: "SQL-1_0".to_string(),
        service_execution_role: Some("arn:role".to_string()),
        application_status: status,
        application_version_id: version,
        create_timestamp: Some(1_700_000_000.0),
        last_update_timestamp: None,
        application_configuration_description: None,
        cloud_watch_logging_option_descriptions: Vec::new(),
    }
}

/// Echoes a create payload the way the remote describes it: identities
/// assigned, computed members filled in, and runtime defaults added for
/// members the payload left out.
pub fn described_configuration(
    runtime: &str,
    config: Option<&wire::ApplicationConfiguration>,
) -> wire::ApplicationConfigurationDescription {
    let empty = wire::ApplicationConfiguration::default();
    let config = config.unwrap_or(&empty);
    let flink = runtime.starts_with("FLINK");

    let sql = config.sql_application_configuration.as_ref().map(|sql| {
        wire::SqlApplicationConfigurationDescription {
            input_descriptions: sql
                .inputs
                .iter()
                .map(|input| wire::InputDescription {
                    input_id: Some("1.1".to_string()),
                    name_prefix: Some(input.name_prefix.clone()),
                    in_app_stream_names: vec![format!("{}_001", input.name_prefix)],
                    input_processing_configuration_description: input
                        .input_processing_configuration
                        .as_ref()
                        .map(|p| wire::InputProcessingConfigurationDescription {
                            input_lambda_processor_description: Some(
                                p.input_lambda_processor.clone(),
                            ),
                        }),
                    kinesis_streams_input_description: input.kinesis_streams_input.clone(),
                    kinesis_firehose_input_description: input.kinesis_firehose_input.clone(),
                    input_schema: input.input_schema.clone(),
                    input_parallelism: Some(
                        input
                            .input_parallelism
                            .clone()
                            .unwrap_or(wire::InputParallelism { count: Some(1) }),
                    ),
                    input_starting_position_configuration: None,
                })
                .collect(),
            output_descriptions: sql
                .outputs
                .iter()
                .enumerate()
                .map(|(i, output)| wire::OutputDescription {
                    output_id: Some(format!("1.{}", i + 2)),
                    name: Some(output.name.clone()),
                    kinesis_streams_output_description: output.kinesis_streams_output.clone(),
                    kinesis_firehose_output_description: output.kinesis_firehose_output.clone(),
                    lambda_output_description: output.lambda_output.clone(),
                    destination_schema: Some(output.destination_schema.clone()),
                })
                .collect(),
            reference_data_source_descriptions: sql
                .reference_data_sources
                .iter()
                .map(|source| wire::ReferenceDataSourceDescription {
                    reference_id: Some("1.1".to_string()),
                    table_name: Some(source.table_name.clone()),
                    s3_reference_data_source_description: Some(
                        source.s3_reference_data_source.clone(),
                    ),
                    reference_schema: Some(source.reference_schema.clone()),
                })
                .collect(),
        }
    });

    let tuning = config.flink_application_configuration.clone().unwrap_or_default();
    let tuning = flink.then(|| wire::FlinkApplicationConfigurationDescription {
        checkpoint_configuration_description: Some(tuning.checkpoint_configuration.unwrap_or(
            wire::CheckpointConfiguration {
                configuration_type: ConfigurationType::Default,
                checkpointing_enabled: Some(true),
                checkpoint_interval: Some(60_000),
                min_pause_between_checkpoints: Some(5_000),
            },
        )),
        monitoring_configuration_description: Some(tuning.monitoring_configuration.unwrap_or(
            wire::MonitoringConfiguration {
                configuration_type: ConfigurationType::Default,
                log_level: Some(LogLevel::Info),
                metrics_level: Some(MetricsLevel::Application),
            },
        )),
        parallelism_configuration_description: Some(
            tuning
                .parallelism_configuration
                .unwrap_or(wire::ParallelismConfiguration {
                    configuration_type: ConfigurationType::Default,
                    auto_scaling_enabled: Some(false),
                    parallelism: Some(1),
                    parallelism_per_kpu: Some(1),
                    current_parallelism: Some(1),
                }),
        ),
    });

    wire::ApplicationConfigurationDescription {
        sql_application_configuration_description: sql,
        application_code_configuration_description: config
            .application_code_configuration
            .as_ref()
            .map(|code| wire::ApplicationCodeConfigurationDescription {
                code_content_type: code.code_content_type,
                code_content_description: code.code_content.as_ref().map(|content| {
                    wire::CodeContentDescription {
                        text_content: content.text_content.clone(),
                        s3_application_code_location_description: content
                            .s3_content_location
                            .clone(),
                    }
                }),
            }),
        run_configuration_description: flink.then(|| wire::RunConfigurationDescription {
            application_restore_configuration_description: Some(
                wire::ApplicationRestoreConfiguration {
                    application_restore_type: ApplicationRestoreType::RestoreFromLatestSnapshot,
                    snapshot_name: None,
                },
            ),
            flink_run_configuration_description: Some(wire::FlinkRunConfiguration {
                allow_non_restored_state: Some(false),
            }),
        }),
        flink_application_configuration_description: tuning,
        environment_property_descriptions: config.environment_properties.as_ref().map(|env| {
            wire::EnvironmentPropertyDescriptions {
                property_group_descriptions: env.property_groups.clone(),
            }
        }),
        application_snapshot_configuration_description: config
            .application_snapshot_configuration
            .clone()
            .or_else(|| {
                flink.then_some(wire::ApplicationSnapshotConfiguration {
                    snapshots_enabled: true,
                })
            }),
        vpc_configuration_descriptions: config
            .vpc_configurations
            .iter()
            .enumerate()
            .map(|(i, vpc)| wire::VpcConfigurationDescription {
                vpc_configuration_id: Some(format!("1.{}", i + 1)),
                vpc_id: Some("vpc-1".to_string()),
                subnet_ids: vpc.subnet_ids.clone(),
                security_group_ids: vpc.security_group_ids.clone(),
            })
            .collect(),
    }
}

impl FakeRemoteClient {
    /// An existing READY application at `version`.
    pub fn new(name: &str, version: i64) -> Self {
        Self::with_state(name, Some(detail(name, version, ApplicationStatus::Ready)))
    }

    /// No application exists yet.
    pub fn missing(name: &str) -> Self {
        Self::with_state(name, None)
    }

    fn with_state(name: &str, detail: Option<wire::ApplicationDetail>) -> Self {
        Self {
            state: Mutex::new(FakeState {
                name: name.to_string(),
                detail,
                calls: Vec::new(),
                failure: None,
                operation_ids: false,
                operation_status: OperationStatus::Successful,
                operation_error: None,
            }),
        }
    }

    /// Replaces the whole description.
    pub fn with_detail(self, detail: wire::ApplicationDetail) -> Self {
        self.lock().detail = Some(detail);
        self
    }

    /// Sets the reported status.
    pub fn with_status(self, status: ApplicationStatus) -> Self {
        if let Some(detail) = self.lock().detail.as_mut() {
            detail.application_status = status;
        }
        self
    }

    /// Makes every mutation return an operation id.
    pub fn with_operation_ids(self) -> Self {
        self.lock().operation_ids = true;
        self
    }

    /// Sets the status reported for operations.
    pub fn with_operation_status(self, status: OperationStatus, error: Option<&str>) -> Self {
        {
            let mut state = self.lock();
            state.operation_status = status;
            state.operation_error = error.map(str::to_string);
        }
        self
    }

    /// Fails the `nth` (1-based) call of `operation`.
    pub fn failing_on(self, operation: &'static str, nth: usize) -> Self {
        self.lock().failure = Some((operation, nth));
        self
    }

    /// All recorded calls, reads included.
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.lock().calls.clone()
    }

    /// Names of recorded mutating calls.
    pub fn mutations(&self) -> Vec<&'static str> {
        self.lock()
            .calls
            .iter()
            .filter(|c| !c.operation.starts_with("Describe"))
            .map(|c| c.operation)
            .collect()
    }

    /// Number of recorded mutating calls.
    pub fn mutation_count(&self) -> usize {
        self.mutations().len()
    }

    /// Versions carried by versioned mutations, in call order.
    pub fn mutation_versions(&self) -> Vec<i64> {
        self.lock().calls.iter().filter_map(|c| c.version).collect()
    }

    /// Current description, if the application exists.
    pub fn current(&self) -> Option<wire::ApplicationDetail> {
        self.lock().detail.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, FakeState> {
        self.state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn record(&self, operation: &'static str, version: Option<i64>) -> Result<()> {
        let mut state = self.lock();
        state.calls.push(RecordedCall { operation, version });
        let count = state
            .calls
            .iter()
            .filter(|c| c.operation == operation)
            .count();
        if state.failure == Some((operation, count)) {
            return Err(KdaError::Remote(RemoteError::api_error(
                400,
                "InvalidRequestException",
                format!("{operation} rejected"),
            )));
        }
        Ok(())
    }

    fn mutate(&self, operation: &'static str, version: i64) -> Result<wire::MutationResponse> {
        self.record(operation, Some(version))?;

        let mut state = self.lock();
        let name = state.name.clone();
        let operation_ids = state.operation_ids;
        let Some(detail) = state.detail.as_mut() else {
            return Err(KdaError::Remote(RemoteError::NotFound { resource: name }));
        };
        if detail.application_version_id != version {
            return Err(KdaError::Remote(RemoteError::VersionConflict {
                resource: name,
                message: format!(
                    "expected version {}, got {}",
                    detail.application_version_id, version
                ),
            }));
        }
        detail.application_version_id += 1;

        Ok(wire::MutationResponse {
            application_version_id: detail.application_version_id,
            operation_id: operation_ids.then(|| format!("op-{}", detail.application_version_id)),
        })
    }

    fn lifecycle(&self, operation: &'static str, to: ApplicationStatus) -> Result<wire::LifecycleResponse> {
        self.record(operation, None)?;
        let mut state = self.lock();
        let operation_ids = state.operation_ids;
        if let Some(detail) = state.detail.as_mut() {
            detail.application_status = to;
        }
        Ok(wire::LifecycleResponse {
            operation_id: operation_ids.then(|| format!("op-{operation}")),
        })
    }
}

#[async_trait]
impl RemoteClient for FakeRemoteClient {
    async fn describe_application(&self, _name: &str) -> Result<wire::ApplicationDetail> {
        self.record("DescribeApplication", None)?;
        let state = self.lock();
        state.detail.clone().ok_or_else(|| {
            KdaError::Remote(RemoteError::NotFound {
                resource: state.name.clone(),
            })
        })
    }

    async fn describe_operation(
        &self,
        _name: &str,
        operation_id: &str,
    ) -> Result<wire::OperationInfo> {
        self.record("DescribeApplicationOperation", None)?;
        let state = self.lock();
        Ok(wire::OperationInfo {
            operation_id: operation_id.to_string(),
            operation_status: state.operation_status,
            operation_failure_details: state.operation_error.as_ref().map(|e| {
                wire::OperationFailureDetails {
                    error_info: Some(wire::ErrorInfo {
                        error_string: Some(e.clone()),
                    }),
                }
            }),
        })
    }

    async fn create_application(
        &self,
        request: &wire::CreateApplicationRequest,
    ) -> Result<wire::ApplicationDetail> {
        self.record("CreateApplication", None)?;
        let mut created = detail(&request.application_name, 1, ApplicationStatus::Ready);
        created.service_execution_role = Some(request.service_execution_role.clone());
        created.runtime_environment = request.runtime_environment.clone();
        created.application_description = request.application_description.clone();
        created.application_configuration_description = Some(described_configuration(
            &request.runtime_environment,
            request.application_configuration.as_ref(),
        ));
        created.cloud_watch_logging_option_descriptions = request
            .cloudwatch_logging_options
            .iter()
            .enumerate()
            .map(|(i, option)| wire::CloudWatchLoggingOptionDescription {
                cloudwatch_logging_option_id: Some(format!("1.{}", i + 1)),
                log_stream_arn: option.log_stream_arn.clone(),
            })
            .collect();
        self.lock().detail = Some(created.clone());
        Ok(created)
    }

    async fn delete_application(&self, _request: &wire::DeleteApplicationRequest) -> Result<()> {
        self.record("DeleteApplication", None)?;
        let mut state = self.lock();
        if state.detail.take().is_none() {
            return Err(KdaError::Remote(RemoteError::NotFound {
                resource: state.name.clone(),
            }));
        }
        Ok(())
    }

    async fn update_application(
        &self,
        request: &wire::UpdateApplicationRequest,
    ) -> Result<wire::MutationResponse> {
        self.mutate("UpdateApplication", request.current_application_version_id)
    }

    async fn add_input(&self, request: &wire::AddInputRequest) -> Result<wire::MutationResponse> {
        self.mutate("AddApplicationInput", request.current_application_version_id)
    }

    async fn add_input_processing_configuration(
        &self,
        request: &wire::AddInputProcessingConfigurationRequest,
    ) -> Result<wire::MutationResponse> {
        self.mutate(
            "AddApplicationInputProcessingConfiguration",
            request.current_application_version_id,
        )
    }

    async fn delete_input_processing_configuration(
        &self,
        request: &wire::DeleteInputProcessingConfigurationRequest,
    ) -> Result<wire::MutationResponse> {
        self.mutate(
            "DeleteApplicationInputProcessingConfiguration",
            request.current_application_version_id,
        )
    }

    async fn add_output(&self, request: &wire::AddOutputRequest) -> Result<wire::MutationResponse> {
        self.mutate("AddApplicationOutput", request.current_application_version_id)
    }

    async fn delete_output(
        &self,
        request: &wire::DeleteOutputRequest,
    ) -> Result<wire::MutationResponse> {
        self.mutate("DeleteApplicationOutput", request.current_application_version_id)
    }

    async fn add_reference_data_source(
        &self,
        request: &wire::AddReferenceDataSourceRequest,
    ) -> Result<wire::MutationResponse> {
        self.mutate(
            "AddApplicationReferenceDataSource",
            request.current_application_version_id,
        )
    }

    async fn delete_reference_data_source(
        &self,
        request: &wire::DeleteReferenceDataSourceRequest,
    ) -> Result<wire::MutationResponse> {
        self.mutate(
            "DeleteApplicationReferenceDataSource",
            request.current_application_version_id,
        )
    }

    async fn add_vpc_configuration(
        &self,
        request: &wire::AddVpcConfigurationRequest,
    ) -> Result<wire::MutationResponse> {
        self.mutate(
            "AddApplicationVpcConfiguration",
            request.current_application_version_id,
        )
    }

    async fn delete_vpc_configuration(
        &self,
        request: &wire::DeleteVpcConfigurationRequest,
    ) -> Result<wire::MutationResponse> {
        self.mutate(
            "DeleteApplicationVpcConfiguration",
            request.current_application_version_id,
        )
    }

    async fn add_logging_option(
        &self,
        request: &wire::AddLoggingOptionRequest,
    ) -> Result<wire::MutationResponse> {
        self.mutate(
            "AddApplicationCloudWatchLoggingOption",
            request.current_application_version_id,
        )
    }

    async fn delete_logging_option(
        &self,
        request: &wire::DeleteLoggingOptionRequest,
    ) -> Result<wire::MutationResponse> {
        self.mutate(
            "DeleteApplicationCloudWatchLoggingOption",
            request.current_application_version_id,
        )
    }

    async fn start_application(
        &self,
        request: &wire::StartApplicationRequest,
    ) -> Result<wire::LifecycleResponse> {
        let response = self.lifecycle("StartApplication", ApplicationStatus::Running)?;
        if let Some(run) = &request.run_configuration {
            let mut state = self.lock();
            let described = state
                .detail
                .as_mut()
                .and_then(|d| d.application_configuration_description.as_mut())
                .and_then(|c| c.run_configuration_description.as_mut());
            if let Some(described) = described {
                if let Some(restore) = &run.application_restore_configuration {
                    described.application_restore_configuration_description = Some(restore.clone());
                }
                if let Some(flink) = &run.flink_run_configuration {
                    described.flink_run_configuration_description = Some(flink.clone());
                }
            }
        }
        Ok(response)
    }

    async fn stop_application(
        &self,
        _request: &wire::StopApplicationRequest,
    ) -> Result<wire::LifecycleResponse> {
        self.lifecycle("StopApplication", ApplicationStatus::Ready)
    }
}

/// Waiter that returns immediately and counts calls.
#[derive(Debug, Default)]
pub struct InstantWaiter {
    stable: AtomicUsize,
    status: AtomicUsize,
    operations: AtomicUsize,
    deletions: AtomicUsize,
}

impl InstantWaiter {
    /// Creates a waiter with zeroed counters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stable waits.
    pub fn stable_waits(&self) -> usize {
        self.stable.load(Ordering::SeqCst)
    }

    /// Number of status waits.
    pub fn status_waits(&self) -> usize {
        self.status.load(Ordering::SeqCst)
    }

    /// Number of operation waits.
    pub fn operation_waits(&self) -> usize {
        self.operations.load(Ordering::SeqCst)
    }

    /// Number of deletion waits.
    pub fn deletion_waits(&self) -> usize {
        self.deletions.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Waiter for InstantWaiter {
    async fn wait_until_stable(&self, _name: &str, _timeout: Duration) -> Result<ApplicationStatus> {
        self.stable.fetch_add(1, Ordering::SeqCst);
        Ok(ApplicationStatus::Ready)
    }

    async fn wait_until_status(
        &self,
        _name: &str,
        _target: ApplicationStatus,
        _timeout: Duration,
    ) -> Result<()> {
        self.status.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn wait_for_operation(
        &self,
        _name: &str,
        _operation_id: &str,
        _timeout: Duration,
    ) -> Result<()> {
        self.operations.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn wait_until_deleted(&self, _name: &str, _timeout: Duration) -> Result<()> {
        self.deletions.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Waiter whose waits never finish on their own. The first wait fires
/// `cancel`, like an interrupt arriving while a call is in flight.
#[derive(Debug)]
pub struct InterruptingWaiter {
    cancel: CancellationToken,
    started: AtomicUsize,
}

impl InterruptingWaiter {
    /// Creates a waiter that fires `cancel` on its first wait.
    pub fn new(cancel: CancellationToken) -> Self {
        Self {
            cancel,
            started: AtomicUsize::new(0),
        }
    }

    /// Number of waits entered.
    pub fn started(&self) -> usize {
        self.started.load(Ordering::SeqCst)
    }

    async fn hang<T>(&self) -> Result<T> {
        self.started.fetch_add(1, Ordering::SeqCst);
        self.cancel.cancel();
        std::future::pending().await
    }
}

#[async_trait]
impl Waiter for InterruptingWaiter {
    async fn wait_until_stable(&self, _name: &str, _timeout: Duration) -> Result<ApplicationStatus> {
        self.hang().await
    }

    async fn wait_until_status(
        &self,
        _name: &str,
        _target: ApplicationStatus,
        _timeout: Duration,
    ) -> Result<()> {
        self.hang().await
    }

    async fn wait_for_operation(
        &self,
        _name: &str,
        _operation_id: &str,
        _timeout: Duration,
    ) -> Result<()> {
        self.hang().await
    }

    async fn wait_until_deleted(&self, _name: &str, _timeout: Duration) -> Result<()> {
        self.hang().await
    }
}
