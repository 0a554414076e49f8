//! Plan executor for applying operation plans.
//!
//! Operations run strictly one at a time. After each accepted mutation the
//! executor waits for the application to settle, then records the returned
//! version so the next call carries it. The first failure aborts the run;
//! operations already applied stay applied.

use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::error::{ErrorKind, KdaError, ReconcileError, Result};
use crate::remote::types::{self as wire, ApplicationStatus};
use crate::remote::{RemoteClient, Waiter};
use crate::version::VersionedHandle;

use super::plan::{OperationPlan, PlannedOperation, RemoteCall};

/// Executor for operation plans.
pub struct PlanExecutor<'a> {
    /// Remote client.
    client: &'a dyn RemoteClient,
    /// Convergence waiter.
    waiter: &'a dyn Waiter,
    /// Bound on each convergence wait.
    timeout: Duration,
    /// Caller-supplied cancellation signal.
    cancel: CancellationToken,
}

/// Result of a single operation.
#[derive(Debug, Clone)]
pub struct OperationResult {
    /// Position in the plan.
    pub index: usize,
    /// Operation that was executed.
    pub operation: PlannedOperation,
    /// Version after the operation; `None` when skipped.
    pub version: Option<i64>,
}

impl OperationResult {
    /// Returns true when no call was issued.
    #[must_use]
    pub const fn skipped(&self) -> bool {
        self.version.is_none()
    }
}

/// Result of executing a whole plan.
#[derive(Debug, Clone, Default)]
pub struct ExecutionResult {
    /// Per-operation results.
    pub results: Vec<OperationResult>,
    /// Version after the last operation.
    pub final_version: i64,
}

impl ExecutionResult {
    /// Number of operations that issued a call.
    #[must_use]
    pub fn applied(&self) -> usize {
        self.results.iter().filter(|r| !r.skipped()).count()
    }
}

impl<'a> PlanExecutor<'a> {
    /// Creates a new plan executor.
    #[must_use]
    pub fn new(client: &'a dyn RemoteClient, waiter: &'a dyn Waiter, timeout: Duration) -> Self {
        Self {
            client,
            waiter,
            timeout,
            cancel: CancellationToken::new(),
        }
    }

    /// Sets the cancellation signal.
    #[must_use]
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Executes a plan against the application named by `handle`.
    ///
    /// # Errors
    ///
    /// Returns the first failing operation's error wrapped with its area and
    /// kind, or [`ReconcileError::Cancelled`] when cancelled.
    pub async fn execute(
        &self,
        plan: &OperationPlan,
        handle: &mut VersionedHandle,
    ) -> Result<ExecutionResult> {
        info!(
            "Executing plan with {} operations on {}",
            plan.operations.len(),
            handle
        );

        let mut results = Vec::with_capacity(plan.operations.len());

        for (index, operation) in plan.operations.iter().enumerate() {
            if self.cancel.is_cancelled() {
                return Err(ReconcileError::Cancelled.into());
            }

            info!(
                "[{}/{}] {}",
                index + 1,
                plan.operations.len(),
                operation.description
            );

            match self.apply(operation, handle).await {
                Ok(version) => results.push(OperationResult {
                    index,
                    operation: operation.clone(),
                    version,
                }),
                Err(e) if e.kind() == ErrorKind::Cancelled => return Err(e),
                Err(e) => {
                    error!("{} of {} failed: {}", operation.kind, operation.area, e);
                    return Err(ReconcileError::StepFailed {
                        area: operation.area,
                        operation: operation.kind,
                        source: Box::new(e),
                    }
                    .into());
                }
            }
        }

        Ok(ExecutionResult {
            results,
            final_version: handle.current(),
        })
    }

    /// Runs `future` unless cancellation fires first.
    async fn cancellable<T>(&self, future: impl Future<Output = Result<T>>) -> Result<T> {
        tokio::select! {
            biased;
            () = self.cancel.cancelled() => Err(KdaError::Reconcile(ReconcileError::Cancelled)),
            result = future => result,
        }
    }

    /// Issues one call, waits for convergence and advances the version.
    async fn apply(
        &self,
        operation: &PlannedOperation,
        handle: &mut VersionedHandle,
    ) -> Result<Option<i64>> {
        let name = handle.resource_name().to_string();
        let version = handle.current();

        let Some(response) = self.dispatch(&operation.call, &name, version).await? else {
            return Ok(None);
        };

        if let Some(operation_id) = response.operation_id.as_deref() {
            self.cancellable(self.waiter.wait_for_operation(&name, operation_id, self.timeout))
                .await?;
        }
        self.cancellable(self.waiter.wait_until_stable(&name, self.timeout))
            .await?;

        handle.advance(response.application_version_id);
        Ok(Some(response.application_version_id))
    }

    async fn dispatch(
        &self,
        call: &RemoteCall,
        name: &str,
        version: i64,
    ) -> Result<Option<wire::MutationResponse>> {
        let application_name = name.to_string();
        let current_application_version_id = version;

        let response = match call {
            RemoteCall::Update(update) => {
                let request = update.clone().into_request(name, version);
                self.cancellable(self.client.update_application(&request))
                    .await?
            }
            RemoteCall::UpdateRunConfiguration(run) => {
                let detail = self
                    .cancellable(self.client.describe_application(name))
                    .await?;
                if detail.application_status != ApplicationStatus::Running {
                    debug!(
                        "'{}' is {}; run configuration applies on next start",
                        name, detail.application_status
                    );
                    return Ok(None);
                }
                let request = wire::UpdateApplicationRequest {
                    application_name,
                    current_application_version_id,
                    run_configuration_update: Some(run.clone()),
                    ..Default::default()
                };
                self.cancellable(self.client.update_application(&request))
                    .await?
            }
            RemoteCall::AddInput(input) => {
                let request = wire::AddInputRequest {
                    application_name,
                    current_application_version_id,
                    input: input.clone(),
                };
                self.cancellable(self.client.add_input(&request)).await?
            }
            RemoteCall::AddInputProcessing { input_id, config } => {
                let request = wire::AddInputProcessingConfigurationRequest {
                    application_name,
                    current_application_version_id,
                    input_id: input_id.clone(),
                    input_processing_configuration: config.clone(),
                };
                self.cancellable(self.client.add_input_processing_configuration(&request))
                    .await?
            }
            RemoteCall::DeleteInputProcessing { input_id } => {
                let request = wire::DeleteInputProcessingConfigurationRequest {
                    application_name,
                    current_application_version_id,
                    input_id: input_id.clone(),
                };
                self.cancellable(self.client.delete_input_processing_configuration(&request))
                    .await?
            }
            RemoteCall::AddOutput(output) => {
                let request = wire::AddOutputRequest {
                    application_name,
                    current_application_version_id,
                    output: output.clone(),
                };
                self.cancellable(self.client.add_output(&request)).await?
            }
            RemoteCall::DeleteOutput { output_id } => {
                let request = wire::DeleteOutputRequest {
                    application_name,
                    current_application_version_id,
                    output_id: output_id.clone(),
                };
                self.cancellable(self.client.delete_output(&request)).await?
            }
            RemoteCall::AddReferenceDataSource(source) => {
                let request = wire::AddReferenceDataSourceRequest {
                    application_name,
                    current_application_version_id,
                    reference_data_source: source.clone(),
                };
                self.cancellable(self.client.add_reference_data_source(&request))
                    .await?
            }
            RemoteCall::DeleteReferenceDataSource { reference_id } => {
                let request = wire::DeleteReferenceDataSourceRequest {
                    application_name,
                    current_application_version_id,
                    reference_id: reference_id.clone(),
                };
                self.cancellable(self.client.delete_reference_data_source(&request))
                    .await?
            }
            RemoteCall::AddVpc(vpc) => {
                let request = wire::AddVpcConfigurationRequest {
                    application_name,
                    current_application_version_id,
                    vpc_configuration: vpc.clone(),
                };
                self.cancellable(self.client.add_vpc_configuration(&request))
                    .await?
            }
            RemoteCall::DeleteVpc {
                vpc_configuration_id,
            } => {
                let request = wire::DeleteVpcConfigurationRequest {
                    application_name,
                    current_application_version_id,
                    vpc_configuration_id: vpc_configuration_id.clone(),
                };
                self.cancellable(self.client.delete_vpc_configuration(&request))
                    .await?
            }
            RemoteCall::AddLogging(option) => {
                let request = wire::AddLoggingOptionRequest {
                    application_name,
                    current_application_version_id,
                    cloudwatch_logging_option: option.clone(),
                };
                self.cancellable(self.client.add_logging_option(&request))
                    .await?
            }
            RemoteCall::DeleteLogging {
                cloudwatch_logging_option_id,
            } => {
                let request = wire::DeleteLoggingOptionRequest {
                    application_name,
                    current_application_version_id,
                    cloudwatch_logging_option_id: cloudwatch_logging_option_id.clone(),
                };
                self.cancellable(self.client.delete_logging_option(&request))
                    .await?
            }
        };

        Ok(Some(response))
    }
}
