//! Start and stop of a remote application.
//!
//! The controller only issues a start from READY and a stop from RUNNING.
//! Any other status means a transition is already under way and the call is
//! skipped without error.

use std::fmt;
use std::future::Future;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::config::{ApplicationTree, TimeoutConfig};
use crate::error::{KdaError, ReconcileError, Result};
use crate::mapper::expand;
use crate::remote::types::{self as wire, ApplicationStatus};
use crate::remote::{RemoteClient, Waiter};

/// What the controller did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleOutcome {
    /// A start was issued and the application reached RUNNING.
    Started,
    /// A stop was issued and the application reached READY.
    Stopped,
    /// The application was already in the desired state.
    Unchanged,
    /// No call was issued, with the reason.
    Skipped(String),
}

impl fmt::Display for LifecycleOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Started => write!(f, "started"),
            Self::Stopped => write!(f, "stopped"),
            Self::Unchanged => write!(f, "unchanged"),
            Self::Skipped(reason) => write!(f, "skipped ({reason})"),
        }
    }
}

/// Drives start and stop from the desired run state.
pub struct LifecycleController<'a> {
    client: &'a dyn RemoteClient,
    waiter: &'a dyn Waiter,
    timeouts: TimeoutConfig,
    cancel: CancellationToken,
}

impl<'a> LifecycleController<'a> {
    /// Creates a controller.
    #[must_use]
    pub fn new(client: &'a dyn RemoteClient, waiter: &'a dyn Waiter, timeouts: TimeoutConfig) -> Self {
        Self {
            client,
            waiter,
            timeouts,
            cancel: CancellationToken::new(),
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

    /// Brings the application named `name` to the run state in `desired`.
    ///
    /// # Errors
    ///
    /// Returns an error if describing, starting, stopping or waiting fails.
    pub async fn apply(&self, name: &str, desired: &ApplicationTree) -> Result<LifecycleOutcome> {
        let detail = self
            .cancellable(self.client.describe_application(name))
            .await?;

        if desired.start_application {
            self.start(name, desired, &detail).await
        } else {
            self.stop(name, desired, detail.application_status).await
        }
    }

    async fn start(
        &self,
        name: &str,
        desired: &ApplicationTree,
        detail: &wire::ApplicationDetail,
    ) -> Result<LifecycleOutcome> {
        match detail.application_status {
            ApplicationStatus::Running => return Ok(LifecycleOutcome::Unchanged),
            ApplicationStatus::Ready => {}
            status => {
                debug!("Not starting '{}' while {}", name, status);
                return Ok(LifecycleOutcome::Skipped(format!("status is {status}")));
            }
        }

        let input_id = described_input_id(detail);
        if desired.input().is_some() && input_id.is_none() {
            debug!("Not starting '{}': input has no identity yet", name);
            return Ok(LifecycleOutcome::Skipped(String::from(
                "input has no identity yet",
            )));
        }

        let request = wire::StartApplicationRequest {
            application_name: name.to_string(),
            run_configuration: expand::start_run_configuration(desired, input_id),
        };

        info!("Starting application '{}'", name);
        let response = self
            .cancellable(self.client.start_application(&request))
            .await?;
        if let Some(operation_id) = response.operation_id.as_deref() {
            self.cancellable(
                self.waiter
                    .wait_for_operation(name, operation_id, self.timeouts.start()),
            )
            .await?;
        }
        self.cancellable(self.waiter.wait_until_status(
            name,
            ApplicationStatus::Running,
            self.timeouts.start(),
        ))
        .await?;

        info!("Application '{}' is running", name);
        Ok(LifecycleOutcome::Started)
    }

    async fn stop(
        &self,
        name: &str,
        desired: &ApplicationTree,
        status: ApplicationStatus,
    ) -> Result<LifecycleOutcome> {
        match status {
            ApplicationStatus::Ready => return Ok(LifecycleOutcome::Unchanged),
            ApplicationStatus::Running => {}
            status => {
                debug!("Not stopping '{}' while {}", name, status);
                return Ok(LifecycleOutcome::Skipped(format!("status is {status}")));
            }
        }

        let request = wire::StopApplicationRequest {
            application_name: name.to_string(),
            force: desired.force_stop.then_some(true),
        };

        info!(
            "Stopping application '{}'{}",
            name,
            if desired.force_stop { " (forced)" } else { "" }
        );
        let response = self
            .cancellable(self.client.stop_application(&request))
            .await?;
        if let Some(operation_id) = response.operation_id.as_deref() {
            self.cancellable(
                self.waiter
                    .wait_for_operation(name, operation_id, self.timeouts.stop()),
            )
            .await?;
        }
        self.cancellable(self.waiter.wait_until_status(
            name,
            ApplicationStatus::Ready,
            self.timeouts.stop(),
        ))
        .await?;

        info!("Application '{}' is stopped", name);
        Ok(LifecycleOutcome::Stopped)
    }
}

fn described_input_id(detail: &wire::ApplicationDetail) -> Option<&str> {
    detail
        .application_configuration_description
        .as_ref()
        .and_then(|c| c.sql_application_configuration_description.as_ref())
        .and_then(|s| s.input_descriptions.first())
        .and_then(|i| i.input_id.as_deref())
        .filter(|id| !id.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{
        ApplicationConfiguration, Input, InputStartingPosition, InputStartingPositionConfiguration,
        ResourceArn, SqlApplicationConfiguration,
    };
    use crate::remote::MockWaiter;
    use crate::testing::{FakeRemoteClient, InterruptingWaiter, detail};

    fn running_tree(start: bool) -> ApplicationTree {
        ApplicationTree {
            service_execution_role: "arn:role".to_string(),
            start_application: start,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_start_from_ready_waits_for_running() {
        let client = FakeRemoteClient::new("app", 1).with_status(ApplicationStatus::Ready);
        let mut waiter = MockWaiter::new();
        waiter
            .expect_wait_until_status()
            .withf(|_, target, _| *target == ApplicationStatus::Running)
            .times(1)
            .returning(|_, _, _| Ok(()));

        let controller = LifecycleController::new(&client, &waiter, TimeoutConfig::default());
        let outcome = controller.apply("app", &running_tree(true)).await.expect("apply");

        assert_eq!(outcome, LifecycleOutcome::Started);
        assert_eq!(client.mutations(), vec!["StartApplication"]);
    }

    #[tokio::test]
    async fn test_cancel_while_waiting_for_running() {
        let client = FakeRemoteClient::new("app", 1);
        let cancel = CancellationToken::new();
        let waiter = InterruptingWaiter::new(cancel.clone());

        let controller = LifecycleController::new(&client, &waiter, TimeoutConfig::default())
            .with_cancellation(cancel);
        let err = controller.apply("app", &running_tree(true)).await.unwrap_err();

        assert!(matches!(err, KdaError::Reconcile(ReconcileError::Cancelled)));
        assert_eq!(waiter.started(), 1);
        assert_eq!(client.mutations(), vec!["StartApplication"]);
    }

    #[tokio::test]
    async fn test_start_while_starting_is_a_no_op() {
        let client = FakeRemoteClient::new("app", 1).with_status(ApplicationStatus::Starting);
        let waiter = MockWaiter::new();

        let controller = LifecycleController::new(&client, &waiter, TimeoutConfig::default());
        let outcome = controller.apply("app", &running_tree(true)).await.expect("apply");

        assert!(matches!(outcome, LifecycleOutcome::Skipped(_)));
        assert_eq!(client.mutation_count(), 0);
    }

    #[tokio::test]
    async fn test_stop_from_running_waits_for_ready() {
        let client = FakeRemoteClient::new("app", 1).with_status(ApplicationStatus::Running);
        let mut waiter = MockWaiter::new();
        waiter
            .expect_wait_until_status()
            .withf(|_, target, _| *target == ApplicationStatus::Ready)
            .times(1)
            .returning(|_, _, _| Ok(()));

        let controller = LifecycleController::new(&client, &waiter, TimeoutConfig::default());
        let outcome = controller.apply("app", &running_tree(false)).await.expect("apply");

        assert_eq!(outcome, LifecycleOutcome::Stopped);
        assert_eq!(client.mutations(), vec!["StopApplication"]);
    }

    #[tokio::test]
    async fn test_start_skipped_when_input_has_no_identity() {
        let client = FakeRemoteClient::new("app", 1);
        let waiter = MockWaiter::new();
        let mut desired = running_tree(true);
        desired.application_configuration = Some(ApplicationConfiguration {
            sql_application_configuration: Some(SqlApplicationConfiguration {
                input: Some(Input {
                    name_prefix: "src".to_string(),
                    kinesis_streams_input: Some(ResourceArn::new("arn:stream")),
                    input_starting_position_configuration: Some(
                        InputStartingPositionConfiguration {
                            input_starting_position: Some(InputStartingPosition::Now),
                        },
                    ),
                    ..Default::default()
                }),
                ..Default::default()
            }),
            ..Default::default()
        });

        let controller = LifecycleController::new(&client, &waiter, TimeoutConfig::default());
        let outcome = controller.apply("app", &desired).await.expect("apply");

        assert!(matches!(outcome, LifecycleOutcome::Skipped(_)));
        assert_eq!(client.mutation_count(), 0);
    }

    #[tokio::test]
    async fn test_input_identity_read_from_description() {
        let mut described = detail("app", 1, ApplicationStatus::Ready);
        described.application_configuration_description = Some(wire::ApplicationConfigurationDescription {
            sql_application_configuration_description: Some(
                wire::SqlApplicationConfigurationDescription {
                    input_descriptions: vec![wire::InputDescription {
                        input_id: Some("1.1".to_string()),
                        ..Default::default()
                    }],
                    ..Default::default()
                },
            ),
            ..Default::default()
        });
        assert_eq!(described_input_id(&described), Some("1.1"));
        assert_eq!(described_input_id(&detail("app", 1, ApplicationStatus::Ready)), None);
    }
}
