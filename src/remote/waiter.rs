//! Waiting for the remote application to settle.
//!
//! Mutations and lifecycle calls complete asynchronously on the remote side.
//! A [`Waiter`] blocks until the application reaches a status, until an
//! operation finishes, or until the application is gone.

use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, trace};

use crate::error::{KdaError, ReconcileError, RemoteError, Result};

use super::client::RemoteClient;
use super::types::{ApplicationStatus, OperationStatus};

/// Default interval between polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Blocks until the remote application reaches a condition.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Waiter: Send + Sync {
    /// Waits until the application accepts updates again (READY or RUNNING).
    async fn wait_until_stable(&self, name: &str, timeout: Duration) -> Result<ApplicationStatus>;

    /// Waits until the application reports exactly `target`.
    async fn wait_until_status(
        &self,
        name: &str,
        target: ApplicationStatus,
        timeout: Duration,
    ) -> Result<()>;

    /// Waits until an asynchronous operation finishes successfully.
    async fn wait_for_operation(
        &self,
        name: &str,
        operation_id: &str,
        timeout: Duration,
    ) -> Result<()>;

    /// Waits until describing the application reports it missing.
    async fn wait_until_deleted(&self, name: &str, timeout: Duration) -> Result<()>;
}

/// Waiter that polls the remote client at a fixed interval.
pub struct PollingWaiter<'a> {
    /// Client used for describe calls.
    client: &'a dyn RemoteClient,
    /// Interval between polls.
    interval: Duration,
}

impl<'a> PollingWaiter<'a> {
    /// Creates a waiter with the default poll interval.
    #[must_use]
    pub fn new(client: &'a dyn RemoteClient) -> Self {
        Self {
            client,
            interval: DEFAULT_POLL_INTERVAL,
        }
    }

    /// Sets the poll interval.
    #[must_use]
    pub const fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    async fn poll_status<F>(&self, name: &str, expected: &str, mut done: F) -> Result<ApplicationStatus>
    where
        F: FnMut(ApplicationStatus) -> Result<bool> + Send,
    {
        loop {
            let detail = self.client.describe_application(name).await?;
            let status = detail.application_status;
            trace!("Application '{}' is {} (waiting for {})", name, status, expected);

            if done(status)? {
                return Ok(status);
            }
            tokio::time::sleep(self.interval).await;
        }
    }
}

fn timeout_error(name: &str, expected: &str, timeout: Duration) -> KdaError {
    KdaError::Reconcile(ReconcileError::Timeout {
        resource: name.to_string(),
        expected: expected.to_string(),
        timeout_secs: timeout.as_secs(),
    })
}

fn unexpected(name: &str, status: ApplicationStatus, expected: &str) -> KdaError {
    KdaError::Remote(RemoteError::UnexpectedStatus {
        resource: name.to_string(),
        status: status.to_string(),
        expected: expected.to_string(),
    })
}

#[async_trait]
impl Waiter for PollingWaiter<'_> {
    async fn wait_until_stable(&self, name: &str, timeout: Duration) -> Result<ApplicationStatus> {
        let expected = "READY or RUNNING";
        let poll = self.poll_status(name, expected, |status| match status {
            s if s.is_stable() => Ok(true),
            ApplicationStatus::Deleting
            | ApplicationStatus::RolledBack
            | ApplicationStatus::Unknown => Err(unexpected(name, status, expected)),
            _ => Ok(false),
        });

        let status = tokio::time::timeout(timeout, poll)
            .await
            .map_err(|_| timeout_error(name, expected, timeout))??;
        debug!("Application '{}' is stable ({})", name, status);
        Ok(status)
    }

    async fn wait_until_status(
        &self,
        name: &str,
        target: ApplicationStatus,
        timeout: Duration,
    ) -> Result<()> {
        let expected = target.to_string();
        let poll = self.poll_status(name, &expected, |status| {
            if status == target {
                Ok(true)
            } else if status == ApplicationStatus::Deleting {
                Err(unexpected(name, status, &expected))
            } else {
                Ok(false)
            }
        });

        tokio::time::timeout(timeout, poll)
            .await
            .map_err(|_| timeout_error(name, &expected, timeout))??;
        debug!("Application '{}' reached {}", name, target);
        Ok(())
    }

    async fn wait_for_operation(
        &self,
        name: &str,
        operation_id: &str,
        timeout: Duration,
    ) -> Result<()> {
        let expected = format!("operation {operation_id}");
        let poll = async {
            loop {
                let info = self.client.describe_operation(name, operation_id).await?;
                match info.operation_status {
                    OperationStatus::Successful => return Ok(()),
                    OperationStatus::InProgress => {
                        trace!("Operation {} on '{}' in progress", operation_id, name);
                        tokio::time::sleep(self.interval).await;
                    }
                    OperationStatus::Failed | OperationStatus::Cancelled => {
                        let message = info
                            .operation_failure_details
                            .and_then(|d| d.error_info)
                            .and_then(|e| e.error_string)
                            .unwrap_or_else(|| format!("{:?}", info.operation_status));
                        return Err(KdaError::Remote(RemoteError::OperationFailed {
                            resource: name.to_string(),
                            operation_id: operation_id.to_string(),
                            message,
                        }));
                    }
                }
            }
        };

        tokio::time::timeout(timeout, poll)
            .await
            .map_err(|_| timeout_error(name, &expected, timeout))?
    }

    async fn wait_until_deleted(&self, name: &str, timeout: Duration) -> Result<()> {
        let poll = async {
            loop {
                match self.client.describe_application(name).await {
                    Ok(detail) => {
                        trace!(
                            "Application '{}' still present ({})",
                            name, detail.application_status
                        );
                        tokio::time::sleep(self.interval).await;
                    }
                    Err(e) if e.is_not_found() => return Ok(()),
                    Err(e) => return Err(e),
                }
            }
        };

        tokio::time::timeout(timeout, poll)
            .await
            .map_err(|_| timeout_error(name, "deletion", timeout))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::testing::FakeRemoteClient;

    #[tokio::test]
    async fn test_stable_returns_immediately_when_ready() {
        let client = FakeRemoteClient::new("app", 1).with_status(ApplicationStatus::Ready);
        let waiter = PollingWaiter::new(&client).with_interval(Duration::from_millis(1));

        let status = waiter
            .wait_until_stable("app", Duration::from_secs(1))
            .await
            .expect("stable");
        assert_eq!(status, ApplicationStatus::Ready);
    }

    #[tokio::test]
    async fn test_stable_times_out_while_updating() {
        let client = FakeRemoteClient::new("app", 1).with_status(ApplicationStatus::Updating);
        let waiter = PollingWaiter::new(&client).with_interval(Duration::from_millis(5));

        let err = waiter
            .wait_until_stable("app", Duration::from_millis(30))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Timeout);
    }

    #[tokio::test]
    async fn test_rolled_back_is_not_waited_out() {
        let client = FakeRemoteClient::new("app", 1).with_status(ApplicationStatus::RolledBack);
        let waiter = PollingWaiter::new(&client).with_interval(Duration::from_millis(1));

        let err = waiter
            .wait_until_stable("app", Duration::from_secs(1))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            KdaError::Remote(RemoteError::UnexpectedStatus { .. })
        ));
    }

    #[tokio::test]
    async fn test_deleted_when_not_found() {
        let client = FakeRemoteClient::missing("app");
        let waiter = PollingWaiter::new(&client).with_interval(Duration::from_millis(1));

        waiter
            .wait_until_deleted("app", Duration::from_secs(1))
            .await
            .expect("deleted");
    }

    #[tokio::test]
    async fn test_failed_operation_surfaces_details() {
        let client = FakeRemoteClient::new("app", 1)
            .with_operation_status(OperationStatus::Failed, Some("bad jar"));
        let waiter = PollingWaiter::new(&client).with_interval(Duration::from_millis(1));

        let err = waiter
            .wait_for_operation("app", "op-1", Duration::from_secs(1))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("bad jar"));
    }
}
