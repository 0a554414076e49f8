//! Remote control-plane client.
//!
//! [`RemoteClient`] is the seam the engine talks through: one method per
//! read or mutation, typed wire requests in, typed responses out.
//! [`HttpRemoteClient`] implements it over the JSON 1.1 protocol.

use async_trait::async_trait;
use reqwest::{Client, StatusCode, header};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, trace};

use crate::error::{KdaError, RemoteError, Result};

use super::types as wire;

/// Target prefix of every operation.
const TARGET_PREFIX: &str = "KinesisAnalytics_20180523";

/// Content type of the JSON 1.1 protocol.
const CONTENT_TYPE: &str = "application/x-amz-json-1.1";

/// Default request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Maximum number of attempts for transient failures.
const MAX_RETRIES: u32 = 3;

/// Delay between retries in milliseconds.
const RETRY_DELAY_MS: u64 = 1000;

/// Operations on a remote application.
///
/// Every mutation request carries the version it is based on; the response
/// carries the version after the mutation.
#[async_trait]
pub trait RemoteClient: Send + Sync {
    /// Describes an application.
    async fn describe_application(&self, name: &str) -> Result<wire::ApplicationDetail>;

    /// Describes an asynchronous operation.
    async fn describe_operation(&self, name: &str, operation_id: &str)
    -> Result<wire::OperationInfo>;

    /// Creates an application.
    async fn create_application(
        &self,
        request: &wire::CreateApplicationRequest,
    ) -> Result<wire::ApplicationDetail>;

    /// Deletes an application.
    async fn delete_application(&self, request: &wire::DeleteApplicationRequest) -> Result<()>;

    /// Applies a configuration delta.
    async fn update_application(
        &self,
        request: &wire::UpdateApplicationRequest,
    ) -> Result<wire::MutationResponse>;

    /// Adds the primary input.
    async fn add_input(&self, request: &wire::AddInputRequest) -> Result<wire::MutationResponse>;

    /// Attaches input pre-processing.
    async fn add_input_processing_configuration(
        &self,
        request: &wire::AddInputProcessingConfigurationRequest,
    ) -> Result<wire::MutationResponse>;

    /// Detaches input pre-processing.
    async fn delete_input_processing_configuration(
        &self,
        request: &wire::DeleteInputProcessingConfigurationRequest,
    ) -> Result<wire::MutationResponse>;

    /// Adds an output.
    async fn add_output(&self, request: &wire::AddOutputRequest) -> Result<wire::MutationResponse>;

    /// Deletes an output.
    async fn delete_output(
        &self,
        request: &wire::DeleteOutputRequest,
    ) -> Result<wire::MutationResponse>;

    /// Adds the reference data source.
    async fn add_reference_data_source(
        &self,
        request: &wire::AddReferenceDataSourceRequest,
    ) -> Result<wire::MutationResponse>;

    /// Deletes the reference data source.
    async fn delete_reference_data_source(
        &self,
        request: &wire::DeleteReferenceDataSourceRequest,
    ) -> Result<wire::MutationResponse>;

    /// Adds a network attachment.
    async fn add_vpc_configuration(
        &self,
        request: &wire::AddVpcConfigurationRequest,
    ) -> Result<wire::MutationResponse>;

    /// Deletes a network attachment.
    async fn delete_vpc_configuration(
        &self,
        request: &wire::DeleteVpcConfigurationRequest,
    ) -> Result<wire::MutationResponse>;

    /// Adds a log stream attachment.
    async fn add_logging_option(
        &self,
        request: &wire::AddLoggingOptionRequest,
    ) -> Result<wire::MutationResponse>;

    /// Deletes a log stream attachment.
    async fn delete_logging_option(
        &self,
        request: &wire::DeleteLoggingOptionRequest,
    ) -> Result<wire::MutationResponse>;

    /// Starts an application.
    async fn start_application(
        &self,
        request: &wire::StartApplicationRequest,
    ) -> Result<wire::LifecycleResponse>;

    /// Stops an application.
    async fn stop_application(
        &self,
        request: &wire::StopApplicationRequest,
    ) -> Result<wire::LifecycleResponse>;
}

/// JSON 1.1 client for the control-plane API.
#[derive(Debug, Clone)]
pub struct HttpRemoteClient {
    /// HTTP client.
    client: Client,
    /// Endpoint URL.
    endpoint: String,
    /// Optional bearer token.
    auth_token: Option<String>,
}

#[derive(Debug, serde::Deserialize)]
struct ApplicationDetailEnvelope {
    #[serde(rename = "ApplicationDetail")]
    application_detail: wire::ApplicationDetail,
}

#[derive(Debug, serde::Deserialize)]
struct UpdateEnvelope {
    #[serde(rename = "ApplicationDetail")]
    application_detail: wire::ApplicationDetail,
    #[serde(rename = "OperationId", default)]
    operation_id: Option<String>,
}

#[derive(Debug, serde::Deserialize)]
struct OperationEnvelope {
    #[serde(rename = "ApplicationOperationInfoDetails")]
    details: wire::OperationInfo,
}

#[derive(Debug, Serialize)]
struct DescribeApplicationRequest<'a> {
    #[serde(rename = "ApplicationName")]
    application_name: &'a str,
}

#[derive(Debug, Serialize)]
struct DescribeOperationRequest<'a> {
    #[serde(rename = "ApplicationName")]
    application_name: &'a str,
    #[serde(rename = "OperationId")]
    operation_id: &'a str,
}

/// Error body of the JSON 1.1 protocol.
#[derive(Debug, Default, serde::Deserialize)]
struct ErrorBody {
    #[serde(rename = "__type", default)]
    error_type: String,
    #[serde(alias = "Message", default)]
    message: String,
}

impl HttpRemoteClient {
    /// Creates a client for the given endpoint.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(endpoint: impl Into<String>) -> Result<Self> {
        Self::with_timeout(endpoint, DEFAULT_TIMEOUT_SECS)
    }

    /// Creates a client with a custom request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn with_timeout(endpoint: impl Into<String>, timeout_secs: u64) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| RemoteError::network(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
            auth_token: None,
        })
    }

    /// Sets a bearer token sent with every request.
    #[must_use]
    pub fn with_auth_token(mut self, token: Option<String>) -> Self {
        self.auth_token = token;
        self
    }

    /// Executes an operation, retrying transient failures.
    async fn execute<Req, Resp>(&self, operation: &str, resource: &str, request: &Req) -> Result<Resp>
    where
        Req: Serialize + Sync,
        Resp: DeserializeOwned,
    {
        let mut last_error = None;
        let mut delay = Duration::ZERO;

        for attempt in 0..MAX_RETRIES {
            if attempt > 0 {
                debug!("Retry attempt {attempt} of {MAX_RETRIES} for {operation} in {delay:?}");
                tokio::time::sleep(delay).await;
            }

            match self.execute_once(operation, resource, request).await {
                Ok(result) => return Ok(result),
                Err(e) if e.is_retryable() => {
                    let backoff = Duration::from_millis(RETRY_DELAY_MS * u64::from(attempt + 1));
                    delay = match &e {
                        KdaError::Remote(RemoteError::Throttled { .. }) => e
                            .retry_delay_secs()
                            .map_or(backoff, |secs| backoff.max(Duration::from_secs(secs))),
                        _ => backoff,
                    };
                    last_error = Some(e);
                }
                Err(e) => return Err(e),
            }
        }

        Err(last_error.unwrap_or_else(|| {
            KdaError::Remote(RemoteError::NetworkError {
                message: String::from("Max retries exceeded"),
            })
        }))
    }

    /// Executes a single request.
    async fn execute_once<Req, Resp>(
        &self,
        operation: &str,
        resource: &str,
        request: &Req,
    ) -> Result<Resp>
    where
        Req: Serialize + Sync,
        Resp: DeserializeOwned,
    {
        trace!("Calling {operation} on {resource}");

        let mut builder = self
            .client
            .post(&self.endpoint)
            .header(header::CONTENT_TYPE, CONTENT_TYPE)
            .header("X-Amz-Target", format!("{TARGET_PREFIX}.{operation}"))
            .json(request);
        if let Some(token) = &self.auth_token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }

        let response = builder.send().await.map_err(|e| {
            KdaError::Remote(RemoteError::NetworkError {
                message: format!("Request failed: {e}"),
            })
        })?;

        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse().ok())
                .unwrap_or(1);
            return Err(KdaError::Remote(RemoteError::Throttled {
                retry_after_secs: retry_after,
            }));
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_error(status, resource, &body));
        }

        response.json::<Resp>().await.map_err(|e| {
            KdaError::Remote(RemoteError::InvalidResponse {
                message: format!("Failed to parse {operation} response: {e}"),
            })
        })
    }
}

/// Maps an error response onto the error taxonomy.
fn classify_error(status: StatusCode, resource: &str, body: &str) -> KdaError {
    let parsed: ErrorBody = serde_json::from_str(body).unwrap_or_default();
    // `__type` may be namespaced: "prefix#ResourceNotFoundException".
    let code = parsed
        .error_type
        .rsplit('#')
        .next()
        .unwrap_or_default()
        .to_string();
    let message = if parsed.message.is_empty() {
        body.to_string()
    } else {
        parsed.message
    };

    let error = match code.as_str() {
        "ResourceNotFoundException" => RemoteError::NotFound {
            resource: resource.to_string(),
        },
        "ConcurrentModificationException" => RemoteError::VersionConflict {
            resource: resource.to_string(),
            message,
        },
        "ResourceInUseException" => RemoteError::InvalidState {
            resource: resource.to_string(),
            message,
        },
        "ThrottlingException" | "TooManyRequestsException" => {
            RemoteError::Throttled { retry_after_secs: 1 }
        }
        "UnrecognizedClientException" | "AccessDeniedException" => {
            RemoteError::AuthenticationFailed { message }
        }
        _ if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN => {
            RemoteError::AuthenticationFailed { message }
        }
        _ if status.is_server_error() => RemoteError::NetworkError {
            message: format!("{status}: {message}"),
        },
        _ => RemoteError::api_error(status.as_u16(), code, message),
    };
    KdaError::Remote(error)
}

#[async_trait]
impl RemoteClient for HttpRemoteClient {
    async fn describe_application(&self, name: &str) -> Result<wire::ApplicationDetail> {
        let request = DescribeApplicationRequest {
            application_name: name,
        };
        let envelope: ApplicationDetailEnvelope =
            self.execute("DescribeApplication", name, &request).await?;
        Ok(envelope.application_detail)
    }

    async fn describe_operation(
        &self,
        name: &str,
        operation_id: &str,
    ) -> Result<wire::OperationInfo> {
        let request = DescribeOperationRequest {
            application_name: name,
            operation_id,
        };
        let envelope: OperationEnvelope = self
            .execute("DescribeApplicationOperation", name, &request)
            .await?;
        Ok(envelope.details)
    }

    async fn create_application(
        &self,
        request: &wire::CreateApplicationRequest,
    ) -> Result<wire::ApplicationDetail> {
        let envelope: ApplicationDetailEnvelope = self
            .execute("CreateApplication", &request.application_name, request)
            .await?;
        Ok(envelope.application_detail)
    }

    async fn delete_application(&self, request: &wire::DeleteApplicationRequest) -> Result<()> {
        let _: serde_json::Value = self
            .execute("DeleteApplication", &request.application_name, request)
            .await?;
        Ok(())
    }

    async fn update_application(
        &self,
        request: &wire::UpdateApplicationRequest,
    ) -> Result<wire::MutationResponse> {
        let envelope: UpdateEnvelope = self
            .execute("UpdateApplication", &request.application_name, request)
            .await?;
        Ok(wire::MutationResponse {
            application_version_id: envelope.application_detail.application_version_id,
            operation_id: envelope.operation_id,
        })
    }

    async fn add_input(&self, request: &wire::AddInputRequest) -> Result<wire::MutationResponse> {
        self.execute("AddApplicationInput", &request.application_name, request)
            .await
    }

    async fn add_input_processing_configuration(
        &self,
        request: &wire::AddInputProcessingConfigurationRequest,
    ) -> Result<wire::MutationResponse> {
        self.execute(
            "AddApplicationInputProcessingConfiguration",
            &request.application_name,
            request,
        )
        .await
    }

    async fn delete_input_processing_configuration(
        &self,
        request: &wire::DeleteInputProcessingConfigurationRequest,
    ) -> Result<wire::MutationResponse> {
        self.execute(
            "DeleteApplicationInputProcessingConfiguration",
            &request.application_name,
            request,
        )
        .await
    }

    async fn add_output(&self, request: &wire::AddOutputRequest) -> Result<wire::MutationResponse> {
        self.execute("AddApplicationOutput", &request.application_name, request)
            .await
    }

    async fn delete_output(
        &self,
        request: &wire::DeleteOutputRequest,
    ) -> Result<wire::MutationResponse> {
        self.execute("DeleteApplicationOutput", &request.application_name, request)
            .await
    }

    async fn add_reference_data_source(
        &self,
        request: &wire::AddReferenceDataSourceRequest,
    ) -> Result<wire::MutationResponse> {
        self.execute(
            "AddApplicationReferenceDataSource",
            &request.application_name,
            request,
        )
        .await
    }

    async fn delete_reference_data_source(
        &self,
        request: &wire::DeleteReferenceDataSourceRequest,
    ) -> Result<wire::MutationResponse> {
        self.execute(
            "DeleteApplicationReferenceDataSource",
            &request.application_name,
            request,
        )
        .await
    }

    async fn add_vpc_configuration(
        &self,
        request: &wire::AddVpcConfigurationRequest,
    ) -> Result<wire::MutationResponse> {
        self.execute(
            "AddApplicationVpcConfiguration",
            &request.application_name,
            request,
        )
        .await
    }

    async fn delete_vpc_configuration(
        &self,
        request: &wire::DeleteVpcConfigurationRequest,
    ) -> Result<wire::MutationResponse> {
        self.execute(
            "DeleteApplicationVpcConfiguration",
            &request.application_name,
            request,
        )
        .await
    }

    async fn add_logging_option(
        &self,
        request: &wire::AddLoggingOptionRequest,
    ) -> Result<wire::MutationResponse> {
        self.execute(
            "AddApplicationCloudWatchLoggingOption",
            &request.application_name,
            request,
        )
        .await
    }

    async fn delete_logging_option(
        &self,
        request: &wire::DeleteLoggingOptionRequest,
    ) -> Result<wire::MutationResponse> {
        self.execute(
            "DeleteApplicationCloudWatchLoggingOption",
            &request.application_name,
            request,
        )
        .await
    }

    async fn start_application(
        &self,
        request: &wire::StartApplicationRequest,
    ) -> Result<wire::LifecycleResponse> {
        self.execute("StartApplication", &request.application_name, request)
            .await
    }

    async fn stop_application(
        &self,
        request: &wire::StopApplicationRequest,
    ) -> Result<wire::LifecycleResponse> {
        self.execute("StopApplication", &request.application_name, request)
            .await
    }
}
