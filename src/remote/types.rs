//! Wire types for the application control-plane API.
//!
//! Requests and responses use the JSON 1.1 protocol with `PascalCase`
//! member names. Create payloads, descriptions and update deltas are kept as
//! separate types because the remote API shapes them differently.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::config::{
    ApplicationRestoreType, CodeContentType, ConfigurationType, InputStartingPosition, LogLevel,
    MetricsLevel, RecordFormatType,
};

// ============================================================================
// Status
// ============================================================================

/// Remote application status.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApplicationStatus {
    /// Being deleted.
    Deleting,
    /// Starting.
    Starting,
    /// Stopping.
    Stopping,
    /// Stopped and ready to start.
    Ready,
    /// Running.
    Running,
    /// Applying an update.
    Updating,
    /// Scaling.
    Autoscaling,
    /// Stopping without taking a snapshot.
    ForceStopping,
    /// Rolling back an update.
    RollingBack,
    /// Rolled back after a failed update.
    RolledBack,
    /// Under maintenance.
    Maintenance,
    /// Unrecognized status.
    #[serde(other)]
    Unknown,
}

impl ApplicationStatus {
    /// Returns true when the application accepts new updates.
    #[must_use]
    pub const fn is_stable(self) -> bool {
        matches!(self, Self::Ready | Self::Running)
    }

    /// Returns true for statuses the application leaves on its own.
    #[must_use]
    pub const fn is_transitional(self) -> bool {
        matches!(
            self,
            Self::Starting
                | Self::Stopping
                | Self::Updating
                | Self::Autoscaling
                | Self::ForceStopping
                | Self::RollingBack
                | Self::Maintenance
        )
    }
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Deleting => "DELETING",
            Self::Starting => "STARTING",
            Self::Stopping => "STOPPING",
            Self::Ready => "READY",
            Self::Running => "RUNNING",
            Self::Updating => "UPDATING",
            Self::Autoscaling => "AUTOSCALING",
            Self::ForceStopping => "FORCE_STOPPING",
            Self::RollingBack => "ROLLING_BACK",
            Self::RolledBack => "ROLLED_BACK",
            Self::Maintenance => "MAINTENANCE",
            Self::Unknown => "UNKNOWN",
        };
        write!(f, "{s}")
    }
}

/// Status of an asynchronous remote operation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OperationStatus {
    /// Still running.
    InProgress,
    /// Finished successfully.
    Successful,
    /// Finished with an error.
    Failed,
    /// Cancelled.
    Cancelled,
}

// ============================================================================
// Shared shapes
// ============================================================================

/// A reference to a remote resource by ARN.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResourceRef {
    /// Resource ARN.
    #[serde(rename = "ResourceARN")]
    pub resource_arn: String,
}

/// Partial update of a resource reference.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResourceRefUpdate {
    /// New resource ARN.
    #[serde(rename = "ResourceARNUpdate")]
    pub resource_arn_update: String,
}

/// Record schema.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase", default)]
pub struct SourceSchema {
    /// Record columns.
    pub record_columns: Vec<RecordColumn>,
    /// Character encoding.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record_encoding: Option<String>,
    /// Record format.
    pub record_format: RecordFormat,
}

/// Schema column.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase", default)]
pub struct RecordColumn {
    /// Column name.
    pub name: String,
    /// SQL type.
    pub sql_type: String,
    /// Path into the source record.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mapping: Option<String>,
}

/// Record format.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase", default)]
pub struct RecordFormat {
    /// Format type.
    pub record_format_type: RecordFormatType,
    /// Mapping parameters.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mapping_parameters: Option<MappingParameters>,
}

/// Mapping parameters.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct MappingParameters {
    /// Delimiter-based mapping.
    #[serde(rename = "CSVMappingParameters", skip_serializing_if = "Option::is_none")]
    pub csv_mapping_parameters: Option<CsvMappingParameters>,
    /// Path-based mapping.
    #[serde(rename = "JSONMappingParameters", skip_serializing_if = "Option::is_none")]
    pub json_mapping_parameters: Option<JsonMappingParameters>,
}

/// Delimiter-based mapping.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase", default)]
pub struct CsvMappingParameters {
    /// Row delimiter.
    pub record_row_delimiter: String,
    /// Column delimiter.
    pub record_column_delimiter: String,
}

/// Path-based mapping.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase", default)]
pub struct JsonMappingParameters {
    /// Path to the top-level record.
    pub record_row_path: String,
}

/// Input parallelism.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase", default)]
pub struct InputParallelism {
    /// Number of in-application streams.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<i32>,
}

/// Starting position of an input.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase", default)]
pub struct InputStartingPositionConfiguration {
    /// Starting position.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_starting_position: Option<InputStartingPosition>,
}

/// Output serialization.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase", default)]
pub struct DestinationSchema {
    /// Format type.
    pub record_format_type: RecordFormatType,
}

/// Property group.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase", default)]
pub struct PropertyGroup {
    /// Group identifier.
    pub property_group_id: String,
    /// Key/value properties.
    pub property_map: BTreeMap<String, String>,
}

/// Checkpoint tuning (create payload and description).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase", default)]
pub struct CheckpointConfiguration {
    /// Default or custom.
    pub configuration_type: ConfigurationType,
    /// Whether checkpointing is enabled.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checkpointing_enabled: Option<bool>,
    /// Interval in milliseconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checkpoint_interval: Option<i64>,
    /// Minimum pause in milliseconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_pause_between_checkpoints: Option<i64>,
}

/// Monitoring tuning (create payload and description).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase", default)]
pub struct MonitoringConfiguration {
    /// Default or custom.
    pub configuration_type: ConfigurationType,
    /// Metrics granularity.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metrics_level: Option<MetricsLevel>,
    /// Log level.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_level: Option<LogLevel>,
}

/// Parallelism tuning (create payload and description).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase", default)]
pub struct ParallelismConfiguration {
    /// Default or custom.
    pub configuration_type: ConfigurationType,
    /// Initial parallelism.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parallelism: Option<i32>,
    /// Parallelism per processing unit.
    #[serde(rename = "ParallelismPerKPU", skip_serializing_if = "Option::is_none")]
    pub parallelism_per_kpu: Option<i32>,
    /// Whether auto scaling is enabled.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_scaling_enabled: Option<bool>,
    /// Parallelism currently in effect (descriptions only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_parallelism: Option<i32>,
}

/// Snapshot restore selection.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase", default)]
pub struct ApplicationRestoreConfiguration {
    /// Restore mode.
    pub application_restore_type: ApplicationRestoreType,
    /// Snapshot name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snapshot_name: Option<String>,
}

/// Runtime restart flags.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase", default)]
pub struct FlinkRunConfiguration {
    /// Allow unmapped state on restore.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow_non_restored_state: Option<bool>,
}

/// Object-storage location of application code.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase", default)]
pub struct S3ContentLocation {
    /// Bucket ARN.
    #[serde(rename = "BucketARN")]
    pub bucket_arn: String,
    /// Object key.
    pub file_key: String,
    /// Object version.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object_version: Option<String>,
}

/// Object-storage source of reference data.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase", default)]
pub struct S3ReferenceDataSource {
    /// Bucket ARN.
    #[serde(rename = "BucketARN")]
    pub bucket_arn: String,
    /// Object key.
    pub file_key: String,
}

// ============================================================================
// Create payloads
// ============================================================================

/// Input create payload.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct Input {
    /// Stream name prefix.
    pub name_prefix: String,
    /// Pre-processing.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_processing_configuration: Option<InputProcessingConfiguration>,
    /// Data-stream source.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kinesis_streams_input: Option<ResourceRef>,
    /// Delivery-stream source.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kinesis_firehose_input: Option<ResourceRef>,
    /// Parallelism.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_parallelism: Option<InputParallelism>,
    /// Record schema.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_schema: Option<SourceSchema>,
}

/// Input pre-processing payload.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct InputProcessingConfiguration {
    /// Function invoked on each batch.
    pub input_lambda_processor: ResourceRef,
}

/// Output create payload.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct Output {
    /// In-application stream name.
    pub name: String,
    /// Data-stream sink.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kinesis_streams_output: Option<ResourceRef>,
    /// Delivery-stream sink.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kinesis_firehose_output: Option<ResourceRef>,
    /// Function sink.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lambda_output: Option<ResourceRef>,
    /// Output serialization.
    pub destination_schema: DestinationSchema,
}

/// Reference data source create payload.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct ReferenceDataSource {
    /// Table name.
    pub table_name: String,
    /// Object-storage source.
    pub s3_reference_data_source: S3ReferenceDataSource,
    /// Record schema.
    pub reference_schema: SourceSchema,
}

/// Network attachment create payload.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct VpcConfiguration {
    /// Subnets.
    pub subnet_ids: Vec<String>,
    /// Security groups.
    pub security_group_ids: Vec<String>,
}

/// Log stream attachment create payload.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CloudWatchLoggingOption {
    /// Log stream ARN.
    #[serde(rename = "LogStreamARN")]
    pub log_stream_arn: String,
}

/// Code content payload.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct CodeContent {
    /// Inline text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_content: Option<String>,
    /// Object-storage location.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub s3_content_location: Option<S3ContentLocation>,
}

/// Code configuration payload.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct ApplicationCodeConfiguration {
    /// Code content.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code_content: Option<CodeContent>,
    /// Packaging.
    pub code_content_type: CodeContentType,
}

/// Snapshot configuration payload.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct ApplicationSnapshotConfiguration {
    /// Whether snapshots are taken.
    pub snapshots_enabled: bool,
}

/// Property groups payload.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct EnvironmentProperties {
    /// Property groups.
    pub property_groups: Vec<PropertyGroup>,
}

/// Tuning payload.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct FlinkApplicationConfiguration {
    /// Checkpoint tuning.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checkpoint_configuration: Option<CheckpointConfiguration>,
    /// Monitoring tuning.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub monitoring_configuration: Option<MonitoringConfiguration>,
    /// Parallelism tuning.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parallelism_configuration: Option<ParallelismConfiguration>,
}

/// Streaming configuration payload.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct SqlApplicationConfiguration {
    /// Inputs (at most one).
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub inputs: Vec<Input>,
    /// Outputs.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub outputs: Vec<Output>,
    /// Reference data sources (at most one).
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub reference_data_sources: Vec<ReferenceDataSource>,
}

/// Full application configuration payload, used on create.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct ApplicationConfiguration {
    /// Streaming configuration.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sql_application_configuration: Option<SqlApplicationConfiguration>,
    /// Tuning.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flink_application_configuration: Option<FlinkApplicationConfiguration>,
    /// Property groups.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub environment_properties: Option<EnvironmentProperties>,
    /// Code.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub application_code_configuration: Option<ApplicationCodeConfiguration>,
    /// Snapshots.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub application_snapshot_configuration: Option<ApplicationSnapshotConfiguration>,
    /// Network attachments.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub vpc_configurations: Vec<VpcConfiguration>,
}

// ============================================================================
// Descriptions
// ============================================================================

/// Full description of an application.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct ApplicationDetail {
    /// Application ARN.
    #[serde(rename = "ApplicationARN", default)]
    pub application_arn: String,
    /// Free-form description.
    #[serde(default)]
    pub application_description: Option<String>,
    /// Application name.
    pub application_name: String,
    /// Runtime identifier.
    #[serde(default)]
    pub runtime_environment: String,
    /// Execution role.
    #[serde(default)]
    pub service_execution_role: Option<String>,
    /// Current status.
    pub application_status: ApplicationStatus,
    /// Current version.
    pub application_version_id: i64,
    /// Creation time, seconds since epoch.
    #[serde(default)]
    pub create_timestamp: Option<f64>,
    /// Last update time, seconds since epoch.
    #[serde(default)]
    pub last_update_timestamp: Option<f64>,
    /// Nested configuration.
    #[serde(default)]
    pub application_configuration_description: Option<ApplicationConfigurationDescription>,
    /// Log stream attachments.
    #[serde(default)]
    pub cloud_watch_logging_option_descriptions: Vec<CloudWatchLoggingOptionDescription>,
}

/// Nested configuration description.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase", default)]
pub struct ApplicationConfigurationDescription {
    /// Streaming configuration.
    pub sql_application_configuration_description: Option<SqlApplicationConfigurationDescription>,
    /// Code.
    pub application_code_configuration_description: Option<ApplicationCodeConfigurationDescription>,
    /// Run configuration.
    pub run_configuration_description: Option<RunConfigurationDescription>,
    /// Tuning.
    pub flink_application_configuration_description:
        Option<FlinkApplicationConfigurationDescription>,
    /// Property groups.
    pub environment_property_descriptions: Option<EnvironmentPropertyDescriptions>,
    /// Snapshots.
    pub application_snapshot_configuration_description:
        Option<ApplicationSnapshotConfiguration>,
    /// Network attachments.
    pub vpc_configuration_descriptions: Vec<VpcConfigurationDescription>,
}

/// Streaming configuration description.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase", default)]
pub struct SqlApplicationConfigurationDescription {
    /// Inputs.
    pub input_descriptions: Vec<InputDescription>,
    /// Outputs.
    pub output_descriptions: Vec<OutputDescription>,
    /// Reference data sources.
    pub reference_data_source_descriptions: Vec<ReferenceDataSourceDescription>,
}

/// Input description.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase", default)]
pub struct InputDescription {
    /// Input identity.
    pub input_id: Option<String>,
    /// Stream name prefix.
    pub name_prefix: Option<String>,
    /// Generated in-application stream names.
    pub in_app_stream_names: Vec<String>,
    /// Pre-processing.
    pub input_processing_configuration_description: Option<InputProcessingConfigurationDescription>,
    /// Data-stream source.
    pub kinesis_streams_input_description: Option<ResourceRef>,
    /// Delivery-stream source.
    pub kinesis_firehose_input_description: Option<ResourceRef>,
    /// Record schema.
    pub input_schema: Option<SourceSchema>,
    /// Parallelism.
    pub input_parallelism: Option<InputParallelism>,
    /// Starting position.
    pub input_starting_position_configuration: Option<InputStartingPositionConfiguration>,
}

/// Pre-processing description.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase", default)]
pub struct InputProcessingConfigurationDescription {
    /// Function.
    pub input_lambda_processor_description: Option<ResourceRef>,
}

/// Output description.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase", default)]
pub struct OutputDescription {
    /// Output identity.
    pub output_id: Option<String>,
    /// In-application stream name.
    pub name: Option<String>,
    /// Data-stream sink.
    pub kinesis_streams_output_description: Option<ResourceRef>,
    /// Delivery-stream sink.
    pub kinesis_firehose_output_description: Option<ResourceRef>,
    /// Function sink.
    pub lambda_output_description: Option<ResourceRef>,
    /// Output serialization.
    pub destination_schema: Option<DestinationSchema>,
}

/// Reference data source description.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase", default)]
pub struct ReferenceDataSourceDescription {
    /// Reference identity.
    pub reference_id: Option<String>,
    /// Table name.
    pub table_name: Option<String>,
    /// Object-storage source.
    pub s3_reference_data_source_description: Option<S3ReferenceDataSource>,
    /// Record schema.
    pub reference_schema: Option<SourceSchema>,
}

/// Code configuration description.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase", default)]
pub struct ApplicationCodeConfigurationDescription {
    /// Packaging.
    pub code_content_type: CodeContentType,
    /// Code content.
    pub code_content_description: Option<CodeContentDescription>,
}

/// Code content description.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase", default)]
pub struct CodeContentDescription {
    /// Inline text.
    pub text_content: Option<String>,
    /// Object-storage location.
    pub s3_application_code_location_description: Option<S3ContentLocation>,
}

/// Run configuration description.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase", default)]
pub struct RunConfigurationDescription {
    /// Restore selection.
    pub application_restore_configuration_description: Option<ApplicationRestoreConfiguration>,
    /// Restart flags.
    pub flink_run_configuration_description: Option<FlinkRunConfiguration>,
}

/// Tuning description.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase", default)]
pub struct FlinkApplicationConfigurationDescription {
    /// Checkpoint tuning.
    pub checkpoint_configuration_description: Option<CheckpointConfiguration>,
    /// Monitoring tuning.
    pub monitoring_configuration_description: Option<MonitoringConfiguration>,
    /// Parallelism tuning.
    pub parallelism_configuration_description: Option<ParallelismConfiguration>,
}

/// Property groups description.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase", default)]
pub struct EnvironmentPropertyDescriptions {
    /// Property groups.
    pub property_group_descriptions: Vec<PropertyGroup>,
}

/// Network attachment description.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase", default)]
pub struct VpcConfigurationDescription {
    /// Attachment identity.
    pub vpc_configuration_id: Option<String>,
    /// Network identifier.
    pub vpc_id: Option<String>,
    /// Subnets.
    pub subnet_ids: Vec<String>,
    /// Security groups.
    pub security_group_ids: Vec<String>,
}

/// Log stream attachment description.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CloudWatchLoggingOptionDescription {
    /// Attachment identity.
    #[serde(rename = "CloudWatchLoggingOptionId")]
    pub cloudwatch_logging_option_id: Option<String>,
    /// Log stream ARN.
    #[serde(rename = "LogStreamARN")]
    pub log_stream_arn: String,
}

// ============================================================================
// Update deltas
// ============================================================================

/// Configuration delta for `UpdateApplication`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct ApplicationConfigurationUpdate {
    /// Streaming configuration delta.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sql_application_configuration_update: Option<SqlApplicationConfigurationUpdate>,
    /// Code delta.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub application_code_configuration_update: Option<ApplicationCodeConfigurationUpdate>,
    /// Tuning delta.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flink_application_configuration_update: Option<FlinkApplicationConfigurationUpdate>,
    /// Replacement property groups.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub environment_property_updates: Option<EnvironmentProperties>,
    /// Snapshot delta.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub application_snapshot_configuration_update: Option<ApplicationSnapshotConfigurationUpdate>,
    /// Network attachment deltas.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub vpc_configuration_updates: Vec<VpcConfigurationUpdate>,
}

/// Streaming configuration delta.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct SqlApplicationConfigurationUpdate {
    /// Input deltas.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub input_updates: Vec<InputUpdate>,
    /// Reference data deltas.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub reference_data_source_updates: Vec<ReferenceDataSourceUpdate>,
}

/// Input delta, addressed by identity.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct InputUpdate {
    /// Input identity.
    pub input_id: String,
    /// New prefix.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name_prefix_update: Option<String>,
    /// Pre-processing delta.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_processing_configuration_update: Option<InputProcessingConfigurationUpdate>,
    /// Data-stream source delta.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kinesis_streams_input_update: Option<ResourceRefUpdate>,
    /// Delivery-stream source delta.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kinesis_firehose_input_update: Option<ResourceRefUpdate>,
    /// Schema delta.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_schema_update: Option<InputSchemaUpdate>,
    /// Parallelism delta.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_parallelism_update: Option<InputParallelismUpdate>,
}

impl InputUpdate {
    /// Returns true when the delta changes nothing.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.name_prefix_update.is_none()
            && self.input_processing_configuration_update.is_none()
            && self.kinesis_streams_input_update.is_none()
            && self.kinesis_firehose_input_update.is_none()
            && self.input_schema_update.is_none()
            && self.input_parallelism_update.is_none()
    }
}

/// Pre-processing delta.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct InputProcessingConfigurationUpdate {
    /// Function delta.
    pub input_lambda_processor_update: ResourceRefUpdate,
}

/// Schema delta.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct InputSchemaUpdate {
    /// New record format.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record_format_update: Option<RecordFormat>,
    /// New encoding.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record_encoding_update: Option<String>,
    /// Replacement columns.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record_column_updates: Option<Vec<RecordColumn>>,
}

/// Parallelism delta.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct InputParallelismUpdate {
    /// New stream count.
    pub count_update: i32,
}

/// Reference data delta, addressed by identity.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct ReferenceDataSourceUpdate {
    /// Reference identity.
    pub reference_id: String,
    /// New table name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table_name_update: Option<String>,
    /// Source delta.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub s3_reference_data_source_update: Option<S3ReferenceDataSourceUpdate>,
    /// Replacement schema.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference_schema_update: Option<SourceSchema>,
}

/// Reference source delta.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct S3ReferenceDataSourceUpdate {
    /// New bucket.
    #[serde(rename = "BucketARNUpdate", skip_serializing_if = "Option::is_none")]
    pub bucket_arn_update: Option<String>,
    /// New key.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_key_update: Option<String>,
}

/// Code delta.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct ApplicationCodeConfigurationUpdate {
    /// New packaging.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code_content_type_update: Option<CodeContentType>,
    /// Content delta.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code_content_update: Option<CodeContentUpdate>,
}

/// Code content delta.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct CodeContentUpdate {
    /// New inline text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_content_update: Option<String>,
    /// Location delta.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub s3_content_location_update: Option<S3ContentLocationUpdate>,
}

/// Code location delta.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct S3ContentLocationUpdate {
    /// New bucket.
    #[serde(rename = "BucketARNUpdate", skip_serializing_if = "Option::is_none")]
    pub bucket_arn_update: Option<String>,
    /// New key.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_key_update: Option<String>,
    /// New object version.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object_version_update: Option<String>,
}

/// Tuning delta.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct FlinkApplicationConfigurationUpdate {
    /// Checkpoint delta.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checkpoint_configuration_update: Option<CheckpointConfigurationUpdate>,
    /// Monitoring delta.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub monitoring_configuration_update: Option<MonitoringConfigurationUpdate>,
    /// Parallelism delta.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parallelism_configuration_update: Option<ParallelismConfigurationUpdate>,
}

/// Checkpoint delta.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct CheckpointConfigurationUpdate {
    /// New configuration type.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub configuration_type_update: Option<ConfigurationType>,
    /// New enabled flag.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checkpointing_enabled_update: Option<bool>,
    /// New interval.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checkpoint_interval_update: Option<i64>,
    /// New minimum pause.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_pause_between_checkpoints_update: Option<i64>,
}

/// Monitoring delta.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct MonitoringConfigurationUpdate {
    /// New configuration type.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub configuration_type_update: Option<ConfigurationType>,
    /// New metrics level.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metrics_level_update: Option<MetricsLevel>,
    /// New log level.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_level_update: Option<LogLevel>,
}

/// Parallelism delta.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct ParallelismConfigurationUpdate {
    /// New configuration type.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub configuration_type_update: Option<ConfigurationType>,
    /// New parallelism.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parallelism_update: Option<i32>,
    /// New parallelism per processing unit.
    #[serde(rename = "ParallelismPerKPUUpdate", skip_serializing_if = "Option::is_none")]
    pub parallelism_per_kpu_update: Option<i32>,
    /// New auto scaling flag.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_scaling_enabled_update: Option<bool>,
}

/// Snapshot delta.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct ApplicationSnapshotConfigurationUpdate {
    /// New flag.
    pub snapshots_enabled_update: bool,
}

/// Network attachment delta, addressed by identity.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct VpcConfigurationUpdate {
    /// Attachment identity.
    pub vpc_configuration_id: String,
    /// Replacement subnets.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subnet_id_updates: Option<Vec<String>>,
    /// Replacement security groups.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub security_group_id_updates: Option<Vec<String>>,
}

/// Log stream attachment delta, addressed by identity.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CloudWatchLoggingOptionUpdate {
    /// Attachment identity.
    #[serde(rename = "CloudWatchLoggingOptionId")]
    pub cloudwatch_logging_option_id: String,
    /// New log stream.
    #[serde(rename = "LogStreamARNUpdate", skip_serializing_if = "Option::is_none")]
    pub log_stream_arn_update: Option<String>,
}

/// Run configuration delta.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct RunConfigurationUpdate {
    /// New restart flags.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flink_run_configuration: Option<FlinkRunConfiguration>,
    /// New restore selection.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub application_restore_configuration: Option<ApplicationRestoreConfiguration>,
}

// ============================================================================
// Requests and responses
// ============================================================================

/// `CreateApplication` request.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct CreateApplicationRequest {
    /// Application name.
    pub application_name: String,
    /// Free-form description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub application_description: Option<String>,
    /// Runtime identifier.
    pub runtime_environment: String,
    /// Execution role.
    pub service_execution_role: String,
    /// Initial configuration.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub application_configuration: Option<ApplicationConfiguration>,
    /// Initial log stream attachments.
    #[serde(rename = "CloudWatchLoggingOptions", skip_serializing_if = "Vec::is_empty")]
    pub cloudwatch_logging_options: Vec<CloudWatchLoggingOption>,
}

/// `DeleteApplication` request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct DeleteApplicationRequest {
    /// Application name.
    pub application_name: String,
    /// Creation time of the application being deleted.
    pub create_timestamp: f64,
}

/// `UpdateApplication` request.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct UpdateApplicationRequest {
    /// Application name.
    pub application_name: String,
    /// Version the update is based on.
    pub current_application_version_id: i64,
    /// Configuration delta.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub application_configuration_update: Option<ApplicationConfigurationUpdate>,
    /// New execution role.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_execution_role_update: Option<String>,
    /// Run configuration delta.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub run_configuration_update: Option<RunConfigurationUpdate>,
    /// Log stream attachment deltas.
    #[serde(rename = "CloudWatchLoggingOptionUpdates", skip_serializing_if = "Vec::is_empty")]
    pub cloudwatch_logging_option_updates: Vec<CloudWatchLoggingOptionUpdate>,
}

/// `AddApplicationInput` request.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct AddInputRequest {
    /// Application name.
    pub application_name: String,
    /// Version the call is based on.
    pub current_application_version_id: i64,
    /// Input to add.
    pub input: Input,
}

/// `AddApplicationInputProcessingConfiguration` request.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct AddInputProcessingConfigurationRequest {
    /// Application name.
    pub application_name: String,
    /// Version the call is based on.
    pub current_application_version_id: i64,
    /// Target input.
    pub input_id: String,
    /// Pre-processing to attach.
    pub input_processing_configuration: InputProcessingConfiguration,
}

/// `DeleteApplicationInputProcessingConfiguration` request.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct DeleteInputProcessingConfigurationRequest {
    /// Application name.
    pub application_name: String,
    /// Version the call is based on.
    pub current_application_version_id: i64,
    /// Target input.
    pub input_id: String,
}

/// `AddApplicationOutput` request.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct AddOutputRequest {
    /// Application name.
    pub application_name: String,
    /// Version the call is based on.
    pub current_application_version_id: i64,
    /// Output to add.
    pub output: Output,
}

/// `DeleteApplicationOutput` request.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct DeleteOutputRequest {
    /// Application name.
    pub application_name: String,
    /// Version the call is based on.
    pub current_application_version_id: i64,
    /// Output identity.
    pub output_id: String,
}

/// `AddApplicationReferenceDataSource` request.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct AddReferenceDataSourceRequest {
    /// Application name.
    pub application_name: String,
    /// Version the call is based on.
    pub current_application_version_id: i64,
    /// Source to add.
    pub reference_data_source: ReferenceDataSource,
}

/// `DeleteApplicationReferenceDataSource` request.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct DeleteReferenceDataSourceRequest {
    /// Application name.
    pub application_name: String,
    /// Version the call is based on.
    pub current_application_version_id: i64,
    /// Reference identity.
    pub reference_id: String,
}

/// `AddApplicationVpcConfiguration` request.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct AddVpcConfigurationRequest {
    /// Application name.
    pub application_name: String,
    /// Version the call is based on.
    pub current_application_version_id: i64,
    /// Attachment to add.
    pub vpc_configuration: VpcConfiguration,
}

/// `DeleteApplicationVpcConfiguration` request.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct DeleteVpcConfigurationRequest {
    /// Application name.
    pub application_name: String,
    /// Version the call is based on.
    pub current_application_version_id: i64,
    /// Attachment identity.
    pub vpc_configuration_id: String,
}

/// `AddApplicationCloudWatchLoggingOption` request.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct AddLoggingOptionRequest {
    /// Application name.
    pub application_name: String,
    /// Version the call is based on.
    pub current_application_version_id: i64,
    /// Attachment to add.
    #[serde(rename = "CloudWatchLoggingOption")]
    pub cloudwatch_logging_option: CloudWatchLoggingOption,
}

/// `DeleteApplicationCloudWatchLoggingOption` request.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct DeleteLoggingOptionRequest {
    /// Application name.
    pub application_name: String,
    /// Version the call is based on.
    pub current_application_version_id: i64,
    /// Attachment identity.
    #[serde(rename = "CloudWatchLoggingOptionId")]
    pub cloudwatch_logging_option_id: String,
}

/// `StartApplication` request.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct StartApplicationRequest {
    /// Application name.
    pub application_name: String,
    /// Run configuration for this start.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub run_configuration: Option<StartRunConfiguration>,
}

/// Run configuration supplied on start.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct StartRunConfiguration {
    /// Restart flags.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flink_run_configuration: Option<FlinkRunConfiguration>,
    /// Per-input starting positions.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub sql_run_configurations: Vec<SqlRunConfiguration>,
    /// Restore selection.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub application_restore_configuration: Option<ApplicationRestoreConfiguration>,
}

/// Starting position for one input.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct SqlRunConfiguration {
    /// Input identity.
    pub input_id: String,
    /// Starting position.
    pub input_starting_position_configuration: InputStartingPositionConfiguration,
}

/// `StopApplication` request.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct StopApplicationRequest {
    /// Application name.
    pub application_name: String,
    /// Stop without taking a snapshot.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub force: Option<bool>,
}

/// Result of a versioned mutation.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct MutationResponse {
    /// Version after the mutation.
    pub application_version_id: i64,
    /// Asynchronous operation started by the mutation.
    #[serde(default)]
    pub operation_id: Option<String>,
}

impl MutationResponse {
    /// Creates a response without an operation id.
    #[must_use]
    pub const fn new(application_version_id: i64) -> Self {
        Self {
            application_version_id,
            operation_id: None,
        }
    }
}

/// Result of a start or stop.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase", default)]
pub struct LifecycleResponse {
    /// Asynchronous operation started by the call.
    pub operation_id: Option<String>,
}

/// Progress of an asynchronous remote operation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct OperationInfo {
    /// Operation identity.
    pub operation_id: String,
    /// Current status.
    pub operation_status: OperationStatus,
    /// Failure details.
    #[serde(default)]
    pub operation_failure_details: Option<OperationFailureDetails>,
}

/// Failure details of an operation.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase", default)]
pub struct OperationFailureDetails {
    /// Error information.
    pub error_info: Option<ErrorInfo>,
}

/// Error information of a failed operation.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase", default)]
pub struct ErrorInfo {
    /// Error text.
    pub error_string: Option<String>,
}
