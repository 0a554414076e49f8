//! The application configuration tree.
//!
//! These types describe the reconcilable part of an application in a
//! form-agnostic way: the desired side comes from the manifest, the
//! observed side is flattened from a remote description. Fields marked
//! *computed* are assigned by the remote system and never authored.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Reconcilable state of one application.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ApplicationTree {
    /// Role the application assumes when reading sources and writing sinks.
    pub service_execution_role: String,
    /// Nested application configuration.
    pub application_configuration: Option<ApplicationConfiguration>,
    /// Log stream attachment.
    pub cloudwatch_logging_options: Option<CloudWatchLoggingOption>,
    /// Whether the application should be running.
    pub start_application: bool,
    /// Whether stops are forced.
    pub force_stop: bool,
}

impl ApplicationTree {
    /// Returns the code configuration area, if present.
    #[must_use]
    pub fn code(&self) -> Option<&ApplicationCodeConfiguration> {
        self.application_configuration
            .as_ref()
            .and_then(|c| c.application_code_configuration.as_ref())
    }

    /// Returns the snapshot configuration area, if present.
    #[must_use]
    pub fn snapshot(&self) -> Option<&ApplicationSnapshotConfiguration> {
        self.application_configuration
            .as_ref()
            .and_then(|c| c.application_snapshot_configuration.as_ref())
    }

    /// Returns the runtime tuning area, if present.
    #[must_use]
    pub fn tuning(&self) -> Option<&FlinkApplicationConfiguration> {
        self.application_configuration
            .as_ref()
            .and_then(|c| c.flink_application_configuration.as_ref())
    }

    /// Returns the property groups area, if present.
    #[must_use]
    pub fn environment(&self) -> Option<&EnvironmentProperties> {
        self.application_configuration
            .as_ref()
            .and_then(|c| c.environment_properties.as_ref())
    }

    /// Returns the run configuration, if present.
    #[must_use]
    pub fn run_configuration(&self) -> Option<&RunConfiguration> {
        self.application_configuration
            .as_ref()
            .and_then(|c| c.run_configuration.as_ref())
    }

    /// Returns the streaming (SQL) configuration, if present.
    #[must_use]
    pub fn sql(&self) -> Option<&SqlApplicationConfiguration> {
        self.application_configuration
            .as_ref()
            .and_then(|c| c.sql_application_configuration.as_ref())
    }

    /// Returns the network attachment, if present.
    #[must_use]
    pub fn vpc(&self) -> Option<&VpcConfiguration> {
        self.application_configuration
            .as_ref()
            .and_then(|c| c.vpc_configuration.as_ref())
    }

    /// Returns the primary input, if present.
    #[must_use]
    pub fn input(&self) -> Option<&Input> {
        self.sql().and_then(|s| s.input.as_ref())
    }

    /// Returns the declared outputs (empty when absent).
    #[must_use]
    pub fn outputs(&self) -> &[Output] {
        self.sql().map_or(&[], |s| s.outputs.as_slice())
    }

    /// Returns the reference data source, if present.
    #[must_use]
    pub fn reference_data_source(&self) -> Option<&ReferenceDataSource> {
        self.sql().and_then(|s| s.reference_data_source.as_ref())
    }
}

/// Nested configuration of an application.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ApplicationConfiguration {
    /// Code location and type.
    pub application_code_configuration: Option<ApplicationCodeConfiguration>,
    /// Snapshot toggle.
    pub application_snapshot_configuration: Option<ApplicationSnapshotConfiguration>,
    /// Runtime property groups.
    pub environment_properties: Option<EnvironmentProperties>,
    /// Checkpoint, monitoring and parallelism tuning.
    pub flink_application_configuration: Option<FlinkApplicationConfiguration>,
    /// Restore and restart behavior.
    pub run_configuration: Option<RunConfiguration>,
    /// Streaming (SQL) input, outputs and reference data.
    pub sql_application_configuration: Option<SqlApplicationConfiguration>,
    /// Network attachment.
    pub vpc_configuration: Option<VpcConfiguration>,
}

// ============================================================================
// Code
// ============================================================================

/// Code configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ApplicationCodeConfiguration {
    /// Where the code lives. Exactly one of its members may be set.
    pub code_content: Option<CodeContent>,
    /// How the code is packaged.
    pub code_content_type: CodeContentType,
}

/// Code content: inline text or an object-storage location (oneof).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CodeContent {
    /// Object-storage location of the code archive.
    pub s3_content_location: Option<S3ContentLocation>,
    /// Inline code text.
    pub text_content: Option<String>,
}

/// Object-storage location of application code.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct S3ContentLocation {
    /// Bucket ARN.
    pub bucket_arn: String,
    /// Object key.
    pub file_key: String,
    /// Object version.
    pub object_version: Option<String>,
}

/// Code packaging.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CodeContentType {
    /// Inline text.
    #[default]
    Plaintext,
    /// Zip archive.
    Zipfile,
}

// ============================================================================
// Snapshots, properties and tuning
// ============================================================================

/// Snapshot configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ApplicationSnapshotConfiguration {
    /// Whether snapshots are taken.
    pub snapshots_enabled: bool,
}

/// Runtime property groups.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct EnvironmentProperties {
    /// Groups of key/value properties.
    pub property_groups: Vec<PropertyGroup>,
}

impl EnvironmentProperties {
    /// Returns a copy with groups sorted by id, for order-insensitive comparison.
    #[must_use]
    pub fn normalized(&self) -> Self {
        let mut property_groups = self.property_groups.clone();
        property_groups.sort_by(|a, b| a.property_group_id.cmp(&b.property_group_id));
        Self { property_groups }
    }
}

/// A named group of runtime properties.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PropertyGroup {
    /// Group identifier.
    pub property_group_id: String,
    /// Key/value properties.
    pub property_map: BTreeMap<String, String>,
}

/// Checkpoint, monitoring and parallelism tuning.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct FlinkApplicationConfiguration {
    /// Checkpoint tuning.
    pub checkpoint_configuration: Option<CheckpointConfiguration>,
    /// Monitoring tuning.
    pub monitoring_configuration: Option<MonitoringConfiguration>,
    /// Parallelism tuning.
    pub parallelism_configuration: Option<ParallelismConfiguration>,
}

impl FlinkApplicationConfiguration {
    /// Drops values the remote system computes under the default configuration type.
    #[must_use]
    pub fn normalized(&self) -> Self {
        Self {
            checkpoint_configuration: self.checkpoint_configuration.as_ref().map(|c| {
                if c.configuration_type.is_custom() {
                    c.clone()
                } else {
                    CheckpointConfiguration::default()
                }
            }),
            monitoring_configuration: self.monitoring_configuration.as_ref().map(|c| {
                if c.configuration_type.is_custom() {
                    c.clone()
                } else {
                    MonitoringConfiguration::default()
                }
            }),
            parallelism_configuration: self.parallelism_configuration.as_ref().map(|c| {
                if c.configuration_type.is_custom() {
                    c.clone()
                } else {
                    ParallelismConfiguration::default()
                }
            }),
        }
    }
}

/// Whether a tuning block uses remote defaults or custom values.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConfigurationType {
    /// Remote defaults; custom values are ignored.
    #[default]
    Default,
    /// Custom values apply.
    Custom,
}

impl ConfigurationType {
    /// Returns true for [`ConfigurationType::Custom`].
    #[must_use]
    pub const fn is_custom(self) -> bool {
        matches!(self, Self::Custom)
    }
}

/// Checkpoint tuning.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CheckpointConfiguration {
    /// Default or custom.
    pub configuration_type: ConfigurationType,
    /// Whether checkpointing is enabled (custom only).
    pub checkpointing_enabled: Option<bool>,
    /// Checkpoint interval in milliseconds (custom only).
    pub checkpoint_interval: Option<i64>,
    /// Minimum pause between checkpoints in milliseconds (custom only).
    pub min_pause_between_checkpoints: Option<i64>,
}

/// Monitoring tuning.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct MonitoringConfiguration {
    /// Default or custom.
    pub configuration_type: ConfigurationType,
    /// Log level (custom only).
    pub log_level: Option<LogLevel>,
    /// Metrics granularity (custom only).
    pub metrics_level: Option<MetricsLevel>,
}

/// Application log level.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LogLevel {
    /// Debug.
    Debug,
    /// Info.
    Info,
    /// Warn.
    Warn,
    /// Error.
    Error,
}

/// Metrics granularity.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MetricsLevel {
    /// Application level.
    Application,
    /// Operator level.
    Operator,
    /// Parallelism level.
    Parallelism,
    /// Task level.
    Task,
}

/// Parallelism tuning.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ParallelismConfiguration {
    /// Default or custom.
    pub configuration_type: ConfigurationType,
    /// Whether the remote system may scale parallelism (custom only).
    pub auto_scaling_enabled: Option<bool>,
    /// Initial parallelism (custom only).
    pub parallelism: Option<i32>,
    /// Parallelism per processing unit (custom only).
    pub parallelism_per_kpu: Option<i32>,
}

// ============================================================================
// Run configuration
// ============================================================================

/// Restore and restart behavior.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RunConfiguration {
    /// Snapshot restore selection.
    pub application_restore_configuration: Option<ApplicationRestoreConfiguration>,
    /// Runtime restart flags.
    pub flink_run_configuration: Option<FlinkRunConfiguration>,
}

/// Snapshot restore selection.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ApplicationRestoreConfiguration {
    /// Restore mode.
    pub application_restore_type: ApplicationRestoreType,
    /// Snapshot to restore from (custom snapshot only).
    pub snapshot_name: Option<String>,
}

/// Snapshot restore mode.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApplicationRestoreType {
    /// Start without restoring state.
    SkipRestoreFromSnapshot,
    /// Restore from the latest snapshot.
    #[default]
    RestoreFromLatestSnapshot,
    /// Restore from a named snapshot.
    RestoreFromCustomSnapshot,
}

/// Runtime restart flags.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct FlinkRunConfiguration {
    /// Allow state that cannot be mapped to the new program.
    pub allow_non_restored_state: bool,
}

// ============================================================================
// Streaming (SQL) configuration
// ============================================================================

/// Streaming input, outputs and reference data.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SqlApplicationConfiguration {
    /// Primary input stream. Create-only: it can be added or changed, never removed.
    pub input: Option<Input>,
    /// Output sinks (at most three), reconciled as a set.
    pub outputs: Vec<Output>,
    /// Reference data table.
    pub reference_data_source: Option<ReferenceDataSource>,
}

/// Primary input stream.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Input {
    /// Identity assigned by the remote system (computed).
    pub input_id: Option<String>,
    /// Stream names created in the application (computed).
    pub in_app_stream_names: Vec<String>,
    /// Prefix of the in-application stream names.
    pub name_prefix: String,
    /// Number of in-application streams.
    pub input_parallelism: Option<InputParallelism>,
    /// Pre-processing function.
    pub input_processing_configuration: Option<InputProcessingConfiguration>,
    /// Record schema.
    pub input_schema: Option<SourceSchema>,
    /// Where reading starts on the next start.
    pub input_starting_position_configuration: Option<InputStartingPositionConfiguration>,
    /// Delivery-stream source (oneof with `kinesis_streams_input`).
    pub kinesis_firehose_input: Option<ResourceArn>,
    /// Data-stream source (oneof with `kinesis_firehose_input`).
    pub kinesis_streams_input: Option<ResourceArn>,
}

/// A reference to a remote resource by ARN.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ResourceArn {
    /// Resource ARN.
    pub resource_arn: String,
}

impl ResourceArn {
    /// Creates a new reference.
    #[must_use]
    pub fn new(resource_arn: impl Into<String>) -> Self {
        Self {
            resource_arn: resource_arn.into(),
        }
    }
}

/// Input parallelism.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct InputParallelism {
    /// Number of in-application streams.
    pub count: i32,
}

/// Input pre-processing.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct InputProcessingConfiguration {
    /// Function invoked on each record batch.
    pub input_lambda_processor: ResourceArn,
}

/// Starting position of the input on start.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct InputStartingPositionConfiguration {
    /// Starting position.
    pub input_starting_position: Option<InputStartingPosition>,
}

/// Where reading starts.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InputStartingPosition {
    /// Newest records.
    Now,
    /// Oldest retained records.
    TrimHorizon,
    /// Where the application last stopped.
    LastStoppedPoint,
}

/// Record schema of an input or reference source.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SourceSchema {
    /// Columns.
    pub record_columns: Vec<RecordColumn>,
    /// Character encoding.
    pub record_encoding: Option<String>,
    /// Record format.
    pub record_format: RecordFormat,
}

/// A single schema column.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RecordColumn {
    /// Column name.
    pub name: String,
    /// SQL type.
    pub sql_type: String,
    /// Path into the source record.
    pub mapping: Option<String>,
}

/// Record format.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RecordFormat {
    /// Format type.
    pub record_format_type: RecordFormatType,
    /// Mapping parameters (oneof delimiter/path).
    pub mapping_parameters: Option<MappingParameters>,
}

/// Record format type.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RecordFormatType {
    /// JSON records.
    #[default]
    Json,
    /// Delimited records.
    Csv,
}

/// Record mapping: delimiter-based or path-based (oneof).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct MappingParameters {
    /// Delimiter-based mapping.
    pub csv_mapping_parameters: Option<CsvMappingParameters>,
    /// Path-based mapping.
    pub json_mapping_parameters: Option<JsonMappingParameters>,
}

/// Delimiter-based mapping.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CsvMappingParameters {
    /// Column delimiter.
    pub record_column_delimiter: String,
    /// Row delimiter.
    pub record_row_delimiter: String,
}

/// Path-based mapping.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct JsonMappingParameters {
    /// Path to the top-level record.
    pub record_row_path: String,
}

/// An output sink.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Output {
    /// Identity assigned by the remote system (computed).
    pub output_id: Option<String>,
    /// In-application stream written to the sink.
    pub name: String,
    /// Serialization of written records.
    pub destination_schema: DestinationSchema,
    /// Delivery-stream sink (oneof).
    pub kinesis_firehose_output: Option<ResourceArn>,
    /// Data-stream sink (oneof).
    pub kinesis_streams_output: Option<ResourceArn>,
    /// Function sink (oneof).
    pub lambda_output: Option<ResourceArn>,
}

/// Serialization of output records.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct DestinationSchema {
    /// Format type.
    pub record_format_type: RecordFormatType,
}

/// Reference data table backed by object storage.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ReferenceDataSource {
    /// Identity assigned by the remote system (computed).
    pub reference_id: Option<String>,
    /// In-application table name.
    pub table_name: String,
    /// Record schema.
    pub reference_schema: SourceSchema,
    /// Object-storage source.
    pub s3_reference_data_source: S3ReferenceDataSource,
}

/// Object-storage source of reference data.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct S3ReferenceDataSource {
    /// Bucket ARN.
    pub bucket_arn: String,
    /// Object key.
    pub file_key: String,
}

// ============================================================================
// Network and logging
// ============================================================================

/// Network attachment.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct VpcConfiguration {
    /// Identity assigned by the remote system (computed).
    pub vpc_configuration_id: Option<String>,
    /// Network the subnets belong to (computed).
    pub vpc_id: Option<String>,
    /// Security groups.
    pub security_group_ids: BTreeSet<String>,
    /// Subnets.
    pub subnet_ids: BTreeSet<String>,
}

/// Log stream attachment.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CloudWatchLoggingOption {
    /// Identity assigned by the remote system (computed).
    pub cloudwatch_logging_option_id: Option<String>,
    /// Log stream ARN.
    pub log_stream_arn: String,
}

// ============================================================================
// Identity
// ============================================================================

/// A sub-object that the remote system assigns an identity to.
pub trait Identified: Sized {
    /// The server-assigned identity, if known.
    fn identity(&self) -> Option<&str>;

    /// A copy with identity and other computed fields cleared.
    ///
    /// Two objects describe the same content iff their stripped copies are equal.
    #[must_use]
    fn without_identity(&self) -> Self;

    /// Content equality, ignoring identity and computed fields.
    fn same_content(&self, other: &Self) -> bool
    where
        Self: PartialEq,
    {
        self.without_identity() == other.without_identity()
    }
}

impl Identified for Input {
    fn identity(&self) -> Option<&str> {
        self.input_id.as_deref()
    }

    fn without_identity(&self) -> Self {
        Self {
            input_id: None,
            in_app_stream_names: Vec::new(),
            input_starting_position_configuration: None,
            ..self.clone()
        }
    }
}

impl Identified for Output {
    fn identity(&self) -> Option<&str> {
        self.output_id.as_deref()
    }

    fn without_identity(&self) -> Self {
        Self {
            output_id: None,
            ..self.clone()
        }
    }
}

impl Identified for ReferenceDataSource {
    fn identity(&self) -> Option<&str> {
        self.reference_id.as_deref()
    }

    fn without_identity(&self) -> Self {
        Self {
            reference_id: None,
            ..self.clone()
        }
    }
}

impl Identified for VpcConfiguration {
    fn identity(&self) -> Option<&str> {
        self.vpc_configuration_id.as_deref()
    }

    fn without_identity(&self) -> Self {
        Self {
            vpc_configuration_id: None,
            vpc_id: None,
            ..self.clone()
        }
    }
}

impl Identified for CloudWatchLoggingOption {
    fn identity(&self) -> Option<&str> {
        self.cloudwatch_logging_option_id.as_deref()
    }

    fn without_identity(&self) -> Self {
        Self {
            cloudwatch_logging_option_id: None,
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_content_ignores_identity() {
        let observed = Output {
            output_id: Some("2.1".to_string()),
            name: "OUT".to_string(),
            kinesis_streams_output: Some(ResourceArn::new("arn:stream")),
            ..Default::default()
        };
        let desired = Output {
            output_id: None,
            ..observed.clone()
        };

        assert!(observed.same_content(&desired));
        assert_ne!(observed, desired);
    }

    #[test]
    fn test_default_tuning_normalizes_computed_values() {
        let observed = FlinkApplicationConfiguration {
            checkpoint_configuration: Some(CheckpointConfiguration {
                configuration_type: ConfigurationType::Default,
                checkpointing_enabled: Some(true),
                checkpoint_interval: Some(60_000),
                min_pause_between_checkpoints: Some(5_000),
            }),
            ..Default::default()
        };
        let desired = FlinkApplicationConfiguration {
            checkpoint_configuration: Some(CheckpointConfiguration::default()),
            ..Default::default()
        };

        assert_eq!(observed.normalized(), desired.normalized());
    }

    #[test]
    fn test_tree_yaml_defaults() {
        let yaml = r"
service_execution_role: arn:aws:iam::123456789012:role/app
application_configuration:
  sql_application_configuration:
    outputs:
      - name: OUT
        kinesis_streams_output:
          resource_arn: arn:stream
";
        let tree: ApplicationTree = serde_yaml::from_str(yaml).expect("tree should parse");

        assert!(!tree.start_application);
        assert_eq!(tree.outputs().len(), 1);
        assert_eq!(
            tree.outputs()[0].destination_schema.record_format_type,
            RecordFormatType::Json
        );
        assert!(tree.input().is_none());
    }
}
