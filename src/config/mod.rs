//! Configuration module for the reconciliation engine.
//!
//! This module handles all configuration-related functionality:
//! - The application configuration tree shared by mapper, planner and snapshots
//! - Parsing and deserializing `kda.deploy.yaml`
//! - Validation of naming and structural rules
//! - Computing tree hashes for change detection

mod hash;
mod parser;
mod spec;
mod tree;
mod validator;

pub use hash::ConfigHasher;
pub use parser::{ConfigParser, DEFAULT_CONFIG_FILES, find_config_file};
pub use spec::{ApplicationSpec, DeployManifest, RemoteConfig, StateConfig, TimeoutConfig};
pub use tree::{
    ApplicationCodeConfiguration, ApplicationConfiguration, ApplicationRestoreConfiguration,
    ApplicationRestoreType, ApplicationSnapshotConfiguration, ApplicationTree,
    CheckpointConfiguration, CloudWatchLoggingOption, CodeContent, CodeContentType,
    ConfigurationType, CsvMappingParameters, DestinationSchema, EnvironmentProperties,
    FlinkApplicationConfiguration, FlinkRunConfiguration, Identified, Input, InputParallelism,
    InputProcessingConfiguration, InputStartingPosition, InputStartingPositionConfiguration,
    JsonMappingParameters, LogLevel, MappingParameters, MetricsLevel, MonitoringConfiguration,
    Output, ParallelismConfiguration, PropertyGroup, RecordColumn, RecordFormat,
    RecordFormatType, ReferenceDataSource, ResourceArn, RunConfiguration, S3ContentLocation,
    S3ReferenceDataSource, SourceSchema, SqlApplicationConfiguration, VpcConfiguration,
};
pub use validator::{
    ConfigValidator, MAX_OUTPUTS, ValidationError, ValidationResult, contract_violations,
};
