//! Tree to create-payload mapping.
//!
//! Create payloads never carry server-assigned identities. Empty structured
//! objects map to absent members.

use crate::config::{self as tree, ApplicationSpec, ApplicationTree};
use crate::error::ContractViolation;
use crate::mapper::ensure_oneof;
use crate::remote::types as wire;

type MapResult<T> = Result<T, ContractViolation>;

/// Builds the `CreateApplication` request for a whole application.
///
/// # Errors
///
/// Returns a contract violation if any oneof group has more than one member.
pub fn create_request(spec: &ApplicationSpec) -> MapResult<wire::CreateApplicationRequest> {
    let application_configuration = spec
        .tree
        .application_configuration
        .as_ref()
        .map(application_configuration)
        .transpose()?
        .flatten();

    Ok(wire::CreateApplicationRequest {
        application_name: spec.name.clone(),
        application_description: spec.description.clone(),
        runtime_environment: spec.runtime_environment.clone(),
        service_execution_role: spec.tree.service_execution_role.clone(),
        application_configuration,
        cloudwatch_logging_options: spec
            .tree
            .cloudwatch_logging_options
            .iter()
            .map(logging_option)
            .collect(),
    })
}

/// Maps the nested configuration; `None` when nothing in it is set.
///
/// # Errors
///
/// Returns a contract violation if any oneof group has more than one member.
pub fn application_configuration(
    config: &tree::ApplicationConfiguration,
) -> MapResult<Option<wire::ApplicationConfiguration>> {
    let sql = config
        .sql_application_configuration
        .as_ref()
        .map(sql_configuration)
        .transpose()?
        .flatten();

    let mapped = wire::ApplicationConfiguration {
        sql_application_configuration: sql,
        flink_application_configuration: config
            .flink_application_configuration
            .as_ref()
            .and_then(tuning),
        environment_properties: config
            .environment_properties
            .as_ref()
            .and_then(environment_properties),
        application_code_configuration: config
            .application_code_configuration
            .as_ref()
            .map(code_configuration)
            .transpose()?,
        application_snapshot_configuration: config
            .application_snapshot_configuration
            .as_ref()
            .map(snapshot_configuration),
        vpc_configurations: config.vpc_configuration.iter().map(vpc_configuration).collect(),
    };

    if mapped == wire::ApplicationConfiguration::default() {
        return Ok(None);
    }
    Ok(Some(mapped))
}

fn sql_configuration(
    sql: &tree::SqlApplicationConfiguration,
) -> MapResult<Option<wire::SqlApplicationConfiguration>> {
    let mapped = wire::SqlApplicationConfiguration {
        inputs: sql.input.iter().map(input).collect::<MapResult<_>>()?,
        outputs: sql.outputs.iter().map(output).collect::<MapResult<_>>()?,
        reference_data_sources: sql
            .reference_data_source
            .iter()
            .map(reference_data_source)
            .collect::<MapResult<_>>()?,
    };

    if mapped == wire::SqlApplicationConfiguration::default() {
        return Ok(None);
    }
    Ok(Some(mapped))
}

// ============================================================================
// Code, snapshots, properties, tuning
// ============================================================================

/// Maps the code configuration.
///
/// # Errors
///
/// Returns a contract violation when both inline text and a storage location are set.
pub fn code_configuration(
    code: &tree::ApplicationCodeConfiguration,
) -> MapResult<wire::ApplicationCodeConfiguration> {
    Ok(wire::ApplicationCodeConfiguration {
        code_content: code.code_content.as_ref().map(code_content).transpose()?.flatten(),
        code_content_type: code.code_content_type,
    })
}

fn code_content(content: &tree::CodeContent) -> MapResult<Option<wire::CodeContent>> {
    ensure_oneof(
        "application_code_configuration.code_content",
        &[
            ("s3_content_location", content.s3_content_location.is_some()),
            ("text_content", content.text_content.is_some()),
        ],
    )?;

    if let Some(location) = &content.s3_content_location {
        return Ok(Some(wire::CodeContent {
            s3_content_location: Some(s3_content_location(location)),
            text_content: None,
        }));
    }
    Ok(content.text_content.as_ref().map(|text| wire::CodeContent {
        text_content: Some(text.clone()),
        s3_content_location: None,
    }))
}

fn s3_content_location(location: &tree::S3ContentLocation) -> wire::S3ContentLocation {
    wire::S3ContentLocation {
        bucket_arn: location.bucket_arn.clone(),
        file_key: location.file_key.clone(),
        object_version: location.object_version.clone(),
    }
}

/// Maps the snapshot toggle.
#[must_use]
pub const fn snapshot_configuration(
    snapshot: &tree::ApplicationSnapshotConfiguration,
) -> wire::ApplicationSnapshotConfiguration {
    wire::ApplicationSnapshotConfiguration {
        snapshots_enabled: snapshot.snapshots_enabled,
    }
}

/// Maps property groups; `None` when there are none.
#[must_use]
pub fn environment_properties(
    properties: &tree::EnvironmentProperties,
) -> Option<wire::EnvironmentProperties> {
    if properties.property_groups.is_empty() {
        return None;
    }
    Some(wire::EnvironmentProperties {
        property_groups: property_groups(&properties.property_groups),
    })
}

/// Maps a list of property groups.
#[must_use]
pub fn property_groups(groups: &[tree::PropertyGroup]) -> Vec<wire::PropertyGroup> {
    groups
        .iter()
        .map(|group| wire::PropertyGroup {
            property_group_id: group.property_group_id.clone(),
            property_map: group.property_map.clone(),
        })
        .collect()
}

/// Maps runtime tuning. Custom values are only sent under the custom configuration type.
#[must_use]
pub fn tuning(
    tuning: &tree::FlinkApplicationConfiguration,
) -> Option<wire::FlinkApplicationConfiguration> {
    let mapped = wire::FlinkApplicationConfiguration {
        checkpoint_configuration: tuning.checkpoint_configuration.as_ref().map(|c| {
            let custom = c.configuration_type.is_custom();
            wire::CheckpointConfiguration {
                configuration_type: c.configuration_type,
                checkpointing_enabled: c.checkpointing_enabled.filter(|_| custom),
                checkpoint_interval: c.checkpoint_interval.filter(|_| custom),
                min_pause_between_checkpoints: c.min_pause_between_checkpoints.filter(|_| custom),
            }
        }),
        monitoring_configuration: tuning.monitoring_configuration.as_ref().map(|c| {
            let custom = c.configuration_type.is_custom();
            wire::MonitoringConfiguration {
                configuration_type: c.configuration_type,
                log_level: c.log_level.filter(|_| custom),
                metrics_level: c.metrics_level.filter(|_| custom),
            }
        }),
        parallelism_configuration: tuning.parallelism_configuration.as_ref().map(|c| {
            let custom = c.configuration_type.is_custom();
            wire::ParallelismConfiguration {
                configuration_type: c.configuration_type,
                auto_scaling_enabled: c.auto_scaling_enabled.filter(|_| custom),
                parallelism: c.parallelism.filter(|_| custom),
                parallelism_per_kpu: c.parallelism_per_kpu.filter(|_| custom),
                current_parallelism: None,
            }
        }),
    };

    if mapped == wire::FlinkApplicationConfiguration::default() {
        return None;
    }
    Some(mapped)
}

// ============================================================================
// Streaming input, outputs, reference data
// ============================================================================

/// Maps the primary input. Any identity on the tree is ignored.
///
/// # Errors
///
/// Returns a contract violation when both stream sources are set or the
/// schema mapping has both delimiter and path parameters.
pub fn input(input: &tree::Input) -> MapResult<wire::Input> {
    ensure_oneof(
        "sql_application_configuration.input",
        &[
            ("kinesis_firehose_input", input.kinesis_firehose_input.is_some()),
            ("kinesis_streams_input", input.kinesis_streams_input.is_some()),
        ],
    )?;

    Ok(wire::Input {
        name_prefix: input.name_prefix.clone(),
        input_processing_configuration: input
            .input_processing_configuration
            .as_ref()
            .map(input_processing_configuration),
        kinesis_streams_input: input.kinesis_streams_input.as_ref().map(resource_ref),
        kinesis_firehose_input: input.kinesis_firehose_input.as_ref().map(resource_ref),
        input_parallelism: input.input_parallelism.as_ref().map(|p| wire::InputParallelism {
            count: Some(p.count),
        }),
        input_schema: input
            .input_schema
            .as_ref()
            .map(|s| source_schema(s, "sql_application_configuration.input.input_schema"))
            .transpose()?,
    })
}

/// Maps input pre-processing.
#[must_use]
pub fn input_processing_configuration(
    processing: &tree::InputProcessingConfiguration,
) -> wire::InputProcessingConfiguration {
    wire::InputProcessingConfiguration {
        input_lambda_processor: resource_ref(&processing.input_lambda_processor),
    }
}

/// Maps an output sink. Any identity on the tree is ignored.
///
/// # Errors
///
/// Returns a contract violation when more than one sink is set.
pub fn output(output: &tree::Output) -> MapResult<wire::Output> {
    ensure_oneof(
        "sql_application_configuration.outputs",
        &[
            ("kinesis_firehose_output", output.kinesis_firehose_output.is_some()),
            ("kinesis_streams_output", output.kinesis_streams_output.is_some()),
            ("lambda_output", output.lambda_output.is_some()),
        ],
    )?;

    Ok(wire::Output {
        name: output.name.clone(),
        kinesis_streams_output: output.kinesis_streams_output.as_ref().map(resource_ref),
        kinesis_firehose_output: output.kinesis_firehose_output.as_ref().map(resource_ref),
        lambda_output: output.lambda_output.as_ref().map(resource_ref),
        destination_schema: wire::DestinationSchema {
            record_format_type: output.destination_schema.record_format_type,
        },
    })
}

/// Maps the reference data source. Any identity on the tree is ignored.
///
/// # Errors
///
/// Returns a contract violation when the schema mapping has both members set.
pub fn reference_data_source(
    source: &tree::ReferenceDataSource,
) -> MapResult<wire::ReferenceDataSource> {
    Ok(wire::ReferenceDataSource {
        table_name: source.table_name.clone(),
        s3_reference_data_source: wire::S3ReferenceDataSource {
            bucket_arn: source.s3_reference_data_source.bucket_arn.clone(),
            file_key: source.s3_reference_data_source.file_key.clone(),
        },
        reference_schema: source_schema(
            &source.reference_schema,
            "sql_application_configuration.reference_data_source.reference_schema",
        )?,
    })
}

/// Maps a record schema.
///
/// # Errors
///
/// Returns a contract violation when the mapping has both members set.
pub fn source_schema(schema: &tree::SourceSchema, area: &str) -> MapResult<wire::SourceSchema> {
    Ok(wire::SourceSchema {
        record_columns: record_columns(&schema.record_columns),
        record_encoding: schema.record_encoding.clone(),
        record_format: record_format(&schema.record_format, area)?,
    })
}

/// Maps schema columns.
#[must_use]
pub fn record_columns(columns: &[tree::RecordColumn]) -> Vec<wire::RecordColumn> {
    columns
        .iter()
        .map(|column| wire::RecordColumn {
            name: column.name.clone(),
            sql_type: column.sql_type.clone(),
            mapping: column.mapping.clone(),
        })
        .collect()
}

/// Maps a record format; only the present mapping member is populated.
///
/// # Errors
///
/// Returns a contract violation when both delimiter and path parameters are set.
pub fn record_format(format: &tree::RecordFormat, area: &str) -> MapResult<wire::RecordFormat> {
    let mapping_parameters = match &format.mapping_parameters {
        None => None,
        Some(params) => {
            ensure_oneof(
                &format!("{area}.record_format.mapping_parameters"),
                &[
                    ("csv_mapping_parameters", params.csv_mapping_parameters.is_some()),
                    ("json_mapping_parameters", params.json_mapping_parameters.is_some()),
                ],
            )?;
            let mapped = wire::MappingParameters {
                csv_mapping_parameters: params.csv_mapping_parameters.as_ref().map(|csv| {
                    wire::CsvMappingParameters {
                        record_row_delimiter: csv.record_row_delimiter.clone(),
                        record_column_delimiter: csv.record_column_delimiter.clone(),
                    }
                }),
                json_mapping_parameters: params.json_mapping_parameters.as_ref().map(|json| {
                    wire::JsonMappingParameters {
                        record_row_path: json.record_row_path.clone(),
                    }
                }),
            };
            (mapped != wire::MappingParameters::default()).then_some(mapped)
        }
    };

    Ok(wire::RecordFormat {
        record_format_type: format.record_format_type,
        mapping_parameters,
    })
}

// ============================================================================
// Network, logging, start payload
// ============================================================================

/// Maps a network attachment. Any identity on the tree is ignored.
#[must_use]
pub fn vpc_configuration(vpc: &tree::VpcConfiguration) -> wire::VpcConfiguration {
    wire::VpcConfiguration {
        subnet_ids: vpc.subnet_ids.iter().cloned().collect(),
        security_group_ids: vpc.security_group_ids.iter().cloned().collect(),
    }
}

/// Maps a log stream attachment. Any identity on the tree is ignored.
#[must_use]
pub fn logging_option(option: &tree::CloudWatchLoggingOption) -> wire::CloudWatchLoggingOption {
    wire::CloudWatchLoggingOption {
        log_stream_arn: option.log_stream_arn.clone(),
    }
}

/// Maps a snapshot restore selection.
#[must_use]
pub fn restore_configuration(
    restore: &tree::ApplicationRestoreConfiguration,
) -> wire::ApplicationRestoreConfiguration {
    wire::ApplicationRestoreConfiguration {
        application_restore_type: restore.application_restore_type,
        snapshot_name: restore.snapshot_name.clone(),
    }
}

/// Maps runtime restart flags.
#[must_use]
pub const fn flink_run_configuration(
    run: &tree::FlinkRunConfiguration,
) -> wire::FlinkRunConfiguration {
    wire::FlinkRunConfiguration {
        allow_non_restored_state: Some(run.allow_non_restored_state),
    }
}

/// Builds the run configuration sent with a start.
///
/// The input starting position is only carried when `input_id` is known.
#[must_use]
pub fn start_run_configuration(
    tree: &ApplicationTree,
    input_id: Option<&str>,
) -> Option<wire::StartRunConfiguration> {
    let run = tree.run_configuration();
    let sql_run_configurations = match (
        input_id,
        tree.input()
            .and_then(|i| i.input_starting_position_configuration.as_ref()),
    ) {
        (Some(id), Some(position)) => vec![wire::SqlRunConfiguration {
            input_id: id.to_string(),
            input_starting_position_configuration: wire::InputStartingPositionConfiguration {
                input_starting_position: position.input_starting_position,
            },
        }],
        _ => Vec::new(),
    };

    let mapped = wire::StartRunConfiguration {
        flink_run_configuration: run
            .and_then(|r| r.flink_run_configuration.as_ref())
            .map(flink_run_configuration),
        sql_run_configurations,
        application_restore_configuration: run
            .and_then(|r| r.application_restore_configuration.as_ref())
            .map(restore_configuration),
    };

    if mapped == wire::StartRunConfiguration::default() {
        return None;
    }
    Some(mapped)
}

fn resource_ref(arn: &tree::ResourceArn) -> wire::ResourceRef {
    wire::ResourceRef {
        resource_arn: arn.resource_arn.clone(),
    }
}
