//! Remote descriptions to configuration tree.
//!
//! Every member the description carries is populated, including zero values,
//! so that a flattened tree can be compared against a desired tree.

use crate::config::{self as tree, ApplicationTree};
use crate::remote::types as wire;

/// Flattens a full application description.
///
/// `start_application` and `force_stop` are caller intent and are left at
/// their defaults; merge them from the previous snapshot.
#[must_use]
pub fn application_tree(detail: &wire::ApplicationDetail) -> ApplicationTree {
    ApplicationTree {
        service_execution_role: detail.service_execution_role.clone().unwrap_or_default(),
        application_configuration: detail
            .application_configuration_description
            .as_ref()
            .and_then(application_configuration),
        cloudwatch_logging_options: detail
            .cloud_watch_logging_option_descriptions
            .first()
            .map(logging_option),
        start_application: false,
        force_stop: false,
    }
}

/// Flattens the nested configuration; `None` when the description is empty.
#[must_use]
pub fn application_configuration(
    description: &wire::ApplicationConfigurationDescription,
) -> Option<tree::ApplicationConfiguration> {
    let flattened = tree::ApplicationConfiguration {
        application_code_configuration: description
            .application_code_configuration_description
            .as_ref()
            .map(code_configuration),
        application_snapshot_configuration: description
            .application_snapshot_configuration_description
            .as_ref()
            .map(|s| tree::ApplicationSnapshotConfiguration {
                snapshots_enabled: s.snapshots_enabled,
            }),
        environment_properties: description
            .environment_property_descriptions
            .as_ref()
            .and_then(environment_properties),
        flink_application_configuration: description
            .flink_application_configuration_description
            .as_ref()
            .and_then(tuning),
        run_configuration: description
            .run_configuration_description
            .as_ref()
            .and_then(run_configuration),
        sql_application_configuration: description
            .sql_application_configuration_description
            .as_ref()
            .and_then(sql_configuration),
        vpc_configuration: description.vpc_configuration_descriptions.first().map(vpc_configuration),
    };

    if flattened == tree::ApplicationConfiguration::default() {
        return None;
    }
    Some(flattened)
}

fn code_configuration(
    description: &wire::ApplicationCodeConfigurationDescription,
) -> tree::ApplicationCodeConfiguration {
    tree::ApplicationCodeConfiguration {
        code_content: description.code_content_description.as_ref().and_then(|content| {
            let flattened = tree::CodeContent {
                s3_content_location: content.s3_application_code_location_description.as_ref().map(
                    |loc| tree::S3ContentLocation {
                        bucket_arn: loc.bucket_arn.clone(),
                        file_key: loc.file_key.clone(),
                        object_version: loc.object_version.clone(),
                    },
                ),
                text_content: content.text_content.clone(),
            };
            (flattened != tree::CodeContent::default()).then_some(flattened)
        }),
        code_content_type: description.code_content_type,
    }
}

fn environment_properties(
    description: &wire::EnvironmentPropertyDescriptions,
) -> Option<tree::EnvironmentProperties> {
    if description.property_group_descriptions.is_empty() {
        return None;
    }
    Some(tree::EnvironmentProperties {
        property_groups: description
            .property_group_descriptions
            .iter()
            .map(|group| tree::PropertyGroup {
                property_group_id: group.property_group_id.clone(),
                property_map: group.property_map.clone(),
            })
            .collect(),
    })
}

fn tuning(
    description: &wire::FlinkApplicationConfigurationDescription,
) -> Option<tree::FlinkApplicationConfiguration> {
    let flattened = tree::FlinkApplicationConfiguration {
        checkpoint_configuration: description.checkpoint_configuration_description.as_ref().map(
            |c| tree::CheckpointConfiguration {
                configuration_type: c.configuration_type,
                checkpointing_enabled: c.checkpointing_enabled,
                checkpoint_interval: c.checkpoint_interval,
                min_pause_between_checkpoints: c.min_pause_between_checkpoints,
            },
        ),
        monitoring_configuration: description.monitoring_configuration_description.as_ref().map(
            |c| tree::MonitoringConfiguration {
                configuration_type: c.configuration_type,
                log_level: c.log_level,
                metrics_level: c.metrics_level,
            },
        ),
        parallelism_configuration: description
            .parallelism_configuration_description
            .as_ref()
            .map(|c| tree::ParallelismConfiguration {
                configuration_type: c.configuration_type,
                auto_scaling_enabled: c.auto_scaling_enabled,
                parallelism: c.parallelism,
                parallelism_per_kpu: c.parallelism_per_kpu,
            }),
    };

    if flattened == tree::FlinkApplicationConfiguration::default() {
        return None;
    }
    Some(flattened)
}

fn run_configuration(
    description: &wire::RunConfigurationDescription,
) -> Option<tree::RunConfiguration> {
    let flattened = tree::RunConfiguration {
        application_restore_configuration: description
            .application_restore_configuration_description
            .as_ref()
            .map(|r| tree::ApplicationRestoreConfiguration {
                application_restore_type: r.application_restore_type,
                snapshot_name: r.snapshot_name.clone(),
            }),
        flink_run_configuration: description.flink_run_configuration_description.as_ref().map(
            |f| tree::FlinkRunConfiguration {
                allow_non_restored_state: f.allow_non_restored_state.unwrap_or_default(),
            },
        ),
    };

    if flattened == tree::RunConfiguration::default() {
        return None;
    }
    Some(flattened)
}

fn sql_configuration(
    description: &wire::SqlApplicationConfigurationDescription,
) -> Option<tree::SqlApplicationConfiguration> {
    let flattened = tree::SqlApplicationConfiguration {
        input: description.input_descriptions.first().map(input),
        outputs: description.output_descriptions.iter().map(output).collect(),
        reference_data_source: description
            .reference_data_source_descriptions
            .first()
            .map(reference_data_source),
    };

    if flattened == tree::SqlApplicationConfiguration::default() {
        return None;
    }
    Some(flattened)
}

// ============================================================================
// Identity-bearing sub-objects
// ============================================================================

/// Flattens an input description, identity included.
#[must_use]
pub fn input(description: &wire::InputDescription) -> tree::Input {
    tree::Input {
        input_id: description.input_id.clone(),
        in_app_stream_names: description.in_app_stream_names.clone(),
        name_prefix: description.name_prefix.clone().unwrap_or_default(),
        input_parallelism: description
            .input_parallelism
            .as_ref()
            .map(|p| tree::InputParallelism {
                count: p.count.unwrap_or_default(),
            }),
        input_processing_configuration: description
            .input_processing_configuration_description
            .as_ref()
            .and_then(|p| p.input_lambda_processor_description.as_ref())
            .map(|lambda| tree::InputProcessingConfiguration {
                input_lambda_processor: resource_arn(lambda),
            }),
        input_schema: description.input_schema.as_ref().map(source_schema),
        input_starting_position_configuration: description
            .input_starting_position_configuration
            .as_ref()
            .map(|p| tree::InputStartingPositionConfiguration {
                input_starting_position: p.input_starting_position,
            }),
        kinesis_firehose_input: description
            .kinesis_firehose_input_description
            .as_ref()
            .map(resource_arn),
        kinesis_streams_input: description
            .kinesis_streams_input_description
            .as_ref()
            .map(resource_arn),
    }
}

/// Flattens an output description, identity included.
#[must_use]
pub fn output(description: &wire::OutputDescription) -> tree::Output {
    tree::Output {
        output_id: description.output_id.clone(),
        name: description.name.clone().unwrap_or_default(),
        destination_schema: tree::DestinationSchema {
            record_format_type: description
                .destination_schema
                .as_ref()
                .map(|d| d.record_format_type)
                .unwrap_or_default(),
        },
        kinesis_firehose_output: description
            .kinesis_firehose_output_description
            .as_ref()
            .map(resource_arn),
        kinesis_streams_output: description
            .kinesis_streams_output_description
            .as_ref()
            .map(resource_arn),
        lambda_output: description.lambda_output_description.as_ref().map(resource_arn),
    }
}

/// Flattens a reference data source description, identity included.
#[must_use]
pub fn reference_data_source(
    description: &wire::ReferenceDataSourceDescription,
) -> tree::ReferenceDataSource {
    tree::ReferenceDataSource {
        reference_id: description.reference_id.clone(),
        table_name: description.table_name.clone().unwrap_or_default(),
        reference_schema: description
            .reference_schema
            .as_ref()
            .map(source_schema)
            .unwrap_or_default(),
        s3_reference_data_source: description
            .s3_reference_data_source_description
            .as_ref()
            .map(|s| tree::S3ReferenceDataSource {
                bucket_arn: s.bucket_arn.clone(),
                file_key: s.file_key.clone(),
            })
            .unwrap_or_default(),
    }
}

/// Flattens a network attachment description, identity included.
#[must_use]
pub fn vpc_configuration(description: &wire::VpcConfigurationDescription) -> tree::VpcConfiguration {
    tree::VpcConfiguration {
        vpc_configuration_id: description.vpc_configuration_id.clone(),
        vpc_id: description.vpc_id.clone(),
        security_group_ids: description.security_group_ids.iter().cloned().collect(),
        subnet_ids: description.subnet_ids.iter().cloned().collect(),
    }
}

/// Flattens a log stream attachment description, identity included.
#[must_use]
pub fn logging_option(
    description: &wire::CloudWatchLoggingOptionDescription,
) -> tree::CloudWatchLoggingOption {
    tree::CloudWatchLoggingOption {
        cloudwatch_logging_option_id: description.cloudwatch_logging_option_id.clone(),
        log_stream_arn: description.log_stream_arn.clone(),
    }
}

fn source_schema(schema: &wire::SourceSchema) -> tree::SourceSchema {
    tree::SourceSchema {
        record_columns: schema
            .record_columns
            .iter()
            .map(|column| tree::RecordColumn {
                name: column.name.clone(),
                sql_type: column.sql_type.clone(),
                mapping: column.mapping.clone(),
            })
            .collect(),
        record_encoding: schema.record_encoding.clone(),
        record_format: tree::RecordFormat {
            record_format_type: schema.record_format.record_format_type,
            mapping_parameters: schema.record_format.mapping_parameters.as_ref().map(|params| {
                tree::MappingParameters {
                    csv_mapping_parameters: params.csv_mapping_parameters.as_ref().map(|csv| {
                        tree::CsvMappingParameters {
                            record_column_delimiter: csv.record_column_delimiter.clone(),
                            record_row_delimiter: csv.record_row_delimiter.clone(),
                        }
                    }),
                    json_mapping_parameters: params.json_mapping_parameters.as_ref().map(|json| {
                        tree::JsonMappingParameters {
                            record_row_path: json.record_row_path.clone(),
                        }
                    }),
                }
            }),
        },
    }
}

fn resource_arn(reference: &wire::ResourceRef) -> tree::ResourceArn {
    tree::ResourceArn::new(reference.resource_arn.clone())
}
