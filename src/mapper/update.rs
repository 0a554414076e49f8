//! Observed/desired pairs to update deltas.
//!
//! A delta carries only members whose value differs. Identity-bearing
//! deltas take their identity from the observed copy.

use crate::config::{self as tree, Identified};
use crate::error::ContractViolation;
use crate::mapper::{expand, require_identity};
use crate::remote::types as wire;

type MapResult<T> = Result<T, ContractViolation>;

/// Returns the new value when it differs from the old one.
fn changed<T: PartialEq + Clone>(old: Option<&T>, new: Option<&T>) -> Option<T> {
    if old == new { None } else { new.cloned() }
}

// ============================================================================
// Code, snapshots, properties, tuning
// ============================================================================

/// Code configuration delta; `None` when nothing changed.
///
/// # Errors
///
/// Returns a contract violation when the desired code content sets both members.
pub fn code_configuration(
    old: Option<&tree::ApplicationCodeConfiguration>,
    new: &tree::ApplicationCodeConfiguration,
) -> MapResult<Option<wire::ApplicationCodeConfigurationUpdate>> {
    // Validates the oneof before any comparison.
    expand::code_configuration(new)?;

    let old_content = old.and_then(|o| o.code_content.as_ref());
    let new_content = new.code_content.as_ref();

    let code_content_update = new_content.and_then(|content| {
        let text_content_update = changed(
            old_content.and_then(|c| c.text_content.as_ref()),
            content.text_content.as_ref(),
        );
        let s3_content_location_update = content.s3_content_location.as_ref().and_then(|loc| {
            let previous = old_content.and_then(|c| c.s3_content_location.as_ref());
            let update = wire::S3ContentLocationUpdate {
                bucket_arn_update: changed(previous.map(|p| &p.bucket_arn), Some(&loc.bucket_arn)),
                file_key_update: changed(previous.map(|p| &p.file_key), Some(&loc.file_key)),
                object_version_update: changed(
                    previous.and_then(|p| p.object_version.as_ref()),
                    loc.object_version.as_ref(),
                ),
            };
            (update != wire::S3ContentLocationUpdate::default()).then_some(update)
        });
        let update = wire::CodeContentUpdate {
            text_content_update,
            s3_content_location_update,
        };
        (update != wire::CodeContentUpdate::default()).then_some(update)
    });

    let update = wire::ApplicationCodeConfigurationUpdate {
        code_content_type_update: changed(
            old.map(|o| &o.code_content_type),
            Some(&new.code_content_type),
        ),
        code_content_update,
    };

    if update == wire::ApplicationCodeConfigurationUpdate::default() {
        return Ok(None);
    }
    Ok(Some(update))
}

/// Snapshot toggle delta.
#[must_use]
pub const fn snapshot_configuration(
    new: &tree::ApplicationSnapshotConfiguration,
) -> wire::ApplicationSnapshotConfigurationUpdate {
    wire::ApplicationSnapshotConfigurationUpdate {
        snapshots_enabled_update: new.snapshots_enabled,
    }
}

/// Replacement property groups. Absent desired groups clear the remote groups.
#[must_use]
pub fn environment_properties(
    new: Option<&tree::EnvironmentProperties>,
) -> wire::EnvironmentProperties {
    wire::EnvironmentProperties {
        property_groups: new.map_or_else(Vec::new, |p| expand::property_groups(&p.property_groups)),
    }
}

/// Tuning delta; `None` when nothing changed.
///
/// A block removed from the desired side is reset to the default configuration type.
#[must_use]
pub fn tuning(
    old: Option<&tree::FlinkApplicationConfiguration>,
    new: Option<&tree::FlinkApplicationConfiguration>,
) -> Option<wire::FlinkApplicationConfigurationUpdate> {
    let update = wire::FlinkApplicationConfigurationUpdate {
        checkpoint_configuration_update: checkpoint(
            old.and_then(|o| o.checkpoint_configuration.as_ref()),
            new.and_then(|n| n.checkpoint_configuration.as_ref()),
        ),
        monitoring_configuration_update: monitoring(
            old.and_then(|o| o.monitoring_configuration.as_ref()),
            new.and_then(|n| n.monitoring_configuration.as_ref()),
        ),
        parallelism_configuration_update: parallelism(
            old.and_then(|o| o.parallelism_configuration.as_ref()),
            new.and_then(|n| n.parallelism_configuration.as_ref()),
        ),
    };

    if update == wire::FlinkApplicationConfigurationUpdate::default() {
        return None;
    }
    Some(update)
}

fn configuration_type_update(
    old: Option<tree::ConfigurationType>,
    new: Option<tree::ConfigurationType>,
) -> Option<tree::ConfigurationType> {
    match (old, new) {
        (Some(old), None) if old.is_custom() => Some(tree::ConfigurationType::Default),
        (Some(_), None) => None,
        (old, new) => changed(old.as_ref(), new.as_ref()),
    }
}

fn checkpoint(
    old: Option<&tree::CheckpointConfiguration>,
    new: Option<&tree::CheckpointConfiguration>,
) -> Option<wire::CheckpointConfigurationUpdate> {
    let mut update = wire::CheckpointConfigurationUpdate {
        configuration_type_update: configuration_type_update(
            old.map(|o| o.configuration_type),
            new.map(|n| n.configuration_type),
        ),
        ..Default::default()
    };
    if let Some(new) = new.filter(|n| n.configuration_type.is_custom()) {
        let old = old.filter(|o| o.configuration_type.is_custom());
        update.checkpointing_enabled_update = changed(
            old.and_then(|o| o.checkpointing_enabled.as_ref()),
            new.checkpointing_enabled.as_ref(),
        );
        update.checkpoint_interval_update = changed(
            old.and_then(|o| o.checkpoint_interval.as_ref()),
            new.checkpoint_interval.as_ref(),
        );
        update.min_pause_between_checkpoints_update = changed(
            old.and_then(|o| o.min_pause_between_checkpoints.as_ref()),
            new.min_pause_between_checkpoints.as_ref(),
        );
    }
    (update != wire::CheckpointConfigurationUpdate::default()).then_some(update)
}

fn monitoring(
    old: Option<&tree::MonitoringConfiguration>,
    new: Option<&tree::MonitoringConfiguration>,
) -> Option<wire::MonitoringConfigurationUpdate> {
    let mut update = wire::MonitoringConfigurationUpdate {
        configuration_type_update: configuration_type_update(
            old.map(|o| o.configuration_type),
            new.map(|n| n.configuration_type),
        ),
        ..Default::default()
    };
    if let Some(new) = new.filter(|n| n.configuration_type.is_custom()) {
        let old = old.filter(|o| o.configuration_type.is_custom());
        update.log_level_update = changed(old.and_then(|o| o.log_level.as_ref()), new.log_level.as_ref());
        update.metrics_level_update = changed(
            old.and_then(|o| o.metrics_level.as_ref()),
            new.metrics_level.as_ref(),
        );
    }
    (update != wire::MonitoringConfigurationUpdate::default()).then_some(update)
}

fn parallelism(
    old: Option<&tree::ParallelismConfiguration>,
    new: Option<&tree::ParallelismConfiguration>,
) -> Option<wire::ParallelismConfigurationUpdate> {
    let mut update = wire::ParallelismConfigurationUpdate {
        configuration_type_update: configuration_type_update(
            old.map(|o| o.configuration_type),
            new.map(|n| n.configuration_type),
        ),
        ..Default::default()
    };
    if let Some(new) = new.filter(|n| n.configuration_type.is_custom()) {
        let old = old.filter(|o| o.configuration_type.is_custom());
        update.auto_scaling_enabled_update = changed(
            old.and_then(|o| o.auto_scaling_enabled.as_ref()),
            new.auto_scaling_enabled.as_ref(),
        );
        update.parallelism_update =
            changed(old.and_then(|o| o.parallelism.as_ref()), new.parallelism.as_ref());
        update.parallelism_per_kpu_update = changed(
            old.and_then(|o| o.parallelism_per_kpu.as_ref()),
            new.parallelism_per_kpu.as_ref(),
        );
    }
    (update != wire::ParallelismConfigurationUpdate::default()).then_some(update)
}

// ============================================================================
// Input and reference data
// ============================================================================

/// Input delta addressed by the observed identity; `None` when nothing changed.
///
/// Attaching or detaching pre-processing is not part of this delta; those
/// go through their dedicated calls.
///
/// # Errors
///
/// Returns a contract violation when the observed input has no identity or
/// the desired input breaks a oneof rule.
pub fn input(old: &tree::Input, new: &tree::Input) -> MapResult<Option<wire::InputUpdate>> {
    let desired = expand::input(new)?;
    let input_id = require_identity("sql_application_configuration.input", old.identity())?;

    let input_processing_configuration_update = match (
        &old.input_processing_configuration,
        &new.input_processing_configuration,
    ) {
        (Some(before), Some(after)) if before != after => {
            Some(wire::InputProcessingConfigurationUpdate {
                input_lambda_processor_update: wire::ResourceRefUpdate {
                    resource_arn_update: after.input_lambda_processor.resource_arn.clone(),
                },
            })
        }
        _ => None,
    };

    let input_schema_update = match (&old.input_schema, &desired.input_schema) {
        (_, None) => None,
        (before, Some(after)) => {
            let previous = before
                .as_ref()
                .map(|s| expand::source_schema(s, "sql_application_configuration.input"))
                .transpose()?;
            schema_update(previous.as_ref(), after)
        }
    };

    let update = wire::InputUpdate {
        input_id: input_id.to_string(),
        name_prefix_update: changed(Some(&old.name_prefix), Some(&new.name_prefix)),
        input_processing_configuration_update,
        kinesis_streams_input_update: arn_update(
            old.kinesis_streams_input.as_ref(),
            new.kinesis_streams_input.as_ref(),
        ),
        kinesis_firehose_input_update: arn_update(
            old.kinesis_firehose_input.as_ref(),
            new.kinesis_firehose_input.as_ref(),
        ),
        input_schema_update,
        input_parallelism_update: changed(
            old.input_parallelism.as_ref().map(|p| &p.count),
            new.input_parallelism.as_ref().map(|p| &p.count),
        )
        .map(|count_update| wire::InputParallelismUpdate { count_update }),
    };

    if update.is_empty() {
        return Ok(None);
    }
    Ok(Some(update))
}

fn arn_update(
    old: Option<&tree::ResourceArn>,
    new: Option<&tree::ResourceArn>,
) -> Option<wire::ResourceRefUpdate> {
    changed(old, new).map(|arn| wire::ResourceRefUpdate {
        resource_arn_update: arn.resource_arn,
    })
}

fn schema_update(
    old: Option<&wire::SourceSchema>,
    new: &wire::SourceSchema,
) -> Option<wire::InputSchemaUpdate> {
    let update = wire::InputSchemaUpdate {
        record_format_update: changed(old.map(|s| &s.record_format), Some(&new.record_format)),
        record_encoding_update: changed(
            old.and_then(|s| s.record_encoding.as_ref()),
            new.record_encoding.as_ref(),
        ),
        record_column_updates: changed(old.map(|s| &s.record_columns), Some(&new.record_columns)),
    };
    (update != wire::InputSchemaUpdate::default()).then_some(update)
}

/// Reference data delta addressed by the observed identity; `None` when nothing changed.
///
/// # Errors
///
/// Returns a contract violation when the observed source has no identity or
/// the desired schema breaks a oneof rule.
pub fn reference_data_source(
    old: &tree::ReferenceDataSource,
    new: &tree::ReferenceDataSource,
) -> MapResult<Option<wire::ReferenceDataSourceUpdate>> {
    let desired = expand::reference_data_source(new)?;
    let reference_id = require_identity(
        "sql_application_configuration.reference_data_source",
        old.identity(),
    )?;

    let s3 = wire::S3ReferenceDataSourceUpdate {
        bucket_arn_update: changed(
            Some(&old.s3_reference_data_source.bucket_arn),
            Some(&new.s3_reference_data_source.bucket_arn),
        ),
        file_key_update: changed(
            Some(&old.s3_reference_data_source.file_key),
            Some(&new.s3_reference_data_source.file_key),
        ),
    };

    let update = wire::ReferenceDataSourceUpdate {
        reference_id: reference_id.to_string(),
        table_name_update: changed(Some(&old.table_name), Some(&new.table_name)),
        s3_reference_data_source_update: (s3 != wire::S3ReferenceDataSourceUpdate::default())
            .then_some(s3),
        reference_schema_update: (old.reference_schema != new.reference_schema)
            .then_some(desired.reference_schema),
    };

    if update.table_name_update.is_none()
        && update.s3_reference_data_source_update.is_none()
        && update.reference_schema_update.is_none()
    {
        return Ok(None);
    }
    Ok(Some(update))
}

// ============================================================================
// Network, logging, run configuration
// ============================================================================

/// Network attachment delta addressed by the observed identity; `None` when nothing changed.
///
/// # Errors
///
/// Returns a contract violation when the observed attachment has no identity.
pub fn vpc_configuration(
    old: &tree::VpcConfiguration,
    new: &tree::VpcConfiguration,
) -> MapResult<Option<wire::VpcConfigurationUpdate>> {
    let vpc_configuration_id = require_identity("vpc_configuration", old.identity())?;

    let subnet_id_updates: Option<Vec<String>> = changed(Some(&old.subnet_ids), Some(&new.subnet_ids))
        .map(|ids| ids.into_iter().collect());
    let security_group_id_updates: Option<Vec<String>> =
        changed(Some(&old.security_group_ids), Some(&new.security_group_ids))
            .map(|ids| ids.into_iter().collect());

    if subnet_id_updates.is_none() && security_group_id_updates.is_none() {
        return Ok(None);
    }
    Ok(Some(wire::VpcConfigurationUpdate {
        vpc_configuration_id: vpc_configuration_id.to_string(),
        subnet_id_updates,
        security_group_id_updates,
    }))
}

/// Log stream attachment delta addressed by the observed identity; `None` when nothing changed.
///
/// # Errors
///
/// Returns a contract violation when the observed attachment has no identity.
pub fn logging_option(
    old: &tree::CloudWatchLoggingOption,
    new: &tree::CloudWatchLoggingOption,
) -> MapResult<Option<wire::CloudWatchLoggingOptionUpdate>> {
    let id = require_identity("cloudwatch_logging_options", old.identity())?;

    Ok(
        changed(Some(&old.log_stream_arn), Some(&new.log_stream_arn)).map(|arn| {
            wire::CloudWatchLoggingOptionUpdate {
                cloudwatch_logging_option_id: id.to_string(),
                log_stream_arn_update: Some(arn),
            }
        }),
    )
}

/// Run configuration delta: the members `new` sets that differ from `old`.
#[must_use]
pub fn run_configuration(
    old: Option<&tree::RunConfiguration>,
    new: &tree::RunConfiguration,
) -> Option<wire::RunConfigurationUpdate> {
    let flink_run_configuration = new
        .flink_run_configuration
        .as_ref()
        .filter(|f| old.and_then(|o| o.flink_run_configuration.as_ref()) != Some(*f))
        .map(expand::flink_run_configuration);
    let application_restore_configuration = new
        .application_restore_configuration
        .as_ref()
        .filter(|r| old.and_then(|o| o.application_restore_configuration.as_ref()) != Some(*r))
        .map(expand::restore_configuration);

    if flink_run_configuration.is_none() && application_restore_configuration.is_none() {
        return None;
    }
    Some(wire::RunConfigurationUpdate {
        flink_run_configuration,
        application_restore_configuration,
    })
}
