//! Diff engine for comparing observed vs desired configuration trees.
//!
//! The diff is computed once, up front, and handed to the planner as an
//! explicit value. Comparison ignores server-assigned identities and values
//! the remote system computes.

use std::fmt;
use tracing::debug;

use crate::config::{
    ApplicationCodeConfiguration, ApplicationSnapshotConfiguration, ApplicationTree,
    CloudWatchLoggingOption, EnvironmentProperties, FlinkApplicationConfiguration, Identified,
    Input, ReferenceDataSource, RunConfiguration, VpcConfiguration,
};

use super::outputs::{OutputChanges, reconcile_outputs};

/// A top-level configurable facet of an application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Area {
    /// Code location and type.
    Code,
    /// Snapshot toggle and checkpoint, monitoring and parallelism tuning.
    RuntimeTuning,
    /// Runtime property groups.
    EnvironmentProperties,
    /// Log stream attachment.
    Logging,
    /// Network attachment.
    Network,
    /// Primary input stream.
    Input,
    /// Output sinks.
    Outputs,
    /// Reference data table.
    ReferenceData,
    /// Execution role.
    ServiceRole,
    /// Restore and restart behavior.
    RunConfiguration,
    /// Start and stop.
    Lifecycle,
}

impl fmt::Display for Area {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Code => "code",
            Self::RuntimeTuning => "runtime tuning",
            Self::EnvironmentProperties => "environment properties",
            Self::Logging => "logging",
            Self::Network => "network",
            Self::Input => "input",
            Self::Outputs => "outputs",
            Self::ReferenceData => "reference data",
            Self::ServiceRole => "service role",
            Self::RunConfiguration => "run configuration",
            Self::Lifecycle => "lifecycle",
        };
        write!(f, "{s}")
    }
}

/// Kind of remote operation issued for an area.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    /// Adds a sub-object.
    Add,
    /// Deletes a sub-object.
    Delete,
    /// Updates in place.
    Update,
    /// Starts the application.
    Start,
    /// Stops the application.
    Stop,
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Add => "add",
            Self::Delete => "delete",
            Self::Update => "update",
            Self::Start => "start",
            Self::Stop => "stop",
        };
        write!(f, "{s}")
    }
}

/// Transition of a singleton area between observed and desired.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AreaChange<T> {
    /// Same content on both sides (or absent on both).
    Unchanged,
    /// Absent observed, present desired.
    Added(T),
    /// Present observed, absent desired. Carries the observed value.
    Removed(T),
    /// Present on both sides with different content.
    Modified {
        /// Observed value, with identities.
        old: T,
        /// Desired value.
        new: T,
    },
}

impl<T: Clone> AreaChange<T> {
    /// Classifies the transition using `same` for content equality.
    pub fn between(old: Option<&T>, new: Option<&T>, same: impl Fn(&T, &T) -> bool) -> Self {
        match (old, new) {
            (None, None) => Self::Unchanged,
            (None, Some(new)) => Self::Added(new.clone()),
            (Some(old), None) => Self::Removed(old.clone()),
            (Some(old), Some(new)) if same(old, new) => Self::Unchanged,
            (Some(old), Some(new)) => Self::Modified {
                old: old.clone(),
                new: new.clone(),
            },
        }
    }
}

impl<T> AreaChange<T> {
    /// Returns true when no call is needed.
    #[must_use]
    pub const fn is_unchanged(&self) -> bool {
        matches!(self, Self::Unchanged)
    }

    /// Short label of the transition.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Unchanged => "unchanged",
            Self::Added(_) => "added",
            Self::Removed(_) => "removed",
            Self::Modified { .. } => "modified",
        }
    }
}

/// Per-area differences between an observed and a desired tree.
#[derive(Debug, Clone)]
pub struct ConfigDiff {
    /// Code configuration.
    pub code: AreaChange<ApplicationCodeConfiguration>,
    /// Snapshot toggle.
    pub snapshot: AreaChange<ApplicationSnapshotConfiguration>,
    /// Checkpoint, monitoring and parallelism tuning.
    pub tuning: AreaChange<FlinkApplicationConfiguration>,
    /// Property groups.
    pub environment: AreaChange<EnvironmentProperties>,
    /// Log stream attachment.
    pub logging: AreaChange<CloudWatchLoggingOption>,
    /// Network attachment.
    pub vpc: AreaChange<VpcConfiguration>,
    /// Primary input.
    pub input: AreaChange<Input>,
    /// Output set changes.
    pub outputs: OutputChanges,
    /// Reference data source.
    pub reference_data: AreaChange<ReferenceDataSource>,
    /// Execution role.
    pub service_role: AreaChange<String>,
    /// Run configuration.
    pub run_configuration: AreaChange<RunConfiguration>,
}

impl ConfigDiff {
    /// Returns true if any area needs a call.
    #[must_use]
    pub fn has_changes(&self) -> bool {
        !self.changed_areas().is_empty()
    }

    /// Returns the areas that need a call, in execution order.
    #[must_use]
    pub fn changed_areas(&self) -> Vec<Area> {
        let mut areas = Vec::new();
        if !self.code.is_unchanged() {
            areas.push(Area::Code);
        }
        if !self.snapshot.is_unchanged() || !self.tuning.is_unchanged() {
            areas.push(Area::RuntimeTuning);
        }
        if !self.environment.is_unchanged() {
            areas.push(Area::EnvironmentProperties);
        }
        if !self.logging.is_unchanged() {
            areas.push(Area::Logging);
        }
        if !self.vpc.is_unchanged() {
            areas.push(Area::Network);
        }
        if !self.input.is_unchanged() {
            areas.push(Area::Input);
        }
        if !self.outputs.is_empty() {
            areas.push(Area::Outputs);
        }
        if !self.reference_data.is_unchanged() {
            areas.push(Area::ReferenceData);
        }
        if !self.service_role.is_unchanged() {
            areas.push(Area::ServiceRole);
        }
        if !self.run_configuration.is_unchanged() {
            areas.push(Area::RunConfiguration);
        }
        areas
    }
}

/// Engine for computing diffs between observed and desired trees.
#[derive(Debug, Default)]
pub struct DiffEngine;

impl DiffEngine {
    /// Creates a new diff engine.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Computes the per-area diff.
    #[must_use]
    pub fn diff(&self, observed: &ApplicationTree, desired: &ApplicationTree) -> ConfigDiff {
        let diff = ConfigDiff {
            code: AreaChange::between(observed.code(), desired.code(), |a, b| a == b),
            snapshot: kept_when_absent(observed.snapshot(), desired.snapshot()),
            tuning: tuning_change(observed.tuning(), desired.tuning()),
            environment: AreaChange::between(
                non_empty_environment(observed.environment()),
                non_empty_environment(desired.environment()),
                |a, b| a.normalized() == b.normalized(),
            ),
            logging: AreaChange::between(
                observed.cloudwatch_logging_options.as_ref(),
                desired.cloudwatch_logging_options.as_ref(),
                Identified::same_content,
            ),
            vpc: AreaChange::between(observed.vpc(), desired.vpc(), Identified::same_content),
            input: AreaChange::between(observed.input(), desired.input(), same_input),
            outputs: reconcile_outputs(observed.outputs(), desired.outputs()),
            reference_data: AreaChange::between(
                observed.reference_data_source(),
                desired.reference_data_source(),
                Identified::same_content,
            ),
            service_role: AreaChange::between(
                Some(&observed.service_execution_role).filter(|r| !r.is_empty()),
                Some(&desired.service_execution_role).filter(|r| !r.is_empty()),
                |a, b| a == b,
            ),
            run_configuration: run_configuration_change(
                observed.run_configuration(),
                desired.run_configuration(),
            ),
        };

        debug!(
            "Diff: code {}, tuning {}/{}, environment {}, logging {}, network {}, input {}, \
             outputs -{}/+{}, reference data {}, role {}, run {}",
            diff.code.label(),
            diff.snapshot.label(),
            diff.tuning.label(),
            diff.environment.label(),
            diff.logging.label(),
            diff.vpc.label(),
            diff.input.label(),
            diff.outputs.to_remove.len(),
            diff.outputs.to_add.len(),
            diff.reference_data.label(),
            diff.service_role.label(),
            diff.run_configuration.label(),
        );
        diff
    }
}

/// Tuning is compared without remote-computed values. A desired tree that
/// drops tuning only differs from an observed one that has custom blocks.
fn tuning_change(
    observed: Option<&FlinkApplicationConfiguration>,
    desired: Option<&FlinkApplicationConfiguration>,
) -> AreaChange<FlinkApplicationConfiguration> {
    if desired.is_none() && observed.is_some_and(|o| !has_custom_block(o)) {
        return AreaChange::Unchanged;
    }
    AreaChange::between(observed, desired, same_tuning)
}

/// A block left out of the desired tuning matches an observed block the
/// remote filled with defaults.
fn same_tuning(
    observed: &FlinkApplicationConfiguration,
    desired: &FlinkApplicationConfiguration,
) -> bool {
    fn same_block<T: PartialEq>(observed: Option<&T>, desired: Option<&T>, observed_custom: bool) -> bool {
        match desired {
            None => !observed_custom,
            Some(_) => observed == desired,
        }
    }

    let (o, d) = (observed.normalized(), desired.normalized());
    same_block(
        o.checkpoint_configuration.as_ref(),
        d.checkpoint_configuration.as_ref(),
        o.checkpoint_configuration
            .as_ref()
            .is_some_and(|c| c.configuration_type.is_custom()),
    ) && same_block(
        o.monitoring_configuration.as_ref(),
        d.monitoring_configuration.as_ref(),
        o.monitoring_configuration
            .as_ref()
            .is_some_and(|c| c.configuration_type.is_custom()),
    ) && same_block(
        o.parallelism_configuration.as_ref(),
        d.parallelism_configuration.as_ref(),
        o.parallelism_configuration
            .as_ref()
            .is_some_and(|c| c.configuration_type.is_custom()),
    )
}

/// The remote fills in input parallelism when the desired input leaves it out.
fn same_input(observed: &Input, desired: &Input) -> bool {
    if desired.input_parallelism.is_none() {
        let observed = Input {
            input_parallelism: None,
            ..observed.clone()
        };
        return observed.same_content(desired);
    }
    observed.same_content(desired)
}

/// Areas the remote fills in on its own. Leaving one out of the desired
/// tree keeps the remote value.
fn kept_when_absent<T: Clone + PartialEq>(observed: Option<&T>, desired: Option<&T>) -> AreaChange<T> {
    if desired.is_none() {
        return AreaChange::Unchanged;
    }
    AreaChange::between(observed, desired, |a, b| a == b)
}

/// Only members the desired tree sets are compared; the remote fills the rest.
fn run_configuration_change(
    observed: Option<&RunConfiguration>,
    desired: Option<&RunConfiguration>,
) -> AreaChange<RunConfiguration> {
    let desired = desired.filter(|d| {
        d.application_restore_configuration.is_some() || d.flink_run_configuration.is_some()
    });
    if desired.is_none() {
        return AreaChange::Unchanged;
    }
    AreaChange::between(observed, desired, |o, d| {
        d.application_restore_configuration
            .as_ref()
            .is_none_or(|r| o.application_restore_configuration.as_ref() == Some(r))
            && d.flink_run_configuration
                .as_ref()
                .is_none_or(|f| o.flink_run_configuration.as_ref() == Some(f))
    })
}

fn has_custom_block(tuning: &FlinkApplicationConfiguration) -> bool {
    tuning
        .checkpoint_configuration
        .as_ref()
        .is_some_and(|c| c.configuration_type.is_custom())
        || tuning
            .monitoring_configuration
            .as_ref()
            .is_some_and(|c| c.configuration_type.is_custom())
        || tuning
            .parallelism_configuration
            .as_ref()
            .is_some_and(|c| c.configuration_type.is_custom())
}

fn non_empty_environment(env: Option<&EnvironmentProperties>) -> Option<&EnvironmentProperties> {
    env.filter(|e| !e.property_groups.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{
        ApplicationConfiguration, ApplicationRestoreConfiguration, ApplicationRestoreType,
        CheckpointConfiguration, ConfigurationType, FlinkRunConfiguration, InputParallelism, LogLevel,
        MonitoringConfiguration, ParallelismConfiguration, ResourceArn,
        SqlApplicationConfiguration,
    };

    fn tree_with_input(input: Option<Input>) -> ApplicationTree {
        ApplicationTree {
            service_execution_role: "arn:role".to_string(),
            application_configuration: Some(ApplicationConfiguration {
                sql_application_configuration: Some(SqlApplicationConfiguration {
                    input,
                    ..Default::default()
                }),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    fn input(prefix: &str, id: Option<&str>) -> Input {
        Input {
            input_id: id.map(str::to_string),
            name_prefix: prefix.to_string(),
            kinesis_streams_input: Some(ResourceArn::new("arn:stream")),
            ..Default::default()
        }
    }

    #[test]
    fn test_identity_does_not_count_as_change() {
        let observed = tree_with_input(Some(input("src", Some("1.1"))));
        let desired = tree_with_input(Some(input("src", None)));

        let diff = DiffEngine::new().diff(&observed, &desired);
        assert!(!diff.has_changes());
    }

    #[test]
    fn test_input_transitions() {
        let engine = DiffEngine::new();
        let with = tree_with_input(Some(input("src", Some("1.1"))));
        let without = tree_with_input(None);
        let renamed = tree_with_input(Some(input("other", None)));

        assert!(matches!(engine.diff(&without, &with).input, AreaChange::Added(_)));
        assert!(matches!(engine.diff(&with, &without).input, AreaChange::Removed(_)));
        match engine.diff(&with, &renamed).input {
            AreaChange::Modified { old, new } => {
                assert_eq!(old.input_id.as_deref(), Some("1.1"));
                assert_eq!(new.name_prefix, "other");
            }
            other => panic!("expected modified, got {}", other.label()),
        }
        assert_eq!(engine.diff(&with, &renamed).changed_areas(), vec![Area::Input]);
    }

    #[test]
    fn test_default_tuning_values_are_ignored() {
        let observed = ApplicationTree {
            application_configuration: Some(ApplicationConfiguration {
                flink_application_configuration: Some(FlinkApplicationConfiguration {
                    checkpoint_configuration: Some(CheckpointConfiguration {
                        configuration_type: ConfigurationType::Default,
                        checkpointing_enabled: Some(true),
                        checkpoint_interval: Some(60_000),
                        min_pause_between_checkpoints: Some(5_000),
                    }),
                    ..Default::default()
                }),
                ..Default::default()
            }),
            ..Default::default()
        };
        let mut desired = observed.clone();
        if let Some(config) = desired.application_configuration.as_mut() {
            config.flink_application_configuration = Some(FlinkApplicationConfiguration {
                checkpoint_configuration: Some(CheckpointConfiguration::default()),
                ..Default::default()
            });
        }

        let engine = DiffEngine::new();
        assert!(engine.diff(&observed, &desired).tuning.is_unchanged());

        let mut dropped = observed.clone();
        if let Some(config) = dropped.application_configuration.as_mut() {
            config.flink_application_configuration = None;
        }
        assert!(engine.diff(&observed, &dropped).tuning.is_unchanged());
    }

    fn tree_with(config: ApplicationConfiguration) -> ApplicationTree {
        ApplicationTree {
            service_execution_role: "arn:role".to_string(),
            application_configuration: Some(config),
            ..Default::default()
        }
    }

    #[test]
    fn test_snapshot_left_out_keeps_remote_value() {
        let observed = tree_with(ApplicationConfiguration {
            application_snapshot_configuration: Some(ApplicationSnapshotConfiguration {
                snapshots_enabled: false,
            }),
            ..Default::default()
        });
        let role_only = ApplicationTree {
            service_execution_role: "arn:role".to_string(),
            ..Default::default()
        };

        let engine = DiffEngine::new();
        assert!(!engine.diff(&observed, &role_only).has_changes());

        let enabled = tree_with(ApplicationConfiguration {
            application_snapshot_configuration: Some(ApplicationSnapshotConfiguration {
                snapshots_enabled: true,
            }),
            ..Default::default()
        });
        assert!(matches!(
            engine.diff(&observed, &enabled).snapshot,
            AreaChange::Modified { .. }
        ));
    }

    #[test]
    fn test_run_configuration_compares_members_set_in_manifest() {
        let observed = tree_with(ApplicationConfiguration {
            run_configuration: Some(RunConfiguration {
                application_restore_configuration: Some(ApplicationRestoreConfiguration {
                    application_restore_type: ApplicationRestoreType::RestoreFromLatestSnapshot,
                    snapshot_name: None,
                }),
                flink_run_configuration: Some(FlinkRunConfiguration {
                    allow_non_restored_state: true,
                }),
            }),
            ..Default::default()
        });
        let flink_only = |allow| {
            tree_with(ApplicationConfiguration {
                run_configuration: Some(RunConfiguration {
                    application_restore_configuration: None,
                    flink_run_configuration: Some(FlinkRunConfiguration {
                        allow_non_restored_state: allow,
                    }),
                }),
                ..Default::default()
            })
        };

        let engine = DiffEngine::new();
        assert!(engine.diff(&observed, &flink_only(true)).run_configuration.is_unchanged());
        assert!(matches!(
            engine.diff(&observed, &flink_only(false)).run_configuration,
            AreaChange::Modified { .. }
        ));
    }

    #[test]
    fn test_tuning_blocks_left_out_match_remote_defaults() {
        let observed = tree_with(ApplicationConfiguration {
            flink_application_configuration: Some(FlinkApplicationConfiguration {
                checkpoint_configuration: Some(CheckpointConfiguration {
                    configuration_type: ConfigurationType::Default,
                    checkpointing_enabled: Some(true),
                    checkpoint_interval: Some(60_000),
                    min_pause_between_checkpoints: Some(5_000),
                }),
                monitoring_configuration: Some(MonitoringConfiguration {
                    configuration_type: ConfigurationType::Custom,
                    log_level: Some(LogLevel::Warn),
                    metrics_level: None,
                }),
                parallelism_configuration: Some(ParallelismConfiguration {
                    configuration_type: ConfigurationType::Default,
                    auto_scaling_enabled: Some(false),
                    parallelism: Some(1),
                    parallelism_per_kpu: Some(1),
                }),
            }),
            ..Default::default()
        });
        let monitoring_only = |config: Option<MonitoringConfiguration>| {
            tree_with(ApplicationConfiguration {
                flink_application_configuration: Some(FlinkApplicationConfiguration {
                    monitoring_configuration: config,
                    ..Default::default()
                }),
                ..Default::default()
            })
        };

        let engine = DiffEngine::new();
        let same = monitoring_only(Some(MonitoringConfiguration {
            configuration_type: ConfigurationType::Custom,
            log_level: Some(LogLevel::Warn),
            metrics_level: None,
        }));
        assert!(engine.diff(&observed, &same).tuning.is_unchanged());

        let custom_block_dropped = monitoring_only(None);
        assert!(matches!(
            engine.diff(&observed, &custom_block_dropped).tuning,
            AreaChange::Modified { .. }
        ));
    }

    #[test]
    fn test_input_parallelism_left_out_matches_remote_default() {
        let mut described = input("src", Some("1.1"));
        described.input_parallelism = Some(InputParallelism { count: 1 });
        described.in_app_stream_names = vec!["src_001".to_string()];
        let observed = tree_with_input(Some(described));

        let engine = DiffEngine::new();
        assert!(!engine.diff(&observed, &tree_with_input(Some(input("src", None)))).has_changes());

        let mut wider = input("src", None);
        wider.input_parallelism = Some(InputParallelism { count: 2 });
        assert!(matches!(
            engine.diff(&observed, &tree_with_input(Some(wider))).input,
            AreaChange::Modified { .. }
        ));
    }

    #[test]
    fn test_area_display() {
        assert_eq!(Area::ReferenceData.to_string(), "reference data");
        assert_eq!(OperationKind::Delete.to_string(), "delete");
    }
}
