//! Operation plan types and construction.
//!
//! A plan is the ordered list of remote calls that turns the observed
//! application into the desired one. It is built completely from a
//! [`ConfigDiff`] before the first call is issued, so contract violations
//! surface with nothing applied.

use chrono::{DateTime, Utc};
use std::fmt;
use tracing::debug;

use crate::config::{Identified, RunConfiguration};
use crate::error::{ContractViolation, Result};
use crate::mapper::{expand, require_identity, update};
use crate::remote::types as wire;

use super::diff::{Area, AreaChange, ConfigDiff, OperationKind};

/// Fields of an `UpdateApplication` call, without name and version.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplicationUpdate {
    /// Configuration delta.
    pub application_configuration_update: Option<wire::ApplicationConfigurationUpdate>,
    /// New execution role.
    pub service_execution_role_update: Option<String>,
    /// Log stream attachment deltas.
    pub cloudwatch_logging_option_updates: Vec<wire::CloudWatchLoggingOptionUpdate>,
}

impl ApplicationUpdate {
    /// Wraps a configuration delta.
    #[must_use]
    pub fn configuration(update: wire::ApplicationConfigurationUpdate) -> Self {
        Self {
            application_configuration_update: Some(update),
            ..Default::default()
        }
    }

    /// Builds the request for the given application and version.
    #[must_use]
    pub fn into_request(self, name: &str, version: i64) -> wire::UpdateApplicationRequest {
        wire::UpdateApplicationRequest {
            application_name: name.to_string(),
            current_application_version_id: version,
            application_configuration_update: self.application_configuration_update,
            service_execution_role_update: self.service_execution_role_update,
            run_configuration_update: None,
            cloudwatch_logging_option_updates: self.cloudwatch_logging_option_updates,
        }
    }
}

/// A remote call, without the name and version it will carry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteCall {
    /// `UpdateApplication` with a configuration, role or logging delta.
    Update(ApplicationUpdate),
    /// `UpdateApplication` with a run configuration delta. Only applies to a
    /// running application; otherwise the next start carries it.
    UpdateRunConfiguration(wire::RunConfigurationUpdate),
    /// Adds the primary input.
    AddInput(wire::Input),
    /// Attaches pre-processing to an existing input.
    AddInputProcessing {
        /// Input identity.
        input_id: String,
        /// Pre-processing to attach.
        config: wire::InputProcessingConfiguration,
    },
    /// Detaches pre-processing from an existing input.
    DeleteInputProcessing {
        /// Input identity.
        input_id: String,
    },
    /// Adds an output.
    AddOutput(wire::Output),
    /// Deletes an output.
    DeleteOutput {
        /// Output identity.
        output_id: String,
    },
    /// Adds the reference data source.
    AddReferenceDataSource(wire::ReferenceDataSource),
    /// Deletes the reference data source.
    DeleteReferenceDataSource {
        /// Reference identity.
        reference_id: String,
    },
    /// Adds a network attachment.
    AddVpc(wire::VpcConfiguration),
    /// Deletes a network attachment.
    DeleteVpc {
        /// Attachment identity.
        vpc_configuration_id: String,
    },
    /// Adds a log stream attachment.
    AddLogging(wire::CloudWatchLoggingOption),
    /// Deletes a log stream attachment.
    DeleteLogging {
        /// Attachment identity.
        cloudwatch_logging_option_id: String,
    },
}

/// A single planned operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedOperation {
    /// Area the operation reconciles.
    pub area: Area,
    /// Kind of operation.
    pub kind: OperationKind,
    /// The call to issue.
    pub call: RemoteCall,
    /// Human-readable description.
    pub description: String,
}

impl PlannedOperation {
    fn new(area: Area, kind: OperationKind, call: RemoteCall, description: impl Into<String>) -> Self {
        Self {
            area,
            kind,
            call,
            description: description.into(),
        }
    }
}

/// A complete operation plan.
#[derive(Debug, Clone)]
pub struct OperationPlan {
    /// When the plan was created.
    pub created_at: DateTime<Utc>,
    /// Operations in execution order.
    pub operations: Vec<PlannedOperation>,
    /// Entries skipped during planning.
    pub warnings: Vec<String>,
}

impl OperationPlan {
    /// Creates an empty plan.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            created_at: Utc::now(),
            operations: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// Builds the plan for a diff.
    ///
    /// Areas are ordered: code, runtime tuning, environment properties,
    /// logging, network, input, outputs, reference data, service role, run
    /// configuration.
    ///
    /// # Errors
    ///
    /// Returns a contract violation when the diff removes a create-only area,
    /// an observed sub-object lacks its identity, or a desired sub-object
    /// breaks a oneof rule.
    pub fn from_diff(diff: &ConfigDiff) -> Result<Self> {
        let mut plan = Self::empty();

        plan.plan_code(diff)?;
        plan.plan_tuning(diff)?;
        plan.plan_environment(diff);
        plan.plan_logging(diff)?;
        plan.plan_network(diff)?;
        plan.plan_input(diff)?;
        plan.plan_outputs(diff)?;
        plan.plan_reference_data(diff)?;
        plan.plan_service_role(diff)?;
        plan.plan_run_configuration(diff);

        debug!("Planned {} operations", plan.operations.len());
        Ok(plan)
    }

    fn push(&mut self, operation: PlannedOperation) {
        self.operations.push(operation);
    }

    fn plan_code(&mut self, diff: &ConfigDiff) -> Result<()> {
        let delta = match &diff.code {
            AreaChange::Unchanged => None,
            AreaChange::Added(new) => update::code_configuration(None, new)?,
            AreaChange::Modified { old, new } => update::code_configuration(Some(old), new)?,
            AreaChange::Removed(_) => {
                return Err(ContractViolation::new(
                    "application_code_configuration",
                    "code configuration cannot be removed",
                )
                .into());
            }
        };

        if let Some(delta) = delta {
            self.push(PlannedOperation::new(
                Area::Code,
                OperationKind::Update,
                RemoteCall::Update(ApplicationUpdate::configuration(
                    wire::ApplicationConfigurationUpdate {
                        application_code_configuration_update: Some(delta),
                        ..Default::default()
                    },
                )),
                "Update code configuration",
            ));
        }
        Ok(())
    }

    fn plan_tuning(&mut self, diff: &ConfigDiff) -> Result<()> {
        let snapshot = match &diff.snapshot {
            AreaChange::Unchanged => None,
            AreaChange::Added(new) | AreaChange::Modified { new, .. } => {
                Some(update::snapshot_configuration(new))
            }
            AreaChange::Removed(_) => {
                debug!("Snapshot configuration left out of the manifest; remote value kept");
                None
            }
        };

        let tuning = match &diff.tuning {
            AreaChange::Unchanged => None,
            AreaChange::Added(new) => update::tuning(None, Some(new)),
            AreaChange::Removed(old) => update::tuning(Some(old), None),
            AreaChange::Modified { old, new } => update::tuning(Some(old), Some(new)),
        };

        if snapshot.is_none() && tuning.is_none() {
            return Ok(());
        }
        self.push(PlannedOperation::new(
            Area::RuntimeTuning,
            OperationKind::Update,
            RemoteCall::Update(ApplicationUpdate::configuration(
                wire::ApplicationConfigurationUpdate {
                    application_snapshot_configuration_update: snapshot,
                    flink_application_configuration_update: tuning,
                    ..Default::default()
                },
            )),
            "Update snapshot and runtime tuning",
        ));
        Ok(())
    }

    fn plan_environment(&mut self, diff: &ConfigDiff) {
        let (groups, description) = match &diff.environment {
            AreaChange::Unchanged => return,
            AreaChange::Added(new) | AreaChange::Modified { new, .. } => (
                update::environment_properties(Some(new)),
                format!("Replace {} property groups", new.property_groups.len()),
            ),
            AreaChange::Removed(_) => (
                update::environment_properties(None),
                String::from("Clear property groups"),
            ),
        };

        self.push(PlannedOperation::new(
            Area::EnvironmentProperties,
            OperationKind::Update,
            RemoteCall::Update(ApplicationUpdate::configuration(
                wire::ApplicationConfigurationUpdate {
                    environment_property_updates: Some(groups),
                    ..Default::default()
                },
            )),
            description,
        ));
    }

    fn plan_logging(&mut self, diff: &ConfigDiff) -> Result<()> {
        const AREA: &str = "cloudwatch_logging_options";
        match &diff.logging {
            AreaChange::Unchanged => {}
            AreaChange::Added(new) => self.push(PlannedOperation::new(
                Area::Logging,
                OperationKind::Add,
                RemoteCall::AddLogging(expand::logging_option(new)),
                format!("Attach log stream {}", new.log_stream_arn),
            )),
            AreaChange::Removed(old) => {
                let id = require_identity(AREA, old.identity())?;
                self.push(PlannedOperation::new(
                    Area::Logging,
                    OperationKind::Delete,
                    RemoteCall::DeleteLogging {
                        cloudwatch_logging_option_id: id.to_string(),
                    },
                    format!("Detach log stream {}", old.log_stream_arn),
                ));
            }
            AreaChange::Modified { old, new } => {
                if let Some(delta) = update::logging_option(old, new)? {
                    self.push(PlannedOperation::new(
                        Area::Logging,
                        OperationKind::Update,
                        RemoteCall::Update(ApplicationUpdate {
                            cloudwatch_logging_option_updates: vec![delta],
                            ..Default::default()
                        }),
                        format!("Switch log stream to {}", new.log_stream_arn),
                    ));
                }
            }
        }
        Ok(())
    }

    fn plan_network(&mut self, diff: &ConfigDiff) -> Result<()> {
        match &diff.vpc {
            AreaChange::Unchanged => {}
            AreaChange::Added(new) => self.push(PlannedOperation::new(
                Area::Network,
                OperationKind::Add,
                RemoteCall::AddVpc(expand::vpc_configuration(new)),
                format!("Attach network ({} subnets)", new.subnet_ids.len()),
            )),
            AreaChange::Removed(old) => {
                let id = require_identity("vpc_configuration", old.identity())?;
                self.push(PlannedOperation::new(
                    Area::Network,
                    OperationKind::Delete,
                    RemoteCall::DeleteVpc {
                        vpc_configuration_id: id.to_string(),
                    },
                    format!("Detach network {id}"),
                ));
            }
            AreaChange::Modified { old, new } => {
                if let Some(delta) = update::vpc_configuration(old, new)? {
                    self.push(PlannedOperation::new(
                        Area::Network,
                        OperationKind::Update,
                        RemoteCall::Update(ApplicationUpdate::configuration(
                            wire::ApplicationConfigurationUpdate {
                                vpc_configuration_updates: vec![delta],
                                ..Default::default()
                            },
                        )),
                        "Update network attachment",
                    ));
                }
            }
        }
        Ok(())
    }

    fn plan_input(&mut self, diff: &ConfigDiff) -> Result<()> {
        const AREA: &str = "sql_application_configuration.input";
        match &diff.input {
            AreaChange::Unchanged => {}
            AreaChange::Added(new) => self.push(PlannedOperation::new(
                Area::Input,
                OperationKind::Add,
                RemoteCall::AddInput(expand::input(new)?),
                format!("Add input '{}'", new.name_prefix),
            )),
            AreaChange::Removed(_) => {
                return Err(ContractViolation::new(
                    AREA,
                    "the input cannot be removed once created, only changed in place",
                )
                .into());
            }
            AreaChange::Modified { old, new } => {
                let input_id = require_identity(AREA, old.identity())?.to_string();

                if old.input_processing_configuration.is_some()
                    && new.input_processing_configuration.is_none()
                {
                    self.push(PlannedOperation::new(
                        Area::Input,
                        OperationKind::Delete,
                        RemoteCall::DeleteInputProcessing {
                            input_id: input_id.clone(),
                        },
                        format!("Detach pre-processing from input {input_id}"),
                    ));
                }

                if let Some(delta) = update::input(old, new)? {
                    self.push(PlannedOperation::new(
                        Area::Input,
                        OperationKind::Update,
                        RemoteCall::Update(ApplicationUpdate::configuration(
                            wire::ApplicationConfigurationUpdate {
                                sql_application_configuration_update: Some(
                                    wire::SqlApplicationConfigurationUpdate {
                                        input_updates: vec![delta],
                                        ..Default::default()
                                    },
                                ),
                                ..Default::default()
                            },
                        )),
                        format!("Update input {input_id}"),
                    ));
                }

                if let (None, Some(processing)) = (
                    &old.input_processing_configuration,
                    &new.input_processing_configuration,
                ) {
                    self.push(PlannedOperation::new(
                        Area::Input,
                        OperationKind::Add,
                        RemoteCall::AddInputProcessing {
                            input_id: input_id.clone(),
                            config: expand::input_processing_configuration(processing),
                        },
                        format!("Attach pre-processing to input {input_id}"),
                    ));
                }
            }
        }
        Ok(())
    }

    fn plan_outputs(&mut self, diff: &ConfigDiff) -> Result<()> {
        let changes = &diff.outputs;

        for output_id in &changes.to_remove {
            self.push(PlannedOperation::new(
                Area::Outputs,
                OperationKind::Delete,
                RemoteCall::DeleteOutput {
                    output_id: output_id.clone(),
                },
                format!("Delete output {output_id}"),
            ));
        }
        for output in &changes.to_add {
            self.push(PlannedOperation::new(
                Area::Outputs,
                OperationKind::Add,
                RemoteCall::AddOutput(expand::output(output)?),
                format!("Add output '{}'", output.name),
            ));
        }

        self.warnings.extend(changes.warnings.iter().cloned());
        Ok(())
    }

    fn plan_reference_data(&mut self, diff: &ConfigDiff) -> Result<()> {
        const AREA: &str = "sql_application_configuration.reference_data_source";
        match &diff.reference_data {
            AreaChange::Unchanged => {}
            AreaChange::Added(new) => self.push(PlannedOperation::new(
                Area::ReferenceData,
                OperationKind::Add,
                RemoteCall::AddReferenceDataSource(expand::reference_data_source(new)?),
                format!("Add reference table '{}'", new.table_name),
            )),
            AreaChange::Removed(old) => {
                let id = require_identity(AREA, old.identity())?;
                self.push(PlannedOperation::new(
                    Area::ReferenceData,
                    OperationKind::Delete,
                    RemoteCall::DeleteReferenceDataSource {
                        reference_id: id.to_string(),
                    },
                    format!("Delete reference table '{}'", old.table_name),
                ));
            }
            AreaChange::Modified { old, new } => {
                if let Some(delta) = update::reference_data_source(old, new)? {
                    self.push(PlannedOperation::new(
                        Area::ReferenceData,
                        OperationKind::Update,
                        RemoteCall::Update(ApplicationUpdate::configuration(
                            wire::ApplicationConfigurationUpdate {
                                sql_application_configuration_update: Some(
                                    wire::SqlApplicationConfigurationUpdate {
                                        reference_data_source_updates: vec![delta],
                                        ..Default::default()
                                    },
                                ),
                                ..Default::default()
                            },
                        )),
                        format!("Update reference table '{}'", new.table_name),
                    ));
                }
            }
        }
        Ok(())
    }

    fn plan_service_role(&mut self, diff: &ConfigDiff) -> Result<()> {
        match &diff.service_role {
            AreaChange::Unchanged => Ok(()),
            AreaChange::Removed(_) => Err(ContractViolation::new(
                "service_execution_role",
                "the execution role cannot be removed",
            )
            .into()),
            AreaChange::Added(role) | AreaChange::Modified { new: role, .. } => {
                self.push(PlannedOperation::new(
                    Area::ServiceRole,
                    OperationKind::Update,
                    RemoteCall::Update(ApplicationUpdate {
                        service_execution_role_update: Some(role.clone()),
                        ..Default::default()
                    }),
                    format!("Switch execution role to {role}"),
                ));
                Ok(())
            }
        }
    }

    fn plan_run_configuration(&mut self, diff: &ConfigDiff) {
        match &diff.run_configuration {
            AreaChange::Unchanged => {}
            AreaChange::Removed(_) => {
                debug!("Run configuration removed from the manifest; remote value left as is");
            }
            AreaChange::Added(new) => self.push_run_configuration(None, new),
            AreaChange::Modified { old, new } => self.push_run_configuration(Some(old), new),
        }
    }

    fn push_run_configuration(&mut self, old: Option<&RunConfiguration>, new: &RunConfiguration) {
        if let Some(delta) = update::run_configuration(old, new) {
            self.push(PlannedOperation::new(
                Area::RunConfiguration,
                OperationKind::Update,
                RemoteCall::UpdateRunConfiguration(delta),
                "Update run configuration",
            ));
        }
    }

    /// Returns true if the plan is empty (no changes).
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Returns the number of operations.
    #[must_use]
    pub const fn operation_count(&self) -> usize {
        self.operations.len()
    }

    /// Returns the number of operations of a kind.
    #[must_use]
    pub fn count(&self, kind: OperationKind) -> usize {
        self.operations.iter().filter(|o| o.kind == kind).count()
    }

    /// Returns the areas touched by the plan, in execution order.
    #[must_use]
    pub fn areas(&self) -> Vec<Area> {
        let mut areas: Vec<Area> = Vec::new();
        for operation in &self.operations {
            if areas.last() != Some(&operation.area) {
                areas.push(operation.area);
            }
        }
        areas
    }
}

impl fmt::Display for PlannedOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {} ({})", self.area, self.description, self.kind)
    }
}

impl fmt::Display for OperationPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.operations.is_empty() {
            return write!(f, "No changes required");
        }

        writeln!(f, "Operation Plan ({} operations):", self.operations.len())?;
        for (i, operation) in self.operations.iter().enumerate() {
            writeln!(f, "  {}. {operation}", i + 1)?;
        }

        if !self.warnings.is_empty() {
            writeln!(f, "\nWarnings:")?;
            for warning in &self.warnings {
                writeln!(f, "  - {warning}")?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{
        ApplicationCodeConfiguration, ApplicationConfiguration, ApplicationSnapshotConfiguration,
        ApplicationTree, CloudWatchLoggingOption, CodeContent, Input, InputProcessingConfiguration, Output,
        ResourceArn, SqlApplicationConfiguration,
    };
    use crate::error::{ErrorKind, KdaError};
    use crate::planner::DiffEngine;

    fn sql_tree(input: Option<Input>, outputs: Vec<Output>) -> ApplicationTree {
        ApplicationTree {
            service_execution_role: "arn:role".to_string(),
            application_configuration: Some(ApplicationConfiguration {
                sql_application_configuration: Some(SqlApplicationConfiguration {
                    input,
                    outputs,
                    ..Default::default()
                }),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    fn input(id: Option<&str>, processing: bool) -> Input {
        Input {
            input_id: id.map(str::to_string),
            name_prefix: "src".to_string(),
            kinesis_streams_input: Some(ResourceArn::new("arn:stream")),
            input_processing_configuration: processing.then(|| InputProcessingConfiguration {
                input_lambda_processor: ResourceArn::new("arn:fn"),
            }),
            ..Default::default()
        }
    }

    fn output(name: &str, id: Option<&str>) -> Output {
        Output {
            output_id: id.map(str::to_string),
            name: name.to_string(),
            kinesis_streams_output: Some(ResourceArn::new(format!("arn:out/{name}"))),
            ..Default::default()
        }
    }

    fn plan(observed: &ApplicationTree, desired: &ApplicationTree) -> Result<OperationPlan> {
        OperationPlan::from_diff(&DiffEngine::new().diff(observed, desired))
    }

    #[test]
    fn test_input_removal_is_a_contract_violation() {
        let observed = sql_tree(Some(input(Some("1.1"), false)), vec![]);
        let desired = sql_tree(None, vec![]);

        let err = plan(&observed, &desired).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ContractViolation);
    }

    #[test]
    fn test_snapshot_left_out_plans_nothing() {
        let observed = ApplicationTree {
            service_execution_role: "arn:role".to_string(),
            application_configuration: Some(ApplicationConfiguration {
                application_snapshot_configuration: Some(ApplicationSnapshotConfiguration {
                    snapshots_enabled: false,
                }),
                ..Default::default()
            }),
            ..Default::default()
        };
        let desired = ApplicationTree {
            service_execution_role: "arn:role".to_string(),
            ..Default::default()
        };

        let plan = plan(&observed, &desired).expect("plan");
        assert!(plan.is_empty());
    }

    #[test]
    fn test_outputs_drain_removals_before_additions() {
        let observed = sql_tree(None, vec![output("A", Some("1")), output("B", Some("2"))]);
        let desired = sql_tree(None, vec![output("B", None), output("C", None)]);

        let plan = plan(&observed, &desired).expect("plan");
        let kinds: Vec<OperationKind> = plan.operations.iter().map(|o| o.kind).collect();

        assert_eq!(kinds, vec![OperationKind::Delete, OperationKind::Add]);
        assert_eq!(
            plan.operations[0].call,
            RemoteCall::DeleteOutput {
                output_id: "1".to_string()
            }
        );
    }

    #[test]
    fn test_processing_attach_is_a_dedicated_call() {
        let observed = sql_tree(Some(input(Some("1.1"), false)), vec![]);
        let desired = sql_tree(Some(input(None, true)), vec![]);

        let plan = plan(&observed, &desired).expect("plan");

        assert_eq!(plan.operation_count(), 1);
        assert!(matches!(
            &plan.operations[0].call,
            RemoteCall::AddInputProcessing { input_id, .. } if input_id == "1.1"
        ));
    }

    #[test]
    fn test_new_input_embeds_processing() {
        let observed = sql_tree(None, vec![]);
        let desired = sql_tree(Some(input(None, true)), vec![]);

        let plan = plan(&observed, &desired).expect("plan");

        assert_eq!(plan.operation_count(), 1);
        match &plan.operations[0].call {
            RemoteCall::AddInput(input) => assert!(input.input_processing_configuration.is_some()),
            other => panic!("unexpected call {other:?}"),
        }
    }

    #[test]
    fn test_areas_follow_fixed_order() {
        let mut observed = sql_tree(None, vec![]);
        observed.service_execution_role = "arn:old-role".to_string();

        let mut desired = sql_tree(Some(input(None, false)), vec![output("A", None)]);
        desired.cloudwatch_logging_options = Some(CloudWatchLoggingOption {
            cloudwatch_logging_option_id: None,
            log_stream_arn: "arn:log".to_string(),
        });
        if let Some(config) = desired.application_configuration.as_mut() {
            config.application_code_configuration = Some(ApplicationCodeConfiguration {
                code_content: Some(CodeContent {
                    text_content: Some("SELECT 1".to_string()),
                    ..Default::default()
                }),
                ..Default::default()
            });
        }

        let plan = plan(&observed, &desired).expect("plan");

        assert_eq!(
            plan.areas(),
            vec![
                Area::Code,
                Area::Logging,
                Area::Input,
                Area::Outputs,
                Area::ServiceRole
            ]
        );
    }

    #[test]
    fn test_missing_identity_on_delete_is_rejected() {
        let mut observed = sql_tree(None, vec![]);
        observed.cloudwatch_logging_options = Some(CloudWatchLoggingOption {
            cloudwatch_logging_option_id: None,
            log_stream_arn: "arn:log".to_string(),
        });
        let desired = sql_tree(None, vec![]);

        let err = plan(&observed, &desired).unwrap_err();
        assert!(matches!(err, KdaError::Contract(_)));
    }

    #[test]
    fn test_display_lists_operations() {
        let observed = sql_tree(None, vec![]);
        let desired = sql_tree(None, vec![output("A", None)]);

        let rendered = plan(&observed, &desired).expect("plan").to_string();
        assert!(rendered.contains("Add output 'A'"));
        assert_eq!(OperationPlan::empty().to_string(), "No changes required");
    }
}
