//! Manifest validation.
//!
//! Naming rules are reported as configuration errors. Structural rules on
//! the tree (mutually exclusive members, conflicting areas, limits) are
//! reported as contract violations so they fail the same way whether they
//! are caught here or while mapping.

use crate::error::{ConfigError, ContractViolation, KdaError, Result};
use std::collections::HashSet;
use tracing::debug;

use super::spec::DeployManifest;
use super::tree::{ApplicationTree, Input, MappingParameters, Output, SourceSchema};

/// Maximum number of outputs an application may declare.
pub const MAX_OUTPUTS: usize = 3;

/// Validation result containing all problems found.
#[derive(Debug, Default)]
pub struct ValidationResult {
    /// Naming and value errors.
    pub errors: Vec<ValidationError>,
    /// Structural violations.
    pub violations: Vec<ContractViolation>,
    /// Non-fatal issues.
    pub warnings: Vec<String>,
}

impl ValidationResult {
    /// Returns true when no errors or violations were found.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty() && self.violations.is_empty()
    }
}

/// A single validation error.
#[derive(Debug)]
pub struct ValidationError {
    /// The field path that failed validation.
    pub field: String,
    /// The error message.
    pub message: String,
}

/// Validator for manifests and configuration trees.
#[derive(Debug, Default)]
pub struct ConfigValidator;

impl ConfigValidator {
    /// Creates a new validator.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Validates a manifest.
    ///
    /// # Errors
    ///
    /// Returns the first naming error as a configuration error, or else the
    /// first structural problem as a contract violation.
    pub fn validate(&self, manifest: &DeployManifest) -> Result<ValidationResult> {
        let result = self.inspect(manifest);

        if let Some(first) = result.errors.first() {
            return Err(KdaError::Config(ConfigError::validation(
                first.message.clone(),
                first.field.clone(),
            )));
        }
        if let Some(first) = result.violations.first() {
            return Err(KdaError::Contract(first.clone()));
        }

        debug!("Manifest validation passed");
        Ok(result)
    }

    /// Collects every problem in a manifest without failing.
    #[must_use]
    pub fn inspect(&self, manifest: &DeployManifest) -> ValidationResult {
        let mut result = ValidationResult::default();
        let app = &manifest.application;

        if app.name.is_empty() || app.name.len() > 128 {
            result.errors.push(ValidationError {
                field: String::from("application.name"),
                message: String::from("Application name must be 1 to 128 characters"),
            });
        } else if !is_valid_name(&app.name) {
            result.errors.push(ValidationError {
                field: String::from("application.name"),
                message: format!(
                    "Application name '{}' is invalid. Allowed: letters, digits, '_', '.', '-'.",
                    app.name
                ),
            });
        }

        if app.runtime_environment.is_empty() {
            result.errors.push(ValidationError {
                field: String::from("application.runtime_environment"),
                message: String::from("Runtime environment cannot be empty"),
            });
        }

        if app.tree.service_execution_role.is_empty() {
            result.errors.push(ValidationError {
                field: String::from("application.service_execution_role"),
                message: String::from("Service execution role cannot be empty"),
            });
        }

        if manifest.timeouts.poll_interval_secs == 0 {
            result.warnings.push(String::from(
                "timeouts.poll_interval_secs is 0; status polls will not pause",
            ));
        }

        result.violations = contract_violations(&app.tree);
        result
    }
}

/// Returns every structural rule the tree breaks.
#[must_use]
pub fn contract_violations(tree: &ApplicationTree) -> Vec<ContractViolation> {
    let mut violations = Vec::new();

    if let Some(content) = tree.code().and_then(|c| c.code_content.as_ref())
        && content.s3_content_location.is_some()
        && content.text_content.is_some()
    {
        violations.push(ContractViolation::new(
            "application_code_configuration.code_content",
            "only one of [s3_content_location, text_content] may be set",
        ));
    }

    if tree.sql().is_some() {
        let conflicts = [
            ("application_snapshot_configuration", tree.snapshot().is_some()),
            ("environment_properties", tree.environment().is_some()),
            ("flink_application_configuration", tree.tuning().is_some()),
            ("run_configuration", tree.run_configuration().is_some()),
            ("vpc_configuration", tree.vpc().is_some()),
        ];
        for (area, present) in conflicts {
            if present {
                violations.push(ContractViolation::new(
                    "sql_application_configuration",
                    format!("conflicts with {area}"),
                ));
            }
        }
    }

    if let Some(env) = tree.environment() {
        let mut seen = HashSet::new();
        for group in &env.property_groups {
            let id = &group.property_group_id;
            if id.is_empty() || id.len() > 50 || !is_valid_name(id) {
                violations.push(ContractViolation::new(
                    "environment_properties",
                    format!("invalid property group id '{id}'"),
                ));
            } else if !seen.insert(id.as_str()) {
                violations.push(ContractViolation::new(
                    "environment_properties",
                    format!("duplicate property group id '{id}'"),
                ));
            }
        }
    }

    if let Some(tuning) = tree.tuning() {
        if let Some(p) = &tuning.parallelism_configuration
            && (p.parallelism.is_some_and(|v| v < 1) || p.parallelism_per_kpu.is_some_and(|v| v < 1))
        {
            violations.push(ContractViolation::new(
                "flink_application_configuration.parallelism_configuration",
                "parallelism values must be at least 1",
            ));
        }
        if let Some(c) = &tuning.checkpoint_configuration
            && (c.checkpoint_interval.is_some_and(|v| v < 1)
                || c.min_pause_between_checkpoints.is_some_and(|v| v < 0))
        {
            violations.push(ContractViolation::new(
                "flink_application_configuration.checkpoint_configuration",
                "checkpoint interval must be positive and minimum pause non-negative",
            ));
        }
    }

    if let Some(input) = tree.input() {
        check_input(input, &mut violations);
    }

    check_outputs(tree.outputs(), &mut violations);

    if let Some(rds) = tree.reference_data_source() {
        check_schema(
            &rds.reference_schema,
            "sql_application_configuration.reference_data_source.reference_schema",
            &mut violations,
        );
    }

    violations
}

fn check_input(input: &Input, violations: &mut Vec<ContractViolation>) {
    const AREA: &str = "sql_application_configuration.input";

    let prefix = &input.name_prefix;
    if prefix.is_empty()
        || prefix.len() > 32
        || prefix
            .chars()
            .any(|c| c.is_whitespace() || matches!(c, '-' | '<' | '>' | '&'))
    {
        violations.push(ContractViolation::new(
            AREA,
            format!("invalid name prefix '{prefix}'"),
        ));
    }

    match (&input.kinesis_streams_input, &input.kinesis_firehose_input) {
        (Some(_), Some(_)) => violations.push(ContractViolation::new(
            AREA,
            "only one of [kinesis_firehose_input, kinesis_streams_input] may be set",
        )),
        (None, None) => violations.push(ContractViolation::new(
            AREA,
            "one of [kinesis_firehose_input, kinesis_streams_input] is required",
        )),
        _ => {}
    }

    if let Some(parallelism) = &input.input_parallelism
        && !(1..=64).contains(&parallelism.count)
    {
        violations.push(ContractViolation::new(
            AREA,
            format!("input parallelism {} is outside 1..=64", parallelism.count),
        ));
    }

    match &input.input_schema {
        Some(schema) => check_schema(schema, "sql_application_configuration.input.input_schema", violations),
        None => violations.push(ContractViolation::new(AREA, "input_schema is required")),
    }
}

fn check_outputs(outputs: &[Output], violations: &mut Vec<ContractViolation>) {
    const AREA: &str = "sql_application_configuration.outputs";

    if outputs.len() > MAX_OUTPUTS {
        violations.push(ContractViolation::new(
            AREA,
            format!("at most {MAX_OUTPUTS} outputs are allowed, found {}", outputs.len()),
        ));
    }

    let mut names = HashSet::new();
    for output in outputs {
        if output.name.is_empty() {
            violations.push(ContractViolation::new(AREA, "output name cannot be empty"));
        } else if !names.insert(output.name.as_str()) {
            violations.push(ContractViolation::new(
                AREA,
                format!("duplicate output name '{}'", output.name),
            ));
        }

        let sinks = [
            output.kinesis_firehose_output.is_some(),
            output.kinesis_streams_output.is_some(),
            output.lambda_output.is_some(),
        ]
        .into_iter()
        .filter(|present| *present)
        .count();
        if sinks != 1 {
            violations.push(ContractViolation::new(
                AREA,
                format!(
                    "output '{}' must set exactly one of [kinesis_firehose_output, kinesis_streams_output, lambda_output]",
                    output.name
                ),
            ));
        }
    }
}

fn check_schema(schema: &SourceSchema, area: &str, violations: &mut Vec<ContractViolation>) {
    if schema.record_columns.is_empty() {
        violations.push(ContractViolation::new(area, "at least one record column is required"));
    }
    if let Some(MappingParameters {
        csv_mapping_parameters: Some(_),
        json_mapping_parameters: Some(_),
    }) = &schema.record_format.mapping_parameters
    {
        violations.push(ContractViolation::new(
            format!("{area}.record_format.mapping_parameters"),
            "only one of [csv_mapping_parameters, json_mapping_parameters] may be set",
        ));
    }
}

/// Checks that a name only uses letters, digits, `_`, `.` and `-`.
fn is_valid_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{
        ApplicationConfiguration, ApplicationSpec, EnvironmentProperties, RecordColumn,
        RemoteConfig, ResourceArn, SqlApplicationConfiguration, StateConfig, TimeoutConfig,
    };

    fn manifest(tree: ApplicationTree) -> DeployManifest {
        DeployManifest {
            application: ApplicationSpec {
                name: "app".to_string(),
                runtime_environment: "SQL-1_0".to_string(),
                description: None,
                tree: ApplicationTree {
                    service_execution_role: "arn:role".to_string(),
                    ..tree
                },
            },
            remote: RemoteConfig::default(),
            state: StateConfig::default(),
            timeouts: TimeoutConfig::default(),
        }
    }

    fn output(name: &str) -> Output {
        Output {
            name: name.to_string(),
            kinesis_streams_output: Some(ResourceArn::new(format!("arn:{name}"))),
            ..Default::default()
        }
    }

    fn with_sql(sql: SqlApplicationConfiguration) -> ApplicationTree {
        ApplicationTree {
            application_configuration: Some(ApplicationConfiguration {
                sql_application_configuration: Some(sql),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    #[test]
    fn test_is_valid_name() {
        assert!(is_valid_name("ticker_analytics.v2-prod"));
        assert!(!is_valid_name("has space"));
        assert!(!is_valid_name(""));
    }

    #[test]
    fn test_valid_manifest() {
        let result = ConfigValidator::new().validate(&manifest(with_sql(SqlApplicationConfiguration {
            outputs: vec![output("A"), output("B")],
            ..Default::default()
        })));
        assert!(result.is_ok());
    }

    #[test]
    fn test_too_many_outputs_is_contract_violation() {
        let tree = with_sql(SqlApplicationConfiguration {
            outputs: vec![output("A"), output("B"), output("C"), output("D")],
            ..Default::default()
        });

        let err = ConfigValidator::new().validate(&manifest(tree)).unwrap_err();
        assert!(matches!(err, KdaError::Contract(ref v) if v.area.ends_with("outputs")));
    }

    #[test]
    fn test_sql_conflicts_with_property_groups() {
        let mut tree = with_sql(SqlApplicationConfiguration::default());
        if let Some(config) = tree.application_configuration.as_mut() {
            config.environment_properties = Some(EnvironmentProperties::default());
        }

        let violations = contract_violations(&tree);
        assert_eq!(violations.len(), 1);
        assert!(violations[0].message.contains("environment_properties"));
    }

    #[test]
    fn test_input_requires_single_source() {
        let tree = with_sql(SqlApplicationConfiguration {
            input: Some(Input {
                name_prefix: "SOURCE".to_string(),
                input_schema: Some(SourceSchema {
                    record_columns: vec![RecordColumn {
                        name: "c".to_string(),
                        sql_type: "INT".to_string(),
                        mapping: None,
                    }],
                    ..Default::default()
                }),
                ..Default::default()
            }),
            ..Default::default()
        });

        let violations = contract_violations(&tree);
        assert!(violations.iter().any(|v| v.message.contains("is required")));
    }

    #[test]
    fn test_empty_name_is_config_error() {
        let mut m = manifest(ApplicationTree::default());
        m.application.name = String::new();

        let err = ConfigValidator::new().validate(&m).unwrap_err();
        assert!(matches!(err, KdaError::Config(ConfigError::ValidationError { .. })));
    }
}
