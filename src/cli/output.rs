//! Output formatting for CLI commands.
//!
//! Every formatter returns a string in the selected format; the binary
//! decides where it goes.

use colored::Colorize;
use std::fmt::Write;
use tabled::{Table, Tabled};

use crate::config::{ConfigHasher, DeployManifest, ValidationResult};
use crate::lifecycle::LifecycleOutcome;
use crate::planner::{OperationKind, OperationPlan};
use crate::reconciler::{SyncPreview, SyncReport};
use crate::remote::types::{ApplicationDetail, ApplicationStatus};
use crate::state::ObservedSnapshot;

use super::commands::OutputFormat;

/// Output formatter for CLI.
#[derive(Debug)]
pub struct OutputFormatter {
    /// Output format.
    format: OutputFormat,
}

/// Plan operation row for table display.
#[derive(Tabled)]
struct OperationRow {
    #[tabled(rename = "#")]
    index: usize,
    #[tabled(rename = "Action")]
    action: String,
    #[tabled(rename = "Area")]
    area: String,
    #[tabled(rename = "Description")]
    description: String,
}

impl OutputFormatter {
    /// Creates a new output formatter.
    #[must_use]
    pub const fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Formats a sync preview.
    #[must_use]
    pub fn format_preview(&self, preview: &SyncPreview) -> String {
        match self.format {
            OutputFormat::Json => to_json(&preview_json(preview)),
            OutputFormat::Text => Self::format_preview_text(preview),
        }
    }

    fn format_preview_text(preview: &SyncPreview) -> String {
        match preview {
            SyncPreview::Create(request) => format!(
                "{} '{}' does not exist and will be created ({})\n",
                "+create".green(),
                request.application_name,
                request.runtime_environment
            ),
            SyncPreview::Update {
                version_id,
                status,
                plan,
                lifecycle,
            } => {
                let mut output = format!(
                    "\nCurrent version {} ({})\n",
                    version_id,
                    Self::format_status_value(*status)
                );

                if plan.is_empty() && lifecycle.is_none() {
                    let _ = writeln!(output, "{} No changes required.", "✓".green());
                    return output;
                }

                if !plan.is_empty() {
                    output.push_str(&Self::plan_table(plan));
                    output.push('\n');
                }
                if let Some(kind) = lifecycle {
                    let _ = writeln!(output, "Then: {} application", Self::format_kind(*kind));
                }
                for warning in &plan.warnings {
                    let _ = writeln!(output, "{} {warning}", "⚠".yellow());
                }
                let _ = writeln!(
                    output,
                    "\nPlan: {} to add, {} to update, {} to delete",
                    plan.count(OperationKind::Add).to_string().green(),
                    plan.count(OperationKind::Update).to_string().yellow(),
                    plan.count(OperationKind::Delete).to_string().red()
                );
                output
            }
        }
    }

    fn plan_table(plan: &OperationPlan) -> String {
        let rows: Vec<OperationRow> = plan
            .operations
            .iter()
            .enumerate()
            .map(|(i, op)| OperationRow {
                index: i + 1,
                action: Self::format_kind(op.kind),
                area: op.area.to_string(),
                description: Self::truncate(&op.description, 60),
            })
            .collect();
        Table::new(rows).to_string()
    }

    /// Formats the result of a sync.
    #[must_use]
    pub fn format_sync(&self, report: &SyncReport) -> String {
        match self.format {
            OutputFormat::Json => to_json(report),
            OutputFormat::Text => format!("{} {report}\n", "✓".green()),
        }
    }

    /// Formats a start/stop outcome.
    #[must_use]
    pub fn format_lifecycle(&self, name: &str, outcome: &LifecycleOutcome) -> String {
        match self.format {
            OutputFormat::Json => to_json(&serde_json::json!({
                "application": name,
                "outcome": outcome.to_string(),
            })),
            OutputFormat::Text => match outcome {
                LifecycleOutcome::Skipped(_) => format!("{} '{name}' {outcome}\n", "⚠".yellow()),
                _ => format!("{} '{name}' {outcome}\n", "✓".green()),
            },
        }
    }

    /// Formats the remote status next to the last snapshot.
    #[must_use]
    pub fn format_status(
        &self,
        manifest: &DeployManifest,
        detail: Option<&ApplicationDetail>,
        snapshot: Option<&ObservedSnapshot>,
    ) -> String {
        let desired_hash = ConfigHasher::new().hash_tree(&manifest.application.tree);
        let in_sync = snapshot.is_some_and(|s| ConfigHasher::hashes_match(&s.config_hash, &desired_hash));

        match self.format {
            OutputFormat::Json => to_json(&serde_json::json!({
                "application": manifest.application.name,
                "exists": detail.is_some(),
                "status": detail.map(|d| d.application_status),
                "version_id": detail.map(|d| d.application_version_id),
                "snapshot_version_id": snapshot.map(|s| s.version_id),
                "manifest_matches_snapshot": in_sync,
            })),
            OutputFormat::Text => {
                let mut output = format!("\nApplication: {}\n\n", manifest.application.name);

                match detail {
                    Some(d) => {
                        let _ = writeln!(
                            output,
                            "   Status: {}",
                            Self::format_status_value(d.application_status)
                        );
                        let _ = writeln!(output, "   Version: {}", d.application_version_id);
                        let _ = writeln!(output, "   Runtime: {}", d.runtime_environment);
                        let _ = writeln!(output, "   ARN: {}", d.application_arn);
                    }
                    None => {
                        let _ = writeln!(output, "   {}", "Not deployed".dimmed());
                    }
                }

                match snapshot {
                    Some(s) => {
                        let _ = writeln!(
                            output,
                            "\n   Snapshot: version {} at {}",
                            s.version_id,
                            s.last_updated.format("%Y-%m-%d %H:%M")
                        );
                        if let Some(d) = detail
                            && d.application_version_id != s.version_id
                        {
                            let _ = writeln!(
                                output,
                                "   {} remote version moved since the last sync",
                                "⚠".yellow()
                            );
                        }
                    }
                    None => {
                        let _ = writeln!(output, "\n   Snapshot: none");
                    }
                }

                let manifest_state = if in_sync {
                    "matches last sync".green().to_string()
                } else {
                    "changed since last sync".yellow().to_string()
                };
                let _ = writeln!(output, "   Manifest: {manifest_state}");
                output
            }
        }
    }

    /// Formats a saved snapshot.
    #[must_use]
    pub fn format_snapshot(&self, snapshot: &ObservedSnapshot) -> String {
        match self.format {
            OutputFormat::Json => to_json(snapshot),
            OutputFormat::Text => {
                let mut output = format!("\nSnapshot: {}\n\n", snapshot.application_name);

                let _ = writeln!(output, "   Format: {}", snapshot.version);
                let _ = writeln!(output, "   Version: {}", snapshot.version_id);
                let _ = writeln!(
                    output,
                    "   Status: {}",
                    Self::format_status_value(snapshot.status)
                );
                let _ = writeln!(
                    output,
                    "   Config hash: {}",
                    ConfigHasher::short_hash(&snapshot.config_hash)
                );
                let _ = writeln!(output, "   Last updated: {}", snapshot.last_updated);
                let _ = writeln!(output, "   Outputs: {}", snapshot.tree.outputs().len());

                if !snapshot.history.is_empty() {
                    let _ = writeln!(output, "\n   Recent history ({}):", snapshot.history.len());
                    for entry in snapshot.history.iter().rev().take(5) {
                        let mark = if entry.success { "✓".green() } else { "✗".red() };
                        let _ = write!(
                            output,
                            "     {mark} {} - {} at v{}",
                            entry.timestamp.format("%Y-%m-%d %H:%M"),
                            entry.operation,
                            entry.version_id
                        );
                        match &entry.error {
                            Some(error) => {
                                let _ = writeln!(output, ": {}", Self::truncate(error, 60));
                            }
                            None => {
                                let _ = writeln!(output, " ({} calls)", entry.mutations);
                            }
                        }
                    }
                }

                output
            }
        }
    }

    /// Formats a validation result.
    #[must_use]
    pub fn format_validation(
        &self,
        manifest: &DeployManifest,
        result: &ValidationResult,
        show_warnings: bool,
    ) -> String {
        match self.format {
            OutputFormat::Json => to_json(&serde_json::json!({
                "application": manifest.application.name,
                "valid": result.is_valid(),
                "errors": result
                    .errors
                    .iter()
                    .map(|e| format!("{}: {}", e.field, e.message))
                    .collect::<Vec<_>>(),
                "violations": result.violations.iter().map(ToString::to_string).collect::<Vec<_>>(),
                "warnings": result.warnings,
            })),
            OutputFormat::Text => {
                let mut output = String::new();
                if result.is_valid() {
                    let _ = writeln!(output, "{} Manifest is valid", "✓".green());
                } else {
                    let _ = writeln!(output, "{} Manifest is invalid", "✗".red());
                }

                for error in &result.errors {
                    let _ = writeln!(output, "   - {}: {}", error.field, error.message);
                }
                for violation in &result.violations {
                    let _ = writeln!(output, "   - {violation}");
                }
                if show_warnings {
                    for warning in &result.warnings {
                        let _ = writeln!(output, "   {} {warning}", "⚠".yellow());
                    }
                }

                let tree = &manifest.application.tree;
                let _ = writeln!(output, "\nManifest summary:");
                let _ = writeln!(output, "   Application: {}", manifest.application.name);
                let _ = writeln!(output, "   Runtime: {}", manifest.application.runtime_environment);
                let _ = writeln!(output, "   Input: {}", if tree.input().is_some() { "yes" } else { "no" });
                let _ = writeln!(output, "   Outputs: {}", tree.outputs().len());
                let _ = writeln!(output, "   Start: {}", tree.start_application);
                output
            }
        }
    }

    /// Formats a one-line message.
    #[must_use]
    pub fn message(&self, message: &str) -> String {
        match self.format {
            OutputFormat::Json => to_json(&serde_json::json!({ "message": message })),
            OutputFormat::Text => format!("{message}\n"),
        }
    }

    fn format_kind(kind: OperationKind) -> String {
        match kind {
            OperationKind::Add => "+add".green().to_string(),
            OperationKind::Update => "~update".yellow().to_string(),
            OperationKind::Delete => "-delete".red().to_string(),
            OperationKind::Start => "start".green().to_string(),
            OperationKind::Stop => "stop".yellow().to_string(),
        }
    }

    fn format_status_value(status: ApplicationStatus) -> String {
        let label = status.to_string();
        match status {
            ApplicationStatus::Running => label.green().to_string(),
            ApplicationStatus::Ready => label.cyan().to_string(),
            ApplicationStatus::RolledBack | ApplicationStatus::Deleting => label.red().to_string(),
            ApplicationStatus::Unknown => label.dimmed().to_string(),
            _ => label.yellow().to_string(),
        }
    }

    /// Truncates a string to at most `max_len` characters.
    fn truncate(s: &str, max_len: usize) -> String {
        if s.chars().count() <= max_len {
            s.to_string()
        } else {
            let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
            format!("{kept}...")
        }
    }
}

fn to_json<T: serde::Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_default()
}

fn preview_json(preview: &SyncPreview) -> serde_json::Value {
    match preview {
        SyncPreview::Create(request) => serde_json::json!({
            "action": "create",
            "application": request.application_name,
            "runtime_environment": request.runtime_environment,
        }),
        SyncPreview::Update {
            version_id,
            status,
            plan,
            lifecycle,
        } => serde_json::json!({
            "action": if plan.is_empty() && lifecycle.is_none() { "none" } else { "update" },
            "version_id": version_id,
            "status": status,
            "operations": plan
                .operations
                .iter()
                .map(|op| serde_json::json!({
                    "area": op.area.to_string(),
                    "kind": op.kind.to_string(),
                    "description": op.description,
                }))
                .collect::<Vec<_>>(),
            "lifecycle": lifecycle.map(|k| k.to_string()),
            "warnings": plan.warnings,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_keeps_short_strings() {
        assert_eq!(OutputFormatter::truncate("abc", 10), "abc");
        assert_eq!(OutputFormatter::truncate("abcdefghijkl", 8), "abcde...");
    }

    #[test]
    fn test_preview_json_lists_operations() {
        let preview = SyncPreview::Update {
            version_id: 3,
            status: ApplicationStatus::Running,
            plan: OperationPlan::empty(),
            lifecycle: Some(OperationKind::Stop),
        };
        let json = OutputFormatter::new(OutputFormat::Json).format_preview(&preview);
        let value: serde_json::Value = serde_json::from_str(&json).expect("json");

        assert_eq!(value["action"], "update");
        assert_eq!(value["status"], "RUNNING");
        assert_eq!(value["lifecycle"], "stop");
    }
}
