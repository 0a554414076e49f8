// ============================================================================
// Strict linting - Dangerous or non-idiomatic practices are forbidden
// ============================================================================

#![deny(unsafe_code)]                 // Unsafe code is forbidden
#![deny(missing_docs)]                // All public items must be documented
#![warn(dead_code)]                   // Unused code is flagged
#![deny(non_camel_case_types)]        // Types must follow CamelCase convention

// Additional strictness - Leave nothing unchecked
#![warn(unused_imports)]              // Unused imports are flagged
#![warn(unused_variables)]            // Unused variables are flagged
#![deny(unused_must_use)]             // Must handle Result and Option explicitly
#![deny(non_snake_case)]              // Variables and functions must be snake_case
#![deny(non_upper_case_globals)]      // Constants must be UPPER_CASE
#![deny(nonstandard_style)]           // Non-standard code style is forbidden
#![forbid(unsafe_op_in_unsafe_fn)]    // Unsafe ops in unsafe fns are forbidden

// Clippy lints (warnings only)
#![warn(clippy::all)]                 // All standard Clippy lints
#![warn(clippy::pedantic)]            // Very strict Clippy lints
#![warn(clippy::nursery)]             // Experimental lints
#![warn(clippy::unwrap_used)]         // unwrap() warning
#![warn(clippy::expect_used)]         // expect() warning
#![warn(clippy::panic)]               // panic!() warning
#![warn(clippy::print_stdout)]        // println!() warning
#![warn(clippy::todo)]                // TODO warning
#![warn(clippy::unimplemented)]       // unimplemented!() warning
#![warn(clippy::missing_const_for_fn)] // Force const when possible
#![warn(clippy::unwrap_in_result)]    // unwrap() in Result warning
#![warn(clippy::module_inception)]    // Module with same name as crate warning
#![warn(clippy::redundant_clone)]     // Useless clones warning
#![warn(clippy::shadow_unrelated)]    // Shadowing unrelated variables warning
#![warn(clippy::too_many_arguments)]  // Limit function arguments
#![warn(clippy::cognitive_complexity)] // Limit cognitive complexity

// Safety and robustness lints
#![deny(overflowing_literals)]        // Overflowing literals are forbidden
#![deny(arithmetic_overflow)]         // Arithmetic overflow is forbidden

// ============================================================================
// Crate Documentation
// ============================================================================

//! # KDA Reconciler
//!
//! A declarative reconciliation engine for remote, versioned
//! streaming-analytics applications.
//!
//! ## Overview
//!
//! The remote control plane exposes one application as a versioned resource:
//! every mutating call names the version it is based on and returns the next
//! one. This crate converges such an application from what was observed to
//! what is desired:
//!
//! - Compute an explicit diff between the two configuration trees
//! - Turn the diff into an ordered plan of remote calls, rejecting changes
//!   the remote system cannot express before anything is sent
//! - Apply the plan one call at a time, threading the version through
//! - Start or stop the application once its configuration has converged
//!
//! ## Architecture
//!
//! 1. **Desired state**: a `kda.deploy.yaml` manifest
//! 2. **Observed state**: the application description, flattened to a tree
//! 3. **Reconciler**: diff, plan, execute, then lifecycle
//! 4. **Snapshot**: what was observed after the last sync, kept locally
//!
//! ## Modules
//!
//! - [`config`]: Configuration tree, manifest parsing and validation
//! - [`mapper`]: Tree to wire payloads and back
//! - [`planner`]: Diff, set reconciliation, operation plans and execution
//! - [`version`]: Version threading across calls
//! - [`lifecycle`]: Start and stop
//! - [`remote`]: Control-plane client and convergence waits
//! - [`reconciler`]: Entry points and the full sync flow
//! - [`state`]: Config source, snapshots and locking
//! - [`cli`]: Command-line interface
//!
//! ## Example
//!
//! ```yaml
//! application:
//!   name: ticker-analytics
//!   runtime_environment: SQL-1_0
//!   service_execution_role: arn:aws:iam::123456789012:role/analytics
//!   start_application: true
//!   application_configuration:
//!     sql_application_configuration:
//!       outputs:
//!         - name: DESTINATION_SQL_STREAM
//!           destination_schema:
//!             record_format_type: JSON
//!           kinesis_streams_output:
//!             resource_arn: arn:aws:kinesis:us-east-1:123456789012:stream/out
//! ```

// ============================================================================
// Modules
// ============================================================================

pub mod cli;
pub mod config;
pub mod error;
pub mod lifecycle;
pub mod mapper;
pub mod planner;
pub mod reconciler;
pub mod remote;
pub mod state;
pub mod version;

#[cfg(test)]
pub(crate) mod testing;

// ============================================================================
// Re-exports
// ============================================================================

pub use cli::{Cli, Commands, OutputFormatter};
pub use config::{ApplicationTree, ConfigHasher, ConfigParser, ConfigValidator, DeployManifest};
pub use error::{KdaError, Result};
pub use lifecycle::{LifecycleController, LifecycleOutcome};
pub use planner::{DiffEngine, OperationPlan, PlanExecutor};
pub use reconciler::{Reconciler, SyncPreview, SyncReport};
pub use remote::{HttpRemoteClient, PollingWaiter, RemoteClient, Waiter};
pub use state::{ConfigSource, LocalConfigSource, ObservedSnapshot};
pub use version::VersionedHandle;
