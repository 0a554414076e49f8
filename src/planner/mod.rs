//! Planning module for reconciliation operations.
//!
//! This module compares observed and desired configuration trees, turns
//! the differences into an ordered operation plan, and applies that plan
//! one versioned call at a time.

mod diff;
mod executor;
mod outputs;
mod plan;

pub use diff::{Area, AreaChange, ConfigDiff, DiffEngine, OperationKind};
pub use executor::{ExecutionResult, OperationResult, PlanExecutor};
pub use outputs::{OutputChanges, reconcile_outputs};
pub use plan::{ApplicationUpdate, OperationPlan, PlannedOperation, RemoteCall};
