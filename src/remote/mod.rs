//! Remote control-plane integration.
//!
//! - [`types`]: wire requests, responses and descriptions
//! - [`RemoteClient`]: the call surface, with an HTTP implementation
//! - [`Waiter`]: blocking on status and operation completion

mod client;
pub mod types;
mod waiter;

pub use client::{HttpRemoteClient, RemoteClient};
#[cfg(test)]
pub use waiter::MockWaiter;
pub use waiter::{DEFAULT_POLL_INTERVAL, PollingWaiter, Waiter};
