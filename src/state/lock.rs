//! Snapshot locking.
//!
//! One sync at a time may work on an application's snapshot. A lock names
//! its holder and expires on its own so a crashed process does not block
//! the next run forever.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lock lifetime in seconds.
pub const LOCK_EXPIRY_SECS: i64 = 900;

/// A held lock, as written to the lock file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LockInfo {
    /// Lock identifier, needed to release it.
    pub lock_id: String,
    /// Holder description (`host-pid-nonce`).
    pub holder: String,
    /// Application the lock protects.
    pub application: String,
    /// When the lock was taken.
    pub acquired_at: DateTime<Utc>,
    /// When the lock stops being honored.
    pub expires_at: DateTime<Utc>,
}

impl LockInfo {
    /// Creates a lock for `application` held by `holder`.
    #[must_use]
    pub fn new(holder: &str, application: &str) -> Self {
        let now = Utc::now();
        Self {
            lock_id: Uuid::new_v4().to_string(),
            holder: holder.to_string(),
            application: application.to_string(),
            acquired_at: now,
            expires_at: now + chrono::Duration::seconds(LOCK_EXPIRY_SECS),
        }
    }

    /// Returns true once the lock is past its expiry.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        Utc::now() > self.expires_at
    }

    /// Seconds until expiry, zero if already expired.
    #[must_use]
    pub fn remaining_secs(&self) -> i64 {
        (self.expires_at - Utc::now()).num_seconds().max(0)
    }
}

/// Builds a holder id for this process.
#[must_use]
pub fn generate_holder_id() -> String {
    let host = hostname::get()
        .map_or_else(|_| String::from("unknown"), |h| h.to_string_lossy().into_owned());
    let nonce = Uuid::new_v4().simple().to_string();

    format!("{host}-{}-{}", std::process::id(), &nonce[..8])
}
