//! Desired configuration source and observed snapshot persistence.
//!
//! The reconciliation core never reads files itself. A [`ConfigSource`]
//! hands it the desired manifest, keeps the snapshot of what was observed
//! after each sync, and serializes concurrent syncs with a lock.

mod local;
mod lock;
mod store;
mod types;

pub use local::{LocalConfigSource, STATE_DIR};
pub use lock::{LOCK_EXPIRY_SECS, LockInfo, generate_holder_id};
pub use store::ConfigSource;
pub use types::{HistoryEntry, MAX_HISTORY, ObservedSnapshot, SNAPSHOT_VERSION, SyncOperation};
