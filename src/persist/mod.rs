//! Persistence: JSON snapshots, storage-safe usernames, debug artifacts.
//!
//! The datastore proper is an external collaborator; what lives here is the
//! per-site JSON snapshot (the source of truth for freshness checks), the
//! username sanitization applied before anything reaches storage, and the
//! TTL-cleaned debug artifact directory.

pub mod debug_logs;
pub mod snapshot;
pub mod username;

pub use debug_logs::{cleanup_expired, write_debug_artifacts};
pub use snapshot::{read_snapshot, snapshot_age, write_snapshot};
pub use username::sanitize_for_storage;
