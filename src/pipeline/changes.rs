//! Database change detection.

use crate::models::Database;

/// Whether anything in the database differs between two states.
///
/// Compares every key path and every snapshot field. When this returns
/// false the run must not write, commit, push or notify.
pub fn has_changed(before: &Database, after: &Database) -> bool {
    before != after
}
