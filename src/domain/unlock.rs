//! Dependency resolver for checklist tasks.
//!
//! Pure functions over the completed-id set; safe to call redundantly on
//! every recomputation pass. Acyclicity and prerequisite existence are
//! enforced at catalog load, not here.

use std::collections::HashSet;

/// True iff every prerequisite id is present in the completed set.
/// A task with no prerequisites is always unlocked.
pub fn prereqs_satisfied(depends_on: &[String], completed: &HashSet<String>) -> bool {
    depends_on.iter().all(|dep| completed.contains(dep))
}
