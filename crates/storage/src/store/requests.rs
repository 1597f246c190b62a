#![forbid(unsafe_code)]

use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ForkRequest {
    pub source_story_id: i64,
    /// `None` forks the story's unscoped (main) data.
    pub source_branch_id: Option<i64>,
    /// Last included sequence number.
    pub fork_cutoff: i64,
    pub target_branch_label: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ForkOutcome {
    pub branch_id: i64,
    pub source_story_id: i64,
    pub source_branch_id: Option<i64>,
    pub fork_cutoff: i64,
    /// Old id -> new id for every entity type that creates a mapping.
    pub id_maps: BTreeMap<String, BTreeMap<i64, i64>>,
    /// Rows inserted per table.
    pub rows_cloned: BTreeMap<String, usize>,
    pub deferred_resolved: usize,
    pub deferred_nulled: usize,
    pub elapsed_ms: u128,
}

impl ForkOutcome {
    pub fn new_id(&self, entity_type: &str, old_id: i64) -> Option<i64> {
        self.id_maps.get(entity_type)?.get(&old_id).copied()
    }

    pub fn cloned(&self, table: &str) -> usize {
        self.rows_cloned.get(table).copied().unwrap_or(0)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct StoryBranch {
    pub id: i64,
    pub story_id: i64,
    pub name: String,
    pub parent_branch_id: Option<i64>,
    pub fork_cutoff: Option<i64>,
    pub created_at: i64,
}

/// Result of the boot-time registry check.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct StartupReport {
    pub unregistered_tables: Vec<String>,
    pub registry_issues: Vec<String>,
    pub dependency_cycle: Vec<String>,
}

impl StartupReport {
    pub fn is_clean(&self) -> bool {
        self.unregistered_tables.is_empty()
            && self.registry_issues.is_empty()
            && self.dependency_cycle.is_empty()
    }
}
