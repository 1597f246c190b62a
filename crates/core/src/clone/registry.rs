#![forbid(unsafe_code)]

use super::config::CloneConfig;
use super::order::{CycleError, OrderResolution, resolve_order};
use std::collections::{BTreeMap, BTreeSet};

/// Static reference problems that would make a fork read an unusable id map.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RegistryIssue {
    UnknownTarget {
        table: String,
        field: String,
        target: String,
    },
    TargetWithoutMapping {
        table: String,
        field: String,
        target: String,
    },
    UnknownNested {
        table: String,
        nested: String,
    },
    MissingViaField {
        table: String,
        target: String,
    },
    NoSelectionScope {
        table: String,
    },
}

impl std::fmt::Display for RegistryIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownTarget {
                table,
                field,
                target,
            } => write!(f, "{table}.{field} remaps to unregistered entity type {target}"),
            Self::TargetWithoutMapping {
                table,
                field,
                target,
            } => write!(
                f,
                "{table}.{field} remaps to {target}, which does not create a mapping"
            ),
            Self::UnknownNested { table, nested } => {
                write!(f, "{table} nests unregistered entity type {nested}")
            }
            Self::MissingViaField { table, target } => write!(
                f,
                "{table} iterates via {target} but has no fk remapping to it"
            ),
            Self::NoSelectionScope { table } => write!(
                f,
                "{table} has no story scope, no mapping to iterate and no parent"
            ),
        }
    }
}

/// Catalog of clone rules, keyed by table name.
///
/// Built once at startup and shared read-only with every fork.
#[derive(Clone, Debug, Default)]
pub struct SchemaRegistry {
    entries: Vec<CloneConfig>,
    by_table: BTreeMap<String, usize>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds the config, or replaces the one registered for the same table
    /// (keeping its registration slot).
    pub fn register(&mut self, config: CloneConfig) {
        tracing::debug!(
            table = %config.table_name,
            entity_type = %config.entity_type,
            "clone config registered"
        );
        match self.by_table.get(&config.table_name) {
            Some(&index) => self.entries[index] = config,
            None => {
                self.by_table
                    .insert(config.table_name.clone(), self.entries.len());
                self.entries.push(config);
            }
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.by_table.clear();
    }

    pub fn get(&self, table_name: &str) -> Option<&CloneConfig> {
        self.by_table
            .get(table_name)
            .map(|index| &self.entries[*index])
    }

    pub fn get_by_entity_type(&self, entity_type: &str) -> Option<&CloneConfig> {
        self.entries
            .iter()
            .rev()
            .find(|config| config.entity_type == entity_type)
    }

    pub fn contains_table(&self, table_name: &str) -> bool {
        self.by_table.contains_key(table_name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Configs in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &CloneConfig> {
        self.entries.iter()
    }

    /// Entity types cloned inside a parent's loop rather than as a top-level pass.
    pub fn nested_entity_types(&self) -> BTreeSet<String> {
        self.entries
            .iter()
            .flat_map(|config| config.nested_entities.iter())
            .map(|nested| nested.entity_type.clone())
            .collect()
    }

    pub fn resolve(&self) -> OrderResolution {
        let configs: Vec<&CloneConfig> = self.entries.iter().collect();
        resolve_order(&configs)
    }

    /// Execution order. A dependency cycle does not block forking: the order
    /// degrades to priority-only and the cycle is logged.
    pub fn clone_order(&self) -> Vec<String> {
        let resolution = self.resolve();
        if !resolution.cyclic.is_empty() {
            tracing::warn!(
                tables = ?resolution.cyclic,
                "clone dependency cycle detected; falling back to priority order"
            );
        }
        resolution.order
    }

    pub fn clone_order_strict(&self) -> Result<Vec<String>, CycleError> {
        self.resolve().into_result()
    }

    pub fn plan_issues(&self) -> Vec<RegistryIssue> {
        let nested = self.nested_entity_types();
        let mut issues = Vec::new();

        for config in &self.entries {
            let table = &config.table_name;
            for (field, target) in config.mapping_reads() {
                self.check_target(table, field, target, &mut issues);
            }
            for child in &config.nested_entities {
                if self.get_by_entity_type(&child.entity_type).is_none() {
                    issues.push(RegistryIssue::UnknownNested {
                        table: table.clone(),
                        nested: child.entity_type.clone(),
                    });
                }
            }
            if let Some(target) = config.iterate_via_mapping.as_deref() {
                if config.via_mapping_field().is_none() {
                    issues.push(RegistryIssue::MissingViaField {
                        table: table.clone(),
                        target: target.to_string(),
                    });
                }
            } else if !config.has_story_scope && !nested.contains(&config.entity_type) {
                issues.push(RegistryIssue::NoSelectionScope {
                    table: table.clone(),
                });
            }
        }

        issues
    }

    fn check_target(
        &self,
        table: &str,
        field: &str,
        target: &str,
        issues: &mut Vec<RegistryIssue>,
    ) {
        match self.get_by_entity_type(target) {
            None => issues.push(RegistryIssue::UnknownTarget {
                table: table.to_string(),
                field: field.to_string(),
                target: target.to_string(),
            }),
            Some(config) if !config.creates_mapping => {
                issues.push(RegistryIssue::TargetWithoutMapping {
                    table: table.to_string(),
                    field: field.to_string(),
                    target: target.to_string(),
                })
            }
            Some(_) => {}
        }
    }
}
