#![forbid(unsafe_code)]

use super::*;
use sf_core::SchemaRegistry;

/// Tables carrying `branch_column` that have no clone config, sorted by name.
/// An empty list means every branch-scoped table will be forked.
pub fn validate_registry(
    conn: &Connection,
    registry: &SchemaRegistry,
    branch_column: &str,
) -> Result<Vec<String>, StoreError> {
    let mut missing = Vec::new();
    for table in user_tables(conn)? {
        if registry.contains_table(&table) {
            continue;
        }
        let branch_scoped = table_columns(conn, &table)?
            .iter()
            .any(|column| column.name == branch_column);
        if branch_scoped {
            missing.push(table);
        }
    }
    Ok(missing)
}

impl SqliteStore {
    pub fn validate(&self, registry: &SchemaRegistry) -> Result<Vec<String>, StoreError> {
        validate_registry(&self.conn, registry, &self.settings.branch_column)
    }

    /// Boot-time gate. In strict mode unregistered tables and unusable
    /// registrations fail startup; in lenient mode they are logged and reported.
    /// Dependency cycles are always reported, never fatal.
    pub fn startup_check(&self, registry: &SchemaRegistry) -> Result<StartupReport, StoreError> {
        let report = StartupReport {
            unregistered_tables: self.validate(registry)?,
            registry_issues: registry
                .plan_issues()
                .iter()
                .map(ToString::to_string)
                .collect(),
            dependency_cycle: registry.resolve().cyclic,
        };

        if !report.dependency_cycle.is_empty() {
            tracing::warn!(
                tables = ?report.dependency_cycle,
                "clone dependency cycle detected; forks will use priority order"
            );
        }

        match self.settings.validation {
            ValidationMode::Strict => {
                if !report.unregistered_tables.is_empty() {
                    return Err(StoreError::UnregisteredTables(report.unregistered_tables));
                }
                if !report.registry_issues.is_empty() {
                    return Err(StoreError::InvalidRegistry(report.registry_issues));
                }
            }
            ValidationMode::Lenient => {
                if !report.unregistered_tables.is_empty() {
                    tracing::warn!(
                        tables = ?report.unregistered_tables,
                        "branch-scoped tables are not registered; forks will drop their rows"
                    );
                }
                if !report.registry_issues.is_empty() {
                    tracing::warn!(
                        issues = ?report.registry_issues,
                        "clone registry has unusable rules; forks will be refused"
                    );
                }
            }
        }

        if report.is_clean() {
            tracing::info!(tables = registry.len(), "clone registry validated");
        }
        Ok(report)
    }
}
