#![forbid(unsafe_code)]

use super::select::SourceRow;
use super::{ForkRun, ParentLink, PendingRef, TablePlan};
use crate::store::StoreError;
use crate::store::support::{ColumnInfo, to_sql_value};
use rusqlite::types::Value;
use rusqlite::{Connection, params, params_from_iter};
use sf_core::{CloneConfig, FieldValue, ID_FIELD, STORY_FIELD, quote_ident};

impl<'a> ForkRun<'a> {
    /// Inserts the clone of one source row, then its nested children.
    pub(super) fn clone_row(
        &mut self,
        config: &'a CloneConfig,
        plan: &TablePlan,
        row: &SourceRow,
        parent: Option<ParentLink<'a>>,
    ) -> Result<i64, StoreError> {
        let table = config.table_name.as_str();
        let mut columns = Vec::with_capacity(plan.schema.columns.len());
        let mut values = Vec::with_capacity(plan.schema.columns.len());
        let mut pending_parent = None;
        let mut deferred = Vec::new();

        for (index, column) in plan.schema.columns.iter().enumerate() {
            let name = column.name.as_str();
            let reset = config.reset_fields.get(name);
            if reset.is_none() && (column.primary_key || config.is_skipped(name)) {
                continue;
            }
            let old = &row.values[index];
            let mut value = old.clone();

            if config.self_ref_fk.as_deref() == Some(name) {
                value = self.remap(config, row.id, column, &config.entity_type, old)?;
                if value.is_null()
                    && let FieldValue::Integer(old_parent) = old
                {
                    pending_parent = Some((name, *old_parent));
                }
            } else if let Some(target) = config.fk_remappings.get(name) {
                value = self.remap(config, row.id, column, target, old)?;
            } else if let Some(target) = config.deferred_fk_remappings.get(name)
                && let FieldValue::Integer(old_id) = old
            {
                // Copied through for now; the deferred pass rewrites it.
                deferred.push((name, target.as_str(), *old_id, column.not_null));
            }

            if let Some(handler) = config.special_handlers.get(name) {
                value = handler(old, self.branch_id);
            }
            if config.has_story_scope && name == STORY_FIELD {
                value = FieldValue::Integer(self.scope.story_id);
            }
            if config.has_branch_scope && name == self.branch_column {
                value = FieldValue::Integer(self.branch_id);
            }
            if let Some(link) = parent
                && link.field == name
            {
                value = FieldValue::Integer(link.new_id);
            }
            if let Some(reset) = reset {
                value = reset.clone();
            }

            columns.push(quote_ident(name));
            values.push(to_sql_value(&value));
        }

        let new_id = insert_row(self.conn, table, &columns, &values)?;
        self.id_maps.record(&config.entity_type, row.id, new_id);
        *self.rows_cloned.entry(table.to_string()).or_default() += 1;

        if let Some((field, old_parent)) = pending_parent {
            self.self_refs.push(PendingRef {
                table: table.to_string(),
                source_id: row.id,
                new_id,
                field: field.to_string(),
                target: config.entity_type.clone(),
                old_value: old_parent,
                not_null: false,
            });
        }
        for (field, target, old_value, not_null) in deferred {
            self.deferred.push(PendingRef {
                table: table.to_string(),
                source_id: row.id,
                new_id,
                field: field.to_string(),
                target: target.to_string(),
                old_value,
                not_null,
            });
        }

        self.clone_nested(config, row.id, new_id)?;
        Ok(new_id)
    }

    /// Maps an fk value through `target`'s id map. A miss on a NOT NULL
    /// column is fatal; on a nullable column it becomes NULL.
    fn remap(
        &self,
        config: &CloneConfig,
        row_id: i64,
        column: &ColumnInfo,
        target: &str,
        old: &FieldValue,
    ) -> Result<FieldValue, StoreError> {
        let old_id = match old {
            FieldValue::Null => return Ok(FieldValue::Null),
            FieldValue::Integer(old_id) => *old_id,
            _ => return Err(unresolved(config, row_id, &column.name, target, 0)),
        };
        match self.id_maps.resolve(target, old_id) {
            Some(new_id) => Ok(FieldValue::Integer(new_id)),
            None if column.not_null => Err(unresolved(config, row_id, &column.name, target, old_id)),
            None => Ok(FieldValue::Null),
        }
    }
}

fn unresolved(
    config: &CloneConfig,
    row_id: i64,
    field: &str,
    target: &str,
    old_value: i64,
) -> StoreError {
    StoreError::ReferentialResolution {
        table: config.table_name.clone(),
        row_id,
        field: field.to_string(),
        target: target.to_string(),
        old_value,
    }
}

fn insert_row(
    conn: &Connection,
    table: &str,
    columns: &[String],
    values: &[Value],
) -> Result<i64, StoreError> {
    let sql = if columns.is_empty() {
        format!("INSERT INTO {} DEFAULT VALUES", quote_ident(table))
    } else {
        format!(
            "INSERT INTO {} ({}) VALUES ({})",
            quote_ident(table),
            columns.join(", "),
            vec!["?"; columns.len()].join(", ")
        )
    };
    conn.prepare_cached(&sql)?
        .execute(params_from_iter(values.iter()))?;
    Ok(conn.last_insert_rowid())
}

pub(super) fn update_field(
    conn: &Connection,
    table: &str,
    field: &str,
    id: i64,
    value: Option<i64>,
) -> Result<(), StoreError> {
    let sql = format!(
        "UPDATE {} SET {} = ?1 WHERE {} = ?2",
        quote_ident(table),
        quote_ident(field),
        quote_ident(ID_FIELD)
    );
    conn.prepare_cached(&sql)?.execute(params![value, id])?;
    Ok(())
}
