#![forbid(unsafe_code)]

use super::TablePlan;
use crate::store::StoreError;
use crate::store::support::{from_sql_value, to_sql_value};
use rusqlite::types::Value;
use rusqlite::{Connection, params_from_iter};
use sf_core::{FieldValue, ID_FIELD, SqlFilter, quote_ident};

/// A WHERE clause with positional parameters, built up with `AND`.
pub(super) struct Selection {
    clause: String,
    params: Vec<Value>,
}

impl Selection {
    pub(super) fn equals(column: &str, value: i64) -> Self {
        Self {
            clause: format!("{} = ?", quote_ident(column)),
            params: vec![Value::Integer(value)],
        }
    }

    pub(super) fn any_of(column: &str, values: &[i64]) -> Self {
        let placeholders = vec!["?"; values.len()].join(", ");
        Self {
            clause: format!("{} IN ({placeholders})", quote_ident(column)),
            params: values.iter().copied().map(Value::Integer).collect(),
        }
    }

    /// Rows of the source branch plus the story's unscoped rows.
    pub(super) fn and_branch(&mut self, column: &str, source_branch_id: Option<i64>) {
        let column = quote_ident(column);
        match source_branch_id {
            Some(branch_id) => {
                self.push(format!("({column} = ? OR {column} IS NULL)"), [Value::Integer(branch_id)])
            }
            None => self.push(format!("{column} IS NULL"), std::iter::empty()),
        }
    }

    pub(super) fn and(&mut self, filter: Option<&SqlFilter>) {
        if let Some(filter) = filter {
            self.push(
                format!("({})", filter.clause),
                filter.params.iter().map(to_sql_value),
            );
        }
    }

    fn push(&mut self, clause: String, params: impl IntoIterator<Item = Value>) {
        self.clause = format!("{} AND {clause}", self.clause);
        self.params.extend(params);
    }
}

pub(super) struct SourceRow {
    pub(super) id: i64,
    /// Aligned with the table's columns.
    pub(super) values: Vec<FieldValue>,
}

/// Next page of source rows with `id > after`, in id order. Rows inserted by
/// the running fork sit above the table's ceiling and are never returned.
pub(super) fn select_page(
    conn: &Connection,
    plan: &TablePlan,
    selection: &Selection,
    after: i64,
    limit: usize,
) -> Result<Vec<SourceRow>, StoreError> {
    let schema = &plan.schema;
    let id_index = schema
        .columns
        .iter()
        .position(|column| column.name == ID_FIELD)
        .ok_or_else(|| {
            StoreError::InvalidRegistry(vec![format!("{} has no column {ID_FIELD}", schema.table)])
        })?;
    let id = quote_ident(ID_FIELD);
    let sql = format!(
        "SELECT {} FROM {} WHERE {} AND {id} > ? AND {id} <= ? ORDER BY {id} LIMIT ?",
        schema.select_list(),
        quote_ident(&schema.table),
        selection.clause,
    );

    let limit = i64::try_from(limit).map_err(|_| StoreError::InvalidInput("numeric overflow"))?;
    let mut params = selection.params.clone();
    params.extend([
        Value::Integer(after),
        Value::Integer(plan.ceiling),
        Value::Integer(limit),
    ]);

    let mut stmt = conn.prepare_cached(&sql)?;
    let mut rows = stmt.query(params_from_iter(params.iter()))?;
    let mut out = Vec::new();
    while let Some(row) = rows.next()? {
        let mut values = Vec::with_capacity(schema.columns.len());
        for index in 0..schema.columns.len() {
            values.push(from_sql_value(row.get::<_, Value>(index)?));
        }
        let id = values[id_index].as_i64().ok_or(StoreError::InvalidInput(
            "source row id is not an integer",
        ))?;
        out.push(SourceRow { id, values });
    }
    Ok(out)
}
