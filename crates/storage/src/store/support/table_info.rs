#![forbid(unsafe_code)]

use super::super::StoreError;
use rusqlite::Connection;
use sf_core::quote_ident;

#[derive(Clone, Debug)]
pub(in crate::store) struct ColumnInfo {
    pub(in crate::store) name: String,
    pub(in crate::store) not_null: bool,
    pub(in crate::store) primary_key: bool,
}

#[derive(Clone, Debug)]
pub(in crate::store) struct TableSchema {
    pub(in crate::store) table: String,
    pub(in crate::store) columns: Vec<ColumnInfo>,
}

impl TableSchema {
    pub(in crate::store) fn load(conn: &Connection, table: &str) -> Result<Self, StoreError> {
        let columns = table_columns(conn, table)?;
        if columns.is_empty() {
            return Err(StoreError::InvalidRegistry(vec![format!(
                "table {table} does not exist"
            )]));
        }
        Ok(Self {
            table: table.to_string(),
            columns,
        })
    }

    pub(in crate::store) fn column(&self, name: &str) -> Option<&ColumnInfo> {
        self.columns.iter().find(|column| column.name == name)
    }

    pub(in crate::store) fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    pub(in crate::store) fn select_list(&self) -> String {
        self.columns
            .iter()
            .map(|column| quote_ident(&column.name))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

pub(in crate::store) fn table_columns(
    conn: &Connection,
    table: &str,
) -> Result<Vec<ColumnInfo>, StoreError> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({})", quote_ident(table)))?;
    let mut rows = stmt.query([])?;
    let mut out = Vec::new();
    while let Some(row) = rows.next()? {
        out.push(ColumnInfo {
            name: row.get::<_, String>(1)?,
            not_null: row.get::<_, i64>(3)? != 0,
            primary_key: row.get::<_, i64>(5)? != 0,
        });
    }
    Ok(out)
}

pub(in crate::store) fn user_tables(conn: &Connection) -> Result<Vec<String>, StoreError> {
    let mut stmt = conn.prepare(
        "SELECT name FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
    )?;
    let mut rows = stmt.query([])?;
    let mut out = Vec::new();
    while let Some(row) = rows.next()? {
        out.push(row.get::<_, String>(0)?);
    }
    Ok(out)
}
