#![forbid(unsafe_code)]

mod catalog;
mod error;
mod fork;
mod requests;
mod settings;
mod stories;
mod support;
mod validate;

pub use catalog::*;
pub use error::StoreError;
pub use requests::*;
pub use settings::*;
pub use validate::validate_registry;

use rusqlite::{Connection, ErrorCode};
use std::path::{Path, PathBuf};
use support::*;

pub const DB_FILE_NAME: &str = "storyfork.db";

#[derive(Debug)]
pub struct SqliteStore {
    conn: Connection,
    storage_dir: Option<PathBuf>,
    settings: StoreSettings,
}

impl SqliteStore {
    pub fn open(storage_dir: impl AsRef<Path>) -> Result<Self, StoreError> {
        Self::open_with(storage_dir, StoreSettings::default())
    }

    pub fn open_with(
        storage_dir: impl AsRef<Path>,
        settings: StoreSettings,
    ) -> Result<Self, StoreError> {
        let storage_dir = storage_dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&storage_dir)?;

        let conn = Connection::open(storage_dir.join(DB_FILE_NAME))?;
        Self::init(conn, Some(storage_dir), settings)
    }

    pub fn open_in_memory(settings: StoreSettings) -> Result<Self, StoreError> {
        Self::init(Connection::open_in_memory()?, None, settings)
    }

    fn init(
        conn: Connection,
        storage_dir: Option<PathBuf>,
        settings: StoreSettings,
    ) -> Result<Self, StoreError> {
        if settings.page_size == 0 {
            return Err(StoreError::InvalidInput("page size must be positive"));
        }
        conn.busy_timeout(settings.busy_timeout)?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        install_schema(&conn)?;

        tracing::debug!(
            storage_dir = ?storage_dir,
            page_size = settings.page_size,
            "story store opened"
        );

        Ok(Self {
            conn,
            storage_dir,
            settings,
        })
    }

    pub fn storage_dir(&self) -> Option<&Path> {
        self.storage_dir.as_deref()
    }

    pub fn settings(&self) -> &StoreSettings {
        &self.settings
    }

    /// Read access for tooling and tests; writes go through the store's operations.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

fn map_insert_conflict(err: rusqlite::Error) -> StoreError {
    if is_constraint_violation(&err) {
        return StoreError::BranchAlreadyExists;
    }
    StoreError::Sql(err)
}

fn is_constraint_violation(err: &rusqlite::Error) -> bool {
    match err {
        rusqlite::Error::SqliteFailure(code, message) => {
            code.code == ErrorCode::ConstraintViolation
                && message
                    .as_deref()
                    .is_some_and(|value| value.contains("UNIQUE constraint failed"))
        }
        _ => false,
    }
}

fn to_sqlite_i64(value: usize) -> Result<i64, StoreError> {
    i64::try_from(value).map_err(|_| StoreError::InvalidInput("numeric overflow"))
}
