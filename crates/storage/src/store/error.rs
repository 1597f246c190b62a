#![forbid(unsafe_code)]

#[derive(Debug)]
pub enum StoreError {
    Io(std::io::Error),
    Sql(rusqlite::Error),
    InvalidInput(&'static str),
    UnknownStory,
    UnknownBranch,
    BranchAlreadyExists,
    UnregisteredTables(Vec<String>),
    InvalidRegistry(Vec<String>),
    ReferentialResolution {
        table: String,
        row_id: i64,
        field: String,
        target: String,
        old_value: i64,
    },
    Timeout {
        table: String,
        elapsed_ms: u128,
    },
}

impl StoreError {
    /// Message safe to surface to the user who requested a fork.
    pub fn user_message(&self) -> String {
        format!("fork failed, no new branch was created: {self}")
    }

    /// The table a fork failure is attributed to, when there is one.
    pub fn table(&self) -> Option<&str> {
        match self {
            Self::ReferentialResolution { table, .. } | Self::Timeout { table, .. } => {
                Some(table.as_str())
            }
            _ => None,
        }
    }
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "io: {err}"),
            Self::Sql(err) => write!(f, "sqlite: {err}"),
            Self::InvalidInput(message) => write!(f, "invalid input: {message}"),
            Self::UnknownStory => write!(f, "unknown story"),
            Self::UnknownBranch => write!(f, "unknown branch"),
            Self::BranchAlreadyExists => write!(f, "branch already exists"),
            Self::UnregisteredTables(tables) => write!(
                f,
                "configuration error: unregistered branch-scoped tables: {}",
                tables.join(", ")
            ),
            Self::InvalidRegistry(problems) => {
                write!(f, "configuration error: {}", problems.join("; "))
            }
            Self::ReferentialResolution {
                table,
                row_id,
                field,
                target,
                old_value,
            } => write!(
                f,
                "unresolved reference (table={table}, row={row_id}, field={field}, target={target}, old_id={old_value})"
            ),
            Self::Timeout { table, elapsed_ms } => {
                write!(f, "fork timed out after {elapsed_ms}ms (table={table})")
            }
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Sql(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for StoreError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sql(value)
    }
}
