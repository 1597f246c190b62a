#![forbid(unsafe_code)]

use super::StoreError;
use sf_core::BRANCH_FIELD;
use std::time::Duration;

pub const DEFAULT_PAGE_SIZE: usize = 500;
pub const DEFAULT_BRANCH_COLUMN: &str = BRANCH_FIELD;
const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

pub const ENV_PAGE_SIZE: &str = "STORYFORK_PAGE_SIZE";
pub const ENV_FORK_TIMEOUT_MS: &str = "STORYFORK_FORK_TIMEOUT_MS";
pub const ENV_VALIDATION: &str = "STORYFORK_VALIDATION";
pub const ENV_BRANCH_COLUMN: &str = "STORYFORK_BRANCH_COLUMN";

/// What the boot-time registry check does with unregistered tables.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum ValidationMode {
    #[default]
    Strict,
    Lenient,
}

impl std::str::FromStr for ValidationMode {
    type Err = StoreError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "strict" => Ok(Self::Strict),
            "lenient" | "warn" => Ok(Self::Lenient),
            _ => Err(StoreError::InvalidInput(
                "validation must be strict or lenient",
            )),
        }
    }
}

impl ValidationMode {

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Strict => "strict",
            Self::Lenient => "lenient",
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct StoreSettings {
    /// Source rows read per query while cloning a table.
    pub page_size: usize,
    /// Whole-fork deadline; exceeding it rolls the fork back.
    pub fork_timeout: Option<Duration>,
    pub validation: ValidationMode,
    /// Column whose presence marks a table as branch-scoped.
    pub branch_column: String,
    pub busy_timeout: Duration,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            fork_timeout: None,
            validation: ValidationMode::default(),
            branch_column: DEFAULT_BRANCH_COLUMN.to_string(),
            busy_timeout: DEFAULT_BUSY_TIMEOUT,
        }
    }
}

impl StoreSettings {
    pub fn from_env() -> Result<Self, StoreError> {
        Self::default().with_overrides(|key| std::env::var(key).ok())
    }

    /// Applies `STORYFORK_*` overrides read through `lookup`.
    pub fn with_overrides(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, StoreError> {
        if let Some(raw) = lookup(ENV_PAGE_SIZE) {
            self.page_size = parse_page_size(&raw)?;
        }
        if let Some(raw) = lookup(ENV_FORK_TIMEOUT_MS) {
            self.fork_timeout = parse_timeout_ms(&raw)?;
        }
        if let Some(raw) = lookup(ENV_VALIDATION) {
            self.validation = raw.parse()?;
        }
        if let Some(raw) = lookup(ENV_BRANCH_COLUMN) {
            let raw = raw.trim();
            if raw.is_empty() {
                return Err(StoreError::InvalidInput("branch column must not be empty"));
            }
            self.branch_column = raw.to_string();
        }
        Ok(self)
    }
}

pub fn parse_page_size(raw: &str) -> Result<usize, StoreError> {
    match raw.trim().parse::<usize>() {
        Ok(0) | Err(_) => Err(StoreError::InvalidInput(
            "page size must be a positive integer",
        )),
        Ok(value) => Ok(value),
    }
}

/// `0` disables the deadline.
pub fn parse_timeout_ms(raw: &str) -> Result<Option<Duration>, StoreError> {
    match raw.trim().parse::<u64>() {
        Ok(0) => Ok(None),
        Ok(ms) => Ok(Some(Duration::from_millis(ms))),
        Err(_) => Err(StoreError::InvalidInput(
            "fork timeout must be a number of milliseconds",
        )),
    }
}
