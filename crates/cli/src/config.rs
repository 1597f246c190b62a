#![forbid(unsafe_code)]

use sf_storage::{
    StoreSettings, ValidationMode, parse_page_size, parse_timeout_ms,
};
use std::path::PathBuf;

pub(crate) const ENV_STORAGE_DIR: &str = "STORYFORK_STORAGE_DIR";
pub(crate) const ENV_LOG: &str = "STORYFORK_LOG";
const DEFAULT_STORAGE_DIR: &str = ".storyfork";

pub(crate) fn usage() -> &'static str {
    "storyfork: fork a story's narrative state into a new branch\n\n\
USAGE:\n\
  storyfork validate [--storage-dir DIR] [--lenient]\n\
  storyfork fork --story ID [--branch ID] --cutoff N --label NAME\n\
                 [--storage-dir DIR] [--page-size N] [--timeout-ms MS] [--lenient]\n\n\
ENVIRONMENT:\n\
  STORYFORK_STORAGE_DIR, STORYFORK_PAGE_SIZE, STORYFORK_FORK_TIMEOUT_MS,\n\
  STORYFORK_VALIDATION (strict|lenient), STORYFORK_BRANCH_COLUMN, STORYFORK_LOG\n\n\
NOTES:\n\
  - Flags override environment variables.\n\
  - Every command runs the registry startup check first; strict mode refuses to\n\
    continue while a branch-scoped table is unregistered.\n"
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Command {
    Validate,
    Fork {
        story_id: i64,
        branch_id: Option<i64>,
        cutoff: i64,
        label: String,
    },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct CliConfig {
    pub(crate) command: Command,
    pub(crate) storage_dir: PathBuf,
    pub(crate) settings: StoreSettings,
}

pub(crate) fn env_var(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// `args` excludes the program name; `env` resolves `STORYFORK_*` variables.
pub(crate) fn parse_args(
    args: &[String],
    env: impl Fn(&str) -> Option<String>,
) -> Result<CliConfig, String> {
    let Some(command_name) = args.first() else {
        return Err(format!("missing command\n\n{}", usage()));
    };

    let mut settings = StoreSettings::default()
        .with_overrides(&env)
        .map_err(|e| e.to_string())?;
    let mut storage_dir = env(ENV_STORAGE_DIR)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_STORAGE_DIR));
    let mut story_id: Option<i64> = None;
    let mut branch_id: Option<i64> = None;
    let mut cutoff: Option<i64> = None;
    let mut label: Option<String> = None;

    let mut i = 1usize;
    while i < args.len() {
        let a = args[i].as_str();
        match a {
            "--storage-dir" => {
                i += 1;
                let v = args.get(i).ok_or("--storage-dir requires DIR")?;
                storage_dir = PathBuf::from(v);
            }
            "--page-size" => {
                i += 1;
                let v = args.get(i).ok_or("--page-size requires N")?;
                settings.page_size = parse_page_size(v).map_err(|e| e.to_string())?;
            }
            "--timeout-ms" => {
                i += 1;
                let v = args.get(i).ok_or("--timeout-ms requires MS")?;
                settings.fork_timeout = parse_timeout_ms(v).map_err(|e| e.to_string())?;
            }
            "--lenient" => settings.validation = ValidationMode::Lenient,
            "--strict" => settings.validation = ValidationMode::Strict,
            "--story" => {
                i += 1;
                let v = args.get(i).ok_or("--story requires ID")?;
                story_id = Some(v.parse().map_err(|_| "--story must be an integer")?);
            }
            "--branch" => {
                i += 1;
                let v = args.get(i).ok_or("--branch requires ID")?;
                branch_id = Some(v.parse().map_err(|_| "--branch must be an integer")?);
            }
            "--cutoff" => {
                i += 1;
                let v = args.get(i).ok_or("--cutoff requires N")?;
                cutoff = Some(v.parse().map_err(|_| "--cutoff must be an integer")?);
            }
            "--label" => {
                i += 1;
                let v = args.get(i).ok_or("--label requires NAME")?;
                label = Some(v.to_string());
            }
            other => return Err(format!("unknown argument: {other}")),
        }
        i += 1;
    }

    let command = match command_name.as_str() {
        "validate" => Command::Validate,
        "fork" => Command::Fork {
            story_id: story_id.ok_or("fork requires --story")?,
            branch_id,
            cutoff: cutoff.ok_or("fork requires --cutoff")?,
            label: label
                .filter(|v| !v.trim().is_empty())
                .ok_or("fork requires --label")?,
        },
        other => return Err(format!("unknown command: {other}\n\n{}", usage())),
    };

    Ok(CliConfig {
        command,
        storage_dir,
        settings,
    })
}
