#![forbid(unsafe_code)]

mod config;

use config::{CliConfig, Command, ENV_LOG, env_var, parse_args, usage};
use sf_storage::{ForkRequest, SqliteStore, StoreError, story_catalog};
use tracing_subscriber::EnvFilter;

fn init_logging() {
    let filter = env_var(ENV_LOG)
        .and_then(|v| EnvFilter::try_new(v).ok())
        .unwrap_or_else(|| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cfg: CliConfig) -> Result<String, StoreError> {
    let registry = story_catalog();
    tracing::debug!(
        storage_dir = %cfg.storage_dir.display(),
        validation = cfg.settings.validation.as_str(),
        tables = registry.len(),
        "storyfork starting"
    );
    let mut store = SqliteStore::open_with(&cfg.storage_dir, cfg.settings)?;
    let report = store.startup_check(&registry)?;

    match cfg.command {
        Command::Validate => {
            Ok(serde_json::to_string_pretty(&report)
                .unwrap_or_else(|err| format!("json encoding failed: {err}")))
        }
        Command::Fork {
            story_id,
            branch_id,
            cutoff,
            label,
        } => {
            let outcome = store.fork(
                &registry,
                ForkRequest {
                    source_story_id: story_id,
                    source_branch_id: branch_id,
                    fork_cutoff: cutoff,
                    target_branch_label: label,
                },
            )?;
            Ok(serde_json::to_string_pretty(&outcome)
                .unwrap_or_else(|err| format!("json encoding failed: {err}")))
        }
    }
}

fn main() {
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    if args.iter().any(|a| a == "-h" || a == "--help") {
        print!("{}", usage());
        return;
    }

    init_logging();

    let cfg = parse_args(&args, env_var).unwrap_or_else(|e| {
        eprintln!("{e}");
        std::process::exit(2);
    });
    let is_fork = matches!(cfg.command, Command::Fork { .. });

    match run(cfg) {
        Ok(json) => println!("{json}"),
        Err(err) => {
            if is_fork {
                eprintln!("{}", err.user_message());
            } else {
                eprintln!("{err}");
            }
            std::process::exit(1);
        }
    }
}
