#![forbid(unsafe_code)]

pub(super) const SQL: &str = r#"

        CREATE TABLE IF NOT EXISTS meta (
          key TEXT PRIMARY KEY,
          value TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS stories (
          id INTEGER PRIMARY KEY,
          title TEXT NOT NULL,
          created_at INTEGER NOT NULL DEFAULT (CAST(strftime('%s','now') AS INTEGER) * 1000),
          updated_at INTEGER NOT NULL DEFAULT (CAST(strftime('%s','now') AS INTEGER) * 1000)
        );

        -- One row per fork. Main story data has no branch row (branch_id IS NULL).
        CREATE TABLE IF NOT EXISTS story_branches (
          id INTEGER PRIMARY KEY,
          story_id INTEGER NOT NULL REFERENCES stories(id) ON DELETE CASCADE,
          name TEXT NOT NULL,
          parent_branch_id INTEGER REFERENCES story_branches(id) ON DELETE SET NULL,
          fork_cutoff INTEGER,
          created_at INTEGER NOT NULL DEFAULT (CAST(strftime('%s','now') AS INTEGER) * 1000),
          UNIQUE(story_id, name)
        );
"#;
