#![forbid(unsafe_code)]

pub(super) const SQL: &str = r#"

        CREATE TABLE IF NOT EXISTS chronicle_entries (
          id INTEGER PRIMARY KEY,
          story_id INTEGER NOT NULL REFERENCES stories(id) ON DELETE CASCADE,
          branch_id INTEGER REFERENCES story_branches(id) ON DELETE CASCADE,
          scene_id INTEGER REFERENCES scenes(id) ON DELETE SET NULL,
          sequence_number INTEGER NOT NULL,
          entry_type TEXT NOT NULL,
          content TEXT NOT NULL,
          embedding_id TEXT,
          is_summarized INTEGER NOT NULL DEFAULT 0,
          created_at INTEGER NOT NULL DEFAULT (CAST(strftime('%s','now') AS INTEGER) * 1000),
          updated_at INTEGER NOT NULL DEFAULT (CAST(strftime('%s','now') AS INTEGER) * 1000)
        );
"#;
