#![forbid(unsafe_code)]

pub(super) const SQL: &str = r#"

        CREATE TABLE IF NOT EXISTS chapters (
          id INTEGER PRIMARY KEY,
          story_id INTEGER NOT NULL REFERENCES stories(id) ON DELETE CASCADE,
          branch_id INTEGER REFERENCES story_branches(id) ON DELETE CASCADE,
          chapter_number INTEGER NOT NULL,
          title TEXT NOT NULL DEFAULT '',
          summary TEXT,
          created_at INTEGER NOT NULL DEFAULT (CAST(strftime('%s','now') AS INTEGER) * 1000),
          updated_at INTEGER NOT NULL DEFAULT (CAST(strftime('%s','now') AS INTEGER) * 1000)
        );

        CREATE TABLE IF NOT EXISTS scenes (
          id INTEGER PRIMARY KEY,
          story_id INTEGER NOT NULL REFERENCES stories(id) ON DELETE CASCADE,
          branch_id INTEGER REFERENCES story_branches(id) ON DELETE CASCADE,
          chapter_id INTEGER NOT NULL REFERENCES chapters(id) ON DELETE CASCADE,
          parent_scene_id INTEGER REFERENCES scenes(id) ON DELETE SET NULL,
          sequence_number INTEGER NOT NULL,
          title TEXT NOT NULL DEFAULT '',
          content TEXT NOT NULL DEFAULT '',
          created_at INTEGER NOT NULL DEFAULT (CAST(strftime('%s','now') AS INTEGER) * 1000),
          updated_at INTEGER NOT NULL DEFAULT (CAST(strftime('%s','now') AS INTEGER) * 1000),
          CHECK(parent_scene_id IS NULL OR parent_scene_id <> id)
        );

        CREATE TABLE IF NOT EXISTS scene_variants (
          id INTEGER PRIMARY KEY,
          scene_id INTEGER NOT NULL REFERENCES scenes(id) ON DELETE CASCADE,
          variant_number INTEGER NOT NULL,
          content TEXT NOT NULL DEFAULT '',
          is_active INTEGER NOT NULL DEFAULT 0,
          created_at INTEGER NOT NULL DEFAULT (CAST(strftime('%s','now') AS INTEGER) * 1000)
        );

        -- leads_to_scene_id may point at any scene of the story, including later ones.
        CREATE TABLE IF NOT EXISTS scene_choices (
          id INTEGER PRIMARY KEY,
          scene_id INTEGER NOT NULL REFERENCES scenes(id) ON DELETE CASCADE,
          choice_text TEXT NOT NULL,
          leads_to_scene_id INTEGER REFERENCES scenes(id) ON DELETE SET NULL,
          created_at INTEGER NOT NULL DEFAULT (CAST(strftime('%s','now') AS INTEGER) * 1000)
        );

        CREATE TABLE IF NOT EXISTS scene_images (
          id INTEGER PRIMARY KEY,
          scene_id INTEGER NOT NULL REFERENCES scenes(id) ON DELETE CASCADE,
          image_path TEXT NOT NULL,
          prompt TEXT,
          created_at INTEGER NOT NULL DEFAULT (CAST(strftime('%s','now') AS INTEGER) * 1000)
        );
"#;
