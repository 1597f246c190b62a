#![forbid(unsafe_code)]

pub(super) const SQL: &str = r#"

        CREATE TABLE IF NOT EXISTS characters (
          id INTEGER PRIMARY KEY,
          story_id INTEGER NOT NULL REFERENCES stories(id) ON DELETE CASCADE,
          branch_id INTEGER REFERENCES story_branches(id) ON DELETE CASCADE,
          name TEXT NOT NULL,
          description TEXT,
          created_at INTEGER NOT NULL DEFAULT (CAST(strftime('%s','now') AS INTEGER) * 1000),
          updated_at INTEGER NOT NULL DEFAULT (CAST(strftime('%s','now') AS INTEGER) * 1000)
        );

        CREATE TABLE IF NOT EXISTS character_relationships (
          id INTEGER PRIMARY KEY,
          story_id INTEGER NOT NULL REFERENCES stories(id) ON DELETE CASCADE,
          branch_id INTEGER REFERENCES story_branches(id) ON DELETE CASCADE,
          character_a_id INTEGER NOT NULL REFERENCES characters(id) ON DELETE CASCADE,
          character_b_id INTEGER NOT NULL REFERENCES characters(id) ON DELETE CASCADE,
          relationship_type TEXT NOT NULL,
          strength INTEGER NOT NULL DEFAULT 0,
          established_sequence INTEGER NOT NULL,
          created_at INTEGER NOT NULL DEFAULT (CAST(strftime('%s','now') AS INTEGER) * 1000),
          updated_at INTEGER NOT NULL DEFAULT (CAST(strftime('%s','now') AS INTEGER) * 1000),
          CHECK(character_a_id <> character_b_id)
        );

        CREATE TABLE IF NOT EXISTS character_memories (
          id INTEGER PRIMARY KEY,
          story_id INTEGER NOT NULL REFERENCES stories(id) ON DELETE CASCADE,
          branch_id INTEGER REFERENCES story_branches(id) ON DELETE CASCADE,
          character_id INTEGER NOT NULL REFERENCES characters(id) ON DELETE CASCADE,
          scene_id INTEGER REFERENCES scenes(id) ON DELETE SET NULL,
          sequence_number INTEGER NOT NULL,
          content TEXT NOT NULL,
          embedding_id TEXT,
          created_at INTEGER NOT NULL DEFAULT (CAST(strftime('%s','now') AS INTEGER) * 1000)
        );
"#;
