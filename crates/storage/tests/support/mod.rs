#![forbid(unsafe_code)]
#![allow(dead_code)]

use rusqlite::types::ToSql;
use rusqlite::{Connection, params_from_iter};
use sf_storage::{DB_FILE_NAME, SqliteStore, StoreSettings};
use std::path::PathBuf;

pub(crate) const NARRATIVE_TABLES: &[&str] = &[
    "characters",
    "chapters",
    "scenes",
    "scene_variants",
    "scene_choices",
    "scene_images",
    "chronicle_entries",
    "character_relationships",
    "character_memories",
];

pub(crate) fn temp_dir(test_name: &str) -> PathBuf {
    let base = std::env::temp_dir();
    let pid = std::process::id();
    let nonce = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let dir = base.join(format!("sf_storage_{test_name}_{pid}_{nonce}"));
    std::fs::create_dir_all(&dir).expect("create temp dir");
    dir
}

/// A store plus a second raw connection used to seed and inspect rows.
pub(crate) struct Fixture {
    pub(crate) store: SqliteStore,
    pub(crate) db: Connection,
    pub(crate) dir: PathBuf,
}

impl Fixture {
    pub(crate) fn open(test_name: &str) -> Self {
        Self::open_with(test_name, StoreSettings::default())
    }

    pub(crate) fn open_with(test_name: &str, settings: StoreSettings) -> Self {
        let dir = temp_dir(test_name);
        let store = SqliteStore::open_with(&dir, settings).expect("open store");
        let db = Connection::open(dir.join(DB_FILE_NAME)).expect("open db");
        db.execute_batch("PRAGMA foreign_keys = ON;")
            .expect("enable foreign keys");
        Self { store, db, dir }
    }

    pub(crate) fn insert(&self, table: &str, values: &[(&str, &dyn ToSql)]) -> i64 {
        let columns = values
            .iter()
            .map(|(name, _)| *name)
            .collect::<Vec<_>>()
            .join(", ");
        let placeholders = vec!["?"; values.len()].join(", ");
        self.db
            .execute(
                &format!("INSERT INTO {table} ({columns}) VALUES ({placeholders})"),
                params_from_iter(values.iter().map(|(_, value)| *value)),
            )
            .unwrap_or_else(|err| panic!("insert into {table}: {err}"));
        self.db.last_insert_rowid()
    }

    pub(crate) fn story(&self, title: &str) -> i64 {
        self.insert("stories", &[("title", &title)])
    }

    pub(crate) fn branch(&self, story_id: i64, name: &str) -> i64 {
        self.insert("story_branches", &[("story_id", &story_id), ("name", &name)])
    }

    pub(crate) fn count(&self, table: &str) -> i64 {
        self.scalar(&format!("SELECT COUNT(*) FROM {table}"))
    }

    pub(crate) fn count_in_branch(&self, table: &str, branch_id: i64) -> i64 {
        self.db
            .query_row(
                &format!("SELECT COUNT(*) FROM {table} WHERE branch_id = ?1"),
                [branch_id],
                |row| row.get(0),
            )
            .expect("count rows")
    }

    pub(crate) fn scalar(&self, sql: &str) -> i64 {
        self.db
            .query_row(sql, [], |row| row.get(0))
            .unwrap_or_else(|err| panic!("{sql}: {err}"))
    }

    pub(crate) fn int(&self, table: &str, column: &str, id: i64) -> Option<i64> {
        self.db
            .query_row(
                &format!("SELECT {column} FROM {table} WHERE id = ?1"),
                [id],
                |row| row.get(0),
            )
            .unwrap_or_else(|err| panic!("{table}.{column}#{id}: {err}"))
    }

    pub(crate) fn text(&self, table: &str, column: &str, id: i64) -> Option<String> {
        self.db
            .query_row(
                &format!("SELECT {column} FROM {table} WHERE id = ?1"),
                [id],
                |row| row.get(0),
            )
            .unwrap_or_else(|err| panic!("{table}.{column}#{id}: {err}"))
    }

    pub(crate) fn ids(&self, sql: &str, param: i64) -> Vec<i64> {
        let mut stmt = self.db.prepare(sql).expect("prepare");
        stmt.query_map([param], |row| row.get::<_, i64>(0))
            .expect("query")
            .collect::<Result<Vec<_>, _>>()
            .expect("collect")
    }

    /// Rows of every narrative table that belong to some branch.
    pub(crate) fn branch_scoped_rows(&self) -> i64 {
        let scoped = [
            "characters",
            "chapters",
            "scenes",
            "chronicle_entries",
            "character_relationships",
            "character_memories",
        ];
        scoped
            .iter()
            .map(|table| self.scalar(&format!("SELECT COUNT(*) FROM {table} WHERE branch_id IS NOT NULL")))
            .sum()
    }

    pub(crate) fn table_counts(&self) -> Vec<(String, i64)> {
        NARRATIVE_TABLES
            .iter()
            .map(|table| (table.to_string(), self.count(table)))
            .collect()
    }
}

/// Source ids of the seeded story.
pub(crate) struct SeededStory {
    pub(crate) story: i64,
    pub(crate) alice: i64,
    pub(crate) bob: i64,
    pub(crate) cara: i64,
    pub(crate) chapters: [i64; 3],
    pub(crate) scenes: [i64; 5],
    pub(crate) choices: [i64; 3],
    pub(crate) variants: [i64; 3],
    pub(crate) image: i64,
    pub(crate) chronicle: [i64; 3],
    pub(crate) relationships: [i64; 2],
    pub(crate) memories: [i64; 2],
}

/// Three chapters, five scenes (seq 1..=5) chained by parent pointers, and
/// the dependents hanging off them. `branch` scopes every branch-scoped row.
pub(crate) fn seed_story(fx: &Fixture, branch: Option<i64>) -> SeededStory {
    let story = match branch {
        Some(branch_id) => fx.scalar(&format!(
            "SELECT story_id FROM story_branches WHERE id = {branch_id}"
        )),
        None => fx.story("The Lighthouse"),
    };

    let character = |name: &str| {
        fx.insert(
            "characters",
            &[("story_id", &story), ("branch_id", &branch), ("name", &name)],
        )
    };
    let alice = character("Alice");
    let bob = character("Bob");
    let cara = character("Cara");

    let chapter = |number: i64| {
        fx.insert(
            "chapters",
            &[
                ("story_id", &story),
                ("branch_id", &branch),
                ("chapter_number", &number),
                ("title", &format!("Chapter {number}")),
            ],
        )
    };
    let chapters = [chapter(1), chapter(2), chapter(3)];

    let scene = |chapter_id: i64, seq: i64, parent: Option<i64>| {
        fx.insert(
            "scenes",
            &[
                ("story_id", &story),
                ("branch_id", &branch),
                ("chapter_id", &chapter_id),
                ("parent_scene_id", &parent),
                ("sequence_number", &seq),
                ("content", &format!("scene {seq}")),
            ],
        )
    };
    let s1 = scene(chapters[0], 1, None);
    let s2 = scene(chapters[0], 2, Some(s1));
    let s3 = scene(chapters[1], 3, Some(s2));
    let s4 = scene(chapters[2], 4, Some(s3));
    let s5 = scene(chapters[2], 5, Some(s4));
    let scenes = [s1, s2, s3, s4, s5];

    let choice = |scene_id: i64, text: &str, leads_to: i64| {
        fx.insert(
            "scene_choices",
            &[
                ("scene_id", &scene_id),
                ("choice_text", &text),
                ("leads_to_scene_id", &leads_to),
            ],
        )
    };
    let choices = [
        choice(s1, "open the door", s2),
        choice(s2, "jump ahead", s5),
        choice(s3, "remember the start", s1),
    ];

    let variant = |scene_id: i64, number: i64| {
        fx.insert(
            "scene_variants",
            &[
                ("scene_id", &scene_id),
                ("variant_number", &number),
                ("content", &format!("variant {number}")),
            ],
        )
    };
    let variants = [variant(s1, 1), variant(s1, 2), variant(s4, 1)];

    let image = fx.insert(
        "scene_images",
        &[("scene_id", &s2), ("image_path", &"img/s2.png")],
    );

    let chronicle = |scene_id: i64, seq: i64, embedding: Option<&str>| {
        fx.insert(
            "chronicle_entries",
            &[
                ("story_id", &story),
                ("branch_id", &branch),
                ("scene_id", &scene_id),
                ("sequence_number", &seq),
                ("entry_type", &"event"),
                ("content", &format!("entry {seq}")),
                ("embedding_id", &embedding),
                ("is_summarized", &1i64),
            ],
        )
    };
    let chronicle = [
        chronicle(s1, 1, Some("emb-1")),
        chronicle(s3, 3, None),
        chronicle(s5, 5, Some("emb-5")),
    ];

    let relationship = |a: i64, b: i64, seq: i64| {
        fx.insert(
            "character_relationships",
            &[
                ("story_id", &story),
                ("branch_id", &branch),
                ("character_a_id", &a),
                ("character_b_id", &b),
                ("relationship_type", &"ally"),
                ("established_sequence", &seq),
            ],
        )
    };
    let relationships = [relationship(alice, bob, 1), relationship(bob, cara, 4)];

    let memory = |character_id: i64, scene_id: i64, seq: i64, embedding: &str| {
        fx.insert(
            "character_memories",
            &[
                ("story_id", &story),
                ("branch_id", &branch),
                ("character_id", &character_id),
                ("scene_id", &scene_id),
                ("sequence_number", &seq),
                ("content", &format!("memory {seq}")),
                ("embedding_id", &embedding),
            ],
        )
    };
    let memories = [memory(alice, s2, 2, "mem-2"), memory(cara, s5, 5, "mem-5")];

    SeededStory {
        story,
        alice,
        bob,
        cara,
        chapters,
        scenes,
        choices,
        variants,
        image,
        chronicle,
        relationships,
        memories,
    }
}
