#![forbid(unsafe_code)]

use super::*;
use rusqlite::{OptionalExtension, Transaction, params};

impl SqliteStore {
    pub fn story_create(&mut self, title: &str) -> Result<i64, StoreError> {
        if title.trim().is_empty() {
            return Err(StoreError::InvalidInput("title must not be empty"));
        }
        let now_ms = now_ms();
        self.conn.execute(
            "INSERT INTO stories(title, created_at, updated_at) VALUES (?1, ?2, ?2)",
            params![title.trim(), now_ms],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn branch_get(&self, branch_id: i64) -> Result<Option<StoryBranch>, StoreError> {
        Ok(self
            .conn
            .query_row(
                "SELECT id, story_id, name, parent_branch_id, fork_cutoff, created_at \
                 FROM story_branches WHERE id=?1",
                params![branch_id],
                read_branch,
            )
            .optional()?)
    }

    pub fn branches_list(
        &self,
        story_id: i64,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<StoryBranch>, StoreError> {
        let limit = to_sqlite_i64(limit)?;
        let offset = to_sqlite_i64(offset)?;

        let mut stmt = self.conn.prepare(
            "SELECT id, story_id, name, parent_branch_id, fork_cutoff, created_at \
             FROM story_branches \
             WHERE story_id=?1 \
             ORDER BY id ASC \
             LIMIT ?2 OFFSET ?3",
        )?;
        let mut rows = stmt.query(params![story_id, limit, offset])?;
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            out.push(read_branch(row)?);
        }
        Ok(out)
    }
}

fn read_branch(row: &rusqlite::Row<'_>) -> rusqlite::Result<StoryBranch> {
    Ok(StoryBranch {
        id: row.get(0)?,
        story_id: row.get(1)?,
        name: row.get(2)?,
        parent_branch_id: row.get(3)?,
        fork_cutoff: row.get(4)?,
        created_at: row.get(5)?,
    })
}

pub(super) fn ensure_story_tx(tx: &Transaction<'_>, story_id: i64) -> Result<(), StoreError> {
    let exists = tx
        .query_row(
            "SELECT 1 FROM stories WHERE id=?1",
            params![story_id],
            |row| row.get::<_, i64>(0),
        )
        .optional()?
        .is_some();
    if exists {
        Ok(())
    } else {
        Err(StoreError::UnknownStory)
    }
}

pub(super) fn ensure_branch_in_story_tx(
    tx: &Transaction<'_>,
    story_id: i64,
    branch_id: i64,
) -> Result<(), StoreError> {
    let exists = tx
        .query_row(
            "SELECT 1 FROM story_branches WHERE id=?1 AND story_id=?2",
            params![branch_id, story_id],
            |row| row.get::<_, i64>(0),
        )
        .optional()?
        .is_some();
    if exists {
        Ok(())
    } else {
        Err(StoreError::UnknownBranch)
    }
}

pub(super) fn insert_branch_tx(
    tx: &Transaction<'_>,
    story_id: i64,
    name: &str,
    parent_branch_id: Option<i64>,
    fork_cutoff: i64,
) -> Result<i64, StoreError> {
    tx.execute(
        "INSERT INTO story_branches(story_id, name, parent_branch_id, fork_cutoff, created_at) \
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![story_id, name, parent_branch_id, fork_cutoff, now_ms()],
    )
    .map_err(map_insert_conflict)?;
    Ok(tx.last_insert_rowid())
}
