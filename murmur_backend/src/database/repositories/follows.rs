use crate::database::models::FollowRecord;
use anyhow::Result;
use rusqlite::{params, Connection};

pub(super) struct SqliteFollowRepository<'conn> {
    pub(super) conn: &'conn Connection,
}

impl<'conn> super::FollowRepository for SqliteFollowRepository<'conn> {
    fn follow(&self, record: &FollowRecord) -> Result<()> {
        self.conn.execute(
            r#"
            INSERT OR IGNORE INTO follows (user_id, author_id, created_at)
            VALUES (?1, ?2, ?3)
            "#,
            params![record.user_id, record.author_id, record.created_at],
        )?;
        Ok(())
    }

    fn unfollow(&self, user_id: &str, author_id: &str) -> Result<()> {
        self.conn.execute(
            "DELETE FROM follows WHERE user_id = ?1 AND author_id = ?2",
            params![user_id, author_id],
        )?;
        Ok(())
    }

    fn is_following(&self, user_id: &str, author_id: &str) -> Result<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM follows WHERE user_id = ?1 AND author_id = ?2",
            params![user_id, author_id],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    fn list_following(&self, user_id: &str) -> Result<Vec<FollowRecord>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT user_id, author_id, created_at
            FROM follows
            WHERE user_id = ?1
            ORDER BY created_at DESC
            "#,
        )?;
        let rows = stmt.query_map(params![user_id], |row| {
            Ok(FollowRecord {
                user_id: row.get(0)?,
                author_id: row.get(1)?,
                created_at: row.get(2)?,
            })
        })?;
        let mut follows = Vec::new();
        for row in rows {
            follows.push(row?);
        }
        Ok(follows)
    }
}
