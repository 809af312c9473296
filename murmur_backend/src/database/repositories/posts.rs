use crate::database::models::PostRecord;
use anyhow::Result;
use rusqlite::{params, Connection, OptionalExtension, Row};

pub(super) struct SqlitePostRepository<'conn> {
    pub(super) conn: &'conn Connection,
}

const POST_COLUMNS: &str = "id, text, author_id, group_id, image_path, published_at";

fn row_to_post(row: &Row<'_>) -> rusqlite::Result<PostRecord> {
    Ok(PostRecord {
        id: row.get(0)?,
        text: row.get(1)?,
        author_id: row.get(2)?,
        group_id: row.get(3)?,
        image_path: row.get(4)?,
        published_at: row.get(5)?,
    })
}

impl<'conn> SqlitePostRepository<'conn> {
    fn count_where(&self, clause: &str, bind: &str) -> Result<u64> {
        let sql = format!("SELECT COUNT(*) FROM posts WHERE {clause}");
        let count: i64 = self.conn.query_row(&sql, params![bind], |row| row.get(0))?;
        Ok(count as u64)
    }

    fn list_where(
        &self,
        clause: &str,
        bind: &str,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<PostRecord>> {
        let sql = format!(
            "SELECT {POST_COLUMNS} FROM posts WHERE {clause} \
             ORDER BY published_at DESC, rowid DESC LIMIT ?2 OFFSET ?3"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![bind, limit as i64, offset as i64], row_to_post)?;
        let mut posts = Vec::new();
        for row in rows {
            posts.push(row?);
        }
        Ok(posts)
    }
}

impl<'conn> super::PostRepository for SqlitePostRepository<'conn> {
    fn create(&self, record: &PostRecord) -> Result<()> {
        self.conn.execute(
            r#"
            INSERT INTO posts (id, text, author_id, group_id, image_path, published_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                record.id,
                record.text,
                record.author_id,
                record.group_id,
                record.image_path,
                record.published_at
            ],
        )?;
        Ok(())
    }

    fn update_content(&self, record: &PostRecord) -> Result<()> {
        self.conn.execute(
            r#"
            UPDATE posts
            SET text = ?2, group_id = ?3, image_path = ?4
            WHERE id = ?1
            "#,
            params![record.id, record.text, record.group_id, record.image_path],
        )?;
        Ok(())
    }

    fn get(&self, id: &str) -> Result<Option<PostRecord>> {
        let sql = format!("SELECT {POST_COLUMNS} FROM posts WHERE id = ?1");
        Ok(self
            .conn
            .query_row(&sql, params![id], row_to_post)
            .optional()?)
    }

    fn count_all(&self) -> Result<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM posts", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    fn count_for_group(&self, group_id: &str) -> Result<u64> {
        self.count_where("group_id = ?1", group_id)
    }

    fn count_for_author(&self, author_id: &str) -> Result<u64> {
        self.count_where("author_id = ?1", author_id)
    }

    fn count_followed_by(&self, user_id: &str) -> Result<u64> {
        let count: i64 = self.conn.query_row(
            r#"
            SELECT COUNT(*)
            FROM posts p
            INNER JOIN follows f ON f.author_id = p.author_id
            WHERE f.user_id = ?1
            "#,
            params![user_id],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    fn list_recent(&self, limit: usize, offset: usize) -> Result<Vec<PostRecord>> {
        let sql = format!(
            "SELECT {POST_COLUMNS} FROM posts \
             ORDER BY published_at DESC, rowid DESC LIMIT ?1 OFFSET ?2"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![limit as i64, offset as i64], row_to_post)?;
        let mut posts = Vec::new();
        for row in rows {
            posts.push(row?);
        }
        Ok(posts)
    }

    fn list_for_group(
        &self,
        group_id: &str,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<PostRecord>> {
        self.list_where("group_id = ?1", group_id, limit, offset)
    }

    fn list_for_author(
        &self,
        author_id: &str,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<PostRecord>> {
        self.list_where("author_id = ?1", author_id, limit, offset)
    }

    fn list_followed_by(
        &self,
        user_id: &str,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<PostRecord>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT p.id, p.text, p.author_id, p.group_id, p.image_path, p.published_at
            FROM posts p
            INNER JOIN follows f ON f.author_id = p.author_id
            WHERE f.user_id = ?1
            ORDER BY p.published_at DESC, p.rowid DESC
            LIMIT ?2 OFFSET ?3
            "#,
        )?;
        let rows = stmt.query_map(params![user_id, limit as i64, offset as i64], row_to_post)?;
        let mut posts = Vec::new();
        for row in rows {
            posts.push(row?);
        }
        Ok(posts)
    }
}
