use crate::database::models::GroupRecord;
use anyhow::Result;
use rusqlite::{params, Connection, OptionalExtension, Row};

pub(super) struct SqliteGroupRepository<'conn> {
    pub(super) conn: &'conn Connection,
}

fn row_to_group(row: &Row<'_>) -> rusqlite::Result<GroupRecord> {
    Ok(GroupRecord {
        id: row.get(0)?,
        title: row.get(1)?,
        slug: row.get(2)?,
        description: row.get(3)?,
    })
}

impl<'conn> super::GroupRepository for SqliteGroupRepository<'conn> {
    fn create(&self, record: &GroupRecord) -> Result<()> {
        self.conn.execute(
            r#"
            INSERT INTO groups (id, title, slug, description)
            VALUES (?1, ?2, ?3, ?4)
            "#,
            params![record.id, record.title, record.slug, record.description],
        )?;
        Ok(())
    }

    fn get(&self, id: &str) -> Result<Option<GroupRecord>> {
        Ok(self
            .conn
            .query_row(
                r#"
                SELECT id, title, slug, description
                FROM groups
                WHERE id = ?1
                "#,
                params![id],
                row_to_group,
            )
            .optional()?)
    }

    fn get_by_slug(&self, slug: &str) -> Result<Option<GroupRecord>> {
        Ok(self
            .conn
            .query_row(
                r#"
                SELECT id, title, slug, description
                FROM groups
                WHERE slug = ?1
                "#,
                params![slug],
                row_to_group,
            )
            .optional()?)
    }

    fn list(&self) -> Result<Vec<GroupRecord>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, title, slug, description
            FROM groups
            ORDER BY title ASC
            "#,
        )?;
        let rows = stmt.query_map([], row_to_group)?;
        let mut groups = Vec::new();
        for row in rows {
            groups.push(row?);
        }
        Ok(groups)
    }

    fn delete(&self, id: &str) -> Result<()> {
        self.conn
            .execute("DELETE FROM groups WHERE id = ?1", params![id])?;
        Ok(())
    }
}
