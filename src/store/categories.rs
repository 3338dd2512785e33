//! Taxonomy store collaborator.
//!
//! The slug carries the only uniqueness constraint; a conflicting insert
//! surfaces as a constraint-violation database error that the resolver
//! answers with a re-read, never an upsert that could clobber a canonical
//! name written by a concurrent caller.

use chrono::{DateTime, Utc};
use rusqlite::params;

use super::Database;
use crate::types::{CardforgeError, Category, Result, ResultExt};

pub struct CategoryStore<'a> {
    db: &'a Database,
}

impl<'a> CategoryStore<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    pub fn find_by_slug(&self, slug: &str) -> Result<Option<Category>> {
        let conn = self.db.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, name, slug, icon, color, created_at FROM categories WHERE slug = ?1",
        )?;

        let mut rows = stmt.query_map(params![slug], map_category)?;
        match rows.next() {
            Some(row) => Ok(Some(row?)),
            None => Ok(None),
        }
    }

    /// Insert a new taxonomy entry. A slug collision from a concurrent
    /// creator comes back as a constraint-violation error; callers are
    /// expected to re-read by slug.
    pub fn insert(&self, category: &Category) -> Result<()> {
        self.db.execute(
            "INSERT INTO categories (id, name, slug, icon, color, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            &[
                &category.id,
                &category.name,
                &category.slug,
                &category.icon,
                &category.color,
                &category.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Correct display attributes in place. The slug itself never changes.
    pub fn update(&self, category: &Category) -> Result<()> {
        self.db
            .execute(
                "UPDATE categories SET name = ?1, icon = ?2, color = ?3 WHERE id = ?4",
                &[
                    &category.name,
                    &category.icon,
                    &category.color,
                    &category.id,
                ],
            )
            .with_context_fn(|| format!("Failed to update category {}", category.slug))?;
        Ok(())
    }

    /// Delete a taxonomy entry, refused while any set still references it.
    pub fn delete(&self, id: &str) -> Result<bool> {
        let references = self.count_referencing_sets(id)?;
        if references > 0 {
            return Err(CardforgeError::Persistence(format!(
                "category {} still referenced by {} sets",
                id, references
            )));
        }

        let affected = self
            .db
            .execute("DELETE FROM categories WHERE id = ?1", &[&id])?;
        Ok(affected > 0)
    }

    pub fn count_referencing_sets(&self, category_id: &str) -> Result<usize> {
        let conn = self.db.conn()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM flashcard_sets WHERE category_id = ?1",
            params![category_id],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    pub fn list_all(&self) -> Result<Vec<Category>> {
        let conn = self.db.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, name, slug, icon, color, created_at FROM categories ORDER BY name",
        )?;

        let categories = stmt
            .query_map([], map_category)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(categories)
    }
}

fn map_category(row: &rusqlite::Row<'_>) -> rusqlite::Result<Category> {
    Ok(Category {
        id: row.get(0)?,
        name: row.get(1)?,
        slug: row.get(2)?,
        icon: row.get(3)?,
        color: row.get(4)?,
        created_at: parse_timestamp(row.get::<_, String>(5)?),
    })
}

pub(crate) fn parse_timestamp(raw: String) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}
