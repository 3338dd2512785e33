//! Flashcard set store collaborator.
//!
//! The "same topic" lookup is the one multi-predicate rule used everywhere:
//! a record matches a key when its normalized topic matches case-insensitively,
//! OR its alias set contains the original topic, OR its original topic matches
//! case-insensitively. When several match, the earliest-created row wins.

use rusqlite::params;

use super::Database;
use super::categories::parse_timestamp;
use crate::types::{FlashcardItem, FlashcardSet, Result, ResultExt};

pub struct SetStore<'a> {
    db: &'a Database,
}

impl<'a> SetStore<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    pub fn insert(&self, set: &FlashcardSet) -> Result<()> {
        let items = serde_json::to_string(&set.items)?;
        let contributors = serde_json::to_string(&set.contributor_ids)?;
        let aliases = serde_json::to_string(&set.aliases)?;

        self.db
            .execute(
                "INSERT INTO flashcard_sets
                 (id, topic, normalized_topic, items, contributor_ids, aliases,
                  category, category_id, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                &[
                    &set.id,
                    &set.topic,
                    &set.normalized_topic,
                    &items,
                    &contributors,
                    &aliases,
                    &set.category,
                    &set.category_id,
                    &set.created_at.to_rfc3339(),
                    &set.updated_at.to_rfc3339(),
                ],
            )
            .with_context_fn(|| format!("Failed to insert set for topic '{}'", set.topic))?;
        Ok(())
    }

    pub fn update(&self, set: &FlashcardSet) -> Result<()> {
        let items = serde_json::to_string(&set.items)?;
        let contributors = serde_json::to_string(&set.contributor_ids)?;
        let aliases = serde_json::to_string(&set.aliases)?;

        self.db
            .execute(
                "UPDATE flashcard_sets SET
                 normalized_topic = ?1, items = ?2, contributor_ids = ?3, aliases = ?4,
                 category = ?5, category_id = ?6, updated_at = ?7
                 WHERE id = ?8",
                &[
                    &set.normalized_topic,
                    &items,
                    &contributors,
                    &aliases,
                    &set.category,
                    &set.category_id,
                    &chrono::Utc::now().to_rfc3339(),
                    &set.id,
                ],
            )
            .with_context_fn(|| format!("Failed to update set {}", set.id))?;
        Ok(())
    }

    pub fn delete(&self, id: &str) -> Result<bool> {
        let affected = self
            .db
            .execute("DELETE FROM flashcard_sets WHERE id = ?1", &[&id])
            .with_context_fn(|| format!("Failed to delete set {}", id))?;
        Ok(affected > 0)
    }

    pub fn find_by_id(&self, id: &str) -> Result<Option<FlashcardSet>> {
        let conn = self.db.conn()?;
        let mut stmt = conn.prepare(&format!("{} WHERE id = ?1", SELECT_SETS))?;
        let mut rows = stmt.query_map(params![id], map_set)?;
        match rows.next() {
            Some(row) => Ok(Some(row?)),
            None => Ok(None),
        }
    }

    /// Find the primary record for a topic key: normalized topic matches
    /// case-insensitively, alias set contains the original topic, or the
    /// original topic matches case-insensitively. Earliest-created wins.
    ///
    /// The SQL alias predicate is a coarse substring prefilter (only ever
    /// broader than exact containment); exact membership is checked on the
    /// deserialized alias list.
    pub fn find_by_topic_key(
        &self,
        normalized_key: &str,
        original_topic: &str,
    ) -> Result<Option<FlashcardSet>> {
        let conn = self.db.conn()?;
        let mut stmt = conn.prepare(&format!(
            "{} WHERE lower(normalized_topic) = lower(trim(?1))
                OR lower(topic) = lower(trim(?2))
                OR aliases LIKE '%' || ?2 || '%'
              ORDER BY created_at ASC, rowid ASC",
            SELECT_SETS
        ))?;

        let candidates = stmt
            .query_map(params![normalized_key, original_topic], map_set)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let norm = normalized_key.trim().to_lowercase();
        let orig = original_topic.trim().to_lowercase();

        Ok(candidates.into_iter().find(|set| {
            set.normalized_topic.trim().to_lowercase() == norm
                || set.topic.trim().to_lowercase() == orig
                || set.aliases.iter().any(|a| a == original_topic)
        }))
    }

    /// All sets, oldest first. Consolidation depends on this ordering to pick
    /// the earliest-created record as group survivor.
    pub fn list_all_ordered(&self) -> Result<Vec<FlashcardSet>> {
        let conn = self.db.conn()?;
        let mut stmt =
            conn.prepare(&format!("{} ORDER BY created_at ASC, rowid ASC", SELECT_SETS))?;
        let sets = stmt
            .query_map([], map_set)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(sets)
    }

    /// Sets with no category label or the uncategorized sentinel label,
    /// oldest first. Backfill targets.
    pub fn find_uncategorized(&self, sentinel_name: &str, limit: usize) -> Result<Vec<FlashcardSet>> {
        let conn = self.db.conn()?;
        let mut stmt = conn.prepare(&format!(
            "{} WHERE category IS NULL OR trim(category) = '' OR category = ?1
              ORDER BY created_at ASC, rowid ASC LIMIT ?2",
            SELECT_SETS
        ))?;
        let sets = stmt
            .query_map(params![sentinel_name, limit as i64], map_set)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(sets)
    }

    /// Sets carrying a category label but no taxonomy link. Sync targets.
    pub fn find_unlinked(&self) -> Result<Vec<FlashcardSet>> {
        let conn = self.db.conn()?;
        let mut stmt = conn.prepare(&format!(
            "{} WHERE category IS NOT NULL AND trim(category) != '' AND category_id IS NULL
              ORDER BY created_at ASC, rowid ASC",
            SELECT_SETS
        ))?;
        let sets = stmt
            .query_map([], map_set)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(sets)
    }

    pub fn count(&self) -> Result<usize> {
        let conn = self.db.conn()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM flashcard_sets", [], |row| {
            row.get(0)
        })?;
        Ok(count as usize)
    }
}

const SELECT_SETS: &str = "SELECT id, topic, normalized_topic, items, contributor_ids, aliases,
        category, category_id, created_at, updated_at FROM flashcard_sets";

fn map_set(row: &rusqlite::Row<'_>) -> rusqlite::Result<FlashcardSet> {
    let items_json: String = row.get(3)?;
    let contributors_json: String = row.get(4)?;
    let aliases_json: String = row.get(5)?;

    let items: Vec<FlashcardItem> = serde_json::from_str(&items_json).unwrap_or_default();
    let contributor_ids: Vec<String> =
        serde_json::from_str(&contributors_json).unwrap_or_default();
    let aliases: Vec<String> = serde_json::from_str(&aliases_json).unwrap_or_default();

    Ok(FlashcardSet {
        id: row.get(0)?,
        topic: row.get(1)?,
        normalized_topic: row.get(2)?,
        items,
        contributor_ids,
        aliases,
        category: row.get(6)?,
        category_id: row.get(7)?,
        created_at: parse_timestamp(row.get::<_, String>(8)?),
        updated_at: parse_timestamp(row.get::<_, String>(9)?),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FlashcardItem;
    use chrono::{Duration, Utc};

    fn test_db() -> Database {
        let db = Database::open_in_memory().unwrap();
        db.initialize().unwrap();
        db
    }

    fn sample_set(topic: &str, normalized: &str) -> FlashcardSet {
        let mut set = FlashcardSet::new(topic, normalized);
        set.items = vec![FlashcardItem::new("q1", "a1")];
        set.aliases = vec![topic.to_string()];
        set
    }

    #[test]
    fn test_insert_roundtrip() {
        let db = test_db();
        let store = SetStore::new(&db);

        let mut set = sample_set("rust ownership", "Rust Ownership");
        set.contributor_ids = vec!["user-1".into()];
        store.insert(&set).unwrap();

        let found = store.find_by_id(&set.id).unwrap().unwrap();
        assert_eq!(found.topic, "rust ownership");
        assert_eq!(found.normalized_topic, "Rust Ownership");
        assert_eq!(found.items.len(), 1);
        assert_eq!(found.contributor_ids, vec!["user-1".to_string()]);
        assert_eq!(found.aliases, vec!["rust ownership".to_string()]);
    }

    #[test]
    fn test_find_by_topic_key_normalized_case_insensitive() {
        let db = test_db();
        let store = SetStore::new(&db);
        store
            .insert(&sample_set("python programming", "Python Programming"))
            .unwrap();

        let found = store
            .find_by_topic_key("python programming ", "anything else")
            .unwrap();
        assert!(found.is_some());
    }

    #[test]
    fn test_find_by_topic_key_original_topic() {
        let db = test_db();
        let store = SetStore::new(&db);
        store.insert(&sample_set("REACT hooks", "React Hooks")).unwrap();

        let found = store
            .find_by_topic_key("unrelated key", "react hooks")
            .unwrap();
        assert!(found.is_some());
    }

    #[test]
    fn test_find_by_topic_key_alias_containment() {
        let db = test_db();
        let store = SetStore::new(&db);

        let mut set = sample_set("js promises", "JavaScript Promises");
        set.aliases.push("promises in js".to_string());
        store.insert(&set).unwrap();

        let found = store
            .find_by_topic_key("nothing", "promises in js")
            .unwrap();
        assert!(found.is_some());

        // Alias containment is exact, not substring
        let not_found = store.find_by_topic_key("nothing", "promises in").unwrap();
        assert!(not_found.is_none());
    }

    #[test]
    fn test_find_by_topic_key_earliest_created_wins() {
        let db = test_db();
        let store = SetStore::new(&db);

        let mut older = sample_set("git basics", "Git Basics");
        older.created_at = Utc::now() - Duration::hours(2);
        let newer = sample_set("Git Basics", "git basics");

        // Insert newer first to prove ordering comes from created_at
        store.insert(&newer).unwrap();
        store.insert(&older).unwrap();

        let found = store.find_by_topic_key("git basics", "git basics").unwrap();
        assert_eq!(found.unwrap().id, older.id);
    }

    #[test]
    fn test_find_uncategorized_and_unlinked() {
        let db = test_db();
        let store = SetStore::new(&db);

        let mut plain = sample_set("a", "A");
        plain.category = None;
        let mut sentinel = sample_set("b", "B");
        sentinel.category = Some("Chưa phân loại".to_string());
        let mut labeled = sample_set("c", "C");
        labeled.category = Some("Khoa học".to_string());

        store.insert(&plain).unwrap();
        store.insert(&sentinel).unwrap();
        store.insert(&labeled).unwrap();

        let uncategorized = store.find_uncategorized("Chưa phân loại", 10).unwrap();
        assert_eq!(uncategorized.len(), 2);

        let unlinked = store.find_unlinked().unwrap();
        assert_eq!(unlinked.len(), 2); // sentinel + labeled, both without category_id
    }

    #[test]
    fn test_delete() {
        let db = test_db();
        let store = SetStore::new(&db);
        let set = sample_set("x", "X");
        store.insert(&set).unwrap();

        assert!(store.delete(&set.id).unwrap());
        assert!(!store.delete(&set.id).unwrap());
        assert_eq!(store.count().unwrap(), 0);
    }
}
