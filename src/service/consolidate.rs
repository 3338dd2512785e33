//! Consolidation Job
//!
//! Idempotent whole-store pass: group every record by normalized key
//! (falling back to raw topic), fold each group of size >1 into its
//! earliest-created survivor with the same rules as a live merge, then
//! delete the redundant records. Outcomes are reported per group so a
//! merge-succeeded-but-delete-failed case stays visible and retryable.

use std::collections::HashMap;

use serde::Serialize;
use tracing::{info, warn};

use super::merge::union_into;
use crate::store::{Database, SetStore};
use crate::types::{FlashcardSet, Result, flashcard::fold_unique};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupStatus {
    /// Survivor updated and every duplicate deleted
    Merged,
    /// Survivor updated but at least one duplicate could not be deleted;
    /// re-running consolidation retries the deletion
    Partial,
    /// Survivor update itself failed; nothing was deleted
    Error,
}

#[derive(Debug, Clone, Serialize)]
pub struct GroupOutcome {
    pub key: String,
    pub status: GroupStatus,
    /// Number of records folded together (survivor included)
    pub merged_count: usize,
    /// Item count on the survivor after folding
    pub total_items: usize,
    pub error: Option<String>,
}

#[derive(Debug, Default, Serialize)]
pub struct ConsolidationReport {
    /// Distinct topic keys seen across the store
    pub groups_found: usize,
    /// Groups that fully merged this run
    pub merged_groups: usize,
    pub outcomes: Vec<GroupOutcome>,
}

/// Run one consolidation pass. A no-op on an already-consolidated store.
pub fn consolidate(db: &Database) -> Result<ConsolidationReport> {
    let sets = SetStore::new(db);
    let all = sets.list_all_ordered()?;

    // Group by key, preserving created-at order within and across groups
    let mut order: Vec<String> = Vec::new();
    let mut groups: HashMap<String, Vec<FlashcardSet>> = HashMap::new();
    for set in all {
        let key = set.topic_key();
        if !groups.contains_key(&key) {
            order.push(key.clone());
        }
        groups.entry(key).or_default().push(set);
    }

    let mut report = ConsolidationReport {
        groups_found: order.len(),
        ..Default::default()
    };

    for key in order {
        let group = groups.remove(&key).unwrap_or_default();
        if group.len() < 2 {
            continue;
        }

        info!(key = %key, size = group.len(), "Consolidating duplicate group");
        let outcome = consolidate_group(&sets, &key, group);
        if outcome.status == GroupStatus::Merged {
            report.merged_groups += 1;
        }
        report.outcomes.push(outcome);
    }

    Ok(report)
}

fn consolidate_group(sets: &SetStore<'_>, key: &str, group: Vec<FlashcardSet>) -> GroupOutcome {
    let merged_count = group.len();
    let mut iter = group.into_iter();
    let Some(mut survivor) = iter.next() else {
        return GroupOutcome {
            key: key.to_string(),
            status: GroupStatus::Error,
            merged_count: 0,
            total_items: 0,
            error: Some("empty group".to_string()),
        };
    };
    let duplicates: Vec<FlashcardSet> = iter.collect();

    // Fold duplicates in creation order; survivor items first so its
    // phrasing wins
    for dup in &duplicates {
        survivor.items = fold_unique(
            std::mem::take(&mut survivor.items)
                .into_iter()
                .chain(dup.items.iter().cloned()),
        );
        for contributor in &dup.contributor_ids {
            union_into(&mut survivor.contributor_ids, contributor.trim());
        }
        for alias in &dup.aliases {
            union_into(&mut survivor.aliases, alias.trim());
        }
        union_into(&mut survivor.aliases, dup.topic.trim());

        if survivor.category_id.is_none() && dup.category_id.is_some() {
            survivor.category = dup.category.clone();
            survivor.category_id = dup.category_id.clone();
        }
    }
    let survivor_topic = survivor.topic.clone();
    union_into(&mut survivor.aliases, survivor_topic.trim());
    if survivor.normalized_topic.trim().is_empty() {
        survivor.normalized_topic = survivor.topic.clone();
    }

    if let Err(e) = sets.update(&survivor) {
        warn!(key = %key, error = %e, "Consolidation update failed");
        return GroupOutcome {
            key: key.to_string(),
            status: GroupStatus::Error,
            merged_count,
            total_items: survivor.items.len(),
            error: Some(e.to_string()),
        };
    }

    let mut delete_error = None;
    for dup in &duplicates {
        if let Err(e) = sets.delete(&dup.id) {
            warn!(key = %key, id = %dup.id, error = %e, "Consolidation delete failed");
            delete_error = Some(e.to_string());
        }
    }

    match delete_error {
        None => GroupOutcome {
            key: key.to_string(),
            status: GroupStatus::Merged,
            merged_count,
            total_items: survivor.items.len(),
            error: None,
        },
        Some(error) => GroupOutcome {
            key: key.to_string(),
            status: GroupStatus::Partial,
            merged_count,
            total_items: survivor.items.len(),
            error: Some(error),
        },
    }
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

    fn aged_set(topic: &str, normalized: &str, hours_ago: i64) -> FlashcardSet {
        let mut set = FlashcardSet::new(topic, normalized);
        set.created_at = Utc::now() - Duration::hours(hours_ago);
        set
    }

    #[test]
    fn test_consolidates_duplicate_group() {
        let db = test_db();
        let sets = SetStore::new(&db);

        let mut oldest = aged_set("git basics", "Git Basics", 3);
        oldest.items = vec![FlashcardItem::new("What is a commit?", "a snapshot")];
        oldest.contributor_ids = vec!["user-1".into()];

        let mut middle = aged_set("Git Basics", "git basics", 2);
        middle.items = vec![
            FlashcardItem::new("What is a Commit?", "rewritten"),
            FlashcardItem::new("What is a branch?", "a movable ref"),
        ];
        middle.contributor_ids = vec!["user-2".into()];

        let mut newest = aged_set("GIT BASICS", "Git Basics", 1);
        newest.items = vec![FlashcardItem::new("What is HEAD?", "current checkout")];

        sets.insert(&oldest).unwrap();
        sets.insert(&middle).unwrap();
        sets.insert(&newest).unwrap();

        let report = consolidate(&db).unwrap();
        assert_eq!(report.groups_found, 1);
        assert_eq!(report.merged_groups, 1);
        assert_eq!(report.outcomes.len(), 1);
        assert_eq!(report.outcomes[0].status, GroupStatus::Merged);
        assert_eq!(report.outcomes[0].merged_count, 3);

        // Only the earliest-created record survives
        assert_eq!(sets.count().unwrap(), 1);
        let survivor = sets.find_by_id(&oldest.id).unwrap().unwrap();
        assert_eq!(survivor.items.len(), 3);
        assert_eq!(survivor.items[0].back, "a snapshot");
        assert!(survivor.contributor_ids.contains(&"user-2".to_string()));
        assert!(survivor.aliases.contains(&"GIT BASICS".to_string()));
    }

    #[test]
    fn test_second_run_is_noop() {
        let db = test_db();
        let sets = SetStore::new(&db);

        let mut a = aged_set("rust", "Rust", 2);
        a.items = vec![FlashcardItem::new("q1", "a1")];
        let mut b = aged_set("Rust", "rust", 1);
        b.items = vec![FlashcardItem::new("q2", "a2")];
        sets.insert(&a).unwrap();
        sets.insert(&b).unwrap();

        let first = consolidate(&db).unwrap();
        assert_eq!(first.merged_groups, 1);

        let second = consolidate(&db).unwrap();
        assert_eq!(second.merged_groups, 0);
        assert!(second.outcomes.is_empty());
        assert_eq!(sets.count().unwrap(), 1);
    }

    #[test]
    fn test_groups_key_falls_back_to_raw_topic() {
        let db = test_db();
        let sets = SetStore::new(&db);

        let mut a = aged_set("Solar System", "", 2);
        a.items = vec![FlashcardItem::new("q1", "a1")];
        let mut b = aged_set("solar system", "", 1);
        b.items = vec![FlashcardItem::new("q2", "a2")];
        sets.insert(&a).unwrap();
        sets.insert(&b).unwrap();

        let report = consolidate(&db).unwrap();
        assert_eq!(report.merged_groups, 1);
        let survivor = sets.find_by_id(&a.id).unwrap().unwrap();
        assert_eq!(survivor.items.len(), 2);
        // A blank normalization is repaired from the surviving topic
        assert_eq!(survivor.normalized_topic, "Solar System");
    }

    #[test]
    fn test_singleton_groups_untouched() {
        let db = test_db();
        let sets = SetStore::new(&db);

        let mut only = aged_set("chemistry", "Chemistry", 1);
        only.items = vec![FlashcardItem::new("q", "a")];
        sets.insert(&only).unwrap();

        let report = consolidate(&db).unwrap();
        assert_eq!(report.groups_found, 1);
        assert_eq!(report.merged_groups, 0);
        assert_eq!(sets.count().unwrap(), 1);
    }

    #[test]
    fn test_survivor_adopts_category_from_duplicate() {
        let db = test_db();
        let sets = SetStore::new(&db);

        let mut uncategorized = aged_set("biology", "Biology", 2);
        uncategorized.items = vec![FlashcardItem::new("q1", "a1")];

        let mut categorized = aged_set("Biology", "biology", 1);
        categorized.items = vec![FlashcardItem::new("q2", "a2")];
        categorized.category = Some("Sinh học".into());
        categorized.category_id = Some("cat-bio".into());

        // Referenced category must exist for the FK
        db.execute(
            "INSERT INTO categories (id, name, slug, icon, color, created_at)
             VALUES ('cat-bio', 'Sinh học', 'sinh-hoc', 'HeartPulse', 'rose', '2025-01-01T00:00:00Z')",
            &[],
        )
        .unwrap();

        sets.insert(&uncategorized).unwrap();
        sets.insert(&categorized).unwrap();

        consolidate(&db).unwrap();
        let survivor = sets.find_by_id(&uncategorized.id).unwrap().unwrap();
        assert_eq!(survivor.category_id.as_deref(), Some("cat-bio"));
    }
}
