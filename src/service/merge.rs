//! Deduplication & Unification Merge Engine
//!
//! Reconciles a fresh generation payload against any existing record for the
//! same topic key. Item folding is identity-keyed and first-occurrence-wins,
//! so historical phrasing survives near-duplicate rewrites. Contributor and
//! alias sets union. An unlabeled request never clobbers prior
//! categorization.

use tracing::{debug, info};

use crate::category::CategoryResolver;
use crate::store::{Database, SetStore};
use crate::types::{FlashcardItem, FlashcardSet, Result, flashcard::fold_unique};

/// One unification request against the store.
#[derive(Debug, Clone)]
pub struct MergeRequest<'a> {
    /// Canonical dedup key from the generation payload
    pub normalized_topic: &'a str,
    /// The caller's original free-text topic
    pub original_topic: &'a str,
    /// Freshly generated items
    pub items: Vec<FlashcardItem>,
    pub category_label: Option<&'a str>,
    pub contributor_id: Option<&'a str>,
}

pub struct MergeEngine<'a> {
    db: &'a Database,
}

impl<'a> MergeEngine<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Reconcile a fresh payload with the store: insert a new record or merge
    /// into the earliest-created match for the topic key.
    pub fn unify(&self, request: MergeRequest<'_>) -> Result<FlashcardSet> {
        let sets = SetStore::new(self.db);
        let primary = sets.find_by_topic_key(request.normalized_topic, request.original_topic)?;

        match primary {
            None => self.insert_new(&sets, request),
            Some(primary) => self.merge_into(&sets, primary, request),
        }
    }

    fn insert_new(&self, sets: &SetStore<'_>, request: MergeRequest<'_>) -> Result<FlashcardSet> {
        let resolved = CategoryResolver::new(self.db).resolve(request.category_label)?;

        let mut set = FlashcardSet::new(request.original_topic.trim(), request.normalized_topic);
        set.items = fold_unique(
            request
                .items
                .into_iter()
                .filter(FlashcardItem::is_complete),
        );
        if let Some(contributor) = nonempty(request.contributor_id) {
            set.contributor_ids.push(contributor.to_string());
        }
        set.aliases.push(request.original_topic.trim().to_string());
        set.category = Some(resolved.name);
        set.category_id = Some(resolved.id);

        sets.insert(&set)?;
        info!(topic = %set.normalized_topic, items = set.items.len(), "Created new set");
        Ok(set)
    }

    fn merge_into(
        &self,
        sets: &SetStore<'_>,
        mut primary: FlashcardSet,
        request: MergeRequest<'_>,
    ) -> Result<FlashcardSet> {
        let before = primary.items.len();

        // Primary's existing items fold first, so its phrasing wins
        primary.items = fold_unique(
            primary.items.into_iter().chain(
                request
                    .items
                    .into_iter()
                    .filter(FlashcardItem::is_complete),
            ),
        );

        if let Some(contributor) = nonempty(request.contributor_id) {
            union_into(&mut primary.contributor_ids, contributor);
        }
        primary.contributor_ids.retain(|c| !c.trim().is_empty());

        union_into(&mut primary.aliases, request.original_topic.trim());
        let primary_topic = primary.topic.clone();
        union_into(&mut primary.aliases, primary_topic.trim());

        // Resolve only when a label arrived or the primary was never
        // categorized; an unlabeled request must not clobber prior state.
        if request.category_label.is_some() || primary.category_id.is_none() {
            let resolved = CategoryResolver::new(self.db).resolve(request.category_label)?;
            primary.category = Some(resolved.name);
            primary.category_id = Some(resolved.id);
        }

        sets.update(&primary)?;
        debug!(
            topic = %primary.normalized_topic,
            added = primary.items.len().saturating_sub(before),
            "Merged into existing set"
        );
        Ok(primary)
    }
}

/// Append a value to a vector with set semantics.
pub(crate) fn union_into(values: &mut Vec<String>, value: &str) {
    if !value.is_empty() && !values.iter().any(|v| v == value) {
        values.push(value.to_string());
    }
}

fn nonempty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Database;
    use crate::types::FlashcardItem;

    fn test_db() -> Database {
        let db = Database::open_in_memory().unwrap();
        db.initialize().unwrap();
        db
    }

    fn request<'a>(
        normalized: &'a str,
        original: &'a str,
        items: Vec<FlashcardItem>,
    ) -> MergeRequest<'a> {
        MergeRequest {
            normalized_topic: normalized,
            original_topic: original,
            items,
            category_label: None,
            contributor_id: None,
        }
    }

    #[test]
    fn test_insert_new_record() {
        let db = test_db();
        let engine = MergeEngine::new(&db);

        let set = engine
            .unify(MergeRequest {
                contributor_id: Some("user-1"),
                category_label: Some("programming"),
                ..request(
                    "Python Programming",
                    "python programming",
                    vec![FlashcardItem::new("q", "a")],
                )
            })
            .unwrap();

        assert_eq!(set.normalized_topic, "Python Programming");
        assert_eq!(set.contributor_ids, vec!["user-1".to_string()]);
        assert_eq!(set.aliases, vec!["python programming".to_string()]);
        // "programming" translates to its canonical Vietnamese name
        assert_eq!(set.category.as_deref(), Some("Lập trình"));
        assert!(set.category_id.is_some());
    }

    #[test]
    fn test_case_variant_topics_do_not_both_create_rows() {
        let db = test_db();
        let engine = MergeEngine::new(&db);

        let first = engine
            .unify(request(
                "Python Programming",
                "Python Programming",
                vec![FlashcardItem::new("q1", "a1")],
            ))
            .unwrap();

        let second = engine
            .unify(request(
                "Python Programming",
                "python programming ",
                vec![FlashcardItem::new("q2", "a2")],
            ))
            .unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(SetStore::new(&db).count().unwrap(), 1);
        assert_eq!(second.items.len(), 2);
        assert!(second.aliases.contains(&"python programming".to_string()));
    }

    #[test]
    fn test_merge_keeps_historical_phrasing() {
        let db = test_db();
        let engine = MergeEngine::new(&db);

        engine
            .unify(request(
                "JavaScript Promises",
                "js promises",
                vec![FlashcardItem::new("What is a promise?", "original answer")],
            ))
            .unwrap();

        let merged = engine
            .unify(request(
                "JavaScript Promises",
                "js promises",
                vec![
                    FlashcardItem::new("What is a Promise?", "different answer"),
                    FlashcardItem::new("New question", "new answer"),
                ],
            ))
            .unwrap();

        assert_eq!(merged.items.len(), 2);
        assert_eq!(merged.items[0].front, "What is a promise?");
        assert_eq!(merged.items[0].back, "original answer");
        assert_eq!(merged.items[1].front, "New question");
    }

    #[test]
    fn test_merge_is_idempotent() {
        let db = test_db();
        let engine = MergeEngine::new(&db);

        let items = vec![
            FlashcardItem::new("q1", "a1"),
            FlashcardItem::new("q2", "a2"),
        ];

        let first = engine
            .unify(request("Rust", "rust", items.clone()))
            .unwrap();
        let second = engine.unify(request("Rust", "rust", items)).unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.items.len(), 2);
        assert_eq!(second.items, first.items);
    }

    #[test]
    fn test_unlabeled_request_does_not_clobber_category() {
        let db = test_db();
        let engine = MergeEngine::new(&db);

        let first = engine
            .unify(MergeRequest {
                category_label: Some("history"),
                ..request("World War II", "ww2", vec![FlashcardItem::new("q", "a")])
            })
            .unwrap();
        assert_eq!(first.category.as_deref(), Some("Lịch sử"));

        let second = engine
            .unify(request(
                "World War II",
                "ww2",
                vec![FlashcardItem::new("q2", "a2")],
            ))
            .unwrap();
        assert_eq!(second.category.as_deref(), Some("Lịch sử"));
        assert_eq!(second.category_id, first.category_id);
    }

    #[test]
    fn test_labeled_request_updates_category() {
        let db = test_db();
        let engine = MergeEngine::new(&db);

        engine
            .unify(request("Algebra", "algebra", vec![FlashcardItem::new("q", "a")]))
            .unwrap();

        let relabeled = engine
            .unify(MergeRequest {
                category_label: Some("math"),
                ..request("Algebra", "algebra", vec![])
            })
            .unwrap();
        assert_eq!(relabeled.category.as_deref(), Some("Toán học"));
    }

    #[test]
    fn test_contributor_union_drops_empty() {
        let db = test_db();
        let engine = MergeEngine::new(&db);

        engine
            .unify(MergeRequest {
                contributor_id: Some("user-1"),
                ..request("Topic", "topic", vec![FlashcardItem::new("q", "a")])
            })
            .unwrap();

        let merged = engine
            .unify(MergeRequest {
                contributor_id: Some("  "),
                ..request("Topic", "topic", vec![])
            })
            .unwrap();
        assert_eq!(merged.contributor_ids, vec!["user-1".to_string()]);

        let again = engine
            .unify(MergeRequest {
                contributor_id: Some("user-1"),
                ..request("Topic", "topic", vec![])
            })
            .unwrap();
        assert_eq!(again.contributor_ids.len(), 1);
    }

    #[test]
    fn test_incomplete_fresh_items_discarded() {
        let db = test_db();
        let engine = MergeEngine::new(&db);

        let set = engine
            .unify(request(
                "Topic",
                "topic",
                vec![
                    FlashcardItem::new("q", "a"),
                    FlashcardItem::new("", "orphan back"),
                    FlashcardItem::new("orphan front", "   "),
                ],
            ))
            .unwrap();
        assert_eq!(set.items.len(), 1);
    }
}
