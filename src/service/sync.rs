//! Category Sync Pass
//!
//! Idempotent maintenance over the taxonomy: correct sentinel rows whose
//! display attributes drifted, then walk every record that carries a
//! category label without a taxonomy link, creating missing entries and
//! re-linking the record. Re-running on a synced store changes nothing.

use serde::Serialize;
use tracing::info;

use crate::category::{
    CategoryResolver, UNCATEGORIZED_COLOR, UNCATEGORIZED_ICON, UNCATEGORIZED_NAME,
    is_uncategorized_slug,
};
use crate::store::{CategoryStore, Database, SetStore};
use crate::types::Result;

#[derive(Debug, Default, Serialize)]
pub struct SyncReport {
    pub sets_scanned: usize,
    pub categories_created: usize,
    pub categories_corrected: usize,
    pub sets_relinked: usize,
    pub failures: Vec<SyncFailure>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SyncFailure {
    pub set_id: String,
    pub category: String,
    pub error: String,
}

/// Run one sync pass.
pub fn sync_categories(db: &Database) -> Result<SyncReport> {
    let mut report = SyncReport::default();

    correct_sentinel_rows(db, &mut report)?;

    let sets = SetStore::new(db);
    let resolver = CategoryResolver::new(db);
    let unlinked = sets.find_unlinked()?;
    report.sets_scanned = unlinked.len();

    for mut set in unlinked {
        let label = set.category.clone().unwrap_or_default();
        match resolver.resolve(Some(label.as_str())) {
            Ok(resolved) => {
                if resolved.newly_created {
                    report.categories_created += 1;
                }
                set.category = Some(resolved.name);
                set.category_id = Some(resolved.id);
                if let Err(e) = sets.update(&set) {
                    report.failures.push(SyncFailure {
                        set_id: set.id.clone(),
                        category: label,
                        error: e.to_string(),
                    });
                    continue;
                }
                report.sets_relinked += 1;
            }
            Err(e) => {
                report.failures.push(SyncFailure {
                    set_id: set.id.clone(),
                    category: label,
                    error: e.to_string(),
                });
            }
        }
    }

    info!(
        created = report.categories_created,
        corrected = report.categories_corrected,
        relinked = report.sets_relinked,
        "Category sync completed"
    );
    Ok(report)
}

/// Sentinel-slug rows always carry the one canonical name/icon/color.
fn correct_sentinel_rows(db: &Database, report: &mut SyncReport) -> Result<()> {
    let store = CategoryStore::new(db);

    for mut category in store.list_all()? {
        if !is_uncategorized_slug(&category.slug) {
            continue;
        }
        let canonical = (UNCATEGORIZED_NAME, UNCATEGORIZED_ICON, UNCATEGORIZED_COLOR);
        if (category.name.as_str(), category.icon.as_str(), category.color.as_str()) == canonical {
            continue;
        }
        category.name = UNCATEGORIZED_NAME.to_string();
        category.icon = UNCATEGORIZED_ICON.to_string();
        category.color = UNCATEGORIZED_COLOR.to_string();
        store.update(&category)?;
        report.categories_corrected += 1;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Category, FlashcardItem, FlashcardSet};

    fn test_db() -> Database {
        let db = Database::open_in_memory().unwrap();
        db.initialize().unwrap();
        db
    }

    fn labeled_set(topic: &str, label: &str) -> FlashcardSet {
        let mut set = FlashcardSet::new(topic, topic);
        set.items = vec![FlashcardItem::new("q", "a")];
        set.category = Some(label.to_string());
        set
    }

    #[test]
    fn test_sync_creates_and_links() {
        let db = test_db();
        let sets = SetStore::new(&db);
        sets.insert(&labeled_set("a", "Khoa học")).unwrap();
        sets.insert(&labeled_set("b", "khoa hoc")).unwrap();
        sets.insert(&labeled_set("c", "Lịch sử")).unwrap();

        let report = sync_categories(&db).unwrap();
        assert_eq!(report.sets_scanned, 3);
        // Two labels share one slug, so only two categories appear
        assert_eq!(report.categories_created, 2);
        assert_eq!(report.sets_relinked, 3);
        assert!(report.failures.is_empty());

        let all = sets.list_all_ordered().unwrap();
        assert!(all.iter().all(|s| s.category_id.is_some()));
        let a = &all[0];
        let b = &all[1];
        assert_eq!(a.category_id, b.category_id);
        assert_eq!(b.category.as_deref(), Some("Khoa học"));
    }

    #[test]
    fn test_sync_is_idempotent() {
        let db = test_db();
        let sets = SetStore::new(&db);
        sets.insert(&labeled_set("a", "Toán học")).unwrap();

        let first = sync_categories(&db).unwrap();
        assert_eq!(first.sets_relinked, 1);

        let second = sync_categories(&db).unwrap();
        assert_eq!(second.sets_scanned, 0);
        assert_eq!(second.categories_created, 0);
        assert_eq!(second.categories_corrected, 0);
        assert_eq!(second.sets_relinked, 0);
    }

    #[test]
    fn test_sync_corrects_sentinel_row() {
        let db = test_db();
        let store = CategoryStore::new(&db);
        store
            .insert(&Category::new("khac", "khac", "LayoutGrid", "blue"))
            .unwrap();

        let report = sync_categories(&db).unwrap();
        assert_eq!(report.categories_corrected, 1);

        let corrected = store.find_by_slug("khac").unwrap().unwrap();
        assert_eq!(corrected.name, UNCATEGORIZED_NAME);
        assert_eq!(corrected.icon, UNCATEGORIZED_ICON);
        assert_eq!(corrected.color, UNCATEGORIZED_COLOR);

        // Second pass leaves it alone
        let again = sync_categories(&db).unwrap();
        assert_eq!(again.categories_corrected, 0);
    }

    #[test]
    fn test_sync_sentinel_label_links_to_sentinel_row() {
        let db = test_db();
        let sets = SetStore::new(&db);
        sets.insert(&labeled_set("x", "Khác")).unwrap();

        let report = sync_categories(&db).unwrap();
        assert_eq!(report.sets_relinked, 1);

        let linked = &sets.list_all_ordered().unwrap()[0];
        assert_eq!(linked.category.as_deref(), Some(UNCATEGORIZED_NAME));
    }
}
