//! Category Resolution Service
//!
//! Turns a free-text label (possibly absent) into a taxonomy row id and
//! canonical name: normalize, translate, slugify, canonicalize sentinels,
//! then find-or-create by slug. The canonical name of an existing row always
//! wins over the caller's spelling, converging drift over time.
//!
//! Creation races are expected under concurrent load: a uniqueness conflict
//! on insert is answered by re-reading the row the other writer created.
//! That fallback is required, not optional.

use tracing::debug;

use super::slug::{
    self, UNCATEGORIZED_COLOR, UNCATEGORIZED_ICON, UNCATEGORIZED_NAME, UNCATEGORIZED_SLUG,
};
use super::style;
use crate::store::{CategoryStore, Database};
use crate::types::{CardforgeError, Category, Result};

/// Outcome of a resolution: the taxonomy row to link against.
#[derive(Debug, Clone)]
pub struct ResolvedCategory {
    pub id: String,
    pub name: String,
    pub slug: String,
    /// Whether this call inserted the row (as opposed to finding it)
    pub newly_created: bool,
}

pub struct CategoryResolver<'a> {
    db: &'a Database,
}

impl<'a> CategoryResolver<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Resolve a label to a taxonomy entry, creating it if missing.
    /// An absent or blank label resolves to the uncategorized sentinel.
    pub fn resolve(&self, label: Option<&str>) -> Result<ResolvedCategory> {
        let raw = label.map(str::trim).filter(|s| !s.is_empty());

        let (display, slug) = match raw {
            None => (
                UNCATEGORIZED_NAME.to_string(),
                UNCATEGORIZED_SLUG.to_string(),
            ),
            Some(raw) => {
                let normalized = slug::normalize_label(raw);
                let display = slug::translate(&normalized)
                    .map(str::to_string)
                    .unwrap_or_else(|| raw.to_string());
                let derived = slug::slugify(&display);
                if derived.is_empty() || slug::is_uncategorized_slug(&derived) {
                    (
                        UNCATEGORIZED_NAME.to_string(),
                        UNCATEGORIZED_SLUG.to_string(),
                    )
                } else {
                    (display, derived)
                }
            }
        };

        let store = CategoryStore::new(self.db);

        if let Some(existing) = store.find_by_slug(&slug)? {
            // Canonical name wins over the caller's label
            return Ok(ResolvedCategory {
                id: existing.id,
                name: existing.name,
                slug: existing.slug,
                newly_created: false,
            });
        }

        let (icon, color) = if slug == UNCATEGORIZED_SLUG {
            (UNCATEGORIZED_ICON, UNCATEGORIZED_COLOR)
        } else {
            (style::icon_for(&display), style::random_color())
        };

        let category = Category::new(&display, &slug, icon, color);
        match store.insert(&category) {
            Ok(()) => {
                debug!(slug = %slug, "Created category");
                Ok(ResolvedCategory {
                    id: category.id,
                    name: category.name,
                    slug: category.slug,
                    newly_created: true,
                })
            }
            Err(err) if err.is_constraint_violation() => {
                // A concurrent caller created the same slug first; theirs wins
                let existing = store.find_by_slug(&slug)?.ok_or_else(|| {
                    CardforgeError::Persistence(format!(
                        "slug conflict on '{}' but row not readable",
                        slug
                    ))
                })?;
                Ok(ResolvedCategory {
                    id: existing.id,
                    name: existing.name,
                    slug: existing.slug,
                    newly_created: false,
                })
            }
            Err(err) => Err(err),
        }
    }
}
