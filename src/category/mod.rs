//! Category Resolution
//!
//! Normalization, translation, and slug derivation are pure (`slug`,
//! `style`); `resolver` adds the find-or-create against the taxonomy store.

pub mod resolver;
pub mod slug;
pub mod style;

pub use resolver::{CategoryResolver, ResolvedCategory};
pub use slug::{
    UNCATEGORIZED_COLOR, UNCATEGORIZED_ICON, UNCATEGORIZED_NAME, UNCATEGORIZED_SLUG,
    is_uncategorized_slug, normalize_label, slugify, translate,
};
pub use style::{icon_for, random_color};
