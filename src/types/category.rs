//! Taxonomy entry type.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A taxonomy entry. The slug is the true identity; name, icon, and color are
/// display attributes correctable in place by the sync pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub name: String,
    pub slug: String,
    pub icon: String,
    pub color: String,
    pub created_at: DateTime<Utc>,
}

impl Category {
    pub fn new(
        name: impl Into<String>,
        slug: impl Into<String>,
        icon: impl Into<String>,
        color: impl Into<String>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.into(),
            slug: slug.into(),
            icon: icon.into(),
            color: color.into(),
            created_at: Utc::now(),
        }
    }
}
