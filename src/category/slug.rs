//! Label normalization, translation, and slug derivation.
//!
//! The slug is a taxonomy entry's true key: diacritic-stripped, lowercase,
//! hyphenated. Transliteration is a fixed deterministic table covering the
//! Vietnamese alphabet, so every label pair that reads the same produces the
//! same slug regardless of tone marks or casing.

/// Fixed label -> canonical-label translation table.
/// Keys are normalized (lowercase, collapsed whitespace) English labels.
pub const CATEGORY_TRANSLATIONS: &[(&str, &str)] = &[
    ("science", "Khoa học"),
    ("math", "Toán học"),
    ("mathematics", "Toán học"),
    ("literature", "Văn học"),
    ("history", "Lịch sử"),
    ("geography", "Địa lý"),
    ("programming", "Lập trình"),
    ("technology", "Công nghệ"),
    ("tech", "Công nghệ"),
    ("business", "Kinh doanh"),
    ("health", "Sức khỏe"),
    ("medicine", "Y tế"),
    ("language", "Ngôn ngữ"),
    ("languages", "Ngôn ngữ"),
    ("art", "Nghệ thuật"),
    ("music", "Âm nhạc"),
    ("biology", "Sinh học"),
    ("chemistry", "Hóa học"),
    ("physics", "Vật lý"),
    ("psychology", "Tâm lý học"),
    ("finance", "Tài chính"),
    ("economics", "Kinh tế"),
    ("english", "Tiếng Anh"),
    ("vietnamese", "Tiếng Việt"),
    ("politics", "Chính trị"),
    ("religion", "Tôn giáo"),
    ("sports", "Thể thao"),
    ("travel", "Du lịch"),
    ("cooking", "Nấu ăn"),
    ("fashion", "Thời trang"),
];

/// The "uncategorized" sentinel. A small set of slugs always canonicalizes
/// to this one entry regardless of the translated label.
pub const UNCATEGORIZED_NAME: &str = "Chưa phân loại";
pub const UNCATEGORIZED_SLUG: &str = "chua-phan-loai";
pub const UNCATEGORIZED_ICON: &str = "Tag";
pub const UNCATEGORIZED_COLOR: &str = "slate";

/// Slugs meaning "other"/"uncategorized"
const UNCATEGORIZED_SLUGS: &[&str] = &["khac", UNCATEGORIZED_SLUG];

/// Diacritic folding for the Vietnamese alphabet (lowercase forms; callers
/// lowercase first).
const DIACRITIC_GROUPS: &[(&str, char)] = &[
    ("àáạảãâầấậẩẫăằắặẳẵ", 'a'),
    ("èéẹẻẽêềếệểễ", 'e'),
    ("ìíịỉĩ", 'i'),
    ("òóọỏõôồốộổỗơờớợởỡ", 'o'),
    ("ùúụủũưừứựửữ", 'u'),
    ("ỳýỵỷỹ", 'y'),
    ("đ", 'd'),
];

/// Trim, lowercase, collapse internal whitespace.
pub fn normalize_label(label: &str) -> String {
    label
        .trim()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Canonical translation for a normalized label, if the table has one.
pub fn translate(normalized: &str) -> Option<&'static str> {
    CATEGORY_TRANSLATIONS
        .iter()
        .find(|(key, _)| *key == normalized)
        .map(|(_, canonical)| *canonical)
}

fn fold_char(ch: char) -> char {
    for (group, base) in DIACRITIC_GROUPS {
        if group.contains(ch) {
            return *base;
        }
    }
    ch
}

/// Derive a URL-safe slug: fold diacritics, lowercase, drop everything
/// outside `[0-9a-z -]`, hyphenate whitespace, collapse and trim hyphens.
pub fn slugify(name: &str) -> String {
    let folded: String = name
        .to_lowercase()
        .chars()
        .map(fold_char)
        .filter(|c| c.is_ascii_alphanumeric() || c.is_whitespace() || *c == '-')
        .collect();

    let mut slug = String::with_capacity(folded.len());
    let mut last_hyphen = true;
    for ch in folded.chars() {
        if ch.is_whitespace() || ch == '-' {
            if !last_hyphen {
                slug.push('-');
                last_hyphen = true;
            }
        } else {
            slug.push(ch);
            last_hyphen = false;
        }
    }
    slug.trim_end_matches('-').to_string()
}

/// Whether a slug means "other"/"uncategorized".
pub fn is_uncategorized_slug(slug: &str) -> bool {
    UNCATEGORIZED_SLUGS.contains(&slug)
}
