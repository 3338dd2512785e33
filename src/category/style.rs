//! Icon and color derivation for new taxonomy entries.
//!
//! Icons come from a fixed ordered keyword table: the first rule whose
//! keyword list matches the lowercased label wins, so specific matches must
//! stay above generic ones. Colors are picked pseudo-randomly from a fixed
//! palette, except the uncategorized sentinel which is always neutral.

use rand::Rng;

/// Ordered keyword rules mapping a label to a Lucide icon name.
/// Vietnamese and English keywords are matched as substrings.
const ICON_RULES: &[(&[&str], &str)] = &[
    // Science & tech
    (
        &["vũ trụ", "thiên văn", "space", "astronomy", "rocket", "tên lửa"],
        "Rocket",
    ),
    (
        &["nguyên tử", "năng lượng", "lượng tử", "atom", "quantum", "nuclear"],
        "Atom",
    ),
    (
        &["thí nghiệm", "hóa học", "vật lý", "lab", "experiment", "chemistry", "physics"],
        "Beaker",
    ),
    (&["khoa học", "science", "microscope", "kính hiển vi"], "Microscope"),
    (
        &["lập trình", "phần mềm", "trí tuệ nhân tạo", "programming", "software", "coding", "cpu", "chip"],
        "Cpu",
    ),
    (
        &["công nghệ", "máy tính", "tech", "computer", "javascript", "python", "react", "web", "database", "server"],
        "Code",
    ),
    // Business & finance
    (
        &["tài chính", "tiền tệ", "đầu tư", "finance", "currency", "invest", "money"],
        "Banknote",
    ),
    (
        &["chứng khoán", "tăng trưởng", "stock market", "growth", "economics"],
        "TrendingUp",
    ),
    (
        &["kinh doanh", "quản trị", "sự nghiệp", "business", "management", "career", "job"],
        "Briefcase",
    ),
    // Health & life sciences
    (
        &["bác sĩ", "khám bệnh", "bệnh viện", "doctor", "hospital", "medical", "clinic"],
        "Stethoscope",
    ),
    (
        &["y tế", "sức khỏe", "y học", "health", "medicine", "heart"],
        "HeartPulse",
    ),
    (
        &["thể thao", "thể hình", "gym", "sport", "fitness", "workout"],
        "Dumbbell",
    ),
    (
        &["ẩm thực", "nấu ăn", "ăn uống", "cooking", "food", "recipes", "kitchen"],
        "Utensils",
    ),
    // Social & arts
    (
        &["văn học", "đọc sách", "thư viện", "literature", "reading", "library", "book"],
        "BookOpen",
    ),
    (
        &["nghệ thuật", "hội họa", "thiết kế", "sáng tạo", "art", "design", "creative", "painting"],
        "Palette",
    ),
    (
        &["âm nhạc", "giải trí", "music", "entertainment", "song", "concert"],
        "Music",
    ),
    (
        &["địa lý", "du lịch", "văn hóa", "geography", "travel", "culture", "globe", "bản đồ"],
        "Globe",
    ),
    (
        &["lịch sử", "chính trị", "kiến trúc", "cổ đại", "history", "politics", "ancient", "monument"],
        "Landmark",
    ),
    // Skills & intelligence
    (
        &["ý tưởng", "mẹo vặt", "sáng kiến", "idea", "tips", "innovation"],
        "Lightbulb",
    ),
    (
        &["dịch thuật", "ngoại ngữ", "tiếng", "english", "languages", "translation", "ngôn ngữ"],
        "Languages",
    ),
    (
        &["tâm lý", "tư duy", "trí tuệ", "psychology", "intelligence", "brain", "não"],
        "Brain",
    ),
    (
        &["giáo dục", "education", "study", "school", "trường", "graduation"],
        "GraduationCap",
    ),
    // Math & numbers
    (
        &["toán", "math", "thống kê", "statistics", "hình học", "geometry"],
        "Calculator",
    ),
];

/// Generic fallback icon when no keyword rule matches
const FALLBACK_ICON: &str = "LayoutGrid";

/// Fixed badge color palette for new categories
pub const COLOR_PALETTE: &[&str] = &[
    "blue", "green", "amber", "purple", "cyan", "rose", "orange", "indigo",
];

/// First-match keyword lookup against the ordered icon table.
pub fn icon_for(label: &str) -> &'static str {
    let lower = label.to_lowercase();
    for (keywords, icon) in ICON_RULES {
        if keywords.iter().any(|kw| lower.contains(kw)) {
            return icon;
        }
    }
    FALLBACK_ICON
}

/// Pseudo-random pick from the fixed palette.
pub fn random_color() -> &'static str {
    let idx = rand::rng().random_range(0..COLOR_PALETTE.len());
    COLOR_PALETTE[idx]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_icon_specific_beats_generic() {
        // "vật lý" is also a science word, but the lab rule sits above
        assert_eq!(icon_for("Vật lý"), "Beaker");
        assert_eq!(icon_for("Khoa học"), "Microscope");
    }

    #[test]
    fn test_icon_english_keywords() {
        assert_eq!(icon_for("Programming"), "Cpu");
        assert_eq!(icon_for("World History"), "Landmark");
        assert_eq!(icon_for("finance 101"), "Banknote");
    }

    #[test]
    fn test_icon_fallback() {
        assert_eq!(icon_for("Chiêm tinh bí ẩn"), FALLBACK_ICON);
    }

    #[test]
    fn test_random_color_in_palette() {
        for _ in 0..32 {
            assert!(COLOR_PALETTE.contains(&random_color()));
        }
    }
}
