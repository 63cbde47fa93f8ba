//! Song and leader name normalization.
//!
//! Song cells in the praise history were typed by hand over several years,
//! so the same song shows up with different pronoun characters, full-width
//! or half-width punctuation, verse markers, medley notes and so on.
//! Everything that decides whether two entries name the same song lives here.
//!
//! CRITICAL: the report, the baseline loader and publisher attribution all
//! depend on these functions agreeing with each other. Run tests after changes.

use once_cell::sync::Lazy;
use regex::Regex;
use rustc_hash::FxHashMap;
use unicode_normalization::UnicodeNormalization;

// ============================================================================
// REGEX PATTERNS
// ============================================================================

/// "+ Communion" inside a song cell. Communion is part of the service, not a song.
pub static COMMUNION_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\s*\+\s*communion\b\s*").unwrap());

/// Delimiters between songs sung back to back: "Song1 + Song2", "Song1 / Song2"
pub static SONG_DELIMITER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s*[+/]\s*").unwrap());

/// Fragments that are nothing but verse/chorus markers: "V1 V2", "C1"
pub static PURE_SECTION_MARKERS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[VC]\d+(?:\s+[VC]\d+)*$").unwrap());

/// Trailing verse markers: "Song V1 V2" → "Song"
pub static TRAILING_VERSES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+V\d+(?:\s+V\d+)*\s*$").unwrap());

/// Trailing chorus markers: "Song C1 C2" → "Song"
pub static TRAILING_CHORUSES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+C\d+(?:\s+C\d+)*\s*$").unwrap());

/// Trailing lone bridge marker: "Song B" → "Song"
pub static TRAILING_BRIDGE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+B\s*$").unwrap());

/// Arranger/singer attribution: "Song by Esther Chow"
pub static ATTRIBUTION_SUFFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\s+by\s+[a-z\s]+$").unwrap());

/// Annotations removed anywhere in the name (applied in order).
pub static ANNOTATION_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        // Medley notes: "Medley", "Medly", "Medey", plurals
        Regex::new(r"(?i)\s*\bmed(?:ley|ly|ey)s?\b\s*").unwrap(),
        // "Chorus Only"
        Regex::new(r"(?i)\s*\bchorus\s+only\b\s*").unwrap(),
        // Language/version notes: "(Canto)", "(Mando)", "(skip verse)"
        Regex::new(r"(?i)\s*\((?:canto|mando|skip\s+verse)\)\s*").unwrap(),
    ]
});

/// Trailing run of mixed chorus/verse markers: "Song C1 V2"
pub static SECTION_MARKER_SUFFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+[CV]\d+(?:\s+[CV]\d+)*\s*$").unwrap());

/// Leader annotations in parentheses: "John (HC)", "Mary（AGW）"
pub static LEADER_ANNOTATION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s*[(（][^)）]*[)）]").unwrap());

/// Role prefixes on leader cells: "P1:", "A:", "B: "
pub static LEADER_ROLE_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z]\d*[:：]\s*").unwrap());

// ============================================================================
// CHARACTER FOLDING TABLES
// ============================================================================

/// Second-person pronoun variants. 你 and 袮 are both folded onto 祢 so that
/// "願你國度彰顯" and "願祢國度彰顯" are one song.
pub const PRONOUN_VARIANTS: [char; 2] = ['你', '袮'];
pub const CANONICAL_PRONOUN: char = '祢';

/// Full-width punctuation folded while cleaning song names.
pub const SONG_PUNCTUATION: &[(char, char)] = &[
    ('（', '('),
    ('）', ')'),
    ('，', ','),
    ('。', '.'),
    ('．', '.'),
    ('：', ':'),
    ('！', '!'),
    ('？', '?'),
];

/// Punctuation folded for comparison keys. Superset of [`SONG_PUNCTUATION`];
/// anything still full-width afterwards is caught by NFKC.
pub const COMPARISON_PUNCTUATION: &[(char, char)] = &[
    ('（', '('),
    ('）', ')'),
    ('，', ','),
    ('。', '.'),
    ('．', '.'),
    ('：', ':'),
    ('！', '!'),
    ('？', '?'),
    ('；', ';'),
    ('、', ','),
    ('「', '"'),
    ('」', '"'),
    ('『', '"'),
    ('』', '"'),
    ('\u{201C}', '"'),
    ('\u{201D}', '"'),
    ('\u{2018}', '\''),
    ('\u{2019}', '\''),
    ('【', '['),
    ('】', ']'),
    ('～', '~'),
    ('－', '-'),
    ('—', '-'),
    ('–', '-'),
    ('\u{3000}', ' '),
];

/// Cells that name a part of the service rather than a song.
pub const NON_SONG_MARKERS: [&str; 3] = ["communion", "holy communion", "baptism"];

// ============================================================================
// SONG NAME MAPPINGS
// ============================================================================

/// Raw spelling → canonical song name, in the order entries were added.
/// Order matters for publisher attribution, which retries unmatched songs
/// against their raw spellings.
pub const SONG_NAME_MAPPINGS: &[(&str, &str)] = &[
    // Cornerstone
    ("房角石頭（Cornerstone）", "Cornerstone 房角基石"),
    ("Cornerstone", "Cornerstone 房角基石"),
    ("房角基石", "Cornerstone 房角基石"),
    // In Christ Alone
    ("唯獨在基督裡 (In Christ Alone)", "唯獨在基督裡"),
    // Amazing Grace (My Chains Are Gone)
    ("奇異恩典 Amazing Grace (My Chains are Gone)", "奇異恩典（除掉困鎖）"),
    ("奇異恩典(除掉困鎖)", "奇異恩典（除掉困鎖）"),
    // Shout to the Lord
    ("獻上頌讚", "獻上頌讚 (Shout To The Lord)"),
    ("獻上頌讚 Shout to The Lord", "獻上頌讚 (Shout To The Lord)"),
    ("獻上頌讚 Shout to the Lord", "獻上頌讚 (Shout To The Lord)"),
    ("Shout to The Lord 獻上頌讚", "獻上頌讚 (Shout To The Lord)"),
    // King of Kings
    ("King of Kings 萬代君主", "萬代君主"),
    // Typo in the character for "sorrow"
    ("憂傷痛悔的靈", "憂愁痛悔的靈"),
    ("願您平安", "願你平安"),
    // Ocean Will Part
    ("海會分開（Ocean Will Part）", "Ocean Will Part"),
    ("海會分開", "Ocean Will Part"),
    ("世界最美的聲音 (奇異恩典)", "世界最美的聲音"),
    // Variant character 寛
    ("讓生命寛宏", "讓生命寬宏"),
    ("安靜 (Still)", "安靜 Still"),
    ("再次讓我更新", "再次將我更新"),
    ("耶和華以勒 (同心圓)", "耶和華以勒"),
    ("主禱文 (請教導我們禱告)", "主禱文（請教導我們禱告）"),
];

/// Lookup table built from [`SONG_NAME_MAPPINGS`], keyed by the cleaned form of
/// each raw spelling. Every canonical name's own cleaned form maps back to it,
/// so cleaning a canonical name is a no-op.
pub static SONG_ALIASES: Lazy<FxHashMap<String, &'static str>> = Lazy::new(|| {
    let mut m = FxHashMap::default();
    for &(raw, canonical) in SONG_NAME_MAPPINGS {
        if let Some(key) = normalize_song_text(raw) {
            m.entry(key).or_insert(canonical);
        }
    }
    for &(_, canonical) in SONG_NAME_MAPPINGS {
        if let Some(key) = normalize_song_text(canonical) {
            m.entry(key).or_insert(canonical);
        }
    }
    m
});

// ============================================================================
// HELPER FUNCTIONS
// ============================================================================

/// Fold 你/袮 onto 祢.
pub fn fold_pronouns(s: &str) -> String {
    s.chars()
        .map(|c| {
            if PRONOUN_VARIANTS.contains(&c) {
                CANONICAL_PRONOUN
            } else {
                c
            }
        })
        .collect()
}

/// Replace every character found in `table` with its half-width partner.
pub fn fold_punctuation(s: &str, table: &[(char, char)]) -> String {
    s.chars()
        .map(|c| {
            table
                .iter()
                .find(|(full, _)| *full == c)
                .map_or(c, |(_, half)| *half)
        })
        .collect()
}

/// Normalize curly quotes to straight quotes.
pub fn normalize_quotes(s: &str) -> String {
    s.replace(['\u{201C}', '\u{201D}'], "\"")
        .replace(['\u{2018}', '\u{2019}'], "'")
}

/// Collapse any run of whitespace into a single space and trim.
pub fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

// ============================================================================
// TOKENIZER
// ============================================================================

/// Split one song cell into individual song mentions.
///
/// Handles cells like:
/// - "Song1 + Song2", "Song1 / Song2"
/// - "Song1 + Communion"
/// - "Song1 V1 V2 + Song2"
pub fn split_combined_songs(song_text: &str) -> Vec<String> {
    if song_text.trim().is_empty() {
        return Vec::new();
    }

    let without_communion = COMMUNION_MARKER.replace_all(song_text, "");

    SONG_DELIMITER
        .split(&without_communion)
        .map(str::trim)
        .filter(|part| !PURE_SECTION_MARKERS.is_match(part))
        .map(strip_section_markers)
        .filter(|part| !part.is_empty())
        .collect()
}

fn strip_section_markers(part: &str) -> String {
    let part = TRAILING_VERSES.replace(part, "");
    let part = TRAILING_CHORUSES.replace(&part, "");
    TRAILING_BRIDGE.replace(&part, "").trim().to_string()
}

// ============================================================================
// NORMALIZATION FUNCTIONS
// ============================================================================

/// One pass of attribution, annotation and marker stripping. Each step
/// only removes text, so repeated passes reach a fixed point.
fn strip_annotations(text: &str) -> String {
    let mut result = ATTRIBUTION_SUFFIX.replace(text, "").to_string();

    for pattern in ANNOTATION_PATTERNS.iter() {
        result = pattern.replace_all(&result, " ").to_string();
    }

    result = SECTION_MARKER_SUFFIX.replace(&result, "").to_string();

    let result = collapse_whitespace(&result);
    normalize_quotes(result.trim_end_matches([',', '.', ';', ':']))
        .trim()
        .to_string()
}

/// Everything `clean_song_name` does except the alias lookup.
fn normalize_song_text(song: &str) -> Option<String> {
    if song.trim().is_empty() {
        return None;
    }

    // A strip can expose another suffix ("X by Y (Canto)"), so repeat
    // until nothing changes.
    let mut result = fold_punctuation(&fold_pronouns(song), SONG_PUNCTUATION);
    loop {
        let next = strip_annotations(&result);
        if next == result {
            break;
        }
        result = next;
    }
    let result = result.as_str();

    if result.is_empty() || NON_SONG_MARKERS.contains(&result.to_lowercase().as_str()) {
        return None;
    }

    Some(result.to_string())
}

/// Canonicalize a raw song fragment.
///
/// Returns `None` for empty fragments and for service markers such as
/// "Communion" or "Baptism", which are not songs at all.
pub fn clean_song_name(song: &str) -> Option<String> {
    let cleaned = normalize_song_text(song)?;
    match SONG_ALIASES.get(cleaned.as_str()) {
        Some(&canonical) => Some(canonical.to_string()),
        None => Some(cleaned),
    }
}

/// Normalize a praise leader cell.
/// Strips annotations like "(HC)", role prefixes like "P1:", and keeps only the
/// first leader of a joint entry ("Mary / John" → "Mary").
pub fn normalize_leader_name(leader: &str) -> Option<String> {
    let without_notes = LEADER_ANNOTATION.replace_all(leader, "");
    let without_prefix = LEADER_ROLE_PREFIX.replace(without_notes.trim_start(), "");

    let primary = without_prefix.split(['/', '&']).next().unwrap_or("").trim();

    if primary.is_empty() {
        None
    } else {
        Some(primary.to_string())
    }
}

/// Comparison key for set membership tests. Never displayed.
/// e.g. "願你國度彰顯 （Live）" → "願祢國度彰顯(live)"
pub fn normalize_for_comparison(s: &str) -> String {
    let folded = fold_punctuation(&fold_pronouns(s), COMPARISON_PUNCTUATION);
    folded
        .nfkc()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_lowercase()
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_combined_songs_basic() {
        assert_eq!(split_combined_songs("Song1 V1 V2 + Song2"), vec!["Song1", "Song2"]);
        assert_eq!(split_combined_songs("Song A + Communion"), vec!["Song A"]);
        assert!(split_combined_songs("V1 V2").is_empty());
        assert!(split_combined_songs("").is_empty());
        assert!(split_combined_songs("   ").is_empty());
    }

    #[test]
    fn test_split_combined_songs_markers() {
        assert_eq!(split_combined_songs("Song A / Song B C1 C2"), vec!["Song A", "Song B"]);
        assert_eq!(split_combined_songs("Song A B"), vec!["Song A"]);
        assert_eq!(split_combined_songs("Song A + C1 + Song B"), vec!["Song A", "Song B"]);
        assert_eq!(
            split_combined_songs("Song A + Communion + Song B"),
            vec!["Song A", "Song B"]
        );
        // Duplicates are kept in order
        assert_eq!(split_combined_songs("Grace + Grace"), vec!["Grace", "Grace"]);
    }

    #[test]
    fn test_clean_song_name_pronouns() {
        assert_eq!(clean_song_name("願你國度彰顯"), clean_song_name("願祢國度彰顯"));
        assert_eq!(clean_song_name("願袮國度彰顯").as_deref(), Some("願祢國度彰顯"));
    }

    #[test]
    fn test_clean_song_name_annotations() {
        assert_eq!(clean_song_name("Way Maker by Esther Chow").as_deref(), Some("Way Maker"));
        assert_eq!(clean_song_name("Way Maker Medley").as_deref(), Some("Way Maker"));
        assert_eq!(clean_song_name("Grace Medly").as_deref(), Some("Grace"));
        assert_eq!(clean_song_name("Grace medeys").as_deref(), Some("Grace"));
        assert_eq!(clean_song_name("Way Maker by Esther Chow (Canto)").as_deref(), Some("Way Maker"));
        assert_eq!(clean_song_name("Way Maker by Esther Chow C1 V2").as_deref(), Some("Way Maker"));
        assert_eq!(clean_song_name("Way Maker chorus only").as_deref(), Some("Way Maker"));
        assert_eq!(clean_song_name("恩典之路 (Canto)").as_deref(), Some("恩典之路"));
        assert_eq!(clean_song_name("恩典之路 (skip verse)").as_deref(), Some("恩典之路"));
        assert_eq!(clean_song_name("Way Maker C1 V2").as_deref(), Some("Way Maker"));
        assert_eq!(clean_song_name("  Way   Maker ,").as_deref(), Some("Way Maker"));
        assert_eq!(clean_song_name("\u{201C}Here I Am\u{201D}").as_deref(), Some("\"Here I Am\""));
    }

    #[test]
    fn test_clean_song_name_full_width() {
        assert_eq!(clean_song_name("我的心（Still）").as_deref(), Some("我的心(Still)"));
        assert_eq!(clean_song_name("哈利路亞！").as_deref(), Some("哈利路亞!"));
    }

    #[test]
    fn test_clean_song_name_non_songs() {
        assert_eq!(clean_song_name("Communion"), None);
        assert_eq!(clean_song_name("Holy Communion"), None);
        assert_eq!(clean_song_name("BAPTISM"), None);
        assert_eq!(clean_song_name(""), None);
        assert_eq!(clean_song_name("   "), None);
    }

    #[test]
    fn test_clean_song_name_aliases() {
        assert_eq!(clean_song_name("Cornerstone").as_deref(), Some("Cornerstone 房角基石"));
        assert_eq!(clean_song_name("房角石頭(Cornerstone)").as_deref(), Some("Cornerstone 房角基石"));
        assert_eq!(clean_song_name("獻上頌讚 V1").as_deref(), Some("獻上頌讚 (Shout To The Lord)"));
        assert_eq!(clean_song_name("願您平安").as_deref(), Some("願你平安"));
    }

    #[test]
    fn test_alias_closure() {
        for &(raw, canonical) in SONG_NAME_MAPPINGS {
            assert_eq!(clean_song_name(raw), clean_song_name(canonical), "alias {raw}");
        }
    }

    #[test]
    fn test_clean_song_name_idempotent() {
        let samples = [
            "Cornerstone 房角基石",
            "奇異恩典（除掉困鎖）",
            "主禱文（請教導我們禱告）",
            "願你平安",
            "Way Maker by Someone",
            "Way Maker by Esther Chow (Canto)",
            "恩典之路 by Mary Lee (skip verse) C1",
            "願你國度彰顯 Medley",
            "我的心（Still）",
        ];
        for sample in samples {
            let once = clean_song_name(sample).unwrap();
            assert_eq!(clean_song_name(&once).as_deref(), Some(once.as_str()), "sample {sample}");
        }
        for &(_, canonical) in SONG_NAME_MAPPINGS {
            assert_eq!(clean_song_name(canonical).as_deref(), Some(canonical));
        }
    }

    #[test]
    fn test_normalize_leader_name() {
        assert_eq!(normalize_leader_name("John (HC)").as_deref(), Some("John"));
        assert_eq!(normalize_leader_name("P1: Mary").as_deref(), Some("Mary"));
        assert_eq!(normalize_leader_name("A:Mary").as_deref(), Some("Mary"));
        assert_eq!(normalize_leader_name("Mary / John").as_deref(), Some("Mary"));
        assert_eq!(normalize_leader_name("Mary & John").as_deref(), Some("Mary"));
        assert_eq!(normalize_leader_name("Peter Chan（AGW）").as_deref(), Some("Peter Chan"));
        assert_eq!(normalize_leader_name("(HC)"), None);
        assert_eq!(normalize_leader_name(""), None);
    }

    #[test]
    fn test_normalize_for_comparison() {
        assert_eq!(normalize_for_comparison("Cornerstone 房角基石"), "cornerstone房角基石");
        assert_eq!(
            normalize_for_comparison("奇異恩典（除掉困鎖）"),
            normalize_for_comparison("奇異恩典 (除掉困鎖)")
        );
        assert_eq!(normalize_for_comparison("願你平安"), normalize_for_comparison("願祢平安"));
        assert_eq!(normalize_for_comparison("主啊、祢是"), "主啊,祢是");
        assert_eq!(normalize_for_comparison("ＧＲＡＣＥ"), "grace");
    }

    #[test]
    fn test_normalize_for_comparison_idempotent() {
        for s in ["Way Maker 開路者", "「恩典」之路", "  Amazing   Grace ", "奇異恩典（除掉困鎖）"] {
            let once = normalize_for_comparison(s);
            assert_eq!(normalize_for_comparison(&once), once);
        }
    }
}
