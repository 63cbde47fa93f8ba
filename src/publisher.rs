//! Publisher attribution for canonical song names.
//!
//! Each song is matched against the copyright metadata with a tiered
//! strategy (see [`MatchTier`]); the first tier that hits wins. Raw publisher
//! strings are folded onto canonical publishers with [`PUBLISHER_MAPPINGS`],
//! and [`PUBLISHER_DISPLAY_NAMES`] is only consulted when rendering.

use once_cell::sync::Lazy;
use rustc_hash::{FxHashMap, FxHashSet};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

use crate::models::{
    Attribution, CopyrightEntry, LeaderPublisherStats, MatchTier, OtherPublishers,
    PublisherShare, PublisherStats, ServiceRecord, SongCategory, SongCount,
};
use crate::normalize::{normalize_for_comparison, SONG_NAME_MAPPINGS};
use crate::stats::{percentage, Counter};

/// Publishers shown individually per leader; the rest fold into one row.
pub const LEADER_TOP_PUBLISHERS: usize = 5;
pub const GLOBAL_TOP_PUBLISHERS: usize = 20;

// ============================================================================
// STATIC TABLES
// ============================================================================

/// Raw publisher spelling → canonical publisher.
pub const PUBLISHER_MAPPINGS: &[(&str, &str)] = &[
    // Hillsong
    ("Hillsong Music Publishing", "Hillsong Music"),
    ("Hillsong Music Publishing Australia", "Hillsong Music"),
    ("Hillsong Publishing", "Hillsong Music"),
    // Capitol CMG
    ("Capitol CMG Publishing", "Capitol CMG"),
    ("Capitol CMG Genesis", "Capitol CMG"),
    ("CapitolCMGPublishing.com", "Capitol CMG"),
    // Bethel
    ("Bethel Music Publishing", "Bethel Music"),
    // Integrity
    ("Integrity's Hosanna! Music", "Integrity Music"),
    ("Integrity Worship Music", "Integrity Music"),
    // Elevation / Essential
    ("Elevation Worship Publishing", "Elevation Worship"),
    ("Essential Music Publishing", "Essential Music"),
    // Stream of Praise
    ("讚美之泉音樂事工", "讚美之泉"),
    ("讚美之泉 Stream of Praise", "讚美之泉"),
    ("Stream of Praise Music Ministries", "讚美之泉"),
    // Joshua Band
    ("約書亞樂團", "約書亞音樂事工"),
    ("Joshua Band", "約書亞音樂事工"),
    // AFC
    ("基督使者協會", "基督使者協會 AFC"),
    ("Ambassadors For Christ", "基督使者協會 AFC"),
    ("AFC", "基督使者協會 AFC"),
    // Worship Nations
    ("同心圓敬拜福音平台", "同心圓"),
    ("Worship Nations 同心圓", "同心圓"),
];

/// Canonical publisher → name shown in the report.
pub const PUBLISHER_DISPLAY_NAMES: &[(&str, &str)] = &[
    ("讚美之泉", "讚美之泉 Stream of Praise"),
    ("約書亞音樂事工", "約書亞 Joshua Band"),
    ("同心圓", "同心圓 Worship Nations"),
    ("Capitol CMG", "Capitol CMG Publishing"),
];

/// Songs that never get a publisher (public domain hymns, liturgy).
pub const PUBLISHER_EXCLUSIONS: &[&str] = &[
    "三一頌",
    "Doxology",
    "聖哉聖哉聖哉",
    "Holy Holy Holy",
    "奇異恩典",
    "Amazing Grace",
    "平安夜",
    "Silent Night",
];

/// Songs whose publisher is known but missing from (or wrong in) the metadata.
pub const PUBLISHER_OVERRIDES: &[(&str, &str)] = &[
    ("Cornerstone 房角基石", "Hillsong Music Publishing"),
    ("獻上頌讚 (Shout To The Lord)", "Hillsong Music Publishing"),
    ("萬代君主", "Hillsong Music Publishing"),
    ("唯獨在基督裡", "Capitol CMG Publishing"),
    ("奇異恩典（除掉困鎖）", "Capitol CMG Publishing"),
    ("耶和華以勒", "同心圓敬拜福音平台"),
];

static DISPLAY_NAMES: Lazy<FxHashMap<&'static str, &'static str>> =
    Lazy::new(|| PUBLISHER_DISPLAY_NAMES.iter().copied().collect());

/// Name to show for a canonical publisher.
pub fn display_publisher_name(publisher: &str) -> &str {
    DISPLAY_NAMES.get(publisher).copied().unwrap_or(publisher)
}

/// The static tables a matcher is built from.
#[derive(Debug, Clone, Copy)]
pub struct PublisherTables<'a> {
    pub exclusions: &'a [&'a str],
    pub overrides: &'a [(&'a str, &'a str)],
    pub publisher_aliases: &'a [(&'a str, &'a str)],
    pub song_aliases: &'a [(&'a str, &'a str)],
}

impl PublisherTables<'static> {
    pub fn builtin() -> Self {
        Self {
            exclusions: PUBLISHER_EXCLUSIONS,
            overrides: PUBLISHER_OVERRIDES,
            publisher_aliases: PUBLISHER_MAPPINGS,
            song_aliases: SONG_NAME_MAPPINGS,
        }
    }
}

// ============================================================================
// MATCHER
// ============================================================================

/// Two metadata songs with one comparison key but different publishers.
/// The first entry (file order) is used.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeyCollision {
    pub key: String,
    pub kept_song: String,
    pub kept_publisher: String,
    pub ignored_song: String,
    pub ignored_publisher: String,
}

/// Read-only matcher built once per run from the metadata and static tables.
#[derive(Debug)]
pub struct PublisherMatcher {
    publisher_aliases: FxHashMap<String, String>,
    excluded: FxHashSet<String>,
    overrides: FxHashMap<String, String>,
    /// Metadata key → canonical publisher, for the exact tier.
    exact: FxHashMap<String, String>,
    /// (metadata key, canonical publisher) in file order, for substring tiers.
    entries: Vec<(String, String)>,
    /// (canonical song key, raw spelling key) in alias-table order.
    alias_variants: Vec<(String, String)>,
    known_publishers: BTreeSet<String>,
    collisions: Vec<KeyCollision>,
}

impl PublisherMatcher {
    pub fn new(metadata: &[CopyrightEntry]) -> Self {
        Self::with_tables(metadata, PublisherTables::builtin())
    }

    pub fn with_tables(metadata: &[CopyrightEntry], tables: PublisherTables<'_>) -> Self {
        let publisher_aliases: FxHashMap<String, String> = tables
            .publisher_aliases
            .iter()
            .map(|(raw, canonical)| (raw.trim().to_lowercase(), canonical.to_string()))
            .collect();
        let canonical = |raw: &str| resolve_publisher(&publisher_aliases, raw);

        let excluded = tables
            .exclusions
            .iter()
            .map(|song| normalize_for_comparison(song))
            .collect();

        let mut known_publishers = BTreeSet::new();
        let mut overrides = FxHashMap::default();
        for &(song, publisher) in tables.overrides {
            let publisher = canonical(publisher);
            known_publishers.insert(publisher.clone());
            overrides
                .entry(normalize_for_comparison(song))
                .or_insert(publisher);
        }

        let mut exact: FxHashMap<String, String> = FxHashMap::default();
        let mut kept_song: FxHashMap<String, String> = FxHashMap::default();
        let mut entries = Vec::with_capacity(metadata.len());
        let mut collisions = Vec::new();
        for entry in metadata {
            let publisher = canonical(&entry.publisher);
            known_publishers.insert(publisher.clone());

            let key = normalize_for_comparison(&entry.song);
            if key.is_empty() {
                continue;
            }
            match exact.get(&key) {
                Some(existing) if *existing != publisher => collisions.push(KeyCollision {
                    key: key.clone(),
                    kept_song: kept_song.get(&key).cloned().unwrap_or_default(),
                    kept_publisher: existing.clone(),
                    ignored_song: entry.song.clone(),
                    ignored_publisher: publisher.clone(),
                }),
                Some(_) => {}
                None => {
                    exact.insert(key.clone(), publisher.clone());
                    kept_song.insert(key.clone(), entry.song.clone());
                }
            }
            entries.push((key, publisher));
        }

        let alias_variants = tables
            .song_aliases
            .iter()
            .map(|(raw, canonical)| (normalize_for_comparison(canonical), normalize_for_comparison(raw)))
            .filter(|(_, raw_key)| !raw_key.is_empty())
            .collect();

        Self {
            publisher_aliases,
            excluded,
            overrides,
            exact,
            entries,
            alias_variants,
            known_publishers,
            collisions,
        }
    }

    /// Fold a raw publisher string onto its canonical publisher.
    pub fn canonical_publisher(&self, raw: &str) -> String {
        resolve_publisher(&self.publisher_aliases, raw)
    }

    /// Every canonical publisher named by the metadata or the overrides.
    pub fn known_publishers(&self) -> &BTreeSet<String> {
        &self.known_publishers
    }

    pub fn collisions(&self) -> &[KeyCollision] {
        &self.collisions
    }

    pub fn metadata_len(&self) -> usize {
        self.entries.len()
    }

    /// Attribute one canonical song name to a publisher.
    pub fn attribute(&self, song: &str) -> Attribution {
        let key = normalize_for_comparison(song);

        if self.excluded.contains(&key) {
            return Attribution::none(MatchTier::Excluded);
        }
        if let Some(publisher) = self.overrides.get(&key) {
            return hit(publisher, MatchTier::Override);
        }
        if let Some(publisher) = self.exact.get(&key) {
            return hit(publisher, MatchTier::Exact);
        }
        if key.is_empty() {
            return Attribution::none(MatchTier::Unmatched);
        }

        if let Some((_, publisher)) = self.entries.iter().find(|(meta, _)| key.contains(meta.as_str())) {
            return hit(publisher, MatchTier::MetadataInSong);
        }
        if let Some((_, publisher)) = self.entries.iter().find(|(meta, _)| meta.contains(key.as_str())) {
            return hit(publisher, MatchTier::SongInMetadata);
        }

        for (canonical_key, raw_key) in &self.alias_variants {
            if *canonical_key != key {
                continue;
            }
            let found = self.entries.iter().find(|(meta, _)| {
                raw_key.contains(meta.as_str()) || meta.contains(raw_key.as_str())
            });
            if let Some((_, publisher)) = found {
                return hit(publisher, MatchTier::AliasVariant);
            }
        }

        Attribution::none(MatchTier::Unmatched)
    }

    /// Attribute every distinct song once.
    pub fn attribute_all<'a, I>(&self, songs: I) -> FxHashMap<String, Attribution>
    where
        I: IntoIterator<Item = &'a String>,
    {
        let mut attributions = FxHashMap::default();
        for song in songs {
            if !attributions.contains_key(song) {
                attributions.insert(song.clone(), self.attribute(song));
            }
        }
        attributions
    }
}

fn hit(publisher: &str, tier: MatchTier) -> Attribution {
    Attribution {
        publisher: Some(publisher.to_string()),
        tier,
    }
}

fn resolve_publisher(aliases: &FxHashMap<String, String>, raw: &str) -> String {
    let trimmed = raw.trim();
    aliases
        .get(&trimmed.to_lowercase())
        .cloned()
        .unwrap_or_else(|| trimmed.to_string())
}

// ============================================================================
// AGGREGATION
// ============================================================================

fn publisher_of<'a>(attributions: &'a FxHashMap<String, Attribution>, song: &str) -> Option<&'a str> {
    attributions.get(song).and_then(|a| a.publisher.as_deref())
}

/// Per-leader breakdown over praise-slot songs: top five publishers, one row
/// for the rest, one row for songs without a publisher.
pub fn leader_publisher_stats<'a, I>(
    songs: I,
    attributions: &FxHashMap<String, Attribution>,
) -> LeaderPublisherStats
where
    I: IntoIterator<Item = &'a String>,
{
    let mut counter = Counter::default();
    let mut total = 0;
    let mut unmatched = 0;
    for song in songs {
        total += 1;
        match publisher_of(attributions, song) {
            Some(publisher) => counter.add(publisher),
            None => unmatched += 1,
        }
    }

    let ranked = counter.most_common(usize::MAX);
    let top_publishers = ranked
        .iter()
        .take(LEADER_TOP_PUBLISHERS)
        .map(|(publisher, occurrences)| PublisherShare {
            publisher: publisher.clone(),
            occurrences: *occurrences,
            percentage: percentage(*occurrences, total),
        })
        .collect();

    let rest = &ranked[ranked.len().min(LEADER_TOP_PUBLISHERS)..];
    let other = if rest.is_empty() {
        None
    } else {
        let occurrences = rest.iter().map(|(_, n)| n).sum();
        Some(OtherPublishers {
            publisher_count: rest.len(),
            occurrences,
            percentage: percentage(occurrences, total),
        })
    };

    LeaderPublisherStats {
        total_occurrences: total,
        top_publishers,
        other,
        unmatched_occurrences: unmatched,
        unmatched_percentage: percentage(unmatched, total),
    }
}

fn songs_with_tier(
    counter: &Counter,
    attributions: &FxHashMap<String, Attribution>,
    tier: MatchTier,
) -> Vec<SongCount> {
    let mut songs: Vec<SongCount> = counter
        .iter()
        .filter(|(song, _)| attributions.get(*song).is_some_and(|a| a.tier == tier))
        .map(|(song, n)| (song.clone(), n))
        .collect();
    songs.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    songs
}

/// Publisher statistics for one report year.
pub fn calculate_publisher_stats(
    services: &[ServiceRecord],
    year: i32,
    matcher: &PublisherMatcher,
) -> PublisherStats {
    let year_services: Vec<&ServiceRecord> = services.iter().filter(|s| s.year() == year).collect();

    let attributions = matcher.attribute_all(year_services.iter().flat_map(|s| s.all_songs()));

    // Leaders in first-seen order
    let mut leader_songs: Vec<(&str, Vec<&String>)> = Vec::new();
    for service in &year_services {
        let idx = match leader_songs.iter().position(|(l, _)| *l == service.leader) {
            Some(idx) => idx,
            None => {
                leader_songs.push((&service.leader, Vec::new()));
                leader_songs.len() - 1
            }
        };
        leader_songs[idx].1.extend(service.praise_songs());
    }
    let per_leader: BTreeMap<String, LeaderPublisherStats> = leader_songs
        .into_iter()
        .map(|(leader, songs)| (leader.to_string(), leader_publisher_stats(songs, &attributions)))
        .collect();

    let mut by_category: FxHashMap<SongCategory, Counter> = FxHashMap::default();
    let mut combined = Counter::default();
    let mut all_slots = Counter::default();
    let mut song_occurrences = Counter::default();
    for service in &year_services {
        for category in [SongCategory::Praise1, SongCategory::Praise2, SongCategory::Peace] {
            for song in service.songs(category) {
                song_occurrences.add(song);
                let Some(publisher) = publisher_of(&attributions, song) else {
                    continue;
                };
                by_category.entry(category).or_default().add(publisher);
                all_slots.add(publisher);
                if category != SongCategory::Peace {
                    combined.add(publisher);
                }
            }
        }
    }
    let top = |category: SongCategory| {
        by_category
            .get(&category)
            .map(|c| c.most_common(GLOBAL_TOP_PUBLISHERS))
            .unwrap_or_default()
    };

    let mut all_publishers: Vec<(String, usize)> = matcher
        .known_publishers()
        .iter()
        .map(|p| (p.clone(), all_slots.get(p)))
        .collect();
    for (publisher, n) in all_slots.iter() {
        if !matcher.known_publishers().contains(publisher) {
            all_publishers.push((publisher.clone(), n));
        }
    }
    all_publishers.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

    PublisherStats {
        per_leader,
        praise1_top20: top(SongCategory::Praise1),
        praise2_top20: top(SongCategory::Praise2),
        peace_top20: top(SongCategory::Peace),
        combined_top20: combined.most_common(GLOBAL_TOP_PUBLISHERS),
        all_publishers,
        unmatched_songs: songs_with_tier(&song_occurrences, &attributions, MatchTier::Unmatched),
        excluded_songs: songs_with_tier(&song_occurrences, &attributions, MatchTier::Excluded),
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn entry(song: &str, publisher: &str) -> CopyrightEntry {
        CopyrightEntry {
            song: song.to_string(),
            publisher: publisher.to_string(),
        }
    }

    fn metadata() -> Vec<CopyrightEntry> {
        vec![
            entry("Way Maker", "Integrity Worship Music"),
            entry("Goodness of God 神的良善", "Bethel Music Publishing"),
            entry("海會分開 (Live)", "Hillsong Publishing"),
            entry("Grace", "Small Label"),
        ]
    }

    const ALIASES: &[(&str, &str)] = &[("Hillsong Publishing", "Hillsong Music"), ("Integrity Worship Music", "Integrity Music")];

    fn tables() -> PublisherTables<'static> {
        PublisherTables {
            exclusions: &["Amazing Grace", "Silent Night"],
            overrides: &[("Amazing Grace", "Override Co"), ("Cornerstone", "Hillsong Publishing")],
            publisher_aliases: ALIASES,
            song_aliases: &[("海會分開", "Ocean Will Part")],
        }
    }

    #[test]
    fn test_exclusion_beats_override() {
        let matcher = PublisherMatcher::with_tables(&metadata(), tables());
        assert_eq!(matcher.attribute("Amazing  grace"), Attribution::none(MatchTier::Excluded));
    }

    #[test]
    fn test_override_is_alias_resolved() {
        let matcher = PublisherMatcher::with_tables(&metadata(), tables());
        let a = matcher.attribute("cornerstone");
        assert_eq!(a.tier, MatchTier::Override);
        assert_eq!(a.publisher.as_deref(), Some("Hillsong Music"));
    }

    #[test]
    fn test_exact_and_substring_tiers() {
        let matcher = PublisherMatcher::with_tables(&metadata(), tables());

        let exact = matcher.attribute("WAY MAKER");
        assert_eq!(exact.tier, MatchTier::Exact);
        assert_eq!(exact.publisher.as_deref(), Some("Integrity Music"));

        let meta_in_song = matcher.attribute("Way Maker 開路者");
        assert_eq!(meta_in_song.tier, MatchTier::MetadataInSong);
        assert_eq!(meta_in_song.publisher.as_deref(), Some("Integrity Music"));

        let song_in_meta = matcher.attribute("Goodness of God");
        assert_eq!(song_in_meta.tier, MatchTier::SongInMetadata);
        assert_eq!(song_in_meta.publisher.as_deref(), Some("Bethel Music Publishing"));
    }

    #[test]
    fn test_alias_variant_tier() {
        let matcher = PublisherMatcher::with_tables(&metadata(), tables());
        let a = matcher.attribute("Ocean Will Part");
        assert_eq!(a.tier, MatchTier::AliasVariant);
        assert_eq!(a.publisher.as_deref(), Some("Hillsong Music"));
    }

    #[test]
    fn test_unmatched_and_empty_metadata() {
        let matcher = PublisherMatcher::with_tables(&metadata(), tables());
        assert_eq!(matcher.attribute("我要向高山舉目"), Attribution::none(MatchTier::Unmatched));

        let empty = PublisherMatcher::with_tables(&[], tables());
        assert_eq!(empty.attribute("Way Maker").tier, MatchTier::Unmatched);
    }

    #[test]
    fn test_key_collision_keeps_first() {
        let meta = vec![entry("Grace", "Label A"), entry("grace", "Label B"), entry("GRACE", "Label A")];
        let matcher = PublisherMatcher::with_tables(&meta, tables());
        assert_eq!(matcher.collisions().len(), 1);
        assert_eq!(matcher.collisions()[0].kept_song, "Grace");
        assert_eq!(matcher.collisions()[0].ignored_publisher, "Label B");
        assert_eq!(matcher.attribute("Grace").publisher.as_deref(), Some("Label A"));
    }

    #[test]
    fn test_builtin_tables() {
        let matcher = PublisherMatcher::new(&[]);
        assert_eq!(matcher.attribute("Cornerstone 房角基石").publisher.as_deref(), Some("Hillsong Music"));
        assert_eq!(matcher.attribute("Doxology").tier, MatchTier::Excluded);
        assert_eq!(matcher.canonical_publisher(" stream of praise music ministries "), "讚美之泉");
        assert_eq!(display_publisher_name("讚美之泉"), "讚美之泉 Stream of Praise");
        assert_eq!(display_publisher_name("Bethel Music"), "Bethel Music");
    }

    fn service(date: (i32, u32, u32), leader: &str, praise1: &[&str], peace: &[&str]) -> ServiceRecord {
        ServiceRecord {
            date: NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap(),
            leader: leader.to_string(),
            theme: String::new(),
            praise1: praise1.iter().map(|s| s.to_string()).collect(),
            praise2: Vec::new(),
            peace: peace.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_leader_publisher_stats_top_five_and_other() {
        let meta: Vec<CopyrightEntry> = (1..=7).map(|i| entry(&format!("Song {i}"), &format!("Pub {i}"))).collect();
        let matcher = PublisherMatcher::with_tables(&meta, tables());
        let songs: Vec<String> = ["Song 1", "Song 1", "Song 2", "Song 3", "Song 4", "Song 5", "Song 6", "Song 7", "Mystery"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let attributions = matcher.attribute_all(&songs);
        let stats = leader_publisher_stats(&songs, &attributions);

        assert_eq!(stats.total_occurrences, 9);
        assert_eq!(stats.top_publishers.len(), 5);
        assert_eq!(stats.top_publishers[0].publisher, "Pub 1");
        assert_eq!(stats.top_publishers[0].occurrences, 2);
        let other = stats.other.unwrap();
        assert_eq!(other.publisher_count, 2);
        assert_eq!(other.occurrences, 2);
        assert_eq!(stats.unmatched_occurrences, 1);
        assert!((stats.unmatched_percentage - 100.0 / 9.0).abs() < 1e-9);
    }

    #[test]
    fn test_leader_publisher_stats_empty() {
        let attributions = FxHashMap::default();
        let stats = leader_publisher_stats(std::iter::empty::<&String>(), &attributions);
        assert_eq!(stats.total_occurrences, 0);
        assert_eq!(stats.unmatched_percentage, 0.0);
        assert!(stats.other.is_none());
    }

    #[test]
    fn test_calculate_publisher_stats() {
        let services = vec![
            service((2025, 1, 4), "John", &["Way Maker", "Mystery Song"], &["Silent Night"]),
            service((2025, 1, 5), "Mary", &["Way Maker", "Grace"], &["Way Maker"]),
            service((2024, 12, 28), "John", &["Grace"], &[]),
        ];
        let matcher = PublisherMatcher::with_tables(&metadata(), tables());
        let stats = calculate_publisher_stats(&services, 2025, &matcher);

        assert_eq!(stats.per_leader.len(), 2);
        let john = &stats.per_leader["John"];
        assert_eq!(john.total_occurrences, 2);
        assert_eq!(john.unmatched_occurrences, 1);
        assert_eq!(stats.praise1_top20[0], ("Integrity Music".to_string(), 2));
        assert_eq!(stats.peace_top20, vec![("Integrity Music".to_string(), 1)]);
        assert_eq!(stats.combined_top20.len(), 2);
        assert_eq!(stats.unmatched_songs, vec![("Mystery Song".to_string(), 1)]);
        assert_eq!(stats.excluded_songs, vec![("Silent Night".to_string(), 1)]);

        // Every known publisher is listed, zero-occurrence ones last
        assert_eq!(stats.all_publishers[0], ("Integrity Music".to_string(), 3));
        assert!(stats.all_publishers.contains(&("Bethel Music Publishing".to_string(), 0)));
        assert!(stats.all_publishers.contains(&("Hillsong Music".to_string(), 0)));
    }

    #[test]
    fn test_unmatched_and_excluded_songs_ranked_by_count() {
        let services = vec![
            service((2025, 2, 1), "John", &["Song B", "Song A", "Song C"], &["Silent Night"]),
            service((2025, 2, 2), "Mary", &["Song C", "Song A", "Amazing Grace"], &[]),
            service((2025, 2, 8), "John", &["Song C", "Way Maker", "Song AB"], &["Amazing Grace"]),
        ];
        let matcher = PublisherMatcher::with_tables(&metadata(), tables());
        let stats = calculate_publisher_stats(&services, 2025, &matcher);

        // Count descending, then name ascending for ties
        assert_eq!(
            stats.unmatched_songs,
            vec![
                ("Song C".to_string(), 3),
                ("Song A".to_string(), 2),
                ("Song AB".to_string(), 1),
                ("Song B".to_string(), 1),
            ]
        );
        assert_eq!(
            stats.excluded_songs,
            vec![("Amazing Grace".to_string(), 2), ("Silent Night".to_string(), 1)]
        );
    }
}
