//! Core data models for the worship report.
//!
//! This module contains the service record, the aggregate structures handed
//! to the report assembler, and run instrumentation.

use chrono::{Datelike, NaiveDate, Weekday};
use serde::Serialize;
use std::collections::BTreeMap;
use thiserror::Error;

// ============================================================================
// Type Aliases
// ============================================================================

/// Set of comparison keys (see `normalize::normalize_for_comparison`).
pub type ComparisonKeySet = rustc_hash::FxHashSet<String>;

/// (song, occurrence count), ordered by count descending.
pub type SongCount = (String, usize);

// ============================================================================
// Service Records
// ============================================================================

/// The three song slots of a service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SongCategory {
    Praise1,
    Praise2,
    Peace,
}

/// One worship service, built from one consolidated spreadsheet row.
/// Every song name has already been through `clean_song_name`.
#[derive(Clone, Debug, Serialize)]
pub struct ServiceRecord {
    pub date: NaiveDate,
    pub leader: String,
    pub theme: String,
    pub praise1: Vec<String>,
    pub praise2: Vec<String>,
    pub peace: Vec<String>,
}

impl ServiceRecord {
    pub fn year(&self) -> i32 {
        self.date.year()
    }

    pub fn month(&self) -> u32 {
        self.date.month()
    }

    pub fn weekday(&self) -> Weekday {
        self.date.weekday()
    }

    pub fn songs(&self, category: SongCategory) -> &[String] {
        match category {
            SongCategory::Praise1 => &self.praise1,
            SongCategory::Praise2 => &self.praise2,
            SongCategory::Peace => &self.peace,
        }
    }

    /// praise1 ++ praise2, the slots publisher attribution and multi-leader
    /// counting look at.
    pub fn praise_songs(&self) -> impl Iterator<Item = &String> {
        self.praise1.iter().chain(self.praise2.iter())
    }

    /// praise1 ++ praise2 ++ peace
    pub fn all_songs(&self) -> impl Iterator<Item = &String> {
        self.praise_songs().chain(self.peace.iter())
    }
}

/// Why a consolidated row did not become a service. Rows are dropped
/// silently; the reason only feeds [`PipelineStats`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowSkip {
    TooFewColumns,
    MissingDate,
    InvalidDate,
    NoLeader,
}

// ============================================================================
// Reference Data
// ============================================================================

/// Non-fatal problem with a reference file. The dependent feature degrades
/// (empty baseline, empty metadata) and the run continues.
#[derive(Debug, Error)]
pub enum ReferenceWarning {
    #[error("{label} file not found: {path}")]
    MissingFile { label: &'static str, path: String },
    #[error("{label} file could not be read ({path}): {reason}")]
    Unreadable {
        label: &'static str,
        path: String,
        reason: String,
    },
}

/// A loaded reference table plus the warning raised while loading it, if any.
#[derive(Debug)]
pub struct Loaded<T> {
    pub value: T,
    pub warning: Option<ReferenceWarning>,
}

impl<T> Loaded<T> {
    pub fn ok(value: T) -> Self {
        Self {
            value,
            warning: None,
        }
    }

    pub fn degraded(value: T, warning: ReferenceWarning) -> Self {
        Self {
            value,
            warning: Some(warning),
        }
    }
}

/// One row of the copyright metadata table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CopyrightEntry {
    pub song: String,
    pub publisher: String,
}

// ============================================================================
// Leader Statistics
// ============================================================================

/// Why a per-leader top list is shorter than 20.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TopListNote {
    /// Some songs repeated; every other song appeared only once.
    AllOthersOnce,
    /// Songs were sung, but none more than once.
    AllOnce,
    /// Nothing was sung in this slot.
    NoData,
}

/// Top list that only admits songs sung more than once.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RepeatedTopList {
    pub entries: Vec<SongCount>,
    pub note: Option<TopListNote>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LeaderStats {
    pub name: String,
    pub total_services: usize,
    pub total_songs: usize,
    pub praise1_top20: RepeatedTopList,
    pub praise2_top20: RepeatedTopList,
    pub peace_top20: RepeatedTopList,
    pub combined_top20: RepeatedTopList,
    /// Distinct songs whose comparison key is not in the historical baseline.
    pub new_songs: Vec<String>,
    pub common_songs_count: usize,
    /// Up to two other leaders with the largest song-set overlap.
    pub top2_leaders_overlap: Vec<(String, usize)>,
}

// ============================================================================
// Global Statistics
// ============================================================================

/// A song chosen by several leaders (praise slots only).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MultiLeaderSong {
    pub song: String,
    pub leader_count: usize,
    pub leaders: Vec<String>,
    pub total_count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct GlobalStats {
    pub total_services: usize,
    pub total_unique_songs: usize,
    pub praise1_top20: Vec<SongCount>,
    pub praise2_top20: Vec<SongCount>,
    pub combined_top20: Vec<SongCount>,
    pub top10_multi_leader: Vec<MultiLeaderSong>,
    pub peace_top3: Vec<SongCount>,
    pub new_songs: Vec<String>,
    pub songs_previous_year_not_current: Vec<String>,
    pub unique_songs: Vec<String>,
}

/// A service that introduced at least one new song, with the songs it
/// introduced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewSongIntroduction {
    pub date: NaiveDate,
    pub songs: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct WeekdayNewSongUsage {
    pub weekday: String,
    pub total_services: usize,
    pub services_with_new_song: usize,
    pub percentage: f64,
    pub introductions: Vec<NewSongIntroduction>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewSongUsage {
    pub total_services: usize,
    pub services_with_new_song: usize,
    pub percentage: f64,
    pub by_weekday: Vec<WeekdayNewSongUsage>,
}

// ============================================================================
// Publisher Statistics
// ============================================================================

/// How a song's publisher was found. Tiers are tried in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchTier {
    /// Song is on the exclusion list (public domain, liturgy); no publisher.
    Excluded,
    /// Static song → publisher override.
    Override,
    /// Comparison keys equal.
    Exact,
    /// Metadata key is contained in the song key.
    MetadataInSong,
    /// Song key is contained in a metadata key.
    SongInMetadata,
    /// Substring match against one of the song's raw alias spellings.
    AliasVariant,
    /// Nothing matched.
    Unmatched,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Attribution {
    /// Canonical publisher (after `PUBLISHER_MAPPINGS`).
    pub publisher: Option<String>,
    pub tier: MatchTier,
}

impl Attribution {
    pub fn none(tier: MatchTier) -> Self {
        Self {
            publisher: None,
            tier,
        }
    }
}

/// Occurrences attributed to one canonical publisher.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PublisherShare {
    pub publisher: String,
    pub occurrences: usize,
    pub percentage: f64,
}

/// Publishers beyond the top five, folded into one row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OtherPublishers {
    pub publisher_count: usize,
    pub occurrences: usize,
    pub percentage: f64,
}

/// Per-leader publisher breakdown over praise1 and praise2 songs.
#[derive(Debug, Clone, Serialize)]
pub struct LeaderPublisherStats {
    pub total_occurrences: usize,
    pub top_publishers: Vec<PublisherShare>,
    pub other: Option<OtherPublishers>,
    /// Occurrences with no publisher, excluded songs included.
    pub unmatched_occurrences: usize,
    pub unmatched_percentage: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct PublisherStats {
    pub per_leader: BTreeMap<String, LeaderPublisherStats>,
    pub praise1_top20: Vec<(String, usize)>,
    pub praise2_top20: Vec<(String, usize)>,
    pub peace_top20: Vec<(String, usize)>,
    pub combined_top20: Vec<(String, usize)>,
    /// Every known publisher, zero-occurrence ones included, count descending
    /// then name ascending.
    pub all_publishers: Vec<(String, usize)>,
    /// Songs no tier could attribute, occurrence count descending.
    pub unmatched_songs: Vec<SongCount>,
    /// Songs on the exclusion list, occurrence count descending.
    pub excluded_songs: Vec<SongCount>,
}

// ============================================================================
// Statistics (Instrumentation)
// ============================================================================

/// Per-run pipeline counters.
#[derive(Default, Debug, Clone, Serialize)]
pub struct PipelineStats {
    // Loading
    pub rows_read: usize,
    pub logical_records: usize,
    pub services_built: usize,
    pub skipped_too_few_columns: usize,
    pub skipped_missing_date: usize,
    pub skipped_invalid_date: usize,
    pub skipped_no_leader: usize,

    // Reference data
    pub baseline_keys: usize,
    pub metadata_entries: usize,
    pub metadata_key_collisions: usize,

    // Report year
    pub year: i32,
    pub year_services: usize,
    pub leaders: usize,
    pub distinct_songs: usize,
    pub matched_songs: usize,
    pub excluded_songs: usize,
    pub unmatched_songs: usize,

    // Timing
    pub elapsed_seconds: f64,
}

impl PipelineStats {
    pub fn record_skip(&mut self, skip: RowSkip) {
        match skip {
            RowSkip::TooFewColumns => self.skipped_too_few_columns += 1,
            RowSkip::MissingDate => self.skipped_missing_date += 1,
            RowSkip::InvalidDate => self.skipped_invalid_date += 1,
            RowSkip::NoLeader => self.skipped_no_leader += 1,
        }
    }

    pub fn total_skipped(&self) -> usize {
        self.skipped_too_few_columns
            + self.skipped_missing_date
            + self.skipped_invalid_date
            + self.skipped_no_leader
    }

    /// Share of distinct report-year songs with a publisher, as a percentage
    pub fn match_rate(&self) -> f64 {
        if self.distinct_songs == 0 {
            0.0
        } else {
            100.0 * self.matched_songs as f64 / self.distinct_songs as f64
        }
    }

    /// Log stats to stderr in JSON format
    pub fn log_phase(&self, phase: &str) {
        if let Ok(json) = serde_json::to_string_pretty(self) {
            eprintln!("[STATS:{}]\n{}", phase, json);
        }
    }

    /// Write stats to a JSON file
    pub fn write_to_file(&self, path: &std::path::Path) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> ServiceRecord {
        ServiceRecord {
            date: NaiveDate::from_ymd_opt(2025, 1, 4).unwrap(),
            leader: "John".to_string(),
            theme: String::new(),
            praise1: vec!["A".to_string(), "B".to_string()],
            praise2: vec!["C".to_string()],
            peace: vec!["D".to_string()],
        }
    }

    #[test]
    fn test_service_derived_fields() {
        let s = service();
        assert_eq!(s.year(), 2025);
        assert_eq!(s.month(), 1);
        assert_eq!(s.weekday(), Weekday::Sat);
        assert_eq!(s.all_songs().cloned().collect::<Vec<_>>(), vec!["A", "B", "C", "D"]);
        assert_eq!(s.praise_songs().count(), 3);
        assert_eq!(s.songs(SongCategory::Peace), ["D".to_string()]);
    }

    #[test]
    fn test_pipeline_stats_skips() {
        let mut stats = PipelineStats::default();
        stats.record_skip(RowSkip::InvalidDate);
        stats.record_skip(RowSkip::NoLeader);
        stats.record_skip(RowSkip::NoLeader);
        assert_eq!(stats.skipped_no_leader, 2);
        assert_eq!(stats.total_skipped(), 3);
        assert_eq!(stats.match_rate(), 0.0);
    }
}
