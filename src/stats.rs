//! Leader and global statistics for one report year.
//!
//! All structures are rebuilt from the immutable service list on every run.

use chrono::Weekday;
use rustc_hash::{FxHashMap, FxHashSet};
use std::collections::{BTreeMap, BTreeSet};

use crate::models::{
    ComparisonKeySet, GlobalStats, LeaderStats, MultiLeaderSong, NewSongIntroduction,
    NewSongUsage, RepeatedTopList, ServiceRecord, SongCategory, SongCount, TopListNote,
    WeekdayNewSongUsage,
};
use crate::normalize::normalize_for_comparison;

pub const TOP_SONGS: usize = 20;
pub const TOP_MULTI_LEADER_SONGS: usize = 10;
pub const TOP_PEACE_SONGS: usize = 3;
pub const TOP_SIMILAR_LEADERS: usize = 2;
/// A song must be chosen by this many distinct leaders to count as multi-leader.
pub const MIN_MULTI_LEADERS: usize = 3;

/// Weekdays reported separately in new-song usage (Saturday evening and
/// Sunday morning services).
pub const NEW_SONG_WEEKDAYS: [Weekday; 2] = [Weekday::Sat, Weekday::Sun];

// ============================================================================
// Counter
// ============================================================================

/// Occurrence counter that remembers first-seen order, so `most_common`
/// breaks ties by whichever item appeared first.
#[derive(Debug, Clone, Default)]
pub struct Counter {
    order: Vec<String>,
    counts: FxHashMap<String, usize>,
}

impl Counter {
    pub fn add(&mut self, item: &str) {
        match self.counts.get_mut(item) {
            Some(n) => *n += 1,
            None => {
                self.order.push(item.to_string());
                self.counts.insert(item.to_string(), 1);
            }
        }
    }

    pub fn extend<'a, I>(&mut self, items: I)
    where
        I: IntoIterator<Item = &'a String>,
    {
        for item in items {
            self.add(item);
        }
    }

    pub fn get(&self, item: &str) -> usize {
        self.counts.get(item).copied().unwrap_or(0)
    }

    /// Number of distinct items
    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Sum of all counts
    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }

    /// Items with their counts, in first-seen order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, usize)> {
        self.order.iter().map(|item| (item, self.counts[item]))
    }

    /// The `n` highest counts, ties in first-seen order.
    pub fn most_common(&self, n: usize) -> Vec<SongCount> {
        let mut ranked: Vec<SongCount> = self.iter().map(|(item, c)| (item.clone(), c)).collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1));
        ranked.truncate(n);
        ranked
    }
}

/// `part` as a percentage of `total`; 0 when `total` is 0.
pub fn percentage(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        100.0 * part as f64 / total as f64
    }
}

// ============================================================================
// Helpers
// ============================================================================

pub fn year_services(services: &[ServiceRecord], year: i32) -> Vec<&ServiceRecord> {
    services.iter().filter(|s| s.year() == year).collect()
}

/// Distinct songs whose comparison key is not in the baseline, sorted.
pub fn new_songs<'a, I>(songs: I, baseline: &ComparisonKeySet) -> Vec<String>
where
    I: IntoIterator<Item = &'a String>,
{
    let distinct: BTreeSet<&String> = songs.into_iter().collect();
    distinct
        .into_iter()
        .filter(|song| !baseline.contains(&normalize_for_comparison(song)))
        .cloned()
        .collect()
}

/// Comparison keys of the report's new songs, handed to the renderer.
pub fn new_song_keys(global: &GlobalStats) -> ComparisonKeySet {
    global
        .new_songs
        .iter()
        .map(|song| normalize_for_comparison(song))
        .collect()
}

/// Top list restricted to songs sung more than once.
pub fn repeated_top(counter: &Counter) -> RepeatedTopList {
    let entries: Vec<SongCount> = counter
        .most_common(TOP_SONGS)
        .into_iter()
        .filter(|(_, count)| *count > 1)
        .collect();

    let note = if counter.is_empty() {
        Some(TopListNote::NoData)
    } else if entries.is_empty() {
        Some(TopListNote::AllOnce)
    } else if entries.len() < TOP_SONGS && counter.len() > entries.len() {
        Some(TopListNote::AllOthersOnce)
    } else {
        None
    };

    RepeatedTopList { entries, note }
}

/// Group services by leader, leaders in first-seen order.
fn group_by_leader<'a>(services: &[&'a ServiceRecord]) -> Vec<(&'a str, Vec<&'a ServiceRecord>)> {
    let mut index: FxHashMap<&str, usize> = FxHashMap::default();
    let mut groups: Vec<(&str, Vec<&ServiceRecord>)> = Vec::new();
    for &service in services {
        let idx = *index.entry(service.leader.as_str()).or_insert_with(|| {
            groups.push((service.leader.as_str(), Vec::new()));
            groups.len() - 1
        });
        groups[idx].1.push(service);
    }
    groups
}

// ============================================================================
// Section A: per leader
// ============================================================================

/// Statistics for each praise leader active in `year`.
pub fn calculate_leader_stats(
    services: &[ServiceRecord],
    year: i32,
    baseline: &ComparisonKeySet,
) -> BTreeMap<String, LeaderStats> {
    let year_services = year_services(services, year);
    let groups = group_by_leader(&year_services);

    let song_sets: Vec<FxHashSet<&str>> = groups
        .iter()
        .map(|(_, svcs)| {
            svcs.iter()
                .copied()
                .flat_map(|s| s.all_songs())
                .map(String::as_str)
                .collect()
        })
        .collect();

    let mut stats = BTreeMap::new();

    for (i, (leader, leader_services)) in groups.iter().enumerate() {
        let mut praise1 = Counter::default();
        let mut praise2 = Counter::default();
        let mut peace = Counter::default();
        let mut combined = Counter::default();
        for svc in leader_services {
            praise1.extend(svc.songs(SongCategory::Praise1));
            praise2.extend(svc.songs(SongCategory::Praise2));
            peace.extend(svc.songs(SongCategory::Peace));
            combined.extend(svc.all_songs());
        }

        let own = &song_sets[i];

        let others: FxHashSet<&str> = song_sets
            .iter()
            .enumerate()
            .filter(|(j, _)| *j != i)
            .flat_map(|(_, set)| set.iter().copied())
            .collect();
        let common_songs_count = own.intersection(&others).count();

        let mut overlaps: Vec<(String, usize)> = groups
            .iter()
            .zip(&song_sets)
            .enumerate()
            .filter(|(j, _)| *j != i)
            .map(|(_, ((other, _), set))| (other.to_string(), own.intersection(set).count()))
            .filter(|(_, n)| *n > 0)
            .collect();
        overlaps.sort_by(|a, b| b.1.cmp(&a.1));
        overlaps.truncate(TOP_SIMILAR_LEADERS);

        stats.insert(
            leader.to_string(),
            LeaderStats {
                name: leader.to_string(),
                total_services: leader_services.len(),
                total_songs: combined.total(),
                praise1_top20: repeated_top(&praise1),
                praise2_top20: repeated_top(&praise2),
                peace_top20: repeated_top(&peace),
                combined_top20: repeated_top(&combined),
                new_songs: new_songs(leader_services.iter().copied().flat_map(|s| s.all_songs()), baseline),
                common_songs_count,
                top2_leaders_overlap: overlaps,
            },
        );
    }

    stats
}

// ============================================================================
// Section B: global
// ============================================================================

/// Statistics across all leaders for `year`.
pub fn calculate_global_stats(
    services: &[ServiceRecord],
    year: i32,
    baseline: &ComparisonKeySet,
) -> GlobalStats {
    let current = year_services(services, year);

    let mut praise1 = Counter::default();
    let mut praise2 = Counter::default();
    let mut praise_combined = Counter::default();
    let mut peace = Counter::default();
    let mut song_leaders: Vec<(&String, BTreeSet<&str>)> = Vec::new();
    let mut song_index: FxHashMap<&str, usize> = FxHashMap::default();

    for svc in &current {
        praise1.extend(svc.songs(SongCategory::Praise1));
        praise2.extend(svc.songs(SongCategory::Praise2));
        praise_combined.extend(svc.praise_songs());
        peace.extend(svc.songs(SongCategory::Peace));

        for song in svc.praise_songs() {
            let idx = *song_index.entry(song.as_str()).or_insert_with(|| {
                song_leaders.push((song, BTreeSet::new()));
                song_leaders.len() - 1
            });
            song_leaders[idx].1.insert(svc.leader.as_str());
        }
    }

    let mut multi_leader: Vec<MultiLeaderSong> = song_leaders
        .into_iter()
        .filter(|(_, leaders)| leaders.len() >= MIN_MULTI_LEADERS)
        .map(|(song, leaders)| MultiLeaderSong {
            song: song.clone(),
            leader_count: leaders.len(),
            leaders: leaders.into_iter().map(str::to_string).collect(),
            total_count: praise_combined.get(song),
        })
        .collect();
    multi_leader.sort_by(|a, b| {
        b.leader_count
            .cmp(&a.leader_count)
            .then_with(|| b.total_count.cmp(&a.total_count))
    });
    multi_leader.truncate(TOP_MULTI_LEADER_SONGS);

    let current_songs: BTreeSet<&String> = current.iter().copied().flat_map(|s| s.all_songs()).collect();
    let previous_songs: BTreeSet<&String> = year_services(services, year - 1)
        .into_iter()
        .flat_map(|s| s.all_songs())
        .collect();

    GlobalStats {
        total_services: current.len(),
        total_unique_songs: current_songs.len(),
        praise1_top20: praise1.most_common(TOP_SONGS),
        praise2_top20: praise2.most_common(TOP_SONGS),
        combined_top20: praise_combined.most_common(TOP_SONGS),
        top10_multi_leader: multi_leader,
        peace_top3: peace.most_common(TOP_PEACE_SONGS),
        new_songs: new_songs(current_songs.iter().copied(), baseline),
        songs_previous_year_not_current: previous_songs
            .difference(&current_songs)
            .map(|s| s.to_string())
            .collect(),
        unique_songs: current_songs.iter().map(|s| s.to_string()).collect(),
    }
}

// ============================================================================
// New-song usage by service
// ============================================================================

pub fn weekday_name(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

/// Walk services in date order and record each one that sings a new song
/// (outside the baseline) for the first time.
fn find_introductions(services: &[&ServiceRecord], baseline: &ComparisonKeySet) -> Vec<NewSongIntroduction> {
    let mut ordered = services.to_vec();
    ordered.sort_by_key(|s| s.date);

    let mut counted: FxHashSet<String> = FxHashSet::default();
    let mut introductions = Vec::new();
    for svc in ordered {
        let mut songs = Vec::new();
        for song in svc.all_songs() {
            let key = normalize_for_comparison(song);
            if !baseline.contains(&key) && counted.insert(key) {
                songs.push(song.clone());
            }
        }
        if !songs.is_empty() {
            introductions.push(NewSongIntroduction { date: svc.date, songs });
        }
    }
    introductions
}

/// How many services introduced a new song, overall and per weekday bucket.
/// Each bucket tracks its own already-introduced set.
pub fn calculate_new_song_usage(
    services: &[ServiceRecord],
    year: i32,
    baseline: &ComparisonKeySet,
) -> NewSongUsage {
    let current = year_services(services, year);
    let overall = find_introductions(&current, baseline);

    let by_weekday = NEW_SONG_WEEKDAYS
        .iter()
        .map(|&weekday| {
            let bucket: Vec<&ServiceRecord> =
                current.iter().copied().filter(|s| s.weekday() == weekday).collect();
            let introductions = find_introductions(&bucket, baseline);
            WeekdayNewSongUsage {
                weekday: weekday_name(weekday).to_string(),
                total_services: bucket.len(),
                services_with_new_song: introductions.len(),
                percentage: percentage(introductions.len(), bucket.len()),
                introductions,
            }
        })
        .collect();

    NewSongUsage {
        total_services: current.len(),
        services_with_new_song: overall.len(),
        percentage: percentage(overall.len(), current.len()),
        by_weekday,
    }
}

// ============================================================================
// TESTS
// ============================================================================
