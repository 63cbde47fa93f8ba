//! Report Assembler: JSON artifact and the static HTML page.
//!
//! Rendering is pure. Every function that may mark a new song takes the
//! new-song key set as a parameter.

use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;

use crate::models::{
    ComparisonKeySet, GlobalStats, LeaderPublisherStats, LeaderStats, MultiLeaderSong,
    NewSongUsage, PublisherStats, RepeatedTopList, SongCount, TopListNote,
};
use crate::normalize::normalize_for_comparison;
use crate::publisher::display_publisher_name;

pub const NEW_SONG_MARKER: &str = "●";

/// Everything the report shows, in serializable form.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub year: i32,
    pub generated_at: NaiveDateTime,
    pub leaders: BTreeMap<String, LeaderStats>,
    pub global: GlobalStats,
    pub publishers: PublisherStats,
    pub new_song_usage: NewSongUsage,
}

pub fn write_json(report: &Report, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(report).context("Failed to serialize report")?;
    std::fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

pub fn write_html(report: &Report, new_song_keys: &ComparisonKeySet, path: &Path) -> Result<()> {
    let html = render_html(report, new_song_keys);
    std::fs::write(path, html).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

// ============================================================================
// Fragments
// ============================================================================

pub fn html_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Anchor id for a leader card.
pub fn leader_anchor(leader: &str) -> String {
    format!("leader-{}", leader.to_lowercase().replace(' ', "-"))
}

/// Escaped song name, prefixed with the new-song marker when its
/// comparison key is in `new_song_keys`.
pub fn format_song_name(song: &str, new_song_keys: &ComparisonKeySet) -> String {
    if new_song_keys.contains(&normalize_for_comparison(song)) {
        format!(
            r#"<span class="new-song" title="New this year">{}</span> {}"#,
            NEW_SONG_MARKER,
            html_escape(song)
        )
    } else {
        html_escape(song)
    }
}

fn note_text(note: TopListNote) -> &'static str {
    match note {
        TopListNote::AllOthersOnce => "All other songs appeared only once",
        TopListNote::AllOnce => "All selected songs appeared only once",
        TopListNote::NoData => "No data available",
    }
}

fn no_data(text: &str) -> String {
    format!(r#"<p class="no-data">{}</p>"#, text)
}

fn song_table(songs: &[SongCount], new_song_keys: &ComparisonKeySet) -> String {
    if songs.is_empty() {
        return no_data("No data available");
    }
    let rows: String = songs
        .iter()
        .enumerate()
        .map(|(i, (song, count))| {
            format!(
                "<tr><td>{}</td><td>{}</td><td>{}</td></tr>\n",
                i + 1,
                format_song_name(song, new_song_keys),
                count
            )
        })
        .collect();
    format!(
        "<table class=\"stats-table\">\n<thead><tr><th>Rank</th><th>Song</th><th>Count</th></tr></thead>\n<tbody>\n{}</tbody>\n</table>\n",
        rows
    )
}

fn repeated_table(list: &RepeatedTopList, new_song_keys: &ComparisonKeySet) -> String {
    match (list.entries.is_empty(), list.note) {
        (true, Some(note)) => no_data(note_text(note)),
        (_, note) => {
            let mut html = song_table(&list.entries, new_song_keys);
            if let Some(note) = note {
                html.push_str(&format!("<p class=\"note\">{}</p>\n", note_text(note)));
            }
            html
        }
    }
}

fn multi_leader_table(songs: &[MultiLeaderSong], new_song_keys: &ComparisonKeySet) -> String {
    if songs.is_empty() {
        return no_data("No songs chosen by 3+ leaders");
    }
    let rows: String = songs
        .iter()
        .enumerate()
        .map(|(i, s)| {
            format!(
                "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>\n",
                i + 1,
                format_song_name(&s.song, new_song_keys),
                s.leader_count,
                s.total_count,
                html_escape(&s.leaders.join(", "))
            )
        })
        .collect();
    format!(
        "<table class=\"stats-table\">\n<thead><tr><th>Rank</th><th>Song</th><th>Leaders</th><th>Total</th><th>Leader Names</th></tr></thead>\n<tbody>\n{}</tbody>\n</table>\n",
        rows
    )
}

fn song_list(songs: &[String], new_song_keys: &ComparisonKeySet) -> String {
    if songs.is_empty() {
        return no_data("No songs in this category");
    }
    let items: String = songs
        .iter()
        .map(|s| format!("<li>{}</li>", format_song_name(s, new_song_keys)))
        .collect();
    format!("<ul class=\"song-list\">{}</ul>\n", items)
}

fn overlap_list(overlaps: &[(String, usize)]) -> String {
    if overlaps.is_empty() {
        return no_data("No overlap with other leaders");
    }
    let items: String = overlaps
        .iter()
        .map(|(leader, count)| format!("<li>{} <span class=\"count\">{} songs</span></li>", html_escape(leader), count))
        .collect();
    format!("<ul class=\"overlap-list\">{}</ul>\n", items)
}

fn publisher_table(publishers: &[(String, usize)]) -> String {
    if publishers.is_empty() {
        return no_data("No data available");
    }
    let rows: String = publishers
        .iter()
        .enumerate()
        .map(|(i, (publisher, count))| {
            format!(
                "<tr><td>{}</td><td>{}</td><td>{}</td></tr>\n",
                i + 1,
                html_escape(display_publisher_name(publisher)),
                count
            )
        })
        .collect();
    format!(
        "<table class=\"stats-table\">\n<thead><tr><th>Rank</th><th>Publisher</th><th>Count</th></tr></thead>\n<tbody>\n{}</tbody>\n</table>\n",
        rows
    )
}

fn leader_publisher_table(stats: &LeaderPublisherStats) -> String {
    if stats.total_occurrences == 0 {
        return no_data("No data available");
    }
    let mut rows: String = stats
        .top_publishers
        .iter()
        .map(|share| {
            format!(
                "<tr><td>{}</td><td>{}</td><td>{:.1}%</td></tr>\n",
                html_escape(display_publisher_name(&share.publisher)),
                share.occurrences,
                share.percentage
            )
        })
        .collect();
    if let Some(other) = &stats.other {
        rows.push_str(&format!(
            "<tr><td>Other ({} publishers)</td><td>{}</td><td>{:.1}%</td></tr>\n",
            other.publisher_count, other.occurrences, other.percentage
        ));
    }
    if stats.unmatched_occurrences > 0 {
        rows.push_str(&format!(
            "<tr><td>Unmatched</td><td>{}</td><td>{:.1}%</td></tr>\n",
            stats.unmatched_occurrences, stats.unmatched_percentage
        ));
    }
    format!(
        "<table class=\"stats-table\">\n<thead><tr><th>Publisher</th><th>Count</th><th>Share</th></tr></thead>\n<tbody>\n{}</tbody>\n</table>\n",
        rows
    )
}

fn stat_section(title: &str, body: &str) -> String {
    format!("<div class=\"stat-section\">\n<h4>{}</h4>\n{}</div>\n", html_escape(title), body)
}

// ============================================================================
// Sections
// ============================================================================

fn render_nav(report: &Report) -> String {
    let links: String = report
        .leaders
        .keys()
        .map(|leader| format!("<a href=\"#{}\">{}</a>", html_escape(&leader_anchor(leader)), html_escape(leader)))
        .collect();
    format!(
        "<nav>\n<a href=\"#section-a\">Praise Leaders</a> <a href=\"#section-b\">Global Stats</a> <a href=\"#section-c\">Publishers</a> <a href=\"#all-songs\">All Songs</a>\n<div class=\"leader-links\">{}</div>\n</nav>\n",
        links
    )
}

pub fn render_leader_card(
    stats: &LeaderStats,
    publishers: Option<&LeaderPublisherStats>,
    year: i32,
    new_song_keys: &ComparisonKeySet,
) -> String {
    let mut body = String::new();
    body.push_str(&stat_section("Top Praise 1 Songs", &repeated_table(&stats.praise1_top20, new_song_keys)));
    body.push_str(&stat_section("Top Praise 2 Songs", &repeated_table(&stats.praise2_top20, new_song_keys)));
    body.push_str(&stat_section("Top Peace Songs", &repeated_table(&stats.peace_top20, new_song_keys)));
    body.push_str(&stat_section("Top 20 All Songs Combined", &repeated_table(&stats.combined_top20, new_song_keys)));
    body.push_str(&stat_section(&format!("{} New Songs", year), &song_list(&stats.new_songs, new_song_keys)));
    body.push_str(&stat_section("Most Similar Leaders", &overlap_list(&stats.top2_leaders_overlap)));
    if let Some(publishers) = publishers {
        body.push_str(&stat_section("Publishers", &leader_publisher_table(publishers)));
    }

    format!(
        "<article id=\"{}\" class=\"leader-card\">\n<h3>{}</h3>\n<p class=\"summary\">{} services, {} songs, {} songs in common with others</p>\n{}</article>\n",
        html_escape(&leader_anchor(&stats.name)),
        html_escape(&stats.name),
        stats.total_services,
        stats.total_songs,
        stats.common_songs_count,
        body
    )
}

fn render_new_song_usage(usage: &NewSongUsage) -> String {
    let mut rows = format!(
        "<tr><td>All services</td><td>{}</td><td>{}</td><td>{:.1}%</td></tr>\n",
        usage.total_services, usage.services_with_new_song, usage.percentage
    );
    for bucket in &usage.by_weekday {
        rows.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{:.1}%</td></tr>\n",
            html_escape(&bucket.weekday),
            bucket.total_services,
            bucket.services_with_new_song,
            bucket.percentage
        ));
    }
    format!(
        "<table class=\"stats-table\">\n<thead><tr><th>Services</th><th>Total</th><th>With a new song</th><th>Share</th></tr></thead>\n<tbody>\n{}</tbody>\n</table>\n",
        rows
    )
}

pub fn render_global_section(
    global: &GlobalStats,
    usage: &NewSongUsage,
    year: i32,
    new_song_keys: &ComparisonKeySet,
) -> String {
    let mut html = format!(
        "<div class=\"highlight\"><h3>Total Unique Songs in {}</h3><div class=\"big-number\">{}</div><p>{} services</p></div>\n\
         <p class=\"legend\"><span class=\"new-song\">{}</span> Indicates a new song in {}</p>\n",
        year, global.total_unique_songs, global.total_services, NEW_SONG_MARKER, year
    );
    html.push_str(&stat_section("Top 20 Praise 1 Songs", &song_table(&global.praise1_top20, new_song_keys)));
    html.push_str(&stat_section("Top 20 Praise 2 Songs", &song_table(&global.praise2_top20, new_song_keys)));
    html.push_str(&stat_section(
        "Top 20 Praise 1 & 2 Combined",
        &song_table(&global.combined_top20, new_song_keys),
    ));
    html.push_str(&stat_section(
        "Top 10 Multi-Leader Songs",
        &multi_leader_table(&global.top10_multi_leader, new_song_keys),
    ));
    html.push_str(&stat_section("Top 3 Peace Songs", &song_table(&global.peace_top3, new_song_keys)));
    html.push_str(&stat_section(&format!("New Songs in {}", year), &song_list(&global.new_songs, new_song_keys)));
    html.push_str(&stat_section("Services Introducing a New Song", &render_new_song_usage(usage)));
    html.push_str(&stat_section(
        &format!("Songs from {} Not in {}", year - 1, year),
        &song_list(&global.songs_previous_year_not_current, new_song_keys),
    ));
    html.push_str(&format!(
        "<div id=\"all-songs\">{}</div>\n",
        stat_section(&format!("All Unique Songs in {}", year), &song_list(&global.unique_songs, new_song_keys))
    ));
    html
}

pub fn render_publisher_section(publishers: &PublisherStats, new_song_keys: &ComparisonKeySet) -> String {
    let mut html = String::new();
    html.push_str(&stat_section("Top Publishers: Praise 1", &publisher_table(&publishers.praise1_top20)));
    html.push_str(&stat_section("Top Publishers: Praise 2", &publisher_table(&publishers.praise2_top20)));
    html.push_str(&stat_section("Top Publishers: Peace", &publisher_table(&publishers.peace_top20)));
    html.push_str(&stat_section("Top Publishers: Praise 1 & 2 Combined", &publisher_table(&publishers.combined_top20)));
    html.push_str(&stat_section("All Publishers", &publisher_table(&publishers.all_publishers)));
    html.push_str(&stat_section("Unmatched Songs", &song_table(&publishers.unmatched_songs, new_song_keys)));
    html.push_str(&stat_section(
        "Excluded Songs (public domain, liturgy)",
        &song_table(&publishers.excluded_songs, new_song_keys),
    ));
    html
}

/// Render the complete page.
pub fn render_html(report: &Report, new_song_keys: &ComparisonKeySet) -> String {
    let title = format!("Worship Journey {}", report.year);
    let leader_cards: String = report
        .leaders
        .values()
        .map(|stats| {
            render_leader_card(
                stats,
                report.publishers.per_leader.get(&stats.name),
                report.year,
                new_song_keys,
            )
        })
        .collect();

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="UTF-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<title>{title}</title>
<style>
body {{ font-family: sans-serif; max-width: 960px; margin: 0 auto; padding: 1rem; }}
.stats-table {{ border-collapse: collapse; width: 100%; }}
.stats-table td, .stats-table th {{ border-bottom: 1px solid #ddd; padding: 0.25rem 0.5rem; text-align: left; }}
.new-song {{ color: #d9534f; }}
.no-data, .note {{ color: #777; font-style: italic; }}
.leader-card {{ border: 1px solid #ccc; border-radius: 6px; margin: 1rem 0; padding: 0.5rem 1rem; }}
.big-number {{ font-size: 3rem; font-weight: bold; }}
</style>
</head>
<body>
{nav}<header><h1>{title}</h1></header>
<main>
<section id="section-a">
<h2>Section A: Praise Leaders</h2>
{leader_cards}</section>
<section id="section-b">
<h2>Section B: Praise History</h2>
{global}</section>
<section id="section-c">
<h2>Section C: Publishers</h2>
{publishers}</section>
</main>
<footer><p>Generated on {generated}</p></footer>
</body>
</html>
"#,
        title = html_escape(&title),
        nav = render_nav(report),
        leader_cards = leader_cards,
        global = render_global_section(&report.global, &report.new_song_usage, report.year, new_song_keys),
        publishers = render_publisher_section(&report.publishers, new_song_keys),
        generated = report.generated_at.format("%Y-%m-%d %H:%M:%S"),
    )
}

// ============================================================================
// TESTS
// ============================================================================
