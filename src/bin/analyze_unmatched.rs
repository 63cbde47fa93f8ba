//! Suggest metadata entries for songs no publisher tier could attribute.
//!
//! Usage: analyze-unmatched <praise_history.csv> --copyright <metadata.csv> [--year N]

use anyhow::{bail, Context, Result};
use clap::Parser;
use rayon::prelude::*;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

use worship_journey::copyright::load_copyright_metadata;
use worship_journey::models::{CopyrightEntry, PipelineStats};
use worship_journey::normalize::normalize_for_comparison;
use worship_journey::progress::{create_progress_bar, format_duration, set_log_only, warn};
use worship_journey::publisher::{calculate_publisher_stats, PublisherMatcher};
use worship_journey::records::load_services;

const SUGGESTIONS_PER_SONG: usize = 3;

#[derive(Parser)]
#[command(name = "analyze-unmatched")]
#[command(about = "List unmatched songs with the closest copyright metadata entries")]
struct Args {
    /// Praise history spreadsheet export (CSV)
    data: PathBuf,

    /// Copyright metadata export (CSV)
    #[arg(long)]
    copyright: PathBuf,

    #[arg(long, default_value = "2025")]
    year: i32,

    /// Hide suggestions below this similarity (0.0 to 1.0)
    #[arg(long, default_value = "0.5")]
    min_similarity: f64,

    #[arg(long)]
    log_only: bool,
}

/// A metadata entry prepared for comparison.
struct Candidate {
    key: String,
    song: String,
    publisher: String,
}

#[derive(Debug, Clone, PartialEq)]
struct Suggestion {
    song: String,
    publisher: String,
    similarity: f64,
}

fn build_candidates(metadata: &[CopyrightEntry], matcher: &PublisherMatcher) -> Vec<Candidate> {
    metadata
        .iter()
        .map(|entry| Candidate {
            key: normalize_for_comparison(&entry.song),
            song: entry.song.clone(),
            publisher: matcher.canonical_publisher(&entry.publisher),
        })
        .filter(|c| !c.key.is_empty())
        .collect()
}

/// The closest candidates to `song` by normalized Levenshtein similarity of
/// comparison keys, best first, at most `SUGGESTIONS_PER_SONG`.
fn suggest(song: &str, candidates: &[Candidate], min_similarity: f64) -> Vec<Suggestion> {
    let key = normalize_for_comparison(song);
    let mut scored: Vec<Suggestion> = candidates
        .iter()
        .map(|c| Suggestion {
            song: c.song.clone(),
            publisher: c.publisher.clone(),
            similarity: strsim::normalized_levenshtein(&key, &c.key),
        })
        .filter(|s| s.similarity >= min_similarity)
        .collect();
    scored.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));
    scored.truncate(SUGGESTIONS_PER_SONG);
    scored
}

fn main() -> Result<()> {
    let args = Args::parse();
    set_log_only(args.log_only);

    if !(0.0..=1.0).contains(&args.min_similarity) {
        bail!("--min-similarity must be between 0.0 and 1.0");
    }

    let start = Instant::now();

    println!("Loading services from {:?}...", args.data);
    let mut stats = PipelineStats::default();
    let services = load_services(&args.data, &mut stats)
        .with_context(|| format!("Failed to load services from {}", args.data.display()))?;
    println!("  Loaded {} services", services.len());

    println!("Loading copyright metadata from {:?}...", args.copyright);
    let loaded = load_copyright_metadata(&args.copyright);
    if let Some(warning) = &loaded.warning {
        warn(warning);
    }
    let metadata = loaded.value;
    let matcher = PublisherMatcher::new(&metadata);
    let candidates = build_candidates(&metadata, &matcher);
    println!("  Loaded {} metadata entries", candidates.len());

    let publishers = calculate_publisher_stats(&services, args.year, &matcher);
    let unmatched = publishers.unmatched_songs;
    println!("\nAnalyzing {} unmatched songs in parallel...", unmatched.len());

    let strong = AtomicUsize::new(0);
    let weak = AtomicUsize::new(0);
    let none = AtomicUsize::new(0);
    let pb = create_progress_bar(unmatched.len() as u64, "Scoring");

    let results: Vec<(&String, usize, Vec<Suggestion>)> = unmatched
        .par_iter()
        .map(|(song, count)| {
            let suggestions = suggest(song, &candidates, args.min_similarity);
            match suggestions.first() {
                Some(best) if best.similarity >= 0.8 => strong.fetch_add(1, Ordering::Relaxed),
                Some(_) => weak.fetch_add(1, Ordering::Relaxed),
                None => none.fetch_add(1, Ordering::Relaxed),
            };
            pb.inc(1);
            (song, *count, suggestions)
        })
        .collect();
    pb.finish_and_clear();

    println!("\n=== UNMATCHED SONGS ({}) ===", args.year);
    for (song, count, suggestions) in &results {
        println!("\n{} ({}x)", song, count);
        if suggestions.is_empty() {
            println!("    (no candidate above {:.2})", args.min_similarity);
        }
        for s in suggestions {
            println!("    {:.2}  {}  [{}]", s.similarity, s.song, s.publisher);
        }
    }

    let total = results.len();
    let pct = |n: usize| if total == 0 { 0.0 } else { 100.0 * n as f64 / total as f64 };
    let (s, w, n) = (
        strong.load(Ordering::Relaxed),
        weak.load(Ordering::Relaxed),
        none.load(Ordering::Relaxed),
    );

    println!("\nBest candidate          Count     %");
    println!("─────────────────────────────────────");
    println!("Similarity ≥ 0.80      {:>6}  {:>5.1}%", s, pct(s));
    println!("Below 0.80             {:>6}  {:>5.1}%", w, pct(w));
    println!("No candidate           {:>6}  {:>5.1}%", n, pct(n));
    println!("─────────────────────────────────────");
    println!("Elapsed: {}", format_duration(start.elapsed()));

    Ok(())
}
