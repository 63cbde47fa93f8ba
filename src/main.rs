use anyhow::{Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};
use std::time::Instant;

use worship_journey::baseline::load_baseline;
use worship_journey::copyright::load_copyright_metadata;
use worship_journey::models::{ComparisonKeySet, Loaded, PipelineStats};
use worship_journey::progress::{create_spinner, finish_phase, format_duration, set_log_only, warn};
use worship_journey::publisher::{calculate_publisher_stats, PublisherMatcher};
use worship_journey::records::load_services;
use worship_journey::report::{write_html, write_json, Report};
use worship_journey::safety::validate_output_path;
use worship_journey::stats::{
    calculate_global_stats, calculate_leader_stats, calculate_new_song_usage, new_song_keys,
};

#[derive(Parser)]
#[command(name = "worship-journey")]
#[command(about = "Build the yearly worship song report from a praise history export")]
struct Args {
    /// Praise history spreadsheet export (CSV)
    data: PathBuf,

    /// Songs known before the report year, one per line
    #[arg(long)]
    baseline: Option<PathBuf>,

    /// Copyright metadata export (CSV, song in column 1, publisher in column 4)
    #[arg(long)]
    copyright: Option<PathBuf>,

    #[arg(long, default_value = "2025")]
    year: i32,

    /// HTML report path
    #[arg(long, default_value = "index.html")]
    output: PathBuf,

    /// Also write the aggregates as JSON
    #[arg(long)]
    json: Option<PathBuf>,

    /// Write run statistics as JSON
    #[arg(long)]
    stats_json: Option<PathBuf>,

    /// Hide spinners, print plain log lines
    #[arg(long)]
    log_only: bool,
}

/// Unwrap a reference load, surfacing its warning.
fn take_loaded<T>(loaded: Loaded<T>) -> T {
    if let Some(warning) = loaded.warning {
        warn(warning);
    }
    loaded.value
}

fn main() -> Result<()> {
    let args = Args::parse();
    set_log_only(args.log_only);

    let mut inputs: Vec<&Path> = vec![args.data.as_path()];
    inputs.extend(args.baseline.as_deref());
    inputs.extend(args.copyright.as_deref());
    validate_output_path(&args.output, &["html", "htm"], &inputs)?;
    if let Some(json) = &args.json {
        validate_output_path(json, &["json"], &inputs)?;
    }
    if let Some(stats_json) = &args.stats_json {
        validate_output_path(stats_json, &["json"], &inputs)?;
    }

    let start = Instant::now();
    let mut stats = PipelineStats {
        year: args.year,
        ..Default::default()
    };

    // Phase 1: services
    let pb = create_spinner("Phase 1: Loading services");
    let services = load_services(&args.data, &mut stats)
        .with_context(|| format!("Failed to load services from {}", args.data.display()))?;
    finish_phase(
        &pb,
        format!(
            "Phase 1: {} services from {} rows ({} skipped)",
            services.len(),
            stats.rows_read,
            stats.total_skipped()
        ),
    );

    // Phase 2: reference data
    let pb = create_spinner("Phase 2: Loading reference data");
    let baseline = match &args.baseline {
        Some(path) => take_loaded(load_baseline(path)),
        None => {
            warn("no historical baseline given; every song counts as new");
            ComparisonKeySet::default()
        }
    };
    let metadata = match &args.copyright {
        Some(path) => take_loaded(load_copyright_metadata(path)),
        None => {
            warn("no copyright metadata given; every song is unmatched");
            Vec::new()
        }
    };
    let matcher = PublisherMatcher::new(&metadata);
    for collision in matcher.collisions() {
        warn(format!(
            "metadata key '{}' maps to '{}' ({}) and '{}' ({}); using the first",
            collision.key,
            collision.kept_publisher,
            collision.kept_song,
            collision.ignored_publisher,
            collision.ignored_song
        ));
    }
    stats.baseline_keys = baseline.len();
    stats.metadata_entries = metadata.len();
    stats.metadata_key_collisions = matcher.collisions().len();
    finish_phase(
        &pb,
        format!(
            "Phase 2: {} baseline songs, {} metadata entries",
            stats.baseline_keys, stats.metadata_entries
        ),
    );

    // Phase 3: statistics
    let pb = create_spinner("Phase 3: Computing statistics");
    let leaders = calculate_leader_stats(&services, args.year, &baseline);
    let global = calculate_global_stats(&services, args.year, &baseline);
    let new_song_usage = calculate_new_song_usage(&services, args.year, &baseline);
    let publishers = calculate_publisher_stats(&services, args.year, &matcher);

    stats.year_services = global.total_services;
    stats.leaders = leaders.len();
    stats.distinct_songs = global.total_unique_songs;
    stats.unmatched_songs = publishers.unmatched_songs.len();
    stats.excluded_songs = publishers.excluded_songs.len();
    stats.matched_songs = stats
        .distinct_songs
        .saturating_sub(stats.unmatched_songs + stats.excluded_songs);
    finish_phase(
        &pb,
        format!(
            "Phase 3: {} leaders, {} songs, {:.1}% attributed",
            stats.leaders,
            stats.distinct_songs,
            stats.match_rate()
        ),
    );
    if stats.year_services == 0 {
        warn(format!("no services found for {}", args.year));
    }

    // Phase 4: output
    let pb = create_spinner("Phase 4: Writing report");
    let report = Report {
        year: args.year,
        generated_at: chrono::Local::now().naive_local(),
        leaders,
        global,
        publishers,
        new_song_usage,
    };
    let new_keys = new_song_keys(&report.global);
    write_html(&report, &new_keys, &args.output)?;
    if let Some(json) = &args.json {
        write_json(&report, json)?;
    }
    finish_phase(&pb, format!("Phase 4: Wrote {}", args.output.display()));

    let elapsed = start.elapsed();
    stats.elapsed_seconds = elapsed.as_secs_f64();
    if args.log_only {
        stats.log_phase("final");
    }
    if let Some(stats_json) = &args.stats_json {
        stats
            .write_to_file(stats_json)
            .with_context(|| format!("Failed to write {}", stats_json.display()))?;
    }

    println!("\n{:=<60}", "");
    println!("Worship Journey {} complete!", args.year);
    println!("  Rows read: {} ({} logical records)", stats.rows_read, stats.logical_records);
    println!("  Services built: {}", stats.services_built);
    println!(
        "  Rows skipped: {} (columns {}, missing date {}, invalid date {}, no leader {})",
        stats.total_skipped(),
        stats.skipped_too_few_columns,
        stats.skipped_missing_date,
        stats.skipped_invalid_date,
        stats.skipped_no_leader
    );
    println!("  Services in {}: {}", args.year, stats.year_services);
    println!("  Leaders: {}", stats.leaders);
    println!("  Baseline songs: {}", stats.baseline_keys);
    println!(
        "  Metadata entries: {} ({} key collisions)",
        stats.metadata_entries, stats.metadata_key_collisions
    );
    println!(
        "  Songs: {} distinct, {} matched, {} excluded, {} unmatched",
        stats.distinct_songs, stats.matched_songs, stats.excluded_songs, stats.unmatched_songs
    );
    println!("  Elapsed: {}", format_duration(elapsed));
    println!("{:=<60}", "");

    Ok(())
}
