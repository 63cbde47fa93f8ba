//! Copyright metadata reader.
//!
//! The metadata sheet lists one licensed song per row: song name in column 1,
//! publisher in column 4. Header and total rows are skipped.

use csv::ReaderBuilder;
use std::path::Path;

use crate::models::{CopyrightEntry, Loaded, ReferenceWarning};

const LABEL: &str = "copyright metadata";

pub const SONG_COLUMN: usize = 1;
pub const PUBLISHER_COLUMN: usize = 4;
pub const MIN_COLUMNS: usize = 5;

/// First-column values marking header or summary rows (compared lowercased).
pub const SENTINEL_FIRST_COLUMNS: [&str; 7] = ["no", "no.", "#", "序號", "編號", "total", "合計"];

fn is_sentinel(first: &str) -> bool {
    let first = first.trim();
    first.is_empty() || SENTINEL_FIRST_COLUMNS.contains(&first.to_lowercase().as_str())
}

/// Parse metadata CSV bytes. Rows that are too short, sentinel rows, and rows
/// with an empty song or publisher are skipped. Records the csv reader cannot
/// decode are skipped too.
pub fn parse_copyright_metadata(bytes: &[u8]) -> Vec<CopyrightEntry> {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);

    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(bytes);

    reader
        .byte_records()
        .filter_map(|record| record.ok())
        .filter(|record| record.len() >= MIN_COLUMNS)
        .filter_map(|record| {
            let cell = |i: usize| String::from_utf8_lossy(&record[i]).trim().to_string();
            if is_sentinel(&cell(0)) {
                return None;
            }
            let song = cell(SONG_COLUMN);
            let publisher = cell(PUBLISHER_COLUMN);
            if song.is_empty() || publisher.is_empty() {
                return None;
            }
            Some(CopyrightEntry { song, publisher })
        })
        .collect()
}

/// Load the metadata table. A missing or unreadable file yields no entries
/// and a warning: every song then ends up unmatched.
pub fn load_copyright_metadata(path: &Path) -> Loaded<Vec<CopyrightEntry>> {
    match std::fs::read(path) {
        Ok(bytes) => Loaded::ok(parse_copyright_metadata(&bytes)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Loaded::degraded(
            Vec::new(),
            ReferenceWarning::MissingFile {
                label: LABEL,
                path: path.display().to_string(),
            },
        ),
        Err(e) => Loaded::degraded(
            Vec::new(),
            ReferenceWarning::Unreadable {
                label: LABEL,
                path: path.display().to_string(),
                reason: e.to_string(),
            },
        ),
    }
}
