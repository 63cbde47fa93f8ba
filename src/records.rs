//! Spreadsheet rows → service records.
//!
//! The praise history export has one row per service, except that long
//! cells were often continued on the following rows with the date column
//! left empty. Rows are consolidated first, then each logical row becomes
//! a [`ServiceRecord`].

use anyhow::{Context, Result};
use chrono::NaiveDate;
use csv::ReaderBuilder;
use std::path::Path;

use crate::models::{PipelineStats, RowSkip, ServiceRecord};
use crate::normalize::{clean_song_name, normalize_leader_name, split_combined_songs};

// ============================================================================
// Column Layout
// ============================================================================

/// Every row is padded to this many columns before consolidation.
pub const PADDED_COLUMNS: usize = 17;

/// Rows shorter than this after consolidation cannot hold a peace song.
pub const MIN_SERVICE_COLUMNS: usize = 16;

pub const DATE_COLUMN: usize = 0;
pub const LEADER_COLUMN: usize = 1;
pub const THEME_COLUMN: usize = 2;

/// Song columns per slot. The columns in between hold notes and keys.
pub const PRAISE1_COLUMNS: [usize; 3] = [3, 5, 7];
pub const PRAISE2_COLUMNS: [usize; 3] = [9, 11, 13];
pub const PEACE_COLUMNS: [usize; 1] = [15];

pub const DATE_FORMAT: &str = "%Y-%m-%d";

// ============================================================================
// Reading
// ============================================================================

/// Read every data row of a CSV export (header skipped), preserving column
/// order and multi-line cells. A leading byte-order mark is ignored.
pub fn read_rows(path: &Path) -> Result<Vec<Vec<String>>> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("Failed to read spreadsheet export {}", path.display()))?;
    parse_rows(&bytes)
}

/// Parse CSV bytes into rows. Invalid UTF-8 is replaced rather than rejected.
pub fn parse_rows(bytes: &[u8]) -> Result<Vec<Vec<String>>> {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);

    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(bytes);

    let mut rows = Vec::new();
    for record in reader.byte_records() {
        let record = record.context("Malformed CSV record")?;
        rows.push(
            record
                .iter()
                .map(|field| String::from_utf8_lossy(field).into_owned())
                .collect(),
        );
    }
    Ok(rows)
}

// ============================================================================
// Consolidation
// ============================================================================

/// Merge continuation rows (empty date column) into the preceding dated row.
///
/// Non-empty continuation cells are appended to the current record's cell,
/// space-separated. Rows before the first dated row are discarded; the last
/// record is flushed at end of input.
pub fn consolidate_rows(rows: Vec<Vec<String>>) -> Vec<Vec<String>> {
    let mut consolidated = Vec::new();
    let mut current: Option<Vec<String>> = None;

    for mut row in rows {
        if row.len() < PADDED_COLUMNS {
            row.resize(PADDED_COLUMNS, String::new());
        }

        if !row[DATE_COLUMN].trim().is_empty() {
            if let Some(done) = current.replace(row) {
                consolidated.push(done);
            }
            continue;
        }

        let Some(record) = current.as_mut() else {
            continue;
        };
        if record.len() < row.len() {
            record.resize(row.len(), String::new());
        }
        for (i, cell) in row.iter().enumerate().skip(1) {
            let cell = cell.trim();
            if cell.is_empty() {
                continue;
            }
            if record[i].is_empty() {
                record[i] = cell.to_string();
            } else {
                record[i].push(' ');
                record[i].push_str(cell);
            }
        }
    }

    consolidated.extend(current);
    consolidated
}

// ============================================================================
// Service Builder
// ============================================================================

/// Tokenize and clean the song cells at `indices`, in column order.
pub fn extract_songs_from_columns(row: &[String], indices: &[usize]) -> Vec<String> {
    indices
        .iter()
        .filter_map(|&idx| row.get(idx))
        .flat_map(|cell| split_combined_songs(cell))
        .filter_map(|song| clean_song_name(&song))
        .collect()
}

/// Turn one consolidated row into a service record.
pub fn build_service(row: &[String]) -> Result<ServiceRecord, RowSkip> {
    if row.len() < MIN_SERVICE_COLUMNS {
        return Err(RowSkip::TooFewColumns);
    }

    let date_str = row[DATE_COLUMN].trim();
    if date_str.is_empty() {
        return Err(RowSkip::MissingDate);
    }
    let date = NaiveDate::parse_from_str(date_str, DATE_FORMAT).map_err(|_| RowSkip::InvalidDate)?;

    let leader = normalize_leader_name(&row[LEADER_COLUMN]).ok_or(RowSkip::NoLeader)?;

    Ok(ServiceRecord {
        date,
        leader,
        theme: row[THEME_COLUMN].trim().to_string(),
        praise1: extract_songs_from_columns(row, &PRAISE1_COLUMNS),
        praise2: extract_songs_from_columns(row, &PRAISE2_COLUMNS),
        peace: extract_songs_from_columns(row, &PEACE_COLUMNS),
    })
}

/// Consolidate rows and build services, counting rows that were dropped.
pub fn build_services(rows: Vec<Vec<String>>, stats: &mut PipelineStats) -> Vec<ServiceRecord> {
    stats.rows_read += rows.len();
    let consolidated = consolidate_rows(rows);
    stats.logical_records += consolidated.len();

    let mut services = Vec::with_capacity(consolidated.len());
    for row in &consolidated {
        match build_service(row) {
            Ok(service) => services.push(service),
            Err(skip) => stats.record_skip(skip),
        }
    }
    stats.services_built += services.len();
    services
}

/// Read the spreadsheet export and build every service record in it.
pub fn load_services(path: &Path, stats: &mut PipelineStats) -> Result<Vec<ServiceRecord>> {
    let rows = read_rows(path)?;
    Ok(build_services(rows, stats))
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| c.to_string()).collect()
    }

    fn service_row(date: &str, leader: &str, praise1: &str, praise2: &str, peace: &str) -> Vec<String> {
        let mut r = vec![String::new(); PADDED_COLUMNS];
        r[DATE_COLUMN] = date.to_string();
        r[LEADER_COLUMN] = leader.to_string();
        r[3] = praise1.to_string();
        r[9] = praise2.to_string();
        r[15] = peace.to_string();
        r
    }

    #[test]
    fn test_consolidate_continuation() {
        let rows = vec![row(&["2025-01-04", "A", "", "", "S1"]), row(&["", "", "", "", "S2"])];
        let out = consolidate_rows(rows);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0][4], "S1 S2");
        assert_eq!(out[0].len(), PADDED_COLUMNS);
    }

    #[test]
    fn test_consolidate_fills_empty_cell_and_flushes() {
        let rows = vec![
            row(&["", "orphan"]),
            row(&["2025-01-04", "A"]),
            row(&["", "", "Theme"]),
            row(&["2025-01-11", "B"]),
            row(&["", "", "", "  Song  "]),
        ];
        let out = consolidate_rows(rows);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0][1], "A");
        assert_eq!(out[0][2], "Theme");
        assert_eq!(out[1][3], "Song");
    }

    #[test]
    fn test_build_service() {
        let mut r = service_row("2025-01-04", "P1: John (HC)", "Grace + Communion", "Cornerstone V1", "願您平安");
        r[5] = "Way Maker / 房角基石".to_string();
        r[THEME_COLUMN] = "  New Year ".to_string();
        let s = build_service(&r).unwrap();
        assert_eq!(s.leader, "John");
        assert_eq!(s.theme, "New Year");
        assert_eq!(s.praise1, vec!["Grace", "Way Maker", "Cornerstone 房角基石"]);
        assert_eq!(s.praise2, vec!["Cornerstone 房角基石"]);
        assert_eq!(s.peace, vec!["願你平安"]);
        assert_eq!(s.all_songs().count(), 5);
    }

    #[test]
    fn test_build_service_skips() {
        assert_eq!(build_service(&row(&["2025-01-04", "John"])).unwrap_err(), RowSkip::TooFewColumns);
        assert_eq!(
            build_service(&service_row("04/01/2025", "John", "", "", "")).unwrap_err(),
            RowSkip::InvalidDate
        );
        assert_eq!(
            build_service(&service_row(" ", "John", "", "", "")).unwrap_err(),
            RowSkip::MissingDate
        );
        assert_eq!(
            build_service(&service_row("2025-01-04", " (HC) ", "", "", "")).unwrap_err(),
            RowSkip::NoLeader
        );
    }

    #[test]
    fn test_build_services_counts_skips() {
        let rows = vec![
            service_row("2025-01-04", "John", "Grace", "", ""),
            row(&["", "", "", "Way Maker"]),
            service_row("bad date", "John", "Grace", "", ""),
            service_row("2025-01-11", "", "Grace", "", ""),
        ];
        let mut stats = PipelineStats::default();
        let services = build_services(rows, &mut stats);
        assert_eq!(services.len(), 1);
        assert_eq!(services[0].praise1, vec!["Grace Way Maker"]);
        assert_eq!(stats.rows_read, 4);
        assert_eq!(stats.logical_records, 3);
        assert_eq!(stats.skipped_invalid_date, 1);
        assert_eq!(stats.skipped_no_leader, 1);
    }

    #[test]
    fn test_parse_rows_bom_and_multiline() {
        let csv = "\u{feff}Date,Leader,Theme\n2025-01-04,John,\"Line one\nLine two\"\n,,more\n";
        let rows = parse_rows(csv.as_bytes()).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0], vec!["2025-01-04", "John", "Line one\nLine two"]);
        assert_eq!(rows[1][2], "more");
    }

    #[test]
    fn test_load_services_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        let header: Vec<String> = (0..PADDED_COLUMNS).map(|i| format!("c{i}")).collect();
        writeln!(file, "{}", header.join(",")).unwrap();
        let data = service_row("2025-02-01", "Mary", "Grace", "Way Maker", "Peace");
        writeln!(file, "{}", data.join(",")).unwrap();

        let mut stats = PipelineStats::default();
        let services = load_services(file.path(), &mut stats).unwrap();
        assert_eq!(services.len(), 1);
        assert_eq!(services[0].leader, "Mary");
        assert_eq!(services[0].praise2, vec!["Way Maker"]);
    }

    #[test]
    fn test_load_services_missing_file_is_error() {
        let mut stats = PipelineStats::default();
        assert!(load_services(Path::new("/nonexistent/praise.csv"), &mut stats).is_err());
    }
}
