//! Historical baseline: comparison keys of every song known before the
//! report year. A song is "new" when its key is missing from this set.

use std::path::Path;

use crate::models::{ComparisonKeySet, Loaded, ReferenceWarning};
use crate::normalize::{clean_song_name, normalize_for_comparison, SONG_DELIMITER};

const LABEL: &str = "historical baseline";

/// Build the baseline from list text, one song (or `+`/`/`-combined group)
/// per line.
pub fn parse_baseline(text: &str) -> ComparisonKeySet {
    text.lines()
        .flat_map(|line| SONG_DELIMITER.split(line))
        .filter_map(clean_song_name)
        .map(|song| normalize_for_comparison(&song))
        .collect()
}

/// Load the baseline list. A missing or unreadable file yields an empty set
/// and a warning: every report-year song then counts as new.
pub fn load_baseline(path: &Path) -> Loaded<ComparisonKeySet> {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Loaded::degraded(
                ComparisonKeySet::default(),
                ReferenceWarning::MissingFile {
                    label: LABEL,
                    path: path.display().to_string(),
                },
            );
        }
        Err(e) => {
            return Loaded::degraded(
                ComparisonKeySet::default(),
                ReferenceWarning::Unreadable {
                    label: LABEL,
                    path: path.display().to_string(),
                    reason: e.to_string(),
                },
            );
        }
    };

    let text = String::from_utf8_lossy(&bytes);
    Loaded::ok(parse_baseline(text.trim_start_matches('\u{feff}')))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_baseline_splits_and_cleans() {
        let keys = parse_baseline("Cornerstone\n奇異恩典(除掉困鎖) + Way Maker\n\n願你國度彰顯 / Communion\n");
        assert!(keys.contains(&normalize_for_comparison("Cornerstone 房角基石")));
        assert!(keys.contains(&normalize_for_comparison("奇異恩典（除掉困鎖）")));
        assert!(keys.contains("waymaker"));
        assert!(keys.contains(&normalize_for_comparison("願祢國度彰顯")));
        assert!(!keys.contains("communion"));
        assert_eq!(keys.len(), 4);
    }

    #[test]
    fn test_load_baseline_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "\u{feff}Grace\r\nWay Maker\r\n").unwrap();
        let loaded = load_baseline(file.path());
        assert!(loaded.warning.is_none());
        assert!(loaded.value.contains("grace"));
        assert!(loaded.value.contains("waymaker"));
    }

    #[test]
    fn test_load_baseline_missing_file() {
        let loaded = load_baseline(Path::new("/nonexistent/songs_before_2025.txt"));
        assert!(loaded.value.is_empty());
        assert!(matches!(loaded.warning, Some(ReferenceWarning::MissingFile { .. })));
    }
}
