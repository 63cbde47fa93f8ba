//! Output path checks.
//!
//! A report run reads a spreadsheet export and two reference files. These
//! checks make sure no output argument points at one of them, so a typo
//! cannot overwrite the data the report is built from.

use anyhow::{bail, Result};
use std::path::Path;

/// Validates that an output path is safe to overwrite.
///
/// Checks:
/// - Output extension must be one of `allowed_extensions` (case-insensitive)
/// - Output cannot be the same as any of the provided input paths
pub fn validate_output_path(output: &Path, allowed_extensions: &[&str], input_paths: &[&Path]) -> Result<()> {
    let extension = output
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default();

    if !allowed_extensions.contains(&extension.as_str()) {
        bail!(
            "Safety check failed: output file '{}' must have one of the extensions {:?}",
            output.display(),
            allowed_extensions
        );
    }

    for input in input_paths {
        if output == *input || same_file(output, input) {
            bail!(
                "Safety check failed: output '{}' cannot be the same as input '{}'",
                output.display(),
                input.display()
            );
        }
    }

    Ok(())
}

/// Both paths exist and resolve to the same file.
fn same_file(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_valid_html_output() {
        let output = PathBuf::from("/tmp/index.html");
        let source = PathBuf::from("/data/praise_history.csv");
        assert!(validate_output_path(&output, &["html", "htm"], &[&source]).is_ok());
    }

    #[test]
    fn test_extension_case_insensitive() {
        let output = PathBuf::from("/tmp/report.JSON");
        assert!(validate_output_path(&output, &["json"], &[]).is_ok());
    }

    #[test]
    fn test_wrong_extension() {
        let output = PathBuf::from("/data/praise_history.csv");
        let result = validate_output_path(&output, &["html"], &[]);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("must have one of the extensions"));
    }

    #[test]
    fn test_output_equals_input() {
        let path = PathBuf::from("/data/songs.json");
        let result = validate_output_path(&path, &["json"], &[&path]);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("cannot be the same as input"));
    }

    #[test]
    fn test_output_resolves_to_input() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("baseline.html");
        std::fs::write(&input, "Grace\n").unwrap();
        let output = dir.path().join(".").join("baseline.html");
        assert!(validate_output_path(&output, &["html"], &[&input]).is_err());
    }
}
