//! Profile format sniffing.
//!
//! Content markers decide first; the file name is only consulted when no
//! marker is found. `.xml` alone is ambiguous and stays unresolved.

use super::ProfileFormat;
use crate::result::{CovgateError, CovgateResult};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Maximum number of bytes read when sniffing a profile
pub const SNIFF_LIMIT: usize = 4096;

/// Detect the format of a profile on disk
///
/// Returns `Ok(None)` when neither content nor extension resolves the format.
pub fn detect_format(path: &Path) -> CovgateResult<Option<ProfileFormat>> {
    let file = File::open(path).map_err(|e| CovgateError::parse(path, e.to_string()))?;
    let mut head = Vec::with_capacity(SNIFF_LIMIT);
    file.take(SNIFF_LIMIT as u64)
        .read_to_end(&mut head)
        .map_err(|e| CovgateError::parse(path, e.to_string()))?;

    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let detected = detect_content(&head, &name);
    tracing::debug!(path = %path.display(), format = ?detected, "sniffed profile format");
    Ok(detected)
}

/// Detect the format, falling back to the native profile when unresolved
pub fn detect_format_or_default(path: &Path) -> CovgateResult<ProfileFormat> {
    Ok(detect_format(path)?.unwrap_or(ProfileFormat::Native))
}

/// Detect a format from the first bytes of a profile and its file name
#[must_use]
pub fn detect_content(head: &[u8], file_name: &str) -> Option<ProfileFormat> {
    let text = String::from_utf8_lossy(&head[..head.len().min(SNIFF_LIMIT)]);
    let trimmed = text.trim_start_matches('\u{feff}').trim_start();

    if trimmed.starts_with("mode:") {
        return Some(ProfileFormat::Native);
    }

    let looks_xml = trimmed.starts_with("<?xml") || trimmed.starts_with('<');
    if looks_xml && (trimmed.contains("<coverage") || trimmed.contains("cobertura")) {
        return Some(ProfileFormat::Cobertura);
    }

    if has_lcov_markers(trimmed) {
        return Some(ProfileFormat::Lcov);
    }

    if looks_xml
        && trimmed.contains("<report")
        && trimmed.to_ascii_lowercase().contains("jacoco")
    {
        return Some(ProfileFormat::Jacoco);
    }

    detect_by_name(file_name)
}

fn has_lcov_markers(text: &str) -> bool {
    let mut source = false;
    let mut data = false;
    for line in text.lines() {
        let line = line.trim_start();
        source |= line.starts_with("SF:");
        data |= line.starts_with("DA:");
        if source && data {
            return true;
        }
    }
    false
}

fn detect_by_name(file_name: &str) -> Option<ProfileFormat> {
    let lower = file_name.to_ascii_lowercase();
    match lower.as_str() {
        "coverage.out" | "cover.out" => return Some(ProfileFormat::Native),
        "lcov.info" | "coverage.info" => return Some(ProfileFormat::Lcov),
        _ => {}
    }

    match Path::new(&lower).extension().and_then(|e| e.to_str()) {
        Some("out") => Some(ProfileFormat::Native),
        Some("info") => Some(ProfileFormat::Lcov),
        // .xml without markers could be any XML format
        _ => None,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_mode_prefix_is_native() {
        let head = b"mode: set\nexample.com/m/a.go:1.1,2.2 1 1\n";
        assert_eq!(detect_content(head, "profile.txt"), Some(ProfileFormat::Native));
    }

    #[test]
    fn test_mode_prefix_wins_over_xml_extension() {
        let head = b"mode: count\n";
        assert_eq!(detect_content(head, "report.xml"), Some(ProfileFormat::Native));
    }

    #[test]
    fn test_cobertura_by_coverage_element() {
        let head = br#"<?xml version="1.0" ?><coverage line-rate="0.5"><packages/></coverage>"#;
        assert_eq!(detect_content(head, "x.xml"), Some(ProfileFormat::Cobertura));
    }

    #[test]
    fn test_cobertura_by_doctype() {
        let head = br#"<!DOCTYPE coverage SYSTEM "http://cobertura.sourceforge.net/xml/coverage-04.dtd">"#;
        assert_eq!(detect_content(head, "x.xml"), Some(ProfileFormat::Cobertura));
    }

    #[test]
    fn test_lcov_needs_sf_and_da() {
        let head = b"TN:\nSF:src/lib.rs\nDA:1,1\nend_of_record\n";
        assert_eq!(detect_content(head, "out.txt"), Some(ProfileFormat::Lcov));

        let only_sf = b"SF:src/lib.rs\nend_of_record\n";
        assert_eq!(detect_content(only_sf, "out.txt"), None);
    }

    #[test]
    fn test_lcov_without_test_name() {
        let head = b"SF:a.c\nDA:3,0\n";
        assert_eq!(detect_content(head, "anything"), Some(ProfileFormat::Lcov));
    }

    #[test]
    fn test_jacoco_report() {
        let head = br#"<?xml version="1.0"?><!DOCTYPE report PUBLIC "-//JACOCO//DTD Report 1.1//EN" "report.dtd"><report name="demo"></report>"#;
        assert_eq!(detect_content(head, "jacoco.xml"), Some(ProfileFormat::Jacoco));
    }

    #[test]
    fn test_report_without_marker_is_unresolved() {
        let head = br#"<?xml version="1.0"?><report name="demo"></report>"#;
        assert_eq!(detect_content(head, "r.xml"), None);
    }

    #[test]
    fn test_extension_fallback() {
        assert_eq!(detect_content(b"", "coverage.out"), Some(ProfileFormat::Native));
        assert_eq!(detect_content(b"", "cover.out"), Some(ProfileFormat::Native));
        assert_eq!(detect_content(b"", "unit.out"), Some(ProfileFormat::Native));
        assert_eq!(detect_content(b"", "lcov.info"), Some(ProfileFormat::Lcov));
        assert_eq!(detect_content(b"", "coverage.info"), Some(ProfileFormat::Lcov));
        assert_eq!(detect_content(b"", "app.INFO"), Some(ProfileFormat::Lcov));
        assert_eq!(detect_content(b"", "coverage.xml"), None);
        assert_eq!(detect_content(b"", "notes.md"), None);
    }

    #[test]
    fn test_bom_is_ignored() {
        let head = "\u{feff}mode: atomic\n".as_bytes();
        assert_eq!(detect_content(head, "p"), Some(ProfileFormat::Native));
    }

    #[test]
    fn test_detect_format_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.xml");
        let mut f = std::fs::File::create(&path).unwrap();
        writeln!(f, "mode: set").unwrap();
        assert_eq!(detect_format(&path).unwrap(), Some(ProfileFormat::Native));
    }

    #[test]
    fn test_empty_file_falls_back_to_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lcov.info");
        std::fs::write(&path, "").unwrap();
        assert_eq!(detect_format(&path).unwrap(), Some(ProfileFormat::Lcov));

        let xml = dir.path().join("empty.xml");
        std::fs::write(&xml, "").unwrap();
        assert_eq!(detect_format(&xml).unwrap(), None);
        assert_eq!(detect_format_or_default(&xml).unwrap(), ProfileFormat::Native);
    }

    #[test]
    fn test_missing_file_is_error() {
        let err = detect_format(Path::new("/definitely/not/here.out")).unwrap_err();
        assert!(matches!(err, CovgateError::Parse { .. }));
    }

    fn padded_lcov() -> String {
        // test-name lines fill the sniffed head; records start past it
        let mut content = "TN:padding\n".repeat(SNIFF_LIMIT / 11 + 10);
        assert!(content.len() > SNIFF_LIMIT);
        content.push_str("SF:src/lib.rs\nDA:1,1\nend_of_record\n");
        content
    }

    #[test]
    fn test_markers_past_sniff_limit_are_not_seen() {
        let content = padded_lcov();
        assert_eq!(detect_content(content.as_bytes(), "report.txt"), None);
        assert_eq!(detect_content(content.as_bytes(), "unit.out"), Some(ProfileFormat::Native));
    }

    #[test]
    fn test_markers_past_sniff_limit_fall_back_to_file_name() {
        let dir = tempfile::tempdir().unwrap();
        let content = padded_lcov();

        let named = dir.path().join("lcov.info");
        std::fs::write(&named, &content).unwrap();
        assert_eq!(detect_format(&named).unwrap(), Some(ProfileFormat::Lcov));

        let unnamed = dir.path().join("report.txt");
        std::fs::write(&unnamed, &content).unwrap();
        assert_eq!(detect_format(&unnamed).unwrap(), None);
    }

    #[test]
    fn test_mode_header_with_large_body() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("profile.xml");
        let mut content = String::from("mode: count\n");
        for i in 0..500 {
            content.push_str(&format!("example.com/m/a.go:{i}.1,{i}.9 1 {}\n", i % 2));
        }
        assert!(content.len() > SNIFF_LIMIT * 2);
        std::fs::write(&path, &content).unwrap();

        assert_eq!(detect_format(&path).unwrap(), Some(ProfileFormat::Native));
        assert_eq!(detect_content(content.as_bytes(), "profile.xml"), Some(ProfileFormat::Native));
    }
}
