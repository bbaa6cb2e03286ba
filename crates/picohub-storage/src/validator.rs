//! Archive structural validation
//!
//! The archive is inspected through its central directory only. Nothing is
//! extracted to disk; the single `manifest.json` entry that is selected gets
//! read into memory and decoded.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use picohub_core::Manifest;
use zip::ZipArchive;

use crate::error::ValidationError;

const S_IFMT: u32 = 0o170000;
const S_IFLNK: u32 = 0o120000;
const MANIFEST_NAME: &str = "manifest.json";
/// Root level or one directory deep.
const MAX_MANIFEST_DEPTH: usize = 2;
const MAX_MANIFEST_BYTES: u64 = 1 << 20;

/// Validate the archive at `path` and return its manifest.
///
/// Every entry is checked in central-directory order: symbolic links are
/// rejected first, then any raw name containing `..`. Among entries named
/// `manifest.json` at depth ≤ 2 the last one scanned wins.
pub fn validate_archive(path: &Path) -> Result<Manifest, ValidationError> {
    let file = File::open(path)
        .map_err(|e| ValidationError::InvalidPackage(format!("failed to open archive: {}", e)))?;
    let mut archive = ZipArchive::new(file)
        .map_err(|e| ValidationError::InvalidPackage(format!("not a valid zip archive: {}", e)))?;

    let mut manifest_index = None;
    for index in 0..archive.len() {
        // Header only; the entry's compression method is never touched here
        let entry = archive
            .by_index_raw(index)
            .map_err(|e| ValidationError::InvalidPackage(format!("unreadable entry: {}", e)))?;

        if is_symlink(entry.unix_mode()) {
            tracing::warn!(entry = %entry.name(), "Rejected archive containing symlink");
            return Err(ValidationError::SymlinkDetected);
        }

        if has_parent_segment(entry.name_raw()) {
            tracing::warn!(entry = %entry.name(), "Rejected archive with path traversal entry");
            return Err(ValidationError::InvalidPackage(format!(
                "path traversal detected: {}",
                entry.name()
            )));
        }

        if !entry.is_dir() && is_manifest_candidate(entry.name()) {
            manifest_index = Some(index);
        }
    }

    let index = manifest_index.ok_or(ValidationError::NoManifest)?;
    let entry = archive
        .by_index(index)
        .map_err(|e| ValidationError::InvalidPackage(format!("unreadable manifest: {}", e)))?;

    let mut raw = Vec::new();
    entry
        .take(MAX_MANIFEST_BYTES + 1)
        .read_to_end(&mut raw)
        .map_err(|e| ValidationError::InvalidPackage(format!("failed to read manifest: {}", e)))?;
    if raw.len() as u64 > MAX_MANIFEST_BYTES {
        return Err(ValidationError::InvalidPackage(
            "manifest.json is too large".to_string(),
        ));
    }

    let manifest: Manifest = serde_json::from_slice(&raw)
        .map_err(|e| ValidationError::InvalidPackage(format!("invalid manifest.json: {}", e)))?;

    if !manifest.has_identity() {
        return Err(ValidationError::InvalidPackage(
            "manifest must contain name and slug".to_string(),
        ));
    }

    Ok(manifest)
}

fn is_symlink(mode: Option<u32>) -> bool {
    mode.is_some_and(|mode| mode & S_IFMT == S_IFLNK)
}

/// Raw byte scan, no normalization.
fn has_parent_segment(raw_name: &[u8]) -> bool {
    raw_name.windows(2).any(|pair| pair == b"..")
}

fn is_manifest_candidate(name: &str) -> bool {
    let trimmed = name.trim_end_matches('/');
    let segments: Vec<&str> = trimmed.split('/').collect();
    segments.len() <= MAX_MANIFEST_DEPTH && segments.last() == Some(&MANIFEST_NAME)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::{FileOptions, ZipWriter};
    use zip::CompressionMethod;

    fn write_archive(dir: &Path, build: impl FnOnce(&mut ZipWriter<File>)) -> std::path::PathBuf {
        let path = dir.join("fixture.zip");
        let mut zip = ZipWriter::new(File::create(&path).unwrap());
        build(&mut zip);
        zip.finish().unwrap();
        path
    }

    fn add(zip: &mut ZipWriter<File>, name: &str, body: &[u8]) {
        zip.start_file(name, FileOptions::default()).unwrap();
        zip.write_all(body).unwrap();
    }

    const DEMO: &[u8] = br#"{"name":"Demo","slug":"demo","version":"1.0.0"}"#;

    #[test]
    fn accepts_root_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_archive(dir.path(), |zip| {
            add(zip, "manifest.json", DEMO);
            add(zip, "main.py", b"print('hi')");
        });
        let manifest = validate_archive(&path).unwrap();
        assert_eq!(manifest.slug, "demo");
        assert_eq!(manifest.version, "1.0.0");
    }

    #[test]
    fn accepts_manifest_one_directory_deep() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_archive(dir.path(), |zip| {
            add(zip, "demo/manifest.json", DEMO);
        });
        assert_eq!(validate_archive(&path).unwrap().name, "Demo");
    }

    #[test]
    fn ignores_manifest_two_directories_deep() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_archive(dir.path(), |zip| {
            add(zip, "a/b/manifest.json", DEMO);
        });
        assert!(matches!(
            validate_archive(&path),
            Err(ValidationError::NoManifest)
        ));
    }

    #[test]
    fn last_qualifying_manifest_wins() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_archive(dir.path(), |zip| {
            add(zip, "manifest.json", DEMO);
            add(
                zip,
                "inner/manifest.json",
                br#"{"name":"Second","slug":"second"}"#,
            );
        });
        assert_eq!(validate_archive(&path).unwrap().slug, "second");
    }

    #[test]
    fn rejects_symlink_even_with_valid_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_archive(dir.path(), |zip| {
            add(zip, "manifest.json", DEMO);
            zip.add_symlink("link", "/etc/passwd", FileOptions::default())
                .unwrap();
        });
        assert!(matches!(
            validate_archive(&path),
            Err(ValidationError::SymlinkDetected)
        ));
    }

    fn add_bzip2(zip: &mut ZipWriter<File>, name: &str, body: &[u8]) {
        let options = FileOptions::default().compression_method(CompressionMethod::Bzip2);
        zip.start_file(name, options).unwrap();
        zip.write_all(body).unwrap();
    }

    #[test]
    fn accepts_entries_in_other_compression_methods() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_archive(dir.path(), |zip| {
            add(zip, "manifest.json", DEMO);
            add_bzip2(zip, "data.bin", &[7u8; 4096]);
        });
        assert_eq!(validate_archive(&path).unwrap().slug, "demo");
    }

    #[test]
    fn symlink_after_bzip2_entry_is_still_detected() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_archive(dir.path(), |zip| {
            add_bzip2(zip, "data.bin", &[7u8; 4096]);
            zip.add_symlink("link", "/etc/passwd", FileOptions::default().unix_permissions(0o777))
                .unwrap();
        });
        assert!(matches!(
            validate_archive(&path),
            Err(ValidationError::SymlinkDetected)
        ));
    }

    #[test]
    fn rejects_parent_segment_in_raw_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_archive(dir.path(), |zip| {
            add(zip, "manifest.json", DEMO);
            add(zip, "../escape.sh", b"rm -rf /");
        });
        assert!(matches!(
            validate_archive(&path),
            Err(ValidationError::InvalidPackage(_))
        ));
    }

    #[test]
    fn missing_slug_is_invalid_package() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_archive(dir.path(), |zip| {
            add(zip, "manifest.json", br#"{"name":"Demo","version":"1.0.0"}"#);
        });
        match validate_archive(&path) {
            Err(ValidationError::InvalidPackage(reason)) => {
                assert_eq!(reason, "manifest must contain name and slug")
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn malformed_manifest_json_is_invalid_package() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_archive(dir.path(), |zip| {
            add(zip, "manifest.json", b"{not json");
        });
        match validate_archive(&path) {
            Err(ValidationError::InvalidPackage(reason)) => {
                assert!(reason.starts_with("invalid manifest.json"))
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn non_zip_bytes_are_invalid_package() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("junk.zip");
        std::fs::write(&path, b"definitely not a zip").unwrap();
        assert!(matches!(
            validate_archive(&path),
            Err(ValidationError::InvalidPackage(_))
        ));
    }

    #[test]
    fn manifest_candidate_depth_rules() {
        assert!(is_manifest_candidate("manifest.json"));
        assert!(is_manifest_candidate("skill/manifest.json"));
        assert!(!is_manifest_candidate("a/b/manifest.json"));
        assert!(!is_manifest_candidate("manifest.json.bak"));
        assert!(!is_manifest_candidate("my-manifest.json"));
    }

    #[test]
    fn parent_segment_scan_is_raw() {
        assert!(has_parent_segment(b"a/../b"));
        assert!(has_parent_segment(b"notes..txt"));
        assert!(!has_parent_segment(b"a/./b"));
    }
}
