//! Directory scanning tests.

use std::fs;
use std::path::{Path, PathBuf};

use cropscan::{FileOutcome, ScanConfig, ScanError, ScanSummary, Scanner};
use tempfile::TempDir;

const PNG_SIGNATURE: &[u8] = b"\x89PNG\r\n\x1a\n";

fn chunk(ty: &[u8; 4], body: &[u8]) -> Vec<u8> {
    let mut v = Vec::new();
    v.extend_from_slice(&(body.len() as u32).to_be_bytes());
    v.extend_from_slice(ty);
    v.extend_from_slice(body);
    let mut h = crc32fast::Hasher::new();
    h.update(ty);
    h.update(body);
    v.extend_from_slice(&h.finalize().to_be_bytes());
    v
}

fn genuine_png() -> Vec<u8> {
    let mut v = PNG_SIGNATURE.to_vec();
    v.extend(chunk(b"IHDR", &[0, 0, 0, 1, 0, 0, 0, 1, 8, 2, 0, 0, 0]));
    v.extend(chunk(b"IEND", &[]));
    v
}

fn cropped_png() -> Vec<u8> {
    let mut v = genuine_png();
    v.extend_from_slice(&[0x11; 40]);
    v.extend(chunk(b"IEND", &[]));
    v
}

fn cropped_jpeg() -> Vec<u8> {
    let mut v = vec![0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x06];
    v.extend_from_slice(b"JFIF");
    v.extend_from_slice(&[0x01, 0xFF, 0xD9, 0x22, 0x22, 0xFF, 0xD9]);
    v
}

/// Run a scan and collect (file name, outcome description) pairs.
fn scan(root: &Path, config: ScanConfig) -> (Result<ScanSummary, ScanError>, Vec<(PathBuf, String)>) {
    let mut seen = Vec::new();
    let result = Scanner::new(config).run(root, |path, outcome| {
        let what = match outcome {
            FileOutcome::Checked(f) if f.is_vulnerable() => "vulnerable".to_string(),
            FileOutcome::Checked(_) => "clean".to_string(),
            FileOutcome::Unreadable(e) => format!("error: {e}"),
            FileOutcome::NotApplicable => "n/a".to_string(),
        };
        seen.push((path.strip_prefix(root).unwrap().to_path_buf(), what));
    });
    (result, seen)
}

#[test]
fn mixed_directory_counts() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("genuine.png"), genuine_png()).unwrap();
    fs::write(dir.path().join("cropped.png"), cropped_png()).unwrap();
    fs::write(dir.path().join("notes.png"), b"just some text").unwrap();

    let (result, seen) = scan(dir.path(), ScanConfig::default());
    let summary = result.unwrap();
    assert_eq!(summary.vulnerable, 1);
    assert_eq!(summary.scanned, 2);
    assert_eq!(summary.skipped, 1);
    assert_eq!(summary.errors, 0);
    assert_eq!(
        seen,
        vec![
            (PathBuf::from("cropped.png"), "vulnerable".to_string()),
            (PathBuf::from("genuine.png"), "clean".to_string()),
            (PathBuf::from("notes.png"), "n/a".to_string()),
        ]
    );
}

#[test]
fn scan_is_idempotent() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("a.png"), cropped_png()).unwrap();
    fs::write(dir.path().join("b.jpg"), cropped_jpeg()).unwrap();
    fs::write(dir.path().join("c.png"), genuine_png()).unwrap();

    let (first, _) = scan(dir.path(), ScanConfig::default());
    let (second, _) = scan(dir.path(), ScanConfig::default());
    let first = first.unwrap();
    assert_eq!(first, second.unwrap());
    assert_eq!(first.vulnerable, 2);
    assert_eq!(first.scanned, 3);
}

#[test]
fn hidden_directories_are_skipped() {
    let dir = TempDir::new().unwrap();
    fs::create_dir_all(dir.path().join(".cache/thumbs")).unwrap();
    fs::create_dir_all(dir.path().join("photos/2023")).unwrap();
    fs::write(dir.path().join(".cache/thumbs/x.png"), cropped_png()).unwrap();
    fs::write(dir.path().join("photos/2023/y.png"), cropped_png()).unwrap();
    // Hidden files are still candidates; only directories are pruned.
    fs::write(dir.path().join("photos/.z.png"), genuine_png()).unwrap();

    let (result, seen) = scan(dir.path(), ScanConfig::default());
    let summary = result.unwrap();
    assert_eq!(summary.vulnerable, 1);
    assert_eq!(summary.scanned, 2);
    assert!(seen.iter().all(|(p, _)| !p.starts_with(".cache")));
}

#[test]
fn hidden_root_is_still_scanned() {
    let dir = TempDir::new().unwrap();
    let root = dir.path().join(".screenshots");
    fs::create_dir(&root).unwrap();
    fs::write(root.join("s.png"), cropped_png()).unwrap();

    let (result, _) = scan(&root, ScanConfig::default());
    assert_eq!(result.unwrap().vulnerable, 1);
}

#[test]
fn extension_filter_is_case_insensitive() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("UPPER.PNG"), cropped_png()).unwrap();
    fs::write(dir.path().join("photo.JpG"), cropped_jpeg()).unwrap();
    fs::write(dir.path().join("photo.jpeg"), cropped_jpeg()).unwrap();
    fs::write(dir.path().join("README"), b"hello").unwrap();

    let (result, _) = scan(dir.path(), ScanConfig::default());
    let summary = result.unwrap();
    assert_eq!(summary.scanned, 2);
    assert_eq!(summary.vulnerable, 2);

    let config = ScanConfig::default().with_extension_list("png,jpg,jpeg");
    let (result, _) = scan(dir.path(), config);
    assert_eq!(result.unwrap().vulnerable, 3);
}

#[test]
fn all_mode_sniffs_every_file() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("no_extension"), cropped_png()).unwrap();
    fs::write(dir.path().join("README.txt"), b"hello").unwrap();

    let config = ScanConfig { all: true, ..Default::default() };
    let (result, _) = scan(dir.path(), config);
    let summary = result.unwrap();
    assert_eq!(summary.vulnerable, 1);
    assert_eq!(summary.scanned, 1);
    assert_eq!(summary.skipped, 1);
}

#[test]
fn parse_errors_count_as_scanned() {
    let dir = TempDir::new().unwrap();
    let mut corrupt = genuine_png();
    corrupt[20] ^= 0xFF;
    fs::write(dir.path().join("corrupt.png"), corrupt).unwrap();
    fs::write(dir.path().join("empty.jpg"), b"").unwrap();

    let (result, seen) = scan(dir.path(), ScanConfig::default());
    let summary = result.unwrap();
    assert_eq!(summary.scanned, 1);
    assert_eq!(summary.errors, 1);
    assert_eq!(summary.skipped, 1);
    assert!(seen[0].1.starts_with("error: checksum mismatch in IHDR"), "{:?}", seen);
}

#[test]
fn missing_root_is_fatal() {
    let dir = TempDir::new().unwrap();
    let (result, seen) = scan(&dir.path().join("nope"), ScanConfig::default());
    let err = result.unwrap_err();
    assert!(err.is_fatal());
    assert!(matches!(err, ScanError::DirectoryRead { .. }));
    assert!(seen.is_empty());
}

#[test]
fn parallel_flag_matches_sequential() {
    let dir = TempDir::new().unwrap();
    for i in 0..20 {
        let bytes = if i % 3 == 0 { cropped_png() } else { genuine_png() };
        fs::write(dir.path().join(format!("img{i:02}.png")), bytes).unwrap();
    }
    let (seq, seq_seen) = scan(dir.path(), ScanConfig::default());
    let config = ScanConfig { parallel: true, ..Default::default() };
    let (par, par_seen) = scan(dir.path(), config);
    assert_eq!(seq.unwrap(), par.unwrap());
    assert_eq!(seq_seen, par_seen);
}

#[cfg(unix)]
#[test]
fn symlinked_files_are_checked() {
    use std::os::unix::fs::symlink;

    let dir = TempDir::new().unwrap();
    let store = dir.path().join("store");
    let root = dir.path().join("root");
    fs::create_dir_all(store.join("album")).unwrap();
    fs::create_dir(&root).unwrap();
    fs::write(store.join("cropped.png"), cropped_png()).unwrap();
    fs::write(store.join("album/inner.png"), cropped_png()).unwrap();
    symlink(store.join("cropped.png"), root.join("link.png")).unwrap();
    symlink(store.join("album"), root.join("album")).unwrap();
    symlink(store.join("missing.png"), root.join("dangling.png")).unwrap();

    let (result, seen) = scan(&root, ScanConfig::default());
    let summary = result.unwrap();
    assert_eq!(summary.vulnerable, 1);
    assert_eq!(summary.scanned, 1);
    assert_eq!(seen, vec![(PathBuf::from("link.png"), "vulnerable".to_string())]);

    // Directory links are only entered on request. walkdir reports a dangling
    // link as an error once it follows links.
    fs::remove_file(root.join("dangling.png")).unwrap();
    let config = ScanConfig { follow_links: true, ..Default::default() };
    let (result, _) = scan(&root, config);
    assert_eq!(result.unwrap().vulnerable, 2);
}
