//! Directory scanning: traversal, extension gating, per-file checks, and the
//! running summary.
//!
//! # Example
//!
//! ```no_run
//! use cropscan::{FileOutcome, ScanConfig, Scanner};
//! use std::path::Path;
//!
//! let scanner = Scanner::new(ScanConfig::default());
//! let summary = scanner.run(Path::new("Pictures"), |path, outcome| {
//!     if outcome.is_vulnerable() {
//!         println!("Potentially vulnerable: {}", path.display());
//!     }
//! })?;
//! println!("{} of {}", summary.vulnerable, summary.scanned);
//! # Ok::<(), cropscan::ScanError>(())
//! ```

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use walkdir::{DirEntry, WalkDir};

use crate::error::ScanError;
use crate::result::FileOutcome;

/// Extensions checked when no filter is given.
pub const DEFAULT_EXTENSIONS: &[&str] = &["png", "jpg"];

/// Scan settings.
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Lowercase extensions (without the dot) that make a file a candidate.
    pub extensions: Vec<String>,
    /// Ignore the extension filter and sniff every regular file.
    pub all: bool,
    /// Follow symbolic links while walking.
    pub follow_links: bool,
    /// Check files on the rayon pool (`parallel` feature).
    pub parallel: bool,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            extensions: DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            all: false,
            follow_links: false,
            parallel: false,
        }
    }
}

impl ScanConfig {
    /// Parse a comma-separated extension list (e.g. "png, JPG,.jpeg").
    /// Empty entries are dropped; an empty result falls back to the defaults.
    pub fn with_extension_list(mut self, list: &str) -> Self {
        let exts: Vec<String> = list
            .split(',')
            .map(|s| s.trim().trim_start_matches('.').to_lowercase())
            .filter(|s| !s.is_empty())
            .collect();
        if !exts.is_empty() {
            self.extensions = exts;
        }
        self
    }

    /// Whether `path` passes the extension filter.
    pub fn is_candidate(&self, path: &Path) -> bool {
        if self.all {
            return true;
        }
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| self.extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)))
    }
}

/// Running counts for one scan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ScanSummary {
    /// Files judged vulnerable.
    pub vulnerable: u64,
    /// Files handed to a reader (including those that failed to parse).
    pub scanned: u64,
    /// Files that failed to open or parse.
    pub errors: u64,
    /// Candidates whose magic matched neither format.
    pub skipped: u64,
}

impl ScanSummary {
    pub fn record(&mut self, outcome: &FileOutcome) {
        match outcome {
            FileOutcome::Checked(finding) => {
                self.scanned += 1;
                if finding.is_vulnerable() {
                    self.vulnerable += 1;
                }
            }
            FileOutcome::Unreadable(_) => {
                self.scanned += 1;
                self.errors += 1;
            }
            FileOutcome::NotApplicable => self.skipped += 1,
        }
    }
}

/// Open a file and check it. The handle is closed when this returns.
pub fn check_file(path: &Path) -> FileOutcome {
    log::debug!("checking {}", path.display());
    match File::open(path) {
        Ok(file) => crate::check_stream(BufReader::new(file)),
        Err(e) => FileOutcome::Unreadable(e.into()),
    }
}

/// Hidden directories (leading dot) are pruned; the root is always entered.
fn is_hidden_dir(entry: &DirEntry) -> bool {
    entry.depth() > 0
        && entry.file_type().is_dir()
        && entry.file_name().to_str().is_some_and(|n| n.starts_with('.'))
}

/// Regular files, plus symlinks that resolve to one. Directory links are only
/// entered with `follow_links`.
fn is_regular_file(entry: &DirEntry) -> bool {
    entry.file_type().is_file()
        || (entry.path_is_symlink()
            && std::fs::metadata(entry.path()).is_ok_and(|m| m.is_file()))
}

/// Walks a tree and checks every candidate file.
#[derive(Debug, Clone, Default)]
pub struct Scanner {
    config: ScanConfig,
}

impl Scanner {
    pub fn new(config: ScanConfig) -> Self {
        Self { config }
    }

    /// Candidate files under `root`, sorted by name within each directory.
    /// A directory that cannot be read yields a [`ScanError::DirectoryRead`].
    pub fn candidates<'a>(
        &'a self,
        root: &Path,
    ) -> impl Iterator<Item = Result<PathBuf, ScanError>> + 'a {
        WalkDir::new(root)
            .follow_links(self.config.follow_links)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| !is_hidden_dir(e))
            .filter_map(move |entry| match entry {
                Ok(e) if is_regular_file(&e) && self.config.is_candidate(e.path()) => {
                    Some(Ok(e.into_path()))
                }
                Ok(e) => {
                    log::trace!("skip {}", e.path().display());
                    None
                }
                Err(err) => Some(Err(ScanError::from(err))),
            })
    }

    /// Check every candidate under `root`, calling `on_outcome` for each in
    /// path order. A traversal error aborts the scan before any file is read.
    pub fn run<F>(&self, root: &Path, on_outcome: F) -> Result<ScanSummary, ScanError>
    where
        F: FnMut(&Path, &FileOutcome),
    {
        let summary = self.check_candidates(self.candidates(root), on_outcome)?;
        log::info!(
            "scan of {} done: {} vulnerable, {} scanned, {} errors",
            root.display(),
            summary.vulnerable,
            summary.scanned,
            summary.errors
        );
        Ok(summary)
    }

    /// Both modes finish traversal first and report on this thread, in path
    /// order, so they print the same lines and counts.
    fn check_candidates<I, F>(&self, candidates: I, mut on_outcome: F) -> Result<ScanSummary, ScanError>
    where
        I: IntoIterator<Item = Result<PathBuf, ScanError>>,
        F: FnMut(&Path, &FileOutcome),
    {
        let paths = candidates.into_iter().collect::<Result<Vec<_>, _>>()?;
        let mut summary = ScanSummary::default();

        if self.config.parallel {
            let outcomes = check_parallel(&paths);
            for (path, outcome) in paths.iter().zip(&outcomes) {
                on_outcome(path, outcome);
                summary.record(outcome);
            }
        } else {
            for path in &paths {
                let outcome = check_file(path);
                on_outcome(path, &outcome);
                summary.record(&outcome);
            }
        }
        Ok(summary)
    }
}

#[cfg(feature = "parallel")]
fn check_parallel(paths: &[PathBuf]) -> Vec<FileOutcome> {
    use rayon::prelude::*;

    log::debug!(
        "checking {} candidates on {} threads",
        paths.len(),
        rayon::current_num_threads()
    );
    paths.par_iter().map(|p| check_file(p)).collect()
}

#[cfg(not(feature = "parallel"))]
fn check_parallel(paths: &[PathBuf]) -> Vec<FileOutcome> {
    log::warn!("built without the `parallel` feature; scanning sequentially");
    paths.iter().map(|p| check_file(p)).collect()
}
