//! Per-file scan results: verdict, matched threats, and outcome.

#[cfg(feature = "serde")]
use serde::Serialize;

use crate::error::ScanError;
use crate::FileType;

/// Verdict for a file whose container could be read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub enum Verdict {
    /// No leftover image data after the end marker.
    Clean,
    /// The trailer looks like the tail of a second, pre-edit image.
    Vulnerable,
}

/// Trust level for a detector: higher trust = fewer expected false positives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum TrustLevel {
    /// Reliable signal; low expected false positive rate.
    High,
    /// May produce false positives; triage recommended.
    Low,
}

/// A matched vulnerability pattern.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct Threat {
    /// Short identifier (e.g. "CVE-2023-21036").
    pub id: String,
    /// Human-readable description.
    pub description: String,
    /// Optional reference (advisory, write-up).
    pub reference: Option<String>,
    pub trust: TrustLevel,
}

/// What the readers and validators concluded about one file.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct Finding {
    pub format: FileType,
    pub verdict: Verdict,
    /// Bytes found after the end marker (0 when there is no trailer to check).
    pub trailer_len: usize,
    /// Matched threats (empty if clean).
    pub threats: Vec<Threat>,
}

impl Finding {
    /// A clean finding with the given trailer length.
    pub fn clean(format: FileType, trailer_len: usize) -> Self {
        Self {
            format,
            verdict: Verdict::Clean,
            trailer_len,
            threats: Vec::new(),
        }
    }

    pub fn vulnerable(format: FileType, trailer_len: usize, threats: Vec<Threat>) -> Self {
        Self {
            format,
            verdict: Verdict::Vulnerable,
            trailer_len,
            threats,
        }
    }

    #[inline]
    pub fn is_vulnerable(&self) -> bool {
        self.verdict == Verdict::Vulnerable
    }
}

/// Outcome of checking a single file.
#[derive(Debug)]
pub enum FileOutcome {
    /// The container was read and a verdict produced.
    Checked(Finding),
    /// Reading or parsing failed; the file is skipped.
    Unreadable(ScanError),
    /// The magic bytes match neither PNG nor JPEG; no reader was invoked.
    NotApplicable,
}

impl FileOutcome {
    #[inline]
    pub fn is_vulnerable(&self) -> bool {
        matches!(self, FileOutcome::Checked(f) if f.is_vulnerable())
    }
}

impl From<Result<Finding, ScanError>> for FileOutcome {
    fn from(r: Result<Finding, ScanError>) -> Self {
        match r {
            Ok(finding) => FileOutcome::Checked(finding),
            Err(err) => FileOutcome::Unreadable(err),
        }
    }
}
