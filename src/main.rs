//! CLI for cropscan: scan a directory tree for acropalypse-affected PNG/JPEG files.

#![cfg(feature = "cli")]

use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;

use clap::{CommandFactory, Parser};
use cropscan::logging::init_logging;
use cropscan::{FileOutcome, ScanConfig, ScanError, ScanSummary, Scanner};
use indexmap::IndexMap;
use sha2::{Digest, Sha256};

#[derive(Parser)]
#[command(name = "cropscan")]
#[command(
    about = "Find cropped PNG/JPEG images that still carry the pre-edit image (acropalypse)",
    long_about = None
)]
struct Args {
    /// Directory to scan (recursively; hidden directories are skipped)
    path: Option<PathBuf>,

    /// File extensions to scan (comma-separated, case-insensitive)
    #[arg(short, long, default_value = "png,jpg")]
    extensions: String,

    /// Scan all files and pick the format from content (ignore extension filter)
    #[arg(long)]
    all: bool,

    /// Follow symbolic links
    #[arg(short = 'L', long)]
    follow_links: bool,

    /// Check files in parallel (needs the `parallel` feature)
    #[arg(short = 'j', long)]
    parallel: bool,

    /// Output one JSON object per reported file, then a summary object
    #[arg(long)]
    json: bool,

    /// Exit with 2 when vulnerable files are found, 3 on per-file errors, 1 on a fatal error
    #[arg(long)]
    exit_code: bool,

    /// More log output on stderr (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long)]
    quiet: bool,
}

const NOT_AN_IMAGE: &str = "file doesn't appear to be a PNG or JPEG";

/// Exit statuses used with `--exit-code`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Status {
    Clean = 0,
    Fatal = 1,
    Vulnerable = 2,
    FileErrors = 3,
}

impl Status {
    fn from_summary(summary: &ScanSummary) -> Self {
        if summary.vulnerable > 0 {
            Status::Vulnerable
        } else if summary.errors > 0 {
            Status::FileErrors
        } else {
            Status::Clean
        }
    }
}

fn sha256_file(path: &Path) -> io::Result<String> {
    let mut hasher = Sha256::new();
    io::copy(&mut File::open(path)?, &mut hasher)?;
    Ok(format!("{:x}", hasher.finalize()))
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.verbose, args.quiet);

    let Some(root) = args.path.as_deref() else {
        println!("{}", Args::command().render_usage());
        return ExitCode::SUCCESS;
    };

    let config = ScanConfig {
        all: args.all,
        follow_links: args.follow_links,
        parallel: args.parallel,
        ..ScanConfig::default()
    }
    .with_extension_list(&args.extensions);

    let status = match run(root, config, &args) {
        Ok(summary) => Status::from_summary(&summary),
        Err(err) => {
            // Traversal errors were already reported on stdout.
            if err.downcast_ref::<ScanError>().is_some() {
                log::debug!("scan aborted: {:#}", err);
            } else {
                log::error!("{:#}", err);
            }
            Status::Fatal
        }
    };

    if args.exit_code {
        ExitCode::from(status as u8)
    } else {
        ExitCode::SUCCESS
    }
}

fn run(root: &Path, config: ScanConfig, args: &Args) -> anyhow::Result<ScanSummary> {
    let start = Instant::now();
    let extension_gated = !config.all;
    let scanner = Scanner::new(config);

    let mut report_err: Option<anyhow::Error> = None;
    let result = scanner.run(root, |path, outcome| {
        if report_err.is_some() {
            return;
        }
        if let Err(e) = report(path, outcome, extension_gated, args.json) {
            report_err = Some(e);
        }
    });
    if let Some(e) = report_err {
        return Err(e);
    }

    let summary = match result {
        Ok(summary) => summary,
        Err(err) => {
            print_error(None, &err, args.json)?;
            return Err(err.into());
        }
    };
    if summary.scanned == 0 && summary.skipped == 0 {
        log::warn!("no images to check under {}", root.display());
    }

    let elapsed = start.elapsed().as_secs_f64();
    if args.json {
        let mut out = IndexMap::<&str, serde_json::Value>::new();
        out.insert("type", "summary".into());
        out.insert("summary", serde_json::to_value(summary)?);
        out.insert("elapsed_seconds", elapsed.into());
        println!("{}", serde_json::to_string(&out)?);
    } else {
        println!(
            "Found {} vulnerable images out of a scanned total of {}.",
            summary.vulnerable, summary.scanned
        );
        println!("Total time to execute: {:.5} seconds", elapsed);
    }
    Ok(summary)
}

fn report(path: &Path, outcome: &FileOutcome, extension_gated: bool, json: bool) -> anyhow::Result<()> {
    match outcome {
        FileOutcome::Checked(finding) if finding.is_vulnerable() => {
            if json {
                let mut out = IndexMap::<&str, serde_json::Value>::new();
                out.insert("type", "vulnerable".into());
                out.insert("path", path.display().to_string().into());
                out.insert("sha256", sha256_file(path).ok().into());
                out.insert("format", serde_json::to_value(finding.format)?);
                out.insert("trailer_bytes", finding.trailer_len.into());
                out.insert("threats", serde_json::to_value(&finding.threats)?);
                println!("{}", serde_json::to_string(&out)?);
            } else {
                println!("Potentially vulnerable: {}", path.display());
            }
        }
        FileOutcome::Checked(finding) => {
            log::debug!(
                "clean {} ({}, {} trailing bytes)",
                path.display(),
                finding.format.label(),
                finding.trailer_len
            );
        }
        FileOutcome::Unreadable(err) => print_error(Some(path), err, json)?,
        FileOutcome::NotApplicable if extension_gated => {
            if json {
                print_json_error(Some(path), NOT_AN_IMAGE)?;
            } else {
                println!("Error: {}: {}", path.display(), NOT_AN_IMAGE);
            }
        }
        FileOutcome::NotApplicable => log::trace!("not an image: {}", path.display()),
    }
    Ok(())
}

fn print_error(path: Option<&Path>, err: &ScanError, json: bool) -> anyhow::Result<()> {
    if json {
        return print_json_error(path, &err.to_string());
    }
    match path {
        Some(p) => println!("Error: {}: {}", p.display(), err),
        None => println!("Error: {}", err),
    }
    Ok(())
}

fn print_json_error(path: Option<&Path>, message: &str) -> anyhow::Result<()> {
    let mut out = IndexMap::<&str, serde_json::Value>::new();
    out.insert("type", "error".into());
    out.insert("path", path.map(|p| p.display().to_string()).into());
    out.insert("message", message.into());
    println!("{}", serde_json::to_string(&out)?);
    Ok(())
}
