//! File-backed report store.
//!
//! One pretty-printed JSON file per report, named `report_YYYYMMDD_HHMMSS.json`
//! after the local time it was written. Files are never rewritten: a second
//! report in the same second gets a numeric suffix.

use std::fs::{self, File, OpenOptions};
use std::io::{self, ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::vec;

use chrono::{Local, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{info, warn};

use super::Report;
use crate::Error;

const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

static KEY_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^report_(\d{8}_\d{6})(?:_\d+)?$").unwrap());

/// A report read back from disk.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredReport {
    /// File stem, e.g. `report_20251027_194500`.
    pub key: String,
    /// Time embedded in the key, if it could be parsed.
    pub timestamp: Option<NaiveDateTime>,
    pub report: Report,
}

/// Directory of JSON reports.
#[derive(Debug, Clone)]
pub struct ReportStore {
    dir: PathBuf,
}

impl ReportStore {
    /// Open the store at `dir`, creating the directory if needed.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, Error> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Persist `report` keyed by the current local time. Returns the key.
    pub fn write(&self, report: &Report) -> Result<String, Error> {
        self.write_at(report, Local::now().naive_local())
    }

    /// Persist `report` keyed by `at` (one-second resolution). Returns the key.
    pub fn write_at(&self, report: &Report, at: NaiveDateTime) -> Result<String, Error> {
        let stamp = at.format(TIMESTAMP_FORMAT).to_string();
        let json = serde_json::to_string_pretty(report)?;

        let mut attempt = 0u32;
        loop {
            let key = if attempt == 0 {
                format!("report_{}", stamp)
            } else {
                format!("report_{}_{}", stamp, attempt)
            };
            let path = self.dir.join(format!("{}.json", key));

            match create_exclusive(&path, |file| file.write_all(json.as_bytes())) {
                Ok(()) => {
                    info!("Wrote report {:?}", path);
                    return Ok(key);
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => attempt += 1,
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Every stored report, most recent first.
    ///
    /// The set of files is fixed when this is called; reports written
    /// afterwards only show up in a later call. Contents are read lazily.
    pub fn read_all(&self) -> Result<ReportIter, Error> {
        let mut paths: Vec<PathBuf> = fs::read_dir(&self.dir)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|p| p.is_file() && p.extension().is_some_and(|e| e == "json"))
            .collect();

        paths.sort();
        paths.reverse();

        Ok(ReportIter {
            paths: paths.into_iter(),
        })
    }
}

/// Lazy sequence of stored reports. Unreadable files are skipped.
pub struct ReportIter {
    paths: vec::IntoIter<PathBuf>,
}

impl Iterator for ReportIter {
    type Item = StoredReport;

    fn next(&mut self) -> Option<StoredReport> {
        loop {
            let path = self.paths.next()?;
            match load(&path) {
                Ok(stored) => return Some(stored),
                Err(e) => warn!("Skipping unreadable report {:?}: {}", path, e),
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.paths.len()))
    }
}

/// Create `path` only if it does not exist yet, then fill it.
///
/// If filling fails the file is removed again, so readers never see a
/// truncated report.
fn create_exclusive<F>(path: &Path, fill: F) -> io::Result<()>
where
    F: FnOnce(&mut File) -> io::Result<()>,
{
    let mut file = OpenOptions::new().write(true).create_new(true).open(path)?;
    if let Err(e) = fill(&mut file).and_then(|()| file.sync_all()) {
        drop(file);
        if let Err(remove_err) = fs::remove_file(path) {
            warn!("Cannot remove partial report {:?}: {}", path, remove_err);
        }
        return Err(e);
    }
    Ok(())
}

fn load(path: &Path) -> Result<StoredReport, Error> {
    let content = fs::read_to_string(path)?;
    let report: Report = serde_json::from_str(&content)?;
    let key = path
        .file_stem()
        .unwrap_or_default()
        .to_string_lossy()
        .to_string();
    let timestamp = parse_key_timestamp(&key);

    Ok(StoredReport {
        key,
        timestamp,
        report,
    })
}

/// Recover the write time from a report key.
pub fn parse_key_timestamp(key: &str) -> Option<NaiveDateTime> {
    let caps = KEY_PATTERN.captures(key)?;
    NaiveDateTime::parse_from_str(&caps[1], TIMESTAMP_FORMAT).ok()
}
