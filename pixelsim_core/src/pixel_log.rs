//! Append-only pixel hit log.
//!
//! The dashboard side of the simulator records every pixel fetch as one
//! JSON line in a plain file, keyed by session so one visitor's hits can
//! be listed or wiped without touching anyone else's.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

/// Errors from pixel-log file operations.
#[derive(Debug, Error)]
pub enum PixelLogError {
    #[error("pixel log I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("pixel log serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// One recorded pixel hit.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PixelLogEntry {
    /// Opaque per-visitor session identifier
    pub session_id: String,

    /// Hit timestamp
    pub time: DateTime<Utc>,

    /// Client address as reported by the transport
    pub ip: String,

    /// Raw user-agent string
    pub user_agent: String,

    /// Referring page, empty when absent
    pub referrer: String,

    /// Page the pixel was embedded in
    pub page: String,
}

/// A JSON-lines pixel log on disk.
pub struct PixelLog {
    path: PathBuf,
}

impl PixelLog {
    /// Opens a log at the given path. The file is created lazily on the
    /// first append.
    pub fn open<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Appends one entry as a single JSON line.
    pub fn append(&self, entry: &PixelLogEntry) -> Result<(), PixelLogError> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let line = serde_json::to_string(entry)?;
        writeln!(file, "{line}")?;
        debug!(session = %entry.session_id, page = %entry.page, "pixel hit logged");
        Ok(())
    }

    /// Returns all entries for one session, most recent first.
    ///
    /// A missing log file is an empty log. Unparseable lines are skipped
    /// rather than failing the whole read.
    pub fn read_session(&self, session_id: &str) -> Result<Vec<PixelLogEntry>, PixelLogError> {
        let file = match File::open(&self.path) {
            Ok(f) => f,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut entries = Vec::new();
        for line in BufReader::new(file).lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<PixelLogEntry>(&line) {
                Ok(entry) if entry.session_id == session_id => entries.push(entry),
                Ok(_) => {}
                Err(e) => warn!("skipping malformed pixel log line: {e}"),
            }
        }
        entries.reverse();
        Ok(entries)
    }

    /// Removes every entry belonging to the given session, rewriting the
    /// file with the remaining ones. Malformed lines are dropped in the
    /// rewrite.
    pub fn clear_session(&self, session_id: &str) -> Result<(), PixelLogError> {
        let file = match File::open(&self.path) {
            Ok(f) => f,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(e.into()),
        };

        let mut kept = Vec::new();
        for line in BufReader::new(file).lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            if let Ok(entry) = serde_json::from_str::<PixelLogEntry>(&line) {
                if entry.session_id != session_id {
                    kept.push(line);
                }
            }
        }

        let mut out = File::create(&self.path)?;
        for line in &kept {
            writeln!(out, "{line}")?;
        }
        debug!(session = %session_id, remaining = kept.len(), "session cleared from pixel log");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    static COUNTER: AtomicU32 = AtomicU32::new(0);

    fn temp_log() -> (PixelLog, PathBuf) {
        let n = COUNTER.fetch_add(1, Ordering::SeqCst);
        let path = std::env::temp_dir().join(format!(
            "pixelsim_log_{}_{}.jsonl",
            std::process::id(),
            n
        ));
        let _ = std::fs::remove_file(&path);
        (PixelLog::open(&path), path)
    }

    fn entry(session: &str, page: &str) -> PixelLogEntry {
        PixelLogEntry {
            session_id: session.to_string(),
            time: Utc::now(),
            ip: "203.0.113.9".to_string(),
            user_agent: "Mozilla/5.0 (test)".to_string(),
            referrer: String::new(),
            page: page.to_string(),
        }
    }

    #[test]
    fn test_missing_file_reads_as_empty() {
        let (log, path) = temp_log();
        assert!(log.read_session("abc").unwrap().is_empty());
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn test_append_and_read_session_most_recent_first() {
        let (log, path) = temp_log();
        log.append(&entry("s1", "home")).unwrap();
        log.append(&entry("s1", "product")).unwrap();
        log.append(&entry("s2", "home")).unwrap();

        let hits = log.read_session("s1").unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].page, "product");
        assert_eq!(hits[1].page, "home");
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn test_malformed_lines_are_skipped_on_read() {
        let (log, path) = temp_log();
        log.append(&entry("s1", "home")).unwrap();
        {
            let mut f = OpenOptions::new().append(true).open(&path).unwrap();
            writeln!(f, "not json at all").unwrap();
        }
        log.append(&entry("s1", "cart")).unwrap();

        let hits = log.read_session("s1").unwrap();
        assert_eq!(hits.len(), 2);
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn test_clear_session_keeps_other_sessions() {
        let (log, path) = temp_log();
        log.append(&entry("s1", "home")).unwrap();
        log.append(&entry("s2", "home")).unwrap();
        log.append(&entry("s1", "cart")).unwrap();

        log.clear_session("s1").unwrap();
        assert!(log.read_session("s1").unwrap().is_empty());
        assert_eq!(log.read_session("s2").unwrap().len(), 1);
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn test_clear_missing_file_is_noop() {
        let (log, path) = temp_log();
        log.clear_session("s1").unwrap();
        assert!(!path.exists());
    }
}
