//! Recovery of a session interrupted by an unclean daemon exit.
//!
//! A working file that survives until the next startup means the previous
//! session never reached its final record. Its last valid record is the
//! best known account of that session, so it is forwarded to the log sink
//! before the recorder truncates the file for a new session.
//!
//! A file ending in an `F` record means the crash hit between the summary
//! and the unlink, and the summary may already be in the log. It is emitted
//! again anyway: a possible duplicate is preferred over a possible loss.
//! The daemon log tells the two cases apart (`last_record = F`).

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::stats::{Record, SessionSummary};
use crate::syslog::LogSink;

#[derive(Debug, Error)]
pub enum RecoveryError {
    #[error("cannot read stats file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("cannot remove stats file {path}: {source}")]
    Remove {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Emit the summary of a leftover working file and remove it.
///
/// Returns `Ok(None)` when there is no file or it holds no valid record.
pub fn recover_stale_session(
    path: &Path,
    sink: &mut dyn LogSink,
) -> Result<Option<SessionSummary>, RecoveryError> {
    let bytes = match fs::read(path) {
        Ok(b) => b,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(RecoveryError::Read {
                path: path.to_path_buf(),
                source,
            });
        }
    };

    let contents = String::from_utf8_lossy(&bytes);
    let last = last_valid_record(&contents);

    let summary = last.as_ref().map(SessionSummary::from);
    if let (Some(record), Some(summary)) = (&last, &summary) {
        tracing::warn!(
            path = %path.display(),
            last_record = %record.record_type.tag(),
            duration_s = summary.duration_secs,
            "recovered stats of an interrupted session"
        );
        sink.emit(summary);
    } else {
        tracing::debug!(path = %path.display(), "stale stats file holds no records");
    }

    match fs::remove_file(path) {
        Ok(()) => Ok(summary),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(summary),
        Err(source) => Err(RecoveryError::Remove {
            path: path.to_path_buf(),
            source,
        }),
    }
}

fn last_valid_record(contents: &str) -> Option<Record> {
    contents
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .filter_map(|(idx, line)| match line.parse::<Record>() {
            Ok(record) => Some(record),
            Err(e) => {
                tracing::warn!(line = idx + 1, error = %e, "skipping malformed stats record");
                None
            }
        })
        .last()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::RecordType;
    use crate::syslog::MemorySink;

    #[test]
    fn missing_file_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = MemorySink::default();
        let result = recover_stale_session(&dir.path().join("stats"), &mut sink).unwrap();
        assert!(result.is_none());
        assert!(sink.lines().is_empty());
    }

    #[test]
    fn emits_last_checkpoint_and_removes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stats");
        fs::write(
            &path,
            "S\t2026-03-01 12:00:00\t2026-03-01 12:00:00\t0\t0\t0\n\
             P\t2026-03-01 12:00:00\t2026-03-01 12:01:00\t60\t1000\t500\n\
             P\t2026-03-01 12:00:00\t2026-03-01 12:02:00\t120\t2000\t900\n",
        )
        .unwrap();

        let mut sink = MemorySink::default();
        let summary = recover_stale_session(&path, &mut sink).unwrap().unwrap();

        assert_eq!(summary.duration_secs, 120);
        assert_eq!((summary.rx_bytes, summary.tx_bytes), (2000, 900));
        assert_eq!(
            sink.lines(),
            vec![
                "Connection stats [From: 2026-03-01 12:00:00] [To: 2026-03-01 12:02:00] \
                 [Duration: 120] [RX: 2000] [TX: 900]"
            ]
        );
        assert!(!path.exists());
    }

    #[test]
    fn truncated_tail_falls_back_to_previous_record() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stats");
        fs::write(
            &path,
            "S\tN/A\tN/A\t0\t0\t0\nP\tN/A\tN/A\t30\t10\t20\nP\tN/A\tN/A\t6",
        )
        .unwrap();

        let mut sink = MemorySink::default();
        let summary = recover_stale_session(&path, &mut sink).unwrap().unwrap();
        assert_eq!(summary.duration_secs, 30);
        assert_eq!(sink.lines().len(), 1);
    }

    #[test]
    fn garbage_file_is_removed_silently() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stats");
        fs::write(&path, "not a stats file\n\n").unwrap();

        let mut sink = MemorySink::default();
        assert!(recover_stale_session(&path, &mut sink).unwrap().is_none());
        assert!(sink.lines().is_empty());
        assert!(!path.exists());
    }

    #[test]
    fn last_record_wins_even_if_final() {
        let record = last_valid_record("S\tN/A\tN/A\t0\t0\t0\nF\tN/A\tN/A\t9\t1\t2\n").unwrap();
        assert_eq!(record.record_type, RecordType::Final);
    }

    #[test]
    fn final_record_is_emitted_again() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stats");
        fs::write(&path, "S\tN/A\tN/A\t0\t0\t0\nF\tN/A\tN/A\t9\t1\t2\n").unwrap();

        let mut sink = MemorySink::default();
        let summary = recover_stale_session(&path, &mut sink).unwrap().unwrap();
        assert_eq!((summary.duration_secs, summary.rx_bytes, summary.tx_bytes), (9, 1, 2));
        assert_eq!(
            sink.lines(),
            vec!["Connection stats [From: N/A] [To: N/A] [Duration: 9] [RX: 1] [TX: 2]"]
        );
        assert!(!path.exists());

        // Nothing left for a second startup.
        assert!(recover_stale_session(&path, &mut sink).unwrap().is_none());
        assert_eq!(sink.lines().len(), 1);
    }
}
