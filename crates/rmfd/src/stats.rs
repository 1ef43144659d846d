//! Connection statistics recorder.
//!
//! Keeps one accounting session per data connection and mirrors every
//! lifecycle event into a working file, one tab-separated record per line:
//!
//! ```text
//! S\t2026-03-01 12:00:00\t2026-03-01 12:00:00\t0\t0\t0
//! P\t2026-03-01 12:00:00\t2026-03-01 12:01:00\t60\t1000\t500
//! F\t2026-03-01 12:00:00\t2026-03-01 12:02:00\t120\t2000\t1000
//! ```
//!
//! Each record is written and flushed as soon as it is produced, so after an
//! unclean exit the file still holds the session start and the last known
//! counters (see `recovery`). On a clean stop the summary goes to the log
//! sink first and the file is deleted afterwards.
//!
//! Storage problems never fail the caller: they are logged and recording
//! degrades to summary-only.

use std::fmt;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Instant;

use chrono::{DateTime, Local, NaiveDateTime};
use thiserror::Error;

use crate::syslog::LogSink;

/// Upper bound for a record line, trailing newline included.
pub const MAX_LINE_LENGTH: usize = 255;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const NO_TIMESTAMP: &str = "N/A";

// ── Records ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordType {
    Start,
    Periodic,
    Final,
}

impl RecordType {
    pub fn tag(self) -> char {
        match self {
            RecordType::Start => 'S',
            RecordType::Periodic => 'P',
            RecordType::Final => 'F',
        }
    }
}

impl TryFrom<&str> for RecordType {
    type Error = RecordParseError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        match s {
            "S" => Ok(RecordType::Start),
            "P" => Ok(RecordType::Periodic),
            "F" => Ok(RecordType::Final),
            other => Err(RecordParseError::UnknownType(other.to_string())),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RecordParseError {
    #[error("expected 6 tab-separated fields, found {0}")]
    FieldCount(usize),
    #[error("unknown record type {0:?}")]
    UnknownType(String),
    #[error("invalid timestamp {0:?}")]
    Timestamp(String),
    #[error("invalid {field}: {value:?}")]
    Number { field: &'static str, value: String },
}

/// One line of the working file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub record_type: RecordType,
    pub first: Option<NaiveDateTime>,
    pub second: Option<NaiveDateTime>,
    pub duration_secs: u64,
    pub rx_bytes: u64,
    pub tx_bytes: u64,
}

impl Record {
    /// The record as written to disk: newline-terminated, capped at
    /// [`MAX_LINE_LENGTH`] bytes.
    pub fn to_line(&self) -> String {
        cap_line(self.to_string())
    }
}

/// Cut `line` on a char boundary so that it fits [`MAX_LINE_LENGTH`] once
/// the newline is appended.
fn cap_line(mut line: String) -> String {
    if line.len() >= MAX_LINE_LENGTH {
        let mut cut = MAX_LINE_LENGTH - 1;
        while !line.is_char_boundary(cut) {
            cut -= 1;
        }
        line.truncate(cut);
    }
    line.push('\n');
    line
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}\t{}\t{}\t{}\t{}\t{}",
            self.record_type.tag(),
            Timestamp(self.first),
            Timestamp(self.second),
            self.duration_secs,
            self.rx_bytes,
            self.tx_bytes
        )
    }
}

impl FromStr for Record {
    type Err = RecordParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let fields: Vec<&str> = s.trim_end_matches(['\n', '\r']).split('\t').collect();
        if fields.len() != 6 {
            return Err(RecordParseError::FieldCount(fields.len()));
        }

        Ok(Record {
            record_type: RecordType::try_from(fields[0])?,
            first: parse_timestamp(fields[1])?,
            second: parse_timestamp(fields[2])?,
            duration_secs: parse_number("duration", fields[3])?,
            rx_bytes: parse_number("rx bytes", fields[4])?,
            tx_bytes: parse_number("tx bytes", fields[5])?,
        })
    }
}

fn parse_timestamp(s: &str) -> Result<Option<NaiveDateTime>, RecordParseError> {
    if s == NO_TIMESTAMP {
        return Ok(None);
    }
    NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT)
        .map(Some)
        .map_err(|_| RecordParseError::Timestamp(s.to_string()))
}

fn parse_number(field: &'static str, value: &str) -> Result<u64, RecordParseError> {
    value.parse().map_err(|_| RecordParseError::Number {
        field,
        value: value.to_string(),
    })
}

/// Formats an optional wall-clock time, `N/A` when absent.
struct Timestamp(Option<NaiveDateTime>);

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(ts) => write!(f, "{}", ts.format(TIMESTAMP_FORMAT)),
            None => f.write_str(NO_TIMESTAMP),
        }
    }
}

// ── Summary ─────────────────────────────────────────────────────────

/// The one-line account of a finished session handed to the log sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSummary {
    pub from: Option<NaiveDateTime>,
    pub to: Option<NaiveDateTime>,
    pub duration_secs: u64,
    pub rx_bytes: u64,
    pub tx_bytes: u64,
}

impl From<&Record> for SessionSummary {
    fn from(record: &Record) -> Self {
        SessionSummary {
            from: record.first,
            to: record.second,
            duration_secs: record.duration_secs,
            rx_bytes: record.rx_bytes,
            tx_bytes: record.tx_bytes,
        }
    }
}

impl fmt::Display for SessionSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Connection stats [From: {}] [To: {}] [Duration: {}] [RX: {}] [TX: {}]",
            Timestamp(self.from),
            Timestamp(self.to),
            self.duration_secs,
            self.rx_bytes,
            self.tx_bytes
        )
    }
}

// ── Recorder ────────────────────────────────────────────────────────

enum SessionState {
    NotStarted,
    Active(ActiveSession),
}

struct ActiveSession {
    started_at: Option<DateTime<Local>>,
    started: Instant,
    /// `None` when the working file could not be opened.
    file: Option<File>,
    rx_bytes: u64,
    tx_bytes: u64,
}

impl ActiveSession {
    fn record(
        &self,
        record_type: RecordType,
        at: Option<DateTime<Local>>,
        rx_bytes: u64,
        tx_bytes: u64,
    ) -> Record {
        let duration_secs = match (self.started_at, at) {
            (Some(from), Some(to)) => (to - from).num_seconds().max(0) as u64,
            // Without both wall-clock ends, fall back to the monotonic clock.
            _ => self.started.elapsed().as_secs(),
        };

        Record {
            record_type,
            first: self.started_at.map(|ts| ts.naive_local()),
            second: at.map(|ts| ts.naive_local()),
            duration_secs,
            rx_bytes,
            tx_bytes,
        }
    }

    fn write(&mut self, record: &Record) {
        let Some(file) = self.file.as_mut() else {
            return;
        };
        let line = record.to_line();
        if let Err(e) = file.write_all(line.as_bytes()).and_then(|_| file.flush()) {
            tracing::warn!(error = %e, record = %record.record_type.tag(), "cannot write to stats file");
        }
    }
}

/// Records the statistics of one data connection at a time.
///
/// Owned by whatever drives the connection lifecycle; all calls come from
/// that single owner, in `start` → `checkpoint`* → `stop` order.
pub struct StatsRecorder {
    path: Option<PathBuf>,
    sink: Box<dyn LogSink>,
    state: SessionState,
}

impl StatsRecorder {
    /// A recorder without a working file path; call [`setup`](Self::setup)
    /// before the first session.
    pub fn new(sink: Box<dyn LogSink>) -> Self {
        Self {
            path: None,
            sink,
            state: SessionState::NotStarted,
        }
    }

    pub fn with_path(path: impl Into<PathBuf>, sink: Box<dyn LogSink>) -> Self {
        let mut recorder = Self::new(sink);
        recorder.setup(path);
        recorder
    }

    /// Configure the working file path. No file I/O happens here.
    ///
    /// # Panics
    /// If a path is already configured.
    pub fn setup(&mut self, path: impl Into<PathBuf>) {
        assert!(self.path.is_none(), "stats file path configured twice");
        let path = path.into();
        tracing::debug!(path = %path.display(), "stats file configured");
        self.path = Some(path);
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn is_active(&self) -> bool {
        matches!(self.state, SessionState::Active(_))
    }

    /// Counters of the last checkpoint, if a session is active.
    pub fn last_counters(&self) -> Option<(u64, u64)> {
        match &self.state {
            SessionState::Active(session) => Some((session.rx_bytes, session.tx_bytes)),
            SessionState::NotStarted => None,
        }
    }

    /// Open a new session: truncate the working file and write the `S` record.
    pub fn start(&mut self, system_time: Option<DateTime<Local>>) {
        if self.is_active() {
            tracing::warn!("stats session already active, discarding it and starting over");
        }

        let mut session = ActiveSession {
            started_at: system_time,
            started: Instant::now(),
            file: self.open_file(),
            rx_bytes: 0,
            tx_bytes: 0,
        };
        let record = session.record(RecordType::Start, system_time, 0, 0);
        session.write(&record);

        self.state = SessionState::Active(session);
    }

    /// Write a `P` record with the cumulative counters. Ignored when idle.
    pub fn checkpoint(&mut self, system_time: Option<DateTime<Local>>, rx_bytes: u64, tx_bytes: u64) {
        let SessionState::Active(session) = &mut self.state else {
            tracing::trace!("no active stats session, ignoring checkpoint");
            return;
        };

        let record = session.record(RecordType::Periodic, system_time, rx_bytes, tx_bytes);
        session.write(&record);
        session.rx_bytes = rx_bytes;
        session.tx_bytes = tx_bytes;
    }

    /// Close the session: write the `F` record, hand the summary to the log
    /// sink, then delete the working file.
    ///
    /// Returns `None` (and does nothing) when no session is active, so
    /// repeated stops are harmless.
    pub fn stop(
        &mut self,
        system_time: Option<DateTime<Local>>,
        rx_bytes: u64,
        tx_bytes: u64,
    ) -> Option<SessionSummary> {
        let SessionState::Active(mut session) =
            std::mem::replace(&mut self.state, SessionState::NotStarted)
        else {
            tracing::debug!("no active stats session, ignoring stop");
            return None;
        };

        let record = session.record(RecordType::Final, system_time, rx_bytes, tx_bytes);
        session.write(&record);

        let summary = SessionSummary::from(&record);
        tracing::debug!("writing stats to log sink");
        self.sink.emit(&summary);

        // Closes the file.
        drop(session);
        self.remove_file();

        Some(summary)
    }

    /// Release the working file handle and the configured path without
    /// emitting a summary. The file is left on disk for recovery.
    pub fn teardown(&mut self) {
        if self.is_active() {
            tracing::debug!("tearing down active stats session");
        }
        self.state = SessionState::NotStarted;
        self.path = None;
    }

    fn open_file(&self) -> Option<File> {
        let Some(path) = self.path.as_deref() else {
            tracing::warn!("cannot open stats file: no path configured");
            return None;
        };

        match File::create(path) {
            Ok(file) => Some(file),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "cannot open stats file");
                None
            }
        }
    }

    fn remove_file(&self) {
        let Some(path) = self.path.as_deref() else {
            return;
        };

        tracing::debug!(path = %path.display(), "removing stats file");
        match fs::remove_file(path) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "cannot remove stats file");
            }
        }
    }
}
