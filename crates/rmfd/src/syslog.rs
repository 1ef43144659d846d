//! Log sinks for finished-session summaries.
//!
//! The summary line is accounting data, not diagnostics: it goes to a
//! dedicated sink (the system log in production) independently of the
//! `tracing` subscriber configuration.

use std::ffi::CString;
use std::sync::{Arc, Mutex};

use serde::Deserialize;

use crate::stats::SessionSummary;

/// Destination for one line per completed session.
pub trait LogSink: Send {
    fn emit(&mut self, summary: &SessionSummary);
}

/// Which sink the daemon writes summaries to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum SinkKind {
    /// System log, `LOG_DAEMON` facility.
    #[default]
    Syslog,
    /// The daemon's own `tracing` output.
    Tracing,
}

impl SinkKind {
    pub fn build(self) -> Box<dyn LogSink> {
        match self {
            SinkKind::Syslog => Box::new(SyslogSink::open("rmfd")),
            SinkKind::Tracing => Box::new(TracingSink),
        }
    }
}

// ── syslog(3) ───────────────────────────────────────────────────────

/// Writes summaries to the system log at `LOG_INFO`.
pub struct SyslogSink {
    // openlog() keeps the pointer, so the ident must outlive the sink.
    _ident: CString,
}

impl SyslogSink {
    pub fn open(ident: &str) -> Self {
        let ident = CString::new(ident).unwrap_or_else(|_| c"rmfd".to_owned());
        // SAFETY: `ident` is a valid NUL-terminated string kept alive in `self`.
        unsafe {
            libc::openlog(ident.as_ptr(), libc::LOG_PID | libc::LOG_NDELAY, libc::LOG_DAEMON);
        }
        Self { _ident: ident }
    }
}

impl LogSink for SyslogSink {
    fn emit(&mut self, summary: &SessionSummary) {
        let message = match CString::new(summary.to_string()) {
            Ok(m) => m,
            Err(e) => {
                tracing::warn!(error = %e, "cannot write stats to syslog");
                return;
            }
        };
        // SAFETY: both pointers are valid NUL-terminated strings; the
        // message goes through "%s" so it is never read as a format.
        unsafe {
            libc::syslog(libc::LOG_INFO, c"%s".as_ptr(), message.as_ptr());
        }
    }
}

impl Drop for SyslogSink {
    fn drop(&mut self) {
        // SAFETY: closelog() has no preconditions.
        unsafe { libc::closelog() };
    }
}

// ── tracing ─────────────────────────────────────────────────────────

/// Emits summaries through `tracing` under the `rmfd::syslog` target.
pub struct TracingSink;

impl LogSink for TracingSink {
    fn emit(&mut self, summary: &SessionSummary) {
        tracing::info!(target: "rmfd::syslog", "{summary}");
    }
}

// ── In-memory ───────────────────────────────────────────────────────

/// Keeps emitted lines in a shared buffer. Clones share the buffer.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    lines: Arc<Mutex<Vec<String>>>,
}

impl MemorySink {
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().map(|l| l.clone()).unwrap_or_default()
    }
}

impl LogSink for MemorySink {
    fn emit(&mut self, summary: &SessionSummary) {
        if let Ok(mut lines) = self.lines.lock() {
            lines.push(summary.to_string());
        }
    }
}
