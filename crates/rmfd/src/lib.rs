//! rmfd internals: the connection statistics recorder and the pieces the
//! daemon wires around it.
//!
//! - **stats** — crash-safe per-connection statistics recorder
//! - **syslog** — log sinks receiving one summary line per session
//! - **recovery** — summary of a session interrupted by a crash
//! - **connection** — binds modem connect/poll/disconnect to the recorder
//! - **simulated** — in-memory modem backend
//! - **status** — JSON-serializable modem state snapshot
//! - **config** — TOML daemon configuration

pub mod config;
pub mod connection;
pub mod recovery;
pub mod simulated;
pub mod stats;
pub mod status;
pub mod syslog;
