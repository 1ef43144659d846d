//! rmfd — modem management daemon
//!
//! - Drives the modem's data connection through the operations surface
//! - Records per-connection statistics in a crash-safe working file
//! - Sends a one-line summary of each finished connection to syslog
//! - Recovers the summary of a session interrupted by a previous crash
//! - In `--simulate` mode, runs against an in-memory modem

use std::path::PathBuf;

use clap::Parser;
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;

use rmfd::config::DaemonConfig;
use rmfd::connection::{ConnectionManager, ConnectionSettings};
use rmfd::simulated::SimulatedModem;
use rmfd::stats::StatsRecorder;
use rmfd::syslog::SinkKind;
use rmfd::{recovery, status};

/// rmf modem management daemon.
#[derive(Parser, Debug)]
#[command(name = "rmfd", about = "rmf modem management daemon")]
struct Cli {
    /// TOML configuration file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Connection statistics working file.
    #[arg(long)]
    stats_file: Option<PathBuf>,

    /// Connection status polling interval in seconds.
    #[arg(long)]
    poll_interval: Option<u64>,

    /// Where connection summaries are written.
    #[arg(long, value_enum)]
    log_sink: Option<SinkKind>,

    /// Run against a simulated modem.
    #[arg(long, default_value_t = false)]
    simulate: bool,

    /// Access point to connect to at startup.
    #[arg(long)]
    apn: Option<String>,

    /// Access point user name.
    #[arg(long, default_value = "")]
    user: String,

    /// Access point password.
    #[arg(long, default_value = "")]
    password: String,

    /// Print a JSON snapshot of the modem state and exit.
    #[arg(long, default_value_t = false)]
    status: bool,
}

impl Cli {
    /// File values first, command-line values on top.
    fn into_config(self) -> anyhow::Result<(DaemonConfig, bool)> {
        let mut config = match &self.config {
            Some(path) => DaemonConfig::from_file(path)?,
            None => DaemonConfig::default(),
        };

        if let Some(path) = self.stats_file {
            config.stats_file = path;
        }
        if let Some(secs) = self.poll_interval {
            config.poll_interval = std::time::Duration::from_secs(secs.max(1));
        }
        if let Some(sink) = self.log_sink {
            config.log_sink = sink;
        }
        config.simulate |= self.simulate;
        if let Some(apn) = self.apn {
            config.connection = Some(ConnectionSettings {
                apn,
                user: self.user,
                password: self.password,
            });
        }

        Ok((config, self.status))
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let (config, status_only) = Cli::parse().into_config()?;

    if !config.simulate {
        anyhow::bail!("no hardware modem backend available; run with --simulate");
    }
    let mut modem = SimulatedModem::new();

    if status_only {
        let snapshot = status::ModemSnapshot::collect(&mut modem)?;
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
        return Ok(());
    }

    tracing::info!(
        stats_file = %config.stats_file.display(),
        poll_interval_s = config.poll_interval.as_secs(),
        log_sink = ?config.log_sink,
        simulate = config.simulate,
        "rmfd starting"
    );

    let mut sink = config.log_sink.build();
    if let Err(e) = recovery::recover_stale_session(&config.stats_file, sink.as_mut()) {
        tracing::warn!(error = %e, "stale stats file recovery failed");
    }

    let recorder = StatsRecorder::with_path(&config.stats_file, sink);
    let mut manager =
        ConnectionManager::new(modem, recorder, config.connection.clone().unwrap_or_default());

    if config.connection.is_some() {
        if let Err(e) = manager.connect() {
            tracing::error!(error = %e, "initial connection failed");
        }
    }

    // ── Shutdown handling ───────────────────────────────────────
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let driver = tokio::spawn(manager.run(config.poll_interval, shutdown_rx));

    tokio::signal::ctrl_c().await?;
    tracing::info!("received SIGINT, shutting down");
    let _ = shutdown_tx.send(true);

    if let Err(e) = driver.await {
        tracing::error!("connection driver failed: {e}");
    }

    tracing::info!("rmfd stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_overrides_defaults() {
        let cli = Cli::try_parse_from([
            "rmfd",
            "--simulate",
            "--stats-file",
            "/tmp/rmfd-stats",
            "--poll-interval",
            "0",
            "--log-sink",
            "tracing",
            "--apn",
            "internet",
            "--user",
            "u",
        ])
        .unwrap();

        let (config, status_only) = cli.into_config().unwrap();
        assert!(!status_only);
        assert!(config.simulate);
        assert_eq!(config.stats_file, PathBuf::from("/tmp/rmfd-stats"));
        assert_eq!(config.poll_interval.as_secs(), 1);
        assert_eq!(config.log_sink, SinkKind::Tracing);
        let conn = config.connection.unwrap();
        assert_eq!(conn.apn, "internet");
        assert_eq!(conn.user, "u");
        assert_eq!(conn.password, "");
    }

    #[test]
    fn cli_layers_over_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rmfd.toml");
        std::fs::write(
            &path,
            "stats_file = \"/var/tmp/stats\"\npoll_interval_secs = 30\n",
        )
        .unwrap();

        let cli = Cli::try_parse_from([
            "rmfd",
            "--config",
            path.to_str().unwrap(),
            "--poll-interval",
            "5",
            "--status",
        ])
        .unwrap();

        let (config, status_only) = cli.into_config().unwrap();
        assert!(status_only);
        assert_eq!(config.stats_file, PathBuf::from("/var/tmp/stats"));
        assert_eq!(config.poll_interval.as_secs(), 5);
        assert!(config.connection.is_none());
    }
}
