//! Connection driver — binds the modem's data connection lifecycle to the
//! statistics recorder.
//!
//! - `connect` opens a recorder session once the modem reports success
//! - every poll tick records a checkpoint with the modem's counters
//! - `disconnect`, or the modem dropping the connection on its own, closes
//!   the session
//!
//! Modem failures are returned to the caller; recorder trouble never is.

use std::time::Duration;

use chrono::Local;
use tokio::sync::watch;

use rmf_common::models::ConnectionStatus;
use rmf_common::operations::{ModemOperations, OperationError};

use crate::stats::StatsRecorder;

/// Access point settings used for `connect`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectionSettings {
    pub apn: String,
    pub user: String,
    pub password: String,
}

pub struct ConnectionManager<M: ModemOperations> {
    modem: M,
    recorder: StatsRecorder,
    settings: ConnectionSettings,
}

impl<M: ModemOperations> ConnectionManager<M> {
    pub fn new(modem: M, recorder: StatsRecorder, settings: ConnectionSettings) -> Self {
        Self {
            modem,
            recorder,
            settings,
        }
    }

    pub fn modem(&self) -> &M {
        &self.modem
    }

    pub fn modem_mut(&mut self) -> &mut M {
        &mut self.modem
    }

    pub fn recorder(&self) -> &StatsRecorder {
        &self.recorder
    }

    /// Bring the data connection up and open a stats session.
    pub fn connect(&mut self) -> Result<(), OperationError> {
        let s = &self.settings;
        self.modem.connect(&s.apn, &s.user, &s.password)?;
        tracing::info!(apn = %s.apn, "data connection established");
        self.recorder.start(Some(Local::now()));
        Ok(())
    }

    /// Poll the modem once: checkpoint counters while connected, close the
    /// stats session if the connection went away underneath us.
    pub fn poll(&mut self) -> Result<ConnectionStatus, OperationError> {
        let status = self.modem.connection_status()?;

        match status {
            ConnectionStatus::Connected => {
                if let Some(stats) = self.modem.connection_stats()? {
                    tracing::trace!(
                        rx_bytes = stats.rx_bytes_ok,
                        tx_bytes = stats.tx_bytes_ok,
                        "connection stats"
                    );
                    self.recorder
                        .checkpoint(Some(Local::now()), stats.rx_bytes_ok, stats.tx_bytes_ok);
                }
            }
            ConnectionStatus::Disconnected => {
                if let Some((rx, tx)) = self.recorder.last_counters() {
                    tracing::warn!("data connection lost");
                    self.recorder.stop(Some(Local::now()), rx, tx);
                }
            }
            _ => {}
        }

        Ok(status)
    }

    /// Tear the data connection down and close the stats session.
    ///
    /// The session is closed even if the modem refuses the disconnect.
    pub fn disconnect(&mut self) -> Result<(), OperationError> {
        let (rx, tx) = self.final_counters();
        let result = self.modem.disconnect();

        match &result {
            Ok(()) => tracing::info!("data connection closed"),
            Err(e) => tracing::warn!(error = %e, "modem disconnect failed"),
        }
        self.recorder.stop(Some(Local::now()), rx, tx);

        result
    }

    /// Close everything and release the recorder.
    pub fn shutdown(mut self) {
        if self.recorder.is_active() {
            let _ = self.disconnect();
        }
        self.recorder.teardown();
    }

    /// Poll every `interval` until `shutdown` flips to `true`.
    pub async fn run(mut self, interval: Duration, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if let Err(e) = self.poll() {
                        tracing::warn!(error = %e, "connection status poll failed");
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        tracing::info!("connection driver stopping");
        self.shutdown();
    }

    /// Latest counters: fresh from the modem if it can tell, otherwise the
    /// last checkpoint.
    fn final_counters(&mut self) -> (u64, u64) {
        match self.modem.connection_stats() {
            Ok(Some(stats)) => (stats.rx_bytes_ok, stats.tx_bytes_ok),
            Ok(None) | Err(_) => self.recorder.last_counters().unwrap_or((0, 0)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulated::SimulatedModem;
    use crate::stats::{Record, RecordType};
    use crate::syslog::MemorySink;
    use std::path::Path;

    fn settings() -> ConnectionSettings {
        ConnectionSettings {
            apn: "internet".into(),
            ..Default::default()
        }
    }

    fn manager(path: &Path, sink: &MemorySink) -> ConnectionManager<SimulatedModem> {
        let recorder = StatsRecorder::with_path(path, Box::new(sink.clone()));
        ConnectionManager::new(SimulatedModem::new(), recorder, settings())
    }

    fn record_types(path: &Path) -> Vec<RecordType> {
        std::fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(|l| l.parse::<Record>().unwrap().record_type)
            .collect()
    }

    #[test]
    fn connect_poll_disconnect_drives_recorder() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stats");
        let sink = MemorySink::default();
        let mut mgr = manager(&path, &sink);

        mgr.connect().unwrap();
        assert!(mgr.recorder().is_active());

        assert_eq!(mgr.poll().unwrap(), ConnectionStatus::Connected);
        assert_eq!(mgr.poll().unwrap(), ConnectionStatus::Connected);
        assert_eq!(
            record_types(&path),
            vec![RecordType::Start, RecordType::Periodic, RecordType::Periodic]
        );
        let (rx, _) = mgr.recorder().last_counters().unwrap();
        assert!(rx > 0);

        mgr.disconnect().unwrap();
        assert!(!mgr.recorder().is_active());
        assert!(!path.exists());

        let lines = sink.lines();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].starts_with("Connection stats [From: "));
    }

    #[test]
    fn failed_connect_opens_no_session() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stats");
        let sink = MemorySink::default();
        let recorder = StatsRecorder::with_path(&path, Box::new(sink.clone()));
        let mut mgr = ConnectionManager::new(
            SimulatedModem::with_locked_sim("0000"),
            recorder,
            settings(),
        );

        assert_eq!(mgr.connect(), Err(OperationError::SimLocked));
        assert!(!mgr.recorder().is_active());
        assert!(!path.exists());
    }

    #[test]
    fn dropped_connection_closes_session_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stats");
        let sink = MemorySink::default();
        let mut mgr = manager(&path, &sink);

        mgr.connect().unwrap();
        mgr.poll().unwrap();
        let counters = mgr.recorder().last_counters().unwrap();

        mgr.modem_mut().drop_connection();
        assert_eq!(mgr.poll().unwrap(), ConnectionStatus::Disconnected);
        assert_eq!(mgr.poll().unwrap(), ConnectionStatus::Disconnected);

        let lines = sink.lines();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].ends_with(&format!("[RX: {}] [TX: {}]", counters.0, counters.1)));
        assert!(!path.exists());

        // Late disconnect: the modem refuses, the recorder stays quiet.
        assert_eq!(mgr.disconnect(), Err(OperationError::NotConnected));
        assert_eq!(sink.lines().len(), 1);
    }

    #[test]
    fn shutdown_closes_active_session() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stats");
        let sink = MemorySink::default();
        let mut mgr = manager(&path, &sink);

        mgr.connect().unwrap();
        mgr.shutdown();

        assert_eq!(sink.lines().len(), 1);
        assert!(!path.exists());
    }

    #[tokio::test(start_paused = true)]
    async fn run_polls_until_shutdown() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stats");
        let sink = MemorySink::default();
        let mut mgr = manager(&path, &sink);
        mgr.connect().unwrap();

        let (tx, rx) = watch::channel(false);
        let handle = tokio::spawn(mgr.run(Duration::from_secs(60), rx));

        tokio::time::sleep(Duration::from_secs(150)).await;
        let periodic = record_types(&path)
            .into_iter()
            .filter(|t| *t == RecordType::Periodic)
            .count();
        assert!(periodic >= 2);

        tx.send(true).unwrap();
        handle.await.unwrap();

        assert_eq!(sink.lines().len(), 1);
        assert!(!path.exists());
    }
}
