//! Point-in-time snapshot of everything the operations surface can report.

use serde::Serialize;

use rmf_common::models::{
    ConnectionStats, ConnectionStatus, PowerStatus, RadioPowerInfo, RadioSignalInfo,
    RegistrationInfo, SimInfo,
};
use rmf_common::operations::{ModemOperations, OperationError};

#[derive(Debug, Clone, Serialize)]
pub struct ModemSnapshot {
    pub manufacturer: String,
    pub model: String,
    pub software_revision: String,
    pub hardware_revision: String,
    pub imei: String,
    pub data_port: String,
    pub sim: SimSnapshot,
    pub power_status: PowerStatus,
    pub power_info: Vec<RadioPowerInfo>,
    pub signal_info: Vec<RadioSignalInfo>,
    pub registration: RegistrationInfo,
    pub registration_timeout_s: u32,
    pub connection_status: ConnectionStatus,
    pub connection_stats: Option<ConnectionStats>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SimSnapshot {
    pub slot: u8,
    pub locked: bool,
    pub iccid: String,
    /// Unavailable while the SIM is locked.
    pub imsi: Option<String>,
    pub info: Option<SimInfo>,
}

impl ModemSnapshot {
    pub fn collect<M: ModemOperations>(modem: &mut M) -> Result<Self, OperationError> {
        if !modem.is_modem_available() {
            return Err(OperationError::NoModem);
        }

        let locked = modem.is_sim_locked()?;
        let sim = SimSnapshot {
            slot: modem.sim_slot()?,
            locked,
            iccid: modem.iccid()?,
            imsi: if locked { None } else { Some(modem.imsi()?) },
            info: if locked { None } else { Some(modem.sim_info()?) },
        };

        Ok(ModemSnapshot {
            manufacturer: modem.manufacturer()?,
            model: modem.model()?,
            software_revision: modem.software_revision()?,
            hardware_revision: modem.hardware_revision()?,
            imei: modem.imei()?,
            data_port: modem.data_port()?,
            sim,
            power_status: modem.power_status()?,
            power_info: modem.power_info()?,
            signal_info: modem.signal_info()?,
            registration: modem.registration_status()?,
            registration_timeout_s: modem.registration_timeout()?,
            connection_status: modem.connection_status()?,
            connection_stats: modem.connection_stats()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulated::SimulatedModem;

    #[test]
    fn snapshot_of_idle_modem() {
        let mut modem = SimulatedModem::new();
        let snapshot = ModemSnapshot::collect(&mut modem).unwrap();

        assert_eq!(snapshot.sim.slot, 1);
        assert!(snapshot.sim.imsi.is_some());
        assert_eq!(snapshot.connection_status, ConnectionStatus::Disconnected);
        assert!(snapshot.connection_stats.is_none());

        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["power_status"], "on");
        assert_eq!(json["data_port"], "wwan0");
    }

    #[test]
    fn locked_sim_hides_imsi() {
        let mut modem = SimulatedModem::with_locked_sim("1111");
        let snapshot = ModemSnapshot::collect(&mut modem).unwrap();
        assert!(snapshot.sim.locked);
        assert!(snapshot.sim.imsi.is_none());
        assert!(snapshot.sim.info.is_none());
    }
}
