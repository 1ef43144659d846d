//! Simulated modem backend for running the daemon without hardware.
//!
//! Answers the whole operations surface from in-memory state. While
//! connected, every stats query advances the byte and packet counters by a
//! random amount so the recorder sees realistic, growing values.

use rand::Rng;

use rmf_common::models::{
    ConnectionStats, ConnectionStatus, PlmnInfo, PowerStatus, RadioInterface, RadioPowerInfo,
    RadioSignalInfo, RegistrationInfo, RegistrationStatus, SimInfo, Target,
};
use rmf_common::operations::{ModemOperations, OperationError, check_sim_slot};

const DEFAULT_PIN: &str = "1234";
const DEFAULT_REGISTRATION_TIMEOUT_S: u32 = 120;

pub struct SimulatedModem {
    sim_slot: u8,
    pin: String,
    pin_enabled: bool,
    locked: bool,
    power: PowerStatus,
    registration_timeout_s: u32,
    status: ConnectionStatus,
    stats: ConnectionStats,
    target: Target,
}

impl Default for SimulatedModem {
    fn default() -> Self {
        Self {
            sim_slot: 1,
            pin: DEFAULT_PIN.into(),
            pin_enabled: false,
            locked: false,
            power: PowerStatus::On,
            registration_timeout_s: DEFAULT_REGISTRATION_TIMEOUT_S,
            status: ConnectionStatus::Disconnected,
            stats: ConnectionStats::default(),
            target: Target::Local,
        }
    }
}

impl SimulatedModem {
    pub fn new() -> Self {
        Self::default()
    }

    /// A modem whose SIM requires `pin` before it can connect.
    pub fn with_locked_sim(pin: &str) -> Self {
        Self {
            pin: pin.into(),
            pin_enabled: true,
            locked: true,
            ..Self::default()
        }
    }

    /// Simulate the network dropping the data connection.
    pub fn drop_connection(&mut self) {
        self.status = ConnectionStatus::Disconnected;
    }

    pub fn target(&self) -> &Target {
        &self.target
    }

    fn check_pin(&self, pin: &str) -> Result<(), OperationError> {
        if pin == self.pin {
            Ok(())
        } else {
            Err(OperationError::IncorrectPin)
        }
    }

    fn check_sim_ready(&self) -> Result<(), OperationError> {
        if self.locked {
            Err(OperationError::SimLocked)
        } else {
            Ok(())
        }
    }

    fn registration(&self) -> RegistrationStatus {
        match (self.power, self.locked) {
            (PowerStatus::On, false) => RegistrationStatus::Home,
            (PowerStatus::On, true) => RegistrationStatus::Searching,
            (PowerStatus::Low, _) => RegistrationStatus::Idle,
        }
    }
}

impl ModemOperations for SimulatedModem {
    fn manufacturer(&self) -> Result<String, OperationError> {
        Ok("rmf".into())
    }

    fn model(&self) -> Result<String, OperationError> {
        Ok("Simulated LTE Modem".into())
    }

    fn software_revision(&self) -> Result<String, OperationError> {
        Ok(env!("CARGO_PKG_VERSION").into())
    }

    fn hardware_revision(&self) -> Result<String, OperationError> {
        Ok("sim-1".into())
    }

    fn imei(&self) -> Result<String, OperationError> {
        Ok("359000000000001".into())
    }

    fn sim_slot(&self) -> Result<u8, OperationError> {
        Ok(self.sim_slot)
    }

    fn set_sim_slot(&mut self, slot: u8) -> Result<(), OperationError> {
        let slot = check_sim_slot(slot)?;
        if slot == self.sim_slot {
            return Ok(());
        }
        if self.status != ConnectionStatus::Disconnected {
            return Err(OperationError::AlreadyConnected);
        }
        self.sim_slot = slot;
        self.locked = self.pin_enabled;
        Ok(())
    }

    fn imsi(&self) -> Result<String, OperationError> {
        self.check_sim_ready()?;
        Ok(format!("21407000000000{}", self.sim_slot))
    }

    fn iccid(&self) -> Result<String, OperationError> {
        Ok(format!("893407000000000000{}", self.sim_slot))
    }

    fn sim_info(&self) -> Result<SimInfo, OperationError> {
        self.check_sim_ready()?;
        Ok(SimInfo {
            operator_mcc: 214,
            operator_mnc: 7,
            plmns: vec![PlmnInfo {
                mcc: 214,
                mnc: 7,
                gsm: true,
                umts: true,
                lte: true,
            }],
        })
    }

    fn is_sim_locked(&self) -> Result<bool, OperationError> {
        Ok(self.locked)
    }

    fn unlock(&mut self, pin: &str) -> Result<(), OperationError> {
        if !self.locked {
            return Ok(());
        }
        self.check_pin(pin)?;
        self.locked = false;
        Ok(())
    }

    fn enable_pin(&mut self, enable: bool, pin: &str) -> Result<(), OperationError> {
        self.check_sim_ready()?;
        self.check_pin(pin)?;
        self.pin_enabled = enable;
        Ok(())
    }

    fn change_pin(&mut self, pin: &str, new_pin: &str) -> Result<(), OperationError> {
        self.check_sim_ready()?;
        self.check_pin(pin)?;
        self.pin = new_pin.into();
        Ok(())
    }

    fn power_status(&self) -> Result<PowerStatus, OperationError> {
        Ok(self.power)
    }

    fn set_power_status(&mut self, status: PowerStatus) -> Result<(), OperationError> {
        if status == PowerStatus::Low {
            self.status = ConnectionStatus::Disconnected;
        }
        self.power = status;
        Ok(())
    }

    fn power_cycle(&mut self) -> Result<(), OperationError> {
        self.status = ConnectionStatus::Disconnected;
        self.power = PowerStatus::On;
        self.locked = self.pin_enabled;
        Ok(())
    }

    fn power_info(&self) -> Result<Vec<RadioPowerInfo>, OperationError> {
        if self.power == PowerStatus::Low {
            return Ok(Vec::new());
        }
        let mut rng = rand::rng();
        Ok(vec![RadioPowerInfo {
            radio_interface: RadioInterface::Lte,
            in_traffic: self.status == ConnectionStatus::Connected,
            tx_power: rng.random_range(-10.0..23.0),
            rx0_radio_tuned: true,
            rx0_power: rng.random_range(-100.0..-60.0),
            rx1_radio_tuned: true,
            rx1_power: rng.random_range(-100.0..-60.0),
        }])
    }

    fn signal_info(&self) -> Result<Vec<RadioSignalInfo>, OperationError> {
        if self.power == PowerStatus::Low {
            return Ok(Vec::new());
        }
        let mut rng = rand::rng();
        Ok(vec![RadioSignalInfo {
            radio_interface: RadioInterface::Lte,
            rssi: -65 - rng.random_range(0..20),
            quality: rng.random_range(50..100),
        }])
    }

    fn registration_status(&self) -> Result<RegistrationInfo, OperationError> {
        let status = self.registration();
        if !status.is_registered() {
            return Ok(RegistrationInfo {
                status,
                operator_description: String::new(),
                operator_mcc: 0,
                operator_mnc: 0,
                lac: 0,
                cid: 0,
            });
        }
        Ok(RegistrationInfo {
            status,
            operator_description: "Simulated Operator".into(),
            operator_mcc: 214,
            operator_mnc: 7,
            lac: 0x2b0c,
            cid: 0x01a2_b3c4,
        })
    }

    fn registration_timeout(&self) -> Result<u32, OperationError> {
        Ok(self.registration_timeout_s)
    }

    fn set_registration_timeout(&mut self, timeout_secs: u32) -> Result<(), OperationError> {
        self.registration_timeout_s = timeout_secs;
        Ok(())
    }

    fn connection_status(&self) -> Result<ConnectionStatus, OperationError> {
        Ok(self.status)
    }

    fn connection_stats(&mut self) -> Result<Option<ConnectionStats>, OperationError> {
        if self.status != ConnectionStatus::Connected {
            return Ok(None);
        }

        let mut rng = rand::rng();
        let rx_packets: u32 = rng.random_range(10..1_000);
        let tx_packets: u32 = rng.random_range(5..500);
        let s = &mut self.stats;
        s.rx_packets_ok = s.rx_packets_ok.saturating_add(rx_packets);
        s.tx_packets_ok = s.tx_packets_ok.saturating_add(tx_packets);
        s.rx_bytes_ok = s.rx_bytes_ok.saturating_add(u64::from(rx_packets) * 1_200);
        s.tx_bytes_ok = s.tx_bytes_ok.saturating_add(u64::from(tx_packets) * 400);
        Ok(Some(*s))
    }

    fn connect(&mut self, apn: &str, _user: &str, _password: &str) -> Result<(), OperationError> {
        if self.power == PowerStatus::Low {
            return Err(OperationError::RadioOff);
        }
        self.check_sim_ready()?;
        if self.status == ConnectionStatus::Connected {
            return Err(OperationError::AlreadyConnected);
        }
        if apn.is_empty() {
            return Err(OperationError::Backend("empty APN".into()));
        }
        self.stats = ConnectionStats::default();
        self.status = ConnectionStatus::Connected;
        Ok(())
    }

    fn disconnect(&mut self) -> Result<(), OperationError> {
        if self.status == ConnectionStatus::Disconnected {
            return Err(OperationError::NotConnected);
        }
        self.status = ConnectionStatus::Disconnected;
        Ok(())
    }

    fn data_port(&self) -> Result<String, OperationError> {
        Ok("wwan0".into())
    }

    fn is_modem_available(&self) -> bool {
        true
    }

    fn set_target(&mut self, target: Target) -> Result<(), OperationError> {
        self.target = target;
        Ok(())
    }
}
