//! The modem operations surface.
//!
//! `ModemOperations` is the capability interface every modem backend
//! implements. The daemon's connection driver only relies on
//! `connect`, `connection_status`/`connection_stats` and `disconnect`;
//! the rest of the catalog is exposed for clients.

use thiserror::Error;

use crate::models::{
    ConnectionStats, ConnectionStatus, PowerStatus, RadioPowerInfo, RadioSignalInfo,
    RegistrationInfo, SimInfo, Target,
};

// ── Errors ──────────────────────────────────────────────────────────

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum OperationError {
    #[error("no modem available")]
    NoModem,
    #[error("invalid SIM slot {0} (expected 1 or 2)")]
    InvalidSlot(u8),
    #[error("SIM is PIN-locked")]
    SimLocked,
    #[error("incorrect PIN")]
    IncorrectPin,
    #[error("radio is powered off")]
    RadioOff,
    #[error("not registered in a network")]
    NotRegistered,
    #[error("already connected")]
    AlreadyConnected,
    #[error("not connected")]
    NotConnected,
    #[error("operation not supported: {0}")]
    Unsupported(&'static str),
    #[error("backend error: {0}")]
    Backend(String),
}

/// Lowest and highest valid SIM slot indices.
pub const SIM_SLOT_MIN: u8 = 1;
pub const SIM_SLOT_MAX: u8 = 2;

/// Validate a SIM slot index.
pub fn check_sim_slot(slot: u8) -> Result<u8, OperationError> {
    if (SIM_SLOT_MIN..=SIM_SLOT_MAX).contains(&slot) {
        Ok(slot)
    } else {
        Err(OperationError::InvalidSlot(slot))
    }
}

// ── Operations ──────────────────────────────────────────────────────

/// Control and query operations on a cellular modem.
pub trait ModemOperations: Send {
    // Identity

    fn manufacturer(&self) -> Result<String, OperationError>;
    fn model(&self) -> Result<String, OperationError>;
    fn software_revision(&self) -> Result<String, OperationError>;
    fn hardware_revision(&self) -> Result<String, OperationError>;
    fn imei(&self) -> Result<String, OperationError>;

    // SIM

    /// Slot index of the active SIM: 1 or 2. Single-SIM setups always report 1.
    fn sim_slot(&self) -> Result<u8, OperationError>;

    /// Select the SIM slot to activate. Selecting the active slot does nothing.
    fn set_sim_slot(&mut self, slot: u8) -> Result<(), OperationError>;

    fn imsi(&self) -> Result<String, OperationError>;
    fn iccid(&self) -> Result<String, OperationError>;
    fn sim_info(&self) -> Result<SimInfo, OperationError>;
    fn is_sim_locked(&self) -> Result<bool, OperationError>;

    /// Send the PIN to unlock the SIM, if needed.
    fn unlock(&mut self, pin: &str) -> Result<(), OperationError>;

    /// Enable or disable the PIN request.
    fn enable_pin(&mut self, enable: bool, pin: &str) -> Result<(), OperationError>;

    fn change_pin(&mut self, pin: &str, new_pin: &str) -> Result<(), OperationError>;

    // Power

    fn power_status(&self) -> Result<PowerStatus, OperationError>;
    fn set_power_status(&mut self, status: PowerStatus) -> Result<(), OperationError>;
    fn power_cycle(&mut self) -> Result<(), OperationError>;

    /// Radio power information, one entry per available technology.
    fn power_info(&self) -> Result<Vec<RadioPowerInfo>, OperationError>;

    /// Signal quality information, one entry per available technology.
    fn signal_info(&self) -> Result<Vec<RadioSignalInfo>, OperationError>;

    // Registration

    fn registration_status(&self) -> Result<RegistrationInfo, OperationError>;

    /// Seconds after which a registration attempt is considered timed out.
    fn registration_timeout(&self) -> Result<u32, OperationError>;
    fn set_registration_timeout(&mut self, timeout_secs: u32) -> Result<(), OperationError>;

    // Connection

    fn connection_status(&self) -> Result<ConnectionStatus, OperationError>;

    /// Cumulative counters of the current connection, `None` when not valid.
    fn connection_stats(&mut self) -> Result<Option<ConnectionStats>, OperationError>;

    /// Request an IPv4 data connection. Empty `user`/`password` mean no auth.
    fn connect(&mut self, apn: &str, user: &str, password: &str) -> Result<(), OperationError>;

    fn disconnect(&mut self) -> Result<(), OperationError>;

    /// Name of the network data port (e.g. `wwan0`).
    fn data_port(&self) -> Result<String, OperationError>;

    // Daemon

    fn is_modem_available(&self) -> bool;

    /// Direct all following operations to the given daemon instance.
    fn set_target(&mut self, target: Target) -> Result<(), OperationError>;
}
