//! Data models for the modem operations surface.
//!
//! These types are returned by `ModemOperations` backends and consumed by
//! the daemon (connection driver, statistics recorder) and by clients.

use serde::{Deserialize, Serialize};

// ── Power ───────────────────────────────────────────────────────────

/// Radio power status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PowerStatus {
    /// Full functionality.
    On,
    /// Low power mode, radio off.
    Low,
}

impl std::fmt::Display for PowerStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PowerStatus::On => write!(f, "on"),
            PowerStatus::Low => write!(f, "low"),
        }
    }
}

impl std::str::FromStr for PowerStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "on" => Ok(PowerStatus::On),
            "low" => Ok(PowerStatus::Low),
            other => Err(format!("unknown power status: {other}")),
        }
    }
}

/// Radio access technology.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RadioInterface {
    Gsm,
    Umts,
    Lte,
}

impl std::fmt::Display for RadioInterface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RadioInterface::Gsm => write!(f, "GSM"),
            RadioInterface::Umts => write!(f, "UMTS"),
            RadioInterface::Lte => write!(f, "LTE"),
        }
    }
}

/// Per-technology radio power information.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RadioPowerInfo {
    pub radio_interface: RadioInterface,
    pub in_traffic: bool,
    /// Transmit power in dBm.
    pub tx_power: f64,
    pub rx0_radio_tuned: bool,
    /// Receive power on the primary chain in dBm.
    pub rx0_power: f64,
    pub rx1_radio_tuned: bool,
    /// Receive power on the diversity chain in dBm.
    pub rx1_power: f64,
}

/// Per-technology signal quality information.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RadioSignalInfo {
    pub radio_interface: RadioInterface,
    /// Received signal strength in dBm.
    pub rssi: i32,
    /// Signal quality in percent (0–100).
    pub quality: u32,
}

// ── SIM ─────────────────────────────────────────────────────────────

/// A PLMN entry configured by the operator in the SIM.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlmnInfo {
    pub mcc: u16,
    pub mnc: u16,
    pub gsm: bool,
    pub umts: bool,
    pub lte: bool,
}

/// Additional info read from the active SIM.
///
/// `operator_mcc`/`operator_mnc` are 0 when unknown.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimInfo {
    pub operator_mcc: u16,
    pub operator_mnc: u16,
    pub plmns: Vec<PlmnInfo>,
}

// ── Registration ────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegistrationStatus {
    Idle,
    Searching,
    Home,
    Roaming,
}

impl RegistrationStatus {
    /// Whether the modem is registered in a network (home or roaming).
    pub fn is_registered(self) -> bool {
        matches!(self, RegistrationStatus::Home | RegistrationStatus::Roaming)
    }
}

impl std::fmt::Display for RegistrationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RegistrationStatus::Idle => write!(f, "idle"),
            RegistrationStatus::Searching => write!(f, "searching"),
            RegistrationStatus::Home => write!(f, "home"),
            RegistrationStatus::Roaming => write!(f, "roaming"),
        }
    }
}

/// Network registration (serving system) info.
///
/// Numeric fields are 0 and the description is empty when unknown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationInfo {
    pub status: RegistrationStatus,
    pub operator_description: String,
    pub operator_mcc: u16,
    pub operator_mnc: u16,
    pub lac: u16,
    pub cid: u32,
}

// ── Connection ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionStatus {
    Disconnected,
    Disconnecting,
    Connecting,
    Authenticating,
    Connected,
}

impl std::fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConnectionStatus::Disconnected => write!(f, "disconnected"),
            ConnectionStatus::Disconnecting => write!(f, "disconnecting"),
            ConnectionStatus::Connecting => write!(f, "connecting"),
            ConnectionStatus::Authenticating => write!(f, "authenticating"),
            ConnectionStatus::Connected => write!(f, "connected"),
        }
    }
}

/// Cumulative packet and byte counters of the current data connection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionStats {
    pub tx_packets_ok: u32,
    pub rx_packets_ok: u32,
    pub tx_packets_error: u32,
    pub rx_packets_error: u32,
    pub tx_packets_overflow: u32,
    pub rx_packets_overflow: u32,
    pub tx_bytes_ok: u64,
    pub rx_bytes_ok: u64,
}

// ── Target ──────────────────────────────────────────────────────────

/// Which daemon instance operations are sent to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Target {
    /// The daemon listening on the local unix socket.
    #[default]
    Local,
    /// A daemon listening on a remote TCP address.
    Remote { address: String, port: u16 },
}

impl std::fmt::Display for Target {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Target::Local => write!(f, "local"),
            Target::Remote { address, port } => write!(f, "{address}:{port}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn power_status_display_round_trips() {
        for status in [PowerStatus::On, PowerStatus::Low] {
            let parsed: PowerStatus = status.to_string().parse().unwrap();
            assert_eq!(parsed, status);
        }
        assert!("off".parse::<PowerStatus>().is_err());
    }

    #[test]
    fn registered_only_when_home_or_roaming() {
        assert!(RegistrationStatus::Home.is_registered());
        assert!(RegistrationStatus::Roaming.is_registered());
        assert!(!RegistrationStatus::Idle.is_registered());
        assert!(!RegistrationStatus::Searching.is_registered());
    }

    #[test]
    fn target_serializes_with_kind_tag() {
        let remote = Target::Remote {
            address: "192.168.1.10".into(),
            port: 3333,
        };
        let json = serde_json::to_value(&remote).unwrap();
        assert_eq!(json["kind"], "remote");
        assert_eq!(json["port"], 3333);
        assert_eq!(remote.to_string(), "192.168.1.10:3333");
        assert_eq!(Target::default(), Target::Local);
    }

    #[test]
    fn connection_status_uses_snake_case() {
        let json = serde_json::to_string(&ConnectionStatus::Authenticating).unwrap();
        assert_eq!(json, "\"authenticating\"");
    }
}
