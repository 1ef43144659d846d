use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::connection::ConnectionSettings;
use crate::syslog::SinkKind;

pub const DEFAULT_STATS_FILE: &str = "/var/lib/rmfd/stats.tmp";
pub const DEFAULT_POLL_INTERVAL_S: u64 = 60;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config TOML: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("{0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DaemonConfigInput {
    pub stats_file: Option<PathBuf>,
    pub poll_interval_secs: Option<u64>,
    pub log_sink: Option<SinkKind>,
    pub simulate: bool,
    pub connection: Option<ConnectionConfigInput>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ConnectionConfigInput {
    pub apn: String,
    pub user: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct DaemonConfig {
    pub stats_file: PathBuf,
    pub poll_interval: Duration,
    pub log_sink: SinkKind,
    pub simulate: bool,
    /// When set, the daemon brings the data connection up at startup.
    pub connection: Option<ConnectionSettings>,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            stats_file: PathBuf::from(DEFAULT_STATS_FILE),
            poll_interval: Duration::from_secs(DEFAULT_POLL_INTERVAL_S),
            log_sink: SinkKind::default(),
            simulate: false,
            connection: None,
        }
    }
}

impl DaemonConfigInput {
    pub fn resolve(self) -> Result<DaemonConfig, ConfigError> {
        let stats_file = match self.stats_file {
            Some(p) if p.as_os_str().is_empty() => {
                return Err(ConfigError::Invalid("stats_file must not be empty".into()));
            }
            Some(p) => p,
            None => PathBuf::from(DEFAULT_STATS_FILE),
        };

        let poll_interval = Duration::from_secs(
            self.poll_interval_secs
                .unwrap_or(DEFAULT_POLL_INTERVAL_S)
                .max(1),
        );

        let connection = match self.connection {
            Some(c) => {
                let apn = c.apn.trim().to_string();
                if apn.is_empty() {
                    return Err(ConfigError::Invalid("connection.apn must not be empty".into()));
                }
                Some(ConnectionSettings {
                    apn,
                    user: c.user,
                    password: c.password,
                })
            }
            None => None,
        };

        Ok(DaemonConfig {
            stats_file,
            poll_interval,
            log_sink: self.log_sink.unwrap_or_default(),
            simulate: self.simulate,
            connection,
        })
    }
}

impl DaemonConfig {
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        if input.trim().is_empty() {
            return Ok(DaemonConfig::default());
        }
        let parsed: DaemonConfigInput = toml::from_str(input)?;
        parsed.resolve()
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let input = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_toml_config_basic() {
        let toml = r#"
            stats_file = "/run/rmfd/stats"
            poll_interval_secs = 15
            log_sink = "tracing"
            simulate = true

            [connection]
            apn = " internet "
            user = "user"
            password = "secret"
        "#;

        let cfg = DaemonConfig::from_toml_str(toml).unwrap();
        assert_eq!(cfg.stats_file, PathBuf::from("/run/rmfd/stats"));
        assert_eq!(cfg.poll_interval, Duration::from_secs(15));
        assert_eq!(cfg.log_sink, SinkKind::Tracing);
        assert!(cfg.simulate);
        let conn = cfg.connection.unwrap();
        assert_eq!(conn.apn, "internet");
        assert_eq!(conn.user, "user");
        assert_eq!(conn.password, "secret");
    }

    #[test]
    fn empty_input_yields_defaults() {
        let cfg = DaemonConfig::from_toml_str("  \n").unwrap();
        assert_eq!(cfg.stats_file, PathBuf::from(DEFAULT_STATS_FILE));
        assert_eq!(cfg.poll_interval, Duration::from_secs(DEFAULT_POLL_INTERVAL_S));
        assert_eq!(cfg.log_sink, SinkKind::Syslog);
        assert!(!cfg.simulate);
        assert!(cfg.connection.is_none());
    }

    #[test]
    fn zero_interval_is_clamped() {
        let cfg = DaemonConfig::from_toml_str("poll_interval_secs = 0").unwrap();
        assert_eq!(cfg.poll_interval, Duration::from_secs(1));
    }

    #[test]
    fn rejects_bad_values() {
        assert!(matches!(
            DaemonConfig::from_toml_str("log_sink = \"stdout\""),
            Err(ConfigError::Toml(_))
        ));
        assert!(matches!(
            DaemonConfig::from_toml_str("[connection]\napn = \"\""),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            DaemonConfig::from_toml_str("stats_file = \"\""),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            DaemonConfig::from_toml_str("poll_interval_secs = \"soon\""),
            Err(ConfigError::Toml(_))
        ));
    }

    #[test]
    fn missing_file_reports_path() {
        let err = DaemonConfig::from_file(Path::new("/nonexistent/rmfd.toml")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/rmfd.toml"));
    }
}
