//! Configuration file support for the T600 driver.
//!
//! Loads and validates driver configuration from TOML files.
//! Default location: /etc/odtn/t600.toml
//!
//! ```toml
//! [device]
//! id = "netconf:10.0.0.10:830"
//! host = "10.0.0.10"
//! username = "admin"
//! password = "admin"
//!
//! [provisioning]
//! settle_delay_ms = 1000
//!
//! [provisioning.line_channel_index]
//! "otsi-1/1/0/E1" = 10
//! "otsi-1/1/0/E2" = 20
//! ```

use crate::error::{DriverError, DriverResult};
use odtn_types::DeviceId;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::Path;
use std::time::Duration;
use tracing::warn;

pub const DEFAULT_CONFIG_PATH: &str = "/etc/odtn/t600.toml";

/// Device connection parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceConfig {
    /// Device identifier used for inventory and cache keys
    #[serde(default = "default_device_id")]
    pub id: String,

    /// Management address
    #[serde(default = "default_host")]
    pub host: String,

    /// NETCONF port
    #[serde(default = "default_netconf_port")]
    pub port: u16,

    #[serde(default = "default_username")]
    pub username: String,

    #[serde(default)]
    pub password: String,

    /// RPC timeout in seconds
    #[serde(default = "default_rpc_timeout")]
    pub rpc_timeout_secs: u64,
}

/// Channel provisioning parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvisioningConfig {
    /// Wait between creating a logical channel and configuring it
    #[serde(default = "default_settle_delay")]
    pub settle_delay_ms: u64,

    /// Target output power written with every frequency change, in dBm
    #[serde(default = "default_target_power")]
    pub default_target_power: f64,

    /// Logical-channel index assigned when a line channel is created
    #[serde(default)]
    pub line_channel_index: LineChannelIndex,
}

/// Power limits reported by power configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PowerConfig {
    #[serde(default = "default_target_power_min")]
    pub target_power_min: f64,

    #[serde(default = "default_target_power_max")]
    pub target_power_max: f64,

    #[serde(default = "default_input_power_min")]
    pub input_power_min: f64,

    #[serde(default = "default_input_power_max")]
    pub input_power_max: f64,
}

/// Complete driver configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DriverConfig {
    #[serde(default)]
    pub device: DeviceConfig,

    #[serde(default)]
    pub provisioning: ProvisioningConfig,

    #[serde(default)]
    pub power: PowerConfig,
}

/// Line optical-channel component name to logical-channel index.
///
/// Indices are fixed per line port on this device family; names outside the
/// table cannot be provisioned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LineChannelIndex(BTreeMap<String, u64>);

impl LineChannelIndex {
    pub fn new(entries: impl IntoIterator<Item = (String, u64)>) -> Self {
        Self(entries.into_iter().collect())
    }

    /// Index for a line optical-channel component.
    pub fn lookup(&self, optical_channel: &str) -> DriverResult<u64> {
        self.0.get(optical_channel).copied().ok_or_else(|| {
            DriverError::format(optical_channel, "no logical-channel index for line port")
        })
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

impl Default for LineChannelIndex {
    fn default() -> Self {
        Self::new([
            ("otsi-1/1/0/E1".to_string(), 10),
            ("otsi-1/1/0/E2".to_string(), 20),
            ("otsi-1/2/0/E1".to_string(), 30),
            ("otsi-1/2/0/E2".to_string(), 40),
        ])
    }
}

// Default functions
fn default_device_id() -> String {
    "netconf:127.0.0.1:830".to_string()
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_netconf_port() -> u16 {
    830
}

fn default_username() -> String {
    "admin".to_string()
}

fn default_rpc_timeout() -> u64 {
    30
}

fn default_settle_delay() -> u64 {
    1000
}

fn default_target_power() -> f64 {
    0.0
}

fn default_target_power_min() -> f64 {
    -5.0
}

fn default_target_power_max() -> f64 {
    1.0
}

fn default_input_power_min() -> f64 {
    -30.0
}

fn default_input_power_max() -> f64 {
    1.0
}

// Default implementations
impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            id: default_device_id(),
            host: default_host(),
            port: default_netconf_port(),
            username: default_username(),
            password: String::new(),
            rpc_timeout_secs: default_rpc_timeout(),
        }
    }
}

impl Default for ProvisioningConfig {
    fn default() -> Self {
        Self {
            settle_delay_ms: default_settle_delay(),
            default_target_power: default_target_power(),
            line_channel_index: LineChannelIndex::default(),
        }
    }
}

impl Default for PowerConfig {
    fn default() -> Self {
        Self {
            target_power_min: default_target_power_min(),
            target_power_max: default_target_power_max(),
            input_power_min: default_input_power_min(),
            input_power_max: default_input_power_max(),
        }
    }
}

impl ProvisioningConfig {
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }
}

impl DriverConfig {
    /// Load configuration from file, falling back to defaults if file not found
    pub fn load_or_default(path: impl AsRef<Path>) -> DriverResult<Self> {
        let path = path.as_ref();

        match fs::read_to_string(path) {
            Ok(content) => Self::from_toml(&content).map_err(|e| match e {
                DriverError::Config { message, .. } => {
                    DriverError::config(path.display().to_string(), message)
                }
                other => other,
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!(path = %path.display(), "config file not found, using defaults");
                Ok(Self::default())
            }
            Err(e) => Err(DriverError::Io(e)),
        }
    }

    /// Load from default location or defaults
    pub fn load() -> DriverResult<Self> {
        Self::load_or_default(DEFAULT_CONFIG_PATH)
    }

    pub fn from_toml(content: &str) -> DriverResult<Self> {
        toml::from_str(content).map_err(|e| DriverError::config("toml", e.to_string()))
    }

    /// Save configuration to file
    pub fn save(&self, path: impl AsRef<Path>) -> DriverResult<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| DriverError::config("toml", format!("failed to serialize: {}", e)))?;
        fs::write(path, content)?;
        Ok(())
    }

    pub fn device_id(&self) -> DriverResult<DeviceId> {
        DeviceId::new(self.device.id.clone())
            .map_err(|e| DriverError::config("device.id", e.to_string()))
    }

    pub fn rpc_timeout(&self) -> Duration {
        Duration::from_secs(self.device.rpc_timeout_secs)
    }

    /// Validate configuration
    pub fn validate(&self) -> DriverResult<()> {
        if self.device.port == 0 {
            return Err(DriverError::config("device.port", "must be > 0"));
        }

        if self.device.host.is_empty() {
            return Err(DriverError::config("device.host", "must not be empty"));
        }

        self.device_id()?;

        let table = &self.provisioning.line_channel_index;
        if table.is_empty() {
            return Err(DriverError::config(
                "provisioning.line_channel_index",
                "must contain at least one line port",
            ));
        }

        let mut seen = HashSet::new();
        for (name, index) in table.iter() {
            if !seen.insert(index) {
                return Err(DriverError::config(
                    "provisioning.line_channel_index",
                    format!("index {} assigned to more than one port ({})", index, name),
                ));
            }
        }

        let power = &self.power;
        if power.target_power_min >= power.target_power_max {
            return Err(DriverError::config(
                "power.target_power",
                "min must be below max",
            ));
        }

        if power.input_power_min >= power.input_power_max {
            return Err(DriverError::config("power.input_power", "min must be below max"));
        }

        let target = self.provisioning.default_target_power;
        if target < power.target_power_min || target > power.target_power_max {
            return Err(DriverError::config(
                "provisioning.default_target_power",
                format!(
                    "{} outside [{}, {}]",
                    target, power.target_power_min, power.target_power_max
                ),
            ));
        }

        Ok(())
    }
}
