//! Fujitsu T600 terminal-device driver.
//!
//! Translates abstract flow rules into OpenConfig terminal-device
//! configuration sent over NETCONF, and remembers what it provisioned since
//! the device cannot report installed rules.
//!
//! | Module              | Purpose                                              |
//! |---------------------|------------------------------------------------------|
//! | `port_name`         | component names <-> numeric port identifiers         |
//! | `classifier`        | flow rule -> line/client, ingress/egress role        |
//! | `channel`           | logical-channel create/configure/assign/delete       |
//! | `connection_cache`  | per-device record of applied connections             |
//! | `flow_programmable` | batch apply/remove/read-back                         |
//! | `discovery`         | device details and port inventory                    |
//! | `power`             | target and current optical power                     |
//! | `ber`               | pre-FEC bit error rate                               |
//! | `templates`         | request documents                                    |

pub mod ber;
pub mod channel;
pub mod classifier;
pub mod config;
pub mod connection_cache;
pub mod discovery;
pub mod error;
pub mod flow_programmable;
pub mod inventory;
pub mod port_name;
pub mod power;
pub mod templates;

pub use ber::T600BitErrorRate;
pub use channel::{ChannelProvisioningEngine, ChannelTarget, ClientChannels};
pub use classifier::{classify, connection_name, ConnectionRole, FlowRuleClassification};
pub use config::{DriverConfig, LineChannelIndex, PowerConfig, ProvisioningConfig};
pub use connection_cache::{ConnectionCache, ConnectionRecord};
pub use discovery::{DeviceDescription, TerminalDeviceDiscovery};
pub use error::{DriverError, DriverResult};
pub use flow_programmable::{FlowRuleProgrammable, T600FlowRuleProgrammable};
pub use inventory::{DeviceInventory, SessionProvider, StaticInventory, StaticSessionProvider};
pub use port_name::{ComponentKind, ComponentName};
pub use power::{Direction, PowerComponent, PowerRange, T600PowerConfig};

use odtn_types::DeviceId;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Every behaviour of one T600 device, sharing its collaborators.
pub struct T600Driver {
    device: DeviceId,
    config: DriverConfig,
    sessions: Arc<dyn SessionProvider>,
    inventory: Arc<dyn DeviceInventory>,
    cache: Arc<ConnectionCache>,
    cancel: CancellationToken,
}

impl T600Driver {
    pub fn new(
        device: DeviceId,
        config: DriverConfig,
        sessions: Arc<dyn SessionProvider>,
        inventory: Arc<dyn DeviceInventory>,
        cache: Arc<ConnectionCache>,
    ) -> Self {
        Self {
            device,
            config,
            sessions,
            inventory,
            cache,
            cancel: CancellationToken::new(),
        }
    }

    /// Shares `token` with every provisioning engine the driver creates.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn device(&self) -> &DeviceId {
        &self.device
    }

    pub fn flow_rules(&self) -> T600FlowRuleProgrammable {
        T600FlowRuleProgrammable::new(
            self.device.clone(),
            Arc::clone(&self.sessions),
            Arc::clone(&self.inventory),
            Arc::clone(&self.cache),
            self.config.provisioning.clone(),
        )
        .with_cancellation(self.cancel.clone())
    }

    pub fn discovery(&self) -> TerminalDeviceDiscovery {
        TerminalDeviceDiscovery::new(self.device.clone(), Arc::clone(&self.sessions))
    }

    pub fn power(&self) -> T600PowerConfig {
        T600PowerConfig::new(
            self.device.clone(),
            Arc::clone(&self.sessions),
            Arc::clone(&self.inventory),
            self.config.power.clone(),
        )
    }

    pub fn bit_error_rate(&self) -> T600BitErrorRate {
        T600BitErrorRate::new(
            self.device.clone(),
            Arc::clone(&self.sessions),
            self.config.provisioning.line_channel_index.clone(),
        )
    }
}
