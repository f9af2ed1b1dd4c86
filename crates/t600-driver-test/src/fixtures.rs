//! Test fixtures for T600 driver scenarios
//!
//! Provides the ports of a two-slot T600, flow rules between them and a
//! driver wired to a [`RecordingSession`](crate::RecordingSession).

use crate::session::RecordingSession;
use odtn_types::{
    annotations, ChannelSpacing, DeviceId, FlowRule, OchSignal, OdtnPortType, OduSignalType, Port,
    PortNumber,
};
use std::sync::Arc;
use t600_driver::{
    ConnectionCache, DriverConfig, ProvisioningConfig, StaticInventory, StaticSessionProvider,
    T600Driver,
};

/// Identifier of the device every fixture belongs to
pub const DEVICE_ID: &str = "netconf:10.0.0.10:830";

pub fn device() -> DeviceId {
    DeviceId::new(DEVICE_ID).expect("valid device id")
}

/// Common port fixtures
pub mod port_fixtures {
    use super::*;

    /// Line port 11001, `otsi-1/1/0/E1`
    pub const LINE_1: u64 = 11001;
    /// Line port 12002, `otsi-1/2/0/E2`
    pub const LINE_2: u64 = 12002;
    /// Client port 1101, `transceiver-1/1/0/C1`
    pub const CLIENT_1: u64 = 1101;
    /// Client port 1103, `transceiver-1/1/0/C3`
    pub const CLIENT_3: u64 = 1103;
    /// Client port 1211, `transceiver-1/2/0/C11`
    pub const CLIENT_11: u64 = 1211;

    /// Line port backed by an optical channel component
    pub fn line_port(number: u64, optical_channel: &str) -> Port {
        Port::new(PortNumber::new(number))
            .with_annotation(annotations::PORT_TYPE, OdtnPortType::Line.as_str())
            .with_annotation(annotations::OC_OPTICAL_CHANNEL, optical_channel)
    }

    /// Client port backed by a transceiver component
    pub fn client_port(number: u64, transceiver: &str) -> Port {
        Port::new(PortNumber::new(number))
            .with_annotation(annotations::PORT_TYPE, OdtnPortType::Client.as_str())
            .with_annotation(annotations::OC_TRANSCEIVER, transceiver)
    }

    /// Every port of the fixture device
    pub fn standard_ports() -> Vec<Port> {
        vec![
            line_port(LINE_1, "otsi-1/1/0/E1"),
            line_port(LINE_2, "otsi-1/2/0/E2"),
            client_port(CLIENT_1, "transceiver-1/1/0/C1"),
            client_port(CLIENT_3, "transceiver-1/1/0/C3"),
            client_port(CLIENT_11, "transceiver-1/2/0/C11"),
        ]
    }

    /// Inventory holding [`standard_ports`]
    pub fn standard_inventory() -> StaticInventory {
        let inventory = StaticInventory::new();
        inventory.set_ports(device(), standard_ports());
        inventory
    }
}

/// Common flow rule fixtures
pub mod rule_fixtures {
    use super::*;

    /// 50 GHz grid slot `multiplier` channels away from 193.1 THz
    pub fn signal(multiplier: i32) -> OchSignal {
        OchSignal::dwdm(ChannelSpacing::Chl50Ghz, multiplier)
    }

    /// Client to line, tuned to `multiplier`
    pub fn line_ingress(id: u64, client: u64, line: u64, multiplier: i32) -> FlowRule {
        FlowRule::new(id, device(), PortNumber::new(client), PortNumber::new(line))
            .with_treatment_signal(signal(multiplier))
    }

    /// Line to client, matching `multiplier`
    pub fn line_egress(id: u64, line: u64, client: u64, multiplier: i32) -> FlowRule {
        FlowRule::new(id, device(), PortNumber::new(line), PortNumber::new(client))
            .with_selector_signal(signal(multiplier))
    }

    /// Client to line ODU4 mapping
    pub fn client_ingress(id: u64, client: u64, line: u64) -> FlowRule {
        FlowRule::new(id, device(), PortNumber::new(client), PortNumber::new(line))
            .with_odu_signal_type(OduSignalType::Odu4)
    }

    /// Line to client ODU4 mapping
    pub fn client_egress(id: u64, line: u64, client: u64) -> FlowRule {
        FlowRule::new(id, device(), PortNumber::new(line), PortNumber::new(client))
            .with_odu_signal_type(OduSignalType::Odu4)
    }
}

/// Common configuration fixtures
pub mod config_fixtures {
    use super::*;

    /// Provisioning without a settle delay
    pub fn fast_provisioning() -> ProvisioningConfig {
        ProvisioningConfig {
            settle_delay_ms: 0,
            ..ProvisioningConfig::default()
        }
    }

    pub fn driver_config() -> DriverConfig {
        let mut config = DriverConfig::default();
        config.device.id = DEVICE_ID.to_string();
        config.device.host = "10.0.0.10".to_string();
        config.provisioning = fast_provisioning();
        config
    }

    /// A complete configuration file
    pub const CONFIG_TOML: &str = r#"
[device]
id = "netconf:10.0.0.10:830"
host = "10.0.0.10"
username = "admin"
password = "admin"

[provisioning]
settle_delay_ms = 0
default_target_power = -1.5

[provisioning.line_channel_index]
"otsi-1/1/0/E1" = 10
"otsi-1/2/0/E2" = 40

[power]
target_power_min = -10.0
target_power_max = 2.0
"#;
}

/// Components reply describing one line port and one client port
pub const COMPONENTS_REPLY: &str = r#"<rpc-reply xmlns="urn:ietf:params:xml:ns:netconf:base:1.0">
  <data>
    <components xmlns="http://openconfig.net/yang/platform">
      <component>
        <name>port-1/1/0/E1</name>
        <state>
          <type>oc-platform-types:PORT</type>
          <oper-status>oc-platform-types:ACTIVE</oper-status>
        </state>
        <subcomponents>
          <subcomponent><name>otsi-1/1/0/E1</name></subcomponent>
        </subcomponents>
      </component>
      <component>
        <name>otsi-1/1/0/E1</name>
        <state><type>oc-opt-types:OPTICAL_CHANNEL</type></state>
      </component>
      <component>
        <name>port-1/1/0/C3</name>
        <state>
          <type>oc-platform-types:PORT</type>
          <oper-status>oc-platform-types:ACTIVE</oper-status>
        </state>
        <subcomponents>
          <subcomponent><name>transceiver-1/1/0/C3</name></subcomponent>
        </subcomponents>
      </component>
      <component>
        <name>transceiver-1/1/0/C3</name>
        <state><type>oc-platform-types:TRANSCEIVER</type></state>
      </component>
    </components>
  </data>
</rpc-reply>"#;

/// A driver for [`device`] talking to `session`.
pub struct DriverHarness {
    pub session: Arc<RecordingSession>,
    pub sessions: Arc<StaticSessionProvider>,
    pub inventory: Arc<StaticInventory>,
    pub cache: Arc<ConnectionCache>,
    pub driver: T600Driver,
}

impl DriverHarness {
    /// Harness over the standard ports and a fresh device.
    pub fn new() -> Self {
        Self::with_session(RecordingSession::new())
    }

    pub fn with_session(session: RecordingSession) -> Self {
        Self::with_config(session, config_fixtures::driver_config())
    }

    pub fn with_config(session: RecordingSession, config: DriverConfig) -> Self {
        let session = Arc::new(session);
        let sessions = Arc::new(StaticSessionProvider::new());
        sessions.insert(device(), session.clone());
        let inventory = Arc::new(port_fixtures::standard_inventory());
        let cache = Arc::new(ConnectionCache::new());
        let driver = T600Driver::new(
            device(),
            config,
            sessions.clone(),
            inventory.clone(),
            cache.clone(),
        );
        Self {
            session,
            sessions,
            inventory,
            cache,
            driver,
        }
    }
}

impl Default for DriverHarness {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use t600_driver::port_name;

    #[test]
    fn test_port_fixtures_match_codec() {
        for port in port_fixtures::standard_ports() {
            let component = port
                .optical_channel()
                .or(port.transceiver())
                .expect("annotated");
            assert_eq!(port_name::encode(component).unwrap(), port.number);
        }
    }

    #[test]
    fn test_config_toml_parses() {
        let config = DriverConfig::from_toml(config_fixtures::CONFIG_TOML).unwrap();
        assert_eq!(config.provisioning.line_channel_index.len(), 2);
        config.validate().unwrap();
    }
}
