//! Device and port discovery.
//!
//! Ports are the `oc-platform-types:PORT` components in `ACTIVE` state. A
//! port is typed by its subcomponents: a transceiver makes it a client port,
//! an optical channel makes it a line port. The subcomponent's own type is
//! read from its entry in the same `components` tree.

use crate::error::{DriverError, DriverResult};
use crate::inventory::SessionProvider;
use crate::port_name;
use crate::templates;
use odtn_netconf::xml::XmlNode;
use odtn_netconf::NetconfSession;
use odtn_types::{
    annotations, ChannelSpacing, CltSignalType, DeviceId, OchSignal, OduSignalType, OdtnPortType,
    Port, PortSignal,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

const OC_PLATFORM_TYPES_PORT: &str = "oc-platform-types:PORT";
const OC_PLATFORM_ACTIVE: &str = "oc-platform-types:ACTIVE";
const TYPE_TRANSCEIVER: &str = "TRANSCEIVER";
const TYPE_OPTICAL_CHANNEL: &str = "OPTICAL_CHANNEL";

const DEFAULT_VENDOR: &str = "NOVENDOR";
const DEFAULT_SERIAL_NUMBER: &str = "0xCAFEBEEF";
const DEFAULT_HW_VERSION: &str = "0.2.1";
const DEFAULT_SW_VERSION: &str = "0.2.1";
const DEFAULT_CHASSIS_ID: &str = "128";

/// Slot a line port reports until its frequency is configured.
const DEFAULT_LINE_SLOT: i32 = 1;

/// Signal description for a discovered port of role `kind`.
pub fn port_signal(kind: OdtnPortType) -> PortSignal {
    match kind {
        OdtnPortType::Client => PortSignal::OduClient {
            signal_type: CltSignalType::Clt10Gbe,
        },
        OdtnPortType::Line => PortSignal::Och {
            signal_type: OduSignalType::Odu4,
            tunable: true,
            lambda: OchSignal::dwdm(ChannelSpacing::Chl50Ghz, DEFAULT_LINE_SLOT),
        },
    }
}

/// Identity and versions reported by the device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceDescription {
    pub device_id: DeviceId,
    pub vendor: String,
    pub hw_version: String,
    pub sw_version: String,
    pub serial_number: String,
    pub chassis_id: u64,
}

/// Reads device details and ports over the device's NETCONF session.
pub struct TerminalDeviceDiscovery {
    device: DeviceId,
    sessions: Arc<dyn SessionProvider>,
}

impl TerminalDeviceDiscovery {
    pub fn new(device: DeviceId, sessions: Arc<dyn SessionProvider>) -> Self {
        Self { device, sessions }
    }

    fn session(&self) -> DriverResult<Arc<dyn NetconfSession>> {
        self.sessions
            .session(&self.device)
            .ok_or_else(|| DriverError::session_unavailable(&self.device))
    }

    #[instrument(skip(self), fields(device = %self.device))]
    pub async fn discover_device_details(&self) -> DriverResult<DeviceDescription> {
        let reply = self
            .session()?
            .rpc(&templates::device_details_query())
            .await
            .map_err(|e| DriverError::protocol("discover-device-details", e))?;
        let doc = XmlNode::parse(&reply)
            .map_err(|e| DriverError::protocol("discover-device-details", e))?;

        let description = parse_device_details(&self.device, &doc)?;
        info!(
            vendor = %description.vendor,
            hw_version = %description.hw_version,
            sw_version = %description.sw_version,
            serial = %description.serial_number,
            chassis_id = description.chassis_id,
            "device retrieved details"
        );
        Ok(description)
    }

    #[instrument(skip(self), fields(device = %self.device))]
    pub async fn discover_port_details(&self) -> DriverResult<Vec<Port>> {
        let reply = self
            .session()?
            .rpc(&templates::components_query())
            .await
            .map_err(|e| DriverError::protocol("discover-port-details", e))?;
        debug!("components reply {}", reply);
        let doc = XmlNode::parse(&reply)
            .map_err(|e| DriverError::protocol("discover-port-details", e))?;

        let ports = match doc.find(templates::COMPONENTS_PATH) {
            Some(components) => parse_ports(components),
            None => Vec::new(),
        };
        info!(ports = ports.len(), "discovered ports");
        Ok(ports)
    }
}

/// Builds the device description from a `components/component/state` reply,
/// using fixed fallbacks for missing leaves.
pub fn parse_device_details(device: &DeviceId, reply: &XmlNode) -> DriverResult<DeviceDescription> {
    let leaf = |name: &str, default: &str| {
        reply.text_or(&format!("{}/{}", templates::COMPONENT_STATE_PATH, name), default)
    };

    let chassis = leaf("id", DEFAULT_CHASSIS_ID);
    let chassis_id = chassis
        .parse::<u64>()
        .map_err(|_| DriverError::format(chassis.as_str(), "chassis id is not a decimal number"))?;

    Ok(DeviceDescription {
        device_id: device.clone(),
        vendor: leaf("mfg-name", DEFAULT_VENDOR),
        hw_version: leaf("hardware-version", DEFAULT_HW_VERSION),
        sw_version: leaf("software-version", DEFAULT_SW_VERSION),
        serial_number: leaf("serial-no", DEFAULT_SERIAL_NUMBER),
        chassis_id,
    })
}

/// Ports described by a `components` subtree. Components that are not active
/// ports, or whose name cannot be mapped to a port number, are skipped.
pub fn parse_ports(components: &XmlNode) -> Vec<Port> {
    components
        .find_all("component")
        .into_iter()
        .filter(|c| {
            c.first_text("name").is_some()
                && c.first_text("state/type").as_deref() == Some(OC_PLATFORM_TYPES_PORT)
                && c.first_text("state/oper-status").as_deref() == Some(OC_PLATFORM_ACTIVE)
        })
        .filter_map(|c| parse_port(c, components))
        .collect()
}

fn parse_port(component: &XmlNode, components: &XmlNode) -> Option<Port> {
    let name = component.first_text("name")?;
    let number = match port_name::encode(&name) {
        Ok(number) => number,
        Err(e) => {
            warn!(component = %name, error = %e, "skipping port component");
            return None;
        }
    };
    debug!(component = %name, %number, "parsing port component");

    let mut port = Port::new(number)
        .with_annotation(annotations::OC_NAME, name.as_str())
        .with_annotation(annotations::OC_TYPE, OC_PLATFORM_TYPES_PORT);

    for property in component.find_all("properties/property") {
        if let Some(key) = property.first_text("name") {
            let value = property.text_or("state/value", "");
            port.annotations.insert(key, value);
        }
    }

    if port.annotation(annotations::PORT_TYPE).is_none() {
        if let Some(transceiver) = subcomponent_of_type(component, components, TYPE_TRANSCEIVER) {
            port.annotations
                .insert(annotations::PORT_TYPE.to_string(), OdtnPortType::Client.to_string());
            port.annotations
                .insert(annotations::OC_TRANSCEIVER.to_string(), transceiver);
        } else if let Some(channel) =
            subcomponent_of_type(component, components, TYPE_OPTICAL_CHANNEL)
        {
            port.annotations
                .insert(annotations::PORT_TYPE.to_string(), OdtnPortType::Line.to_string());
            port.annotations
                .insert(annotations::OC_OPTICAL_CHANNEL.to_string(), channel);
        }
    }

    match port.port_type() {
        Some(kind) => {
            debug!(component = %name, %number, "added as {} port", kind);
            Some(port.with_signal(port_signal(kind)))
        }
        None => {
            warn!(component = %name, %number, "port is of unknown type");
            None
        }
    }
}

/// Name of the first subcomponent whose component type is `kind`. Types may
/// carry a module prefix (`oc-platform-types:TRANSCEIVER`).
fn subcomponent_of_type(component: &XmlNode, components: &XmlNode, kind: &str) -> Option<String> {
    component
        .find_all("subcomponents/subcomponent")
        .into_iter()
        .filter_map(|sc| sc.first_text("name"))
        .find(|sc_name| {
            components
                .find_all("component")
                .into_iter()
                .find(|c| c.first_text("name").as_deref() == Some(sc_name.as_str()))
                .and_then(|c| c.first_text("state/type"))
                .map(|t| t.rsplit(':').next() == Some(kind))
                .unwrap_or(false)
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use odtn_types::PortNumber;
    use pretty_assertions::assert_eq;

    const COMPONENTS: &str = r#"<rpc-reply xmlns="urn:ietf:params:xml:ns:netconf:base:1.0">
      <data>
        <components xmlns="http://openconfig.net/yang/platform">
          <component>
            <name>port-1/1/0/E1</name>
            <state>
              <type xmlns:oc-platform-types="http://openconfig.net/yang/platform-types">oc-platform-types:PORT</type>
              <oper-status>oc-platform-types:ACTIVE</oper-status>
            </state>
            <subcomponents>
              <subcomponent><name>otsi-1/1/0/E1</name></subcomponent>
            </subcomponents>
          </component>
          <component>
            <name>otsi-1/1/0/E1</name>
            <state><type>OPTICAL_CHANNEL</type></state>
          </component>
          <component>
            <name>port-1/2/0/C11</name>
            <state>
              <type>oc-platform-types:PORT</type>
              <oper-status>oc-platform-types:ACTIVE</oper-status>
            </state>
            <properties>
              <property><name>location</name><state><value>rack-2</value></state></property>
            </properties>
            <subcomponents>
              <subcomponent><name>transceiver-1/2/0/C11</name></subcomponent>
            </subcomponents>
          </component>
          <component>
            <name>transceiver-1/2/0/C11</name>
            <state><type>oc-platform-types:TRANSCEIVER</type></state>
          </component>
          <component>
            <name>port-1/1/0/C2</name>
            <state>
              <type>oc-platform-types:PORT</type>
              <oper-status>oc-platform-types:INACTIVE</oper-status>
            </state>
          </component>
          <component>
            <name>port-mgmt</name>
            <state>
              <type>oc-platform-types:PORT</type>
              <oper-status>oc-platform-types:ACTIVE</oper-status>
            </state>
          </component>
          <component>
            <name>port-1/1/0/C5</name>
            <state>
              <type>oc-platform-types:PORT</type>
              <oper-status>oc-platform-types:ACTIVE</oper-status>
            </state>
          </component>
        </components>
      </data>
    </rpc-reply>"#;

    fn device() -> DeviceId {
        DeviceId::new("t600").unwrap()
    }

    #[test]
    fn test_parse_ports() {
        let doc = XmlNode::parse(COMPONENTS).unwrap();
        let ports = parse_ports(doc.find("data/components").unwrap());

        assert_eq!(ports.len(), 2);

        let line = &ports[0];
        assert_eq!(line.number, PortNumber::new(11001));
        assert!(line.is_line());
        assert_eq!(line.optical_channel(), Some("otsi-1/1/0/E1"));
        assert_eq!(line.annotation(annotations::OC_NAME), Some("port-1/1/0/E1"));

        let client = &ports[1];
        assert_eq!(client.number, PortNumber::new(1211));
        assert_eq!(client.port_type(), Some(OdtnPortType::Client));
        assert_eq!(client.transceiver(), Some("transceiver-1/2/0/C11"));
        assert_eq!(client.annotation("location"), Some("rack-2"));
    }

    #[test]
    fn test_discovered_ports_carry_signal() {
        let doc = XmlNode::parse(COMPONENTS).unwrap();
        let ports = parse_ports(doc.find("data/components").unwrap());

        match ports[0].signal {
            Some(PortSignal::Och {
                signal_type,
                tunable,
                lambda,
            }) => {
                assert_eq!(signal_type, OduSignalType::Odu4);
                assert!(tunable);
                assert_eq!(lambda, OchSignal::dwdm(ChannelSpacing::Chl50Ghz, 1));
                assert_eq!(lambda.central_frequency().unwrap().as_mhz(), 193_150_000);
            }
            ref other => panic!("expected an OCh line port, got {:?}", other),
        }
        assert_eq!(
            ports[1].signal,
            Some(PortSignal::OduClient {
                signal_type: CltSignalType::Clt10Gbe
            })
        );
    }

    #[test]
    fn test_two_digit_line_index_is_discovered() {
        let xml = r#"<components>
          <component>
            <name>port-1/1/0/E12</name>
            <state>
              <type>oc-platform-types:PORT</type>
              <oper-status>oc-platform-types:ACTIVE</oper-status>
            </state>
            <properties>
              <property><name>port-type</name><state><value>LINE</value></state></property>
            </properties>
          </component>
        </components>"#;
        let doc = XmlNode::parse(xml).unwrap();

        let ports = parse_ports(&doc);
        assert_eq!(ports.len(), 1);
        assert_eq!(ports[0].number, PortNumber::new(11002));
        assert!(matches!(ports[0].signal, Some(PortSignal::Och { .. })));
    }

    #[test]
    fn test_property_port_type_wins() {
        let xml = r#"<components>
          <component>
            <name>port-1/1/0/E2</name>
            <state>
              <type>oc-platform-types:PORT</type>
              <oper-status>oc-platform-types:ACTIVE</oper-status>
            </state>
            <properties>
              <property><name>port-type</name><state><value>LINE</value></state></property>
            </properties>
          </component>
        </components>"#;
        let doc = XmlNode::parse(xml).unwrap();

        let ports = parse_ports(&doc);
        assert_eq!(ports.len(), 1);
        assert!(ports[0].is_line());
        assert_eq!(ports[0].optical_channel(), None);
    }

    #[test]
    fn test_device_details_fallbacks() {
        let doc = XmlNode::parse(
            "<rpc-reply><data><components><component><state>\
             <mfg-name>FUJITSU</mfg-name><serial-no>T600-0042</serial-no>\
             </state></component></components></data></rpc-reply>",
        )
        .unwrap();

        let description = parse_device_details(&device(), &doc).unwrap();
        assert_eq!(
            description,
            DeviceDescription {
                device_id: device(),
                vendor: "FUJITSU".to_string(),
                hw_version: "0.2.1".to_string(),
                sw_version: "0.2.1".to_string(),
                serial_number: "T600-0042".to_string(),
                chassis_id: 128,
            }
        );
    }

    #[test]
    fn test_device_details_bad_chassis_id() {
        let doc = XmlNode::parse(
            "<rpc-reply><data><components><component><state><id>chassis-a</id>\
             </state></component></components></data></rpc-reply>",
        )
        .unwrap();

        assert!(matches!(
            parse_device_details(&device(), &doc),
            Err(DriverError::Format { .. })
        ));
    }

    #[tokio::test]
    async fn test_discovery_without_session() {
        let mut sessions = crate::inventory::MockSessionProvider::new();
        sessions.expect_session().returning(|_| None);
        let discovery = TerminalDeviceDiscovery::new(device(), Arc::new(sessions));

        assert!(matches!(
            discovery.discover_port_details().await,
            Err(DriverError::SessionUnavailable { .. })
        ));
    }
}
