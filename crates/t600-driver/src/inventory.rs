//! Device inventory and session lookup.
//!
//! The driver does not own device connections or port records; it asks a
//! [`SessionProvider`] for the device's NETCONF session and a
//! [`DeviceInventory`] for the ports discovered on it.

use crate::error::{DriverError, DriverResult};
use crate::port_name::{ComponentKind, ComponentName};
use dashmap::DashMap;
use odtn_netconf::NetconfSession;
use odtn_types::{DeviceId, Port, PortNumber};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

/// Source of NETCONF sessions.
#[cfg_attr(test, mockall::automock)]
pub trait SessionProvider: Send + Sync {
    /// Returns the session of a device, or `None` if it is not connected.
    fn session(&self, device: &DeviceId) -> Option<Arc<dyn NetconfSession>>;
}

/// Source of port records.
#[cfg_attr(test, mockall::automock)]
pub trait DeviceInventory: Send + Sync {
    /// All ports of a device.
    fn ports(&self, device: &DeviceId) -> Vec<Port>;

    /// A single port.
    fn port(&self, device: &DeviceId, number: PortNumber) -> Option<Port>;
}

/// Numbers of the ports annotated as line ports.
pub fn line_ports(inventory: &dyn DeviceInventory, device: &DeviceId) -> BTreeSet<PortNumber> {
    inventory
        .ports(device)
        .into_iter()
        .filter(Port::is_line)
        .map(|p| p.number)
        .collect()
}

/// Name of the component backing a port: the optical channel of a line port
/// or the transceiver of a client port.
///
/// The discovery annotation wins; ports discovered without one fall back to
/// the name decoded from the port number.
pub fn component_name(
    inventory: &dyn DeviceInventory,
    device: &DeviceId,
    number: PortNumber,
    kind: ComponentKind,
) -> DriverResult<String> {
    let port = inventory
        .port(device, number)
        .ok_or_else(|| DriverError::format(number.to_string(), "port not present on device"))?;

    let annotated = match kind {
        ComponentKind::Line => port.optical_channel(),
        ComponentKind::Client => port.transceiver(),
    };
    if let Some(name) = annotated {
        return Ok(name.to_string());
    }

    let name = ComponentName::from_port_number(number)?;
    if name.kind() != kind {
        return Err(DriverError::format(
            number.to_string(),
            format!("expected a {:?} port", kind).to_lowercase(),
        ));
    }
    Ok(name.component_name())
}

/// In-memory session table.
#[derive(Default)]
pub struct StaticSessionProvider {
    sessions: DashMap<DeviceId, Arc<dyn NetconfSession>>,
}

impl StaticSessionProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, device: DeviceId, session: Arc<dyn NetconfSession>) {
        self.sessions.insert(device, session);
    }

    pub fn remove(&self, device: &DeviceId) -> bool {
        self.sessions.remove(device).is_some()
    }
}

impl SessionProvider for StaticSessionProvider {
    fn session(&self, device: &DeviceId) -> Option<Arc<dyn NetconfSession>> {
        self.sessions.get(device).map(|s| Arc::clone(s.value()))
    }
}

/// In-memory port table, usually filled from port discovery.
#[derive(Debug, Default)]
pub struct StaticInventory {
    devices: DashMap<DeviceId, BTreeMap<PortNumber, Port>>,
}

impl StaticInventory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces every port of a device.
    pub fn set_ports(&self, device: DeviceId, ports: impl IntoIterator<Item = Port>) {
        let ports = ports.into_iter().map(|p| (p.number, p)).collect();
        self.devices.insert(device, ports);
    }

    pub fn add_port(&self, device: DeviceId, port: Port) {
        self.devices
            .entry(device)
            .or_default()
            .insert(port.number, port);
    }
}

impl DeviceInventory for StaticInventory {
    fn ports(&self, device: &DeviceId) -> Vec<Port> {
        self.devices
            .get(device)
            .map(|ports| ports.values().cloned().collect())
            .unwrap_or_default()
    }

    fn port(&self, device: &DeviceId, number: PortNumber) -> Option<Port> {
        self.devices
            .get(device)
            .and_then(|ports| ports.get(&number).cloned())
    }
}
