//! Connections believed to be provisioned, per device.
//!
//! The T600 cannot report its installed rules, so this cache is the only
//! read-back source for them. It is never persisted and can drift from the
//! device after out-of-band changes.
//!
//! The cache never creates a device entry on read: `get`, `size` and
//! `remove` on an unknown device return empty results.
//!
//! # Example
//!
//! ```
//! use odtn_types::{DeviceId, FlowRule, PortNumber};
//! use t600_driver::ConnectionCache;
//!
//! let cache = ConnectionCache::new();
//! let device = DeviceId::new("t600").unwrap();
//! let rule = FlowRule::new(1, device.clone(), PortNumber::new(1101), PortNumber::new(11001));
//!
//! cache.add(&device, "client-ingress-1101-11001", rule.clone());
//! assert_eq!(cache.get(&device), vec![rule]);
//!
//! cache.remove(&device, "client-ingress-1101-11001");
//! assert_eq!(cache.size(&device), 0);
//! ```

use dashmap::DashMap;
use odtn_types::{DeviceId, FlowEntry, FlowRule};

/// One applied directional connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionRecord {
    pub name: String,
    pub rule: FlowRule,
}

/// Device to ordered connection records.
///
/// Each device entry is locked for the duration of an operation, so `add`,
/// `remove` and `get` on the same device never interleave.
#[derive(Debug, Default)]
pub struct ConnectionCache {
    devices: DashMap<DeviceId, Vec<ConnectionRecord>>,
}

impl ConnectionCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a connection. A record with the same name is replaced in place.
    pub fn add(&self, device: &DeviceId, name: impl Into<String>, rule: FlowRule) {
        let name = name.into();
        let mut records = self.devices.entry(device.clone()).or_default();
        match records.iter_mut().find(|r| r.name == name) {
            Some(existing) => existing.rule = rule,
            None => records.push(ConnectionRecord { name, rule }),
        }
    }

    /// Forgets a connection, returning its rule if it was known.
    pub fn remove(&self, device: &DeviceId, name: &str) -> Option<FlowRule> {
        let removed = {
            let mut records = self.devices.get_mut(device)?;
            let pos = records.iter().position(|r| r.name == name)?;
            records.remove(pos).rule
        };
        self.devices.remove_if(device, |_, records| records.is_empty());
        Some(removed)
    }

    /// Rules for a device in insertion order.
    pub fn get(&self, device: &DeviceId) -> Vec<FlowRule> {
        self.devices
            .get(device)
            .map(|records| records.iter().map(|r| r.rule.clone()).collect())
            .unwrap_or_default()
    }

    pub fn records(&self, device: &DeviceId) -> Vec<ConnectionRecord> {
        self.devices
            .get(device)
            .map(|records| records.value().clone())
            .unwrap_or_default()
    }

    pub fn contains(&self, device: &DeviceId, name: &str) -> bool {
        self.devices
            .get(device)
            .is_some_and(|records| records.iter().any(|r| r.name == name))
    }

    pub fn size(&self, device: &DeviceId) -> usize {
        self.devices.get(device).map(|r| r.len()).unwrap_or(0)
    }

    /// Installed entries with zero counters; no statistics are available.
    pub fn flow_entries(&self, device: &DeviceId) -> Vec<FlowEntry> {
        self.get(device).into_iter().map(FlowEntry::added).collect()
    }

    /// Drops every record of a device.
    pub fn clear(&self, device: &DeviceId) {
        self.devices.remove(device);
    }

    pub fn devices(&self) -> Vec<DeviceId> {
        self.devices.iter().map(|e| e.key().clone()).collect()
    }
}
