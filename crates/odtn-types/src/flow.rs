//! Abstract flow rules and the entries synthesized from them.

use crate::{DeviceId, OchSignal, OduSignalType, PortNumber};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier assigned to a flow rule by its producer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FlowRuleId(pub u64);

impl fmt::Display for FlowRuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// Match side of a flow rule.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TrafficSelector {
    pub in_port: PortNumber,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub och_signal: Option<OchSignal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub odu_signal_type: Option<OduSignalType>,
}

/// Action side of a flow rule.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TrafficTreatment {
    pub output: PortNumber,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub och_signal: Option<OchSignal>,
}

/// An abstract connectivity request: traffic entering `in_port` leaves via
/// `output`, optionally tuned to an optical channel.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FlowRule {
    pub id: FlowRuleId,
    pub device_id: DeviceId,
    #[serde(default)]
    pub priority: u32,
    pub selector: TrafficSelector,
    pub treatment: TrafficTreatment,
}

impl FlowRule {
    /// Creates a plain port-to-port rule.
    pub fn new(id: u64, device_id: DeviceId, in_port: PortNumber, output: PortNumber) -> Self {
        Self {
            id: FlowRuleId(id),
            device_id,
            priority: 0,
            selector: TrafficSelector {
                in_port,
                och_signal: None,
                odu_signal_type: None,
            },
            treatment: TrafficTreatment {
                output,
                och_signal: None,
            },
        }
    }

    /// Sets the OCh signal on the treatment (lambda modification).
    pub fn with_treatment_signal(mut self, signal: OchSignal) -> Self {
        self.treatment.och_signal = Some(signal);
        self
    }

    /// Sets the OCh signal on the selector (lambda match).
    pub fn with_selector_signal(mut self, signal: OchSignal) -> Self {
        self.selector.och_signal = Some(signal);
        self
    }

    /// Requests a client-side ODU mapping.
    pub fn with_odu_signal_type(mut self, odu: OduSignalType) -> Self {
        self.selector.odu_signal_type = Some(odu);
        self
    }

    pub fn with_priority(mut self, priority: u32) -> Self {
        self.priority = priority;
        self
    }

    pub fn in_port(&self) -> PortNumber {
        self.selector.in_port
    }

    pub fn out_port(&self) -> PortNumber {
        self.treatment.output
    }
}

/// State of a flow entry as reported to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FlowEntryState {
    PendingAdd,
    Added,
    PendingRemove,
    Removed,
}

/// A flow rule believed to be installed, with its counters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowEntry {
    pub rule: FlowRule,
    pub state: FlowEntryState,
    pub life_secs: u64,
    pub packets: u64,
    pub bytes: u64,
}

impl FlowEntry {
    /// An installed entry with zeroed counters.
    pub fn added(rule: FlowRule) -> Self {
        Self {
            rule,
            state: FlowEntryState::Added,
            life_secs: 0,
            packets: 0,
            bytes: 0,
        }
    }
}
