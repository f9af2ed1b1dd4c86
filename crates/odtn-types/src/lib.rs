//! Common types for optical terminal-device drivers.
//!
//! This crate provides the value types shared by the NETCONF plumbing and
//! the terminal-device drivers:
//!
//! - [`DeviceId`]: identity of a managed device
//! - [`PortNumber`] and [`Port`]: numeric port handles plus the annotations
//!   written by port discovery, with an optional [`PortSignal`]
//! - [`Frequency`], [`OchSignal`], [`OduSignalType`]: optical signal
//!   parameters carried by flow rules
//! - [`FlowRule`] and [`FlowEntry`]: the abstract connectivity requests the
//!   drivers translate into device configuration

mod device;
mod flow;
mod frequency;
mod port;

pub use device::DeviceId;
pub use flow::{FlowEntry, FlowEntryState, FlowRule, FlowRuleId, TrafficSelector, TrafficTreatment};
pub use frequency::{ChannelSpacing, Frequency, GridType, OchSignal, OduSignalType};
pub use port::{annotations, CltSignalType, OdtnPortType, Port, PortNumber, PortSignal};

/// Common error type for parsing failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("invalid device id: {0}")]
    InvalidDeviceId(String),

    #[error("invalid port number: {0}")]
    InvalidPortNumber(String),

    #[error("invalid port type: {0}")]
    InvalidPortType(String),

    #[error("invalid frequency: {0}")]
    InvalidFrequency(String),

    #[error("invalid channel spacing: {0}")]
    InvalidChannelSpacing(String),
}
