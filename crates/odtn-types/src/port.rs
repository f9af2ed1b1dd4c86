//! Port identifiers and discovered port descriptions.

use crate::{OchSignal, OduSignalType, ParseError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Numeric handle for a physical or logical port, unique per device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PortNumber(u64);

impl PortNumber {
    pub const fn new(number: u64) -> Self {
        Self(number)
    }

    pub const fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for PortNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for PortNumber {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u64>()
            .map(PortNumber)
            .map_err(|_| ParseError::InvalidPortNumber(s.to_string()))
    }
}

impl From<u64> for PortNumber {
    fn from(number: u64) -> Self {
        Self(number)
    }
}

/// Annotation keys written by port discovery and read by the drivers.
pub mod annotations {
    /// Port role, `LINE` or `CLIENT`.
    pub const PORT_TYPE: &str = "port-type";

    /// Optical-channel component backing a line port.
    pub const OC_OPTICAL_CHANNEL: &str = "oc-optical-channel";

    /// Transceiver component backing a client port.
    pub const OC_TRANSCEIVER: &str = "oc-transceiver";

    /// Vendor component name of the port.
    pub const OC_NAME: &str = "oc-name";

    /// Vendor component type of the port.
    pub const OC_TYPE: &str = "oc-type";
}

/// Role of a terminal-device port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OdtnPortType {
    /// Network-facing optical port.
    Line,
    /// Equipment-facing client port.
    Client,
}

impl OdtnPortType {
    pub const fn as_str(&self) -> &'static str {
        match self {
            OdtnPortType::Line => "LINE",
            OdtnPortType::Client => "CLIENT",
        }
    }
}

impl fmt::Display for OdtnPortType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OdtnPortType {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "LINE" => Ok(OdtnPortType::Line),
            "CLIENT" => Ok(OdtnPortType::Client),
            _ => Err(ParseError::InvalidPortType(s.to_string())),
        }
    }
}

/// Client signal carried by an ODU client port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CltSignalType {
    /// 10 Gigabit Ethernet.
    #[serde(rename = "CLT_10GBE")]
    Clt10Gbe,
    /// 40 Gigabit Ethernet.
    #[serde(rename = "CLT_40GBE")]
    Clt40Gbe,
    /// 100 Gigabit Ethernet.
    #[serde(rename = "CLT_100GBE")]
    Clt100Gbe,
}

/// Signal description of an optical port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PortSignal {
    /// Client port mapping a client signal into an ODU.
    OduClient {
        /// Client signal accepted by the port.
        signal_type: CltSignalType,
    },
    /// Line port carrying an optical channel.
    Och {
        /// ODU carried by the channel.
        signal_type: OduSignalType,
        /// Whether the wavelength can be retuned.
        tunable: bool,
        /// Default slot until a frequency is configured.
        lambda: OchSignal,
    },
}

/// A port of a device together with its discovery annotations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Port {
    pub number: PortNumber,
    pub enabled: bool,
    #[serde(default)]
    pub annotations: BTreeMap<String, String>,
    /// Signal description, when discovery could type the port.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signal: Option<PortSignal>,
}

impl Port {
    /// Creates an enabled port with no annotations.
    pub fn new(number: PortNumber) -> Self {
        Self {
            number,
            enabled: true,
            annotations: BTreeMap::new(),
            signal: None,
        }
    }

    /// Sets the signal description.
    pub fn with_signal(mut self, signal: PortSignal) -> Self {
        self.signal = Some(signal);
        self
    }

    /// Adds an annotation.
    pub fn with_annotation(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.annotations.insert(key.into(), value.into());
        self
    }

    /// Returns the value of an annotation, if present.
    pub fn annotation(&self, key: &str) -> Option<&str> {
        self.annotations.get(key).map(String::as_str)
    }

    /// Returns the port role, if the port-type annotation is present and valid.
    pub fn port_type(&self) -> Option<OdtnPortType> {
        self.annotation(annotations::PORT_TYPE)
            .and_then(|v| v.parse().ok())
    }

    pub fn is_line(&self) -> bool {
        self.port_type() == Some(OdtnPortType::Line)
    }

    /// Optical-channel component name (line ports).
    pub fn optical_channel(&self) -> Option<&str> {
        self.annotation(annotations::OC_OPTICAL_CHANNEL)
    }

    /// Transceiver component name (client ports).
    pub fn transceiver(&self) -> Option<&str> {
        self.annotation(annotations::OC_TRANSCEIVER)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_port_number_parse() {
        assert_eq!("11001".parse::<PortNumber>().unwrap(), PortNumber::new(11001));
        assert!("E1".parse::<PortNumber>().is_err());
    }

    #[test]
    fn test_port_type_roundtrip() {
        assert_eq!("LINE".parse::<OdtnPortType>().unwrap(), OdtnPortType::Line);
        assert_eq!("client".parse::<OdtnPortType>().unwrap(), OdtnPortType::Client);
        assert!("OTHER".parse::<OdtnPortType>().is_err());
        assert_eq!(OdtnPortType::Client.to_string(), "CLIENT");
    }

    #[test]
    fn test_port_annotations() {
        let port = Port::new(PortNumber::new(11001))
            .with_annotation(annotations::PORT_TYPE, "LINE")
            .with_annotation(annotations::OC_OPTICAL_CHANNEL, "otsi-1/1/0/E1");

        assert!(port.is_line());
        assert_eq!(port.optical_channel(), Some("otsi-1/1/0/E1"));
        assert_eq!(port.transceiver(), None);
        assert_eq!(port.signal, None);
    }

    #[test]
    fn test_port_signal_serde() {
        let port = Port::new(PortNumber::new(1103)).with_signal(PortSignal::OduClient {
            signal_type: CltSignalType::Clt10Gbe,
        });
        let json = serde_json::to_string(&port).unwrap();
        assert!(json.contains(r#""signal":{"kind":"odu_client","signal_type":"CLT_10GBE"}"#));
        assert_eq!(serde_json::from_str::<Port>(&json).unwrap(), port);

        let bare: Port = serde_json::from_str(r#"{"number":11001,"enabled":true}"#).unwrap();
        assert_eq!(bare.signal, None);
    }
}
