//! Device identity.

use crate::ParseError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identity of a managed device, e.g. `netconf:10.0.0.1:830`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceId(String);

impl DeviceId {
    /// Creates a device id. Empty ids are rejected.
    pub fn new(id: impl Into<String>) -> Result<Self, ParseError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(ParseError::InvalidDeviceId(id));
        }
        Ok(Self(id))
    }

    /// Returns the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for DeviceId {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_id_parse() {
        let id: DeviceId = "netconf:10.0.0.1:830".parse().unwrap();
        assert_eq!(id.as_str(), "netconf:10.0.0.1:830");
        assert_eq!(id.to_string(), "netconf:10.0.0.1:830");
    }

    #[test]
    fn test_device_id_empty() {
        assert!(DeviceId::new("").is_err());
        assert!(DeviceId::new("   ").is_err());
    }
}
