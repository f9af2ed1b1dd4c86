//! Vendor component names and numeric port identifiers.
//!
//! T600 components are named `{prefix}{shelf}/{slot}/0/{letter}{index}`:
//!
//! | Name                     | Kind   | Port number |
//! |--------------------------|--------|-------------|
//! | `port-1/1/0/E1`          | line   | `11001`     |
//! | `otsi-1/2/0/E2`          | line   | `12002`     |
//! | `port-1/1/0/C1`          | client | `1101`      |
//! | `transceiver-1/2/0/C11`  | client | `1211`      |
//!
//! Line identifiers carry only the last digit of the index: `E12` encodes
//! as `11002` and decodes back as `otsi-1/1/0/E2`.

use crate::error::{DriverError, DriverResult};
use odtn_types::PortNumber;
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;
use std::str::FromStr;

/// Prefix of front-panel port components.
pub const PREFIX_PORT: &str = "port-";

/// Prefix of optical-channel components backing line ports.
pub const PREFIX_OPTICAL_CHANNEL: &str = "otsi-";

/// Prefix of transceiver components backing client ports.
pub const PREFIX_TRANSCEIVER: &str = "transceiver-";

const MAX_INDEX: u8 = 99;

static COMPONENT_NAME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:port-|otsi-|transceiver-)?(\d+)/(\d+)/(\d+)/([A-Za-z])(\d+)$")
        .expect("Invalid regex pattern")
});

/// Line (optical) or client side of a component name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentKind {
    /// Letter `E`.
    Line,
    /// Letter `C`.
    Client,
}

impl ComponentKind {
    pub const fn letter(&self) -> char {
        match self {
            ComponentKind::Line => 'E',
            ComponentKind::Client => 'C',
        }
    }
}

/// Structured form of a component name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ComponentName {
    shelf: u8,
    slot: u8,
    kind: ComponentKind,
    index: u8,
}

impl ComponentName {
    pub fn new(shelf: u8, slot: u8, kind: ComponentKind, index: u8) -> DriverResult<Self> {
        let name = Self {
            shelf,
            slot,
            kind,
            index,
        };
        name.validate()?;
        Ok(name)
    }

    fn validate(&self) -> DriverResult<()> {
        let input = || self.port_name();
        if !(1..=2).contains(&self.shelf) {
            return Err(DriverError::format(input(), "shelf must be 1 or 2"));
        }
        if !(1..=2).contains(&self.slot) {
            return Err(DriverError::format(input(), "slot must be 1 or 2"));
        }
        if !(1..=MAX_INDEX).contains(&self.index) {
            return Err(DriverError::format(
                input(),
                format!("index must be within 1..={}", MAX_INDEX),
            ));
        }
        Ok(())
    }

    /// Parses a component name with any of the known prefixes, or none.
    pub fn parse(name: &str) -> DriverResult<Self> {
        let segments = name.split('/').count();
        if segments != 4 {
            return Err(DriverError::format(
                name,
                format!("expected 4 '/'-separated segments, found {}", segments),
            ));
        }

        let caps = COMPONENT_NAME_RE
            .captures(name)
            .ok_or_else(|| DriverError::format(name, "does not match {shelf}/{slot}/0/{E|C}{index}"))?;

        let number = |i: usize| -> DriverResult<u8> {
            caps[i]
                .parse::<u8>()
                .map_err(|_| DriverError::format(name, format!("'{}' out of range", &caps[i])))
        };

        if number(3)? != 0 {
            return Err(DriverError::format(name, "third segment must be 0"));
        }

        let kind = match &caps[4] {
            "E" => ComponentKind::Line,
            "C" => ComponentKind::Client,
            other => {
                return Err(DriverError::format(
                    name,
                    format!("port letter must be 'E' or 'C', found '{}'", other),
                ))
            }
        };

        Self::new(number(1)?, number(2)?, kind, number(5)?)
    }

    /// Rebuilds the structured name from a port number produced by [`port_number`](Self::port_number).
    pub fn from_port_number(number: PortNumber) -> DriverResult<Self> {
        let digits = number.as_u64().to_string();
        let digit = |i: usize| -> u8 { digits.as_bytes()[i] - b'0' };

        match digits.len() {
            5 => {
                if &digits[2..4] != "00" {
                    return Err(DriverError::format(
                        digits.as_str(),
                        "line identifiers must have 00 in positions 3-4",
                    ));
                }
                Self::new(digit(0), digit(1), ComponentKind::Line, digit(4))
            }
            4 => Self::new(
                digit(0),
                digit(1),
                ComponentKind::Client,
                digit(2) * 10 + digit(3),
            ),
            n => Err(DriverError::format(
                digits.as_str(),
                format!("identifier must have 4 or 5 digits, found {}", n),
            )),
        }
    }

    pub fn shelf(&self) -> u8 {
        self.shelf
    }

    pub fn slot(&self) -> u8 {
        self.slot
    }

    pub fn kind(&self) -> ComponentKind {
        self.kind
    }

    pub fn index(&self) -> u8 {
        self.index
    }

    pub fn is_line(&self) -> bool {
        self.kind == ComponentKind::Line
    }

    /// Numeric port identifier. Lossy for line indices above 9.
    pub fn port_number(&self) -> PortNumber {
        let base = u64::from(self.shelf) * 10 + u64::from(self.slot);
        let number = match self.kind {
            ComponentKind::Line => base * 1000 + u64::from(self.index % 10),
            ComponentKind::Client => base * 100 + u64::from(self.index),
        };
        PortNumber::new(number)
    }

    /// `{shelf}/{slot}/0/{letter}{index}` without prefix.
    pub fn canonical(&self) -> String {
        format!(
            "{}/{}/0/{}{}",
            self.shelf,
            self.slot,
            self.kind.letter(),
            self.index
        )
    }

    /// Front-panel port component, e.g. `port-1/1/0/C1`.
    pub fn port_name(&self) -> String {
        format!("{}{}", PREFIX_PORT, self.canonical())
    }

    /// Component backing the port: `otsi-...` for line, `transceiver-...` for client.
    pub fn component_name(&self) -> String {
        let prefix = match self.kind {
            ComponentKind::Line => PREFIX_OPTICAL_CHANNEL,
            ComponentKind::Client => PREFIX_TRANSCEIVER,
        };
        format!("{}{}", prefix, self.canonical())
    }
}

impl fmt::Display for ComponentName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.component_name())
    }
}

impl FromStr for ComponentName {
    type Err = DriverError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Maps a component name to its port number.
pub fn encode(name: &str) -> DriverResult<PortNumber> {
    ComponentName::parse(name).map(|n| n.port_number())
}

/// Maps a port number to the name of the component backing it.
pub fn decode(number: PortNumber) -> DriverResult<String> {
    ComponentName::from_port_number(number).map(|n| n.component_name())
}

/// Digits following `C` in a client component name (`transceiver-1/1/0/C3` -> `3`).
pub fn client_suffix(client: &str) -> DriverResult<String> {
    let name = ComponentName::parse(client)?;
    match name.kind() {
        ComponentKind::Client => Ok(name.index().to_string()),
        ComponentKind::Line => Err(DriverError::format(client, "not a client component")),
    }
}
