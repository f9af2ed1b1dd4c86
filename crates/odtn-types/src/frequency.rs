//! Optical signal parameters.

use crate::ParseError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const HZ_PER_MHZ: u64 = 1_000_000;
const HZ_PER_GHZ: f64 = 1_000_000_000.0;
const HZ_PER_THZ: f64 = 1_000_000_000_000.0;

/// Anchor frequency of the ITU-T DWDM grid (193.1 THz).
const DWDM_ANCHOR_HZ: i128 = 193_100_000_000_000;

/// A frequency with Hz resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Frequency(u64);

impl Frequency {
    pub const fn from_hz(hz: u64) -> Self {
        Self(hz)
    }

    pub const fn from_mhz(mhz: u64) -> Self {
        Self(mhz * HZ_PER_MHZ)
    }

    pub fn from_ghz(ghz: f64) -> Self {
        Self((ghz * HZ_PER_GHZ).round() as u64)
    }

    pub fn from_thz(thz: f64) -> Self {
        Self((thz * HZ_PER_THZ).round() as u64)
    }

    pub const fn as_hz(&self) -> u64 {
        self.0
    }

    /// Whole MHz, truncated. This is the device's integer representation.
    pub const fn as_mhz(&self) -> u64 {
        self.0 / HZ_PER_MHZ
    }

    pub fn as_ghz(&self) -> f64 {
        self.0 as f64 / HZ_PER_GHZ
    }

    pub fn as_thz(&self) -> f64 {
        self.0 as f64 / HZ_PER_THZ
    }

    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} THz", self.as_thz())
    }
}

impl FromStr for Frequency {
    type Err = ParseError;

    /// Accepts `<value> <unit>` with unit THz, GHz, MHz or Hz (case-insensitive,
    /// whitespace optional). A bare number is taken as Hz.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseError::InvalidFrequency(s.to_string());
        let trimmed = s.trim();
        let split = trimmed
            .find(|c: char| c.is_ascii_alphabetic())
            .unwrap_or(trimmed.len());
        let (value, unit) = trimmed.split_at(split);
        let value: f64 = value.trim().parse().map_err(|_| err())?;
        if !value.is_finite() || value < 0.0 {
            return Err(err());
        }
        let scale = match unit.trim().to_ascii_lowercase().as_str() {
            "thz" => HZ_PER_THZ,
            "ghz" => HZ_PER_GHZ,
            "mhz" => HZ_PER_MHZ as f64,
            "hz" | "" => 1.0,
            _ => return Err(err()),
        };
        Ok(Self((value * scale).round() as u64))
    }
}

/// Spectrum grid type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum GridType {
    #[default]
    Dwdm,
    Cwdm,
    Flex,
}

/// DWDM channel spacing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChannelSpacing {
    #[serde(rename = "CHL_100GHZ")]
    Chl100Ghz,
    #[serde(rename = "CHL_50GHZ")]
    Chl50Ghz,
    #[serde(rename = "CHL_25GHZ")]
    Chl25Ghz,
    #[serde(rename = "CHL_12P5GHZ")]
    Chl12p5Ghz,
    #[serde(rename = "CHL_6P25GHZ")]
    Chl6p25Ghz,
}

impl ChannelSpacing {
    /// Spacing as a frequency.
    pub const fn frequency(&self) -> Frequency {
        Frequency::from_hz(match self {
            ChannelSpacing::Chl100Ghz => 100_000_000_000,
            ChannelSpacing::Chl50Ghz => 50_000_000_000,
            ChannelSpacing::Chl25Ghz => 25_000_000_000,
            ChannelSpacing::Chl12p5Ghz => 12_500_000_000,
            ChannelSpacing::Chl6p25Ghz => 6_250_000_000,
        })
    }
}

impl FromStr for ChannelSpacing {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "CHL_100GHZ" | "100GHZ" => Ok(ChannelSpacing::Chl100Ghz),
            "CHL_50GHZ" | "50GHZ" => Ok(ChannelSpacing::Chl50Ghz),
            "CHL_25GHZ" | "25GHZ" => Ok(ChannelSpacing::Chl25Ghz),
            "CHL_12P5GHZ" | "12.5GHZ" => Ok(ChannelSpacing::Chl12p5Ghz),
            "CHL_6P25GHZ" | "6.25GHZ" => Ok(ChannelSpacing::Chl6p25Ghz),
            _ => Err(ParseError::InvalidChannelSpacing(s.to_string())),
        }
    }
}

/// Optical channel signal: a slot on the spectrum grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OchSignal {
    #[serde(default)]
    pub grid_type: GridType,
    pub channel_spacing: ChannelSpacing,
    pub spacing_multiplier: i32,
    #[serde(default = "default_slot_granularity")]
    pub slot_granularity: u32,
}

fn default_slot_granularity() -> u32 {
    4
}

impl OchSignal {
    /// A fixed-grid DWDM slot `multiplier` channels away from 193.1 THz.
    pub fn dwdm(channel_spacing: ChannelSpacing, spacing_multiplier: i32) -> Self {
        Self {
            grid_type: GridType::Dwdm,
            channel_spacing,
            spacing_multiplier,
            slot_granularity: default_slot_granularity(),
        }
    }

    /// Central frequency of the slot, or `None` when it would not be positive.
    pub fn central_frequency(&self) -> Option<Frequency> {
        let spacing = self.channel_spacing.frequency().as_hz() as i128;
        let hz = DWDM_ANCHOR_HZ + self.spacing_multiplier as i128 * spacing;
        if hz <= 0 || hz > u64::MAX as i128 {
            return None;
        }
        Some(Frequency::from_hz(hz as u64))
    }
}

/// ODU signal type requested by a client-side mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OduSignalType {
    Odu0,
    Odu1,
    Odu2,
    Odu2e,
    Odu3,
    Odu4,
    Oducn,
}
