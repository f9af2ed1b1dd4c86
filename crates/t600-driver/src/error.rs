//! Error types for the T600 driver.
//!
//! | Variant                | Scope                           |
//! |------------------------|---------------------------------|
//! | `SessionUnavailable`   | whole batch, nothing attempted  |
//! | `Format`               | one rule                        |
//! | `Parameter`            | one rule                        |
//! | `Protocol`             | one rule                        |
//! | `ChannelDiscovery`     | one rule, or none when creating |
//! | `Cancelled`            | one rule                        |
//! | `UnsupportedComponent` | one request                     |

use odtn_netconf::NetconfError;
use std::io;
use thiserror::Error;

/// Result type alias for driver operations.
pub type DriverResult<T> = Result<T, DriverError>;

/// Errors that can occur while provisioning a terminal device.
#[derive(Debug, Error)]
pub enum DriverError {
    /// No NETCONF session is available for the device.
    #[error("No NETCONF session available for device {device}")]
    SessionUnavailable {
        /// The device identifier.
        device: String,
    },

    /// A port name or identifier does not follow the naming grammar.
    #[error("Invalid port identifier '{input}': {message}")]
    Format {
        /// The offending name or identifier.
        input: String,
        /// Error message.
        message: String,
    },

    /// A rule parameter is missing or out of range.
    #[error("Invalid parameter {parameter}: {message}")]
    Parameter {
        /// The parameter name (e.g., "central-frequency").
        parameter: String,
        /// Error message.
        message: String,
    },

    /// An RPC failed, returned a malformed reply, or was not committed.
    #[error("Protocol error during {operation}: {source}")]
    Protocol {
        /// The step that failed (e.g., "create-line-channel").
        operation: String,
        /// The underlying session error.
        #[source]
        source: NetconfError,
    },

    /// The logical-channel lookup query itself failed.
    #[error("Logical channel lookup for '{port}' failed: {message}")]
    ChannelDiscovery {
        /// The optical-channel component queried.
        port: String,
        /// Error message.
        message: String,
    },

    /// Configuration validation error.
    #[error("Invalid configuration for {field}: {message}")]
    Config {
        /// The field that failed validation.
        field: String,
        /// Error message.
        message: String,
    },

    /// The settle delay was interrupted.
    #[error("Settle delay for '{port}' cancelled")]
    Cancelled {
        /// The component being provisioned.
        port: String,
    },

    /// A power or BER request named a component kind the device does not expose.
    #[error("Unsupported component kind '{kind}'")]
    UnsupportedComponent {
        /// The requested kind.
        kind: String,
    },

    /// IO error (configuration and rule files).
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl DriverError {
    /// Creates a session unavailable error.
    pub fn session_unavailable(device: impl ToString) -> Self {
        Self::SessionUnavailable {
            device: device.to_string(),
        }
    }

    /// Creates a format error.
    pub fn format(input: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Format {
            input: input.into(),
            message: message.into(),
        }
    }

    /// Creates a parameter error.
    pub fn parameter(parameter: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Parameter {
            parameter: parameter.into(),
            message: message.into(),
        }
    }

    /// Creates a protocol error.
    pub fn protocol(operation: impl Into<String>, source: NetconfError) -> Self {
        Self::Protocol {
            operation: operation.into(),
            source,
        }
    }

    /// Creates a channel discovery error.
    pub fn channel_discovery(port: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ChannelDiscovery {
            port: port.into(),
            message: message.into(),
        }
    }

    /// Creates a configuration error.
    pub fn config(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Config {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Creates an unsupported component error.
    pub fn unsupported_component(kind: impl Into<String>) -> Self {
        Self::UnsupportedComponent { kind: kind.into() }
    }

    /// Returns true if the error stops a whole batch rather than one rule.
    pub fn is_fatal_for_batch(&self) -> bool {
        matches!(self, DriverError::SessionUnavailable { .. })
    }
}
