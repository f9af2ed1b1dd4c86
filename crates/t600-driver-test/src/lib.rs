//! Integration test infrastructure for the T600 driver
//!
//! Provides:
//! - `RecordingSession`, a simulated T600 that keeps logical channels and
//!   component config, records every request and can inject failures
//! - Flow rule, port and configuration fixtures
//! - Request log assertions

pub mod fixtures;
mod session;
mod verification;

pub use fixtures::*;
pub use session::{DeviceState, Failure, RecordingSession, Request};
pub use verification::*;
