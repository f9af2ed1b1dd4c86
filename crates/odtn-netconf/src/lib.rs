//! NETCONF plumbing shared by ODTN terminal-device drivers.
//!
//! - [`NetconfSession`]: the request/reply seam drivers talk to
//! - [`rpc`]: request envelopes (filtered get, edit-config, commit)
//! - [`xml`]: owned reply trees with path queries
//! - [`error`]: error types for session operations
//! - `ssh` (feature `ssh`): NETCONF 1.0 over an SSH subsystem
//!
//! # Example
//!
//! ```ignore
//! use odtn_netconf::{rpc, xml::XmlNode, NetconfSession};
//!
//! async fn serial(session: &dyn NetconfSession) -> NetconfResult<Option<String>> {
//!     let reply = session.rpc(&rpc::filtered_get("<components/>")).await?;
//!     let doc = XmlNode::parse(&reply)?;
//!     Ok(doc.first_text("data/components/component/state/serial-no"))
//! }
//! ```

pub mod error;
pub mod rpc;
mod session;
#[cfg(feature = "ssh")]
pub mod ssh;
pub mod xml;

pub use error::{NetconfError, NetconfResult};
pub use session::{DatastoreId, DefaultOperation, NetconfSession};
