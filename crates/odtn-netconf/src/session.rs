//! The request/reply session seam.

use async_trait::async_trait;
use std::fmt;

use crate::error::NetconfResult;

/// NETCONF configuration datastores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DatastoreId {
    Running,
    Candidate,
    Startup,
}

impl DatastoreId {
    pub const fn as_str(&self) -> &'static str {
        match self {
            DatastoreId::Running => "running",
            DatastoreId::Candidate => "candidate",
            DatastoreId::Startup => "startup",
        }
    }
}

impl fmt::Display for DatastoreId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `default-operation` of an edit-config.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DefaultOperation {
    Merge,
    Replace,
    None,
}

impl DefaultOperation {
    pub const fn as_str(&self) -> &'static str {
        match self {
            DefaultOperation::Merge => "merge",
            DefaultOperation::Replace => "replace",
            DefaultOperation::None => "none",
        }
    }
}

/// A NETCONF session with one device.
///
/// Drivers are the sole producers of request bodies and the sole consumers of
/// reply bodies; the session only frames and transports them. Calls complete
/// when the device replies or the transport gives up.
#[async_trait]
pub trait NetconfSession: Send + Sync {
    /// Sends a complete `<rpc>` document and returns the raw reply.
    async fn rpc(&self, request: &str) -> NetconfResult<String>;

    /// Edits `datastore` with `config`. Returns whether the device answered `<ok/>`.
    async fn edit_config(
        &self,
        datastore: DatastoreId,
        default_operation: Option<DefaultOperation>,
        config: &str,
    ) -> NetconfResult<bool>;

    /// Commits the candidate datastore.
    async fn commit(&self) -> NetconfResult<()>;

    /// Runs a `<get>` with the given subtree filter and returns the raw reply.
    async fn get(&self, filter: &str) -> NetconfResult<String>;
}
