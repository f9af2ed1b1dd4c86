//! Verification helpers for testing the T600 driver
//!
//! Provides assertion helpers over the requests a [`RecordingSession`] saw

use crate::session::{RecordingSession, Request};
use odtn_netconf::DatastoreId;
use thiserror::Error;

/// Verification error types
#[derive(Error, Debug)]
pub enum VerificationError {
    #[error("Expected {expected} {kind} requests, found {actual}")]
    CountMismatch {
        kind: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("Expected {expected} edits containing '{needle}', found {actual}")]
    EditCountMismatch {
        needle: String,
        expected: usize,
        actual: usize,
    },

    #[error("Edit sent to {actual} datastore, expected {expected}")]
    WrongDatastore {
        expected: DatastoreId,
        actual: DatastoreId,
    },

    #[error("Request {index} was {actual}, expected {expected}")]
    OrderMismatch {
        index: usize,
        expected: String,
        actual: String,
    },
}

/// Result type for verification operations
pub type VerifyResult<T> = Result<T, VerificationError>;

/// Request log verifier
pub struct RequestLogVerifier<'a> {
    session: &'a RecordingSession,
}

impl<'a> RequestLogVerifier<'a> {
    pub fn new(session: &'a RecordingSession) -> Self {
        Self { session }
    }

    fn count(&self, kind: &'static str, expected: usize, actual: usize) -> VerifyResult<()> {
        if expected != actual {
            return Err(VerificationError::CountMismatch {
                kind,
                expected,
                actual,
            });
        }
        Ok(())
    }

    pub fn assert_edit_count(&self, expected: usize) -> VerifyResult<()> {
        self.count("edit-config", expected, self.session.edits().len())
    }

    pub fn assert_commit_count(&self, expected: usize) -> VerifyResult<()> {
        self.count("commit", expected, self.session.commits())
    }

    /// Verify the number of RPCs (lookups and queries)
    pub fn assert_rpc_count(&self, expected: usize) -> VerifyResult<()> {
        let actual = self
            .session
            .requests()
            .iter()
            .filter(|r| matches!(r, Request::Rpc(_)))
            .count();
        self.count("rpc", expected, actual)
    }

    /// Number of edits whose document contains `needle`
    pub fn count_containing(&self, needle: &str) -> usize {
        self.session
            .edits()
            .iter()
            .filter(|e| e.contains(needle))
            .count()
    }

    pub fn assert_edits_containing(&self, needle: &str, expected: usize) -> VerifyResult<()> {
        let actual = self.count_containing(needle);
        if actual != expected {
            return Err(VerificationError::EditCountMismatch {
                needle: needle.to_string(),
                expected,
                actual,
            });
        }
        Ok(())
    }

    /// Verify every edit targeted the candidate datastore
    pub fn assert_candidate_only(&self) -> VerifyResult<()> {
        for request in self.session.requests() {
            if let Request::EditConfig { datastore, .. } = request {
                if datastore != DatastoreId::Candidate {
                    return Err(VerificationError::WrongDatastore {
                        expected: DatastoreId::Candidate,
                        actual: datastore,
                    });
                }
            }
        }
        Ok(())
    }

    /// Verify that each edit is followed by its commit before the next edit
    pub fn assert_edit_commit_pairs(&self) -> VerifyResult<()> {
        let writes: Vec<&'static str> = self
            .session
            .requests()
            .iter()
            .filter_map(|r| match r {
                Request::EditConfig { .. } => Some("edit-config"),
                Request::Commit => Some("commit"),
                _ => None,
            })
            .collect();

        for (index, actual) in writes.iter().enumerate() {
            let expected = if index % 2 == 0 { "edit-config" } else { "commit" };
            if *actual != expected {
                return Err(VerificationError::OrderMismatch {
                    index,
                    expected: expected.to_string(),
                    actual: actual.to_string(),
                });
            }
        }
        if writes.len() % 2 == 1 {
            return Err(VerificationError::OrderMismatch {
                index: writes.len(),
                expected: "commit".to_string(),
                actual: "nothing".to_string(),
            });
        }
        Ok(())
    }
}
