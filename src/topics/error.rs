//! Topic operation errors.

use thiserror::Error;

use crate::keys::KeyError;
use crate::ledger::{LedgerError, Status};
use crate::transaction::ChunkError;

/// Errors that can occur during topic operations.
///
/// Every kind propagates to the caller unchanged. Nothing is retried.
#[derive(Debug, Error)]
pub enum TopicError {
    /// Rejected locally before any network call.
    #[error("validation failed for {operation}: {reason}")]
    Validation {
        operation: &'static str,
        reason: String,
    },

    /// The network rejected the transaction before execution.
    #[error("{operation} rejected at precheck with status {status}")]
    Precheck { operation: &'static str, status: Status },

    /// No acknowledgement or receipt within the ledger client's bound.
    #[error("{operation} timed out: {source}")]
    Timeout {
        operation: &'static str,
        #[source]
        source: LedgerError,
    },

    /// Receipt obtained but its status is not `SUCCESS`.
    #[error("{operation} failed with status {status}")]
    TransactionFailed { operation: &'static str, status: Status },

    /// The ledger answered in a way the protocol does not allow, such as a
    /// successful create receipt without a topic id.
    #[error("contract violation in {operation}: {detail}")]
    ContractViolation {
        operation: &'static str,
        detail: String,
    },

    #[error("key error: {0}")]
    Key(#[from] KeyError),

    /// Any other ledger client failure.
    #[error("{operation} ledger error: {source}")]
    Ledger {
        operation: &'static str,
        #[source]
        source: LedgerError,
    },
}

/// Result type for topic operations.
pub type TopicResult<T> = Result<T, TopicError>;

impl TopicError {
    pub(crate) fn validation(operation: &'static str, reason: impl Into<String>) -> Self {
        Self::Validation {
            operation,
            reason: reason.into(),
        }
    }

    pub(crate) fn chunking(operation: &'static str, error: ChunkError) -> Self {
        Self::validation(operation, error.to_string())
    }

    pub(crate) fn contract(operation: &'static str, detail: impl Into<String>) -> Self {
        Self::ContractViolation {
            operation,
            detail: detail.into(),
        }
    }

    /// Classify a ledger client error raised while running `operation`.
    pub(crate) fn from_ledger(operation: &'static str, error: LedgerError) -> Self {
        match error {
            LedgerError::Precheck(status) => Self::Precheck { operation, status },
            LedgerError::ReceiptStatus { status, .. } => Self::TransactionFailed { operation, status },
            source @ LedgerError::Timeout { .. } => Self::Timeout { operation, source },
            source => Self::Ledger { operation, source },
        }
    }

    /// Ledger status carried by the error, if any.
    pub fn status(&self) -> Option<Status> {
        match self {
            Self::Precheck { status, .. } | Self::TransactionFailed { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}
