//! Uniform result envelope returned by every mutating topic operation.

use serde::Serialize;

use crate::ledger::{Status, TransactionReceipt};

/// Transaction id reported when a receipt carries none.
pub const UNKNOWN_TRANSACTION_ID: &str = "UNKNOWN_TRANSACTION_ID";

/// Ledger status, transaction id and typed payload of one operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResultEnvelope<T> {
    status: Status,
    transaction_id: String,
    result: T,
}

impl<T> ResultEnvelope<T> {
    /// Wrap `result` with the status and transaction id of `receipt`.
    ///
    /// The status is copied verbatim, failures included.
    pub fn of(receipt: &TransactionReceipt, result: T) -> Self {
        Self {
            status: receipt.status,
            transaction_id: receipt
                .transaction_id
                .map(|id| id.to_string())
                .unwrap_or_else(|| UNKNOWN_TRANSACTION_ID.to_string()),
            result,
        }
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn transaction_id(&self) -> &str {
        &self.transaction_id
    }

    pub fn result(&self) -> &T {
        &self.result
    }

    pub fn into_result(self) -> T {
        self.result
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ResultEnvelope<U> {
        ResultEnvelope {
            status: self.status,
            transaction_id: self.transaction_id,
            result: f(self.result),
        }
    }
}
