//! Ledger client boundary and the in-memory network behind it.
//!
//! # Data Flow
//! ```text
//! TopicService
//!     → client.rs (LedgerClient: freeze, submit, receipt, info, subscribe)
//!     → simulated.rs (in-memory execution, receipts, message feeds)
//!     → types.rs (ids, statuses, receipts, errors)
//! ```

pub mod client;
pub mod simulated;
pub mod types;

pub use client::{LedgerClient, MessageStream, PendingTransaction};
pub use simulated::{SimulatedLedger, SimulatedLedgerConfig, DEFAULT_AUTO_RENEW_PERIOD, MAX_MEMO_BYTES};
pub use types::{
    AccountId, IdParseError, LedgerError, LedgerResult, MessageQuery, Status, TopicId, TopicInfo, TopicMessage,
    TransactionId, TransactionReceipt, UnknownStatus,
};
