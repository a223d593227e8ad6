//! Ledger client boundary.
//!
//! # Responsibilities
//! - Freeze transaction bodies under an operator-paid transaction id
//! - Add the operator signature and submit
//! - Wait (bounded) for settlement receipts
//! - Answer topic info queries and open message streams
//!
//! Implementations must be safe to share between concurrent operations.

use async_trait::async_trait;
use futures_util::stream::BoxStream;
use serde::Serialize;

use crate::keys::PublicKey;
use crate::ledger::types::{
    AccountId, LedgerResult, MessageQuery, TopicId, TopicInfo, TopicMessage, TransactionId, TransactionReceipt,
};
use crate::transaction::{FrozenTransaction, TransactionBody};

/// Handle to a submitted transaction whose receipt has not been read yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PendingTransaction {
    pub transaction_id: TransactionId,
    /// Number of ledger transactions the submission was carried in.
    pub chunks: u32,
}

/// Ordered stream of messages from one topic.
pub type MessageStream = BoxStream<'static, LedgerResult<TopicMessage>>;

#[async_trait]
pub trait LedgerClient: Send + Sync {
    /// Account paying for, and implicitly signing, every transaction.
    fn operator_account_id(&self) -> AccountId;

    fn operator_public_key(&self) -> PublicKey;

    /// Assign a transaction id and fix the body against further changes.
    fn freeze(&self, body: TransactionBody) -> LedgerResult<FrozenTransaction>;

    /// Sign with the operator key and send. Fails with `Precheck` when the
    /// network rejects the transaction outright.
    async fn submit(&self, transaction: FrozenTransaction) -> LedgerResult<PendingTransaction>;

    /// Wait for consensus on a submitted transaction.
    async fn get_receipt(&self, pending: &PendingTransaction) -> LedgerResult<TransactionReceipt>;

    async fn topic_info(&self, topic_id: TopicId) -> LedgerResult<TopicInfo>;

    /// Open a message stream. Dropping the stream releases it.
    async fn subscribe(&self, query: MessageQuery) -> LedgerResult<MessageStream>;
}
