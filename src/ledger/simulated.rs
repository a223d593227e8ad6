//! In-memory ledger implementing [`LedgerClient`].
//!
//! Executes topic transactions with the network's authorization rules and
//! status codes, so the topic service can be exercised end to end without a
//! live network.
//!
//! # Behaviour
//! - The operator signs every submission implicitly
//! - Updates and deletes need a valid admin key signature; topics without an
//!   admin key answer `UNAUTHORIZED`
//! - Deleted topics answer `INVALID_TOPIC_ID` to writes and info queries but
//!   keep their message history readable through `subscribe`
//! - A submission is acknowledged after `ack_delay` and fails with a submit
//!   timeout when that exceeds `submit_timeout`
//! - Receipts become available after the configured consensus delay and are
//!   waited for no longer than the receipt timeout
//! - Receipts are forgotten `receipt_retention` after they become available;
//!   a later receipt query answers `UnknownTransaction`
//! - Message submissions with an empty payload or a zero chunk size or chunk
//!   limit fail precheck with `INVALID_TRANSACTION_BODY`
//! - Messages are stored per chunk and reassembled on the stream

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::{DashMap, DashSet};
use futures_util::stream::{self, StreamExt};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{broadcast, mpsc};
use tokio::time::{timeout, Instant};

use crate::config::TopicLedgerConfig;
use crate::keys::{Operator, PublicKey};
use crate::ledger::client::{LedgerClient, MessageStream, PendingTransaction};
use crate::ledger::types::{
    AccountId, LedgerError, LedgerResult, MessageQuery, Status, TopicId, TopicInfo, TopicMessage,
    TransactionId, TransactionReceipt,
};
use crate::transaction::chunking::{segment, ChunkRecord};
use crate::transaction::types::{MessageSubmitBody, TopicCreateBody, TopicDeleteBody, TopicUpdateBody};
use crate::transaction::{ChunkAssembler, FieldUpdate, FrozenTransaction, TransactionBody, MAX_MESSAGE_BYTES};

/// Longest memo the network accepts, in bytes.
pub const MAX_MEMO_BYTES: usize = 100;

/// Auto-renew period applied when a create omits it (90 days).
pub const DEFAULT_AUTO_RENEW_PERIOD: Duration = Duration::from_secs(7_776_000);

const MIN_AUTO_RENEW_PERIOD: Duration = Duration::from_secs(30 * 24 * 3600);
const MAX_AUTO_RENEW_PERIOD: Duration = Duration::from_secs(92 * 24 * 3600);
const FEED_CAPACITY: usize = 1024;
const STREAM_BUFFER: usize = 64;

/// Behaviour knobs of the simulated network.
#[derive(Debug, Clone)]
pub struct SimulatedLedgerConfig {
    pub shard: u64,
    pub realm: u64,
    /// First entity number handed out to new topics and accounts.
    pub first_entity_num: u64,
    pub consensus_delay: Duration,
    /// Time the network takes to acknowledge a submission.
    pub ack_delay: Duration,
    pub submit_timeout: Duration,
    pub receipt_timeout: Duration,
    /// Return failure statuses from `get_receipt` as `ReceiptStatus` errors.
    pub validate_receipt_status: bool,
    /// How long a receipt stays queryable once it is available.
    pub receipt_retention: Duration,
}

impl Default for SimulatedLedgerConfig {
    fn default() -> Self {
        Self {
            shard: 0,
            realm: 0,
            first_entity_num: 1000,
            consensus_delay: Duration::from_millis(5),
            ack_delay: Duration::ZERO,
            submit_timeout: Duration::from_secs(10),
            receipt_timeout: Duration::from_secs(30),
            validate_receipt_status: true,
            receipt_retention: Duration::from_secs(180),
        }
    }
}

impl SimulatedLedgerConfig {
    pub fn from_config(config: &TopicLedgerConfig) -> Self {
        Self {
            shard: config.network.shard,
            realm: config.network.realm,
            consensus_delay: Duration::from_millis(config.network.consensus_delay_ms),
            ack_delay: Duration::from_millis(config.network.ack_delay_ms),
            submit_timeout: config.timeouts.submit(),
            receipt_timeout: config.timeouts.receipt(),
            validate_receipt_status: config.network.validate_receipt_status,
            receipt_retention: Duration::from_secs(config.network.receipt_retention_secs),
            ..Self::default()
        }
    }
}

#[derive(Debug)]
struct TopicState {
    info: TopicInfo,
    deleted: bool,
    chunks: Vec<ChunkRecord>,
    feed: broadcast::Sender<ChunkRecord>,
}

#[derive(Debug, Clone)]
struct ReceiptEntry {
    receipt: TransactionReceipt,
    ready_at: Instant,
}

struct Inner {
    operator: Operator,
    config: SimulatedLedgerConfig,
    accounts: DashSet<AccountId>,
    topics: DashMap<TopicId, TopicState>,
    receipts: DashMap<TransactionId, ReceiptEntry>,
    next_entity: AtomicU64,
    submissions: AtomicU64,
    clock: Mutex<DateTime<Utc>>,
}

/// Shared handle to a simulated network. Cloning shares state.
#[derive(Clone)]
pub struct SimulatedLedger {
    inner: Arc<Inner>,
}

impl SimulatedLedger {
    pub fn new(operator: Operator, config: SimulatedLedgerConfig) -> Self {
        let accounts = DashSet::new();
        accounts.insert(operator.account_id());

        tracing::info!(
            operator = %operator.account_id(),
            consensus_delay_ms = config.consensus_delay.as_millis() as u64,
            "Simulated ledger initialized"
        );

        Self {
            inner: Arc::new(Inner {
                next_entity: AtomicU64::new(config.first_entity_num),
                operator,
                config,
                accounts,
                topics: DashMap::new(),
                receipts: DashMap::new(),
                submissions: AtomicU64::new(0),
                clock: Mutex::new(DateTime::<Utc>::MIN_UTC),
            }),
        }
    }

    /// Create a funded account usable as an auto-renew account.
    pub fn create_account(&self) -> AccountId {
        let id = AccountId::new(self.inner.config.shard, self.inner.config.realm, self.next_num());
        self.inner.accounts.insert(id);
        id
    }

    /// Number of transactions that reached the network.
    pub fn submission_count(&self) -> u64 {
        self.inner.submissions.load(Ordering::SeqCst)
    }

    /// Number of receipts still held by the network.
    pub fn receipt_count(&self) -> usize {
        self.inner.receipts.len()
    }

    fn evict_expired_receipts(&self) {
        let now = Instant::now();
        let retention = self.inner.config.receipt_retention;
        self.inner.receipts.retain(|_, entry| entry.ready_at + retention > now);
    }

    fn next_num(&self) -> u64 {
        self.inner.next_entity.fetch_add(1, Ordering::SeqCst)
    }

    /// Strictly increasing timestamps, close to wall-clock time.
    fn next_timestamp(&self) -> DateTime<Utc> {
        let mut last = self.inner.clock.lock().unwrap_or_else(|e| e.into_inner());
        let now = Utc::now();
        let next = if now > *last {
            now
        } else {
            *last + chrono::Duration::nanoseconds(1)
        };
        *last = next;
        next
    }

    fn precheck(&self, transaction: &FrozenTransaction) -> Result<(), Status> {
        let tx_id = transaction.transaction_id();
        if tx_id.account_id != self.inner.operator.account_id() {
            return Err(Status::PayerAccountNotFound);
        }
        if !transaction.is_signed_by(&self.inner.operator.public_key()) {
            return Err(Status::InvalidSignature);
        }
        if self.inner.receipts.contains_key(&tx_id) {
            return Err(Status::DuplicateTransaction);
        }
        let memo = match transaction.body() {
            TransactionBody::TopicCreate(body) => body.memo.as_deref(),
            TransactionBody::TopicUpdate(body) => match &body.memo {
                FieldUpdate::Set(memo) => Some(memo.as_str()),
                _ => None,
            },
            _ => None,
        };
        if memo.is_some_and(|m| m.len() > MAX_MEMO_BYTES) {
            return Err(Status::MemoTooLong);
        }
        if let TransactionBody::MessageSubmit(body) = transaction.body() {
            if body.message.is_empty() || body.chunking.chunk_size == 0 || body.chunking.max_chunks == 0 {
                return Err(Status::InvalidTransactionBody);
            }
            if body.message.len() > MAX_MESSAGE_BYTES {
                return Err(Status::MessageSizeTooLarge);
            }
        }
        Ok(())
    }

    fn execute(&self, transaction: &FrozenTransaction) -> (TransactionReceipt, u32) {
        let tx_id = transaction.transaction_id();
        let mut receipt = TransactionReceipt::new(Status::Success, Some(tx_id));
        let mut chunks = 1;

        let outcome = match transaction.body() {
            TransactionBody::TopicCreate(body) => self.execute_create(body).map(|topic_id| {
                receipt.topic_id = Some(topic_id);
            }),
            TransactionBody::TopicUpdate(body) => self.execute_update(body, transaction),
            TransactionBody::TopicDelete(body) => self.execute_delete(body, transaction),
            TransactionBody::MessageSubmit(body) => {
                self.execute_submit(body, transaction).map(|(sequence_number, count)| {
                    receipt.topic_sequence_number = Some(sequence_number);
                    chunks = count;
                })
            }
        };

        if let Err(status) = outcome {
            receipt = TransactionReceipt::new(status, Some(tx_id));
        }
        (receipt, chunks)
    }

    fn check_renewal(&self, account: Option<&AccountId>, period: Option<Duration>) -> Result<(), Status> {
        if let Some(account) = account {
            if !self.inner.accounts.contains(account) {
                return Err(Status::InvalidAutoRenewAccount);
            }
        }
        if let Some(period) = period {
            if !(MIN_AUTO_RENEW_PERIOD..=MAX_AUTO_RENEW_PERIOD).contains(&period) {
                return Err(Status::AutorenewDurationNotInRange);
            }
        }
        Ok(())
    }

    fn execute_create(&self, body: &TopicCreateBody) -> Result<TopicId, Status> {
        self.check_renewal(body.auto_renew_account_id.as_ref(), body.auto_renew_period)?;

        let topic_id = TopicId::new(self.inner.config.shard, self.inner.config.realm, self.next_num());
        let period = body.auto_renew_period.unwrap_or(DEFAULT_AUTO_RENEW_PERIOD);
        let expiration = self.next_timestamp() + chrono::Duration::seconds(period.as_secs() as i64);
        let (feed, _) = broadcast::channel(FEED_CAPACITY);

        self.inner.topics.insert(
            topic_id,
            TopicState {
                info: TopicInfo {
                    topic_id,
                    memo: body.memo.clone().unwrap_or_default(),
                    admin_key: body.admin_key,
                    submit_key: body.submit_key,
                    auto_renew_account_id: body.auto_renew_account_id,
                    auto_renew_period: period,
                    expiration_time: expiration,
                    sequence_number: 0,
                },
                deleted: false,
                chunks: Vec::new(),
                feed,
            },
        );
        Ok(topic_id)
    }

    fn authorize_admin(admin_key: Option<&PublicKey>, transaction: &FrozenTransaction) -> Result<(), Status> {
        match admin_key {
            None => Err(Status::Unauthorized),
            Some(key) if transaction.is_signed_by(key) => Ok(()),
            Some(_) => Err(Status::InvalidSignature),
        }
    }

    fn execute_update(&self, body: &TopicUpdateBody, transaction: &FrozenTransaction) -> Result<(), Status> {
        let mut topic = self
            .inner
            .topics
            .get_mut(&body.topic_id)
            .filter(|t| !t.deleted)
            .ok_or(Status::InvalidTopicId)?;

        Self::authorize_admin(topic.info.admin_key.as_ref(), transaction)?;

        let new_account = match &body.auto_renew_account_id {
            FieldUpdate::Set(account) => Some(account),
            _ => None,
        };
        self.check_renewal(new_account, body.auto_renew_period)?;

        if let Some(expiration) = body.expiration_time {
            if expiration < topic.info.expiration_time {
                return Err(Status::ExpirationReductionNotAllowed);
            }
        }

        let info = &mut topic.info;
        info.admin_key = body.admin_key.clone().apply(info.admin_key);
        info.submit_key = body.submit_key.clone().apply(info.submit_key);
        info.memo = body.memo.clone().apply(Some(info.memo.clone())).unwrap_or_default();
        info.auto_renew_account_id = body.auto_renew_account_id.clone().apply(info.auto_renew_account_id);
        if let Some(period) = body.auto_renew_period {
            info.auto_renew_period = period;
        }
        if let Some(expiration) = body.expiration_time {
            info.expiration_time = expiration;
        }
        Ok(())
    }

    fn execute_delete(&self, body: &TopicDeleteBody, transaction: &FrozenTransaction) -> Result<(), Status> {
        let mut topic = self
            .inner
            .topics
            .get_mut(&body.topic_id)
            .filter(|t| !t.deleted)
            .ok_or(Status::InvalidTopicId)?;

        Self::authorize_admin(topic.info.admin_key.as_ref(), transaction)?;
        topic.deleted = true;
        Ok(())
    }

    fn execute_submit(&self, body: &MessageSubmitBody, transaction: &FrozenTransaction) -> Result<(u64, u32), Status> {
        let mut topic = self
            .inner
            .topics
            .get_mut(&body.topic_id)
            .filter(|t| !t.deleted)
            .ok_or(Status::InvalidTopicId)?;

        if let Some(submit_key) = topic.info.submit_key {
            if !transaction.is_signed_by(&submit_key) {
                return Err(Status::InvalidSignature);
            }
        }

        let chunks = segment(transaction.transaction_id(), &body.message, body.chunking.chunk_size);
        if chunks.len() > body.chunking.max_chunks {
            return Err(Status::InvalidChunkNumber);
        }

        if Utc::now() > topic.info.expiration_time {
            return Err(Status::TopicExpired);
        }

        let count = chunks.len() as u32;
        for chunk in chunks {
            let consensus_timestamp = self.next_timestamp();
            topic.info.sequence_number += 1;
            let record = ChunkRecord {
                topic_id: body.topic_id,
                sequence_number: topic.info.sequence_number,
                consensus_timestamp,
                info: chunk.info,
                contents: chunk.contents,
            };
            topic.chunks.push(record.clone());
            // No receivers just means nobody is subscribed.
            let _ = topic.feed.send(record);
        }
        Ok((topic.info.sequence_number, count))
    }

    async fn wait_for_receipt(&self, pending: &PendingTransaction) -> LedgerResult<TransactionReceipt> {
        let entry = self
            .inner
            .receipts
            .get(&pending.transaction_id)
            .map(|e| e.value().clone())
            .ok_or(LedgerError::UnknownTransaction(pending.transaction_id))?;

        tokio::time::sleep_until(entry.ready_at).await;
        Ok(entry.receipt)
    }
}

#[async_trait]
impl LedgerClient for SimulatedLedger {
    fn operator_account_id(&self) -> AccountId {
        self.inner.operator.account_id()
    }

    fn operator_public_key(&self) -> PublicKey {
        self.inner.operator.public_key()
    }

    fn freeze(&self, body: TransactionBody) -> LedgerResult<FrozenTransaction> {
        let tx_id = TransactionId::new(self.inner.operator.account_id(), self.next_timestamp());
        FrozenTransaction::freeze(tx_id, body).map_err(|e| LedgerError::Encoding(e.to_string()))
    }

    async fn submit(&self, mut transaction: FrozenTransaction) -> LedgerResult<PendingTransaction> {
        self.inner.submissions.fetch_add(1, Ordering::SeqCst);
        transaction.sign(self.inner.operator.key());

        let tx_id = transaction.transaction_id();
        let submit = async {
            if !self.inner.config.ack_delay.is_zero() {
                tokio::time::sleep(self.inner.config.ack_delay).await;
            }
            self.evict_expired_receipts();
            self.precheck(&transaction).map_err(LedgerError::Precheck)?;
            let (receipt, chunks) = self.execute(&transaction);
            tracing::debug!(
                transaction_id = %tx_id,
                operation = transaction.body().operation(),
                status = %receipt.status,
                "Transaction executed"
            );
            self.inner.receipts.insert(
                tx_id,
                ReceiptEntry {
                    receipt,
                    ready_at: Instant::now() + self.inner.config.consensus_delay,
                },
            );
            Ok(PendingTransaction {
                transaction_id: tx_id,
                chunks,
            })
        };

        match timeout(self.inner.config.submit_timeout, submit).await {
            Ok(result) => result,
            Err(_) => Err(LedgerError::Timeout {
                stage: "submit",
                elapsed: self.inner.config.submit_timeout,
            }),
        }
    }

    async fn get_receipt(&self, pending: &PendingTransaction) -> LedgerResult<TransactionReceipt> {
        let receipt = match timeout(self.inner.config.receipt_timeout, self.wait_for_receipt(pending)).await {
            Ok(result) => result?,
            Err(_) => {
                return Err(LedgerError::Timeout {
                    stage: "receipt",
                    elapsed: self.inner.config.receipt_timeout,
                })
            }
        };

        if self.inner.config.validate_receipt_status && !receipt.status.is_success() {
            return Err(LedgerError::ReceiptStatus {
                transaction_id: pending.transaction_id,
                status: receipt.status,
            });
        }
        Ok(receipt)
    }

    async fn topic_info(&self, topic_id: TopicId) -> LedgerResult<TopicInfo> {
        self.inner
            .topics
            .get(&topic_id)
            .filter(|t| !t.deleted)
            .map(|t| t.info.clone())
            .ok_or(LedgerError::Precheck(Status::InvalidTopicId))
    }

    async fn subscribe(&self, query: MessageQuery) -> LedgerResult<MessageStream> {
        // History snapshot and live receiver are taken under the same entry
        // lock so no chunk falls between them.
        let (history, mut feed) = {
            let topic = self
                .inner
                .topics
                .get(&query.topic_id)
                .ok_or_else(|| LedgerError::Subscription(format!("topic {} not found", query.topic_id)))?;
            (topic.chunks.clone(), topic.feed.subscribe())
        };

        let (tx, rx) = mpsc::channel::<LedgerResult<TopicMessage>>(STREAM_BUFFER);

        tokio::spawn(async move {
            let mut assembler = ChunkAssembler::new();
            let past_end = |message: &TopicMessage| query.end_time.is_some_and(|end| message.consensus_timestamp >= end);

            for record in history {
                if let Some(message) = assembler.push(record) {
                    if past_end(&message) {
                        return;
                    }
                    if query.matches(message.consensus_timestamp) && tx.send(Ok(message)).await.is_err() {
                        return;
                    }
                }
            }

            let until_end = query
                .end_time
                .map(|end| (end - Utc::now()).to_std().unwrap_or_default())
                .unwrap_or(Duration::MAX);
            let deadline = tokio::time::sleep(until_end.min(Duration::from_secs(u32::MAX as u64)));
            tokio::pin!(deadline);

            loop {
                tokio::select! {
                    _ = tx.closed() => return,
                    _ = &mut deadline, if query.end_time.is_some() => return,
                    received = feed.recv() => match received {
                        Ok(record) => {
                            if let Some(message) = assembler.push(record) {
                                if past_end(&message) {
                                    return;
                                }
                                if query.matches(message.consensus_timestamp) && tx.send(Ok(message)).await.is_err() {
                                    return;
                                }
                            }
                        }
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            let _ = tx
                                .send(Err(LedgerError::Subscription(format!("stream lagged by {} chunks", skipped))))
                                .await;
                            return;
                        }
                        Err(broadcast::error::RecvError::Closed) => return,
                    },
                }
            }
        });

        Ok(stream::unfold(rx, |mut rx| async move { rx.recv().await.map(|item| (item, rx)) }).boxed())
    }
}

impl std::fmt::Debug for SimulatedLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimulatedLedger")
            .field("operator", &self.inner.operator.account_id())
            .field("topics", &self.inner.topics.len())
            .field("consensus_delay", &self.inner.config.consensus_delay)
            .finish()
    }
}
