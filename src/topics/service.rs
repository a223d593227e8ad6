//! Topic orchestration: build, sign, submit, await receipt, map result.
//!
//! # Execution
//! ```text
//! caller intent
//!     → local validation (no network call on failure)
//!     → builder (sparse transaction body)
//!     → freeze + admin / submit key signature
//!     → LedgerClient::submit → LedgerClient::get_receipt
//!     → status check (non-SUCCESS → TransactionFailed, never retried)
//!     → ResultEnvelope with the locally known payload
//! ```
//!
//! No topic state is cached. Every read goes to the ledger and every mutation
//! is judged by its own receipt.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::TopicLedgerConfig;
use crate::keys::{Ed25519KeyResolver, KeyResolver, PrivateKey, PublicKey};
use crate::ledger::{AccountId, LedgerClient, LedgerError, TopicId, TopicInfo, TransactionReceipt};
use crate::observability::metrics;
use crate::response::ResultEnvelope;
use crate::topics::error::{TopicError, TopicResult};
use crate::transaction::{builder, ChunkPolicy, TopicCreateOptions, TopicUpdate, TransactionBody};

/// Defaults the service applies when the caller does not supply a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceSettings {
    pub chunk_policy: ChunkPolicy,
    /// Auto-renew period used by [`TopicService::create_topic`].
    pub auto_renew_period: Duration,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            chunk_policy: ChunkPolicy::default(),
            auto_renew_period: Duration::from_secs(92 * 24 * 3600),
        }
    }
}

impl ServiceSettings {
    pub fn from_config(config: &TopicLedgerConfig) -> Self {
        Self {
            chunk_policy: config.messages.chunk_policy(),
            auto_renew_period: config.topics.auto_renew_period(),
        }
    }
}

/// Per-submission overrides. Anything left `None` uses the service defaults.
#[derive(Debug, Clone, Default)]
pub struct SubmitOptions {
    pub chunk_size: Option<usize>,
    pub max_chunks: Option<usize>,
    /// Needed when the topic has a submit key other than the operator's.
    pub submit_key: Option<PrivateKey>,
}

/// Payload of a successful message submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MessageSubmitted {
    pub topic_id: TopicId,
    /// Sequence number of the last chunk.
    pub sequence_number: u64,
    pub chunks: u32,
}

/// Caller-facing topic operations.
///
/// Cheap to clone; clones share the ledger client.
#[derive(Clone)]
pub struct TopicService {
    pub(super) client: Arc<dyn LedgerClient>,
    resolver: Arc<dyn KeyResolver>,
    settings: ServiceSettings,
}

impl TopicService {
    pub fn new(client: Arc<dyn LedgerClient>, settings: ServiceSettings) -> Self {
        Self {
            client,
            resolver: Arc::new(Ed25519KeyResolver),
            settings,
        }
    }

    pub fn with_resolver(mut self, resolver: Arc<dyn KeyResolver>) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn settings(&self) -> &ServiceSettings {
        &self.settings
    }

    /// Resolve a key string into a signing key (admin or submit key).
    pub fn resolve_private_key(&self, encoded: &str) -> TopicResult<PrivateKey> {
        Ok(self.resolver.private_key(encoded)?)
    }

    pub fn resolve_public_key(&self, encoded: &str) -> TopicResult<PublicKey> {
        Ok(self.resolver.public_key(encoded)?)
    }

    /// Create a topic administered and written by the operator, renewed from
    /// the operator account every configured period (92 days by default).
    pub async fn create_topic(&self) -> TopicResult<ResultEnvelope<TopicId>> {
        self.create_topic_with(self.default_create_options(None)).await
    }

    /// Same defaults as [`create_topic`](Self::create_topic) plus a memo.
    pub async fn create_topic_with_memo(&self, memo: &str) -> TopicResult<ResultEnvelope<TopicId>> {
        self.create_topic_with(self.default_create_options(Some(memo.to_string())))
            .await
    }

    /// Create a topic with exactly the supplied parameters. Absent values are
    /// omitted from the transaction, not defaulted.
    pub async fn create_topic_with(&self, options: TopicCreateOptions) -> TopicResult<ResultEnvelope<TopicId>> {
        const OPERATION: &str = "create_topic";

        let receipt = self.execute(OPERATION, builder::create_topic(&options), None).await?;
        let topic_id = receipt
            .topic_id
            .ok_or_else(|| TopicError::contract(OPERATION, "successful receipt carries no topic id"))?;

        tracing::info!(topic_id = %topic_id, "Topic created");
        Ok(ResultEnvelope::of(&receipt, topic_id))
    }

    fn default_create_options(&self, memo: Option<String>) -> TopicCreateOptions {
        let operator_key = self.client.operator_public_key();
        TopicCreateOptions {
            admin_key: Some(operator_key),
            submit_key: Some(operator_key),
            memo,
            auto_renew_account_id: Some(self.client.operator_account_id()),
            auto_renew_period: Some(self.settings.auto_renew_period),
        }
    }

    pub async fn update_admin_key(
        &self,
        topic_id: TopicId,
        admin_key: &PrivateKey,
        new_admin_key: PublicKey,
    ) -> TopicResult<ResultEnvelope<PublicKey>> {
        let receipt = self
            .apply_update(
                "update_admin_key",
                topic_id,
                admin_key,
                TopicUpdate::new().set_admin_key(new_admin_key),
            )
            .await?;
        Ok(ResultEnvelope::of(&receipt, new_admin_key))
    }

    pub async fn update_submit_key(
        &self,
        topic_id: TopicId,
        admin_key: &PrivateKey,
        new_submit_key: PublicKey,
    ) -> TopicResult<ResultEnvelope<PublicKey>> {
        let receipt = self
            .apply_update(
                "update_submit_key",
                topic_id,
                admin_key,
                TopicUpdate::new().set_submit_key(new_submit_key),
            )
            .await?;
        Ok(ResultEnvelope::of(&receipt, new_submit_key))
    }

    /// Expiration can only move forward; the ledger rejects reductions.
    pub async fn update_expiration_time(
        &self,
        topic_id: TopicId,
        admin_key: &PrivateKey,
        expiration_time: DateTime<Utc>,
    ) -> TopicResult<ResultEnvelope<DateTime<Utc>>> {
        let receipt = self
            .apply_update(
                "update_expiration_time",
                topic_id,
                admin_key,
                TopicUpdate::new().set_expiration_time(expiration_time),
            )
            .await?;
        Ok(ResultEnvelope::of(&receipt, expiration_time))
    }

    /// Set a new memo. A blank memo is rejected; use
    /// [`clear_topic_memo`](Self::clear_topic_memo) to remove it.
    pub async fn update_topic_memo(
        &self,
        topic_id: TopicId,
        admin_key: &PrivateKey,
        memo: &str,
    ) -> TopicResult<ResultEnvelope<String>> {
        if memo.trim().is_empty() {
            metrics::record_validation_failure("update_topic_memo");
            return Err(TopicError::validation(
                "update_topic_memo",
                "memo must not be blank, use clear_topic_memo to remove it",
            ));
        }
        let receipt = self
            .apply_update("update_topic_memo", topic_id, admin_key, TopicUpdate::new().set_memo(memo))
            .await?;
        Ok(ResultEnvelope::of(&receipt, memo.to_string()))
    }

    pub async fn update_auto_renew_account(
        &self,
        topic_id: TopicId,
        admin_key: &PrivateKey,
        account_id: AccountId,
    ) -> TopicResult<ResultEnvelope<AccountId>> {
        let receipt = self
            .apply_update(
                "update_auto_renew_account",
                topic_id,
                admin_key,
                TopicUpdate::new().set_auto_renew_account_id(account_id),
            )
            .await?;
        Ok(ResultEnvelope::of(&receipt, account_id))
    }

    pub async fn update_auto_renew_period(
        &self,
        topic_id: TopicId,
        admin_key: &PrivateKey,
        period: Duration,
    ) -> TopicResult<ResultEnvelope<Duration>> {
        let receipt = self
            .apply_update(
                "update_auto_renew_period",
                topic_id,
                admin_key,
                TopicUpdate::new().set_auto_renew_period(period),
            )
            .await?;
        Ok(ResultEnvelope::of(&receipt, period))
    }

    /// Remove the admin key. The topic can never be updated or deleted again.
    pub async fn clear_admin_key(&self, topic_id: TopicId, admin_key: &PrivateKey) -> TopicResult<ResultEnvelope<TopicId>> {
        let receipt = self
            .apply_update("clear_admin_key", topic_id, admin_key, TopicUpdate::new().clear_admin_key())
            .await?;
        Ok(ResultEnvelope::of(&receipt, topic_id))
    }

    /// Remove the submit key, opening the topic to any submitter.
    pub async fn clear_submit_key(&self, topic_id: TopicId, admin_key: &PrivateKey) -> TopicResult<ResultEnvelope<TopicId>> {
        let receipt = self
            .apply_update("clear_submit_key", topic_id, admin_key, TopicUpdate::new().clear_submit_key())
            .await?;
        Ok(ResultEnvelope::of(&receipt, topic_id))
    }

    pub async fn clear_topic_memo(&self, topic_id: TopicId, admin_key: &PrivateKey) -> TopicResult<ResultEnvelope<TopicId>> {
        let receipt = self
            .apply_update("clear_topic_memo", topic_id, admin_key, TopicUpdate::new().clear_memo())
            .await?;
        Ok(ResultEnvelope::of(&receipt, topic_id))
    }

    pub async fn clear_auto_renew_account_id(
        &self,
        topic_id: TopicId,
        admin_key: &PrivateKey,
    ) -> TopicResult<ResultEnvelope<TopicId>> {
        let receipt = self
            .apply_update(
                "clear_auto_renew_account_id",
                topic_id,
                admin_key,
                TopicUpdate::new().clear_auto_renew_account_id(),
            )
            .await?;
        Ok(ResultEnvelope::of(&receipt, topic_id))
    }

    /// Apply several field changes in one transaction.
    pub async fn update_topic(
        &self,
        topic_id: TopicId,
        admin_key: &PrivateKey,
        update: TopicUpdate,
    ) -> TopicResult<ResultEnvelope<TopicId>> {
        let receipt = self.apply_update("update_topic", topic_id, admin_key, update).await?;
        Ok(ResultEnvelope::of(&receipt, topic_id))
    }

    /// Submit a topic update, reporting metrics and errors under `operation`.
    async fn apply_update(
        &self,
        operation: &'static str,
        topic_id: TopicId,
        admin_key: &PrivateKey,
        update: TopicUpdate,
    ) -> TopicResult<TransactionReceipt> {
        if update.is_empty() {
            metrics::record_validation_failure(operation);
            return Err(TopicError::validation(operation, "update changes no field"));
        }
        self.execute(operation, builder::update_topic(topic_id, update), Some(admin_key))
            .await
    }

    /// Mark the topic deleted. Its messages stay readable.
    pub async fn delete_topic(&self, topic_id: TopicId, admin_key: &PrivateKey) -> TopicResult<ResultEnvelope<TopicId>> {
        let receipt = self
            .execute("delete_topic", builder::delete_topic(topic_id), Some(admin_key))
            .await?;
        tracing::info!(topic_id = %topic_id, "Topic deleted");
        Ok(ResultEnvelope::of(&receipt, topic_id))
    }

    /// Current topic descriptor, always fetched from the ledger.
    pub async fn get_topic_info(&self, topic_id: TopicId) -> TopicResult<TopicInfo> {
        self.client
            .topic_info(topic_id)
            .await
            .map_err(|e| TopicError::from_ledger("get_topic_info", e))
    }

    /// Submit a message, chunked by the resolved policy.
    ///
    /// Payloads over 1024 bytes, empty payloads and payloads needing more
    /// chunks than allowed fail with `Validation` without a network call.
    pub async fn submit_message(
        &self,
        topic_id: TopicId,
        message: &[u8],
        options: SubmitOptions,
    ) -> TopicResult<ResultEnvelope<MessageSubmitted>> {
        const OPERATION: &str = "submit_message";

        let policy = ChunkPolicy::resolve(options.chunk_size, options.max_chunks, self.settings.chunk_policy);
        let chunks = policy.check(message.len()).map_err(|e| {
            metrics::record_validation_failure(OPERATION);
            tracing::debug!(topic_id = %topic_id, len = message.len(), error = %e, "Message rejected");
            TopicError::chunking(OPERATION, e)
        })?;

        let receipt = self
            .execute(
                OPERATION,
                builder::submit_message(topic_id, message, policy),
                options.submit_key.as_ref(),
            )
            .await?;
        let sequence_number = receipt
            .topic_sequence_number
            .ok_or_else(|| TopicError::contract(OPERATION, "successful receipt carries no sequence number"))?;

        Ok(ResultEnvelope::of(
            &receipt,
            MessageSubmitted {
                topic_id,
                sequence_number,
                chunks: chunks as u32,
            },
        ))
    }

    /// Freeze, sign, submit and wait for the receipt of one transaction.
    ///
    /// Returns the receipt only when its status is `SUCCESS`.
    async fn execute(
        &self,
        operation: &'static str,
        body: TransactionBody,
        signer: Option<&PrivateKey>,
    ) -> TopicResult<TransactionReceipt> {
        let topic_id = body.topic_id();
        let mut transaction = self
            .client
            .freeze(body)
            .map_err(|e| TopicError::from_ledger(operation, e))?;
        if let Some(key) = signer {
            transaction.sign(key);
        }
        let transaction_id = transaction.transaction_id();

        tracing::debug!(
            operation,
            transaction_id = %transaction_id,
            topic_id = ?topic_id,
            signed = signer.is_some(),
            "Submitting transaction"
        );

        let started = Instant::now();
        let outcome = async {
            let pending = self.client.submit(transaction).await?;
            self.client.get_receipt(&pending).await
        }
        .await;
        metrics::record_receipt_wait(operation, started.elapsed());

        let error = match outcome {
            Ok(receipt) if receipt.status.is_success() => {
                metrics::record_transaction(operation, receipt.status.as_str());
                tracing::debug!(
                    operation,
                    transaction_id = %transaction_id,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Transaction succeeded"
                );
                return Ok(receipt);
            }
            Ok(receipt) => TopicError::TransactionFailed {
                operation,
                status: receipt.status,
            },
            Err(e) => TopicError::from_ledger(operation, e),
        };

        let label = match &error {
            TopicError::Timeout { .. } => "TIMEOUT",
            TopicError::Ledger {
                source: LedgerError::Transport(_),
                ..
            } => "TRANSPORT",
            other => other.status().map(|s| s.as_str()).unwrap_or("ERROR"),
        };
        metrics::record_transaction(operation, label);
        tracing::warn!(
            operation,
            transaction_id = %transaction_id,
            topic_id = ?topic_id,
            error = %error,
            "Transaction failed"
        );
        Err(error)
    }
}

impl std::fmt::Debug for TopicService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TopicService")
            .field("operator", &self.client.operator_account_id())
            .field("settings", &self.settings)
            .finish()
    }
}
