//! Canonical transaction bodies for topic operations.
//!
//! Only fields the caller supplied are populated. Update bodies carry a
//! per-field [`FieldUpdate`] so "leave as is" and "clear" stay distinct all the
//! way to the ledger; `Keep` fields are not serialized at all.

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use std::time::Duration;

use crate::keys::PublicKey;
use crate::ledger::{AccountId, TopicId};
use crate::transaction::chunking::ChunkPolicy;

/// Tri-state change for one clearable topic field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldUpdate<T> {
    /// Leave the ledger's current value untouched.
    Keep,
    /// Replace the current value.
    Set(T),
    /// Remove the current value.
    Clear,
}

impl<T> Default for FieldUpdate<T> {
    fn default() -> Self {
        FieldUpdate::Keep
    }
}

impl<T> FieldUpdate<T> {
    pub fn is_keep(&self) -> bool {
        matches!(self, FieldUpdate::Keep)
    }

    /// Apply this change to a stored value.
    pub fn apply(self, current: Option<T>) -> Option<T> {
        match self {
            FieldUpdate::Keep => current,
            FieldUpdate::Set(value) => Some(value),
            FieldUpdate::Clear => None,
        }
    }

    pub fn as_ref(&self) -> FieldUpdate<&T> {
        match self {
            FieldUpdate::Keep => FieldUpdate::Keep,
            FieldUpdate::Set(value) => FieldUpdate::Set(value),
            FieldUpdate::Clear => FieldUpdate::Clear,
        }
    }
}

/// Body of a topic create transaction.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct TopicCreateBody {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub admin_key: Option<PublicKey>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submit_key: Option<PublicKey>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memo: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_renew_account_id: Option<AccountId>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        serialize_with = "serialize_opt_secs"
    )]
    pub auto_renew_period: Option<Duration>,
}

/// Body of a topic update transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TopicUpdateBody {
    pub topic_id: TopicId,
    #[serde(skip_serializing_if = "FieldUpdate::is_keep")]
    pub admin_key: FieldUpdate<PublicKey>,
    #[serde(skip_serializing_if = "FieldUpdate::is_keep")]
    pub submit_key: FieldUpdate<PublicKey>,
    #[serde(skip_serializing_if = "FieldUpdate::is_keep")]
    pub memo: FieldUpdate<String>,
    #[serde(skip_serializing_if = "FieldUpdate::is_keep")]
    pub auto_renew_account_id: FieldUpdate<AccountId>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        serialize_with = "serialize_opt_secs"
    )]
    pub auto_renew_period: Option<Duration>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiration_time: Option<DateTime<Utc>>,
}

/// Body of a topic delete transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TopicDeleteBody {
    pub topic_id: TopicId,
}

/// Body of a message submit transaction, before segmentation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MessageSubmitBody {
    pub topic_id: TopicId,
    #[serde(serialize_with = "serialize_hex")]
    pub message: Vec<u8>,
    pub chunking: ChunkPolicy,
}

/// Any topic transaction the builder can produce.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TransactionBody {
    TopicCreate(TopicCreateBody),
    TopicUpdate(TopicUpdateBody),
    TopicDelete(TopicDeleteBody),
    MessageSubmit(MessageSubmitBody),
}

impl TransactionBody {
    /// Operation name used in logs, metrics and errors.
    pub fn operation(&self) -> &'static str {
        match self {
            TransactionBody::TopicCreate(_) => "create_topic",
            TransactionBody::TopicUpdate(_) => "update_topic",
            TransactionBody::TopicDelete(_) => "delete_topic",
            TransactionBody::MessageSubmit(_) => "submit_message",
        }
    }

    pub fn topic_id(&self) -> Option<TopicId> {
        match self {
            TransactionBody::TopicCreate(_) => None,
            TransactionBody::TopicUpdate(body) => Some(body.topic_id),
            TransactionBody::TopicDelete(body) => Some(body.topic_id),
            TransactionBody::MessageSubmit(body) => Some(body.topic_id),
        }
    }
}

fn serialize_opt_secs<S: Serializer>(value: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error> {
    match value {
        Some(duration) => serializer.serialize_some(&duration.as_secs()),
        None => serializer.serialize_none(),
    }
}

fn serialize_hex<S: Serializer>(value: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&hex::encode(value))
}
