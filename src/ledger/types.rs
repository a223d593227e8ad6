//! Ledger identifiers, statuses, receipts and error definitions.

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

use crate::keys::PublicKey;

/// Error returned when an entity id string is not `shard.realm.num`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid entity id '{0}': expected shard.realm.num")]
pub struct IdParseError(pub String);

fn parse_entity(s: &str) -> Result<(u64, u64, u64), IdParseError> {
    let mut parts = s.trim().split('.');
    let mut next = || {
        parts
            .next()
            .and_then(|p| p.parse::<u64>().ok())
            .ok_or_else(|| IdParseError(s.to_string()))
    };
    let shard = next()?;
    let realm = next()?;
    let num = next()?;
    if parts.next().is_some() {
        return Err(IdParseError(s.to_string()));
    }
    Ok((shard, realm, num))
}

/// Network-scoped account identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AccountId {
    pub shard: u64,
    pub realm: u64,
    pub num: u64,
}

impl AccountId {
    pub const fn new(shard: u64, realm: u64, num: u64) -> Self {
        Self { shard, realm, num }
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.shard, self.realm, self.num)
    }
}

impl FromStr for AccountId {
    type Err = IdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (shard, realm, num) = parse_entity(s)?;
        Ok(Self { shard, realm, num })
    }
}

/// Network-scoped topic identifier. Immutable once assigned by the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TopicId {
    pub shard: u64,
    pub realm: u64,
    pub num: u64,
}

impl TopicId {
    pub const fn new(shard: u64, realm: u64, num: u64) -> Self {
        Self { shard, realm, num }
    }
}

impl fmt::Display for TopicId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.shard, self.realm, self.num)
    }
}

impl FromStr for TopicId {
    type Err = IdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (shard, realm, num) = parse_entity(s)?;
        Ok(Self { shard, realm, num })
    }
}

macro_rules! string_serde {
    ($ty:ty) => {
        impl Serialize for $ty {
            fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.collect_str(self)
            }
        }

        impl<'de> Deserialize<'de> for $ty {
            fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let raw = String::deserialize(deserializer)?;
                raw.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

string_serde!(AccountId);
string_serde!(TopicId);
string_serde!(Status);

/// Transaction identifier: payer account plus valid-start timestamp.
///
/// Rendered as `0.0.1001@1700000000.000000042`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TransactionId {
    pub account_id: AccountId,
    pub valid_start: DateTime<Utc>,
}

impl TransactionId {
    pub fn new(account_id: AccountId, valid_start: DateTime<Utc>) -> Self {
        Self { account_id, valid_start }
    }

    /// Id of the `offset`-th follow-up transaction (chunk) of this one.
    pub fn advanced(&self, offset: u32) -> Self {
        Self {
            account_id: self.account_id,
            valid_start: self.valid_start + ChronoDuration::nanoseconds(i64::from(offset)),
        }
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}@{}.{:09}",
            self.account_id,
            self.valid_start.timestamp(),
            self.valid_start.timestamp_subsec_nanos()
        )
    }
}

impl Serialize for TransactionId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Ledger response codes relevant to topic operations.
///
/// Serialized as the ledger's own code string, the same text `Display` prints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    Success,
    InvalidSignature,
    Unauthorized,
    InvalidTopicId,
    TopicExpired,
    InvalidAutoRenewAccount,
    AutorenewDurationNotInRange,
    ExpirationReductionNotAllowed,
    MemoTooLong,
    MessageSizeTooLarge,
    InvalidChunkNumber,
    PayerAccountNotFound,
    DuplicateTransaction,
    InvalidTransactionBody,
}

/// Error returned when a string is not a known status code.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown status code '{0}'")]
pub struct UnknownStatus(pub String);

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Success => "SUCCESS",
            Status::InvalidSignature => "INVALID_SIGNATURE",
            Status::Unauthorized => "UNAUTHORIZED",
            Status::InvalidTopicId => "INVALID_TOPIC_ID",
            Status::TopicExpired => "TOPIC_EXPIRED",
            Status::InvalidAutoRenewAccount => "INVALID_AUTORENEW_ACCOUNT",
            Status::AutorenewDurationNotInRange => "AUTORENEW_DURATION_NOT_IN_RANGE",
            Status::ExpirationReductionNotAllowed => "EXPIRATION_REDUCTION_NOT_ALLOWED",
            Status::MemoTooLong => "MEMO_TOO_LONG",
            Status::MessageSizeTooLarge => "MESSAGE_SIZE_TOO_LARGE",
            Status::InvalidChunkNumber => "INVALID_CHUNK_NUMBER",
            Status::PayerAccountNotFound => "PAYER_ACCOUNT_NOT_FOUND",
            Status::DuplicateTransaction => "DUPLICATE_TRANSACTION",
            Status::InvalidTransactionBody => "INVALID_TRANSACTION_BODY",
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Status::Success)
    }

    pub const ALL: [Status; 14] = [
        Status::Success,
        Status::InvalidSignature,
        Status::Unauthorized,
        Status::InvalidTopicId,
        Status::TopicExpired,
        Status::InvalidAutoRenewAccount,
        Status::AutorenewDurationNotInRange,
        Status::ExpirationReductionNotAllowed,
        Status::MemoTooLong,
        Status::MessageSizeTooLarge,
        Status::InvalidChunkNumber,
        Status::PayerAccountNotFound,
        Status::DuplicateTransaction,
        Status::InvalidTransactionBody,
    ];
}

impl FromStr for Status {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Status::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| UnknownStatus(s.to_string()))
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Settlement receipt for one submitted transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionReceipt {
    pub status: Status,
    pub transaction_id: Option<TransactionId>,
    /// Set on a successful topic create.
    pub topic_id: Option<TopicId>,
    /// Set on a successful message submit (sequence number of the last chunk).
    pub topic_sequence_number: Option<u64>,
}

impl TransactionReceipt {
    pub fn new(status: Status, transaction_id: Option<TransactionId>) -> Self {
        Self {
            status,
            transaction_id,
            topic_id: None,
            topic_sequence_number: None,
        }
    }
}

/// Point-in-time view of a topic as held by the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TopicInfo {
    pub topic_id: TopicId,
    pub memo: String,
    pub admin_key: Option<PublicKey>,
    pub submit_key: Option<PublicKey>,
    pub auto_renew_account_id: Option<AccountId>,
    #[serde(with = "duration_secs")]
    pub auto_renew_period: Duration,
    pub expiration_time: DateTime<Utc>,
    pub sequence_number: u64,
}

/// A (reassembled) message read back from a topic stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TopicMessage {
    pub topic_id: TopicId,
    pub consensus_timestamp: DateTime<Utc>,
    pub sequence_number: u64,
    pub contents: Vec<u8>,
    /// Number of ledger chunks the message was carried in.
    pub chunks: u32,
}

/// Subscription filter passed to the ledger client.
///
/// `start_time` is inclusive, `end_time` exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageQuery {
    pub topic_id: TopicId,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
}

impl MessageQuery {
    pub fn new(topic_id: TopicId) -> Self {
        Self {
            topic_id,
            start_time: None,
            end_time: None,
        }
    }

    pub fn matches(&self, timestamp: DateTime<Utc>) -> bool {
        self.start_time.map_or(true, |start| timestamp >= start)
            && self.end_time.map_or(true, |end| timestamp < end)
    }
}

pub(crate) mod duration_secs {
    use serde::Serializer;
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_secs())
    }
}

/// Errors reported by a ledger client.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LedgerError {
    /// The network rejected the transaction before execution.
    #[error("precheck failed with status {0}")]
    Precheck(Status),

    /// Receipt obtained, but its status is a failure.
    #[error("transaction {transaction_id} failed with status {status}")]
    ReceiptStatus {
        transaction_id: TransactionId,
        status: Status,
    },

    /// No acknowledgement or receipt within the configured bound.
    #[error("{stage} timed out after {elapsed:?}")]
    Timeout {
        stage: &'static str,
        elapsed: Duration,
    },

    /// Receipt requested for a transaction the client never submitted.
    #[error("unknown transaction {0}")]
    UnknownTransaction(TransactionId),

    /// The transaction body could not be encoded for signing.
    #[error("encoding error: {0}")]
    Encoding(String),

    /// Connection-level failure.
    #[error("transport error: {0}")]
    Transport(String),

    /// The message stream could not be opened or broke.
    #[error("subscription error: {0}")]
    Subscription(String),
}

/// Result type for ledger client calls.
pub type LedgerResult<T> = Result<T, LedgerError>;

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_entity_id_parsing() {
        let id: TopicId = "0.0.4821".parse().unwrap();
        assert_eq!(id, TopicId::new(0, 0, 4821));
        assert_eq!(id.to_string(), "0.0.4821");

        assert!("0.0".parse::<AccountId>().is_err());
        assert!("0.0.1.2".parse::<AccountId>().is_err());
        assert!("a.b.c".parse::<TopicId>().is_err());
        assert!(" 1.2.3 ".parse::<AccountId>().is_ok());
    }

    #[test]
    fn test_transaction_id_display() {
        let start = Utc.timestamp_opt(1_700_000_000, 42).unwrap();
        let tx_id = TransactionId::new(AccountId::new(0, 0, 1001), start);
        assert_eq!(tx_id.to_string(), "0.0.1001@1700000000.000000042");
        assert_eq!(tx_id.advanced(3).to_string(), "0.0.1001@1700000000.000000045");
    }

    #[test]
    fn test_status_display_matches_serde() {
        for status in Status::ALL {
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json, format!("\"{}\"", status), "{:?}", status);
            assert_eq!(serde_json::from_str::<Status>(&json).unwrap(), status);
            assert_eq!(status.to_string().parse::<Status>(), Ok(status));
        }
        assert_eq!(
            serde_json::to_string(&Status::InvalidAutoRenewAccount).unwrap(),
            "\"INVALID_AUTORENEW_ACCOUNT\""
        );
        assert!("INVALID_AUTO_RENEW_ACCOUNT".parse::<Status>().is_err());
        assert!(Status::Success.is_success());
        assert!(!Status::Unauthorized.is_success());
    }

    #[test]
    fn test_query_window() {
        let t = |s| Utc.timestamp_opt(s, 0).unwrap();
        let mut query = MessageQuery::new(TopicId::new(0, 0, 1));
        assert!(query.matches(t(5)));

        query.start_time = Some(t(10));
        query.end_time = Some(t(20));
        assert!(!query.matches(t(9)));
        assert!(query.matches(t(10)));
        assert!(query.matches(t(19)));
        assert!(!query.matches(t(20)));
    }
}
