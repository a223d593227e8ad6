//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from TOML. Every section
//! has defaults so a minimal file only needs the operator account.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::transaction::{ChunkPolicy, DEFAULT_CHUNK_SIZE, DEFAULT_MAX_CHUNKS};

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct TopicLedgerConfig {
    /// Ledger network selection and simulated-network behaviour.
    pub network: NetworkConfig,

    /// Operator account paying for transactions.
    pub operator: OperatorConfig,

    /// Submit and receipt wait bounds.
    pub timeouts: TimeoutConfig,

    /// Message chunking defaults.
    pub messages: MessageConfig,

    /// Topic creation defaults.
    pub topics: TopicConfig,

    /// Logging and metrics.
    pub observability: ObservabilityConfig,
}

/// Ledger network configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Network name (testnet, previewnet, mainnet, local).
    pub name: String,

    /// Shard new entities are created in.
    pub shard: u64,

    /// Realm new entities are created in.
    pub realm: u64,

    /// Simulated time between submission and consensus, in milliseconds.
    pub consensus_delay_ms: u64,

    /// Simulated time before a submission is acknowledged, in milliseconds.
    pub ack_delay_ms: u64,

    /// Report failure statuses from `get_receipt` as errors instead of
    /// returning the receipt.
    pub validate_receipt_status: bool,

    /// How long the simulated network keeps a receipt queryable, in seconds.
    pub receipt_retention_secs: u64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            name: "testnet".to_string(),
            shard: 0,
            realm: 0,
            consensus_delay_ms: 50,
            ack_delay_ms: 0,
            validate_receipt_status: true,
            receipt_retention_secs: 180,
        }
    }
}

/// Operator identity.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct OperatorConfig {
    /// Operator account id (`shard.realm.num`).
    pub account_id: String,

    /// Operator private key. When absent, `TOPIC_LEDGER_OPERATOR_KEY` is read.
    #[serde(skip_serializing)]
    pub private_key: Option<String>,
}

impl Default for OperatorConfig {
    fn default() -> Self {
        Self {
            account_id: "0.0.2".to_string(),
            private_key: None,
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Bound on network acknowledgement of a submission, in seconds.
    pub submit_secs: u64,

    /// Bound on waiting for a receipt, in seconds.
    pub receipt_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            submit_secs: 10,
            receipt_secs: 30,
        }
    }
}

impl TimeoutConfig {
    pub fn submit(&self) -> Duration {
        Duration::from_secs(self.submit_secs)
    }

    pub fn receipt(&self) -> Duration {
        Duration::from_secs(self.receipt_secs)
    }
}

/// Message chunking defaults.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct MessageConfig {
    /// Bytes per chunk.
    pub chunk_size: usize,

    /// Maximum chunks per message.
    pub max_chunks: usize,
}

impl Default for MessageConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            max_chunks: DEFAULT_MAX_CHUNKS,
        }
    }
}

impl MessageConfig {
    pub fn chunk_policy(&self) -> ChunkPolicy {
        ChunkPolicy {
            chunk_size: self.chunk_size,
            max_chunks: self.max_chunks,
        }
    }
}

/// Topic creation defaults.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TopicConfig {
    /// Auto-renew period applied by `create_topic()`, in days (30-92).
    pub auto_renew_days: u64,
}

impl Default for TopicConfig {
    fn default() -> Self {
        Self { auto_renew_days: 92 }
    }
}

impl TopicConfig {
    pub fn auto_renew_period(&self) -> Duration {
        Duration::from_secs(self.auto_renew_days * 24 * 3600)
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error) or a full filter directive.
    pub log_level: String,

    /// Log output format: "pretty" or "json".
    pub log_format: String,

    /// Enable the Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9464".to_string(),
        }
    }
}
