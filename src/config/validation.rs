//! Configuration validation.
//!
//! Semantic checks only (serde handles syntax). All problems are reported,
//! not just the first.

use std::fmt;
use std::net::SocketAddr;

use crate::config::schema::TopicLedgerConfig;
use crate::ledger::AccountId;
use crate::transaction::MAX_MESSAGE_BYTES;

const KNOWN_NETWORKS: &[&str] = &["testnet", "previewnet", "mainnet", "local"];
const KNOWN_LOG_FORMATS: &[&str] = &["pretty", "json"];

/// One semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate a parsed configuration.
pub fn validate_config(config: &TopicLedgerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if !KNOWN_NETWORKS.contains(&config.network.name.as_str()) {
        errors.push(ValidationError::new(
            "network.name",
            format!("unknown network '{}'", config.network.name),
        ));
    }

    if config.operator.account_id.parse::<AccountId>().is_err() {
        errors.push(ValidationError::new(
            "operator.account_id",
            format!("'{}' is not shard.realm.num", config.operator.account_id),
        ));
    }

    if config.network.receipt_retention_secs == 0 {
        errors.push(ValidationError::new(
            "network.receipt_retention_secs",
            "must be greater than zero",
        ));
    }

    if config.timeouts.submit_secs == 0 {
        errors.push(ValidationError::new("timeouts.submit_secs", "must be greater than zero"));
    }
    if config.timeouts.receipt_secs == 0 {
        errors.push(ValidationError::new("timeouts.receipt_secs", "must be greater than zero"));
    }

    if config.messages.chunk_size == 0 || config.messages.chunk_size > MAX_MESSAGE_BYTES {
        errors.push(ValidationError::new(
            "messages.chunk_size",
            format!("must be between 1 and {}", MAX_MESSAGE_BYTES),
        ));
    }
    if config.messages.max_chunks == 0 {
        errors.push(ValidationError::new("messages.max_chunks", "must be greater than zero"));
    }

    if !(30..=92).contains(&config.topics.auto_renew_days) {
        errors.push(ValidationError::new("topics.auto_renew_days", "must be between 30 and 92"));
    }

    if !KNOWN_LOG_FORMATS.contains(&config.observability.log_format.as_str()) {
        errors.push(ValidationError::new(
            "observability.log_format",
            format!("unknown format '{}'", config.observability.log_format),
        ));
    }
    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("'{}' is not a socket address", config.observability.metrics_address),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
