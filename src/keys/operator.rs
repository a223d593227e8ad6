//! Operator identity: the account that pays for and implicitly signs every
//! transaction.
//!
//! The private key comes from config or, when left blank there, from the
//! `TOPIC_LEDGER_OPERATOR_KEY` environment variable. It is never logged.

use crate::config::schema::OperatorConfig;
use crate::keys::key::{PrivateKey, PublicKey};
use crate::keys::resolver::{KeyError, KeyResolver, KeyResult};
use crate::ledger::AccountId;

/// Environment variable consulted when the config carries no operator key.
pub const OPERATOR_KEY_ENV_VAR: &str = "TOPIC_LEDGER_OPERATOR_KEY";

/// Operator account and its signing key.
#[derive(Debug, Clone)]
pub struct Operator {
    account_id: AccountId,
    key: PrivateKey,
}

impl Operator {
    pub fn new(account_id: AccountId, key: PrivateKey) -> Self {
        Self { account_id, key }
    }

    /// Build the operator from config, falling back to the environment for the key.
    pub fn from_config(config: &OperatorConfig, resolver: &dyn KeyResolver) -> KeyResult<Self> {
        let account_id: AccountId = config
            .account_id
            .parse()
            .map_err(|e: crate::ledger::IdParseError| KeyError::InvalidAccount(e.to_string()))?;

        let encoded = match config.private_key.as_deref().map(str::trim) {
            Some(key) if !key.is_empty() => key.to_string(),
            _ => std::env::var(OPERATOR_KEY_ENV_VAR)
                .map_err(|_| KeyError::MissingOperatorKey(OPERATOR_KEY_ENV_VAR))?,
        };

        let key = resolver.private_key(&encoded)?;

        tracing::info!(
            account_id = %account_id,
            public_key = %key.public_key(),
            "Operator initialized"
        );

        Ok(Self { account_id, key })
    }

    pub fn account_id(&self) -> AccountId {
        self.account_id
    }

    pub fn key(&self) -> &PrivateKey {
        &self.key
    }

    pub fn public_key(&self) -> PublicKey {
        self.key.public_key()
    }
}
