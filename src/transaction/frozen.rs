//! Frozen transactions and signing.
//!
//! Freezing fixes the transaction id and the canonical body bytes. Signatures
//! are taken over those bytes, so only a frozen transaction can be signed and
//! nothing about it can change afterwards.

use serde::Serialize;

use crate::keys::{PrivateKey, PublicKey, Signature};
use crate::ledger::TransactionId;
use crate::transaction::types::TransactionBody;

/// Public key and the signature it produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignaturePair {
    pub public_key: PublicKey,
    pub signature: Signature,
}

#[derive(Serialize)]
struct SignedPayload<'a> {
    transaction_id: &'a TransactionId,
    body: &'a TransactionBody,
}

/// A transaction whose contents can no longer change.
#[derive(Debug, Clone)]
pub struct FrozenTransaction {
    transaction_id: TransactionId,
    body: TransactionBody,
    body_bytes: Vec<u8>,
    signatures: Vec<SignaturePair>,
}

impl FrozenTransaction {
    /// Freeze `body` under `transaction_id`.
    pub fn freeze(transaction_id: TransactionId, body: TransactionBody) -> Result<Self, serde_json::Error> {
        let body_bytes = serde_json::to_vec(&SignedPayload {
            transaction_id: &transaction_id,
            body: &body,
        })?;
        Ok(Self {
            transaction_id,
            body,
            body_bytes,
            signatures: Vec::new(),
        })
    }

    /// Attach a signature. Signing twice with the same key is a no-op.
    pub fn sign(&mut self, key: &PrivateKey) -> &mut Self {
        let public_key = key.public_key();
        if !self.signatures.iter().any(|pair| pair.public_key == public_key) {
            let signature = key.sign(&self.body_bytes);
            self.signatures.push(SignaturePair { public_key, signature });
        }
        self
    }

    /// True when `key` produced a valid signature over this transaction.
    pub fn is_signed_by(&self, key: &PublicKey) -> bool {
        self.signatures
            .iter()
            .any(|pair| pair.public_key == *key && key.verify(&self.body_bytes, &pair.signature))
    }

    pub fn transaction_id(&self) -> TransactionId {
        self.transaction_id
    }

    pub fn body(&self) -> &TransactionBody {
        &self.body
    }

    pub fn body_bytes(&self) -> &[u8] {
        &self.body_bytes
    }

    pub fn signatures(&self) -> &[SignaturePair] {
        &self.signatures
    }
}
