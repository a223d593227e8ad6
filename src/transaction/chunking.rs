//! Message chunking: segmentation on submit, reassembly on read.
//!
//! A message is carried in `ceil(len / chunk_size)` linked transactions. Every
//! chunk records the initial transaction id plus its 1-based position, and
//! chunk `n` is submitted under the initial id advanced by `n - 1` nanoseconds.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use thiserror::Error;

use crate::ledger::{TopicId, TopicMessage, TransactionId};

/// Largest message payload accepted for submission, in bytes.
pub const MAX_MESSAGE_BYTES: usize = 1024;

/// Default bytes per chunk.
pub const DEFAULT_CHUNK_SIZE: usize = 1024;

/// Default maximum number of chunks per message.
pub const DEFAULT_MAX_CHUNKS: usize = 20;

/// Chunking parameters applied to one submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ChunkPolicy {
    pub chunk_size: usize,
    pub max_chunks: usize,
}

impl Default for ChunkPolicy {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            max_chunks: DEFAULT_MAX_CHUNKS,
        }
    }
}

/// Reasons a payload cannot be submitted under a policy.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChunkError {
    #[error("message must not be empty")]
    Empty,

    #[error("message of {len} bytes exceeds the {max} byte limit")]
    TooLarge { len: usize, max: usize },

    #[error("chunk size must be greater than zero")]
    ZeroChunkSize,

    #[error("max chunks must be greater than zero")]
    ZeroMaxChunks,

    #[error("message of {len} bytes needs {needed} chunks, more than the allowed {max}")]
    TooManyChunks { len: usize, needed: usize, max: usize },
}

impl ChunkPolicy {
    /// Caller overrides win; anything not supplied falls back to `defaults`.
    pub fn resolve(chunk_size: Option<usize>, max_chunks: Option<usize>, defaults: ChunkPolicy) -> Self {
        Self {
            chunk_size: chunk_size.unwrap_or(defaults.chunk_size),
            max_chunks: max_chunks.unwrap_or(defaults.max_chunks),
        }
    }

    /// Check a payload against the size limit and this policy.
    ///
    /// Returns the number of chunks the payload will be carried in.
    pub fn check(&self, len: usize) -> Result<usize, ChunkError> {
        if len == 0 {
            return Err(ChunkError::Empty);
        }
        if len > MAX_MESSAGE_BYTES {
            return Err(ChunkError::TooLarge {
                len,
                max: MAX_MESSAGE_BYTES,
            });
        }
        if self.chunk_size == 0 {
            return Err(ChunkError::ZeroChunkSize);
        }
        if self.max_chunks == 0 {
            return Err(ChunkError::ZeroMaxChunks);
        }
        let needed = len.div_ceil(self.chunk_size);
        if needed > self.max_chunks {
            return Err(ChunkError::TooManyChunks {
                len,
                needed,
                max: self.max_chunks,
            });
        }
        Ok(needed)
    }
}

/// Position of one chunk within its message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ChunkInfo {
    pub initial_transaction_id: TransactionId,
    pub number: u32,
    pub total: u32,
}

/// One outbound chunk, ready to be submitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub transaction_id: TransactionId,
    pub info: ChunkInfo,
    pub contents: Vec<u8>,
}

/// Split `payload` into chunks of at most `chunk_size` bytes.
pub fn segment(initial: TransactionId, payload: &[u8], chunk_size: usize) -> Vec<Chunk> {
    let size = chunk_size.max(1);
    let total = payload.len().div_ceil(size).max(1) as u32;
    if payload.is_empty() {
        return vec![Chunk {
            transaction_id: initial,
            info: ChunkInfo {
                initial_transaction_id: initial,
                number: 1,
                total,
            },
            contents: Vec::new(),
        }];
    }
    payload
        .chunks(size)
        .enumerate()
        .map(|(index, part)| Chunk {
            transaction_id: initial.advanced(index as u32),
            info: ChunkInfo {
                initial_transaction_id: initial,
                number: index as u32 + 1,
                total,
            },
            contents: part.to_vec(),
        })
        .collect()
}

/// A chunk as recorded on a topic, with its consensus data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkRecord {
    pub topic_id: TopicId,
    pub sequence_number: u64,
    pub consensus_timestamp: DateTime<Utc>,
    pub info: ChunkInfo,
    pub contents: Vec<u8>,
}

#[derive(Debug, Default)]
struct PartialMessage {
    parts: Vec<Option<Vec<u8>>>,
    received: u32,
}

/// Reassembles chunk records into whole messages.
///
/// A message is emitted once all of its chunks arrived, stamped with the
/// sequence number and consensus timestamp of the chunk that completed it.
#[derive(Debug, Default)]
pub struct ChunkAssembler {
    pending: HashMap<TransactionId, PartialMessage>,
}

impl ChunkAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record: ChunkRecord) -> Option<TopicMessage> {
        if record.info.total <= 1 {
            return Some(TopicMessage {
                topic_id: record.topic_id,
                consensus_timestamp: record.consensus_timestamp,
                sequence_number: record.sequence_number,
                contents: record.contents,
                chunks: 1,
            });
        }

        let key = record.info.initial_transaction_id;
        let total = record.info.total;
        let index = record.info.number.checked_sub(1)? as usize;
        if index >= total as usize {
            tracing::warn!(
                topic_id = %record.topic_id,
                chunk = record.info.number,
                total,
                "Dropping chunk with out-of-range number"
            );
            return None;
        }

        let partial = self.pending.entry(key).or_insert_with(|| PartialMessage {
            parts: vec![None; total as usize],
            received: 0,
        });
        if partial.parts[index].is_none() {
            partial.parts[index] = Some(record.contents);
            partial.received += 1;
        }
        if partial.received < total {
            return None;
        }

        let partial = self.pending.remove(&key)?;
        let contents = partial.parts.into_iter().flatten().flatten().collect();
        Some(TopicMessage {
            topic_id: record.topic_id,
            consensus_timestamp: record.consensus_timestamp,
            sequence_number: record.sequence_number,
            contents,
            chunks: total,
        })
    }

    /// Number of messages still waiting for chunks.
    pub fn pending(&self) -> usize {
        self.pending.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::AccountId;
    use chrono::TimeZone;

    fn initial_id() -> TransactionId {
        TransactionId::new(AccountId::new(0, 0, 2), Utc.timestamp_opt(1_700_000_000, 0).unwrap())
    }

    #[test]
    fn test_policy_limits() {
        let policy = ChunkPolicy::default();
        assert_eq!(policy.check(1024), Ok(1));
        assert_eq!(
            policy.check(1025),
            Err(ChunkError::TooLarge { len: 1025, max: 1024 })
        );
        assert_eq!(policy.check(0), Err(ChunkError::Empty));

        let small = ChunkPolicy { chunk_size: 100, max_chunks: 5 };
        assert_eq!(small.check(500), Ok(5));
        assert_eq!(
            small.check(501),
            Err(ChunkError::TooManyChunks { len: 501, needed: 6, max: 5 })
        );
        assert_eq!(
            ChunkPolicy { chunk_size: 0, max_chunks: 5 }.check(10),
            Err(ChunkError::ZeroChunkSize)
        );
    }

    #[test]
    fn test_resolve_overrides() {
        let defaults = ChunkPolicy::default();
        let policy = ChunkPolicy::resolve(Some(256), None, defaults);
        assert_eq!(policy.chunk_size, 256);
        assert_eq!(policy.max_chunks, DEFAULT_MAX_CHUNKS);
    }

    #[test]
    fn test_segment_links_chunks() {
        let payload = vec![7u8; 250];
        let chunks = segment(initial_id(), &payload, 100);
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[2].contents.len(), 50);
        assert!(chunks.iter().all(|c| c.info.total == 3));
        assert_eq!(chunks[0].transaction_id, initial_id());
        assert_eq!(chunks[2].transaction_id, initial_id().advanced(2));
        assert_eq!(chunks[1].info.number, 2);
    }

    #[test]
    fn test_assembler_reorders_and_completes() {
        let payload: Vec<u8> = (0..=255u8).collect();
        let chunks = segment(initial_id(), &payload, 100);
        let mut assembler = ChunkAssembler::new();

        let record = |chunk: &Chunk, seq: u64| ChunkRecord {
            topic_id: TopicId::new(0, 0, 5),
            sequence_number: seq,
            consensus_timestamp: Utc.timestamp_opt(1_700_000_100 + seq as i64, 0).unwrap(),
            info: chunk.info,
            contents: chunk.contents.clone(),
        };

        assert!(assembler.push(record(&chunks[1], 1)).is_none());
        assert!(assembler.push(record(&chunks[0], 2)).is_none());
        assert_eq!(assembler.pending(), 1);

        let message = assembler.push(record(&chunks[2], 3)).unwrap();
        assert_eq!(message.contents, payload);
        assert_eq!(message.sequence_number, 3);
        assert_eq!(message.chunks, 3);
        assert_eq!(assembler.pending(), 0);
    }
}
