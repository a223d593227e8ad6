//! Transaction construction subsystem.
//!
//! # Data Flow
//! ```text
//! mutation intent (create / update / clear / delete / submit)
//!     → builder.rs (sparse body, only supplied fields)
//!     → frozen.rs (transaction id fixed, body bytes fixed, signatures)
//!     → chunking.rs (message segmentation on submit, reassembly on read)
//! ```

pub mod builder;
pub mod chunking;
pub mod frozen;
pub mod types;

pub use builder::{TopicCreateOptions, TopicUpdate};
pub use chunking::{
    ChunkAssembler, ChunkError, ChunkInfo, ChunkPolicy, ChunkRecord, DEFAULT_CHUNK_SIZE, DEFAULT_MAX_CHUNKS,
    MAX_MESSAGE_BYTES,
};
pub use frozen::{FrozenTransaction, SignaturePair};
pub use types::{FieldUpdate, TransactionBody};
