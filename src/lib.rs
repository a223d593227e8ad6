//! Topic lifecycle and message orchestration over a ledger client.

pub mod config;
pub mod keys;
pub mod ledger;
pub mod observability;
pub mod response;
pub mod topics;
pub mod transaction;

pub use config::schema::TopicLedgerConfig;
pub use ledger::{LedgerClient, SimulatedLedger};
pub use response::ResultEnvelope;
pub use topics::{TopicError, TopicResult, TopicService};
