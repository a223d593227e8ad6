//! Topic orchestration subsystem.
//!
//! # Data Flow
//! ```text
//! caller
//!     → service.rs (create / update / clear / delete / submit / info)
//!     → subscription.rs (windowed message delivery to a handler)
//!     → error.rs (Validation, Precheck, Timeout, TransactionFailed, ...)
//! ```

pub mod error;
pub mod service;
pub mod subscription;

pub use error::{TopicError, TopicResult};
pub use service::{MessageSubmitted, ServiceSettings, SubmitOptions, TopicService};
pub use subscription::{message_query, SubscriptionHandle};
