//! Key resolution and operator identity.
//!
//! # Data Flow
//! ```text
//! key strings (config, environment, caller input)
//!     → resolver.rs (hex / DER decoding)
//!     → key.rs (PrivateKey / PublicKey handles, signing)
//!     → operator.rs (payer account + implicit signer)
//! ```

pub mod key;
pub mod operator;
pub mod resolver;

pub use key::{PrivateKey, PublicKey, Signature};
pub use operator::{Operator, OPERATOR_KEY_ENV_VAR};
pub use resolver::{Ed25519KeyResolver, KeyError, KeyResolver, KeyResult};
