//! Shared utilities for integration tests.

use std::sync::Arc;
use std::time::Duration;

use topic_ledger::keys::{Operator, PrivateKey};
use topic_ledger::ledger::{AccountId, SimulatedLedger, SimulatedLedgerConfig};
use topic_ledger::topics::{ServiceSettings, TopicService};

#[allow(dead_code)]
pub const OPERATOR_ACCOUNT: AccountId = AccountId::new(0, 0, 2);

/// A topic service wired to its own simulated ledger.
pub struct Harness {
    pub service: TopicService,
    pub ledger: SimulatedLedger,
    pub operator_key: PrivateKey,
}

pub fn harness() -> Harness {
    harness_with(SimulatedLedgerConfig {
        consensus_delay: Duration::from_millis(1),
        ..Default::default()
    })
}

#[allow(dead_code)]
pub fn harness_with(config: SimulatedLedgerConfig) -> Harness {
    let operator_key = PrivateKey::generate();
    let ledger = SimulatedLedger::new(Operator::new(OPERATOR_ACCOUNT, operator_key.clone()), config);
    let service = TopicService::new(Arc::new(ledger.clone()), ServiceSettings::default());
    Harness {
        service,
        ledger,
        operator_key,
    }
}

/// Poll `f` until it returns true or `timeout` elapses.
#[allow(dead_code)]
pub async fn wait_until<F>(timeout: Duration, mut f: F) -> bool
where
    F: FnMut() -> bool,
{
    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        if f() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    f()
}
