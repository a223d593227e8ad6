//! Long-lived message subscriptions.
//!
//! A subscription runs as its own task, pulling reassembled messages from the
//! ledger stream and handing each one to the caller's handler in sequence
//! order. It ends when the handle is cancelled or dropped, when the stream
//! reaches the end of the window, or when the stream fails.

use chrono::{DateTime, Utc};
use futures_util::StreamExt;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::ledger::{LedgerError, MessageQuery, TopicId, TopicMessage};
use crate::observability::metrics;
use crate::topics::error::{TopicError, TopicResult};
use crate::topics::service::TopicService;

const OPERATION: &str = "subscribe_messages";

/// Build the ledger query for a subscription window.
///
/// Time filters only apply when an end time is given. A start time on its
/// own is ignored and the whole topic history is streamed.
pub fn message_query(topic_id: TopicId, start_time: Option<DateTime<Utc>>, end_time: Option<DateTime<Utc>>) -> MessageQuery {
    let mut query = MessageQuery::new(topic_id);
    if end_time.is_some() {
        query.start_time = start_time;
        query.end_time = end_time;
    }
    query
}

/// Handle to a running subscription.
///
/// Dropping the handle cancels the subscription without waiting for it.
#[derive(Debug)]
pub struct SubscriptionHandle {
    id: Uuid,
    topic_id: TopicId,
    cancel: Option<oneshot::Sender<()>>,
    task: JoinHandle<TopicResult<u64>>,
}

impl SubscriptionHandle {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn topic_id(&self) -> TopicId {
        self.topic_id
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Stop the subscription. Once this returns the handler is never called
    /// again. Returns the number of messages delivered.
    pub async fn cancel(mut self) -> TopicResult<u64> {
        if let Some(cancel) = self.cancel.take() {
            // The task may already have finished on its own.
            let _ = cancel.send(());
        }
        self.wait().await
    }

    /// Wait for the subscription to end on its own (end of window or error).
    pub async fn join(mut self) -> TopicResult<u64> {
        self.wait().await
    }

    async fn wait(&mut self) -> TopicResult<u64> {
        match (&mut self.task).await {
            Ok(result) => result,
            Err(e) => Err(TopicError::Ledger {
                operation: OPERATION,
                source: LedgerError::Subscription(format!("subscription task failed: {}", e)),
            }),
        }
    }
}

impl TopicService {
    /// Deliver messages of `topic_id` to `handler`, one call per message in
    /// sequence order.
    ///
    /// With an end time, only messages with `start_time <= timestamp < end_time`
    /// are delivered and the subscription ends at `end_time`. Without one, no
    /// time filter applies (a lone start time is ignored) and the subscription
    /// runs until cancelled.
    pub async fn subscribe_messages<F>(
        &self,
        topic_id: TopicId,
        start_time: Option<DateTime<Utc>>,
        end_time: Option<DateTime<Utc>>,
        mut handler: F,
    ) -> TopicResult<SubscriptionHandle>
    where
        F: FnMut(TopicMessage) + Send + 'static,
    {
        if let (Some(start), Some(end)) = (start_time, end_time) {
            if start >= end {
                metrics::record_validation_failure(OPERATION);
                return Err(TopicError::validation(OPERATION, "start time must be before end time"));
            }
        }

        let query = message_query(topic_id, start_time, end_time);
        let mut stream = self
            .client
            .subscribe(query)
            .await
            .map_err(|e| TopicError::from_ledger(OPERATION, e))?;

        let id = Uuid::new_v4();
        let (cancel_tx, mut cancel_rx) = oneshot::channel::<()>();

        tracing::info!(
            subscription_id = %id,
            topic_id = %topic_id,
            start_time = ?query.start_time,
            end_time = ?query.end_time,
            "Subscription started"
        );
        metrics::record_subscription_started();

        let task = tokio::spawn(async move {
            let mut delivered = 0u64;
            let result = loop {
                tokio::select! {
                    biased;
                    _ = &mut cancel_rx => break Ok(()),
                    item = stream.next() => match item {
                        Some(Ok(message)) => {
                            handler(message);
                            delivered += 1;
                            metrics::record_message_delivered();
                        }
                        Some(Err(e)) => break Err(TopicError::from_ledger(OPERATION, e)),
                        None => break Ok(()),
                    },
                }
            };
            drop(stream);

            metrics::record_subscription_ended();
            match &result {
                Ok(()) => tracing::info!(subscription_id = %id, delivered, "Subscription ended"),
                Err(e) => tracing::warn!(subscription_id = %id, delivered, error = %e, "Subscription failed"),
            }
            result.map(|()| delivered)
        });

        Ok(SubscriptionHandle {
            id,
            topic_id,
            cancel: Some(cancel_tx),
            task,
        })
    }
}
