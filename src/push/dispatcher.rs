use crate::config::DEFAULT_TIMEOUT;
use crate::ports::{self, DeliveryError, with_deadline};
use crate::types::push::{NotificationEnvelope, NotificationPayload, Subscription};

use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{info, warn};

/// Outcome of a broadcast. Counts only; which recipients failed is logged,
/// not returned, apart from endpoints the push service reported as gone.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BroadcastReport {
    pub attempted: usize,
    pub delivered: usize,
    pub failed: usize,
    #[serde(skip)]
    pub gone: Vec<String>,
}

/// Best-effort delivery: one attempt per subscription, bounded by a timeout,
/// never retried.
#[derive(Debug, Clone)]
pub struct PushDispatcher<T, S> {
    time: T,
    sender: S,
    timeout: Duration,
}

impl<T, S> PushDispatcher<T, S>
where
    T: ports::TimeProvider,
    S: ports::PushSender,
{
    pub fn new(time: T, sender: S) -> Self {
        Self {
            time,
            sender,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub async fn send_one(
        &self,
        subscription: &Subscription,
        payload: &NotificationPayload,
    ) -> Result<(), DeliveryError> {
        let result = self.attempt(subscription, payload).await;
        match &result {
            Ok(()) => info!(endpoint = %subscription.endpoint, "push notification delivered"),
            Err(err) => warn!(
                endpoint = %subscription.endpoint,
                error = %err,
                "push notification delivery failed"
            ),
        }
        result
    }

    /// Delivers to every subscription concurrently. Individual failures do
    /// not stop the others.
    pub async fn send_all(
        &self,
        subscriptions: &[Subscription],
        payload: &NotificationPayload,
    ) -> BroadcastReport {
        let outcomes = join_all(
            subscriptions
                .iter()
                .map(|subscription| self.send_one(subscription, payload)),
        )
        .await;

        let mut report = BroadcastReport {
            attempted: subscriptions.len(),
            ..BroadcastReport::default()
        };
        for (subscription, outcome) in subscriptions.iter().zip(outcomes) {
            match outcome {
                Ok(()) => report.delivered += 1,
                Err(err) => {
                    report.failed += 1;
                    if err.is_gone() {
                        report.gone.push(subscription.endpoint.clone());
                    }
                }
            }
        }
        info!(
            attempted = report.attempted,
            delivered = report.delivered,
            failed = report.failed,
            "broadcast finished"
        );
        report
    }

    async fn attempt(
        &self,
        subscription: &Subscription,
        payload: &NotificationPayload,
    ) -> Result<(), DeliveryError> {
        let message = serde_json::to_string(&NotificationEnvelope {
            notification: payload.clone(),
        })?;
        match with_deadline(
            &self.time,
            self.timeout,
            self.sender.send(subscription, &message),
        )
        .await
        {
            Some(result) => result,
            None => Err(DeliveryError::Timeout(self.timeout)),
        }
    }
}
