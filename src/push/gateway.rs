use crate::ports::{self, DeliveryError};
use crate::push::dispatcher::{BroadcastReport, PushDispatcher};
use crate::push::payload;
use crate::push::store::SubscriptionStore;
use crate::types::push::{
    NotificationPayload, PushSubscription, SendNotificationRequest, SubscribeResponse,
    Subscription, Trigger,
};

use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum RequestError {
    #[error("invalid subscription: {0}")]
    InvalidSubscription(&'static str),
    #[error("error sending notification: {0}")]
    Delivery(#[from] DeliveryError),
}

#[derive(Debug, Clone)]
pub struct SubscribeOutcome {
    /// `false` when the endpoint was already registered.
    pub created: bool,
    pub response: SubscribeResponse,
}

/// Server side of the subscription protocol: dedups subscriptions through the
/// store and picks the payload for each request.
pub struct SubscriptionGateway<T, S> {
    store: Arc<SubscriptionStore>,
    dispatcher: PushDispatcher<T, S>,
    time: T,
}

impl<T, S> SubscriptionGateway<T, S>
where
    T: ports::TimeProvider,
    S: ports::PushSender,
{
    pub fn new(store: Arc<SubscriptionStore>, dispatcher: PushDispatcher<T, S>, time: T) -> Self {
        Self {
            store,
            dispatcher,
            time,
        }
    }

    pub fn store(&self) -> &Arc<SubscriptionStore> {
        &self.store
    }

    /// Registers the subscription and pings it. Re-subscribing a known
    /// endpoint pings it again with the welcome-back text. A failed ping does
    /// not fail the registration.
    pub async fn subscribe(
        &self,
        subscription: PushSubscription,
    ) -> Result<SubscribeOutcome, RequestError> {
        let subscription = validate(subscription)?;
        let candidate = Subscription::from_push(subscription, self.time.now());
        let endpoint = candidate.endpoint.clone();
        let created = self.store.add(candidate.clone());
        let subscription = if created {
            candidate
        } else {
            self.store.get(&endpoint).unwrap_or(candidate)
        };
        debug!(endpoint = %endpoint, created, "subscription registered");

        let trigger = if created {
            Trigger::NewSubscription
        } else {
            Trigger::ExistingSubscription
        };
        let notification = payload::build(&trigger);
        if let Err(err) = self.dispatcher.send_one(&subscription, &notification).await {
            self.prune_if_gone(&endpoint, &err);
        }

        Ok(SubscribeOutcome {
            created,
            response: SubscribeResponse {
                notification,
                subscription,
            },
        })
    }

    /// Delivers the trigger's payload to the one subscription in the request.
    /// Unlike `subscribe`, a failed delivery is an error for the caller.
    pub async fn send_notification(
        &self,
        request: SendNotificationRequest,
    ) -> Result<NotificationPayload, RequestError> {
        let subscription = validate(request.subscription)?;
        debug!(trigger = %request.trigger, "sending notification");
        let notification = payload::build(&request.trigger);
        let subscription = Subscription::from_push(subscription, self.time.now());

        if let Err(err) = self.dispatcher.send_one(&subscription, &notification).await {
            self.prune_if_gone(&subscription.endpoint, &err);
            return Err(err.into());
        }
        Ok(notification)
    }

    pub async fn broadcast(&self, trigger: &Trigger) -> (NotificationPayload, BroadcastReport) {
        let notification = payload::build(trigger);
        let subscriptions = self.store.all();
        let report = self.dispatcher.send_all(&subscriptions, &notification).await;
        for endpoint in &report.gone {
            self.prune(endpoint);
        }
        (notification, report)
    }

    pub fn unsubscribe(&self, endpoint: &str) -> bool {
        let removed = self.store.remove(endpoint);
        if removed {
            info!(endpoint = %endpoint, "subscription removed");
        }
        removed
    }

    fn prune_if_gone(&self, endpoint: &str, err: &DeliveryError) {
        if err.is_gone() {
            self.prune(endpoint);
        }
    }

    fn prune(&self, endpoint: &str) {
        if self.store.remove(endpoint) {
            info!(endpoint = %endpoint, "pruned subscription reported gone by push service");
        }
    }
}

/// Checks the required fields and returns the subscription with its endpoint
/// trimmed, which is the form the store keys on.
fn validate(mut subscription: PushSubscription) -> Result<PushSubscription, RequestError> {
    subscription.endpoint = subscription.endpoint.trim().to_string();
    if subscription.endpoint.is_empty() {
        return Err(RequestError::InvalidSubscription("missing endpoint"));
    }
    if subscription.keys.p256dh.trim().is_empty() || subscription.keys.auth.trim().is_empty() {
        return Err(RequestError::InvalidSubscription(
            "keys.p256dh and keys.auth are required",
        ));
    }
    Ok(subscription)
}

#[cfg(test)]
#[allow(non_snake_case)]
mod tests {
    use super::*;
    use crate::push::payload::{
        DEFAULT_BODY, EXISTING_SUBSCRIPTION_BODY, NEW_SUBSCRIPTION_BODY, ON_PAGE_LOAD_BODY,
    };
    use crate::testing::{Failure, TestSender, TestTime, fixed_now, push_subscription};

    fn gateway(sender: TestSender) -> SubscriptionGateway<TestTime, TestSender> {
        let time = TestTime::frozen();
        let dispatcher = PushDispatcher::new(time.clone(), sender);
        SubscriptionGateway::new(Arc::new(SubscriptionStore::new()), dispatcher, time)
    }

    #[tokio::test]
    async fn subscribe__should_create_then_recognise_existing_endpoint() {
        // Given
        let sender = TestSender::default();
        let gateway = gateway(sender.clone());

        // When
        let first = gateway
            .subscribe(push_subscription("A"))
            .await
            .expect("first subscribe");
        let second = gateway
            .subscribe(push_subscription("A"))
            .await
            .expect("second subscribe");

        // Then
        assert!(first.created);
        assert_eq!(first.response.notification.body, NEW_SUBSCRIPTION_BODY);
        assert_eq!(first.response.subscription.created_at, fixed_now());
        assert!(!second.created);
        assert_eq!(second.response.notification.body, EXISTING_SUBSCRIPTION_BODY);
        assert_eq!(gateway.store().len(), 1);
        assert_eq!(sender.attempted_endpoints(), vec!["A".to_string(), "A".to_string()]);
    }

    #[tokio::test]
    async fn subscribe__should_succeed_when_ping_fails() {
        // Given
        let gateway = gateway(TestSender::failing(Failure::Unreachable));

        // When
        let outcome = gateway
            .subscribe(push_subscription("A"))
            .await
            .expect("subscribe");

        // Then
        assert!(outcome.created);
        assert!(gateway.store().exists("A"));
    }

    #[tokio::test]
    async fn subscribe__should_drop_endpoint_reported_gone() {
        // Given
        let gateway = gateway(TestSender::failing(Failure::Gone));

        // When
        let outcome = gateway
            .subscribe(push_subscription("A"))
            .await
            .expect("subscribe");

        // Then
        assert!(outcome.created);
        assert!(gateway.store().is_empty());
    }

    #[tokio::test]
    async fn subscribe__should_reject_missing_endpoint() {
        // Given
        let sender = TestSender::default();
        let gateway = gateway(sender.clone());

        // When
        let result = gateway.subscribe(push_subscription("  ")).await;

        // Then
        assert!(matches!(
            result,
            Err(RequestError::InvalidSubscription("missing endpoint"))
        ));
        assert!(gateway.store().is_empty());
        assert!(sender.attempts().is_empty());
    }

    #[tokio::test]
    async fn send_notification__should_pick_body_from_trigger() {
        // Given
        let gateway = gateway(TestSender::default());

        // When
        let on_page_load = gateway
            .send_notification(SendNotificationRequest {
                trigger: Trigger::OnPageLoad,
                subscription: push_subscription("A"),
            })
            .await
            .expect("onPageLoad");
        let unknown = gateway
            .send_notification(SendNotificationRequest {
                trigger: Trigger::from("xyz"),
                subscription: push_subscription("A"),
            })
            .await
            .expect("xyz");

        // Then
        assert_eq!(on_page_load.body, ON_PAGE_LOAD_BODY);
        assert_eq!(unknown.body, DEFAULT_BODY);
    }

    #[tokio::test]
    async fn send_notification__should_fail_when_transport_unreachable() {
        // Given
        let gateway = gateway(TestSender::failing(Failure::Unreachable));
        gateway.store().add(crate::testing::subscription("A"));

        // When
        let result = gateway
            .send_notification(SendNotificationRequest {
                trigger: Trigger::OnPageLoad,
                subscription: push_subscription("A"),
            })
            .await;

        // Then
        assert!(matches!(
            result,
            Err(RequestError::Delivery(DeliveryError::Transport(_)))
        ));
        assert_eq!(gateway.store().len(), 1);
    }

    #[tokio::test]
    async fn send_notification__should_not_register_subscription() {
        let gateway = gateway(TestSender::default());

        gateway
            .send_notification(SendNotificationRequest {
                trigger: Trigger::OnPageLoad,
                subscription: push_subscription("A"),
            })
            .await
            .expect("send");

        assert!(gateway.store().is_empty());
    }

    #[tokio::test]
    async fn broadcast__should_reach_every_stored_subscription_and_prune_gone() {
        // Given
        let sender = TestSender::default();
        sender.fail_for("B", Failure::Gone);
        sender.fail_for("C", Failure::Unreachable);
        let gateway = gateway(sender.clone());
        for endpoint in ["A", "B", "C"] {
            gateway.store().add(crate::testing::subscription(endpoint));
        }

        // When
        let (notification, report) = gateway.broadcast(&Trigger::OnPageLoad).await;

        // Then
        assert_eq!(notification.body, ON_PAGE_LOAD_BODY);
        assert_eq!(report.attempted, 3);
        assert_eq!(report.delivered, 1);
        assert_eq!(report.failed, 2);
        assert!(!gateway.store().exists("B"));
        assert!(gateway.store().exists("C"));
    }

    #[tokio::test]
    async fn subscribe__should_store_trimmed_endpoint() {
        // Given
        let sender = TestSender::default();
        let gateway = gateway(sender.clone());

        // When
        let first = gateway
            .subscribe(push_subscription("A "))
            .await
            .expect("first subscribe");
        let second = gateway
            .subscribe(push_subscription(" A"))
            .await
            .expect("second subscribe");

        // Then
        assert_eq!(first.response.subscription.endpoint, "A");
        assert!(!second.created);
        assert_eq!(sender.attempted_endpoints(), vec!["A".to_string(), "A".to_string()]);
        assert!(gateway.unsubscribe("A"));
        assert!(gateway.store().is_empty());
    }

    #[test]
    fn unsubscribe__should_report_whether_endpoint_was_known() {
        let gateway = gateway(TestSender::default());
        gateway.store().add(crate::testing::subscription("A"));

        assert!(gateway.unsubscribe("A"));
        assert!(!gateway.unsubscribe("A"));
    }
}
