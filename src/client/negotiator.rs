use crate::ports::{
    self, GatewayError, Permission, PushManager, Registration, SubscribeOptions, with_deadline,
};
use crate::types::push::{NotificationPayload, PushSubscription, Trigger};

use std::time::Duration;
use thiserror::Error;
use time::OffsetDateTime;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum NegotiationError {
    #[error("invalid subscription: missing endpoint")]
    MissingSubscription,
    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

/// Client side of the subscription protocol. Decides whether the current
/// browser subscription can be reused or a new one has to be created, and
/// keeps the server informed.
pub struct SubscriptionNegotiator<G, A, T> {
    gateway: G,
    permissions: A,
    time: T,
    options: SubscribeOptions,
    subscribe_timeout: Duration,
}

impl<G, A, T> SubscriptionNegotiator<G, A, T>
where
    G: ports::GatewayClient,
    A: ports::PermissionRequester,
    T: ports::TimeProvider,
{
    pub fn new(
        gateway: G,
        permissions: A,
        time: T,
        application_server_key: impl Into<String>,
        subscribe_timeout: Duration,
    ) -> Self {
        Self {
            gateway,
            permissions,
            time,
            options: SubscribeOptions::new(application_server_key),
            subscribe_timeout,
        }
    }

    /// The registration's current subscription, if it has a usable one. A
    /// missing push capability or a failed lookup reads as "not subscribed".
    pub async fn resolve_subscription<P: PushManager>(
        &self,
        registration: &Registration<P>,
    ) -> Option<PushSubscription> {
        let Some(push_manager) = registration.push_manager.as_ref() else {
            debug!(scope = %registration.scope, "push capability unavailable");
            return None;
        };

        let subscription = match push_manager.get_subscription().await {
            Ok(subscription) => subscription?,
            Err(err) => {
                warn!(scope = %registration.scope, error = %err, "failed to read push subscription");
                return None;
            }
        };

        if !is_usable(&subscription, self.time.now()) {
            info!(endpoint = %subscription.endpoint, "existing push subscription is no longer usable");
            return None;
        }
        Some(subscription)
    }

    /// Reuses the current subscription or creates one. Creating requires
    /// notification permission; a new subscription is registered with the
    /// server before it is returned.
    pub async fn ensure_subscription<P: PushManager>(
        &self,
        registration: &Registration<P>,
    ) -> Result<Option<PushSubscription>, NegotiationError> {
        if let Some(existing) = self.resolve_subscription(registration).await {
            debug!(endpoint = %existing.endpoint, "reusing push subscription");
            return Ok(Some(existing));
        }
        let Some(push_manager) = registration.push_manager.as_ref() else {
            return Ok(None);
        };

        let permission = self.permissions.request_permission().await;
        if permission != Permission::Granted {
            info!(?permission, "notification permission not granted");
            return Ok(None);
        }

        let created = match with_deadline(
            &self.time,
            self.subscribe_timeout,
            push_manager.subscribe(&self.options),
        )
        .await
        {
            Some(Ok(subscription)) => subscription,
            Some(Err(err)) => {
                warn!(error = %err, "failed to create push subscription");
                return Ok(None);
            }
            None => {
                warn!(timeout = ?self.subscribe_timeout, "push subscription request timed out");
                return Ok(None);
            }
        };

        self.gateway.subscribe(&created).await?;
        info!(endpoint = %created.endpoint, "push subscription created and registered");
        Ok(Some(created))
    }

    /// Asks the server to push the payload for `trigger` to this client.
    pub async fn notify_server<P: PushManager>(
        &self,
        trigger: &Trigger,
        registration: &Registration<P>,
    ) -> Result<NotificationPayload, NegotiationError> {
        let subscription = self
            .ensure_subscription(registration)
            .await?
            .filter(|subscription| !subscription.endpoint.trim().is_empty())
            .ok_or(NegotiationError::MissingSubscription)?;

        let envelope = self
            .gateway
            .send_notification(trigger, &subscription)
            .await?;
        debug!(%trigger, body = %envelope.notification.body, "server sent notification");
        Ok(envelope.notification)
    }
}

fn is_usable(subscription: &PushSubscription, now: OffsetDateTime) -> bool {
    if subscription.endpoint.trim().is_empty() {
        return false;
    }
    match subscription.expiration_time {
        Some(expires_at_ms) => expires_at_ms > (now.unix_timestamp_nanos() / 1_000_000) as f64,
        None => true,
    }
}
