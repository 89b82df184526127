//! Client-side collaborators: the browser's push capability, the
//! notification permission prompt and the HTTP client used to reach the
//! subscription gateway.

use thiserror::Error;

use crate::types::push::{NotificationEnvelope, PushSubscription, SubscribeResponse, Trigger};

/// Options passed to the platform when creating a subscription.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscribeOptions {
    pub user_visible_only: bool,
    pub application_server_key: String,
}

impl SubscribeOptions {
    pub fn new(application_server_key: impl Into<String>) -> Self {
        Self {
            user_visible_only: true,
            application_server_key: application_server_key.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    Granted,
    Denied,
    /// The user dismissed the prompt without choosing.
    Default,
}

/// A service worker registration. The push capability is absent on
/// platforms without push support.
#[derive(Debug, Clone)]
pub struct Registration<P> {
    pub scope: String,
    pub push_manager: Option<P>,
}

impl<P> Registration<P> {
    pub fn new(scope: impl Into<String>, push_manager: P) -> Self {
        Self {
            scope: scope.into(),
            push_manager: Some(push_manager),
        }
    }

    pub fn without_push(scope: impl Into<String>) -> Self {
        Self {
            scope: scope.into(),
            push_manager: None,
        }
    }
}

pub trait PushManager: Send + Sync {
    type Error: std::fmt::Display + Send + Sync + 'static;
    type GetFut<'a>: Future<Output = Result<Option<PushSubscription>, Self::Error>> + Send + 'a
    where
        Self: 'a;
    type SubscribeFut<'a>: Future<Output = Result<PushSubscription, Self::Error>> + Send + 'a
    where
        Self: 'a;

    fn get_subscription(&self) -> Self::GetFut<'_>;
    fn subscribe<'a>(&'a self, options: &'a SubscribeOptions) -> Self::SubscribeFut<'a>;
}

pub trait PermissionRequester: Send + Sync {
    type Fut<'a>: Future<Output = Permission> + Send + 'a
    where
        Self: 'a;

    fn request_permission(&self) -> Self::Fut<'_>;
}

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("gateway request failed: {0}")]
    Transport(String),
    #[error("gateway responded with {status}: {message}")]
    Status { status: u16, message: String },
    #[error("invalid gateway response: {0}")]
    Decode(String),
}

pub trait GatewayClient: Send + Sync {
    type SubscribeFut<'a>: Future<Output = Result<SubscribeResponse, GatewayError>> + Send + 'a
    where
        Self: 'a;
    type NotifyFut<'a>: Future<Output = Result<NotificationEnvelope, GatewayError>> + Send + 'a
    where
        Self: 'a;

    fn subscribe<'a>(&'a self, subscription: &'a PushSubscription) -> Self::SubscribeFut<'a>;
    fn send_notification<'a>(
        &'a self,
        trigger: &'a Trigger,
        subscription: &'a PushSubscription,
    ) -> Self::NotifyFut<'a>;
}
