use serde::{Deserialize, Serialize};
use std::fmt;
use time::OffsetDateTime;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VapidConfig {
    pub private_key: String,
    pub public_key: String,
    pub subject: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionKeys {
    pub p256dh: String,
    pub auth: String,
}

/// A push subscription as the browser reports it (`PushSubscription.toJSON()`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PushSubscription {
    pub endpoint: String,
    /// Milliseconds since the Unix epoch, when the browser knows it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiration_time: Option<f64>,
    pub keys: SubscriptionKeys,
}

/// A subscription known to the server. The endpoint is the identity; a
/// different endpoint is a different subscription.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    pub endpoint: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiration_time: Option<f64>,
    pub keys: SubscriptionKeys,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl Subscription {
    pub fn from_push(subscription: PushSubscription, created_at: OffsetDateTime) -> Self {
        Self {
            endpoint: subscription.endpoint,
            expiration_time: subscription.expiration_time,
            keys: subscription.keys,
            created_at,
        }
    }
}

/// Reason for sending a notification. Unrecognised values are kept verbatim
/// and fall back to the default body.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "RawTrigger", into = "String")]
pub enum Trigger {
    OnPageLoad,
    NewSubscription,
    ExistingSubscription,
    Other(String),
}

impl Trigger {
    pub fn as_str(&self) -> &str {
        match self {
            Trigger::OnPageLoad => "onPageLoad",
            Trigger::NewSubscription => "newSubscription",
            Trigger::ExistingSubscription => "existingSubscription",
            Trigger::Other(value) => value,
        }
    }
}

impl Default for Trigger {
    fn default() -> Self {
        Trigger::Other(String::new())
    }
}

impl From<&str> for Trigger {
    fn from(value: &str) -> Self {
        match value {
            "onPageLoad" => Trigger::OnPageLoad,
            "newSubscription" => Trigger::NewSubscription,
            "existingSubscription" => Trigger::ExistingSubscription,
            other => Trigger::Other(other.to_string()),
        }
    }
}

impl From<String> for Trigger {
    fn from(value: String) -> Self {
        Trigger::from(value.as_str())
    }
}

/// Anything that is not a string (`null`, numbers, objects) reads as an
/// unrecognised trigger.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawTrigger {
    Text(String),
    Other(serde::de::IgnoredAny),
}

impl From<RawTrigger> for Trigger {
    fn from(raw: RawTrigger) -> Self {
        match raw {
            RawTrigger::Text(value) => Trigger::from(value),
            RawTrigger::Other(_) => Trigger::default(),
        }
    }
}

impl From<Trigger> for String {
    fn from(trigger: Trigger) -> Self {
        match trigger {
            Trigger::Other(value) => value,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationPayload {
    pub title: String,
    pub body: String,
}

/// The JSON document pushed to the service worker, which reads
/// `notification.title` and `notification.body`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationEnvelope {
    pub notification: NotificationPayload,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SubscribeRequest {
    Wrapped { subscription: PushSubscription },
    Bare(PushSubscription),
}

impl SubscribeRequest {
    pub fn into_subscription(self) -> PushSubscription {
        match self {
            SubscribeRequest::Wrapped { subscription } => subscription,
            SubscribeRequest::Bare(subscription) => subscription,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubscribeResponse {
    pub notification: NotificationPayload,
    pub subscription: Subscription,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendNotificationRequest {
    #[serde(default)]
    pub trigger: Trigger,
    pub subscription: PushSubscription,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BroadcastRequest {
    #[serde(default)]
    pub trigger: Trigger,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnsubscribeRequest {
    pub endpoint: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub message: String,
}
