use std::path::PathBuf;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;
use time::OffsetDateTime;

use crate::ports::{self, DeliveryError, GatewayError, Permission, SubscribeOptions};
use crate::types::push::{
    ErrorResponse, NotificationEnvelope, PushSubscription, SendNotificationRequest,
    SubscribeRequest, SubscribeResponse, Subscription, Trigger, VapidConfig,
};

#[derive(Debug, Clone, Copy, Default)]
pub struct TokioTimeProvider;

impl ports::TimeProvider for TokioTimeProvider {
    type Sleep<'a>
        = tokio::time::Sleep
    where
        Self: 'a;

    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }

    fn sleep<'a>(&'a self, duration: Duration) -> Self::Sleep<'a> {
        tokio::time::sleep(duration)
    }
}

#[derive(Clone)]
pub struct WebPushSender {
    vapid: VapidConfig,
    client: Arc<web_push::WebPushClient>,
}

impl WebPushSender {
    pub fn new(vapid: VapidConfig) -> Result<Self, web_push::WebPushError> {
        let client = web_push::WebPushClient::new()?;
        Ok(Self {
            vapid,
            client: Arc::new(client),
        })
    }

    async fn deliver(
        &self,
        subscription: &Subscription,
        payload: &str,
    ) -> Result<(), web_push::WebPushError> {
        let subscription_info = web_push::SubscriptionInfo::new(
            subscription.endpoint.clone(),
            subscription.keys.p256dh.clone(),
            subscription.keys.auth.clone(),
        );
        let mut builder = web_push::WebPushMessageBuilder::new(&subscription_info)?;
        builder.set_payload(web_push::ContentEncoding::Aes128Gcm, payload.as_bytes());
        let mut signature_builder = web_push::VapidSignatureBuilder::from_base64(
            &self.vapid.private_key,
            web_push::URL_SAFE_NO_PAD,
            &subscription_info,
        )?;
        signature_builder.add_claim("sub", self.vapid.subject.as_str());
        builder.set_vapid_signature(signature_builder.build()?);
        self.client.send(builder.build()?).await
    }
}

fn delivery_error(err: web_push::WebPushError) -> DeliveryError {
    match err {
        web_push::WebPushError::EndpointNotValid | web_push::WebPushError::EndpointNotFound => {
            DeliveryError::Gone(err.to_string())
        }
        web_push::WebPushError::Unauthorized | web_push::WebPushError::PayloadTooLarge => {
            DeliveryError::Rejected(err.to_string())
        }
        other => DeliveryError::Transport(other.to_string()),
    }
}

impl ports::PushSender for WebPushSender {
    type Fut<'a>
        = Pin<Box<dyn Future<Output = Result<(), DeliveryError>> + Send + 'a>>
    where
        Self: 'a;

    fn send<'a>(&'a self, subscription: &'a Subscription, payload: &'a str) -> Self::Fut<'a> {
        Box::pin(async move {
            self.deliver(subscription, payload)
                .await
                .map_err(delivery_error)
        })
    }
}

/// HTTP client for the subscription gateway.
#[derive(Clone)]
pub struct HttpGatewayClient {
    base_url: String,
    client: reqwest::Client,
}

impl HttpGatewayClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, GatewayError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| GatewayError::Transport(err.to_string()))?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn post<B, R>(&self, path: &str, body: &B) -> Result<R, GatewayError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let response = self
            .client
            .post(format!("{}{}", self.base_url, path))
            .json(body)
            .send()
            .await
            .map_err(|err| GatewayError::Transport(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let fallback = status.canonical_reason().unwrap_or("unknown error").to_string();
            let message = match response.json::<ErrorResponse>().await {
                Ok(body) => body.message,
                Err(_) => fallback,
            };
            return Err(GatewayError::Status {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json::<R>()
            .await
            .map_err(|err| GatewayError::Decode(err.to_string()))
    }
}

impl ports::GatewayClient for HttpGatewayClient {
    type SubscribeFut<'a>
        = Pin<Box<dyn Future<Output = Result<SubscribeResponse, GatewayError>> + Send + 'a>>
    where
        Self: 'a;
    type NotifyFut<'a>
        = Pin<Box<dyn Future<Output = Result<NotificationEnvelope, GatewayError>> + Send + 'a>>
    where
        Self: 'a;

    fn subscribe<'a>(&'a self, subscription: &'a PushSubscription) -> Self::SubscribeFut<'a> {
        Box::pin(async move {
            let request = SubscribeRequest::Wrapped {
                subscription: subscription.clone(),
            };
            self.post("/subscribe", &request).await
        })
    }

    fn send_notification<'a>(
        &'a self,
        trigger: &'a Trigger,
        subscription: &'a PushSubscription,
    ) -> Self::NotifyFut<'a> {
        Box::pin(async move {
            let request = SendNotificationRequest {
                trigger: trigger.clone(),
                subscription: subscription.clone(),
            };
            self.post("/sendNotification", &request).await
        })
    }
}

/// Push capability backed by a JSON file holding a browser subscription.
/// It can report the stored subscription but cannot mint new ones.
#[derive(Debug, Clone)]
pub struct FilePushManager {
    path: PathBuf,
}

impl FilePushManager {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ports::PushManager for FilePushManager {
    type Error = std::io::Error;
    type GetFut<'a>
        = Pin<Box<dyn Future<Output = Result<Option<PushSubscription>, Self::Error>> + Send + 'a>>
    where
        Self: 'a;
    type SubscribeFut<'a>
        = std::future::Ready<Result<PushSubscription, Self::Error>>
    where
        Self: 'a;

    fn get_subscription(&self) -> Self::GetFut<'_> {
        Box::pin(async move {
            let contents = match tokio::fs::read_to_string(&self.path).await {
                Ok(contents) => contents,
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
                Err(err) => return Err(err),
            };
            let subscription = serde_json::from_str(&contents)
                .map_err(|err| std::io::Error::new(std::io::ErrorKind::InvalidData, err))?;
            Ok(Some(subscription))
        })
    }

    fn subscribe<'a>(&'a self, _options: &'a SubscribeOptions) -> Self::SubscribeFut<'a> {
        std::future::ready(Err(std::io::Error::new(
            std::io::ErrorKind::Unsupported,
            format!(
                "no subscription stored at {}; create one in a browser first",
                self.path.display()
            ),
        )))
    }
}

/// Permission source for non-interactive callers.
#[derive(Debug, Clone, Copy, Default)]
pub struct GrantedPermission;

impl ports::PermissionRequester for GrantedPermission {
    type Fut<'a>
        = std::future::Ready<Permission>
    where
        Self: 'a;

    fn request_permission(&self) -> Self::Fut<'_> {
        std::future::ready(Permission::Granted)
    }
}
