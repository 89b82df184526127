use crate::adapters::{TokioTimeProvider, WebPushSender};
use crate::config::{self, ConfigError};

mod dispatcher;
mod gateway;
pub mod payload;
mod store;
pub mod vapid;

use std::sync::Arc;

pub use dispatcher::{BroadcastReport, PushDispatcher};
pub use gateway::{RequestError, SubscribeOutcome, SubscriptionGateway};
pub use store::SubscriptionStore;
pub use vapid::{VapidCredentials, generate_vapid_credentials};

pub fn web_push_sender(config: &config::AppConfig) -> Result<WebPushSender, ConfigError> {
    vapid::validate_key_pair(&config.vapid)?;
    WebPushSender::new(config.vapid.clone()).map_err(|err| ConfigError::PushClient(err.to_string()))
}

pub fn gateway_with_sender<S: crate::ports::PushSender>(
    config: &config::AppConfig,
    store: Arc<SubscriptionStore>,
    sender: S,
) -> SubscriptionGateway<TokioTimeProvider, S> {
    let dispatcher =
        PushDispatcher::new(TokioTimeProvider, sender).with_timeout(config.delivery_timeout);
    SubscriptionGateway::new(store, dispatcher, TokioTimeProvider)
}
