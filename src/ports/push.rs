use std::time::Duration;

use thiserror::Error;

use crate::types::push::Subscription;

#[derive(Debug, Error)]
pub enum DeliveryError {
    /// The push service no longer knows the endpoint (HTTP 404/410).
    #[error("push endpoint is gone: {0}")]
    Gone(String),
    #[error("push service rejected the message: {0}")]
    Rejected(String),
    #[error("push transport failed: {0}")]
    Transport(String),
    #[error("push delivery timed out after {0:?}")]
    Timeout(Duration),
    #[error("failed to encode notification payload: {0}")]
    Encode(#[from] serde_json::Error),
}

impl DeliveryError {
    pub fn is_gone(&self) -> bool {
        matches!(self, DeliveryError::Gone(_))
    }
}

pub trait PushSender: Clone + Send + Sync + 'static {
    type Fut<'a>: Future<Output = Result<(), DeliveryError>> + Send + 'a
    where
        Self: 'a;

    fn send<'a>(&'a self, subscription: &'a Subscription, payload: &'a str) -> Self::Fut<'a>;
}
