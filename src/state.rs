use crate::adapters::TokioTimeProvider;
use crate::config::AppConfig;
use crate::push::SubscriptionGateway;

use std::sync::Arc;

#[derive(Clone)]
pub struct AppState<S> {
    pub config: AppConfig,
    pub gateway: Arc<SubscriptionGateway<TokioTimeProvider, S>>,
}
