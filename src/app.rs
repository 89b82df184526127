use crate::config::{self, ConfigError};
use crate::ports::PushSender;
use crate::push as push_service;
use crate::state;

use axum::Router;
use axum::http::header::{ACCEPT, CONTENT_TYPE};
use axum::http::{HeaderName, Method};
use axum::routing::get;
use axum::routing::post;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

mod push;

/// Router backed by the real web-push transport. Fails if the VAPID
/// credentials cannot be used.
pub fn app(config: config::AppConfig) -> Result<Router, ConfigError> {
    let sender = push_service::web_push_sender(&config)?;
    let store = Arc::new(push_service::SubscriptionStore::new());
    Ok(app_with_sender(config, store, sender))
}

pub fn app_with_sender<S: PushSender>(
    config: config::AppConfig,
    store: Arc<push_service::SubscriptionStore>,
    sender: S,
) -> Router {
    let gateway = push_service::gateway_with_sender(&config, store, sender);
    let state = state::AppState {
        config,
        gateway: Arc::new(gateway),
    };
    Router::new()
        .route(
            "/subscribe",
            post(push::subscribe::<S>).delete(push::unsubscribe::<S>),
        )
        .route("/sendNotification", post(push::send_notification::<S>))
        .route("/broadcast", post(push::broadcast::<S>))
        .route("/api/push/public-key", get(push::public_key::<S>))
        .route("/health", get(health))
        .with_state(state)
        .layer(cors_layer())
        .layer(TraceLayer::new_for_http())
}

fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers([
            HeaderName::from_static("x-requested-with"),
            CONTENT_TYPE,
            ACCEPT,
        ])
}

pub(crate) async fn health() -> &'static str {
    "ok"
}
