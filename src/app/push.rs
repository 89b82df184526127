use crate::ports::PushSender;
use crate::push::{BroadcastReport, RequestError};
use crate::state;
use crate::types::push::{
    BroadcastRequest, ErrorResponse, NotificationEnvelope, NotificationPayload,
    SendNotificationRequest, SubscribeRequest, SubscribeResponse, UnsubscribeRequest,
};

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use serde::Deserialize;
use serde::Serialize;
use tracing::{error, info};

pub(crate) type ApiError = (StatusCode, Json<ErrorResponse>);

#[derive(Serialize, Deserialize)]
pub(crate) struct PublicKeyResponse {
    #[serde(rename = "publicKey")]
    pub(crate) public_key: String,
}

#[derive(Serialize, Deserialize)]
pub(crate) struct BroadcastResponse {
    pub(crate) notification: NotificationPayload,
    pub(crate) report: BroadcastReport,
}

pub(crate) async fn subscribe<S: PushSender>(
    State(state): State<state::AppState<S>>,
    body: Result<Json<SubscribeRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<SubscribeResponse>), ApiError> {
    let Json(request) = body.map_err(invalid_body)?;
    let outcome = state
        .gateway
        .subscribe(request.into_subscription())
        .await
        .map_err(request_error)?;

    let status = if outcome.created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(outcome.response)))
}

pub(crate) async fn send_notification<S: PushSender>(
    State(state): State<state::AppState<S>>,
    body: Result<Json<SendNotificationRequest>, JsonRejection>,
) -> Result<Json<NotificationEnvelope>, ApiError> {
    let Json(request) = body.map_err(invalid_body)?;
    let notification = state
        .gateway
        .send_notification(request)
        .await
        .map_err(request_error)?;
    Ok(Json(NotificationEnvelope { notification }))
}

pub(crate) async fn broadcast<S: PushSender>(
    State(state): State<state::AppState<S>>,
    body: Result<Json<BroadcastRequest>, JsonRejection>,
) -> Result<Json<BroadcastResponse>, ApiError> {
    let Json(request) = body.map_err(invalid_body)?;
    info!(trigger = %request.trigger, "broadcasting notification");
    let (notification, report) = state.gateway.broadcast(&request.trigger).await;
    Ok(Json(BroadcastResponse {
        notification,
        report,
    }))
}

pub(crate) async fn unsubscribe<S: PushSender>(
    State(state): State<state::AppState<S>>,
    body: Result<Json<UnsubscribeRequest>, JsonRejection>,
) -> Result<StatusCode, ApiError> {
    let Json(request) = body.map_err(invalid_body)?;
    if state.gateway.unsubscribe(request.endpoint.trim()) {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(api_error(StatusCode::NOT_FOUND, "Unknown subscription."))
    }
}

pub(crate) async fn public_key<S: PushSender>(
    State(state): State<state::AppState<S>>,
) -> Json<PublicKeyResponse> {
    Json(PublicKeyResponse {
        public_key: state.config.vapid.public_key,
    })
}

fn request_error(err: RequestError) -> ApiError {
    match err {
        RequestError::InvalidSubscription(_) => {
            api_error(StatusCode::BAD_REQUEST, err.to_string())
        }
        RequestError::Delivery(_) => {
            error!(error = %err, "push request failed");
            api_error(StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
        }
    }
}

fn invalid_body(rejection: JsonRejection) -> ApiError {
    api_error(StatusCode::BAD_REQUEST, rejection.body_text())
}

fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            message: message.into(),
        }),
    )
}
