use std::sync::Arc;

use axum::{
    extract::{FromRequest, Request, State},
    http::{header::CONTENT_TYPE, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Form, Json, Router,
};
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;
use valbot_core::errors::{ApplicationError, InterfaceError};
use valbot_whatsapp::{
    events::{EventContext, HandlerResult, InboundPayload, WebhookHandler},
    outbound::{deliver_in_background, OutboundMessenger},
};

pub const NO_BODY_TEXT: &str = "No message body found";

#[derive(Clone)]
pub struct WebhookState {
    pub handler: Arc<WebhookHandler>,
    pub messenger: Arc<dyn OutboundMessenger>,
}

pub fn router(state: WebhookState) -> Router {
    Router::new()
        .route("/twilio-webhook", post(twilio_webhook))
        .route("/twilio-status", post(twilio_status))
        .with_state(state)
}

/// Inbound payload decoded from either a form-urlencoded or a JSON body.
pub struct WebhookPayload(pub InboundPayload);

impl<S> FromRequest<S> for WebhookPayload
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_json = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.trim_start().starts_with("application/json"));

        let decoded = if is_json {
            Json::<InboundPayload>::from_request(req, state)
                .await
                .map(|Json(payload)| payload)
                .map_err(|rejection| rejection.body_text())
        } else {
            Form::<InboundPayload>::from_request(req, state)
                .await
                .map(|Form(payload)| payload)
                .map_err(|rejection| rejection.body_text())
        };

        decoded.map(Self).map_err(|detail| {
            let correlation_id = Uuid::new_v4().to_string();
            warn!(
                event_name = "ingress.twilio.payload_rejected",
                correlation_id = %correlation_id,
                detail = %detail,
                "could not decode webhook payload"
            );
            ApiError(ApplicationError::InvalidPayload(detail).into_interface(correlation_id))
        })
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    correlation_id: &'a str,
}

#[derive(Debug)]
pub struct ApiError(pub InterfaceError);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.0 {
            InterfaceError::BadRequest { .. } => StatusCode::BAD_REQUEST,
        };
        let body =
            ErrorBody { error: self.0.user_message(), correlation_id: self.0.correlation_id() };
        (status, Json(body)).into_response()
    }
}

fn correlation_id(payload: &InboundPayload) -> String {
    payload
        .message_sid
        .clone()
        .filter(|sid| !sid.trim().is_empty())
        .unwrap_or_else(|| Uuid::new_v4().to_string())
}

async fn twilio_webhook(
    State(state): State<WebhookState>,
    WebhookPayload(payload): WebhookPayload,
) -> Response {
    let ctx = EventContext { correlation_id: correlation_id(&payload) };

    match state.handler.handle(payload, &ctx).await {
        HandlerResult::Reply(message) => {
            deliver_in_background(state.messenger.clone(), message, ctx.correlation_id);
            StatusCode::OK.into_response()
        }
        HandlerResult::StatusRecorded => StatusCode::OK.into_response(),
        HandlerResult::Ignored => (StatusCode::OK, NO_BODY_TEXT).into_response(),
    }
}

async fn twilio_status(WebhookPayload(payload): WebhookPayload) -> StatusCode {
    info!(
        event_name = "ingress.twilio.status_received",
        correlation_id = %correlation_id(&payload),
        message_sid = payload.message_sid.as_deref().unwrap_or("unknown"),
        status = payload.message_status.as_deref().unwrap_or("unknown"),
        "received delivery status callback"
    );
    StatusCode::OK
}
