use std::sync::Arc;

use serde::Deserialize;
use tracing::{debug, info};

use valbot_core::domain::preference::UserId;
use valbot_store::PreferenceStore;

use crate::{commands::CommandRouter, outbound::OutboundMessage};

pub const UNKNOWN_SENDER: &str = "whatsapp:unknown";

/// Form or JSON body posted by Twilio to the webhook routes.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct InboundPayload {
    #[serde(rename = "Body", default)]
    pub body: Option<String>,
    #[serde(rename = "From", default)]
    pub from: Option<String>,
    #[serde(rename = "To", default)]
    pub to: Option<String>,
    #[serde(rename = "MessageSid", default)]
    pub message_sid: Option<String>,
    #[serde(rename = "MessageStatus", default)]
    pub message_status: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InboundEvent {
    StatusCallback { message_sid: Option<String>, status: String },
    MissingBody,
    Message { sender: UserId, bot_address: Option<String>, text: String },
}

impl InboundPayload {
    /// A delivery status always wins over a body; a blank body counts as missing.
    pub fn classify(self) -> InboundEvent {
        if let Some(status) = self.message_status {
            return InboundEvent::StatusCallback { message_sid: self.message_sid, status };
        }

        let Some(text) = self.body.filter(|body| !body.trim().is_empty()) else {
            return InboundEvent::MissingBody;
        };

        let sender = self
            .from
            .filter(|from| !from.trim().is_empty())
            .unwrap_or_else(|| UNKNOWN_SENDER.to_owned());

        InboundEvent::Message { sender: UserId(sender), bot_address: self.to, text }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EventContext {
    pub correlation_id: String,
}

impl Default for EventContext {
    fn default() -> Self {
        Self { correlation_id: "unknown-correlation-id".to_owned() }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HandlerResult {
    Reply(OutboundMessage),
    StatusRecorded,
    Ignored,
}

/// Turns inbound webhook payloads into replies addressed back to the sender.
pub struct WebhookHandler {
    router: CommandRouter,
    default_from: String,
}

impl WebhookHandler {
    pub fn new(store: Arc<dyn PreferenceStore>, default_from: impl Into<String>) -> Self {
        Self { router: CommandRouter::new(store), default_from: default_from.into() }
    }

    pub async fn handle(&self, payload: InboundPayload, ctx: &EventContext) -> HandlerResult {
        match payload.classify() {
            InboundEvent::StatusCallback { message_sid, status } => {
                info!(
                    event_name = "ingress.twilio.status_received",
                    correlation_id = %ctx.correlation_id,
                    message_sid = message_sid.as_deref().unwrap_or("unknown"),
                    status = %status,
                    "received delivery status callback"
                );
                HandlerResult::StatusRecorded
            }
            InboundEvent::MissingBody => {
                debug!(
                    event_name = "ingress.twilio.message_ignored",
                    correlation_id = %ctx.correlation_id,
                    "inbound payload had no message body"
                );
                HandlerResult::Ignored
            }
            InboundEvent::Message { sender, bot_address, text } => {
                info!(
                    event_name = "ingress.twilio.message_received",
                    correlation_id = %ctx.correlation_id,
                    user_id = %sender.as_str(),
                    "received chat message"
                );

                let body = self.router.reply(&sender, &text).await;
                let from = bot_address
                    .filter(|address| !address.trim().is_empty())
                    .unwrap_or_else(|| self.default_from.clone());

                HandlerResult::Reply(OutboundMessage { to: sender.0, from, body })
            }
        }
    }
}
