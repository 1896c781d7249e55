use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use valbot_core::config::TwilioConfig;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutboundMessage {
    pub to: String,
    pub from: String,
    pub body: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct DeliveryReceipt {
    #[serde(rename = "sid")]
    pub message_sid: String,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DeliveryError {
    #[error("messaging request failed: {0}")]
    Request(String),
    #[error("messaging api returned {status}: {detail}")]
    Rejected { status: u16, detail: String },
    #[error("failed to decode messaging api response: {0}")]
    Decode(String),
}

#[async_trait]
pub trait OutboundMessenger: Send + Sync {
    async fn send(&self, message: &OutboundMessage) -> Result<DeliveryReceipt, DeliveryError>;
}

/// Accepts every message without sending it.
#[derive(Default)]
pub struct NoopMessenger;

#[async_trait]
impl OutboundMessenger for NoopMessenger {
    async fn send(&self, message: &OutboundMessage) -> Result<DeliveryReceipt, DeliveryError> {
        debug!(
            event_name = "egress.noop.accepted",
            to = %message.to,
            "noop messenger accepted message"
        );
        Ok(DeliveryReceipt { message_sid: "noop".to_owned() })
    }
}

/// Twilio Messages API client.
pub struct TwilioMessenger {
    client: Client,
    messages_url: String,
    account_sid: String,
    auth_token: SecretString,
}

impl TwilioMessenger {
    pub fn new(config: &TwilioConfig) -> Result<Self, DeliveryError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|error| DeliveryError::Request(error.to_string()))?;

        Ok(Self {
            client,
            messages_url: format!(
                "{}/2010-04-01/Accounts/{}/Messages.json",
                config.api_base_url.trim_end_matches('/'),
                config.account_sid
            ),
            account_sid: config.account_sid.clone(),
            auth_token: config.auth_token.clone(),
        })
    }

    pub fn messages_url(&self) -> &str {
        &self.messages_url
    }
}

#[async_trait]
impl OutboundMessenger for TwilioMessenger {
    async fn send(&self, message: &OutboundMessage) -> Result<DeliveryReceipt, DeliveryError> {
        let response = self
            .client
            .post(&self.messages_url)
            .basic_auth(&self.account_sid, Some(self.auth_token.expose_secret()))
            .form(&[
                ("Body", message.body.as_str()),
                ("From", message.from.as_str()),
                ("To", message.to.as_str()),
            ])
            .send()
            .await
            .map_err(|error| DeliveryError::Request(error.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(DeliveryError::Rejected { status: status.as_u16(), detail });
        }

        response
            .json::<DeliveryReceipt>()
            .await
            .map_err(|error| DeliveryError::Decode(error.to_string()))
    }
}

/// Sends without blocking the caller. Failures are logged and dropped.
pub fn deliver_in_background(
    messenger: Arc<dyn OutboundMessenger>,
    message: OutboundMessage,
    correlation_id: String,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        match messenger.send(&message).await {
            Ok(receipt) => info!(
                event_name = "egress.twilio.delivered",
                correlation_id = %correlation_id,
                message_sid = %receipt.message_sid,
                to = %message.to,
                "reply delivered to messaging api"
            ),
            Err(error) => warn!(
                event_name = "egress.twilio.failed",
                correlation_id = %correlation_id,
                to = %message.to,
                error = %error,
                "reply delivery failed"
            ),
        }
    })
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use secrecy::SecretString;
    use serde_json::json;
    use valbot_core::config::TwilioConfig;
    use wiremock::matchers::{basic_auth, body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::{
        deliver_in_background, DeliveryError, DeliveryReceipt, OutboundMessage,
        OutboundMessenger, TwilioMessenger,
    };

    const MESSAGES_PATH: &str = "/2010-04-01/Accounts/AC123/Messages.json";

    fn config(base_url: &str) -> TwilioConfig {
        TwilioConfig {
            account_sid: "AC123".to_owned(),
            auth_token: SecretString::from("token".to_owned()),
            whatsapp_from: "whatsapp:+14155238886".to_owned(),
            announce_to: None,
            api_base_url: base_url.to_owned(),
            timeout_secs: 5,
        }
    }

    fn message() -> OutboundMessage {
        OutboundMessage {
            to: "whatsapp:+6591234567".to_owned(),
            from: "whatsapp:+14155238886".to_owned(),
            body: "hello".to_owned(),
        }
    }

    #[tokio::test]
    async fn send_posts_form_with_basic_auth() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(MESSAGES_PATH))
            .and(basic_auth("AC123", "token"))
            .and(body_string_contains("Body=hello"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({"sid": "SM42"})))
            .expect(1)
            .mount(&server)
            .await;

        let messenger = TwilioMessenger::new(&config(&server.uri())).expect("client");
        let receipt = messenger.send(&message()).await.expect("delivery");

        assert_eq!(receipt, DeliveryReceipt { message_sid: "SM42".to_owned() });
    }

    #[tokio::test]
    async fn rejected_status_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(MESSAGES_PATH))
            .respond_with(ResponseTemplate::new(401).set_body_string("bad credentials"))
            .mount(&server)
            .await;

        let messenger = TwilioMessenger::new(&config(&server.uri())).expect("client");
        let error = messenger.send(&message()).await.expect_err("should fail");

        assert_eq!(
            error,
            DeliveryError::Rejected { status: 401, detail: "bad credentials".to_owned() }
        );
    }

    #[tokio::test]
    async fn undecodable_response_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let messenger = TwilioMessenger::new(&config(&server.uri())).expect("client");
        let error = messenger.send(&message()).await.expect_err("should fail");

        assert!(matches!(error, DeliveryError::Decode(_)));
    }

    #[test]
    fn messages_url_ignores_trailing_slash() {
        let messenger = TwilioMessenger::new(&config("https://api.twilio.com/")).expect("client");
        assert_eq!(
            messenger.messages_url(),
            "https://api.twilio.com/2010-04-01/Accounts/AC123/Messages.json"
        );
    }

    #[derive(Default)]
    struct FailingMessenger {
        attempts: Mutex<u32>,
    }

    #[async_trait]
    impl OutboundMessenger for FailingMessenger {
        async fn send(
            &self,
            _message: &OutboundMessage,
        ) -> Result<DeliveryReceipt, DeliveryError> {
            *self.attempts.lock().expect("lock") += 1;
            Err(DeliveryError::Request("connection refused".to_owned()))
        }
    }

    #[tokio::test]
    async fn background_delivery_swallows_failures() {
        let messenger = Arc::new(FailingMessenger::default());

        deliver_in_background(messenger.clone(), message(), "corr-1".to_owned())
            .await
            .expect("task should not panic");

        assert_eq!(*messenger.attempts.lock().expect("lock"), 1);
    }
}
