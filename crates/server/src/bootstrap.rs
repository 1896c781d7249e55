use std::sync::Arc;

use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::info;
use valbot_core::config::{AppConfig, ConfigError};
use valbot_store::{InMemoryPreferenceStore, PreferenceStore};
use valbot_whatsapp::{
    events::WebhookHandler,
    format::ANNOUNCEMENT_TEXT,
    outbound::{
        deliver_in_background, DeliveryError, OutboundMessage, OutboundMessenger, TwilioMessenger,
    },
};

pub struct Application {
    pub config: AppConfig,
    pub store: Arc<dyn PreferenceStore>,
    pub messenger: Arc<dyn OutboundMessenger>,
    pub handler: Arc<WebhookHandler>,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("messaging client setup failed: {0}")]
    Messenger(#[source] DeliveryError),
}

pub fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        "starting application bootstrap"
    );

    let messenger: Arc<dyn OutboundMessenger> =
        Arc::new(TwilioMessenger::new(&config.twilio).map_err(BootstrapError::Messenger)?);
    Ok(assemble(config, messenger))
}

/// Wires the store and handler around an already-built messenger.
pub fn assemble(config: AppConfig, messenger: Arc<dyn OutboundMessenger>) -> Application {
    let store: Arc<dyn PreferenceStore> = Arc::new(InMemoryPreferenceStore::new());
    let handler = Arc::new(WebhookHandler::new(store.clone(), config.twilio.whatsapp_from.clone()));

    info!(
        event_name = "system.bootstrap.ready",
        correlation_id = "bootstrap",
        "application components assembled"
    );

    Application { config, store, messenger, handler }
}

impl Application {
    /// Sends the online notice when a recipient is configured.
    pub fn announce(&self) -> Option<JoinHandle<()>> {
        let to = self.config.twilio.announce_to.clone()?;
        let message = OutboundMessage {
            to,
            from: self.config.twilio.whatsapp_from.clone(),
            body: ANNOUNCEMENT_TEXT.to_owned(),
        };
        Some(deliver_in_background(self.messenger.clone(), message, "startup".to_owned()))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use valbot_core::config::{AppConfig, ConfigOverrides, LoadOptions};
    use valbot_whatsapp::format::ANNOUNCEMENT_TEXT;
    use valbot_whatsapp::outbound::{
        DeliveryError, DeliveryReceipt, OutboundMessage, OutboundMessenger,
    };

    use crate::bootstrap::{assemble, BootstrapError};

    #[derive(Default)]
    struct RecordingMessenger {
        sent: Mutex<Vec<OutboundMessage>>,
    }

    #[async_trait]
    impl OutboundMessenger for RecordingMessenger {
        async fn send(&self, message: &OutboundMessage) -> Result<DeliveryReceipt, DeliveryError> {
            self.sent.lock().expect("lock").push(message.clone());
            Ok(DeliveryReceipt { message_sid: "SMtest".to_owned() })
        }
    }

    fn config(announce_to: Option<&str>) -> AppConfig {
        let mut config = AppConfig::default();
        config.twilio.account_sid = "AC123".to_owned();
        config.twilio.auth_token = "token".to_owned().into();
        config.twilio.whatsapp_from = "whatsapp:+14155238886".to_owned();
        config.twilio.announce_to = announce_to.map(str::to_owned);
        config
    }

    #[test]
    fn bootstrap_fails_fast_with_invalid_account_sid() {
        let result = AppConfig::load(LoadOptions {
            overrides: ConfigOverrides {
                twilio_account_sid: Some("not-a-sid".to_owned()),
                twilio_auth_token: Some("token".to_owned()),
                twilio_whatsapp_from: Some("whatsapp:+14155238886".to_owned()),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        })
        .map_err(BootstrapError::from);

        let message = result.err().expect("error").to_string();
        assert!(message.contains("twilio.account_sid"));
    }

    #[tokio::test]
    async fn announce_sends_online_notice_to_configured_recipient() {
        let messenger = Arc::new(RecordingMessenger::default());
        let app = assemble(config(Some("whatsapp:+6590000000")), messenger.clone());

        app.announce().expect("announcement task").await.expect("task should finish");

        let sent = messenger.sent.lock().expect("lock");
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "whatsapp:+6590000000");
        assert_eq!(sent[0].from, "whatsapp:+14155238886");
        assert_eq!(sent[0].body, ANNOUNCEMENT_TEXT);
    }

    #[tokio::test]
    async fn announce_is_skipped_without_recipient() {
        let messenger = Arc::new(RecordingMessenger::default());
        let app = assemble(config(None), messenger.clone());

        assert!(app.announce().is_none());
        assert!(messenger.sent.lock().expect("lock").is_empty());
    }
}
