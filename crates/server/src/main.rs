mod bootstrap;
mod health;
mod webhook;

use std::{future::IntoFuture, sync::Arc, time::Duration};

use anyhow::Result;
use axum::Router;
use tokio::sync::Notify;
use valbot_core::config::{AppConfig, LoadOptions};

use crate::bootstrap::Application;

fn init_logging(config: &AppConfig) {
    use tracing::Level;
    use valbot_core::config::LogFormat::*;

    let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::INFO);

    match config.logging.format {
        Compact => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).compact().init();
        }
        Pretty => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).pretty().init();
        }
        Json => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).json().init();
        }
    }
}

fn app_router(app: &Application) -> Router {
    health::router(app.store.clone()).merge(webhook::router(webhook::WebhookState {
        handler: app.handler.clone(),
        messenger: app.messenger.clone(),
    }))
}

#[tokio::main]
async fn main() -> Result<()> {
    run().await
}

pub async fn run() -> Result<()> {
    let config = AppConfig::load(LoadOptions::default())?;
    init_logging(&config);

    let app = bootstrap::bootstrap_with_config(config)?;
    let address = app.config.listen_address();
    let listener = tokio::net::TcpListener::bind(&address).await?;

    tracing::info!(
        event_name = "system.server.started",
        correlation_id = "bootstrap",
        bind_address = %address,
        "valbot-server listening"
    );

    app.announce();

    let shutdown = Arc::new(Notify::new());
    let server = axum::serve(listener, app_router(&app))
        .with_graceful_shutdown({
            let shutdown = shutdown.clone();
            async move { shutdown.notified().await }
        })
        .into_future();
    tokio::pin!(server);

    tokio::select! {
        result = &mut server => return result.map_err(Into::into),
        signal = tokio::signal::ctrl_c() => signal?,
    }

    tracing::info!(
        event_name = "system.server.stopping",
        correlation_id = "shutdown",
        "valbot-server stopping"
    );
    shutdown.notify_one();

    let grace = Duration::from_secs(app.config.server.graceful_shutdown_secs);
    match tokio::time::timeout(grace, server).await {
        Ok(result) => result?,
        Err(_) => tracing::warn!(
            event_name = "system.server.shutdown_timeout",
            correlation_id = "shutdown",
            grace_secs = app.config.server.graceful_shutdown_secs,
            "in-flight requests did not drain before the grace period"
        ),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use tower::ServiceExt;
    use valbot_core::config::AppConfig;
    use valbot_whatsapp::outbound::NoopMessenger;

    use crate::{app_router, bootstrap::assemble};

    #[tokio::test]
    async fn router_serves_health_and_webhook_routes() {
        let app = assemble(AppConfig::default(), Arc::new(NoopMessenger));

        for (method, uri) in [("GET", "/health"), ("GET", "/test"), ("POST", "/twilio-status")] {
            let request = Request::builder()
                .method(method)
                .uri(uri)
                .header("content-type", "application/x-www-form-urlencoded")
                .body(Body::empty())
                .expect("request");

            let response = app_router(&app).oneshot(request).await.expect("response");
            assert_eq!(response.status(), StatusCode::OK, "{method} {uri}");
        }
    }
}
