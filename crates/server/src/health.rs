use std::sync::Arc;

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use chrono::Utc;
use serde::Serialize;
use valbot_store::PreferenceStore;

pub const TEST_RESPONSE_TEXT: &str = "Valuation Bot is running!";

#[derive(Clone)]
pub struct HealthState {
    store: Arc<dyn PreferenceStore>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthCheck {
    pub status: &'static str,
    pub detail: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: HealthCheck,
    pub known_users: usize,
    pub checked_at: String,
}

pub fn router(store: Arc<dyn PreferenceStore>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/test", get(liveness))
        .with_state(HealthState { store })
}

pub async fn health(State(state): State<HealthState>) -> (StatusCode, Json<HealthResponse>) {
    let payload = HealthResponse {
        status: "ready",
        service: HealthCheck {
            status: "ready",
            detail: "valbot-server runtime initialized".to_string(),
        },
        known_users: state.store.known_users().await,
        checked_at: Utc::now().to_rfc3339(),
    };

    (StatusCode::OK, Json(payload))
}

pub async fn liveness() -> &'static str {
    TEST_RESPONSE_TEXT
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::{to_bytes, Body},
        extract::State,
        http::{Request, StatusCode},
        Json,
    };
    use tower::ServiceExt;
    use valbot_core::domain::preference::UserId;
    use valbot_store::{InMemoryPreferenceStore, PreferenceStore};

    use crate::health::{health, router, HealthState, TEST_RESPONSE_TEXT};

    #[tokio::test]
    async fn health_reports_known_user_count() {
        let store = Arc::new(InMemoryPreferenceStore::new());
        store.get(&UserId::from("whatsapp:+6500000001")).await;

        let (status, Json(payload)) = health(State(HealthState { store })).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(payload.status, "ready");
        assert_eq!(payload.service.status, "ready");
        assert_eq!(payload.known_users, 1);
    }

    #[tokio::test]
    async fn test_route_returns_liveness_text() {
        let app = router(Arc::new(InMemoryPreferenceStore::new()));

        let response = app
            .oneshot(Request::builder().uri("/test").body(Body::empty()).expect("request"))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX).await.expect("body");
        assert_eq!(body, TEST_RESPONSE_TEXT.as_bytes());
    }
}
