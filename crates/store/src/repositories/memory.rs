use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use tracing::debug;

use valbot_core::domain::preference::{PreferenceUpdate, UserId, UserPreference};

use super::PreferenceStore;

/// Process-lifetime preference map. Records are never evicted.
///
/// Each update runs its read-modify-write under one write guard, so
/// concurrent updates for the same user are applied one after another.
#[derive(Default)]
pub struct InMemoryPreferenceStore {
    preferences: RwLock<HashMap<String, UserPreference>>,
}

impl InMemoryPreferenceStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PreferenceStore for InMemoryPreferenceStore {
    async fn get(&self, user_id: &UserId) -> UserPreference {
        {
            let preferences = self.preferences.read().await;
            if let Some(preference) = preferences.get(user_id.as_str()) {
                return preference.clone();
            }
        }

        let mut preferences = self.preferences.write().await;
        preferences
            .entry(user_id.0.clone())
            .or_insert_with(|| {
                debug!(
                    event_name = "store.preference.created",
                    user_id = %user_id.as_str(),
                    "created default preference record"
                );
                UserPreference::default()
            })
            .clone()
    }

    async fn update(&self, user_id: &UserId, update: PreferenceUpdate) -> UserPreference {
        let mut preferences = self.preferences.write().await;
        let preference = preferences.entry(user_id.0.clone()).or_default();

        if preference.apply(&update, Utc::now()) {
            debug!(
                event_name = "store.preference.updated",
                user_id = %user_id.as_str(),
                active_preset = %preference.active_preset,
                percentage = %preference.percentage,
                exchange_rate = %preference.exchange_rate,
                "updated preference record"
            );
        }

        preference.clone()
    }

    async fn known_users(&self) -> usize {
        self.preferences.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use rust_decimal::Decimal;
    use valbot_core::domain::preference::{
        PreferenceUpdate, UserId, DEFAULT_EXCHANGE_RATE, DEFAULT_PERCENTAGE,
    };

    use crate::repositories::{InMemoryPreferenceStore, PreferenceStore};

    fn user(id: &str) -> UserId {
        UserId(id.to_owned())
    }

    #[tokio::test]
    async fn get_creates_default_record_lazily() {
        let store = InMemoryPreferenceStore::new();
        assert_eq!(store.known_users().await, 0);

        let preference = store.get(&user("whatsapp:+6500000001")).await;

        assert_eq!(preference.percentage, DEFAULT_PERCENTAGE);
        assert_eq!(preference.exchange_rate, DEFAULT_EXCHANGE_RATE);
        assert_eq!(preference.active_preset, "default");
        assert!(preference.last_updated.is_none());
        assert_eq!(store.known_users().await, 1);
    }

    #[tokio::test]
    async fn get_is_idempotent_without_updates() {
        let store = InMemoryPreferenceStore::new();
        let id = user("whatsapp:+6500000002");
        store.update(&id, PreferenceUpdate::values(Some(Decimal::new(551, 2)), None)).await;

        let first = store.get(&id).await;
        let second = store.get(&id).await;

        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn preset_update_overwrites_both_fields() {
        let store = InMemoryPreferenceStore::new();
        let id = user("whatsapp:+6500000003");

        let updated = store.update(&id, PreferenceUpdate::preset("custom_rate_low")).await;

        assert_eq!(updated.percentage, DEFAULT_PERCENTAGE);
        assert_eq!(updated.exchange_rate, Decimal::new(535, 2));
        assert_eq!(updated.active_preset, "custom_rate_low");
        assert!(updated.last_updated.is_some());
    }

    #[tokio::test]
    async fn invalid_update_keeps_timestamp() {
        let store = InMemoryPreferenceStore::new();
        let id = user("whatsapp:+6500000004");
        let before = store.update(&id, PreferenceUpdate::preset("high")).await;

        let after = store
            .update(&id, PreferenceUpdate::values(Some(Decimal::new(-1, 0)), Some(Decimal::ZERO)))
            .await;

        assert_eq!(before, after);
        assert_eq!(before.last_updated, after.last_updated);
    }

    #[tokio::test]
    async fn users_are_isolated() {
        let store = InMemoryPreferenceStore::new();
        store.update(&user("a"), PreferenceUpdate::preset("low")).await;

        let other = store.get(&user("b")).await;

        assert_eq!(other.active_preset, "default");
        assert_eq!(store.get(&user("a")).await.active_preset, "low");
    }

    #[tokio::test]
    async fn concurrent_updates_for_one_user_are_not_lost() {
        let store = Arc::new(InMemoryPreferenceStore::new());
        let id = user("whatsapp:+6500000005");

        let rate_store = Arc::clone(&store);
        let rate_id = id.clone();
        let rate = tokio::spawn(async move {
            rate_store
                .update(&rate_id, PreferenceUpdate::values(Some(Decimal::new(560, 2)), None))
                .await
        });
        let percent_store = Arc::clone(&store);
        let percent_id = id.clone();
        let percent = tokio::spawn(async move {
            percent_store
                .update(&percent_id, PreferenceUpdate::values(None, Some(Decimal::new(90, 0))))
                .await
        });

        rate.await.expect("rate task");
        percent.await.expect("percent task");

        let merged = store.get(&id).await;
        assert_eq!(merged.exchange_rate, Decimal::new(560, 2));
        assert_eq!(merged.percentage, Decimal::new(90, 2));
        assert_eq!(merged.active_preset, "custom");
    }
}
