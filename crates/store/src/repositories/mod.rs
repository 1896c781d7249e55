use async_trait::async_trait;

use valbot_core::domain::preference::{PreferenceUpdate, UserId, UserPreference};

pub mod memory;

pub use memory::InMemoryPreferenceStore;

/// Owner of every [`UserPreference`]; records are only mutated through
/// [`PreferenceStore::update`].
#[async_trait]
pub trait PreferenceStore: Send + Sync {
    /// Returns the stored record, creating it with global defaults on first use.
    async fn get(&self, user_id: &UserId) -> UserPreference;

    /// Applies `update` and returns the resulting record. Updates with no valid
    /// field leave the record (including `last_updated`) untouched.
    async fn update(&self, user_id: &UserId, update: PreferenceUpdate) -> UserPreference;

    async fn known_users(&self) -> usize;
}
