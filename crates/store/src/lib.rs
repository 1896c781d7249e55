pub mod repositories;

pub use repositories::{InMemoryPreferenceStore, PreferenceStore};
