pub mod config;
pub mod domain;
pub mod errors;
pub mod presets;
pub mod pricing;

pub use domain::preference::{
    PreferenceUpdate, UserId, UserPreference, DEFAULT_EXCHANGE_RATE, DEFAULT_PERCENTAGE,
};
pub use errors::{ApplicationError, InterfaceError};
pub use presets::{Preset, CUSTOM_PRESET, DEFAULT_PRESET};
pub use pricing::{offer, CalculationResult, DeterministicPricingEngine, PricingEngine};
