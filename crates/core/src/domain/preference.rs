use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::presets::{self, CUSTOM_PRESET, DEFAULT_PRESET};

/// 93%
pub const DEFAULT_PERCENTAGE: Decimal = Decimal::from_parts(93, 0, 0, false, 2);
/// 1 SGD = 5.43
pub const DEFAULT_EXCHANGE_RATE: Decimal = Decimal::from_parts(543, 0, 0, false, 2);

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub String);

impl UserId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for UserId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserPreference {
    pub exchange_rate: Decimal,
    /// Stored as a fraction in `(0, 1]`.
    pub percentage: Decimal,
    pub active_preset: String,
    pub last_updated: Option<DateTime<Utc>>,
}

impl Default for UserPreference {
    fn default() -> Self {
        Self {
            exchange_rate: DEFAULT_EXCHANGE_RATE,
            percentage: DEFAULT_PERCENTAGE,
            active_preset: DEFAULT_PRESET.to_owned(),
            last_updated: None,
        }
    }
}

impl UserPreference {
    pub fn is_global_default(&self) -> bool {
        self.percentage == DEFAULT_PERCENTAGE && self.exchange_rate == DEFAULT_EXCHANGE_RATE
    }

    pub fn is_custom(&self) -> bool {
        self.active_preset == CUSTOM_PRESET
    }

    /// Applies a change request and returns whether any field was written.
    ///
    /// A known preset wins over the individual values. Invalid values are
    /// skipped; `active_preset` is recomputed only when something changed.
    pub fn apply(&mut self, update: &PreferenceUpdate, now: DateTime<Utc>) -> bool {
        if let Some(preset) = update.preset.as_deref().and_then(presets::find) {
            self.percentage = preset.percentage;
            self.exchange_rate = preset.exchange_rate;
            self.active_preset = preset.key.to_owned();
            self.last_updated = Some(now);
            return true;
        }

        let mut changed = false;
        if let Some(rate) = update.exchange_rate.filter(|rate| is_valid_exchange_rate(*rate)) {
            self.exchange_rate = rate;
            changed = true;
        }
        if let Some(fraction) = update.percent.and_then(percent_to_fraction) {
            self.percentage = fraction;
            changed = true;
        }

        if changed {
            self.active_preset = presets::matching(self.percentage, self.exchange_rate)
                .map(|preset| preset.key)
                .unwrap_or(CUSTOM_PRESET)
                .to_owned();
            self.last_updated = Some(now);
        }

        changed
    }
}

/// Requested change to a [`UserPreference`].
///
/// `percent` is expressed on the 0-100 scale as typed by the user.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PreferenceUpdate {
    pub exchange_rate: Option<Decimal>,
    pub percent: Option<Decimal>,
    pub preset: Option<String>,
}

impl PreferenceUpdate {
    pub fn values(exchange_rate: Option<Decimal>, percent: Option<Decimal>) -> Self {
        Self { exchange_rate, percent, preset: None }
    }

    pub fn preset(name: impl Into<String>) -> Self {
        Self { exchange_rate: None, percent: None, preset: Some(name.into()) }
    }
}

pub fn is_valid_exchange_rate(rate: Decimal) -> bool {
    rate > Decimal::ZERO
}

pub fn is_valid_percent(percent: Decimal) -> bool {
    percent_to_fraction(percent).is_some()
}

/// Converts a 0-100 percent into the stored fraction. Values whose fraction
/// rounds to zero at 28 decimal places are rejected.
fn percent_to_fraction(percent: Decimal) -> Option<Decimal> {
    if percent > Decimal::ONE_HUNDRED {
        return None;
    }
    Some(percent / Decimal::ONE_HUNDRED).filter(|fraction| *fraction > Decimal::ZERO)
}
