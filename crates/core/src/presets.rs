use rust_decimal::Decimal;

pub const DEFAULT_PRESET: &str = "default";
pub const CUSTOM_PRESET: &str = "custom";

pub const PERCENTAGE_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 3);
pub const RATE_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Preset {
    pub key: &'static str,
    pub display_name: &'static str,
    pub percentage: Decimal,
    pub exchange_rate: Decimal,
}

impl Preset {
    pub fn matches(&self, percentage: Decimal, exchange_rate: Decimal) -> bool {
        (self.percentage - percentage).abs() < PERCENTAGE_TOLERANCE
            && (self.exchange_rate - exchange_rate).abs() < RATE_TOLERANCE
    }
}

const PRESETS: [Preset; 5] = [
    Preset {
        key: DEFAULT_PRESET,
        display_name: "Default (93%)",
        percentage: Decimal::from_parts(93, 0, 0, false, 2),
        exchange_rate: Decimal::from_parts(543, 0, 0, false, 2),
    },
    Preset {
        key: "high",
        display_name: "High (93.5%)",
        percentage: Decimal::from_parts(935, 0, 0, false, 3),
        exchange_rate: Decimal::from_parts(543, 0, 0, false, 2),
    },
    Preset {
        key: "low",
        display_name: "Low (92%)",
        percentage: Decimal::from_parts(92, 0, 0, false, 2),
        exchange_rate: Decimal::from_parts(543, 0, 0, false, 2),
    },
    Preset {
        key: "custom_rate_high",
        display_name: "Higher Rate (5.50)",
        percentage: Decimal::from_parts(93, 0, 0, false, 2),
        exchange_rate: Decimal::from_parts(550, 0, 0, false, 2),
    },
    Preset {
        key: "custom_rate_low",
        display_name: "Lower Rate (5.35)",
        percentage: Decimal::from_parts(93, 0, 0, false, 2),
        exchange_rate: Decimal::from_parts(535, 0, 0, false, 2),
    },
];

pub fn all() -> &'static [Preset] {
    &PRESETS
}

/// Case-sensitive lookup by catalog key.
pub fn find(key: &str) -> Option<&'static Preset> {
    PRESETS.iter().find(|preset| preset.key == key)
}

/// First preset, in catalog order, within tolerance of the given values.
pub fn matching(percentage: Decimal, exchange_rate: Decimal) -> Option<&'static Preset> {
    PRESETS.iter().find(|preset| preset.matches(percentage, exchange_rate))
}

pub fn display_name(key: &str) -> &str {
    find(key).map(|preset| preset.display_name).unwrap_or(key)
}
