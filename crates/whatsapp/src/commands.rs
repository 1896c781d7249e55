use std::str::FromStr;
use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::debug;

use valbot_core::domain::preference::{
    is_valid_exchange_rate, is_valid_percent, PreferenceUpdate, UserId,
};
use valbot_core::presets::{self, DEFAULT_PRESET};
use valbot_core::pricing::{DeterministicPricingEngine, PricingEngine};
use valbot_store::PreferenceStore;

use crate::format;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Token {
    KeyValue { key: String, value: String },
    Number(Decimal),
    Unparsed(String),
}

/// Splits one line on whitespace into typed tokens.
pub fn tokenize(line: &str) -> Vec<Token> {
    line.split_whitespace().map(classify_token).collect()
}

fn classify_token(raw: &str) -> Token {
    if let Some((key, value)) = raw.split_once('=') {
        return Token::KeyValue { key: key.to_ascii_lowercase(), value: value.to_owned() };
    }

    match parse_number(raw) {
        Some(number) => Token::Number(number),
        None => Token::Unparsed(raw.to_owned()),
    }
}

/// Valid `rate=` / `p=` values found on a command line. Invalid or missing
/// values are `None`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ParameterOverrides {
    pub exchange_rate: Option<Decimal>,
    /// 0-100 scale.
    pub percent: Option<Decimal>,
}

impl ParameterOverrides {
    pub fn from_tokens(tokens: &[Token]) -> Self {
        let mut overrides = Self::default();
        for token in tokens {
            let Token::KeyValue { key, value } = token else {
                continue;
            };
            match key.as_str() {
                "rate" => {
                    if let Some(rate) = parse_decimal_token(value).filter(|rate| {
                        is_valid_exchange_rate(*rate)
                    }) {
                        overrides.exchange_rate = Some(rate);
                    }
                }
                "p" => {
                    if let Some(percent) =
                        parse_decimal_token(value).filter(|percent| is_valid_percent(*percent))
                    {
                        overrides.percent = Some(percent);
                    }
                }
                _ => {}
            }
        }
        overrides
    }

    pub fn is_empty(&self) -> bool {
        self.exchange_rate.is_none() && self.percent.is_none()
    }

    pub fn to_update(&self) -> PreferenceUpdate {
        PreferenceUpdate::values(self.exchange_rate, self.percent)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BotCommand {
    Calculate { overrides: ParameterOverrides, prices: Vec<Decimal> },
    Settings { preset: Option<String> },
    Reset,
    Set { overrides: ParameterOverrides },
    Help,
    Unknown,
}

impl BotCommand {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Calculate { .. } => "calculate",
            Self::Settings { .. } => "settings",
            Self::Reset => "reset",
            Self::Set { .. } => "set",
            Self::Help => "help",
            Self::Unknown => "unknown",
        }
    }
}

/// Parses a message body. Commands are matched by case-insensitive prefix;
/// `/settings` is checked before `/set`.
pub fn parse_command(input: &str) -> BotCommand {
    let trimmed = input.trim();
    let lowered = trimmed.to_ascii_lowercase();

    if lowered.starts_with("/calculate") {
        let lines = trimmed.lines().map(tokenize).collect::<Vec<_>>();
        let overrides =
            lines.first().map(|tokens| ParameterOverrides::from_tokens(tokens)).unwrap_or_default();
        let prices = lines
            .iter()
            .flatten()
            .filter_map(|token| match token {
                Token::Number(price) if *price > Decimal::ZERO => Some(*price),
                _ => None,
            })
            .collect();
        return BotCommand::Calculate { overrides, prices };
    }

    if lowered.starts_with("/settings") {
        let preset = trimmed.split_whitespace().nth(1).map(str::to_owned);
        return BotCommand::Settings { preset };
    }

    if lowered.starts_with("/reset") {
        return BotCommand::Reset;
    }

    if lowered.starts_with("/set") {
        return BotCommand::Set { overrides: ParameterOverrides::from_tokens(&tokenize(trimmed)) };
    }

    if lowered.starts_with("/help") {
        return BotCommand::Help;
    }

    BotCommand::Unknown
}

/// Resolves commands against the preference store and renders the reply.
pub struct CommandRouter {
    store: Arc<dyn PreferenceStore>,
    pricing: DeterministicPricingEngine,
}

impl CommandRouter {
    pub fn new(store: Arc<dyn PreferenceStore>) -> Self {
        Self { store, pricing: DeterministicPricingEngine }
    }

    pub fn store(&self) -> &Arc<dyn PreferenceStore> {
        &self.store
    }

    pub async fn reply(&self, user_id: &UserId, text: &str) -> String {
        self.route(user_id, parse_command(text)).await
    }

    pub async fn route(&self, user_id: &UserId, command: BotCommand) -> String {
        debug!(
            event_name = "ingress.command.dispatched",
            command = command.name(),
            user_id = %user_id.as_str(),
            "dispatching chat command"
        );

        match command {
            BotCommand::Calculate { overrides, prices } => {
                self.calculate(user_id, overrides, prices).await
            }
            BotCommand::Settings { preset: None } => {
                format::render_settings_form(&self.store.get(user_id).await)
            }
            BotCommand::Settings { preset: Some(name) } => self.apply_preset(user_id, name).await,
            BotCommand::Reset => {
                self.store.update(user_id, PreferenceUpdate::preset(DEFAULT_PRESET)).await;
                format::RESET_CONFIRMATION_TEXT.to_owned()
            }
            BotCommand::Set { overrides } => {
                if overrides.is_empty() {
                    return format::SET_USAGE_TEXT.to_owned();
                }
                let preference = self.store.update(user_id, overrides.to_update()).await;
                format::render_settings_updated(&preference)
            }
            BotCommand::Help => format::help_text(),
            BotCommand::Unknown => format::WELCOME_TEXT.to_owned(),
        }
    }

    async fn calculate(
        &self,
        user_id: &UserId,
        overrides: ParameterOverrides,
        prices: Vec<Decimal>,
    ) -> String {
        // Valid overrides are saved even when no price follows.
        let preference = if overrides.is_empty() {
            self.store.get(user_id).await
        } else {
            self.store.update(user_id, overrides.to_update()).await
        };

        if prices.is_empty() {
            return format::CALCULATE_USAGE_TEXT.to_owned();
        }

        let results = prices
            .into_iter()
            .map(|price| {
                self.pricing.calculate(price, preference.percentage, preference.exchange_rate)
            })
            .collect::<Vec<_>>();

        format::render_calculation_reply(&results, &preference)
    }

    async fn apply_preset(&self, user_id: &UserId, name: String) -> String {
        if presets::find(&name).is_none() {
            let preference = self.store.get(user_id).await;
            return format::render_unknown_preset(&name, &preference);
        }

        let preference = self.store.update(user_id, PreferenceUpdate::preset(name)).await;
        format::render_preset_applied(&preference)
    }
}

fn parse_decimal_token(token: &str) -> Option<Decimal> {
    parse_number(token.trim().trim_end_matches('%'))
}

/// Plain decimal literal. `Decimal::from_str` also takes `_` digit separators,
/// which chat input never means.
fn parse_number(raw: &str) -> Option<Decimal> {
    if raw.contains('_') {
        return None;
    }
    Decimal::from_str(raw).ok()
}
