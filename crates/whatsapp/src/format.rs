//! Plain-text reply rendering.
//!
//! WhatsApp renders `*bold*` and `_italic_`; everything else is sent as-is.

use chrono::{DateTime, Local, Utc};
use rust_decimal::{Decimal, RoundingStrategy};

use valbot_core::domain::preference::UserPreference;
use valbot_core::presets::{self, Preset};
use valbot_core::pricing::CalculationResult;

pub const WELCOME_TEXT: &str = "Welcome to the Valuation Bot! Use /calculate [price] to get an offer, or /help for more information.";

pub const CALCULATE_USAGE_TEXT: &str = "Please provide a price to calculate.\n\nExamples:\n/calculate 15000\n/calculate rate=5.45 p=92.5 15000\n/calculate 15000\n30000 (one price per line)";

pub const SET_USAGE_TEXT: &str = "Please provide at least one valid setting.\n\nExample: /set rate=5.45 p=92.5\n- rate must be greater than 0\n- p must be greater than 0 and at most 100";

pub const RESET_CONFIRMATION_TEXT: &str =
    "Your settings have been reset to the defaults: 93% at an exchange rate of 5.43.";

pub const ANNOUNCEMENT_TEXT: &str = "Valuation Bot is now online! Send /help for instructions.";

pub const CURRENCY: &str = "SGD";

/// Sections are separated by one blank line; empty sections are dropped.
#[derive(Debug, Default)]
pub struct MessageBuilder {
    sections: Vec<String>,
}

impl MessageBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        let text = text.into();
        if !text.is_empty() {
            self.sections.push(text);
        }
        self
    }

    pub fn section<F>(mut self, build: F) -> Self
    where
        F: FnOnce(&mut SectionBuilder),
    {
        let mut builder = SectionBuilder::default();
        build(&mut builder);
        if !builder.lines.is_empty() {
            self.sections.push(builder.lines.join("\n"));
        }
        self
    }

    pub fn build(self) -> String {
        self.sections.join("\n\n")
    }
}

#[derive(Debug, Default)]
pub struct SectionBuilder {
    lines: Vec<String>,
}

impl SectionBuilder {
    pub fn line(&mut self, line: impl Into<String>) -> &mut Self {
        self.lines.push(line.into());
        self
    }

    pub fn bold(&mut self, line: impl AsRef<str>) -> &mut Self {
        self.lines.push(format!("*{}*", line.as_ref()));
        self
    }
}

pub fn render_calculation(result: &CalculationResult) -> String {
    MessageBuilder::new()
        .section(|section| {
            section
                .line(format!("Buff Price: {}", display_decimal(result.price)))
                .line(format!("Percentage: {}%", percent_one_dp(result.percentage)))
                .line(format!("Exchange Rate: {}", display_decimal(result.exchange_rate)))
                .bold(format!("Offer: {CURRENCY} {}", money(result.offer)));
        })
        .build()
}

/// Full `/calculate` reply: one block per price, a summary when several
/// prices were given, and a note when saved non-default values were used.
pub fn render_calculation_reply(
    results: &[CalculationResult],
    preference: &UserPreference,
) -> String {
    let mut builder = MessageBuilder::new().text("*Price Calculation*");
    for result in results {
        builder = builder.text(render_calculation(result));
    }

    if results.len() > 1 {
        let offers = results
            .iter()
            .map(|result| format!("{CURRENCY} {}", money(result.offer)))
            .collect::<Vec<_>>()
            .join(", ");
        builder = builder.text(format!("*Summary:* {} items | Offers: {offers}", results.len()));
    }

    if !preference.is_global_default() {
        builder = builder.text(saved_preference_note(preference));
    }

    builder.build()
}

pub fn saved_preference_note(preference: &UserPreference) -> String {
    format!(
        "_Using your saved settings: {}% at exchange rate {}. Send /reset to restore the defaults._",
        percent_one_dp(preference.percentage),
        display_decimal(preference.exchange_rate)
    )
}

pub fn render_settings_form(preference: &UserPreference) -> String {
    let last_updated = preference
        .last_updated
        .map(format_timestamp)
        .unwrap_or_else(|| "N/A".to_owned());

    MessageBuilder::new()
        .section(|section| {
            section.bold("Current Settings");
            if !preference.is_custom() {
                section.line(format!(
                    "Preset: {}",
                    presets::display_name(&preference.active_preset)
                ));
            }
            section
                .line(format!("Percentage: {}%", percent_one_dp(preference.percentage)))
                .line(format!("Exchange Rate: {}", display_decimal(preference.exchange_rate)))
                .line(format!("Last Updated: {last_updated}"));
        })
        .section(|section| {
            section.bold("Quick Actions");
            for preset in presets::all() {
                section.line(preset_hint(preset));
            }
            section
                .line("/set rate=5.45 p=92.5 - custom values")
                .line("/reset - restore the defaults");
        })
        .build()
}

pub fn render_preset_applied(preference: &UserPreference) -> String {
    MessageBuilder::new()
        .text(format!(
            "Preset *{}* applied.",
            presets::display_name(&preference.active_preset)
        ))
        .text(render_settings_form(preference))
        .build()
}

pub fn render_unknown_preset(name: &str, preference: &UserPreference) -> String {
    let available = presets::all().iter().map(|preset| preset.key).collect::<Vec<_>>().join(", ");

    MessageBuilder::new()
        .text(format!("Unknown preset `{name}`. Available presets: {available}"))
        .text(render_settings_form(preference))
        .build()
}

pub fn render_settings_updated(preference: &UserPreference) -> String {
    MessageBuilder::new().text("Settings updated.").text(render_settings_form(preference)).build()
}

pub fn help_text() -> String {
    MessageBuilder::new()
        .text("*Valuation Bot Help*")
        .text("- For most items, I offer between 92% - 93.5% of the maximum price.")
        .section(|section| {
            section
                .bold("Calculate an offer")
                .line("/calculate [price] - one or more prices, one per line")
                .line("/calculate rate=[rate] p=[percentage] [price] - use and save custom values");
        })
        .section(|section| {
            section
                .bold("Settings")
                .line("/settings - show your current settings")
                .line("/settings [preset] - apply a preset (default, high, low, custom_rate_high, custom_rate_low)")
                .line("/set rate=[rate] p=[percentage] - save custom values")
                .line("/reset - restore 93% at rate 5.43");
        })
        .section(|section| {
            section
                .bold("Examples")
                .line("/calculate 15000 (uses your saved settings)")
                .line("/calculate rate=5.45 p=92.5 15000")
                .line("/settings high")
                .line("/set p=92.5");
        })
        .build()
}

fn preset_hint(preset: &Preset) -> String {
    format!(
        "/settings {} - {}% at {}",
        preset.key,
        percent_one_dp(preset.percentage),
        display_decimal(preset.exchange_rate)
    )
}

fn format_timestamp(instant: DateTime<Utc>) -> String {
    instant.with_timezone(&Local).format("%d/%m/%Y, %H:%M:%S").to_string()
}

/// Fraction rendered as a percentage with one decimal place.
pub fn percent_one_dp(fraction: Decimal) -> String {
    let percent = (fraction * Decimal::ONE_HUNDRED)
        .round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero);
    format!("{percent:.1}")
}

pub fn money(value: Decimal) -> String {
    let rounded = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    format!("{rounded:.2}")
}

fn display_decimal(value: Decimal) -> String {
    value.normalize().to_string()
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use rust_decimal::Decimal;
    use valbot_core::domain::preference::{PreferenceUpdate, UserPreference};
    use valbot_core::pricing::{DeterministicPricingEngine, PricingEngine};

    use super::{
        help_text, money, percent_one_dp, render_calculation, render_calculation_reply,
        render_settings_form, render_unknown_preset, MessageBuilder,
    };

    fn result(price: i64) -> valbot_core::pricing::CalculationResult {
        DeterministicPricingEngine.calculate(
            Decimal::new(price, 0),
            Decimal::new(93, 2),
            Decimal::new(543, 2),
        )
    }

    #[test]
    fn builder_skips_empty_sections() {
        let text = MessageBuilder::new().text("a").text("").section(|_| {}).text("b").build();
        assert_eq!(text, "a\n\nb");
    }

    #[test]
    fn calculation_block_has_four_lines() {
        let block = render_calculation(&result(15_000));
        assert_eq!(
            block,
            "Buff Price: 15000\nPercentage: 93.0%\nExchange Rate: 5.43\n*Offer: SGD 2569.06*"
        );
    }

    #[test]
    fn number_helpers_round_half_away_from_zero() {
        assert_eq!(money(Decimal::new(12345, 3)), "12.35");
        assert_eq!(money(Decimal::new(5, 0)), "5.00");
        assert_eq!(percent_one_dp(Decimal::new(925, 3)), "92.5");
        assert_eq!(percent_one_dp(Decimal::ONE), "100.0");
    }

    #[test]
    fn single_result_reply_has_no_summary_or_note() {
        let reply = render_calculation_reply(&[result(15_000)], &UserPreference::default());
        assert!(reply.starts_with("*Price Calculation*"));
        assert!(!reply.contains("Summary"));
        assert!(!reply.contains("saved settings"));
    }

    #[test]
    fn multi_result_reply_lists_count_and_offers() {
        let reply =
            render_calculation_reply(&[result(15_000), result(30_000)], &UserPreference::default());
        assert!(reply.contains("*Summary:* 2 items | Offers: SGD 2569.06, SGD 5138.12"));
    }

    #[test]
    fn non_default_preference_adds_note() {
        let mut preference = UserPreference::default();
        preference.apply(&PreferenceUpdate::values(Some(Decimal::new(545, 2)), None), Utc::now());

        let reply = render_calculation_reply(&[result(1_000)], &preference);
        assert!(reply.contains("_Using your saved settings: 93.0% at exchange rate 5.45."));
    }

    #[test]
    fn settings_form_shows_preset_and_missing_timestamp() {
        let form = render_settings_form(&UserPreference::default());
        assert!(form.contains("Preset: Default (93%)"));
        assert!(form.contains("Percentage: 93.0%"));
        assert!(form.contains("Exchange Rate: 5.43"));
        assert!(form.contains("Last Updated: N/A"));
        assert!(form.contains("/settings custom_rate_low - 93.0% at 5.35"));
        assert!(form.contains("/reset"));
    }

    #[test]
    fn settings_form_omits_custom_preset_line() {
        let mut preference = UserPreference::default();
        preference.apply(&PreferenceUpdate::values(None, Some(Decimal::new(90, 0))), Utc::now());

        let form = render_settings_form(&preference);
        assert!(!form.contains("Preset:"));
        assert!(form.contains("Percentage: 90.0%"));
        assert!(!form.contains("Last Updated: N/A"));
    }

    #[test]
    fn unknown_preset_lists_catalog_keys() {
        let text = render_unknown_preset("premium", &UserPreference::default());
        assert!(text.starts_with("Unknown preset `premium`."));
        assert!(text.contains("default, high, low, custom_rate_high, custom_rate_low"));
        assert!(text.contains("*Current Settings*"));
    }

    #[test]
    fn help_mentions_every_command() {
        let help = help_text();
        for command in ["/calculate", "/settings", "/set ", "/reset"] {
            assert!(help.contains(command), "help should mention {command}");
        }
    }
}
