//! WhatsApp interface for the valuation bot.
//!
//! - **Commands** (`commands`) - `/calculate`, `/settings`, `/set`, `/reset`, `/help`
//! - **Events** (`events`) - Twilio webhook payloads, status callbacks, reply addressing
//! - **Formatting** (`format`) - plain-text replies with WhatsApp emphasis markers
//! - **Outbound** (`outbound`) - Twilio Messages API client and background delivery
//!
//! ```text
//! Twilio webhook → WebhookHandler → CommandRouter → PreferenceStore / PricingEngine
//!                        ↓
//!                 OutboundMessenger ← reply text
//! ```

pub mod commands;
pub mod events;
pub mod format;
pub mod outbound;
