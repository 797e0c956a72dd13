//! Telegram alerts for big deals.
//!
//! This crate provides:
//! - Per-recipient polling subscriptions with start/stop control
//! - Delivery of cycle output through a [`Notifier`]
//! - The Telegram bot that maps chat commands onto subscriptions

pub mod config;
pub mod notifier;
pub mod subscription;
pub mod telegram;

pub use config::PollConfig;
pub use notifier::{deliver, Notifier, NotifyError, RecipientId, TelegramNotifier};
pub use subscription::SubscriptionManager;
pub use telegram::{Action, Command, TelegramBot, TelegramError};
