//! Telegram bot handlers.

use crate::notifier::RecipientId;
use crate::subscription::SubscriptionManager;
use bigdeal_core::group_digits;
use std::sync::Arc;
use teloxide::prelude::*;
use teloxide::types::{KeyboardButton, KeyboardMarkup, KeyboardRemove};
use teloxide::utils::command::BotCommands;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum TelegramError {
    #[error("Telegram API error: {0}")]
    Api(#[from] teloxide::RequestError),
}

pub const SUBSCRIBE_LABEL: &str = "Subscribe";
pub const UNSUBSCRIBE_LABEL: &str = "Unsubscribe";
pub const SET_THRESHOLD_LABEL: &str = "Set minimum displayed value $";
pub const SHOW_THRESHOLD_LABEL: &str = "Show minimum displayed value $";

/// Slash commands.
#[derive(BotCommands, Clone, Debug, PartialEq, Eq)]
#[command(rename_rule = "lowercase", description = "Available commands:")]
pub enum Command {
    #[command(description = "Start receiving big-deal alerts")]
    Start,
    #[command(description = "Same as /start")]
    Subscribe,
    #[command(description = "Stop receiving alerts")]
    Stop,
    #[command(description = "Same as /stop")]
    Unsubscribe,
    #[command(description = "Show or set the minimum value. Usage: /threshold 1000000")]
    Threshold(String),
    #[command(description = "Show help")]
    Help,
}

/// What the bot does in response to a command or keyboard button.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Subscribe,
    Unsubscribe,
    ShowThreshold,
    /// Set button pressed without a value.
    PromptThreshold,
    SetThreshold(i64),
    /// Set requested with a value that is not a non-negative integer.
    InvalidThreshold(String),
    Help,
}

impl From<Command> for Action {
    fn from(command: Command) -> Self {
        match command {
            Command::Start | Command::Subscribe => Action::Subscribe,
            Command::Stop | Command::Unsubscribe => Action::Unsubscribe,
            Command::Threshold(arg) if arg.trim().is_empty() => Action::ShowThreshold,
            Command::Threshold(arg) => threshold_action(&arg),
            Command::Help => Action::Help,
        }
    }
}

impl Action {
    /// Recognise a reply-keyboard label. Returns None for anything else.
    pub fn from_label(text: &str) -> Option<Self> {
        let text = text.trim();
        match text {
            SUBSCRIBE_LABEL => return Some(Action::Subscribe),
            UNSUBSCRIBE_LABEL => return Some(Action::Unsubscribe),
            SET_THRESHOLD_LABEL => return Some(Action::PromptThreshold),
            _ => {}
        }

        if text.starts_with(SHOW_THRESHOLD_LABEL) {
            return Some(Action::ShowThreshold);
        }
        text.strip_prefix(SET_THRESHOLD_LABEL).map(threshold_action)
    }
}

fn threshold_action(arg: &str) -> Action {
    match parse_threshold(arg) {
        Some(value) => Action::SetThreshold(value),
        None => Action::InvalidThreshold(arg.trim().to_string()),
    }
}

/// Parse a user-supplied threshold. Grouping commas are allowed.
pub fn parse_threshold(input: &str) -> Option<i64> {
    let cleaned: String = input.trim().chars().filter(|c| *c != ',').collect();
    cleaned.parse::<i64>().ok().filter(|value| *value >= 0)
}

/// Reply keyboard shown while subscribed.
pub fn main_keyboard() -> KeyboardMarkup {
    KeyboardMarkup::new(vec![
        vec![
            KeyboardButton::new(SUBSCRIBE_LABEL),
            KeyboardButton::new(UNSUBSCRIBE_LABEL),
        ],
        vec![
            KeyboardButton::new(SET_THRESHOLD_LABEL),
            KeyboardButton::new(SHOW_THRESHOLD_LABEL),
        ],
    ])
}

/// Telegram bot wrapper.
pub struct TelegramBot {
    bot: Bot,
    manager: Arc<SubscriptionManager>,
}

impl TelegramBot {
    pub fn new(bot: Bot, manager: Arc<SubscriptionManager>) -> Self {
        Self { bot, manager }
    }

    /// Run the message handler until Ctrl+C.
    ///
    /// Slash commands go through [`Command`]; any other text is matched
    /// against the reply-keyboard labels and ignored when it is not one.
    pub async fn run(self: Arc<Self>) {
        let bot = self.bot.clone();

        let commands = {
            let this = Arc::clone(&self);
            move |bot: Bot, msg: Message, cmd: Command| {
                let this = Arc::clone(&this);
                async move { this.handle_action(bot, msg, Action::from(cmd)).await }
            }
        };
        let labels = move |bot: Bot, msg: Message| {
            let this = Arc::clone(&self);
            async move {
                match msg.text().and_then(Action::from_label) {
                    Some(action) => this.handle_action(bot, msg, action).await,
                    None => Ok(()),
                }
            }
        };

        let handler = Update::filter_message()
            .branch(
                dptree::entry()
                    .filter_command::<Command>()
                    .endpoint(commands),
            )
            .branch(dptree::endpoint(labels));

        Dispatcher::builder(bot, handler)
            .enable_ctrlc_handler()
            .build()
            .dispatch()
            .await;
    }

    async fn handle_action(
        &self,
        bot: Bot,
        msg: Message,
        action: Action,
    ) -> Result<(), TelegramError> {
        let recipient = RecipientId::from(msg.chat.id);
        debug!(recipient = %recipient, ?action, "Received command");

        match action {
            Action::Subscribe => {
                bot.send_message(msg.chat.id, "Bot started.")
                    .reply_markup(main_keyboard())
                    .await?;
                self.manager.subscribe(recipient).await;
            }

            Action::Unsubscribe => {
                self.manager.unsubscribe(recipient);
                bot.send_message(msg.chat.id, "Bot stopped.")
                    .reply_markup(KeyboardRemove::new())
                    .await?;
            }

            Action::ShowThreshold => {
                let value = self.manager.threshold(recipient);
                bot.send_message(
                    msg.chat.id,
                    format!("Current minimum value: $ {}", group_digits(value)),
                )
                .await?;
            }

            Action::PromptThreshold => {
                bot.send_message(
                    msg.chat.id,
                    format!(
                        "Enter the new minimum value:\nUsage: {}1000000",
                        SET_THRESHOLD_LABEL
                    ),
                )
                .await?;
            }

            Action::SetThreshold(value) => {
                self.manager.set_threshold(recipient, value);
                bot.send_message(
                    msg.chat.id,
                    format!("Minimum value set to: $ {}", group_digits(value)),
                )
                .await?;
            }

            Action::InvalidThreshold(input) => {
                debug!(recipient = %recipient, input = %input, "Rejected threshold input");
                bot.send_message(msg.chat.id, "Invalid input. Please enter a valid number.")
                    .await?;
            }

            Action::Help => {
                bot.send_message(msg.chat.id, Command::descriptions().to_string())
                    .reply_markup(main_keyboard())
                    .await?;
            }
        }

        Ok(())
    }
}
