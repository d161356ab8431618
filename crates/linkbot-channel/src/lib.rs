pub mod utils;

use anyhow::{anyhow, Result};
use linkbot_links::{commands as link_commands, TriggerStore};
use linkbot_remember::{commands as memory_commands, MemoryBook};
use std::sync::Arc;
use teloxide::{error_handlers::LoggingErrorHandler, prelude::*, utils::command::BotCommands};
use tracing::{debug, info};

use crate::utils::split_reply;

/// Maximum message length for Telegram (4096 chars, but we use less to be safe)
const MAX_MESSAGE_LENGTH: usize = 4000;

/// Telegram channel service
pub struct TelegramService {
    bot: Bot,
    links: Arc<TriggerStore>,
    memory: Arc<MemoryBook>,
}

/// Bot commands
#[derive(BotCommands, Clone, Debug, PartialEq)]
#[command(rename_rule = "snake_case", description = "These commands are supported:")]
pub enum Command {
    #[command(description = "Start the bot")]
    Start,
    #[command(description = "Show commands")]
    Help,
    #[command(description = "List all trigger phrases and URLs")]
    Links,
    #[command(description = "Add a trigger phrase and URL: <phrase or /regex/i> <URL>")]
    LinksAdd(String),
    #[command(description = "Remove a trigger phrase or URL")]
    LinksRemove(String),
    #[command(description = "Remember something: <name> is <something>, or recall <name>")]
    Remember(String),
    #[command(description = "Recall something: <name>")]
    WhatIs(String),
    #[command(description = "Forget something")]
    Forget(String),
    #[command(description = "List everything I remember")]
    Memories,
    #[command(description = "List everything I remember")]
    WhatDoYouRemember,
}

impl TelegramService {
    /// Create a new Telegram service
    pub fn new(token: &str, links: Arc<TriggerStore>, memory: Arc<MemoryBook>) -> Self {
        let bot = Bot::new(token);
        info!("Telegram service initialized");
        Self { bot, links, memory }
    }

    /// Validate the bot token by making a test API call
    pub async fn validate_token(&self) -> Result<()> {
        info!("Validating Telegram bot token...");

        match self.bot.get_me().await {
            Ok(_me) => {
                info!("Telegram bot token is valid");
                Ok(())
            }
            Err(teloxide::RequestError::Api(teloxide::ApiError::InvalidToken)) => Err(anyhow!(
                "Invalid Telegram bot token. Please check TELEGRAM_BOT_TOKEN environment variable \
                or edit ~/.linkbot/linkbot.toml"
            )),
            Err(e) => Err(anyhow!("Failed to validate Telegram bot token: {}", e)),
        }
    }

    /// Run the Telegram service (this is a blocking call)
    pub async fn run(self) -> Result<()> {
        self.validate_token().await?;

        info!("Starting Telegram bot...");

        let handler = Update::filter_message()
            .branch(
                dptree::entry()
                    .filter_command::<Command>()
                    .endpoint(Self::handle_command),
            )
            .branch(
                dptree::filter(|msg: Message| msg.text().is_some())
                    .endpoint(Self::handle_message),
            );

        let mut dispatcher = Dispatcher::builder(self.bot.clone(), handler)
            .dependencies(dptree::deps![self.links.clone(), self.memory.clone()])
            .error_handler(LoggingErrorHandler::with_custom_text(
                "An error has occurred in the dispatcher",
            ))
            .build();

        dispatcher.dispatch().await;

        Ok(())
    }

    /// Send a reply, splitting if necessary
    async fn send_message_safe(
        bot: &Bot,
        chat_id: ChatId,
        text: &str,
    ) -> Result<(), teloxide::RequestError> {
        for chunk in split_reply(text, MAX_MESSAGE_LENGTH) {
            bot.send_message(chat_id, chunk).await?;
        }
        Ok(())
    }

    /// Handle bot commands
    async fn handle_command(
        bot: Bot,
        msg: Message,
        cmd: Command,
        links: Arc<TriggerStore>,
        memory: Arc<MemoryBook>,
    ) -> Result<(), teloxide::RequestError> {
        let reply = command_reply(cmd, &links, &memory).await;
        Self::send_message_safe(&bot, msg.chat.id, &reply).await
    }

    /// Reply with a link when a plain message matches a trigger
    async fn handle_message(
        bot: Bot,
        msg: Message,
        links: Arc<TriggerStore>,
    ) -> Result<(), teloxide::RequestError> {
        let text = match msg.text() {
            Some(t) => t,
            None => return Ok(()),
        };

        if let Some(link) = reply_for_message(text, &links).await {
            debug!("Auto-replying in chat {}", msg.chat.id);
            bot.send_message(msg.chat.id, link).await?;
        }

        Ok(())
    }
}

/// Run a command against the plugins and build its reply
pub async fn command_reply(cmd: Command, links: &TriggerStore, memory: &MemoryBook) -> String {
    match cmd {
        Command::Start => "Hi! I reply with links whenever someone types one of my trigger \
                           phrases, and I can remember things for you.\n\n\
                           /help - Show commands\n/links - Show trigger phrases"
            .to_string(),
        Command::Help => Command::descriptions().to_string(),
        Command::Links => link_commands::links_list(links).await,
        Command::LinksAdd(args) => link_commands::links_add(links, &args).await,
        Command::LinksRemove(args) => link_commands::links_remove(links, &args).await,
        Command::Remember(args) => memory_commands::remember(memory, &args).await,
        Command::Forget(args) => memory_commands::forget(memory, &args).await,
        Command::WhatIs(args) => memory_commands::what_is(memory, &args).await,
        Command::Memories | Command::WhatDoYouRemember => memory_commands::memories(memory).await,
    }
}

/// Auto-reply for a plain chat message
///
/// Anything that looks like a command is left alone.
pub async fn reply_for_message(text: &str, links: &TriggerStore) -> Option<String> {
    if text.trim_start().starts_with('/') {
        return None;
    }
    links.resolve(text).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use linkbot_persistence::MemoryStore;

    async fn plugins() -> (TriggerStore, MemoryBook) {
        let links = TriggerStore::load(Arc::new(MemoryStore::new())).await.unwrap();
        let memory = MemoryBook::new(Arc::new(MemoryStore::new()));
        (links, memory)
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(
            Command::parse("/links_add ship it https://example.com", "linkbot").unwrap(),
            Command::LinksAdd("ship it https://example.com".to_string())
        );
        assert_eq!(
            Command::parse("/links_remove /ship/i", "linkbot").unwrap(),
            Command::LinksRemove("/ship/i".to_string())
        );
        assert_eq!(Command::parse("/links", "linkbot").unwrap(), Command::Links);
        assert_eq!(Command::parse("/memories", "linkbot").unwrap(), Command::Memories);
        assert_eq!(
            Command::parse("/what_is wifi", "linkbot").unwrap(),
            Command::WhatIs("wifi".to_string())
        );
        assert_eq!(
            Command::parse("/what_do_you_remember", "linkbot").unwrap(),
            Command::WhatDoYouRemember
        );
    }

    #[tokio::test]
    async fn test_commands_and_auto_reply() {
        let (links, memory) = plugins().await;

        let reply = command_reply(
            Command::LinksAdd("ship it https://example.com/shipit.jpg".to_string()),
            &links,
            &memory,
        )
        .await;
        assert!(reply.starts_with("Okay, I'll reply with that link"));

        assert_eq!(
            reply_for_message("Please... Ship it...", &links).await.as_deref(),
            Some("https://example.com/shipit.jpg")
        );
        assert!(reply_for_message("/links_remove ship it", &links).await.is_none());
        assert!(reply_for_message("nothing to see", &links).await.is_none());

        let reply = command_reply(Command::Remember("wifi is hunter2".to_string()), &links, &memory).await;
        assert_eq!(reply, "OK, I'll remember wifi.");
        let reply = command_reply(Command::Memories, &links, &memory).await;
        assert_eq!(reply, "I remember:\nwifi");
        let reply = command_reply(Command::WhatDoYouRemember, &links, &memory).await;
        assert_eq!(reply, "I remember:\nwifi");
        let reply = command_reply(Command::WhatIs("WIFI".to_string()), &links, &memory).await;
        assert_eq!(reply, "hunter2");
    }
}
