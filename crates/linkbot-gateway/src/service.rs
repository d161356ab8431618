use crate::config::Config;
use anyhow::Result;
use linkbot_channel::TelegramService;
use linkbot_links::TriggerStore;
use linkbot_logging::LogFormat;
use linkbot_persistence::PersistenceService;
use linkbot_remember::MemoryBook;
use std::sync::Arc;

use tokio::signal;
use tracing::{error, info};

/// Gateway service - main orchestrator
pub struct GatewayService {
    config: Config,
}

impl GatewayService {
    /// Create a new gateway service
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Run the gateway service
    pub async fn run(self) -> Result<()> {
        // Initialize logging
        let format: LogFormat = self.config.logging.format.parse()?;
        linkbot_logging::init_logging(&self.config.logging.level, format)?;
        info!("Starting linkbot gateway");

        // Initialize persistence
        let persistence = match self.config.database.path.as_str() {
            ":memory:" => PersistenceService::in_memory().await?,
            path => PersistenceService::new(path).await?,
        };

        let links = TriggerStore::load(Arc::new(
            persistence.namespace(self.config.links.namespace.as_str()),
        ))
        .await?;
        info!(
            "Links plugin ready with {} triggers (namespace `{}`)",
            links.len().await,
            self.config.links.namespace
        );

        let memory = MemoryBook::new(Arc::new(
            persistence.namespace(self.config.remember.namespace.as_str()),
        ));
        info!(
            "Remember plugin ready (namespace `{}`)",
            self.config.remember.namespace
        );

        // Initialize Telegram channel
        let telegram_service = TelegramService::new(
            &self.config.telegram.bot_token,
            Arc::new(links),
            Arc::new(memory),
        );

        // Setup signal handler for graceful shutdown
        let shutdown = async {
            if let Err(e) = signal::ctrl_c().await {
                error!("Failed to install Ctrl+C handler: {}", e);
            }
            info!("Received shutdown signal");
        };

        // Run the bot
        tokio::select! {
            result = telegram_service.run() => {
                if let Err(e) = result {
                    error!("Telegram service error: {}", e);
                }
            }
            _ = shutdown => {
                info!("Shutting down gracefully...");
            }
        }

        persistence.close().await;
        info!("Gateway service stopped");
        Ok(())
    }
}
