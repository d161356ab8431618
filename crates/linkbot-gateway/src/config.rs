use anyhow::{anyhow, Context};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::PathBuf;

/// Default config template created when no config exists
const DEFAULT_CONFIG: &str = r#"
[telegram]
bot_token = ""  # Set via TELEGRAM_BOT_TOKEN env var

[database]
path = "linkbot.db"  # or ":memory:" to keep nothing between runs

[logging]
level = "info"  # trace, debug, info, warn, error
format = "text"  # text or json

[links]
namespace = "links"

[remember]
namespace = "remember"
"#;

#[derive(Debug, Deserialize, Clone)]
pub struct TelegramConfig {
    pub bot_token: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub path: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    pub level: String,
    #[serde(default)]
    pub format: String,
}

/// Storage namespace for one plugin
#[derive(Debug, Deserialize, Clone)]
pub struct PluginConfig {
    pub namespace: String,
}

fn default_links() -> PluginConfig {
    PluginConfig {
        namespace: "links".to_string(),
    }
}

fn default_remember() -> PluginConfig {
    PluginConfig {
        namespace: "remember".to_string(),
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub telegram: TelegramConfig,
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
    #[serde(default = "default_links")]
    pub links: PluginConfig,
    #[serde(default = "default_remember")]
    pub remember: PluginConfig,
}

impl Config {
    /// Get the global config path: ~/.linkbot/linkbot.toml
    fn global_config_path() -> anyhow::Result<PathBuf> {
        let home = dirs::home_dir().ok_or_else(|| anyhow!("Could not find home directory"))?;
        Ok(home.join(".linkbot").join("linkbot.toml"))
    }

    /// Ensure global config directory and file exist, creating defaults if needed
    fn ensure_global_config() -> anyhow::Result<PathBuf> {
        let config_path = Self::global_config_path()?;
        let config_dir = config_path
            .parent()
            .ok_or_else(|| anyhow!("Config path has no parent: {}", config_path.display()))?;

        if !config_dir.exists() {
            fs::create_dir_all(config_dir)
                .with_context(|| format!("Failed to create {}", config_dir.display()))?;
            eprintln!("Created config directory: {}", config_dir.display());
        }

        if !config_path.exists() {
            fs::write(&config_path, DEFAULT_CONFIG.trim())
                .with_context(|| format!("Failed to write {}", config_path.display()))?;
            eprintln!("Created default config: {}", config_path.display());
            eprintln!("Please edit this file or set environment variables.");
        }

        Ok(config_path)
    }

    /// Load configuration with layered approach:
    /// 1. Global config: ~/.linkbot/linkbot.toml (auto-created if missing)
    /// 2. Local override: ./linkbot.toml (workspace, optional)
    /// 3. Environment variables (highest priority)
    pub fn load() -> anyhow::Result<Self> {
        // Load .env file from current directory
        dotenvy::dotenv().ok();

        let global_config_path = Self::ensure_global_config()?;

        let mut config_builder = config::Config::builder()
            .add_source(config::File::from(global_config_path))
            .add_source(config::File::with_name("linkbot").required(false))
            .add_source(config::Environment::with_prefix("LINKBOT").separator("__"));

        if let Ok(token) = env::var("TELEGRAM_BOT_TOKEN") {
            config_builder = config_builder.set_override("telegram.bot_token", token)?;
        }

        let config: Self = config_builder.build()?.try_deserialize()?;
        Ok(config)
    }

    #[cfg(test)]
    fn from_toml(text: &str) -> anyhow::Result<Self> {
        let config = config::Config::builder()
            .add_source(config::File::from_str(text, config::FileFormat::Toml))
            .build()?;
        Ok(config.try_deserialize()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_template_parses() {
        let config = Config::from_toml(DEFAULT_CONFIG).unwrap();
        assert_eq!(config.database.path, "linkbot.db");
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.format, "text");
        assert_eq!(config.links.namespace, "links");
        assert_eq!(config.remember.namespace, "remember");
        assert!(config.telegram.bot_token.is_empty());
    }

    #[test]
    fn test_plugin_sections_are_optional() {
        let config = Config::from_toml(
            r#"
            [telegram]
            bot_token = "123:abc"

            [database]
            path = ":memory:"

            [logging]
            level = "debug"
            "#,
        )
        .unwrap();

        assert_eq!(config.links.namespace, "links");
        assert_eq!(config.remember.namespace, "remember");
        assert!(config.logging.format.is_empty());
    }
}
