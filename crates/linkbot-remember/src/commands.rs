//! Text for the `remember`, `what is`, `forget` and `memories` chat commands

use tracing::error;

use crate::book::{parse_remember, MemoryBook, MemoryError};

const LIST_USAGE: &str = "You can see what I remember by typing: `/memories`";
const ADD_USAGE: &str = "You can add a new memory by typing: `/remember <name> is <something>`";

/// `remember <key> is <value>` stores, `remember <key>` recalls
pub async fn remember(book: &MemoryBook, args: &str) -> String {
    let (key, value) = parse_remember(args);

    let result = match value {
        Some(value) => book
            .remember(&key, &value)
            .await
            .map(|()| format!("OK, I'll remember {key}.")),
        None => book.recall(&key).await.map(|value| escape_backticks(&value)),
    };

    result.unwrap_or_else(error_reply)
}

/// `what is <key>` only ever recalls, even when the key contains `is`
pub async fn what_is(book: &MemoryBook, args: &str) -> String {
    match book.recall(args).await {
        Ok(value) => escape_backticks(&value),
        Err(e) => error_reply(e),
    }
}

fn error_reply(err: MemoryError) -> String {
    match err {
        MemoryError::EmptyKey => {
            format!("What do you want me to remember?\n{LIST_USAGE}\n{ADD_USAGE}")
        }
        MemoryError::AlreadyKnown { key, value } => format!(
            "But `{key}` is already {}\nYou must `/forget {key}` first.",
            escape_backticks(&value)
        ),
        MemoryError::Unknown(key) => format!(
            "I don't remember anything matching `{key}`\n{LIST_USAGE}\n\
             You can add a new memory by typing: `/remember {key} is <something>`"
        ),
        e => failure_reply(&e),
    }
}

/// `forget <key>`
pub async fn forget(book: &MemoryBook, args: &str) -> String {
    let key = args.trim();
    match book.forget(key).await {
        Ok(value) => format!("I've forgotten {key} is {}", escape_backticks(&value)),
        Err(MemoryError::Unknown(_)) | Err(MemoryError::EmptyKey) => {
            format!("I don't remember anything matching `{key}`\n{LIST_USAGE}")
        }
        Err(e) => failure_reply(&e),
    }
}

/// `memories`
pub async fn memories(book: &MemoryBook) -> String {
    match book.memories().await {
        Ok(keys) if keys.is_empty() => format!("I don't remember anything\n{ADD_USAGE}"),
        Ok(keys) => format!("I remember:\n{}", keys.join("\n")),
        Err(e) => failure_reply(&e),
    }
}

fn escape_backticks(value: &str) -> String {
    value.replace('`', "\\`")
}

fn failure_reply(err: &MemoryError) -> String {
    error!("Remember command failed: {}", err);
    "Sorry, my memory isn't working right now.".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use linkbot_persistence::MemoryStore;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_remember_command_flow() {
        let book = MemoryBook::new(Arc::new(MemoryStore::new()));

        assert!(memories(&book).await.starts_with("I don't remember anything"));
        assert!(remember(&book, "Test Key")
            .await
            .starts_with("I don't remember anything matching `Test Key`"));
        assert_eq!(
            remember(&book, "Test Key is Test Value").await,
            "OK, I'll remember Test Key."
        );
        assert_eq!(remember(&book, "Test Key").await, "Test Value");
        assert_eq!(remember(&book, "TEST KEY").await, "Test Value");
        assert_eq!(remember(&book, "test key").await, "Test Value");
        assert_eq!(memories(&book).await, "I remember:\ntest key");
        assert_eq!(
            forget(&book, "Test Key").await,
            "I've forgotten Test Key is Test Value"
        );
        assert!(memories(&book).await.starts_with("I don't remember anything"));
    }

    #[tokio::test]
    async fn test_remember_existing_key() {
        let book = MemoryBook::new(Arc::new(MemoryStore::new()));
        remember(&book, "deploy is `make ship`").await;

        assert_eq!(remember(&book, "deploy").await, "\\`make ship\\`");
        assert_eq!(
            remember(&book, "Deploy is something else").await,
            "But `Deploy` is already \\`make ship\\`\nYou must `/forget Deploy` first."
        );
    }

    #[tokio::test]
    async fn test_what_is_recalls_whole_key() {
        let book = MemoryBook::new(Arc::new(MemoryStore::new()));
        remember(&book, "wifi is hunter2").await;

        assert_eq!(what_is(&book, " WiFi ").await, "hunter2");
        assert!(what_is(&book, "wifi is letmein")
            .await
            .starts_with("I don't remember anything matching `wifi is letmein`"));
        assert_eq!(remember(&book, "wifi").await, "hunter2");
        assert!(what_is(&book, "").await.starts_with("What do you want me to remember?"));
    }

    #[tokio::test]
    async fn test_empty_requests() {
        let book = MemoryBook::new(Arc::new(MemoryStore::new()));
        assert!(remember(&book, "  ").await.starts_with("What do you want me to remember?"));
        assert!(forget(&book, "nothing").await.starts_with("I don't remember anything matching `nothing`"));
    }
}
