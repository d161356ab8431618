//! Text for the `links` chat commands
//!
//! Parses command arguments and turns store results into replies.

use linkbot_types::{Removal, TriggerListing};
use tracing::error;

use crate::error::{LinkError, Result};
use crate::store::TriggerStore;

/// How to add a link, appended to most error replies
pub const ADD_USAGE: &str =
    "You can add a new link by typing: `/links_add <phrase or /regex/i> <URL>`";

/// How to list links, appended to removal misses
pub const LIST_USAGE: &str = "You can see what links I know about by typing: `/links`";

/// Split `links add` arguments into the trigger pattern and its URLs
///
/// URLs are peeled off the end of the text one at a time, so everything before
/// the first URL is the pattern. URLs come back in the order they were typed.
pub fn parse_add_args(args: &str) -> Result<(String, Vec<String>)> {
    let mut rest = args.trim();
    let mut links = Vec::new();

    while let Some((head, link)) = split_last_link(rest) {
        links.push(link.trim().to_string());
        rest = head.trim();
    }

    if links.is_empty() {
        return Err(LinkError::Usage(args.trim().to_string()));
    }
    if rest.is_empty() {
        return Err(LinkError::EmptyPattern);
    }

    links.reverse();
    Ok((rest.to_string(), links))
}

fn split_last_link(text: &str) -> Option<(&str, &str)> {
    if text.contains('\n') {
        return None;
    }

    let lower = text.to_ascii_lowercase();
    let start = match (lower.rfind("http://"), lower.rfind("https://")) {
        (Some(a), Some(b)) => a.max(b),
        (a, b) => a.or(b)?,
    };

    Some(text.split_at(start))
}

/// The key line followed by one bullet per target, targets sorted
pub fn format_trigger(pattern: &str, targets: &[String]) -> String {
    let mut sorted: Vec<&String> = targets.iter().collect();
    sorted.sort();

    let mut parts = Vec::with_capacity(sorted.len() + 1);
    if !pattern.is_empty() {
        parts.push(pattern.to_string());
    }
    parts.extend(sorted.into_iter().map(|t| format!("• {t}")));
    parts.join("\n")
}

pub fn list_reply(listings: &[TriggerListing]) -> String {
    if listings.is_empty() {
        return format!("I don't know any trigger phrases\n{ADD_USAGE}");
    }

    listings
        .iter()
        .map(|l| format_trigger(&l.pattern, &l.targets))
        .collect::<Vec<_>>()
        .join("\n\n")
}

pub fn added_reply(listing: &TriggerListing) -> String {
    format!(
        "Okay, I'll reply with that link whenever someone types `{}`",
        listing.pattern
    )
}

pub fn removed_reply(removals: &[Removal]) -> String {
    let blocks = removals
        .iter()
        .map(|r| format_trigger(&r.pattern, &r.removed_targets))
        .collect::<Vec<_>>()
        .join("\n\n");
    format!("Okay, I've removed:\n{blocks}")
}

/// Reply for a failed `links add` or `links remove`
pub fn error_reply(args: &str, err: &LinkError) -> String {
    match err {
        LinkError::Usage(_) | LinkError::EmptyPattern => {
            format!("I don't recognize that format: `{}`\n{ADD_USAGE}", args.trim())
        }
        LinkError::Pattern { pattern, source } => {
            format!("That pattern doesn't compile: `{pattern}`\n{source}")
        }
        LinkError::NotFound(query) => format!(
            "I can't find any trigger phrases or links matching `{query}`\n{LIST_USAGE}"
        ),
        LinkError::Record { .. } | LinkError::Storage(_) => {
            error!("Links command failed: {}", err);
            "Sorry, I couldn't save that. Please try again later.".to_string()
        }
    }
}

/// `links`
pub async fn links_list(store: &TriggerStore) -> String {
    list_reply(&store.list().await)
}

/// `links add <pattern> <url>...`
pub async fn links_add(store: &TriggerStore, args: &str) -> String {
    let result = match parse_add_args(args) {
        Ok((pattern, links)) => store.add(&pattern, links).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(listing) => added_reply(&listing),
        Err(e) => error_reply(args, &e),
    }
}

/// `links remove <pattern or url>`
pub async fn links_remove(store: &TriggerStore, args: &str) -> String {
    match store.remove(args).await {
        Ok(removals) => removed_reply(&removals),
        Err(LinkError::Usage(_)) => error_reply(args, &LinkError::NotFound(args.trim().to_string())),
        Err(e) => error_reply(args, &e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use linkbot_persistence::MemoryStore;
    use std::sync::Arc;

    async fn store() -> TriggerStore {
        TriggerStore::load(Arc::new(MemoryStore::new())).await.unwrap()
    }

    #[test]
    fn test_parse_add_single_link() {
        let (pattern, links) = parse_add_args("simple phrase http://example.com").unwrap();
        assert_eq!(pattern, "simple phrase");
        assert_eq!(links, vec!["http://example.com"]);
    }

    #[test]
    fn test_parse_add_multiple_links_keep_order() {
        let (pattern, links) =
            parse_add_args("/(complex|inscrutable) phrase/i https://a.com HTTP://b.com").unwrap();
        assert_eq!(pattern, "/(complex|inscrutable) phrase/i");
        assert_eq!(links, vec!["https://a.com", "HTTP://b.com"]);
    }

    #[test]
    fn test_parse_add_rejects_missing_parts() {
        assert!(matches!(parse_add_args(""), Err(LinkError::Usage(_))));
        assert!(matches!(parse_add_args("phrase"), Err(LinkError::Usage(_))));
        assert!(matches!(parse_add_args("simple phrase"), Err(LinkError::Usage(_))));
        assert!(matches!(
            parse_add_args("http://example.com"),
            Err(LinkError::EmptyPattern)
        ));
    }

    #[test]
    fn test_format_trigger_sorts_targets() {
        let targets = vec!["http://b.com".to_string(), "http://a.com".to_string()];
        assert_eq!(
            format_trigger("ship it", &targets),
            "ship it\n• http://a.com\n• http://b.com"
        );
        assert_eq!(format_trigger("", &targets), "• http://a.com\n• http://b.com");
    }

    #[tokio::test]
    async fn test_links_command_flow() {
        let store = store().await;

        assert!(links_list(&store).await.starts_with("I don't know any trigger phrases"));
        assert!(links_add(&store, "").await.starts_with("I don't recognize that format"));
        assert!(links_add(&store, "phrase").await.starts_with("I don't recognize that format"));

        let reply = links_add(&store, "simple phrase http://example.com").await;
        assert_eq!(
            reply,
            "Okay, I'll reply with that link whenever someone types `simple phrase`"
        );
        links_add(&store, "simple phrase http://asdf.com").await;

        let listing = links_list(&store).await;
        assert!(listing.contains("http://example.com"));
        assert!(listing.contains("http://asdf.com"));

        assert!(links_remove(&store, "asdf")
            .await
            .starts_with("I can't find any trigger phrases or links matching `asdf`"));
        assert_eq!(
            links_remove(&store, "http://asdf.com").await,
            "Okay, I've removed:\nsimple phrase\n• http://asdf.com"
        );
        assert!(links_list(&store).await.contains("http://example.com"));
        assert!(links_remove(&store, "http://example.com")
            .await
            .starts_with("Okay, I've removed"));
        assert!(links_list(&store).await.starts_with("I don't know any trigger phrases"));

        links_add(&store, "simple phrase http://example.com").await;
        links_add(&store, "simple phrase http://asdf.com").await;
        assert_eq!(
            links_remove(&store, "SIMPLE   PHRASE").await,
            "Okay, I've removed:\nsimple phrase\n• http://asdf.com\n• http://example.com"
        );
        assert!(links_list(&store).await.starts_with("I don't know any trigger phrases"));
    }

    #[tokio::test]
    async fn test_links_add_reports_bad_regex() {
        let store = store().await;
        let reply = links_add(&store, "/(broken/i http://example.com").await;
        assert!(reply.starts_with("That pattern doesn't compile: `/(broken/i`"));
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_links_remove_blank_query() {
        let store = store().await;
        assert!(links_remove(&store, "   ")
            .await
            .starts_with("I can't find any trigger phrases or links matching ``"));
    }
}
