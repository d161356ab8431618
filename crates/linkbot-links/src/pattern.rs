//! Trigger pattern classification and compilation
//!
//! A trigger is written either as a plain phrase or as a delimited regular
//! expression, `/body/flags`. Both compile down to the same matcher:
//!
//! - phrases are case-insensitive and each space matches any run of whitespace
//! - regex bodies are used as written, except that spaces also match any run
//!   of whitespace, and only the `a`, `i`, `m`, `s` and `x` flags are accepted
//!
//! Matching runs on the input's bytes so that the `a` flag can switch off
//! Unicode character classes without rejecting bodies like `.`.

use regex::bytes::{Regex, RegexBuilder};
use std::collections::BTreeSet;

use crate::error::{LinkError, Result};

/// Flags accepted after the closing delimiter of a regex trigger
///
/// Variants are declared in flag-letter order so a `BTreeSet` iterates in the
/// canonical key order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RegexFlag {
    /// `a`: ASCII-only `\w`, `\d`, `\s` and `\b`
    Ascii,
    /// `i`
    IgnoreCase,
    /// `m`: `^` and `$` match at line boundaries
    MultiLine,
    /// `s`: `.` matches newlines
    DotAll,
    /// `x`: whitespace and `#` comments in the body are ignored
    Verbose,
}

impl RegexFlag {
    /// Parse a flag letter, in either case
    pub fn from_char(c: char) -> Option<Self> {
        match c.to_ascii_lowercase() {
            'a' => Some(Self::Ascii),
            'i' => Some(Self::IgnoreCase),
            'm' => Some(Self::MultiLine),
            's' => Some(Self::DotAll),
            'x' => Some(Self::Verbose),
            _ => None,
        }
    }

    pub fn as_char(self) -> char {
        match self {
            Self::Ascii => 'a',
            Self::IgnoreCase => 'i',
            Self::MultiLine => 'm',
            Self::DotAll => 's',
            Self::Verbose => 'x',
        }
    }
}

/// Compiled search and full-match forms of one pattern
#[derive(Debug, Clone)]
pub struct Matcher {
    search: Regex,
    full: Regex,
}

impl Matcher {
    fn compile(source: &str, flags: &BTreeSet<RegexFlag>) -> std::result::Result<Self, regex::Error> {
        // In verbose mode a trailing `# comment` would swallow the closing group
        let full_source = if flags.contains(&RegexFlag::Verbose) {
            format!("\\A(?:{source}\n)\\z")
        } else {
            format!("\\A(?:{source})\\z")
        };

        Ok(Self {
            search: build_regex(source, flags)?,
            full: build_regex(&full_source, flags)?,
        })
    }

    /// With `fullmatch` the whole text must match, otherwise any substring will do
    pub fn is_match(&self, text: &str, fullmatch: bool) -> bool {
        let regex = if fullmatch { &self.full } else { &self.search };
        regex.is_match(text.as_bytes())
    }
}

fn build_regex(source: &str, flags: &BTreeSet<RegexFlag>) -> std::result::Result<Regex, regex::Error> {
    RegexBuilder::new(source)
        .case_insensitive(flags.contains(&RegexFlag::IgnoreCase))
        .multi_line(flags.contains(&RegexFlag::MultiLine))
        .dot_matches_new_line(flags.contains(&RegexFlag::DotAll))
        .ignore_whitespace(flags.contains(&RegexFlag::Verbose))
        .unicode(!flags.contains(&RegexFlag::Ascii))
        .build()
}

/// A trigger pattern
#[derive(Debug, Clone)]
pub enum Pattern {
    /// Normalized plain phrase
    Phrase { phrase: String, matcher: Matcher },
    /// Delimited regular expression with its canonical flag set
    Regex {
        body: String,
        flags: BTreeSet<RegexFlag>,
        matcher: Matcher,
    },
}

impl Pattern {
    /// Classify and compile a raw pattern
    pub fn parse(raw: &str) -> Result<Self> {
        let raw = raw.trim();
        match split_delimited(raw) {
            Some((body, flags)) => Self::regex(raw, body, flags),
            None => Self::phrase(raw),
        }
    }

    /// Build a phrase pattern regardless of how the text looks
    pub fn phrase(raw: &str) -> Result<Self> {
        let phrase = normalize_phrase(raw);
        if phrase.is_empty() {
            return Err(LinkError::EmptyPattern);
        }

        let source = phrase
            .split(' ')
            .map(regex::escape)
            .collect::<Vec<_>>()
            .join(r"\s+");
        let flags = BTreeSet::from([RegexFlag::IgnoreCase]);

        let matcher = Matcher::compile(&source, &flags).map_err(|source| LinkError::Pattern {
            pattern: raw.trim().to_string(),
            source,
        })?;

        Ok(Self::Phrase { phrase, matcher })
    }

    /// Rebuild a pattern from its persisted form
    pub fn from_record(raw: &str, is_regex: bool) -> Result<Self> {
        if !is_regex {
            return Self::phrase(raw);
        }

        let raw = raw.trim();
        match split_delimited(raw) {
            Some((body, flags)) => Self::regex(raw, body, flags),
            None => Err(LinkError::Usage(format!(
                "`{raw}` is marked as a regex but is not written as /pattern/flags"
            ))),
        }
    }

    fn regex(raw: &str, body: &str, flag_chars: &str) -> Result<Self> {
        let body = body.trim();
        if body.is_empty() {
            return Err(LinkError::EmptyPattern);
        }

        let flags: BTreeSet<RegexFlag> = flag_chars.chars().filter_map(RegexFlag::from_char).collect();
        let source = body.replace("\\ ", r"\s+").replace(' ', r"\s+");

        let matcher = Matcher::compile(&source, &flags).map_err(|source| LinkError::Pattern {
            pattern: raw.to_string(),
            source,
        })?;

        Ok(Self::Regex {
            body: body.to_string(),
            flags,
            matcher,
        })
    }

    /// Canonical key: the normalized phrase, or `/body/flags` with sorted flags
    pub fn key(&self) -> String {
        match self {
            Self::Phrase { phrase, .. } => phrase.clone(),
            Self::Regex { body, flags, .. } => regex_key(body, flags),
        }
    }

    pub fn is_regex(&self) -> bool {
        matches!(self, Self::Regex { .. })
    }

    pub fn is_match(&self, text: &str, fullmatch: bool) -> bool {
        match self {
            Self::Phrase { matcher, .. } | Self::Regex { matcher, .. } => {
                matcher.is_match(text, fullmatch)
            }
        }
    }
}

/// The key [`Pattern::parse`] would give `raw`, without compiling anything
///
/// Returns `None` when nothing is left to match on. A regex body that would
/// not compile still gets a key.
pub fn canonical_key(raw: &str) -> Option<String> {
    let raw = raw.trim();
    let key = match split_delimited(raw) {
        Some((body, flag_chars)) => {
            let body = body.trim();
            if body.is_empty() {
                return None;
            }
            let flags: BTreeSet<RegexFlag> =
                flag_chars.chars().filter_map(RegexFlag::from_char).collect();
            regex_key(body, &flags)
        }
        None => normalize_phrase(raw),
    };
    Some(key).filter(|k| !k.is_empty())
}

fn regex_key(body: &str, flags: &BTreeSet<RegexFlag>) -> String {
    let flags: String = flags.iter().map(|f| f.as_char()).collect();
    format!("/{body}/{flags}")
}

/// Lower-case and collapse whitespace runs into single spaces
pub fn normalize_phrase(text: &str) -> String {
    text.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Split `/body/flags` into body and flag letters
///
/// The body is the shortest prefix that leaves only flag letters after the
/// next `/`, and it may not span lines.
fn split_delimited(raw: &str) -> Option<(&str, &str)> {
    let rest = raw.strip_prefix('/')?;
    let (body, flags) = rest
        .match_indices('/')
        .map(|(i, _)| (&rest[..i], &rest[i + 1..]))
        .find(|(_, flags)| flags.chars().all(|c| RegexFlag::from_char(c).is_some()))?;

    if body.contains('\n') {
        return None;
    }
    Some((body, flags))
}
