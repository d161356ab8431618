//! A single trigger and its reply targets

use linkbot_types::{TriggerListing, TriggerRecord};
use rand::seq::SliceRandom;
use rand::Rng;

use crate::error::Result;
use crate::pattern::Pattern;

/// A trigger pattern paired with the values it replies with
#[derive(Debug, Clone)]
pub struct Trigger {
    raw_pattern: String,
    key: String,
    pattern: Pattern,
    targets: Vec<String>,
}

impl Trigger {
    /// Create a trigger with no targets yet
    pub fn new(raw_pattern: &str, pattern: Pattern) -> Self {
        Self {
            raw_pattern: raw_pattern.trim().to_string(),
            key: pattern.key(),
            pattern,
            targets: Vec::new(),
        }
    }

    /// Rebuild a trigger from its persisted record
    pub fn from_record(record: TriggerRecord) -> Result<Self> {
        let pattern = Pattern::from_record(&record.raw_pattern, record.is_regex)?;
        let mut trigger = Self::new(&record.raw_pattern, pattern);
        trigger.add_targets(record.targets);
        Ok(trigger)
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn raw_pattern(&self) -> &str {
        &self.raw_pattern
    }

    pub fn is_regex(&self) -> bool {
        self.pattern.is_regex()
    }

    pub fn targets(&self) -> &[String] {
        &self.targets
    }

    pub fn is_match(&self, text: &str, fullmatch: bool) -> bool {
        self.pattern.is_match(text, fullmatch)
    }

    /// Append targets, skipping blank ones. Returns how many were added.
    pub fn add_targets<I, S>(&mut self, targets: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let cleaned = clean_targets(targets);
        let added = cleaned.len();
        self.targets.extend(cleaned);
        added
    }

    pub fn has_target(&self, target: &str) -> bool {
        self.targets.iter().any(|t| t == target)
    }

    /// Remove every occurrence of `target`, returning whether any was present
    pub fn remove_target(&mut self, target: &str) -> bool {
        let before = self.targets.len();
        self.targets.retain(|t| t != target);
        self.targets.len() != before
    }

    /// Pick one target uniformly at random
    pub fn random_target<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<&str> {
        self.targets.choose(rng).map(String::as_str)
    }

    pub fn to_record(&self) -> TriggerRecord {
        TriggerRecord {
            raw_pattern: self.raw_pattern.clone(),
            is_regex: self.is_regex(),
            targets: self.targets.clone(),
        }
    }

    pub fn listing(&self) -> TriggerListing {
        TriggerListing {
            pattern: self.key.clone(),
            is_regex: self.is_regex(),
            targets: self.targets.clone(),
        }
    }
}

/// Trim targets and drop the empty ones
pub fn clean_targets<I, S>(targets: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    targets
        .into_iter()
        .map(|t| t.as_ref().trim().to_string())
        .filter(|t| !t.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn trigger(raw: &str, targets: &[&str]) -> Trigger {
        let mut trigger = Trigger::new(raw, Pattern::parse(raw).unwrap());
        trigger.add_targets(targets);
        trigger
    }

    #[test]
    fn test_add_targets_trims_and_skips_blank() {
        let mut t = trigger("ship it", &[]);
        let added = t.add_targets([" http://a.com ", "", "   ", "http://b.com"]);
        assert_eq!(added, 2);
        assert_eq!(t.targets(), ["http://a.com", "http://b.com"]);
    }

    #[test]
    fn test_remove_target_removes_all_occurrences() {
        let mut t = trigger("ship it", &["a", "b", "a"]);
        assert!(t.remove_target("a"));
        assert_eq!(t.targets(), ["b"]);
        assert!(!t.remove_target("a"));
    }

    #[test]
    fn test_random_target_is_a_member() {
        let t = trigger("ship it", &["a", "b", "c"]);
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..20 {
            let picked = t.random_target(&mut rng).unwrap();
            assert!(t.has_target(picked));
        }
    }

    #[test]
    fn test_random_target_on_empty_trigger() {
        let t = trigger("ship it", &[]);
        let mut rng = StdRng::seed_from_u64(7);
        assert!(t.random_target(&mut rng).is_none());
    }

    #[test]
    fn test_record_roundtrip_keeps_raw_pattern() {
        let t = trigger("  /Ship It/I ", &["a"]);
        let record = t.to_record();
        assert_eq!(record.raw_pattern, "/Ship It/I");
        assert!(record.is_regex);

        let restored = Trigger::from_record(record).unwrap();
        assert_eq!(restored.key(), "/Ship It/i");
        assert_eq!(restored.targets(), ["a"]);
        assert!(restored.is_match("Ship   It", false));
    }
}
