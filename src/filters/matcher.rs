//! Keyword matching for incoming messages.
//!
//! A keyword matches when it appears in the text case-insensitively and is
//! bounded on both sides by the start/end of text or a non-word character.

use regex::{Regex, RegexBuilder};
use tracing::warn;

use crate::cache::{CacheConfig, CacheRegistry, TypedCache};

/// Finds the first registered keyword present in a message.
///
/// Compiled patterns are cached per keyword, since every chat message is
/// checked against every keyword of its chat.
#[derive(Debug, Clone)]
pub struct KeywordMatcher {
    patterns: TypedCache<String, Regex>,
}

impl KeywordMatcher {
    pub fn new(cache: &CacheRegistry) -> Self {
        Self {
            patterns: cache.get_or_create("keyword_patterns", CacheConfig::compiled()),
        }
    }

    /// First keyword in `keywords` (storage order) that occurs in `text`.
    pub fn first_match<'a>(&self, keywords: &'a [String], text: &str) -> Option<&'a str> {
        keywords
            .iter()
            .find(|keyword| self.is_match(keyword, text))
            .map(String::as_str)
    }

    fn is_match(&self, keyword: &str, text: &str) -> bool {
        if let Some(re) = self.patterns.get(&keyword.to_string()) {
            return re.is_match(text);
        }

        match keyword_pattern(keyword) {
            Ok(re) => {
                let matched = re.is_match(text);
                self.patterns.insert(keyword.to_string(), re);
                matched
            }
            Err(e) => {
                warn!("Cannot compile pattern for keyword '{}': {}", keyword, e);
                false
            }
        }
    }
}

/// Build the whole-word, case-insensitive pattern for a keyword.
pub fn keyword_pattern(keyword: &str) -> Result<Regex, regex::Error> {
    RegexBuilder::new(&format!(r"(?:^|[^\w]){}(?:$|[^\w])", regex::escape(keyword)))
        .case_insensitive(true)
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matcher() -> KeywordMatcher {
        KeywordMatcher::new(&CacheRegistry::new())
    }

    fn keys(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_whole_word_only() {
        let m = matcher();
        let keywords = keys(&["cat"]);

        assert_eq!(m.first_match(&keywords, "I like cats"), None);
        assert_eq!(m.first_match(&keywords, "I like cat."), Some("cat"));
        assert_eq!(m.first_match(&keywords, "cat"), Some("cat"));
        assert_eq!(m.first_match(&keywords, "concatenate"), None);
    }

    #[test]
    fn test_case_insensitive() {
        let m = matcher();
        let keywords = keys(&["hello world"]);
        assert_eq!(m.first_match(&keywords, "well, HELLO World!"), Some("hello world"));
    }

    #[test]
    fn test_first_registered_wins() {
        let m = matcher();
        let keywords = keys(&["dog", "cat"]);
        assert_eq!(m.first_match(&keywords, "cat and dog"), Some("dog"));
    }

    #[test]
    fn test_special_characters_are_literal() {
        let m = matcher();
        let keywords = keys(&["c++", "a.b"]);

        assert_eq!(m.first_match(&keywords, "I write c++ daily"), Some("c++"));
        assert_eq!(m.first_match(&keywords, "axb"), None);
    }

    #[test]
    fn test_cached_pattern_reused() {
        let registry = CacheRegistry::new();
        let m = KeywordMatcher::new(&registry);
        let keywords = keys(&["ping"]);

        assert!(m.first_match(&keywords, "ping").is_some());
        assert!(m.first_match(&keywords, "ping pong").is_some());
        assert!(m.patterns.get(&"ping".to_string()).is_some());
    }
}
