//! Normalized topic keys.
//!
//! Every lookup in the pipeline (catalog, page cache, in-flight registry) is
//! keyed by a [`TopicKey`]: the raw query trimmed of surrounding whitespace
//! and lower-cased. Normalization is idempotent, so a key can be fed back
//! through [`TopicKey::normalize`] without changing.

use std::borrow::Borrow;
use std::fmt;

use serde::Serialize;
use slug::slugify;

const FALLBACK_FILE_STEM: &str = "page";

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct TopicKey(String);

impl TopicKey {
    /// Normalize a raw query. Returns `None` when nothing but whitespace remains.
    pub fn normalize(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }
        Some(Self(trimmed.to_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Title-case rendition used for default records and library listings.
    pub fn display_title(&self) -> String {
        capitalize_words(&self.0)
    }

    /// Filesystem-friendly stem for persisting a rendered page.
    pub fn file_stem(&self) -> String {
        let candidate = slugify(&self.0);
        if candidate.is_empty() {
            FALLBACK_FILE_STEM.to_string()
        } else {
            candidate
        }
    }
}

impl fmt::Display for TopicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for TopicKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for TopicKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Upper-case the first character of every space-separated word, keeping the
/// separators exactly as they appear.
pub fn capitalize_words(input: &str) -> String {
    input
        .split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_trims_and_lowercases() {
        let key = TopicKey::normalize("  Healthy Recipes \n").expect("non-empty key");
        assert_eq!(key.as_str(), "healthy recipes");
    }

    #[test]
    fn whitespace_only_queries_normalize_to_none() {
        assert!(TopicKey::normalize("").is_none());
        assert!(TopicKey::normalize("   \t\n").is_none());
    }

    #[test]
    fn normalization_is_idempotent() {
        for raw in [
            "Healthy Recipes",
            "  the FUTURE of AI ",
            "Quantum\tBiology",
            "ÉCOLE Normale",
            "javascript frameworks",
        ] {
            let once = TopicKey::normalize(raw).expect("non-empty key");
            let twice = TopicKey::normalize(once.as_str()).expect("non-empty key");
            assert_eq!(once, twice, "normalizing `{raw}` twice changed the key");
        }
    }

    #[test]
    fn display_title_capitalizes_each_word() {
        let key = TopicKey::normalize("quantum biology").expect("non-empty key");
        assert_eq!(key.display_title(), "Quantum Biology");
    }

    #[test]
    fn capitalize_words_preserves_repeated_separators() {
        assert_eq!(capitalize_words("a  b"), "A  B");
        assert_eq!(capitalize_words(""), "");
    }

    #[test]
    fn file_stem_falls_back_for_symbol_only_keys() {
        let key = TopicKey::normalize("History of the Internet").expect("non-empty key");
        assert_eq!(key.file_stem(), "history-of-the-internet");

        let symbols = TopicKey::normalize("???").expect("non-empty key");
        assert_eq!(symbols.file_stem(), "page");
    }
}
