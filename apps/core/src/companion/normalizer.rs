//! Text normalization applied before vectorization.
//!
//! Lowercases, strips URL-like tokens and every character outside `[a-z]`
//! and whitespace, then collapses whitespace runs.

use regex::Regex;
use std::sync::LazyLock;

static URL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"http\S+|www\S+").expect("Invalid regex: URL pattern"));
static NON_LETTER_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z\s]").expect("Invalid regex: non-letter pattern"));
static WHITESPACE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("Invalid regex: whitespace pattern"));

/// Stateless text normalizer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextNormalizer;

impl TextNormalizer {
    pub fn new() -> Self {
        Self
    }

    /// Returns a string made only of lowercase ASCII letters separated by single spaces.
    /// Never fails; may return an empty string.
    pub fn normalize(&self, text: &str) -> String {
        let lowered = text.to_lowercase();
        let without_urls = URL_PATTERN.replace_all(&lowered, "");
        let letters_only = NON_LETTER_PATTERN.replace_all(&without_urls, "");
        WHITESPACE_PATTERN
            .replace_all(&letters_only, " ")
            .trim()
            .to_string()
    }
}
