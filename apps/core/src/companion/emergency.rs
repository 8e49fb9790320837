//! Crisis phrase detection.
//!
//! Runs on the raw (non-normalized) text before any classification and
//! short-circuits it. Matching is plain substring search on the case-folded
//! input, so a phrase embedded in a longer word still matches.

/// Fixed crisis phrases.
pub const EMERGENCY_PHRASES: &[&str] = &[
    "suicide",
    "kill myself",
    "end my life",
    "i want to die",
    "self harm",
];

#[derive(Debug, Clone, Copy, Default)]
pub struct EmergencyDetector;

impl EmergencyDetector {
    pub fn new() -> Self {
        Self
    }

    /// True iff the case-folded text contains at least one crisis phrase.
    pub fn detect(&self, text: &str) -> bool {
        self.matched_phrase(text).is_some()
    }

    /// The first crisis phrase found in the text, if any.
    pub fn matched_phrase(&self, text: &str) -> Option<&'static str> {
        let folded = text.to_lowercase();
        EMERGENCY_PHRASES
            .iter()
            .copied()
            .find(|phrase| folded.contains(phrase))
    }
}
