//! Reply selection.
//!
//! Ordered rules, first match wins:
//! 1. Emergency label → crisis message
//! 2. negative streak at or above the distress threshold → sustained-distress message
//! 3. Negative → empathetic prompt
//! 4. Positive → encouragement
//! 5. otherwise → neutral acknowledgment

use serde::{Deserialize, Serialize};

use super::emergency::EmergencyDetector;
use super::sentiment::SentimentLabel;

pub const DEFAULT_DISTRESS_STREAK: u32 = 3;

pub const CRISIS_MESSAGE: &str = "🚨 I’m really concerned about your safety.\n\n\
📞 AASRA (India): 91-9820466726\n\
📞 Emergency: 112\n\n\
You are not alone.";
pub const SUSTAINED_DISTRESS_MESSAGE: &str =
    "💙 I’ve noticed this has been heavy for you. I’m here with you.";
pub const EMPATHETIC_MESSAGE: &str = "💭 That sounds really difficult. Want to share more?";
pub const ENCOURAGING_MESSAGE: &str = "😊 I’m glad to hear that. What helped today?";
pub const NEUTRAL_MESSAGE: &str = "🙂 I’m listening.";
pub const UNAVAILABLE_MESSAGE: &str = "⚠️ I’m unavailable right now. \
If you are in immediate danger, please contact emergency services.";

/// Which rule produced the reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplyKind {
    Crisis,
    SustainedDistress,
    Empathetic,
    Encouraging,
    Acknowledgment,
}

impl ReplyKind {
    pub fn text(&self) -> &'static str {
        match self {
            ReplyKind::Crisis => CRISIS_MESSAGE,
            ReplyKind::SustainedDistress => SUSTAINED_DISTRESS_MESSAGE,
            ReplyKind::Empathetic => EMPATHETIC_MESSAGE,
            ReplyKind::Encouraging => ENCOURAGING_MESSAGE,
            ReplyKind::Acknowledgment => NEUTRAL_MESSAGE,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ResponsePolicy {
    distress_streak: u32,
}

impl Default for ResponsePolicy {
    fn default() -> Self {
        Self::new(DEFAULT_DISTRESS_STREAK)
    }
}

impl ResponsePolicy {
    pub fn new(distress_streak: u32) -> Self {
        Self {
            distress_streak: distress_streak.max(1),
        }
    }

    pub fn distress_streak(&self) -> u32 {
        self.distress_streak
    }

    /// `negative_streak` must already include the current turn.
    pub fn select(&self, label: SentimentLabel, negative_streak: u32) -> ReplyKind {
        if label == SentimentLabel::Emergency {
            return ReplyKind::Crisis;
        }
        if negative_streak >= self.distress_streak {
            return ReplyKind::SustainedDistress;
        }
        match label {
            SentimentLabel::Negative => ReplyKind::Empathetic,
            SentimentLabel::Positive => ReplyKind::Encouraging,
            _ => ReplyKind::Acknowledgment,
        }
    }

    pub fn reply(&self, label: SentimentLabel, negative_streak: u32) -> &'static str {
        self.select(label, negative_streak).text()
    }
}

/// Reply while the sentiment models could not be loaded.
/// Crisis detection needs no model, so the crisis message is still delivered.
pub fn unavailable_reply(detector: &EmergencyDetector, raw_text: &str) -> &'static str {
    if detector.detect(raw_text) {
        CRISIS_MESSAGE
    } else {
        UNAVAILABLE_MESSAGE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crisis_wins() {
        let policy = ResponsePolicy::default();
        assert_eq!(policy.select(SentimentLabel::Emergency, 0), ReplyKind::Crisis);
        assert_eq!(policy.select(SentimentLabel::Emergency, 10), ReplyKind::Crisis);

        let reply = policy.reply(SentimentLabel::Emergency, 0);
        assert!(reply.contains("112"));
        assert!(reply.contains("AASRA"));
        assert!(reply.ends_with("You are not alone."));
    }

    #[test]
    fn test_streak_overrides_label() {
        let policy = ResponsePolicy::default();
        assert_eq!(
            policy.select(SentimentLabel::Negative, 3),
            ReplyKind::SustainedDistress
        );
        // Fires regardless of the current label.
        assert_eq!(
            policy.select(SentimentLabel::Positive, 4),
            ReplyKind::SustainedDistress
        );
        assert_eq!(
            policy.select(SentimentLabel::Neutral, 3),
            ReplyKind::SustainedDistress
        );
    }

    #[test]
    fn test_plain_labels() {
        let policy = ResponsePolicy::default();
        assert_eq!(policy.reply(SentimentLabel::Negative, 2), EMPATHETIC_MESSAGE);
        assert_eq!(policy.reply(SentimentLabel::Positive, 0), ENCOURAGING_MESSAGE);
        assert_eq!(policy.reply(SentimentLabel::Neutral, 0), NEUTRAL_MESSAGE);
    }

    #[test]
    fn test_custom_threshold() {
        let policy = ResponsePolicy::new(5);
        assert_eq!(policy.select(SentimentLabel::Negative, 4), ReplyKind::Empathetic);
        assert_eq!(
            policy.select(SentimentLabel::Negative, 5),
            ReplyKind::SustainedDistress
        );
        assert_eq!(ResponsePolicy::new(0).distress_streak(), 1);
    }

    #[test]
    fn test_unavailable_still_delivers_crisis() {
        let detector = EmergencyDetector::new();
        assert_eq!(unavailable_reply(&detector, "I want to die"), CRISIS_MESSAGE);
        assert_eq!(unavailable_reply(&detector, "hello"), UNAVAILABLE_MESSAGE);
    }
}
