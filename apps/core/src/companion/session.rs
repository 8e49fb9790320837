//! Per-user conversation state and the turn pipeline.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, info};
use uuid::Uuid;

use super::emotion::EmotionScores;
use super::journal::MoodJournal;
use super::response::ReplyKind;
use super::sentiment::{ClassificationResult, SentimentLabel};
use super::Companion;

/// Everything the host needs to render one turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnOutcome {
    pub label: SentimentLabel,
    /// Percent, two decimals; fixed at 100 for Emergency.
    pub confidence: f64,
    pub emotions: EmotionScores,
    pub reply: String,
    pub reply_kind: ReplyKind,
    /// Streak after this turn.
    pub negative_streak: u32,
    pub date: NaiveDate,
    pub processing_time_ms: u64,
}

impl TurnOutcome {
    pub fn is_emergency(&self) -> bool {
        self.label == SentimentLabel::Emergency
    }

    /// One-line summary for logs and the console host.
    pub fn summary(&self) -> String {
        format!(
            "Mood: {} ({:.2}%), streak: {}, emotions: {}",
            self.label,
            self.confidence,
            self.negative_streak,
            if self.emotions.is_empty() {
                "n/a".to_string()
            } else {
                self.emotions.to_string()
            }
        )
    }
}

/// State owned by one user session: the negative streak and the mood journal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationSession {
    id: Uuid,
    created_at: DateTime<Utc>,
    negative_streak: u32,
    journal: MoodJournal,
}

impl Default for ConversationSession {
    fn default() -> Self {
        Self::new()
    }
}

impl ConversationSession {
    pub fn new() -> Self {
        Self::with_id(Uuid::new_v4())
    }

    pub fn with_id(id: Uuid) -> Self {
        Self {
            id,
            created_at: Utc::now(),
            negative_streak: 0,
            journal: MoodJournal::new(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn negative_streak(&self) -> u32 {
        self.negative_streak
    }

    pub fn journal(&self) -> &MoodJournal {
        &self.journal
    }

    /// Runs one turn: emergency check, classification, journal, streak, emotions, reply.
    pub fn handle_turn(
        &mut self,
        companion: &Companion,
        raw_text: &str,
        today: NaiveDate,
    ) -> TurnOutcome {
        let start = Instant::now();

        // 1-2. Crisis phrases pre-empt the classifier entirely.
        let classification = if companion.emergency_detector().detect(raw_text) {
            ClassificationResult::emergency()
        } else {
            companion.sentiment_classifier().classify(raw_text)
        };
        let label = classification.label;

        // 3. Last write of the day wins.
        self.journal.record(today, label);

        // 4. Streak depends only on the current label.
        self.negative_streak = if label == SentimentLabel::Negative {
            self.negative_streak + 1
        } else {
            0
        };

        // 5. Informational; failures come back empty.
        let emotions = companion.emotion_scorer().score(raw_text);

        // 6. Uses the streak already updated for this turn.
        let reply_kind = companion
            .response_policy()
            .select(label, self.negative_streak);

        let outcome = TurnOutcome {
            label,
            confidence: classification.confidence,
            emotions,
            reply: reply_kind.text().to_string(),
            reply_kind,
            negative_streak: self.negative_streak,
            date: today,
            processing_time_ms: start.elapsed().as_millis() as u64,
        };

        debug!(
            "Session {} turn: {} chars -> {:?} ({:.2}), streak={}, reply={:?}",
            self.id,
            raw_text.chars().count(),
            outcome.label,
            outcome.confidence,
            outcome.negative_streak,
            outcome.reply_kind
        );

        outcome
    }

    /// Clears the streak and the journal. The only way session state is cleared.
    pub fn reset(&mut self) {
        info!(
            "Resetting session {} ({} journal entries, streak {})",
            self.id,
            self.journal.len(),
            self.negative_streak
        );
        self.negative_streak = 0;
        self.journal.clear();
    }
}
