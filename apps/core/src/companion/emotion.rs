//! Emotion scoring adapter.
//!
//! Informational only: the scores never influence the sentiment label or
//! the reply. Model failures degrade to an empty result.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::warn;

use crate::error::AppError;

pub const DEFAULT_EMOTION_TOP_K: usize = 3;

/// One emotion label with its probability in [0, 1].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmotionScore {
    pub label: String,
    pub score: f32,
}

/// Emotion scores ordered by descending score. Multi-label: need not sum to 1.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EmotionScores(pub Vec<EmotionScore>);

impl EmotionScores {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &EmotionScore> {
        self.0.iter()
    }

    pub fn top(&self) -> Option<&EmotionScore> {
        self.0.first()
    }
}

impl fmt::Display for EmotionScores {
    /// `joy (85.2%), surprise (10.0%)`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, emotion) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{} ({:.1}%)", emotion.label, emotion.score * 100.0)?;
        }
        Ok(())
    }
}

/// An external multi-label emotion model.
pub trait EmotionModel: Send + Sync {
    fn name(&self) -> &str;

    /// Up to `top_k` (label, score) pairs for the raw text.
    fn predict(&self, text: &str, top_k: usize) -> Result<Vec<EmotionScore>, AppError>;
}

/// Best-effort wrapper around an optional [`EmotionModel`].
#[derive(Clone)]
pub struct EmotionScorer {
    model: Option<Arc<dyn EmotionModel>>,
    top_k: usize,
}

impl Default for EmotionScorer {
    fn default() -> Self {
        Self::disabled()
    }
}

impl EmotionScorer {
    pub fn new(model: Arc<dyn EmotionModel>) -> Self {
        Self {
            model: Some(model),
            top_k: DEFAULT_EMOTION_TOP_K,
        }
    }

    /// A scorer that always returns empty scores.
    pub fn disabled() -> Self {
        Self {
            model: None,
            top_k: DEFAULT_EMOTION_TOP_K,
        }
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k.max(1);
        self
    }

    pub fn is_enabled(&self) -> bool {
        self.model.is_some()
    }

    /// Top-k emotions, sorted by descending score and clamped to [0, 1].
    /// Any model error is logged and yields empty scores.
    pub fn score(&self, raw_text: &str) -> EmotionScores {
        let Some(model) = &self.model else {
            return EmotionScores::default();
        };

        match model.predict(raw_text, self.top_k) {
            Ok(mut scores) => {
                scores.retain(|e| e.score.is_finite());
                for emotion in &mut scores {
                    emotion.score = emotion.score.clamp(0.0, 1.0);
                }
                scores.sort_by(|a, b| {
                    b.score
                        .partial_cmp(&a.score)
                        .unwrap_or(std::cmp::Ordering::Equal)
                });
                scores.truncate(self.top_k);
                EmotionScores(scores)
            }
            Err(e) => {
                warn!("Emotion model '{}' failed, omitting emotions: {}", model.name(), e);
                EmotionScores::default()
            }
        }
    }
}
