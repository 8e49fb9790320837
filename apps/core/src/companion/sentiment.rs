//! Sentiment classification over externally fitted models.
//!
//! The vectorizer and the binary classifier are injected as trait objects so
//! that the thresholding logic stays independent of the artifact format.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::debug;

use super::normalizer::TextNormalizer;
use crate::error::AppError;

/// Confidence reported for the Emergency label.
pub const EMERGENCY_CONFIDENCE: f64 = 100.0;

/// Default percent below which a prediction is downgraded to Neutral.
pub const DEFAULT_NEUTRAL_THRESHOLD: f64 = 60.0;

/// Mood label assigned to one utterance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SentimentLabel {
    Positive,
    Negative,
    Neutral,
    /// Crisis phrase detected; pre-empts the classifier.
    Emergency,
}

impl SentimentLabel {
    pub const ALL: [SentimentLabel; 4] = [
        SentimentLabel::Positive,
        SentimentLabel::Negative,
        SentimentLabel::Neutral,
        SentimentLabel::Emergency,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SentimentLabel::Positive => "Positive",
            SentimentLabel::Negative => "Negative",
            SentimentLabel::Neutral => "Neutral",
            SentimentLabel::Emergency => "Emergency",
        }
    }
}

impl fmt::Display for SentimentLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SentimentLabel {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SentimentLabel::ALL
            .into_iter()
            .find(|label| label.as_str() == s.trim())
            .ok_or_else(|| AppError::Validation(format!("Unknown mood label: {:?}", s)))
    }
}

/// Label plus confidence in percent (0-100, two decimals).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub label: SentimentLabel,
    pub confidence: f64,
}

impl ClassificationResult {
    pub fn emergency() -> Self {
        Self {
            label: SentimentLabel::Emergency,
            confidence: EMERGENCY_CONFIDENCE,
        }
    }
}

/// Sparse feature vector: (column, weight) pairs sorted by column.
pub type SparseVector = Vec<(usize, f64)>;

/// A pre-fitted text vectorizer. Only `transform` is ever called.
pub trait TextVectorizer: Send + Sync {
    /// Number of feature columns.
    fn dimension(&self) -> usize;

    fn transform(&self, text: &str) -> SparseVector;
}

/// A pre-fitted binary classifier (classes 0 and 1).
pub trait BinaryClassifier: Send + Sync {
    /// Number of feature columns the model was fitted on.
    fn dimension(&self) -> usize;

    /// Predicted class, 0 or 1.
    fn predict(&self, features: &SparseVector) -> u8;

    /// Probabilities for classes [0, 1].
    fn predict_proba(&self, features: &SparseVector) -> [f64; 2];
}

/// Three-way sentiment classifier with confidence thresholding.
pub struct SentimentClassifier {
    normalizer: TextNormalizer,
    vectorizer: Arc<dyn TextVectorizer>,
    model: Arc<dyn BinaryClassifier>,
    neutral_threshold: f64,
}

impl SentimentClassifier {
    /// Fails when the vectorizer and classifier disagree on the feature space.
    pub fn new(
        vectorizer: Arc<dyn TextVectorizer>,
        model: Arc<dyn BinaryClassifier>,
    ) -> Result<Self, AppError> {
        if vectorizer.dimension() != model.dimension() {
            return Err(AppError::Artifact(format!(
                "Vectorizer produces {} features but classifier expects {}",
                vectorizer.dimension(),
                model.dimension()
            )));
        }

        Ok(Self {
            normalizer: TextNormalizer::new(),
            vectorizer,
            model,
            neutral_threshold: DEFAULT_NEUTRAL_THRESHOLD,
        })
    }

    pub fn with_neutral_threshold(mut self, threshold: f64) -> Self {
        self.neutral_threshold = threshold;
        self
    }

    pub fn neutral_threshold(&self) -> f64 {
        self.neutral_threshold
    }

    /// Classifies raw text. Only meant for turns where no crisis phrase was found.
    pub fn classify(&self, raw_text: &str) -> ClassificationResult {
        let normalized = self.normalizer.normalize(raw_text);
        let features = self.vectorizer.transform(&normalized);

        let prediction = self.model.predict(&features);
        let proba = self.model.predict_proba(&features);
        let percent = proba[0].max(proba[1]) * 100.0;

        let provisional = if prediction == 1 {
            SentimentLabel::Positive
        } else {
            SentimentLabel::Negative
        };

        // Compare on the unrounded value; only strictly-below downgrades.
        let label = if percent < self.neutral_threshold {
            SentimentLabel::Neutral
        } else {
            provisional
        };
        let confidence = round2(percent);

        debug!(
            "Classified {} normalized chars: prediction={} confidence={:.2} label={}",
            normalized.len(),
            prediction,
            confidence,
            label
        );

        ClassificationResult { label, confidence }
    }
}

/// Round to two decimal places.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
