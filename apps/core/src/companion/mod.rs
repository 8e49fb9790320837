//! # Companion Module
//!
//! Turn classifier and response policy for the mood companion.
//!
//! ## Components
//! - `normalizer`: lowercase/letters-only text cleanup
//! - `emergency`: crisis phrase detection (checked first)
//! - `sentiment`: three-way sentiment over injected vectorizer + classifier
//! - `artifacts`: JSON-serialized TF-IDF vectorizer and classifiers
//! - `emotion`: best-effort top-k emotion scores
//! - `semantic_emotion`: FastEmbed-backed emotion model
//! - `response`: ordered reply rules
//! - `journal`: per-day mood log, export and chart
//! - `session`: per-user state and the turn pipeline
//! - `registry`: isolated sessions over one shared `Companion`

pub mod artifacts;
pub mod emergency;
pub mod emotion;
pub mod journal;
pub mod normalizer;
pub mod registry;
pub mod response;
pub mod semantic_emotion;
pub mod sentiment;
pub mod session;

use std::sync::Arc;
use tracing::{info, warn};

use crate::error::AppError;
use crate::models::AssistantConfig;

pub use artifacts::{ClassifierArtifact, TfidfVectorizer};
pub use emergency::EmergencyDetector;
pub use emotion::{EmotionModel, EmotionScore, EmotionScorer, EmotionScores};
pub use journal::{MoodJournal, MoodRecord};
pub use normalizer::TextNormalizer;
pub use registry::SessionRegistry;
pub use response::{ReplyKind, ResponsePolicy};
pub use semantic_emotion::SemanticEmotionModel;
pub use sentiment::{
    BinaryClassifier, ClassificationResult, SentimentClassifier, SentimentLabel, TextVectorizer,
};
pub use session::{ConversationSession, TurnOutcome};

/// Long-lived, read-only model handle. Loaded once and shared across sessions.
pub struct Companion {
    emergency_detector: EmergencyDetector,
    sentiment_classifier: SentimentClassifier,
    emotion_scorer: EmotionScorer,
    response_policy: ResponsePolicy,
}

impl Companion {
    pub fn new(
        sentiment_classifier: SentimentClassifier,
        emotion_scorer: EmotionScorer,
        response_policy: ResponsePolicy,
    ) -> Self {
        Self {
            emergency_detector: EmergencyDetector::new(),
            sentiment_classifier,
            emotion_scorer,
            response_policy,
        }
    }

    /// Loads every artifact named by the configuration.
    ///
    /// A missing or corrupt vectorizer/classifier is fatal. The emotion model
    /// is optional: if it cannot be loaded, emotions are simply omitted.
    pub fn load(config: &AssistantConfig) -> Result<Self, AppError> {
        Self::from_parts(ModelArtifacts::load(config)?, config)
    }

    /// Builds the handle from artifacts that are already in memory.
    ///
    /// Nothing is read from disk here; the artifacts are moved in as-is.
    pub fn from_parts(artifacts: ModelArtifacts, config: &AssistantConfig) -> Result<Self, AppError> {
        let ModelArtifacts {
            vectorizer,
            classifier,
            emotion_model,
        } = artifacts;

        let sentiment_classifier =
            SentimentClassifier::new(Arc::new(vectorizer), Arc::new(classifier))?
                .with_neutral_threshold(config.neutral_threshold);

        let emotion_scorer = match emotion_model {
            Some(model) if config.emotion_enabled => EmotionScorer::new(Arc::new(model)),
            _ => EmotionScorer::disabled(),
        }
        .with_top_k(config.emotion_top_k);

        info!(
            "Companion ready (neutral threshold {:.1}%, distress streak {}, emotions {})",
            config.neutral_threshold,
            config.distress_streak,
            if emotion_scorer.is_enabled() { "on" } else { "off" }
        );

        Ok(Self::new(
            sentiment_classifier,
            emotion_scorer,
            ResponsePolicy::new(config.distress_streak),
        ))
    }

    pub fn emergency_detector(&self) -> &EmergencyDetector {
        &self.emergency_detector
    }

    pub fn sentiment_classifier(&self) -> &SentimentClassifier {
        &self.sentiment_classifier
    }

    pub fn emotion_scorer(&self) -> &EmotionScorer {
        &self.emotion_scorer
    }

    pub fn response_policy(&self) -> &ResponsePolicy {
        &self.response_policy
    }
}

/// Everything read from disk at startup. Loaded once, then moved into a [`Companion`].
pub struct ModelArtifacts {
    pub vectorizer: TfidfVectorizer,
    pub classifier: ClassifierArtifact,
    pub emotion_model: Option<SemanticEmotionModel>,
}

impl ModelArtifacts {
    pub fn load(config: &AssistantConfig) -> Result<Self, AppError> {
        Ok(Self {
            vectorizer: TfidfVectorizer::load(&config.vectorizer_path)?,
            classifier: ClassifierArtifact::load(&config.classifier_path)?,
            emotion_model: load_emotion_model(config).ok().flatten(),
        })
    }
}

/// `Ok(None)` when emotion scoring is switched off by configuration.
pub fn load_emotion_model(
    config: &AssistantConfig,
) -> Result<Option<SemanticEmotionModel>, AppError> {
    if !config.emotion_enabled {
        info!("Emotion scoring disabled by configuration");
        return Ok(None);
    }
    SemanticEmotionModel::load(&config.embeddings_dir)
        .map(Some)
        .inspect_err(|e| warn!("Emotion scoring disabled: {}", e))
}
