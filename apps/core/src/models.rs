use crate::error::AppError;
use crate::fs_manager::PortablePathManager;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;
use validator::Validate;

pub const VECTORIZER_PATH_ENV: &str = "AARYA_VECTORIZER_PATH";
pub const CLASSIFIER_PATH_ENV: &str = "AARYA_CLASSIFIER_PATH";
pub const NEUTRAL_THRESHOLD_ENV: &str = "AARYA_NEUTRAL_THRESHOLD";
pub const DISTRESS_STREAK_ENV: &str = "AARYA_DISTRESS_STREAK";
pub const EMOTION_TOP_K_ENV: &str = "AARYA_EMOTION_TOP_K";
pub const EMOTION_ENABLED_ENV: &str = "AARYA_EMOTION_ENABLED";
pub const EMBEDDINGS_DIR_ENV: &str = "AARYA_EMBEDDINGS_DIR";

pub const DEFAULT_VECTORIZER_FILENAME: &str = "tfidf_vectorizer.json";
pub const DEFAULT_CLASSIFIER_FILENAME: &str = "sentiment_model.json";

/// Runtime configuration for the assistant's models and reply policy.
#[derive(Debug, Serialize, Deserialize, Clone, Validate)]
pub struct AssistantConfig {
    /// Serialized TF-IDF vectorizer.
    pub vectorizer_path: PathBuf,
    /// Serialized binary sentiment classifier.
    pub classifier_path: PathBuf,
    /// Confidence (percent) below which a Positive/Negative prediction becomes Neutral.
    #[validate(range(min = 0.0, max = 100.0))]
    pub neutral_threshold: f64,
    /// Consecutive Negative turns that trigger the sustained-distress reply.
    #[validate(range(min = 1))]
    pub distress_streak: u32,
    /// Number of emotions reported per turn.
    #[validate(range(min = 1, max = 7))]
    pub emotion_top_k: usize,
    /// Whether to load the embedding-backed emotion model at all.
    pub emotion_enabled: bool,
    /// Cache directory for the local embedding model.
    pub embeddings_dir: PathBuf,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        let models_dir = PortablePathManager::models_dir();
        Self {
            vectorizer_path: models_dir.join(DEFAULT_VECTORIZER_FILENAME),
            classifier_path: models_dir.join(DEFAULT_CLASSIFIER_FILENAME),
            neutral_threshold: 60.0,
            distress_streak: 3,
            emotion_top_k: 3,
            emotion_enabled: true,
            embeddings_dir: PortablePathManager::embeddings_dir(),
        }
    }
}

impl AssistantConfig {
    /// Builds the configuration from `AARYA_*` environment variables on top of the defaults,
    /// then validates it.
    pub fn from_env() -> Result<Self, AppError> {
        let mut config = Self::default();

        if let Some(path) = env_value(VECTORIZER_PATH_ENV) {
            config.vectorizer_path = PathBuf::from(path);
        }
        if let Some(path) = env_value(CLASSIFIER_PATH_ENV) {
            config.classifier_path = PathBuf::from(path);
        }
        if let Some(path) = env_value(EMBEDDINGS_DIR_ENV) {
            config.embeddings_dir = PathBuf::from(path);
        }
        if let Some(threshold) = parse_env(NEUTRAL_THRESHOLD_ENV)? {
            config.neutral_threshold = threshold;
        }
        if let Some(streak) = parse_env(DISTRESS_STREAK_ENV)? {
            config.distress_streak = streak;
        }
        if let Some(top_k) = parse_env(EMOTION_TOP_K_ENV)? {
            config.emotion_top_k = top_k;
        }
        if let Some(enabled) = env_value(EMOTION_ENABLED_ENV) {
            config.emotion_enabled = parse_flag(EMOTION_ENABLED_ENV, &enabled)?;
        }

        config.validate()?;
        Ok(config)
    }
}

fn env_value(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_env<T>(key: &str) -> Result<Option<T>, AppError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env_value(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| AppError::Config(format!("{}={:?}: {}", key, raw, e))),
        None => Ok(None),
    }
}

fn parse_flag(key: &str, raw: &str) -> Result<bool, AppError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(AppError::Config(format!("{}={:?}: expected a boolean", key, other))),
    }
}
