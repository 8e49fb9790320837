//! Emotion scoring using FastEmbed embeddings.
//!
//! Embeds a short description of each emotion once, then scores a text by
//! cosine similarity against every emotion. Labels follow the seven-class
//! English emotion taxonomy (anger, disgust, fear, joy, neutral, sadness,
//! surprise).

use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

use super::emotion::{EmotionModel, EmotionScore};
use crate::error::AppError;

struct EmotionTemplate {
    label: &'static str,
    descriptions: &'static [&'static str],
}

const EMOTION_TEMPLATES: &[EmotionTemplate] = &[
    EmotionTemplate {
        label: "anger",
        descriptions: &[
            "I am angry and furious",
            "this makes me mad and irritated",
            "rage frustration annoyed",
        ],
    },
    EmotionTemplate {
        label: "disgust",
        descriptions: &[
            "that is disgusting and gross",
            "I feel revolted and sickened",
            "repulsive nasty",
        ],
    },
    EmotionTemplate {
        label: "fear",
        descriptions: &[
            "I am scared and afraid",
            "I feel anxious and worried about what will happen",
            "terrified nervous panic",
        ],
    },
    EmotionTemplate {
        label: "joy",
        descriptions: &[
            "I am happy and delighted",
            "this is wonderful, I feel great",
            "excited grateful cheerful",
        ],
    },
    EmotionTemplate {
        label: "neutral",
        descriptions: &[
            "a plain factual statement",
            "nothing special, just an ordinary day",
            "okay fine normal",
        ],
    },
    EmotionTemplate {
        label: "sadness",
        descriptions: &[
            "I feel sad and down",
            "I am lonely, hopeless and heartbroken",
            "crying grief unhappy",
        ],
    },
    EmotionTemplate {
        label: "surprise",
        descriptions: &[
            "wow I did not expect that",
            "I am shocked and amazed",
            "unexpected astonished",
        ],
    },
];

/// Local embedding-backed emotion model.
pub struct SemanticEmotionModel {
    model: Arc<TextEmbedding>,
    emotion_embeddings: Vec<(&'static str, Vec<f32>)>,
}

impl SemanticEmotionModel {
    /// Loads `AllMiniLML6V2` from `cache_dir`, downloading it there on first use.
    pub fn load(cache_dir: &Path) -> Result<Self, AppError> {
        let mut options = InitOptions::new(EmbeddingModel::AllMiniLML6V2);
        options.show_download_progress = false;
        options.cache_dir = cache_dir.to_path_buf();

        let model = TextEmbedding::try_new(options)
            .map_err(|e| AppError::Emotion(format!("Failed to load embedding model: {}", e)))?;

        let mut classifier = Self {
            model: Arc::new(model),
            emotion_embeddings: Vec::new(),
        };
        classifier.precompute_emotion_embeddings();

        if classifier.emotion_embeddings.is_empty() {
            return Err(AppError::Emotion("No emotion embeddings could be computed".into()));
        }
        Ok(classifier)
    }

    fn precompute_emotion_embeddings(&mut self) {
        info!("Pre-computing emotion embeddings...");

        for template in EMOTION_TEMPLATES {
            let combined_text = template.descriptions.join(" ");

            match self.model.embed(vec![combined_text], None) {
                Ok(embeddings) if !embeddings.is_empty() => {
                    self.emotion_embeddings
                        .push((template.label, embeddings[0].clone()));
                }
                Ok(_) => warn!("Empty embedding for emotion {}", template.label),
                Err(e) => warn!("Failed to embed emotion {}: {}", template.label, e),
            }
        }

        info!(
            "Pre-computed {} emotion embeddings",
            self.emotion_embeddings.len()
        );
    }
}

impl EmotionModel for SemanticEmotionModel {
    fn name(&self) -> &str {
        "semantic-all-minilm-l6-v2"
    }

    fn predict(&self, text: &str, top_k: usize) -> Result<Vec<EmotionScore>, AppError> {
        let query_embedding = match self.model.embed(vec![text.to_string()], None) {
            Ok(embeddings) if !embeddings.is_empty() => embeddings[0].clone(),
            Ok(_) => return Err(AppError::Emotion("Empty embedding for text".into())),
            Err(e) => return Err(AppError::Emotion(format!("Embedding failed: {}", e))),
        };

        let mut results: Vec<EmotionScore> = self
            .emotion_embeddings
            .iter()
            .map(|(label, emb)| EmotionScore {
                label: label.to_string(),
                score: cosine_similarity(&query_embedding, emb).max(0.0),
            })
            .collect();

        results.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        results.truncate(top_k);
        Ok(results)
    }
}

/// Calculate cosine similarity between two vectors
fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let magnitude_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let magnitude_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if magnitude_a == 0.0 || magnitude_b == 0.0 {
        return 0.0;
    }

    dot_product / (magnitude_a * magnitude_b)
}
