//! Fitted model artifacts loaded from JSON.
//!
//! The vectorizer mirrors a TF-IDF transform (token pattern `\b\w\w+\b`,
//! word n-grams, optional sublinear tf, idf weighting, l1/l2 norm). The
//! classifier is either a logistic regression or a multinomial naive Bayes
//! model over the same feature columns.
//!
//! Everything is validated at load time; a bad artifact is a fatal
//! [`AppError::Artifact`].

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fs;
use std::path::Path;
use std::sync::LazyLock;
use tracing::info;

use super::sentiment::{BinaryClassifier, SparseVector, TextVectorizer};
use crate::error::AppError;

static TOKEN_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\w\w+\b").expect("Invalid regex: token pattern"));

fn read_artifact(path: &Path, what: &str) -> Result<String, AppError> {
    if !path.exists() {
        return Err(AppError::Artifact(format!(
            "{} not found at {}",
            what,
            path.display()
        )));
    }
    fs::read_to_string(path).map_err(|e| {
        AppError::Artifact(format!("Failed to read {} at {}: {}", what, path.display(), e))
    })
}

fn all_finite(values: &[f64]) -> bool {
    values.iter().all(|v| v.is_finite())
}

// --- Vectorizer ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Norm {
    L1,
    L2,
}

fn default_ngram_range() -> (usize, usize) {
    (1, 1)
}

fn default_norm() -> Option<Norm> {
    Some(Norm::L2)
}

/// TF-IDF vectorizer fitted elsewhere and exported as JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TfidfVectorizer {
    /// Term (or space-joined n-gram) to column index.
    pub vocabulary: HashMap<String, usize>,
    /// Inverse document frequency per column.
    pub idf: Vec<f64>,
    #[serde(default = "default_ngram_range")]
    pub ngram_range: (usize, usize),
    #[serde(default)]
    pub sublinear_tf: bool,
    #[serde(default = "default_norm")]
    pub norm: Option<Norm>,
    #[serde(default)]
    pub stop_words: HashSet<String>,
}

impl TfidfVectorizer {
    pub fn from_json(json: &str) -> Result<Self, AppError> {
        let vectorizer: Self = serde_json::from_str(json)
            .map_err(|e| AppError::Artifact(format!("Corrupt vectorizer artifact: {}", e)))?;
        vectorizer.check()?;
        Ok(vectorizer)
    }

    pub fn load(path: &Path) -> Result<Self, AppError> {
        let vectorizer = Self::from_json(&read_artifact(path, "Vectorizer artifact")?)?;
        info!(
            "Loaded TF-IDF vectorizer: {} terms, ngram_range={:?}",
            vectorizer.vocabulary.len(),
            vectorizer.ngram_range
        );
        Ok(vectorizer)
    }

    fn check(&self) -> Result<(), AppError> {
        if self.vocabulary.is_empty() {
            return Err(AppError::Artifact("Vectorizer vocabulary is empty".into()));
        }
        if self.idf.len() != self.vocabulary.len() {
            return Err(AppError::Artifact(format!(
                "Vectorizer has {} idf weights for {} terms",
                self.idf.len(),
                self.vocabulary.len()
            )));
        }
        if let Some((term, index)) = self
            .vocabulary
            .iter()
            .find(|(_, index)| **index >= self.idf.len())
        {
            return Err(AppError::Artifact(format!(
                "Vocabulary term {:?} maps to out-of-range column {}",
                term, index
            )));
        }
        let (min_n, max_n) = self.ngram_range;
        if min_n == 0 || min_n > max_n {
            return Err(AppError::Artifact(format!(
                "Invalid ngram_range {:?}",
                self.ngram_range
            )));
        }
        if !all_finite(&self.idf) {
            return Err(AppError::Artifact("Vectorizer idf contains non-finite values".into()));
        }
        Ok(())
    }

    fn tokens<'a>(&self, text: &'a str) -> Vec<&'a str> {
        TOKEN_PATTERN
            .find_iter(text)
            .map(|m| m.as_str())
            .filter(|token| !self.stop_words.contains(*token))
            .collect()
    }

    fn term_counts(&self, tokens: &[&str]) -> BTreeMap<usize, f64> {
        let mut counts: BTreeMap<usize, f64> = BTreeMap::new();
        let (min_n, max_n) = self.ngram_range;

        for n in min_n..=max_n.min(tokens.len()) {
            for window in tokens.windows(n) {
                let gram = window.join(" ");
                if let Some(&column) = self.vocabulary.get(&gram) {
                    *counts.entry(column).or_insert(0.0) += 1.0;
                }
            }
        }

        counts
    }
}

impl TextVectorizer for TfidfVectorizer {
    fn dimension(&self) -> usize {
        self.idf.len()
    }

    fn transform(&self, text: &str) -> SparseVector {
        let lowered = text.to_lowercase();
        let tokens = self.tokens(&lowered);

        let mut features: SparseVector = self
            .term_counts(&tokens)
            .into_iter()
            .map(|(column, tf)| {
                let tf = if self.sublinear_tf { 1.0 + tf.ln() } else { tf };
                (column, tf * self.idf[column])
            })
            .collect();

        let magnitude = match self.norm {
            Some(Norm::L2) => features.iter().map(|(_, w)| w * w).sum::<f64>().sqrt(),
            Some(Norm::L1) => features.iter().map(|(_, w)| w.abs()).sum::<f64>(),
            None => 1.0,
        };
        if magnitude > 0.0 {
            for (_, weight) in &mut features {
                *weight /= magnitude;
            }
        }

        features
    }
}

// --- Classifier ---

/// Binary classifier artifact, tagged by `kind`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ClassifierArtifact {
    LogisticRegression {
        coef: Vec<f64>,
        intercept: f64,
    },
    MultinomialNb {
        class_log_prior: [f64; 2],
        feature_log_prob: [Vec<f64>; 2],
    },
}

impl ClassifierArtifact {
    pub fn from_json(json: &str) -> Result<Self, AppError> {
        let model: Self = serde_json::from_str(json)
            .map_err(|e| AppError::Artifact(format!("Corrupt classifier artifact: {}", e)))?;
        model.check()?;
        Ok(model)
    }

    pub fn load(path: &Path) -> Result<Self, AppError> {
        let model = Self::from_json(&read_artifact(path, "Classifier artifact")?)?;
        info!(
            "Loaded {} classifier over {} features",
            model.kind(),
            model.dimension()
        );
        Ok(model)
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ClassifierArtifact::LogisticRegression { .. } => "logistic_regression",
            ClassifierArtifact::MultinomialNb { .. } => "multinomial_nb",
        }
    }

    fn check(&self) -> Result<(), AppError> {
        match self {
            ClassifierArtifact::LogisticRegression { coef, intercept } => {
                if coef.is_empty() {
                    return Err(AppError::Artifact("Logistic regression has no coefficients".into()));
                }
                if !all_finite(coef) || !intercept.is_finite() {
                    return Err(AppError::Artifact(
                        "Logistic regression contains non-finite weights".into(),
                    ));
                }
            }
            ClassifierArtifact::MultinomialNb {
                class_log_prior,
                feature_log_prob,
            } => {
                let [neg, pos] = feature_log_prob;
                if neg.is_empty() || neg.len() != pos.len() {
                    return Err(AppError::Artifact(format!(
                        "Naive Bayes feature_log_prob rows have lengths {} and {}",
                        neg.len(),
                        pos.len()
                    )));
                }
                if !all_finite(class_log_prior) || !all_finite(neg) || !all_finite(pos) {
                    return Err(AppError::Artifact(
                        "Naive Bayes contains non-finite log probabilities".into(),
                    ));
                }
            }
        }
        Ok(())
    }

    /// Unnormalized log scores for classes [0, 1].
    fn joint_log_likelihood(&self, features: &SparseVector) -> [f64; 2] {
        match self {
            ClassifierArtifact::LogisticRegression { coef, intercept } => {
                let z = intercept + dot(coef, features);
                // log P(1) - log P(0) = z
                [0.0, z]
            }
            ClassifierArtifact::MultinomialNb {
                class_log_prior,
                feature_log_prob,
            } => [
                class_log_prior[0] + dot(&feature_log_prob[0], features),
                class_log_prior[1] + dot(&feature_log_prob[1], features),
            ],
        }
    }
}

fn dot(weights: &[f64], features: &SparseVector) -> f64 {
    features
        .iter()
        .filter_map(|&(column, value)| weights.get(column).map(|w| w * value))
        .sum()
}

impl BinaryClassifier for ClassifierArtifact {
    fn dimension(&self) -> usize {
        match self {
            ClassifierArtifact::LogisticRegression { coef, .. } => coef.len(),
            ClassifierArtifact::MultinomialNb {
                feature_log_prob, ..
            } => feature_log_prob[0].len(),
        }
    }

    fn predict(&self, features: &SparseVector) -> u8 {
        let [neg, pos] = self.joint_log_likelihood(features);
        if pos > neg {
            1
        } else {
            0
        }
    }

    fn predict_proba(&self, features: &SparseVector) -> [f64; 2] {
        let [neg, pos] = self.joint_log_likelihood(features);
        // log-sum-exp normalisation
        let max = neg.max(pos);
        let log_total = max + ((neg - max).exp() + (pos - max).exp()).ln();
        [(neg - log_total).exp(), (pos - log_total).exp()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const VECTORIZER_JSON: &str = r#"{
        "vocabulary": {"happy": 0, "sad": 1, "very": 2, "very happy": 3},
        "idf": [1.0, 1.0, 2.0, 3.0],
        "ngram_range": [1, 2],
        "stop_words": ["the"]
    }"#;

    fn vectorizer() -> TfidfVectorizer {
        TfidfVectorizer::from_json(VECTORIZER_JSON).unwrap()
    }

    #[test]
    fn test_transform_l2_normalized() {
        let v = vectorizer();
        let features = v.transform("Very happy");
        let columns: Vec<usize> = features.iter().map(|(c, _)| *c).collect();
        assert_eq!(columns, vec![0, 2, 3]);

        let norm: f64 = features.iter().map(|(_, w)| w * w).sum::<f64>().sqrt();
        assert!((norm - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_transform_unknown_and_empty() {
        let v = vectorizer();
        assert!(v.transform("").is_empty());
        assert!(v.transform("the unknown words").is_empty());
        // single-letter tokens are ignored by the token pattern
        assert!(v.transform("a b c").is_empty());
    }

    #[test]
    fn test_sublinear_and_no_norm() {
        let mut v = vectorizer();
        v.norm = None;
        v.sublinear_tf = true;
        let features = v.transform("sad sad sad");
        assert_eq!(features.len(), 1);
        assert!((features[0].1 - (1.0 + 3f64.ln())).abs() < 1e-9);
    }

    #[test]
    fn test_rejects_bad_vectorizer() {
        let cases = [
            r#"{"vocabulary": {}, "idf": []}"#,
            r#"{"vocabulary": {"a": 0, "b": 1}, "idf": [1.0]}"#,
            r#"{"vocabulary": {"a": 5}, "idf": [1.0]}"#,
            r#"{"vocabulary": {"a": 0}, "idf": [1.0], "ngram_range": [2, 1]}"#,
            r#"not json"#,
        ];
        for case in cases {
            let err = TfidfVectorizer::from_json(case).unwrap_err();
            assert!(matches!(err, AppError::Artifact(_)), "accepted {}", case);
        }
    }

    #[test]
    fn test_logistic_regression() {
        let model = ClassifierArtifact::from_json(
            r#"{"kind": "logistic_regression", "coef": [2.0, -2.0, 0.0, 1.0], "intercept": 0.0}"#,
        )
        .unwrap();
        assert_eq!(model.dimension(), 4);

        let positive = vec![(0, 1.0)];
        assert_eq!(model.predict(&positive), 1);
        let proba = model.predict_proba(&positive);
        assert!((proba[1] - 1.0 / (1.0 + (-2.0f64).exp())).abs() < 1e-12);
        assert!((proba[0] + proba[1] - 1.0).abs() < 1e-12);

        assert_eq!(model.predict(&vec![(1, 1.0)]), 0);

        // zero vector sits exactly on the boundary: class 0, 50%
        let empty: SparseVector = vec![];
        assert_eq!(model.predict(&empty), 0);
        assert!((model.predict_proba(&empty)[0] - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_multinomial_nb() {
        let model = ClassifierArtifact::from_json(
            r#"{
                "kind": "multinomial_nb",
                "class_log_prior": [-0.6931471805599453, -0.6931471805599453],
                "feature_log_prob": [[-2.0, -0.5], [-0.5, -2.0]]
            }"#,
        )
        .unwrap();
        assert_eq!(model.kind(), "multinomial_nb");
        assert_eq!(model.predict(&vec![(0, 1.0)]), 1);
        assert_eq!(model.predict(&vec![(1, 1.0)]), 0);

        let proba = model.predict_proba(&vec![(0, 1.0)]);
        let expected = 1.0 / (1.0 + (-1.5f64).exp());
        assert!((proba[1] - expected).abs() < 1e-12);
    }

    #[test]
    fn test_rejects_bad_classifier() {
        let cases = [
            r#"{"kind": "logistic_regression", "coef": [], "intercept": 0.0}"#,
            r#"{"kind": "multinomial_nb", "class_log_prior": [0.0, 0.0], "feature_log_prob": [[1.0], [1.0, 2.0]]}"#,
            r#"{"kind": "svm", "coef": [1.0]}"#,
        ];
        for case in cases {
            let err = ClassifierArtifact::from_json(case).unwrap_err();
            assert!(matches!(err, AppError::Artifact(_)), "accepted {}", case);
        }
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(VECTORIZER_JSON.as_bytes()).unwrap();
        let v = TfidfVectorizer::load(file.path()).unwrap();
        assert_eq!(v.dimension(), 4);
    }

    #[test]
    fn test_missing_file_is_artifact_error() {
        let err = ClassifierArtifact::load(Path::new("/nonexistent/sentiment_model.json")).unwrap_err();
        assert!(matches!(err, AppError::Artifact(_)));
        assert!(err.is_fatal());
    }
}
