//! Integration Tests
//!
//! End-to-end workflows over real JSON artifacts written to a temp dir:
//! - Load → classify → reply, through `Companion::load`
//! - Fatal artifact failures and the unavailable fallback
//! - Journal export written to disk and parsed back
//! - Configuration from environment variables

use crate::companion::journal::EXPORT_FILENAME;
use crate::companion::response::{unavailable_reply, CRISIS_MESSAGE, UNAVAILABLE_MESSAGE};
use crate::companion::{EmergencyDetector, MoodJournal, ReplyKind, SentimentLabel};
use crate::error::AppError;
use crate::fs_manager::HOME_ENV;
use crate::models::{
    AssistantConfig, CLASSIFIER_PATH_ENV, DISTRESS_STREAK_ENV, EMBEDDINGS_DIR_ENV,
    EMOTION_ENABLED_ENV, EMOTION_TOP_K_ENV, NEUTRAL_THRESHOLD_ENV, VECTORIZER_PATH_ENV,
};
use crate::preflight::run_preflight_checks;
use crate::{Companion, ConversationSession, SessionRegistry};
use chrono::NaiveDate;
use std::fs;
use std::sync::Arc;
use tempfile::TempDir;

// ============================================================================
// Test Fixtures
// ============================================================================

const VECTORIZER_JSON: &str = r#"{
    "vocabulary": {"promotion": 0, "terrible": 1, "awful": 2, "tired": 3, "okay": 4},
    "idf": [1.0, 1.0, 1.0, 1.0, 1.0],
    "norm": null
}"#;

/// Unnormalized counts, so a lone "promotion" gives P(positive) = 0.85.
fn logistic_json() -> String {
    let promotion = (0.85f64 / 0.15).ln();
    format!(
        r#"{{"kind": "logistic_regression", "coef": [{}, -3.0, -2.0, -1.5, 0.2], "intercept": 0.0}}"#,
        promotion
    )
}

struct Fixture {
    dir: TempDir,
    config: AssistantConfig,
}

fn fixture() -> Fixture {
    let dir = TempDir::new().unwrap();
    let config = AssistantConfig {
        vectorizer_path: dir.path().join("tfidf_vectorizer.json"),
        classifier_path: dir.path().join("sentiment_model.json"),
        emotion_enabled: false,
        embeddings_dir: dir.path().join("embeddings"),
        ..AssistantConfig::default()
    };
    fs::write(&config.vectorizer_path, VECTORIZER_JSON).unwrap();
    fs::write(&config.classifier_path, logistic_json()).unwrap();
    Fixture { dir, config }
}

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, d).unwrap()
}

// ============================================================================
// Full turn workflows
// ============================================================================

#[cfg(test)]
mod workflow_tests {
    use super::*;

    #[test]
    fn test_promotion_over_real_artifacts() {
        let fx = fixture();
        let companion = Companion::load(&fx.config).unwrap();
        let mut session = ConversationSession::new();

        let outcome = session.handle_turn(&companion, "I got a promotion today!", day(19));
        assert_eq!(outcome.label, SentimentLabel::Positive);
        assert_eq!(outcome.confidence, 85.0);
        assert_eq!(outcome.reply_kind, ReplyKind::Encouraging);
        assert!(outcome.emotions.is_empty());
    }

    #[test]
    fn test_weak_signal_becomes_neutral() {
        let fx = fixture();
        let companion = Companion::load(&fx.config).unwrap();
        let mut session = ConversationSession::new();

        // sigmoid(0.2) ≈ 54.98%
        let outcome = session.handle_turn(&companion, "It was okay", day(19));
        assert_eq!(outcome.label, SentimentLabel::Neutral);
        assert_eq!(outcome.confidence, 54.98);

        // No known terms: both classes at 50%.
        let outcome = session.handle_turn(&companion, "", day(19));
        assert_eq!(outcome.label, SentimentLabel::Neutral);
        assert_eq!(outcome.confidence, 50.0);
    }

    #[test]
    fn test_threshold_from_config() {
        let mut fx = fixture();
        fx.config.neutral_threshold = 50.0;
        let companion = Companion::load(&fx.config).unwrap();
        let mut session = ConversationSession::new();

        let outcome = session.handle_turn(&companion, "It was okay", day(19));
        assert_eq!(outcome.label, SentimentLabel::Positive);
    }

    #[test]
    fn test_distress_conversation() {
        let fx = fixture();
        let companion = Companion::load(&fx.config).unwrap();
        let mut session = ConversationSession::new();

        let first = session.handle_turn(&companion, "Today was terrible.", day(17));
        let second = session.handle_turn(&companion, "I feel awful", day(18));
        let third = session.handle_turn(&companion, "so tired of everything", day(19));

        assert_eq!(first.label, SentimentLabel::Negative);
        assert_eq!(first.reply_kind, ReplyKind::Empathetic);
        assert_eq!(second.reply_kind, ReplyKind::Empathetic);
        assert_eq!(third.negative_streak, 3);
        assert_eq!(third.reply_kind, ReplyKind::SustainedDistress);

        let crisis = session.handle_turn(&companion, "I want to kill myself", day(19));
        assert!(crisis.is_emergency());
        assert_eq!(crisis.reply, CRISIS_MESSAGE);
        assert_eq!(crisis.negative_streak, 0);

        let history = session.journal().history();
        let labels: Vec<_> = history.iter().map(|r| r.label).collect();
        assert_eq!(
            labels,
            vec![
                SentimentLabel::Negative,
                SentimentLabel::Negative,
                SentimentLabel::Emergency
            ]
        );
        assert_eq!(session.journal().dominant(), Some(SentimentLabel::Negative));
    }

    #[test]
    fn test_custom_distress_streak() {
        let mut fx = fixture();
        fx.config.distress_streak = 2;
        let companion = Companion::load(&fx.config).unwrap();
        let mut session = ConversationSession::new();

        session.handle_turn(&companion, "terrible", day(19));
        let outcome = session.handle_turn(&companion, "awful", day(19));
        assert_eq!(outcome.reply_kind, ReplyKind::SustainedDistress);
    }

    #[test]
    fn test_naive_bayes_artifact() {
        let fx = fixture();
        fs::write(
            &fx.config.vectorizer_path,
            r#"{"vocabulary": {"good": 0, "bad": 1}, "idf": [1.0, 1.0], "norm": null}"#,
        )
        .unwrap();
        let (low, high) = (0.2f64.ln(), 0.8f64.ln());
        let half = 0.5f64.ln();
        fs::write(
            &fx.config.classifier_path,
            format!(
                r#"{{"kind": "multinomial_nb", "class_log_prior": [{half}, {half}],
                    "feature_log_prob": [[{low}, {high}], [{high}, {low}]]}}"#
            ),
        )
        .unwrap();

        let companion = Companion::load(&fx.config).unwrap();
        let mut session = ConversationSession::new();

        let good = session.handle_turn(&companion, "a good day", day(19));
        assert_eq!(good.label, SentimentLabel::Positive);
        assert_eq!(good.confidence, 80.0);

        let bad = session.handle_turn(&companion, "a bad day", day(19));
        assert_eq!(bad.label, SentimentLabel::Negative);
        assert_eq!(bad.confidence, 80.0);
    }

    #[test]
    fn test_registry_over_loaded_companion() {
        let fx = fixture();
        let registry = SessionRegistry::new(Arc::new(Companion::load(&fx.config).unwrap()));
        let a = registry.create().unwrap();
        let b = registry.create().unwrap();

        registry.handle_turn(a, "terrible", day(19)).unwrap();
        registry.handle_turn(b, "promotion", day(19)).unwrap();

        assert_eq!(registry.len().unwrap(), 2);
        assert_eq!(registry.negative_streak(a).unwrap(), 1);
        assert_eq!(registry.negative_streak(b).unwrap(), 0);
    }
}

// ============================================================================
// Artifact failures
// ============================================================================

#[cfg(test)]
mod failure_tests {
    use super::*;

    #[test]
    fn test_missing_artifact_is_fatal() {
        let fx = fixture();
        fs::remove_file(&fx.config.classifier_path).unwrap();

        let err = Companion::load(&fx.config).err().unwrap();
        assert!(matches!(err, AppError::Artifact(_)));
        assert!(err.is_fatal());
    }

    #[test]
    fn test_corrupt_artifact_is_fatal() {
        let fx = fixture();
        fs::write(&fx.config.vectorizer_path, "{ not json").unwrap();

        let err = Companion::load(&fx.config).err().unwrap();
        assert!(matches!(err, AppError::Artifact(_)));
    }

    #[test]
    fn test_mismatched_artifacts_are_fatal() {
        let fx = fixture();
        fs::write(
            &fx.config.classifier_path,
            r#"{"kind": "logistic_regression", "coef": [1.0, -1.0], "intercept": 0.0}"#,
        )
        .unwrap();

        let err = Companion::load(&fx.config).err().unwrap();
        assert!(matches!(err, AppError::Artifact(_)));
    }

    #[test]
    fn test_unavailable_mode_keeps_crisis_reply() {
        let fx = fixture();
        fs::remove_file(&fx.config.vectorizer_path).unwrap();

        temp_env::with_var(HOME_ENV, Some(fx.dir.path().as_os_str()), || {
            let report = run_preflight_checks(&fx.config).report;
            assert!(!report.ready_to_start);
        });
        assert!(Companion::load(&fx.config).is_err());

        let detector = EmergencyDetector::new();
        assert_eq!(unavailable_reply(&detector, "I want to end my life"), CRISIS_MESSAGE);
        assert_eq!(unavailable_reply(&detector, "promotion"), UNAVAILABLE_MESSAGE);
    }
}

// ============================================================================
// Journal export
// ============================================================================

#[cfg(test)]
mod export_tests {
    use super::*;

    #[test]
    fn test_export_written_and_parsed_back() {
        let fx = fixture();
        let companion = Companion::load(&fx.config).unwrap();
        let mut session = ConversationSession::new();

        session.handle_turn(&companion, "promotion", day(18));
        session.handle_turn(&companion, "terrible", day(19));
        session.handle_turn(&companion, "okay", day(19));

        let export_dir = fx.dir.path().join("exports");
        let path = session.journal().write_export(&export_dir).unwrap();
        assert!(path.ends_with(EXPORT_FILENAME));

        let csv = fs::read_to_string(&path).unwrap();
        assert_eq!(csv, "Date,Mood\n2026-10-18,Positive\n2026-10-19,Neutral\n");

        let rows = MoodJournal::parse_csv(&csv).unwrap();
        assert_eq!(rows, session.journal().history());
        let restored = MoodJournal::from_records(&rows);
        assert_eq!(restored.get(day(19)), Some(SentimentLabel::Neutral));
    }

    #[test]
    fn test_export_overwrites_previous_file() {
        let fx = fixture();
        let export_dir = fx.dir.path().join("exports");

        let mut journal = MoodJournal::new();
        journal.record(day(1), SentimentLabel::Negative);
        journal.write_export(&export_dir).unwrap();

        journal.clear();
        let path = journal.write_export(&export_dir).unwrap();
        assert_eq!(fs::read_to_string(path).unwrap(), "Date,Mood\n");
    }
}

// ============================================================================
// Configuration from the environment
// ============================================================================

#[cfg(test)]
mod config_tests {
    use super::*;

    #[test]
    fn test_env_config_loads_companion() {
        let fx = fixture();
        let vectorizer = fx.config.vectorizer_path.to_string_lossy().into_owned();
        let classifier = fx.config.classifier_path.to_string_lossy().into_owned();
        let embeddings = fx.config.embeddings_dir.to_string_lossy().into_owned();

        temp_env::with_vars(
            [
                (VECTORIZER_PATH_ENV, Some(vectorizer.as_str())),
                (CLASSIFIER_PATH_ENV, Some(classifier.as_str())),
                (EMBEDDINGS_DIR_ENV, Some(embeddings.as_str())),
                (EMOTION_ENABLED_ENV, Some("false")),
                (NEUTRAL_THRESHOLD_ENV, Some("90")),
                (DISTRESS_STREAK_ENV, None),
                (EMOTION_TOP_K_ENV, None),
            ],
            || {
                let config = AssistantConfig::from_env().unwrap();
                assert_eq!(config.neutral_threshold, 90.0);
                assert!(!config.emotion_enabled);

                let companion = Companion::load(&config).unwrap();
                let mut session = ConversationSession::new();
                // 85% is below the raised threshold.
                let outcome = session.handle_turn(&companion, "promotion", day(19));
                assert_eq!(outcome.label, SentimentLabel::Neutral);
                assert_eq!(outcome.confidence, 85.0);
            },
        );
    }
}
