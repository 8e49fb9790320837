//! Preflight Check System
//!
//! Verifies the model artifacts and directories before the assistant starts
//! taking turns. A failed critical check means the host must show the
//! "assistant unavailable" state instead of classifying anything.
//!
//! The artifacts loaded while checking are handed back to the caller, so
//! startup reads each of them exactly once.

use crate::companion::{
    load_emotion_model, BinaryClassifier, ClassifierArtifact, ModelArtifacts, TextVectorizer,
    TfidfVectorizer,
};
use crate::fs_manager::PortablePathManager;
use crate::models::AssistantConfig;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Result of a single check
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckResult {
    pub name: String,
    pub passed: bool,
    pub message: String,
    pub details: Option<String>,
}

impl CheckResult {
    fn pass(name: &str, message: &str) -> Self {
        Self {
            name: name.to_string(),
            passed: true,
            message: message.to_string(),
            details: None,
        }
    }

    fn fail(name: &str, message: &str, details: Option<String>) -> Self {
        Self {
            name: name.to_string(),
            passed: false,
            message: message.to_string(),
            details,
        }
    }
}

/// Complete preflight check report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreflightReport {
    pub all_passed: bool,
    pub checks: Vec<CheckResult>,
    pub ready_to_start: bool,
    pub summary: String,
}

impl PreflightReport {
    pub fn failed_checks(&self) -> impl Iterator<Item = &CheckResult> {
        self.checks.iter().filter(|c| !c.passed)
    }
}

/// Report plus the artifacts that passed, ready for `Companion::from_parts`.
pub struct Preflight {
    pub report: PreflightReport,
    /// Present iff `report.ready_to_start`.
    pub artifacts: Option<ModelArtifacts>,
}

/// Runs every check for the given configuration.
pub fn run_preflight_checks(config: &AssistantConfig) -> Preflight {
    info!("Running preflight checks");

    let mut checks = vec![check_directories()];

    let vectorizer = TfidfVectorizer::load(&config.vectorizer_path);
    checks.push(match &vectorizer {
        Ok(v) => CheckResult::pass(
            "vectorizer",
            &format!("Vectorizer loaded ({} features)", v.dimension()),
        ),
        Err(e) => CheckResult::fail(
            "vectorizer",
            "Vectorizer artifact unusable",
            Some(e.to_string()),
        ),
    });

    let classifier = ClassifierArtifact::load(&config.classifier_path);
    checks.push(match &classifier {
        Ok(c) => CheckResult::pass(
            "classifier",
            &format!("{} classifier loaded ({} features)", c.kind(), c.dimension()),
        ),
        Err(e) => CheckResult::fail(
            "classifier",
            "Classifier artifact unusable",
            Some(e.to_string()),
        ),
    });

    checks.push(match (&vectorizer, &classifier) {
        (Ok(v), Ok(c)) if v.dimension() == c.dimension() => {
            CheckResult::pass("artifact_compat", "Vectorizer and classifier agree")
        }
        (Ok(v), Ok(c)) => CheckResult::fail(
            "artifact_compat",
            "Vectorizer and classifier disagree on feature count",
            Some(format!("{} vs {}", v.dimension(), c.dimension())),
        ),
        _ => CheckResult::fail(
            "artifact_compat",
            "Skipped - missing vectorizer or classifier",
            None,
        ),
    });

    let emotion_model = load_emotion_model(config);
    checks.push(match &emotion_model {
        Ok(Some(_)) => CheckResult::pass("emotion_model", "Emotion model loaded"),
        Ok(None) => CheckResult::pass("emotion_model", "Emotion scoring disabled by configuration"),
        Err(e) => CheckResult::fail(
            "emotion_model",
            "Emotion model unavailable; emotions will be omitted",
            Some(e.to_string()),
        ),
    });

    let all_passed = checks.iter().all(|c| c.passed);
    let ready_to_start = checks
        .iter()
        .filter(|c| is_critical_check(&c.name))
        .all(|c| c.passed);

    let summary = if all_passed {
        "All checks passed. Assistant ready.".to_string()
    } else if ready_to_start {
        "Assistant ready with reduced features.".to_string()
    } else {
        "Assistant unavailable: model artifacts missing or invalid.".to_string()
    };

    for check in checks.iter().filter(|c| !c.passed) {
        warn!(
            "Preflight check '{}' failed: {} {}",
            check.name,
            check.message,
            check.details.as_deref().unwrap_or("")
        );
    }
    info!("Preflight: {}", summary);

    let artifacts = match (vectorizer, classifier) {
        (Ok(vectorizer), Ok(classifier)) if ready_to_start => Some(ModelArtifacts {
            vectorizer,
            classifier,
            emotion_model: emotion_model.ok().flatten(),
        }),
        _ => None,
    };

    Preflight {
        report: PreflightReport {
            all_passed,
            checks,
            ready_to_start,
            summary,
        },
        artifacts,
    }
}

fn is_critical_check(name: &str) -> bool {
    matches!(name, "vectorizer" | "classifier" | "artifact_compat")
}

fn check_directories() -> CheckResult {
    match PortablePathManager::init() {
        Ok(()) => CheckResult::pass("directories", "Data directories present"),
        Err(e) => CheckResult::fail(
            "directories",
            "Could not create data directories",
            Some(e.to_string()),
        ),
    }
}
