use std::fs;
use std::path::PathBuf;
use tracing::{info, warn};

/// Environment variable overriding the application root directory.
pub const HOME_ENV: &str = "AARYA_HOME";

pub struct PortablePathManager;

impl PortablePathManager {
    /// Application root: `AARYA_HOME` when set, the current directory otherwise.
    pub fn root_dir() -> PathBuf {
        if let Ok(home) = std::env::var(HOME_ENV) {
            if !home.trim().is_empty() {
                return PathBuf::from(home);
            }
        }

        match std::env::current_dir() {
            Ok(path) => path,
            Err(e) => {
                warn!("Failed to get current directory: {}. Falling back to '.'", e);
                PathBuf::from(".")
            }
        }
    }

    /// Main data directory (./data).
    pub fn data_dir() -> PathBuf {
        Self::root_dir().join("data")
    }

    /// Model artifacts directory (./data/models).
    pub fn models_dir() -> PathBuf {
        Self::data_dir().join("models")
    }

    /// Local embedding model cache (./data/models/embeddings).
    pub fn embeddings_dir() -> PathBuf {
        Self::models_dir().join("embeddings")
    }

    /// Mood history exports (./data/exports).
    pub fn exports_dir() -> PathBuf {
        Self::data_dir().join("exports")
    }

    /// Creates the data, models and exports directories if they don't exist.
    pub fn init() -> Result<(), std::io::Error> {
        for dir in [Self::data_dir(), Self::models_dir(), Self::exports_dir()] {
            if !dir.exists() {
                info!("Creating directory: {:?}", dir);
                fs::create_dir_all(&dir)?;
            }
        }

        Ok(())
    }
}
