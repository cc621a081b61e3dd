use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::{ContentAnimations, Result, TransformImageOptions};

const DEFAULT_MAX_WORKERS: usize = 2;
const DEFAULT_LOG_FILTER: &str = "info";

/// Settings shared by the display components.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct DisplayConfig {
    /// Upper bound on background transform threads
    #[serde(default = "default_max_workers")]
    pub max_workers: usize,

    /// `EnvFilter` directive used when `RUST_LOG` is unset
    #[serde(default = "default_log_filter")]
    pub log_filter: String,

    #[serde(default)]
    pub transform_options: TransformImageOptions,

    #[serde(default)]
    pub content_animations: ContentAnimations,
}

fn default_max_workers() -> usize {
    DEFAULT_MAX_WORKERS
}

fn default_log_filter() -> String {
    DEFAULT_LOG_FILTER.to_string()
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            max_workers: default_max_workers(),
            log_filter: default_log_filter(),
            transform_options: TransformImageOptions::default(),
            content_animations: ContentAnimations::empty(),
        }
    }
}

impl DisplayConfig {
    pub fn from_json(contents: &str) -> Result<Self> {
        Ok(serde_json::from_str(contents)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    /// Like [`DisplayConfig::load`], but falls back to defaults.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match Self::load(path) {
            Ok(config) => {
                info!("loaded display config from {}", path.display());
                config
            }
            Err(e) => {
                error!(
                    "Could not load display config from {}: {e}. Using defaults",
                    path.display()
                );
                Self::default()
            }
        }
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }

    /// Worker threads to spawn on this machine.
    pub fn worker_count(&self) -> usize {
        crate::jobs::worker_count(self.max_workers)
    }
}
