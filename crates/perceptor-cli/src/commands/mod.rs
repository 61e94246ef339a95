pub mod audit;
pub mod compare;
pub mod init;
pub mod list_models;
pub mod project;
pub mod quick;
pub mod reports;
pub mod validate;

use std::path::PathBuf;

use anyhow::{Context as _, Result};

use perceptor_core::store::JsonFileStore;
use perceptor_providers::{load_config_from, PerceptorConfig};

/// Global options shared by every command.
pub struct Context {
    pub config_path: Option<PathBuf>,
    pub data_dir: Option<PathBuf>,
}

impl Context {
    pub fn config(&self) -> Result<PerceptorConfig> {
        load_config_from(self.config_path.as_deref())
    }

    pub fn store(&self, config: &PerceptorConfig) -> Result<JsonFileStore> {
        let dir = self.data_dir.clone().unwrap_or_else(|| config.data_dir.clone());
        JsonFileStore::open(&dir)
            .with_context(|| format!("failed to open data directory {}", dir.display()))
    }
}

pub(crate) fn pct(score: f64) -> String {
    format!("{:.1}%", score * 100.0)
}
