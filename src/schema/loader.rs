//! Study config loader for seeding configs from disk at startup
//!
//! - One `*.json` file per study, any file name
//! - Non-JSON files are ignored
//! - Unreadable, unparsable or structurally invalid files abort startup

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use super::errors::{SchemaError, SchemaResult};
use super::types::StudyConfig;

/// Reads study config files from a directory into an in-memory registry.
pub struct StudyConfigLoader {
    config_dir: PathBuf,
    configs: BTreeMap<String, StudyConfig>,
}

impl StudyConfigLoader {
    pub fn new(config_dir: &Path) -> Self {
        Self {
            config_dir: config_dir.to_path_buf(),
            configs: BTreeMap::new(),
        }
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    /// Loads every config file in the directory.
    ///
    /// A missing directory loads nothing.
    pub fn load_all(&mut self) -> SchemaResult<()> {
        if !self.config_dir.exists() {
            return Ok(());
        }

        let entries = fs::read_dir(&self.config_dir).map_err(|e| {
            SchemaError::malformed_study_config(
                self.config_dir.display().to_string(),
                format!("Failed to read config directory: {}", e),
            )
        })?;

        let mut paths = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| {
                SchemaError::malformed_study_config(
                    self.config_dir.display().to_string(),
                    format!("Failed to read directory entry: {}", e),
                )
            })?;
            let path = entry.path();
            if path.extension().map_or(false, |ext| ext == "json") {
                paths.push(path);
            }
        }
        paths.sort();

        for path in paths {
            self.load_file(&path)?;
        }

        Ok(())
    }

    fn load_file(&mut self, path: &Path) -> SchemaResult<()> {
        let content = fs::read_to_string(path).map_err(|e| {
            SchemaError::malformed_study_config(path.display().to_string(), format!("Failed to read file: {}", e))
        })?;

        let config: StudyConfig = serde_json::from_str(&content).map_err(|e| {
            SchemaError::malformed_study_config(path.display().to_string(), format!("Invalid JSON: {}", e))
        })?;

        config.validate_structure().map_err(|e| {
            SchemaError::malformed_study_config(path.display().to_string(), e.to_string())
        })?;

        if self.configs.contains_key(&config.study_id) {
            return Err(SchemaError::malformed_study_config(
                path.display().to_string(),
                format!("Study '{}' is defined more than once", config.study_id),
            ));
        }

        self.configs.insert(config.study_id.clone(), config);
        Ok(())
    }

    pub fn get(&self, study_id: &str) -> Option<&StudyConfig> {
        self.configs.get(study_id)
    }

    /// Returns all loaded configs ordered by study id.
    pub fn configs(&self) -> impl Iterator<Item = &StudyConfig> {
        self.configs.values()
    }

    pub fn config_count(&self) -> usize {
        self.configs.len()
    }
}
