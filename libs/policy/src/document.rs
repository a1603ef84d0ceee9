use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::PolicyError;

/// A policy document stored as a TOML file
pub trait Document: Serialize + DeserializeOwned + Default {
    /// Read and parse the document at `path`
    fn load(path: &Path) -> Result<Self, PolicyError> {
        let contents = std::fs::read_to_string(path).map_err(PolicyError::Read)?;
        let document = toml::from_str(&contents).map_err(PolicyError::Parse)?;
        tracing::info!("Loaded config from {}", path.display());
        Ok(document)
    }

    /// Write the document to `path`, creating parent directories as needed
    fn save(&self, path: &Path) -> Result<(), PolicyError> {
        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(PolicyError::Write)?;
        }
        let serialized = toml::to_string_pretty(self).map_err(PolicyError::Serialize)?;
        std::fs::write(path, serialized).map_err(PolicyError::Write)
    }

    /// Load `path`, or materialize and save the default document if it is absent
    fn load_or_create(path: &Path) -> Result<Self, PolicyError> {
        if path.exists() {
            return Self::load(path);
        }
        let document = Self::default();
        document.save(path)?;
        tracing::info!("Created default config at {}", path.display());
        Ok(document)
    }
}
