use crate::models::StorageData;
use crate::storage::{create_storage, Storage, StorageError, StorageKind};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("Invalid key: {0}")]
    InvalidKey(String),
}

impl From<StorageError> for ConfigError {
    fn from(error: StorageError) -> Self {
        ConfigError::Storage(error.to_string())
    }
}

const VALID_STORAGE_TYPES: &[&str] = &["json", "sqlite"];

fn validate_storage_path(path: &str) -> Result<PathBuf, ConfigError> {
    // Check for null bytes and other invalid characters
    if path.contains('\0') {
        return Err(ConfigError::InvalidConfig(
            "Path contains invalid characters".to_string(),
        ));
    }

    let path = shellexpand::tilde(path);
    let path = PathBuf::from(path.as_ref());

    // Check if parent directory exists
    if let Some(parent) = path.parent() {
        if !parent.exists() {
            return Err(ConfigError::InvalidConfig(format!(
                "Parent directory does not exist: {}",
                parent.display()
            )));
        }

        // Check if directory is writable
        #[cfg(unix)]
        {
            use std::os::unix::fs::MetadataExt;
            if let Ok(metadata) = parent.metadata() {
                if metadata.mode() & 0o200 == 0 {
                    return Err(ConfigError::InvalidConfig(format!(
                        "Directory is not writable: {}",
                        parent.display()
                    )));
                }
            }
        }
    }

    if path.as_os_str().is_empty() {
        return Err(ConfigError::InvalidConfig(
            "Path cannot be empty".to_string(),
        ));
    }

    Ok(path)
}

fn validate_storage_type(value: &str) -> Result<(), ConfigError> {
    if !VALID_STORAGE_TYPES.contains(&value) {
        return Err(ConfigError::InvalidConfig(format!(
            "storage.type must be one of: {}",
            VALID_STORAGE_TYPES.join(", ")
        )));
    }
    Ok(())
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub storage_type: Option<String>,
    #[serde(default)]
    pub storage_path: Option<String>,
}

impl Config {
    pub fn with_defaults() -> Self {
        Self {
            storage_type: default_storage_type(),
            storage_path: default_storage_path(),
        }
    }
}

fn default_storage_type() -> Option<String> {
    Some("json".to_string())
}

fn default_storage_path() -> Option<String> {
    let home = dirs::home_dir()?;
    Some(
        home.join(".config")
            .join("catodo")
            .join("data.json")
            .to_string_lossy()
            .to_string(),
    )
}

fn default_config_path() -> Result<PathBuf, ConfigError> {
    let home = dirs::home_dir().ok_or_else(|| {
        ConfigError::InvalidConfig(
            "Could not determine home directory, pass --config".to_string(),
        )
    })?;
    Ok(home.join(".config").join("catodo").join("config.json"))
}

/// Owns the config file. Reads it on construction, writes it back after
/// every change, and hands out the storage backend it describes.
pub struct ConfigManager {
    path: PathBuf,
    config: Config,
}

impl ConfigManager {
    /// Loads the config at `config_path` (or the default location). A
    /// missing file is created with defaults on the spot.
    pub fn new(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match config_path {
            Some(p) => p.to_path_buf(),
            None => default_config_path()?,
        };

        if path.exists() {
            let contents = std::fs::read_to_string(&path)?;
            let config = if contents.trim().is_empty() {
                Config::with_defaults()
            } else {
                serde_json::from_str(&contents)?
            };
            Ok(Self { path, config })
        } else {
            let manager = Self {
                path,
                config: Config::with_defaults(),
            };
            manager.save()?;
            Ok(manager)
        }
    }

    fn save(&self) -> Result<(), ConfigError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(&self.config)?;
        std::fs::write(&self.path, json)?;
        Ok(())
    }

    pub fn get(&self, key: &str) -> Result<Option<String>, ConfigError> {
        match key {
            "storage.type" => Ok(self.config.storage_type.clone()),
            "storage.path" => Ok(self.config.storage_path.clone()),
            _ => Err(ConfigError::InvalidKey(key.to_string())),
        }
    }

    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        match key {
            "storage.type" => {
                validate_storage_type(value)?;
                if self.config.storage_type.as_deref() != Some(value) {
                    eprintln!("Warning: Changing storage type does not migrate existing data");
                }
                self.config.storage_type = Some(value.to_string());
            }
            "storage.path" => {
                let path = validate_storage_path(value)?;
                self.config.storage_path = Some(path.to_string_lossy().to_string());
            }
            _ => {
                return Err(ConfigError::InvalidKey(key.to_string()));
            }
        }
        self.save()
    }

    pub fn unset(&mut self, key: &str) -> Result<(), ConfigError> {
        match key {
            "storage.type" => self.config.storage_type = None,
            "storage.path" => self.config.storage_path = None,
            _ => return Err(ConfigError::InvalidKey(key.to_string())),
        }
        self.save()
    }

    /// Every key with its default, then every override from the file. The
    /// bool marks default rows.
    pub fn list(&self) -> Vec<(String, String, bool)> {
        let mut list = Vec::new();
        let defaults = Config::with_defaults();

        list.push((
            "storage.type".to_string(),
            defaults.storage_type.unwrap_or_else(|| "null".to_string()),
            true,
        ));
        list.push((
            "storage.path".to_string(),
            defaults.storage_path.unwrap_or_else(|| "null".to_string()),
            true,
        ));

        if let Some(value) = self.config.storage_type.clone() {
            list.push(("storage.type".to_string(), value, false));
        }
        if let Some(value) = self.config.storage_path.clone() {
            list.push(("storage.path".to_string(), value, false));
        }

        list
    }

    /// The backend the config selects, defaulting to JSON.
    pub fn storage_kind(&self) -> StorageKind {
        self.config
            .storage_type
            .as_deref()
            .and_then(StorageKind::parse)
            .unwrap_or(StorageKind::Json)
    }

    /// The data file path, tilde-expanded, falling back to the default
    /// location under the home directory.
    pub fn data_path(&self) -> Result<PathBuf, ConfigError> {
        let raw = self
            .config
            .storage_path
            .clone()
            .or_else(default_storage_path)
            .ok_or_else(|| {
                ConfigError::InvalidConfig(
                    "storage.path is not set and no home directory was found".to_string(),
                )
            })?;
        Ok(PathBuf::from(shellexpand::tilde(&raw).to_string()))
    }

    pub fn create_storage(&self) -> Result<Box<dyn Storage>, ConfigError> {
        let kind = self.storage_kind();
        let path = self.data_path()?;
        log::debug!("opening {} store at {}", kind.as_str(), path.display());
        Ok(create_storage(kind, &path)?)
    }

    /// Overwrites the data file with an empty snapshot.
    pub fn reset_data(&self) -> Result<(), ConfigError> {
        let storage = self.create_storage()?;
        storage.save(&StorageData::new())?;
        Ok(())
    }
}
