use crate::index::types::IndexConfig;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::hash_map::DefaultHasher;
use std::fs;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};

const APP_NAME: &str = "pfx";
const CONFIG_FILE: &str = "config.json";
const INDEX_EXTENSION: &str = "pfx";
const TEMP_EXTENSION: &str = "pfx.tmp";

/// Application configuration stored in the app data directory
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Index build and query settings
    #[serde(default)]
    pub index: IndexConfig,

    /// Directory for index files (defaults to the app data directory)
    #[serde(default)]
    pub index_dir: Option<PathBuf>,
}

impl AppConfig {
    /// Load config from the app data directory, or return default if not found
    pub fn load() -> Result<Self> {
        let config_path = get_config_path()?;
        Self::load_from(&config_path)
    }

    /// Load config from an explicit file, or return default if not found
    pub fn load_from(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(config_path).context("Failed to read config file")?;
        let mut config: AppConfig =
            serde_json::from_str(&content).context("Failed to parse config file")?;
        config.index = config.index.normalized();
        Ok(config)
    }

    /// Save config to the app data directory
    pub fn save(&self) -> Result<PathBuf> {
        let config_path = get_config_path()?;
        self.save_to(&config_path)?;
        Ok(config_path)
    }

    /// Save config to an explicit file
    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(config_path, content).context("Failed to write config file")?;
        Ok(())
    }

    /// Directory holding index files
    pub fn resolve_index_dir(&self) -> Result<PathBuf> {
        match &self.index_dir {
            Some(dir) => {
                fs::create_dir_all(dir)?;
                Ok(dir.clone())
            }
            None => get_index_dir(),
        }
    }
}

/// Get the path to the config file
pub fn get_config_path() -> Result<PathBuf> {
    let app_dir = get_app_data_dir()?;
    Ok(app_dir.join(CONFIG_FILE))
}

/// Get the application data directory
pub fn get_app_data_dir() -> Result<PathBuf> {
    let base = if cfg!(target_os = "macos") {
        dirs::home_dir().map(|h| h.join("Library").join("Application Support"))
    } else if cfg!(target_os = "windows") {
        dirs::data_local_dir()
    } else {
        // Linux/Unix: use XDG_DATA_HOME or ~/.local/share
        dirs::data_dir()
    };

    let base = base.context("Could not determine app data directory")?;
    let app_dir = base.join(APP_NAME);

    fs::create_dir_all(&app_dir)?;
    Ok(app_dir)
}

/// Get the directory storing index files
pub fn get_index_dir() -> Result<PathBuf> {
    let indexes_dir = get_app_data_dir()?.join("indexes");
    fs::create_dir_all(&indexes_dir)?;
    Ok(indexes_dir)
}

/// Index file for a base path inside `index_dir`
pub fn index_file_path(index_dir: &Path, base_path: &str, is_temp: bool) -> PathBuf {
    let extension = if is_temp { TEMP_EXTENSION } else { INDEX_EXTENSION };
    index_dir.join(format!("{}.{}", index_file_stem(base_path), extension))
}

/// Unique, readable file stem for a base path.
/// Format: first 16 sanitized chars of the last component + hash
fn index_file_stem(base_path: &str) -> String {
    let normalized = base_path.replace('\\', "/");
    let name = normalized
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .filter(|n| !n.is_empty())
        .unwrap_or("root");

    let sanitized: String = name
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '-' || *c == '_')
        .take(16)
        .collect();

    // Hash the full path
    let mut hasher = DefaultHasher::new();
    normalized.hash(&mut hasher);
    let hash = hasher.finish();

    format!("{}-{:016x}", sanitized, hash)
}

/// List index files in `index_dir`
pub fn list_index_files(index_dir: &Path) -> Result<Vec<PathBuf>> {
    if !index_dir.exists() {
        return Ok(Vec::new());
    }

    let mut files = Vec::new();
    for entry in fs::read_dir(index_dir)? {
        let path = entry?.path();
        if path.extension().and_then(|e| e.to_str()) == Some(INDEX_EXTENSION) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Remove the index file (and stale temp file) for a base path
pub fn remove_index(index_dir: &Path, base_path: &str) -> Result<bool> {
    let target = index_file_path(index_dir, base_path, false);
    let temp = index_file_path(index_dir, base_path, true);
    let _ = fs::remove_file(&temp);
    if target.exists() {
        fs::remove_file(&target)
            .with_context(|| format!("Failed to remove {}", target.display()))?;
        return Ok(true);
    }
    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_file_stem() {
        let a = index_file_stem("/home/user/project");
        let b = index_file_stem("/home/user/other");

        assert_eq!(a, index_file_stem("/home/user/project"));
        assert_eq!(a, index_file_stem(r"\home\user\project"));
        assert_ne!(a, b);
        assert!(a.starts_with("project-"));
    }

    #[test]
    fn test_index_file_stem_empty_base() {
        assert!(index_file_stem("").starts_with("root-"));
    }

    #[test]
    fn test_index_file_path_temp() {
        let dir = Path::new("/tmp/pfx");
        let target = index_file_path(dir, "Assets", false);
        let temp = index_file_path(dir, "Assets", true);
        assert_ne!(target, temp);
        assert!(temp.to_string_lossy().ends_with(".pfx.tmp"));
        assert!(target.to_string_lossy().ends_with(".pfx"));
    }

    #[test]
    fn test_app_config_partial_json() {
        let json = r#"{"index": {"min_char_variation": 3}}"#;
        let config: AppConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.index.min_char_variation, 3);
        assert_eq!(config.index.max_char_variation, 8);
        assert!(config.index_dir.is_none());
    }

    #[test]
    fn test_app_config_empty_json() {
        let config: AppConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_load_from_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::load_from(&dir.path().join("missing.json")).unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        let mut config = AppConfig::default();
        config.index.min_char_variation = 3;
        config.index_dir = Some(dir.path().join("indexes"));

        config.save_to(&path).unwrap();
        assert_eq!(AppConfig::load_from(&path).unwrap(), config);
    }

    #[test]
    fn test_load_from_normalizes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"index": {"min_char_variation": 0, "max_char_variation": 0}}"#).unwrap();
        let config = AppConfig::load_from(&path).unwrap();
        assert_eq!(config.index.min_char_variation, 1);
        assert_eq!(config.index.max_char_variation, 1);
    }

    #[test]
    fn test_list_and_remove_index_files() {
        let dir = tempfile::tempdir().unwrap();
        let target = index_file_path(dir.path(), "Assets", false);
        fs::write(&target, b"x").unwrap();
        fs::write(dir.path().join("other.txt"), b"x").unwrap();

        assert_eq!(list_index_files(dir.path()).unwrap(), vec![target.clone()]);
        assert!(remove_index(dir.path(), "Assets").unwrap());
        assert!(!remove_index(dir.path(), "Assets").unwrap());
        assert!(list_index_files(dir.path()).unwrap().is_empty());
    }
}
