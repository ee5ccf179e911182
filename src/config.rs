//! Configuration defaults - read once at startup
//!
//! ```yaml
//! service: http://qvserver:4799/QMS/Service
//! sleep: 10      # seconds between status polls
//! timeout: -1    # minutes, negative waits indefinitely, 0 does not wait
//! wait: 0        # seconds to wait before triggering
//! ```

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Environment variable pointing at an explicit config file
pub const CONFIG_ENV: &str = "QVEDX_CONFIG";
const LOCAL_CONFIG: &str = "qv-edx-trigger.yml";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Management service address
    pub service: Option<String>,
    /// Poll interval in seconds
    pub sleep: u64,
    /// Timeout in minutes
    pub timeout: i64,
    /// Pre-trigger delay in seconds
    pub wait: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            service: None,
            sleep: 10,
            timeout: -1,
            wait: 0,
        }
    }
}

impl Settings {
    /// Load settings from a YAML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Cannot read config file {}", path.display()))?;
        let settings: Settings = serde_yaml::from_str(&content)
            .with_context(|| format!("Invalid config file {}", path.display()))?;
        Ok(settings)
    }

    /// User-level config location
    pub fn user_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("qv-edx-trigger").join("config.yml"))
    }

    /// Auto-detect and load settings
    /// Priority:
    /// 1. file named by $QVEDX_CONFIG (must exist)
    /// 2. qv-edx-trigger.yml in the current directory
    /// 3. user config directory
    /// 4. built-in defaults
    pub fn auto_load() -> Result<Self> {
        if let Some(path) = std::env::var_os(CONFIG_ENV) {
            return Self::from_file(Path::new(&path));
        }

        let local = Path::new(LOCAL_CONFIG);
        if local.exists() {
            return Self::from_file(local);
        }

        if let Some(user) = Self::user_path().filter(|p| p.exists()) {
            return Self::from_file(&user);
        }

        Ok(Self::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.sleep, 10);
        assert_eq!(settings.timeout, -1);
        assert_eq!(settings.wait, 0);
        assert!(settings.service.is_none());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.yml");
        std::fs::write(&path, "service: http://qv:4799/QMS/Service\ntimeout: 30\n").unwrap();

        let settings = Settings::from_file(&path).unwrap();
        assert_eq!(settings.service.as_deref(), Some("http://qv:4799/QMS/Service"));
        assert_eq!(settings.timeout, 30);
        assert_eq!(settings.sleep, 10);
    }

    #[test]
    fn test_malformed_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.yml");
        std::fs::write(&path, "sleep: [not, a, number]\n").unwrap();

        let err = Settings::from_file(&path).unwrap_err();
        assert!(err.to_string().contains("Invalid config file"));
    }

    #[test]
    fn test_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        assert!(Settings::from_file(&temp_dir.path().join("absent.yml")).is_err());
    }
}
