use crate::error::{KitError, KitResult};
use directories::ProjectDirs;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use url::Url;

pub const DEFAULT_ARCHIVE_URL: &str =
    "https://github.com/kitstart/starter-kit/archive/refs/heads/master.zip";

/// User settings, read from `config.toml` in the platform config dir.
/// Every field is optional in the file; missing ones fall back to defaults.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Settings {
    pub archive_url: String,
    pub manifest_file: String,
    pub preferred_installer: String,
    pub fallback_installer: String,
    pub default_license: String,
    pub check_for_updates: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            archive_url: DEFAULT_ARCHIVE_URL.to_string(),
            manifest_file: "package.json".to_string(),
            preferred_installer: "yarn".to_string(),
            fallback_installer: "npm".to_string(),
            default_license: "MIT".to_string(),
            check_for_updates: true,
        }
    }
}

impl Settings {
    pub fn get_path() -> Option<PathBuf> {
        ProjectDirs::from("com", "kitstart", "kitstart")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Loads settings from the default location. No file means defaults.
    pub fn load() -> KitResult<Self> {
        match Self::get_path() {
            Some(path) => Self::load_from(&path),
            None => {
                log::debug!("no config directory on this platform, using defaults");
                Ok(Self::default())
            }
        }
    }

    pub fn load_from(path: &Path) -> KitResult<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path).map_err(|e| KitError::fs(path, e))?;
        let settings: Settings = toml::from_str(&content)
            .map_err(|e| KitError::Config(format!("{}: {}", path.display(), e)))?;
        log::debug!("loaded settings from {}", path.display());
        Ok(settings)
    }

    /// Applies the `--archive-url` flag and `KITSTART_ARCHIVE_URL` env var.
    /// The flag wins over the env var, which wins over the file.
    pub fn with_overrides(mut self, flag: Option<&str>, env: Option<String>) -> KitResult<Self> {
        if let Some(url) = flag.map(str::to_string).or(env) {
            self.archive_url = url;
        }
        self.archive_url()?;
        Ok(self)
    }

    pub fn archive_url(&self) -> KitResult<Url> {
        let url = Url::parse(&self.archive_url)
            .map_err(|e| KitError::Config(format!("invalid archive URL '{}': {}", self.archive_url, e)))?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            other => Err(KitError::Config(format!(
                "archive URL must use http or https, got '{}'",
                other
            ))),
        }
    }
}
